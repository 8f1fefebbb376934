use super::HttpClientError;
use crate::prelude::*;
use crate::{err, err_ctx, Result};
use async_trait::async_trait;
use bytes::Bytes;
use easy_ext::ext;
use reqwest::{Response, StatusCode};
use reqwest_middleware::RequestBuilder;

/// Error responses may be whole HTML pages, there is no use in keeping all of it
const MAX_ERROR_BODY_CHARS: usize = 1024;

#[ext(RequestBuilderBasicExt)]
#[async_trait]
pub(crate) impl RequestBuilder {
    /// Better version of [`RequestBuilder::send`] that returns an error
    /// if any status code other than `200 OK` is returned.
    async fn try_send(self) -> Result<Response> {
        let response = self
            .send()
            .await
            .map_err(err_ctx!(HttpClientError::Request))?;

        let status = response.status();

        if status == StatusCode::OK {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body.truncate_chars(MAX_ERROR_BODY_CHARS).into_owned(),
            Err(err) => format!(
                "Could not collect the error response body text: {}",
                err.display_chain()
            ),
        };

        Err(err!(HttpClientError::BadResponseStatusCode { status, body }))
    }

    async fn read_bytes(self) -> Result<Bytes> {
        self.try_send()
            .await?
            .bytes()
            .await
            .map_err(err_ctx!(HttpClientError::ReadPayload))
    }
}
