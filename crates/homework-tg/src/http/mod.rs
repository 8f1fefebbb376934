mod basic_ext;
mod json_ext;

use crate::prelude::*;
use crate::Result;
use async_trait::async_trait;
use reqwest_middleware::RequestBuilder;
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;
use std::time::{Duration, Instant};

pub(crate) mod prelude {
    pub(crate) use super::basic_ext::RequestBuilderBasicExt;
    pub(crate) use super::json_ext::RequestBuilderJsonExt;
}

pub(crate) type Client = reqwest_middleware::ClientWithMiddleware;

/// Builds the plain HTTP client shared by the Telegram bot and
/// the middleware-enabled client. Every request is bounded by `timeout`.
pub(crate) fn create_reqwest_client(timeout: Duration) -> Result<reqwest::Client> {
    teloxide::net::default_reqwest_settings()
        .timeout(timeout)
        .build()
        .fatal_ctx(|| "Failed to build the HTTP client")
}

/// Total time spent on retrying transient failures of a single request
const RETRY_BUDGET: Duration = Duration::from_secs(10);

pub(crate) fn create_client(client: reqwest::Client) -> Client {
    create_client_with_retry_budget(client, RETRY_BUDGET)
}

pub(crate) fn create_client_with_retry_budget(
    client: reqwest::Client,
    retry_budget: Duration,
) -> Client {
    // Retry exponentially increasing intervals between attempts.
    let retry_policy = ExponentialBackoff::builder()
        .backoff_exponent(2)
        .retry_bounds(Duration::from_millis(100), Duration::from_secs(2))
        .build_with_total_retry_duration(retry_budget);

    reqwest_middleware::ClientBuilder::new(client)
        .with(OutermostObservingMiddleware)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .with(InnermostObservingMiddleware)
        .with_init(|request_builder: RequestBuilder| {
            request_builder.header(
                "User-Agent",
                concat!("HomeworkTelegramBot/", env!("CARGO_PKG_VERSION")),
            )
        })
        .build()
}

/// Duration of a single real http request. If there were retries, then these
/// will appear as as separate observations.
const HTTP_REQUEST_DURATION: &str = "http_request_duration_seconds";

/// Same as [`HTTP_REQUEST_DURATION`] but covers the time it took to
/// do retries of the request.
const HTTP_REQUEST_EFFECTIVE_DURATION: &str = "http_request_effective_duration_seconds";

struct OutermostObservingMiddleware;

#[async_trait]
impl reqwest_middleware::Middleware for OutermostObservingMiddleware {
    async fn handle(
        &self,
        request: reqwest::Request,
        extensions: &mut task_local_extensions::Extensions,
        next: reqwest_middleware::Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let span = info_span!(
            "request",
            version = ?request.version(),
            method = %request.method(),
            url = %request.url(),
        );
        measure_request(HTTP_REQUEST_EFFECTIVE_DURATION, request, extensions, next)
            .instrument(span)
            .await
    }
}

struct InnermostObservingMiddleware;

#[async_trait]
impl reqwest_middleware::Middleware for InnermostObservingMiddleware {
    async fn handle(
        &self,
        request: reqwest::Request,
        extensions: &mut task_local_extensions::Extensions,
        next: reqwest_middleware::Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let (result, duration) = measure_request(HTTP_REQUEST_DURATION, request, extensions, next)
            .with_duration()
            .await;

        let duration = tracing_duration(duration);

        let response = match &result {
            Ok(response) => response,
            Err(err) => {
                error!(duration, err = tracing_err(err), "Network request failed");
                return result;
            }
        };

        let status = response.status();

        let Err(err) = response.error_for_status_ref() else {
            info!(duration, %status, "Network request succeeded");
            return result;
        };

        warn!(
            err = tracing_err(&err),
            duration,
            %status,
            "Network request failed (error status)"
        );

        result
    }
}

async fn measure_request(
    histogram: &'static str,
    request: reqwest::Request,
    extensions: &mut task_local_extensions::Extensions,
    next: reqwest_middleware::Next<'_>,
) -> reqwest_middleware::Result<reqwest::Response> {
    let labels = request_labels(&request);

    let start = Instant::now();
    let result = next.run(request, extensions).await;
    let elapsed = start.elapsed();

    let status = match &result {
        Ok(response) => response.status().to_string(),
        Err(_) => "{fatal}".to_owned(),
    };

    metrics::histogram!(
        histogram,
        elapsed.as_secs_f64(),
        "version" => labels.version,
        "method" => labels.method,
        "host" => labels.host,
        "status" => status
    );

    result
}

struct HttpRequestLabels {
    version: String,
    method: String,
    host: String,
}

fn request_labels(request: &reqwest::Request) -> HttpRequestLabels {
    HttpRequestLabels {
        version: format!("{:?}", request.version()),
        method: request.method().to_string(),
        host: request.url().host_str().unwrap_or("{unknown}").to_owned(),
    }
}

/// Errors at the layer of the HTTP API
#[derive(Debug, thiserror::Error)]
pub(crate) enum HttpClientError {
    /// Transport-level failure: DNS, connection refused, timeout, etc.
    #[error("HTTP request failed")]
    Request { source: reqwest_middleware::Error },

    #[error("Failed to read HTTP response")]
    ReadPayload { source: reqwest_middleware::Error },

    #[error("HTTP request has failed (HTTP status code: {status}):\n{body}")]
    BadResponseStatusCode {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Received an unexpected response JSON object")]
    UnexpectedResponseJsonShape { source: serde_json::Error },
}
