use super::Config;
use crate::http;
use crate::prelude::*;
use crate::Result;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;

/// Source of the raw homework statuses payload
#[async_trait]
pub(crate) trait HomeworkSource: Send + Sync {
    /// Returns the decoded response with the homeworks, whose status changed
    /// since `from_date` (unix timestamp in seconds). The payload is not
    /// validated, see [`super::check_response`].
    async fn homework_statuses(&self, from_date: i64) -> Result<serde_json::Value>;
}

pub(crate) struct Client {
    http: http::Client,
    cfg: Config,
}

impl Client {
    pub(crate) fn new(cfg: Config, http: http::Client) -> Self {
        Self { http, cfg }
    }
}

#[async_trait]
impl HomeworkSource for Client {
    async fn homework_statuses(&self, from_date: i64) -> Result<serde_json::Value> {
        self.http
            .get(self.cfg.endpoint.clone())
            .header(AUTHORIZATION, format!("OAuth {}", self.cfg.token))
            .query(&[("from_date", from_date)])
            .read_json()
            .instrument(debug_span!("homework_statuses", from_date))
            .await
    }
}
