//! Client and response model of the homework review API

mod client;
mod response;
mod status;

use serde::Deserialize;

pub(crate) use client::*;
pub(crate) use response::*;
pub(crate) use status::*;

#[derive(Deserialize, Clone)]
pub(crate) struct Config {
    /// OAuth token of the student whose homeworks are tracked
    pub(crate) token: String,

    #[serde(default = "default_endpoint")]
    pub(crate) endpoint: url::Url,
}

fn default_endpoint() -> url::Url {
    url::Url::parse("https://practicum.yandex.ru/api/user_api/homework_statuses/")
        .unwrap_or_else(|err| panic!("BUG: default endpoint URL is invalid: {err}"))
}

/// Errors caused by a response that doesn't fit the expected model.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PracticumError {
    #[error("Response is not a JSON object, got: {actual}")]
    ResponseNotAnObject { actual: serde_json::Value },

    #[error("Response object has no `homeworks` key")]
    MissingHomeworksKey,

    #[error("`homeworks` is not a list, got: {actual}")]
    HomeworksNotAList { actual: serde_json::Value },

    #[error("Homework record has no `homework_name`: {homework}")]
    MissingHomeworkName { homework: serde_json::Value },

    #[error("Unknown homework status: {status:?}")]
    UnknownStatus { status: Option<String> },
}
