use serde::Deserialize;
use teloxide::types::ChatId;

#[derive(Deserialize, Clone)]
pub(crate) struct Config {
    pub(crate) token: String,

    /// Chat where the status updates and error reports are sent
    pub(crate) chat_id: ChatId,
}
