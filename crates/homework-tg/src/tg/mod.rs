//! Telegram side of the bot. It only sends messages, no updates are handled.

mod config;

use crate::prelude::*;
use crate::Result;
use async_trait::async_trait;
use teloxide::prelude::*;

pub(crate) use config::*;

/// Bot API rejects text messages longer than this
pub(crate) const MAX_MESSAGE_CHARS: usize = 4096;

/// The only Bot API operation the watcher needs
#[async_trait]
pub(crate) trait MessageSender: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result;
}

#[async_trait]
impl MessageSender for Bot {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result {
        self.send_message(chat_id, text).await?;
        Ok(())
    }
}

/// Sends text messages to the single configured chat
pub(crate) struct Notifier<S = Bot> {
    sender: S,
    chat_id: ChatId,
}

impl<S: MessageSender> Notifier<S> {
    pub(crate) fn new(sender: S, chat_id: ChatId) -> Self {
        Self { sender, chat_id }
    }

    /// Failures are logged here, the caller decides whether to care about
    /// the returned error.
    pub(crate) async fn notify(&self, text: &str) -> Result {
        let result = self.sender.send_text(self.chat_id, text).await;

        match &result {
            Ok(()) => debug!(chat_id = self.chat_id.0, text, "Message sent"),
            Err(err) => error!(
                chat_id = self.chat_id.0,
                err = tracing_err(err),
                "Failed to send message"
            ),
        }

        result
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use assert_matches::assert_matches;
    use std::sync::{Arc, Mutex};

    /// Records the sent messages and fails on demand
    #[derive(Clone, Default)]
    pub(crate) struct FakeSender {
        imp: Arc<Mutex<FakeSenderImp>>,
    }

    #[derive(Default)]
    struct FakeSenderImp {
        sent: Vec<(ChatId, String)>,
        failures_left: usize,
    }

    impl FakeSender {
        /// Makes the next `count` sends fail with a Bot API error
        pub(crate) fn fail_next(&self, count: usize) {
            self.imp.lock().unwrap().failures_left = count;
        }

        pub(crate) fn sent(&self) -> Vec<String> {
            let imp = self.imp.lock().unwrap();
            imp.sent.iter().map(|(_, text)| text.clone()).collect()
        }

        pub(crate) fn sent_to(&self) -> Vec<ChatId> {
            let imp = self.imp.lock().unwrap();
            imp.sent.iter().map(|(chat_id, _)| *chat_id).collect()
        }
    }

    #[async_trait]
    impl MessageSender for FakeSender {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result {
            let mut imp = self.imp.lock().unwrap();

            if imp.failures_left > 0 {
                imp.failures_left -= 1;
                return Err(teloxide::RequestError::Api(teloxide::ApiError::BotBlocked).into());
            }

            imp.sent.push((chat_id, text.to_owned()));
            Ok(())
        }
    }

    #[test_log::test(tokio::test)]
    async fn sends_to_the_configured_chat() {
        let sender = FakeSender::default();
        let notifier = Notifier::new(sender.clone(), ChatId(5989373675));

        notifier.notify("hello").await.unwrap();

        assert_eq!(sender.sent(), ["hello"]);
        assert_eq!(sender.sent_to(), [ChatId(5989373675)]);
    }

    #[test_log::test(tokio::test)]
    async fn send_failure_is_returned() {
        let sender = FakeSender::default();
        let notifier = Notifier::new(sender.clone(), ChatId(1));

        sender.fail_next(1);

        let err = notifier.notify("hello").await.unwrap_err();

        assert_matches!(err.kind(), ErrorKind::Tg { .. });
        assert!(sender.sent().is_empty());

        notifier.notify("hello").await.unwrap();
        assert_eq!(sender.sent(), ["hello"]);
    }
}
