//! The polling loop that glues the review API with the Telegram chat.

use crate::practicum::{self, HomeworkSource};
use crate::prelude::*;
use crate::tg::{self, MessageSender, Notifier};
use crate::Result;
use std::future::Future;
use std::time::Duration;

/// What happened during a single iteration of the polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum TickOutcome {
    /// A new message (status change or error report) was delivered
    Notified,

    /// The message is the same as the last delivered one, so nothing was sent
    Unchanged,

    /// The API reported no homeworks changed since the last poll
    NoUpdates,

    /// The message was not delivered, it will be retried on the next tick
    SendFailed,
}

pub(crate) struct StatusWatcher<P, S> {
    source: P,
    notifier: Notifier<S>,
    retry_period: Duration,

    /// Unix timestamp passed as `from_date` to the API
    from_date: i64,

    /// The last successfully delivered message
    last_message: Option<String>,
}

/// Result of the poll-validate-format part of an iteration
struct Poll {
    message: Option<String>,
    next_from_date: Option<i64>,
}

impl<P: HomeworkSource, S: MessageSender> StatusWatcher<P, S> {
    pub(crate) fn new(
        source: P,
        notifier: Notifier<S>,
        retry_period: Duration,
        from_date: i64,
    ) -> Self {
        Self {
            source,
            notifier,
            retry_period,
            from_date,
            last_message: None,
        }
    }

    /// Polls forever with `retry_period` pauses until `shutdown` resolves.
    /// Errors never stop the loop.
    pub(crate) async fn run(mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);

        loop {
            let span = info_span!("tick", from_date = self.from_date);
            let outcome = self.tick().instrument(span).await;

            let outcome_label: &'static str = outcome.into();
            metrics::increment_counter!("homework_watcher_ticks_total", "outcome" => outcome_label);

            debug!(
                ?outcome,
                retry_period = tracing_duration(self.retry_period),
                "Sleeping until the next poll"
            );

            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested, stopping the watcher");
                    return;
                }
                () = tokio::time::sleep(self.retry_period) => {}
            }
        }
    }

    /// A single iteration of the loop without the trailing sleep
    pub(crate) async fn tick(&mut self) -> TickOutcome {
        let (message, next_from_date) = match self.poll().await {
            Ok(Poll {
                message: Some(message),
                next_from_date,
            }) => (message, next_from_date),
            Ok(Poll {
                message: None,
                next_from_date,
            }) => {
                debug!("No homework status changes");
                self.advance(next_from_date);
                return TickOutcome::NoUpdates;
            }
            Err(err) => {
                error!(err = tracing_err(&err), "Failed to get the homework status");
                (error_message(&err), None)
            }
        };

        if self.last_message.as_deref() == Some(message.as_str()) {
            debug!(%message, "The message didn't change since the last one, skipping");
            self.advance(next_from_date);
            return TickOutcome::Unchanged;
        }

        // The failure is already logged by the notifier
        if self.notifier.notify(&message).await.is_err() {
            return TickOutcome::SendFailed;
        }

        info!(%message, "Notified about the change");

        self.last_message = Some(message);
        self.advance(next_from_date);

        TickOutcome::Notified
    }

    async fn poll(&self) -> Result<Poll> {
        let response = self.source.homework_statuses(self.from_date).await?;
        let response = practicum::check_response(response)?;

        // Only the most recent homework is tracked
        let message = response
            .homeworks()
            .first()
            .map(practicum::parse_status)
            .transpose()?;

        Ok(Poll {
            message,
            next_from_date: response.current_date(),
        })
    }

    fn advance(&mut self, next_from_date: Option<i64>) {
        if let Some(from_date) = next_from_date {
            self.from_date = from_date;
        }
    }
}

/// The error id is not included in the message, so that the same error
/// repeated on every tick is reported only once. Errors may carry whole
/// response bodies, so the report is cut to fit into a single message.
fn error_message(err: &crate::Error) -> String {
    format!("Сбой в работе программы: {}", err.kind().display_chain())
        .truncate_chars(tg::MAX_MESSAGE_CHARS)
        .into_owned()
}
