mod config;
mod error;
mod http;
mod observability;
mod practicum;
mod tg;
mod util;
mod watcher;

pub use crate::error::*;
pub use config::*;
pub use observability::*;

#[allow(unused_imports)]
mod prelude {
    pub(crate) use crate::error::prelude::*;
    pub(crate) use crate::http::prelude::*;
    pub(crate) use crate::observability::logging::prelude::*;
    pub(crate) use crate::util::prelude::*;
}

/// Run the homework status polling loop until `shutdown` resolves
pub async fn run(config: Config, shutdown: impl std::future::Future<Output = ()>) -> Result {
    let reqwest = http::create_reqwest_client(config.poll.request_timeout)?;

    let practicum = practicum::Client::new(config.practicum, http::create_client(reqwest.clone()));
    let bot = teloxide::Bot::with_client(config.tg.token, reqwest);
    let notifier = tg::Notifier::new(bot, config.tg.chat_id);

    let watcher = watcher::StatusWatcher::new(
        practicum,
        notifier,
        config.poll.retry_period,
        chrono::Utc::now().timestamp(),
    );

    tracing::info!("Starting homework status watcher...");

    watcher.run(shutdown).await;

    Ok(())
}
