use crate::config::{from_vars, non_empty_vars};
use crate::observability::GLOBAL_LABELS;
use crate::prelude::*;
use crate::Result;
use serde::Deserialize;
use serde_with::serde_as;
use std::collections::HashMap;
use std::ops::Deref;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

/// Handle to the background task that ships logs to Loki, if it is enabled.
pub struct LoggingTask {
    loki: Option<LokiTask>,
}

struct LokiTask {
    task: tokio::task::JoinHandle<()>,
    controller: tracing_loki::BackgroundTaskController,
}

impl LoggingTask {
    pub async fn shutdown(self) {
        let Some(loki) = self.loki else {
            return;
        };

        info!("Waiting for the logging task to finish nicely...");

        let start = std::time::Instant::now();
        loki.controller.shutdown().await;

        eprintln!(
            "Stopped logging task in {:.2?}: {:?}",
            start.elapsed(),
            loki.task.await
        );
    }
}

/// Installs the global `tracing` subscriber. Logs are written to stdout, and
/// additionally to Loki when `LOKI_URL` is set.
pub fn init_logging() -> Result<LoggingTask> {
    let vars = non_empty_vars(std::env::vars());
    let config: LokiConfig = from_vars("LOKI_", &vars)?;
    config.init_logging()
}

#[serde_as]
#[derive(Deserialize)]
struct LokiConfig {
    url: Option<url::Url>,

    #[serde_as(as = "Option<serde_with::json::JsonString>")]
    #[serde(default)]
    labels: Option<HashMap<String, String>>,
}

impl LokiConfig {
    fn init_logging(self) -> Result<LoggingTask> {
        let env_filter = tracing_subscriber::EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .with_env_var("HW_BOT_LOG")
            .from_env_lossy();

        let fmt = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(std::env::var("COLORS").as_deref() != Ok("0"));

        let (loki_layer, loki) = match self.url {
            Some(url) => {
                let (layer, task) = Self::loki_layer(url, self.labels.unwrap_or_default())?;
                (Some(layer), Some(task))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(fmt)
            .with(loki_layer)
            .with(env_filter)
            .with(tracing_error::ErrorLayer::default())
            .init();

        init_panic_hook();

        Ok(LoggingTask { loki })
    }

    fn loki_layer(
        url: url::Url,
        mut labels: HashMap<String, String>,
    ) -> Result<(tracing_loki::Layer, LokiTask)> {
        labels.extend(
            GLOBAL_LABELS
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned())),
        );

        let builder = labels
            .into_iter()
            .try_fold(tracing_loki::builder(), |builder, (key, value)| {
                builder.label(key, value)
            })
            .fatal_ctx(|| "Invalid Loki label")?;

        let (layer, controller, task) = builder
            .build_controller_url(url)
            .fatal_ctx(|| "Failed to create the Loki logging layer")?;

        let task = tokio::spawn(task);

        Ok((layer, LokiTask { task, controller }))
    }
}

fn init_panic_hook() {
    let current_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        // The default hook must run first, otherwise we may not see the panic
        // at all if it happened inside of the `tracing` machinery itself.
        current_hook(panic_info);

        let location = panic_info.location().map(|location| {
            format!(
                "{}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            )
        });

        // If the panic message was formatted using interpolated values,
        // it will be a `String`. Otherwise, it will be a `&str`.
        let payload = panic_info.payload();
        let message = payload
            .downcast_ref::<String>()
            .map(<_>::deref)
            .or_else(|| payload.downcast_ref::<&str>().map(<_>::deref))
            .unwrap_or("<unknown>");

        let span_trace = tracing_error::SpanTrace::capture();

        error!(
            target: "panic",
            thread = std::thread::current().name(),
            location,
            span_trace = %span_trace,
            "{message}"
        );
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loki_config(vars: &[(&str, &str)]) -> LokiConfig {
        let vars = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()));

        from_vars("LOKI_", &non_empty_vars(vars)).unwrap()
    }

    #[test]
    fn empty_loki_vars_disable_loki() {
        let config = loki_config(&[("LOKI_URL", ""), ("LOKI_LABELS", " ")]);

        assert!(config.url.is_none());
        assert!(config.labels.is_none());
    }

    #[test]
    fn loki_vars_are_parsed() {
        let config = loki_config(&[
            ("LOKI_URL", "http://localhost:3100"),
            ("LOKI_LABELS", r#"{"env":"dev"}"#),
        ]);

        assert_eq!(config.url.unwrap().as_str(), "http://localhost:3100/");
        assert_eq!(config.labels.unwrap()["env"], "dev");
    }
}
