use crate::cli::config::{ColorMode, Config, LogFormat};
use crate::cli::errors::CliError;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// `RUST_LOG` wins over the configured level. Logs go to stderr so program
/// output on stdout stays clean.
pub fn filter(config: &Config) -> Result<EnvFilter, CliError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| CliError::Logging(format!("invalid log level '{}': {}", config.log_level, e))),
    }
}

/// Event formatting for `format`, written through `writer`.
pub fn fmt_layer<S, W>(format: LogFormat, ansi: bool, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed(),
    }
}

pub fn init(config: &Config) -> Result<(), CliError> {
    let filter = filter(config)?;
    let ansi = config.color != ColorMode::Never;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer(config.log_format, ansi, std::io::stderr))
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}
