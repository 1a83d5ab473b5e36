mod config;

use clap::Parser;
use config::{Config, ConfigError, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use proxy::errors::ProxyError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "asyncproxy", about = "Forward HTTP proxy with transfer statistics")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "asyncproxy.yaml")]
    config_file: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid sentry DSN: {0}")]
    SentryDsn(String),
    #[error("could not set up statsd exporter: {0}")]
    Metrics(String),
    #[error("could not start runtime: {0}")]
    Runtime(std::io::Error),
    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "asyncproxy exited");
            eprintln!("asyncproxy: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), StartupError> {
    let config = Config::from_file(&cli.config_file)?;

    // Sentry has to be initialized before the runtime starts its threads.
    let _sentry = init_logging(&config.common.logging)?;

    if let Some(metrics_config) = &config.common.metrics {
        init_metrics(metrics_config)?;
    }

    tracing::info!(config_file = %cli.config_file.display(), "Starting asyncproxy");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;

    runtime.block_on(proxy::run(config.proxy))?;
    Ok(())
}

fn init_logging(config: &LoggingConfig) -> Result<Option<sentry::ClientInitGuard>, StartupError> {
    let guard = match &config.sentry_dsn {
        Some(dsn) => {
            let dsn = dsn
                .parse::<sentry::types::Dsn>()
                .map_err(|e| StartupError::SentryDsn(e.to_string()))?;
            Some(sentry::init(sentry::ClientOptions {
                dsn: Some(dsn),
                release: sentry::release_name!(),
                ..Default::default()
            }))
        }
        None => None,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let sentry_layer = guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();

    Ok(guard)
}

fn init_metrics(config: &MetricsConfig) -> Result<(), StartupError> {
    let recorder = StatsdBuilder::from(config.statsd_host.as_str(), config.statsd_port)
        .build(Some(config.prefix.as_str()))
        .map_err(|e| StartupError::Metrics(e.to_string()))?;

    metrics::set_global_recorder(recorder)
        .map_err(|_| StartupError::Metrics("a metrics recorder is already installed".into()))?;
    shared::metrics_defs::describe_all(proxy::metrics_defs::ALL_METRICS);

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Sending metrics to statsd"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_default_config_file() {
        let cli = Cli::parse_from(["asyncproxy"]);
        assert_eq!(cli.config_file, PathBuf::from("asyncproxy.yaml"));

        let cli = Cli::parse_from(["asyncproxy", "--config-file", "/etc/asyncproxy.yaml"]);
        assert_eq!(cli.config_file, PathBuf::from("/etc/asyncproxy.yaml"));
    }
}
