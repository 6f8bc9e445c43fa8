use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::presentation::config::{Environment, LoggingSettings};

const FALLBACK_DIRECTIVE: &str = "info,whisper_relay=debug,tower_http=debug";

/// Subscriber options derived from `[logging]`.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: Environment,
    pub default_directive: String,
    pub json_format: bool,
}

impl TracingConfig {
    pub fn new(environment: Environment, logging: &LoggingSettings) -> Self {
        Self {
            environment,
            default_directive: logging.level.clone(),
            json_format: logging.enable_json,
        }
    }

    /// The configured directive, or the built-in one when it does not parse.
    pub fn effective_directive(&self) -> &str {
        if EnvFilter::try_new(&self.default_directive).is_ok() {
            &self.default_directive
        } else {
            FALLBACK_DIRECTIVE
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            default_directive: FALLBACK_DIRECTIVE.to_string(),
            json_format: false,
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init_tracing(config: &TracingConfig) {
    let directive = config.effective_directive();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let output = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_format {
        registry.with(output.json()).init();
    } else {
        registry.with(output).init();
    }

    if directive != config.default_directive {
        tracing::warn!(
            configured = %config.default_directive,
            "Ignoring unparseable log level"
        );
    }
    tracing::info!(
        environment = %config.environment,
        json = config.json_format,
        "Logging initialized"
    );
}
