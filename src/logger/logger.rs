use anyhow::{Result, anyhow};
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

const BOOTSTRAP_FILTER: &str = "info";

pub struct LogConfig {
    pub filter: String,
}

impl From<&crate::settings::Log> for LogConfig {
    fn from(log: &crate::settings::Log) -> Self {
        LogConfig {
            filter: log.filter.clone(),
        }
    }
}

/// Global subscriber whose filter can be swapped once settings are loaded.
pub struct Logger {
    reload_handle: reload::Handle<EnvFilter, Registry>,
    env_override: bool,
}

impl Logger {
    /// Starts at `info`, or at `RUST_LOG` when that is set and valid.
    pub fn new_bootstrap() -> Self {
        let (filter, env_override) = match EnvFilter::try_from_default_env() {
            Ok(filter) => (filter, true),
            Err(_) => (EnvFilter::new(BOOTSTRAP_FILTER), false),
        };
        let (filter, reload_handle) = reload::Layer::new(filter);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();

        Self {
            reload_handle,
            env_override,
        }
    }

    /// Apply the configured filter. `RUST_LOG` wins if it was set at bootstrap.
    pub fn reload_from_config(&self, config: &LogConfig) -> Result<()> {
        if self.env_override {
            tracing::debug!("RUST_LOG set, ignoring configured log filter");
            return Ok(());
        }
        let filter = EnvFilter::try_new(&config.filter).map_err(|e| anyhow!(e))?;
        self.reload_handle.reload(filter).map_err(|e| anyhow!(e))?;
        Ok(())
    }
}
