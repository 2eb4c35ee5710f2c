use std::sync::OnceLock;

use env_logger::{Builder, Env};

/// Filter used when neither the config nor `RUST_LOG` names one.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Logger setup for the viewer and tools.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// `env_logger` filter directives; overrides `RUST_LOG` when set.
    pub filter: Option<String>,
    /// Omit timestamps, e.g. when output is captured by another tool.
    pub plain: bool,
}

static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Installs the global logger. Only the first call has an effect.
///
/// Returns `false` when another logger was already registered, as happens
/// under test harnesses that install their own.
pub fn init_logging(config: LoggingConfig) -> bool {
    *INSTALLED.get_or_init(|| {
        let mut builder = Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER));
        if let Some(filter) = &config.filter {
            builder.parse_filters(filter);
        }
        if config.plain {
            builder.format_timestamp(None);
        }

        let installed = builder.try_init().is_ok();
        if installed {
            log::debug!("logger installed");
        }
        installed
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_call_returns_the_first_result() {
        let first = init_logging(LoggingConfig {
            plain: true,
            ..LoggingConfig::default()
        });
        assert_eq!(init_logging(LoggingConfig::default()), first);
    }
}
