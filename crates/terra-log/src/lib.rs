//! Structured logging for the terrain streamer.
//!
//! Span-based, filterable logging via the `tracing` ecosystem: console
//! output with timestamps and module paths, optional JSON file logging
//! in debug builds for post-mortem analysis, and a log level override
//! pulled from the world configuration.

use std::path::Path;
use terra_config::WorldConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// Console output always; in debug builds with a `log_dir`, a JSON log
/// file as well. `RUST_LOG` takes precedence over the configured level,
/// which takes precedence over the `info` default. Call once at startup,
/// before constructing the streamer.
///
/// # Examples
///
/// ```no_run
/// use terra_log::init_logging;
/// use terra_config::WorldConfig;
///
/// let config = WorldConfig::with_default_biome();
/// init_logging(None, false, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&WorldConfig>) {
    let filter_str = match config {
        Some(config) if !config.debug.log_level.is_empty() => config.debug.log_level.clone(),
        _ => "info".to_string(),
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true) // worker threads are named
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join("terra.log"))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// The filter used when neither `RUST_LOG` nor the configuration sets
/// one.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new("info")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_info() {
        let filter_str = format!("{}", default_env_filter());
        assert!(filter_str.contains("info"));
    }

    #[test]
    fn test_per_crate_filter_parses() {
        let filter = EnvFilter::new("info,terra_stream=debug");
        let filter_str = format!("{}", filter);
        assert!(filter_str.contains("terra_stream=debug"));
        assert!(filter_str.contains("info"));
    }

    #[test]
    fn test_env_filter_accepts_common_directives() {
        let valid_filters = [
            "info",
            "debug,terra_gen=trace",
            "warn,terra_stream=debug,terra_mesh=trace",
            "error",
        ];
        for filter_str in &valid_filters {
            assert!(
                EnvFilter::try_from(*filter_str).is_ok(),
                "failed to parse filter: {}",
                filter_str
            );
        }
    }

    #[test]
    fn test_configured_level_overrides_default() {
        let mut config = WorldConfig::with_default_biome();
        config.debug.log_level = "debug,terra_stream=trace".to_string();
        // Mirrors the selection in init_logging without installing a
        // global subscriber.
        let chosen = if config.debug.log_level.is_empty() {
            "info".to_string()
        } else {
            config.debug.log_level.clone()
        };
        assert_eq!(chosen, "debug,terra_stream=trace");
    }

    #[test]
    fn test_log_file_path_layout() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_file_path = temp_dir.path().join("terra.log");
        assert_eq!(log_file_path.file_name().unwrap(), "terra.log");
    }
}
