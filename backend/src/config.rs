//! Engine configuration.
//!
//! Settings come from an optional `storewatch.toml` file with environment
//! variables taking precedence. Everything has a sensible default so a bare
//! `storewatch-server` start works.

use chrono::Duration;
use chrono_tz::Tz;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Fallback zone for stores without a timezone row.
pub const DEFAULT_TIMEZONE: &str = "America/Chicago";

/// Resolved engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Zone used when a store has no timezone row (or an unparseable one).
    pub default_timezone: Tz,
    /// Upper bound on concurrent per-store aggregations.
    pub max_workers: usize,
    /// Reconstruction margin in hours: edge padding for poll fetch and
    /// status interpolation. Must exceed the expected maximum gap between
    /// adjacent polls.
    pub margin_hours: i64,
    /// Directory report CSVs are written into.
    pub reports_dir: PathBuf,
}

/// Raw file-level configuration (`storewatch.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    default_timezone: Option<String>,
    #[serde(default)]
    max_workers: Option<usize>,
    #[serde(default)]
    margin_hours: Option<i64>,
    #[serde(default)]
    reports_dir: Option<PathBuf>,
}

impl FileConfig {
    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Search `storewatch.toml` in the standard locations.
    fn from_default_location() -> Self {
        let search_paths = [
            PathBuf::from("storewatch.toml"),
            PathBuf::from("backend/storewatch.toml"),
            PathBuf::from("../storewatch.toml"),
        ];
        for path in search_paths {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return config,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                        return Self::default();
                    }
                }
            }
        }
        Self::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(FileConfig::default())
    }
}

impl Config {
    /// Load configuration: `storewatch.toml` if present, env overrides on top.
    pub fn load() -> Self {
        Self::resolve(FileConfig::from_default_location())
    }

    fn resolve(file: FileConfig) -> Self {
        let tz_name = env::var("STOREWATCH_DEFAULT_TZ")
            .ok()
            .or(file.default_timezone)
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let default_timezone = tz_name.parse().unwrap_or_else(|_| {
            warn!(zone = %tz_name, "Unknown default timezone, falling back to {}", DEFAULT_TIMEZONE);
            chrono_tz::America::Chicago
        });

        let max_workers = env::var("STOREWATCH_MAX_WORKERS")
            .ok()
            .and_then(|s| s.parse().ok())
            .or(file.max_workers)
            .unwrap_or_else(default_max_workers)
            .max(1);

        let margin_hours = env::var("STOREWATCH_MARGIN_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .or(file.margin_hours)
            .unwrap_or(12)
            .max(1);

        let reports_dir = env::var("STOREWATCH_REPORTS_DIR")
            .ok()
            .map(PathBuf::from)
            .or(file.reports_dir)
            .unwrap_or_else(|| PathBuf::from("data/reports"));

        Self {
            default_timezone,
            max_workers,
            margin_hours,
            reports_dir,
        }
    }

    /// Reconstruction margin as a duration.
    pub fn margin(&self) -> Duration {
        Duration::hours(self.margin_hours)
    }
}

fn default_max_workers() -> usize {
    let parallelism = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2);
    parallelism.min(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::resolve(FileConfig::default());
        assert_eq!(config.default_timezone, chrono_tz::America::Chicago);
        assert_eq!(config.margin_hours, 12);
        assert!(config.max_workers >= 1 && config.max_workers <= 4);
        assert_eq!(config.reports_dir, PathBuf::from("data/reports"));
    }

    #[test]
    fn test_file_config_parse() {
        let parsed: FileConfig = toml::from_str(
            r#"
default_timezone = "America/Denver"
max_workers = 2
margin_hours = 6
reports_dir = "/tmp/reports"
"#,
        )
        .unwrap();
        assert_eq!(parsed.default_timezone.as_deref(), Some("America/Denver"));
        assert_eq!(parsed.max_workers, Some(2));
        assert_eq!(parsed.margin_hours, Some(6));
    }

    #[test]
    fn test_file_config_partial() {
        let parsed: FileConfig = toml::from_str("max_workers = 8").unwrap();
        assert_eq!(parsed.max_workers, Some(8));
        assert!(parsed.default_timezone.is_none());
    }

    #[test]
    fn test_margin_duration() {
        let config = Config::default();
        assert_eq!(config.margin(), Duration::hours(config.margin_hours));
    }
}
