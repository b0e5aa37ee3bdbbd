use contracts::dashboards::d410_sales_overview::PeriodGranularity;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// JSON file with the raw model list
    pub payload_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Granularity of the initial overview
    #[serde(default = "default_granularity")]
    pub granularity: GranularityName,
    /// Batches with at least this many records are rolled up with rayon
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            granularity: default_granularity(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GranularityName {
    Month,
    Day,
}

impl From<GranularityName> for PeriodGranularity {
    fn from(name: GranularityName) -> Self {
        match name {
            GranularityName::Month => PeriodGranularity::Month,
            GranularityName::Day => PeriodGranularity::Day,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

fn default_granularity() -> GranularityName {
    GranularityName::Month
}

fn default_parallel_threshold() -> usize {
    50_000
}

fn default_log_file() -> String {
    "target/logs/sales_engine.log".to_string()
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[source]
payload_path = "data/models.json"

[engine]
granularity = "month"
parallel_threshold = 50000

[logging]
file = "target/logs/sales_engine.log"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                return parse_config(&contents);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    Ok(config)
}

/// Resolve a configured path. A relative path is looked up next to the
/// executable first and otherwise taken relative to the current directory.
pub fn resolve_path(path: &str) -> PathBuf {
    let candidate = Path::new(path);

    if candidate.is_absolute() {
        return candidate.to_path_buf();
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let beside_exe = exe_dir.join(candidate);
            if beside_exe.exists() {
                return beside_exe;
            }
        }
    }

    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.source.payload_path, "data/models.json");
        assert_eq!(config.engine.granularity, GranularityName::Month);
        assert_eq!(config.engine.parallel_threshold, 50_000);
    }

    #[test]
    fn test_sections_are_optional_except_source() {
        let config = parse_config("[source]\npayload_path = \"/tmp/x.json\"\n").unwrap();
        assert_eq!(config.engine.parallel_threshold, 50_000);
        assert_eq!(config.logging.file, "target/logs/sales_engine.log");
        assert_eq!(resolve_path(&config.source.payload_path), PathBuf::from("/tmp/x.json"));

        assert!(parse_config("[engine]\ngranularity = \"day\"\n").is_err());
    }
}
