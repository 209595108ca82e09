use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_host_list")]
    pub host_list: PathBuf,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_program")]
    pub program: String,
    /// Extra arguments placed before `-p <port> -oG -`.
    #[serde(default = "default_scan_args")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Ticks between scans.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
    /// Ticks between summary flushes.
    #[serde(default = "default_log_interval")]
    pub log_interval: u64,
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_summary_path")]
    pub summary_path: PathBuf,
    /// Per-host event logs are written here when set.
    #[serde(default)]
    pub host_log_dir: Option<PathBuf>,
}

fn default_host_list() -> PathBuf {
    PathBuf::from("ipList.json")
}

fn default_port() -> u16 {
    3632
}

fn default_program() -> String {
    "nmap".to_string()
}

fn default_scan_args() -> Vec<String> {
    vec!["-sS".to_string()]
}

fn default_scan_interval() -> u64 {
    5
}

fn default_log_interval() -> u64 {
    30
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_summary_path() -> PathBuf {
    PathBuf::from("log.log")
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            host_list: default_host_list(),
            port: default_port(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_scan_args(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            scan_interval: default_scan_interval(),
            log_interval: default_log_interval(),
            tick_millis: default_tick_millis(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            summary_path: default_summary_path(),
            host_log_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.watch.port, 3632);
        assert_eq!(config.scan.program, "nmap");
        assert_eq!(config.scan.args, vec!["-sS"]);
        assert_eq!(config.schedule.scan_interval, 5);
        assert_eq!(config.schedule.log_interval, 30);
        assert_eq!(config.log.summary_path, PathBuf::from("log.log"));
        assert!(config.log.host_log_dir.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [watch]
            port = 22

            [log]
            host_log_dir = "/var/log/uptime"
            "#,
        )
        .unwrap();
        assert_eq!(config.watch.port, 22);
        assert_eq!(config.watch.host_list, PathBuf::from("ipList.json"));
        assert_eq!(config.log.host_log_dir, Some(PathBuf::from("/var/log/uptime")));
        assert_eq!(config.schedule.tick_millis, 1000);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load("/nonexistent/uptime.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
