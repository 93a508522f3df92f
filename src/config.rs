//! Configuration
//!
//! Provides configuration management with:
//! - Config file loading (optional, TOML)
//! - Environment variable overrides
//! - Runtime defaults
//! - Validation
//!
//! Command-line flags are applied by the binary on top of the loaded configuration,
//! before [`Config::validate`] runs.

use crate::error::CostsError;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const LOG_FORMATS: &[&str] = &["compact", "pretty", "json"];
const LOG_OUTPUTS: &[&str] = &["console", "file", "both"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Lookback window in days.
    pub days: u32,
    /// Rows in the project table; 0 shows every project.
    pub top_projects: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub verbose: bool,
    pub show_cache: bool,
    /// Emit the report as JSON instead of the terminal layout.
    pub json: bool,
    pub json_pretty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub claude_home: PathBuf,
    pub log_directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
            output: "console".to_string(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            days: 30,
            top_projects: 10,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            show_cache: false,
            json: false,
            json_pretty: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            claude_home: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".claude"),
            log_directory: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Load configuration from defaults, the first config file found, and the environment
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let config_paths = [
            PathBuf::from("claude-costs.toml"),
            PathBuf::from(".claude-costs.toml"),
            dirs::config_dir()
                .map(|d| d.join("claude-costs").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        if let Ok(val) = env::var("CLAUDE_COSTS_DAYS") {
            self.analysis.days = val.parse().context("Invalid CLAUDE_COSTS_DAYS")?;
        }
        if let Ok(val) = env::var("CLAUDE_COSTS_TOP_PROJECTS") {
            self.analysis.top_projects = val.parse().context("Invalid CLAUDE_COSTS_TOP_PROJECTS")?;
        }

        if let Ok(val) = env::var("CLAUDE_HOME") {
            self.paths.claude_home = PathBuf::from(val);
        }
        if let Ok(val) = env::var("CLAUDE_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.analysis.days == 0 {
            return Err(CostsError::InvalidConfig("days must be at least 1".to_string()).into());
        }

        self.cutoff(Local::now())?;

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(CostsError::InvalidConfig(format!(
                "log format must be one of {:?}, got {:?}",
                LOG_FORMATS, self.logging.format
            ))
            .into());
        }

        if !LOG_OUTPUTS.contains(&self.logging.output.as_str()) {
            return Err(CostsError::InvalidConfig(format!(
                "log output must be one of {:?}, got {:?}",
                LOG_OUTPUTS, self.logging.output
            ))
            .into());
        }

        if !self.paths.claude_home.is_dir() {
            return Err(CostsError::NoClaudeDir(self.paths.claude_home.clone()).into());
        }

        Ok(())
    }

    /// Start of the lookback window.
    pub fn cutoff(&self, now: DateTime<Local>) -> Result<DateTime<Local>> {
        Duration::try_days(i64::from(self.analysis.days))
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                CostsError::InvalidConfig(format!(
                    "days = {} reaches past the earliest representable date",
                    self.analysis.days
                ))
                .into()
            })
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}
