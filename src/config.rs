//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::playlist::{expand_definition, PlaylistDef, DEFAULT_LIST_SIZE};
use crate::stats::{GroupBy, StatGroup};
use crate::token::{canonical_text, extract_tokens, TokenResult, MAX_YEAR, MIN_YEAR};
use chrono::Weekday;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub stats: Vec<StatsConfig>,

    #[serde(default)]
    pub playlists: Vec<PlaylistConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Run-wide engine settings
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// First day of the week, 0 = Sunday .. 6 = Saturday
    #[serde(default)]
    pub week_start: u32,

    /// Minutes subtracted from every history timestamp
    #[serde(default)]
    pub midnight_offset: i64,

    #[serde(default = "default_history_field")]
    pub history_field: String,

    /// strftime pattern for history entries; empty tries common layouts
    #[serde(default)]
    pub history_format: String,

    #[serde(default = "default_history_separator")]
    pub history_separator: String,

    #[serde(default = "default_series_separator")]
    pub series_separator: String,

    #[serde(default = "default_true")]
    pub infer_prehistory: bool,

    /// First year of per-year playlists without an explicit start
    #[serde(default = "default_yearly_base")]
    pub yearly_base: i32,

    #[serde(default = "default_true")]
    pub update_stats: bool,

    #[serde(default = "default_true")]
    pub update_playlists: bool,
}

fn default_history_field() -> String {
    "Play History".to_string()
}

fn default_history_separator() -> String {
    ";".to_string()
}

fn default_series_separator() -> String {
    ",".to_string()
}

fn default_true() -> bool {
    true
}

fn default_yearly_base() -> i32 {
    2020
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            week_start: 0,
            midnight_offset: 0,
            history_field: default_history_field(),
            history_format: String::new(),
            history_separator: default_history_separator(),
            series_separator: default_series_separator(),
            infer_prehistory: true,
            yearly_base: default_yearly_base(),
            update_stats: true,
            update_playlists: true,
        }
    }
}

impl EngineConfig {
    /// Configured week start as a weekday
    pub fn week_start_day(&self) -> Weekday {
        match self.week_start {
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            6 => Weekday::Sat,
            _ => Weekday::Sun,
        }
    }
}

/// One statistics group: a template written to a field
#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Append to the field's current value instead of replacing it
    #[serde(default)]
    pub append: bool,

    #[serde(default = "default_update_field")]
    pub update_field: String,

    /// Field shared by grouped files; `key` fills each file on its own
    #[serde(default = "default_group_by_field")]
    pub group_by_field: String,

    #[serde(default = "default_template")]
    pub template: String,
}

fn default_update_field() -> String {
    "Play Stats".to_string()
}

fn default_group_by_field() -> String {
    "key".to_string()
}

fn default_template() -> String {
    "[total];[year];[month];[week];[today];[today-1];[year-1];[month-1];[week-1]".to_string()
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            append: false,
            update_field: default_update_field(),
            group_by_field: default_group_by_field(),
            template: default_template(),
        }
    }
}

impl StatsConfig {
    pub fn to_group(&self) -> StatGroup {
        StatGroup {
            update_field: self.update_field.clone(),
            group_by: GroupBy::from_field(&self.group_by_field),
            template: self.template.clone(),
            append: self.append,
        }
    }
}

/// One playlist definition
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistConfig {
    pub name: String,

    pub token: String,

    #[serde(default = "default_list_size")]
    pub max: usize,
}

fn default_list_size() -> usize {
    DEFAULT_LIST_SIZE
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("playstats").join("config.toml")),
            Some(PathBuf::from("./playstats.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(day) = lookup("PLAYSTATS_WEEK_START") {
            if let Ok(d) = day.parse() {
                self.engine.week_start = d;
            }
        }
        if let Some(offset) = lookup("PLAYSTATS_MIDNIGHT_OFFSET") {
            if let Ok(m) = offset.parse() {
                self.engine.midnight_offset = m;
            }
        }
        if let Some(format) = lookup("PLAYSTATS_HISTORY_FORMAT") {
            self.engine.history_format = format;
        }

        if let Some(level) = lookup("PLAYSTATS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("PLAYSTATS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Check settings that do not depend on token resolution
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.engine.week_start > 6 {
            problems.push(format!(
                "week_start must be 0..6, got {}",
                self.engine.week_start
            ));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&i64::from(self.engine.yearly_base)) {
            problems.push(format!(
                "yearly_base must be {}..{}, got {}",
                MIN_YEAR, MAX_YEAR, self.engine.yearly_base
            ));
        }
        if chrono::Duration::try_minutes(self.engine.midnight_offset).is_none() {
            problems.push(format!(
                "midnight_offset is out of range: {} minutes",
                self.engine.midnight_offset
            ));
        }
        if self.engine.history_separator.is_empty() {
            problems.push("history_separator must not be empty".to_string());
        }
        if self.engine.series_separator.is_empty() {
            problems.push("series_separator must not be empty".to_string());
        }
        for (i, stats) in self.enabled_stats().enumerate() {
            if stats.update_field.trim().is_empty() {
                problems.push(format!("stats #{}: update_field must not be empty", i + 1));
            }
            if stats.template.trim().is_empty() {
                problems.push(format!("stats #{}: template must not be empty", i + 1));
            }
        }
        for playlist in &self.playlists {
            if playlist.name.trim().is_empty() {
                problems.push("playlist name must not be empty".to_string());
            }
            if canonical_text(&playlist.token).is_empty() {
                problems.push(format!("playlist '{}': token must not be empty", playlist.name));
            }
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            problems.push(format!(
                "logging format must be 'pretty' or 'json', got '{}'",
                self.logging.format
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    pub fn enabled_stats(&self) -> impl Iterator<Item = &StatsConfig> {
        self.stats.iter().filter(|s| s.enabled)
    }

    /// Statistics groups that take part in a run
    pub fn stat_groups(&self) -> Vec<StatGroup> {
        self.enabled_stats().map(StatsConfig::to_group).collect()
    }

    /// Canonical text of every token of enabled templates and playlists
    pub fn token_texts(&self) -> Vec<String> {
        let mut texts: Vec<String> = self
            .enabled_stats()
            .flat_map(|s| extract_tokens(&s.template))
            .collect();
        texts.extend(self.playlists.iter().map(|p| canonical_text(&p.token)));
        texts
    }

    /// Concrete playlist definitions, with per-year playlists expanded
    pub fn expanded_playlists(&self, current_year: i32) -> TokenResult<Vec<PlaylistDef>> {
        let mut defs = Vec::new();
        for playlist in &self.playlists {
            defs.extend(expand_definition(
                &playlist.name,
                &playlist.token,
                playlist.max,
                self.engine.yearly_base,
                current_year,
            )?);
        }
        Ok(defs)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Playstats Configuration
#
# Environment variables override these settings:
# - PLAYSTATS_WEEK_START
# - PLAYSTATS_MIDNIGHT_OFFSET
# - PLAYSTATS_HISTORY_FORMAT
# - PLAYSTATS_LOG_LEVEL
# - PLAYSTATS_LOG_FORMAT

[engine]
# First day of the week: 0 = Sunday .. 6 = Saturday
week_start = 0

# Minutes subtracted from every play timestamp (late-night plays count
# towards the previous day)
midnight_offset = 0

# Library field holding the play history
history_field = "Play History"

# strftime pattern for history entries; leave empty to try common layouts.
# Spreadsheet serial dates are detected automatically.
history_format = ""

# Separator between history entries
history_separator = ";"

# Separator used when rendering per-period series
series_separator = ","

# Spread plays counted by the library but missing from the history
# between the import date and the oldest recorded play
infer_prehistory = true

# First year of per-year playlists without an explicit start year
yearly_base = 2020

# Run stages
update_stats = true
update_playlists = true

[[stats]]
enabled = true

# Append to the current field value instead of replacing it
append = false

# Field receiving the filled template
update_field = "Play Stats"

# Group files sharing this field; "key" fills each file on its own
group_by_field = "key"

template = "[total];[year];[month];[week];[today];[today-1];[year-1];[month-1];[week-1]"

[[playlists]]
name = "Recently Played"
token = "[recent]"
max = 100

[[playlists]]
name = "Top [year]"
token = "[peryear]"
max = 100

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.history_field, "Play History");
        assert_eq!(config.engine.history_separator, ";");
        assert!(config.engine.infer_prehistory);
        assert_eq!(config.engine.yearly_base, 2020);
        assert!(config.stats.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generated_default_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.stats.len(), 1);
        assert_eq!(config.playlists.len(), 2);
        assert_eq!(config.token_texts().len(), 11);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[engine]
week_start = 1

[[stats]]
enabled = true
group_by_field = "Artist"

[[playlists]]
name = "Fresh"
token = "[recent]"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.engine.week_start_day(), Weekday::Mon);
        assert_eq!(config.engine.series_separator, ",");
        assert_eq!(config.stats[0].update_field, "Play Stats");
        assert_eq!(
            config.stats[0].to_group().group_by,
            GroupBy::Field("Artist".to_string())
        );
        assert_eq!(config.playlists[0].max, DEFAULT_LIST_SIZE);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load(&missing),
            Err(ConfigError::Io { .. })
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[engine\nweek_start = ").unwrap();
        assert!(matches!(Config::load(&bad), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PLAYSTATS_WEEK_START", "6"),
            ("PLAYSTATS_MIDNIGHT_OFFSET", "not a number"),
            ("PLAYSTATS_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.engine.week_start, 6);
        assert_eq!(config.engine.midnight_offset, 0);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_collects_problems() {
        let mut config = Config::default();
        config.engine.week_start = 9;
        config.engine.yearly_base = 1;
        config.engine.midnight_offset = i64::MAX;
        config.engine.history_separator.clear();
        config.stats.push(StatsConfig {
            enabled: true,
            template: " ".to_string(),
            ..Default::default()
        });
        config.stats.push(StatsConfig {
            enabled: false,
            template: String::new(),
            ..Default::default()
        });

        match config.validate() {
            Err(ConfigError::Invalid(problems)) => {
                assert_eq!(problems.len(), 5);
                assert!(problems.iter().any(|p| p.starts_with("yearly_base")));
                assert!(problems.iter().any(|p| p.starts_with("midnight_offset")));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_validate_yearly_base_bounds() {
        let mut config = Config::default();
        config.engine.yearly_base = 2000;
        assert!(config.validate().is_ok());
        config.engine.yearly_base = 2100;
        assert!(config.validate().is_ok());
        config.engine.yearly_base = 1500;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(p)) if p.len() == 1));
    }

    #[test]
    fn test_token_texts_skip_disabled_groups() {
        let config = Config {
            stats: vec![
                StatsConfig {
                    enabled: true,
                    template: "[Total] / [today]".to_string(),
                    ..Default::default()
                },
                StatsConfig::default(),
            ],
            playlists: vec![PlaylistConfig {
                name: "p".to_string(),
                token: "[ Unplayed ]".to_string(),
                max: 10,
            }],
            ..Default::default()
        };
        assert_eq!(config.token_texts(), vec!["total", "today", "unplayed"]);
    }

    #[test]
    fn test_expanded_playlists() {
        let config = Config {
            playlists: vec![
                PlaylistConfig {
                    name: "Top [year]".to_string(),
                    token: "[peryear=2023]".to_string(),
                    max: 25,
                },
                PlaylistConfig {
                    name: "Fresh".to_string(),
                    token: "[recent]".to_string(),
                    max: 10,
                },
            ],
            ..Default::default()
        };

        let defs = config.expanded_playlists(2024).unwrap();
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Top 2023", "Top 2024", "Fresh"]);
    }
}
