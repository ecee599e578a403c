use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::system::dynamic::DEFAULT_DENY_LIST;
use crate::ui::RenderOptions;
use crate::ui::bar::{BarStyle, EMPTY_GLYPH, FILLED_GLYPH};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub display: DisplayConfig,
    pub processes: ProcessesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Terminal,
    Json,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub interval_ms: u64,
    pub sample_delay_ms: u64,
    pub output: OutputMode,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            interval_ms: 2000,
            sample_delay_ms: 1000,
            output: OutputMode::Terminal,
        }
    }
}

impl GeneralConfig {
    pub fn timing(&self) -> Timing {
        Timing {
            period: Duration::from_millis(self.interval_ms.max(1)),
            sample_delay: Duration::from_millis(self.sample_delay_ms),
        }
    }
}

/// Report period and the gap between the two counter reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub period: Duration,
    pub sample_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        GeneralConfig::default().timing()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub bar_width: usize,
    pub filled_glyph: char,
    pub empty_glyph: char,
    pub max_line_width: usize,
    pub max_processes: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            bar_width: 50,
            filled_glyph: FILLED_GLYPH,
            empty_glyph: EMPTY_GLYPH,
            max_line_width: 120,
            max_processes: 25,
        }
    }
}

impl DisplayConfig {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            bar: BarStyle {
                width: self.bar_width,
                filled: self.filled_glyph,
                empty: self.empty_glyph,
            },
            max_line_width: self.max_line_width,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProcessesConfig {
    pub deny_list: Vec<String>,
}

impl Default for ProcessesConfig {
    fn default() -> Self {
        ProcessesConfig {
            deny_list: DEFAULT_DENY_LIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("cpuscope").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.general.interval_ms, 2000);
        assert_eq!(config.general.sample_delay_ms, 1000);
        assert_eq!(config.general.output, OutputMode::Terminal);
        assert_eq!(config.display.bar_width, 50);
        assert!(config.processes.deny_list.iter().any(|n| n == "svchost"));
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[general]
interval_ms = 500
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.interval_ms, 500);
        // Other fields should be defaults
        assert_eq!(config.general.sample_delay_ms, 1000);
        assert_eq!(config.display.max_processes, 25);
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r##"
[general]
interval_ms = 3000
sample_delay_ms = 1500
output = "json"

[display]
bar_width = 20
filled_glyph = "#"
empty_glyph = "-"
max_line_width = 0

[processes]
deny_list = ["chrome"]

[logging]
level = "debug"
format = "json"
"##;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.general.timing(),
            Timing {
                period: Duration::from_millis(3000),
                sample_delay: Duration::from_millis(1500),
            }
        );
        assert_eq!(config.general.output, OutputMode::Json);
        let options = config.display.render_options();
        assert_eq!(options.bar.width, 20);
        assert_eq!(options.bar.filled, '#');
        assert_eq!(options.max_line_width, 0);
        assert_eq!(config.processes.deny_list, vec!["chrome".to_string()]);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn zero_interval_is_clamped() {
        let general = GeneralConfig {
            interval_ms: 0,
            ..GeneralConfig::default()
        };
        assert_eq!(general.timing().period, Duration::from_millis(1));
    }

    #[test]
    fn missing_file_returns_default() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.toml"));
        assert_eq!(config.general.interval_ms, 2000);
    }

    #[test]
    fn invalid_toml_returns_default() {
        let temp = std::env::temp_dir().join("cpuscope_test_invalid.toml");
        std::fs::write(&temp, "this is not valid toml {{{{").unwrap();
        let config = load_config_from_path(&temp);
        assert_eq!(config.general.interval_ms, 2000);
        let _ = std::fs::remove_file(&temp);
    }
}
