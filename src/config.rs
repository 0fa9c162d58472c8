use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::exercise::style::PresentationStyle;

const MAX_CONTINUE_DELAY_MS: u64 = 60_000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub submit_url: Option<String>,
    #[serde(default = "default_continue_delay_ms")]
    pub continue_delay_ms: u64,
    #[serde(default = "default_all_at_once_styles")]
    pub all_at_once_styles: Vec<PresentationStyle>,
    #[serde(default = "default_show_instructions")]
    pub show_instructions: bool,
}

fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ctest")
        .to_string_lossy()
        .to_string()
}
fn default_continue_delay_ms() -> u64 {
    3000
}
fn default_all_at_once_styles() -> Vec<PresentationStyle> {
    PresentationStyle::ALL.to_vec()
}
fn default_show_instructions() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            data_dir: default_data_dir(),
            submit_url: None,
            continue_delay_ms: default_continue_delay_ms(),
            all_at_once_styles: default_all_at_once_styles(),
            show_instructions: default_show_instructions(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.normalize();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ctest")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn results_path(&self) -> PathBuf {
        self.data_path().join("results")
    }

    /// Repair values a hand-edited file may have broken.
    pub fn normalize(&mut self) {
        if self.all_at_once_styles.is_empty() {
            self.all_at_once_styles = default_all_at_once_styles();
        }
        self.continue_delay_ms = self.continue_delay_ms.min(MAX_CONTINUE_DELAY_MS);
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
        if self
            .submit_url
            .as_deref()
            .is_some_and(|url| url.trim().is_empty())
        {
            self.submit_url = None;
        }
    }

    pub fn continue_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.continue_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.continue_delay_ms, 3000);
        assert_eq!(config.all_at_once_styles, PresentationStyle::ALL.to_vec());
        assert!(config.show_instructions);
        assert!(config.submit_url.is_none());
        assert!(config.data_dir.contains("ctest"));
    }

    #[test]
    fn test_config_partial_file_keeps_other_defaults() {
        let toml_str = r#"
theme = "terminal-default"
all_at_once_styles = ["box", "span"]
submit_url = "http://127.0.0.1:3000"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.theme, "terminal-default");
        assert_eq!(
            config.all_at_once_styles,
            vec![PresentationStyle::Box, PresentationStyle::Span]
        );
        assert_eq!(config.submit_url.as_deref(), Some("http://127.0.0.1:3000"));
        assert_eq!(config.continue_delay_ms, 3000);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.data_dir, deserialized.data_dir);
        assert_eq!(config.all_at_once_styles, deserialized.all_at_once_styles);
    }

    #[test]
    fn test_unknown_style_fails_to_parse() {
        let result = toml::from_str::<Config>(r#"all_at_once_styles = ["bold"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_repairs_values() {
        let mut config = Config {
            continue_delay_ms: 600_000,
            all_at_once_styles: Vec::new(),
            data_dir: "  ".to_string(),
            submit_url: Some(String::new()),
            ..Config::default()
        };
        config.normalize();
        assert_eq!(config.continue_delay_ms, 60_000);
        assert_eq!(config.all_at_once_styles.len(), 3);
        assert!(!config.data_dir.trim().is_empty());
        assert!(config.submit_url.is_none());
    }

    #[test]
    fn test_results_path_is_inside_data_dir() {
        let config = Config {
            data_dir: "/tmp/ctest-data".to_string(),
            ..Config::default()
        };
        assert_eq!(config.results_path(), PathBuf::from("/tmp/ctest-data/results"));
    }
}
