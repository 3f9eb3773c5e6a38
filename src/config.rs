use crate::error::{LoupeError, Result};
use crate::navigator::{NavigatorLimits, DEFAULT_AUTO_EXPAND_THRESHOLD, DEFAULT_MAX_VISIBLE_ROWS};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How deep below each root to look for repositories
    pub max_depth: usize,
    pub debounce_ms: u64,
    pub auto_expand_threshold: usize,
    pub max_visible_rows: usize,
    pub layout: LayoutConfig,
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub show_status_bar: bool,
    /// Columns of indentation per tree level
    pub indent_width: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 5,
            debounce_ms: 100,
            auto_expand_threshold: DEFAULT_AUTO_EXPAND_THRESHOLD,
            max_visible_rows: DEFAULT_MAX_VISIBLE_ROWS,
            layout: LayoutConfig::default(),
            theme: Theme::default(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            show_status_bar: true,
            indent_width: 2,
        }
    }
}

impl Config {
    /// Load from an optional JSON file. No path means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|e| LoupeError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| LoupeError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        log::info!("⚙️ Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn navigator_limits(&self) -> NavigatorLimits {
        NavigatorLimits {
            auto_expand_threshold: self.auto_expand_threshold,
            max_visible_rows: self.max_visible_rows,
        }
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_file() {
        let config = Config::load(None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.debounce_delay(), Duration::from_millis(100));
        assert_eq!(config.navigator_limits(), NavigatorLimits::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_depth": 2, "layout": {{"indent_width": 4}}}}"#).unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.layout.indent_width, 4);
        assert!(config.layout.show_status_bar);
        assert_eq!(config.debounce_ms, 100);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert_matches!(Config::load(Some(file.path())), Err(LoupeError::Config { .. }));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert_matches!(Config::load(Some(&missing)), Err(LoupeError::Config { .. }));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loupe.json");
        let config = Config {
            debounce_ms: 250,
            ..Config::default()
        };
        config.save_to_file(&path).unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }
}
