//! Tracker configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Explicit path, or the override in the data dir
//!    (~/.local/share/tally/config/tally.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Sections or keys missing from an override keep their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/tally.toml");

/// Complete tracker configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub budgets: BudgetSettings,
    pub categories: CategoryLabels,
    pub trends: TrendSettings,
    pub reports: ReportSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BudgetSettings {
    /// Percent of a budget at which the alert fires, 1-100
    pub default_alert_threshold: u32,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            default_alert_threshold: 80,
        }
    }
}

impl BudgetSettings {
    pub fn default_threshold(&self) -> Decimal {
        Decimal::from(self.default_alert_threshold)
    }
}

/// Display labels and defaults for categories
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CategoryLabels {
    pub uncategorized_label: String,
    pub unknown_label: String,
    pub default_color: String,
}

impl Default for CategoryLabels {
    fn default() -> Self {
        Self {
            uncategorized_label: "Uncategorized".to_string(),
            unknown_label: "Unknown".to_string(),
            default_color: "#6366F1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrendSettings {
    /// Change between the halves of a range (percent) above which the
    /// range counts as increasing or decreasing
    pub band_percent: u32,
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self { band_percent: 5 }
    }
}

impl TrendSettings {
    pub fn band(&self) -> Decimal {
        Decimal::from(self.band_percent)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Cap on yearly top categories; `None` lists all
    pub top_categories_limit: Option<usize>,
}

impl TrackerConfig {
    /// Load configuration (override first, then default)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        match override_path {
            Some(path) => Self::parse(&read_config(path)?),
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    debug!(path = %path.display(), "Loading config override");
                    Self::parse(&read_config(&path)?)
                }
                _ => {
                    debug!("Using embedded default config");
                    Self::embedded()
                }
            },
        }
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: TrackerConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// The embedded defaults
    pub fn embedded() -> Result<Self> {
        Self::parse(DEFAULT_CONFIG)
    }

    fn validate(&self) -> Result<()> {
        let threshold = self.budgets.default_alert_threshold;
        if !(1..=100).contains(&threshold) {
            return Err(Error::Config(format!(
                "default_alert_threshold must be between 1 and 100, got {}",
                threshold
            )));
        }
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config {}: {}", path.display(), e))
    })
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("config").join("tally.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedded_config_matches_defaults() {
        let config = TrackerConfig::embedded().unwrap();
        assert_eq!(config.budgets.default_alert_threshold, 80);
        assert_eq!(config.categories.uncategorized_label, "Uncategorized");
        assert_eq!(config.categories.unknown_label, "Unknown");
        assert_eq!(config.trends.band_percent, 5);
        assert_eq!(config.reports.top_categories_limit, None);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = TrackerConfig::parse(
            r#"
            [budgets]
            default_alert_threshold = 90
            "#,
        )
        .unwrap();
        assert_eq!(config.budgets.default_alert_threshold, 90);
        assert_eq!(config.trends.band_percent, 5);
        assert_eq!(config.categories.default_color, "#6366F1");
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let err = TrackerConfig::parse("[budgets]\ndefault_alert_threshold = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn loads_explicit_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[reports]\ntop_categories_limit = 3").unwrap();

        let config = TrackerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.reports.top_categories_limit, Some(3));
    }

    #[test]
    fn missing_explicit_override_is_an_error() {
        let result = TrackerConfig::load(Some(Path::new("/nonexistent/tally.toml")));
        assert!(result.is_err());
    }
}
