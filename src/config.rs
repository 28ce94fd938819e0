/// Analysis configuration
///
/// Loaded from a TOML file; every section and key is optional and falls
/// back to the engine defaults. Values are validated into engine types
/// (`NightWindow`, `RangeSpec`, ...) before any computation runs, so a bad
/// config fails up front rather than halfway through a report.
///
/// ```toml
/// [outliers]
/// threshold = 3.0
/// replacement = "median"
///
/// [nighttime]
/// start_hour = 18
/// end_hour = 6
///
/// [aggregation]
/// bucket_days = 1
/// method = "mean"
///
/// [correlation]
/// columns = ["GHI", "DNI", "DHI", "Tamb"]
/// frequency = "weekly"
///
/// [ranges]
/// GHI = [0.0, 1200.0]
///
/// [logging]
/// level = "info"
/// timestamps = true
/// ```

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::analysis::aggregation::{AggregationMethod, Frequency};
use crate::analysis::nighttime::{NightWindow, DEFAULT_NIGHT_END, DEFAULT_NIGHT_START};
use crate::analysis::outliers::DEFAULT_Z_THRESHOLD;
use crate::analysis::remediation::{RangeSpec, ReplacementMethod};
use crate::logging::{Component, LogLevel};
use crate::model::{AnalysisError, Result};

/// Environment variable naming the config file to load.
pub const CONFIG_ENV_VAR: &str = "SOLAR_INSIGHT_CONFIG";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutlierConfig {
    pub threshold: f64,
    pub replacement: ReplacementMethod,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        OutlierConfig { threshold: DEFAULT_Z_THRESHOLD, replacement: ReplacementMethod::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NighttimeConfig {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for NighttimeConfig {
    fn default() -> Self {
        NighttimeConfig { start_hour: DEFAULT_NIGHT_START, end_hour: DEFAULT_NIGHT_END }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregationConfig {
    pub bucket_days: u32,
    pub method: AggregationMethod,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        AggregationConfig { bucket_days: 1, method: AggregationMethod::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorrelationConfig {
    /// Columns to correlate. Empty means "the irradiance sensors present
    /// in the table".
    pub columns: Vec<String>,
    pub frequency: Frequency,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        CorrelationConfig { columns: Vec::new(), frequency: Frequency::Weekly }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub timestamps: bool,
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub outliers: OutlierConfig,
    pub nighttime: NighttimeConfig,
    pub aggregation: AggregationConfig,
    pub correlation: CorrelationConfig,
    /// Column → [min, max]. Empty means the sensor registry defaults.
    pub ranges: BTreeMap<String, [f64; 2]>,
    pub logging: LoggingConfig,
}

impl AnalysisConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!(component = %Component::System, path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Loads `.env` (if present), then the file named by
    /// `SOLAR_INSIGHT_CONFIG`. Falls back to defaults when the variable is
    /// unset.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        match env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::load(path),
            Err(_) => {
                debug!(component = %Component::System, "{} not set, using defaults", CONFIG_ENV_VAR);
                Ok(Self::default())
            }
        }
    }

    /// Checks every value that maps onto a validated engine type.
    pub fn validate(&self) -> Result<()> {
        if !self.outliers.threshold.is_finite() || self.outliers.threshold < 0.0 {
            return Err(AnalysisError::InvalidArgument(format!(
                "outliers.threshold must be a finite non-negative number, got {}",
                self.outliers.threshold
            )));
        }
        if self.aggregation.bucket_days == 0 {
            return Err(AnalysisError::InvalidArgument(
                "aggregation.bucket_days must be positive".to_string(),
            ));
        }
        self.night_window()?;
        self.range_spec()?;
        Ok(())
    }

    pub fn night_window(&self) -> Result<NightWindow> {
        NightWindow::new(self.nighttime.start_hour, self.nighttime.end_hour)
    }

    /// Configured clipping ranges, or the sensor registry's physical bounds
    /// when none are configured.
    pub fn range_spec(&self) -> Result<RangeSpec> {
        if self.ranges.is_empty() {
            return Ok(RangeSpec::physical_defaults());
        }
        let mut spec = RangeSpec::new();
        for (column, [min, max]) in &self.ranges {
            spec.insert(column.clone(), *min, *max)?;
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = AnalysisConfig::from_toml_str("").expect("empty config is valid");
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.outliers.threshold, 3.0);
        assert_eq!(config.night_window().expect("valid"), NightWindow::default());
        assert_eq!(config.range_spec().expect("valid"), RangeSpec::physical_defaults());
    }

    #[test]
    fn test_full_document_parses() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            [outliers]
            threshold = 2.5
            replacement = "Mean"

            [nighttime]
            start_hour = 19
            end_hour = 5

            [aggregation]
            bucket_days = 7
            method = "max"

            [correlation]
            columns = ["GHI", "Tamb"]
            frequency = "M"

            [ranges]
            GHI = [0.0, 1000.0]

            [logging]
            level = "warn"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.outliers.replacement, ReplacementMethod::Mean);
        assert_eq!(config.aggregation.method, AggregationMethod::Max);
        assert_eq!(config.correlation.frequency, Frequency::Monthly);
        assert_eq!(config.logging.level, LogLevel::Warning);
        let ranges = config.range_spec().expect("valid ranges");
        assert_eq!(ranges.get("GHI"), Some((0.0, 1000.0)));
        assert_eq!(ranges.get("DNI"), None, "explicit ranges replace the defaults");
        let window = config.night_window().expect("valid hours");
        assert!(window.contains(4) && !window.contains(5));
    }

    #[test]
    fn test_unknown_method_name_is_rejected() {
        let result = AnalysisConfig::from_toml_str("[aggregation]\nmethod = \"sum\"\n");
        assert!(result.is_err(), "unknown aggregation method must not parse");
    }

    #[test]
    fn test_zero_bucket_days_is_rejected() {
        let result = AnalysisConfig::from_toml_str("[aggregation]\nbucket_days = 0\n");
        assert!(matches!(result, Err(AnalysisError::InvalidArgument(_))));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let result = AnalysisConfig::from_toml_str("[ranges]\nGHI = [100.0, 0.0]\n");
        assert!(matches!(result, Err(AnalysisError::InvalidArgument(_))));
    }

    #[test]
    fn test_bad_night_hour_is_rejected() {
        let result = AnalysisConfig::from_toml_str("[nighttime]\nstart_hour = 25\n");
        assert!(matches!(result, Err(AnalysisError::InvalidArgument(_))));
    }
}
