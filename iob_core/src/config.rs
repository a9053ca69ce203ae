//! Configuration file support.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/iob/config.toml`.
//! Every field has a default, so a partial file (or none at all) is fine.

use crate::validation::{validate_calculation_inputs, CalculationInputs};
use crate::{CalculatorSettings, Error, Result, RiskThresholds, MAX_ACTION_DURATION_HOURS};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub calculator: CalculatorSettings,

    #[serde(default)]
    pub risk: RiskThresholds,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("iob")
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("iob")
            .join("config.toml")
    }

    /// Reject calculator settings outside their clinical ranges
    pub fn validate(&self) -> Result<()> {
        let calc = &self.calculator;
        validate_calculation_inputs(&CalculationInputs {
            target_glucose: Some(calc.target_glucose),
            insulin_to_carb: Some(calc.insulin_to_carb),
            correction_factor: Some(calc.correction_factor),
            ..CalculationInputs::default()
        })
        .map_err(|e| Error::Config(e.to_string()))?;

        for (name, hours) in [
            ("rapid_acting_duration", calc.rapid_acting_duration),
            ("short_acting_duration", calc.short_acting_duration),
        ] {
            if hours.is_nan() || hours <= 0.0 {
                return Err(Error::Config(format!("{} must be positive", name)));
            }
            if !hours.is_finite() || hours > MAX_ACTION_DURATION_HOURS {
                return Err(Error::Config(format!(
                    "{} must not exceed {} hours",
                    name, MAX_ACTION_DURATION_HOURS
                )));
            }
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    ///
    /// Written to a temp file in the same directory and renamed over the
    /// target, so readers never see a half-written file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(contents.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.calculator.insulin_to_carb, 10.0);
        assert_eq!(config.calculator.correction_factor, 50.0);
        assert_eq!(config.calculator.target_glucose, 100.0);
        assert_eq!(config.calculator.rapid_acting_duration, 4.0);
        assert_eq!(config.risk.hypo_glucose, 80.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.calculator.insulin_to_carb = 12.0;
        config.risk.max_insulin_on_board = 4.0;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.calculator, config.calculator);
        assert_eq!(loaded.risk, config.risk);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[calculator]
correction_factor = 40
target_glucose = 110
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.calculator.correction_factor, 40.0);
        assert_eq!(config.calculator.target_glucose, 110.0);
        assert_eq!(config.calculator.insulin_to_carb, 10.0); // default
        assert_eq!(config.risk, RiskThresholds::default());
    }

    #[test]
    fn test_out_of_range_settings_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[calculator]\ntarget_glucose = 250\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Target glucose must be between 70 and 180"));
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let mut config = Config::default();
        config.calculator.short_acting_duration = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("short_acting_duration"));
    }

    #[test]
    fn test_unbounded_duration_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[calculator]\nrapid_acting_duration = 1e18\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: rapid_acting_duration must not exceed 48 hours"
        );

        let mut config = Config::default();
        config.calculator.short_acting_duration = f64::INFINITY;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.calculator.short_acting_duration = MAX_ACTION_DURATION_HOURS;
        assert!(config.validate().is_ok());
    }
}
