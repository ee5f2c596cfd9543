use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ScenarioError};

use super::{
    aggregate::MissingValuePolicy,
    reactive::{DEFAULT_COS_PHI, OperatingMode},
};

fn default_cos_phi() -> f64 {
    DEFAULT_COS_PHI
}

/// Settings of a scenario run.
///
/// ```json
/// { "cos_phi": 0.97, "mode": "inductive", "missing_values": "zero_fill" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default = "default_cos_phi")]
    pub cos_phi: f64,
    #[serde(default)]
    pub mode: OperatingMode,
    #[serde(default)]
    pub missing_values: MissingValuePolicy,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            cos_phi: DEFAULT_COS_PHI,
            mode: OperatingMode::default(),
            missing_values: MissingValuePolicy::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn new(cos_phi: f64, mode: OperatingMode) -> Self {
        Self {
            cos_phi,
            mode,
            ..Default::default()
        }
    }

    /// Rejects a power factor outside `(0, 1]`.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.cos_phi > 0.0 && self.cos_phi <= 1.0) {
            return Err(ScenarioError::InvalidConfig {
                what: format!("cos_phi {} is outside (0, 1]", self.cos_phi),
            });
        }
        Ok(())
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg = ScenarioConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, ScenarioConfig::default());
        assert_eq!(cfg.cos_phi, 0.97);

        let cfg =
            ScenarioConfig::from_json_str(r#"{"mode": "capacitive", "missing_values": "exclude"}"#)
                .unwrap();
        assert_eq!(cfg.mode, OperatingMode::Capacitive);
        assert_eq!(cfg.missing_values, MissingValuePolicy::Exclude);
    }

    #[test]
    fn unknown_mode_fails_at_configuration_time() {
        let err = ScenarioConfig::from_json_str(r#"{"mode": "unknown"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().contains("unknown"), "{err}");
    }

    #[test]
    fn power_factor_is_range_checked() {
        for bad in ["0.0", "1.2", "-0.5"] {
            let err =
                ScenarioConfig::from_json_str(&format!(r#"{{"cos_phi": {bad}}}"#)).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::Scenario(ScenarioError::InvalidConfig { .. })
            ));
        }
        assert!(ScenarioConfig::new(1.0, OperatingMode::Inductive).validate().is_ok());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"cos_phi": 0.9, "mode": "inductive"}}"#).unwrap();
        let cfg = ScenarioConfig::from_json_file(file.path()).unwrap();
        assert_eq!(cfg.cos_phi, 0.9);

        let missing = ScenarioConfig::from_json_file("/nonexistent/scenario.json");
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
