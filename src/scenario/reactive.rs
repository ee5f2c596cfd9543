use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::InvalidModeError;

/// Power factor used when none is configured.
pub const DEFAULT_COS_PHI: f64 = 0.97;

/// Sign convention for the reactive power of a generator set-point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OperatingMode {
    /// Reactive power is consumed, `q >= 0` for `p >= 0`.
    #[default]
    Inductive,
    /// Reactive power is supplied, `q <= 0` for `p >= 0`.
    Capacitive,
}

impl OperatingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatingMode::Inductive => "inductive",
            OperatingMode::Capacitive => "capacitive",
        }
    }
}

impl FromStr for OperatingMode {
    type Err = InvalidModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inductive" | "ind" => Ok(OperatingMode::Inductive),
            "capacitive" | "cap" => Ok(OperatingMode::Capacitive),
            _ => Err(InvalidModeError(s.to_owned())),
        }
    }
}

impl TryFrom<String> for OperatingMode {
    type Error = InvalidModeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OperatingMode> for String {
    fn from(mode: OperatingMode) -> Self {
        mode.as_str().to_owned()
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reactive power belonging to active power `p` at power factor `cos_phi`.
///
/// `q = p * tan(arccos(cos_phi))`, negated in capacitive mode. `cos_phi` is
/// expected in `(0, 1]`; [`ScenarioConfig::validate`](super::ScenarioConfig::validate)
/// enforces this before a run.
pub fn reactive_power(p: f64, cos_phi: f64, mode: OperatingMode) -> f64 {
    let q = p * cos_phi.acos().tan();
    match mode {
        OperatingMode::Inductive => q,
        OperatingMode::Capacitive => -q,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reference_values() {
        let q = reactive_power(50.0, DEFAULT_COS_PHI, OperatingMode::Inductive);
        assert!((q - 12.531).abs() < 1e-3, "{q}");
        let q = reactive_power(160.0, DEFAULT_COS_PHI, OperatingMode::Inductive);
        assert!((q - 40.100).abs() < 1e-3, "{q}");
        assert_eq!(reactive_power(10.0, 1.0, OperatingMode::Capacitive), 0.0);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert_eq!(
            "unknown".parse::<OperatingMode>(),
            Err(InvalidModeError("unknown".into()))
        );
        assert_eq!(
            " Capacitive ".parse::<OperatingMode>(),
            Ok(OperatingMode::Capacitive)
        );
        let err: Result<OperatingMode, _> = serde_json::from_str("\"unknown\"");
        assert!(err.is_err());
        assert_eq!(
            serde_json::to_string(&OperatingMode::Inductive).unwrap(),
            "\"inductive\""
        );
    }

    proptest! {
        #[test]
        fn modes_are_sign_symmetric(p in -500.0f64..500.0, cos_phi in 0.05f64..=1.0) {
            let ind = reactive_power(p, cos_phi, OperatingMode::Inductive);
            let cap = reactive_power(p, cos_phi, OperatingMode::Capacitive);
            prop_assert_eq!(ind, -cap);
            if p >= 0.0 {
                prop_assert!(ind >= 0.0);
            }
        }

        #[test]
        fn magnitude_matches_apparent_power(p in 0.0f64..500.0, cos_phi in 0.05f64..=1.0) {
            let q = reactive_power(p, cos_phi, OperatingMode::Inductive);
            let s = (p * p + q * q).sqrt();
            prop_assert!((p - s * cos_phi).abs() <= 1e-9 * s.max(1.0));
        }
    }
}
