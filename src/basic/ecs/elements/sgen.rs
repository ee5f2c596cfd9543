use bevy_ecs::{name::Name, prelude::*};
use num_complex::Complex64;

use super::{PowerResult, generator::TargetBus};

/// Static generator in generator reference: positive `p` feeds the bus.
#[derive(Component, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SGenDevice {
    pub p_mw: f64,
    pub q_mvar: f64,
    pub scaling: f64,
}

impl SGenDevice {
    pub fn new(p_mw: f64, q_mvar: f64) -> Self {
        Self {
            p_mw,
            q_mvar,
            scaling: 1.0,
        }
    }

    /// Scaled injection in MVA.
    pub fn injection(&self) -> Complex64 {
        Complex64::new(self.p_mw, self.q_mvar) * self.scaling
    }
}

#[derive(Bundle)]
pub struct SGenBundle {
    pub name: Name,
    pub target_bus: TargetBus,
    pub device: SGenDevice,
    pub result: PowerResult,
}
