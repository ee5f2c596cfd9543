use bevy_ecs::{name::Name, prelude::*};

use super::{
    PowerResult,
    generator::{TargetBus, TargetPMW, TargetQMVar},
};

#[derive(Component, Debug, Clone)]
pub struct LoadCfg {
    pub scaling: f64,
}

impl Default for LoadCfg {
    fn default() -> Self {
        Self { scaling: 1.0 }
    }
}

/// Constant-power load in consumer reference: positive `p` draws power from
/// the bus.
#[derive(Bundle)]
pub struct LoadBundle {
    pub name: Name,
    pub target_bus: TargetBus,
    pub target_p: TargetPMW,
    pub target_q: TargetQMVar,
    pub cfg: LoadCfg,
    pub result: PowerResult,
}
