//! Connection and set-point components shared by injections, plus the
//! external grid (slack) element.

use bevy_ecs::{name::Name, prelude::*};

use super::PowerResult;

/// Bus an injection is connected to.
#[derive(Component, Debug, Clone, Copy)]
pub struct TargetBus(pub i64);

#[derive(Component, Debug, Clone, Copy)]
pub struct TargetPMW(pub f64);

#[derive(Component, Debug, Clone, Copy)]
pub struct TargetQMVar(pub f64);

/// Voltage magnitude target in per-unit (pu).
///
/// Default = 1.0 pu if unspecified.
#[derive(Component, Debug, Clone, Copy)]
pub struct TargetVmPu(pub f64);
impl Default for TargetVmPu {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Voltage phase angle target in degrees.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct TargetVaDeg(pub f64);

/// Marker for a slack generator (voltage reference node).
#[derive(Component, Debug, Clone, Copy)]
#[component(storage = "SparseSet")]
pub struct Slack;

/// External grid: holds voltage magnitude and angle at its bus and balances
/// the rest of the network. Its result is in generator reference.
#[derive(Bundle)]
pub struct ExtGridBundle {
    pub name: Name,
    pub slack: Slack,
    pub target_bus: TargetBus,
    pub vm_pu: TargetVmPu,
    pub va_degree: TargetVaDeg,
    pub result: PowerResult,
}
