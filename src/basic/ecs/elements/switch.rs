use bevy_ecs::{name::Name, prelude::*};
use derive_more::{Deref, DerefMut};

/// What the far side of a switch is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SwitchType {
    /// Bus to line end (`et = "l"`).
    BusLine,
    /// Bus to bus (`et = "b"`).
    BusBus,
    /// Bus to transformer terminal (`et = "t"`).
    BusTransformer,
}

/// Represents a network switch in the power flow network.
///
/// `element` is the line, transformer or second bus entity, depending on
/// `et`. A closed bus-bus switch with `z_ohm == 0` couples both buses
/// through a fixed high admittance.
#[derive(Debug, Clone, Component)]
#[require(SwitchState)]
pub struct Switch {
    pub bus: i64,
    pub element: Entity,
    pub et: SwitchType,
    pub z_ohm: f64,
}

/// The state (`true` for closed and `false` for open) of a switch.
#[derive(Default, Debug, Clone, Copy, Component, Deref, DerefMut)]
pub struct SwitchState(pub bool);

#[derive(Bundle)]
pub struct SwitchBundle {
    pub name: Name,
    pub switch: Switch,
    pub state: SwitchState,
}
