use bevy_ecs::{name::Name, prelude::*};
use derive_more::{Deref, DerefMut};

/// Index of a bus inside the grid. Branches and injections refer to buses by
/// this id.
#[derive(Component, Debug, Clone, Copy, Default, Eq, Ord, PartialEq, PartialOrd, Hash)]
#[require(BusResult)]
pub struct BusID(pub i64);

/// Nominal voltage in kV.
#[derive(Component, Debug, Clone, Copy, Deref, DerefMut, serde::Serialize, serde::Deserialize)]
pub struct VNominal(pub f64);

impl Default for VNominal {
    fn default() -> Self {
        VNominal(110.0)
    }
}

#[derive(Bundle)]
pub struct BusBundle {
    pub name: Name,
    pub bus_id: BusID,
    pub vn_kv: VNominal,
}

/// Power flow result of a bus.
///
/// `p_mw`/`q_mvar` are the net demand at the bus (consumer reference).
/// Every field is NaN until the bus has been part of a converged solve; an
/// isolated bus keeps NaN voltages and reports zero power.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct BusResult {
    pub vm_pu: f64,
    pub va_degree: f64,
    pub p_mw: f64,
    pub q_mvar: f64,
}

impl Default for BusResult {
    fn default() -> Self {
        Self {
            vm_pu: f64::NAN,
            va_degree: f64::NAN,
            p_mw: f64::NAN,
            q_mvar: f64::NAN,
        }
    }
}

impl BusResult {
    pub(crate) fn isolated() -> Self {
        Self {
            p_mw: 0.0,
            q_mvar: 0.0,
            ..Default::default()
        }
    }
}
