mod bus;
mod generator;
mod line;
mod load;
mod sgen;
pub mod std_types;
mod switch;
mod trans;

use bevy_ecs::prelude::*;
use derive_more::{Deref, DerefMut};

pub use bus::*;
pub use generator::*;
pub use line::*;
pub use load::*;
pub use sgen::*;
pub use switch::*;
pub use trans::*;

/// Resource holding common base values for the power flow calculation.
///
/// `PFCommonData` contains the angular frequency (`wbase`), the base power
/// (`sbase`) and the nominal frequency (`f_hz`).
#[derive(Debug, Resource, Clone, serde::Serialize, serde::Deserialize)]
pub struct PFCommonData {
    pub wbase: f64, // Base angular frequency (rad/s).
    pub sbase: f64, // Base power (MVA).
    pub f_hz: f64,
}

impl PFCommonData {
    pub fn new(sbase: f64, f_hz: f64) -> Self {
        Self {
            wbase: 2.0 * std::f64::consts::PI * f_hz,
            sbase,
            f_hz,
        }
    }
}

impl Default for PFCommonData {
    fn default() -> Self {
        Self::new(1.0, 50.0)
    }
}

/// Marker for elements that are switched out of the calculation.
#[derive(Debug, Component, Clone, Copy, Default)]
pub struct OutOfService;

/// Creation-ordered entity lists per element category.
///
/// Result tables are reported in this order, and bus ids are positions in
/// `buses`.
#[derive(Debug, Default, Resource, Clone)]
pub struct ElementIndex {
    pub buses: Vec<Entity>,
    pub lines: Vec<Entity>,
    pub trafos: Vec<Entity>,
    pub loads: Vec<Entity>,
    pub sgens: Vec<Entity>,
    pub switches: Vec<Entity>,
    pub ext_grids: Vec<Entity>,
}

/// Handle of an element created in a [`PowerGrid`](crate::prelude::PowerGrid).
pub trait ElementId: Copy + std::fmt::Debug {
    /// Human readable element category, used in error messages.
    const KIND: &'static str;

    fn entity(&self) -> Entity;

    /// Entity list of this category inside the index.
    fn category(index: &ElementIndex) -> &[Entity];
}

macro_rules! define_element_id {
    ($(#[$meta:meta])* $id:ident, $kind:literal, $field:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deref)]
        pub struct $id(pub(crate) Entity);

        impl ElementId for $id {
            const KIND: &'static str = $kind;

            fn entity(&self) -> Entity {
                self.0
            }

            fn category(index: &ElementIndex) -> &[Entity] {
                &index.$field
            }
        }
    };
}

define_element_id!(
    /// Handle of a bus.
    BusId, "bus", buses
);
define_element_id!(
    /// Handle of a line.
    LineId, "line", lines
);
define_element_id!(
    /// Handle of a two-winding transformer.
    TrafoId, "transformer", trafos
);
define_element_id!(
    /// Handle of a load.
    LoadId, "load", loads
);
define_element_id!(
    /// Handle of a static generator.
    SGenId, "static generator", sgens
);
define_element_id!(
    /// Handle of a switch.
    SwitchId, "switch", switches
);
define_element_id!(
    /// Handle of an external grid.
    ExtGridId, "external grid", ext_grids
);

/// Complex power of an element, `p + jq` in MW and MVAr.
#[derive(Debug, Component, Clone, Copy, PartialEq, Deref, DerefMut)]
pub struct PowerResult(pub num_complex::Complex64);

impl Default for PowerResult {
    fn default() -> Self {
        PowerResult(num_complex::Complex64::new(f64::NAN, f64::NAN))
    }
}

impl PowerResult {
    pub fn p_mw(&self) -> f64 {
        self.0.re
    }

    pub fn q_mvar(&self) -> f64 {
        self.0.im
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_start_undefined() {
        let r = PowerResult::default();
        assert!(r.p_mw().is_nan() && r.q_mvar().is_nan());
        assert!((PFCommonData::default().wbase - 100.0 * std::f64::consts::PI).abs() < 1e-12);
    }
}
