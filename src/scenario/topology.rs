use std::fmt::Debug;

use crate::{
    basic::ecs::{
        elements::SGenId,
        network::{PowerFlow, PowerGrid},
        post_processing::PostProcessing,
        powerflow::systems::PowerFlowReport,
    },
    error::{PowerFlowError, TopologyError},
};

/// Raw result columns read back after a solve, in creation order.
///
/// Entries may be NaN (never solved or isolated).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTables {
    pub bus_vm_pu: Vec<f64>,
    pub load_p_mw: Vec<f64>,
    pub sgen_p_mw: Vec<f64>,
}

/// Network model a scenario is replayed on.
pub trait Topology {
    /// Handle of a static generator.
    type GeneratorId: Copy + Debug;

    /// Row of `id` in [`ResultTables::sgen_p_mw`], `None` if unknown.
    fn generator_position(&self, id: Self::GeneratorId) -> Option<usize>;

    fn set_generator_power(
        &mut self,
        id: Self::GeneratorId,
        p_mw: f64,
        q_mvar: f64,
    ) -> Result<(), TopologyError>;

    /// Blocking power flow solve. Results are only refreshed on success.
    fn solve(&mut self) -> Result<PowerFlowReport, PowerFlowError>;

    fn result_tables(&self) -> ResultTables;
}

impl Topology for PowerGrid {
    type GeneratorId = SGenId;

    fn generator_position(&self, id: SGenId) -> Option<usize> {
        self.position(id)
    }

    fn set_generator_power(
        &mut self,
        id: SGenId,
        p_mw: f64,
        q_mvar: f64,
    ) -> Result<(), TopologyError> {
        self.set_sgen_power(id, p_mw, q_mvar)
    }

    fn solve(&mut self) -> Result<PowerFlowReport, PowerFlowError> {
        self.run_pf()
    }

    fn result_tables(&self) -> ResultTables {
        ResultTables {
            bus_vm_pu: self.res_bus().iter().map(|r| r.vm_pu).collect(),
            load_p_mw: self.res_load().iter().map(|r| r.p_mw).collect(),
            sgen_p_mw: self.res_sgen().iter().map(|r| r.p_mw).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::ecs::builder::SwitchElement;

    #[test]
    fn grid_tables_follow_creation_order() {
        let mut grid = PowerGrid::default();
        let b0 = grid.create_bus(20.0, "b0").unwrap();
        let b1 = grid.create_bus(20.0, "b1").unwrap();
        let line = grid
            .create_line(b0, b1, 1.0, "NA2XS2Y 1x185 RM/25 12/20 kV", "l0")
            .unwrap();
        grid.create_switch(b1, SwitchElement::Line(line), true, "s0")
            .unwrap();
        grid.create_external_grid(b0, 1.0, 0.0, "grid").unwrap();
        grid.create_load(b1, 0.5, 0.1, "load").unwrap();
        let g0 = grid.create_static_generator(b1, 0.1, 0.0, "g0").unwrap();
        let g1 = grid.create_static_generator(b1, 0.2, 0.0, "g1").unwrap();

        assert_eq!(grid.generator_position(g1), Some(1));
        let before = grid.result_tables();
        assert_eq!(before.bus_vm_pu.len(), 2);
        assert!(before.sgen_p_mw.iter().all(|p| p.is_nan()));

        grid.set_generator_power(g0, 0.3, 0.05).unwrap();
        grid.solve().unwrap();
        let after = grid.result_tables();
        assert!((after.sgen_p_mw[0] - 0.3).abs() < 1e-9);
        assert!((after.load_p_mw[0] - 0.5).abs() < 1e-9);
        assert!(after.bus_vm_pu.iter().all(|v| (v - 1.0).abs() < 0.05));
    }

    #[test]
    fn foreign_generator_is_unknown() {
        let mut other = PowerGrid::default();
        let bus = other.create_bus(20.0, "b").unwrap();
        let foreign = other.create_static_generator(bus, 0.0, 0.0, "g").unwrap();

        let mut grid = PowerGrid::default();
        grid.create_bus(20.0, "b").unwrap();
        assert_eq!(grid.generator_position(foreign), None);
        assert!(grid.set_generator_power(foreign, 1.0, 0.0).is_err());
    }
}
