use bevy_app::prelude::*;
use bevy_ecs::{component::Mutable, prelude::*, world::error::EntityMutableFetchError};

use crate::{basic::solver::DefaultSolver, error::PowerFlowError};

use super::{
    elements::PFCommonData,
    plugin::default_app,
    powerflow::systems::{PowerFlowConfig, PowerFlowReport, PowerFlowResult},
};

#[derive(Clone, SystemSet, Debug, Hash, PartialEq, Eq)]
pub enum SolverStage {
    BeforeSolve,
    Solve,
    AfterSolve,
}

#[derive(Default, Resource)]
pub struct PowerFlowSolver {
    pub solver: DefaultSolver,
}

/// Represents the power grid, managing the ECS world for power flow calculations.
pub struct PowerGrid {
    data_storage: App,
}

impl Default for PowerGrid {
    fn default() -> Self {
        Self {
            data_storage: default_app(),
        }
    }
}

/// Trait for performing operations on ECS data, such as getting and mutating components of entities.
pub trait DataOps {
    fn get_entity_mut(
        &mut self,
        entity: Entity,
    ) -> Result<EntityWorldMut<'_>, EntityMutableFetchError>;
    fn get_mut<T>(&'_ mut self, entity: Entity) -> Option<Mut<'_, T>>
    where
        T: Component<Mutability = Mutable>;
    fn get<T>(&self, entity: Entity) -> Option<&T>
    where
        T: Component;
    fn world_mut(&mut self) -> &mut World;
    fn world(&self) -> &World;
}

/// Trait for defining power flow operations.
pub trait PowerFlow {
    /// Replaces the iteration limit and tolerance of the Newton solver.
    fn configure_pf(&mut self, config: PowerFlowConfig);

    /// Runs the power flow calculation using the Newton-Raphson method.
    ///
    /// Result components are updated only when the solve converges.
    fn run_pf(&mut self) -> Result<PowerFlowReport, PowerFlowError>;
}

impl PowerFlow for PowerGrid {
    fn configure_pf(&mut self, config: PowerFlowConfig) {
        self.world_mut().insert_resource(config);
    }

    fn run_pf(&mut self) -> Result<PowerFlowReport, PowerFlowError> {
        self.app_mut().update();
        self.world()
            .get_resource::<PowerFlowResult>()
            .ok_or_else(|| PowerFlowError::Assembly {
                what: "power flow plugin is not installed".into(),
            })?
            .outcome()
    }
}

impl PowerGrid {
    /// Creates an empty grid with the given base power and frequency.
    pub fn new(sn_mva: f64, f_hz: f64) -> Self {
        let mut grid = Self::default();
        grid.world_mut()
            .insert_resource(PFCommonData::new(sn_mva, f_hz));
        grid
    }
    pub fn app(&self) -> &App {
        &self.data_storage
    }
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.data_storage
    }
}

impl DataOps for PowerGrid {
    fn world(&self) -> &World {
        self.app().world()
    }
    fn world_mut(&mut self) -> &mut World {
        self.app_mut().world_mut()
    }
    fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.world().get(entity)
    }
    fn get_mut<T>(&'_ mut self, entity: Entity) -> Option<Mut<'_, T>>
    where
        T: Component<Mutability = Mutable>,
    {
        self.world_mut().get_mut(entity)
    }
    fn get_entity_mut(
        &mut self,
        entity: Entity,
    ) -> Result<EntityWorldMut<'_>, EntityMutableFetchError> {
        self.world_mut().get_entity_mut(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grid_reports_empty_network() {
        let mut grid = PowerGrid::default();
        assert_eq!(grid.run_pf(), Err(PowerFlowError::EmptyNetwork));
    }
}
