use bevy_app::prelude::*;
use bevy_ecs::prelude::*;

use super::{
    elements::{ElementIndex, PFCommonData},
    network::{PowerFlowSolver, SolverStage},
    powerflow::prelude::*,
};

/// Base plugin for power flow calculations.
///
/// Inserts the shared resources and registers one solve per
/// [`App::update`]: assembly, Newton iterations and, on convergence, result
/// extraction.
pub struct PowerFlowPlugin;

impl Plugin for PowerFlowPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PowerFlowConfig>()
            .init_resource::<PFCommonData>()
            .init_resource::<ElementIndex>()
            .init_resource::<PowerFlowSolver>()
            .init_resource::<PowerFlowResult>()
            .init_resource::<WarmStart>();

        app.configure_sets(
            Update,
            (
                SolverStage::BeforeSolve,
                SolverStage::Solve,
                SolverStage::AfterSolve,
            )
                .chain(),
        );
        app.add_systems(
            Update,
            (
                init_states.in_set(SolverStage::BeforeSolve),
                ecs_run_pf
                    .run_if(resource_exists::<PowerFlowMat>)
                    .in_set(SolverStage::Solve),
                extract_powerflow_results
                    .run_if(resource_exists::<PowerFlowMat>.and(pf_converged))
                    .in_set(SolverStage::AfterSolve),
            ),
        );
    }
}

/// Creates a Bevy application with the power flow plugin installed.
pub fn default_app() -> App {
    let mut app = App::new();
    app.add_plugins(PowerFlowPlugin);
    app
}
