//! Replay of a set-point time series on a network model.

pub mod aggregate;
pub mod config;
pub mod driver;
pub mod reactive;
pub mod topology;

pub use aggregate::{MissingValuePolicy, extract_single, mean_over, mean_over_present, sanitize};
pub use config::ScenarioConfig;
pub use driver::{ScenarioDriver, ScenarioOutput, StepResult, StepStatus, run};
pub use reactive::{DEFAULT_COS_PHI, OperatingMode, reactive_power};
pub use topology::{ResultTables, Topology};
