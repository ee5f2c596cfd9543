mod basic;
pub mod error;
pub mod io;
pub mod scenario;
pub mod testcases;
pub mod timeseries;

pub mod prelude {
    use crate::basic;
    pub use basic::{
        ecs::{
            builder::SwitchElement,
            elements::{
                BusId, ElementId, ExtGridId, LineId, LineParams, LoadId, SGenId, SwitchId,
                TrafoId, TransformerDevice,
            },
            network::{DataOps, PowerFlow, PowerGrid},
            plugin::{PowerFlowPlugin, default_app},
            post_processing::{BusResultRow, PostProcessing, PowerResultRow},
            powerflow::prelude::{PowerFlowConfig, PowerFlowReport, PowerFlowResult},
        },
        solver::{DefaultSolver, DenseSolver, Solve},
    };

    pub use crate::error::*;
    pub use crate::io::{TimeSeriesFormat, read_time_series, write_output};
    pub use crate::scenario::*;
    pub use crate::timeseries::TimeSeries;
}
