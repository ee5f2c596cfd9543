//! Error types shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

pub use crate::basic::solver::LinearSolveError;

/// Errors raised while building or editing the network model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    #[error("unknown standard type `{name}` for {kind}")]
    UnknownStdType { kind: &'static str, name: String },

    #[error("{kind} does not belong to this grid")]
    UnknownElement { kind: &'static str },

    #[error("invalid parameter {what}: {value}")]
    InvalidParameter { what: &'static str, value: f64 },

    #[error("{kind} is not connected to the switch bus")]
    NotConnected { kind: &'static str },
}

/// Errors raised by a single power flow solve.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PowerFlowError {
    #[error("network has no buses")]
    EmptyNetwork,

    #[error("network has no in-service external grid")]
    NoSlack,

    #[error("power flow did not converge within {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("linear solve failed: {0}")]
    LinearSolve(#[from] LinearSolveError),

    #[error("system assembly failed: {what}")]
    Assembly { what: String },
}

/// An operating mode string that is neither inductive nor capacitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid operating mode `{0}`, expected `inductive` or `capacitive`")]
pub struct InvalidModeError(pub String);

/// Configuration and collaborator failures that abort a scenario run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("invalid configuration: {what}")]
    InvalidConfig { what: String },

    #[error(transparent)]
    InvalidMode(#[from] InvalidModeError),

    #[error("target generator is not part of the topology")]
    UnknownTarget,

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Failures while reading a delimited time series.
#[derive(Error, Debug)]
pub enum TimeSeriesError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed delimited text: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing {what} column")]
    MissingColumn { what: &'static str },

    #[error("row {row}: cannot parse timestamp `{value}`")]
    BadTimestamp { row: usize, value: String },

    #[error("row {row}: cannot parse power value `{value}`")]
    BadValue { row: usize, value: String },

    #[error("row {row}: timestamp goes back in time")]
    OutOfOrder { row: usize },

    #[error("time and value columns differ in length ({times} vs {values})")]
    LengthMismatch { times: usize, values: usize },
}

/// Failures while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

/// Failures while writing scenario output.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("cannot write output: {0}")]
    Csv(#[from] csv::Error),

    #[error("cannot write output: {0}")]
    Io(#[from] std::io::Error),
}
