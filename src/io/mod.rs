//! Delimited-text input and output.

pub mod output;
pub mod timeseries_csv;

pub use output::{write_output, write_output_to};
pub use timeseries_csv::{TimeSeriesFormat, parse_time_series, read_time_series};
