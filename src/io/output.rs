use std::{io::Write, path::Path};

use csv::WriterBuilder;
use serde::Serialize;

use crate::{error::OutputError, scenario::ScenarioOutput};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Serialize)]
struct OutputRow {
    time: String,
    mean_bus_vm_pu: f64,
    mean_load_p_mw: f64,
    mean_sgen_p_mw: f64,
    target_sgen_p_mw: f64,
    converged: bool,
}

/// Writes one delimited row per step, with a header.
pub fn write_output_to<W: Write>(
    writer: W,
    output: &ScenarioOutput,
    delimiter: u8,
) -> Result<(), OutputError> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(writer);
    for step in &output.steps {
        wtr.serialize(OutputRow {
            time: step.time.format(TIME_FORMAT).to_string(),
            mean_bus_vm_pu: step.mean_bus_vm_pu,
            mean_load_p_mw: step.mean_load_p_mw,
            mean_sgen_p_mw: step.mean_sgen_p_mw,
            target_sgen_p_mw: step.target_sgen_p_mw,
            converged: step.status.is_converged(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_output(
    path: impl AsRef<Path>,
    output: &ScenarioOutput,
    delimiter: u8,
) -> Result<(), OutputError> {
    let file = std::fs::File::create(path)?;
    write_output_to(file, output, delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::PowerFlowError,
        io::{TimeSeriesFormat, read_time_series},
        scenario::{StepResult, StepStatus},
    };
    use chrono::NaiveDate;

    fn output() -> ScenarioOutput {
        let t0 = NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let step = |minutes: i64, p: f64, status| StepResult {
            time: t0 + chrono::Duration::minutes(minutes),
            mean_bus_vm_pu: 1.01,
            mean_load_p_mw: 0.5,
            mean_sgen_p_mw: p / 2.0,
            target_sgen_p_mw: p,
            status,
        };
        ScenarioOutput {
            steps: vec![
                step(0, 1.0, StepStatus::Converged { iterations: 3 }),
                step(15, 2.0, StepStatus::Failed(PowerFlowError::NotConverged { iterations: 10 })),
            ],
        }
    }

    #[test]
    fn writes_header_and_one_row_per_step() {
        let mut buf = Vec::new();
        write_output_to(&mut buf, &output(), b';').unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "time;mean_bus_vm_pu;mean_load_p_mw;mean_sgen_p_mw;target_sgen_p_mw;converged"
        );
        assert_eq!(lines[1], "2021-06-01 00:00:00;1.01;0.5;0.5;1.0;true");
        assert!(lines[2].ends_with(";false"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn output_file_reads_back_as_a_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_output(&path, &output(), b';').unwrap();

        let format = TimeSeriesFormat {
            value_headers: vec!["target_sgen_p_mw".into()],
            time_headers: vec!["time".into()],
            ..Default::default()
        };
        let ts = read_time_series(&path, &format).unwrap();
        assert_eq!(ts.values(), &[1.0, 2.0]);
    }
}
