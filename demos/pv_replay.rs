//! Replays one day of PV output on the medium-voltage reference ring.
//!
//! ```text
//! RUST_LOG=gridreplay=debug cargo run --example pv_replay
//! ```

use std::{error::Error, path::Path};

use gridreplay::{
    prelude::*,
    testcases::{RingSetpoints, mv_open_ring},
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/data");
    let config = ScenarioConfig::from_json_file(data.join("scenario.json"))?;
    let series = read_time_series(data.join("pv.csv"), &TimeSeriesFormat::default())?;

    // study case loading; steps that overload the transformer are reported
    // as failed and keep the previous results
    let mut ring = mv_open_ring(&RingSetpoints::historical())?;
    ring.grid.configure_pf(PowerFlowConfig {
        max_it: Some(20),
        tol: Some(1e-8),
    });

    let output = ScenarioDriver::new(&mut ring.grid, ring.target, config)?.run(&series)?;
    output.print_summary();
    ring.grid.print_res_bus();
    ring.grid.print_res_sgen();

    let out = std::env::temp_dir().join("pv_replay.csv");
    write_output(&out, &output, b';')?;
    println!("wrote {}", out.display());
    Ok(())
}
