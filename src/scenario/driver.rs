use chrono::NaiveDateTime;
use tabled::{Table, Tabled, settings::Style};
use tracing::{debug, info, warn};

use crate::{
    basic::ecs::post_processing::FloatWrapper,
    error::{PowerFlowError, ScenarioError, TopologyError},
    timeseries::TimeSeries,
};

use super::{
    aggregate::{extract_single, sanitize_all},
    config::ScenarioConfig,
    reactive::{OperatingMode, reactive_power},
    topology::Topology,
};

/// Outcome of the solve of one step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepStatus {
    Converged { iterations: usize },
    /// The step kept the previous result snapshot.
    Failed(PowerFlowError),
    /// The set-point could not be represented, no solve ran.
    Rejected(TopologyError),
}

impl StepStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, StepStatus::Converged { .. })
    }
}

/// Aggregated metrics of one step. All values are finite.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub time: NaiveDateTime,
    pub mean_bus_vm_pu: f64,
    pub mean_load_p_mw: f64,
    pub mean_sgen_p_mw: f64,
    pub target_sgen_p_mw: f64,
    pub status: StepStatus,
}

/// Time-aligned output of a run, one entry per input sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioOutput {
    pub steps: Vec<StepResult>,
}

#[derive(Tabled)]
#[allow(non_snake_case)]
struct StepTable {
    Step: usize,
    Time: NaiveDateTime,
    Vm_mean: FloatWrapper,
    Load_p_mw: FloatWrapper,
    Sgen_p_mw: FloatWrapper,
    Target_p_mw: FloatWrapper,
    Converged: bool,
}

impl ScenarioOutput {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn column<T>(&self, f: impl Fn(&StepResult) -> T) -> Vec<T> {
        self.steps.iter().map(f).collect()
    }

    pub fn times(&self) -> Vec<NaiveDateTime> {
        self.column(|s| s.time)
    }

    pub fn mean_bus_voltage(&self) -> Vec<f64> {
        self.column(|s| s.mean_bus_vm_pu)
    }

    pub fn mean_load_power(&self) -> Vec<f64> {
        self.column(|s| s.mean_load_p_mw)
    }

    pub fn mean_generator_power(&self) -> Vec<f64> {
        self.column(|s| s.mean_sgen_p_mw)
    }

    pub fn target_generator_power(&self) -> Vec<f64> {
        self.column(|s| s.target_sgen_p_mw)
    }

    pub fn converged_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.status.is_converged()).count()
    }

    pub fn failed_steps(&self) -> usize {
        self.len() - self.converged_steps()
    }

    /// Share of converged steps, `None` for an empty run.
    pub fn convergence_rate(&self) -> Option<f64> {
        (!self.is_empty()).then(|| self.converged_steps() as f64 / self.len() as f64)
    }

    pub fn print_summary(&self) {
        let rows = self.steps.iter().enumerate().map(|(idx, s)| StepTable {
            Step: idx,
            Time: s.time,
            Vm_mean: FloatWrapper::new(s.mean_bus_vm_pu, 5),
            Load_p_mw: FloatWrapper::new(s.mean_load_p_mw, 4),
            Sgen_p_mw: FloatWrapper::new(s.mean_sgen_p_mw, 4),
            Target_p_mw: FloatWrapper::new(s.target_sgen_p_mw, 4),
            Converged: s.status.is_converged(),
        });
        let table = Table::new(rows).with(Style::markdown()).to_string();
        println!("{table}");
        println!(
            "{} steps, {} converged, {} failed",
            self.len(),
            self.converged_steps(),
            self.failed_steps()
        );
    }
}

/// Replays a set-point series on one static generator of a topology.
///
/// The topology is borrowed exclusively for the driver's lifetime and is
/// never reset between steps.
pub struct ScenarioDriver<'a, T: Topology> {
    topology: &'a mut T,
    target: T::GeneratorId,
    target_index: usize,
    config: ScenarioConfig,
}

impl<'a, T: Topology> ScenarioDriver<'a, T> {
    /// Validates the configuration and the target before any step runs.
    pub fn new(
        topology: &'a mut T,
        target: T::GeneratorId,
        config: ScenarioConfig,
    ) -> Result<Self, ScenarioError> {
        config.validate()?;
        let target_index = topology
            .generator_position(target)
            .ok_or(ScenarioError::UnknownTarget)?;
        Ok(Self {
            topology,
            target,
            target_index,
            config,
        })
    }

    /// Applies one set-point, solves and aggregates.
    ///
    /// A failed solve or a reactive power that overflows is reported in
    /// [`StepResult::status`], only a refused set-point write is an error.
    pub fn step(&mut self, time: NaiveDateTime, p_mw: f64) -> Result<StepResult, ScenarioError> {
        let q_mvar = reactive_power(p_mw, self.config.cos_phi, self.config.mode);
        let status = if q_mvar.is_finite() {
            self.topology.set_generator_power(self.target, p_mw, q_mvar)?;
            match self.topology.solve() {
                Ok(report) => StepStatus::Converged {
                    iterations: report.iterations,
                },
                Err(err) => StepStatus::Failed(err),
            }
        } else {
            StepStatus::Rejected(TopologyError::InvalidParameter {
                what: "q_mvar",
                value: q_mvar,
            })
        };

        let tables = self.topology.result_tables();
        let policy = self.config.missing_values;
        Ok(StepResult {
            time,
            mean_bus_vm_pu: policy.mean(&tables.bus_vm_pu),
            mean_load_p_mw: policy.mean(&tables.load_p_mw),
            mean_sgen_p_mw: policy.mean(&tables.sgen_p_mw),
            target_sgen_p_mw: extract_single(&sanitize_all(&tables.sgen_p_mw), self.target_index),
            status,
        })
    }

    /// Runs every sample of `series` in order.
    pub fn run(&mut self, series: &TimeSeries) -> Result<ScenarioOutput, ScenarioError> {
        let mut steps = Vec::with_capacity(series.len());
        for (idx, (time, p_mw)) in series.iter().enumerate() {
            let step = self.step(time, p_mw)?;
            match &step.status {
                StepStatus::Converged { iterations } => {
                    debug!(step = idx, %time, p_mw, iterations, "step converged")
                }
                StepStatus::Failed(err) => {
                    warn!(
                        step = idx, %time, p_mw, %err,
                        "power flow failed, keeping previous results"
                    )
                }
                StepStatus::Rejected(err) => {
                    warn!(
                        step = idx, %time, p_mw, %err,
                        "set-point rejected, keeping previous results"
                    )
                }
            }
            steps.push(step);
        }
        let output = ScenarioOutput { steps };
        info!(
            steps = output.len(),
            converged = output.converged_steps(),
            failed = output.failed_steps(),
            "scenario finished"
        );
        Ok(output)
    }
}

/// Replays `series` on `target` with the default missing value policy.
pub fn run<T: Topology>(
    topology: &mut T,
    target: T::GeneratorId,
    series: &TimeSeries,
    cos_phi: f64,
    mode: OperatingMode,
) -> Result<ScenarioOutput, ScenarioError> {
    ScenarioDriver::new(topology, target, ScenarioConfig::new(cos_phi, mode))?.run(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        basic::ecs::{post_processing::PostProcessing, powerflow::systems::PowerFlowReport},
        scenario::{aggregate::MissingValuePolicy, topology::ResultTables},
        testcases::{RingSetpoints, mv_open_ring},
    };
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    /// Two buses, two loads and three generators. Solves succeed according
    /// to a script, repeating its last entry; an empty script always fails.
    struct Scripted {
        script: Vec<bool>,
        solves: usize,
        set_points: Vec<(f64, f64)>,
        tables: ResultTables,
    }

    impl Scripted {
        fn new(script: Vec<bool>) -> Self {
            Self {
                script,
                solves: 0,
                set_points: vec![(0.0, 0.0), (2.0, 0.0), (4.0, 0.0)],
                tables: ResultTables {
                    bus_vm_pu: vec![f64::NAN; 2],
                    load_p_mw: vec![f64::NAN; 2],
                    sgen_p_mw: vec![f64::NAN; 3],
                },
            }
        }
    }

    impl Topology for Scripted {
        type GeneratorId = usize;

        fn generator_position(&self, id: usize) -> Option<usize> {
            (id < self.set_points.len()).then_some(id)
        }

        fn set_generator_power(
            &mut self,
            id: usize,
            p_mw: f64,
            q_mvar: f64,
        ) -> Result<(), TopologyError> {
            let slot = self
                .set_points
                .get_mut(id)
                .ok_or(TopologyError::UnknownElement { kind: "static generator" })?;
            *slot = (p_mw, q_mvar);
            Ok(())
        }

        fn solve(&mut self) -> Result<PowerFlowReport, PowerFlowError> {
            let ok = self
                .script
                .get(self.solves)
                .or(self.script.last())
                .copied()
                .unwrap_or(false);
            self.solves += 1;
            if !ok {
                return Err(PowerFlowError::NotConverged { iterations: 10 });
            }
            let sum: f64 = self.set_points.iter().map(|(p, _)| p).sum();
            self.tables = ResultTables {
                bus_vm_pu: vec![1.0, 1.0 + sum / 100.0],
                load_p_mw: vec![1.0, 3.0],
                sgen_p_mw: self.set_points.iter().map(|(p, _)| *p).collect(),
            };
            Ok(PowerFlowReport {
                iterations: 3,
                buses: 2,
                isolated_buses: 0,
            })
        }

        fn result_tables(&self) -> ResultTables {
            self.tables.clone()
        }
    }

    fn series(values: &[f64]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let times = (0..values.len())
            .map(|i| start + Duration::minutes(15 * i as i64))
            .collect();
        TimeSeries::new(times, values.to_vec()).unwrap()
    }

    #[test]
    fn empty_series_never_solves() {
        let mut topo = Scripted::new(vec![true]);
        let out = run(&mut topo, 1, &series(&[]), 0.97, OperatingMode::Inductive).unwrap();
        assert!(out.is_empty());
        assert_eq!(topo.solves, 0);
        assert_eq!(out.convergence_rate(), None);
    }

    #[test]
    fn always_failing_solver_yields_finite_defaults() {
        let mut topo = Scripted::new(vec![]);
        let out = run(&mut topo, 1, &series(&[1.0, 2.0, 3.0]), 0.97, OperatingMode::Inductive)
            .unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(topo.solves, 3);
        assert_eq!(out.failed_steps(), 3);
        assert_eq!(out.convergence_rate(), Some(0.0));
        for step in &out.steps {
            assert_eq!(step.mean_bus_vm_pu, 0.0);
            assert_eq!(step.mean_load_p_mw, 0.0);
            assert_eq!(step.mean_sgen_p_mw, 0.0);
            assert_eq!(step.target_sgen_p_mw, 0.0);
            assert!(matches!(step.status, StepStatus::Failed(PowerFlowError::NotConverged { .. })));
        }
    }

    #[test]
    fn failed_step_keeps_stale_results() {
        let mut topo = Scripted::new(vec![true, false, true]);
        let out = run(&mut topo, 1, &series(&[1.0, 5.0, 7.0]), 0.97, OperatingMode::Inductive)
            .unwrap();
        assert_eq!(out.target_generator_power(), vec![1.0, 1.0, 7.0]);
        assert!(!out.steps[1].status.is_converged());
        assert_eq!(out.steps[2].status, StepStatus::Converged { iterations: 3 });
        assert_eq!(out.convergence_rate(), Some(2.0 / 3.0));
    }

    #[test]
    fn reactive_power_follows_mode() {
        let mut topo = Scripted::new(vec![true]);
        run(&mut topo, 2, &series(&[10.0]), 0.9, OperatingMode::Capacitive).unwrap();
        let (p, q) = topo.set_points[2];
        assert_eq!(p, 10.0);
        assert_eq!(q, reactive_power(10.0, 0.9, OperatingMode::Capacitive));
        assert!(q < 0.0);
    }

    #[test]
    fn mean_generator_power_differs_from_target() {
        let mut topo = Scripted::new(vec![true]);
        let out = run(&mut topo, 1, &series(&[8.0, 9.0]), 0.97, OperatingMode::Inductive).unwrap();
        assert_eq!(out.target_generator_power(), vec![8.0, 9.0]);
        assert_eq!(out.mean_generator_power(), vec![4.0, 13.0 / 3.0]);
        assert_ne!(out.mean_generator_power(), out.target_generator_power());
    }

    #[test]
    fn exclusion_policy_ignores_undefined_rows() {
        let mut topo = Scripted::new(vec![false]);
        topo.tables.bus_vm_pu = vec![1.02, f64::NAN];
        let config = ScenarioConfig {
            missing_values: MissingValuePolicy::Exclude,
            ..Default::default()
        };
        let mut driver = ScenarioDriver::new(&mut topo, 0, config).unwrap();
        let out = driver.run(&series(&[1.0])).unwrap();
        assert_eq!(out.mean_bus_voltage(), vec![1.02]);

        let mut topo = Scripted::new(vec![false]);
        topo.tables.bus_vm_pu = vec![1.02, f64::NAN];
        let out = run(&mut topo, 0, &series(&[1.0]), 0.97, OperatingMode::Inductive).unwrap();
        assert_eq!(out.mean_bus_voltage(), vec![0.51]);
    }

    #[test]
    fn invalid_configuration_fails_before_first_step() {
        let mut topo = Scripted::new(vec![true]);
        assert!(matches!(
            run(&mut topo, 7, &series(&[1.0]), 0.97, OperatingMode::Inductive),
            Err(ScenarioError::UnknownTarget)
        ));
        assert!(matches!(
            run(&mut topo, 0, &series(&[1.0]), 1.5, OperatingMode::Inductive),
            Err(ScenarioError::InvalidConfig { .. })
        ));
        assert_eq!(
            "unknown".parse::<OperatingMode>().map_err(ScenarioError::from),
            Err(ScenarioError::InvalidMode(crate::error::InvalidModeError(
                "unknown".into()
            )))
        );
        assert_eq!(topo.solves, 0);
    }

    #[test]
    fn identical_runs_are_identical() {
        let values = [0.5, 1.5, 1.0, 0.0];
        let outputs: Vec<_> = (0..2)
            .map(|_| {
                let mut topo = Scripted::new(vec![true, false]);
                run(&mut topo, 0, &series(&values), 0.97, OperatingMode::Inductive).unwrap()
            })
            .collect();
        assert_eq!(outputs[0], outputs[1]);
    }

    #[test]
    fn replays_on_the_reference_ring() {
        let mut ring = mv_open_ring(&RingSetpoints::default()).unwrap();
        let values = [0.0, 1.0, 2.0, 1.5];
        let out = run(
            &mut ring.grid,
            ring.target,
            &series(&values),
            0.97,
            OperatingMode::Inductive,
        )
        .unwrap();
        assert_eq!(out.len(), values.len());
        assert_eq!(out.converged_steps(), values.len());
        for (step, p) in out.steps.iter().zip(values) {
            assert!((step.target_sgen_p_mw - p).abs() < 1e-9);
            assert!(step.mean_bus_vm_pu > 0.9 && step.mean_bus_vm_pu < 1.1);
        }
        assert_ne!(out.mean_generator_power(), out.target_generator_power());
    }

    #[test]
    fn overflowing_reactive_power_is_a_failed_step() {
        let mut topo = Scripted::new(vec![true]);
        // tan(arccos(0.001)) is about 1000, so q exceeds f64::MAX
        let values = [1.0, 1e306, 2.0];
        let out = run(&mut topo, 1, &series(&values), 0.001, OperatingMode::Inductive).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(topo.solves, 2);
        assert!(matches!(
            out.steps[1].status,
            StepStatus::Rejected(TopologyError::InvalidParameter { what: "q_mvar", .. })
        ));
        assert_eq!(out.target_generator_power(), vec![1.0, 1.0, 2.0]);
        assert_eq!(out.failed_steps(), 1);
    }

    #[test]
    fn isolated_bus_is_zero_filled_on_the_reference_ring() {
        let mut ring = mv_open_ring(&RingSetpoints::default()).unwrap();
        // bus 4 loses both ring neighbours
        ring.grid.set_switch_state(ring.switch, false).unwrap();
        ring.grid.set_in_service(ring.lines[3], false).unwrap();

        let out = run(
            &mut ring.grid,
            ring.target,
            &series(&[1.0, 2.0]),
            0.97,
            OperatingMode::Inductive,
        )
        .unwrap();
        assert_eq!(out.converged_steps(), 2);
        assert_eq!(out.target_generator_power(), vec![0.0, 0.0]);

        let vm: Vec<f64> = ring.grid.res_bus().iter().map(|b| b.vm_pu).collect();
        assert!(vm[4].is_nan());
        let energized: f64 = vm.iter().filter(|v| v.is_finite()).sum();
        let step = &out.steps[1];
        assert!((step.mean_bus_vm_pu - energized / 7.0).abs() < 1e-12);
        assert!(step.mean_bus_vm_pu < 6.1 / 7.0);

        let config = ScenarioConfig {
            missing_values: MissingValuePolicy::Exclude,
            ..Default::default()
        };
        let out = ScenarioDriver::new(&mut ring.grid, ring.target, config)
            .unwrap()
            .run(&series(&[2.0]))
            .unwrap();
        assert!((out.steps[0].mean_bus_vm_pu - energized / 6.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn output_length_matches_input(
            values in proptest::collection::vec(0.0f64..50.0, 0..40),
            script in proptest::collection::vec(any::<bool>(), 0..8),
        ) {
            let mut topo = Scripted::new(script);
            let out = run(&mut topo, 2, &series(&values), 0.97, OperatingMode::Inductive).unwrap();
            prop_assert_eq!(out.len(), values.len());
            prop_assert_eq!(out.times().len(), values.len());
            prop_assert_eq!(out.mean_bus_voltage().len(), values.len());
            prop_assert_eq!(out.mean_load_power().len(), values.len());
            prop_assert_eq!(out.mean_generator_power().len(), values.len());
            prop_assert_eq!(out.target_generator_power().len(), values.len());
            prop_assert_eq!(topo.solves, values.len());
            prop_assert!(out.steps.iter().all(|s| s.mean_bus_vm_pu.is_finite()
                && s.target_sgen_p_mw.is_finite()));
        }
    }
}
