use std::collections::VecDeque;

use bevy_ecs::{prelude::*, system::RunSystemOnce};
use derive_more::{Deref, DerefMut};
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use num_complex::Complex64;
use num_traits::Zero;
use tracing::debug;

use crate::{
    basic::{
        ecs::{elements::*, network::PowerFlowSolver},
        newton_pf,
    },
    error::PowerFlowError,
};

/// Admittance used for a closed bus-bus switch without impedance, in p.u.
pub const SWITCH_ADMITTANCE_PU: f64 = 1e6;

/// Resource that holds the power flow configuration options: maximum
/// iterations and tolerance for convergence.
#[derive(Debug, Default, Resource, Clone, serde::Serialize, serde::Deserialize)]
pub struct PowerFlowConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_it: Option<usize>, // Maximum number of iterations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tol: Option<f64>, // Tolerance for convergence
}

/// Summary of a converged solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerFlowReport {
    pub iterations: usize,
    pub buses: usize,
    pub isolated_buses: usize,
}

/// Resource for storing the outcome of the latest power flow calculation.
#[derive(Debug, Default, Resource, Clone)]
pub struct PowerFlowResult {
    pub v: DVector<Complex64>, // Final voltage vector, last iterate on failure
    pub iterations: usize,     // Number of iterations taken
    pub converged: bool,       // Convergence status
    pub error: Option<PowerFlowError>,
    pub isolated_buses: usize,
}

impl PowerFlowResult {
    fn failed(error: PowerFlowError, v: DVector<Complex64>) -> Self {
        let iterations = match error {
            PowerFlowError::NotConverged { iterations } => iterations,
            _ => 0,
        };
        Self {
            v,
            iterations,
            converged: false,
            error: Some(error),
            isolated_buses: 0,
        }
    }

    pub fn outcome(&self) -> Result<PowerFlowReport, PowerFlowError> {
        if self.converged {
            Ok(PowerFlowReport {
                iterations: self.iterations,
                buses: self.v.len(),
                isolated_buses: self.isolated_buses,
            })
        } else {
            Err(self.error.clone().unwrap_or(PowerFlowError::NotConverged {
                iterations: self.iterations,
            }))
        }
    }
}

/// Last converged voltages, used to warm start the next solve.
#[derive(Debug, Default, Resource, Clone, Deref, DerefMut)]
pub struct WarmStart(pub Option<DVector<Complex64>>);

/// Resource holding the system assembled for one solve: admittance matrix
/// (Y-bus), power injections (S-bus) and the initial voltages, all indexed by
/// bus id.
#[derive(Debug, Resource, Clone)]
pub struct PowerFlowMat {
    pub y_bus: CscMatrix<Complex64>,
    pub s_bus: DVector<Complex64>,
    pub v_bus_init: DVector<Complex64>,
    pub pv: Vec<usize>,
    pub pq: Vec<usize>,
    /// `false` for buses without a path to a slack bus.
    pub energized: Vec<bool>,
}

/// Two-port branch in per unit with a complex ratio on the from side:
///
/// ```text
/// | If |   | (ys + yf) / |N|^2   -ys / conj(N) | | Vf |
/// | It | = | -ys / N              ys + yt      | | Vt |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BranchPu {
    pub from: usize,
    pub to: usize,
    pub y_series: Complex64,
    pub y_shunt_from: Complex64,
    pub y_shunt_to: Complex64,
    pub ratio: Complex64,
}

impl BranchPu {
    fn simple(from: usize, to: usize, y_series: Complex64, y_shunt_half: Complex64) -> Self {
        Self {
            from,
            to,
            y_series,
            y_shunt_from: y_shunt_half,
            y_shunt_to: y_shunt_half,
            ratio: Complex64::new(1.0, 0.0),
        }
    }
}

/// Builds the Y-bus matrix. Every diagonal entry is stored, even when zero.
pub(crate) fn create_y_bus(nodes: usize, branches: &[BranchPu]) -> CscMatrix<Complex64> {
    let mut coo = CooMatrix::new(nodes, nodes);
    for i in 0..nodes {
        coo.push(i, i, Complex64::zero());
    }
    for br in branches {
        coo.push(br.from, br.from, (br.y_series + br.y_shunt_from) / br.ratio.norm_sqr());
        coo.push(br.from, br.to, -br.y_series / br.ratio.conj());
        coo.push(br.to, br.from, -br.y_series / br.ratio);
        coo.push(br.to, br.to, br.y_series + br.y_shunt_to);
    }
    CscMatrix::from(&coo)
}

/// Marks every bus reachable from a slack bus and estimates its voltage
/// angle from the phase shifts passed on the way.
pub(crate) fn energized_buses(
    nodes: usize,
    branches: &[BranchPu],
    slacks: &[(usize, f64)],
) -> (Vec<bool>, Vec<f64>) {
    let mut adjacency = vec![Vec::new(); nodes];
    for br in branches {
        let shift = br.ratio.arg();
        adjacency[br.from].push((br.to, -shift));
        adjacency[br.to].push((br.from, shift));
    }
    let mut energized = vec![false; nodes];
    let mut angle = vec![0.0; nodes];
    let mut queue = VecDeque::new();
    for &(bus, va) in slacks {
        if !energized[bus] {
            energized[bus] = true;
            angle[bus] = va;
            queue.push_back(bus);
        }
    }
    while let Some(bus) = queue.pop_front() {
        for &(next, offset) in &adjacency[bus] {
            if !energized[next] {
                energized[next] = true;
                angle[next] = angle[bus] + offset;
                queue.push_back(next);
            }
        }
    }
    (energized, angle)
}

fn bus_index(bus: i64, nodes: usize) -> Result<usize, PowerFlowError> {
    usize::try_from(bus)
        .ok()
        .filter(|&idx| idx < nodes)
        .ok_or_else(|| PowerFlowError::Assembly {
            what: format!("reference to unknown bus {bus}"),
        })
}

/// Collects the in-service branches in per unit.
///
/// A branch with an out-of-service terminal bus or an open switch at one of
/// its ends is left out. Closed bus-bus switches become coupling branches.
#[allow(clippy::type_complexity)]
pub(crate) fn collect_branches(
    common: Res<PFCommonData>,
    buses: Query<(&BusID, &VNominal, Has<OutOfService>)>,
    lines: Query<(Entity, &FromBus, &ToBus, &LineParams), (With<Line>, Without<OutOfService>)>,
    trafos: Query<
        (Entity, &FromBus, &ToBus, &TransformerDevice),
        (With<Transformer>, Without<OutOfService>),
    >,
    switches: Query<(&Switch, &SwitchState), Without<OutOfService>>,
) -> Result<(Vec<f64>, Vec<bool>, Vec<BranchPu>), PowerFlowError> {
    let nodes = buses.iter().count();
    let mut vn = vec![0.0; nodes];
    let mut in_service = vec![true; nodes];
    for (id, v, out) in buses.iter() {
        let idx = bus_index(id.0, nodes)?;
        vn[idx] = v.0;
        in_service[idx] = !out;
    }

    let open_elements: Vec<Entity> = switches
        .iter()
        .filter(|(sw, state)| !state.0 && sw.et != SwitchType::BusBus)
        .map(|(sw, _)| sw.element)
        .collect();

    let sbase = common.sbase;
    let to_pu = |y: Complex64, vb: f64| y * (vb * vb) / sbase;
    let mut branches = Vec::new();

    for (entity, from, to, params) in lines.iter() {
        let (f, t) = (bus_index(from.0, nodes)?, bus_index(to.0, nodes)?);
        if !(in_service[f] && in_service[t]) || open_elements.contains(&entity) {
            continue;
        }
        let vb = vn[f];
        let y_sh = to_pu(params.shunt_admittance(common.wbase), vb) * 0.5;
        branches.push(BranchPu::simple(f, t, to_pu(params.series_admittance(), vb), y_sh));
    }

    for (entity, hv, lv, dev) in trafos.iter() {
        let (f, t) = (bus_index(hv.0, nodes)?, bus_index(lv.0, nodes)?);
        if !(in_service[f] && in_service[t]) || open_elements.contains(&entity) {
            continue;
        }
        let vb = vn[t];
        let y_m = to_pu(dev.magnetizing_admittance(), vb) * 0.5;
        branches.push(BranchPu {
            from: f,
            to: t,
            y_series: to_pu(dev.series_admittance(), vb),
            y_shunt_from: y_m,
            y_shunt_to: y_m,
            ratio: dev.ratio(vn[f], vn[t]),
        });
    }

    for (sw, state) in switches.iter() {
        if sw.et != SwitchType::BusBus || !state.0 {
            continue;
        }
        let f = bus_index(sw.bus, nodes)?;
        let t = match buses.get(sw.element) {
            Ok((id, _, _)) => bus_index(id.0, nodes)?,
            Err(_) => {
                return Err(PowerFlowError::Assembly {
                    what: "bus-bus switch points to a non-bus element".into(),
                });
            }
        };
        if !(in_service[f] && in_service[t]) {
            continue;
        }
        let y = if sw.z_ohm > 0.0 {
            to_pu(Complex64::new(1.0 / sw.z_ohm, 0.0), vn[f])
        } else {
            Complex64::new(SWITCH_ADMITTANCE_PU, 0.0)
        };
        branches.push(BranchPu::simple(f, t, y, Complex64::zero()));
    }

    Ok((vn, in_service, branches))
}

/// Net complex power injection per bus in per unit, generator reference.
#[allow(clippy::type_complexity)]
pub(crate) fn collect_injections(
    common: Res<PFCommonData>,
    index: Res<ElementIndex>,
    loads: Query<(&TargetBus, &TargetPMW, &TargetQMVar, &LoadCfg), Without<OutOfService>>,
    sgens: Query<(&TargetBus, &SGenDevice), Without<OutOfService>>,
    slacks: Query<(&TargetBus, &TargetVmPu, &TargetVaDeg), (With<Slack>, Without<OutOfService>)>,
) -> Result<(DVector<Complex64>, Vec<(usize, Complex64)>), PowerFlowError> {
    let nodes = index.buses.len();
    let s_base_frac = 1.0 / common.sbase;
    let mut s_bus = DVector::zeros(nodes);
    for (bus, p, q, cfg) in loads.iter() {
        s_bus[bus_index(bus.0, nodes)?] -= Complex64::new(p.0, q.0) * cfg.scaling * s_base_frac;
    }
    for (bus, dev) in sgens.iter() {
        s_bus[bus_index(bus.0, nodes)?] += dev.injection() * s_base_frac;
    }
    let mut slack = Vec::new();
    for (bus, vm, va) in slacks.iter() {
        let v = Complex64::from_polar(vm.0, va.0.to_radians());
        slack.push((bus_index(bus.0, nodes)?, v));
    }
    slack.sort_by_key(|(bus, _)| *bus);
    Ok((s_bus, slack))
}

fn run_assembly<T, M>(
    world: &mut World,
    system: impl IntoSystem<(), Result<T, PowerFlowError>, M>,
) -> Result<T, PowerFlowError>
where
    T: 'static,
{
    world
        .run_system_once(system)
        .map_err(|err| PowerFlowError::Assembly {
            what: format!("{err:?}"),
        })?
}

/// Assembles the system for the current state of the world.
pub(crate) fn assemble(world: &mut World) -> Result<PowerFlowMat, PowerFlowError> {
    let (vn, in_service, branches) = run_assembly(world, collect_branches)?;
    let nodes = vn.len();
    if nodes == 0 {
        return Err(PowerFlowError::EmptyNetwork);
    }
    let (s_bus, slack) = run_assembly(world, collect_injections)?;
    if s_bus.len() != nodes {
        return Err(PowerFlowError::Assembly {
            what: format!("{} indexed buses, {nodes} bus entities", s_bus.len()),
        });
    }
    let slack: Vec<_> = slack.into_iter().filter(|(bus, _)| in_service[*bus]).collect();
    if slack.is_empty() {
        return Err(PowerFlowError::NoSlack);
    }

    let seeds: Vec<(usize, f64)> = slack.iter().map(|(bus, v)| (*bus, v.arg())).collect();
    let (energized, angle) = energized_buses(nodes, &branches, &seeds);

    let warm = world
        .get_resource::<WarmStart>()
        .and_then(|w| w.0.clone())
        .filter(|v| v.len() == nodes);
    let mut v_bus_init = DVector::zeros(nodes);
    for bus in (0..nodes).filter(|&b| energized[b]) {
        v_bus_init[bus] = warm
            .as_ref()
            .map(|v| v[bus])
            .filter(|v| v.is_finite() && !v.is_zero())
            .unwrap_or_else(|| Complex64::from_polar(1.0, angle[bus]));
    }
    for &(bus, v) in &slack {
        v_bus_init[bus] = v;
    }

    let pq: Vec<usize> = (0..nodes)
        .filter(|&b| energized[b] && !slack.iter().any(|(s, _)| *s == b))
        .collect();

    Ok(PowerFlowMat {
        y_bus: create_y_bus(nodes, &branches),
        s_bus,
        v_bus_init,
        pv: Vec::new(),
        pq,
        energized,
    })
}

/// Assembles the power flow system and stores it as [`PowerFlowMat`].
///
/// On failure the matrices are removed and the error is recorded in
/// [`PowerFlowResult`].
pub fn init_states(world: &mut World) {
    match assemble(world) {
        Ok(mat) => {
            debug!(buses = mat.v_bus_init.len(), pq = mat.pq.len(), "power flow system assembled");
            world.insert_resource(mat);
        }
        Err(err) => {
            debug!(%err, "power flow system assembly failed");
            world.remove_resource::<PowerFlowMat>();
            let v = world
                .get_resource::<PowerFlowResult>()
                .map(|r| r.v.clone())
                .unwrap_or_default();
            world.insert_resource(PowerFlowResult::failed(err, v));
        }
    }
}

/// ECS system that runs the power flow calculation based on the current
/// configuration and matrices.
pub fn ecs_run_pf(
    mat: Res<PowerFlowMat>,
    cfg: Res<PowerFlowConfig>,
    mut solver: ResMut<PowerFlowSolver>,
    mut result: ResMut<PowerFlowResult>,
    mut warm: ResMut<WarmStart>,
) {
    let v = newton_pf(
        &mat.y_bus,
        &mat.s_bus,
        &mat.v_bus_init,
        &mat.pv,
        &mat.pq,
        cfg.tol,
        cfg.max_it,
        &mut solver.solver,
    );
    match v {
        Ok((v, iterations)) => {
            warm.0 = Some(v.clone());
            *result = PowerFlowResult {
                v,
                iterations,
                converged: true,
                error: None,
                isolated_buses: mat.energized.iter().filter(|e| !**e).count(),
            };
        }
        Err((err, v_err)) => {
            *result = PowerFlowResult::failed(err, v_err);
        }
    }
}

/// Run condition: the last solve converged.
pub fn pf_converged(result: Res<PowerFlowResult>) -> bool {
    result.converged
}
