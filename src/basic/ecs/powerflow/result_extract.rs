use bevy_ecs::prelude::*;
use nalgebra::DVector;
use num_complex::Complex64;

use crate::basic::{dsbus_dv::current_injection, ecs::elements::*};

use super::systems::{PowerFlowMat, PowerFlowResult};

/// `S = V .* conj(Ybus V)` in per unit, generator reference.
pub(crate) fn bus_injections(mat: &PowerFlowMat, v: &DVector<Complex64>) -> DVector<Complex64> {
    let i = current_injection(&mat.y_bus, v);
    v.zip_map(&i, |v, i| v * i.conj())
}

/// Writes bus, load, static generator and external grid results of a
/// converged solve back into the element components.
#[allow(clippy::type_complexity)]
pub fn extract_powerflow_results(
    mat: Res<PowerFlowMat>,
    res: Res<PowerFlowResult>,
    common: Res<PFCommonData>,
    mut buses: Query<(&BusID, &mut BusResult)>,
    mut loads: Query<
        (&TargetBus, &TargetPMW, &TargetQMVar, &LoadCfg, Has<OutOfService>, &mut PowerResult),
        Without<Slack>,
    >,
    mut sgens: Query<
        (&TargetBus, &SGenDevice, Has<OutOfService>, &mut PowerResult),
        (Without<TargetPMW>, Without<Slack>),
    >,
    mut ext_grids: Query<(&TargetBus, Has<OutOfService>, &mut PowerResult), With<Slack>>,
) {
    let nodes = res.v.len();
    let sbase = common.sbase;
    let s_calc = bus_injections(&mat, &res.v) * Complex64::new(sbase, 0.0);
    let energized = |bus: i64| {
        usize::try_from(bus)
            .ok()
            .filter(|&b| b < nodes && mat.energized[b])
    };

    for (id, mut result) in buses.iter_mut() {
        *result = match energized(id.0) {
            Some(b) => BusResult {
                vm_pu: res.v[b].norm(),
                va_degree: res.v[b].arg().to_degrees(),
                p_mw: -s_calc[b].re,
                q_mvar: -s_calc[b].im,
            },
            None => BusResult::isolated(),
        };
    }

    // net consumption of loads and static generators per bus, in MVA
    let mut demand = vec![Complex64::new(0.0, 0.0); nodes];
    for (bus, p, q, cfg, out, mut result) in loads.iter_mut() {
        let s = match energized(bus.0) {
            Some(b) if !out => {
                let s = Complex64::new(p.0, q.0) * cfg.scaling;
                demand[b] += s;
                s
            }
            _ => Complex64::new(0.0, 0.0),
        };
        result.0 = s;
    }
    for (bus, dev, out, mut result) in sgens.iter_mut() {
        let s = match energized(bus.0) {
            Some(b) if !out => {
                let s = dev.injection();
                demand[b] -= s;
                s
            }
            _ => Complex64::new(0.0, 0.0),
        };
        result.0 = s;
    }

    let mut grids_at_bus = vec![0usize; nodes];
    for (bus, out, _) in ext_grids.iter() {
        if let (Some(b), false) = (energized(bus.0), out) {
            grids_at_bus[b] += 1;
        }
    }
    for (bus, out, mut result) in ext_grids.iter_mut() {
        result.0 = match energized(bus.0) {
            Some(b) if !out => (s_calc[b] + demand[b]) / grids_at_bus[b] as f64,
            _ => Complex64::new(0.0, 0.0),
        };
    }
}
