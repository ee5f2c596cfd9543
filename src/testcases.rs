//! Reference networks.

use crate::{
    basic::ecs::{builder::SwitchElement, elements::*, network::PowerGrid},
    error::TopologyError,
    scenario::{DEFAULT_COS_PHI, OperatingMode, reactive_power},
};

const CABLE: &str = "NA2XS2Y 1x185 RM/25 12/20 kV";
const TRAFO: &str = "25 MVA 110/20 kV";

/// Active power set-points of the ring, index `i` belongs to bus `i + 2`.
///
/// Reactive power is derived at `cos_phi = 0.97`, inductive.
#[derive(Debug, Clone, PartialEq)]
pub struct RingSetpoints {
    pub load_p_mw: [f64; 5],
    pub sgen_p_mw: [f64; 5],
}

impl Default for RingSetpoints {
    /// Light loading that stays well inside the transformer rating.
    fn default() -> Self {
        Self {
            load_p_mw: [2.0, 2.0, 1.0, 1.0, 1.0],
            sgen_p_mw: [0.5, 0.5, 1.0, 1.0, 1.0],
        }
    }
}

impl RingSetpoints {
    /// Set-points of the historical study case. The ring carries far more
    /// than the 25 MVA transformer rating; moderate target set-points still
    /// converge at depressed voltages, high ones do not.
    pub fn historical() -> Self {
        Self {
            load_p_mw: [50.0, 50.0, 1.0, 1.0, 1.0],
            sgen_p_mw: [1.0, 1.0, 160.0, 100.0, 100.0],
        }
    }
}

/// Handles of [`mv_open_ring`].
pub struct MvOpenRing {
    pub grid: PowerGrid,
    pub buses: Vec<BusId>,
    pub lines: Vec<LineId>,
    pub trafo: TrafoId,
    pub ext_grid: ExtGridId,
    pub loads: Vec<LoadId>,
    pub sgens: Vec<SGenId>,
    pub switch: SwitchId,
    /// Generator at bus 4 that scenarios replay on.
    pub target: SGenId,
}

/// Medium-voltage ring fed from a 110 kV grid through one transformer.
///
/// Bus 0 is the 110 kV bar with the external grid, bus 1 the 20 kV bar and
/// buses 2-6 form a ring of six 1 km cables. A closed load-break switch sits
/// on line 2 at bus 3. Every ring bus carries one load and one generator.
pub fn mv_open_ring(setpoints: &RingSetpoints) -> Result<MvOpenRing, TopologyError> {
    mv_open_ring_with_base(setpoints, 1.0)
}

/// [`mv_open_ring`] with a base power of `sn_mva` at 50 Hz.
pub fn mv_open_ring_with_base(
    setpoints: &RingSetpoints,
    sn_mva: f64,
) -> Result<MvOpenRing, TopologyError> {
    let q = |p| reactive_power(p, DEFAULT_COS_PHI, OperatingMode::Inductive);
    let mut grid = PowerGrid::new(sn_mva, 50.0);

    let mut buses = vec![
        grid.create_bus(110.0, "110 kV bar")?,
        grid.create_bus(20.0, "20 kV bar")?,
    ];
    for n in 2..=6 {
        buses.push(grid.create_bus(20.0, &format!("bus {n}"))?);
    }
    let ext_grid = grid.create_external_grid(buses[0], 1.0, 0.0, "grid")?;

    let ring = [(1, 2), (2, 3), (3, 4), (4, 5), (5, 6), (6, 1)];
    let lines = ring
        .iter()
        .enumerate()
        .map(|(idx, &(f, t))| {
            grid.create_line(buses[f], buses[t], 1.0, CABLE, &format!("line {idx}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let trafo = grid.create_transformer(buses[0], buses[1], TRAFO, "trafo")?;

    let mut loads = Vec::with_capacity(5);
    let mut sgens = Vec::with_capacity(5);
    for (idx, (&pl, &pg)) in setpoints
        .load_p_mw
        .iter()
        .zip(&setpoints.sgen_p_mw)
        .enumerate()
    {
        let bus = buses[idx + 2];
        loads.push(grid.create_load(bus, pl, q(pl), &format!("load {idx}"))?);
        sgens.push(grid.create_static_generator(bus, pg, q(pg), &format!("sgen {idx}"))?);
    }
    let switch = grid.create_switch(buses[3], SwitchElement::Line(lines[2]), true, "LBS")?;

    Ok(MvOpenRing {
        target: sgens[2],
        grid,
        buses,
        lines,
        trafo,
        ext_grid,
        loads,
        sgens,
        switch,
    })
}
