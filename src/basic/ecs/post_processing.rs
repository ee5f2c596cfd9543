use bevy_ecs::{name::Name, prelude::*};
use tabled::{Table, settings::Style};

mod res_display;
pub(crate) use res_display::*;

use super::{
    elements::*,
    network::{DataOps, PowerGrid},
};

/// One row of the bus result table.
#[derive(Debug, Clone, PartialEq)]
pub struct BusResultRow {
    pub id: BusId,
    pub name: String,
    pub vm_pu: f64,
    pub va_degree: f64,
    pub p_mw: f64,
    pub q_mvar: f64,
}

/// One row of a load, static generator or external grid result table.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerResultRow<I> {
    pub id: I,
    pub name: String,
    pub p_mw: f64,
    pub q_mvar: f64,
}

fn name_of(world: &World, entity: Entity) -> String {
    world
        .get::<Name>(entity)
        .map(|n| n.as_str().to_owned())
        .unwrap_or_default()
}

fn power_rows<I, F>(world: &World, entities: &[Entity], wrap: F) -> Vec<PowerResultRow<I>>
where
    F: Fn(Entity) -> I,
{
    entities
        .iter()
        .filter_map(|&e| {
            world.get::<PowerResult>(e).map(|r| PowerResultRow {
                id: wrap(e),
                name: name_of(world, e),
                p_mw: r.p_mw(),
                q_mvar: r.q_mvar(),
            })
        })
        .collect()
}

fn print_power_rows<I>(rows: &[PowerResultRow<I>]) {
    let rows = rows.iter().enumerate().map(|(idx, r)| PowerResTable {
        Index: idx,
        Name: r.name.clone(),
        P_mw: FloatWrapper::new(r.p_mw, 5),
        Q_mvar: FloatWrapper::new(r.q_mvar, 5),
    });
    let table = Table::new(rows).with(Style::markdown()).to_string();
    println!("{table}");
}

/// Result tables of the latest converged solve, in creation order.
///
/// Rows of elements that were never part of a converged solve hold NaN.
pub trait PostProcessing {
    fn res_bus(&self) -> Vec<BusResultRow>;
    fn res_load(&self) -> Vec<PowerResultRow<LoadId>>;
    fn res_sgen(&self) -> Vec<PowerResultRow<SGenId>>;
    fn res_ext_grid(&self) -> Vec<PowerResultRow<ExtGridId>>;

    /// Prints the results of the power flow for each bus.
    fn print_res_bus(&self);
    fn print_res_load(&self);
    fn print_res_sgen(&self);
}

impl PostProcessing for PowerGrid {
    fn res_bus(&self) -> Vec<BusResultRow> {
        let world = self.world();
        world
            .resource::<ElementIndex>()
            .buses
            .iter()
            .filter_map(|&e| {
                world.get::<BusResult>(e).map(|r| BusResultRow {
                    id: BusId(e),
                    name: name_of(world, e),
                    vm_pu: r.vm_pu,
                    va_degree: r.va_degree,
                    p_mw: r.p_mw,
                    q_mvar: r.q_mvar,
                })
            })
            .collect()
    }

    fn res_load(&self) -> Vec<PowerResultRow<LoadId>> {
        let world = self.world();
        power_rows(world, &world.resource::<ElementIndex>().loads, LoadId)
    }

    fn res_sgen(&self) -> Vec<PowerResultRow<SGenId>> {
        let world = self.world();
        power_rows(world, &world.resource::<ElementIndex>().sgens, SGenId)
    }

    fn res_ext_grid(&self) -> Vec<PowerResultRow<ExtGridId>> {
        let world = self.world();
        power_rows(world, &world.resource::<ElementIndex>().ext_grids, ExtGridId)
    }

    fn print_res_bus(&self) {
        let rows = self.res_bus().into_iter().enumerate().map(|(idx, r)| BusResTable {
            Bus: idx,
            Name: r.name,
            Vm: FloatWrapper::new(r.vm_pu, 5),
            Va: FloatWrapper::new(r.va_degree, 5),
            P_mw: FloatWrapper::new(r.p_mw, 5),
            Q_mvar: FloatWrapper::new(r.q_mvar, 5),
        });
        let table = Table::new(rows).with(Style::markdown()).to_string();
        println!("{table}");
    }

    fn print_res_load(&self) {
        print_power_rows(&self.res_load());
    }

    fn print_res_sgen(&self) {
        print_power_rows(&self.res_sgen());
    }
}
