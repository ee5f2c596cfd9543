//! Element creation and set-point editing on a [`PowerGrid`].
//!
//! Every `create_*` call spawns one entity, records it in the
//! [`ElementIndex`] and returns a typed handle. Handles from another grid are
//! rejected with [`TopologyError::UnknownElement`].

use bevy_ecs::{name::Name, prelude::*};

use crate::error::TopologyError;

use super::{
    elements::{std_types, *},
    network::{DataOps, PowerGrid},
};

/// Far side of a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchElement {
    Line(LineId),
    Bus(BusId),
    Trafo(TrafoId),
}

fn positive(what: &'static str, value: f64) -> Result<f64, TopologyError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(TopologyError::InvalidParameter { what, value })
    }
}

fn finite(what: &'static str, value: f64) -> Result<f64, TopologyError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TopologyError::InvalidParameter { what, value })
    }
}

impl PowerGrid {
    fn index(&self) -> &ElementIndex {
        self.world().resource::<ElementIndex>()
    }

    fn spawn_indexed<B: Bundle>(
        &mut self,
        bundle: B,
        category: fn(&mut ElementIndex) -> &mut Vec<Entity>,
    ) -> Entity {
        let world = self.world_mut();
        let entity = world.spawn(bundle).id();
        category(&mut world.resource_mut::<ElementIndex>()).push(entity);
        entity
    }

    /// Checks that `id` was created by this grid.
    pub fn contains<I: ElementId>(&self, id: I) -> bool {
        I::category(self.index()).contains(&id.entity())
    }

    fn ensure<I: ElementId>(&self, id: I) -> Result<Entity, TopologyError> {
        if self.contains(id) {
            Ok(id.entity())
        } else {
            Err(TopologyError::UnknownElement { kind: I::KIND })
        }
    }

    fn bus_number(&self, bus: BusId) -> Result<i64, TopologyError> {
        let entity = self.ensure(bus)?;
        self.get::<BusID>(entity)
            .map(|id| id.0)
            .ok_or(TopologyError::UnknownElement { kind: BusId::KIND })
    }

    /// Position of an element in its creation-ordered result table.
    pub fn position<I: ElementId>(&self, id: I) -> Option<usize> {
        I::category(self.index())
            .iter()
            .position(|e| *e == id.entity())
    }

    pub fn create_bus(&mut self, vn_kv: f64, name: &str) -> Result<BusId, TopologyError> {
        let vn_kv = positive("vn_kv", vn_kv)?;
        let bus_id = self.index().buses.len() as i64;
        let entity = self.spawn_indexed(
            BusBundle {
                name: Name::new(name.to_owned()),
                bus_id: BusID(bus_id),
                vn_kv: VNominal(vn_kv),
            },
            |index| &mut index.buses,
        );
        Ok(BusId(entity))
    }

    /// Creates a line from a built-in standard type.
    pub fn create_line(
        &mut self,
        from: BusId,
        to: BusId,
        length_km: f64,
        std_type: &str,
        name: &str,
    ) -> Result<LineId, TopologyError> {
        let std = std_types::line_type(std_type)?;
        let params = LineParams::from_std_type(std, positive("length_km", length_km)?);
        let id = self.create_line_from_parameters(from, to, params, name)?;
        self.world_mut()
            .entity_mut(id.entity())
            .insert(StandardModelType(std.name.to_owned()));
        Ok(id)
    }

    pub fn create_line_from_parameters(
        &mut self,
        from: BusId,
        to: BusId,
        params: LineParams,
        name: &str,
    ) -> Result<LineId, TopologyError> {
        let (f, t) = (self.bus_number(from)?, self.bus_number(to)?);
        positive("length_km", params.length_km)?;
        finite("r_ohm_per_km", params.r_ohm_per_km)?;
        finite("x_ohm_per_km", params.x_ohm_per_km)?;
        finite("c_nf_per_km", params.c_nf_per_km)?;
        finite("g_us_per_km", params.g_us_per_km)?;
        if params.r_ohm_per_km == 0.0 && params.x_ohm_per_km == 0.0 {
            return Err(TopologyError::InvalidParameter {
                what: "line impedance",
                value: 0.0,
            });
        }
        if params.parallel == 0 {
            return Err(TopologyError::InvalidParameter {
                what: "parallel",
                value: 0.0,
            });
        }
        let entity = self.spawn_indexed(
            LineBundle {
                marker: Line,
                name: Name::new(name.to_owned()),
                from: FromBus(f),
                to: ToBus(t),
                params,
            },
            |index| &mut index.lines,
        );
        Ok(LineId(entity))
    }

    /// Creates a transformer from a built-in standard type.
    pub fn create_transformer(
        &mut self,
        hv_bus: BusId,
        lv_bus: BusId,
        std_type: &str,
        name: &str,
    ) -> Result<TrafoId, TopologyError> {
        let std = std_types::trafo_type(std_type)?;
        let id = self.create_transformer_from_parameters(hv_bus, lv_bus, std.into(), name)?;
        self.world_mut()
            .entity_mut(id.entity())
            .insert(StandardModelType(std.name.to_owned()));
        Ok(id)
    }

    pub fn create_transformer_from_parameters(
        &mut self,
        hv_bus: BusId,
        lv_bus: BusId,
        device: TransformerDevice,
        name: &str,
    ) -> Result<TrafoId, TopologyError> {
        let (hv, lv) = (self.bus_number(hv_bus)?, self.bus_number(lv_bus)?);
        positive("sn_mva", device.sn_mva)?;
        positive("vn_hv_kv", device.vn_hv_kv)?;
        positive("vn_lv_kv", device.vn_lv_kv)?;
        positive("vk_percent", device.vk_percent)?;
        finite("vkr_percent", device.vkr_percent)?;
        if device.vkr_percent < 0.0 || device.vkr_percent > device.vk_percent {
            return Err(TopologyError::InvalidParameter {
                what: "vkr_percent",
                value: device.vkr_percent,
            });
        }
        if device.parallel == 0 {
            return Err(TopologyError::InvalidParameter {
                what: "parallel",
                value: 0.0,
            });
        }
        let entity = self.spawn_indexed(
            TransformerBundle {
                marker: Transformer,
                name: Name::new(name.to_owned()),
                device,
                from_bus: FromBus(hv),
                to_bus: ToBus(lv),
            },
            |index| &mut index.trafos,
        );
        Ok(TrafoId(entity))
    }

    /// Creates a constant-power load, `p_mw`/`q_mvar` in consumer reference.
    pub fn create_load(
        &mut self,
        bus: BusId,
        p_mw: f64,
        q_mvar: f64,
        name: &str,
    ) -> Result<LoadId, TopologyError> {
        let bus = self.bus_number(bus)?;
        let entity = self.spawn_indexed(
            LoadBundle {
                name: Name::new(name.to_owned()),
                target_bus: TargetBus(bus),
                target_p: TargetPMW(finite("p_mw", p_mw)?),
                target_q: TargetQMVar(finite("q_mvar", q_mvar)?),
                cfg: LoadCfg::default(),
                result: PowerResult::default(),
            },
            |index| &mut index.loads,
        );
        Ok(LoadId(entity))
    }

    /// Creates a static generator, `p_mw`/`q_mvar` in generator reference.
    pub fn create_static_generator(
        &mut self,
        bus: BusId,
        p_mw: f64,
        q_mvar: f64,
        name: &str,
    ) -> Result<SGenId, TopologyError> {
        let bus = self.bus_number(bus)?;
        let device = SGenDevice::new(finite("p_mw", p_mw)?, finite("q_mvar", q_mvar)?);
        let entity = self.spawn_indexed(
            SGenBundle {
                name: Name::new(name.to_owned()),
                target_bus: TargetBus(bus),
                device,
                result: PowerResult::default(),
            },
            |index| &mut index.sgens,
        );
        Ok(SGenId(entity))
    }

    /// Creates a switch between `bus` and a line end, a transformer terminal
    /// or a second bus.
    pub fn create_switch(
        &mut self,
        bus: BusId,
        element: SwitchElement,
        closed: bool,
        name: &str,
    ) -> Result<SwitchId, TopologyError> {
        let bus_nr = self.bus_number(bus)?;
        let touches = |from: Option<&FromBus>, to: Option<&ToBus>| {
            from.is_some_and(|f| f.0 == bus_nr) || to.is_some_and(|t| t.0 == bus_nr)
        };
        let (et, target) = match element {
            SwitchElement::Line(line) => {
                let e = self.ensure(line)?;
                if !touches(self.get::<FromBus>(e), self.get::<ToBus>(e)) {
                    return Err(TopologyError::NotConnected { kind: LineId::KIND });
                }
                (SwitchType::BusLine, e)
            }
            SwitchElement::Trafo(trafo) => {
                let e = self.ensure(trafo)?;
                if !touches(self.get::<FromBus>(e), self.get::<ToBus>(e)) {
                    return Err(TopologyError::NotConnected { kind: TrafoId::KIND });
                }
                (SwitchType::BusTransformer, e)
            }
            SwitchElement::Bus(other) => (SwitchType::BusBus, self.ensure(other)?),
        };
        let entity = self.spawn_indexed(
            SwitchBundle {
                name: Name::new(name.to_owned()),
                switch: Switch {
                    bus: bus_nr,
                    element: target,
                    et,
                    z_ohm: 0.0,
                },
                state: SwitchState(closed),
            },
            |index| &mut index.switches,
        );
        Ok(SwitchId(entity))
    }

    /// Creates an external grid (slack) at `bus`.
    pub fn create_external_grid(
        &mut self,
        bus: BusId,
        vm_pu: f64,
        va_degree: f64,
        name: &str,
    ) -> Result<ExtGridId, TopologyError> {
        let bus = self.bus_number(bus)?;
        let entity = self.spawn_indexed(
            ExtGridBundle {
                name: Name::new(name.to_owned()),
                slack: Slack,
                target_bus: TargetBus(bus),
                vm_pu: TargetVmPu(positive("vm_pu", vm_pu)?),
                va_degree: TargetVaDeg(finite("va_degree", va_degree)?),
                result: PowerResult::default(),
            },
            |index| &mut index.ext_grids,
        );
        Ok(ExtGridId(entity))
    }

    /// Sets the active and reactive power of a static generator.
    pub fn set_sgen_power(
        &mut self,
        id: SGenId,
        p_mw: f64,
        q_mvar: f64,
    ) -> Result<(), TopologyError> {
        let entity = self.ensure(id)?;
        let (p_mw, q_mvar) = (finite("p_mw", p_mw)?, finite("q_mvar", q_mvar)?);
        let mut device = self
            .get_mut::<SGenDevice>(entity)
            .ok_or(TopologyError::UnknownElement { kind: SGenId::KIND })?;
        device.p_mw = p_mw;
        device.q_mvar = q_mvar;
        Ok(())
    }

    pub fn set_load_power(
        &mut self,
        id: LoadId,
        p_mw: f64,
        q_mvar: f64,
    ) -> Result<(), TopologyError> {
        let entity = self.ensure(id)?;
        let (p_mw, q_mvar) = (finite("p_mw", p_mw)?, finite("q_mvar", q_mvar)?);
        let mut entity = self
            .get_entity_mut(entity)
            .map_err(|_| TopologyError::UnknownElement { kind: LoadId::KIND })?;
        entity.insert((TargetPMW(p_mw), TargetQMVar(q_mvar)));
        Ok(())
    }

    pub fn set_switch_state(&mut self, id: SwitchId, closed: bool) -> Result<(), TopologyError> {
        let entity = self.ensure(id)?;
        let mut state = self
            .get_mut::<SwitchState>(entity)
            .ok_or(TopologyError::UnknownElement { kind: SwitchId::KIND })?;
        state.0 = closed;
        Ok(())
    }

    /// Takes an element in or out of service.
    pub fn set_in_service<I: ElementId>(
        &mut self,
        id: I,
        in_service: bool,
    ) -> Result<(), TopologyError> {
        let entity = self.ensure(id)?;
        let mut entity = self
            .get_entity_mut(entity)
            .map_err(|_| TopologyError::UnknownElement { kind: I::KIND })?;
        if in_service {
            entity.remove::<OutOfService>();
        } else {
            entity.insert(OutOfService);
        }
        Ok(())
    }
}
