use bevy_ecs::{name::Name, prelude::*};
use num_complex::Complex64;

use super::{
    line::{FromBus, ToBus},
    std_types::TrafoType,
};

/// Marker component for a transformer element in the power system.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Transformer;

/// Two-winding transformer data. `FromBus` is the high-voltage side.
#[derive(Component, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransformerDevice {
    pub sn_mva: f64,
    pub vn_hv_kv: f64,
    pub vn_lv_kv: f64,
    pub vk_percent: f64,
    pub vkr_percent: f64,
    pub pfe_kw: f64,
    pub i0_percent: f64,
    pub shift_degree: f64,
    pub parallel: u32,
}

impl From<&TrafoType> for TransformerDevice {
    fn from(t: &TrafoType) -> Self {
        Self {
            sn_mva: t.sn_mva,
            vn_hv_kv: t.vn_hv_kv,
            vn_lv_kv: t.vn_lv_kv,
            vk_percent: t.vk_percent,
            vkr_percent: t.vkr_percent,
            pfe_kw: t.pfe_kw,
            i0_percent: t.i0_percent,
            shift_degree: t.shift_degree,
            parallel: 1,
        }
    }
}

impl TransformerDevice {
    fn z_base_lv(&self) -> f64 {
        self.vn_lv_kv * self.vn_lv_kv / self.sn_mva
    }

    /// Short-circuit admittance in siemens, referred to the low-voltage side.
    pub fn series_admittance(&self) -> Complex64 {
        let vk = self.vk_percent * 0.01;
        let vkr = self.vkr_percent * 0.01;
        let z = Complex64::new(vkr, (vk * vk - vkr * vkr).sqrt()) * self.z_base_lv();
        self.parallel as f64 / z
    }

    /// Magnetizing admittance in siemens, referred to the low-voltage side.
    pub fn magnetizing_admittance(&self) -> Complex64 {
        let ym = self.i0_percent * 0.01;
        let gm = self.pfe_kw / (1000.0 * self.sn_mva);
        let bm = (ym * ym - gm * gm).max(0.0).sqrt();
        Complex64::new(gm, -bm) / self.z_base_lv() * self.parallel as f64
    }

    /// Complex off-nominal ratio `N = t e^{j shift}` against the nominal
    /// voltages of the connected buses.
    pub fn ratio(&self, vn_hv_bus: f64, vn_lv_bus: f64) -> Complex64 {
        let t = (self.vn_hv_kv / vn_hv_bus) / (self.vn_lv_kv / vn_lv_bus);
        Complex64::from_polar(t, self.shift_degree.to_radians())
    }
}

#[derive(Bundle)]
pub struct TransformerBundle {
    pub marker: Transformer,
    pub name: Name,
    pub device: TransformerDevice,
    pub from_bus: FromBus, // hv_bus
    pub to_bus: ToBus,     // lv_bus
}
