use bevy_ecs::{name::Name, prelude::*};
use num_complex::Complex64;

use super::std_types::LineType;

#[derive(Component, Debug, Clone, Copy)]
pub struct FromBus(pub i64);

#[derive(Component, Debug, Clone, Copy)]
pub struct ToBus(pub i64);

/// Marker component for a line element in the power system.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Line;

#[derive(Component, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LineParams {
    pub r_ohm_per_km: f64,
    pub x_ohm_per_km: f64,
    pub g_us_per_km: f64,
    pub c_nf_per_km: f64,
    pub max_i_ka: f64,
    pub length_km: f64,
    pub parallel: u32,
}

impl LineParams {
    pub fn from_std_type(std: &LineType, length_km: f64) -> Self {
        Self {
            r_ohm_per_km: std.r_ohm_per_km,
            x_ohm_per_km: std.x_ohm_per_km,
            g_us_per_km: 0.0,
            c_nf_per_km: std.c_nf_per_km,
            max_i_ka: std.max_i_ka,
            length_km,
            parallel: 1,
        }
    }

    /// Series admittance in siemens.
    pub fn series_admittance(&self) -> Complex64 {
        let z = Complex64::new(self.r_ohm_per_km, self.x_ohm_per_km) * self.length_km;
        self.parallel as f64 / z
    }

    /// Total shunt admittance in siemens, half of it sits at each end.
    pub fn shunt_admittance(&self, wbase: f64) -> Complex64 {
        Complex64::new(
            self.g_us_per_km * 1e-6,
            wbase * self.c_nf_per_km * 1e-9,
        ) * self.length_km
            * self.parallel as f64
    }
}

/// Standard type name the parameters were taken from.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct StandardModelType(pub String);

#[derive(Bundle)]
pub struct LineBundle {
    pub marker: Line,
    pub name: Name,
    pub from: FromBus,
    pub to: ToBus,
    pub params: LineParams,
}
