//! Built-in standard types for cables and transformers.
//!
//! Parameter values follow the common pandapower library for the 20 kV
//! cables and 110/20 kV transformers used in medium-voltage studies.

use crate::error::TopologyError;

#[derive(Debug, Clone, PartialEq)]
pub struct LineType {
    pub name: &'static str,
    pub r_ohm_per_km: f64,
    pub x_ohm_per_km: f64,
    pub c_nf_per_km: f64,
    pub max_i_ka: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrafoType {
    pub name: &'static str,
    pub sn_mva: f64,
    pub vn_hv_kv: f64,
    pub vn_lv_kv: f64,
    pub vk_percent: f64,
    pub vkr_percent: f64,
    pub pfe_kw: f64,
    pub i0_percent: f64,
    pub shift_degree: f64,
}

pub const LINE_TYPES: &[LineType] = &[
    LineType {
        name: "NA2XS2Y 1x95 RM/25 12/20 kV",
        r_ohm_per_km: 0.313,
        x_ohm_per_km: 0.132,
        c_nf_per_km: 216.0,
        max_i_ka: 0.252,
    },
    LineType {
        name: "NA2XS2Y 1x150 RM/25 12/20 kV",
        r_ohm_per_km: 0.206,
        x_ohm_per_km: 0.116,
        c_nf_per_km: 250.0,
        max_i_ka: 0.319,
    },
    LineType {
        name: "NA2XS2Y 1x185 RM/25 12/20 kV",
        r_ohm_per_km: 0.161,
        x_ohm_per_km: 0.117,
        c_nf_per_km: 273.0,
        max_i_ka: 0.362,
    },
    LineType {
        name: "NA2XS2Y 1x240 RM/25 12/20 kV",
        r_ohm_per_km: 0.122,
        x_ohm_per_km: 0.112,
        c_nf_per_km: 304.0,
        max_i_ka: 0.421,
    },
];

pub const TRAFO_TYPES: &[TrafoType] = &[
    TrafoType {
        name: "25 MVA 110/20 kV",
        sn_mva: 25.0,
        vn_hv_kv: 110.0,
        vn_lv_kv: 20.0,
        vk_percent: 12.0,
        vkr_percent: 0.41,
        pfe_kw: 14.0,
        i0_percent: 0.07,
        shift_degree: 150.0,
    },
    TrafoType {
        name: "40 MVA 110/20 kV",
        sn_mva: 40.0,
        vn_hv_kv: 110.0,
        vn_lv_kv: 20.0,
        vk_percent: 16.2,
        vkr_percent: 0.34,
        pfe_kw: 18.0,
        i0_percent: 0.05,
        shift_degree: 150.0,
    },
    TrafoType {
        name: "63 MVA 110/20 kV",
        sn_mva: 63.0,
        vn_hv_kv: 110.0,
        vn_lv_kv: 20.0,
        vk_percent: 18.0,
        vkr_percent: 0.32,
        pfe_kw: 22.0,
        i0_percent: 0.04,
        shift_degree: 150.0,
    },
];

pub fn line_type(name: &str) -> Result<&'static LineType, TopologyError> {
    LINE_TYPES
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| TopologyError::UnknownStdType {
            kind: "line",
            name: name.to_owned(),
        })
}

pub fn trafo_type(name: &str) -> Result<&'static TrafoType, TopologyError> {
    TRAFO_TYPES
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| TopologyError::UnknownStdType {
            kind: "transformer",
            name: name.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(trafo_type("25 MVA 110/20 kV").unwrap().sn_mva, 25.0);
        assert_eq!(line_type("NA2XS2Y 1x240 RM/25 12/20 kV").unwrap().max_i_ka, 0.421);
        assert!(matches!(
            line_type("NAYY 4x50 SE"),
            Err(TopologyError::UnknownStdType { kind: "line", .. })
        ));
    }
}
