use std::fmt;
use tabled::Tabled;

/// A wrapper around a float that limits the number of decimal places when printed.
#[derive(Clone, Copy, PartialEq, PartialOrd)]
pub(crate) struct FloatWrapper {
    pub(crate) value: f64,
    pub(crate) precision: usize, // Number of decimal places to display
}

impl FloatWrapper {
    pub fn new(value: f64, precision: usize) -> Self {
        FloatWrapper { value, precision }
    }
}

impl fmt::Display for FloatWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1$}", self.value, self.precision)
    }
}

impl fmt::Debug for FloatWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1$}", self.value, self.precision)
    }
}

/// Table row for display Bus results.
#[derive(Debug, Tabled)]
#[allow(non_snake_case)]
pub(crate) struct BusResTable {
    pub(crate) Bus: usize,
    pub(crate) Name: String,
    pub(crate) Vm: FloatWrapper,
    pub(crate) Va: FloatWrapper,
    pub(crate) P_mw: FloatWrapper,
    pub(crate) Q_mvar: FloatWrapper,
}

/// Table row for loads, static generators and external grids.
#[derive(Debug, Tabled)]
#[allow(non_snake_case)]
pub(crate) struct PowerResTable {
    pub(crate) Index: usize,
    pub(crate) Name: String,
    pub(crate) P_mw: FloatWrapper,
    pub(crate) Q_mvar: FloatWrapper,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_is_fixed() {
        assert_eq!(FloatWrapper::new(1.0 / 3.0, 3).to_string(), "0.333");
        assert_eq!(format!("{:?}", FloatWrapper::new(2.0, 1)), "2.0");
        assert_eq!(FloatWrapper::new(f64::NAN, 2).to_string(), "NaN");
    }
}
