//! Time-ordered active power set-points.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::TimeSeriesError;

/// Sequence of `(timestamp, p_mw)` pairs in non-decreasing time order.
///
/// Equal consecutive timestamps are allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct TimeSeries {
    t: Vec<NaiveDateTime>,
    p_mw: Vec<f64>,
}

#[derive(Deserialize)]
struct RawSeries {
    t: Vec<NaiveDateTime>,
    p_mw: Vec<f64>,
}

impl TryFrom<RawSeries> for TimeSeries {
    type Error = TimeSeriesError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        TimeSeries::new(raw.t, raw.p_mw)
    }
}

impl TimeSeries {
    /// Rows are numbered from 1 in the errors.
    pub fn new(t: Vec<NaiveDateTime>, p_mw: Vec<f64>) -> Result<Self, TimeSeriesError> {
        if t.len() != p_mw.len() {
            return Err(TimeSeriesError::LengthMismatch {
                times: t.len(),
                values: p_mw.len(),
            });
        }
        if let Some(idx) = t.windows(2).position(|w| w[1] < w[0]) {
            return Err(TimeSeriesError::OutOfOrder { row: idx + 2 });
        }
        if let Some(idx) = p_mw.iter().position(|p| !p.is_finite()) {
            return Err(TimeSeriesError::BadValue {
                row: idx + 1,
                value: p_mw[idx].to_string(),
            });
        }
        Ok(Self { t, p_mw })
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn times(&self) -> &[NaiveDateTime] {
        &self.t
    }

    pub fn values(&self) -> &[f64] {
        &self.p_mw
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (NaiveDateTime, f64)> + '_ {
        self.t.iter().copied().zip(self.p_mw.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn duplicates_are_tolerated() {
        let ts = TimeSeries::new(vec![at(0, 0), at(0, 0), at(0, 15)], vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(ts.len(), 3);
        assert_eq!(ts.iter().nth(1), Some((at(0, 0), 2.0)));
    }

    #[test]
    fn rejects_inconsistent_input() {
        assert!(matches!(
            TimeSeries::new(vec![at(0, 15), at(0, 0)], vec![1.0, 2.0]),
            Err(TimeSeriesError::OutOfOrder { row: 2 })
        ));
        assert!(matches!(
            TimeSeries::new(vec![at(0, 0)], vec![]),
            Err(TimeSeriesError::LengthMismatch { times: 1, values: 0 })
        ));
        assert!(matches!(
            TimeSeries::new(vec![at(0, 0)], vec![f64::NAN]),
            Err(TimeSeriesError::BadValue { row: 1, .. })
        ));
        assert!(TimeSeries::new(vec![], vec![]).unwrap().is_empty());
    }

    #[test]
    fn deserialization_is_validated() {
        let ok: TimeSeries = serde_json::from_str(
            r#"{"t": ["2021-06-01T00:00:00", "2021-06-01T00:15:00"], "p_mw": [0.0, 1.5]}"#,
        )
        .unwrap();
        assert_eq!(ok.values(), &[0.0, 1.5]);
        let bad: Result<TimeSeries, _> = serde_json::from_str(
            r#"{"t": ["2021-06-01T00:15:00", "2021-06-01T00:00:00"], "p_mw": [0.0, 1.5]}"#,
        );
        assert!(bad.is_err());
    }
}
