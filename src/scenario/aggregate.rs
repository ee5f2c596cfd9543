//! Reduction of raw per-element result rows to per-step scalars.

use serde::{Deserialize, Serialize};

/// How undefined result entries enter a mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Undefined entries count as `0` and stay in the denominator.
    #[default]
    ZeroFill,
    /// Undefined entries are left out of the denominator.
    Exclude,
}

impl MissingValuePolicy {
    /// Mean of raw (unsanitized) values under this policy.
    pub fn mean(&self, raw: &[f64]) -> f64 {
        match self {
            MissingValuePolicy::ZeroFill => mean_over(&sanitize_all(raw)),
            MissingValuePolicy::Exclude => mean_over_present(raw),
        }
    }
}

/// Replaces an undefined (NaN or infinite) value by exactly `0`.
#[inline]
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

pub fn sanitize_all(values: &[f64]) -> Vec<f64> {
    values.iter().copied().map(sanitize).collect()
}

/// Arithmetic mean over the full list; `0` for an empty list.
pub fn mean_over(sanitized: &[f64]) -> f64 {
    if sanitized.is_empty() {
        return 0.0;
    }
    sanitized.iter().sum::<f64>() / sanitized.len() as f64
}

/// Value at `index`, `0` when the index is outside the list.
pub fn extract_single(sanitized: &[f64], index: usize) -> f64 {
    sanitized.get(index).copied().unwrap_or(0.0)
}

/// Mean over the defined entries only; `0` when none is defined.
pub fn mean_over_present(raw: &[f64]) -> f64 {
    let (sum, count) = raw
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}
