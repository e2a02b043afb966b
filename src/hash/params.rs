//! Banding parameter selection.
//!
//! A forest with L bands of K values reports a pair with true Jaccard
//! similarity `j` as a candidate when at least one band agrees fully:
//!
//! ```text
//! P_match(j) = 1 - (1 - j^K)^L
//! ```
//!
//! For a threshold `t`, the false-positive mass is the area under `P_match`
//! on `[0, t]` and the false-negative mass is the area under `1 - P_match`
//! on `[t, 1]`. [`optimal_kl`] tries every `(K, L)` with `K * L <= num_hash`
//! and keeps the pair with the smallest sum.
//!
//! Integration is a fixed-step midpoint rule. The default step of 0.01 makes
//! a 256-value search take a few milliseconds; it only runs at construction.

use crate::error::{LshError, Result};

/// Default quadrature step.
pub const DEFAULT_INTEGRATION_PRECISION: f64 = 0.01;

/// Chosen banding and its estimated error mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandingParams {
    /// Hash values per band.
    pub k: usize,
    /// Number of bands.
    pub l: usize,
    /// Integrated false-positive probability below the threshold.
    pub false_positive: f64,
    /// Integrated false-negative probability above the threshold.
    pub false_negative: f64,
}

impl BandingParams {
    /// Combined error minimized by the search.
    pub fn error(&self) -> f64 {
        self.false_positive + self.false_negative
    }

    /// Signature length consumed by this banding (`K * L`).
    pub fn signature_len(&self) -> usize {
        self.k * self.l
    }
}

/// Probability that a pair with similarity `j` collides in at least one band.
pub fn match_probability(j: f64, k: usize, l: usize) -> f64 {
    1.0 - (1.0 - j.powi(k as i32)).powi(l as i32)
}

/// Midpoint-rule integral of `f` over `[a, b)` with step `precision`.
fn integral(f: impl Fn(f64) -> f64, a: f64, b: f64, precision: f64) -> f64 {
    let mut area = 0.0;
    let mut x = a;
    while x < b {
        area += f(x + 0.5 * precision) * precision;
        x += precision;
    }
    area
}

/// Cumulative false-positive probability for threshold `t`.
pub fn false_positive_probability(k: usize, l: usize, t: f64, precision: f64) -> f64 {
    integral(|j| match_probability(j, k, l), 0.0, t, precision)
}

/// Cumulative false-negative probability for threshold `t`.
pub fn false_negative_probability(k: usize, l: usize, t: f64, precision: f64) -> f64 {
    integral(|j| 1.0 - match_probability(j, k, l), t, 1.0, precision)
}

/// Pick K and L for `num_hash` values and Jaccard threshold `threshold`,
/// using the default integration step.
pub fn optimal_kl(num_hash: usize, threshold: f64) -> Result<BandingParams> {
    optimal_kl_with_precision(num_hash, threshold, DEFAULT_INTEGRATION_PRECISION)
}

/// Same as [`optimal_kl`] with an explicit quadrature step.
///
/// Bands are enumerated with L in the outer loop and K in the inner loop; a
/// pair only replaces the incumbent on strictly smaller error, so the first
/// minimum found wins ties.
pub fn optimal_kl_with_precision(
    num_hash: usize,
    threshold: f64,
    precision: f64,
) -> Result<BandingParams> {
    if num_hash == 0 {
        return Err(LshError::InvalidParameter(
            "num_hash must be at least 1".to_string(),
        ));
    }
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(LshError::InvalidParameter(format!(
            "threshold must be in [0, 1], got {threshold}"
        )));
    }
    if !precision.is_finite() || precision <= 0.0 {
        return Err(LshError::InvalidParameter(format!(
            "integration precision must be positive, got {precision}"
        )));
    }

    let mut best: Option<BandingParams> = None;
    let mut min_error = f64::MAX;

    for l in 1..=num_hash {
        for k in 1..=num_hash {
            if k * l > num_hash {
                break;
            }
            let fp = false_positive_probability(k, l, threshold, precision);
            let fn_ = false_negative_probability(k, l, threshold, precision);
            let err = fp + fn_;
            if err < min_error {
                min_error = err;
                best = Some(BandingParams {
                    k,
                    l,
                    false_positive: fp,
                    false_negative: fn_,
                });
            }
        }
    }

    // (1, 1) is always evaluated and has finite error.
    best.ok_or_else(|| {
        LshError::InvalidParameter(format!(
            "no banding found for num_hash={num_hash}, threshold={threshold}"
        ))
    })
}
