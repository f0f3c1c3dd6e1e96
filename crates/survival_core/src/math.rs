//! Numerical helpers shared across layers.
//!
//! - [`norm_cdf`]: standard normal CDF (Abramowitz and Stegun 7.1.26)
//! - [`percentile_index`]: `floor(N p)` order-statistic index
//! - [`safe_ratio`] / [`finite_or_zero`]: zero-division and NaN guards

/// Denominator floor used by every guarded ratio in the engine.
pub const EPSILON: f64 = 1e-9;

/// Complementary error function approximation using Horner's method.
///
/// Abramowitz and Stegun formula 7.1.26, maximum error 1.5e-7.
#[inline]
fn erfc_approx(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let abs_x = x.abs();
    let t = 1.0 / (1.0 + P * abs_x);
    let poly = A1 + t * (A2 + t * (A3 + t * (A4 + t * A5)));
    let erfc_abs = t * poly * (-abs_x * abs_x).exp();

    // erfc(-x) = 2 - erfc(x)
    if x < 0.0 {
        2.0 - erfc_abs
    } else {
        erfc_abs
    }
}

/// Standard normal cumulative distribution function.
///
/// Computes P(X <= x) for X ~ N(0, 1) as `0.5 * erfc(-x / sqrt(2))`.
/// The result is always in `[0, 1]`; NaN input yields 0.5.
///
/// # Examples
/// ```
/// use survival_core::math::norm_cdf;
///
/// assert!((norm_cdf(0.0) - 0.5).abs() < 1e-7);
/// assert!(norm_cdf(6.0) > 0.999_999);
/// ```
pub fn norm_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return 0.5;
    }
    (0.5 * erfc_approx(-x / std::f64::consts::SQRT_2)).clamp(0.0, 1.0)
}

/// Index of the `p` order statistic in a sorted sample of length `n`.
///
/// Returns `floor(n p)` clamped to `n - 1`. `n` must be non-zero.
#[inline]
pub fn percentile_index(n: usize, p: f64) -> usize {
    debug_assert!(n > 0);
    let idx = (n as f64 * p.clamp(0.0, 1.0)).floor() as usize;
    idx.min(n - 1)
}

/// `numerator / denominator`, or `fallback` when `|denominator| <= EPSILON`
/// or the quotient is not finite.
#[inline]
pub fn safe_ratio(numerator: f64, denominator: f64, fallback: f64) -> f64 {
    if denominator.abs() <= EPSILON {
        return fallback;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        fallback
    }
}

/// Replaces NaN and infinities with zero.
#[inline]
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Median of an unsorted sample; 0 for an empty sample.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted[percentile_index(sorted.len(), 0.5)]
}
