use std::f64;

/// Default acceptance threshold for a reconstructed cycle, in log space.
///
/// A cycle is reported only when `sum(-ln(rate_i)) < -DEFAULT_PROFIT_TOLERANCE`, i.e. when its rate
/// product exceeds `1 + ~1e-9`. Anything closer to break-even is treated as rounding noise.
pub const DEFAULT_PROFIT_TOLERANCE: f64 = 1e-9;

/// Minimum improvement for a relaxation to count.
///
/// Applied identically in the relaxation passes and the detection pass. Keeps exact reciprocal
/// pairs (`r` and `1/r`) from relaxing forever on the last bit of rounding.
pub const RELAXATION_EPSILON: f64 = 1e-12;

/// Returns true when `rate` can be used as an edge: finite and strictly positive.
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Converts a multiplicative rate into an additive edge weight, `w = -ln(rate)`.
///
/// Rates above 1.0 (profitable hops) become negative weights, so a cycle whose rate product
/// exceeds 1.0 becomes a negative-weight cycle.
pub fn log_weight(rate: f64) -> f64 {
    -rate.ln()
}

/// Inverse of [`log_weight`].
pub fn rate_from_weight(weight: f64) -> f64 {
    (-weight).exp()
}

/// Guarded relaxation test for the edge `from -> to`.
///
/// Returns the improved distance for `to` when the edge relaxes it by more than `eps`, and
/// `None` otherwise. An unreached `from` (distance `+inf`) never relaxes anything.
pub fn relax(dist_from: f64, weight: f64, dist_to: f64, eps: f64) -> Option<f64> {
    if !dist_from.is_finite() {
        return None;
    }

    let candidate = dist_from + weight;
    if candidate.is_finite() && candidate < dist_to - eps {
        Some(candidate)
    } else {
        None
    }
}
