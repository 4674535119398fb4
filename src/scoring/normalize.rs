//! Min-max normalization into the score range

/// Lowest possible score
pub const SCORE_MIN: f64 = 0.0;

/// Highest possible score
pub const SCORE_MAX: f64 = 1000.0;

/// Linearly rescale `values` so the minimum maps to 0 and the maximum to 1000
///
/// When every value is equal (including a single-element input) there is no
/// range to scale over and each output is `degenerate` instead.
pub fn min_max_scale(values: &[f64], degenerate: f64) -> Vec<f64> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        let fallback = degenerate.clamp(SCORE_MIN, SCORE_MAX);
        return vec![fallback; values.len()];
    }

    values
        .iter()
        .map(|v| ((v - min) / range * SCORE_MAX).clamp(SCORE_MIN, SCORE_MAX))
        .collect()
}
