//! Piecewise-linear trend with changepoints
//!
//! The trend is `m + k * t + sum_j delta_j * max(0, t - s_j)` on a time axis
//! scaled so the training history spans `[0, 1]`.

/// Select changepoint locations from the scaled time axis
///
/// Changepoints are spread evenly over the first `range` share of the
/// history. When the history is too short for the requested count, the count
/// shrinks to one less than the number of eligible points.
pub fn changepoint_locations(t: &[f64], n_changepoints: usize, range: f64) -> Vec<f64> {
    let eligible = (t.len() as f64 * range).floor() as usize;
    let count = n_changepoints.min(eligible.saturating_sub(1));

    if count == 0 {
        return Vec::new();
    }

    let last = (eligible - 1) as f64;
    (1..=count)
        .map(|i| {
            let index = (i as f64 * last / count as f64).round() as usize;
            t[index]
        })
        .collect()
}

/// Design row `[1, t, max(0, t - s_1), ...]` for one time point
pub fn trend_row(t: f64, changepoints: &[f64]) -> Vec<f64> {
    let mut row = Vec::with_capacity(2 + changepoints.len());
    row.push(1.0);
    row.push(t);
    row.extend(changepoints.iter().map(|&s| (t - s).max(0.0)));
    row
}

/// Evaluate a fitted piecewise-linear trend
///
/// `coefficients` is laid out like [`trend_row`]: offset, base rate, then one
/// rate adjustment per changepoint.
pub fn piecewise_linear(t: f64, coefficients: &[f64], changepoints: &[f64]) -> f64 {
    crate::regression::dot(&trend_row(t, changepoints), coefficients)
}
