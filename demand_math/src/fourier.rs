//! Fourier basis for periodic seasonality

use std::f64::consts::PI;

/// Fourier terms `[sin(2 pi k t / P), cos(2 pi k t / P)]` for `k = 1..=order`
///
/// `t_days` is measured in days from any fixed origin.
pub fn fourier_terms(t_days: f64, period: f64, order: usize) -> Vec<f64> {
    let mut terms = Vec::with_capacity(2 * order);
    for k in 1..=order {
        let angle = 2.0 * PI * k as f64 * t_days / period;
        terms.push(angle.sin());
        terms.push(angle.cos());
    }
    terms
}
