//! # Analytic Brownian-motion references
//!
//! Closed-form expressions used to validate simulated trajectories and as the models of
//! the diffusion fit ([`crate::metrics::diffusion_fit::MsdModel`]).
//!
//! For a free particle in one dimension with diffusion coefficient `D`, the displacement
//! after a time `t` is normally distributed with zero mean and variance `2·D·t`. In two
//! dimensions the mean squared displacement is `4·D·t`.
use std::f64::consts::PI;

use crate::{constants::MSD_PREFACTOR_2D, smoldyn_errors::SmoldynError};

/// Normal probability density `N(mu, sigma²)` evaluated at `x`.
///
/// Return
/// ----------
/// * The density value.
/// * [`SmoldynError::InvalidParameter`] if `sigma` is not strictly positive.
pub fn gauss_probability_density(x: f64, mu: f64, sigma: f64) -> Result<f64, SmoldynError> {
    if sigma.is_nan() || sigma <= 0.0 {
        return Err(SmoldynError::InvalidParameter(format!(
            "sigma must be > 0, got {sigma}"
        )));
    }
    let norm = 1.0 / ((2.0 * PI).sqrt() * sigma);
    Ok(norm * (-(x - mu).powi(2) / (2.0 * sigma * sigma)).exp())
}

/// One-dimensional displacement density of Brownian motion after time `t`.
///
/// Arguments
/// -----------------
/// * `x` – displacement.
/// * `d` – diffusion coefficient, `> 0`.
/// * `t` – elapsed time, `≥ 0`.
///
/// Return
/// ----------
/// * `N(0, 2·d·t)` evaluated at `x`.
/// * [`SmoldynError::InvalidParameter`] for `d ≤ 0` or `t < 0`. `t == 0` is a point mass
///   and fails through the zero standard deviation.
pub fn theoretical_brownian_motion_pdf(x: f64, d: f64, t: f64) -> Result<f64, SmoldynError> {
    if d.is_nan() || d <= 0.0 {
        return Err(SmoldynError::InvalidParameter(format!(
            "D must be > 0, got {d}"
        )));
    }
    if t.is_nan() || t < 0.0 {
        return Err(SmoldynError::InvalidParameter(format!(
            "t must be >= 0, got {t}"
        )));
    }
    gauss_probability_density(x, 0.0, (2.0 * d * t).sqrt())
}

/// 2D mean squared displacement `4·d·t`.
#[inline]
pub fn theoretical_msd(t: f64, d: f64) -> f64 {
    MSD_PREFACTOR_2D * d * t
}

/// 2D mean squared displacement with a constant offset, `4·d·t + epsilon`.
///
/// The offset absorbs localisation noise and other time-independent contributions.
#[inline]
pub fn theoretical_msd_with_offset(t: f64, d: f64, epsilon: f64) -> f64 {
    theoretical_msd(t, d) + epsilon
}
