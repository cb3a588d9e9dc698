//! # Displacement and mean-squared-displacement metrics
//!
//! Pure numeric building blocks of the MSD analysis. Two families are provided:
//!
//! * **Lagged** displacements, `series[i + lag] - series[i]`, averaged into one MSD value
//!   per lag ([`displacement`], [`xy_displacement`], [`mean_squared_displacement`]).
//! * **From-origin** squared displacements, `(series[i] - series[0])²`, giving one value per
//!   timepoint ([`squared_displacement_from_origin`]).
//!
//! In two dimensions the axes are treated independently and their contributions are summed
//! ([`combined_msd`], [`combined_msd_series`]).
//!
//! The least-squares fit of `MSD = 4·D·t` lives in [`diffusion_fit`].
//!
//! ## Example
//! -----------------
//! ```rust
//! use smoldyn_msd::metrics::{combined_msd, displacement, mean_squared_displacement};
//!
//! let x = [0.0, 1.0, 2.0, 3.0];
//! let y = [0.0, -1.0, -2.0, -3.0];
//! let msd = combined_msd((
//!     mean_squared_displacement(&displacement(&x, 1).unwrap()),
//!     mean_squared_displacement(&displacement(&y, 1).unwrap()),
//! ));
//! assert_eq!(msd, 2.0);
//! ```
pub mod diffusion_fit;

use itertools::Itertools;

use crate::{smoldyn_errors::SmoldynError, trajectories::Trajectory};

/// Element-wise difference of `series` with itself shifted by `lag` samples.
///
/// Arguments
/// -----------------
/// * `series` – samples of one coordinate.
/// * `lag` – shift in samples, `1 ≤ lag ≤ series.len() - 1`.
///
/// Return
/// ----------
/// * `series[lag..] - series[..len - lag]`, of length `len - lag`.
/// * [`SmoldynError::InvalidParameter`] if `lag == 0`.
/// * [`SmoldynError::LagTooLarge`] if `lag > len - 1` (any lag on an empty series).
pub fn displacement(series: &[f64], lag: usize) -> Result<Vec<f64>, SmoldynError> {
    if lag == 0 {
        return Err(SmoldynError::InvalidParameter(
            "time lag must be at least 1".into(),
        ));
    }
    if lag >= series.len() {
        return Err(SmoldynError::LagTooLarge {
            lag,
            len: series.len(),
        });
    }

    Ok(series[lag..]
        .iter()
        .zip(series)
        .map(|(later, earlier)| later - earlier)
        .collect())
}

/// [`displacement`] applied to both axes of a trajectory.
pub fn xy_displacement(
    trajectory: &Trajectory,
    lag: usize,
) -> Result<(Vec<f64>, Vec<f64>), SmoldynError> {
    Ok((
        displacement(trajectory.x(), lag)?,
        displacement(trajectory.y(), lag)?,
    ))
}

/// Mean of the squared values. `NaN` for an empty slice.
pub fn mean_squared_displacement(displacements: &[f64]) -> f64 {
    if displacements.is_empty() {
        return f64::NAN;
    }
    displacements.iter().map(|d| d * d).sum::<f64>() / displacements.len() as f64
}

/// [`mean_squared_displacement`] of each axis, as an `(x, y)` pair.
pub fn xy_mean_squared_displacement((x, y): (&[f64], &[f64])) -> (f64, f64) {
    (mean_squared_displacement(x), mean_squared_displacement(y))
}

/// `(series[i] - series[0])²` for every sample; empty in, empty out.
pub fn squared_displacement_from_origin(series: &[f64]) -> Vec<f64> {
    let Some(&origin) = series.first() else {
        return Vec::new();
    };
    series
        .iter()
        .map(|value| (value - origin).powi(2))
        .collect()
}

/// 2D MSD from the per-axis contributions.
#[inline]
pub fn combined_msd((x_msd, y_msd): (f64, f64)) -> f64 {
    x_msd + y_msd
}

/// Element-wise [`combined_msd`] of two per-axis series.
///
/// Return
/// ----------
/// * The summed series.
/// * [`SmoldynError::ShapeMismatch`] if the axes have different lengths.
pub fn combined_msd_series((x_msd, y_msd): (&[f64], &[f64])) -> Result<Vec<f64>, SmoldynError> {
    if x_msd.len() != y_msd.len() {
        return Err(SmoldynError::ShapeMismatch(format!(
            "x contribution has {} values, y contribution has {}",
            x_msd.len(),
            y_msd.len()
        )));
    }
    Ok(x_msd
        .iter()
        .zip_eq(y_msd)
        .map(|(&x, &y)| combined_msd((x, y)))
        .collect())
}
