//! # MSD workflows over trajectories and sets
//!
//! Orchestrate the [`metrics`](crate::metrics) primitives into per-particle diffusion
//! coefficients, following two methodologies.
//!
//! Time-lag methodology
//! -----------------
//! For each lag `τ`, displacements `r(t + τ) - r(t)` are averaged over the whole
//! trajectory, giving one MSD value per lag. The MSD-vs-lag curve is then fitted with
//! `MSD = 4·D·τ`, so `D` is expressed per sampling step.
//!
//! * [`estimate_timelag_msd_from_trajectory`]
//! * [`estimate_timelag_diffusion_coefficient_from_set`]
//!
//! Absolute-time methodology
//! -----------------
//! The squared displacement from the first sample, `|r(t) - r(t₀)|²`, is taken at every
//! timepoint and the curve is fitted against the trajectory's own `t` column.
//!
//! * [`estimate_time_msd_from_trajectory`]
//! * [`estimate_time_diffusion_coefficient_from_set`]
//!
//! Keying
//! -----------------
//! Set-level results are an insertion-ordered [`DiffusionEstimates`] map in set order. The
//! key is [`ParticleKey::Serial`] when every serial number in the set is distinct and
//! [`ParticleKey::Index`] (position in the set) otherwise. The choice is made once per call,
//! so a single result never mixes both kinds.
//!
//! Any per-trajectory error aborts the whole call; non-fatal diagnostics of every fit are
//! returned in set order.
//!
//! With the `parallel` feature the per-trajectory work runs on the `rayon` thread pool; the
//! result is identical to the sequential one.
use std::fmt;

use ahash::RandomState;
use indexmap::IndexMap;

use crate::{
    constants::Serial,
    diagnostics::{Diagnosed, DiagnosticSink},
    metrics::{
        combined_msd, diffusion_fit::estimate_diffusion_coefficient,
        squared_displacement_from_origin, xy_displacement, xy_mean_squared_displacement,
    },
    smoldyn_errors::SmoldynError,
    trajectories::{Trajectory, TrajectorySet},
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Identity of a particle in set-level results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParticleKey {
    /// Serial number, used when serials are unique across the set.
    Serial(Serial),
    /// Position in the set, used when serials are duplicated.
    Index(usize),
}

impl ParticleKey {
    /// `"serial"` or `"index"`.
    pub fn kind(&self) -> &'static str {
        match self {
            ParticleKey::Serial(_) => "serial",
            ParticleKey::Index(_) => "index",
        }
    }

    /// Numeric value of the key, whatever its kind.
    pub fn value(&self) -> u64 {
        match self {
            ParticleKey::Serial(s) => u64::from(*s),
            ParticleKey::Index(i) => *i as u64,
        }
    }
}

impl fmt::Display for ParticleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticleKey::Serial(s) => write!(f, "serial {s}"),
            ParticleKey::Index(i) => write!(f, "index {i}"),
        }
    }
}

/// Diffusion coefficient per particle, in set order.
pub type DiffusionEstimates = IndexMap<ParticleKey, f64, RandomState>;

/// MSD per time lag, in the order the lags were requested.
pub type TimelagMsd = IndexMap<usize, f64, RandomState>;

/// MSD of one trajectory at each requested lag.
///
/// Arguments
/// -----------------
/// * `trajectory` – the particle track.
/// * `lags` – lags in samples; a repeated lag keeps its first position.
///
/// Return
/// ----------
/// * `lag → x-MSD + y-MSD`.
/// * [`SmoldynError::LagTooLarge`] if a lag exceeds `len - 1`,
///   [`SmoldynError::InvalidParameter`] for a zero lag.
pub fn estimate_timelag_msd_from_trajectory(
    trajectory: &Trajectory,
    lags: &[usize],
) -> Result<TimelagMsd, SmoldynError> {
    let mut msd = TimelagMsd::with_capacity_and_hasher(lags.len(), RandomState::default());
    for &lag in lags {
        let (dx, dy) = xy_displacement(trajectory, lag)?;
        msd.insert(lag, combined_msd(xy_mean_squared_displacement((&dx, &dy))));
    }
    Ok(msd)
}

/// Time-lag diffusion coefficient of every trajectory in `set`.
///
/// Each particle's MSD-vs-lag curve (see [`estimate_timelag_msd_from_trajectory`]) is fitted
/// with `MSD = 4·D·τ`. Use [`DEFAULT_TIMELAGS`](crate::constants::DEFAULT_TIMELAGS) for the
/// usual `1..=4`.
///
/// Return
/// ----------
/// * One `D` per trajectory, keyed as described in the module docs, with fit diagnostics.
/// * The first per-trajectory error otherwise.
pub fn estimate_timelag_diffusion_coefficient_from_set(
    set: &TrajectorySet,
    lags: &[usize],
) -> Result<Diagnosed<DiffusionEstimates>, SmoldynError> {
    estimate_for_each(set, |trajectory| {
        let msd = estimate_timelag_msd_from_trajectory(trajectory, lags)?;
        let taus: Vec<f64> = msd.keys().map(|&lag| lag as f64).collect();
        let values: Vec<f64> = msd.values().copied().collect();
        estimate_diffusion_coefficient(&values, &taus, false)
    })
}

/// Squared displacement from the first sample, summed over both axes, at every timepoint.
pub fn estimate_time_msd_from_trajectory(trajectory: &Trajectory) -> Vec<f64> {
    let x = squared_displacement_from_origin(trajectory.x());
    let y = squared_displacement_from_origin(trajectory.y());
    x.iter().zip(&y).map(|(&x, &y)| combined_msd((x, y))).collect()
}

/// Absolute-time diffusion coefficient of every trajectory in `set`.
///
/// Each particle's curve from [`estimate_time_msd_from_trajectory`] is fitted against its
/// own `t` column with `MSD = 4·D·t`.
pub fn estimate_time_diffusion_coefficient_from_set(
    set: &TrajectorySet,
) -> Result<Diagnosed<DiffusionEstimates>, SmoldynError> {
    estimate_for_each(set, |trajectory| {
        let msd = estimate_time_msd_from_trajectory(trajectory);
        estimate_diffusion_coefficient(&msd, trajectory.t(), false)
    })
}

/// Key every per-trajectory estimate and merge diagnostics, in set order.
fn estimate_for_each<F>(
    set: &TrajectorySet,
    estimate: F,
) -> Result<Diagnosed<DiffusionEstimates>, SmoldynError>
where
    F: Fn(&Trajectory) -> Result<Diagnosed<f64>, SmoldynError> + Send + Sync,
{
    let by_index = !set.has_unique_serials();
    if by_index {
        tracing::debug!(
            n_trajectories = set.len(),
            "duplicate serial numbers, keying estimates by position"
        );
    }

    let outcomes = run_per_trajectory(set, estimate)?;

    let mut sink = DiagnosticSink::new();
    let mut estimates =
        DiffusionEstimates::with_capacity_and_hasher(set.len(), RandomState::default());
    for (index, (trajectory, outcome)) in set.iter().zip(outcomes).enumerate() {
        let key = if by_index {
            ParticleKey::Index(index)
        } else {
            ParticleKey::Serial(trajectory.serial_number())
        };
        estimates.insert(key, sink.unwrap_diagnosed(outcome));
    }

    Ok(sink.finish(estimates))
}

#[cfg(feature = "parallel")]
fn run_per_trajectory<F>(
    set: &TrajectorySet,
    estimate: F,
) -> Result<Vec<Diagnosed<f64>>, SmoldynError>
where
    F: Fn(&Trajectory) -> Result<Diagnosed<f64>, SmoldynError> + Send + Sync,
{
    // Indexed collect keeps set order.
    set.as_slice().par_iter().map(estimate).collect()
}

#[cfg(not(feature = "parallel"))]
fn run_per_trajectory<F>(
    set: &TrajectorySet,
    estimate: F,
) -> Result<Vec<Diagnosed<f64>>, SmoldynError>
where
    F: Fn(&Trajectory) -> Result<Diagnosed<f64>, SmoldynError> + Send + Sync,
{
    set.iter().map(estimate).collect()
}

#[cfg(test)]
mod workflows_test {
    use super::*;
    use crate::constants::DEFAULT_TIMELAGS;
    use approx::assert_relative_eq;

    fn straight_line(serial: Serial) -> Trajectory {
        Trajectory::new(
            serial,
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
            vec![1; 5],
        )
        .unwrap()
    }

    #[test]
    fn test_timelag_msd_keeps_lag_order() {
        let msd = estimate_timelag_msd_from_trajectory(&straight_line(1), &[3, 1, 2]).unwrap();
        let lags: Vec<usize> = msd.keys().copied().collect();
        assert_eq!(lags, vec![3, 1, 2]);
        assert_relative_eq!(msd[&3], 9.0);
        assert_relative_eq!(msd[&1], 1.0);
    }

    #[test]
    fn test_timelag_msd_lag_too_large() {
        let err = estimate_timelag_msd_from_trajectory(&straight_line(1), &[1, 5]).unwrap_err();
        assert_eq!(err, SmoldynError::LagTooLarge { lag: 5, len: 5 });
    }

    #[test]
    fn test_error_aborts_the_set() {
        let short = Trajectory::new(9, vec![0.0, 1.0], vec![0.0; 2], vec![0.0; 2], vec![1; 2])
            .unwrap();
        let set = TrajectorySet::new(vec![straight_line(1), short]);
        let err = estimate_timelag_diffusion_coefficient_from_set(&set, &DEFAULT_TIMELAGS)
            .unwrap_err();
        assert_eq!(err, SmoldynError::LagTooLarge { lag: 2, len: 2 });
    }

    #[test]
    fn test_empty_set() {
        let out = estimate_time_diffusion_coefficient_from_set(&TrajectorySet::default()).unwrap();
        assert!(out.value().is_empty());
        assert!(!out.has_diagnostics());
    }

    #[test]
    fn test_time_msd() {
        let msd = estimate_time_msd_from_trajectory(&straight_line(1));
        assert_eq!(msd, vec![0.0, 1.0, 4.0, 9.0, 16.0]);
    }

    #[test]
    fn test_particle_key() {
        assert_eq!(ParticleKey::Serial(4).kind(), "serial");
        assert_eq!(ParticleKey::Index(2).value(), 2);
        assert_eq!(ParticleKey::Serial(99).to_string(), "serial 99");
        assert_ne!(ParticleKey::Serial(1), ParticleKey::Index(1));
    }
}
