#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

use smoldyn_msd::trajectories::{Trajectory, TrajectorySet};

/// Raw Smoldyn log with two particles (serials 100 and 99) over two timepoints.
pub const SAMPLE_LOG: &str = "1,1,0,12.7828,2.06726,100\n\
                              1,1,0,1.01686,8.12141,99\n\
                              2,1,0,12.8000,2.10000,100\n\
                              2,1,0,1.02000,8.13000,99\n";

/// Trajectory whose lagged MSD is exactly `2·lag` for lags 1, 2 and 3.
pub fn tau_trajectory(serial: u32) -> Trajectory {
    let s = 2.0_f64.sqrt();
    Trajectory::new(
        serial,
        vec![0.0, 1.0, 2.0, 3.0],
        vec![0.0, s, s + 1.0, s + 1.0],
        vec![0.0, 0.0, -1.0, s - 1.0],
        vec![1; 4],
    )
    .unwrap()
}

/// Trajectory whose squared displacement from the origin is `[0, 2, 4, 6]`.
pub fn time_trajectory(serial: u32) -> Trajectory {
    let (s2, s3) = (2.0_f64.sqrt(), 3.0_f64.sqrt());
    Trajectory::new(
        serial,
        vec![0.0, 1.0, 2.0, 3.0],
        vec![0.0, 1.0, s2, s3],
        vec![0.0, -1.0, -s2, -s3],
        vec![1; 4],
    )
    .unwrap()
}

/// Free 2D Brownian motion started at the origin, sampled every `dt`.
///
/// Serials are `0..n_particles`; each step is drawn from `N(0, 2·d·dt)` on both axes.
pub fn brownian_set(
    seed: u64,
    n_particles: usize,
    n_steps: usize,
    d: f64,
    dt: f64,
) -> TrajectorySet {
    let mut rng = StdRng::seed_from_u64(seed);
    let step = Normal::new(0.0, (2.0 * d * dt).sqrt()).unwrap();

    (0..n_particles)
        .map(|serial| {
            let t: Vec<f64> = (0..n_steps).map(|i| i as f64 * dt).collect();
            let mut x = vec![0.0; n_steps];
            let mut y = vec![0.0; n_steps];
            for i in 1..n_steps {
                x[i] = x[i - 1] + rng.sample(step);
                y[i] = y[i - 1] + rng.sample(step);
            }
            Trajectory::new(serial as u32, t, x, y, vec![1; n_steps]).unwrap()
        })
        .collect()
}

/// Mean of the values of an estimate map.
pub fn mean<'a>(values: impl IntoIterator<Item = &'a f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    sum / n as f64
}
