use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

use smoldyn_msd::constants::DEFAULT_TIMELAGS;
use smoldyn_msd::trajectories::{Trajectory, TrajectorySet};
use smoldyn_msd::workflows::{
    estimate_time_diffusion_coefficient_from_set, estimate_timelag_diffusion_coefficient_from_set,
};

/// Seeded 2D Brownian motion, D = 0.5, unit time step.
fn make_set(n_particles: usize, n_steps: usize) -> TrajectorySet {
    let mut rng = StdRng::seed_from_u64(0xDEADBEEF);
    let step = Normal::new(0.0, 1.0).unwrap();

    (0..n_particles)
        .map(|serial| {
            let mut x = Vec::with_capacity(n_steps);
            let mut y = Vec::with_capacity(n_steps);
            let (mut px, mut py) = (0.0, 0.0);
            for _ in 0..n_steps {
                x.push(px);
                y.push(py);
                px += rng.sample(step);
                py += rng.sample(step);
            }
            let t = (0..n_steps).map(|i| i as f64).collect();
            Trajectory::new(serial as u32, t, x, y, vec![1; n_steps]).unwrap()
        })
        .collect()
}

fn bench_timelag(c: &mut Criterion) {
    let set = make_set(1_000, 200);
    c.bench_function("workflows/timelag_1000x200", |b| {
        b.iter(|| {
            let out = estimate_timelag_diffusion_coefficient_from_set(
                black_box(&set),
                black_box(&DEFAULT_TIMELAGS),
            )
            .unwrap();
            black_box(out);
        })
    });
}

fn bench_time(c: &mut Criterion) {
    let set = make_set(1_000, 200);
    c.bench_function("workflows/time_1000x200", |b| {
        b.iter(|| {
            let out = estimate_time_diffusion_coefficient_from_set(black_box(&set)).unwrap();
            black_box(out);
        })
    });
}

criterion_group!(benches, bench_timelag, bench_time);
criterion_main!(benches);
