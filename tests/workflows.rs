mod common;

use approx::assert_relative_eq;

use common::{tau_trajectory, time_trajectory};
use smoldyn_msd::trajectories::TrajectorySet;
use smoldyn_msd::workflows::{
    estimate_time_diffusion_coefficient_from_set, estimate_time_msd_from_trajectory,
    estimate_timelag_diffusion_coefficient_from_set, estimate_timelag_msd_from_trajectory,
    ParticleKey,
};

#[test]
fn test_timelag_msd_from_trajectory() {
    let msd = estimate_timelag_msd_from_trajectory(&tau_trajectory(1), &[1, 2, 3]).unwrap();
    assert_eq!(msd.len(), 3);
    for (lag, value) in &msd {
        assert_relative_eq!(*value, 2.0 * *lag as f64, epsilon = 1e-12);
    }
}

#[test]
fn test_timelag_diffusion_keyed_by_index() {
    let set = TrajectorySet::from(vec![tau_trajectory(1); 3]);
    let out = estimate_timelag_diffusion_coefficient_from_set(&set, &[1, 2, 3]).unwrap();
    assert!(!out.has_diagnostics());

    let estimates = out.into_value();
    let keys: Vec<ParticleKey> = estimates.keys().copied().collect();
    assert_eq!(
        keys,
        vec![
            ParticleKey::Index(0),
            ParticleKey::Index(1),
            ParticleKey::Index(2)
        ]
    );
    for d in estimates.values() {
        assert_relative_eq!(*d, 0.5, epsilon = 1e-6);
    }
}

#[test]
fn test_timelag_diffusion_keyed_by_serial() {
    let set: TrajectorySet = [1, 2, 3, 99].into_iter().map(tau_trajectory).collect();
    let estimates = estimate_timelag_diffusion_coefficient_from_set(&set, &[1, 2, 3])
        .unwrap()
        .into_value();
    let keys: Vec<ParticleKey> = estimates.keys().copied().collect();
    assert_eq!(
        keys,
        vec![
            ParticleKey::Serial(1),
            ParticleKey::Serial(2),
            ParticleKey::Serial(3),
            ParticleKey::Serial(99)
        ]
    );
    assert_relative_eq!(estimates[&ParticleKey::Serial(99)], 0.5, epsilon = 1e-6);
}

#[test]
fn test_time_msd_from_trajectory() {
    let msd = estimate_time_msd_from_trajectory(&time_trajectory(1));
    for (got, expected) in msd.iter().zip([0.0, 2.0, 4.0, 6.0]) {
        assert_relative_eq!(*got, expected, epsilon = 1e-12);
    }
}

#[test]
fn test_time_diffusion_keyed_by_index() {
    let set = TrajectorySet::from(vec![time_trajectory(7); 3]);
    let estimates = estimate_time_diffusion_coefficient_from_set(&set)
        .unwrap()
        .into_value();
    assert_eq!(estimates.len(), 3);
    for (index, (key, d)) in estimates.iter().enumerate() {
        assert_eq!(*key, ParticleKey::Index(index));
        assert_relative_eq!(*d, 0.5, epsilon = 1e-6);
    }
}

#[test]
fn test_time_diffusion_keyed_by_serial() {
    let set: TrajectorySet = [3, 1, 2, 99].into_iter().map(time_trajectory).collect();
    let estimates = estimate_time_diffusion_coefficient_from_set(&set)
        .unwrap()
        .into_value();
    let serials: Vec<u64> = estimates.keys().map(ParticleKey::value).collect();
    assert_eq!(serials, vec![3, 1, 2, 99]);
    assert!(estimates.keys().all(|k| k.kind() == "serial"));
    for d in estimates.values() {
        assert_relative_eq!(*d, 0.5, epsilon = 1e-6);
    }
}
