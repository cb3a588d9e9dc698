//! Mean-squared-displacement analysis of Smoldyn particle trajectories.
//!
//! Position logs are read into a [`trajectories::TrajectorySet`] (with periodic-boundary
//! unwrapping), reduced to MSD curves by the [`metrics`] primitives, and fitted into
//! per-particle diffusion coefficients by the [`workflows`].
pub mod constants;
pub mod diagnostics;
pub mod export;
pub mod metrics;
pub mod smoldyn_errors;
pub mod theory;
pub mod trajectories;
pub mod workflows;
