//! # Trajectories: storage and ingestion
//!
//! Facilities to **ingest** and **store** single-particle tracks produced by Smoldyn.
//! A [`Trajectory`] holds the time-ordered samples of one particle; a [`TrajectorySet`]
//! is an ordered collection of them, the unit consumed by the
//! [`workflows`](crate::workflows) module.
//!
//! Modules
//! -----------------
//! * [`trajectory`](crate::trajectories::trajectory) – The validated per-particle container,
//!   loose column inputs ([`Column`]), the serializable [`TrajectoryRecord`] view, periodic
//!   unwrapping and large-jump detection.
//! * [`trajectory_set`](crate::trajectories::trajectory_set) – Ordered collection with
//!   non-mutating concatenation (`+`).
//! * [`smoldyn_reader`](crate::trajectories::smoldyn_reader) – Fixed-grid reader for Smoldyn
//!   position logs ([`SmoldynParser`]).
//!
//! Data Model
//! -----------------
//! * **Trajectory:** `serial_number: u32` plus four equal-length columns `t`, `x`, `y`
//!   (`f64`) and `species` (`u16`).
//! * **Set:** `Vec<Trajectory>` in construction order. Duplicate serials are allowed; the
//!   workflows switch to positional keys when they occur.
//!
//! Example
//! -----------------
//! ```rust,no_run
//! use smoldyn_msd::trajectories::SmoldynParser;
//! use smoldyn_msd::workflows::estimate_time_diffusion_coefficient_from_set;
//!
//! # fn run() -> Result<(), smoldyn_msd::smoldyn_errors::SmoldynError> {
//! let set = SmoldynParser::builder("molecules.csv")
//!     .bounds(0.0, 12.8)
//!     .build()?
//!     .parse_fixed_grid()?
//!     .into_value();
//!
//! let estimates = estimate_time_diffusion_coefficient_from_set(&set)?.into_value();
//! for (key, d) in &estimates {
//!     println!("{key}: D = {d:.4}");
//! }
//! # Ok(()) }
//! ```
pub mod smoldyn_reader;
pub mod trajectory;
pub mod trajectory_set;

pub use smoldyn_reader::{FloatPrecision, SmoldynParser, SmoldynParserBuilder};
pub use trajectory::{all_close, Column, Trajectory, TrajectoryRecord};
pub use trajectory_set::TrajectorySet;
