//! # Constants and type definitions for smoldyn-msd
//!
//! This module centralizes the **column layout** of Smoldyn position logs, the
//! **default tolerances and thresholds** used by the analysis, and the **type aliases**
//! shared across the crate.
//!
//! ## Overview
//!
//! - Identifier and sample types (serial numbers, species codes, times, positions)
//! - Column indices of a `listmols2`-style row
//! - Tolerances used by the approximate trajectory equality
//! - Defaults for the large-jump heuristic and the time-lag workflow

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Particle identifier as written by the simulator (not unique across a set)
pub type Serial = u32;

/// Integer-coded species of a particle
pub type SpeciesCode = u16;

/// Simulation time of a sample
pub type Time = f64;

/// Position along one axis
pub type Position = f64;

/// One indexed sample of a trajectory: `(serial, t, x, y, species)`
pub type Sample = (Serial, Time, Position, Position, SpeciesCode);

// -------------------------------------------------------------------------------------------------
// Input layout
// -------------------------------------------------------------------------------------------------

/// Default column delimiter of Smoldyn output files
pub const DEFAULT_DELIMITER: u8 = b',';

/// Minimum number of fields of one observation row
pub const MIN_FIELDS: usize = 6;

/// Column holding the simulation time
pub const COL_TIME: usize = 0;

/// Column holding the species code
pub const COL_SPECIES: usize = 1;

/// Column holding the x position (column 2 is unused)
pub const COL_X: usize = 3;

/// Column holding the y position
pub const COL_Y: usize = 4;

/// Column holding the particle serial number
pub const COL_SERIAL: usize = 5;

// -------------------------------------------------------------------------------------------------
// Tolerances and defaults
// -------------------------------------------------------------------------------------------------

/// Absolute tolerance of the approximate trajectory equality
pub const CLOSE_ABS_TOL: f64 = 1e-8;

/// Relative tolerance of the approximate trajectory equality
pub const CLOSE_REL_TOL: f64 = 1e-5;

/// Fraction of the largest absolute axis value above which a single step is
/// reported as a large jump
pub const DEFAULT_JUMP_FRACTION: f64 = 0.5;

/// Time lags used by the time-lag workflow when none are given
pub const DEFAULT_TIMELAGS: [usize; 4] = [1, 2, 3, 4];

/// Dimensional prefactor of the 2D MSD law `MSD = 4·D·t`
pub const MSD_PREFACTOR_2D: f64 = 4.0;
