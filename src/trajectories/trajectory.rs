//! # Single-particle trajectory
//!
//! [`Trajectory`] is the immutable time series of one particle: sample times, `x`/`y`
//! positions and the integer-coded species at each sample, tagged with the particle
//! serial number reported by the simulator.
//!
//! ## Construction
//! -----------------
//! * [`Trajectory::new`] – strongly typed columns; only the column lengths can be wrong.
//! * [`Trajectory::from_columns`] – loosely typed [`Column`]s as they come out of a generic
//!   table (float, integer or nested). Checks are run in this order:
//!   1. all columns have the same length, else [`SmoldynError::ShapeMismatch`],
//!   2. no column is nested (2-D), else [`SmoldynError::ShapeMismatch`],
//!   3. species are integer-coded and fit a [`SpeciesCode`], else [`SmoldynError::TypeMismatch`].
//!
//! Large single-step jumps (see [`Trajectory::jump_diagnostics`]) never reject a trajectory.
//! They are logged with `tracing` on construction and can be retrieved explicitly.
//!
//! ## Equality
//! -----------------
//! Two trajectories are equal when their serial numbers match and all four columns are
//! element-wise close (absolute tolerance [`CLOSE_ABS_TOL`], relative tolerance
//! [`CLOSE_REL_TOL`]). A [`TrajectoryRecord`] compares the same way, which lets tests
//! state expected data literally.
//!
//! ## Periodic boundaries
//! -----------------
//! [`Trajectory::unwrap_periodic_boundaries`] removes wraparound at the edges of a
//! periodic domain `[min, max]` from one axis.
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        Position, Sample, Serial, SpeciesCode, Time, CLOSE_ABS_TOL, CLOSE_REL_TOL,
        DEFAULT_JUMP_FRACTION,
    },
    diagnostics::{Axis, Diagnostic},
    smoldyn_errors::SmoldynError,
};

/// One particle's time series.
///
/// Fields are private: once built, a trajectory cannot be modified.
#[derive(Debug, Clone)]
pub struct Trajectory {
    serial_number: Serial,
    t: Vec<Time>,
    x: Vec<Position>,
    y: Vec<Position>,
    species: Vec<SpeciesCode>,
}

/// Plain keyed representation of a trajectory, mainly used to state expected data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    pub serialnum: Serial,
    pub t: Vec<Time>,
    pub x: Vec<Position>,
    pub y: Vec<Position>,
    pub species: Vec<SpeciesCode>,
}

/// A loosely typed data column, as read from a generic table.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Float(Vec<f64>),
    Integer(Vec<i64>),
    /// A two-dimensional column (one row per sample).
    Nested(Vec<Vec<f64>>),
}

impl Column {
    /// Number of rows (outer length).
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Integer(v) => v.len(),
            Column::Nested(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_one_dimensional(&self, name: &str) -> Result<(), SmoldynError> {
        match self {
            Column::Nested(_) => Err(SmoldynError::ShapeMismatch(format!(
                "{name} must be a one-dimensional column"
            ))),
            _ => Ok(()),
        }
    }

    fn into_floats(self) -> Vec<f64> {
        match self {
            Column::Float(v) => v,
            Column::Integer(v) => v.into_iter().map(|i| i as f64).collect(),
            Column::Nested(v) => v.into_iter().flatten().collect(),
        }
    }

    fn into_species(self) -> Result<Vec<SpeciesCode>, SmoldynError> {
        match self {
            Column::Integer(v) => v
                .into_iter()
                .map(|code| {
                    SpeciesCode::try_from(code).map_err(|_| {
                        SmoldynError::TypeMismatch(format!(
                            "species code {code} does not fit an unsigned 16-bit integer"
                        ))
                    })
                })
                .collect(),
            _ => Err(SmoldynError::TypeMismatch(
                "species must be integer-coded".into(),
            )),
        }
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Column::Float(values)
    }
}

impl From<Vec<i64>> for Column {
    fn from(values: Vec<i64>) -> Self {
        Column::Integer(values)
    }
}

impl From<Vec<SpeciesCode>> for Column {
    fn from(values: Vec<SpeciesCode>) -> Self {
        Column::Integer(values.into_iter().map(i64::from).collect())
    }
}

impl From<Vec<Vec<f64>>> for Column {
    fn from(values: Vec<Vec<f64>>) -> Self {
        Column::Nested(values)
    }
}

impl Trajectory {
    /// Build a trajectory from typed columns.
    ///
    /// Large jumps are checked with [`DEFAULT_JUMP_FRACTION`] and logged as warnings.
    ///
    /// Arguments
    /// -----------------
    /// * `serial_number`: particle identifier.
    /// * `t`, `x`, `y`: sample times and positions.
    /// * `species`: species code of every sample.
    ///
    /// Return
    /// ----------
    /// * The trajectory, or [`SmoldynError::ShapeMismatch`] if the columns differ in length.
    pub fn new(
        serial_number: Serial,
        t: Vec<Time>,
        x: Vec<Position>,
        y: Vec<Position>,
        species: Vec<SpeciesCode>,
    ) -> Result<Self, SmoldynError> {
        let trajectory = Self::validated(serial_number, t, x, y, species)?;
        for diagnostic in trajectory.jump_diagnostics(DEFAULT_JUMP_FRACTION) {
            diagnostic.log();
        }
        Ok(trajectory)
    }

    /// Build a trajectory from loosely typed columns.
    ///
    /// Integer `t`/`x`/`y` columns are converted to floating point. Species must be an
    /// [`Column::Integer`] column whose values fit a [`SpeciesCode`].
    ///
    /// Return
    /// ----------
    /// * [`SmoldynError::ShapeMismatch`] if the lengths differ or a column is nested,
    /// * [`SmoldynError::TypeMismatch`] if species are not integer-coded.
    pub fn from_columns(
        serial_number: Serial,
        t: Column,
        x: Column,
        y: Column,
        species: Column,
    ) -> Result<Self, SmoldynError> {
        let n = t.len();
        if x.len() != n || y.len() != n || species.len() != n {
            return Err(SmoldynError::ShapeMismatch(
                "t, x, y, and species must have the same length".into(),
            ));
        }
        t.ensure_one_dimensional("t")?;
        x.ensure_one_dimensional("x")?;
        y.ensure_one_dimensional("y")?;
        species.ensure_one_dimensional("species")?;

        let species = species.into_species()?;
        Self::new(
            serial_number,
            t.into_floats(),
            x.into_floats(),
            y.into_floats(),
            species,
        )
    }

    /// Length check shared by every constructor; does not log.
    pub(crate) fn validated(
        serial_number: Serial,
        t: Vec<Time>,
        x: Vec<Position>,
        y: Vec<Position>,
        species: Vec<SpeciesCode>,
    ) -> Result<Self, SmoldynError> {
        let n = t.len();
        if !(x.len() == n && y.len() == n && species.len() == n) {
            return Err(SmoldynError::ShapeMismatch(format!(
                "t, x, y, and species must have the same length (got {}, {}, {}, {})",
                n,
                x.len(),
                y.len(),
                species.len()
            )));
        }
        Ok(Trajectory {
            serial_number,
            t,
            x,
            y,
            species,
        })
    }

    pub fn serial_number(&self) -> Serial {
        self.serial_number
    }

    pub fn t(&self) -> &[Time] {
        &self.t
    }

    pub fn x(&self) -> &[Position] {
        &self.x
    }

    pub fn y(&self) -> &[Position] {
        &self.y
    }

    pub fn species(&self) -> &[SpeciesCode] {
        &self.species
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// The sample at `index` as `(serial, t, x, y, species)`.
    pub fn get(&self, index: usize) -> Option<Sample> {
        Some((
            self.serial_number,
            *self.t.get(index)?,
            self.x[index],
            self.y[index],
            self.species[index],
        ))
    }

    /// Iterate over all samples in time order.
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Report single steps that look like unhandled periodic-boundary crossings.
    ///
    /// For each axis, the threshold is `jump_fraction × max|axis|`; every step whose
    /// absolute forward difference is strictly larger yields a
    /// [`Diagnostic::LargeJump`]. The heuristic is scale dependent, hence the
    /// configurable fraction.
    pub fn jump_diagnostics(&self, jump_fraction: f64) -> Vec<Diagnostic> {
        let mut found = large_jumps(self.serial_number, Axis::X, &self.x, jump_fraction);
        found.extend(large_jumps(
            self.serial_number,
            Axis::Y,
            &self.y,
            jump_fraction,
        ));
        found
    }

    /// Unwrap one axis of a trajectory recorded in a periodic domain `[min_val, max_val]`.
    ///
    /// A forward difference larger than half the domain size means the particle left
    /// through the upper edge and re-entered at the lower one (or the reverse for a
    /// difference below minus half the size). Each such crossing shifts all following
    /// samples by one domain size so the output is continuous. The first sample is
    /// never shifted.
    ///
    /// Arguments
    /// -----------------
    /// * `values`: raw positions along one axis.
    /// * `min_val`, `max_val`: bounds of the periodic domain.
    ///
    /// Return
    /// ----------
    /// * The unwrapped positions, same length as `values`.
    pub fn unwrap_periodic_boundaries(values: &[f64], min_val: f64, max_val: f64) -> Vec<f64> {
        let domain = max_val - min_val;
        let half = domain / 2.0;

        let mut correction = 0.0;
        let mut previous = match values.first() {
            Some(first) => *first,
            None => return Vec::new(),
        };

        values
            .iter()
            .map(|&value| {
                let delta = value - previous;
                if delta > half {
                    correction -= domain;
                } else if delta < -half {
                    correction += domain;
                }
                previous = value;
                value + correction
            })
            .collect()
    }

    /// Serial and columns compared against another column set, tolerantly.
    fn close_to(
        &self,
        serial_number: Serial,
        t: &[Time],
        x: &[Position],
        y: &[Position],
        species: &[SpeciesCode],
    ) -> bool {
        self.serial_number == serial_number
            && all_close(&self.t, t)
            && all_close(&self.x, x)
            && all_close(&self.y, y)
            && self.species.len() == species.len()
            && self
                .species
                .iter()
                .zip(species)
                .all(|(a, b)| close(f64::from(*a), f64::from(*b)))
    }
}

fn large_jumps(serial: Serial, axis: Axis, values: &[f64], jump_fraction: f64) -> Vec<Diagnostic> {
    let max_abs = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let threshold = jump_fraction * max_abs;

    values
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let magnitude = (pair[1] - pair[0]).abs();
            (magnitude > threshold).then_some(Diagnostic::LargeJump {
                serial,
                axis,
                step: i + 1,
                magnitude,
                threshold,
            })
        })
        .collect()
}

#[inline]
fn close(a: f64, b: f64) -> bool {
    approx::relative_eq!(a, b, epsilon = CLOSE_ABS_TOL, max_relative = CLOSE_REL_TOL)
}

/// Element-wise tolerant comparison of two columns of equal length.
pub fn all_close(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| close(*x, *y))
}

impl PartialEq for Trajectory {
    fn eq(&self, other: &Self) -> bool {
        self.close_to(
            other.serial_number,
            &other.t,
            &other.x,
            &other.y,
            &other.species,
        )
    }
}

impl PartialEq<TrajectoryRecord> for Trajectory {
    fn eq(&self, other: &TrajectoryRecord) -> bool {
        self.close_to(other.serialnum, &other.t, &other.x, &other.y, &other.species)
    }
}

impl PartialEq<Trajectory> for TrajectoryRecord {
    fn eq(&self, other: &Trajectory) -> bool {
        other == self
    }
}

impl From<&Trajectory> for TrajectoryRecord {
    fn from(trajectory: &Trajectory) -> Self {
        TrajectoryRecord {
            serialnum: trajectory.serial_number,
            t: trajectory.t.clone(),
            x: trajectory.x.clone(),
            y: trajectory.y.clone(),
            species: trajectory.species.clone(),
        }
    }
}

impl TryFrom<TrajectoryRecord> for Trajectory {
    type Error = SmoldynError;

    fn try_from(record: TrajectoryRecord) -> Result<Self, Self::Error> {
        Trajectory::new(
            record.serialnum,
            record.t,
            record.x,
            record.y,
            record.species,
        )
    }
}

#[cfg(test)]
mod trajectory_test {
    use super::*;

    fn arrays() -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<SpeciesCode>) {
        (
            vec![0.0, 0.1, 0.2],
            vec![1.0, 1.2, 1.4],
            vec![0.5, 0.4, 0.3],
            vec![0, 0, 1],
        )
    }

    #[test]
    fn test_construction() {
        let (t, x, y, species) = arrays();
        let traj = Trajectory::new(1, t.clone(), x.clone(), y.clone(), species.clone()).unwrap();
        assert_eq!(traj.len(), 3);
        assert_eq!(traj.t(), t.as_slice());
        assert_eq!(traj.x(), x.as_slice());
        assert_eq!(traj.y(), y.as_slice());
        assert_eq!(traj.species(), species.as_slice());
        assert_eq!(traj.serial_number(), 1);
    }

    #[test]
    fn test_length_mismatch() {
        let (t, x, y, _) = arrays();
        let err = Trajectory::new(1, t, x, y, vec![0, 0]).unwrap_err();
        assert!(matches!(err, SmoldynError::ShapeMismatch(_)));
    }

    #[test]
    fn test_from_columns_errors() {
        let (t, x, y, _) = arrays();

        let err = Trajectory::from_columns(
            1,
            t.clone().into(),
            x.clone().into(),
            y.clone().into(),
            vec![0_i64, 0].into(),
        )
        .unwrap_err();
        assert!(matches!(err, SmoldynError::ShapeMismatch(_)));

        let err = Trajectory::from_columns(
            1,
            t.clone().into(),
            x.clone().into(),
            y.clone().into(),
            vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]].into(),
        )
        .unwrap_err();
        assert!(matches!(err, SmoldynError::ShapeMismatch(_)));

        let err = Trajectory::from_columns(
            1,
            t.clone().into(),
            x.clone().into(),
            y.clone().into(),
            vec![0.0, 0.0, 0.5].into(),
        )
        .unwrap_err();
        assert!(matches!(err, SmoldynError::TypeMismatch(_)));

        let err = Trajectory::from_columns(
            1,
            t.into(),
            x.into(),
            y.into(),
            vec![0_i64, -1, 2].into(),
        )
        .unwrap_err();
        assert!(matches!(err, SmoldynError::TypeMismatch(_)));
    }

    #[test]
    fn test_from_integer_columns() {
        let traj = Trajectory::from_columns(
            4,
            vec![0_i64, 1, 2].into(),
            vec![1.0, 2.0, 3.0].into(),
            vec![0_i64, 0, 0].into(),
            vec![3_i64, 3, 3].into(),
        )
        .unwrap();
        assert_eq!(traj.t(), &[0.0, 1.0, 2.0]);
        assert_eq!(traj.species(), &[3, 3, 3]);
    }

    #[test]
    fn test_indexing() {
        let (t, x, y, species) = arrays();
        let traj = Trajectory::new(9, t, x, y, species).unwrap();
        assert_eq!(traj.get(2), Some((9, 0.2, 1.4, 0.3, 1)));
        assert_eq!(traj.get(3), None);
        assert_eq!(traj.samples().count(), 3);
    }

    #[test]
    fn test_equality_is_tolerant() {
        let (t, x, y, species) = arrays();
        let a = Trajectory::new(1, t.clone(), x.clone(), y.clone(), species.clone()).unwrap();
        let shifted: Vec<f64> = x.iter().map(|v| v + 1e-9).collect();
        let b = Trajectory::new(1, t.clone(), shifted, y.clone(), species.clone()).unwrap();
        assert_eq!(a, b);

        let c = Trajectory::new(2, t.clone(), x.clone(), y.clone(), species.clone()).unwrap();
        assert_ne!(a, c);

        let moved: Vec<f64> = x.iter().map(|v| v + 1e-3).collect();
        let d = Trajectory::new(1, t, moved, y, species).unwrap();
        assert_ne!(a, d);
    }

    #[test]
    fn test_equality_with_record() {
        let (t, x, y, species) = arrays();
        let traj = Trajectory::new(1, t, x, y, species).unwrap();
        let record = TrajectoryRecord {
            serialnum: 1,
            t: vec![0.0, 0.1, 0.2],
            x: vec![1.0, 1.2, 1.4],
            y: vec![0.5, 0.4, 0.3],
            species: vec![0, 0, 1],
        };
        assert_eq!(traj, record);
        assert_eq!(record, traj);

        let shorter = TrajectoryRecord {
            t: vec![0.0, 0.1],
            ..record.clone()
        };
        assert_ne!(traj, shorter);
        assert_eq!(TrajectoryRecord::from(&traj), record);
        assert_eq!(Trajectory::try_from(record).unwrap(), traj);
    }

    #[test]
    fn test_unwrap_upper_crossing() {
        let raw = [9.0, 9.5, 0.5, 1.0];
        let unwrapped = Trajectory::unwrap_periodic_boundaries(&raw, 0.0, 10.0);
        assert_eq!(unwrapped, vec![9.0, 9.5, 10.5, 11.0]);

        let raw = [1.0, 0.5, 9.5, 9.0];
        let unwrapped = Trajectory::unwrap_periodic_boundaries(&raw, 0.0, 10.0);
        assert_eq!(unwrapped, vec![1.0, 0.5, -0.5, -1.0]);
    }

    #[test]
    fn test_unwrap_without_jumps_is_identity() {
        let raw = [1.0, 2.0, 3.0, 2.5];
        assert_eq!(
            Trajectory::unwrap_periodic_boundaries(&raw, 0.0, 10.0),
            raw.to_vec()
        );
        assert!(Trajectory::unwrap_periodic_boundaries(&[], 0.0, 10.0).is_empty());
    }

    #[test]
    fn test_jump_diagnostics() {
        let traj = Trajectory::new(
            5,
            vec![0.0, 1.0, 2.0],
            vec![12.7, 12.8, 0.1],
            vec![2.0, 2.1, 2.1],
            vec![1, 1, 1],
        )
        .unwrap();
        let jumps = traj.jump_diagnostics(DEFAULT_JUMP_FRACTION);
        assert_eq!(jumps.len(), 1);
        match &jumps[0] {
            Diagnostic::LargeJump {
                serial, axis, step, ..
            } => {
                assert_eq!(*serial, 5);
                assert_eq!(*axis, Axis::X);
                assert_eq!(*step, 2);
            }
            other => panic!("unexpected diagnostic {other:?}"),
        }

        // A larger fraction silences the heuristic
        assert!(traj.jump_diagnostics(1.0).is_empty());
    }
}
