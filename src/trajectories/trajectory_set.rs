use std::ops::{Add, Index};

use ahash::AHashSet;

use super::trajectory::Trajectory;
use crate::constants::Serial;

/// An ordered, immutable collection of [`Trajectory`] values.
///
/// Order is the construction order and is never re-sorted. Duplicate serial numbers are
/// allowed. Concatenation (`+`) always produces a new set and leaves its operands untouched:
///
/// ```rust
/// use smoldyn_msd::trajectories::{Trajectory, TrajectorySet};
///
/// let traj = Trajectory::new(1, vec![0.0, 1.0], vec![0.0, 0.1], vec![0.0, 0.1], vec![1, 1]).unwrap();
/// let set = TrajectorySet::from(vec![traj.clone(); 5]);
///
/// let grown = &set + &traj;
/// let doubled = &set + &set;
/// assert_eq!(grown.len(), 6);
/// assert_eq!(doubled.len(), 10);
/// assert_eq!(set.len(), 5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrajectorySet {
    trajectories: Vec<Trajectory>,
}

impl TrajectorySet {
    pub fn new(trajectories: Vec<Trajectory>) -> Self {
        TrajectorySet { trajectories }
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Trajectory> {
        self.trajectories.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trajectory> {
        self.trajectories.iter()
    }

    pub fn as_slice(&self) -> &[Trajectory] {
        &self.trajectories
    }

    /// Serial number of every member, in set order.
    pub fn serial_numbers(&self) -> Vec<Serial> {
        self.trajectories
            .iter()
            .map(Trajectory::serial_number)
            .collect()
    }

    /// True when no two members share a serial number.
    pub fn has_unique_serials(&self) -> bool {
        let distinct: AHashSet<Serial> = self
            .trajectories
            .iter()
            .map(Trajectory::serial_number)
            .collect();
        distinct.len() == self.trajectories.len()
    }

    fn concat<'a>(&self, others: impl IntoIterator<Item = &'a Trajectory>) -> TrajectorySet {
        let mut trajectories = self.trajectories.clone();
        trajectories.extend(others.into_iter().cloned());
        TrajectorySet { trajectories }
    }
}

impl From<Vec<Trajectory>> for TrajectorySet {
    fn from(trajectories: Vec<Trajectory>) -> Self {
        TrajectorySet::new(trajectories)
    }
}

impl FromIterator<Trajectory> for TrajectorySet {
    fn from_iter<I: IntoIterator<Item = Trajectory>>(iter: I) -> Self {
        TrajectorySet::new(iter.into_iter().collect())
    }
}

impl Index<usize> for TrajectorySet {
    type Output = Trajectory;

    fn index(&self, index: usize) -> &Self::Output {
        &self.trajectories[index]
    }
}

impl<'a> IntoIterator for &'a TrajectorySet {
    type Item = &'a Trajectory;
    type IntoIter = std::slice::Iter<'a, Trajectory>;

    fn into_iter(self) -> Self::IntoIter {
        self.trajectories.iter()
    }
}

impl IntoIterator for TrajectorySet {
    type Item = Trajectory;
    type IntoIter = std::vec::IntoIter<Trajectory>;

    fn into_iter(self) -> Self::IntoIter {
        self.trajectories.into_iter()
    }
}

impl Add<&TrajectorySet> for &TrajectorySet {
    type Output = TrajectorySet;

    fn add(self, rhs: &TrajectorySet) -> TrajectorySet {
        self.concat(rhs.iter())
    }
}

impl Add<&Trajectory> for &TrajectorySet {
    type Output = TrajectorySet;

    fn add(self, rhs: &Trajectory) -> TrajectorySet {
        self.concat(std::iter::once(rhs))
    }
}

impl Add<TrajectorySet> for TrajectorySet {
    type Output = TrajectorySet;

    fn add(mut self, rhs: TrajectorySet) -> TrajectorySet {
        self.trajectories.extend(rhs.trajectories);
        self
    }
}

impl Add<Trajectory> for TrajectorySet {
    type Output = TrajectorySet;

    fn add(mut self, rhs: Trajectory) -> TrajectorySet {
        self.trajectories.push(rhs);
        self
    }
}

#[cfg(test)]
mod trajectory_set_test {
    use super::*;

    fn traj(serial: Serial) -> Trajectory {
        Trajectory::new(
            serial,
            vec![0.0, 0.1, 0.2],
            vec![1.0, 1.2, 1.4],
            vec![0.5, 0.4, 0.3],
            vec![0, 0, 1],
        )
        .unwrap()
    }

    #[test]
    fn test_set_init() {
        let set = TrajectorySet::from(vec![traj(1); 5]);
        assert_eq!(set.len(), 5);

        let set: TrajectorySet = (0..3).map(traj).collect();
        assert_eq!(set.len(), 3);
        assert_eq!(set.serial_numbers(), vec![0, 1, 2]);
        assert!(set.has_unique_serials());
        assert!(!TrajectorySet::from(vec![traj(1); 2]).has_unique_serials());
    }

    #[test]
    fn test_addition() {
        let set = TrajectorySet::from(vec![traj(1); 5]);
        let added = &set + &traj(2);
        assert_eq!(added.len(), 6);
        assert_eq!(added[5].serial_number(), 2);

        let doubled = &set + &set;
        assert_eq!(doubled.len(), 10);
        assert_eq!(set.len(), 5);

        let owned = set.clone() + traj(3) + set;
        assert_eq!(owned.len(), 11);
        assert_eq!(owned[5].serial_number(), 3);
    }

    #[test]
    fn test_order_is_preserved() {
        let set: TrajectorySet = [5, 3, 9].into_iter().map(traj).collect();
        let serials: Vec<Serial> = set.iter().map(Trajectory::serial_number).collect();
        assert_eq!(serials, vec![5, 3, 9]);
        assert_eq!(set.get(1).map(Trajectory::serial_number), Some(3));
        assert!(set.get(3).is_none());
    }
}
