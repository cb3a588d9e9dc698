//! # Non-fatal diagnostics
//!
//! Some conditions met during parsing and fitting are worth reporting but must not
//! abort the computation: a suspicious jump in a trajectory, an offset fit silently
//! reduced to the plain linear model, or an ill-conditioned least-squares solution.
//!
//! Every such condition is represented by a [`Diagnostic`] and travels **alongside**
//! the best-effort value in a [`Diagnosed`] wrapper, so callers (and tests) can inspect
//! it without intercepting a global warning stream. Each diagnostic is also emitted
//! through [`tracing::warn!`] at the moment it is recorded.
//!
//! ## Example
//!
//! ```rust
//! use smoldyn_msd::metrics::diffusion_fit::estimate_diffusion_coefficient;
//! use smoldyn_msd::diagnostics::Diagnostic;
//!
//! let fit = estimate_diffusion_coefficient(&[2.0], &[1.0], true).unwrap();
//! assert!(fit
//!     .diagnostics()
//!     .iter()
//!     .any(|d| matches!(d, Diagnostic::FitDowngraded { .. })));
//! let d = fit.into_value();
//! assert!((d - 0.5).abs() < 1e-6);
//! ```
use std::fmt;

use crate::constants::Serial;

/// Spatial axis of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Degenerate outcomes reported by the least-squares solver.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverIssue {
    /// Not enough points to estimate the parameter covariance (`n_points <= n_params`).
    /// The covariance matrix is filled with `+inf`.
    CovarianceUndetermined { n_points: usize, n_params: usize },

    /// The Jacobian at the solution has rank `rank < n_params`: some parameter
    /// combination is not identifiable from the data. The covariance matrix is
    /// filled with `+inf`.
    SingularJacobian { rank: usize, n_params: usize },

    /// The solver stopped because no further improvement was possible; the
    /// returned parameters are the best found.
    NoImprovement(String),
}

impl fmt::Display for SolverIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverIssue::CovarianceUndetermined { n_points, n_params } => write!(
                f,
                "covariance of the parameters could not be estimated ({n_points} points for {n_params} parameters)"
            ),
            SolverIssue::SingularJacobian { rank, n_params } => write!(
                f,
                "covariance of the parameters could not be estimated (Jacobian rank {rank} for {n_params} parameters)"
            ),
            SolverIssue::NoImprovement(reason) => {
                write!(f, "solver could not improve the solution: {reason}")
            }
        }
    }
}

/// A non-fatal condition observed while computing a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A single step exceeded the large-jump threshold; likely an unhandled
    /// periodic-boundary crossing.
    LargeJump {
        serial: Serial,
        axis: Axis,
        /// Index of the sample reached by the jump.
        step: usize,
        magnitude: f64,
        threshold: f64,
    },

    /// An offset fit was requested with too few points and the plain linear
    /// model was used instead.
    FitDowngraded { n_points: usize },

    /// The curve fit produced a value but flagged it.
    Solver(SolverIssue),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::LargeJump {
                serial,
                axis,
                step,
                magnitude,
                threshold,
            } => write!(
                f,
                "Large jumps in trajectory {serial} ({axis} axis, step {step}: |Δ| = {magnitude:.6} > {threshold:.6}); periodic boundaries may not be handled"
            ),
            Diagnostic::FitDowngraded { n_points } => write!(
                f,
                "Fitting with epsilon needs at least 2 points ({n_points} given); falling back to MSD = 4·D·t"
            ),
            Diagnostic::Solver(issue) => write!(f, "{issue}"),
        }
    }
}

impl Diagnostic {
    /// Emit this diagnostic as a structured `tracing` warning.
    pub(crate) fn log(&self) {
        match self {
            Diagnostic::LargeJump {
                serial, axis, step, ..
            } => tracing::warn!(serial = *serial, axis = %axis, step = *step, "{self}"),
            Diagnostic::FitDowngraded { n_points } => {
                tracing::warn!(n_points = *n_points, "{self}")
            }
            Diagnostic::Solver(_) => tracing::warn!("{self}"),
        }
    }
}

/// A value together with the diagnostics raised while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosed<T> {
    value: T,
    diagnostics: Vec<Diagnostic>,
}

impl<T> Diagnosed<T> {
    pub fn with_diagnostics(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Diagnosed { value, diagnostics }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn into_parts(self) -> (T, Vec<Diagnostic>) {
        (self.value, self.diagnostics)
    }

    /// Transform the value, keeping the diagnostics.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Diagnosed<U> {
        Diagnosed {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }
}

/// Ordered collector used while building a [`Diagnosed`] value.
///
/// Recording a diagnostic logs it immediately; absorbing diagnostics that were
/// already recorded elsewhere does not log them a second time.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticSink {
    collected: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        self.collected.push(diagnostic);
    }

    pub(crate) fn absorb(&mut self, diagnostics: Vec<Diagnostic>) {
        self.collected.extend(diagnostics);
    }

    /// Take the value out of `diagnosed` and keep its diagnostics.
    pub(crate) fn unwrap_diagnosed<T>(&mut self, diagnosed: Diagnosed<T>) -> T {
        let (value, diagnostics) = diagnosed.into_parts();
        self.absorb(diagnostics);
        value
    }

    pub(crate) fn finish<T>(self, value: T) -> Diagnosed<T> {
        Diagnosed::with_diagnostics(value, self.collected)
    }
}

#[cfg(test)]
mod diagnostics_test {
    use super::*;

    #[test]
    fn test_sink_keeps_order() {
        let mut sink = DiagnosticSink::new();
        sink.record(Diagnostic::FitDowngraded { n_points: 1 });
        sink.absorb(vec![Diagnostic::Solver(SolverIssue::CovarianceUndetermined {
            n_points: 1,
            n_params: 1,
        })]);
        let value = sink.unwrap_diagnosed(Diagnosed::with_diagnostics(
            3,
            vec![Diagnostic::FitDowngraded { n_points: 0 }],
        ));
        let out = sink.finish(value);

        assert_eq!(*out.value(), 3);
        assert_eq!(out.diagnostics().len(), 3);
        assert_eq!(
            out.diagnostics()[0],
            Diagnostic::FitDowngraded { n_points: 1 }
        );
        assert_eq!(
            out.diagnostics()[2],
            Diagnostic::FitDowngraded { n_points: 0 }
        );
    }

    #[test]
    fn test_large_jump_message() {
        let d = Diagnostic::LargeJump {
            serial: 7,
            axis: Axis::Y,
            step: 2,
            magnitude: 3.0,
            threshold: 1.5,
        };
        let msg = d.to_string();
        assert!(msg.starts_with("Large jumps in trajectory 7"));
        assert!(msg.contains("y axis"));
    }

    #[test]
    fn test_map_keeps_diagnostics() {
        let d = Diagnosed::with_diagnostics(2.0, vec![Diagnostic::FitDowngraded { n_points: 1 }]);
        let mapped = d.map(|v| v * 2.0);
        assert_eq!(*mapped.value(), 4.0);
        assert!(mapped.has_diagnostics());
    }
}
