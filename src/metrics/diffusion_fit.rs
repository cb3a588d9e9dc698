//! # Diffusion-coefficient estimation
//!
//! Fit the 2D free-diffusion law to an MSD curve by nonlinear least squares:
//!
//! ```text
//! MSD(t) = 4·D·t            (MsdModel::Linear)
//! MSD(t) = 4·D·t + ε        (MsdModel::LinearWithOffset)
//! ```
//!
//! `t` is either a physical time (absolute-time methodology) or an integer lag
//! (time-lag methodology); the fitted `D` is expressed in squared length per unit of `t`.
//!
//! ## Algorithm
//! -----------------
//! 1. Validate shapes; an offset fit with fewer than two points is downgraded to the linear
//!    model ([`Diagnostic::FitDowngraded`]).
//! 2. Minimize the residuals `model(t) - msd` with Levenberg–Marquardt (MINPACK port from
//!    the `levenberg-marquardt` crate), starting from all parameters equal to one.
//! 3. Estimate the covariance at the solution as `pinv(JᵀJ) · SSR / (m - p)`. With
//!    `m ≤ p` the covariance is undetermined: it is filled with `+∞` and
//!    [`SolverIssue::CovarianceUndetermined`] is reported. A rank-deficient Jacobian (all
//!    times zero, or the offset model on identical times) is filled the same way and
//!    reported as [`SolverIssue::SingularJacobian`].
//!
//! Solver outcomes
//! -----------------
//! * converged / residuals zero / orthogonal gradient → value returned.
//! * no further improvement possible → value returned with [`SolverIssue::NoImprovement`].
//! * anything else (numerical failure, lost patience, …) → [`SmoldynError::FitFailed`].
//!
//! ## Example
//! -----------------
//! ```rust
//! use smoldyn_msd::metrics::diffusion_fit::{estimate_diffusion_coefficient_full, FitParams};
//!
//! let lags = [1.0, 2.0, 3.0, 4.0];
//! let msd = [2.3, 4.3, 6.3, 8.3];
//! let fit = estimate_diffusion_coefficient_full(&msd, &lags, true, &FitParams::default())
//!     .unwrap()
//!     .into_value();
//! assert!((fit.diffusion() - 0.5).abs() < 1e-6);
//! assert!((fit.epsilon().unwrap() - 0.3).abs() < 1e-6);
//! ```
use std::fmt;

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt, TerminationReason};
use nalgebra::{storage::Owned, DMatrix, DVector, Dyn};

use crate::{
    diagnostics::{Diagnosed, Diagnostic, DiagnosticSink, SolverIssue},
    smoldyn_errors::SmoldynError,
    theory::{theoretical_msd, theoretical_msd_with_offset},
};

/// Model fitted to an MSD curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsdModel {
    /// `4·D·t`, parameters `[D]`.
    Linear,
    /// `4·D·t + ε`, parameters `[D, ε]`.
    LinearWithOffset,
}

impl MsdModel {
    pub fn n_params(&self) -> usize {
        match self {
            MsdModel::Linear => 1,
            MsdModel::LinearWithOffset => 2,
        }
    }

    /// Model value at `t` for the parameter vector `params`.
    pub fn evaluate(&self, t: f64, params: &DVector<f64>) -> f64 {
        match self {
            MsdModel::Linear => theoretical_msd(t, params[0]),
            MsdModel::LinearWithOffset => theoretical_msd_with_offset(t, params[0], params[1]),
        }
    }

    /// Partial derivative of the model at `t` with respect to parameter `j`.
    fn derivative(&self, t: f64, j: usize) -> f64 {
        match j {
            0 => theoretical_msd(t, 1.0),
            _ => 1.0,
        }
    }
}

impl fmt::Display for MsdModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MsdModel::Linear => write!(f, "MSD = 4·D·t"),
            MsdModel::LinearWithOffset => write!(f, "MSD = 4·D·t + ε"),
        }
    }
}

/// Tuning of the Levenberg–Marquardt solver.
///
/// Defaults follow MINPACK's `lmder` as driven by common curve-fit front ends:
/// `ftol = xtol = 1.49012e-8`, `gtol = 0`, `patience = 100` (evaluations are capped at
/// `patience · (n_params + 1)`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitParams {
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
    pub patience: usize,
}

impl Default for FitParams {
    fn default() -> Self {
        FitParams {
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 0.0,
            patience: 100,
        }
    }
}

impl FitParams {
    pub fn with_ftol(mut self, v: f64) -> Self {
        self.ftol = v;
        self
    }
    pub fn with_xtol(mut self, v: f64) -> Self {
        self.xtol = v;
        self
    }
    pub fn with_gtol(mut self, v: f64) -> Self {
        self.gtol = v;
        self
    }
    pub fn with_patience(mut self, v: usize) -> Self {
        self.patience = v;
        self
    }

    fn solver(&self) -> LevenbergMarquardt<f64> {
        LevenbergMarquardt::new()
            .with_ftol(self.ftol)
            .with_xtol(self.xtol)
            .with_gtol(self.gtol)
            .with_patience(self.patience)
    }
}

/// Full outcome of a diffusion fit.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionFit {
    /// `[D]` or `[D, ε]` depending on [`Self::model`].
    pub params: DVector<f64>,
    /// Parameter covariance, `p × p`; `+∞` everywhere when undetermined.
    pub covariance: DMatrix<f64>,
    /// Model actually fitted (after a possible downgrade).
    pub model: MsdModel,
    pub evaluations: usize,
    /// `½·Σ residual²` at the solution.
    pub objective: f64,
}

impl DiffusionFit {
    pub fn diffusion(&self) -> f64 {
        self.params[0]
    }

    /// Fitted offset, if the offset model was used.
    pub fn epsilon(&self) -> Option<f64> {
        match self.model {
            MsdModel::LinearWithOffset => Some(self.params[1]),
            MsdModel::Linear => None,
        }
    }

    /// One-sigma uncertainty of `D`.
    pub fn diffusion_std(&self) -> f64 {
        self.covariance[(0, 0)].sqrt()
    }
}

impl fmt::Display for DiffusionFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "D = {:.6} ± {:.6}",
            self.diffusion(),
            self.diffusion_std()
        )?;
        if let Some(eps) = self.epsilon() {
            write!(f, ", ε = {eps:.6}")?;
        }
        write!(f, " ({}, {} evaluations)", self.model, self.evaluations)
    }
}

/// Residuals `model(t) - msd` for the solver.
struct MsdProblem<'a> {
    times: &'a [f64],
    msd: &'a [f64],
    model: MsdModel,
    params: DVector<f64>,
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for MsdProblem<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, x: &DVector<f64>) {
        self.params.copy_from(x);
    }

    fn params(&self) -> DVector<f64> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        Some(DVector::from_iterator(
            self.times.len(),
            self.times
                .iter()
                .zip(self.msd)
                .map(|(&t, &y)| self.model.evaluate(t, &self.params) - y),
        ))
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        Some(DMatrix::from_fn(
            self.times.len(),
            self.model.n_params(),
            |i, j| self.model.derivative(self.times[i], j),
        ))
    }
}

/// Fitted diffusion coefficient `D` of an MSD curve.
///
/// Arguments
/// -----------------
/// * `msd` – MSD values.
/// * `times` – matching times or lags.
/// * `add_epsilon` – fit `4·D·t + ε` instead of `4·D·t`.
///
/// Return
/// ----------
/// * `D`, with the diagnostics of the fit.
/// * See [`estimate_diffusion_coefficient_full`] for the error cases.
pub fn estimate_diffusion_coefficient(
    msd: &[f64],
    times: &[f64],
    add_epsilon: bool,
) -> Result<Diagnosed<f64>, SmoldynError> {
    Ok(
        estimate_diffusion_coefficient_full(msd, times, add_epsilon, &FitParams::default())?
            .map(|fit| fit.diffusion()),
    )
}

/// Fit an MSD curve and return parameters, covariance and solver statistics.
///
/// Arguments
/// -----------------
/// * `msd` – MSD values.
/// * `times` – matching times or lags.
/// * `add_epsilon` – fit the offset model; downgraded with a
///   [`Diagnostic::FitDowngraded`] when fewer than two points are given.
/// * `params` – solver tolerances.
///
/// Return
/// ----------
/// * The [`DiffusionFit`] with every non-fatal [`Diagnostic`] raised on the way.
/// * [`SmoldynError::ShapeMismatch`] if `msd` and `times` differ in length.
/// * [`SmoldynError::NotEnoughPoints`] on empty input.
/// * [`SmoldynError::FitFailed`] if the solver ends without a usable solution.
pub fn estimate_diffusion_coefficient_full(
    msd: &[f64],
    times: &[f64],
    add_epsilon: bool,
    params: &FitParams,
) -> Result<Diagnosed<DiffusionFit>, SmoldynError> {
    if msd.len() != times.len() {
        return Err(SmoldynError::ShapeMismatch(format!(
            "{} MSD values for {} times",
            msd.len(),
            times.len()
        )));
    }
    if msd.is_empty() {
        return Err(SmoldynError::NotEnoughPoints {
            required: 1,
            found: 0,
        });
    }

    let mut sink = DiagnosticSink::new();
    let m = msd.len();

    let model = if add_epsilon && m < 2 {
        sink.record(Diagnostic::FitDowngraded { n_points: m });
        MsdModel::Linear
    } else if add_epsilon {
        MsdModel::LinearWithOffset
    } else {
        MsdModel::Linear
    };
    let p = model.n_params();

    let problem = MsdProblem {
        times,
        msd,
        model,
        params: DVector::from_element(p, 1.0),
    };
    let (problem, report) = params.solver().minimize(problem);

    if let Some(issue) = classify_termination(report.termination)? {
        sink.record(Diagnostic::Solver(issue));
    }

    let covariance = if m > p {
        estimate_covariance(&problem, m, p)?
    } else {
        Err(SolverIssue::CovarianceUndetermined {
            n_points: m,
            n_params: p,
        })
    };
    let covariance = covariance.unwrap_or_else(|issue| {
        sink.record(Diagnostic::Solver(issue));
        DMatrix::from_element(p, p, f64::INFINITY)
    });

    tracing::debug!(
        model = %model,
        evaluations = report.number_of_evaluations,
        objective = report.objective_function,
        "MSD fit finished"
    );

    Ok(sink.finish(DiffusionFit {
        params: problem.params,
        covariance,
        model,
        evaluations: report.number_of_evaluations,
        objective: report.objective_function,
    }))
}

/// Map a solver termination to a soft issue or a hard failure.
///
/// Return
/// ----------
/// * `Ok(None)` on convergence, zero residuals or an orthogonal gradient.
/// * `Ok(Some(SolverIssue::NoImprovement))` when the tolerances cannot be met any further.
/// * [`SmoldynError::FitFailed`] for every other termination.
fn classify_termination(reason: TerminationReason) -> Result<Option<SolverIssue>, SmoldynError> {
    if reason.was_successful() {
        return Ok(None);
    }
    match reason {
        TerminationReason::NoImprovementPossible(why) => {
            Ok(Some(SolverIssue::NoImprovement(why.to_string())))
        }
        other => Err(SmoldynError::FitFailed(format!("{other:?}"))),
    }
}

/// `pinv(JᵀJ) · SSR / (m - p)` at the current parameters; requires `m > p`.
///
/// The numerical rank of `J` is taken from its singular values with the cutoff
/// `ε · max(m, p) · s_max`. A rank below `p` yields [`SolverIssue::SingularJacobian`]
/// instead of a covariance.
fn estimate_covariance(
    problem: &MsdProblem<'_>,
    m: usize,
    p: usize,
) -> Result<Result<DMatrix<f64>, SolverIssue>, SmoldynError> {
    let (Some(jacobian), Some(residuals)) = (problem.jacobian(), problem.residuals()) else {
        return Err(SmoldynError::FitFailed(
            "model could not be evaluated at the solution".into(),
        ));
    };

    let rank = numerical_rank(&jacobian);
    if rank < p {
        return Ok(Err(SolverIssue::SingularJacobian { rank, n_params: p }));
    }

    let jtj = jacobian.tr_mul(&jacobian);
    let pinv = jtj
        .pseudo_inverse(f64::EPSILON)
        .map_err(|e| SmoldynError::FitFailed(e.to_string()))?;

    let ssr = residuals.norm_squared();
    Ok(Ok(pinv * (ssr / (m - p) as f64)))
}

/// Number of singular values above `ε · max(rows, cols) · s_max`.
fn numerical_rank(matrix: &DMatrix<f64>) -> usize {
    let singular_values = matrix.singular_values();
    let s_max = singular_values.max();
    let cutoff = f64::EPSILON * matrix.nrows().max(matrix.ncols()) as f64 * s_max;
    singular_values.iter().filter(|&&s| s > cutoff).count()
}
