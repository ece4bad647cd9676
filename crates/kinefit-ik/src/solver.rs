//! Damped least-squares minimization.
//!
//! [`LevenbergMarquardt`] minimizes the squared norm of a residual vector
//! over a parameter vector, estimating the Jacobian by central differences.
//! The damping schedule follows Madsen, Nielsen and Tingleff's "Methods for
//! Non-Linear Least Squares Problems": the damping factor scales with the
//! largest Gauss-Newton diagonal entry and is updated from the gain ratio
//! between actual and predicted error reduction, so the solver blends
//! smoothly between gradient descent far from a solution and Gauss-Newton
//! near one.

use nalgebra::{DMatrix, DVector};

// ---------------------------------------------------------------------------
// LeastSquaresProblem
// ---------------------------------------------------------------------------

/// A residual function minimized by [`LevenbergMarquardt`].
///
/// The solver treats the function as a black box and probes it for finite
/// differences, so evaluation is allowed to mutate internal scratch state.
pub trait LeastSquaresProblem {
    /// Evaluate the residual vector at `params`.
    fn residuals(&mut self, params: &DVector<f64>) -> DVector<f64>;
}

// ---------------------------------------------------------------------------
// SolveOptions
// ---------------------------------------------------------------------------

/// Tuning parameters for [`LevenbergMarquardt`].
#[derive(Debug, Clone, Copy)]
pub struct SolveOptions {
    /// Initial damping factor as a fraction of the largest diagonal entry
    /// of the Gauss-Newton approximation (default: 1e-3).
    pub tau: f64,

    /// Stop when the infinity norm of the gradient drops below this
    /// (default: 1e-15).
    pub gradient_tolerance: f64,

    /// Stop when the parameter step shrinks below this, relative to the
    /// parameter norm (default: 1e-15).
    pub step_tolerance: f64,

    /// Stop when the squared residual norm drops below this
    /// (default: 1e-20).
    pub residual_tolerance: f64,

    /// Half-width of the central-difference probe (default: 1e-6).
    pub difference_delta: f64,

    /// Iteration budget, counting every damping attempt (default: 9000).
    pub max_iterations: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            tau: 1.0e-3,
            gradient_tolerance: 1.0e-15,
            step_tolerance: 1.0e-15,
            residual_tolerance: 1.0e-20,
            difference_delta: 1.0e-6,
            max_iterations: 9000,
        }
    }
}

// ---------------------------------------------------------------------------
// FitReport
// ---------------------------------------------------------------------------

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The gradient infinity norm fell below `gradient_tolerance`.
    SmallGradient,
    /// The parameter step fell below `step_tolerance`.
    SmallStep,
    /// The squared residual norm fell below `residual_tolerance`.
    SmallResidual,
    /// The iteration budget ran out.
    IterationLimit,
    /// Damping overflowed without producing an acceptable step.
    Stalled,
    /// The problem has no parameters to adjust.
    NoParameters,
}

/// Outcome of one minimization.
#[derive(Debug, Clone, Copy)]
pub struct FitReport {
    /// Whether a tolerance was met before the iteration budget ran out.
    pub converged: bool,

    /// Damping attempts performed.
    pub iterations: usize,

    /// Squared residual norm at the starting parameters.
    pub initial_residual: f64,

    /// Squared residual norm at the returned parameters.
    pub final_residual: f64,

    /// Which criterion ended the run.
    pub stop_reason: StopReason,
}

// ---------------------------------------------------------------------------
// LevenbergMarquardt
// ---------------------------------------------------------------------------

/// Levenberg-Marquardt minimizer over a [`LeastSquaresProblem`].
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    options: SolveOptions,
}

impl LevenbergMarquardt {
    #[must_use]
    pub const fn new(options: SolveOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(SolveOptions::default())
    }

    #[must_use]
    pub const fn options(&self) -> &SolveOptions {
        &self.options
    }

    /// Minimize the squared residual norm, refining `params` in place.
    ///
    /// `params` is only ever replaced by a candidate that lowered the
    /// residual, so the final residual never exceeds the initial one. A
    /// singular or indefinite normal system raises the damping instead of
    /// failing, which keeps the method total; an unusable problem surfaces
    /// as a report with `converged == false`.
    pub fn minimize<P: LeastSquaresProblem + ?Sized>(
        &self,
        problem: &mut P,
        params: &mut DVector<f64>,
    ) -> FitReport {
        let opts = &self.options;
        let n = params.len();

        let mut residual = problem.residuals(params);
        let initial_residual = residual.norm_squared();
        let mut residual_norm2 = initial_residual;

        if n == 0 {
            return FitReport {
                converged: true,
                iterations: 0,
                initial_residual,
                final_residual: residual_norm2,
                stop_reason: StopReason::NoParameters,
            };
        }

        let mut jac = jacobian(problem, params, residual.len(), opts.difference_delta);
        let mut approx_hessian = jac.tr_mul(&jac);
        let mut gradient = jac.tr_mul(&residual);

        let max_diag = (0..n).fold(0.0_f64, |acc, i| acc.max(approx_hessian[(i, i)]));
        let mut mu = if max_diag > 0.0 {
            opts.tau * max_diag
        } else {
            opts.tau
        };
        let mut nu = 2.0_f64;

        let mut iterations = 0;
        let stop_reason = loop {
            if residual_norm2 <= opts.residual_tolerance {
                break StopReason::SmallResidual;
            }
            if inf_norm(&gradient) <= opts.gradient_tolerance {
                break StopReason::SmallGradient;
            }
            if iterations >= opts.max_iterations {
                break StopReason::IterationLimit;
            }
            iterations += 1;

            let mut damped = approx_hessian.clone();
            for i in 0..n {
                damped[(i, i)] += mu;
            }
            let Some(factor) = damped.cholesky() else {
                mu *= nu;
                nu *= 2.0;
                if !mu.is_finite() {
                    break StopReason::Stalled;
                }
                continue;
            };
            let step = factor.solve(&(-&gradient));
            if step.norm() <= opts.step_tolerance * (params.norm() + opts.step_tolerance) {
                break StopReason::SmallStep;
            }

            let candidate = &*params + &step;
            let candidate_residual = problem.residuals(&candidate);
            let candidate_norm2 = candidate_residual.norm_squared();
            let predicted = step.dot(&(&step * mu - &gradient));
            let gain = if predicted > 0.0 {
                (residual_norm2 - candidate_norm2) / predicted
            } else {
                -1.0
            };

            if gain > 0.0 {
                *params = candidate;
                residual = candidate_residual;
                residual_norm2 = candidate_norm2;
                jac = jacobian(problem, params, residual.len(), opts.difference_delta);
                approx_hessian = jac.tr_mul(&jac);
                gradient = jac.tr_mul(&residual);
                mu *= (1.0_f64 / 3.0).max(1.0 - (2.0 * gain - 1.0).powi(3));
                nu = 2.0;
            } else {
                mu *= nu;
                nu *= 2.0;
                if !mu.is_finite() {
                    break StopReason::Stalled;
                }
            }
        };

        let converged = !matches!(
            stop_reason,
            StopReason::IterationLimit | StopReason::Stalled
        );
        FitReport {
            converged,
            iterations,
            initial_residual,
            final_residual: residual_norm2,
            stop_reason,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Central-difference Jacobian of the residuals at `params`.
fn jacobian<P: LeastSquaresProblem + ?Sized>(
    problem: &mut P,
    params: &DVector<f64>,
    rows: usize,
    delta: f64,
) -> DMatrix<f64> {
    let mut jac = DMatrix::zeros(rows, params.len());
    let mut probe = params.clone();
    for col in 0..params.len() {
        let saved = probe[col];
        probe[col] = saved + delta;
        let forward = problem.residuals(&probe);
        probe[col] = saved - delta;
        let backward = problem.residuals(&probe);
        probe[col] = saved;
        jac.set_column(col, &((forward - backward) / (2.0 * delta)));
    }
    jac
}

fn inf_norm(v: &DVector<f64>) -> f64 {
    v.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
