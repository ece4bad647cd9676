//! Marker fitting for kinefit skeletons.
//!
//! Provides a Levenberg-Marquardt least-squares core and the frame-by-frame
//! pose fitter built on it.
//!
//! # Architecture
//!
//! ```text
//! capture CSV ──► calibrate + smooth ──► FrameFitter ──► motion file
//! ```
//!
//! The [`FrameFitter`] resolves a [`FitConfig`](kinefit_core::FitConfig)
//! against a skeleton once, then fits one pose per marker frame: the root
//! translation is read straight from its marker while joint rotations are
//! optimized until target joints land on their measured markers. The
//! skeleton state persists between frames, warm-starting each solve from
//! the previous pose. [`fit_capture`] wraps the whole pipeline.

pub mod error;
pub mod fit;
pub mod solver;

pub use error::FitError;
pub use fit::{fit_capture, FitOutcome, FrameFitter};
pub use solver::{FitReport, LeastSquaresProblem, LevenbergMarquardt, SolveOptions, StopReason};
