//! Frame-by-frame marker fitting.
//!
//! [`FrameFitter`] binds a skeleton to a fit configuration: the rotations
//! of the configured joints, packed by their degrees of freedom, are
//! optimized until the forward-kinematics positions of the target joints
//! match the measured marker points. The skeleton state persists across
//! frames, so each solve starts from the previous frame's pose.
//!
//! [`fit_capture`] runs the whole pipeline from a raw capture CSV to a
//! motion file: load, calibrate, smooth, fit every frame, write.

use std::path::{Path, PathBuf};

use nalgebra::{DVector, Vector3};
use tracing::{info, trace, warn};

use kinefit_bvh::{parse_file, write_file, MotionFile};
use kinefit_core::{ConfigError, FitConfig, LengthUnit, Motion, RotationOrder, Skeleton};
use kinefit_markers::{gaussian_filter, load_points, save_points, scale_markers};

use crate::error::FitError;
use crate::solver::{FitReport, LeastSquaresProblem, LevenbergMarquardt, SolveOptions};

// ---------------------------------------------------------------------------
// FrameFitter
// ---------------------------------------------------------------------------

/// Fits one skeleton pose per marker frame.
///
/// Joint ids and marker columns are resolved once at construction; the
/// parameter and residual layouts follow the lexicographic order of the
/// configuration maps, so they are stable across runs.
#[derive(Debug)]
pub struct FrameFitter {
    skeleton: Skeleton,
    /// Joint id and rotational degrees of freedom, in parameter order.
    layout: Vec<(usize, u8)>,
    /// Target joint id and marker column, in residual order.
    targets: Vec<(usize, usize)>,
    root_column: usize,
    solver: LevenbergMarquardt,
}

impl FrameFitter {
    /// Resolve the configuration against `skeleton`.
    ///
    /// The configuration is validated first; joints named under
    /// `solve.dofs` or `solve.targets` must exist in the skeleton.
    pub fn new(skeleton: Skeleton, config: &FitConfig) -> Result<Self, FitError> {
        config.validate()?;

        let joint_id = |name: &str| {
            skeleton
                .joint_index(name)
                .ok_or_else(|| FitError::UnknownJoint(name.into()))
        };

        let mut layout = Vec::with_capacity(config.solve.dofs.len());
        for (name, &dof) in &config.solve.dofs {
            layout.push((joint_id(name)?, dof));
        }

        let mut targets = Vec::with_capacity(config.solve.targets.len());
        for (joint, marker) in &config.solve.targets {
            targets.push((joint_id(joint)?, column_for(config, marker)?));
        }
        let root_column = column_for(config, &config.solve.root_marker)?;

        Ok(Self {
            skeleton,
            layout,
            targets,
            root_column,
            solver: LevenbergMarquardt::with_defaults(),
        })
    }

    /// Replace the solver tuning, builder style.
    #[must_use]
    pub fn with_options(mut self, options: SolveOptions) -> Self {
        self.solver = LevenbergMarquardt::new(options);
        self
    }

    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[must_use]
    pub fn into_skeleton(self) -> Skeleton {
        self.skeleton
    }

    /// Number of optimized parameters.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.layout
            .iter()
            .map(|&(_, dof)| usize::from(dof))
            .sum()
    }

    /// Fit the skeleton to one marker frame.
    ///
    /// The root translation is taken straight from its marker; only joint
    /// rotations are optimized. On return the skeleton holds the best pose
    /// found, whether or not the solve converged.
    pub fn fit_frame(&mut self, frame: &[Vector3<f32>]) -> Result<FitReport, FitError> {
        let point = |column: usize| {
            frame.get(column).ok_or(FitError::ColumnOutOfRange {
                column,
                channels: frame.len(),
            })
        };

        let root = *point(self.root_column)?;
        let mut observed = DVector::zeros(self.targets.len() * 3);
        for (slot, &(_, column)) in self.targets.iter().enumerate() {
            let p = point(column)?;
            observed[slot * 3] = f64::from(p.x);
            observed[slot * 3 + 1] = f64::from(p.y);
            observed[slot * 3 + 2] = f64::from(p.z);
        }

        if let Some(joint) = self.skeleton.joints_mut().next() {
            joint.local_mut().translation = root;
        }

        let mut params = pack_parameters(&self.skeleton, &self.layout);
        let report = {
            let mut problem = PoseProblem {
                skeleton: &mut self.skeleton,
                layout: &self.layout,
                targets: &self.targets,
                observed,
            };
            self.solver.minimize(&mut problem, &mut params)
        };

        // The solver probes the skeleton with trial parameters; re-apply
        // the accepted ones so the stored pose matches the report.
        apply_parameters(&mut self.skeleton, &self.layout, &params);
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// PoseProblem
// ---------------------------------------------------------------------------

/// Residuals between measured marker points and target joint positions.
struct PoseProblem<'a> {
    skeleton: &'a mut Skeleton,
    layout: &'a [(usize, u8)],
    targets: &'a [(usize, usize)],
    observed: DVector<f64>,
}

impl LeastSquaresProblem for PoseProblem<'_> {
    fn residuals(&mut self, params: &DVector<f64>) -> DVector<f64> {
        apply_parameters(self.skeleton, self.layout, params);
        let mut residual = DVector::zeros(self.observed.len());
        for (slot, &(id, _)) in self.targets.iter().enumerate() {
            let p = self.skeleton.joint(id).global().translation;
            residual[slot * 3] = self.observed[slot * 3] - f64::from(p.x);
            residual[slot * 3 + 1] = self.observed[slot * 3 + 1] - f64::from(p.y);
            residual[slot * 3 + 2] = self.observed[slot * 3 + 2] - f64::from(p.z);
        }
        residual
    }
}

// ---------------------------------------------------------------------------
// Parameter packing
// ---------------------------------------------------------------------------

/// Seed a parameter vector from the skeleton's current local rotations.
///
/// Packing per joint follows its degrees of freedom: three carry the full
/// `(x, y, z)` Euler triple, two carry `(x, z)`, one carries `(y)`, zero
/// carries nothing.
fn pack_parameters(skeleton: &Skeleton, layout: &[(usize, u8)]) -> DVector<f64> {
    let mut values = Vec::new();
    for &(id, dof) in layout {
        let angles = RotationOrder::Xyz.euler_angles(&skeleton.joint(id).local().rotation);
        match dof {
            3 => values.extend([
                f64::from(angles.x),
                f64::from(angles.y),
                f64::from(angles.z),
            ]),
            2 => values.extend([f64::from(angles.x), f64::from(angles.z)]),
            1 => values.push(f64::from(angles.y)),
            _ => {}
        }
    }
    DVector::from_vec(values)
}

/// Write a packed parameter vector back into the skeleton and refresh
/// global transforms. Joints with zero degrees of freedom are pinned to
/// the identity rotation.
#[allow(clippy::cast_possible_truncation)]
fn apply_parameters(skeleton: &mut Skeleton, layout: &[(usize, u8)], params: &DVector<f64>) {
    let mut index = 0;
    for &(id, dof) in layout {
        let angles = match dof {
            3 => {
                let a = Vector3::new(
                    params[index] as f32,
                    params[index + 1] as f32,
                    params[index + 2] as f32,
                );
                index += 3;
                a
            }
            2 => {
                let a = Vector3::new(params[index] as f32, 0.0, params[index + 1] as f32);
                index += 2;
                a
            }
            1 => {
                let a = Vector3::new(0.0, params[index] as f32, 0.0);
                index += 1;
                a
            }
            _ => Vector3::zeros(),
        };
        skeleton.joint_mut(id).local_mut().rotation = RotationOrder::Xyz.to_quaternion(angles);
    }
    skeleton.update_global_transforms();
}

fn column_for(config: &FitConfig, marker: &str) -> Result<usize, FitError> {
    config.markers.columns.get(marker).copied().ok_or_else(|| {
        FitError::Config(ConfigError::InvalidValue {
            field: "markers.columns".into(),
            message: format!("{marker} has no column"),
        })
    })
}

// ---------------------------------------------------------------------------
// fit_capture
// ---------------------------------------------------------------------------

/// Everything a capture fit produces.
#[derive(Debug)]
pub struct FitOutcome {
    /// Skeleton in the pose of the last fitted frame.
    pub skeleton: Skeleton,
    /// One key per capture frame.
    pub motion: Motion,
    /// Per-frame solver reports, in frame order.
    pub reports: Vec<FitReport>,
    /// Where the motion file was written.
    pub motion_path: PathBuf,
    /// Where the calibrated marker CSV was written.
    pub postprocessed_path: PathBuf,
}

/// Fit a skeleton to a marker capture and write the results.
///
/// Reads the capture CSV and the subject skeleton, calibrates the capture
/// scale from the skeleton's forearm length, smooths the markers, fits
/// every frame in order and writes both the calibrated markers and the
/// fitted motion next to the capture file.
pub fn fit_capture(config: &FitConfig, capture: impl AsRef<Path>) -> Result<FitOutcome, FitError> {
    let capture = capture.as_ref();
    let mut points = load_points(capture)?;
    let MotionFile {
        skeleton,
        mut motion,
    } = parse_file(&config.subject.skeleton)?;

    // The skeleton's forearm bone supplies the reference length for scale
    // calibration; joint and marker share a name in our rigs. Skeleton
    // offsets are centimeters, the calibrator wants meters.
    let elbow = skeleton
        .joint_index(&config.markers.left_elbow)
        .ok_or_else(|| FitError::UnknownJoint(config.markers.left_elbow.clone()))?;
    let forearm = skeleton.joint(elbow).local().translation.norm()
        * LengthUnit::Cm.factor_to(LengthUnit::M);

    scale_markers(&mut points, &config.markers, forearm)?;
    let points = gaussian_filter(&points, config.markers.sigma, config.markers.window);

    let postprocessed_path = FitConfig::postprocessed_output_path(capture);
    save_points(&postprocessed_path, &points)?;

    let mut fitter = FrameFitter::new(skeleton, config)?;
    motion.clear();
    let mut reports = Vec::with_capacity(points.len());
    for (index, frame) in points.iter().enumerate() {
        let report = fitter.fit_frame(frame)?;
        trace!(
            frame = index,
            residual = report.final_residual,
            iterations = report.iterations,
            "fitted frame"
        );
        if !report.converged {
            warn!(
                frame = index,
                residual = report.final_residual,
                reason = ?report.stop_reason,
                "frame fit did not converge"
            );
        }
        motion.append_key(fitter.skeleton().pose());
        reports.push(report);
    }

    let motion_path = FitConfig::motion_output_path(capture);
    write_file(&motion_path, fitter.skeleton(), &motion)?;
    info!(
        frames = reports.len(),
        converged = reports.iter().filter(|r| r.converged).count(),
        path = %motion_path.display(),
        "capture fit complete"
    );

    Ok(FitOutcome {
        skeleton: fitter.into_skeleton(),
        motion,
        reports,
        motion_path,
        postprocessed_path,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
