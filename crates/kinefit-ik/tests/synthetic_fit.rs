//! Integration test: fit synthetic marker captures end to end.
//!
//! Poses an upper-body skeleton with known joint angles, reads marker
//! points off its forward kinematics and checks that:
//! 1. Noise-free markers are recovered to sub-millimeter residuals
//! 2. Marker noise degrades the fit gracefully instead of breaking it
//! 3. A persistent fitter tracks a moving pose, warm-starting each frame
//! 4. The full capture pipeline writes the motion and marker files
//!
//! Marker layout mirrors a five-marker upper-body rig: neck plus elbow
//! and wrist on both sides, all coordinates in centimeters.

use approx::assert_relative_eq;
use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use kinefit_core::{ChannelSet, FitConfig, Joint, Motion, RotationOrder, Skeleton};
use kinefit_ik::{fit_capture, FrameFitter};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Torso root with a neck stub and symmetric two-bone arms. Upper arm and
/// forearm share a length so the marker-distance calibration in the
/// pipeline test is self-consistent.
fn upper_body() -> Skeleton {
    let mut skeleton = Skeleton::new();
    let root = skeleton.add_joint(Joint::new("torso"), None);
    skeleton.add_joint(
        Joint::new("neck")
            .with_channels(ChannelSet::Rotation)
            .with_offset(Vector3::new(0.0, 20.0, 0.0)),
        Some(root),
    );
    for (side, sign) in [("l", 1.0_f32), ("r", -1.0_f32)] {
        let shoulder = skeleton.add_joint(
            Joint::new(format!("{side}shoulder"))
                .with_channels(ChannelSet::Rotation)
                .with_offset(Vector3::new(sign * 15.0, 18.0, 0.0)),
            Some(root),
        );
        let elbow = skeleton.add_joint(
            Joint::new(format!("{side}elbow"))
                .with_channels(ChannelSet::Rotation)
                .with_offset(Vector3::new(sign * 22.0, 0.0, 0.0)),
            Some(shoulder),
        );
        let wrist = skeleton.add_joint(
            Joint::new(format!("{side}wrist"))
                .with_channels(ChannelSet::Rotation)
                .with_offset(Vector3::new(sign * 22.0, 0.0, 0.0)),
            Some(elbow),
        );
        skeleton.add_joint(
            Joint::new(format!("{side}hand"))
                .with_channels(ChannelSet::Rotation)
                .with_offset(Vector3::new(sign * 10.0, 0.0, 0.0)),
            Some(wrist),
        );
    }
    skeleton
}

fn fit_config() -> FitConfig {
    let mut config = FitConfig::default();
    for (joint, dof) in [("lshoulder", 3), ("lelbow", 1), ("rshoulder", 3), ("relbow", 1)] {
        config.solve.dofs.insert(joint.into(), dof);
    }
    for joint in ["lelbow", "lwrist", "relbow", "rwrist"] {
        config.solve.targets.insert(joint.into(), joint.into());
    }
    for (marker, column) in [("neck", 0), ("lelbow", 1), ("lwrist", 2), ("relbow", 3), ("rwrist", 4)]
    {
        config.markers.columns.insert(marker.into(), column);
    }
    config.markers.recenter = "neck".into();
    config
}

fn set_euler(skeleton: &mut Skeleton, name: &str, angles: Vector3<f32>) {
    let id = skeleton.joint_index(name).unwrap();
    skeleton.joint_mut(id).local_mut().rotation = RotationOrder::Xyz.to_quaternion(angles);
}

/// Pose the arms with `scale` in [0, 1] blending rest into a bent pose.
fn posed(scale: f32, root: Vector3<f32>) -> Skeleton {
    let mut skeleton = upper_body();
    set_euler(&mut skeleton, "lshoulder", scale * Vector3::new(0.3, -0.2, 0.4));
    set_euler(&mut skeleton, "lelbow", scale * Vector3::new(0.0, 0.6, 0.0));
    set_euler(&mut skeleton, "rshoulder", scale * Vector3::new(-0.1, 0.25, -0.35));
    set_euler(&mut skeleton, "relbow", scale * Vector3::new(0.0, -0.5, 0.0));
    if let Some(joint) = skeleton.joints_mut().next() {
        joint.local_mut().translation = root;
    }
    skeleton.update_global_transforms();
    skeleton
}

/// Marker frame in column order; the neck marker carries the root position.
fn markers_from(skeleton: &Skeleton) -> Vec<Vector3<f32>> {
    let at = |name: &str| {
        skeleton
            .joint(skeleton.joint_index(name).unwrap())
            .global()
            .translation
    };
    vec![
        at("torso"),
        at("lelbow"),
        at("lwrist"),
        at("relbow"),
        at("rwrist"),
    ]
}

fn global(skeleton: &Skeleton, name: &str) -> Vector3<f32> {
    skeleton
        .joint(skeleton.joint_index(name).unwrap())
        .global()
        .translation
}

// ---------------------------------------------------------------------------
// Frame fitting
// ---------------------------------------------------------------------------

#[test]
fn recovers_pose_from_clean_markers() {
    let reference = posed(1.0, Vector3::new(4.0, 95.0, -3.0));
    let frame = markers_from(&reference);

    let mut fitter = FrameFitter::new(upper_body(), &fit_config()).unwrap();
    let report = fitter.fit_frame(&frame).unwrap();

    assert!(report.converged, "stopped with {:?}", report.stop_reason);
    assert!(
        report.final_residual < 1e-2,
        "residual {} too large",
        report.final_residual
    );
    for name in ["lelbow", "lwrist", "relbow", "rwrist"] {
        assert_relative_eq!(
            global(fitter.skeleton(), name),
            global(&reference, name),
            epsilon = 0.05
        );
    }
    assert_relative_eq!(
        fitter.skeleton().root().unwrap().local().translation,
        Vector3::new(4.0, 95.0, -3.0),
        epsilon = 1e-5
    );
}

#[test]
fn noisy_markers_degrade_gracefully() {
    let reference = posed(1.0, Vector3::new(0.0, 90.0, 0.0));
    let clean = markers_from(&reference);

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let noisy: Vec<Vector3<f32>> = clean
        .iter()
        .map(|p| {
            p + Vector3::new(
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-0.5..0.5),
            )
        })
        .collect();

    let mut fitter = FrameFitter::new(upper_body(), &fit_config()).unwrap();
    let report = fitter.fit_frame(&noisy).unwrap();

    assert!(report.final_residual <= report.initial_residual);
    // Eight parameters cannot absorb twelve noisy residuals.
    assert!(report.final_residual > 1e-4);
    for name in ["lwrist", "rwrist"] {
        let error = (global(fitter.skeleton(), name) - global(&reference, name)).norm();
        assert!(error < 2.0, "{name} off by {error} cm");
    }
}

#[test]
fn tracks_a_moving_pose_with_warm_starts() {
    let frames = 20;
    let root = Vector3::new(0.0, 92.0, 1.0);

    let mut fitter = FrameFitter::new(upper_body(), &fit_config()).unwrap();
    let mut last_report = None;
    for i in 0..frames {
        #[allow(clippy::cast_precision_loss)]
        let scale = i as f32 / (frames - 1) as f32;
        let reference = posed(scale, root);
        let report = fitter.fit_frame(&markers_from(&reference)).unwrap();

        assert!(report.converged, "frame {i} stopped with {:?}", report.stop_reason);
        let error = (global(fitter.skeleton(), "lwrist") - global(&reference, "lwrist")).norm();
        assert!(error < 0.5, "frame {i} lwrist off by {error} cm");
        last_report = Some(report);
    }

    // The warm-started final frame should not need more work than a cold
    // solve of the same frame.
    let final_pose = posed(1.0, root);
    let mut cold = FrameFitter::new(upper_body(), &fit_config()).unwrap();
    let cold_report = cold.fit_frame(&markers_from(&final_pose)).unwrap();
    let warm_report = last_report.unwrap();
    assert!(
        warm_report.iterations <= cold_report.iterations,
        "warm {} > cold {}",
        warm_report.iterations,
        cold_report.iterations
    );
}

// ---------------------------------------------------------------------------
// Capture pipeline
// ---------------------------------------------------------------------------

/// Invert the calibration remap so a raw capture lands on `q` after
/// scaling, recentring and axis remapping.
fn uncalibrate(q: Vector3<f32>, ratio: f32, origin: Vector3<f32>, voffset: f32) -> Vector3<f32> {
    let scaled = Vector3::new(q.x, -q.z, q.y - voffset);
    scaled / ratio + origin
}

#[test]
fn capture_pipeline_writes_motion_and_markers() {
    let dir = std::env::temp_dir().join("kinefit_test_capture_pipeline");
    std::fs::create_dir_all(&dir).unwrap();
    let skeleton_path = dir.join("subject.bvh");
    let capture_path = dir.join("capture.csv");

    // Subject skeleton on disk, rest pose only.
    let skeleton = upper_body();
    let mut rest = Motion::new();
    rest.append_key(skeleton.pose());
    kinefit_bvh::write_file(&skeleton_path, &skeleton, &rest).unwrap();

    // Constant pose; the calibration recenters on the first-frame neck
    // marker, so the post-calibration root sits at (0, 100, 0).
    let reference = posed(1.0, Vector3::new(0.0, 100.0, 0.0));
    let target_markers = markers_from(&reference);
    let ratio = 2.0;
    let origin = Vector3::new(13.0, 7.0, -4.0);
    let raw: Vec<Vec<Vector3<f32>>> = (0..6)
        .map(|_| {
            target_markers
                .iter()
                .map(|&q| uncalibrate(q, ratio, origin, 100.0))
                .collect()
        })
        .collect();
    kinefit_markers::save_points(&capture_path, &raw).unwrap();

    let mut config = fit_config();
    config.subject.skeleton = skeleton_path.clone();
    let outcome = fit_capture(&config, &capture_path).unwrap();

    assert_eq!(outcome.reports.len(), 6);
    assert_eq!(outcome.motion.key_count(), 6);
    assert!(outcome.reports.iter().all(|r| r.converged));
    assert!(outcome.reports.iter().all(|r| r.final_residual < 1e-2));

    // The calibrated markers round-trip through the postprocess file.
    let postprocessed = kinefit_markers::load_points(&outcome.postprocessed_path).unwrap();
    assert_eq!(postprocessed.len(), 6);
    assert_relative_eq!(
        postprocessed[0][0],
        Vector3::new(0.0, 100.0, 0.0),
        epsilon = 1e-3
    );

    // The written motion file carries one key per capture frame.
    let written = kinefit_bvh::parse_file(&outcome.motion_path).unwrap();
    assert_eq!(written.motion.key_count(), 6);
    assert_relative_eq!(
        written.motion.keys()[0].root_position,
        Vector3::new(0.0, 100.0, 0.0),
        epsilon = 1e-2
    );

    // The final skeleton pose matches the reference markers.
    for name in ["lwrist", "rwrist"] {
        assert_relative_eq!(
            global(&outcome.skeleton, name),
            global(&reference, name),
            epsilon = 0.1
        );
    }

    // Cleanup
    let _ = std::fs::remove_file(&skeleton_path);
    let _ = std::fs::remove_file(&capture_path);
    let _ = std::fs::remove_file(&outcome.motion_path);
    let _ = std::fs::remove_file(&outcome.postprocessed_path);
    let _ = std::fs::remove_dir(&dir);
}
