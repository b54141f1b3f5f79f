use motionkit_core::{
    AxisMask, CartesianPosition, KinematicsError, MotionRequest, MotorMask,
};
use motionkit_kinematics::{JogGuard, KinematicModel, KinematicsRegistry, Segmenter};
use motionkit_settings::{
    AxisSettings, CoreXYSettings, DeltaSettings, KinematicsSettings, MachineConfig,
};
use proptest::prelude::*;

fn model(kinematics: KinematicsSettings) -> KinematicModel {
    let config = MachineConfig {
        kinematics,
        ..MachineConfig::default()
    };
    KinematicsRegistry::new().create(&config).unwrap()
}

fn delta() -> KinematicModel {
    model(KinematicsSettings::ParallelDelta(DeltaSettings::default()))
}

fn point(x: f64, y: f64, z: f64) -> CartesianPosition {
    CartesianPosition::new(vec![x, y, z])
}

proptest! {
    #[test]
    fn test_cartesian_round_trip(x in -500.0..500.0f64, y in -500.0..500.0f64, z in -200.0..200.0f64) {
        let model = model(KinematicsSettings::Cartesian);
        let p = point(x, y, z);
        let motors = model.inverse(&p).unwrap();
        prop_assert!(model.forward(&motors, 3).approx_eq(&p, 1e-4));
    }

    #[test]
    fn test_corexy_round_trip(x in -500.0..500.0f64, y in -500.0..500.0f64, z in -200.0..200.0f64) {
        let model = model(KinematicsSettings::CoreXY(CoreXYSettings::default()));
        let p = point(x, y, z);
        let motors = model.inverse(&p).unwrap();
        prop_assert!(model.forward(&motors, 3).approx_eq(&p, 1e-4));
    }

    #[test]
    fn test_delta_round_trip(x in -30.0..30.0f64, y in -30.0..30.0f64, z in -160.0..-110.0f64) {
        let model = delta();
        let p = point(x, y, z);
        let motors = model.inverse(&p).unwrap();
        prop_assert!(model.forward(&motors, 3).approx_eq(&p, 1e-4));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_delta_segments_stay_on_the_line(
        x0 in -30.0..30.0f64, y0 in -30.0..30.0f64, z0 in -160.0..-110.0f64,
        x1 in -30.0..30.0f64, y1 in -30.0..30.0f64, z1 in -160.0..-110.0f64,
    ) {
        let model = delta();
        let segmenter = Segmenter::new(0.01, 16).unwrap();
        let start = point(x0, y0, z0);
        let end = point(x1, y1, z1);
        let segments = segmenter
            .segment(&model, &start, &MotionRequest::linear(end.clone(), 1000.0))
            .unwrap();

        let mut previous = model.inverse(&start).unwrap();
        for segment in &segments {
            // Denser than the points the segmenter itself checks
            for step in 1..40 {
                let t = step as f64 / 40.0;
                let chord = previous.lerp(&segment.motors, t);
                let deviation = model.forward(&chord, 3).distance_to_segment(&start, &end);
                prop_assert!(deviation <= 0.01 + 1e-9, "deviation {}", deviation);
            }
            previous = segment.motors.clone();
        }
        if let Some(last) = segments.last() {
            prop_assert_eq!(&last.target, &end);
        }
    }
}

#[test]
fn test_linear_kinematics_single_segment() {
    let segmenter = Segmenter::new(0.001, 12).unwrap();
    for kinematics in [
        KinematicsSettings::Cartesian,
        KinematicsSettings::CoreXY(CoreXYSettings::default()),
    ] {
        let model = model(kinematics);
        let segments = segmenter
            .segment(
                &model,
                &point(0.0, 0.0, 0.0),
                &MotionRequest::linear(point(120.0, -35.0, 4.0), 600.0),
            )
            .unwrap();
        assert_eq!(segments.len(), 1);
    }
}

#[test]
fn test_delta_line_is_subdivided() {
    let model = delta();
    let segmenter = Segmenter::new(0.01, 12).unwrap();
    let segments = segmenter
        .segment(
            &model,
            &point(-30.0, 0.0, -130.0),
            &MotionRequest::linear(point(30.0, 0.0, -130.0), 1000.0),
        )
        .unwrap();
    assert!(segments.len() > 1);
    assert!(segments.iter().all(|s| s.feed_rate > 0.0));
}

#[test]
fn test_zero_length_move_dropped() {
    let model = delta();
    let segmenter = Segmenter::new(0.01, 12).unwrap();
    let here = point(5.0, 5.0, -140.0);
    let segments = segmenter
        .segment(&model, &here, &MotionRequest::linear(here.clone(), 500.0))
        .unwrap();
    assert!(segments.is_empty());
}

#[test]
fn test_unreachable_target_fails_like_inverse() {
    let model = delta();
    let target = point(500.0, 0.0, -120.0);
    let inverse_error = model.inverse(&target).unwrap_err();
    assert!(matches!(inverse_error, KinematicsError::Infeasible { .. }));

    let segmenter = Segmenter::new(0.01, 12).unwrap();
    let error = segmenter
        .segment(
            &model,
            &point(0.0, 0.0, -120.0),
            &MotionRequest::linear(target, 500.0),
        )
        .unwrap_err();
    assert_eq!(error, inverse_error);
}

#[test]
fn test_delta_jog_clamped_to_boundary() {
    let model = delta();
    let guard = JogGuard::new();
    let current = point(0.0, 0.0, -120.0);

    let clamped = guard.guard(
        &model,
        MotionRequest::jog(point(400.0, 0.0, -120.0), 3000.0),
        &current,
    );
    let target = clamped.target.clone();
    assert!(model.inverse(&target).is_ok());
    assert!(target[0] > 50.0 && target[0] < 400.0);
    assert_eq!(target[1], 0.0);
    assert_eq!(target[2], -120.0);

    // A hair further along the jog direction is outside the workspace
    assert!(model.inverse(&point(target[0] + 1e-3, 0.0, -120.0)).is_err());

    // Clamping an in-bounds target again changes nothing
    let again = guard.guard(&model, clamped, &current);
    assert_eq!(again.target, target);
}

#[test]
fn test_programmed_moves_never_clamped() {
    let model = delta();
    let guard = JogGuard::new();
    let request = MotionRequest::linear(point(400.0, 0.0, -120.0), 3000.0);
    let guarded = guard.guard(&model, request.clone(), &point(0.0, 0.0, -120.0));
    assert_eq!(guarded, request);
}

#[test]
fn test_require_all_for_ganged_gantry() {
    let mut config = MachineConfig::default();
    config.axes[1] = AxisSettings {
        ganged: true,
        ..AxisSettings::new("Y", 300.0, 2)
    };
    let model = KinematicsRegistry::new().create(&config).unwrap();
    let y = AxisMask::bit(1);
    let motors = model.layout().motors_for(y);
    assert_eq!(motors.count(), 2);

    let outcome = model.limit_reached(y, motors, MotorMask::motor(1, 0));
    assert_eq!(outcome.axes, y);
    assert!(!outcome.stop);

    // The same motor reporting again does not complete the axis
    let outcome = model.limit_reached(outcome.axes, outcome.motors, MotorMask::motor(1, 0));
    assert_eq!(outcome.axes, y);
    assert!(!outcome.stop);

    let outcome = model.limit_reached(outcome.axes, outcome.motors, MotorMask::motor(1, 1));
    assert!(outcome.axes.is_empty());
    assert_eq!(outcome.reached, y);
    assert!(outcome.stop);
}

#[test]
fn test_require_all_for_delta_arms() {
    let model = delta();
    let arms = AxisMask::all(3);
    let mut axes = arms;
    let mut motors = model.layout().motors_for(arms);

    for (report, last) in [(0, false), (0, false), (1, false), (2, true)] {
        let outcome = model.limit_reached(axes, motors, MotorMask::motor(report, 0));
        assert_eq!(outcome.stop, last);
        assert_eq!(outcome.axes.is_empty(), last);
        axes = outcome.axes;
        motors = outcome.motors;
    }
}

#[test]
fn test_delta_rejects_unreachable_arc() {
    use motionkit_core::{ArcPlane, ArcSpec};

    let model = delta();
    let start = point(20.0, 0.0, -130.0);
    let small = ArcSpec {
        center: [0.0, 0.0],
        radius: 20.0,
        plane: ArcPlane::XY,
        clockwise: false,
    };
    assert!(!model.invalid_arc(&start, &start, &small));

    let start = point(110.0, 0.0, -130.0);
    let large = ArcSpec {
        center: [0.0, 0.0],
        radius: 110.0,
        ..small
    };
    assert!(model.invalid_arc(&start, &start, &large));
}
