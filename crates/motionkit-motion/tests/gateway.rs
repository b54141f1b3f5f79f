use motionkit_core::{
    ArcPlane, ArcSpec, AxisMask, CartesianPosition, ConfigurationError, KinematicsError,
    MotionError, MotionRequest, MotorMask, PlannerError,
};
use motionkit_homing::{CycleStart, HomingPoll, HomingStep, SafetyInputs};
use motionkit_kinematics::{JogHandle, KinematicsRegistry};
use motionkit_motion::{MotionGateway, Planner, PlannerSegment, SegmentQueue};
use motionkit_settings::{AxisSettings, DeltaSettings, KinematicsSettings, MachineConfig};

fn point(x: f64, y: f64, z: f64) -> CartesianPosition {
    CartesianPosition::new(vec![x, y, z])
}

fn gateway(kinematics: KinematicsSettings) -> MotionGateway {
    let config = MachineConfig {
        kinematics,
        ..MachineConfig::default()
    };
    MotionGateway::from_config(&config, &KinematicsRegistry::new()).unwrap()
}

fn delta_at(position: CartesianPosition) -> MotionGateway {
    let mut gateway = gateway(KinematicsSettings::ParallelDelta(DeltaSettings::default()));
    let mut queue = SegmentQueue::with_capacity(4096);
    gateway
        .move_to(&mut queue, MotionRequest::linear(position, 1000.0))
        .unwrap();
    gateway
}

#[test]
fn test_cartesian_move_single_segment() {
    let mut gateway = gateway(KinematicsSettings::Cartesian);
    let mut queue = SegmentQueue::default();
    let target = point(10.0, -5.0, 2.0);

    let accepted = gateway
        .move_to(&mut queue, MotionRequest::linear(target.clone(), 800.0).with_line_number(7))
        .unwrap();
    assert_eq!(accepted, 1);
    assert_eq!(gateway.position(), target);

    let segment = queue.pop().unwrap();
    assert_eq!(segment.line_number, Some(7));
    assert!((segment.feed_rate - 800.0).abs() < 1e-9);
}

#[test]
fn test_zero_length_move_enqueues_nothing() {
    let mut gateway = gateway(KinematicsSettings::Cartesian);
    let mut queue = SegmentQueue::default();
    let here = gateway.position();
    assert_eq!(
        gateway
            .move_to(&mut queue, MotionRequest::linear(here, 500.0))
            .unwrap(),
        0
    );
    assert!(queue.is_empty());
}

#[test]
fn test_infeasible_target_produces_no_segments() {
    let mut gateway = delta_at(point(0.0, 0.0, -120.0));
    let before = gateway.motor_position().clone();
    let mut queue = SegmentQueue::default();

    // Beyond the horizontal reach: caught by the pre-check
    let error = gateway
        .move_to(&mut queue, MotionRequest::linear(point(500.0, 0.0, -120.0), 500.0))
        .unwrap_err();
    assert!(matches!(error, MotionError::InvalidTarget { .. }));

    // Within the reach bound but outside the crank range
    let error = gateway
        .move_to(&mut queue, MotionRequest::linear(point(150.0, 0.0, -120.0), 500.0))
        .unwrap_err();
    assert!(matches!(
        error,
        MotionError::Kinematics(KinematicsError::Infeasible { .. })
    ));

    assert!(queue.is_empty());
    assert_eq!(gateway.motor_position(), &before);
}

#[test]
fn test_planner_not_ready_leaves_position() {
    let mut gateway = gateway(KinematicsSettings::Cartesian);
    let mut queue = SegmentQueue::default();
    queue.set_not_ready("door open");
    let before = gateway.position();

    let error = gateway
        .move_to(&mut queue, MotionRequest::linear(point(1.0, 1.0, 1.0), 500.0))
        .unwrap_err();
    assert_eq!(
        error,
        MotionError::PlannerRejected {
            segment: 0,
            source: PlannerError::NotReady {
                reason: "door open".to_string()
            }
        }
    );
    assert_eq!(gateway.position(), before);
}

#[test]
fn test_queue_full_keeps_accepted_segments() {
    let mut gateway = delta_at(point(-30.0, 0.0, -130.0));
    let mut queue = SegmentQueue::with_capacity(2);

    let error = gateway
        .move_to(&mut queue, MotionRequest::linear(point(30.0, 0.0, -130.0), 1000.0))
        .unwrap_err();
    assert!(matches!(
        error,
        MotionError::PlannerRejected {
            segment: 2,
            source: PlannerError::QueueFull
        }
    ));
    assert_eq!(queue.len(), 2);

    let last = queue.segments().last().unwrap();
    assert_eq!(gateway.motor_position(), &last.motors);
    assert!(gateway.position().approx_eq(&last.target, 1e-6));
}

struct CancellingPlanner {
    queue: SegmentQueue,
    handle: JogHandle,
    cancel_after: usize,
}

impl Planner for CancellingPlanner {
    fn enqueue(&mut self, segment: PlannerSegment) -> Result<(), PlannerError> {
        self.queue.enqueue(segment)?;
        if self.queue.len() == self.cancel_after {
            self.handle.cancel();
        }
        Ok(())
    }
}

#[test]
fn test_superseded_jog_stops_quietly() {
    let mut gateway = delta_at(point(-30.0, 0.0, -130.0));
    let mut planner = CancellingPlanner {
        queue: SegmentQueue::with_capacity(4096),
        handle: gateway.jog_handle(),
        cancel_after: 2,
    };

    let accepted = gateway
        .move_to(&mut planner, MotionRequest::jog(point(30.0, 0.0, -130.0), 1000.0))
        .unwrap();
    assert_eq!(accepted, 2);
    assert_eq!(planner.queue.len(), 2);
    assert!(planner.queue.segments().all(|segment| segment.is_jog));
    assert!(gateway.position()[0] < 30.0);

    // The next jog runs to completion
    let accepted = gateway
        .move_to(
            &mut SegmentQueue::with_capacity(4096),
            MotionRequest::jog(point(0.0, 0.0, -130.0), 1000.0),
        )
        .unwrap();
    assert!(accepted >= 1);
    assert!(gateway.position().approx_eq(&point(0.0, 0.0, -130.0), 1e-6));
}

#[test]
fn test_delta_jog_clamped_instead_of_rejected() {
    let mut gateway = delta_at(point(0.0, 0.0, -120.0));
    let mut queue = SegmentQueue::with_capacity(4096);
    let accepted = gateway
        .move_to(&mut queue, MotionRequest::jog(point(400.0, 0.0, -120.0), 2000.0))
        .unwrap();
    assert!(accepted >= 1);

    let position = gateway.position();
    assert!(position[0] > 50.0 && position[0] < 400.0);
    assert!(gateway
        .transform_cartesian_to_motors(&point(position[0] + 1e-3, 0.0, -120.0))
        .is_err());
}

#[test]
fn test_cartesian_arc() {
    let mut gateway = gateway(KinematicsSettings::Cartesian);
    let mut queue = SegmentQueue::with_capacity(4096);
    gateway
        .move_to(&mut queue, MotionRequest::linear(point(10.0, 0.0, 0.0), 500.0))
        .unwrap();

    let arc = ArcSpec {
        center: [0.0, 0.0],
        radius: 10.0,
        plane: ArcPlane::XY,
        clockwise: false,
    };
    let accepted = gateway
        .arc_to(&mut queue, MotionRequest::linear(point(0.0, 10.0, 0.0), 500.0), &arc)
        .unwrap();
    assert!(accepted > 10);
    assert!(gateway.position().approx_eq(&point(0.0, 10.0, 0.0), 1e-9));

    // End point off the circle
    let error = gateway
        .arc_to(&mut queue, MotionRequest::linear(point(3.0, 3.0, 0.0), 500.0), &arc)
        .unwrap_err();
    assert!(matches!(error, MotionError::InvalidArc { .. }));
}

#[test]
fn test_delta_arc_outside_workspace() {
    let mut gateway = delta_at(point(20.0, 0.0, -130.0));
    let mut queue = SegmentQueue::with_capacity(4096);
    let before = gateway.motor_position().clone();

    let arc = ArcSpec {
        center: [-90.0, 0.0],
        radius: 110.0,
        plane: ArcPlane::XY,
        clockwise: false,
    };
    let error = gateway
        .arc_to(&mut queue, MotionRequest::linear(point(20.0, 0.0, -130.0), 500.0), &arc)
        .unwrap_err();
    assert!(matches!(error, MotionError::InvalidArc { .. }));
    assert!(queue.is_empty());
    assert_eq!(gateway.motor_position(), &before);
}

#[test]
fn test_homing_through_gateway() {
    let mut gateway = gateway(KinematicsSettings::Cartesian);
    let mut queue = SegmentQueue::default();
    gateway
        .move_to(&mut queue, MotionRequest::linear(point(-20.0, -20.0, -50.0), 500.0))
        .unwrap();

    let cycles = gateway.resolve_homing("").unwrap();
    assert_eq!(cycles, vec![AxisMask::bit(2), AxisMask::from_bits(0b011)]);

    let z = cycles[0];
    let start = gateway.start_homing(z, &SafetyInputs::clear()).unwrap();
    assert!(matches!(start, CycleStart::Plan(_)));

    let step = gateway
        .homing_step(HomingPoll {
            limited: MotorMask::motor(2, 0),
            ..HomingPoll::default()
        })
        .unwrap();
    assert!(matches!(step, HomingStep::Done(_)));
    assert_eq!(gateway.position(), point(-20.0, -20.0, 0.0));
    assert!(gateway.homing_state().is_homed(z));

    gateway.reset();
    assert!(gateway.homing_state().homed().is_empty());
}

#[test]
fn test_delta_moves_after_homing() {
    let config = MachineConfig {
        kinematics: KinematicsSettings::ParallelDelta(DeltaSettings::default()),
        axes: vec![
            AxisSettings::new("X", 1.6, 1),
            AxisSettings::new("Y", 1.6, 1),
            AxisSettings::new("Z", 1.6, 1),
        ],
        ..MachineConfig::default()
    };
    let mut gateway = MotionGateway::from_config(&config, &KinematicsRegistry::new()).unwrap();
    let arms = AxisMask::all(3);

    let start = gateway.start_homing(arms, &SafetyInputs::clear()).unwrap();
    assert!(matches!(start, CycleStart::Plan(_)));
    let step = gateway
        .homing_step(HomingPoll {
            limited: MotorMask::motor(0, 0) | MotorMask::motor(1, 0) | MotorMask::motor(2, 0),
            ..HomingPoll::default()
        })
        .unwrap();
    assert!(matches!(step, HomingStep::Done(_)));

    // Cranks rest exactly on the edge of their range
    let homing_angle = DeltaSettings::default().homing_angle_rad;
    assert!(gateway
        .motor_position()
        .values()
        .iter()
        .all(|theta| *theta == homing_angle));

    let home = gateway.position();
    let target = point(home[0], home[1], home[2] - 20.0);
    let mut queue = SegmentQueue::with_capacity(4096);
    let accepted = gateway
        .move_to(&mut queue, MotionRequest::linear(target.clone(), 1000.0))
        .unwrap();
    assert!(accepted >= 1);
    assert!(gateway.position().approx_eq(&target, 1e-6));
}

#[test]
fn test_too_many_axes_rejected() {
    let config = MachineConfig {
        axes: (0..7).map(|_| AxisSettings::new("X", 10.0, 1)).collect(),
        ..MachineConfig::default()
    };
    assert!(matches!(
        MotionGateway::from_config(&config, &KinematicsRegistry::new()),
        Err(ConfigurationError::InvalidAxes { .. })
    ));
}

#[test]
fn test_invalid_configuration_rejected() {
    let mut config = MachineConfig::default();
    config.motion.arc_tolerance_mm = 0.0;
    assert!(matches!(
        MotionGateway::from_config(&config, &KinematicsRegistry::new()),
        Err(ConfigurationError::InvalidTolerance { .. })
    ));

    let config = MachineConfig {
        kinematics: KinematicsSettings::ParallelDelta(DeltaSettings {
            crank_mm: 0.0,
            ..DeltaSettings::default()
        }),
        ..MachineConfig::default()
    };
    assert!(matches!(
        MotionGateway::from_config(&config, &KinematicsRegistry::new()),
        Err(ConfigurationError::InvalidGeometry { .. })
    ));
}
