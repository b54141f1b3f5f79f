//! # MotionKit Kinematics
//!
//! Kinematic models for Cartesian, CoreXY, parallel delta and custom
//! machines, tolerance-bounded line segmentation and jog clamping.

pub mod jog;
pub mod kinematics;
pub mod registry;
pub mod segmenter;

pub use jog::{JogGuard, JogHandle, JogTicket};
pub use kinematics::{
    cartesian::SoftLimits, motors_on_axes, require_all, Cartesian, CoreXY, KinematicModel,
    KinematicSystem, LimitOutcome, ParallelDelta,
};
pub use registry::{
    KinematicsConstructor, KinematicsParams, KinematicsRegistry, BUILTIN_KINEMATICS,
};
pub use segmenter::{MotorSegment, Segmenter, MIN_MOVE_LENGTH};
