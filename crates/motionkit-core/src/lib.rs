//! # MotionKit Core
//!
//! Core types shared by every MotionKit crate.
//! Provides the axis/motor bit masks, axis-space and motor-space
//! positions, transient motion requests and the error taxonomy.

pub mod data;
pub mod error;

pub use data::{
    axis_name, ArcPlane, ArcSpec, AxisLayout, AxisMask, CartesianPosition, MotionRequest, MotionType,
    MotorMask, MotorPosition, AXIS_NAMES, MAX_MOTORS_PER_AXIS, MAX_N_AXIS, MOTOR1_OFFSET,
};

pub use error::{
    ConfigurationError, Error, HomingError, KinematicsError, MotionError, PlannerError, Result,
};
