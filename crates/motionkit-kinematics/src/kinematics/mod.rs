//! Kinematic models
//!
//! A kinematic model maps logical axis space to motor space and back, and
//! decides how motor-level limit events translate into axis-level homing
//! outcomes. Variants:
//! - Cartesian: identity mapping, optional soft-limit clipping
//! - CoreXY: two belt motors mixed into X and Y
//! - ParallelDelta: rotary three-arm delta
//! - Custom: any [`KinematicSystem`] registered by name
//!
//! The active [`KinematicModel`] is built and initialised once by
//! [`crate::KinematicsRegistry`] and cannot be swapped afterwards.

pub mod cartesian;
pub mod corexy;
pub mod delta;

pub use cartesian::Cartesian;
pub use corexy::CoreXY;
pub use delta::ParallelDelta;

use motionkit_core::{
    ArcSpec, AxisLayout, AxisMask, CartesianPosition, ConfigurationError, KinematicsError,
    MotionRequest, MotorMask, MotorPosition,
};
use std::fmt;

/// Result of feeding limit events into [`KinematicSystem::limit_reached`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitOutcome {
    /// Axes still waiting for their limit
    pub axes: AxisMask,
    /// Motors that must keep moving
    pub motors: MotorMask,
    /// Axes satisfied by this report
    pub reached: AxisMask,
    /// Every axis of the processed set is satisfied
    pub stop: bool,
}

/// Motors of `motors` attached to one of `axes`
pub fn motors_on_axes(motors: MotorMask, axes: AxisMask) -> MotorMask {
    motors
        .iter()
        .filter(|&(axis, _)| axes.contains(axis))
        .fold(MotorMask::NONE, |mask, (axis, motor)| {
            mask | MotorMask::motor(axis, motor)
        })
}

/// Require-all limit handling: an axis is satisfied once none of its motors
/// remain active.
pub fn require_all(axes: AxisMask, motors: MotorMask, limited: MotorMask) -> LimitOutcome {
    let tripped = limited & motors;
    let motors = motors - tripped;
    let pending = axes & motors.axes();
    LimitOutcome {
        axes: pending,
        motors,
        reached: axes - pending,
        stop: pending.is_empty(),
    }
}

/// Behaviour of one machine geometry
///
/// Transform operations are pure functions of their inputs and the
/// calibration fixed by [`init`](KinematicSystem::init). Homing hooks are
/// side-effect free decision functions.
pub trait KinematicSystem: Send + Sync + fmt::Debug {
    /// Name used for reporting and factory lookup
    fn name(&self) -> &str;

    /// Validate geometry and precompute constants
    fn init(&mut self, _layout: &AxisLayout) -> Result<(), ConfigurationError> {
        Ok(())
    }

    /// Motor position assumed at power-up
    fn init_position(&self, n_axis: usize) -> MotorPosition {
        MotorPosition::zeros(n_axis)
    }

    /// Axis space to motor space
    fn inverse(&self, target: &CartesianPosition) -> Result<MotorPosition, KinematicsError>;

    /// Motor space to axis space
    fn forward(&self, motors: &MotorPosition, n_axis: usize) -> CartesianPosition;

    /// Clip a jog target to the reachable workspace along its direction
    fn constrain_jog(&self, _request: &mut MotionRequest, _current: &CartesianPosition) {}

    /// Cheap rejection of a line target without the full inverse
    fn invalid_line(&self, _target: &CartesianPosition) -> bool {
        false
    }

    /// Cheap rejection of an arc that cannot be segmented safely
    fn invalid_arc(
        &self,
        _start: &CartesianPosition,
        _target: &CartesianPosition,
        _arc: &ArcSpec,
    ) -> bool {
        false
    }

    /// Whether exactly this axis combination can be homed
    ///
    /// Variants opt in; a system that does not override this cannot be homed.
    fn can_home(&self, _axes: AxisMask) -> bool {
        false
    }

    /// Whether the variant homes these axes itself, without motor motion
    fn kinematics_homing(&self, _axes: AxisMask) -> bool {
        false
    }

    /// Motors driven while a homing cycle moves `axes`
    fn homing_motors(&self, axes: AxisMask, layout: &AxisLayout) -> MotorMask {
        layout.motors_for(axes)
    }

    /// Motors to release when `axes` are unlocked or finish homing
    fn release_motors(&self, axes: AxisMask, motors: MotorMask) -> MotorMask {
        motors_on_axes(motors, axes)
    }

    /// Translate tripped motors into satisfied axes
    fn limit_reached(&self, axes: AxisMask, motors: MotorMask, limited: MotorMask) -> LimitOutcome {
        require_all(axes, motors, limited)
    }

    /// Motor-space approach vector for a homing cycle
    ///
    /// `directions` holds the signed seek distance of each homed axis and
    /// zero elsewhere.
    fn homing_approach(&self, _axes: AxisMask, directions: &CartesianPosition) -> MotorPosition {
        self.inverse(directions)
            .unwrap_or_else(|_| MotorPosition::new(directions.values().to_vec()))
    }

    /// Motor position once `axes` sit on their home switches at `mpos`
    fn homed_motor_position(
        &self,
        axes: AxisMask,
        current: &MotorPosition,
        mpos: &CartesianPosition,
    ) -> Result<MotorPosition, KinematicsError> {
        let mut position = self.forward(current, current.len());
        let len = position.len();
        for axis in axes.iter().filter(|&axis| axis < len) {
            position[axis] = mpos.axis(axis);
        }
        self.inverse(&position)
    }

    /// Linear variants bypass line segmentation
    fn is_linear(&self) -> bool {
        false
    }
}

#[derive(Debug)]
enum Variant {
    Cartesian(Cartesian),
    CoreXY(CoreXY),
    ParallelDelta(ParallelDelta),
    Custom(Box<dyn KinematicSystem>),
}

/// The active kinematic model of a machine
///
/// Only [`crate::KinematicsRegistry`] creates models, and it initialises
/// them before handing them out.
#[derive(Debug)]
pub struct KinematicModel {
    variant: Variant,
    layout: AxisLayout,
}

impl KinematicModel {
    fn new(variant: Variant, layout: AxisLayout) -> Self {
        Self { variant, layout }
    }

    pub(crate) fn cartesian(system: Cartesian, layout: AxisLayout) -> Self {
        Self::new(Variant::Cartesian(system), layout)
    }

    pub(crate) fn corexy(system: CoreXY, layout: AxisLayout) -> Self {
        Self::new(Variant::CoreXY(system), layout)
    }

    pub(crate) fn parallel_delta(system: ParallelDelta, layout: AxisLayout) -> Self {
        Self::new(Variant::ParallelDelta(system), layout)
    }

    pub(crate) fn custom(system: Box<dyn KinematicSystem>, layout: AxisLayout) -> Self {
        Self::new(Variant::Custom(system), layout)
    }

    fn system(&self) -> &dyn KinematicSystem {
        match &self.variant {
            Variant::Cartesian(system) => system as &dyn KinematicSystem,
            Variant::CoreXY(system) => system,
            Variant::ParallelDelta(system) => system,
            Variant::Custom(system) => system.as_ref(),
        }
    }

    pub(crate) fn init(&mut self) -> Result<(), ConfigurationError> {
        let layout = self.layout;
        match &mut self.variant {
            Variant::Cartesian(system) => system.init(&layout),
            Variant::CoreXY(system) => system.init(&layout),
            Variant::ParallelDelta(system) => system.init(&layout),
            Variant::Custom(system) => system.init(&layout),
        }
    }

    fn check_axes(&self, len: usize) -> Result<(), KinematicsError> {
        if len != self.layout.n_axis() {
            return Err(KinematicsError::AxisCountMismatch {
                expected: self.layout.n_axis(),
                actual: len,
            });
        }
        Ok(())
    }

    /// Kinematics name
    pub fn name(&self) -> &str {
        self.system().name()
    }

    /// Axis-to-motor layout fixed at configuration
    pub fn layout(&self) -> &AxisLayout {
        &self.layout
    }

    /// Number of configured axes
    pub fn n_axis(&self) -> usize {
        self.layout.n_axis()
    }

    /// Power-up machine position
    pub fn init_position(&self) -> MotorPosition {
        self.system().init_position(self.layout.n_axis())
    }

    /// Axis space to motor space
    pub fn inverse(&self, target: &CartesianPosition) -> Result<MotorPosition, KinematicsError> {
        self.check_axes(target.len())?;
        self.system().inverse(target)
    }

    /// Motor space to axis space
    pub fn forward(&self, motors: &MotorPosition, n_axis: usize) -> CartesianPosition {
        self.system().forward(motors, n_axis)
    }

    /// Clip a jog target in place
    pub fn constrain_jog(&self, request: &mut MotionRequest, current: &CartesianPosition) {
        self.system().constrain_jog(request, current)
    }

    /// Cheap line pre-check
    pub fn invalid_line(&self, target: &CartesianPosition) -> bool {
        target.len() != self.layout.n_axis() || self.system().invalid_line(target)
    }

    /// Cheap arc pre-check
    pub fn invalid_arc(
        &self,
        start: &CartesianPosition,
        target: &CartesianPosition,
        arc: &ArcSpec,
    ) -> bool {
        self.system().invalid_arc(start, target, arc)
    }

    /// Whether exactly this axis combination can be homed
    pub fn can_home(&self, axes: AxisMask) -> bool {
        self.system().can_home(axes)
    }

    /// Whether the variant homes these axes itself
    pub fn kinematics_homing(&self, axes: AxisMask) -> bool {
        self.system().kinematics_homing(axes)
    }

    /// Motors a homing cycle on `axes` drives
    pub fn homing_motors(&self, axes: AxisMask) -> MotorMask {
        self.system().homing_motors(axes, &self.layout)
    }

    /// Motors to release for `axes`
    pub fn release_motors(&self, axes: AxisMask, motors: MotorMask) -> MotorMask {
        self.system().release_motors(axes, motors)
    }

    /// Translate tripped motors into satisfied axes
    pub fn limit_reached(
        &self,
        axes: AxisMask,
        motors: MotorMask,
        limited: MotorMask,
    ) -> LimitOutcome {
        self.system().limit_reached(axes, motors, limited)
    }

    /// Motor-space approach vector for a homing cycle
    pub fn homing_approach(&self, axes: AxisMask, directions: &CartesianPosition) -> MotorPosition {
        self.system().homing_approach(axes, directions)
    }

    /// Motor position once `axes` are homed
    pub fn homed_motor_position(
        &self,
        axes: AxisMask,
        current: &MotorPosition,
        mpos: &CartesianPosition,
    ) -> Result<MotorPosition, KinematicsError> {
        self.system().homed_motor_position(axes, current, mpos)
    }

    /// Whether line segmentation can be skipped
    pub fn is_linear(&self) -> bool {
        self.system().is_linear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_all_ignores_foreign_motors() {
        let y = AxisMask::bit(1);
        let motors = MotorMask::motor(1, 0) | MotorMask::motor(1, 1);

        // A report from X does not touch the Y group
        let outcome = require_all(y, motors, MotorMask::motor(0, 0));
        assert_eq!(outcome.motors, motors);
        assert!(!outcome.stop);

        let outcome = require_all(y, motors, MotorMask::motor(1, 1));
        assert_eq!(outcome.axes, y);
        assert_eq!(outcome.motors, MotorMask::motor(1, 0));
        assert!(outcome.reached.is_empty());

        let outcome = require_all(outcome.axes, outcome.motors, MotorMask::motor(1, 0));
        assert!(outcome.axes.is_empty());
        assert_eq!(outcome.reached, y);
        assert!(outcome.stop);
    }

    #[test]
    fn test_motors_on_axes() {
        let motors = MotorMask::motor(0, 0) | MotorMask::motor(1, 0) | MotorMask::motor(1, 1);
        let released = motors_on_axes(motors, AxisMask::bit(1));
        assert_eq!(released.to_string(), "Y0 Y1");
    }
}
