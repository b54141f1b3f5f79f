//! CoreXY kinematics
//!
//! Two belt motors on channels 0 and 1 move X and Y together:
//! `A = s·x + y`, `B = s·x − y`, where `s` is the X scaler (1 for CoreXY,
//! 0.5 for the midTbot arrangement). Other axes map one to one.
//!
//! Each of X and Y has its own limit switch, and both belts move whenever
//! either axis homes. A tripped X or Y switch therefore satisfies that axis
//! at once, and the belt motors keep running while the other one is still
//! pending.

use super::cartesian::SoftLimits;
use super::{motors_on_axes, require_all, KinematicSystem, LimitOutcome};
use motionkit_core::{
    AxisLayout, AxisMask, CartesianPosition, ConfigurationError, KinematicsError, MotionRequest,
    MotorMask, MotorPosition,
};

const X_AXIS: usize = 0;
const Y_AXIS: usize = 1;

fn belt_axes() -> AxisMask {
    AxisMask::bit(X_AXIS) | AxisMask::bit(Y_AXIS)
}

/// Belt-mixed X/Y kinematics
#[derive(Debug, Clone)]
pub struct CoreXY {
    x_scaler: f64,
    soft_limits: SoftLimits,
}

impl CoreXY {
    pub fn new(x_scaler: f64, soft_limits: SoftLimits) -> Self {
        Self {
            x_scaler,
            soft_limits,
        }
    }
}

impl Default for CoreXY {
    fn default() -> Self {
        Self::new(1.0, SoftLimits::none())
    }
}

impl KinematicSystem for CoreXY {
    fn name(&self) -> &str {
        "corexy"
    }

    fn init(&mut self, layout: &AxisLayout) -> Result<(), ConfigurationError> {
        if layout.n_axis() < 2 {
            return Err(ConfigurationError::TooFewAxes {
                kinematics: self.name().to_string(),
                required: 2,
                configured: layout.n_axis(),
            });
        }
        if !(self.x_scaler.is_finite() && self.x_scaler > 0.0) {
            return Err(ConfigurationError::geometry("x_scaler", "must be > 0"));
        }
        if layout.ganged().intersects(belt_axes()) {
            return Err(ConfigurationError::InvalidAxes {
                reason: "CoreXY belt axes cannot be ganged".to_string(),
            });
        }
        self.soft_limits.validate(layout)?;

        tracing::info!("CoreXY kinematics, x scaler {}", self.x_scaler);
        Ok(())
    }

    fn inverse(&self, target: &CartesianPosition) -> Result<MotorPosition, KinematicsError> {
        if target.len() < 2 {
            return Err(KinematicsError::AxisCountMismatch {
                expected: 2,
                actual: target.len(),
            });
        }
        let mut motors = target.values().to_vec();
        let x = target.axis(X_AXIS) * self.x_scaler;
        let y = target.axis(Y_AXIS);
        motors[X_AXIS] = x + y;
        motors[Y_AXIS] = x - y;
        Ok(MotorPosition::new(motors))
    }

    fn forward(&self, motors: &MotorPosition, n_axis: usize) -> CartesianPosition {
        let mut values = motors.values().to_vec();
        values.resize(n_axis.max(2), 0.0);
        let a = values[X_AXIS];
        let b = values[Y_AXIS];
        values[X_AXIS] = (a + b) / (2.0 * self.x_scaler);
        values[Y_AXIS] = (a - b) / 2.0;
        values.truncate(n_axis);
        CartesianPosition::new(values)
    }

    fn constrain_jog(&self, request: &mut MotionRequest, current: &CartesianPosition) {
        self.soft_limits.clip_jog(request, current);
    }

    fn invalid_line(&self, target: &CartesianPosition) -> bool {
        !self.soft_limits.contains(target)
    }

    fn can_home(&self, _axes: AxisMask) -> bool {
        true
    }

    fn homing_motors(&self, axes: AxisMask, layout: &AxisLayout) -> MotorMask {
        if axes.intersects(belt_axes()) {
            layout.motors_for(axes | belt_axes())
        } else {
            layout.motors_for(axes)
        }
    }

    fn release_motors(&self, axes: AxisMask, motors: MotorMask) -> MotorMask {
        // Either belt axis holds both belt motors
        if axes.intersects(belt_axes()) {
            motors_on_axes(motors, axes | belt_axes())
        } else {
            motors_on_axes(motors, axes)
        }
    }

    fn limit_reached(&self, axes: AxisMask, motors: MotorMask, limited: MotorMask) -> LimitOutcome {
        let belts = motors_on_axes(motors, belt_axes());
        let others = require_all(axes - belt_axes(), motors - belts, limited);

        let tripped = (limited & belts).axes();
        let pending_belts = (axes & belt_axes()) - tripped;
        let belts = if pending_belts.is_empty() {
            MotorMask::NONE
        } else {
            belts
        };

        let pending = others.axes | pending_belts;
        LimitOutcome {
            axes: pending,
            motors: others.motors | belts,
            reached: axes - pending,
            stop: pending.is_empty(),
        }
    }

    fn is_linear(&self) -> bool {
        true
    }
}
