//! Rotary three-arm parallel delta
//!
//! Channels 0..3 hold crank angles in radians, measured from horizontal and
//! positive downward. The crank of arm 1 swings in the YZ plane on the −Y
//! side of the base; arms 2 and 3 sit at ±120° from it. The origin is the
//! center of the base triangle and the effector works below it (z < 0).
//! Axes beyond Z map one to one.

use super::{require_all, KinematicSystem, LimitOutcome};
use motionkit_core::{
    ArcSpec, AxisLayout, AxisMask, CartesianPosition, ConfigurationError, KinematicsError,
    MotionRequest, MotorMask, MotorPosition,
};
use motionkit_settings::DeltaSettings;
use std::f64::consts::PI;

const SQRT3: f64 = 1.732_050_807_568_877_2;
const SIN30: f64 = 0.5;
const TAN30: f64 = 1.0 / SQRT3;
const TAN60: f64 = SQRT3;
const SIN120: f64 = SQRT3 / 2.0;
const COS120: f64 = -0.5;

/// Crank channels
const ARMS: usize = 3;

/// Bisection steps when clipping a jog to the workspace boundary
const JOG_BISECTION_STEPS: usize = 64;

/// Arc points checked by [`ParallelDelta::invalid_arc`] per quarter turn
const ARC_SAMPLES_PER_QUADRANT: usize = 16;

/// Round-off allowed on the crank angle range; the homing angle sits on its edge
const ANGLE_TOLERANCE: f64 = 1e-6;

/// Seek distance multiplier for the crank approach
const HOMING_SEEK_SCALER: f64 = 1.1;

fn arm_axes() -> AxisMask {
    AxisMask::all(ARMS)
}

/// Rotary delta geometry
#[derive(Debug, Clone)]
pub struct ParallelDelta {
    crank: f64,
    base: f64,
    arm: f64,
    effector: f64,
    min_angle: f64,
    max_angle: f64,
    homing_angle: f64,
}

impl Default for ParallelDelta {
    fn default() -> Self {
        Self::from_settings(&DeltaSettings::default())
    }
}

impl ParallelDelta {
    pub fn from_settings(settings: &DeltaSettings) -> Self {
        Self {
            crank: settings.crank_mm,
            base: settings.base_triangle_mm,
            arm: settings.arm_mm,
            effector: settings.effector_triangle_mm,
            min_angle: settings.max_negative_angle_rad,
            max_angle: settings.max_positive_angle_rad,
            homing_angle: settings.homing_angle_rad,
        }
    }

    /// Upper bound on the horizontal distance of the effector from the center
    pub fn max_reach(&self) -> f64 {
        (self.base - self.effector) * TAN30 / 2.0 + self.crank + self.arm
    }

    /// Crank angle for the arm in the YZ plane, `None` when out of reach
    fn crank_angle(&self, x0: f64, y0: f64, z0: f64) -> Option<f64> {
        let (rf, re) = (self.crank, self.arm);
        let y1 = -0.5 * TAN30 * self.base;
        let y0 = y0 - 0.5 * TAN30 * self.effector;

        let a = (x0 * x0 + y0 * y0 + z0 * z0 + rf * rf - re * re - y1 * y1) / (2.0 * z0);
        let b = (y1 - y0) / z0;
        let d = -(a + b * y1) * (a + b * y1) + rf * (b * b * rf + rf);
        if d < 0.0 {
            return None;
        }

        let yj = (y1 - a * b - d.sqrt()) / (b * b + 1.0);
        let zj = a + b * yj;
        let theta = (-zj / (y1 - yj)).atan() + if yj > y1 { PI } else { 0.0 };
        theta.is_finite().then_some(theta)
    }

    /// Effector position for three crank angles
    ///
    /// Returns the position and whether the arm spheres actually intersect.
    fn effector_position(&self, theta: [f64; ARMS]) -> ([f64; 3], bool) {
        let (rf, re) = (self.crank, self.arm);
        let t = (self.base - self.effector) * TAN30 / 2.0;

        let y1 = -(t + rf * theta[0].cos());
        let z1 = -rf * theta[0].sin();

        let y2 = (t + rf * theta[1].cos()) * SIN30;
        let x2 = y2 * TAN60;
        let z2 = -rf * theta[1].sin();

        let y3 = (t + rf * theta[2].cos()) * SIN30;
        let x3 = -y3 * TAN60;
        let z3 = -rf * theta[2].sin();

        let dnm = (y2 - y1) * x3 - (y3 - y1) * x2;
        if dnm.abs() < f64::EPSILON {
            return ([0.0, 0.0, z1], false);
        }

        let w1 = y1 * y1 + z1 * z1;
        let w2 = x2 * x2 + y2 * y2 + z2 * z2;
        let w3 = x3 * x3 + y3 * y3 + z3 * z3;

        // x = (a1·z + b1) / dnm
        let a1 = (z2 - z1) * (y3 - y1) - (z3 - z1) * (y2 - y1);
        let b1 = -((w2 - w1) * (y3 - y1) - (w3 - w1) * (y2 - y1)) / 2.0;

        // y = (a2·z + b2) / dnm
        let a2 = -(z2 - z1) * x3 + (z3 - z1) * x2;
        let b2 = ((w2 - w1) * x3 - (w3 - w1) * x2) / 2.0;

        // a·z² + b·z + c = 0
        let a = a1 * a1 + a2 * a2 + dnm * dnm;
        let b = 2.0 * (a1 * b1 + a2 * (b2 - y1 * dnm) - z1 * dnm * dnm);
        let c = (b2 - y1 * dnm) * (b2 - y1 * dnm) + b1 * b1 + dnm * dnm * (z1 * z1 - re * re);

        let d = b * b - 4.0 * a * c;
        let solvable = d >= 0.0;
        let z0 = -0.5 * (b + d.max(0.0).sqrt()) / a;
        let x0 = (a1 * z0 + b1) / dnm;
        let y0 = (a2 * z0 + b2) / dnm;
        ([x0, y0, z0], solvable)
    }

    fn reachable(&self, position: &CartesianPosition) -> bool {
        !self.invalid_line(position) && self.inverse(position).is_ok()
    }

    fn infeasible(&self, target: &CartesianPosition, reason: String) -> KinematicsError {
        KinematicsError::Infeasible {
            kinematics: self.name().to_string(),
            target: target.to_string(),
            reason,
        }
    }
}

impl KinematicSystem for ParallelDelta {
    fn name(&self) -> &str {
        "parallel_delta"
    }

    fn init(&mut self, layout: &AxisLayout) -> Result<(), ConfigurationError> {
        if layout.n_axis() < ARMS {
            return Err(ConfigurationError::TooFewAxes {
                kinematics: self.name().to_string(),
                required: ARMS,
                configured: layout.n_axis(),
            });
        }

        for (param, value) in [
            ("crank_mm", self.crank),
            ("base_triangle_mm", self.base),
            ("arm_mm", self.arm),
            ("effector_triangle_mm", self.effector),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigurationError::geometry(param, "must be > 0"));
            }
        }
        if self.crank >= self.arm {
            return Err(ConfigurationError::geometry(
                "crank_mm",
                "must be shorter than arm_mm",
            ));
        }
        if !(self.min_angle > -PI && self.max_angle < PI && self.min_angle < self.max_angle) {
            return Err(ConfigurationError::geometry(
                "max_negative_angle_rad",
                "angle range must be non-empty and within ±π",
            ));
        }
        if !(self.min_angle..=self.max_angle).contains(&self.homing_angle) {
            return Err(ConfigurationError::geometry(
                "homing_angle_rad",
                "must lie within the crank angle range",
            ));
        }

        let (rest, solvable) = self.effector_position([0.0; ARMS]);
        if !solvable {
            return Err(ConfigurationError::geometry(
                "arm_mm",
                "arms cannot meet the effector with horizontal cranks",
            ));
        }

        tracing::info!(
            "Parallel delta: crank {} arm {} base {} effector {}, rest z {:.3}",
            self.crank,
            self.arm,
            self.base,
            self.effector,
            rest[2]
        );
        Ok(())
    }

    fn inverse(&self, target: &CartesianPosition) -> Result<MotorPosition, KinematicsError> {
        if target.len() < ARMS {
            return Err(KinematicsError::AxisCountMismatch {
                expected: ARMS,
                actual: target.len(),
            });
        }

        let (x, y, z) = (target[0], target[1], target[2]);
        if z.abs() < 1e-9 {
            return Err(KinematicsError::Singularity {
                kinematics: self.name().to_string(),
                target: target.to_string(),
            });
        }
        if z > 0.0 {
            return Err(self.infeasible(target, "above the base plane".to_string()));
        }

        let arms = [
            (x, y),
            (x * COS120 + y * SIN120, y * COS120 - x * SIN120),
            (x * COS120 - y * SIN120, y * COS120 + x * SIN120),
        ];

        let mut motors = target.values().to_vec();
        for (index, (xr, yr)) in arms.into_iter().enumerate() {
            let theta = self
                .crank_angle(xr, yr, z)
                .ok_or_else(|| self.infeasible(target, format!("arm {} out of reach", index + 1)))?;
            if theta < self.min_angle - ANGLE_TOLERANCE
                || theta > self.max_angle + ANGLE_TOLERANCE
            {
                return Err(self.infeasible(
                    target,
                    format!(
                        "arm {} angle {:.4} outside [{}, {}]",
                        index + 1,
                        theta,
                        self.min_angle,
                        self.max_angle
                    ),
                ));
            }
            motors[index] = theta.clamp(self.min_angle, self.max_angle);
        }

        Ok(MotorPosition::new(motors))
    }

    fn forward(&self, motors: &MotorPosition, n_axis: usize) -> CartesianPosition {
        let mut values = motors.values().to_vec();
        values.resize(n_axis.max(ARMS), 0.0);

        let (position, solvable) = self.effector_position([values[0], values[1], values[2]]);
        if !solvable {
            tracing::warn!("Delta forward kinematics has no exact solution for {}", motors);
        }

        values[..ARMS].copy_from_slice(&position);
        values.truncate(n_axis);
        CartesianPosition::new(values)
    }

    fn constrain_jog(&self, request: &mut MotionRequest, current: &CartesianPosition) {
        if self.reachable(&request.target) || !self.reachable(current) {
            return;
        }

        // Last reachable fraction of the jog
        let (mut low, mut high) = (0.0_f64, 1.0_f64);
        for _ in 0..JOG_BISECTION_STEPS {
            let mid = 0.5 * (low + high);
            if self.reachable(&current.lerp(&request.target, mid)) {
                low = mid;
            } else {
                high = mid;
            }
        }

        let clipped = current.lerp(&request.target, low);
        tracing::debug!(
            "Jog to {} clipped to {} at the workspace boundary",
            request.target,
            clipped
        );
        request.target = clipped;
    }

    fn invalid_line(&self, target: &CartesianPosition) -> bool {
        if target.len() < ARMS {
            return true;
        }
        let radius = target[0].hypot(target[1]);
        target[2] >= 0.0 || radius > self.max_reach()
    }

    fn invalid_arc(
        &self,
        start: &CartesianPosition,
        target: &CartesianPosition,
        arc: &ArcSpec,
    ) -> bool {
        if !(arc.radius.is_finite() && arc.radius > 0.0) {
            return true;
        }
        let sweep = arc.sweep(start, target);
        let quadrants = (sweep.abs() / (PI / 2.0)).ceil().max(1.0) as usize;
        let samples = quadrants * ARC_SAMPLES_PER_QUADRANT;

        (1..=samples).any(|i| {
            let t = i as f64 / samples as f64;
            !self.reachable(&arc.point_at(start, target, sweep, t))
        })
    }

    fn can_home(&self, axes: AxisMask) -> bool {
        let requested = axes & arm_axes();
        requested.is_empty() || requested == arm_axes()
    }

    fn limit_reached(&self, axes: AxisMask, motors: MotorMask, limited: MotorMask) -> LimitOutcome {
        let outcome = require_all(axes, motors, limited);
        if !outcome.axes.intersects(arm_axes()) {
            return outcome;
        }

        // The effector only settles once every crank has reported
        let pending = outcome.axes | (axes & arm_axes());
        LimitOutcome {
            axes: pending,
            motors: outcome.motors,
            reached: axes - pending,
            stop: false,
        }
    }

    fn homing_approach(&self, axes: AxisMask, directions: &CartesianPosition) -> MotorPosition {
        let mut approach = directions.values().to_vec();
        let seek = (self.max_angle - self.min_angle) * HOMING_SEEK_SCALER;
        let crank = if axes.intersects(arm_axes()) { -seek } else { 0.0 };
        for channel in approach.iter_mut().take(ARMS) {
            *channel = crank;
        }
        MotorPosition::new(approach)
    }

    fn homed_motor_position(
        &self,
        axes: AxisMask,
        current: &MotorPosition,
        mpos: &CartesianPosition,
    ) -> Result<MotorPosition, KinematicsError> {
        let mut motors = current.values().to_vec();
        let len = motors.len();
        for axis in axes.iter().filter(|&axis| axis < len) {
            motors[axis] = if axis < ARMS {
                self.homing_angle
            } else {
                mpos.axis(axis)
            };
        }
        Ok(MotorPosition::new(motors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta() -> ParallelDelta {
        let mut delta = ParallelDelta::default();
        delta.init(&AxisLayout::single(3)).unwrap();
        delta
    }

    #[test]
    fn test_rest_pose() {
        let delta = delta();
        let p = delta.forward(&MotorPosition::zeros(3), 3);
        assert!(p[0].abs() < 1e-9);
        assert!(p[1].abs() < 1e-9);
        assert!((p[2] + 91.93).abs() < 0.05, "rest z {}", p[2]);
    }

    #[test]
    fn test_center_pose_angles_equal() {
        let delta = delta();
        let motors = delta
            .inverse(&CartesianPosition::new(vec![0.0, 0.0, -120.0]))
            .unwrap();
        assert!((motors[0] - 0.348).abs() < 0.01, "theta {}", motors[0]);
        assert!((motors[0] - motors[1]).abs() < 1e-9);
        assert!((motors[0] - motors[2]).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip() {
        let delta = delta();
        for p in [
            vec![0.0, 0.0, -150.0],
            vec![30.0, -20.0, -130.0],
            vec![-45.0, 10.0, -170.0],
        ] {
            let p = CartesianPosition::new(p);
            let motors = delta.inverse(&p).unwrap();
            assert!(delta.forward(&motors, 3).approx_eq(&p, 1e-6), "{}", p);
        }
    }

    #[test]
    fn test_unreachable_targets() {
        let delta = delta();
        let far = CartesianPosition::new(vec![500.0, 0.0, -120.0]);
        assert!(matches!(
            delta.inverse(&far),
            Err(KinematicsError::Infeasible { .. })
        ));
        assert!(delta.invalid_line(&far));

        let base_plane = CartesianPosition::new(vec![0.0, 0.0, 0.0]);
        assert!(matches!(
            delta.inverse(&base_plane),
            Err(KinematicsError::Singularity { .. })
        ));
    }

    #[test]
    fn test_geometry_validation() {
        let layout = AxisLayout::single(3);

        let mut bad = ParallelDelta::from_settings(&DeltaSettings {
            arm_mm: -1.0,
            ..DeltaSettings::default()
        });
        assert!(bad.init(&layout).is_err());

        let mut bad = ParallelDelta::from_settings(&DeltaSettings {
            crank_mm: 200.0,
            ..DeltaSettings::default()
        });
        assert!(bad.init(&layout).is_err());

        let mut short = ParallelDelta::default();
        assert!(matches!(
            short.init(&AxisLayout::single(2)),
            Err(ConfigurationError::TooFewAxes { .. })
        ));
    }

    #[test]
    fn test_can_home_only_all_arms() {
        let delta = delta();
        assert!(delta.can_home(AxisMask::all(3)));
        assert!(delta.can_home(AxisMask::all(4)));
        assert!(delta.can_home(AxisMask::bit(3)));
        assert!(!delta.can_home(AxisMask::bit(2)));
        assert!(!delta.can_home(AxisMask::from_bits(0b011)));
    }

    #[test]
    fn test_homed_position_at_homing_angle() {
        let delta = delta();
        let homed = delta
            .homed_motor_position(
                AxisMask::all(3),
                &MotorPosition::zeros(3),
                &CartesianPosition::zeros(3),
            )
            .unwrap();
        assert_eq!(homed, MotorPosition::new(vec![-0.75; 3]));
    }

    #[test]
    fn test_home_pose_inverts_on_range_edge() {
        let delta = delta();
        let home = delta.forward(&MotorPosition::new(vec![delta.homing_angle; 3]), 3);
        let motors = delta.inverse(&home).unwrap();
        for &theta in motors.values() {
            assert!(theta >= delta.min_angle && theta <= delta.max_angle);
            assert!((theta - delta.homing_angle).abs() < 1e-6, "theta {}", theta);
        }

        // Beyond round-off the range still holds
        let above = delta.forward(&MotorPosition::new(vec![delta.min_angle - 0.05; 3]), 3);
        assert!(matches!(
            delta.inverse(&above),
            Err(KinematicsError::Infeasible { .. })
        ));
    }
}
