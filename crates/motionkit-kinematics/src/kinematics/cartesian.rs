//! Cartesian kinematics: motor channel n drives axis n

use super::KinematicSystem;
use motionkit_core::{
    AxisLayout, AxisMask, CartesianPosition, ConfigurationError, KinematicsError, MotionRequest,
    MotorPosition,
};

/// Per-axis travel ranges enforced on lines and jogs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoftLimits {
    ranges: Vec<Option<(f64, f64)>>,
}

impl SoftLimits {
    /// Ranges indexed by axis, `None` where soft limits are off
    pub fn new(ranges: Vec<Option<(f64, f64)>>) -> Self {
        Self { ranges }
    }

    /// No limits on any axis
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether any axis has a range
    pub fn is_enabled(&self) -> bool {
        self.ranges.iter().any(Option::is_some)
    }

    pub(crate) fn validate(&self, layout: &AxisLayout) -> Result<(), ConfigurationError> {
        if self.ranges.len() > layout.n_axis() {
            return Err(ConfigurationError::InvalidAxes {
                reason: format!(
                    "{} soft limit ranges for {} axes",
                    self.ranges.len(),
                    layout.n_axis()
                ),
            });
        }
        for (axis, range) in self.ranges.iter().enumerate() {
            if let Some((min, max)) = range {
                if !(min.is_finite() && max.is_finite() && min < max) {
                    return Err(ConfigurationError::InvalidAxes {
                        reason: format!(
                            "soft limit range of {} is empty",
                            motionkit_core::axis_name(axis)
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    fn limits(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.ranges
            .iter()
            .enumerate()
            .filter_map(|(axis, range)| range.map(|(min, max)| (axis, min, max)))
    }

    /// Whether the position lies inside every enabled range
    pub fn contains(&self, position: &CartesianPosition) -> bool {
        self.limits().all(|(axis, min, max)| {
            let value = position.axis(axis);
            value >= min && value <= max
        })
    }

    /// Shorten a jog so it stops on the first range boundary it crosses
    pub fn clip_jog(&self, request: &mut MotionRequest, current: &CartesianPosition) {
        if self.contains(&request.target) {
            return;
        }

        let mut scale = 1.0_f64;
        for (axis, min, max) in self.limits() {
            let from = current.axis(axis);
            let delta = request.target.axis(axis) - from;
            if delta > 0.0 && from + delta > max {
                scale = scale.min(((max - from) / delta).max(0.0));
            } else if delta < 0.0 && from + delta < min {
                scale = scale.min(((min - from) / delta).max(0.0));
            }
        }

        let mut clipped = current.lerp(&request.target, scale);
        for (axis, min, max) in self.limits() {
            if axis < clipped.len() {
                clipped[axis] = clipped[axis].clamp(min, max);
            }
        }

        tracing::debug!("Jog clipped to soft limits: {}", clipped);
        request.target = clipped;
    }
}

/// Identity kinematics
#[derive(Debug, Clone, Default)]
pub struct Cartesian {
    soft_limits: SoftLimits,
}

impl Cartesian {
    pub fn new(soft_limits: SoftLimits) -> Self {
        Self { soft_limits }
    }
}

impl KinematicSystem for Cartesian {
    fn name(&self) -> &str {
        "cartesian"
    }

    fn init(&mut self, layout: &AxisLayout) -> Result<(), ConfigurationError> {
        self.soft_limits.validate(layout)
    }

    fn inverse(&self, target: &CartesianPosition) -> Result<MotorPosition, KinematicsError> {
        Ok(MotorPosition::new(target.values().to_vec()))
    }

    fn forward(&self, motors: &MotorPosition, n_axis: usize) -> CartesianPosition {
        let mut values = motors.values().to_vec();
        values.resize(n_axis, 0.0);
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

    fn is_linear(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limited() -> Cartesian {
        Cartesian::new(SoftLimits::new(vec![
            Some((-100.0, 0.0)),
            Some((-100.0, 0.0)),
            None,
        ]))
    }

    #[test]
    fn test_identity_round_trip() {
        let cartesian = Cartesian::default();
        let p = CartesianPosition::new(vec![1.5, -2.0, 3.25]);
        let motors = cartesian.inverse(&p).unwrap();
        assert_eq!(cartesian.forward(&motors, 3), p);
    }

    #[test]
    fn test_invalid_line_outside_soft_limits() {
        let cartesian = limited();
        assert!(!cartesian.invalid_line(&CartesianPosition::new(vec![-10.0, -10.0, 50.0])));
        assert!(cartesian.invalid_line(&CartesianPosition::new(vec![5.0, -10.0, 0.0])));
    }

    #[test]
    fn test_jog_clipped_along_direction() {
        let cartesian = limited();
        let current = CartesianPosition::new(vec![-50.0, -50.0, 0.0]);
        let mut request = MotionRequest::jog(CartesianPosition::new(vec![50.0, 0.0, 10.0]), 1000.0);
        cartesian.constrain_jog(&mut request, &current);

        // X hits the boundary halfway, every axis stops at the same fraction
        assert!(request.target.approx_eq(&CartesianPosition::new(vec![0.0, -25.0, 5.0]), 1e-9));
    }

    #[test]
    fn test_jog_inside_limits_untouched() {
        let cartesian = limited();
        let target = CartesianPosition::new(vec![-1.0, -1.0, 400.0]);
        let mut request = MotionRequest::jog(target.clone(), 1000.0);
        cartesian.constrain_jog(&mut request, &CartesianPosition::zeros(3));
        assert_eq!(request.target, target);
    }

    #[test]
    fn test_any_axis_combination_homes() {
        let cartesian = Cartesian::default();
        assert!(cartesian.can_home(AxisMask::bit(2)));
        assert!(cartesian.can_home(AxisMask::all(3)));
    }

    #[test]
    fn test_empty_range_rejected() {
        let mut cartesian = Cartesian::new(SoftLimits::new(vec![Some((0.0, 0.0))]));
        assert!(cartesian.init(&AxisLayout::single(3)).is_err());
    }
}
