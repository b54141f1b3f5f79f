//! Line segmentation for nonlinear kinematics
//!
//! A straight line in axis space bends in motor space when the inverse
//! transform is nonlinear. The segmenter bisects the line until the motor
//! chord of every piece, mapped back through the forward transform, stays
//! within tolerance of the line at its quarter points.

use crate::kinematics::KinematicModel;
use motionkit_core::{
    CartesianPosition, ConfigurationError, KinematicsError, MotionRequest, MotorPosition,
};
use motionkit_settings::{MotionSettings, MAX_SEGMENT_DEPTH};

/// Moves shorter than this are dropped
pub const MIN_MOVE_LENGTH: f64 = 1e-9;

/// Chord fractions checked against the line
const CHORD_SAMPLES: [f64; 3] = [0.25, 0.5, 0.75];

/// One motor-space waypoint for the planner
#[derive(Debug, Clone, PartialEq)]
pub struct MotorSegment {
    /// Waypoint on the axis-space line
    pub target: CartesianPosition,
    /// Motor position of the waypoint
    pub motors: MotorPosition,
    /// Feed rate in motor units per minute
    pub feed_rate: f64,
}

/// Tolerance-bounded line subdivision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segmenter {
    tolerance: f64,
    max_depth: u32,
}

impl Segmenter {
    pub fn new(tolerance: f64, max_depth: u32) -> Result<Self, ConfigurationError> {
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(ConfigurationError::InvalidTolerance {
                param: "segment_tolerance_mm".to_string(),
                value: tolerance,
            });
        }
        if max_depth == 0 || max_depth > MAX_SEGMENT_DEPTH {
            return Err(ConfigurationError::InvalidTolerance {
                param: "max_segment_depth".to_string(),
                value: max_depth as f64,
            });
        }
        Ok(Self {
            tolerance,
            max_depth,
        })
    }

    pub fn from_settings(settings: &MotionSettings) -> Result<Self, ConfigurationError> {
        Self::new(settings.segment_tolerance_mm, settings.max_segment_depth)
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Split the move from `start` to `request.target` into motor waypoints
    ///
    /// Waypoints exclude `start` and end exactly at the target. A move whose
    /// start, end or any split point has no inverse solution fails with that
    /// error.
    pub fn segment(
        &self,
        model: &KinematicModel,
        start: &CartesianPosition,
        request: &MotionRequest,
    ) -> Result<Vec<MotorSegment>, KinematicsError> {
        let start_motors = model.inverse(start)?;
        let end_motors = model.inverse(&request.target)?;

        if start.distance_to(&request.target) < MIN_MOVE_LENGTH {
            return Ok(Vec::new());
        }

        let mut waypoints = Vec::new();
        if model.is_linear() {
            waypoints.push((request.target.clone(), end_motors));
        } else {
            self.split(
                model,
                (start, &start_motors),
                (&request.target, end_motors),
                0,
                &mut waypoints,
            )?;
        }

        let mut previous = (start.clone(), start_motors);
        let mut segments = Vec::with_capacity(waypoints.len());
        for (target, motors) in waypoints {
            let cartesian_length = previous.0.distance_to(&target);
            let motor_length = previous.1.distance_to(&motors);
            let feed_rate = if cartesian_length > 0.0 {
                request.feed_rate * motor_length / cartesian_length
            } else {
                request.feed_rate
            };
            previous = (target.clone(), motors.clone());
            segments.push(MotorSegment {
                target,
                motors,
                feed_rate,
            });
        }

        tracing::debug!(
            "Segmented {} move to {} into {} segments",
            model.name(),
            request.target,
            segments.len()
        );
        Ok(segments)
    }

    fn split(
        &self,
        model: &KinematicModel,
        from: (&CartesianPosition, &MotorPosition),
        to: (&CartesianPosition, MotorPosition),
        depth: u32,
        out: &mut Vec<(CartesianPosition, MotorPosition)>,
    ) -> Result<(), KinematicsError> {
        let deviation = self.chord_deviation(model, from, (to.0, &to.1));
        if deviation <= self.tolerance || depth >= self.max_depth {
            if deviation > self.tolerance {
                tracing::warn!(
                    "Segment depth limit {} reached with deviation {:.5}",
                    self.max_depth,
                    deviation
                );
            }
            out.push((to.0.clone(), to.1));
            return Ok(());
        }

        let middle = from.0.lerp(to.0, 0.5);
        let middle_motors = model.inverse(&middle)?;
        self.split(
            model,
            from,
            (&middle, middle_motors.clone()),
            depth + 1,
            out,
        )?;
        self.split(model, (&middle, &middle_motors), to, depth + 1, out)
    }

    /// Worst distance of the forward-mapped motor chord from the line
    fn chord_deviation(
        &self,
        model: &KinematicModel,
        from: (&CartesianPosition, &MotorPosition),
        to: (&CartesianPosition, &MotorPosition),
    ) -> f64 {
        CHORD_SAMPLES
            .iter()
            .map(|&t| {
                let chord = from.1.lerp(to.1, t);
                model
                    .forward(&chord, from.0.len())
                    .distance_to_segment(from.0, to.0)
            })
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_tolerances() {
        assert!(Segmenter::new(0.0, 10).is_err());
        assert!(Segmenter::new(f64::NAN, 10).is_err());
        assert!(Segmenter::new(0.01, 0).is_err());
        assert!(Segmenter::new(0.01, MAX_SEGMENT_DEPTH + 1).is_err());
        assert!(Segmenter::from_settings(&MotionSettings::default()).is_ok());
    }
}
