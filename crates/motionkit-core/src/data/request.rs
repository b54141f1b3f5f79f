//! Motion requests and arc descriptions

use super::CartesianPosition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of motion a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionType {
    /// Rapid positioning (G0)
    Rapid,
    /// Feed-rate controlled linear move (G1)
    #[default]
    Linear,
}

impl fmt::Display for MotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rapid => write!(f, "rapid"),
            Self::Linear => write!(f, "linear"),
        }
    }
}

/// A commanded move in axis space plus its motion metadata
///
/// Transient: consumed by the call that handles it.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionRequest {
    /// Target in axis space
    pub target: CartesianPosition,
    /// Feed rate in machine units per minute
    pub feed_rate: f64,
    /// Kind of motion
    pub motion_type: MotionType,
    /// Operator jog rather than programmed motion
    pub is_jog: bool,
    /// Source line, for reporting
    pub line_number: Option<u32>,
}

impl MotionRequest {
    /// Feed-rate controlled linear move
    pub fn linear(target: CartesianPosition, feed_rate: f64) -> Self {
        Self {
            target,
            feed_rate,
            motion_type: MotionType::Linear,
            is_jog: false,
            line_number: None,
        }
    }

    /// Rapid move
    pub fn rapid(target: CartesianPosition, feed_rate: f64) -> Self {
        Self {
            motion_type: MotionType::Rapid,
            ..Self::linear(target, feed_rate)
        }
    }

    /// Operator jog
    pub fn jog(target: CartesianPosition, feed_rate: f64) -> Self {
        Self {
            is_jog: true,
            ..Self::linear(target, feed_rate)
        }
    }

    /// Attach a source line number
    pub fn with_line_number(mut self, line_number: u32) -> Self {
        self.line_number = Some(line_number);
        self
    }
}

/// Plane of a circular move: the two circle axes and the linear (helix) axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcPlane {
    /// First circle axis
    pub axis0: usize,
    /// Second circle axis
    pub axis1: usize,
    /// Axis moved linearly along the arc
    pub linear: usize,
}

impl ArcPlane {
    /// G17
    pub const XY: ArcPlane = ArcPlane {
        axis0: 0,
        axis1: 1,
        linear: 2,
    };
    /// G18
    pub const ZX: ArcPlane = ArcPlane {
        axis0: 2,
        axis1: 0,
        linear: 1,
    };
    /// G19
    pub const YZ: ArcPlane = ArcPlane {
        axis0: 1,
        axis1: 2,
        linear: 0,
    };
}

impl Default for ArcPlane {
    fn default() -> Self {
        Self::XY
    }
}

/// Circular move description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSpec {
    /// Arc center in absolute coordinates of `plane.axis0`, `plane.axis1`
    pub center: [f64; 2],
    /// Arc radius
    pub radius: f64,
    /// Plane of the arc
    pub plane: ArcPlane,
    /// Clockwise (G2) or counter-clockwise (G3)
    pub clockwise: bool,
}

impl ArcSpec {
    /// Swept angle in radians from `start` to `target`, negative for clockwise.
    ///
    /// Coincident start and end describe a full circle.
    pub fn sweep(&self, start: &CartesianPosition, target: &CartesianPosition) -> f64 {
        let (a0, a1) = (self.plane.axis0, self.plane.axis1);
        let rs0 = start.axis(a0) - self.center[0];
        let rs1 = start.axis(a1) - self.center[1];
        let rt0 = target.axis(a0) - self.center[0];
        let rt1 = target.axis(a1) - self.center[1];

        let mut angle = (rs0 * rt1 - rs1 * rt0).atan2(rs0 * rt0 + rs1 * rt1);
        if self.clockwise {
            if angle >= -1e-9 {
                angle -= 2.0 * std::f64::consts::PI;
            }
        } else if angle <= 1e-9 {
            angle += 2.0 * std::f64::consts::PI;
        }
        angle
    }

    /// Point at parameter `t` (0..=1) along the arc from `start` to `target`
    pub fn point_at(
        &self,
        start: &CartesianPosition,
        target: &CartesianPosition,
        sweep: f64,
        t: f64,
    ) -> CartesianPosition {
        let (a0, a1, lin) = (self.plane.axis0, self.plane.axis1, self.plane.linear);
        let start_angle =
            (start.axis(a1) - self.center[1]).atan2(start.axis(a0) - self.center[0]);
        let angle = start_angle + sweep * t;

        // Non-plane axes move linearly
        let mut point = start.lerp(target, t);
        point[a0] = self.center[0] + self.radius * angle.cos();
        point[a1] = self.center[1] + self.radius * angle.sin();
        if lin < point.len() {
            point[lin] = start.axis(lin) + (target.axis(lin) - start.axis(lin)) * t;
        }
        point
    }
}
