//! Axis-space and motor-space positions

use super::axis_name;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Position in logical axis space, one value per configured axis, in machine units
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartesianPosition(Vec<f64>);

impl CartesianPosition {
    /// Create a position from axis values
    pub fn new(values: Vec<f64>) -> Self {
        debug_assert!(
            values.iter().all(|v| v.is_finite()),
            "CartesianPosition axes must be finite: {values:?}"
        );
        Self(values)
    }

    /// Position with every axis at zero
    pub fn zeros(n_axis: usize) -> Self {
        Self(vec![0.0; n_axis])
    }

    /// Number of axes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the position has no axes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Axis values
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Axis value, or zero for an axis that is not configured
    pub fn axis(&self, axis: usize) -> f64 {
        self.0.get(axis).copied().unwrap_or(0.0)
    }

    /// Euclidean distance over all axes
    pub fn distance_to(&self, other: &CartesianPosition) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    /// Point at parameter `t` on the line from `self` to `other`
    pub fn lerp(&self, other: &CartesianPosition, t: f64) -> CartesianPosition {
        CartesianPosition(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(a, b)| a + (b - a) * t)
                .collect(),
        )
    }

    /// Distance from `self` to the segment `start..end`
    pub fn distance_to_segment(&self, start: &CartesianPosition, end: &CartesianPosition) -> f64 {
        let length_sq: f64 = start
            .0
            .iter()
            .zip(end.0.iter())
            .map(|(a, b)| (b - a) * (b - a))
            .sum();
        if length_sq <= f64::EPSILON {
            return self.distance_to(start);
        }
        let dot: f64 = self
            .0
            .iter()
            .zip(start.0.iter().zip(end.0.iter()))
            .map(|(p, (a, b))| (p - a) * (b - a))
            .sum();
        let t = (dot / length_sq).clamp(0.0, 1.0);
        self.distance_to(&start.lerp(end, t))
    }

    /// Whether every axis is within `tolerance` of `other`
    pub fn approx_eq(&self, other: &CartesianPosition, tolerance: f64) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl From<Vec<f64>> for CartesianPosition {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl Index<usize> for CartesianPosition {
    type Output = f64;

    fn index(&self, axis: usize) -> &Self::Output {
        &self.0[axis]
    }
}

impl IndexMut<usize> for CartesianPosition {
    fn index_mut(&mut self, axis: usize) -> &mut Self::Output {
        &mut self.0[axis]
    }
}

impl fmt::Display for CartesianPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (axis, value) in self.0.iter().enumerate() {
            if axis > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}:{:.3}", axis_name(axis), value)?;
        }
        Ok(())
    }
}

/// Position in motor space, one value per motor channel
///
/// Channel `n` belongs to axis `n`; ganged motors of an axis share the channel value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MotorPosition(Vec<f64>);

impl MotorPosition {
    /// Create a motor position from channel values
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Every channel at zero
    pub fn zeros(n_channels: usize) -> Self {
        Self(vec![0.0; n_channels])
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no channels
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Channel values
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Euclidean distance over all channels
    pub fn distance_to(&self, other: &MotorPosition) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    /// Point at parameter `t` on the motor-space chord from `self` to `other`
    pub fn lerp(&self, other: &MotorPosition, t: f64) -> MotorPosition {
        MotorPosition(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(a, b)| a + (b - a) * t)
                .collect(),
        )
    }
}

impl From<Vec<f64>> for MotorPosition {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl Index<usize> for MotorPosition {
    type Output = f64;

    fn index(&self, channel: usize) -> &Self::Output {
        &self.0[channel]
    }
}

impl IndexMut<usize> for MotorPosition {
    fn index_mut(&mut self, channel: usize) -> &mut Self::Output {
        &mut self.0[channel]
    }
}

impl fmt::Display for MotorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (channel, value) in self.0.iter().enumerate() {
            if channel > 0 {
                write!(f, " ")?;
            }
            write!(f, "M{}:{:.4}", channel, value)?;
        }
        Ok(())
    }
}
