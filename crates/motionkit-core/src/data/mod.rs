//! Data models for axes, motors and positions
//!
//! This module provides:
//! - Axis and motor bit masks with stable bit positions
//! - The fixed axis-to-motor layout of a configured machine
//! - Axis-space and motor-space positions
//! - Transient motion requests and arc descriptions

pub mod position;
pub mod request;

pub use position::{CartesianPosition, MotorPosition};
pub use request::{ArcPlane, ArcSpec, MotionRequest, MotionType};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, Not, Sub};

/// Maximum number of logical axes
pub const MAX_N_AXIS: usize = 6;

/// Maximum number of physical motors attached to one axis
pub const MAX_MOTORS_PER_AXIS: usize = 2;

/// Bit offset of the second (ganged) motor of an axis within a [`MotorMask`]
pub const MOTOR1_OFFSET: usize = 16;

/// Axis letters, indexed by axis number
pub const AXIS_NAMES: [char; MAX_N_AXIS] = ['X', 'Y', 'Z', 'A', 'B', 'C'];

/// Letter of an axis number, `?` when out of range
pub fn axis_name(axis: usize) -> char {
    AXIS_NAMES.get(axis).copied().unwrap_or('?')
}

/// Set of logical axes, bit `n` is axis `n`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AxisMask(u32);

impl AxisMask {
    /// The empty mask
    pub const NONE: AxisMask = AxisMask(0);

    /// Create a mask from raw bits
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Mask containing a single axis
    pub const fn bit(axis: usize) -> Self {
        Self(1 << axis)
    }

    /// Mask containing the first `n_axis` axes
    pub fn all(n_axis: usize) -> Self {
        let n = n_axis.min(MAX_N_AXIS);
        Self((1u32 << n) - 1)
    }

    /// Parse axis letters such as `"XZ"` (case-insensitive)
    pub fn from_names(names: &str) -> Option<Self> {
        let mut mask = Self::NONE;
        for c in names.chars() {
            let upper = c.to_ascii_uppercase();
            let axis = AXIS_NAMES.iter().position(|&n| n == upper)?;
            mask = mask | Self::bit(axis);
        }
        Some(mask)
    }

    /// Raw bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether the axis is in the mask
    pub const fn contains(self, axis: usize) -> bool {
        axis < 32 && self.0 & (1 << axis) != 0
    }

    /// Whether every axis of `other` is in the mask
    pub const fn contains_all(self, other: AxisMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the mask is empty
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether the masks share an axis
    pub const fn intersects(self, other: AxisMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Number of axes in the mask
    pub const fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Add an axis
    pub fn insert(&mut self, axis: usize) {
        self.0 |= 1 << axis;
    }

    /// Remove an axis
    pub fn remove(&mut self, axis: usize) {
        self.0 &= !(1 << axis);
    }

    /// Axis numbers in ascending order
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..MAX_N_AXIS).filter(move |&axis| self.contains(axis))
    }
}

impl BitOr for AxisMask {
    type Output = AxisMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        AxisMask(self.0 | rhs.0)
    }
}

impl BitAnd for AxisMask {
    type Output = AxisMask;

    fn bitand(self, rhs: Self) -> Self::Output {
        AxisMask(self.0 & rhs.0)
    }
}

impl Sub for AxisMask {
    type Output = AxisMask;

    fn sub(self, rhs: Self) -> Self::Output {
        AxisMask(self.0 & !rhs.0)
    }
}

impl Not for AxisMask {
    type Output = AxisMask;

    fn not(self) -> Self::Output {
        AxisMask(!self.0 & ((1 << MAX_N_AXIS) - 1))
    }
}

impl fmt::Display for AxisMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "<none>");
        }
        for axis in self.iter() {
            write!(f, "{}", axis_name(axis))?;
        }
        Ok(())
    }
}

/// Set of physical motors
///
/// Motor `motor_num` of axis `axis` is bit `axis + MOTOR1_OFFSET * motor_num`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MotorMask(u32);

impl MotorMask {
    /// The empty mask
    pub const NONE: MotorMask = MotorMask(0);

    /// Create a mask from raw bits
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Mask containing a single motor
    pub const fn motor(axis: usize, motor_num: usize) -> Self {
        Self(1 << (axis + MOTOR1_OFFSET * motor_num))
    }

    /// Raw bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether the motor is in the mask
    pub const fn contains(self, axis: usize, motor_num: usize) -> bool {
        self.0 & (1 << (axis + MOTOR1_OFFSET * motor_num)) != 0
    }

    /// Whether the mask is empty
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether the masks share a motor
    pub const fn intersects(self, other: MotorMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Number of motors in the mask
    pub const fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Axes that have at least one motor in the mask
    pub const fn axes(self) -> AxisMask {
        AxisMask::from_bits((self.0 | (self.0 >> MOTOR1_OFFSET)) & 0xffff)
    }

    /// `(axis, motor_num)` pairs in ascending order
    pub fn iter(self) -> impl Iterator<Item = (usize, usize)> {
        (0..MAX_MOTORS_PER_AXIS)
            .flat_map(|motor| (0..MAX_N_AXIS).map(move |axis| (axis, motor)))
            .filter(move |&(axis, motor)| self.contains(axis, motor))
    }
}

impl BitOr for MotorMask {
    type Output = MotorMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        MotorMask(self.0 | rhs.0)
    }
}

impl BitAnd for MotorMask {
    type Output = MotorMask;

    fn bitand(self, rhs: Self) -> Self::Output {
        MotorMask(self.0 & rhs.0)
    }
}

impl Sub for MotorMask {
    type Output = MotorMask;

    fn sub(self, rhs: Self) -> Self::Output {
        MotorMask(self.0 & !rhs.0)
    }
}

impl fmt::Display for MotorMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "<none>");
        }
        let mut first = true;
        for (axis, motor) in self.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}{}", axis_name(axis), motor)?;
            first = false;
        }
        Ok(())
    }
}

/// Fixed mapping between axes and physical motors
///
/// Built once from configuration and never changed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLayout {
    n_axis: usize,
    ganged: AxisMask,
}

impl AxisLayout {
    /// Create a layout with `n_axis` axes, `ganged` axes carry a second motor
    pub fn new(n_axis: usize, ganged: AxisMask) -> Self {
        debug_assert!(n_axis <= MAX_N_AXIS, "at most {MAX_N_AXIS} axes");
        Self {
            n_axis,
            ganged: ganged & AxisMask::all(n_axis),
        }
    }

    /// Layout with one motor per axis
    pub fn single(n_axis: usize) -> Self {
        Self::new(n_axis, AxisMask::NONE)
    }

    /// Number of axes (and motor channels)
    pub fn n_axis(&self) -> usize {
        self.n_axis
    }

    /// Axes driven by two motors
    pub fn ganged(&self) -> AxisMask {
        self.ganged
    }

    /// Every configured axis
    pub fn all_axes(&self) -> AxisMask {
        AxisMask::all(self.n_axis)
    }

    /// Every physical motor
    pub fn all_motors(&self) -> MotorMask {
        self.motors_for(self.all_axes())
    }

    /// Number of physical motors
    pub fn motor_count(&self) -> usize {
        self.all_motors().count()
    }

    /// Physical motors attached to the given axes
    pub fn motors_for(&self, axes: AxisMask) -> MotorMask {
        let axes = axes & self.all_axes();
        MotorMask::from_bits(axes.bits() | ((axes & self.ganged).bits() << MOTOR1_OFFSET))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_mask_names() {
        let mask = AxisMask::from_names("xz").unwrap();
        assert!(mask.contains(0));
        assert!(!mask.contains(1));
        assert!(mask.contains(2));
        assert_eq!(mask.to_string(), "XZ");
        assert!(AxisMask::from_names("XQ").is_none());
        assert_eq!(AxisMask::NONE.to_string(), "<none>");
    }

    #[test]
    fn test_axis_mask_set_ops() {
        let xy = AxisMask::from_names("XY").unwrap();
        let yz = AxisMask::from_names("YZ").unwrap();
        assert_eq!((xy & yz).to_string(), "Y");
        assert_eq!((xy | yz).to_string(), "XYZ");
        assert_eq!((xy - yz).to_string(), "X");
        assert_eq!(AxisMask::all(3), AxisMask::from_names("XYZ").unwrap());
        assert_eq!(xy.iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_motor_mask_bits() {
        let y1 = MotorMask::motor(1, 1);
        assert_eq!(y1.bits(), 1 << (1 + MOTOR1_OFFSET));
        assert_eq!(y1.axes(), AxisMask::bit(1));
        let mask = MotorMask::motor(0, 0) | y1;
        assert_eq!(mask.to_string(), "X0 Y1");
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_layout_motors_for_ganged_axis() {
        let layout = AxisLayout::new(3, AxisMask::bit(1));
        assert_eq!(layout.motor_count(), 4);
        let motors = layout.motors_for(AxisMask::bit(1));
        assert!(motors.contains(1, 0));
        assert!(motors.contains(1, 1));
        assert_eq!(motors.count(), 2);
        // Axes beyond the layout have no motors
        assert!(layout.motors_for(AxisMask::bit(4)).is_empty());
    }
}
