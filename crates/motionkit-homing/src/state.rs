//! Homed-axis record shared between the coordinator and its readers

use motionkit_core::AxisMask;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Where the homing sequence stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HomingPhase {
    /// No cycle has run since the last reset
    #[default]
    Idle,
    /// A cycle for these axes is in progress
    CycleActive(AxisMask),
    /// The last cycle homed these axes
    Done(AxisMask),
    /// The last cycle for these axes was aborted
    Aborted(AxisMask),
}

impl fmt::Display for HomingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::CycleActive(axes) => write!(f, "Homing {}", axes),
            Self::Done(axes) => write!(f, "Homed {}", axes),
            Self::Aborted(axes) => write!(f, "Aborted {}", axes),
        }
    }
}

/// Homed axes and the active cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HomingState {
    homed: AxisMask,
    phase: HomingPhase,
}

impl HomingState {
    /// Axes with a confirmed reference
    pub fn homed(&self) -> AxisMask {
        self.homed
    }

    pub fn phase(&self) -> HomingPhase {
        self.phase
    }

    /// Axes of the cycle in progress
    pub fn active_cycle(&self) -> Option<AxisMask> {
        match self.phase {
            HomingPhase::CycleActive(axes) => Some(axes),
            _ => None,
        }
    }

    /// Whether every axis of `axes` is homed
    pub fn is_homed(&self, axes: AxisMask) -> bool {
        self.homed.contains_all(axes)
    }

    pub(crate) fn begin(&mut self, axes: AxisMask) {
        self.homed = self.homed - axes;
        self.phase = HomingPhase::CycleActive(axes);
    }

    pub(crate) fn complete(&mut self, axes: AxisMask) {
        self.homed = self.homed | axes;
        self.phase = HomingPhase::Done(axes);
    }

    pub(crate) fn abort(&mut self, axes: AxisMask) {
        self.phase = HomingPhase::Aborted(axes);
    }

    pub(crate) fn mark_homed(&mut self, axes: AxisMask) {
        self.homed = self.homed | axes;
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Read-only view of the homing state
///
/// Cheap to clone; every clone observes the coordinator's latest writes.
#[derive(Debug, Clone)]
pub struct HomingStateHandle {
    inner: Arc<RwLock<HomingState>>,
}

impl HomingStateHandle {
    pub(crate) fn new(inner: Arc<RwLock<HomingState>>) -> Self {
        Self { inner }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> HomingState {
        *self.inner.read()
    }

    pub fn homed(&self) -> AxisMask {
        self.inner.read().homed()
    }

    pub fn phase(&self) -> HomingPhase {
        self.inner.read().phase()
    }

    pub fn is_homed(&self, axes: AxisMask) -> bool {
        self.inner.read().is_homed(axes)
    }

    pub fn is_cycle_active(&self) -> bool {
        self.inner.read().active_cycle().is_some()
    }
}
