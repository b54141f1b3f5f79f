//! Planner seam
//!
//! The motion planner is an external collaborator: it accepts one
//! motor-space segment at a time and either enqueues it or refuses it
//! because its queue is full or the machine is not ready. A bounded
//! in-memory [`SegmentQueue`] is provided for simulation and tests.

use motionkit_core::{CartesianPosition, MotionType, MotorPosition, PlannerError};
use std::collections::VecDeque;

/// One motor-space segment handed to the planner
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSegment {
    /// Motor target
    pub motors: MotorPosition,
    /// Axis-space target, for reporting
    pub target: CartesianPosition,
    /// Feed rate in motor units per minute
    pub feed_rate: f64,
    /// Motion type of the originating request
    pub motion_type: MotionType,
    /// Segment belongs to a jog
    pub is_jog: bool,
    /// Source line of the originating request
    pub line_number: Option<u32>,
}

/// Consumer of motor-space segments
pub trait Planner {
    /// Enqueue one segment or refuse it
    fn enqueue(&mut self, segment: PlannerSegment) -> Result<(), PlannerError>;
}

impl<P: Planner + ?Sized> Planner for &mut P {
    fn enqueue(&mut self, segment: PlannerSegment) -> Result<(), PlannerError> {
        (**self).enqueue(segment)
    }
}

/// Configuration for the segment queue
#[derive(Debug, Clone)]
pub struct SegmentQueueConfig {
    /// Maximum number of queued segments
    pub queue_size: usize,
}

impl Default for SegmentQueueConfig {
    fn default() -> Self {
        Self { queue_size: 64 }
    }
}

/// Bounded FIFO planner
#[derive(Debug, Clone, Default)]
pub struct SegmentQueue {
    config: SegmentQueueConfig,
    segments: VecDeque<PlannerSegment>,
    not_ready: Option<String>,
}

impl SegmentQueue {
    pub fn new(config: SegmentQueueConfig) -> Self {
        Self {
            config,
            segments: VecDeque::new(),
            not_ready: None,
        }
    }

    /// Queue holding at most `queue_size` segments
    pub fn with_capacity(queue_size: usize) -> Self {
        Self::new(SegmentQueueConfig { queue_size })
    }

    /// Refuse segments until [`set_ready`](Self::set_ready)
    pub fn set_not_ready(&mut self, reason: impl Into<String>) {
        self.not_ready = Some(reason.into());
    }

    pub fn set_ready(&mut self) {
        self.not_ready = None;
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Queued segments, oldest first
    pub fn segments(&self) -> impl Iterator<Item = &PlannerSegment> {
        self.segments.iter()
    }

    /// Take the oldest segment, as the stepper side would
    pub fn pop(&mut self) -> Option<PlannerSegment> {
        self.segments.pop_front()
    }

    /// Take every queued segment
    pub fn drain(&mut self) -> Vec<PlannerSegment> {
        self.segments.drain(..).collect()
    }
}

impl Planner for SegmentQueue {
    fn enqueue(&mut self, segment: PlannerSegment) -> Result<(), PlannerError> {
        if let Some(reason) = &self.not_ready {
            return Err(PlannerError::NotReady {
                reason: reason.clone(),
            });
        }
        if self.segments.len() >= self.config.queue_size {
            return Err(PlannerError::QueueFull);
        }
        self.segments.push_back(segment);
        Ok(())
    }
}
