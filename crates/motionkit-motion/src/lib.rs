//! # MotionKit Motion
//!
//! The [`MotionGateway`] turns commanded axis-space moves into motor-space
//! planner segments through the machine's kinematic model, and exposes the
//! homing coordinator to the homing driver.

pub mod arc;
pub mod gateway;
pub mod planner;

pub use arc::arc_chords;
pub use gateway::MotionGateway;
pub use planner::{Planner, PlannerSegment, SegmentQueue, SegmentQueueConfig};
