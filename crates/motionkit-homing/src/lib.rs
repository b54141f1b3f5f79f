//! # MotionKit Homing
//!
//! Homing cycle sequencing: gate checks, motor-level plans for the homing
//! driver, limit-event translation through the kinematics, and the shared
//! homed-axis state.

pub mod coordinator;
pub mod cycles;
pub mod state;

pub use coordinator::{
    AbortReason, CycleStart, HomingCoordinator, HomingOutcome, HomingPlan, HomingPoll, HomingStep,
    SafetyInputs, HOMING_SEEK_SCALER,
};
pub use cycles::{HomingCycles, HomingRequest};
pub use state::{HomingPhase, HomingState, HomingStateHandle};
