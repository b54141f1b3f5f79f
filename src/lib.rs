//! # MotionKit
//!
//! Kinematics and homing core for multi-geometry CNC motion controllers:
//! - Cartesian, CoreXY and rotary parallel delta machines, plus custom
//!   kinematics registered at startup
//! - Line segmentation so straight axis-space moves stay straight on
//!   non-linear machines
//! - Jog clamping and supersession
//! - Homing cycle sequencing with per-kinematics limit handling
//!
//! ## Architecture
//!
//! MotionKit is organized as a workspace with multiple crates:
//!
//! 1. **motionkit-core** - Masks, positions, motion requests, errors
//! 2. **motionkit-settings** - Machine description loading and validation
//! 3. **motionkit-kinematics** - Kinematic models, registry, segmenter, jog guard
//! 4. **motionkit-homing** - Homing cycles, coordinator, shared homing state
//! 5. **motionkit-motion** - Motion gateway and the planner seam
//! 6. **motionkit** - Logging bootstrap, simulated machine, demo binary

pub mod sim;

pub use motionkit_core::{
    ArcPlane, ArcSpec, AxisLayout, AxisMask, CartesianPosition, ConfigurationError, Error,
    HomingError, KinematicsError, MotionError, MotionRequest, MotionType, MotorMask,
    MotorPosition, PlannerError, Result,
};

pub use motionkit_settings::{
    AxisHomingSettings, AxisSettings, CoreXYSettings, CustomKinematicsSettings, DeltaSettings,
    KinematicsSettings, MachineConfig, MotionSettings, SettingsError,
};

pub use motionkit_kinematics::{
    JogGuard, JogHandle, KinematicModel, KinematicSystem, KinematicsParams, KinematicsRegistry,
    Segmenter,
};

pub use motionkit_homing::{
    AbortReason, CycleStart, HomingCoordinator, HomingPhase, HomingPoll, HomingStateHandle,
    HomingStep, SafetyInputs,
};

pub use motionkit_motion::{MotionGateway, Planner, PlannerSegment, SegmentQueue};

pub use sim::{cancel_channel, HomingReport, SimulatedMachine, SimulationSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
