//! MotionKit Settings Crate
//!
//! Loads and validates the machine description: axis layout, homing
//! groups, kinematics selection with its geometry constants, and motion
//! tolerances.

pub mod config;
pub mod error;

pub use config::{
    AxisHomingSettings, AxisSettings, CoreXYSettings, CustomKinematicsSettings, DeltaSettings,
    KinematicsSettings, MachineConfig, MotionSettings, MAX_HOMING_CYCLE, MAX_SEGMENT_DEPTH,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
