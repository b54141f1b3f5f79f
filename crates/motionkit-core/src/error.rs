//! Error handling for MotionKit
//!
//! Error types for every layer of the motion core:
//! - Configuration errors (geometry/tolerance validation at init)
//! - Kinematics errors (no inverse solution for a pose)
//! - Homing errors (cycle sequencing and safety gating)
//! - Planner and motion errors (rejected moves)
//!
//! All error types use `thiserror` for ergonomic error handling.
//! Cancelling a homing cycle is not an error; it is reported as a
//! separate transition by the homing coordinator.

use thiserror::Error;

/// Configuration error type
///
/// Raised while a machine description is validated or a kinematic model
/// is initialised. A configuration error keeps the machine out of an
/// operational state until it is corrected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A geometry parameter is out of range
    #[error("Invalid geometry parameter '{param}': {reason}")]
    InvalidGeometry {
        /// The offending parameter name.
        param: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A tolerance or subdivision limit is out of range
    #[error("Invalid tolerance '{param}': {value}")]
    InvalidTolerance {
        /// The offending parameter name.
        param: String,
        /// The rejected value.
        value: f64,
    },

    /// The selected kinematics is not registered
    #[error("Unknown kinematics: {name}")]
    UnknownKinematics {
        /// The requested kinematics name.
        name: String,
    },

    /// The kinematics needs more axes than are configured
    #[error("Kinematics {kinematics} needs at least {required} axes, {configured} configured")]
    TooFewAxes {
        /// The kinematics name.
        kinematics: String,
        /// The minimum axis count.
        required: usize,
        /// The configured axis count.
        configured: usize,
    },

    /// Invalid axis layout
    #[error("Invalid axis configuration: {reason}")]
    InvalidAxes {
        /// The reason the layout was rejected.
        reason: String,
    },
}

impl ConfigurationError {
    /// Shorthand for an invalid geometry parameter
    pub fn geometry(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            param: param.into(),
            reason: reason.into(),
        }
    }
}

/// Kinematics error type
///
/// Reported per request when an axis-space pose has no motor-space
/// solution. Never clamped silently.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// The pose lies outside the reachable workspace
    #[error("Target {target} is outside the {kinematics} workspace: {reason}")]
    Infeasible {
        /// The kinematics name.
        kinematics: String,
        /// The rejected target, formatted.
        target: String,
        /// Why no solution exists.
        reason: String,
    },

    /// The pose is a kinematic singularity
    #[error("Target {target} is a {kinematics} singularity")]
    Singularity {
        /// The kinematics name.
        kinematics: String,
        /// The rejected target, formatted.
        target: String,
    },

    /// Position has the wrong number of axes
    #[error("Expected {expected} axes, got {actual}")]
    AxisCountMismatch {
        /// The configured axis count.
        expected: usize,
        /// The axis count of the given position.
        actual: usize,
    },
}

/// Homing sequencing error type
///
/// Always reported before any motor moves.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HomingError {
    /// The kinematics cannot home this axis combination
    #[error("Kinematics {kinematics} cannot home axes {axes}")]
    UnsupportedAxes {
        /// The kinematics name.
        kinematics: String,
        /// The requested axes, by name.
        axes: String,
    },

    /// Single axis homing is not allowed for one of the requested axes
    #[error("Single axis homing is not allowed for {axis}")]
    SingleAxisNotAllowed {
        /// The axis name.
        axis: String,
    },

    /// No axis has a homing configuration
    #[error("Homing is disabled")]
    Disabled,

    /// A homing cycle is already active
    #[error("Homing cycle already active for {axes}")]
    CycleActive {
        /// The axes of the active cycle.
        axes: String,
    },

    /// No homing cycle is active
    #[error("No homing cycle is active")]
    NoActiveCycle,

    /// A safety input blocks homing
    #[error("Homing blocked by safety input: {input}")]
    SafetyInterlock {
        /// The blocking input.
        input: String,
    },

    /// A homing cycle number has no axes
    #[error("No axes for homing cycle {cycle}")]
    EmptyCycle {
        /// The cycle number.
        cycle: u8,
    },

    /// A homing request could not be parsed
    #[error("Invalid homing request: {request}")]
    InvalidRequest {
        /// The raw request text.
        request: String,
    },
}

/// Motion planner error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    /// The planner queue is full
    #[error("Planner queue full")]
    QueueFull,

    /// The machine is not ready to accept motion
    #[error("Machine not ready: {reason}")]
    NotReady {
        /// Why the machine is not ready.
        reason: String,
    },
}

/// Motion error type
///
/// A rejected move, from any stage between the gateway and the planner.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// The target failed the kinematics pre-check
    #[error("Invalid target: {reason}")]
    InvalidTarget {
        /// Why the target was rejected.
        reason: String,
    },

    /// The arc cannot be segmented safely
    #[error("Invalid arc: {reason}")]
    InvalidArc {
        /// Why the arc was rejected.
        reason: String,
    },

    /// No inverse solution exists
    #[error(transparent)]
    Kinematics(#[from] KinematicsError),

    /// The planner refused a segment
    #[error("Planner rejected segment {segment}: {source}")]
    PlannerRejected {
        /// Index of the rejected segment within the move.
        segment: usize,
        /// The planner error.
        #[source]
        source: PlannerError,
    },
}

/// Main error type for MotionKit
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Kinematics error
    #[error(transparent)]
    Kinematics(#[from] KinematicsError),

    /// Homing error
    #[error(transparent)]
    Homing(#[from] HomingError),

    /// Motion error
    #[error(transparent)]
    Motion(#[from] MotionError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a configuration error
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    /// Check if this is a kinematic infeasibility, directly or inside a rejected move
    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            Error::Kinematics(_) | Error::Motion(MotionError::Kinematics(_))
        )
    }

    /// Check if this is a homing sequencing error
    pub fn is_homing_error(&self) -> bool {
        matches!(self, Error::Homing(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
