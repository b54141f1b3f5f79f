//! Homing cycle coordinator
//!
//! Translates axis-level homing requests into motor-level plans and
//! motor-level limit events back into axis-level outcomes. Motor motion
//! itself belongs to an external homing driver, which calls
//! [`HomingCoordinator::step`] from its polling loop:
//!
//! ```text
//! Idle ──start_cycle──▶ CycleActive ──step──▶ Done
//!                            │
//!                            └──cancel / abort──▶ Aborted
//! ```
//!
//! The coordinator is the only writer of the shared [`HomingState`].

use crate::cycles::HomingCycles;
use crate::state::{HomingState, HomingStateHandle};
use motionkit_core::{AxisMask, CartesianPosition, HomingError, MotorMask, MotorPosition};
use motionkit_kinematics::KinematicModel;
use motionkit_settings::MachineConfig;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Seek distance as a multiple of the axis travel
pub const HOMING_SEEK_SCALER: f64 = 1.1;

/// Safety inputs consulted before a cycle starts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetyInputs {
    /// Safety door is open
    pub door_ajar: bool,
    /// Control pins currently asserted (feed hold, reset, ...)
    pub active_control_pins: Vec<String>,
}

impl SafetyInputs {
    /// No input blocks homing
    pub fn clear() -> Self {
        Self::default()
    }

    fn check(&self) -> Result<(), HomingError> {
        if self.door_ajar {
            return Err(HomingError::SafetyInterlock {
                input: "safety door".to_string(),
            });
        }
        if let Some(pin) = self.active_control_pins.first() {
            return Err(HomingError::SafetyInterlock { input: pin.clone() });
        }
        Ok(())
    }
}

/// Why a cycle ended without homing its axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// Operator cancel or feed hold
    Cancelled,
    /// Emergency stop
    EStop,
    /// Alarm raised elsewhere
    Alarm,
    /// Safety door opened mid-cycle
    SafetyDoor,
    /// The approach finished without every switch tripping
    ApproachFailed,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::EStop => write!(f, "emergency stop"),
            Self::Alarm => write!(f, "alarm"),
            Self::SafetyDoor => write!(f, "safety door"),
            Self::ApproachFailed => write!(f, "limit switch not found"),
        }
    }
}

/// Motion the homing driver must perform for a cycle
#[derive(Debug, Clone, PartialEq)]
pub struct HomingPlan {
    /// Axes being homed
    pub axes: AxisMask,
    /// Motors that move
    pub motors: MotorMask,
    /// Relative motor-space seek move
    pub approach: MotorPosition,
}

/// A completed cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomingOutcome {
    /// Axes now homed
    pub homed: AxisMask,
    /// Motors whose holding state can be released
    pub released: MotorMask,
}

/// Result of starting a cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleStart {
    /// The driver must run this plan
    Plan(HomingPlan),
    /// The kinematics homed the axes itself
    Done(HomingOutcome),
}

/// Inputs gathered by the driver since the last step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HomingPoll {
    /// Motors whose limit switch tripped
    pub limited: MotorMask,
    /// The approach move has finished
    pub motion_done: bool,
    /// External cancellation
    pub cancel: Option<AbortReason>,
}

/// Transition produced by one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingStep {
    /// Keep these motors moving
    Continue { motors: MotorMask },
    /// Every axis of the cycle is homed
    Done(HomingOutcome),
    /// The cycle ended without homing its axes
    Aborted(AbortReason),
}

#[derive(Debug, Clone, Copy)]
struct ActiveCycle {
    axes: AxisMask,
    pending: AxisMask,
    motors: MotorMask,
}

/// Single-writer homing sequencer
#[derive(Debug)]
pub struct HomingCoordinator {
    state: Arc<RwLock<HomingState>>,
    cycles: HomingCycles,
    seek: CartesianPosition,
    home: CartesianPosition,
    active: Option<ActiveCycle>,
}

impl HomingCoordinator {
    pub fn new(config: &MachineConfig) -> Self {
        let seek = config
            .axes
            .iter()
            .map(|axis| match &axis.homing {
                Some(homing) if homing.positive_direction => {
                    axis.max_travel_mm * HOMING_SEEK_SCALER
                }
                Some(_) => -axis.max_travel_mm * HOMING_SEEK_SCALER,
                None => 0.0,
            })
            .collect::<Vec<_>>();
        let home = config
            .axes
            .iter()
            .map(|axis| axis.homing.as_ref().map_or(0.0, |homing| homing.mpos_mm))
            .collect::<Vec<_>>();

        Self {
            state: Arc::new(RwLock::new(HomingState::default())),
            cycles: HomingCycles::from_config(config),
            seek: CartesianPosition::new(seek),
            home: CartesianPosition::new(home),
            active: None,
        }
    }

    /// Read-only view of the homing state
    pub fn state_handle(&self) -> HomingStateHandle {
        HomingStateHandle::new(Arc::clone(&self.state))
    }

    pub fn state(&self) -> HomingState {
        *self.state.read()
    }

    pub fn cycles(&self) -> &HomingCycles {
        &self.cycles
    }

    /// Machine position of every axis at its home switch
    pub fn home_position(&self) -> &CartesianPosition {
        &self.home
    }

    /// Axes of the active cycle
    pub fn active_cycle(&self) -> Option<AxisMask> {
        self.active.map(|cycle| cycle.axes)
    }

    /// Signed seek distances of `axes`, zero elsewhere
    fn seek_directions(&self, axes: AxisMask) -> CartesianPosition {
        let mut directions = CartesianPosition::zeros(self.seek.len());
        for axis in axes.iter().filter(|&axis| axis < self.seek.len()) {
            directions[axis] = self.seek[axis];
        }
        directions
    }

    /// Gate and start a homing cycle for `axes`
    ///
    /// Every gate is checked before any state changes; on success the axes
    /// lose their homed mark until the cycle completes.
    pub fn start_cycle(
        &mut self,
        model: &KinematicModel,
        axes: AxisMask,
        safety: &SafetyInputs,
    ) -> Result<CycleStart, HomingError> {
        if let Some(active) = self.active {
            return Err(HomingError::CycleActive {
                axes: active.axes.to_string(),
            });
        }
        if !self.cycles.is_enabled() {
            return Err(HomingError::Disabled);
        }
        if axes.is_empty() || !self.cycles.configured().contains_all(axes) {
            return Err(HomingError::InvalidRequest {
                request: format!("no homing configuration for {}", axes - self.cycles.configured()),
            });
        }
        self.cycles.check_single_axis(axes)?;
        safety.check()?;
        if !model.can_home(axes) {
            return Err(HomingError::UnsupportedAxes {
                kinematics: model.name().to_string(),
                axes: axes.to_string(),
            });
        }

        self.state.write().begin(axes);
        tracing::info!("Homing cycle started for {}", axes);

        if model.kinematics_homing(axes) {
            tracing::info!("{} kinematics homed {} without motion", model.name(), axes);
            let outcome = self.complete(model, axes);
            return Ok(CycleStart::Done(outcome));
        }

        let motors = model.homing_motors(axes);
        let approach = model.homing_approach(axes, &self.seek_directions(axes));
        self.active = Some(ActiveCycle {
            axes,
            pending: axes,
            motors,
        });

        tracing::debug!("Homing approach {} on motors {}", approach, motors);
        Ok(CycleStart::Plan(HomingPlan {
            axes,
            motors,
            approach,
        }))
    }

    /// Advance the active cycle with the driver's latest inputs
    ///
    /// Cancellation is honoured before anything else.
    pub fn step(
        &mut self,
        model: &KinematicModel,
        poll: HomingPoll,
    ) -> Result<HomingStep, HomingError> {
        let mut cycle = self.active.ok_or(HomingError::NoActiveCycle)?;

        if let Some(reason) = poll.cancel {
            self.abort(reason)?;
            return Ok(HomingStep::Aborted(reason));
        }

        if !poll.limited.is_empty() {
            let outcome = model.limit_reached(cycle.pending, cycle.motors, poll.limited);
            if !outcome.reached.is_empty() {
                tracing::debug!("Limit reached for {}", outcome.reached);
            }
            cycle.pending = outcome.axes;
            cycle.motors = outcome.motors;
            self.active = Some(cycle);

            if outcome.stop {
                let homed = self.complete(model, cycle.axes);
                return Ok(HomingStep::Done(homed));
            }
        }

        if poll.motion_done {
            self.abort(AbortReason::ApproachFailed)?;
            return Ok(HomingStep::Aborted(AbortReason::ApproachFailed));
        }

        Ok(HomingStep::Continue {
            motors: cycle.motors,
        })
    }

    /// End the active cycle without marking its axes
    pub fn abort(&mut self, reason: AbortReason) -> Result<(), HomingError> {
        let cycle = self.active.take().ok_or(HomingError::NoActiveCycle)?;
        self.state.write().abort(cycle.axes);
        tracing::warn!("Homing cycle for {} aborted: {}", cycle.axes, reason);
        Ok(())
    }

    fn complete(&mut self, model: &KinematicModel, axes: AxisMask) -> HomingOutcome {
        self.active = None;
        self.state.write().complete(axes);
        let released = model.release_motors(axes, model.homing_motors(axes));
        tracing::info!("Homing cycle done for {}, releasing {}", axes, released);
        HomingOutcome {
            homed: axes,
            released,
        }
    }

    /// Forget every homed axis and any active cycle
    pub fn reset(&mut self) {
        if let Some(cycle) = self.active.take() {
            tracing::warn!("Reset during homing cycle for {}", cycle.axes);
        }
        self.state.write().clear();
    }

    /// Alarm unlock: treat `axes` as homed and release their motors
    pub fn unlock(
        &mut self,
        model: &KinematicModel,
        axes: AxisMask,
    ) -> Result<MotorMask, HomingError> {
        if let Some(active) = self.active {
            return Err(HomingError::CycleActive {
                axes: active.axes.to_string(),
            });
        }
        self.state.write().mark_homed(axes);
        let released = model.release_motors(axes, model.layout().all_motors());
        tracing::info!("Unlocked {}, releasing {}", axes, released);
        Ok(released)
    }
}
