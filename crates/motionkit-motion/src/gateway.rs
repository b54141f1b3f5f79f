//! Motion gateway
//!
//! The single entry point other subsystems use to move the machine. The
//! gateway owns the kinematic model chosen at configuration time, the
//! tracked motor position, the segmenter, the jog guard and the homing
//! coordinator. The model cannot be replaced after construction.
//!
//! Flow of a line move:
//! ```text
//! request ─▶ JogGuard (jogs only) ─▶ invalid_line ─▶ Segmenter ─▶ Planner
//! ```
//! The tracked position advances only for segments the planner accepted.

use crate::arc::{arc_chords, on_circle};
use crate::planner::{Planner, PlannerSegment};
use motionkit_core::{
    ArcSpec, AxisMask, CartesianPosition, ConfigurationError, HomingError, KinematicsError,
    MotionError, MotionRequest, MotorMask, MotorPosition,
};
use motionkit_homing::{
    AbortReason, CycleStart, HomingCoordinator, HomingCycles, HomingPoll, HomingRequest,
    HomingStateHandle, HomingStep, SafetyInputs,
};
use motionkit_kinematics::{
    JogGuard, JogHandle, JogTicket, KinematicModel, KinematicsRegistry, MotorSegment, Segmenter,
};
use motionkit_settings::MachineConfig;

/// Facade over kinematics, segmentation, jogging and homing
#[derive(Debug)]
pub struct MotionGateway {
    model: KinematicModel,
    segmenter: Segmenter,
    arc_tolerance: f64,
    jog: JogGuard,
    homing: HomingCoordinator,
    motors: MotorPosition,
}

impl MotionGateway {
    /// Build the gateway for a machine description
    ///
    /// Fails when the kinematics is unknown, its geometry is inconsistent or
    /// a tolerance is out of range.
    pub fn from_config(
        config: &MachineConfig,
        registry: &KinematicsRegistry,
    ) -> Result<Self, ConfigurationError> {
        let model = registry.create(config)?;
        let segmenter = Segmenter::from_settings(&config.motion)?;

        let arc_tolerance = config.motion.arc_tolerance_mm;
        if !(arc_tolerance.is_finite() && arc_tolerance > 0.0) {
            return Err(ConfigurationError::InvalidTolerance {
                param: "arc_tolerance_mm".to_string(),
                value: arc_tolerance,
            });
        }

        let motors = model.init_position();
        tracing::info!(
            "Motion gateway ready for '{}': {} kinematics, start {}",
            config.name,
            model.name(),
            model.forward(&motors, model.n_axis())
        );

        Ok(Self {
            model,
            segmenter,
            arc_tolerance,
            jog: JogGuard::new(),
            homing: HomingCoordinator::new(config),
            motors,
        })
    }

    /// The active kinematic model
    pub fn model(&self) -> &KinematicModel {
        &self.model
    }

    /// Current axis-space position
    pub fn position(&self) -> CartesianPosition {
        self.model.forward(&self.motors, self.model.n_axis())
    }

    /// Current motor position
    pub fn motor_position(&self) -> &MotorPosition {
        &self.motors
    }

    /// Adopt a motor position reported by the realtime side
    pub fn sync_motor_position(&mut self, motors: MotorPosition) -> Result<(), KinematicsError> {
        if motors.len() != self.model.n_axis() {
            return Err(KinematicsError::AxisCountMismatch {
                expected: self.model.n_axis(),
                actual: motors.len(),
            });
        }
        self.motors = motors;
        Ok(())
    }

    pub fn transform_cartesian_to_motors(
        &self,
        position: &CartesianPosition,
    ) -> Result<MotorPosition, KinematicsError> {
        self.model.inverse(position)
    }

    pub fn motors_to_cartesian(&self, motors: &MotorPosition) -> CartesianPosition {
        self.model.forward(motors, self.model.n_axis())
    }

    /// Handle that cancels the active jog from elsewhere
    pub fn jog_handle(&self) -> JogHandle {
        self.jog.handle()
    }

    pub fn cancel_jog(&self) {
        self.jog.cancel();
    }

    /// Move along a straight axis-space line
    ///
    /// Returns the number of segments the planner accepted. A jog superseded
    /// while its segments are being enqueued stops without error.
    pub fn move_to<P: Planner + ?Sized>(
        &mut self,
        planner: &mut P,
        request: MotionRequest,
    ) -> Result<usize, MotionError> {
        let current = self.position();
        let ticket = request.is_jog.then(|| self.jog.begin());
        let request = self.jog.guard(&self.model, request, &current);

        if self.model.invalid_line(&request.target) {
            tracing::warn!(
                "Rejected move to {}: outside the {} workspace",
                request.target,
                self.model.name()
            );
            return Err(MotionError::InvalidTarget {
                reason: format!(
                    "{} is outside the {} workspace",
                    request.target,
                    self.model.name()
                ),
            });
        }

        let segments = self
            .segmenter
            .segment(&self.model, &current, &request)
            .inspect_err(|e| tracing::warn!("Rejected move to {}: {}", request.target, e))?;

        self.enqueue(planner, segments, &request, ticket.as_ref())
    }

    /// Move along a circular arc from the current position
    ///
    /// The arc is expanded into chords within the arc tolerance, then each
    /// chord goes through the segmenter. Nothing is enqueued unless every
    /// chord has an inverse solution.
    pub fn arc_to<P: Planner + ?Sized>(
        &mut self,
        planner: &mut P,
        request: MotionRequest,
        arc: &ArcSpec,
    ) -> Result<usize, MotionError> {
        let current = self.position();

        if !(arc.radius.is_finite() && arc.radius > 0.0) {
            return Err(MotionError::InvalidArc {
                reason: format!("radius {} must be > 0", arc.radius),
            });
        }
        let on_arc_tolerance = (arc.radius * 1e-3).max(0.005);
        if !on_circle(&current, arc, on_arc_tolerance)
            || !on_circle(&request.target, arc, on_arc_tolerance)
        {
            return Err(MotionError::InvalidArc {
                reason: "start and end must lie on the arc".to_string(),
            });
        }
        if self.model.invalid_arc(&current, &request.target, arc) {
            tracing::warn!(
                "Rejected arc to {}: cannot be segmented by {} kinematics",
                request.target,
                self.model.name()
            );
            return Err(MotionError::InvalidArc {
                reason: format!("arc leaves the {} workspace", self.model.name()),
            });
        }

        let mut segments = Vec::new();
        let mut from = current;
        for point in arc_chords(&from, &request.target, arc, self.arc_tolerance) {
            if self.model.invalid_line(&point) {
                return Err(MotionError::InvalidArc {
                    reason: format!("{} is outside the {} workspace", point, self.model.name()),
                });
            }
            let chord = MotionRequest {
                target: point,
                ..request.clone()
            };
            segments.extend(self.segmenter.segment(&self.model, &from, &chord)?);
            from = chord.target;
        }

        self.enqueue(planner, segments, &request, None)
    }

    fn enqueue<P: Planner + ?Sized>(
        &mut self,
        planner: &mut P,
        segments: Vec<MotorSegment>,
        request: &MotionRequest,
        ticket: Option<&JogTicket>,
    ) -> Result<usize, MotionError> {
        let mut accepted = 0;
        for (index, segment) in segments.into_iter().enumerate() {
            if ticket.is_some_and(|ticket| !ticket.is_current()) {
                tracing::debug!("Jog superseded after {} segments", accepted);
                break;
            }

            let motors = segment.motors.clone();
            planner
                .enqueue(PlannerSegment {
                    motors: segment.motors,
                    target: segment.target,
                    feed_rate: segment.feed_rate,
                    motion_type: request.motion_type,
                    is_jog: request.is_jog,
                    line_number: request.line_number,
                })
                .map_err(|source| {
                    tracing::warn!("Planner rejected segment {}: {}", index, source);
                    MotionError::PlannerRejected {
                        segment: index,
                        source,
                    }
                })?;

            self.motors = motors;
            accepted += 1;
        }
        Ok(accepted)
    }

    /// Read-only view of the homing state
    pub fn homing_state(&self) -> HomingStateHandle {
        self.homing.state_handle()
    }

    pub fn homing_cycles(&self) -> &HomingCycles {
        self.homing.cycles()
    }

    /// Resolve a `$H`-style request to the axis groups to home, in order
    pub fn resolve_homing(&self, request: &str) -> Result<Vec<AxisMask>, HomingError> {
        HomingRequest::parse(request)?.resolve(self.homing.cycles())
    }

    /// Gate and start a homing cycle
    pub fn start_homing(
        &mut self,
        axes: AxisMask,
        safety: &SafetyInputs,
    ) -> Result<CycleStart, HomingError> {
        self.jog.cancel();
        self.homing.start_cycle(&self.model, axes, safety)
    }

    /// Advance the active homing cycle
    ///
    /// On completion the tracked position moves to the homed pose.
    pub fn homing_step(&mut self, poll: HomingPoll) -> motionkit_core::Result<HomingStep> {
        let step = self.homing.step(&self.model, poll)?;
        if let HomingStep::Done(outcome) = step {
            self.finish_homing(outcome.homed)?;
        }
        Ok(step)
    }

    pub fn abort_homing(&mut self, reason: AbortReason) -> Result<(), HomingError> {
        self.homing.abort(reason)
    }

    /// Set the tracked position of `axes` to their home switch positions
    pub fn finish_homing(&mut self, axes: AxisMask) -> Result<(), KinematicsError> {
        let homed = self.model.homed_motor_position(
            axes,
            &self.motors,
            self.homing.home_position(),
        )?;
        tracing::debug!("Homed {}: motors at {}", axes, homed);
        self.motors = homed;
        Ok(())
    }

    /// Alarm unlock for `axes`
    pub fn unlock(&mut self, axes: AxisMask) -> Result<MotorMask, HomingError> {
        self.homing.unlock(&self.model, axes)
    }

    /// Forget homed state and cancel any jog
    pub fn reset(&mut self) {
        self.jog.cancel();
        self.homing.reset();
    }
}
