//! Simulated machine
//!
//! Drives a [`MotionGateway`] without hardware: planner segments are
//! consumed as soon as they are queued, and homing runs against simulated
//! limit switches on a tokio interval. Cancellation arrives through a
//! `watch` channel and is checked at every poll.

use motionkit_core::{AxisMask, MotionRequest, MotorMask, Result};
use motionkit_homing::{AbortReason, CycleStart, HomingPoll, HomingStep, SafetyInputs};
use motionkit_motion::{MotionGateway, SegmentQueue};
use std::time::Duration;
use tokio::sync::watch;

/// Sender side of the homing cancel channel
pub type CancelSender = watch::Sender<Option<AbortReason>>;
/// Receiver side of the homing cancel channel
pub type CancelReceiver = watch::Receiver<Option<AbortReason>>;

/// Channel used to cancel a running homing sequence
pub fn cancel_channel() -> (CancelSender, CancelReceiver) {
    watch::channel(None)
}

/// Simulation parameters
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    /// Polling period of the homing driver
    pub tick: Duration,
    /// Polls needed to cover the whole approach move
    pub ticks_per_approach: u32,
    /// Per axis, the fraction of the approach at which its switch trips.
    /// `None` simulates a switch that never trips.
    pub trip_at: Vec<Option<f64>>,
    /// Planner queue depth
    pub queue_size: usize,
}

impl SimulationSettings {
    /// Every switch trips halfway through the approach
    pub fn new(n_axis: usize) -> Self {
        Self {
            tick: Duration::from_millis(2),
            ticks_per_approach: 40,
            trip_at: vec![Some(0.5); n_axis],
            queue_size: 256,
        }
    }

    fn trips(&self, axis: usize, travelled: f64) -> bool {
        self.trip_at
            .get(axis)
            .copied()
            .flatten()
            .is_some_and(|at| travelled >= at)
    }
}

/// How a homing sequence ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingReport {
    /// Every requested cycle completed
    Homed(AxisMask),
    /// A cycle was aborted; `homed` holds the cycles finished before it
    Aborted {
        homed: AxisMask,
        axes: AxisMask,
        reason: AbortReason,
    },
}

enum CycleEnd {
    Homed(AxisMask),
    Aborted(AbortReason),
}

/// Gateway plus simulated planner and limit switches
#[derive(Debug)]
pub struct SimulatedMachine {
    gateway: MotionGateway,
    queue: SegmentQueue,
    settings: SimulationSettings,
    executed: usize,
}

impl SimulatedMachine {
    pub fn new(gateway: MotionGateway, settings: SimulationSettings) -> Self {
        let queue = SegmentQueue::with_capacity(settings.queue_size);
        Self {
            gateway,
            queue,
            settings,
            executed: 0,
        }
    }

    pub fn gateway(&self) -> &MotionGateway {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut MotionGateway {
        &mut self.gateway
    }

    /// Segments consumed so far
    pub fn executed_segments(&self) -> usize {
        self.executed
    }

    /// Run one move to completion
    pub fn execute(&mut self, request: MotionRequest) -> Result<usize> {
        let accepted = self.gateway.move_to(&mut self.queue, request)?;
        self.executed += self.queue.drain().len();
        tracing::debug!("Executed {} segments, now at {}", accepted, self.gateway.position());
        Ok(accepted)
    }

    /// Home the machine as `$H<request>` would
    ///
    /// Cycles run in order; the sequence stops at the first aborted cycle.
    pub async fn home(
        &mut self,
        request: &str,
        safety: &SafetyInputs,
        mut cancel: CancelReceiver,
    ) -> Result<HomingReport> {
        let cycles = self.gateway.resolve_homing(request)?;
        tracing::info!("Homing {} cycle(s)", cycles.len());

        let mut homed = AxisMask::NONE;
        for axes in cycles {
            match self.run_cycle(axes, safety, &mut cancel).await? {
                CycleEnd::Homed(axes) => homed = homed | axes,
                CycleEnd::Aborted(reason) => {
                    return Ok(HomingReport::Aborted {
                        homed,
                        axes,
                        reason,
                    })
                }
            }
        }

        tracing::info!("Homing finished, machine at {}", self.gateway.position());
        Ok(HomingReport::Homed(homed))
    }

    async fn run_cycle(
        &mut self,
        axes: AxisMask,
        safety: &SafetyInputs,
        cancel: &mut CancelReceiver,
    ) -> Result<CycleEnd> {
        let plan = match self.gateway.start_homing(axes, safety)? {
            CycleStart::Done(outcome) => return Ok(CycleEnd::Homed(outcome.homed)),
            CycleStart::Plan(plan) => plan,
        };

        let increment = 1.0 / f64::from(self.settings.ticks_per_approach.max(1));
        let mut interval = tokio::time::interval(self.settings.tick);
        let mut moving = plan.motors;
        let mut travelled = 0.0_f64;

        loop {
            interval.tick().await;
            let requested = *cancel.borrow_and_update();

            travelled = (travelled + increment).min(1.0);
            let limited = moving
                .iter()
                .filter(|&(axis, _)| self.settings.trips(axis, travelled))
                .fold(MotorMask::NONE, |mask, (axis, motor_num)| {
                    mask | MotorMask::motor(axis, motor_num)
                });

            let step = self.gateway.homing_step(HomingPoll {
                limited,
                motion_done: travelled >= 1.0,
                cancel: requested,
            })?;
            match step {
                HomingStep::Continue { motors } => moving = motors,
                HomingStep::Done(outcome) => return Ok(CycleEnd::Homed(outcome.homed)),
                HomingStep::Aborted(reason) => return Ok(CycleEnd::Aborted(reason)),
            }
        }
    }
}
