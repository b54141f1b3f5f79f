//! Jog clamping and supersession
//!
//! Jog requests pass through the kinematics' `constrain_jog` before they
//! reach the inverse transform; other requests pass through untouched.
//! Every jog takes a [`JogTicket`]. A newer jog, or an explicit cancel,
//! invalidates older tickets so that in-flight segmentation of a
//! superseded jog stops at its next check.

use crate::kinematics::KinematicModel;
use motionkit_core::{CartesianPosition, MotionRequest};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cloneable handle that cancels the active jog from any thread
#[derive(Debug, Clone, Default)]
pub struct JogHandle {
    generation: Arc<AtomicU64>,
}

impl JogHandle {
    /// Invalidate every outstanding ticket
    pub fn cancel(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Jog cancelled, generation {}", generation);
    }

    fn issue(&self) -> JogTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        JogTicket {
            generation,
            current: Arc::clone(&self.generation),
        }
    }
}

/// Proof that a jog is still the latest one
#[derive(Debug, Clone)]
pub struct JogTicket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl JogTicket {
    /// Whether no newer jog or cancel has happened since this ticket
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Applies jog clamping and hands out jog tickets
#[derive(Debug, Clone, Default)]
pub struct JogGuard {
    handle: JogHandle,
}

impl JogGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for cancelling jogs from elsewhere
    pub fn handle(&self) -> JogHandle {
        self.handle.clone()
    }

    /// Clamp a jog request; non-jog requests come back unchanged
    pub fn guard(
        &self,
        model: &KinematicModel,
        mut request: MotionRequest,
        current: &CartesianPosition,
    ) -> MotionRequest {
        if request.is_jog {
            model.constrain_jog(&mut request, current);
        }
        request
    }

    /// Start a new jog, superseding any older one
    pub fn begin(&self) -> JogTicket {
        self.handle.issue()
    }

    /// Cancel the active jog
    pub fn cancel(&self) {
        self.handle.cancel();
    }
}
