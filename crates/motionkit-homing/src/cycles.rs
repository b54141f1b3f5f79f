//! Homing cycle resolution
//!
//! Every homed axis belongs to a numbered cycle. A full homing run executes
//! the non-empty cycles in ascending order; cycle 0 keeps an axis out of the
//! full run so it can only be homed on request.
//!
//! Requests follow the `$H` convention:
//! - empty: every cycle in order
//! - digits (`"21"`): the listed cycles in the given order
//! - axis letters (`"XZ"`): those axes together as one cycle

use motionkit_core::{axis_name, AxisMask, HomingError, MAX_N_AXIS};
use motionkit_settings::MachineConfig;
use std::str::FromStr;

/// Cycle assignment of the configured axes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomingCycles {
    cycles: [AxisMask; 10],
    configured: AxisMask,
    single_axis: AxisMask,
}

impl HomingCycles {
    pub fn from_config(config: &MachineConfig) -> Self {
        let mut cycles = Self::default();
        for (axis, settings) in config.axes.iter().enumerate().take(MAX_N_AXIS) {
            let Some(homing) = &settings.homing else {
                continue;
            };
            cycles.configured.insert(axis);
            if homing.allow_single_axis {
                cycles.single_axis.insert(axis);
            }
            if let Some(mask) = cycles.cycles.get_mut(homing.cycle as usize) {
                mask.insert(axis);
            }
        }
        cycles
    }

    /// Whether any axis can be homed
    pub fn is_enabled(&self) -> bool {
        !self.configured.is_empty()
    }

    /// Axes with a homing configuration
    pub fn configured(&self) -> AxisMask {
        self.configured
    }

    /// Axes of cycle `cycle`
    pub fn axis_mask_from_cycle(&self, cycle: u8) -> AxisMask {
        self.cycles
            .get(cycle as usize)
            .copied()
            .unwrap_or(AxisMask::NONE)
    }

    /// Non-empty cycles of the full run, in execution order
    pub fn cycles(&self) -> Vec<AxisMask> {
        self.cycles[1..]
            .iter()
            .copied()
            .filter(|mask| !mask.is_empty())
            .collect()
    }

    /// Whether `axes` is exactly one of the cycles of the full run
    pub fn is_cycle(&self, axes: AxisMask) -> bool {
        !axes.is_empty() && self.cycles[1..].contains(&axes)
    }

    /// Reject an ad-hoc axis group containing an axis that forbids it
    pub fn check_single_axis(&self, axes: AxisMask) -> Result<(), HomingError> {
        if self.is_cycle(axes) {
            return Ok(());
        }
        match (axes - self.single_axis).iter().next() {
            Some(axis) => Err(HomingError::SingleAxisNotAllowed {
                axis: axis_name(axis).to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Parsed homing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomingRequest {
    /// Every cycle in ascending order
    All,
    /// The listed cycles, in the given order
    Cycles(Vec<u8>),
    /// The given axes as a single cycle
    Axes(AxisMask),
}

impl HomingRequest {
    pub fn parse(request: &str) -> Result<Self, HomingError> {
        let text = request.trim();
        let invalid = || HomingError::InvalidRequest {
            request: request.to_string(),
        };

        if text.is_empty() {
            return Ok(Self::All);
        }
        if text.chars().all(|c| c.is_ascii_digit()) {
            let cycles = text
                .chars()
                .filter_map(|c| c.to_digit(10))
                .map(|d| d as u8)
                .collect();
            return Ok(Self::Cycles(cycles));
        }
        AxisMask::from_names(text)
            .map(Self::Axes)
            .ok_or_else(invalid)
    }

    /// Axis groups to home, in order
    pub fn resolve(&self, cycles: &HomingCycles) -> Result<Vec<AxisMask>, HomingError> {
        if !cycles.is_enabled() {
            return Err(HomingError::Disabled);
        }
        match self {
            Self::All => {
                let run = cycles.cycles();
                if run.is_empty() {
                    return Err(HomingError::Disabled);
                }
                Ok(run)
            }
            Self::Cycles(numbers) => numbers
                .iter()
                .map(|&cycle| {
                    let mask = cycles.axis_mask_from_cycle(cycle);
                    if mask.is_empty() {
                        Err(HomingError::EmptyCycle { cycle })
                    } else {
                        Ok(mask)
                    }
                })
                .collect(),
            Self::Axes(axes) => {
                cycles.check_single_axis(*axes)?;
                Ok(vec![*axes])
            }
        }
    }
}

impl FromStr for HomingRequest {
    type Err = HomingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
