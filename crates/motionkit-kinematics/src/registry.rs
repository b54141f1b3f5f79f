//! Kinematics factory
//!
//! Resolves the kinematics selected in a [`MachineConfig`] to an
//! initialised [`KinematicModel`]. Built-in variants are always available;
//! custom variants are registered by name with a constructor that receives
//! the free-form parameter table of the configuration.

use crate::kinematics::cartesian::SoftLimits;
use crate::kinematics::{Cartesian, CoreXY, KinematicModel, KinematicSystem, ParallelDelta};
use motionkit_core::{ConfigurationError, MAX_N_AXIS};
use motionkit_settings::{KinematicsSettings, MachineConfig};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Parameter table handed to custom constructors
pub type KinematicsParams = BTreeMap<String, f64>;

/// Constructor of a custom kinematics
pub type KinematicsConstructor = Arc<
    dyn Fn(&KinematicsParams) -> Result<Box<dyn KinematicSystem>, ConfigurationError>
        + Send
        + Sync,
>;

/// Names of the built-in variants
pub const BUILTIN_KINEMATICS: [&str; 3] = ["cartesian", "corexy", "parallel_delta"];

/// Name to constructor lookup for kinematics
#[derive(Clone, Default)]
pub struct KinematicsRegistry {
    custom: BTreeMap<String, KinematicsConstructor>,
}

impl fmt::Debug for KinematicsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KinematicsRegistry")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl KinematicsRegistry {
    /// Registry with only the built-in variants
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom kinematics, replacing any previous one of that name
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&KinematicsParams) -> Result<Box<dyn KinematicSystem>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        tracing::debug!("Registered custom kinematics '{}'", name);
        self.custom.insert(name, Arc::new(constructor));
    }

    /// Whether a custom kinematics of that name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.custom.contains_key(name)
    }

    /// Built-in and registered names
    pub fn names(&self) -> Vec<String> {
        BUILTIN_KINEMATICS
            .iter()
            .map(|name| name.to_string())
            .chain(self.custom.keys().cloned())
            .collect()
    }

    /// Build and initialise the kinematics selected by `config`
    pub fn create(&self, config: &MachineConfig) -> Result<KinematicModel, ConfigurationError> {
        match config.n_axis() {
            0 => {
                return Err(ConfigurationError::InvalidAxes {
                    reason: "no axes configured".to_string(),
                })
            }
            n if n > MAX_N_AXIS => {
                return Err(ConfigurationError::InvalidAxes {
                    reason: format!("{} axes configured, at most {} supported", n, MAX_N_AXIS),
                })
            }
            _ => {}
        }
        let layout = config.layout();
        let soft_limits = SoftLimits::new(config.soft_limits());

        let mut model = match &config.kinematics {
            KinematicsSettings::Cartesian => {
                KinematicModel::cartesian(Cartesian::new(soft_limits), layout)
            }
            KinematicsSettings::CoreXY(settings) => {
                KinematicModel::corexy(CoreXY::new(settings.x_scaler, soft_limits), layout)
            }
            KinematicsSettings::ParallelDelta(settings) => {
                KinematicModel::parallel_delta(ParallelDelta::from_settings(settings), layout)
            }
            KinematicsSettings::Custom(settings) => {
                let constructor = self.custom.get(&settings.name).ok_or_else(|| {
                    ConfigurationError::UnknownKinematics {
                        name: settings.name.clone(),
                    }
                })?;
                KinematicModel::custom(constructor(&settings.params)?, layout)
            }
        };

        model.init()?;
        tracing::info!(
            "Kinematics '{}' initialised for {} axes ({} motors)",
            model.name(),
            layout.n_axis(),
            layout.motor_count()
        );
        Ok(model)
    }
}
