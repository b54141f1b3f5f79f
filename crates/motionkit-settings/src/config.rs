//! Machine description for MotionKit
//!
//! The machine description is organized into logical groups:
//! - Kinematics selection and its geometry constants
//! - Axes (travel, soft limits, ganged motors, homing group)
//! - Motion tolerances (line segmentation, arc expansion)
//!
//! Supports JSON and TOML file formats. Values are range-checked on load;
//! geometry consistency is checked when the kinematics is initialised.

use crate::error::{ConfigError, SettingsError, SettingsResult};
use motionkit_core::{axis_name, AxisLayout, AxisMask, MAX_N_AXIS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Deepest allowed recursion of the line segmenter
pub const MAX_SEGMENT_DEPTH: u32 = 20;

/// Highest homing cycle number
pub const MAX_HOMING_CYCLE: u8 = 9;

/// CoreXY geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreXYSettings {
    /// Scale applied to X before mixing (1.0 for CoreXY, 0.5 for midTbot style)
    pub x_scaler: f64,
}

impl Default for CoreXYSettings {
    fn default() -> Self {
        Self { x_scaler: 1.0 }
    }
}

/// Rotary three-arm delta geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaSettings {
    /// Length of the motor crank (upper arm)
    pub crank_mm: f64,
    /// Side of the triangle through the crank pivots
    pub base_triangle_mm: f64,
    /// Length of the parallel arms
    pub arm_mm: f64,
    /// Side of the triangle through the effector joints
    pub effector_triangle_mm: f64,
    /// Lowest allowed crank angle (raised arm)
    pub max_negative_angle_rad: f64,
    /// Highest allowed crank angle (lowered arm)
    pub max_positive_angle_rad: f64,
    /// Crank angle at which the arm limit switches trip
    pub homing_angle_rad: f64,
}

impl Default for DeltaSettings {
    fn default() -> Self {
        Self {
            crank_mm: 70.0,
            base_triangle_mm: 179.437,
            arm_mm: 133.5,
            effector_triangle_mm: 86.603,
            max_negative_angle_rad: -0.75,
            max_positive_angle_rad: 1.57,
            homing_angle_rad: -0.75,
        }
    }
}

/// Kinematics registered at runtime under a name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomKinematicsSettings {
    /// Registered name
    pub name: String,
    /// Free-form numeric parameters for the constructor
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

/// Kinematics selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KinematicsSettings {
    /// Identity mapping
    Cartesian,
    /// Belt-mixed X/Y
    #[serde(rename = "corexy")]
    CoreXY(CoreXYSettings),
    /// Rotary delta
    ParallelDelta(DeltaSettings),
    /// Registered custom kinematics
    Custom(CustomKinematicsSettings),
}

impl Default for KinematicsSettings {
    fn default() -> Self {
        Self::Cartesian
    }
}

impl KinematicsSettings {
    /// Name used for factory lookup
    pub fn name(&self) -> &str {
        match self {
            Self::Cartesian => "cartesian",
            Self::CoreXY(_) => "corexy",
            Self::ParallelDelta(_) => "parallel_delta",
            Self::Custom(custom) => &custom.name,
        }
    }
}

/// Homing group of one axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisHomingSettings {
    /// Cycle number in the all-axes run, 0 excludes the axis from it
    pub cycle: u8,
    /// Whether `$H<axis>`-style single axis homing is allowed
    pub allow_single_axis: bool,
    /// Home toward the positive end of travel
    pub positive_direction: bool,
    /// Machine position assigned at the home switch
    pub mpos_mm: f64,
    /// Seek rate in mm/min
    pub seek_mm_per_min: f64,
    /// Locate rate in mm/min
    pub feed_mm_per_min: f64,
}

impl Default for AxisHomingSettings {
    fn default() -> Self {
        Self {
            cycle: 1,
            allow_single_axis: true,
            positive_direction: true,
            mpos_mm: 0.0,
            seek_mm_per_min: 200.0,
            feed_mm_per_min: 50.0,
        }
    }
}

/// One logical axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSettings {
    /// Axis letter, must match its position (X, Y, Z, A, B, C)
    pub name: String,
    /// Length of travel
    pub max_travel_mm: f64,
    /// Clip/reject motion outside the travel range
    #[serde(default)]
    pub soft_limits: bool,
    /// Axis is driven by two motors
    #[serde(default)]
    pub ganged: bool,
    /// Homing group, `None` when the axis is not homed
    #[serde(default)]
    pub homing: Option<AxisHomingSettings>,
}

impl AxisSettings {
    /// Axis with default homing in cycle `cycle`
    pub fn new(name: &str, max_travel_mm: f64, cycle: u8) -> Self {
        Self {
            name: name.to_string(),
            max_travel_mm,
            soft_limits: false,
            ganged: false,
            homing: Some(AxisHomingSettings {
                cycle,
                ..AxisHomingSettings::default()
            }),
        }
    }

    /// Machine-position range `(min, max)` covered by the axis travel
    pub fn travel_range(&self) -> (f64, f64) {
        match &self.homing {
            Some(homing) if homing.positive_direction => {
                (homing.mpos_mm - self.max_travel_mm, homing.mpos_mm)
            }
            Some(homing) => (homing.mpos_mm, homing.mpos_mm + self.max_travel_mm),
            None => (-self.max_travel_mm, 0.0),
        }
    }
}

/// Motion tolerances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// Max deviation of a motor-space chord from the true line
    pub segment_tolerance_mm: f64,
    /// Recursion limit of the line segmenter
    pub max_segment_depth: u32,
    /// Max deviation of an arc chord from the true arc
    pub arc_tolerance_mm: f64,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            segment_tolerance_mm: 0.01,
            max_segment_depth: 12,
            arc_tolerance_mm: 0.002,
        }
    }
}

/// Complete machine description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Machine name, for reporting
    #[serde(default = "default_machine_name")]
    pub name: String,
    /// Kinematics selection
    #[serde(default)]
    pub kinematics: KinematicsSettings,
    /// Axes in order X, Y, Z, A, B, C
    pub axes: Vec<AxisSettings>,
    /// Motion tolerances
    #[serde(default)]
    pub motion: MotionSettings,
}

fn default_machine_name() -> String {
    "MotionKit".to_string()
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: default_machine_name(),
            kinematics: KinematicsSettings::Cartesian,
            axes: vec![
                AxisSettings::new("X", 300.0, 2),
                AxisSettings::new("Y", 300.0, 2),
                AxisSettings::new("Z", 100.0, 1),
            ],
            motion: MotionSettings::default(),
        }
    }
}

impl MachineConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location of the machine description
    pub fn default_path() -> SettingsResult<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| {
            ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string())
        })?;
        Ok(dir.join("motionkit").join("machine.toml"))
    }

    /// Parse a TOML machine description
    pub fn from_toml_str(content: &str) -> SettingsResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        config.validate()?;
        tracing::info!(
            "Loaded machine '{}' ({} kinematics, {} axes) from {}",
            config.name,
            config.kinematics.name(),
            config.axes.len(),
            path.display()
        );
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        std::fs::write(path, content).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }

    /// Validate value ranges
    pub fn validate(&self) -> SettingsResult<()> {
        if self.axes.is_empty() || self.axes.len() > MAX_N_AXIS {
            return Err(ConfigError::out_of_range("axes", self.axes.len()).into());
        }

        for (index, axis) in self.axes.iter().enumerate() {
            let expected = axis_name(index);
            if !axis.name.eq_ignore_ascii_case(&expected.to_string()) {
                return Err(SettingsError::invalid(
                    format!("axes[{}].name", index),
                    format!("expected {}, found '{}'", expected, axis.name),
                ));
            }

            if !(axis.max_travel_mm.is_finite() && axis.max_travel_mm > 0.0) {
                return Err(ConfigError::out_of_range(
                    format!("axes.{}.max_travel_mm", expected),
                    axis.max_travel_mm,
                )
                .into());
            }

            if let Some(homing) = &axis.homing {
                if homing.cycle > MAX_HOMING_CYCLE {
                    return Err(ConfigError::out_of_range(
                        format!("axes.{}.homing.cycle", expected),
                        homing.cycle,
                    )
                    .into());
                }
                if homing.seek_mm_per_min <= 0.0 || homing.feed_mm_per_min <= 0.0 {
                    return Err(SettingsError::invalid(
                        format!("axes.{}.homing", expected),
                        "homing rates must be > 0",
                    ));
                }
            }
        }

        let motion = &self.motion;
        if !(motion.segment_tolerance_mm.is_finite() && motion.segment_tolerance_mm > 0.0) {
            return Err(ConfigError::out_of_range(
                "motion.segment_tolerance_mm",
                motion.segment_tolerance_mm,
            )
            .into());
        }
        if !(motion.arc_tolerance_mm.is_finite() && motion.arc_tolerance_mm > 0.0) {
            return Err(
                ConfigError::out_of_range("motion.arc_tolerance_mm", motion.arc_tolerance_mm)
                    .into(),
            );
        }
        if motion.max_segment_depth == 0 || motion.max_segment_depth > MAX_SEGMENT_DEPTH {
            return Err(ConfigError::out_of_range(
                "motion.max_segment_depth",
                motion.max_segment_depth,
            )
            .into());
        }

        if let KinematicsSettings::Custom(custom) = &self.kinematics {
            if custom.name.trim().is_empty() {
                return Err(ConfigError::MissingKey("kinematics.name".to_string()).into());
            }
        }

        Ok(())
    }

    /// Number of configured axes
    pub fn n_axis(&self) -> usize {
        self.axes.len()
    }

    /// Axis-to-motor layout
    pub fn layout(&self) -> AxisLayout {
        let ganged = self
            .axes
            .iter()
            .enumerate()
            .filter(|(_, axis)| axis.ganged)
            .fold(AxisMask::NONE, |mask, (index, _)| mask | AxisMask::bit(index));
        AxisLayout::new(self.axes.len(), ganged)
    }

    /// Axes that have a homing group
    pub fn homing_axes(&self) -> AxisMask {
        self.axes
            .iter()
            .enumerate()
            .filter(|(_, axis)| axis.homing.is_some())
            .fold(AxisMask::NONE, |mask, (index, _)| mask | AxisMask::bit(index))
    }

    /// Travel range per axis for axes with soft limits enabled, `None` elsewhere
    pub fn soft_limits(&self) -> Vec<Option<(f64, f64)>> {
        self.axes
            .iter()
            .map(|axis| axis.soft_limits.then(|| axis.travel_range()))
            .collect()
    }
}
