use motionkit_settings::{
    AxisSettings, ConfigError, DeltaSettings, KinematicsSettings, MachineConfig, SettingsError,
};
use tempfile::TempDir;

fn delta_machine() -> MachineConfig {
    let mut config = MachineConfig {
        name: "Kossel mini".to_string(),
        kinematics: KinematicsSettings::ParallelDelta(DeltaSettings::default()),
        axes: vec![
            AxisSettings::new("X", 1.6, 1),
            AxisSettings::new("Y", 1.6, 1),
            AxisSettings::new("Z", 1.6, 1),
        ],
        ..MachineConfig::default()
    };
    config.motion.segment_tolerance_mm = 0.02;
    config
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("machine.toml");

    let config = delta_machine();
    config.save_to_file(&path).unwrap();
    let loaded = MachineConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("machine.json");

    let config = MachineConfig::default();
    config.save_to_file(&path).unwrap();
    let loaded = MachineConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("machine.yaml");

    assert!(matches!(
        MachineConfig::default().save_to_file(&path),
        Err(SettingsError::Config(ConfigError::UnsupportedFormat(_)))
    ));

    std::fs::write(&path, "name: x").unwrap();
    assert!(matches!(
        MachineConfig::load_from_file(&path),
        Err(SettingsError::Config(ConfigError::UnsupportedFormat(_)))
    ));
}

#[test]
fn test_invalid_file_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("machine.toml");
    std::fs::write(
        &path,
        r#"
name = "broken"

[kinematics]
type = "cartesian"

[[axes]]
name = "X"
max_travel_mm = -5.0
"#,
    )
    .unwrap();

    assert!(matches!(
        MachineConfig::load_from_file(&path),
        Err(SettingsError::Config(ConfigError::ValueOutOfRange { .. }))
    ));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = MachineConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, SettingsError::Read { .. }));
    assert!(err.is_not_found());
}
