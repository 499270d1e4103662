use gb_core::{Address, FlowUnit};
use gb_project::schema::*;
use gb_project::{ProjectError, ValidationError, load_or_default, load_yaml, save_yaml};

#[test]
fn roundtrip_yaml_default_settings() {
    let settings = Settings::default();

    let path = std::env::temp_dir().join("gb_project_roundtrip_default.yaml");
    save_yaml(&path, &settings).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(settings, loaded);
}

#[test]
fn roundtrip_yaml_custom_bench() {
    let settings = Settings {
        version: LATEST_VERSION,
        connection: ConnectionDef {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 38_400,
        },
        instruments: vec![
            InstrumentDef {
                address: 4,
                name: "Span".to_string(),
                role: RoleDef::Source,
                unit: FlowUnit::LitersPerMinute,
                min_flow: 0.01,
                max_flow: 1.0,
                accuracy: AccuracyDef {
                    reading_pct: 0.8,
                    full_scale_pct: 0.2,
                },
            },
            InstrumentDef {
                address: 12,
                name: "Zero air".to_string(),
                role: RoleDef::Diluent,
                unit: FlowUnit::LitersPerMinute,
                min_flow: 0.0,
                max_flow: 5.0,
                accuracy: AccuracyDef::default(),
            },
        ],
        blend: BlendDef {
            max_flow_per_channel: 1.0,
            diluent_ppm: 0.0,
            source_ppm: 1000.0,
            target_ppm: 50.0,
        },
        calibration: CalibrationDef {
            back_and_forth: true,
            ..CalibrationDef::default()
        },
    };

    let path = std::env::temp_dir().join("gb_project_roundtrip_custom.yaml");
    save_yaml(&path, &settings).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(settings, loaded);

    let registry = loaded.to_registry().unwrap();
    let span = registry.get(Address::new(4)).unwrap();
    assert_eq!(span.name, "Span");
    assert_eq!(span.accuracy.reading_pct, 0.8);
}

#[test]
fn invalid_settings_are_not_saved() {
    let mut settings = Settings::default();
    settings.instruments[1].address = settings.instruments[0].address;

    let path = std::env::temp_dir().join("gb_project_invalid.yaml");
    let err = save_yaml(&path, &settings).unwrap_err();
    assert!(matches!(
        err,
        ProjectError::Validation(ValidationError::DuplicateAddress { .. })
    ));
}

#[test]
fn load_rejects_invalid_file() {
    let path = std::env::temp_dir().join("gb_project_overlap.yaml");
    std::fs::write(
        &path,
        r#"
version: 1
instruments:
  - address: 8
    unit: mln/min
    min_flow: 0.1
    max_flow: 10
  - address: 5
    unit: ml/min
    min_flow: 5
    max_flow: 150
"#,
    )
    .unwrap();

    assert!(matches!(
        load_yaml(&path),
        Err(ProjectError::Validation(ValidationError::OverlappingRanges { .. }))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let path = std::env::temp_dir().join("gb_project_does_not_exist.yaml");
    let _ = std::fs::remove_file(&path);
    assert!(matches!(load_yaml(&path), Err(ProjectError::Io(_))));
}

#[test]
fn no_path_means_defaults() {
    assert_eq!(load_or_default(None).unwrap(), Settings::default());
}
