use std::path::Path;

use window_mask::settings::{
    MaskConfig, Settings, DEFAULT_HEIGHT, DEFAULT_OFFSET_X, DEFAULT_OFFSET_Y, DEFAULT_OPACITY,
    DEFAULT_WIDTH,
};

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("does_not_exist.json"));
    assert_eq!(
        settings.mask,
        MaskConfig {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            opacity: DEFAULT_OPACITY,
            offset_x: DEFAULT_OFFSET_X,
            offset_y: DEFAULT_OFFSET_Y,
        }
    );
    assert!(!settings.debug_logging);
    assert!(settings.log_file.is_none());
}

#[test]
fn malformed_json_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert_eq!(Settings::load(&path), Settings::default());
}

#[test]
fn each_field_falls_back_independently() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    // width has the wrong type, offset_y is absent; both fall back while the
    // valid keys around them are honoured.
    std::fs::write(
        &path,
        r#"{"mask": {"width": "wide", "height": 640, "opacity": 128, "offset_x": -5}}"#,
    )
    .unwrap();

    let settings = Settings::load(&path);
    assert_eq!(settings.mask.width, DEFAULT_WIDTH);
    assert_eq!(settings.mask.height, 640);
    assert_eq!(settings.mask.opacity, 128);
    assert_eq!(settings.mask.offset_x, -5);
    assert_eq!(settings.mask.offset_y, DEFAULT_OFFSET_Y);
}

#[test]
fn top_level_keys_are_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{"mask": {}, "debug_logging": true, "log_file": "mask.log"}"#,
    )
    .unwrap();

    let settings = Settings::load(&path);
    assert!(settings.debug_logging);
    assert_eq!(settings.log_file.as_deref(), Some(Path::new("mask.log")));
}

#[test]
fn reload_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{"mask": {"width": 300, "height": 500, "opacity": 200, "offset_x": 10, "offset_y": 20}}"#,
    )
    .unwrap();

    let first = Settings::load(&path);
    let second = Settings::load(&path);
    assert_eq!(first, second);
}

#[test]
fn saved_settings_load_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let settings = Settings {
        mask: MaskConfig {
            width: 320,
            height: 480,
            opacity: 64,
            offset_x: 0,
            offset_y: -40,
        },
        debug_logging: true,
        log_file: None,
    };
    settings.save(&path).unwrap();
    assert_eq!(Settings::load(&path), settings);
}
