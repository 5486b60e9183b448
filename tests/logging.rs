use serial_test::serial;
use std::time::Duration;

#[test]
#[serial]
fn writes_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("window_mask.log");

    window_mask::logging::init(true, Some(path.clone()));
    tracing::info!("logging smoke test entry");
    tracing::debug!("debug level is enabled");

    // The appender writes from a background thread; give it a moment.
    std::thread::sleep(Duration::from_millis(200));

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("logging smoke test entry"));
    assert!(content.contains("debug level is enabled"));
}
