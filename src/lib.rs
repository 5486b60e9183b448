pub mod console;
pub mod locator;
pub mod logging;
pub mod overlay;
pub mod settings;
pub mod tracker;
pub mod tray;

/// Executable name of the application being masked. Matching is exact and
/// case-sensitive.
pub const TARGET_PROCESS: &str = "WeChat.exe";

/// Settings file, read from the working directory.
pub const SETTINGS_FILE: &str = "settings.json";
