use std::path::Path;

use window_mask::settings::Settings;
use window_mask::tray::TrayIcon;
use window_mask::{console, logging, tracker, SETTINGS_FILE, TARGET_PROCESS};

fn main() -> anyhow::Result<()> {
    let settings_path = Path::new(SETTINGS_FILE);
    let settings = Settings::load(settings_path);
    logging::init(settings.debug_logging, settings.log_file.clone());
    // The load above ran before the subscriber existed; repeat the summary.
    tracing::info!(mask = ?settings.mask, "starting");

    console::hide_console_window();

    // Without the tray there is no way to exit the program; treat a tray
    // failure as fatal rather than running headless. Still exit code 0.
    let _tray = match TrayIcon::create() {
        Ok(tray) => tray,
        Err(err) => {
            tracing::error!(%err, "tray unavailable; exiting");
            return Ok(());
        }
    };

    tracker::run(settings_path, TARGET_PROCESS, settings)
}
