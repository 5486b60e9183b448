//! The tracking loop: a single-threaded state machine that polls the target
//! window every [`POLL_INTERVAL`] and reconciles the mask's position,
//! visibility and existence against it, while servicing the UI message queue
//! continuously.

use crate::locator::TargetWindow;
use crate::settings::MaskConfig;
use std::time::Duration;

/// Fixed period between tracking re-evaluations. The message queue is pumped
/// far more often; only the tracking work runs on this cadence.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// No target, no mask; the locator is retried every poll.
    Searching,
    /// Target and mask both alive.
    Tracking,
}

/// Live state of the target window as observed at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    /// Window destroyed or closed.
    Gone,
    /// Window exists but is invisible or minimized.
    Hidden,
    /// Window exists and is viewable, with its current top-left corner.
    Visible { left: i32, top: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskAction {
    Reposition { x: i32, y: i32 },
    EnsureVisible,
    Hide,
    TearDown,
}

/// Observe the target for one tick.
pub fn observe_target(target: &TargetWindow) -> TargetStatus {
    if !target.exists() {
        return TargetStatus::Gone;
    }
    if !target.is_viewable() {
        return TargetStatus::Hidden;
    }
    match target.rect() {
        Some(rect) => TargetStatus::Visible {
            left: rect.left,
            top: rect.top,
        },
        // Rect queries can fail while the window is tearing down.
        None => TargetStatus::Hidden,
    }
}

/// Decide what a Tracking-state tick does. Visible targets pull the mask to
/// target top-left + offset and force it shown; hidden targets hide the mask
/// without destroying it; a gone target tears the mask down and drops back to
/// Searching.
pub fn plan_tick(status: TargetStatus, config: &MaskConfig) -> (TrackState, Vec<MaskAction>) {
    match status {
        TargetStatus::Visible { left, top } => (
            TrackState::Tracking,
            vec![
                MaskAction::Reposition {
                    x: left + config.offset_x,
                    y: top + config.offset_y,
                },
                MaskAction::EnsureVisible,
            ],
        ),
        TargetStatus::Hidden => (TrackState::Tracking, vec![MaskAction::Hide]),
        TargetStatus::Gone => (TrackState::Searching, vec![MaskAction::TearDown]),
    }
}

#[cfg(windows)]
mod platform {
    use super::{observe_target, plan_tick, MaskAction, TrackState, POLL_INTERVAL};
    use crate::locator::{find_target, TargetWindow};
    use crate::overlay::{mask_placement, MaskWindow};
    use crate::settings::Settings;
    use std::path::Path;
    use std::time::{Duration, Instant};
    use windows::Win32::UI::Input::KeyboardAndMouse::VK_ESCAPE;
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE, WM_KEYDOWN, WM_QUIT,
    };

    enum Pump {
        Continue,
        Quit,
    }

    fn pump_messages() -> Pump {
        unsafe {
            let mut msg = MSG::default();
            while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                if msg.message == WM_QUIT {
                    return Pump::Quit;
                }
                if msg.message == WM_KEYDOWN && msg.wParam.0 == VK_ESCAPE.0 as usize {
                    return Pump::Quit;
                }
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        Pump::Continue
    }

    fn tick(
        tracked: Option<(TargetWindow, MaskWindow)>,
        process_name: &str,
        settings: &Settings,
    ) -> Option<(TargetWindow, MaskWindow)> {
        match tracked {
            None => {
                let target = find_target(process_name)?;
                match MaskWindow::create(&target, &settings.mask) {
                    Ok(mask) => Some((target, mask)),
                    Err(err) => {
                        // Discard the located handle; re-locate next cycle.
                        tracing::warn!(%err, "mask creation failed; retrying next poll");
                        None
                    }
                }
            }
            Some((target, mut mask)) => {
                let (next, actions) = plan_tick(observe_target(&target), &settings.mask);
                for action in actions {
                    match action {
                        MaskAction::Reposition { x, y } => mask.reposition(x, y),
                        MaskAction::EnsureVisible => mask.ensure_visible(),
                        MaskAction::Hide => mask.hide(),
                        MaskAction::TearDown => mask.destroy(),
                    }
                }
                match next {
                    TrackState::Tracking => Some((target, mask)),
                    TrackState::Searching => {
                        tracing::info!("target window closed; searching again");
                        None
                    }
                }
            }
        }
    }

    /// Run until the pump observes `WM_QUIT` (tray exit) or an Escape keydown.
    /// The mask, when present, is always destroyed before returning.
    pub fn run(settings_path: &Path, process_name: &str, mut settings: Settings) -> anyhow::Result<()> {
        let mut tracked: Option<(TargetWindow, MaskWindow)> = None;
        let mut last_tick = Instant::now() - POLL_INTERVAL;
        tracing::info!(process = process_name, "tracking loop started; waiting for target window");

        loop {
            if let Pump::Quit = pump_messages() {
                break;
            }

            if crate::tray::take_reload_request() {
                settings = Settings::load(settings_path);
                tracing::info!("settings reloaded");
                // Position and opacity apply immediately; size stays fixed
                // until the next mask creation (see MaskWindow::apply_reload).
                if let Some((target, mask)) = &tracked {
                    if let Some(rect) = target.rect() {
                        let (x, y) = mask_placement(rect, &settings.mask);
                        mask.reposition(x, y);
                    }
                    mask.apply_reload(&settings.mask);
                }
            }

            if last_tick.elapsed() >= POLL_INTERVAL {
                tracked = tick(tracked, process_name, &settings);
                last_tick = Instant::now();
            }

            // Keep the loop resolution fine without busy-spinning.
            std::thread::sleep(Duration::from_millis(1));
        }

        if let Some((_, mut mask)) = tracked.take() {
            mask.destroy();
        }
        tracing::info!("tracking loop exited");
        Ok(())
    }
}

#[cfg(windows)]
pub use platform::run;

#[cfg(not(windows))]
pub fn run(
    _settings_path: &std::path::Path,
    _process_name: &str,
    _settings: crate::settings::Settings,
) -> anyhow::Result<()> {
    tracing::warn!("window tracking is only available on Windows");
    Ok(())
}
