//! Locates the target application's main window: process discovery by exact
//! executable name, then a Z-order walk over top-level windows filtered down
//! to the first visible, large-enough window owned by that process.

use sysinfo::System;

/// Minimum size a window must exceed to count as the application's main
/// window. Filters out tooltips, splash screens and other auxiliary windows.
pub const MIN_MAIN_WIDTH: i32 = 400;
pub const MIN_MAIN_HEIGHT: i32 = 300;

/// Screen-space window rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// First-match filter for main-window candidates.
pub fn is_main_window_candidate(visible: bool, width: i32, height: i32) -> bool {
    visible && width > MIN_MAIN_WIDTH && height > MIN_MAIN_HEIGHT
}

/// Resolve the pid of a running process by exact, case-sensitive executable
/// name. `None` means the process is not running.
pub fn find_process_id(process_name: &str) -> Option<u32> {
    let system = System::new_all();
    system
        .processes()
        .values()
        .find(|p| p.name() == std::ffi::OsStr::new(process_name))
        .map(|p| p.pid().as_u32())
}

/// Locate the target's main window. Returns `None` when the process is absent
/// or none of its windows qualifies; the caller retries on its next poll.
pub fn find_target(process_name: &str) -> Option<TargetWindow> {
    let pid = match find_process_id(process_name) {
        Some(pid) => pid,
        None => {
            tracing::debug!(process = process_name, "target process not running");
            return None;
        }
    };
    tracing::debug!(pid, process = process_name, "target process found");

    let target = platform::find_main_window(pid);
    match &target {
        Some(found) => {
            let rect = found.rect().unwrap_or_default();
            tracing::info!(
                title = %found.title(),
                width = rect.width,
                height = rect.height,
                left = rect.left,
                top = rect.top,
                "target window found"
            );
        }
        None => tracing::debug!(pid, "no qualifying main window yet"),
    }
    target
}

#[cfg(windows)]
mod platform {
    use super::{is_main_window_candidate, WindowRect};
    use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT};
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindowRect, GetWindowTextW, GetWindowThreadProcessId, IsIconic, IsWindow,
        IsWindowVisible,
    };

    /// Handle to the located target window. Valid only while the underlying
    /// window exists; `exists` must be re-checked every poll.
    #[derive(Debug, Clone)]
    pub struct TargetWindow {
        hwnd: HWND,
        title: String,
    }

    impl TargetWindow {
        pub(crate) fn hwnd(&self) -> HWND {
            self.hwnd
        }

        pub fn title(&self) -> &str {
            &self.title
        }

        pub fn exists(&self) -> bool {
            unsafe { IsWindow(self.hwnd).as_bool() }
        }

        /// Visible and not minimized.
        pub fn is_viewable(&self) -> bool {
            unsafe { IsWindowVisible(self.hwnd).as_bool() && !IsIconic(self.hwnd).as_bool() }
        }

        pub fn rect(&self) -> Option<WindowRect> {
            let mut rect = RECT::default();
            unsafe { GetWindowRect(self.hwnd, &mut rect).ok()? };
            Some(WindowRect {
                left: rect.left,
                top: rect.top,
                width: rect.right - rect.left,
                height: rect.bottom - rect.top,
            })
        }
    }

    struct Ctx {
        pid: u32,
        found: Option<TargetWindow>,
    }

    fn window_title(hwnd: HWND) -> String {
        let mut buf = [0u16; 256];
        let len = unsafe { GetWindowTextW(hwnd, &mut buf) } as usize;
        String::from_utf16_lossy(&buf[..len.min(buf.len())])
    }

    unsafe extern "system" fn enum_cb(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let ctx = &mut *(lparam.0 as *mut Ctx);
        let mut pid = 0u32;
        let _ = GetWindowThreadProcessId(hwnd, Some(&mut pid));
        if pid != ctx.pid {
            return BOOL(1);
        }
        let mut rect = RECT::default();
        if GetWindowRect(hwnd, &mut rect).is_err() {
            return BOOL(1);
        }
        let visible = IsWindowVisible(hwnd).as_bool();
        if !is_main_window_candidate(visible, rect.right - rect.left, rect.bottom - rect.top) {
            return BOOL(1);
        }
        ctx.found = Some(TargetWindow {
            hwnd,
            title: window_title(hwnd),
        });
        // First qualifying window in Z order wins; stop the enumeration.
        BOOL(0)
    }

    pub(super) fn find_main_window(pid: u32) -> Option<TargetWindow> {
        let mut ctx = Ctx { pid, found: None };
        unsafe {
            // EnumWindows reports an error when the callback halts it early;
            // that is the found case, not a failure.
            let _ = EnumWindows(Some(enum_cb), LPARAM(&mut ctx as *mut Ctx as isize));
        }
        ctx.found
    }
}

#[cfg(not(windows))]
mod platform {
    use super::WindowRect;

    #[derive(Debug, Clone)]
    pub struct TargetWindow;

    impl TargetWindow {
        pub fn title(&self) -> &str {
            ""
        }

        pub fn exists(&self) -> bool {
            false
        }

        pub fn is_viewable(&self) -> bool {
            false
        }

        pub fn rect(&self) -> Option<WindowRect> {
            None
        }
    }

    pub(super) fn find_main_window(_pid: u32) -> Option<TargetWindow> {
        None
    }
}

pub use platform::TargetWindow;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_requires_visibility_and_size() {
        assert!(is_main_window_candidate(true, 401, 301));
        assert!(is_main_window_candidate(true, 800, 600));
        assert!(!is_main_window_candidate(false, 800, 600));
        // The threshold is exclusive on both axes.
        assert!(!is_main_window_candidate(true, 400, 600));
        assert!(!is_main_window_candidate(true, 800, 300));
    }

    #[test]
    fn absent_process_yields_none() {
        assert_eq!(find_process_id("window_mask_no_such_process.exe"), None);
        assert!(find_target("window_mask_no_such_process.exe").is_none());
    }
}
