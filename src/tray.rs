//! System tray presenter: a message-only window carrying the notification
//! icon and its context menu. Exit posts `WM_QUIT` to this thread's queue;
//! "Reload settings" raises a flag the tracking loop consumes. This is the
//! only subsystem whose failure stops the program.

use std::sync::atomic::{AtomicBool, Ordering};

static RELOAD_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Take (and clear) a pending reload request.
pub fn take_reload_request() -> bool {
    RELOAD_REQUESTED.swap(false, Ordering::SeqCst)
}

fn request_reload() {
    RELOAD_REQUESTED.store(true, Ordering::SeqCst);
}

#[cfg(windows)]
mod platform {
    use super::request_reload;
    use anyhow::{bail, Context, Result};
    use once_cell::sync::Lazy;
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, POINT, WPARAM};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::Shell::{
        Shell_NotifyIconW, NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NOTIFYICONDATAW,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        AppendMenuW, CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyMenu, DestroyWindow,
        GetCursorPos, LoadCursorW, LoadIconW, PostMessageW, PostQuitMessage, RegisterClassW,
        SetForegroundWindow, TrackPopupMenu, HMENU, IDC_ARROW, IDI_APPLICATION, MF_STRING,
        TPM_RIGHTBUTTON, WINDOW_EX_STYLE, WINDOW_STYLE, WM_COMMAND, WM_DESTROY, WM_NULL,
        WM_RBUTTONUP, WM_USER, WNDCLASSW,
    };

    const WM_TRAYICON: u32 = WM_USER + 1;
    const TRAY_UID: u32 = 1;
    const IDM_EXIT: usize = 1001;
    const IDM_RELOAD: usize = 1002;

    static TRAY_CLASS: Lazy<Vec<u16>> = Lazy::new(|| widestring("WindowMaskTray"));

    fn widestring(value: &str) -> Vec<u16> {
        use std::os::windows::ffi::OsStrExt;
        std::ffi::OsStr::new(value)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect()
    }

    unsafe fn show_tray_menu(hwnd: HWND) {
        let hmenu = match CreatePopupMenu() {
            Ok(menu) => menu,
            Err(_) => return,
        };
        let reload = widestring("Reload settings");
        let exit = widestring("Exit");
        let _ = AppendMenuW(hmenu, MF_STRING, IDM_RELOAD, PCWSTR(reload.as_ptr()));
        let _ = AppendMenuW(hmenu, MF_STRING, IDM_EXIT, PCWSTR(exit.as_ptr()));

        let mut pt = POINT::default();
        if GetCursorPos(&mut pt).is_ok() {
            // Foreground focus first, and a no-op message afterwards, so the
            // menu dismisses correctly for a message-only window.
            let _ = SetForegroundWindow(hwnd);
            let _ = TrackPopupMenu(hmenu, TPM_RIGHTBUTTON, pt.x, pt.y, 0, hwnd, None);
            let _ = PostMessageW(hwnd, WM_NULL, WPARAM(0), LPARAM(0));
        }
        let _ = DestroyMenu(hmenu);
    }

    unsafe extern "system" fn tray_wndproc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_TRAYICON => {
                if lparam.0 as u32 == WM_RBUTTONUP {
                    show_tray_menu(hwnd);
                }
                LRESULT(0)
            }
            WM_COMMAND => match wparam.0 & 0xffff {
                IDM_EXIT => {
                    PostQuitMessage(0);
                    LRESULT(0)
                }
                IDM_RELOAD => {
                    request_reload();
                    LRESULT(0)
                }
                _ => DefWindowProcW(hwnd, msg, wparam, lparam),
            },
            WM_DESTROY => {
                PostQuitMessage(0);
                LRESULT(0)
            }
            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }

    pub struct TrayIcon {
        hwnd: HWND,
    }

    impl TrayIcon {
        /// Register the tray window class, create the hidden message window
        /// and add the notification icon. Any failure here is fatal to the
        /// process; the program does not run headless.
        pub fn create() -> Result<Self> {
            let hinstance = GetModuleHandleW(None).context("GetModuleHandleW")?;
            unsafe {
                let wc = WNDCLASSW {
                    lpfnWndProc: Some(tray_wndproc),
                    hInstance: hinstance.into(),
                    lpszClassName: PCWSTR(TRAY_CLASS.as_ptr()),
                    hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
                    ..Default::default()
                };
                if RegisterClassW(&wc) == 0 {
                    bail!("tray window class registration failed");
                }

                let title = widestring("Window Mask Tray");
                let hwnd = CreateWindowExW(
                    WINDOW_EX_STYLE(0),
                    PCWSTR(TRAY_CLASS.as_ptr()),
                    PCWSTR(title.as_ptr()),
                    WINDOW_STYLE(0),
                    0,
                    0,
                    0,
                    0,
                    None,
                    HMENU::default(),
                    hinstance,
                    None,
                )
                .context("create tray window")?;

                let mut nid = NOTIFYICONDATAW {
                    cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
                    hWnd: hwnd,
                    uID: TRAY_UID,
                    uFlags: NIF_MESSAGE | NIF_TIP | NIF_ICON,
                    uCallbackMessage: WM_TRAYICON,
                    hIcon: LoadIconW(None, IDI_APPLICATION).unwrap_or_default(),
                    ..Default::default()
                };
                let tip = widestring("Window Mask");
                for (i, &c) in tip.iter().enumerate().take(nid.szTip.len()) {
                    nid.szTip[i] = c;
                }

                if !Shell_NotifyIconW(NIM_ADD, &nid).as_bool() {
                    let _ = DestroyWindow(hwnd);
                    bail!("tray icon registration failed");
                }

                tracing::debug!("tray icon installed");
                Ok(Self { hwnd })
            }
        }
    }

    impl Drop for TrayIcon {
        fn drop(&mut self) {
            unsafe {
                let nid = NOTIFYICONDATAW {
                    cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
                    hWnd: self.hwnd,
                    uID: TRAY_UID,
                    ..Default::default()
                };
                let _ = Shell_NotifyIconW(NIM_DELETE, &nid);
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}

#[cfg(windows)]
pub use platform::TrayIcon;

#[cfg(not(windows))]
pub struct TrayIcon;

#[cfg(not(windows))]
impl TrayIcon {
    pub fn create() -> anyhow::Result<Self> {
        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_request_is_taken_once() {
        assert!(!take_reload_request());
        request_reload();
        assert!(take_reload_request());
        assert!(!take_reload_request());
    }
}
