//! The mask surface: a borderless, layered, click-through, non-activating
//! popup owned by the target window and stacked directly above it.

use crate::locator::WindowRect;
use crate::settings::MaskConfig;

/// Mask top-left for a given target rectangle: target top-left plus the
/// configured offset. Size comes from config, never from the target.
pub fn mask_placement(target: WindowRect, config: &MaskConfig) -> (i32, i32) {
    (target.left + config.offset_x, target.top + config.offset_y)
}

#[cfg(windows)]
mod platform {
    use super::mask_placement;
    use crate::locator::{TargetWindow, WindowRect};
    use crate::settings::MaskConfig;
    use anyhow::{Context, Result};
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, RECT, WPARAM};
    use windows::Win32::Graphics::Gdi::{
        BeginPaint, CreatePen, CreateSolidBrush, DeleteObject, EndPaint, FillRect, GetStockObject,
        InvalidateRect, Rectangle, SelectObject, SetBkMode, SetTextColor, TextOutW, UpdateWindow,
        NULL_BRUSH, PAINTSTRUCT, PS_SOLID, TRANSPARENT,
    };
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::{
        CreateWindowExW, DefWindowProcW, DestroyWindow, GetClientRect, GetWindowLongPtrW,
        IsWindowVisible, LoadCursorW, RegisterClassW, SetLayeredWindowAttributes,
        SetWindowLongPtrW, SetWindowPos, ShowWindow, GWLP_USERDATA, HMENU, HTTRANSPARENT,
        IDC_ARROW, LWA_ALPHA, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE,
        SW_HIDE, SW_SHOWNOACTIVATE, WINDOW_STYLE, WM_ERASEBKGND, WM_NCHITTEST, WM_PAINT,
        WNDCLASSW, WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TRANSPARENT, WS_POPUP,
        WS_VISIBLE,
    };

    const BACKGROUND: COLORREF = COLORREF(0x00ffffff);
    const BORDER: COLORREF = COLORREF(0x000000ff);
    const TEXT: COLORREF = COLORREF(0x00000000);

    pub fn mask_ex_style() -> windows::Win32::UI::WindowsAndMessaging::WINDOW_EX_STYLE {
        WS_EX_LAYERED | WS_EX_TRANSPARENT | WS_EX_NOACTIVATE | WS_EX_TOOLWINDOW
    }

    /// Values shown by the placeholder paint. Reached from the window
    /// procedure through a GWLP_USERDATA pointer, so the fields are atomics;
    /// the block itself is owned (and kept alive) by [`MaskWindow`].
    struct Diagnostics {
        width: AtomicI32,
        height: AtomicI32,
        offset_x: AtomicI32,
        offset_y: AtomicI32,
        opacity: AtomicI32,
    }

    impl Diagnostics {
        fn new(config: &MaskConfig) -> Box<Self> {
            Box::new(Self {
                width: AtomicI32::new(config.width),
                height: AtomicI32::new(config.height),
                offset_x: AtomicI32::new(config.offset_x),
                offset_y: AtomicI32::new(config.offset_y),
                opacity: AtomicI32::new(config.opacity as i32),
            })
        }

        fn update(&self, config: &MaskConfig) {
            self.width.store(config.width, Ordering::Relaxed);
            self.height.store(config.height, Ordering::Relaxed);
            self.offset_x.store(config.offset_x, Ordering::Relaxed);
            self.offset_y.store(config.offset_y, Ordering::Relaxed);
            self.opacity.store(config.opacity as i32, Ordering::Relaxed);
        }
    }

    fn widestring(value: &str) -> Vec<u16> {
        use std::os::windows::ffi::OsStrExt;
        std::ffi::OsStr::new(value)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect()
    }

    fn paint_diagnostics(hdc: windows::Win32::Graphics::Gdi::HDC, diag: &Diagnostics) {
        unsafe {
            SetBkMode(hdc, TRANSPARENT);
            SetTextColor(hdc, TEXT);
        }
        let lines = [
            format!(
                "mask size {}x{}",
                diag.width.load(Ordering::Relaxed),
                diag.height.load(Ordering::Relaxed)
            ),
            format!(
                "mask offset {}x{}",
                diag.offset_x.load(Ordering::Relaxed),
                diag.offset_y.load(Ordering::Relaxed)
            ),
            format!("mask opacity {}", diag.opacity.load(Ordering::Relaxed)),
        ];
        for (i, line) in lines.iter().enumerate() {
            let wide: Vec<u16> = line.encode_utf16().collect();
            unsafe {
                let _ = TextOutW(hdc, 10, 10 + 20 * i as i32, &wide);
            }
        }
    }

    unsafe extern "system" fn mask_wndproc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_PAINT => {
                let mut ps = PAINTSTRUCT::default();
                let hdc = BeginPaint(hwnd, &mut ps);
                if !hdc.0.is_null() {
                    let mut rect = RECT::default();
                    if GetClientRect(hwnd, &mut rect).is_ok() {
                        let brush = CreateSolidBrush(BACKGROUND);
                        FillRect(hdc, &rect, brush);
                        let _ = DeleteObject(brush);

                        // Debug border.
                        let pen = CreatePen(PS_SOLID, 3, BORDER);
                        let old_pen = SelectObject(hdc, pen);
                        let old_brush = SelectObject(hdc, GetStockObject(NULL_BRUSH));
                        let _ = Rectangle(hdc, rect.left, rect.top, rect.right, rect.bottom);
                        SelectObject(hdc, old_pen);
                        SelectObject(hdc, old_brush);
                        let _ = DeleteObject(pen);

                        let diag_ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA);
                        if diag_ptr != 0 {
                            paint_diagnostics(hdc, &*(diag_ptr as *const Diagnostics));
                        }
                    }
                    let _ = EndPaint(hwnd, &ps);
                }
                LRESULT(0)
            }
            // A no-op erase: the paint handler covers the whole client area,
            // and skipping the erase pass prevents flicker while tracking.
            WM_ERASEBKGND => LRESULT(1),
            // Every pointer hit-test reports "transparent" so all mouse input
            // falls through to whatever is stacked below, the owner included.
            WM_NCHITTEST => LRESULT(HTTRANSPARENT as i32 as isize),
            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }

    /// The overlay surface. Exclusively owned by the tracking loop; destroying
    /// the owner window does not destroy the mask, teardown is always explicit.
    #[derive(Debug)]
    pub struct MaskWindow {
        hwnd: HWND,
        owner: HWND,
        width: i32,
        height: i32,
        diagnostics: Box<Diagnostics>,
    }

    impl MaskWindow {
        /// Create the mask above `target`, sized and offset from `config`,
        /// visible immediately. Failure is recoverable: the caller discards
        /// the target handle and searches again next poll.
        pub fn create(target: &TargetWindow, config: &MaskConfig) -> Result<Self> {
            let target_rect = target
                .rect()
                .context("target window rectangle unavailable")?;
            let (x, y) = mask_placement(target_rect, config);

            static REGISTER_CLASS: Once = Once::new();
            let class_name = widestring("WindowMaskSurface");
            let hinstance = GetModuleHandleW(None).context("GetModuleHandleW")?;
            REGISTER_CLASS.call_once(|| unsafe {
                let wc = WNDCLASSW {
                    lpfnWndProc: Some(mask_wndproc),
                    hInstance: hinstance.into(),
                    lpszClassName: PCWSTR(class_name.as_ptr()),
                    hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
                    hbrBackground: CreateSolidBrush(BACKGROUND),
                    ..Default::default()
                };
                let _ = RegisterClassW(&wc);
            });

            let title = widestring("Window Mask");
            let owner = target.hwnd();
            let hwnd = unsafe {
                CreateWindowExW(
                    mask_ex_style(),
                    PCWSTR(class_name.as_ptr()),
                    PCWSTR(title.as_ptr()),
                    WINDOW_STYLE(WS_POPUP.0 | WS_VISIBLE.0),
                    x,
                    y,
                    config.width,
                    config.height,
                    owner,
                    HMENU::default(),
                    hinstance,
                    None,
                )
            }
            .context("CreateWindowExW")?;

            let diagnostics = Diagnostics::new(config);
            unsafe {
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, &*diagnostics as *const Diagnostics as isize);

                if let Err(err) =
                    SetLayeredWindowAttributes(hwnd, COLORREF(0), config.opacity, LWA_ALPHA)
                {
                    let _ = DestroyWindow(hwnd);
                    return Err(err).context("SetLayeredWindowAttributes");
                }

                // Immediately above the owner, not topmost; the mask must not
                // occlude unrelated foreground applications.
                let _ = SetWindowPos(
                    hwnd,
                    owner,
                    0,
                    0,
                    0,
                    0,
                    SWP_NOACTIVATE | SWP_NOMOVE | SWP_NOSIZE,
                );
                let _ = ShowWindow(hwnd, SW_SHOWNOACTIVATE);
                let _ = UpdateWindow(hwnd);
            }

            tracing::info!(x, y, width = config.width, height = config.height, "mask created");
            Ok(Self {
                hwnd,
                owner,
                width: config.width,
                height: config.height,
                diagnostics,
            })
        }

        /// Move the mask to `(x, y)` at its creation size, re-anchoring it
        /// directly above the owner in Z order. The owner can be raised or
        /// lowered between polls; following it here keeps the pair glued.
        pub fn reposition(&self, x: i32, y: i32) {
            unsafe {
                let _ = SetWindowPos(
                    self.hwnd,
                    self.owner,
                    x,
                    y,
                    self.width,
                    self.height,
                    SWP_NOACTIVATE,
                );
            }
        }

        pub fn is_visible(&self) -> bool {
            unsafe { IsWindowVisible(self.hwnd).as_bool() }
        }

        pub fn ensure_visible(&self) {
            if !self.is_visible() {
                unsafe {
                    let _ = ShowWindow(self.hwnd, SW_SHOWNOACTIVATE);
                }
                tracing::debug!("mask shown");
            }
        }

        pub fn hide(&self) {
            if self.is_visible() {
                unsafe {
                    let _ = ShowWindow(self.hwnd, SW_HIDE);
                }
                tracing::debug!("mask hidden");
            }
        }

        pub fn set_opacity(&self, opacity: u8) {
            unsafe {
                let _ = SetLayeredWindowAttributes(self.hwnd, COLORREF(0), opacity, LWA_ALPHA);
            }
        }

        /// Apply a reloaded config to the live mask: opacity and diagnostics
        /// refresh immediately; width/height deliberately stay at their
        /// creation values and only take effect on the next mask creation.
        pub fn apply_reload(&self, config: &MaskConfig) {
            self.diagnostics.update(config);
            self.set_opacity(config.opacity);
            unsafe {
                let _ = InvalidateRect(self.hwnd, None, false);
            }
        }

        pub fn destroy(&mut self) {
            if !self.hwnd.0.is_null() {
                unsafe {
                    SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, 0);
                    let _ = DestroyWindow(self.hwnd);
                }
                self.hwnd = HWND::default();
                tracing::info!("mask destroyed");
            }
        }
    }

    impl Drop for MaskWindow {
        fn drop(&mut self) {
            self.destroy();
        }
    }

    #[cfg(test)]
    mod windows_tests {
        use super::mask_ex_style;
        use windows::Win32::UI::WindowsAndMessaging::{
            WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT,
        };

        #[test]
        fn style_flags_are_layered_clickthrough_and_never_topmost() {
            let style = mask_ex_style();
            assert_ne!(style.0 & WS_EX_LAYERED.0, 0);
            assert_ne!(style.0 & WS_EX_TRANSPARENT.0, 0);
            assert_ne!(style.0 & WS_EX_NOACTIVATE.0, 0);
            assert_ne!(style.0 & WS_EX_TOOLWINDOW.0, 0);
            assert_eq!(style.0 & WS_EX_TOPMOST.0, 0);
        }
    }
}

#[cfg(windows)]
pub use platform::MaskWindow;

#[cfg(not(windows))]
#[derive(Debug)]
pub struct MaskWindow;

#[cfg(not(windows))]
impl MaskWindow {
    pub fn create(
        _target: &crate::locator::TargetWindow,
        _config: &MaskConfig,
    ) -> anyhow::Result<Self> {
        anyhow::bail!("mask windows are only available on Windows")
    }

    pub fn reposition(&self, _x: i32, _y: i32) {}

    pub fn is_visible(&self) -> bool {
        false
    }

    pub fn ensure_visible(&self) {}

    pub fn hide(&self) {}

    pub fn set_opacity(&self, _opacity: u8) {}

    pub fn apply_reload(&self, _config: &MaskConfig) {}

    pub fn destroy(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_is_target_origin_plus_offset() {
        let target = WindowRect {
            left: 100,
            top: 100,
            width: 800,
            height: 600,
        };
        let config = MaskConfig::default();
        assert_eq!(
            mask_placement(target, &config),
            (100 + config.offset_x, 100 + config.offset_y)
        );
    }

    #[test]
    fn placement_follows_negative_coordinates() {
        let target = WindowRect {
            left: -1920,
            top: 40,
            width: 900,
            height: 700,
        };
        let config = MaskConfig {
            offset_x: -10,
            offset_y: 0,
            ..MaskConfig::default()
        };
        assert_eq!(mask_placement(target, &config), (-1930, 40));
    }
}
