use glam::Vec2;
use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use windows::Win32::Foundation::{HWND, POINT};
use windows::Win32::Graphics::Dwm::{DwmSetWindowAttribute, DWMWINDOWATTRIBUTE};
use windows::Win32::UI::WindowsAndMessaging::{
    GetCursorPos, GetWindowLongPtrW, SetWindowLongPtrW, SetWindowPos, GWL_EXSTYLE,
    SWP_FRAMECHANGED, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER, WS_EX_NOACTIVATE,
    WS_EX_TOOLWINDOW,
};

/// Extract the Win32 HWND from a winit window.
pub fn get_hwnd(window: &winit::window::Window) -> Option<HWND> {
    let handle = window.window_handle().ok()?;
    match handle.as_raw() {
        RawWindowHandle::Win32(h) => Some(HWND(h.hwnd.get() as *mut core::ffi::c_void)),
        _ => None,
    }
}

fn set_dwm_u32(hwnd: HWND, attribute: i32, value: u32) {
    unsafe {
        let _ = DwmSetWindowAttribute(
            hwnd,
            DWMWINDOWATTRIBUTE(attribute),
            &value as *const u32 as *const core::ffi::c_void,
            4,
        );
    }
}

/// Apply overlay window styles. Companions stay activatable so they can
/// take keyboard focus; bubbles never do.
///
/// # Safety
/// `hwnd` must be a live window owned by this thread.
pub unsafe fn make_overlay(hwnd: HWND, activatable: bool) {
    let style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);

    // Drop WS_EX_LAYERED (GDI backing surface) and skip the redirection
    // bitmap: all pixels come from the DirectComposition visual wgpu makes.
    const WS_EX_LAYERED: isize = 0x00080000;
    const WS_EX_NOREDIRECTIONBITMAP: isize = 0x00200000;

    let mut new_style =
        (style & !WS_EX_LAYERED) | WS_EX_TOOLWINDOW.0 as isize | WS_EX_NOREDIRECTIONBITMAP;
    if !activatable {
        new_style |= WS_EX_NOACTIVATE.0 as isize;
    }
    SetWindowLongPtrW(hwnd, GWL_EXSTYLE, new_style);
    log::debug!("Window ex-style 0x{:08X} -> 0x{:08X}", style, new_style);

    // Make DWM pick up the new styles instead of cached frame info.
    let _ = SetWindowPos(
        hwnd,
        HWND::default(),
        0,
        0,
        0,
        0,
        SWP_FRAMECHANGED | SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
    );

    // DWMWA_NCRENDERING_POLICY = DWMNCRP_DISABLED
    set_dwm_u32(hwnd, 2, 2);
    // DWMWA_WINDOW_CORNER_PREFERENCE = DWMWCP_DONOTROUND
    set_dwm_u32(hwnd, 33, 1);
    // DWMWA_BORDER_COLOR = DWMWA_COLOR_NONE
    set_dwm_u32(hwnd, 34, 0xFFFF_FFFE);
    // DWMWA_SYSTEMBACKDROP_TYPE = DWMSBT_NONE, no frosted glass
    set_dwm_u32(hwnd, 38, 1);
}

/// Turn a freshly created window into a borderless desktop overlay.
pub fn setup_overlay(window: &winit::window::Window, click_through: bool) {
    if click_through {
        if let Err(e) = window.set_cursor_hittest(false) {
            log::warn!("Could not make window click-through: {e}");
        }
    }

    let Some(hwnd) = get_hwnd(window) else {
        log::warn!("No Win32 handle for window, overlay styles not applied");
        return;
    };
    unsafe {
        make_overlay(hwnd, !click_through);
    }
}

/// Current global mouse cursor position in screen pixels.
pub fn get_mouse_pos() -> Vec2 {
    let mut point = POINT::default();
    unsafe {
        let _ = GetCursorPos(&mut point);
    }
    Vec2::new(point.x as f32, point.y as f32)
}
