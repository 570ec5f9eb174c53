//! `SendInput` / window-message input backend for Windows.

use crate::capture::win32::hwnd_of;
use crate::capture::WindowHandle;
use crate::geometry::{ScreenPoint, ScreenRect};
use crate::input::{
    press_and_release, validate_point, ClickOptions, InputBackend, MouseButton,
};
use crate::trace::trace_debug;
use crate::util::{VisionError, VisionResult};
use windows::Win32::Foundation::{HWND, LPARAM, POINT, WPARAM};
use windows::Win32::Graphics::Gdi::ScreenToClient;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_LEFTDOWN,
    MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_MOVE,
    MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_VIRTUALDESK, MOUSEINPUT,
    MOUSE_EVENT_FLAGS,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetCursorPos, GetForegroundWindow, GetSystemMetrics, IsChild, SendMessageW, SetCursorPos,
    SetForegroundWindow, WindowFromPoint, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN,
    SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MBUTTONDOWN,
    WM_MBUTTONUP, WM_RBUTTONDOWN, WM_RBUTTONUP,
};

const MK_LBUTTON: usize = 0x0001;
const MK_RBUTTON: usize = 0x0002;
const MK_MBUTTON: usize = 0x0010;

/// Input backend built on `SendInput` and `SendMessageW`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowsInput;

fn button_flags(button: MouseButton) -> (MOUSE_EVENT_FLAGS, MOUSE_EVENT_FLAGS) {
    match button {
        MouseButton::Left => (MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP),
        MouseButton::Right => (MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP),
        MouseButton::Middle => (MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP),
    }
}

fn button_messages(button: MouseButton) -> (u32, u32, usize) {
    match button {
        MouseButton::Left => (WM_LBUTTONDOWN, WM_LBUTTONUP, MK_LBUTTON),
        MouseButton::Right => (WM_RBUTTONDOWN, WM_RBUTTONUP, MK_RBUTTON),
        MouseButton::Middle => (WM_MBUTTONDOWN, WM_MBUTTONUP, MK_MBUTTON),
    }
}

fn mouse_input(dx: i32, dy: i32, flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                dwFlags: flags,
                ..Default::default()
            },
        },
    }
}

fn send(inputs: &[INPUT]) -> VisionResult<()> {
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        return Err(VisionError::input(format!(
            "SendInput accepted {sent} of {} events",
            inputs.len()
        )));
    }
    Ok(())
}

/// Maps a desktop coordinate onto the 0..=65535 virtual-desktop grid.
fn normalize(value: i32, origin: i32, extent: i32) -> i32 {
    let span = i64::from((extent - 1).max(1));
    (i64::from(value - origin) * 65535 / span) as i32
}

impl InputBackend for WindowsInput {
    fn name(&self) -> &'static str {
        "sendinput"
    }

    fn screen_bounds(&self) -> VisionResult<ScreenRect> {
        let (x, y, w, h) = unsafe {
            (
                GetSystemMetrics(SM_XVIRTUALSCREEN),
                GetSystemMetrics(SM_YVIRTUALSCREEN),
                GetSystemMetrics(SM_CXVIRTUALSCREEN),
                GetSystemMetrics(SM_CYVIRTUALSCREEN),
            )
        };
        if w <= 0 || h <= 0 {
            return Err(VisionError::input("virtual screen size unavailable"));
        }
        Ok(ScreenRect {
            min: ScreenPoint::new(x, y),
            max: ScreenPoint::new(x + w, y + h),
        })
    }

    fn click(
        &self,
        at: ScreenPoint,
        button: MouseButton,
        options: &ClickOptions,
    ) -> VisionResult<()> {
        let bounds = self.screen_bounds()?;
        validate_point(self, at)?;

        let mut saved_cursor = POINT::default();
        let have_cursor = unsafe { GetCursorPos(&mut saved_cursor).is_ok() };
        let previous_focus = if options.restore_focus {
            Some(unsafe { GetForegroundWindow() })
        } else {
            None
        };

        options.pause_before();
        let dx = normalize(at.x, bounds.min.x, bounds.width());
        let dy = normalize(at.y, bounds.min.y, bounds.height());
        let (down, up) = button_flags(button);
        send(&[mouse_input(
            dx,
            dy,
            MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_VIRTUALDESK,
        )])?;
        let clicked = press_and_release(
            || {
                send(&[mouse_input(0, 0, down)])?;
                std::thread::sleep(options.delay);
                Ok(())
            },
            || send(&[mouse_input(0, 0, up)]),
        );
        options.pause_after();

        if have_cursor {
            unsafe {
                let _ = SetCursorPos(saved_cursor.x, saved_cursor.y);
            }
        }
        if let Some(hwnd) = previous_focus.filter(|h| h.0 != 0) {
            let restored = unsafe { SetForegroundWindow(hwnd).as_bool() };
            if !restored {
                trace_debug!("foreground window not restored");
            }
        }
        clicked
    }

    fn click_window(
        &self,
        window: WindowHandle,
        at: ScreenPoint,
        button: MouseButton,
        options: &ClickOptions,
    ) -> VisionResult<()> {
        validate_point(self, at)?;
        let top = hwnd_of(window);
        let mut point = POINT { x: at.x, y: at.y };
        let target: HWND = unsafe {
            let under = WindowFromPoint(point);
            if under.0 != 0 && (under == top || IsChild(top, under).as_bool()) {
                under
            } else {
                top
            }
        };
        if !unsafe { ScreenToClient(target, &mut point).as_bool() } {
            return Err(VisionError::input("ScreenToClient failed"));
        }

        let lparam = LPARAM((((point.y as u32) << 16) | (point.x as u32 & 0xFFFF)) as isize);
        let (down, up, mk) = button_messages(button);
        options.pause_before();
        unsafe {
            SendMessageW(target, down, WPARAM(mk), lparam);
        }
        std::thread::sleep(options.delay);
        unsafe {
            SendMessageW(target, up, WPARAM(0), lparam);
        }
        options.pause_after();
        Ok(())
    }
}
