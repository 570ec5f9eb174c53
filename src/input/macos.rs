//! `CGEvent` input backend for macOS.

use crate::capture::macos::owner_pid;
use crate::capture::WindowHandle;
use crate::geometry::{ScreenPoint, ScreenRect};
use crate::input::{
    press_and_release, validate_point, ClickOptions, InputBackend, MouseButton,
};
use crate::trace::trace_debug;
use crate::util::{VisionError, VisionResult};
use core_graphics::display::CGDisplay;
use core_graphics::event::{CGEvent, CGEventTapLocation, CGEventType, CGMouseButton};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use core_graphics::geometry::CGPoint;

/// Input backend that posts Quartz mouse events.
#[derive(Clone, Copy, Debug, Default)]
pub struct MacInput;

fn event_types(button: MouseButton) -> (CGEventType, CGEventType, CGMouseButton) {
    match button {
        MouseButton::Left => (
            CGEventType::LeftMouseDown,
            CGEventType::LeftMouseUp,
            CGMouseButton::Left,
        ),
        MouseButton::Right => (
            CGEventType::RightMouseDown,
            CGEventType::RightMouseUp,
            CGMouseButton::Right,
        ),
        MouseButton::Middle => (
            CGEventType::OtherMouseDown,
            CGEventType::OtherMouseUp,
            CGMouseButton::Center,
        ),
    }
}

fn event_source() -> VisionResult<CGEventSource> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|_| VisionError::input("CGEventSource unavailable"))
}

fn mouse_event(
    source: &CGEventSource,
    kind: CGEventType,
    point: CGPoint,
    button: CGMouseButton,
) -> VisionResult<CGEvent> {
    CGEvent::new_mouse_event(source.clone(), kind, point, button)
        .map_err(|_| VisionError::input("failed to create mouse event"))
}

impl InputBackend for MacInput {
    fn name(&self) -> &'static str {
        "cgevent"
    }

    fn screen_bounds(&self) -> VisionResult<ScreenRect> {
        let displays = CGDisplay::active_displays()
            .map_err(|err| VisionError::input(format!("active displays: error {err}")))?;
        let mut bounds: Option<ScreenRect> = None;
        for id in displays {
            let b = CGDisplay::new(id).bounds();
            let min = ScreenPoint::new(b.origin.x as i32, b.origin.y as i32);
            let max = ScreenPoint::new(
                (b.origin.x + b.size.width) as i32,
                (b.origin.y + b.size.height) as i32,
            );
            bounds = Some(match bounds {
                None => ScreenRect { min, max },
                Some(acc) => ScreenRect {
                    min: ScreenPoint::new(acc.min.x.min(min.x), acc.min.y.min(min.y)),
                    max: ScreenPoint::new(acc.max.x.max(max.x), acc.max.y.max(max.y)),
                },
            });
        }
        bounds.ok_or_else(|| VisionError::input("no active display"))
    }

    fn click(
        &self,
        at: ScreenPoint,
        button: MouseButton,
        options: &ClickOptions,
    ) -> VisionResult<()> {
        validate_point(self, at)?;
        let source = event_source()?;
        let saved_cursor = CGEvent::new(source.clone()).ok().map(|e| e.location());
        if options.restore_focus {
            trace_debug!("focus restore is not available on macOS");
        }

        let point = CGPoint::new(at.x as f64, at.y as f64);
        let (down, up, cg_button) = event_types(button);
        options.pause_before();
        mouse_event(&source, CGEventType::MouseMoved, point, cg_button)?
            .post(CGEventTapLocation::HID);
        let clicked = press_and_release(
            || {
                mouse_event(&source, down, point, cg_button)?.post(CGEventTapLocation::HID);
                std::thread::sleep(options.delay);
                Ok(())
            },
            || {
                mouse_event(&source, up, point, cg_button)?.post(CGEventTapLocation::HID);
                Ok(())
            },
        );
        options.pause_after();

        if let Some(saved) = saved_cursor {
            let _ = CGDisplay::warp_mouse_cursor_position(saved);
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
        let pid = owner_pid(window)
            .ok_or_else(|| VisionError::input(format!("no owner for {window:?}")))?;
        let source = event_source()?;
        let point = CGPoint::new(at.x as f64, at.y as f64);
        let (down, up, cg_button) = event_types(button);
        options.pause_before();
        mouse_event(&source, down, point, cg_button)?.post_to_pid(pid);
        std::thread::sleep(options.delay);
        mouse_event(&source, up, point, cg_button)?.post_to_pid(pid);
        options.pause_after();
        Ok(())
    }
}
