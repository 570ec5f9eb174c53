//! Quartz capture backend for macOS.
//!
//! The occlusion-tolerant strategy asks the window server to composite the
//! single window (`kCGWindowListOptionIncludingWindow`). Recent macOS
//! releases may refuse that call, in which case the visible-only strategy
//! copies the window's screen region through the `screencapture` tool.
//! Coordinates are in points, as are the bounds reported by the window
//! server and the positions accepted by `CGEvent`.

use crate::capture::{CaptureBackend, CaptureStrategy, WindowHandle};
use crate::geometry::WindowRect;
use crate::image::io::{decode_pixels, resize_pixels};
use crate::image::PixelBuffer;
use crate::util::{VisionError, VisionResult};
use core_foundation::array::CFArray;
use core_foundation::base::TCFType;
use core_foundation::dictionary::CFDictionary;
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_graphics::geometry::{CGPoint, CGRect, CGSize};
use core_graphics::window::{
    create_image, kCGNullWindowID, kCGWindowImageBoundsIgnoreFraming,
    kCGWindowImageNominalResolution, kCGWindowListExcludeDesktopElements, kCGWindowListOptionAll,
    kCGWindowListOptionIncludingWindow, kCGWindowListOptionOnScreenOnly, CGWindowID,
    CGWindowListCopyWindowInfo, CGWindowListOption,
};
use std::ffi::c_void;
use std::process::{Command, Stdio};

type WindowInfo = CFDictionary<CFString, *const c_void>;

/// Capture backend built on the Quartz window server.
#[derive(Clone, Copy, Debug, Default)]
pub struct MacCapture;

fn window_infos(option: CGWindowListOption, relative_to: CGWindowID) -> Vec<WindowInfo> {
    unsafe {
        let list_ref = CGWindowListCopyWindowInfo(option, relative_to);
        if list_ref.is_null() {
            return Vec::new();
        }
        let list: CFArray = CFArray::wrap_under_create_rule(list_ref as _);
        list.get_all_values()
            .iter()
            .map(|ptr| CFDictionary::wrap_under_get_rule(*ptr as _))
            .collect()
    }
}

unsafe fn get_cf_number(dict: &WindowInfo, key: &str) -> Option<f64> {
    let value = dict.find(&CFString::new(key))?;
    let number: CFNumber = CFNumber::wrap_under_get_rule(*value as _);
    number.to_f64()
}

unsafe fn get_cf_dict(dict: &WindowInfo, key: &str) -> Option<WindowInfo> {
    let value = dict.find(&CFString::new(key))?;
    Some(CFDictionary::wrap_under_get_rule(*value as _))
}

fn bounds_of(info: &WindowInfo) -> Option<WindowRect> {
    unsafe {
        let bounds = get_cf_dict(info, "kCGWindowBounds")?;
        let x = get_cf_number(&bounds, "X")?.round() as i32;
        let y = get_cf_number(&bounds, "Y")?.round() as i32;
        let w = get_cf_number(&bounds, "Width")?.round() as i32;
        let h = get_cf_number(&bounds, "Height")?.round() as i32;
        WindowRect::new(x, y, x.saturating_add(w), y.saturating_add(h)).ok()
    }
}

/// First normal-layer window with a non-empty area owned by `pid`.
fn main_window_of(pid: u32, option: CGWindowListOption) -> Option<CGWindowID> {
    window_infos(option, kCGNullWindowID).iter().find_map(|info| unsafe {
        let owner = get_cf_number(info, "kCGWindowOwnerPID")? as u32;
        let layer = get_cf_number(info, "kCGWindowLayer")? as i64;
        let id = get_cf_number(info, "kCGWindowNumber")? as CGWindowID;
        (owner == pid && layer == 0 && bounds_of(info).is_some()).then_some(id)
    })
}

fn fit_to_rect(pixels: PixelBuffer, rect: &WindowRect) -> VisionResult<PixelBuffer> {
    // Backing-scale displays deliver more pixels than points.
    resize_pixels(&pixels, rect.width(), rect.height())
}

fn grab_composited(window_id: CGWindowID, rect: &WindowRect) -> VisionResult<PixelBuffer> {
    // CGRectNull: let the window server use the window's own bounds.
    let null_rect = CGRect::new(
        &CGPoint::new(f64::INFINITY, f64::INFINITY),
        &CGSize::new(0.0, 0.0),
    );
    let image = create_image(
        null_rect,
        kCGWindowListOptionIncludingWindow,
        window_id,
        kCGWindowImageBoundsIgnoreFraming | kCGWindowImageNominalResolution,
    )
    .ok_or_else(|| VisionError::capture("grab", "CGWindowListCreateImage returned no image"))?;

    if image.bits_per_pixel() != 32 {
        return Err(VisionError::capture(
            "grab",
            format!("unexpected {} bits per pixel", image.bits_per_pixel()),
        ));
    }
    let data = image.data();
    let pixels = PixelBuffer::from_bgra_rows(
        data.bytes(),
        image.width(),
        image.height(),
        image.bytes_per_row(),
    )?;
    fit_to_rect(pixels, rect)
}

fn grab_screen_region(rect: &WindowRect) -> VisionResult<PixelBuffer> {
    let file = tempfile::Builder::new()
        .prefix("gamevision-")
        .suffix(".png")
        .tempfile()
        .map_err(|err| VisionError::capture("grab", err.to_string()))?;
    let region = format!(
        "{},{},{},{}",
        rect.min_x(),
        rect.min_y(),
        rect.width(),
        rect.height()
    );
    let status = Command::new("screencapture")
        .arg("-x")
        .arg("-R")
        .arg(&region)
        .arg(file.path())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|err| VisionError::capture("grab", format!("screencapture: {err}")))?;
    if !status.success() {
        return Err(VisionError::capture(
            "grab",
            format!("screencapture exited with {status}"),
        ));
    }
    let bytes = std::fs::read(file.path())
        .map_err(|err| VisionError::capture("grab", err.to_string()))?;
    let pixels =
        decode_pixels(&bytes).map_err(|err| VisionError::capture("grab", err.to_string()))?;
    fit_to_rect(pixels, rect)
}

impl CaptureBackend for MacCapture {
    fn name(&self) -> &'static str {
        "quartz"
    }

    fn find_window(&self, pid: u32) -> VisionResult<WindowHandle> {
        main_window_of(
            pid,
            kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements,
        )
        .or_else(|| main_window_of(pid, kCGWindowListOptionAll))
        .and_then(|id| WindowHandle::new(u64::from(id)))
        .ok_or(VisionError::WindowNotFound { pid })
    }

    fn window_rect(&self, handle: WindowHandle) -> VisionResult<WindowRect> {
        let id = handle.raw() as CGWindowID;
        window_infos(kCGWindowListOptionIncludingWindow, id)
            .iter()
            .find_map(bounds_of)
            .ok_or_else(|| VisionError::capture("rect", "window bounds unavailable"))
    }

    fn grab(
        &self,
        handle: WindowHandle,
        rect: &WindowRect,
        strategy: CaptureStrategy,
    ) -> VisionResult<PixelBuffer> {
        match strategy {
            CaptureStrategy::OcclusionTolerant => {
                grab_composited(handle.raw() as CGWindowID, rect)
            }
            CaptureStrategy::VisibleOnly => grab_screen_region(rect),
        }
    }
}

/// Owning process of a window, if the window server still knows it.
pub(crate) fn owner_pid(handle: WindowHandle) -> Option<i32> {
    let id = handle.raw() as CGWindowID;
    window_infos(kCGWindowListOptionIncludingWindow, id)
        .iter()
        .find_map(|info| unsafe { get_cf_number(info, "kCGWindowOwnerPID") })
        .map(|pid| pid as i32)
}
