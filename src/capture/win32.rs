//! GDI capture backend for Windows.
//!
//! The occlusion-tolerant strategy is `PrintWindow` with
//! `PW_RENDERFULLCONTENT`, which asks the window to paint itself into a
//! memory DC. The visible-only strategy is a `BitBlt` from the window DC.

use crate::capture::{CaptureBackend, CaptureStrategy, WindowHandle};
use crate::geometry::WindowRect;
use crate::image::PixelBuffer;
use crate::util::{VisionError, VisionResult};
use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT};
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDIBits,
    GetWindowDC, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS,
    HBITMAP, HDC, HGDIOBJ, SRCCOPY,
};
use windows::Win32::Storage::Xps::{PrintWindow, PRINT_WINDOW_FLAGS};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindowRect, GetWindowThreadProcessId, IsWindow, IsWindowVisible,
};

/// Not exported by the bindings; renders DirectComposition content too.
const PW_RENDERFULLCONTENT: PRINT_WINDOW_FLAGS = PRINT_WINDOW_FLAGS(2);

/// Capture backend built on GDI.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowsCapture;

pub(crate) fn hwnd_of(handle: WindowHandle) -> HWND {
    HWND(handle.raw() as isize)
}

pub(crate) fn handle_of(hwnd: HWND) -> Option<WindowHandle> {
    WindowHandle::new(hwnd.0 as u64)
}

struct EnumState {
    pid: u32,
    visible: Option<HWND>,
    any: Option<HWND>,
}

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let state = &mut *(lparam.0 as *mut EnumState);
    let mut owner = 0u32;
    GetWindowThreadProcessId(hwnd, Some(&mut owner));
    if owner != state.pid {
        return BOOL(1);
    }
    if IsWindowVisible(hwnd).as_bool() {
        state.visible = Some(hwnd);
        return BOOL(0);
    }
    state.any.get_or_insert(hwnd);
    BOOL(1)
}

/// GDI objects of one capture, released in reverse order on drop.
struct GdiSurface {
    hwnd: HWND,
    window_dc: HDC,
    mem_dc: HDC,
    bitmap: HBITMAP,
    previous: HGDIOBJ,
}

impl GdiSurface {
    unsafe fn new(hwnd: HWND, width: i32, height: i32) -> VisionResult<Self> {
        let window_dc = GetWindowDC(hwnd);
        if window_dc.is_invalid() {
            return Err(VisionError::capture("grab", "GetWindowDC failed"));
        }
        let mem_dc = CreateCompatibleDC(window_dc);
        if mem_dc.is_invalid() {
            ReleaseDC(hwnd, window_dc);
            return Err(VisionError::capture("grab", "CreateCompatibleDC failed"));
        }
        let bitmap = CreateCompatibleBitmap(window_dc, width, height);
        if bitmap.is_invalid() {
            let _ = DeleteDC(mem_dc);
            ReleaseDC(hwnd, window_dc);
            return Err(VisionError::capture("grab", "CreateCompatibleBitmap failed"));
        }
        let previous = SelectObject(mem_dc, bitmap);
        Ok(Self {
            hwnd,
            window_dc,
            mem_dc,
            bitmap,
            previous,
        })
    }

    unsafe fn read_bgra(&self, width: i32, height: i32) -> VisionResult<Vec<u8>> {
        let mut info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                // Negative height requests a top-down bitmap.
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut buffer = vec![0u8; width as usize * height as usize * 4];
        let lines = GetDIBits(
            self.mem_dc,
            self.bitmap,
            0,
            height as u32,
            Some(buffer.as_mut_ptr().cast()),
            &mut info,
            DIB_RGB_COLORS,
        );
        if lines != height {
            return Err(VisionError::capture(
                "grab",
                format!("GetDIBits copied {lines} of {height} rows"),
            ));
        }
        // GDI leaves alpha undefined.
        for px in buffer.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Ok(buffer)
    }
}

impl Drop for GdiSurface {
    fn drop(&mut self) {
        unsafe {
            SelectObject(self.mem_dc, self.previous);
            let _ = DeleteObject(self.bitmap);
            let _ = DeleteDC(self.mem_dc);
            ReleaseDC(self.hwnd, self.window_dc);
        }
    }
}

impl CaptureBackend for WindowsCapture {
    fn name(&self) -> &'static str {
        "gdi"
    }

    fn find_window(&self, pid: u32) -> VisionResult<WindowHandle> {
        let mut state = EnumState {
            pid,
            visible: None,
            any: None,
        };
        unsafe {
            // Stopping early reports an error; the collected state is what matters.
            let _ = EnumWindows(
                Some(collect_window),
                LPARAM(&mut state as *mut EnumState as isize),
            );
        }
        state
            .visible
            .or(state.any)
            .and_then(handle_of)
            .ok_or(VisionError::WindowNotFound { pid })
    }

    fn window_rect(&self, handle: WindowHandle) -> VisionResult<WindowRect> {
        let hwnd = hwnd_of(handle);
        let mut rect = RECT::default();
        unsafe {
            if !IsWindow(hwnd).as_bool() {
                return Err(VisionError::capture("rect", "window no longer exists"));
            }
            GetWindowRect(hwnd, &mut rect)
                .map_err(|err| VisionError::capture("rect", err.to_string()))?;
        }
        WindowRect::new(rect.left, rect.top, rect.right, rect.bottom)
            .map_err(|_| VisionError::capture("rect", "window has no area (minimized?)"))
    }

    fn grab(
        &self,
        handle: WindowHandle,
        rect: &WindowRect,
        strategy: CaptureStrategy,
    ) -> VisionResult<PixelBuffer> {
        let hwnd = hwnd_of(handle);
        let width = rect.width() as i32;
        let height = rect.height() as i32;
        let bgra = unsafe {
            let surface = GdiSurface::new(hwnd, width, height)?;
            let copied = match strategy {
                CaptureStrategy::OcclusionTolerant => {
                    PrintWindow(hwnd, surface.mem_dc, PW_RENDERFULLCONTENT).as_bool()
                }
                CaptureStrategy::VisibleOnly => BitBlt(
                    surface.mem_dc,
                    0,
                    0,
                    width,
                    height,
                    surface.window_dc,
                    0,
                    0,
                    SRCCOPY,
                )
                .is_ok(),
            };
            if !copied {
                let api = match strategy {
                    CaptureStrategy::OcclusionTolerant => "PrintWindow",
                    CaptureStrategy::VisibleOnly => "BitBlt",
                };
                return Err(VisionError::capture("grab", format!("{api} failed")));
            }
            surface.read_bgra(width, height)?
        };
        PixelBuffer::from_bgra_rows(&bgra, rect.width(), rect.height(), rect.width() * 4)
    }
}
