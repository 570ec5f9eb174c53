//! In-memory capture backend.
//!
//! Serves prepared pixels for known PIDs without touching the OS. Used on
//! targets without a platform backend and to drive the capture sequence in
//! tests, including refused strategies and windows that move mid-capture.

use crate::capture::{CaptureBackend, CaptureStrategy, WindowHandle};
use crate::geometry::WindowRect;
use crate::image::PixelBuffer;
use crate::util::{VisionError, VisionResult};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A fake top-level window owned by a process.
#[derive(Debug)]
pub struct StubWindow {
    pid: u32,
    rect: WindowRect,
    pixels: PixelBuffer,
    refuse_primary: bool,
    refuse_fallback: bool,
    moved_to: Option<WindowRect>,
    rect_reads: AtomicUsize,
}

impl StubWindow {
    /// A window at `rect` whose content is `pixels`.
    pub fn new(pid: u32, rect: WindowRect, pixels: PixelBuffer) -> Self {
        Self {
            pid,
            rect,
            pixels,
            refuse_primary: false,
            refuse_fallback: false,
            moved_to: None,
            rect_reads: AtomicUsize::new(0),
        }
    }

    /// Rejects the occlusion-tolerant strategy.
    pub fn refusing_primary(mut self) -> Self {
        self.refuse_primary = true;
        self
    }

    /// Rejects the visible-only strategy.
    pub fn refusing_fallback(mut self) -> Self {
        self.refuse_fallback = true;
        self
    }

    /// Reports `rect` from the second bounds query onwards.
    pub fn moving_to(mut self, rect: WindowRect) -> Self {
        self.moved_to = Some(rect);
        self
    }

    fn current_rect(&self) -> WindowRect {
        let reads = self.rect_reads.fetch_add(1, Ordering::SeqCst);
        match self.moved_to {
            Some(moved) if reads > 0 => moved,
            _ => self.rect,
        }
    }
}

/// Capture backend over a fixed set of [`StubWindow`]s.
#[derive(Debug, Default)]
pub struct StubCapture {
    windows: Vec<StubWindow>,
}

impl StubCapture {
    /// A backend that knows no windows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a window; handles are assigned in insertion order.
    pub fn with_window(mut self, window: StubWindow) -> Self {
        self.windows.push(window);
        self
    }

    fn window(&self, handle: WindowHandle) -> VisionResult<&StubWindow> {
        usize::try_from(handle.raw() - 1)
            .ok()
            .and_then(|idx| self.windows.get(idx))
            .ok_or_else(|| VisionError::capture("rect", format!("unknown window {handle:?}")))
    }
}

impl CaptureBackend for StubCapture {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn find_window(&self, pid: u32) -> VisionResult<WindowHandle> {
        self.windows
            .iter()
            .position(|w| w.pid == pid)
            .and_then(|idx| WindowHandle::new(idx as u64 + 1))
            .ok_or(VisionError::WindowNotFound { pid })
    }

    fn window_rect(&self, handle: WindowHandle) -> VisionResult<WindowRect> {
        Ok(self.window(handle)?.current_rect())
    }

    fn grab(
        &self,
        handle: WindowHandle,
        _rect: &WindowRect,
        strategy: CaptureStrategy,
    ) -> VisionResult<PixelBuffer> {
        let window = self.window(handle)?;
        let refused = match strategy {
            CaptureStrategy::OcclusionTolerant => window.refuse_primary,
            CaptureStrategy::VisibleOnly => window.refuse_fallback,
        };
        if refused {
            return Err(VisionError::capture(
                "grab",
                format!("{strategy} capture refused"),
            ));
        }
        Ok(window.pixels.clone())
    }
}
