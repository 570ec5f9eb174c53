//! Window capture: locate a process's top-level window and read its pixels.
//!
//! Each platform backend offers two strategies. The occlusion-tolerant one
//! asks the window system to render the window itself, so overlapping windows
//! do not leak into the image. When the OS refuses it, [`capture_with_fallback`]
//! retries once with a visible-only screen copy, emits a warning, and records
//! the downgrade in [`CapturedWindow::strategy`].
//!
//! The window rectangle is read before and after the pixel copy; a window
//! that moved or resized in between yields an error rather than pixels that
//! would map to the wrong screen position.

use crate::geometry::WindowRect;
use crate::image::PixelBuffer;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{VisionError, VisionResult};
use std::fmt;
use std::num::NonZeroU64;

pub mod stub;

#[cfg(all(windows, feature = "platform"))]
pub mod win32;

#[cfg(all(target_os = "macos", feature = "platform"))]
pub mod macos;

pub use stub::{StubCapture, StubWindow};

/// Opaque OS window identifier.
///
/// Zero is never a valid handle, so "no window" is expressed as
/// `Option<WindowHandle>` instead of a sentinel value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(NonZeroU64);

impl WindowHandle {
    /// Wraps a raw OS identifier; returns `None` for zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// The raw OS identifier.
    pub fn raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowHandle({:#x})", self.raw())
    }
}

/// How the pixels of a capture were obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureStrategy {
    /// The window system rendered the window on its own.
    OcclusionTolerant,
    /// A copy of what is currently visible on screen in the window's area.
    VisibleOnly,
}

impl fmt::Display for CaptureStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CaptureStrategy::OcclusionTolerant => "occlusion-tolerant",
            CaptureStrategy::VisibleOnly => "visible-only",
        })
    }
}

/// A successful window capture.
///
/// `pixels` has exactly the size of `rect`, and `rect` is the window's
/// screen position at capture time.
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedWindow {
    pub pixels: PixelBuffer,
    pub rect: WindowRect,
    pub handle: WindowHandle,
    pub strategy: CaptureStrategy,
}

/// Platform capture capability.
///
/// Backends implement the three primitive steps; the capture sequence with
/// its fallback and consistency checks is provided by
/// [`capture_with_fallback`] through the default `capture_window`.
pub trait CaptureBackend: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the process's main top-level window.
    ///
    /// Fails with `WindowNotFound` when the process owns no such window.
    fn find_window(&self, pid: u32) -> VisionResult<WindowHandle>;

    /// Reads the window's current screen bounds.
    fn window_rect(&self, handle: WindowHandle) -> VisionResult<WindowRect>;

    /// Copies the window's pixels using one strategy.
    ///
    /// Should return `CaptureFailed` when the OS refuses the strategy, so
    /// the caller can fall back.
    fn grab(
        &self,
        handle: WindowHandle,
        rect: &WindowRect,
        strategy: CaptureStrategy,
    ) -> VisionResult<PixelBuffer>;

    /// Captures the main window of `pid`.
    fn capture_window(&self, pid: u32) -> VisionResult<CapturedWindow> {
        capture_with_fallback(self, pid)
    }
}

impl<B: CaptureBackend + ?Sized> CaptureBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn find_window(&self, pid: u32) -> VisionResult<WindowHandle> {
        (**self).find_window(pid)
    }

    fn window_rect(&self, handle: WindowHandle) -> VisionResult<WindowRect> {
        (**self).window_rect(handle)
    }

    fn grab(
        &self,
        handle: WindowHandle,
        rect: &WindowRect,
        strategy: CaptureStrategy,
    ) -> VisionResult<PixelBuffer> {
        (**self).grab(handle, rect, strategy)
    }

    fn capture_window(&self, pid: u32) -> VisionResult<CapturedWindow> {
        (**self).capture_window(pid)
    }
}

/// Steps of a single capture.
enum CaptureState {
    Locate,
    Measure(WindowHandle),
    Grab {
        handle: WindowHandle,
        rect: WindowRect,
        strategy: CaptureStrategy,
        primary_error: Option<String>,
    },
    Verify {
        handle: WindowHandle,
        rect: WindowRect,
        strategy: CaptureStrategy,
        pixels: PixelBuffer,
    },
}

/// Runs locate, measure, grab (with one fallback) and verify on `backend`.
pub fn capture_with_fallback<B: CaptureBackend + ?Sized>(
    backend: &B,
    pid: u32,
) -> VisionResult<CapturedWindow> {
    let _span = trace_span!("capture_window", pid = pid, backend = backend.name()).entered();

    let mut state = CaptureState::Locate;
    loop {
        state = match state {
            CaptureState::Locate => CaptureState::Measure(backend.find_window(pid)?),
            CaptureState::Measure(handle) => CaptureState::Grab {
                handle,
                rect: backend.window_rect(handle)?,
                strategy: CaptureStrategy::OcclusionTolerant,
                primary_error: None,
            },
            CaptureState::Grab {
                handle,
                rect,
                strategy,
                primary_error,
            } => match backend.grab(handle, &rect, strategy) {
                Ok(pixels) => CaptureState::Verify {
                    handle,
                    rect,
                    strategy,
                    pixels,
                },
                Err(VisionError::CaptureFailed { reason, .. })
                    if strategy == CaptureStrategy::OcclusionTolerant =>
                {
                    trace_warn!(
                        "occlusion-tolerant capture refused, falling back to visible-only capture",
                        pid = pid,
                        backend = backend.name(),
                        reason = reason.as_str(),
                    );
                    CaptureState::Grab {
                        handle,
                        rect,
                        strategy: CaptureStrategy::VisibleOnly,
                        primary_error: Some(reason),
                    }
                }
                Err(VisionError::CaptureFailed { reason, .. }) => {
                    let reason = match primary_error {
                        Some(primary) => format!("{reason} (occlusion-tolerant: {primary})"),
                        None => reason,
                    };
                    return Err(VisionError::capture("fallback", reason));
                }
                Err(err) => return Err(err),
            },
            CaptureState::Verify {
                handle,
                rect,
                strategy,
                pixels,
            } => {
                if pixels.width() != rect.width() || pixels.height() != rect.height() {
                    return Err(VisionError::capture(
                        "verify",
                        format!(
                            "captured {}x{} pixels for a {}x{} window",
                            pixels.width(),
                            pixels.height(),
                            rect.width(),
                            rect.height()
                        ),
                    ));
                }
                let after = backend.window_rect(handle)?;
                if after != rect {
                    return Err(VisionError::capture(
                        "verify",
                        "window moved or resized during capture",
                    ));
                }
                trace_event!(
                    "captured",
                    width = rect.width(),
                    height = rect.height(),
                    fallback = strategy == CaptureStrategy::VisibleOnly
                );
                return Ok(CapturedWindow {
                    pixels,
                    rect,
                    handle,
                    strategy,
                });
            }
        };
    }
}

/// Creates the capture backend for the current OS.
///
/// Falls back to an empty [`StubCapture`] when `force_stub` is set, on
/// unsupported targets, or when the `platform` feature is disabled.
pub fn create_backend(force_stub: bool) -> Box<dyn CaptureBackend> {
    if force_stub {
        return Box::new(StubCapture::new());
    }
    #[cfg(all(windows, feature = "platform"))]
    let backend: Box<dyn CaptureBackend> = Box::new(win32::WindowsCapture);
    #[cfg(all(target_os = "macos", feature = "platform"))]
    let backend: Box<dyn CaptureBackend> = Box::new(macos::MacCapture);
    #[cfg(not(all(any(windows, target_os = "macos"), feature = "platform")))]
    let backend: Box<dyn CaptureBackend> = Box::new(StubCapture::new());
    backend
}
