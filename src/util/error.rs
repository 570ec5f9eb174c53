//! Error types for gamevision.

use std::fmt;
use thiserror::Error;

/// Result alias for gamevision operations.
pub type VisionResult<T> = std::result::Result<T, VisionError>;

/// Pipeline stage an error originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Process enumeration and lookup.
    Process,
    /// Window lookup and pixel capture.
    Capture,
    /// Template matching and its preconditions.
    Match,
    /// Synthesized input.
    Click,
    /// Image decoding and encoding.
    Io,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Process => "process",
            Stage::Capture => "capture",
            Stage::Match => "match",
            Stage::Click => "click",
            Stage::Io => "io",
        };
        f.write_str(name)
    }
}

/// Errors that can occur across capture, matching and input.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum VisionError {
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the described image.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A region does not fit inside its image.
    #[error("region {width}x{height} at ({x}, {y}) exceeds image {img_width}x{img_height}")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Matching configuration violates its invariants.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },
    /// The correlation primitive failed.
    #[error("correlation failed: {reason}")]
    Correlation { reason: String },
    /// Image decoding or encoding failed.
    #[error("image io failed: {reason}")]
    ImageIo { reason: String },
    /// No process matched the requested name.
    #[error("process not found: {name}")]
    ProcessNotFound { name: String },
    /// The process owns no capturable top-level window.
    #[error("no window found for pid {pid}")]
    WindowNotFound { pid: u32 },
    /// Capture failed at the named step.
    #[error("capture failed during {step}: {reason}")]
    CaptureFailed { step: &'static str, reason: String },
    /// Synthesized input was rejected by the OS.
    #[error("input failed: {reason}")]
    InputFailed { reason: String },
    /// Screen coordinate lies outside the display.
    #[error("coordinate ({x}, {y}) outside screen {width}x{height}")]
    InvalidCoordinate {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    /// The backend does not provide this operation.
    #[error("unsupported operation: {operation}")]
    Unsupported { operation: &'static str },
}

impl VisionError {
    /// Returns the pipeline stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            VisionError::InvalidDimensions { .. }
            | VisionError::InvalidStride { .. }
            | VisionError::BufferTooSmall { .. }
            | VisionError::RoiOutOfBounds { .. }
            | VisionError::InvalidConfig { .. }
            | VisionError::Correlation { .. } => Stage::Match,
            VisionError::ImageIo { .. } => Stage::Io,
            VisionError::ProcessNotFound { .. } => Stage::Process,
            VisionError::WindowNotFound { .. } | VisionError::CaptureFailed { .. } => {
                Stage::Capture
            }
            VisionError::InputFailed { .. } | VisionError::InvalidCoordinate { .. } => Stage::Click,
            VisionError::Unsupported { .. } => Stage::Click,
        }
    }

    pub(crate) fn capture(step: &'static str, reason: impl Into<String>) -> Self {
        VisionError::CaptureFailed {
            step,
            reason: reason.into(),
        }
    }

    pub(crate) fn input(reason: impl Into<String>) -> Self {
        VisionError::InputFailed {
            reason: reason.into(),
        }
    }
}
