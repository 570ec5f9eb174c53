//! Input backend that records clicks instead of sending them.

use crate::capture::WindowHandle;
use crate::geometry::{ScreenPoint, ScreenRect};
use crate::input::{validate_point, ClickOptions, InputBackend, MouseButton};
use crate::util::VisionResult;
use std::sync::Mutex;

/// One click captured by [`RecordingInput`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedClick {
    pub at: ScreenPoint,
    pub button: MouseButton,
    /// Target window for message-based clicks.
    pub window: Option<WindowHandle>,
}

/// Records clicks within a fixed desktop area.
#[derive(Debug)]
pub struct RecordingInput {
    bounds: ScreenRect,
    clicks: Mutex<Vec<RecordedClick>>,
}

impl Default for RecordingInput {
    /// A single 1920x1080 display at the origin.
    fn default() -> Self {
        Self::new(ScreenRect {
            min: ScreenPoint::new(0, 0),
            max: ScreenPoint::new(1920, 1080),
        })
    }
}

impl RecordingInput {
    pub fn new(bounds: ScreenRect) -> Self {
        Self {
            bounds,
            clicks: Mutex::new(Vec::new()),
        }
    }

    /// Clicks recorded so far, oldest first.
    pub fn clicks(&self) -> Vec<RecordedClick> {
        match self.clicks.lock() {
            Ok(clicks) => clicks.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, click: RecordedClick) {
        match self.clicks.lock() {
            Ok(mut clicks) => clicks.push(click),
            Err(poisoned) => poisoned.into_inner().push(click),
        }
    }
}

impl InputBackend for RecordingInput {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn screen_bounds(&self) -> VisionResult<ScreenRect> {
        Ok(self.bounds)
    }

    fn click(
        &self,
        at: ScreenPoint,
        button: MouseButton,
        _options: &ClickOptions,
    ) -> VisionResult<()> {
        validate_point(self, at)?;
        self.record(RecordedClick {
            at,
            button,
            window: None,
        });
        Ok(())
    }

    fn click_window(
        &self,
        window: WindowHandle,
        at: ScreenPoint,
        button: MouseButton,
        _options: &ClickOptions,
    ) -> VisionResult<()> {
        validate_point(self, at)?;
        self.record(RecordedClick {
            at,
            button,
            window: Some(window),
        });
        Ok(())
    }
}
