//! Synthesized mouse input in absolute screen coordinates.
//!
//! Clicks are blocking: the calling thread sleeps through the button
//! down/up delay and any jitter pauses.

use crate::capture::WindowHandle;
use crate::geometry::{ScreenPoint, ScreenRect};
use crate::util::{VisionError, VisionResult};
use rand::Rng;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

pub mod stub;

#[cfg(all(windows, feature = "platform"))]
pub mod win32;

#[cfg(all(target_os = "macos", feature = "platform"))]
pub mod macos;

pub use stub::{RecordedClick, RecordingInput};

/// Pause before pressing, in milliseconds, when jitter is enabled.
pub const PRE_CLICK_JITTER_MS: Range<u64> = 5..15;
/// Pause after releasing, in milliseconds, when jitter is enabled.
pub const POST_CLICK_JITTER_MS: Range<u64> = 3..10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// How a click reaches the target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClickMethod {
    /// System-wide input events; moves the real cursor.
    #[default]
    SystemInput,
    /// Button messages sent to the window under the point; the cursor stays put.
    WindowMessage,
}

/// Click tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClickOptions {
    /// Time between button down and button up.
    pub delay: Duration,
    /// Adds short random pauses around the click.
    pub jitter: bool,
    /// Re-activates the previously focused window afterwards.
    pub restore_focus: bool,
    pub method: ClickMethod,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(50),
            jitter: false,
            restore_focus: false,
            method: ClickMethod::SystemInput,
        }
    }
}

impl ClickOptions {
    /// Sleeps for a random pre-click pause if jitter is on.
    pub fn pause_before(&self) {
        self.jitter_pause(PRE_CLICK_JITTER_MS);
    }

    /// Sleeps for a random post-click pause if jitter is on.
    pub fn pause_after(&self) {
        self.jitter_pause(POST_CLICK_JITTER_MS);
    }

    fn jitter_pause(&self, range: Range<u64>) {
        if self.jitter {
            let ms = rand::rng().random_range(range);
            std::thread::sleep(Duration::from_millis(ms));
        }
    }
}

/// Platform input capability.
pub trait InputBackend: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Bounds of the whole desktop across all displays.
    fn screen_bounds(&self) -> VisionResult<ScreenRect>;

    /// Clicks at an absolute screen position.
    fn click(
        &self,
        at: ScreenPoint,
        button: MouseButton,
        options: &ClickOptions,
    ) -> VisionResult<()>;

    /// Delivers a click to `window` (or its child under `at`) without
    /// moving the cursor.
    fn click_window(
        &self,
        window: WindowHandle,
        at: ScreenPoint,
        button: MouseButton,
        options: &ClickOptions,
    ) -> VisionResult<()> {
        let _ = (window, at, button, options);
        Err(VisionError::Unsupported {
            operation: "click_window",
        })
    }
}

impl<B: InputBackend + ?Sized> InputBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn screen_bounds(&self) -> VisionResult<ScreenRect> {
        (**self).screen_bounds()
    }

    fn click(
        &self,
        at: ScreenPoint,
        button: MouseButton,
        options: &ClickOptions,
    ) -> VisionResult<()> {
        (**self).click(at, button, options)
    }

    fn click_window(
        &self,
        window: WindowHandle,
        at: ScreenPoint,
        button: MouseButton,
        options: &ClickOptions,
    ) -> VisionResult<()> {
        (**self).click_window(window, at, button, options)
    }
}

impl<B: InputBackend + ?Sized> InputBackend for Arc<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn screen_bounds(&self) -> VisionResult<ScreenRect> {
        (**self).screen_bounds()
    }

    fn click(
        &self,
        at: ScreenPoint,
        button: MouseButton,
        options: &ClickOptions,
    ) -> VisionResult<()> {
        (**self).click(at, button, options)
    }

    fn click_window(
        &self,
        window: WindowHandle,
        at: ScreenPoint,
        button: MouseButton,
        options: &ClickOptions,
    ) -> VisionResult<()> {
        (**self).click_window(window, at, button, options)
    }
}

/// Rejects points outside the backend's desktop bounds.
pub fn validate_point<B: InputBackend + ?Sized>(backend: &B, at: ScreenPoint) -> VisionResult<()> {
    let bounds = backend.screen_bounds()?;
    if bounds.contains(at) {
        Ok(())
    } else {
        Err(VisionError::InvalidCoordinate {
            x: at.x,
            y: at.y,
            width: bounds.width(),
            height: bounds.height(),
        })
    }
}

/// Runs `press`, then `release` even when the press failed.
///
/// Returns the first error so a failed button-down never leaves the
/// button held.
pub fn press_and_release<P, R>(press: P, release: R) -> VisionResult<()>
where
    P: FnOnce() -> VisionResult<()>,
    R: FnOnce() -> VisionResult<()>,
{
    let pressed = press();
    let released = release();
    pressed.and(released)
}

/// Creates the input backend for the current OS.
///
/// Falls back to a [`RecordingInput`] when `force_stub` is set, on
/// unsupported targets, or when the `platform` feature is disabled.
pub fn create_backend(force_stub: bool) -> Box<dyn InputBackend> {
    if force_stub {
        return Box::new(RecordingInput::default());
    }
    #[cfg(all(windows, feature = "platform"))]
    let backend: Box<dyn InputBackend> = Box::new(win32::WindowsInput);
    #[cfg(all(target_os = "macos", feature = "platform"))]
    let backend: Box<dyn InputBackend> = Box::new(macos::MacInput);
    #[cfg(not(all(any(windows, target_os = "macos"), feature = "platform")))]
    let backend: Box<dyn InputBackend> = Box::new(RecordingInput::default());
    backend
}

#[cfg(test)]
mod tests {
    use super::{
        press_and_release, validate_point, ClickOptions, InputBackend, MouseButton,
        RecordingInput,
    };
    use crate::capture::WindowHandle;
    use crate::geometry::{ScreenPoint, ScreenRect};
    use crate::util::{VisionError, VisionResult};
    use std::cell::Cell;
    use std::time::{Duration, Instant};

    struct ScreenOnly;

    impl InputBackend for ScreenOnly {
        fn name(&self) -> &'static str {
            "screen-only"
        }

        fn screen_bounds(&self) -> VisionResult<ScreenRect> {
            Ok(ScreenRect {
                min: ScreenPoint::new(0, 0),
                max: ScreenPoint::new(100, 100),
            })
        }

        fn click(&self, _: ScreenPoint, _: MouseButton, _: &ClickOptions) -> VisionResult<()> {
            Ok(())
        }
    }

    #[test]
    fn default_options_match_documented_values() {
        let opts = ClickOptions::default();
        assert_eq!(opts.delay, Duration::from_millis(50));
        assert!(!opts.jitter);
        assert!(!opts.restore_focus);
    }

    #[test]
    fn jitter_pauses_stay_short() {
        let opts = ClickOptions {
            jitter: true,
            ..ClickOptions::default()
        };
        let start = Instant::now();
        opts.pause_before();
        opts.pause_after();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(8));
        assert!(elapsed < Duration::from_millis(500));
    }

    #[test]
    fn points_outside_the_desktop_are_rejected() {
        let input = RecordingInput::new(ScreenRect {
            min: ScreenPoint::new(-1280, 0),
            max: ScreenPoint::new(1920, 1080),
        });
        validate_point(&input, ScreenPoint::new(-100, 10)).unwrap();
        let err = validate_point(&input, ScreenPoint::new(1920, 10)).unwrap_err();
        assert_eq!(
            err,
            VisionError::InvalidCoordinate {
                x: 1920,
                y: 10,
                width: 3200,
                height: 1080,
            }
        );
    }

    #[test]
    fn window_clicks_are_unsupported_by_default() {
        let err = ScreenOnly
            .click_window(
                WindowHandle::new(1).unwrap(),
                ScreenPoint::new(0, 0),
                MouseButton::Left,
                &ClickOptions::default(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            VisionError::Unsupported {
                operation: "click_window"
            }
        );
        ScreenOnly
            .click(ScreenPoint::new(0, 0), MouseButton::Left, &ClickOptions::default())
            .unwrap();
    }

    #[test]
    fn release_runs_after_a_failed_press() {
        let released = Cell::new(false);
        let err = press_and_release(
            || Err(VisionError::input("down rejected")),
            || {
                released.set(true);
                Err(VisionError::input("up rejected"))
            },
        )
        .unwrap_err();
        assert!(released.get());
        assert_eq!(err, VisionError::input("down rejected"));
    }

    #[test]
    fn release_error_surfaces_after_a_clean_press() {
        let err = press_and_release(|| Ok(()), || Err(VisionError::input("up rejected")))
            .unwrap_err();
        assert_eq!(err, VisionError::input("up rejected"));
        press_and_release(|| Ok(()), || Ok(())).unwrap();
    }
}
