//! Find-and-act layer: capture a window, locate a template, click it.

use crate::capture::{CaptureBackend, CaptureStrategy, WindowHandle};
use crate::geometry::{ScreenPoint, ScreenRect, WindowRect};
use crate::input::{validate_point, ClickMethod, ClickOptions, InputBackend, MouseButton};
use crate::kernel::{Correlator, Zncc};
use crate::search::{MatchResult, MultiScaleConfig, MultiScaleMatcher};
use crate::template::Template;
use crate::trace::{trace_event, trace_span};
use crate::util::VisionResult;
use rand::Rng;

/// Where inside a located box to click.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClickTarget {
    TopLeft,
    #[default]
    Center,
    /// A uniformly random pixel inside the box.
    RandomInBox,
}

impl ClickTarget {
    /// Picks the screen point for `rect`.
    pub fn point_in(self, rect: &ScreenRect) -> ScreenPoint {
        match self {
            ClickTarget::TopLeft => rect.min,
            ClickTarget::Center => rect.center(),
            ClickTarget::RandomInBox => {
                if rect.width() < 1 || rect.height() < 1 {
                    return rect.min;
                }
                let mut rng = rand::rng();
                ScreenPoint::new(
                    rng.random_range(rect.min.x..rect.max.x),
                    rng.random_range(rect.min.y..rect.max.y),
                )
            }
        }
    }
}

/// A template found inside a captured window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Located {
    pub handle: WindowHandle,
    /// Window bounds at capture time.
    pub window: WindowRect,
    /// Match in captured-image coordinates.
    pub found: MatchResult,
    /// The match box on screen.
    pub screen_rect: ScreenRect,
    pub strategy: CaptureStrategy,
}

/// Capture, match and input backends wired together.
pub struct Automator<C = Zncc> {
    capture: Box<dyn CaptureBackend>,
    input: Box<dyn InputBackend>,
    matcher: MultiScaleMatcher<C>,
}

impl Automator<Zncc> {
    /// Uses the default ZNCC matcher.
    pub fn new(capture: Box<dyn CaptureBackend>, input: Box<dyn InputBackend>) -> Self {
        Self::with_matcher(capture, input, MultiScaleMatcher::new())
    }
}

impl<C: Correlator> Automator<C> {
    pub fn with_matcher(
        capture: Box<dyn CaptureBackend>,
        input: Box<dyn InputBackend>,
        matcher: MultiScaleMatcher<C>,
    ) -> Self {
        Self {
            capture,
            input,
            matcher,
        }
    }

    pub fn capture_backend(&self) -> &dyn CaptureBackend {
        self.capture.as_ref()
    }

    pub fn input_backend(&self) -> &dyn InputBackend {
        self.input.as_ref()
    }

    /// Captures the main window of `pid` and searches it for `template`.
    ///
    /// Returns `None` when no scale reaches the threshold.
    pub fn locate(
        &self,
        pid: u32,
        template: &Template,
        config: &MultiScaleConfig,
    ) -> VisionResult<Option<Located>> {
        let _span = trace_span!("locate", pid = pid).entered();
        let captured = self.capture.capture_window(pid)?;
        let gray = captured.pixels.to_luma();
        let found = self
            .matcher
            .match_best_scale(gray.view(), template.view(), config)?;
        if !found.is_found() {
            trace_event!("not_found", pid = pid);
            return Ok(None);
        }
        let screen_rect = found.screen_rect(&captured.rect);
        trace_event!(
            "located",
            similarity = found.similarity,
            scale = found.scale,
            x = screen_rect.min.x,
            y = screen_rect.min.y
        );
        Ok(Some(Located {
            handle: captured.handle,
            window: captured.rect,
            found,
            screen_rect,
            strategy: captured.strategy,
        }))
    }

    /// Locates `template` in the window of `pid` and clicks it.
    ///
    /// Returns the clicked screen point, or `None` when the template was not
    /// found and nothing was clicked.
    pub fn click_template(
        &self,
        pid: u32,
        template: &Template,
        config: &MultiScaleConfig,
        button: MouseButton,
        options: &ClickOptions,
        target: ClickTarget,
    ) -> VisionResult<Option<ScreenPoint>> {
        let Some(located) = self.locate(pid, template, config)? else {
            return Ok(None);
        };
        let at = target.point_in(&located.screen_rect);
        self.click_at(located.handle, at, button, options)?;
        Ok(Some(at))
    }

    /// Clicks `at` through the method selected in `options`.
    pub fn click_at(
        &self,
        handle: WindowHandle,
        at: ScreenPoint,
        button: MouseButton,
        options: &ClickOptions,
    ) -> VisionResult<()> {
        validate_point(self.input.as_ref(), at)?;
        let _span = trace_span!("click", x = at.x, y = at.y, backend = self.input.name()).entered();
        match options.method {
            ClickMethod::SystemInput => self.input.click(at, button, options),
            ClickMethod::WindowMessage => self.input.click_window(handle, at, button, options),
        }
    }
}
