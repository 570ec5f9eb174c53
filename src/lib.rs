//! GameVision locates template images inside captured application windows
//! and clicks them.
//!
//! The core is a multi-scale ZNCC template matcher over grayscale views.
//! Around it sit screen capture and mouse input behind backend traits, with
//! Windows and macOS implementations under the `platform` feature and
//! in-memory stubs everywhere else. Scale evaluation can run in parallel via
//! the `rayon` feature.

mod trace;

pub mod automation;
pub mod capture;
mod candidate;
pub mod compare;
pub mod geometry;
pub mod image;
pub mod input;
pub mod kernel;
pub mod lowlevel;
pub mod process;
pub mod search;
pub mod template;
pub mod util;

pub use automation::{Automator, ClickTarget, Located};
pub use capture::{CaptureBackend, CaptureStrategy, CapturedWindow, WindowHandle};
pub use compare::{compare_images, CompareMethod, Comparison};
pub use geometry::{
    to_image_point, to_screen_point, to_screen_rect, Point, Rect, ScreenPoint, ScreenRect,
    WindowRect,
};
pub use image::{ImageView, OwnedImage, PixelBuffer};
pub use input::{ClickMethod, ClickOptions, InputBackend, MouseButton};
pub use kernel::Metric;
pub use process::{MatchMode, ProcessInfo, ProcessLocator};
pub use search::{MatchResult, MultiScaleConfig, MultiScaleMatcher};
pub use template::Template;
pub use util::{Stage, VisionError, VisionResult};
