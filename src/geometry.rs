//! Image-space and screen-space geometry.
//!
//! Match results live in the pixel space of the captured image, with the
//! origin at the capture's top-left corner. Screen coordinates are absolute
//! desktop coordinates and may be negative on multi-monitor layouts. The two
//! spaces use distinct types so an image coordinate is never clicked by
//! accident; [`to_screen_point`] and [`to_screen_rect`] bridge them.

use crate::util::{VisionError, VisionResult};

/// Integer point in captured-image coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in captured-image coordinates.
///
/// `max` is exclusive: a box at `min` of size `w`x`h` has `max = min + (w, h)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    pub fn from_origin_size(origin: Point, width: i32, height: i32) -> Self {
        Self {
            min: origin,
            max: Point::new(
                origin.x.saturating_add(width),
                origin.y.saturating_add(height),
            ),
        }
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    /// Returns `true` for the zero-area box used by "not found" results.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Center point, rounded toward the top-left.
    pub fn center(&self) -> Point {
        Point::new(
            self.min.x + self.width() / 2,
            self.min.y + self.height() / 2,
        )
    }
}

/// Absolute desktop coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in desktop coordinates, `max` exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScreenRect {
    pub min: ScreenPoint,
    pub max: ScreenPoint,
}

impl ScreenRect {
    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(
            self.min.x + self.width() / 2,
            self.min.y + self.height() / 2,
        )
    }

    /// Returns `true` when `p` lies inside the half-open rectangle.
    pub fn contains(&self, p: ScreenPoint) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }
}

/// Screen-space bounds of a window at capture time.
///
/// Always has a positive width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowRect {
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
}

impl WindowRect {
    /// Creates bounds from the top-left and exclusive bottom-right corners.
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> VisionResult<Self> {
        let width = i64::from(max_x) - i64::from(min_x);
        let height = i64::from(max_y) - i64::from(min_y);
        if width <= 0 || height <= 0 {
            return Err(VisionError::InvalidDimensions {
                width: width.max(0) as usize,
                height: height.max(0) as usize,
            });
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Creates bounds from an origin and a size.
    pub fn from_origin_size(x: i32, y: i32, width: usize, height: usize) -> VisionResult<Self> {
        let w = i32::try_from(width).map_err(|_| VisionError::InvalidDimensions { width, height })?;
        let h =
            i32::try_from(height).map_err(|_| VisionError::InvalidDimensions { width, height })?;
        Self::new(x, y, x.saturating_add(w), y.saturating_add(h))
    }

    pub fn min_x(&self) -> i32 {
        self.min_x
    }

    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    pub fn max_x(&self) -> i32 {
        self.max_x
    }

    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    pub fn width(&self) -> usize {
        (self.max_x - self.min_x) as usize
    }

    pub fn height(&self) -> usize {
        (self.max_y - self.min_y) as usize
    }

    /// Window bounds as a screen rectangle.
    pub fn as_screen_rect(&self) -> ScreenRect {
        ScreenRect {
            min: ScreenPoint::new(self.min_x, self.min_y),
            max: ScreenPoint::new(self.max_x, self.max_y),
        }
    }
}

/// Translates an image-space point into screen space.
pub fn to_screen_point(p: Point, window: &WindowRect) -> ScreenPoint {
    ScreenPoint::new(
        p.x.saturating_add(window.min_x),
        p.y.saturating_add(window.min_y),
    )
}

/// Translates an image-space rectangle into screen space; size is preserved.
pub fn to_screen_rect(r: Rect, window: &WindowRect) -> ScreenRect {
    ScreenRect {
        min: to_screen_point(r.min, window),
        max: to_screen_point(r.max, window),
    }
}

/// Inverse of [`to_screen_point`].
pub fn to_image_point(p: ScreenPoint, window: &WindowRect) -> Point {
    Point::new(
        p.x.saturating_sub(window.min_x),
        p.y.saturating_sub(window.min_y),
    )
}
