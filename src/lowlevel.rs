//! Low-level building blocks for custom pipelines.
//!
//! These items expose correlation primitives, resize helpers and the capture
//! sequence beyond the high-level `Automator` API. Most users should prefer
//! the top-level `MultiScaleMatcher`, `Template` and `Automator` types.

pub use crate::capture::capture_with_fallback;
pub use crate::image::resize::resize_u8_bilinear;
pub use crate::input::validate_point;
pub use crate::kernel::scalar::MIN_WINDOW_ENERGY;
pub use crate::kernel::{Correlation, Correlator, Ssd, Zncc};
pub use crate::search::{ScaleSteps, SCALE_EPSILON};
pub use crate::template::TemplatePlan;
pub use crate::util::math::scaled_len;
