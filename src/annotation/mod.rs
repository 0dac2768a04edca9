/*!
 * Canonical annotation model shared by every format.
 *
 * - `model`: intervals, tiers and the annotation container
 * - `timing`: backward end-fill for formats that only store start times
 * - `normalize`: gap-filling and point extension applied before encoding
 */

pub mod model;
pub mod normalize;
pub mod timing;

pub use model::{Annotation, Interval, Tier};
pub use timing::fill_ends_backward;
