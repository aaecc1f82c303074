//! # Textlay core
//!
//! Plain data shared by every other Textlay crate:
//!
//! - [`Vec2`], [`Size`], [`Rect`] geometry in surface pixels.
//! - [`Color`] with packed ARGB and hex constructors.
//! - [`input`] pointer and pinch events as delivered by a runner.
//! - [`Scene`] and [`SceneNode`], the retained draw list a frame produces.
//! - [`RenderBackend`] and [`TextMeasurer`], the two seams between the widget
//!   layer and the host.
//!
//! Nothing in here owns a thread, a window or a GPU handle.

pub mod color;
pub mod error;
pub mod geometry;
pub mod input;
pub mod measure;
pub mod render_api;
pub mod scene;
pub mod tests;

pub use color::*;
pub use error::*;
pub use geometry::*;
pub use measure::*;
pub use render_api::*;
pub use scene::*;
