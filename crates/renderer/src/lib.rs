//! Raster rendering for regional forecast maps.
//!
//! Implements the drawing styles used by the viewer:
//! - Filled surfaces (colour ramp over bilinearly sampled data)
//! - Isolines (marching squares) with inline labels
//! - Quiver arrows for wind vectors
//! - Colour bar, frame, degree ticks and titles
//!
//! Output is an RGBA image or a PNG with the title in its metadata.

pub mod contour;
pub mod error;
pub mod gradient;
pub mod layout;
pub mod map;
pub mod png;
pub mod text;
pub mod vectors;

pub use error::{RenderError, RenderResult};
pub use gradient::{Color, ColorRamp, ValueScale};
pub use map::{MapRenderer, MapStyle, RenderedMap};
pub use vectors::QuiverStyle;
