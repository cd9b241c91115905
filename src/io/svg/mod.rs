//! SVG format writing operations for map export.

mod color;
mod draw;
mod writer;

pub use color::{Colormap, Rgb};
pub(crate) use draw::*;
pub(crate) use writer::*;
