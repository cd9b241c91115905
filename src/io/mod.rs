//! IO module for format-specific writing operations.
//!
//! - `svg` - SVG documents for map export
//!
//! Shapefile reading and writing lives in `common::data`, next to the dBase
//! attribute conversion it depends on.

pub(crate) mod svg;
