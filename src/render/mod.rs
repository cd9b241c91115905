//! Choropleth map rendering with cartographic decorations.

mod colorbar;
mod context;
mod gridlines;
mod legend;
mod map;
mod scalebar;

pub use colorbar::ticks;
pub use context::{Layout, PixelProjection, RenderContext};
pub use gridlines::{format_lat, format_lon};
pub use legend::{generate_handles, LegendHandle};
pub use map::{render_map, render_map_to_string, MapLayers};
pub use scalebar::{scale_bar, BarSegment, ScaleBar};
