#![doc = "wardmap public API"]
mod aggregate;
mod clip;
mod collection;
mod common;
mod crs;
mod error;
mod geom;
mod io;

pub mod cli;
pub mod commands;
pub mod config;
pub mod render;

#[doc(inline)]
pub use collection::{load, FeatureCollection, Value};

#[doc(inline)]
pub use crs::Crs;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use aggregate::{extremes, sjoin, summarize, Extremes, GroupSummary, JoinOptions, JoinPredicate, SpatialJoin};

#[doc(inline)]
pub use clip::{clip_by_region, ClippedCollection};

#[doc(inline)]
pub use config::{GridlineConfig, LabelSides, LegendConfig, MapConfig, PipelineConfig, ScaleBarConfig};

#[doc(inline)]
pub use io::svg::{Colormap, Rgb};

#[doc(inline)]
pub use render::{render_map, render_map_to_string, MapLayers, RenderContext};
