//! Pipeline and map configuration, loadable from a JSON file.
//! Every field has a default reproducing the Northern Ireland ward analysis.

use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{aggregate::JoinPredicate, crs::Crs, io::svg::{Colormap, Rgb}};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fine polygons (wards).
    pub fine_path: PathBuf,
    /// Coarse polygons (counties).
    pub coarse_path: PathBuf,
    /// Optional backdrop outline; also sets the map extent.
    pub outline_path: Option<PathBuf>,
    /// Planar CRS every dataset is normalized to.
    pub epsg: u32,
    pub group_key: String,
    pub value_key: String,
    pub predicate: JoinPredicate,
    pub map: MapConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fine_path: PathBuf::from("../Week3/data_files/NI_Wards.shp"),
            coarse_path: PathBuf::from("../Week3/data_files/Counties.shp"),
            outline_path: Some(PathBuf::from("../Week2/data_files/NI_outline.shp")),
            epsg: 2157,
            group_key: "CountyName".into(),
            value_key: "Population".into(),
            predicate: JoinPredicate::Intersects,
            map: MapConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("[config] Failed to read {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("[config] Invalid config {}", path.display()))
    }

    #[inline] pub fn crs(&self) -> Crs { Crs::Epsg(self.epsg) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Figure size in inches (width, height).
    pub figsize: (f64, f64),
    pub dpi: f64,
    /// Margin added around the data bounds, in map units.
    pub margin: f64,
    pub colormap: Colormap,
    pub vmin: f64,
    pub vmax: f64,
    pub colorbar_label: String,
    pub line_width: f64,
    pub font: String,
    pub outline_edge: Rgb,
    pub region_edge: Rgb,
    pub gridlines: GridlineConfig,
    pub scale_bar: ScaleBarConfig,
    pub legend: LegendConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            figsize: (10.0, 10.0),
            dpi: 300.0,
            margin: 5000.0,
            colormap: Colormap::Viridis,
            vmin: 1000.0,
            vmax: 8000.0,
            colorbar_label: "Resident Population".into(),
            line_width: 1.0,
            font: "sans-serif".into(),
            outline_edge: Rgb::BLACK,
            region_edge: Rgb::RED,
            gridlines: GridlineConfig::default(),
            scale_bar: ScaleBarConfig::default(),
            legend: LegendConfig::default(),
        }
    }
}

/// Which sides of the axes carry gridline labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSides {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl Default for LabelSides {
    fn default() -> Self {
        Self { top: true, bottom: false, left: false, right: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridlineConfig {
    pub enabled: bool,
    /// Longitudes of meridians, in degrees.
    pub xlocs: Vec<f64>,
    /// Latitudes of parallels, in degrees.
    pub ylocs: Vec<f64>,
    pub labels: LabelSides,
    pub font_size: f64,
}

impl Default for GridlineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            xlocs: vec![-8.0, -7.5, -7.0, -6.5, -6.0, -5.5],
            ylocs: vec![54.0, 54.5, 55.0, 55.5],
            labels: LabelSides::default(),
            font_size: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleBarConfig {
    pub enabled: bool,
    /// Right end of the bar as a fraction of the extent (x, y).
    pub location: (f64, f64),
    /// Bar length in map units.
    pub length: f64,
    /// Number of alternating black/white segments.
    pub segments: usize,
    pub font_size: f64,
}

impl Default for ScaleBarConfig {
    fn default() -> Self {
        Self { enabled: true, location: (0.92, 0.95), length: 20000.0, segments: 2, font_size: 8.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub enabled: bool,
    pub font_size: f64,
    pub frame_alpha: f64,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self { enabled: true, font_size: 12.0, frame_alpha: 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{ "epsg": 29902, "predicate": "overlaps", "map": { "vmax": 9000.0, "scale_bar": { "length": 10000.0 } } }"#
        ).unwrap();
        assert_eq!(config.crs(), Crs::Epsg(29902));
        assert_eq!(config.predicate, JoinPredicate::Overlaps);
        assert_eq!(config.group_key, "CountyName");
        assert_eq!(config.map.vmax, 9000.0);
        assert_eq!(config.map.vmin, 1000.0);
        assert_eq!(config.map.scale_bar.length, 10000.0);
        assert_eq!(config.map.scale_bar.segments, 2);
    }

    #[test]
    fn defaults_round_trip_through_json() {
        let config = PipelineConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<PipelineConfig>(&text).unwrap(), config);
    }
}
