use std::collections::HashSet;

use geo::{BoundingRect, MultiPolygon, Relate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{collection::{idx_chunked, FeatureCollection}, error::{Error, Result}};

/// Column holding the matched coarse row index in a spatial join.
pub const INDEX_RIGHT: &str = "index_right";

/// Spatial predicate used to pair fine and coarse features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum JoinPredicate {
    /// Geometries share at least one point (boundary touches included).
    #[default]
    Intersects,
    /// Interiors intersect: the pair shares area.
    Overlaps,
    /// The fine feature lies within the coarse feature.
    Within,
    /// The fine feature contains the coarse feature.
    Contains,
}

impl JoinPredicate {
    /// Evaluate the predicate with one DE-9IM computation.
    pub fn matches(&self, fine: &MultiPolygon<f64>, coarse: &MultiPolygon<f64>) -> bool {
        let im = fine.relate(coarse);
        match self {
            JoinPredicate::Intersects => im.is_intersects(),
            JoinPredicate::Overlaps => im.is_intersects() && !im.is_touches(),
            JoinPredicate::Within => im.is_within(),
            JoinPredicate::Contains => im.is_contains(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOptions {
    pub predicate: JoinPredicate,
    /// Suffix for fine columns whose name also exists on the coarse side.
    pub lsuffix: String,
    /// Suffix for coarse columns whose name also exists on the fine side.
    pub rsuffix: String,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self { predicate: JoinPredicate::default(), lsuffix: "left".into(), rsuffix: "right".into() }
    }
}

/// Result of an inner spatial join: one row per matching (fine, coarse) pair,
/// carrying the fine geometry, fine attributes, `index_right` and coarse attributes.
#[derive(Debug, Clone)]
pub struct SpatialJoin {
    features: FeatureCollection,
    pairs: Vec<(usize, usize)>,
}

impl SpatialJoin {
    #[inline] pub fn features(&self) -> &FeatureCollection { &self.features }

    /// `(fine_row, coarse_row)` for each output row.
    #[inline] pub fn pairs(&self) -> &[(usize, usize)] { &self.pairs }

    #[inline] pub fn len(&self) -> usize { self.pairs.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.pairs.is_empty() }

    #[inline] pub fn into_collection(self) -> FeatureCollection { self.features }
}

/// Find `(fine, coarse)` row pairs satisfying `predicate`, fine-major with coarse rows ascending.
fn matching_pairs(fine: &FeatureCollection, coarse: &FeatureCollection, predicate: JoinPredicate) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, shape) in fine.shapes().iter().enumerate() {
        let Some(rect) = shape.bounding_rect() else { continue };
        for j in coarse.geoms().candidates(&rect) {
            let Some(candidate) = coarse.geometry(j) else { continue };
            if predicate.matches(shape, candidate) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Inner spatial join of `fine` against `coarse`.
/// Fine features without a match are dropped; features matching several coarse
/// features appear once per match.
pub fn sjoin(fine: &FeatureCollection, coarse: &FeatureCollection, options: &JoinOptions) -> Result<SpatialJoin> {
    fine.require_same_crs(coarse)?;

    let pairs = matching_pairs(fine, coarse, options.predicate);
    info!("[sjoin] {} fine x {} coarse -> {} rows ({:?})", fine.len(), coarse.len(), pairs.len(), options.predicate);
    if pairs.is_empty() {
        return Err(Error::EmptyGeometryResult { operation: "sjoin" });
    }

    let fine_rows = pairs.iter().map(|&(i, _)| i).collect::<Vec<_>>();
    let coarse_rows = pairs.iter().map(|&(_, j)| j).collect::<Vec<_>>();

    let left = fine.take(&fine_rows)?;
    let right = coarse.data().take(&idx_chunked(&coarse_rows))?;

    let left_names = left.column_names().into_iter().collect::<HashSet<_>>();
    let shared = right.get_column_names().iter()
        .map(|name| name.to_string())
        .filter(|name| left_names.contains(name))
        .collect::<HashSet<_>>();
    if !shared.is_empty() {
        debug!("[sjoin] suffixing shared columns {:?}", shared);
    }

    let (shapes, left_data, crs) = left.into_parts();

    let rename = |mut column: Column, suffix: &str| {
        if shared.contains(column.name().as_str()) {
            let name = format!("{}_{suffix}", column.name());
            column.rename(name.into());
        }
        column
    };

    let mut columns = left_data.take_columns().into_iter()
        .map(|column| rename(column, &options.lsuffix))
        .collect::<Vec<_>>();
    columns.push(Column::new(
        INDEX_RIGHT.into(),
        coarse_rows.iter().map(|&j| j as u32).collect::<Vec<_>>(),
    ));
    columns.extend(right.take_columns().into_iter().map(|column| rename(column, &options.rsuffix)));

    let features = FeatureCollection::new(shapes, DataFrame::new(columns)?, crs)?;
    Ok(SpatialJoin { features, pairs })
}
