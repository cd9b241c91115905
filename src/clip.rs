//! Clip fine polygons by each coarse region and relabel the fragments.

use geo::{Area, BooleanOps, BoundingRect, MultiPolygon};
use indexmap::IndexMap;
use polars::prelude::*;
use tracing::{debug, info};

use crate::{collection::FeatureCollection, error::{Error, Result}};

/// Fragments of fine features clipped by coarse regions, concatenated in region order.
/// Attributes are those of the source feature, with the region column overwritten.
#[derive(Debug, Clone)]
pub struct ClippedCollection {
    features: FeatureCollection,
    sources: Vec<usize>,
    regions: Vec<String>,
}

impl ClippedCollection {
    #[inline] pub fn features(&self) -> &FeatureCollection { &self.features }

    /// Fine row each fragment was cut from.
    #[inline] pub fn sources(&self) -> &[usize] { &self.sources }

    /// Region identity of each fragment.
    #[inline] pub fn regions(&self) -> &[String] { &self.regions }

    #[inline] pub fn len(&self) -> usize { self.sources.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.sources.is_empty() }

    #[inline] pub fn into_collection(self) -> FeatureCollection { self.features }

    /// Sum an attribute over all fragments; nulls are ignored.
    pub fn total(&self, key: &str) -> Result<f64> { self.features.sum(key) }

    /// Sum of fragment areas.
    pub fn total_area(&self) -> f64 { self.features.total_area() }

    /// Recompute a per-fragment area attribute named `name`.
    pub fn with_area_column(self, name: &str) -> Result<Self> {
        let areas = self.features.shapes().iter()
            .map(|shape| shape.unsigned_area())
            .collect::<Vec<_>>();
        let (shapes, mut data, crs) = self.features.into_parts();
        data.with_column(Column::new(name.into(), areas))?;
        Ok(Self { features: FeatureCollection::new(shapes, data, crs)?, ..self })
    }
}

/// Distinct region identities in first-appearance order, with their coarse rows.
fn region_rows(coarse: &FeatureCollection, region_key: &str) -> Result<IndexMap<String, Vec<usize>>> {
    let column = coarse.column(region_key)?.cast(&DataType::String)?;
    let mut regions: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (i, name) in column.str()?.into_iter().enumerate() {
        if let Some(name) = name {
            regions.entry(name.to_string()).or_default().push(i);
        }
    }
    Ok(regions)
}

/// Intersect every fine feature near `mask` with it, keeping fragments with positive area.
fn clip_to_mask(fine: &FeatureCollection, mask: &MultiPolygon<f64>) -> Vec<(usize, MultiPolygon<f64>)> {
    let Some(rect) = mask.bounding_rect() else { return Vec::new() };
    fine.geoms().candidates(&rect).into_iter()
        .filter_map(|i| {
            let clipped = fine.geometry(i)?.intersection(mask);
            (clipped.unsigned_area() > 0.0).then_some((i, clipped))
        })
        .collect()
}

/// Clip `fine` by each distinct `region_key` region of `coarse`.
/// A region's mask is the union of all coarse features sharing its identity.
pub fn clip_by_region(fine: &FeatureCollection, coarse: &FeatureCollection, region_key: &str) -> Result<ClippedCollection> {
    fine.require_same_crs(coarse)?;

    let per_region = region_rows(coarse, region_key)?.into_iter()
        .map(|(region, rows)| {
            let fragments = clip_to_mask(fine, &coarse.geoms().union_of(&rows));
            debug!("[clip] {region}: {} fragments", fragments.len());
            (region, fragments)
        })
        .collect::<Vec<_>>();

    let mut sources = Vec::new();
    let mut regions = Vec::new();
    let mut shapes = Vec::new();
    for (region, fragments) in per_region {
        for (i, shape) in fragments {
            sources.push(i);
            regions.push(region.clone());
            shapes.push(shape);
        }
    }

    info!("[clip] {} features by {region_key:?} -> {} fragments", fine.len(), shapes.len());
    if shapes.is_empty() {
        return Err(Error::EmptyGeometryResult { operation: "clip_by_region" });
    }

    let (_, mut data, crs) = fine.take(&sources)?.into_parts();
    data.with_column(Column::new(region_key.into(), regions.clone()))?;

    Ok(ClippedCollection {
        features: FeatureCollection::new(shapes, data, crs)?,
        sources,
        regions,
    })
}
