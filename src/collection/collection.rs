use std::fmt;

use geo::{Area, MultiPolygon, Rect};
use polars::prelude::*;
use tracing::debug;

use crate::{crs::Crs, error::{Error, Result}, geom::{reproject_shapes, Geometries}};

use super::Value;

/// An ordered set of polygon features sharing one CRS.
/// Row `i` of `data` holds the attributes of geometry `i`.
#[derive(Clone)]
pub struct FeatureCollection {
    geoms: Geometries,
    data: DataFrame,
    crs: Option<Crs>,
}

impl FeatureCollection {
    /// Build a collection from geometries and an attribute table of matching height.
    /// A table without columns is accepted for any number of geometries.
    pub fn new(shapes: Vec<MultiPolygon<f64>>, data: DataFrame, crs: Option<Crs>) -> Result<Self> {
        if data.width() > 0 && data.height() != shapes.len() {
            return Err(Error::Data(PolarsError::ShapeMismatch(
                format!("attribute table has {} rows for {} geometries", data.height(), shapes.len()).into()
            )));
        }
        Ok(Self { geoms: Geometries::new(shapes), data, crs })
    }

    #[inline] pub fn len(&self) -> usize { self.geoms.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.geoms.len() == 0 }

    #[inline] pub fn crs(&self) -> Option<&Crs> { self.crs.as_ref() }

    /// Get a reference to the attribute table.
    #[inline] pub fn data(&self) -> &DataFrame { &self.data }

    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { self.geoms.shapes() }

    #[inline] pub fn geometry(&self, i: usize) -> Option<&MultiPolygon<f64>> { self.geoms.get(i) }

    #[inline] pub(crate) fn geoms(&self) -> &Geometries { &self.geoms }

    /// Split into parts, dropping the spatial index.
    pub(crate) fn into_parts(self) -> (Vec<MultiPolygon<f64>>, DataFrame, Option<Crs>) {
        (self.geoms.into_shapes(), self.data, self.crs)
    }

    /// Attribute column names, in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.data.get_column_names().iter().map(|name| name.to_string()).collect()
    }

    /// Get the value of attribute `name` at row `i`.
    pub fn value(&self, i: usize, name: &str) -> Result<Value> {
        Ok(self.column(name)?.get(i)?.into())
    }

    /// Get an attribute column, or `MissingAttribute`.
    pub(crate) fn column(&self, name: &str) -> Result<&Column> {
        self.data.column(name).map_err(|_| Error::MissingAttribute(name.to_string()))
    }

    /// Compute the bounding rectangle of all features.
    #[inline] pub fn bounds(&self) -> Option<Rect<f64>> { self.geoms.bounds() }

    /// Sum of feature areas, in squared CRS units.
    pub fn total_area(&self) -> f64 {
        self.shapes().iter().map(|shape| shape.unsigned_area()).sum()
    }

    /// Sum a numeric attribute over all features; nulls are ignored.
    pub fn sum(&self, name: &str) -> Result<f64> {
        let column = self.column(name)?.cast(&DataType::Float64)?;
        Ok(column.f64()?.into_iter().flatten().sum())
    }

    /// Whether both collections share one CRS.
    #[inline] pub fn same_crs(&self, other: &FeatureCollection) -> bool { self.crs == other.crs }

    pub(crate) fn require_same_crs(&self, other: &FeatureCollection) -> Result<()> {
        if self.same_crs(other) { Ok(()) } else { Err(Error::crs_mismatch(self.crs(), other.crs())) }
    }

    /// New collection holding the given rows, in the given order (rows may repeat).
    pub fn take(&self, rows: &[usize]) -> Result<Self> {
        let shapes = rows.iter()
            .map(|&i| self.geoms.get(i).cloned()
                .ok_or_else(|| Error::Data(PolarsError::OutOfBounds(format!("row {i} out of bounds (len = {})", self.len()).into()))))
            .collect::<Result<Vec<_>>>()?;
        let data = self.data.take(&idx_chunked(rows))?;
        Self::new(shapes, data, self.crs.clone())
    }

    /// First `n` rows of the attribute table.
    pub fn head(&self, n: usize) -> DataFrame { self.data.head(Some(n)) }

    /// Reproject all geometries to `target`, returning a new collection.
    pub fn reproject(&self, target: &Crs) -> Result<Self> {
        let Some(source) = self.crs.as_ref() else {
            return Err(Error::Projection(format!("cannot reproject to {target}: collection has no CRS")));
        };
        if source == target { return Ok(self.clone()) }

        debug!("[reproject] {} features {source} -> {target}", self.len());
        let shapes = reproject_shapes(self.shapes(), source, target)?;
        Self::new(shapes, self.data.clone(), Some(target.clone()))
    }
}

/// Polars row index array for `rows`.
pub(crate) fn idx_chunked(rows: &[usize]) -> IdxCa {
    IdxCa::from_vec("idx".into(), rows.iter().map(|&i| i as IdxSize).collect())
}

impl fmt::Debug for FeatureCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureCollection")
            .field("len", &self.len())
            .field("crs", &self.crs)
            .field("columns", &self.column_names())
            .field("bounds", &self.bounds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
        ]])
    }

    fn sample() -> FeatureCollection {
        FeatureCollection::new(
            vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 2.0)],
            df!("Name" => ["a", "b"], "Population" => [Some(10.0), None]).unwrap(),
            Some(Crs::Epsg(2157)),
        ).unwrap()
    }

    #[test]
    fn height_must_match_geometry_count() {
        let data = df!("Name" => ["a"]).unwrap();
        assert!(FeatureCollection::new(vec![square(0.0, 0.0, 1.0), square(2.0, 0.0, 1.0)], data, None).is_err());
        assert!(FeatureCollection::new(vec![square(0.0, 0.0, 1.0)], DataFrame::empty(), None).is_ok());
    }

    #[test]
    fn values_and_sums() {
        let fc = sample();
        assert_eq!(fc.value(0, "Name").unwrap(), Value::Text("a".into()));
        assert!(fc.value(1, "Population").unwrap().is_null());
        assert_eq!(fc.sum("Population").unwrap(), 10.0);
        assert!((fc.total_area() - 5.0).abs() < 1e-12);
        assert!(matches!(fc.value(0, "Nope"), Err(Error::MissingAttribute(_))));
    }

    #[test]
    fn take_repeats_and_reorders_rows() {
        let fc = sample().take(&[1, 0, 1]).unwrap();
        assert_eq!(fc.len(), 3);
        assert_eq!(fc.value(0, "Name").unwrap(), Value::Text("b".into()));
        assert_eq!(fc.value(1, "Name").unwrap(), Value::Text("a".into()));
        assert!(sample().take(&[5]).is_err());
    }

    #[test]
    fn reproject_without_crs_fails() {
        let fc = FeatureCollection::new(vec![square(0.0, 0.0, 1.0)], DataFrame::empty(), None).unwrap();
        assert!(matches!(fc.reproject(&Crs::WGS84), Err(Error::Projection(_))));
    }

    #[test]
    fn reproject_to_same_crs_is_identity() {
        let fc = sample();
        let same = fc.reproject(&Crs::Epsg(2157)).unwrap();
        assert_eq!(same.shapes(), fc.shapes());
    }
}
