use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj, transform::transform};

use crate::{crs::Crs, error::{Error, Result}};

/// Point transformer between two CRSs; geographic ends take and return degrees.
pub(crate) struct Transformer {
    from: Proj,
    to: Proj,
    from_geographic: bool,
    to_geographic: bool,
}

impl Transformer {
    pub(crate) fn new(from: &Crs, to: &Crs) -> Result<Self> {
        Ok(Self {
            from: from.to_proj()?,
            to: to.to_proj()?,
            from_geographic: from.is_geographic()?,
            to_geographic: to.is_geographic()?,
        })
    }

    /// Transform one coordinate.
    pub(crate) fn coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let mut point = if self.from_geographic {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };
        transform(&self.from, &self.to, &mut point)
            .map_err(|e| Error::Projection(format!("CRS transform failed at ({}, {}): {e}", coord.x, coord.y)))?;

        Ok(if self.to_geographic {
            Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
        } else {
            Coord { x: point.0, y: point.1 }
        })
    }
}

/// Reproject shapes from one CRS to another.
pub(crate) fn reproject_shapes(shapes: &[MultiPolygon<f64>], from: &Crs, to: &Crs) -> Result<Vec<MultiPolygon<f64>>> {
    let transformer = Transformer::new(from, to)?;
    let transformer = &transformer;

    shapes.iter()
        .map(|shape| shape.try_map_coords(|coord| transformer.coord(coord)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn itm_false_origin_maps_to_natural_origin() {
        // ITM natural origin is 53.5N 8W, false easting/northing 600000/750000.
        let t = Transformer::new(&Crs::WGS84, &Crs::Epsg(2157)).unwrap();
        let c = t.coord(Coord { x: -8.0, y: 53.5 }).unwrap();
        assert!((c.x - 600000.0).abs() < 1.0, "x = {}", c.x);
        assert!((c.y - 750000.0).abs() < 1.0, "y = {}", c.y);
    }

    #[test]
    fn geographic_round_trip() {
        let there = Transformer::new(&Crs::WGS84, &Crs::Epsg(32629)).unwrap();
        let back = Transformer::new(&Crs::Epsg(32629), &Crs::WGS84).unwrap();
        let start = Coord { x: -6.5, y: 54.6 };
        let end = back.coord(there.coord(start).unwrap()).unwrap();
        assert!((end.x - start.x).abs() < 1e-7);
        assert!((end.y - start.y).abs() < 1e-7);
    }

    #[test]
    fn unsupported_crs_is_a_projection_error() {
        assert!(matches!(Transformer::new(&Crs::Epsg(1), &Crs::WGS84), Err(Error::Projection(_))));
    }
}
