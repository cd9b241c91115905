use geo::{BooleanOps, BoundingRect, Coord, MultiPolygon, Rect};
use rstar::{RTree, AABB};

use crate::geom::BoundingBox;

/// Geometries holds the polygons of one collection, indexed by an R-tree of bounding boxes.
#[derive(Debug, Clone)]
pub(crate) struct Geometries {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
}

impl Geometries {
    /// Construct a Geometries object from a vector of MultiPolygons.
    /// Empty shapes are kept in `shapes` but never appear in the R-tree.
    pub(crate) fn new(shapes: Vec<MultiPolygon<f64>>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(i, shape)| shape.bounding_rect().map(|rect| BoundingBox::new(i, rect)))
                    .collect()
            ),
            shapes,
        }
    }

    /// Get the number of MultiPolygons.
    #[inline] pub(crate) fn len(&self) -> usize { self.shapes.len() }

    /// Get a reference to the list of MultiPolygons.
    #[inline] pub(crate) fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Get the MultiPolygon at row `i`.
    #[inline] pub(crate) fn get(&self, i: usize) -> Option<&MultiPolygon<f64>> { self.shapes.get(i) }

    /// Take ownership of the MultiPolygons, dropping the index.
    #[inline] pub(crate) fn into_shapes(self) -> Vec<MultiPolygon<f64>> { self.shapes }

    /// Rows whose bounding box intersects `rect`, in ascending row order.
    pub(crate) fn candidates(&self, rect: &Rect<f64>) -> Vec<usize> {
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());
        let mut rows = self.rtree.locate_in_envelope_intersecting(&envelope)
            .map(|bbox| bbox.row())
            .collect::<Vec<_>>();
        rows.sort_unstable();
        rows
    }

    /// Compute the bounding rectangle of all MultiPolygons.
    pub(crate) fn bounds(&self) -> Option<Rect<f64>> {
        self.shapes.iter()
            .filter_map(|polygon| polygon.bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                }
            ))
    }

    /// Compute the union of the MultiPolygons at the given rows.
    /// This may be slow for large numbers of complex polygons.
    pub(crate) fn union_of(&self, rows: &[usize]) -> MultiPolygon<f64> {
        rows.iter()
            .filter_map(|&i| self.shapes.get(i))
            .cloned()
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| MultiPolygon(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, Area};

    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
        ]])
    }

    #[test]
    fn candidates_come_from_bounding_boxes() {
        let geoms = Geometries::new(vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0), square(0.5, 0.5, 1.0)]);
        let rect = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        assert_eq!(geoms.candidates(&rect), vec![0, 2]);
    }

    #[test]
    fn empty_shapes_are_not_indexed() {
        let geoms = Geometries::new(vec![MultiPolygon(Vec::new()), square(0.0, 0.0, 1.0)]);
        assert_eq!(geoms.len(), 2);
        let rect = Rect::new(Coord { x: -10.0, y: -10.0 }, Coord { x: 10.0, y: 10.0 });
        assert_eq!(geoms.candidates(&rect), vec![1]);
    }

    #[test]
    fn bounds_and_union() {
        let geoms = Geometries::new(vec![square(0.0, 0.0, 10.0), square(10.0, 0.0, 10.0)]);
        let bounds = geoms.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), Coord { x: 20.0, y: 10.0 });
        assert!((geoms.union_of(&[0, 1]).unsigned_area() - 200.0).abs() < 1e-9);
        assert!(geoms.union_of(&[]).0.is_empty());
    }
}
