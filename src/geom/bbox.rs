use geo::Rect;
use rstar::{RTreeObject, AABB};

/// R-tree entry: the envelope of one feature, keyed by its row in the collection.
#[derive(Debug, Clone)]
pub(super) struct BoundingBox {
    row: usize,
    rect: Rect<f64>,
}

impl BoundingBox {
    pub(super) fn new(row: usize, rect: Rect<f64>) -> Self {
        Self { row, rect }
    }

    /// Row of the feature this envelope covers; also its index in `Geometries::shapes`.
    pub(super) fn row(&self) -> usize { self.row }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let (min, max) = (self.rect.min(), self.rect.max());
        AABB::from_corners([min.x, min.y], [max.x, max.y])
    }
}
