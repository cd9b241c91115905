use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile as shp;

/// Get the signed area of a closed ring (negative for clockwise).
fn signed_area(pts: &[Coord<f64>]) -> f64 {
    pts.windows(2)
        .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
        .sum::<f64>() / 2.0
}

/// Ensure first and last are the same for closed rings.
fn ensure_closed(coords: &mut Vec<Coord<f64>>) {
    if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
        if first != last { coords.push(first) }
    }
}

/// Convert shapefile::Polygon to geo::MultiPolygon<f64>.
/// Shapefile stores each outer ring followed by its holes.
pub(crate) fn shp_to_geo(p: &shp::Polygon) -> MultiPolygon<f64> {
    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes: Vec<LineString<f64>> = Vec::new();

    for ring in p.rings() {
        let mut coords = ring.points().iter()
            .map(|pt| Coord { x: pt.x, y: pt.y })
            .collect::<Vec<_>>();
        ensure_closed(&mut coords);

        match ring {
            shp::PolygonRing::Outer(_) => {
                if let Some(ext) = exterior.take() {
                    polys.push(Polygon::new(ext, std::mem::take(&mut holes)));
                }
                exterior = Some(LineString(coords));
            }
            shp::PolygonRing::Inner(_) => holes.push(LineString(coords)),
        }
    }
    if let Some(ext) = exterior {
        polys.push(Polygon::new(ext, holes));
    }

    MultiPolygon(polys)
}

/// Convert geo::MultiPolygon<f64> to shapefile::Polygon.
/// Exteriors are written clockwise and holes counter-clockwise (Shapefile convention).
pub(crate) fn geo_to_shp(mp: &MultiPolygon<f64>) -> shp::Polygon {
    fn oriented_ring(ring: &LineString<f64>, clockwise: bool) -> Vec<shp::Point> {
        let mut coords = ring.0.clone();
        ensure_closed(&mut coords);
        if (signed_area(&coords) < 0.0) != clockwise {
            coords.reverse();
        }
        coords.into_iter().map(|c| shp::Point { x: c.x, y: c.y }).collect()
    }

    let mut rings: Vec<shp::PolygonRing<shp::Point>> = Vec::new();
    for poly in &mp.0 {
        rings.push(shp::PolygonRing::Outer(oriented_ring(poly.exterior(), true)));
        for hole in poly.interiors() {
            rings.push(shp::PolygonRing::Inner(oriented_ring(hole, false)));
        }
    }

    shp::Polygon::with_rings(rings)
}
