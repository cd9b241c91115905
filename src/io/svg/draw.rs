//! Path building and drawing helpers shared by the map layers.

use std::io::Write;

use anyhow::{ensure, Result};
use geo::{Coord, CoordsIter, LineString, MultiPolygon};

/// Projection function: map coordinates -> SVG coords (x,y)
pub(crate) type Projection = dyn Fn(&Coord<f64>) -> (f64, f64);

/// Escape text for SVG character data and attribute values.
pub(crate) fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Build a compact SVG path string for a MultiPolygon (exteriors + holes).
pub(crate) fn multipolygon_to_path(shape: &MultiPolygon<f64>, project: &Projection) -> String {
    let mut out = String::new();

    for polygon in &shape.0 {
        out.push_str(&ring_to_path(polygon.exterior(), project));
        for interior in polygon.interiors() {
            out.push_str(&ring_to_path(interior, project));
        }
    }

    out
}

/// Build a compact SVG path string for a LineString (ring).
fn ring_to_path(ring: &LineString<f64>, project: &Projection) -> String {
    let mut out = String::new();

    let mut coords = ring.coords_iter()
        .map(|coord| project(&coord));
    if let Some((x, y)) = coords.next() {
        out.push_str(&format!(" M{x:.2},{y:.2}"));
        for (x, y) in coords {
            out.push_str(&format!(" L{x:.2},{y:.2}"));
        }
        out.push('Z');
    }

    out
}

/// Build an open SVG path string from projected points.
pub(crate) fn polyline_to_path(points: &[(f64, f64)]) -> String {
    let mut out = String::new();
    for (i, &(x, y)) in points.iter().enumerate() {
        out.push_str(&format!("{}{x:.2},{y:.2}", if i == 0 { "M" } else { " L" }));
    }
    out
}

/// Draw polygons with a shared class.
pub(crate) fn draw_polygons(writer: &mut impl Write, polygons: &[MultiPolygon<f64>], class: &str, project: &Projection) -> Result<()> {
    for polygon in polygons.iter().filter(|polygon| !polygon.0.is_empty()) {
        writeln!(writer, r#"<path class="{class}" d="{}"/>"#, multipolygon_to_path(polygon, project))?;
    }
    Ok(())
}

/// Draw polygons with per-polygon fill colors; holes use the even-odd rule.
pub(crate) fn draw_polygons_with_fill(writer: &mut impl Write, polygons: &[MultiPolygon<f64>], fills: &[String], class: &str, project: &Projection) -> Result<()> {
    ensure!(fills.len() == polygons.len(),
        "[io::svg] length mismatch: {} fills for {} geometries", fills.len(), polygons.len());

    for (polygon, fill) in polygons.iter().zip(fills.iter()).filter(|(polygon, _)| !polygon.0.is_empty()) {
        writeln!(writer, r#"<path class="{class}" fill-rule="evenodd" style="fill:{fill}" d="{}"/>"#,
            multipolygon_to_path(polygon, project))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    #[test]
    fn path_flips_y_through_projection() {
        let shape = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]]);
        let project = |c: &Coord<f64>| (c.x * 10.0, 10.0 - c.y * 10.0);
        assert_eq!(multipolygon_to_path(&shape, &project), " M0.00,10.00 L10.00,10.00 L10.00,0.00 L0.00,10.00Z");
    }

    #[test]
    fn fill_count_must_match_polygons() {
        let shapes = vec![MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]]); 2];
        let project = |c: &Coord<f64>| (c.x, c.y);
        let mut out = Vec::new();
        assert!(draw_polygons_with_fill(&mut out, &shapes, &["red".to_string()], "unit", &project).is_err());
        assert!(out.is_empty());

        let fills = vec!["red".to_string(), "blue".to_string()];
        draw_polygons_with_fill(&mut out, &shapes, &fills, "unit", &project).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().matches("fill-rule=\"evenodd\"").count(), 2);
    }

    #[test]
    fn polyline_and_escape() {
        assert_eq!(polyline_to_path(&[(0.0, 0.0), (1.5, 2.0)]), "M0.00,0.00 L1.50,2.00");
        assert_eq!(escape("A & <B>"), "A &amp; &lt;B&gt;");
    }
}
