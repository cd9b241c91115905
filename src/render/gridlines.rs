use std::io::Write;

use anyhow::Result;
use geo::{Coord, Rect};

use crate::{config::{GridlineConfig, LabelSides}, crs::Crs, geom::Transformer, io::svg::{escape, polyline_to_path}};

use super::RenderContext;

/// Samples per graticule line.
const SAMPLES: usize = 64;

/// Format a longitude label, e.g. `7.5°W`.
pub fn format_lon(lon: f64) -> String {
    if lon == 0.0 || lon.abs() == 180.0 { return format!("{}°", lon.abs()) }
    format!("{}°{}", lon.abs(), if lon < 0.0 { "W" } else { "E" })
}

/// Format a latitude label, e.g. `54.5°N`.
pub fn format_lat(lat: f64) -> String {
    if lat == 0.0 { return "0°".to_string() }
    format!("{}°{}", lat.abs(), if lat < 0.0 { "S" } else { "N" })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side { Top, Bottom, Left, Right }

/// A graticule line in map coordinates.
#[derive(Debug, Clone)]
pub(crate) struct GridLine {
    pub(crate) label: String,
    /// Meridians are labelled on top/bottom, parallels on left/right.
    pub(crate) meridian: bool,
    pub(crate) points: Vec<Coord<f64>>,
}

/// Lon/lat box covering `extent`, padded by one degree.
fn geographic_range(extent: &Rect<f64>, to_geo: &Transformer) -> crate::error::Result<Rect<f64>> {
    let mut lons = Vec::new();
    let mut lats = Vec::new();
    for i in 0..=4 {
        for j in 0..=4 {
            let c = to_geo.coord(Coord {
                x: extent.min().x + extent.width() * i as f64 / 4.0,
                y: extent.min().y + extent.height() * j as f64 / 4.0,
            })?;
            lons.push(c.x);
            lats.push(c.y);
        }
    }
    let (lon_min, lon_max) = lons.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let (lat_min, lat_max) = lats.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    Ok(Rect::new(
        Coord { x: (lon_min - 1.0).max(-180.0), y: (lat_min - 1.0).max(-89.9) },
        Coord { x: (lon_max + 1.0).min(180.0), y: (lat_max + 1.0).min(89.9) },
    ))
}

/// Project the configured meridians and parallels into the map CRS.
pub(crate) fn graticule(extent: &Rect<f64>, crs: &Crs, cfg: &GridlineConfig) -> crate::error::Result<Vec<GridLine>> {
    let to_geo = Transformer::new(crs, &Crs::WGS84)?;
    let to_map = Transformer::new(&Crs::WGS84, crs)?;
    let range = geographic_range(extent, &to_geo)?;

    let sample = |from: Coord<f64>, to: Coord<f64>| (0..=SAMPLES)
        .map(|k| {
            let t = k as f64 / SAMPLES as f64;
            to_map.coord(Coord { x: from.x + (to.x - from.x) * t, y: from.y + (to.y - from.y) * t })
        })
        .collect::<crate::error::Result<Vec<_>>>();

    let mut lines = Vec::new();
    for &lon in &cfg.xlocs {
        lines.push(GridLine {
            label: format_lon(lon),
            meridian: true,
            points: sample(Coord { x: lon, y: range.min().y }, Coord { x: lon, y: range.max().y })?,
        });
    }
    for &lat in &cfg.ylocs {
        lines.push(GridLine {
            label: format_lat(lat),
            meridian: false,
            points: sample(Coord { x: range.min().x, y: lat }, Coord { x: range.max().x, y: lat })?,
        });
    }
    Ok(lines)
}

/// First point where `points` crosses the given side of `extent`.
pub(crate) fn edge_crossing(points: &[Coord<f64>], extent: &Rect<f64>, side: Side) -> Option<Coord<f64>> {
    // (coordinate along the crossing axis, edge value, range along the edge)
    let (horizontal, edge, lo, hi) = match side {
        Side::Top => (true, extent.max().y, extent.min().x, extent.max().x),
        Side::Bottom => (true, extent.min().y, extent.min().x, extent.max().x),
        Side::Left => (false, extent.min().x, extent.min().y, extent.max().y),
        Side::Right => (false, extent.max().x, extent.min().y, extent.max().y),
    };
    points.windows(2).find_map(|w| {
        let (a, b) = (w[0], w[1]);
        let (da, db) = if horizontal { (a.y - edge, b.y - edge) } else { (a.x - edge, b.x - edge) };
        if da * db > 0.0 || da == db { return None }
        let t = da / (da - db);
        let c = Coord { x: a.x + (b.x - a.x) * t, y: a.y + (b.y - a.y) * t };
        let along = if horizontal { c.x } else { c.y };
        (lo..=hi).contains(&along).then_some(c)
    })
}

fn sides(labels: &LabelSides, meridian: bool) -> Vec<Side> {
    let mut out = Vec::new();
    if meridian {
        if labels.top { out.push(Side::Top) }
        if labels.bottom { out.push(Side::Bottom) }
    } else {
        if labels.left { out.push(Side::Left) }
        if labels.right { out.push(Side::Right) }
    }
    out
}

/// Draw gridlines clipped to the axes, then their edge labels outside the axes.
pub(crate) fn draw_gridlines<W: Write>(ctx: &mut RenderContext<W>, cfg: &GridlineConfig, clip_id: &str) -> Result<()> {
    let Some(crs) = ctx.crs().cloned() else {
        tracing::warn!("[render] no CRS, skipping gridlines");
        return Ok(());
    };
    let lines = graticule(ctx.extent(), &crs, cfg)?;
    let proj = ctx.projection();
    let axes = ctx.layout().axes;
    let font = ctx.points(cfg.font_size);
    let pad = ctx.points(3.5);

    writeln!(ctx.writer, r#"<g class="grid" clip-path="url(#{clip_id})">"#)?;
    for line in &lines {
        let points = line.points.iter().map(|c| proj.apply(c)).collect::<Vec<_>>();
        writeln!(ctx.writer, r#"<path d="{}"/>"#, polyline_to_path(&points))?;
    }
    writeln!(ctx.writer, "</g>")?;

    writeln!(ctx.writer, r#"<g class="grid-labels" font-size="{font:.1}">"#)?;
    for line in &lines {
        for side in sides(&cfg.labels, line.meridian) {
            let Some(at) = edge_crossing(&line.points, ctx.extent(), side) else { continue };
            let (x, y) = proj.apply(&at);
            let (x, y, anchor) = match side {
                Side::Top => (x, axes.min().y - pad, "middle"),
                Side::Bottom => (x, axes.max().y + pad + font, "middle"),
                Side::Left => (axes.min().x - pad, y + font / 3.0, "end"),
                Side::Right => (axes.max().x + pad, y + font / 3.0, "start"),
            };
            writeln!(ctx.writer, r#"<text x="{x:.2}" y="{y:.2}" text-anchor="{anchor}">{}</text>"#, escape(&line.label))?;
        }
    }
    writeln!(ctx.writer, "</g>")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_use_hemispheres() {
        assert_eq!(format_lon(-7.5), "7.5°W");
        assert_eq!(format_lon(-8.0), "8°W");
        assert_eq!(format_lon(3.0), "3°E");
        assert_eq!(format_lon(0.0), "0°");
        assert_eq!(format_lat(54.5), "54.5°N");
        assert_eq!(format_lat(-10.0), "10°S");
    }

    #[test]
    fn crossing_found_on_requested_side() {
        let extent = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 10.0 });
        let vertical = vec![Coord { x: 4.0, y: -5.0 }, Coord { x: 6.0, y: 15.0 }];
        let top = edge_crossing(&vertical, &extent, Side::Top).unwrap();
        assert!((top.x - 5.5).abs() < 1e-12 && (top.y - 10.0).abs() < 1e-12);
        assert!(edge_crossing(&vertical, &extent, Side::Right).is_none());

        let outside = vec![Coord { x: 20.0, y: -5.0 }, Coord { x: 20.0, y: 15.0 }];
        assert!(edge_crossing(&outside, &extent, Side::Top).is_none());
    }

    #[test]
    fn graticule_meridian_runs_north_in_itm() {
        let extent = Rect::new(Coord { x: 550000.0, y: 800000.0 }, Coord { x: 750000.0, y: 1000000.0 });
        let cfg = GridlineConfig::default();
        let lines = graticule(&extent, &Crs::Epsg(2157), &cfg).unwrap();
        assert_eq!(lines.len(), cfg.xlocs.len() + cfg.ylocs.len());

        // 8°W is the ITM central meridian: constant easting of 600000.
        let central = &lines[0];
        assert!(central.meridian);
        assert!(central.points.iter().all(|c| (c.x - 600000.0).abs() < 1.0));
        assert!(edge_crossing(&central.points, &extent, Side::Top).is_some());
    }
}
