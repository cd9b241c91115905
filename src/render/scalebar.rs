use std::io::Write;

use anyhow::Result;
use geo::{Coord, Rect};

use crate::{config::ScaleBarConfig, io::svg::Rgb};

use super::RenderContext;

/// Line widths, in points.
const OUTER_WIDTH: f64 = 9.0;
const INNER_WIDTH: f64 = 6.0;

/// Label baseline below the bar, as a fraction of the bar length.
const LABEL_OFFSET: f64 = 0.225;

/// One filled segment of the bar, in map units.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSegment {
    pub x0: f64,
    pub x1: f64,
    pub color: Rgb,
}

/// Scale bar geometry in map units. The bar extends leftwards from its anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleBar {
    pub y: f64,
    pub left: f64,
    pub right: f64,
    pub segments: Vec<BarSegment>,
    /// Tick position and label, from the left end.
    pub ticks: Vec<(f64, String)>,
    pub label_y: f64,
}

/// Format a distance in map units (metres) as kilometres.
fn format_km(distance: f64) -> String {
    format!("{} km", distance / 1000.0)
}

/// Lay out the scale bar inside `extent`.
pub fn scale_bar(extent: &Rect<f64>, cfg: &ScaleBarConfig) -> ScaleBar {
    let right = extent.min().x + extent.width() * cfg.location.0;
    let y = extent.min().y + extent.height() * cfg.location.1;
    let n = cfg.segments.max(1);
    let step = cfg.length / n as f64;

    let segments = (0..n)
        .map(|k| BarSegment {
            x0: right - k as f64 * step,
            x1: right - (k + 1) as f64 * step,
            color: if k % 2 == 0 { Rgb::BLACK } else { Rgb::WHITE },
        })
        .collect();
    let ticks = (0..=n)
        .map(|i| (right - cfg.length + i as f64 * step, format_km(i as f64 * step)))
        .collect();

    ScaleBar { y, left: right - cfg.length, right, segments, ticks, label_y: y - LABEL_OFFSET * cfg.length }
}

pub(crate) fn draw_scale_bar<W: Write>(ctx: &mut RenderContext<W>, cfg: &ScaleBarConfig) -> Result<()> {
    let bar = scale_bar(ctx.extent(), cfg);
    let proj = ctx.projection();
    let (outer, inner, font) = (ctx.points(OUTER_WIDTH), ctx.points(INNER_WIDTH), ctx.points(cfg.font_size));

    let at = |x: f64, y: f64| proj.apply(&Coord { x, y });
    let (x0, y) = at(bar.left, bar.y);
    let (x1, _) = at(bar.right, bar.y);

    writeln!(ctx.writer, r#"<g class="scale-bar">"#)?;
    writeln!(ctx.writer, r#"<line x1="{x0:.2}" y1="{y:.2}" x2="{x1:.2}" y2="{y:.2}" stroke="{}" stroke-width="{outer:.2}"/>"#, Rgb::BLACK)?;
    for segment in &bar.segments {
        let (sx0, _) = at(segment.x0, bar.y);
        let (sx1, _) = at(segment.x1, bar.y);
        writeln!(ctx.writer, r#"<line x1="{sx0:.2}" y1="{y:.2}" x2="{sx1:.2}" y2="{y:.2}" stroke="{}" stroke-width="{inner:.2}"/>"#, segment.color)?;
    }
    for (x, label) in &bar.ticks {
        let (tx, ty) = at(*x, bar.label_y);
        writeln!(ctx.writer, r#"<text x="{tx:.2}" y="{ty:.2}" font-size="{font:.1}" text-anchor="middle">{label}</text>"#)?;
    }
    writeln!(ctx.writer, "</g>")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent() -> Rect<f64> {
        Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 100000.0, y: 100000.0 })
    }

    #[test]
    fn default_bar_has_black_then_white_halves() {
        let bar = scale_bar(&extent(), &ScaleBarConfig::default());
        assert_eq!((bar.right, bar.y), (92000.0, 95000.0));
        assert_eq!(bar.left, 72000.0);
        assert_eq!(bar.segments, vec![
            BarSegment { x0: 92000.0, x1: 82000.0, color: Rgb::BLACK },
            BarSegment { x0: 82000.0, x1: 72000.0, color: Rgb::WHITE },
        ]);
        assert_eq!(bar.label_y, 90500.0);
    }

    #[test]
    fn ticks_count_up_from_left_end() {
        let bar = scale_bar(&extent(), &ScaleBarConfig::default());
        let labels = bar.ticks.iter().map(|(_, l)| l.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["0 km", "10 km", "20 km"]);
        assert_eq!(bar.ticks[0].0, 72000.0);
        assert_eq!(bar.ticks[2].0, 92000.0);
    }

    #[test]
    fn segments_alternate() {
        let cfg = ScaleBarConfig { length: 5000.0, segments: 4, ..Default::default() };
        let bar = scale_bar(&extent(), &cfg);
        let colors = bar.segments.iter().map(|s| s.color).collect::<Vec<_>>();
        assert_eq!(colors, vec![Rgb::BLACK, Rgb::WHITE, Rgb::BLACK, Rgb::WHITE]);
        assert_eq!(bar.ticks[1].1, "1.25 km");
    }
}
