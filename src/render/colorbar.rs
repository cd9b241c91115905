use std::io::Write;

use anyhow::Result;

use crate::{config::MapConfig, io::svg::escape};

use super::RenderContext;

/// Gradient stops used to approximate the colormap.
const STOPS: usize = 16;

/// Largest power of ten not above `raw`, times 1, 2, 2.5, 5 or 10.
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = match raw / magnitude {
        n if n <= 1.0 => 1.0,
        n if n <= 2.0 => 2.0,
        n if n <= 2.5 => 2.5,
        n if n <= 5.0 => 5.0,
        _ => 10.0,
    };
    step * magnitude
}

/// Decimal places needed to print multiples of `step` exactly.
fn decimals(step: f64) -> usize {
    (0..=12)
        .find(|&d| {
            let scaled = step * 10f64.powi(d as i32);
            (scaled - scaled.round()).abs() < 1e-6 * scaled.max(1.0)
        })
        .unwrap_or(12)
}

/// Evenly spaced "nice" tick values within `[vmin, vmax]`, at most about `max_ticks`.
/// Values are rounded to the precision of the step.
pub fn ticks(vmin: f64, vmax: f64, max_ticks: usize) -> Vec<f64> {
    let span = vmax - vmin;
    if !(span > 0.0) || max_ticks == 0 { return vec![vmin] }

    let step = nice_step(span / max_ticks as f64);
    let scale = 10f64.powi(decimals(step) as i32);
    let eps = step * 1e-9;
    let first = (vmin / step - 1e-9).ceil() * step;
    (0..)
        .map(|i| ((first + i as f64 * step) * scale).round() / scale)
        .take_while(|&v| v <= vmax + eps)
        .collect()
}

/// Tick values with labels printed at the step's precision.
fn tick_labels(vmin: f64, vmax: f64, max_ticks: usize) -> Vec<(f64, String)> {
    let values = ticks(vmin, vmax, max_ticks);
    let places = match values.as_slice() {
        [a, b, ..] => decimals(b - a),
        [v] => decimals(v.abs()),
        [] => 0,
    };
    values.into_iter().map(|v| (v, format!("{v:.places$}"))).collect()
}

pub(crate) fn draw_colorbar<W: Write>(ctx: &mut RenderContext<W>, cfg: &MapConfig) -> Result<()> {
    let bar = ctx.layout().colorbar;
    let font = ctx.points(10.0);
    let tick_len = 0.3 * font;
    let (x, y, w, h) = (bar.min().x, bar.min().y, bar.width(), bar.height());

    writeln!(ctx.writer, r#"<defs><linearGradient id="colorbar-gradient" x1="0" y1="1" x2="0" y2="0">"#)?;
    for i in 0..=STOPS {
        let t = i as f64 / STOPS as f64;
        writeln!(ctx.writer, r#"<stop offset="{t:.4}" stop-color="{}"/>"#, cfg.colormap.at(t))?;
    }
    writeln!(ctx.writer, "</linearGradient></defs>")?;

    writeln!(ctx.writer, r#"<g class="colorbar" font-size="{font:.1}">"#)?;
    writeln!(ctx.writer, r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="url(#colorbar-gradient)"/>"#)?;
    writeln!(ctx.writer, r#"<rect class="frame" x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}"/>"#)?;

    for (value, label) in tick_labels(cfg.vmin, cfg.vmax, 8) {
        let ty = y + h - (value - cfg.vmin) / (cfg.vmax - cfg.vmin) * h;
        writeln!(ctx.writer, r##"<line x1="{:.2}" y1="{ty:.2}" x2="{:.2}" y2="{ty:.2}" stroke="#000000"/>"##, x + w, x + w + tick_len)?;
        writeln!(ctx.writer, r#"<text x="{:.2}" y="{:.2}">{label}</text>"#, x + w + 2.0 * tick_len, ty + font / 3.0)?;
    }

    let (lx, ly) = (x + w + 5.0 * font, y + h / 2.0);
    writeln!(ctx.writer, r#"<text x="{lx:.2}" y="{ly:.2}" text-anchor="middle" transform="rotate(-90 {lx:.2} {ly:.2})">{}</text>"#,
        escape(&cfg.colorbar_label))?;
    writeln!(ctx.writer, "</g>")?;
    Ok(())
}
