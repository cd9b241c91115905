use std::io::Write;

use anyhow::Result;

use crate::{config::LegendConfig, io::svg::{escape, Rgb}};

use super::RenderContext;

/// A rectangular legend patch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendHandle {
    /// `None` draws an unfilled patch.
    pub fill: Option<Rgb>,
    pub edge: Rgb,
    pub alpha: f64,
}

/// One handle per label, cycling through `colors` by index.
pub fn generate_handles<S: AsRef<str>>(labels: &[S], colors: &[Option<Rgb>], edge: Rgb, alpha: f64) -> Vec<LegendHandle> {
    if colors.is_empty() { return Vec::new() }
    (0..labels.len())
        .map(|i| LegendHandle { fill: colors[i % colors.len()], edge, alpha })
        .collect()
}

/// Draw a framed legend in the upper-left corner of the axes.
pub(crate) fn draw_legend<W: Write>(ctx: &mut RenderContext<W>, entries: &[(LegendHandle, String)], cfg: &LegendConfig) -> Result<()> {
    if entries.is_empty() { return Ok(()) }

    let font = ctx.points(cfg.font_size);
    let axes = ctx.layout().axes;
    let (pad, row, patch_w, patch_h) = (0.5 * font, 1.4 * font, 2.0 * font, 0.7 * font);
    let label_w = entries.iter().map(|(_, label)| label.chars().count()).max().unwrap_or(0) as f64 * 0.6 * font;

    let x = axes.min().x + pad;
    let y = axes.min().y + pad;
    let width = pad + patch_w + pad + label_w + pad;
    let height = pad + row * entries.len() as f64 + pad;

    writeln!(ctx.writer, r#"<g class="legend" font-size="{font:.1}">"#)?;
    writeln!(ctx.writer, r##"<rect x="{x:.2}" y="{y:.2}" width="{width:.2}" height="{height:.2}" rx="{r:.2}" fill="#ffffff" fill-opacity="{alpha}" stroke="#cccccc"/>"##,
        r = 0.2 * font, alpha = cfg.frame_alpha)?;

    for (i, (handle, label)) in entries.iter().enumerate() {
        let row_top = y + pad + row * i as f64;
        let fill = handle.fill.map_or_else(|| "none".to_string(), |c| c.to_string());
        writeln!(ctx.writer, r#"<rect x="{:.2}" y="{:.2}" width="{patch_w:.2}" height="{patch_h:.2}" fill="{fill}" stroke="{}" opacity="{}" stroke-width="{:.2}"/>"#,
            x + pad, row_top + (row - patch_h) / 2.0, handle.edge, handle.alpha, ctx.points(1.0))?;
        writeln!(ctx.writer, r#"<text x="{:.2}" y="{:.2}">{}</text>"#,
            x + pad + patch_w + pad, row_top + row / 2.0 + font / 3.0, escape(label))?;
    }
    writeln!(ctx.writer, "</g>")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_cycle_over_labels() {
        let colors = [Some(Rgb::RED), None];
        let handles = generate_handles(&["a", "b", "c"], &colors, Rgb::BLACK, 0.5);
        assert_eq!(handles.len(), 3);
        assert_eq!(handles[0].fill, Some(Rgb::RED));
        assert_eq!(handles[1].fill, None);
        assert_eq!(handles[2].fill, Some(Rgb::RED));
        assert!(handles.iter().all(|h| h.edge == Rgb::BLACK && h.alpha == 0.5));
    }

    #[test]
    fn unfilled_red_county_handle() {
        let handles = generate_handles(&[""], &[None], Rgb::RED, 1.0);
        assert_eq!(handles, vec![LegendHandle { fill: None, edge: Rgb::RED, alpha: 1.0 }]);
        assert!(generate_handles(&["x"], &[], Rgb::RED, 1.0).is_empty());
    }
}
