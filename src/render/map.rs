use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use geo::{Coord, Rect};
use polars::prelude::DataType;
use tracing::info;

use crate::{
    collection::FeatureCollection,
    config::MapConfig,
    error::Error,
    io::svg::{
        draw_polygons, draw_polygons_with_fill, write_svg_footer, write_svg_header,
        write_svg_styles, Rgb, SvgStringWriter, SvgWriter,
    },
};

use super::{
    colorbar::draw_colorbar, gridlines::draw_gridlines, legend::{draw_legend, generate_handles},
    scalebar::draw_scale_bar, RenderContext,
};

const AXES_CLIP: &str = "axes-clip";

/// The collections drawn on a choropleth map, bottom to top.
#[derive(Debug, Clone, Copy)]
pub struct MapLayers<'a> {
    /// Polygons filled by `value_key`.
    pub units: &'a FeatureCollection,
    /// Outlined on top of the units.
    pub regions: Option<&'a FeatureCollection>,
    /// Backdrop; also fixes the map extent when given.
    pub outline: Option<&'a FeatureCollection>,
    pub value_key: &'a str,
}

impl MapLayers<'_> {
    fn check_crs(&self) -> Result<()> {
        for other in [self.regions, self.outline].into_iter().flatten() {
            if !self.units.same_crs(other) {
                return Err(Error::crs_mismatch(self.units.crs(), other.crs()).into());
            }
        }
        Ok(())
    }

    /// Bounds of the outline (or the units), grown by `margin` on every side.
    fn extent(&self, margin: f64) -> Result<Rect<f64>> {
        let bounds = self.outline.unwrap_or(self.units).bounds()
            .context("[render] nothing to draw: layers have no geometry")?;
        Ok(Rect::new(
            Coord { x: bounds.min().x - margin, y: bounds.min().y - margin },
            Coord { x: bounds.max().x + margin, y: bounds.max().y + margin },
        ))
    }

    /// CSS fill per unit; null values are grey.
    fn fills(&self, cfg: &MapConfig) -> Result<Vec<String>> {
        let values = self.units.column(self.value_key)?.cast(&DataType::Float64)?;
        let fills = values.f64()?.into_iter()
            .map(|value| match value {
                Some(v) if v.is_finite() => cfg.colormap.map(v, cfg.vmin, cfg.vmax),
                _ => Rgb::GRAY,
            }.to_string())
            .collect();
        Ok(fills)
    }
}

fn draw_map<W: Write>(ctx: &mut RenderContext<W>, layers: &MapLayers, cfg: &MapConfig) -> Result<()> {
    let layout = *ctx.layout();
    let proj = ctx.projection();
    let project = move |c: &Coord<f64>| proj.apply(c);

    let (dpi, extent, line_width) = (ctx.dpi(), *ctx.extent(), ctx.points(cfg.line_width));

    write_svg_header(&mut ctx.writer, layout.width, layout.height, dpi, &extent)?;
    write_svg_styles(&mut ctx.writer, line_width, &cfg.font, cfg.outline_edge, cfg.region_edge)?;

    let axes = layout.axes;
    writeln!(ctx.writer, r#"<defs><clipPath id="{AXES_CLIP}"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/></clipPath></defs>"#,
        axes.min().x, axes.min().y, axes.width(), axes.height())?;

    writeln!(ctx.writer, r#"<g clip-path="url(#{AXES_CLIP})">"#)?;
    if let Some(outline) = layers.outline {
        draw_polygons(&mut ctx.writer, outline.shapes(), "outline", &project)?;
    }
    draw_polygons_with_fill(&mut ctx.writer, layers.units.shapes(), &layers.fills(cfg)?, "unit", &project)?;
    if let Some(regions) = layers.regions {
        draw_polygons(&mut ctx.writer, regions.shapes(), "region", &project)?;
    }
    writeln!(ctx.writer, "</g>")?;

    if cfg.gridlines.enabled {
        draw_gridlines(ctx, &cfg.gridlines, AXES_CLIP)?;
    }
    writeln!(ctx.writer, r#"<rect class="frame" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/>"#,
        axes.min().x, axes.min().y, axes.width(), axes.height())?;

    if cfg.scale_bar.enabled {
        draw_scale_bar(ctx, &cfg.scale_bar)?;
    }
    if cfg.legend.enabled && layers.regions.is_some() {
        let labels = ["County Boundaries"];
        let entries = generate_handles(&labels, &[None], cfg.region_edge, 1.0).into_iter()
            .zip(labels.iter().map(|label| label.to_string()))
            .collect::<Vec<_>>();
        draw_legend(ctx, &entries, &cfg.legend)?;
    }
    draw_colorbar(ctx, cfg)?;

    write_svg_footer(&mut ctx.writer)?;
    Ok(())
}

fn render_to<W: Write>(writer: W, layers: &MapLayers, cfg: &MapConfig) -> Result<W> {
    layers.check_crs()?;
    let extent = layers.extent(cfg.margin)?;
    let mut ctx = RenderContext::new(writer, extent, layers.units.crs().cloned(), cfg)?;
    draw_map(&mut ctx, layers, cfg)?;
    let mut writer = ctx.into_writer();
    writer.flush()?;
    Ok(writer)
}

/// Render the map to an SVG file at `path`.
pub fn render_map(layers: &MapLayers, cfg: &MapConfig, path: &Path) -> Result<()> {
    info!("[render] {} units -> {}", layers.units.len(), path.display());
    render_to(SvgWriter::new(path)?, layers, cfg)
        .with_context(|| format!("[render] failed to render {}", path.display()))?;
    Ok(())
}

/// Render the map to an SVG string.
pub fn render_map_to_string(layers: &MapLayers, cfg: &MapConfig) -> Result<String> {
    render_to(SvgStringWriter::new(), layers, cfg)?.into_string()
}
