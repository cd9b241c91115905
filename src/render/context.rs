use std::io::Write;

use anyhow::{ensure, Result};
use geo::{Coord, Rect};

use crate::{config::MapConfig, crs::Crs};

/// Pixel layout of the figure: the map axes and the colorbar beside them.
/// Pixel rectangles have y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    pub axes: Rect<f64>,
    pub colorbar: Rect<f64>,
    /// Pixels per map unit.
    pub scale: f64,
}

impl Layout {
    /// Fit `extent` into the configured figure, keeping its aspect ratio, then
    /// shrink the figure to its content.
    pub fn new(extent: &Rect<f64>, cfg: &MapConfig) -> Result<Self> {
        ensure!(extent.width() > 0.0 && extent.height() > 0.0,
            "[render] map extent is empty: {:?}", extent);

        let dpi = cfg.dpi;
        let margin = 0.5 * dpi;
        let pad = 0.1 * dpi;
        let tick_labels = cfg.gridlines.font_size * dpi / 72.0 * 4.0;
        let grid_right = if cfg.gridlines.enabled && cfg.gridlines.labels.right { tick_labels } else { 0.0 };
        let colorbar_labels = 1.0 * dpi;

        // axes + pad + 5% colorbar; the colorbar keeps its tick labels and title room
        let avail_w = cfg.figsize.0 * dpi - 2.0 * margin - grid_right - pad - colorbar_labels;
        let avail_h = cfg.figsize.1 * dpi - 2.0 * margin;
        ensure!(avail_w > 0.0 && avail_h > 0.0, "[render] figure too small: {:?} in", cfg.figsize);

        let scale = (avail_w / 1.05 / extent.width()).min(avail_h / extent.height());
        let axes = Rect::new(
            Coord { x: margin, y: margin },
            Coord { x: margin + extent.width() * scale, y: margin + extent.height() * scale },
        );
        let colorbar_x = axes.max().x + grid_right + pad;
        let colorbar = Rect::new(
            Coord { x: colorbar_x, y: axes.min().y },
            Coord { x: colorbar_x + 0.05 * axes.width(), y: axes.max().y },
        );

        Ok(Self {
            width: colorbar.max().x + colorbar_labels + margin,
            height: axes.max().y + margin,
            axes,
            colorbar,
            scale,
        })
    }
}

/// Affine map from map coordinates to figure pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelProjection {
    origin: Coord<f64>,
    offset: Coord<f64>,
    scale: f64,
}

impl PixelProjection {
    #[inline]
    pub fn apply(&self, c: &Coord<f64>) -> (f64, f64) {
        (
            self.offset.x + (c.x - self.origin.x) * self.scale,
            self.offset.y + (self.origin.y - c.y) * self.scale,
        )
    }
}

/// Everything a layer needs to draw itself: the output writer, the map extent,
/// its CRS and the pixel layout. Passed explicitly to each drawing step.
pub struct RenderContext<W: Write> {
    pub(crate) writer: W,
    extent: Rect<f64>,
    crs: Option<Crs>,
    layout: Layout,
    dpi: f64,
}

impl<W: Write> RenderContext<W> {
    pub fn new(writer: W, extent: Rect<f64>, crs: Option<Crs>, cfg: &MapConfig) -> Result<Self> {
        Ok(Self { writer, layout: Layout::new(&extent, cfg)?, extent, crs, dpi: cfg.dpi })
    }

    #[inline] pub fn extent(&self) -> &Rect<f64> { &self.extent }

    #[inline] pub fn crs(&self) -> Option<&Crs> { self.crs.as_ref() }

    #[inline] pub fn layout(&self) -> &Layout { &self.layout }

    #[inline] pub fn dpi(&self) -> f64 { self.dpi }

    /// Convert typographic points to pixels.
    #[inline] pub fn points(&self, pt: f64) -> f64 { pt * self.dpi / 72.0 }

    pub fn projection(&self) -> PixelProjection {
        PixelProjection {
            origin: Coord { x: self.extent.min().x, y: self.extent.max().y },
            offset: self.layout.axes.min(),
            scale: self.layout.scale,
        }
    }

    #[inline] pub fn into_writer(self) -> W { self.writer }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(w: f64, h: f64) -> Rect<f64> {
        Rect::new(Coord { x: 100.0, y: 200.0 }, Coord { x: 100.0 + w, y: 200.0 + h })
    }

    #[test]
    fn layout_keeps_aspect_ratio_and_fits_figure() {
        let cfg = MapConfig::default();
        let layout = Layout::new(&extent(2000.0, 1000.0), &cfg).unwrap();
        let ratio = layout.axes.width() / layout.axes.height();
        assert!((ratio - 2.0).abs() < 1e-9);
        assert!(layout.width <= cfg.figsize.0 * cfg.dpi + 1e-6);
        assert!(layout.height <= cfg.figsize.1 * cfg.dpi + 1e-6);
        assert!(layout.colorbar.min().x > layout.axes.max().x);
        assert!((layout.colorbar.width() - 0.05 * layout.axes.width()).abs() < 1e-9);
    }

    #[test]
    fn empty_extent_is_rejected() {
        assert!(Layout::new(&extent(0.0, 10.0), &MapConfig::default()).is_err());
    }

    #[test]
    fn projection_maps_extent_corners_to_axes_corners() {
        let cfg = MapConfig::default();
        let ctx = RenderContext::new(Vec::<u8>::new(), extent(1000.0, 1000.0), None, &cfg).unwrap();
        let proj = ctx.projection();
        let axes = ctx.layout().axes;
        assert_eq!(proj.apply(&Coord { x: 100.0, y: 1200.0 }), (axes.min().x, axes.min().y));
        let (x, y) = proj.apply(&Coord { x: 1100.0, y: 200.0 });
        assert!((x - axes.max().x).abs() < 1e-9 && (y - axes.max().y).abs() < 1e-9);
        assert_eq!(ctx.points(72.0), 300.0);
    }
}
