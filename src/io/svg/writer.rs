//! SVG writing operations.

use std::{fs::File, io::{BufWriter, Write}, path::Path};

use anyhow::{Context, Result};

use super::Rgb;

pub(crate) struct SvgWriter {
    writer: BufWriter<File>
}

/// String-based SVG writer, for tests and in-memory rendering
pub(crate) struct SvgStringWriter {
    buffer: Vec<u8>
}

/// Implement std::io::Write so `write!` / `writeln!` work.
impl Write for SvgWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> { self.writer.write(buf) }

    fn flush(&mut self) -> std::io::Result<()> { self.writer.flush() }

    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> { self.writer.write_all(buf) }
}

impl Write for SvgStringWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        std::io::Result::Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> { std::io::Result::Ok(()) }

    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.buffer.extend_from_slice(buf);
        std::io::Result::Ok(())
    }
}

impl SvgStringWriter {
    /// Create a new string-based SVG writer
    pub(crate) fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Get the SVG string
    pub(crate) fn into_string(self) -> Result<String> {
        String::from_utf8(self.buffer)
            .context("[io::svg] SVG output is not valid UTF-8")
    }
}

impl SvgWriter {
    /// Create a new SVG writer to a file path
    pub(crate) fn new(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("[io::svg] Failed to create {}", path.display()))?;

        Ok(Self { writer: BufWriter::new(file) })
    }
}

/// Write the SVG header: physical size in inches, a pixel viewBox at `dpi`,
/// and the map extent as data attributes.
pub(crate) fn write_svg_header<W: Write>(writer: &mut W, width: f64, height: f64, dpi: f64, bounds: &geo::Rect) -> Result<()> {
    writeln!(writer, r##"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"##)?;
    writeln!(writer, r##"<svg xmlns="http://www.w3.org/2000/svg"
        width="{width_in:.3}in" height="{height_in:.3}in"
        viewBox="0 0 {width:.0} {height:.0}"
        data-x-min="{x_min}" data-x-max="{x_max}"
        data-y-min="{y_min}" data-y-max="{y_max}"
        data-dpi="{dpi}">"##,
        width_in = width / dpi,
        height_in = height / dpi,
        x_min = bounds.min().x,
        x_max = bounds.max().x,
        y_min = bounds.min().y,
        y_max = bounds.max().y,
    )?;
    writeln!(writer, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##)?;
    Ok(())
}

/// Write SVG styles for map features; stroke widths are in pixels.
pub(crate) fn write_svg_styles<W: Write>(writer: &mut W, line_width: f64, font: &str, outline_edge: Rgb, region_edge: Rgb) -> Result<()> {
    writeln!(writer, r##"<defs>
<style>
    .outline {{ fill: #ffffff; stroke: {outline_edge}; stroke-width: {line_width:.2}; }}
    .unit {{ stroke: none; }}
    .region {{ fill: none; stroke: {region_edge}; stroke-width: {line_width:.2}; }}
    .grid {{ fill: none; stroke: #808080; stroke-opacity: 0.5; stroke-width: {grid_width:.2}; stroke-dasharray: {dash:.1},{dash:.1}; }}
    .frame {{ fill: none; stroke: #000000; stroke-width: {line_width:.2}; }}
    text {{ font-family: {font}; fill: #000000; }}
</style>
</defs>"##,
        grid_width = line_width * 0.75,
        dash = line_width * 4.0,
    )?;
    Ok(())
}

/// Write SVG footer to any writer (standalone function).
pub(crate) fn write_svg_footer<W: Write>(writer: &mut W) -> Result<()> {
    writeln!(writer, "</svg>")?;
    Ok(())
}
