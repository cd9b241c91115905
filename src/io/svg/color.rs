//! Color mapping utilities for SVG output.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Simple RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };
    pub const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
    pub const GRAY: Rgb = Rgb { r: 128, g: 128, b: 128 };

    /// Linear interpolation between two colors, `t` in [0.0, 1.0].
    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb { r: mix(self.r, other.r), g: mix(self.g, other.g), b: mix(self.b, other.b) }
    }
}

impl fmt::Display for Rgb {
    /// Format as CSS: rgb(r,g,b)
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// Sequential colormaps for choropleth fills.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    #[default]
    Viridis,
    Greys,
}

// Anchors sampled from matplotlib's viridis at steps of 1/8.
const VIRIDIS: &[Rgb] = &[
    Rgb { r:  68, g:   1, b:  84 },
    Rgb { r:  71, g:  44, b: 122 },
    Rgb { r:  59, g:  81, b: 139 },
    Rgb { r:  44, g: 113, b: 142 },
    Rgb { r:  33, g: 144, b: 141 },
    Rgb { r:  39, g: 173, b: 129 },
    Rgb { r:  92, g: 200, b:  99 },
    Rgb { r: 170, g: 220, b:  50 },
    Rgb { r: 253, g: 231, b:  37 },
];

const GREYS: &[Rgb] = &[Rgb::WHITE, Rgb::BLACK];

impl Colormap {
    fn anchors(&self) -> &'static [Rgb] {
        match self {
            Colormap::Viridis => VIRIDIS,
            Colormap::Greys => GREYS,
        }
    }

    /// Color at `t` in [0.0, 1.0]; values outside are clamped.
    pub fn at(&self, t: f64) -> Rgb {
        let anchors = self.anchors();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let pos = t * (anchors.len() - 1) as f64;
        let i = (pos.floor() as usize).min(anchors.len() - 2);
        anchors[i].lerp(anchors[i + 1], pos - i as f64)
    }

    /// Color of `value` on the `[vmin, vmax]` scale.
    pub fn map(&self, value: f64, vmin: f64, vmax: f64) -> Rgb {
        let span = vmax - vmin;
        if span <= 0.0 { return self.at(0.0) }
        self.at((value - vmin) / span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viridis_endpoints_and_clamping() {
        assert_eq!(Colormap::Viridis.at(0.0), VIRIDIS[0]);
        assert_eq!(Colormap::Viridis.at(1.0), VIRIDIS[8]);
        assert_eq!(Colormap::Viridis.at(0.5), VIRIDIS[4]);
        assert_eq!(Colormap::Viridis.map(9000.0, 1000.0, 8000.0), VIRIDIS[8]);
        assert_eq!(Colormap::Viridis.map(10.0, 1000.0, 8000.0), VIRIDIS[0]);
    }

    #[test]
    fn greys_interpolate() {
        assert_eq!(Colormap::Greys.at(0.5), Rgb { r: 128, g: 128, b: 128 });
        assert_eq!(Rgb::RED.to_string(), "rgb(255,0,0)");
    }
}
