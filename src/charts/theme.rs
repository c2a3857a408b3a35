//! Chart theme and colour scales.
//! Passed explicitly to every presenter; there is no process-wide theme.

use serde::{Deserialize, Serialize};

pub type Rgb = [u8; 3];

/// Continuous colour scales used for value-coloured charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorScale {
    Blues,
    Viridis,
    Plasma,
    YlGnBu,
    RdBu,
}

const BLUES: [Rgb; 9] = [
    [247, 251, 255],
    [222, 235, 247],
    [198, 219, 239],
    [158, 202, 225],
    [107, 174, 214],
    [66, 146, 198],
    [33, 113, 181],
    [8, 81, 156],
    [8, 48, 107],
];

const VIRIDIS: [Rgb; 10] = [
    [68, 1, 84],
    [72, 40, 120],
    [62, 73, 137],
    [49, 104, 142],
    [38, 130, 142],
    [31, 158, 137],
    [53, 183, 121],
    [110, 206, 88],
    [181, 222, 43],
    [253, 231, 37],
];

const PLASMA: [Rgb; 10] = [
    [13, 8, 135],
    [70, 3, 159],
    [114, 1, 168],
    [156, 23, 158],
    [189, 55, 134],
    [216, 87, 107],
    [237, 121, 83],
    [251, 159, 58],
    [253, 202, 38],
    [240, 249, 33],
];

const YLGNBU: [Rgb; 9] = [
    [255, 255, 217],
    [237, 248, 177],
    [199, 233, 180],
    [127, 205, 187],
    [65, 182, 196],
    [29, 145, 192],
    [34, 94, 168],
    [37, 52, 148],
    [8, 29, 88],
];

const RDBU: [Rgb; 11] = [
    [103, 0, 31],
    [178, 24, 43],
    [214, 96, 77],
    [244, 165, 130],
    [253, 219, 199],
    [247, 247, 247],
    [209, 229, 240],
    [146, 197, 222],
    [67, 147, 195],
    [33, 102, 172],
    [5, 48, 97],
];

impl ColorScale {
    fn stops(self) -> &'static [Rgb] {
        match self {
            ColorScale::Blues => &BLUES,
            ColorScale::Viridis => &VIRIDIS,
            ColorScale::Plasma => &PLASMA,
            ColorScale::YlGnBu => &YLGNBU,
            ColorScale::RdBu => &RDBU,
        }
    }

    /// Colour at position `t` in [0, 1]; out-of-range and NaN inputs clamp.
    pub fn sample(self, t: f64) -> Rgb {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let pos = t * (stops.len() - 1) as f64;
        let lower = pos.floor() as usize;
        let upper = (lower + 1).min(stops.len() - 1);
        let frac = pos - lower as f64;

        let mut out = [0u8; 3];
        for (i, channel) in out.iter_mut().enumerate() {
            let a = stops[lower][i] as f64;
            let b = stops[upper][i] as f64;
            *channel = (a + (b - a) * frac).round() as u8;
        }
        out
    }
}

/// Dark text on light fills, white text on dark ones.
pub fn contrast_text(fill: Rgb) -> Rgb {
    let luma = 0.299 * fill[0] as f64 + 0.587 * fill[1] as f64 + 0.114 * fill[2] as f64;
    if luma > 140.0 {
        [42, 63, 95]
    } else {
        [255, 255, 255]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartTheme {
    pub name: String,
    pub font_family: String,
    pub background: Rgb,
    pub text: Rgb,
    pub grid: Rgb,
    /// Line colour of single-series charts.
    pub accent: Rgb,
    /// Categorical colours for multi-series charts.
    pub palette: Vec<Rgb>,
    /// Developed / developing pie colours.
    pub dev_colors: Vec<Rgb>,
    pub top_countries_scale: ColorScale,
    pub region_scale: ColorScale,
    pub subregion_scale: ColorScale,
    pub heatmap_scale: ColorScale,
    pub treemap_scale: ColorScale,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            name: "plotly_white".to_string(),
            font_family: "sans-serif".to_string(),
            background: [255, 255, 255],
            text: [42, 63, 95],
            grid: [235, 240, 248],
            accent: [99, 110, 250],
            palette: vec![
                [99, 110, 250],
                [239, 85, 59],
                [0, 204, 150],
                [171, 99, 250],
                [255, 161, 90],
                [25, 211, 243],
                [255, 102, 146],
                [182, 232, 128],
                [255, 151, 255],
                [254, 203, 82],
            ],
            dev_colors: vec![[46, 134, 171], [162, 59, 114]],
            top_countries_scale: ColorScale::Blues,
            region_scale: ColorScale::Viridis,
            subregion_scale: ColorScale::Plasma,
            heatmap_scale: ColorScale::YlGnBu,
            treemap_scale: ColorScale::RdBu,
        }
    }
}

impl ChartTheme {
    pub fn series_color(&self, idx: usize) -> Rgb {
        Self::cycle(&self.palette, idx)
    }

    pub fn dev_color(&self, idx: usize) -> Rgb {
        if self.dev_colors.is_empty() {
            self.series_color(idx)
        } else {
            Self::cycle(&self.dev_colors, idx)
        }
    }

    fn cycle(colors: &[Rgb], idx: usize) -> Rgb {
        if colors.is_empty() {
            [99, 110, 250]
        } else {
            colors[idx % colors.len()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_endpoints_match_stops() {
        assert_eq!(ColorScale::Blues.sample(0.0), BLUES[0]);
        assert_eq!(ColorScale::Blues.sample(1.0), BLUES[8]);
        assert_eq!(ColorScale::Viridis.sample(2.0), VIRIDIS[9]);
        assert_eq!(ColorScale::RdBu.sample(f64::NAN), RDBU[0]);
    }

    #[test]
    fn scale_interpolates_between_stops() {
        // Halfway between the first two YlGnBu stops.
        let mid = ColorScale::YlGnBu.sample(0.5 / 8.0);
        assert_eq!(mid, [246, 252, 197]);
    }

    #[test]
    fn palette_cycles() {
        let theme = ChartTheme::default();
        assert_eq!(theme.series_color(0), theme.series_color(10));
        assert_eq!(theme.dev_color(3), theme.dev_colors[1]);
    }

    #[test]
    fn contrast_depends_on_fill() {
        assert_eq!(contrast_text([255, 255, 255]), [42, 63, 95]);
        assert_eq!(contrast_text([8, 29, 88]), [255, 255, 255]);
    }
}
