//! Geometry shared by the static renderer and the dashboard: squarified
//! treemap tiles and pie wedges.

use std::f64::consts::{FRAC_PI_2, TAU};

/// Axis-aligned rectangle in drawing units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Tile {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    fn empty_at(&self) -> Tile {
        Tile::new(self.x, self.y, 0.0, 0.0)
    }
}

/// Squarified treemap. `values` must be sorted descending; the returned tiles
/// are in the same order. Zero values get empty tiles.
pub fn squarify(values: &[f64], bounds: Tile) -> Vec<Tile> {
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 || bounds.area() <= 0.0 {
        return vec![bounds.empty_at(); values.len()];
    }

    let scale = bounds.area() / total;
    let areas: Vec<f64> = values.iter().map(|v| v.max(0.0) * scale).collect();

    let mut tiles = Vec::with_capacity(values.len());
    let mut rest = bounds;
    let mut start = 0;
    while start < areas.len() {
        if areas[start] <= 0.0 {
            tiles.extend(std::iter::repeat(rest.empty_at()).take(areas.len() - start));
            break;
        }

        let side = rest.w.min(rest.h);
        let mut end = start + 1;
        while end < areas.len()
            && areas[end] > 0.0
            && worst_ratio(&areas[start..=end], side) <= worst_ratio(&areas[start..end], side)
        {
            end += 1;
        }
        rest = layout_row(&areas[start..end], rest, &mut tiles);
        start = end;
    }
    tiles
}

/// Largest aspect ratio of a row laid along `side`.
fn worst_ratio(row: &[f64], side: f64) -> f64 {
    let sum: f64 = row.iter().sum();
    let max = row.iter().copied().fold(f64::MIN, f64::max);
    let min = row.iter().copied().fold(f64::MAX, f64::min);
    let side2 = side * side;
    let sum2 = sum * sum;
    (side2 * max / sum2).max(sum2 / (side2 * min))
}

/// Place `row` along the shorter side of `rest`; returns what is left.
fn layout_row(row: &[f64], rest: Tile, tiles: &mut Vec<Tile>) -> Tile {
    let sum: f64 = row.iter().sum();
    if rest.w >= rest.h {
        let width = if rest.h > 0.0 { sum / rest.h } else { 0.0 };
        let mut y = rest.y;
        for area in row {
            let h = if width > 0.0 { area / width } else { 0.0 };
            tiles.push(Tile::new(rest.x, y, width, h));
            y += h;
        }
        Tile::new(rest.x + width, rest.y, (rest.w - width).max(0.0), rest.h)
    } else {
        let height = if rest.w > 0.0 { sum / rest.w } else { 0.0 };
        let mut x = rest.x;
        for area in row {
            let w = if height > 0.0 { area / height } else { 0.0 };
            tiles.push(Tile::new(x, rest.y, w, height));
            x += w;
        }
        Tile::new(rest.x, rest.y + height, rest.w, (rest.h - height).max(0.0))
    }
}

/// One pie slice. Angles are radians, clockwise on screen from 12 o'clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wedge {
    pub start: f64,
    pub end: f64,
    pub fraction: f64,
}

impl Wedge {
    pub fn sweep(&self) -> f64 {
        self.end - self.start
    }

    pub fn mid(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    /// Arc outline from `center` with at least one point per `step` radians.
    pub fn outline(&self, center: (f64, f64), radius: f64, step: f64) -> Vec<(f64, f64)> {
        let segments = (self.sweep() / step).ceil().max(1.0) as usize;
        let mut points = Vec::with_capacity(segments + 2);
        points.push(center);
        for i in 0..=segments {
            let angle = self.start + self.sweep() * i as f64 / segments as f64;
            points.push((
                center.0 + radius * angle.cos(),
                center.1 + radius * angle.sin(),
            ));
        }
        points
    }
}

pub fn pie_wedges(values: &[f64]) -> Vec<Wedge> {
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    let mut angle = -FRAC_PI_2;
    values
        .iter()
        .map(|value| {
            let fraction = if total > 0.0 { value.max(0.0) / total } else { 0.0 };
            let start = angle;
            angle += fraction * TAU;
            Wedge {
                start,
                end: angle,
                fraction,
            }
        })
        .collect()
}
