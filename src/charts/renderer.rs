//! Static Chart Renderer
//! Draws every chart of the catalogue with plotters, either into an SVG
//! string (for the HTML pages) or into a PNG file.
//!
//! All draw functions are generic over the backend so SVG and PNG output
//! share one implementation.

use crate::charts::layout::{pie_wedges, squarify, Tile};
use crate::charts::series::{
    growth_series, heatmap_rows, stacked_region_layers, top_country_bars, treemap_entries,
    trend_series, yearly_series, NamedSeries,
};
use crate::charts::theme::{contrast_text, ChartTheme, ColorScale, Rgb};
use crate::charts::ChartKind;
use crate::config::AnalysisSettings;
use crate::report::format_count;
use crate::stats::ImmigrationSummary;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to draw {chart}: {message}")]
    Draw {
        chart: &'static str,
        message: String,
    },
}

type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c[0], c[1], c[2])
}

/// Short axis labels: 1.2M, 150k, 42.
fn compact(value: &f64) -> String {
    let v = value.abs();
    let sign = if *value < 0.0 { "-" } else { "" };
    if v >= 1_000_000.0 {
        format!("{sign}{:.1}M", v / 1_000_000.0)
    } else if v >= 1_000.0 {
        format!("{sign}{:.0}k", v / 1_000.0)
    } else {
        format!("{sign}{v:.0}")
    }
}

/// Upper bound with headroom; never zero so the axis range stays valid.
fn headroom(max: f64, factor: f64) -> f64 {
    if max > 0.0 {
        max * factor
    } else {
        1.0
    }
}

/// Label for an integer tick of a categorical axis.
fn category_label(labels: &[String], value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

pub struct StaticChartRenderer<'a> {
    summary: &'a ImmigrationSummary,
    settings: &'a AnalysisSettings,
    theme: &'a ChartTheme,
    width: u32,
}

impl<'a> StaticChartRenderer<'a> {
    pub fn new(
        summary: &'a ImmigrationSummary,
        settings: &'a AnalysisSettings,
        theme: &'a ChartTheme,
    ) -> Self {
        Self {
            summary,
            settings,
            theme,
            width: 1000,
        }
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width.max(200);
        self
    }

    pub fn size(&self, kind: ChartKind) -> (u32, u32) {
        (self.width, kind.height())
    }

    pub fn title(&self, kind: ChartKind) -> String {
        kind.title(self.settings, self.summary.year_span())
    }

    /// Render `kind` as a standalone SVG document.
    pub fn render_svg(&self, kind: ChartKind) -> Result<String, RenderError> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, self.size(kind)).into_drawing_area();
            self.draw(kind, &root)
                .and_then(|_| root.present())
                .map_err(|e| Self::draw_error(kind, e))?;
        }
        debug!(chart = kind.file_stem(), bytes = svg.len(), "rendered svg");
        Ok(svg)
    }

    /// Render `kind` to a PNG file at `path`.
    pub fn render_png(&self, kind: ChartKind, path: &Path) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, self.size(kind)).into_drawing_area();
        self.draw(kind, &root)
            .and_then(|_| root.present())
            .map_err(|e| Self::draw_error(kind, e))?;
        debug!(chart = kind.file_stem(), path = %path.display(), "rendered png");
        Ok(())
    }

    fn draw_error<E: std::error::Error + Send + Sync>(
        kind: ChartKind,
        err: DrawingAreaErrorKind<E>,
    ) -> RenderError {
        RenderError::Draw {
            chart: kind.file_stem(),
            message: err.to_string(),
        }
    }

    fn font(&self, size: f64) -> TextStyle<'a> {
        (self.theme.font_family.as_str(), size)
            .into_font()
            .color(&rgb(self.theme.text))
    }

    fn draw<DB: DrawingBackend>(&self, kind: ChartKind, root: &DrawingArea<DB, Shift>) -> DrawResult<DB> {
        root.fill(&rgb(self.theme.background))?;
        let area = root.titled(&self.title(kind), self.font(22.0))?;

        match kind {
            ChartKind::TotalOverTime => self.draw_total(&area),
            ChartKind::TopCountries => {
                self.draw_hbars(&area, &top_country_bars(self.summary), self.theme.top_countries_scale, "Country")
            }
            ChartKind::ByRegion => self.draw_hbars(
                &area,
                &self.summary.region_totals.sorted_by_value(),
                self.theme.region_scale,
                "Region",
            ),
            ChartKind::DevelopedVsDeveloping => self.draw_pie(&area),
            ChartKind::TopTrends => {
                self.draw_lines(&area, &trend_series(self.summary), "Immigrants", false)
            }
            ChartKind::Heatmap => self.draw_heatmap(&area),
            ChartKind::BySubRegion => self.draw_hbars(
                &area,
                &self.summary.subregion_totals.sorted_by_value(),
                self.theme.subregion_scale,
                "Sub-Region",
            ),
            ChartKind::GrowthRate => {
                self.draw_lines(&area, &growth_series(self.summary), "Growth Rate (%)", true)
            }
            ChartKind::StackedRegion => self.draw_stacked(&area),
            ChartKind::Treemap => self.draw_treemap(&area),
        }
    }

    fn year_range(&self) -> (i32, i32) {
        match self.summary.year_span() {
            Some((first, last)) if last > first => (first, last),
            Some((first, _)) => (first, first + 1),
            None => (0, 1),
        }
    }

    fn draw_total<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> DrawResult<DB> {
        let points = yearly_series(self.summary);
        let max = points.iter().map(|p| p.1).fold(0.0, f64::max);
        let (first, last) = self.year_range();
        let accent = rgb(self.theme.accent);

        let mut chart = ChartBuilder::on(area)
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(first..last, 0f64..headroom(max, 1.1))?;
        chart
            .configure_mesh()
            .light_line_style(&rgb(self.theme.grid))
            .x_desc("Year")
            .y_desc("Total Immigrants")
            .y_label_formatter(&compact)
            .label_style(self.font(12.0))
            .axis_desc_style(self.font(14.0))
            .draw()?;

        chart.draw_series(LineSeries::new(points.iter().copied(), accent.stroke_width(3)))?;
        chart.draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 4, accent.filled())))?;
        Ok(())
    }

    /// Horizontal bars, first entry at the bottom, coloured by value.
    fn draw_hbars<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        entries: &[(String, u64)],
        scale: ColorScale,
        axis: &str,
    ) -> DrawResult<DB> {
        let labels: Vec<String> = entries.iter().map(|e| e.0.clone()).collect();
        let max = entries.iter().map(|e| e.1).max().unwrap_or(0) as f64;
        let n = entries.len().max(1);
        let label_width = labels.iter().map(|l| l.len()).max().unwrap_or(0) as u32 * 7 + 20;

        let mut chart = ChartBuilder::on(area)
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(label_width.clamp(60, 320))
            .build_cartesian_2d(0f64..headroom(max, 1.15), -0.5f64..(n as f64 - 0.5))?;
        chart
            .configure_mesh()
            .disable_y_mesh()
            .light_line_style(&rgb(self.theme.grid))
            .y_labels(n)
            .y_label_formatter(&|v| category_label(&labels, *v))
            .x_label_formatter(&compact)
            .x_desc("Total Immigrants")
            .y_desc(axis)
            .label_style(self.font(12.0))
            .axis_desc_style(self.font(14.0))
            .draw()?;

        chart.draw_series(entries.iter().enumerate().map(|(i, (_, value))| {
            let y = i as f64;
            let fill = rgb(scale.sample(*value as f64 / headroom(max, 1.0)));
            Rectangle::new([(0.0, y - 0.38), (*value as f64, y + 0.38)], fill.filled())
        }))?;

        let text = self.font(11.0).pos(Pos::new(HPos::Left, VPos::Center));
        chart.draw_series(entries.iter().enumerate().map(|(i, (_, value))| {
            Text::new(
                format!(" {}", format_count(*value)),
                (*value as f64, i as f64),
                text.clone(),
            )
        }))?;
        Ok(())
    }

    fn draw_pie<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> DrawResult<DB> {
        let entries: Vec<(String, u64)> = self.summary.dev_totals.to_rows();
        let values: Vec<f64> = entries.iter().map(|e| e.1 as f64).collect();
        let wedges = pie_wedges(&values);

        let (w, h) = area.dim_in_pixel();
        let legend_width = 220.0;
        let center = ((w as f64 - legend_width) / 2.0, h as f64 / 2.0);
        let radius = (center.0.min(center.1) - 20.0).max(10.0);

        for (i, wedge) in wedges.iter().enumerate() {
            if wedge.fraction <= 0.0 {
                continue;
            }
            let fill = rgb(self.theme.dev_color(i));
            let outline: Vec<(i32, i32)> = wedge
                .outline(center, radius, 0.02)
                .into_iter()
                .map(|(x, y)| (x.round() as i32, y.round() as i32))
                .collect();
            area.draw(&Polygon::new(outline.clone(), fill.filled()))?;
            area.draw(&PathElement::new(outline, WHITE.stroke_width(2)))?;

            let (lx, ly) = (
                center.0 + radius * 0.65 * wedge.mid().cos(),
                center.1 + radius * 0.65 * wedge.mid().sin(),
            );
            let label_color = rgb(contrast_text(self.theme.dev_color(i)));
            area.draw(&Text::new(
                format!("{:.1}%", wedge.fraction * 100.0),
                (lx.round() as i32, ly.round() as i32),
                (self.theme.font_family.as_str(), 16.0)
                    .into_font()
                    .color(&label_color)
                    .pos(Pos::new(HPos::Center, VPos::Center)),
            ))?;
        }

        let legend_x = (w as f64 - legend_width + 10.0) as i32;
        for (i, (name, value)) in entries.iter().enumerate() {
            let y = 40 + i as i32 * 28;
            area.draw(&Rectangle::new(
                [(legend_x, y), (legend_x + 16, y + 16)],
                rgb(self.theme.dev_color(i)).filled(),
            ))?;
            area.draw(&Text::new(
                format!("{name} ({})", format_count(*value)),
                (legend_x + 24, y + 8),
                self.font(12.0).pos(Pos::new(HPos::Left, VPos::Center)),
            ))?;
        }
        Ok(())
    }

    /// One line per series with a legend; `zero_line` marks y = 0.
    fn draw_lines<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        series: &[NamedSeries],
        y_desc: &str,
        zero_line: bool,
    ) -> DrawResult<DB> {
        let (first, last) = self.year_range();
        let non_empty: Vec<&NamedSeries> = series.iter().filter(|s| !s.points.is_empty()).collect();
        let max = non_empty.iter().map(|s| s.max_value()).fold(0.0, f64::max);
        let min = non_empty.iter().map(|s| s.min_value()).fold(0.0, f64::min);
        let low = if min < 0.0 { min * 1.1 } else { 0.0 };

        let mut chart = ChartBuilder::on(area)
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(first..last, low..headroom(max, 1.1))?;
        chart
            .configure_mesh()
            .light_line_style(&rgb(self.theme.grid))
            .x_desc("Year")
            .y_desc(y_desc)
            .y_label_formatter(&compact)
            .label_style(self.font(12.0))
            .axis_desc_style(self.font(14.0))
            .draw()?;

        if zero_line {
            chart.draw_series(LineSeries::new(
                vec![(first, 0.0), (last, 0.0)],
                rgb(self.theme.text).mix(0.4).stroke_width(1),
            ))?;
        }

        for (i, s) in non_empty.iter().enumerate() {
            let color = rgb(self.theme.series_color(i));
            chart
                .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))?
                .label(s.name.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }

        if !non_empty.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(&WHITE.mix(0.85))
                .border_style(&rgb(self.theme.grid))
                .label_font(self.font(11.0))
                .draw()?;
        }
        Ok(())
    }

    /// Country x year grid, countries alphabetical from the top.
    fn draw_heatmap<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> DrawResult<DB> {
        let matrix = &self.summary.heatmap;
        // Row 0 is drawn at the bottom.
        let mut rows = heatmap_rows(self.summary);
        rows.reverse();

        let labels: Vec<String> = rows.iter().map(|(name, _)| name.to_string()).collect();
        let years = matrix.columns();
        let (first, last) = match (years.first(), years.last()) {
            (Some(f), Some(l)) => (*f as f64, *l as f64),
            _ => (0.0, 1.0),
        };
        let max = headroom(matrix.max_value() as f64, 1.0);
        let n = rows.len().max(1);

        let mut chart = ChartBuilder::on(area)
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(180)
            .build_cartesian_2d((first - 0.5)..(last + 0.5), -0.5f64..(n as f64 - 0.5))?;
        chart
            .configure_mesh()
            .disable_mesh()
            .y_labels(n)
            .y_label_formatter(&|v| category_label(&labels, *v))
            .x_label_formatter(&|v| format!("{v:.0}"))
            .x_desc("Year")
            .y_desc("Country")
            .label_style(self.font(11.0))
            .axis_desc_style(self.font(14.0))
            .draw()?;

        let scale = self.theme.heatmap_scale;
        chart.draw_series(rows.iter().enumerate().flat_map(move |(i, (_, cells))| {
            years.iter().zip(cells.iter()).map(move |(year, value)| {
                let (x, y) = (*year as f64, i as f64);
                Rectangle::new(
                    [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                    rgb(scale.sample(*value as f64 / max)).filled(),
                )
            })
        }))?;
        Ok(())
    }

    /// Cumulative bands, drawn top layer first so lower bands overlay it.
    fn draw_stacked<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> DrawResult<DB> {
        let layers = stacked_region_layers(self.summary);
        let max = layers.last().map(|l| l.max_value()).unwrap_or(0.0);
        let (first, last) = self.year_range();

        let mut chart = ChartBuilder::on(area)
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(first..last, 0f64..headroom(max, 1.05))?;
        chart
            .configure_mesh()
            .light_line_style(&rgb(self.theme.grid))
            .x_desc("Year")
            .y_desc("Immigrants")
            .y_label_formatter(&compact)
            .label_style(self.font(12.0))
            .axis_desc_style(self.font(14.0))
            .draw()?;

        for (i, layer) in layers.iter().enumerate().rev() {
            let color = rgb(self.theme.series_color(i));
            chart
                .draw_series(
                    AreaSeries::new(layer.points.iter().copied(), 0.0, color.mix(0.85).filled())
                        .border_style(color.stroke_width(1)),
                )?
                .label(layer.name.clone())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 14, y + 5)], color.filled()));
        }

        if !layers.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(&WHITE.mix(0.85))
                .border_style(&rgb(self.theme.grid))
                .label_font(self.font(11.0))
                .draw()?;
        }
        Ok(())
    }

    fn draw_treemap<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> DrawResult<DB> {
        let entries = treemap_entries(self.summary);
        let values: Vec<f64> = entries.iter().map(|e| e.1 as f64).collect();
        let max = headroom(values.first().copied().unwrap_or(0.0), 1.0);

        let (w, h) = area.dim_in_pixel();
        let bounds = Tile::new(10.0, 10.0, w as f64 - 20.0, h as f64 - 20.0);
        let tiles = squarify(&values, bounds);

        for ((name, value), tile) in entries.iter().zip(&tiles) {
            if tile.area() < 1.0 {
                continue;
            }
            let fill = self.theme.treemap_scale.sample(*value as f64 / max);
            let corners = [
                (tile.x.round() as i32, tile.y.round() as i32),
                ((tile.x + tile.w).round() as i32, (tile.y + tile.h).round() as i32),
            ];
            area.draw(&Rectangle::new(corners, rgb(fill).filled()))?;
            area.draw(&Rectangle::new(corners, WHITE.stroke_width(1)))?;

            if tile.w >= 70.0 && tile.h >= 34.0 {
                let style = (self.theme.font_family.as_str(), 11.0)
                    .into_font()
                    .color(&rgb(contrast_text(fill)));
                let (x, y) = (corners[0].0 + 4, corners[0].1 + 4);
                area.draw(&Text::new(name.clone(), (x, y), style.clone()))?;
                area.draw(&Text::new(format_count(*value), (x, y + 14), style))?;
            }
        }
        Ok(())
    }
}
