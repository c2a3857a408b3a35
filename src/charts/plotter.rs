//! Chart Plotter Module
//! Interactive versions of the catalogue charts, drawn with egui_plot where a
//! plot widget fits and with the painter for pie, heatmap and treemap.

use crate::charts::layout::{pie_wedges, squarify, Tile, Wedge};
use crate::charts::series::{
    growth_series, heatmap_rows, stacked_region_layers, top_country_bars, treemap_entries,
    trend_series, yearly_series, NamedSeries,
};
use crate::charts::theme::{contrast_text, ChartTheme, ColorScale, Rgb};
use crate::charts::ChartKind;
use crate::report::format_count;
use crate::stats::ImmigrationSummary;
use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, Vec2};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};
use std::f64::consts::FRAC_PI_2;

pub fn color(c: Rgb) -> Color32 {
    Color32::from_rgb(c[0], c[1], c[2])
}

/// Creates the dashboard charts.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw `kind` filling the available width.
    pub fn show(
        ui: &mut egui::Ui,
        kind: ChartKind,
        summary: &ImmigrationSummary,
        theme: &ChartTheme,
        height: f32,
    ) {
        match kind {
            ChartKind::TotalOverTime => Self::draw_total(ui, summary, theme, height),
            ChartKind::TopCountries => Self::draw_hbars(
                ui,
                "top_countries",
                &top_country_bars(summary),
                theme.top_countries_scale,
                height,
            ),
            ChartKind::ByRegion => Self::draw_hbars(
                ui,
                "by_region",
                &summary.region_totals.sorted_by_value(),
                theme.region_scale,
                height,
            ),
            ChartKind::DevelopedVsDeveloping => Self::draw_pie(ui, summary, theme, height),
            ChartKind::TopTrends => {
                Self::draw_lines(ui, "top_trends", &trend_series(summary), theme, height, false)
            }
            ChartKind::Heatmap => Self::draw_heatmap(ui, summary, theme, height),
            ChartKind::BySubRegion => Self::draw_hbars(
                ui,
                "by_subregion",
                &summary.subregion_totals.sorted_by_value(),
                theme.subregion_scale,
                height,
            ),
            ChartKind::GrowthRate => {
                Self::draw_lines(ui, "growth", &growth_series(summary), theme, height, true)
            }
            ChartKind::StackedRegion => Self::draw_stacked(ui, summary, theme, height),
            ChartKind::Treemap => Self::draw_treemap(ui, summary, theme, height),
        }
    }

    fn draw_total(ui: &mut egui::Ui, summary: &ImmigrationSummary, theme: &ChartTheme, height: f32) {
        let points = yearly_series(summary);
        let accent = color(theme.accent);
        let as_plot = || -> PlotPoints { points.iter().map(|&(x, y)| [x as f64, y]).collect() };

        Plot::new("total_over_time")
            .height(height)
            .allow_scroll(false)
            .x_axis_label("Year")
            .y_axis_label("Total Immigrants")
            .include_y(0.0)
            .y_axis_formatter(|mark, _range| format_count(mark.value.max(0.0) as u64))
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new(as_plot()).color(accent).width(3.0).name("Immigrants"));
                plot_ui.points(Points::new(as_plot()).color(accent).radius(3.5));
            });
    }

    /// Horizontal bars; the first entry sits at the bottom.
    fn draw_hbars(
        ui: &mut egui::Ui,
        id: &str,
        entries: &[(String, u64)],
        scale: ColorScale,
        height: f32,
    ) {
        let max = entries.iter().map(|e| e.1).max().unwrap_or(0).max(1) as f64;
        let labels: Vec<String> = entries.iter().map(|e| e.0.clone()).collect();
        let label_width = labels.iter().map(|l| l.len()).max().unwrap_or(0) as f32 * 6.5;

        let bars: Vec<Bar> = entries
            .iter()
            .enumerate()
            .map(|(i, (name, value))| {
                Bar::new(i as f64, *value as f64)
                    .name(format!("{name}: {}", format_count(*value)))
                    .fill(color(scale.sample(*value as f64 / max)))
                    .width(0.75)
            })
            .collect();

        Plot::new(id)
            .height(height)
            .allow_scroll(false)
            .allow_zoom(false)
            .allow_drag(false)
            .include_x(0.0)
            .y_axis_min_width(label_width.max(40.0))
            .y_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                labels.get(idx as usize).cloned().unwrap_or_default()
            })
            .x_axis_formatter(|mark, _range| format_count(mark.value.max(0.0) as u64))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).horizontal());
            });
    }

    fn draw_lines(
        ui: &mut egui::Ui,
        id: &str,
        series: &[NamedSeries],
        theme: &ChartTheme,
        height: f32,
        zero_line: bool,
    ) {
        Plot::new(id)
            .height(height)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_label("Year")
            .y_axis_label(if zero_line { "Growth Rate (%)" } else { "Immigrants" })
            .show(ui, |plot_ui| {
                if zero_line {
                    plot_ui.hline(egui_plot::HLine::new(0.0).color(Color32::GRAY).width(1.0));
                }
                for (i, s) in series.iter().filter(|s| !s.points.is_empty()).enumerate() {
                    let points: PlotPoints =
                        s.points.iter().map(|&(x, y)| [x as f64, y]).collect();
                    plot_ui.line(
                        Line::new(points)
                            .color(color(theme.series_color(i)))
                            .width(2.0)
                            .name(&s.name),
                    );
                }
            });
    }

    /// Filled cumulative lines, top layer first so lower bands cover it.
    fn draw_stacked(ui: &mut egui::Ui, summary: &ImmigrationSummary, theme: &ChartTheme, height: f32) {
        let layers = stacked_region_layers(summary);

        Plot::new("stacked_region")
            .height(height)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_label("Year")
            .y_axis_label("Immigrants")
            .include_y(0.0)
            .show(ui, |plot_ui| {
                for (i, layer) in layers.iter().enumerate().rev() {
                    let points: PlotPoints =
                        layer.points.iter().map(|&(x, y)| [x as f64, y]).collect();
                    plot_ui.line(
                        Line::new(points)
                            .color(color(theme.series_color(i)))
                            .fill(0.0)
                            .width(1.0)
                            .name(&layer.name),
                    );
                }
            });
    }

    fn draw_pie(ui: &mut egui::Ui, summary: &ImmigrationSummary, theme: &ChartTheme, height: f32) {
        let entries = summary.dev_totals.to_rows();
        let values: Vec<f64> = entries.iter().map(|e| e.1 as f64).collect();
        let wedges = pie_wedges(&values);

        let (response, painter) =
            ui.allocate_painter(Vec2::new(ui.available_width(), height), Sense::hover());
        let rect = response.rect;
        let legend_width = 200.0;
        let center = (
            (rect.left() + (rect.width() - legend_width) / 2.0) as f64,
            rect.center().y as f64,
        );
        let radius = ((rect.width() - legend_width).min(rect.height()) / 2.0 - 10.0).max(10.0) as f64;

        let mut hovered = None;
        for (i, wedge) in wedges.iter().enumerate() {
            if wedge.fraction <= 0.0 {
                continue;
            }
            let fill = color(theme.dev_color(i));
            // Convex pieces only; split large wedges.
            for part in Self::split_wedge(wedge) {
                let points: Vec<Pos2> = part
                    .outline(center, radius, 0.03)
                    .into_iter()
                    .map(|(x, y)| Pos2::new(x as f32, y as f32))
                    .collect();
                painter.add(Shape::convex_polygon(points, fill, Stroke::NONE));
            }

            let mid = wedge.mid();
            let label_pos = Pos2::new(
                (center.0 + radius * 0.65 * mid.cos()) as f32,
                (center.1 + radius * 0.65 * mid.sin()) as f32,
            );
            painter.text(
                label_pos,
                Align2::CENTER_CENTER,
                format!("{:.1}%", wedge.fraction * 100.0),
                FontId::proportional(15.0),
                color(contrast_text(theme.dev_color(i))),
            );

            if let Some(pos) = response.hover_pos() {
                if Self::wedge_contains(wedge, center, radius, pos) {
                    hovered = Some(i);
                }
            }
        }

        let legend_x = rect.right() - legend_width + 10.0;
        for (i, (name, value)) in entries.iter().enumerate() {
            let y = rect.top() + 30.0 + i as f32 * 24.0;
            painter.rect_filled(
                Rect::from_min_size(Pos2::new(legend_x, y - 7.0), Vec2::splat(14.0)),
                2.0,
                color(theme.dev_color(i)),
            );
            painter.text(
                Pos2::new(legend_x + 20.0, y),
                Align2::LEFT_CENTER,
                format!("{name} ({})", format_count(*value)),
                FontId::proportional(12.0),
                ui.visuals().text_color(),
            );
        }

        if let Some((name, value)) = hovered.and_then(|i| entries.get(i)) {
            response.on_hover_text_at_pointer(format!("{name}: {}", format_count(*value)));
        }
    }

    fn split_wedge(wedge: &Wedge) -> Vec<Wedge> {
        let parts = (wedge.sweep() / FRAC_PI_2).ceil().max(1.0) as usize;
        let step = wedge.sweep() / parts as f64;
        (0..parts)
            .map(|i| Wedge {
                start: wedge.start + step * i as f64,
                end: wedge.start + step * (i + 1) as f64,
                fraction: wedge.fraction / parts as f64,
            })
            .collect()
    }

    fn wedge_contains(wedge: &Wedge, center: (f64, f64), radius: f64, pos: Pos2) -> bool {
        let (dx, dy) = (pos.x as f64 - center.0, pos.y as f64 - center.1);
        if dx.hypot(dy) > radius {
            return false;
        }
        // Wedges start at -pi/2; bring the angle into [start, start + 2pi).
        let mut angle = dy.atan2(dx);
        while angle < wedge.start {
            angle += std::f64::consts::TAU;
        }
        angle < wedge.end
    }

    /// Country x year grid in pivot order, first country in the top row.
    fn draw_heatmap(ui: &mut egui::Ui, summary: &ImmigrationSummary, theme: &ChartTheme, height: f32) {
        let matrix = &summary.heatmap;
        let rows = heatmap_rows(summary);
        let years = matrix.columns();
        if rows.is_empty() || years.is_empty() {
            ui.label("No data");
            return;
        }

        let (response, painter) =
            ui.allocate_painter(Vec2::new(ui.available_width(), height), Sense::hover());
        let rect = response.rect;
        let label_width = 170.0;
        let axis_height = 20.0;
        let grid = Rect::from_min_max(
            Pos2::new(rect.left() + label_width, rect.top()),
            Pos2::new(rect.right(), rect.bottom() - axis_height),
        );
        let cell = Vec2::new(
            grid.width() / years.len() as f32,
            grid.height() / rows.len() as f32,
        );
        let max = matrix.max_value().max(1) as f64;
        let text_color = ui.visuals().text_color();

        for (r, (name, cells)) in rows.iter().enumerate() {
            let top = grid.top() + r as f32 * cell.y;
            painter.text(
                Pos2::new(grid.left() - 6.0, top + cell.y / 2.0),
                Align2::RIGHT_CENTER,
                *name,
                FontId::proportional(11.0),
                text_color,
            );
            for (c, value) in cells.iter().enumerate() {
                let min = Pos2::new(grid.left() + c as f32 * cell.x, top);
                painter.rect_filled(
                    Rect::from_min_size(min, cell),
                    0.0,
                    color(theme.heatmap_scale.sample(*value as f64 / max)),
                );
            }
        }

        let step = (years.len() / 8).max(1);
        for (c, year) in years.iter().enumerate().step_by(step) {
            painter.text(
                Pos2::new(grid.left() + (c as f32 + 0.5) * cell.x, grid.bottom() + 4.0),
                Align2::CENTER_TOP,
                year.to_string(),
                FontId::proportional(11.0),
                text_color,
            );
        }

        if let Some(pos) = response.hover_pos().filter(|p| grid.contains(*p)) {
            let c = ((pos.x - grid.left()) / cell.x) as usize;
            let r = ((pos.y - grid.top()) / cell.y) as usize;
            if let (Some((name, cells)), Some(year)) = (rows.get(r), years.get(c)) {
                let value = cells.get(c).copied().unwrap_or(0);
                response.on_hover_text_at_pointer(format!("{name}, {year}: {}", format_count(value)));
            }
        }
    }

    fn draw_treemap(ui: &mut egui::Ui, summary: &ImmigrationSummary, theme: &ChartTheme, height: f32) {
        let entries = treemap_entries(summary);
        let values: Vec<f64> = entries.iter().map(|e| e.1 as f64).collect();
        let max = values.first().copied().unwrap_or(0.0).max(1.0);

        let (response, painter) =
            ui.allocate_painter(Vec2::new(ui.available_width(), height), Sense::hover());
        let rect = response.rect;
        let tiles = squarify(
            &values,
            Tile::new(rect.left() as f64, rect.top() as f64, rect.width() as f64, rect.height() as f64),
        );

        let mut hovered = None;
        for (i, ((name, value), tile)) in entries.iter().zip(&tiles).enumerate() {
            if tile.area() < 1.0 {
                continue;
            }
            let fill = theme.treemap_scale.sample(*value as f64 / max);
            let tile_rect = Rect::from_min_size(
                Pos2::new(tile.x as f32, tile.y as f32),
                Vec2::new(tile.w as f32, tile.h as f32),
            );
            painter.rect_filled(tile_rect, 0.0, color(fill));
            painter.rect_stroke(tile_rect, 0.0, Stroke::new(1.0, Color32::WHITE));

            if tile.w >= 70.0 && tile.h >= 34.0 {
                let text = color(contrast_text(fill));
                painter.text(
                    tile_rect.left_top() + Vec2::new(4.0, 4.0),
                    Align2::LEFT_TOP,
                    name,
                    FontId::proportional(11.0),
                    text,
                );
                painter.text(
                    tile_rect.left_top() + Vec2::new(4.0, 18.0),
                    Align2::LEFT_TOP,
                    format_count(*value),
                    FontId::proportional(11.0),
                    text,
                );
            }
            if response.hover_pos().is_some_and(|p| tile_rect.contains(p)) {
                hovered = Some(i);
            }
        }

        if let Some((name, value)) = hovered.and_then(|i| entries.get(i)) {
            response.on_hover_text_at_pointer(format!("{name}: {}", format_count(*value)));
        }
    }
}
