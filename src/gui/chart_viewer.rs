//! Chart Viewer Widget
//! Scrollable central panel: KPI cards followed by the chart sections.
//! Cards wrap into as many columns as the width allows.

use crate::charts::{ChartKind, ChartPlotter, ChartTheme, StaticChartRenderer};
use crate::config::AnalysisSettings;
use crate::report::format_count;
use crate::stats::ImmigrationSummary;
use egui::{Color32, RichText, ScrollArea};

const CHART_SPACING: f32 = 15.0;
const CHART_WIDTH: f32 = 640.0;
const KPI_WIDTH: f32 = 220.0;

/// Dashboard sections in display order.
pub const SECTIONS: [(&str, &[ChartKind]); 3] = [
    (
        "Key Trends",
        &[
            ChartKind::TotalOverTime,
            ChartKind::TopCountries,
            ChartKind::ByRegion,
            ChartKind::DevelopedVsDeveloping,
            ChartKind::TopTrends,
        ],
    ),
    (
        "Regional Analysis",
        &[ChartKind::StackedRegion, ChartKind::BySubRegion],
    ),
    (
        "Advanced Insights",
        &[ChartKind::Heatmap, ChartKind::GrowthRate, ChartKind::Treemap],
    ),
];

/// One headline card.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiCard {
    pub label: &'static str,
    pub value: String,
}

pub fn kpi_cards(summary: &ImmigrationSummary) -> [KpiCard; 4] {
    let kpis = &summary.kpis;
    let peak = match kpis.peak_year {
        Some(year) => format!("{year} ({})", format_count(kpis.peak_year_total)),
        None => "-".to_string(),
    };
    [
        KpiCard {
            label: "Total Immigrants",
            value: format_count(kpis.total_immigrants),
        },
        KpiCard {
            label: "Top Source Country",
            value: kpis.top_country.clone().unwrap_or_else(|| "-".to_string()),
        },
        KpiCard {
            label: "Peak Year",
            value: peak,
        },
        KpiCard {
            label: "Top Country Total",
            value: format_count(kpis.top_country_total),
        },
    ]
}

#[derive(Default)]
pub struct ChartViewer {
    summary: Option<ImmigrationSummary>,
    settings: AnalysisSettings,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.summary = None;
    }

    pub fn set_summary(&mut self, summary: ImmigrationSummary, settings: AnalysisSettings) {
        self.summary = Some(summary);
        self.settings = settings;
    }

    pub fn summary(&self) -> Option<&ImmigrationSummary> {
        self.summary.as_ref()
    }

    /// Static renderer over the shown data, titled with the settings it was
    /// computed with.
    pub fn renderer<'a>(&'a self, theme: &'a ChartTheme) -> Option<StaticChartRenderer<'a>> {
        self.summary
            .as_ref()
            .map(|summary| StaticChartRenderer::new(summary, &self.settings, theme))
    }

    pub fn show(&self, ui: &mut egui::Ui, theme: &ChartTheme, visible: impl Fn(ChartKind) -> bool) {
        let Some(summary) = &self.summary else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        let span = summary.year_span();
        let heading = match span {
            Some((first, last)) => format!("Canada Immigration Dashboard ({first}-{last})"),
            None => "Canada Immigration Dashboard".to_string(),
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new(heading).size(24.0).strong());
                });
                ui.add_space(CHART_SPACING);

                ui.horizontal_wrapped(|ui| {
                    for card in kpi_cards(summary) {
                        Self::draw_kpi(ui, &card);
                        ui.add_space(CHART_SPACING);
                    }
                });
                ui.add_space(CHART_SPACING * 2.0);

                for (title, kinds) in SECTIONS {
                    let shown: Vec<ChartKind> = kinds.iter().copied().filter(|k| visible(*k)).collect();
                    if shown.is_empty() {
                        continue;
                    }
                    ui.label(RichText::new(title).size(20.0).strong());
                    ui.add_space(8.0);

                    let columns =
                        ((ui.available_width() / (CHART_WIDTH + CHART_SPACING)).floor() as usize).max(1);
                    for row in shown.chunks(columns) {
                        ui.horizontal_top(|ui| {
                            for kind in row {
                                self.draw_chart_card(ui, *kind, summary, theme, span);
                                ui.add_space(CHART_SPACING);
                            }
                        });
                        ui.add_space(CHART_SPACING);
                    }
                }
            });
    }

    fn draw_kpi(ui: &mut egui::Ui, card: &KpiCard) {
        egui::Frame::none()
            .rounding(10.0)
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(16.0)
            .show(ui, |ui| {
                ui.set_width(KPI_WIDTH);
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new(card.label).size(13.0).color(Color32::GRAY));
                    ui.label(RichText::new(&card.value).size(22.0).strong());
                });
            });
    }

    fn draw_chart_card(
        &self,
        ui: &mut egui::Ui,
        kind: ChartKind,
        summary: &ImmigrationSummary,
        theme: &ChartTheme,
        span: Option<(i32, i32)>,
    ) {
        // Dashboard cards are shorter than the exported pages.
        let height = kind.height() as f32 * 0.7;
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, Color32::from_gray(200)))
            .fill(ui.visuals().extreme_bg_color)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(CHART_WIDTH - 24.0);
                ui.vertical(|ui| {
                    ui.label(
                        RichText::new(kind.title(&self.settings, span))
                            .size(15.0)
                            .strong(),
                    );
                    ui.add_space(6.0);
                    ui.push_id(kind.file_stem(), |ui| {
                        ChartPlotter::show(ui, kind, summary, theme, height);
                    });
                });
            });
    }
}
