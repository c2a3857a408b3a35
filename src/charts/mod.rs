//! Charts module - chart catalogue, static rendering and dashboard plots

mod export;
mod layout;
mod plotter;
mod renderer;
mod series;
mod theme;

pub use export::{ExportError, ExportReport, HtmlExporter};
pub use layout::{pie_wedges, squarify, Tile, Wedge};
pub use plotter::ChartPlotter;
pub use renderer::{RenderError, StaticChartRenderer};
pub use series::{
    growth_series, heatmap_rows, stacked_region_layers, top_country_bars, treemap_entries,
    trend_series, yearly_series, NamedSeries,
};
pub use theme::{contrast_text, ChartTheme, ColorScale, Rgb};

use crate::config::AnalysisSettings;

/// The fixed set of charts produced by the export and shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    TotalOverTime,
    TopCountries,
    ByRegion,
    DevelopedVsDeveloping,
    TopTrends,
    Heatmap,
    BySubRegion,
    GrowthRate,
    StackedRegion,
    Treemap,
}

impl ChartKind {
    pub const ALL: [ChartKind; 10] = [
        ChartKind::TotalOverTime,
        ChartKind::TopCountries,
        ChartKind::ByRegion,
        ChartKind::DevelopedVsDeveloping,
        ChartKind::TopTrends,
        ChartKind::Heatmap,
        ChartKind::BySubRegion,
        ChartKind::GrowthRate,
        ChartKind::StackedRegion,
        ChartKind::Treemap,
    ];

    /// Output file name without extension.
    pub fn file_stem(self) -> &'static str {
        match self {
            ChartKind::TotalOverTime => "1_total_immigration",
            ChartKind::TopCountries => "2_top10_countries",
            ChartKind::ByRegion => "3_by_region",
            ChartKind::DevelopedVsDeveloping => "4_developed_vs_developing",
            ChartKind::TopTrends => "5_top10_trends",
            ChartKind::Heatmap => "6_heatmap_top20",
            ChartKind::BySubRegion => "7_by_subregion",
            ChartKind::GrowthRate => "8_growth_rate",
            ChartKind::StackedRegion => "9_stacked_region",
            ChartKind::Treemap => "10_treemap",
        }
    }

    pub fn title(self, settings: &AnalysisSettings, span: Option<(i32, i32)>) -> String {
        let years = span
            .map(|(first, last)| format!(" ({first}-{last})"))
            .unwrap_or_default();
        match self {
            ChartKind::TotalOverTime => format!("Total Immigration to Canada{years}"),
            ChartKind::TopCountries => {
                format!("Top {} Source Countries{years}", settings.top_countries)
            }
            ChartKind::ByRegion => "Immigration by Region".to_string(),
            ChartKind::DevelopedVsDeveloping => "Developed vs. Developing Regions".to_string(),
            ChartKind::TopTrends => {
                format!("Immigration Trends: Top {} Countries", settings.trend_countries)
            }
            ChartKind::Heatmap => {
                format!("Heatmap: Top {} Countries by Year", settings.heatmap_countries)
            }
            ChartKind::BySubRegion => "Immigration by Sub-Region".to_string(),
            ChartKind::GrowthRate => format!(
                "Year-over-Year Growth Rate (%) - Top {} Countries",
                settings.growth_countries
            ),
            ChartKind::StackedRegion => "Immigration by Region Over Time (Stacked)".to_string(),
            ChartKind::Treemap => "Treemap: Immigration by Country (All)".to_string(),
        }
    }

    /// Preferred height in pixels; width comes from the export settings.
    pub fn height(self) -> u32 {
        match self {
            ChartKind::TopTrends | ChartKind::StackedRegion => 600,
            ChartKind::BySubRegion | ChartKind::Treemap => 700,
            ChartKind::Heatmap => 800,
            _ => 500,
        }
    }
}
