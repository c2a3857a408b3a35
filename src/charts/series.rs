//! Plot-ready series derived from the summary, shared by both renderers.

use crate::stats::{Aggregator, ImmigrationSummary};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// A named (year, value) polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub name: String,
    pub points: Vec<(i32, f64)>,
}

impl NamedSeries {
    pub fn max_value(&self) -> f64 {
        self.points.iter().map(|p| p.1).fold(f64::MIN, f64::max)
    }

    pub fn min_value(&self) -> f64 {
        self.points.iter().map(|p| p.1).fold(f64::MAX, f64::min)
    }
}

/// Yearly totals as a single series.
pub fn yearly_series(summary: &ImmigrationSummary) -> Vec<(i32, f64)> {
    summary
        .yearly_totals
        .iter()
        .map(|(year, total)| (*year, total as f64))
        .collect()
}

/// One series per trend country, largest total first.
pub fn trend_series(summary: &ImmigrationSummary) -> Vec<NamedSeries> {
    let mut by_country: BTreeMap<&str, Vec<(i32, f64)>> = BTreeMap::new();
    for record in &summary.trend_records {
        by_country
            .entry(record.country.as_str())
            .or_default()
            .push((record.year, record.immigrants as f64));
    }

    let mut series: Vec<NamedSeries> = by_country
        .into_iter()
        .map(|(name, mut points)| {
            points.sort_by_key(|p| p.0);
            NamedSeries {
                name: name.to_string(),
                points,
            }
        })
        .collect();
    series.sort_by_key(|s| Reverse(summary.country_totals.get(&s.name).unwrap_or(0)));
    series
}

/// Defined growth values per country; undefined points are dropped.
pub fn growth_series(summary: &ImmigrationSummary) -> Vec<NamedSeries> {
    let mut series: Vec<NamedSeries> = summary
        .growth
        .groups()
        .into_iter()
        .map(|country| NamedSeries {
            name: country.clone(),
            points: summary
                .growth
                .for_group(country)
                .filter_map(|p| p.growth.map(|g| (p.order, g)))
                .collect(),
        })
        .collect();
    series.sort_by_key(|s| Reverse(summary.country_totals.get(&s.name).unwrap_or(0)));
    series
}

/// Cumulative region layers, bottom layer first. Each layer's points are the
/// top edge of its band; the band below it is the previous layer.
pub fn stacked_region_layers(summary: &ImmigrationSummary) -> Vec<NamedSeries> {
    let matrix = &summary.region_year_matrix;
    let mut running = vec![0u64; matrix.columns().len()];
    matrix
        .rows()
        .iter()
        .zip(matrix.cells())
        .map(|(area, cells)| {
            for (acc, value) in running.iter_mut().zip(cells) {
                *acc += value;
            }
            NamedSeries {
                name: area.clone(),
                points: matrix
                    .columns()
                    .iter()
                    .zip(&running)
                    .map(|(year, acc)| (*year, *acc as f64))
                    .collect(),
            }
        })
        .collect()
}

/// Top countries ascending, so the largest bar is drawn last (on top).
pub fn top_country_bars(summary: &ImmigrationSummary) -> Vec<(String, u64)> {
    let mut bars = summary.top_countries.clone();
    bars.reverse();
    bars
}

/// Heatmap rows in pivot order (countries ascending), top row first.
pub fn heatmap_rows(summary: &ImmigrationSummary) -> Vec<(&str, &[u64])> {
    let matrix = &summary.heatmap;
    matrix
        .rows()
        .iter()
        .zip(matrix.cells())
        .map(|(name, cells)| (name.as_str(), cells.as_slice()))
        .collect()
}

/// Every country, largest first (treemap order).
pub fn treemap_entries(summary: &ImmigrationSummary) -> Vec<(String, u64)> {
    Aggregator::top_n(&summary.country_totals, summary.country_totals.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisSettings;
    use crate::data::TidyRecord;

    fn summary() -> ImmigrationSummary {
        let records = vec![
            TidyRecord::new("India", "Asia", "S", "Developing regions", 1980, 10),
            TidyRecord::new("India", "Asia", "S", "Developing regions", 1981, 20),
            TidyRecord::new("Chile", "Latin America", "S", "Developing regions", 1980, 1),
            TidyRecord::new("Chile", "Latin America", "S", "Developing regions", 1981, 0),
            TidyRecord::new("Japan", "Asia", "E", "Developed regions", 1980, 0),
            TidyRecord::new("Japan", "Asia", "E", "Developed regions", 1981, 4),
        ];
        ImmigrationSummary::compute(&records, &AnalysisSettings::default())
    }

    #[test]
    fn stacked_layers_accumulate() {
        let layers = stacked_region_layers(&summary());
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].name, "Asia");
        assert_eq!(layers[0].points, vec![(1980, 10.0), (1981, 24.0)]);
        assert_eq!(layers[1].points, vec![(1980, 11.0), (1981, 24.0)]);
    }

    #[test]
    fn trend_series_ordered_by_total() {
        let names: Vec<String> = trend_series(&summary()).into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["India", "Japan", "Chile"]);
    }

    #[test]
    fn growth_series_drops_undefined_points() {
        let series = growth_series(&summary());
        let india = series.iter().find(|s| s.name == "India").unwrap();
        assert_eq!(india.points, vec![(1981, 100.0)]);
        let japan = series.iter().find(|s| s.name == "Japan").unwrap();
        assert!(japan.points.is_empty());
    }

    #[test]
    fn heatmap_rows_are_alphabetical() {
        let s = summary();
        let names: Vec<&str> = heatmap_rows(&s).into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["Chile", "India", "Japan"]);
        assert_eq!(heatmap_rows(&s)[1].1, [10, 20]);
    }

    #[test]
    fn bars_and_treemap_orders() {
        let s = summary();
        let bars = top_country_bars(&s);
        assert_eq!(bars.last().map(|b| b.0.as_str()), Some("India"));
        let tiles = treemap_entries(&s);
        assert_eq!(tiles.first().map(|t| t.1), Some(30));
        assert_eq!(tiles.len(), 3);
    }
}
