//! Summary Module
//! Computes every aggregate the report, chart export and dashboard consume.

use crate::config::AnalysisSettings;
use crate::data::TidyRecord;
use crate::stats::aggregator::{
    Aggregator, CountryTotals, CountryYearMatrix, DevTotals, GrowthSeries, RegionTotals,
    RegionYearMatrix, RegionYearTotals, SubRegionTotals, YearlyTotals,
};
use serde::Serialize;
use statrs::statistics::{Data, Median, Statistics};
use tracing::debug;

/// Headline figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_immigrants: u64,
    pub top_country: Option<String>,
    pub top_country_total: u64,
    pub peak_year: Option<i32>,
    pub peak_year_total: u64,
}

/// Descriptive statistics of one country's defined year-over-year growth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthStats {
    pub country: String,
    pub observations: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; `None` below two observations.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImmigrationSummary {
    pub kpis: Kpis,
    pub country_totals: CountryTotals,
    pub region_totals: RegionTotals,
    pub subregion_totals: SubRegionTotals,
    pub dev_totals: DevTotals,
    pub yearly_totals: YearlyTotals,
    pub region_year_totals: RegionYearTotals,
    pub region_year_matrix: RegionYearMatrix,
    /// Largest countries with their totals, descending.
    pub top_countries: Vec<(String, u64)>,
    /// Records of the trend countries, in tidy order.
    pub trend_records: Vec<TidyRecord>,
    /// Country x year matrix of the heatmap countries.
    pub heatmap: CountryYearMatrix,
    pub growth: GrowthSeries<String, i32>,
    pub growth_stats: Vec<GrowthStats>,
}

impl ImmigrationSummary {
    pub fn compute(records: &[TidyRecord], settings: &AnalysisSettings) -> Self {
        // The grouped sums are independent reads of the same slice.
        let (
            ((country_totals, region_totals), (subregion_totals, dev_totals)),
            (yearly_totals, region_year_totals),
        ) = rayon::join(
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || Aggregator::country_totals(records),
                            || Aggregator::region_totals(records),
                        )
                    },
                    || {
                        rayon::join(
                            || Aggregator::subregion_totals(records),
                            || Aggregator::dev_totals(records),
                        )
                    },
                )
            },
            || {
                rayon::join(
                    || Aggregator::yearly_totals(records),
                    || Aggregator::region_year_totals(records),
                )
            },
        );

        let kpis = Self::kpis(&country_totals, &yearly_totals);
        let region_year_matrix = Aggregator::pivot(records, |r| r.area_name.clone(), |r| r.year);

        let top_countries = Aggregator::top_n(&country_totals, settings.top_countries);

        let trend = Aggregator::top_countries(&country_totals, settings.trend_countries);
        let trend_records = Aggregator::top_countries_subset(records, &trend);

        let heatmap_names = Aggregator::top_countries(&country_totals, settings.heatmap_countries);
        let heatmap = Aggregator::pivot(
            &Aggregator::top_countries_subset(records, &heatmap_names),
            |r| r.country.clone(),
            |r| r.year,
        );

        let growth_names = Aggregator::top_countries(&country_totals, settings.growth_countries);
        let growth = Aggregator::percent_change(
            &Aggregator::top_countries_subset(records, &growth_names),
            |r| r.country.clone(),
            |r| r.year,
        );
        let growth_stats = Self::growth_stats(&growth);

        debug!(
            countries = country_totals.len(),
            regions = region_totals.len(),
            years = yearly_totals.len(),
            "computed summary"
        );

        Self {
            kpis,
            country_totals,
            region_totals,
            subregion_totals,
            dev_totals,
            yearly_totals,
            region_year_totals,
            region_year_matrix,
            top_countries,
            trend_records,
            heatmap,
            growth,
            growth_stats,
        }
    }

    fn kpis(countries: &CountryTotals, years: &YearlyTotals) -> Kpis {
        let (top_country, top_country_total) = countries
            .max_entry()
            .map(|(k, v)| (Some(k.clone()), v))
            .unwrap_or((None, 0));
        let (peak_year, peak_year_total) = years
            .max_entry()
            .map(|(k, v)| (Some(*k), v))
            .unwrap_or((None, 0));

        Kpis {
            total_immigrants: countries.total(),
            top_country,
            top_country_total,
            peak_year,
            peak_year_total,
        }
    }

    /// Per-country statistics over defined growth values, in series order.
    pub fn growth_stats(growth: &GrowthSeries<String, i32>) -> Vec<GrowthStats> {
        growth
            .groups()
            .into_iter()
            .filter_map(|country| {
                let values: Vec<f64> = growth
                    .for_group(country)
                    .filter_map(|p| p.growth)
                    .collect();
                if values.is_empty() {
                    return None;
                }

                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let std_dev = if values.len() > 1 {
                    Some(values.iter().std_dev())
                } else {
                    None
                };

                Some(GrowthStats {
                    country: country.clone(),
                    observations: values.len(),
                    mean: values.iter().mean(),
                    median: Data::new(values.clone()).median(),
                    std_dev,
                    min,
                    max,
                })
            })
            .collect()
    }

    /// First and last year present.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        let first = *self.yearly_totals.keys().next()?;
        let last = *self.yearly_totals.keys().last()?;
        Some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(country: &str, area: &str, dev: &str, year: i32, immigrants: u64) -> TidyRecord {
        TidyRecord::new(country, area, format!("{area} sub"), dev, year, immigrants)
    }

    fn records() -> Vec<TidyRecord> {
        vec![
            record("India", "Asia", "Developing regions", 1980, 100),
            record("India", "Asia", "Developing regions", 1981, 150),
            record("India", "Asia", "Developing regions", 1982, 300),
            record("France", "Europe", "Developed regions", 1980, 40),
            record("France", "Europe", "Developed regions", 1981, 20),
            record("France", "Europe", "Developed regions", 1982, 20),
            record("Fiji", "Oceania", "Developing regions", 1980, 0),
            record("Fiji", "Oceania", "Developing regions", 1981, 0),
            record("Fiji", "Oceania", "Developing regions", 1982, 5),
        ]
    }

    fn settings() -> AnalysisSettings {
        AnalysisSettings {
            top_countries: 2,
            trend_countries: 2,
            heatmap_countries: 3,
            growth_countries: 3,
        }
    }

    #[test]
    fn kpis_pick_top_country_and_peak_year() {
        let summary = ImmigrationSummary::compute(&records(), &settings());
        assert_eq!(summary.kpis.total_immigrants, 635);
        assert_eq!(summary.kpis.top_country.as_deref(), Some("India"));
        assert_eq!(summary.kpis.top_country_total, 550);
        assert_eq!(summary.kpis.peak_year, Some(1982));
        assert_eq!(summary.kpis.peak_year_total, 325);
        assert_eq!(summary.year_span(), Some((1980, 1982)));
    }

    #[test]
    fn every_dimension_sums_to_the_total() {
        let summary = ImmigrationSummary::compute(&records(), &settings());
        let total = summary.kpis.total_immigrants;
        assert_eq!(summary.region_totals.total(), total);
        assert_eq!(summary.subregion_totals.total(), total);
        assert_eq!(summary.dev_totals.total(), total);
        assert_eq!(summary.yearly_totals.total(), total);
        assert_eq!(summary.region_year_totals.total(), total);
        assert_eq!(summary.region_year_matrix.total(), total);
    }

    #[test]
    fn selections_follow_settings() {
        let summary = ImmigrationSummary::compute(&records(), &settings());
        assert_eq!(summary.top_countries.len(), 2);
        assert_eq!(summary.trend_records.len(), 6);
        assert_eq!(summary.heatmap.rows(), ["Fiji", "France", "India"]);
        assert_eq!(summary.growth.groups().len(), 3);
    }

    #[test]
    fn growth_stats_skip_undefined_values() {
        let summary = ImmigrationSummary::compute(&records(), &settings());
        let india = summary
            .growth_stats
            .iter()
            .find(|s| s.country == "India")
            .unwrap();
        assert_eq!(india.observations, 2);
        assert!((india.mean - 75.0).abs() < 1e-9);
        assert!((india.median - 75.0).abs() < 1e-9);
        assert_eq!(india.min, 50.0);
        assert_eq!(india.max, 100.0);
        assert!(india.std_dev.is_some());

        // Fiji only grows from zero, which is undefined.
        assert!(summary.growth_stats.iter().all(|s| s.country != "Fiji"));
    }

    #[test]
    fn empty_input_yields_empty_summary() {
        let summary = ImmigrationSummary::compute(&[], &settings());
        assert_eq!(summary.kpis.total_immigrants, 0);
        assert_eq!(summary.kpis.top_country, None);
        assert!(summary.heatmap.is_empty());
        assert_eq!(summary.year_span(), None);
    }
}
