//! Stats module - aggregation over tidy records

mod aggregator;
mod summary;

pub use aggregator::{
    AggregateResult, Aggregator, CountryTotals, CountryYearMatrix, DevTotals, GrowthPoint,
    GrowthSeries, PivotMatrix, RegionTotals, RegionYearMatrix, RegionYearTotals,
    SubRegionTotals, YearlyTotals,
};
pub use summary::{GrowthStats, ImmigrationSummary, Kpis};
