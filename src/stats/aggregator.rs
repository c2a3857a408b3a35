//! Aggregator Module
//! Grouped sums, top-N selection, pivoting and year-over-year growth over tidy
//! records. Every operation is pure and deterministic.

use crate::data::TidyRecord;
use serde::ser::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Summed immigrant counts per key, iterated in ascending key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateResult<K: Ord> {
    totals: BTreeMap<K, u64>,
}

pub type CountryTotals = AggregateResult<String>;
pub type RegionTotals = AggregateResult<String>;
pub type SubRegionTotals = AggregateResult<String>;
pub type DevTotals = AggregateResult<String>;
pub type YearlyTotals = AggregateResult<i32>;
pub type RegionYearTotals = AggregateResult<(String, i32)>;

pub type RegionYearMatrix = PivotMatrix<String, i32>;
pub type CountryYearMatrix = PivotMatrix<String, i32>;

impl<K: Ord> Default for AggregateResult<K> {
    fn default() -> Self {
        Self {
            totals: BTreeMap::new(),
        }
    }
}

impl<K: Ord> FromIterator<(K, u64)> for AggregateResult<K> {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut totals = BTreeMap::new();
        for (key, value) in iter {
            *totals.entry(key).or_insert(0) += value;
        }
        Self { totals }
    }
}

impl<K: Ord + Clone> AggregateResult<K> {
    pub fn get(&self, key: &K) -> Option<u64> {
        self.totals.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> + '_ {
        self.totals.iter().map(|(k, v)| (k, *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.totals.keys()
    }

    pub fn total(&self) -> u64 {
        self.totals.values().sum()
    }

    /// Largest entry; on ties the smallest key wins.
    pub fn max_entry(&self) -> Option<(&K, u64)> {
        self.iter().fold(None, |best, (key, value)| match best {
            Some((_, best_value)) if best_value >= value => best,
            _ => Some((key, value)),
        })
    }

    /// Entries in key order.
    pub fn to_rows(&self) -> Vec<(K, u64)> {
        self.iter().map(|(k, v)| (k.clone(), v)).collect()
    }

    /// Entries ascending by value; equal values stay in key order.
    pub fn sorted_by_value(&self) -> Vec<(K, u64)> {
        let mut rows = self.to_rows();
        rows.sort_by_key(|(_, value)| *value);
        rows
    }
}

impl<K: Ord + Serialize> Serialize for AggregateResult<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.totals.iter())
    }
}

/// Dense two-dimensional cross tabulation; absent combinations hold 0.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PivotMatrix<R, C> {
    rows: Vec<R>,
    columns: Vec<C>,
    cells: Vec<Vec<u64>>,
}

impl<R: Ord + Clone, C: Ord + Clone> PivotMatrix<R, C> {
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn columns(&self) -> &[C] {
        &self.columns
    }

    pub fn cells(&self) -> &[Vec<u64>] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn row(&self, key: &R) -> Option<&[u64]> {
        let idx = self.rows.binary_search(key).ok()?;
        Some(&self.cells[idx])
    }

    pub fn get(&self, row: &R, column: &C) -> Option<u64> {
        let ci = self.columns.binary_search(column).ok()?;
        self.row(row).map(|cells| cells[ci])
    }

    /// (row, column, value) triples, row-major.
    pub fn flatten(&self) -> Vec<(R, C, u64)> {
        self.rows
            .iter()
            .zip(&self.cells)
            .flat_map(|(row, cells)| {
                self.columns
                    .iter()
                    .zip(cells)
                    .map(move |(column, value)| (row.clone(), column.clone(), *value))
            })
            .collect()
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }

    pub fn max_value(&self) -> u64 {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// One element of a growth series.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GrowthPoint<G, O> {
    pub group: G,
    pub order: O,
    pub value: u64,
    /// Percent change from the previous element of the same group. `None` for
    /// the first element and whenever the previous value is 0.
    pub growth: Option<f64>,
}

/// Growth points ordered by group, then by order key.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GrowthSeries<G, O> {
    points: Vec<GrowthPoint<G, O>>,
}

impl<G: PartialEq, O: PartialEq> GrowthSeries<G, O> {
    pub fn points(&self) -> &[GrowthPoint<G, O>] {
        &self.points
    }

    pub fn get(&self, group: &G, order: &O) -> Option<f64> {
        self.points
            .iter()
            .find(|p| &p.group == group && &p.order == order)
            .and_then(|p| p.growth)
    }

    /// Points with a defined growth value.
    pub fn defined(&self) -> impl Iterator<Item = &GrowthPoint<G, O>> + '_ {
        self.points.iter().filter(|p| p.growth.is_some())
    }

    pub fn for_group<'a>(&'a self, group: &'a G) -> impl Iterator<Item = &'a GrowthPoint<G, O>> + 'a {
        self.points.iter().filter(move |p| &p.group == group)
    }

    /// Distinct groups in series order.
    pub fn groups(&self) -> Vec<&G> {
        let mut groups: Vec<&G> = Vec::new();
        for point in &self.points {
            if groups.last() != Some(&&point.group) {
                groups.push(&point.group);
            }
        }
        groups
    }
}

/// Grouping and reshaping operations over tidy records.
pub struct Aggregator;

impl Aggregator {
    /// Sum immigrants per `key_fn` value.
    pub fn group_sum<K, F>(records: &[TidyRecord], key_fn: F) -> AggregateResult<K>
    where
        K: Ord,
        F: Fn(&TidyRecord) -> K,
    {
        records.iter().map(|r| (key_fn(r), r.immigrants)).collect()
    }

    /// The `n` largest entries, descending. Equal values keep ascending key
    /// order (stable sort over the grouping order).
    pub fn top_n<K: Ord + Clone>(agg: &AggregateResult<K>, n: usize) -> Vec<(K, u64)> {
        let mut rows = agg.to_rows();
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows.truncate(n);
        rows
    }

    /// Cross-tabulate summed immigrants; rows and columns are the distinct keys
    /// present, ascending.
    pub fn pivot<R, C, FR, FC>(records: &[TidyRecord], row_fn: FR, col_fn: FC) -> PivotMatrix<R, C>
    where
        R: Ord + Clone,
        C: Ord + Clone,
        FR: Fn(&TidyRecord) -> R,
        FC: Fn(&TidyRecord) -> C,
    {
        let sums: AggregateResult<(R, C)> = Self::group_sum(records, |r| (row_fn(r), col_fn(r)));
        let rows: Vec<R> = sums
            .keys()
            .map(|(r, _)| r.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let columns: Vec<C> = sums
            .keys()
            .map(|(_, c)| c.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut cells = vec![vec![0u64; columns.len()]; rows.len()];
        for ((row, column), value) in sums.iter() {
            if let (Ok(ri), Ok(ci)) = (rows.binary_search(row), columns.binary_search(column)) {
                cells[ri][ci] = value;
            }
        }

        PivotMatrix {
            rows,
            columns,
            cells,
        }
    }

    /// Percent change between consecutive elements of each group, ordered by
    /// `order_fn` ascending.
    pub fn percent_change<G, O, FG, FO>(
        records: &[TidyRecord],
        group_fn: FG,
        order_fn: FO,
    ) -> GrowthSeries<G, O>
    where
        G: Ord + Clone,
        O: Ord,
        FG: Fn(&TidyRecord) -> G,
        FO: Fn(&TidyRecord) -> O,
    {
        let mut groups: BTreeMap<G, Vec<(O, u64)>> = BTreeMap::new();
        for record in records {
            groups
                .entry(group_fn(record))
                .or_default()
                .push((order_fn(record), record.immigrants));
        }

        let mut points = Vec::with_capacity(records.len());
        for (group, mut values) in groups {
            values.sort_by(|a, b| a.0.cmp(&b.0));
            let mut previous: Option<u64> = None;
            for (order, value) in values {
                let growth = match previous {
                    Some(prev) if prev > 0 => {
                        Some((value as f64 - prev as f64) / prev as f64 * 100.0)
                    }
                    _ => None,
                };
                points.push(GrowthPoint {
                    group: group.clone(),
                    order,
                    value,
                    growth,
                });
                previous = Some(value);
            }
        }

        GrowthSeries { points }
    }

    pub fn country_totals(records: &[TidyRecord]) -> CountryTotals {
        Self::group_sum(records, |r| r.country.clone())
    }

    pub fn region_totals(records: &[TidyRecord]) -> RegionTotals {
        Self::group_sum(records, |r| r.area_name.clone())
    }

    pub fn subregion_totals(records: &[TidyRecord]) -> SubRegionTotals {
        Self::group_sum(records, |r| r.reg_name.clone())
    }

    pub fn dev_totals(records: &[TidyRecord]) -> DevTotals {
        Self::group_sum(records, |r| r.dev_name.clone())
    }

    pub fn yearly_totals(records: &[TidyRecord]) -> YearlyTotals {
        Self::group_sum(records, |r| r.year)
    }

    pub fn region_year_totals(records: &[TidyRecord]) -> RegionYearTotals {
        Self::group_sum(records, |r| (r.area_name.clone(), r.year))
    }

    /// Names of the `n` countries with the largest totals.
    pub fn top_countries(totals: &CountryTotals, n: usize) -> Vec<String> {
        Self::top_n(totals, n).into_iter().map(|(k, _)| k).collect()
    }

    /// Records whose country is in `countries`, in input order.
    pub fn top_countries_subset(records: &[TidyRecord], countries: &[String]) -> Vec<TidyRecord> {
        let wanted: HashSet<&str> = countries.iter().map(String::as_str).collect();
        records
            .iter()
            .filter(|r| wanted.contains(r.country.as_str()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(country: &str, area: &str, year: i32, immigrants: u64) -> TidyRecord {
        TidyRecord::new(country, area, "Sub", "Developing regions", year, immigrants)
    }

    fn sample() -> Vec<TidyRecord> {
        vec![
            record("India", "Asia", 1980, 100),
            record("India", "Asia", 1981, 300),
            record("China", "Asia", 1980, 200),
            record("China", "Asia", 1981, 200),
            record("France", "Europe", 1980, 50),
            record("France", "Europe", 1981, 0),
            record("Peru", "Latin America", 1981, 400),
        ]
    }

    #[test]
    fn group_sum_partitions_the_total() {
        let records = sample();
        let grand: u64 = records.iter().map(|r| r.immigrants).sum();

        let by_country = Aggregator::country_totals(&records);
        assert_eq!(by_country.len(), 4);
        assert_eq!(by_country.total(), grand);
        assert_eq!(by_country.get(&"India".to_string()), Some(400));

        let by_year = Aggregator::yearly_totals(&records);
        assert_eq!(by_year.to_rows(), vec![(1980, 350), (1981, 900)]);
        assert_eq!(Aggregator::region_totals(&records).total(), grand);
    }

    #[test]
    fn top_n_breaks_ties_by_key_order() {
        let totals = Aggregator::country_totals(&sample());
        // China, India and Peru all sum to 400.
        let top = Aggregator::top_n(&totals, 3);
        assert_eq!(
            top,
            vec![
                ("China".to_string(), 400),
                ("India".to_string(), 400),
                ("Peru".to_string(), 400),
            ]
        );

        let all = Aggregator::top_n(&totals, 10);
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn max_entry_prefers_first_key() {
        let totals = Aggregator::country_totals(&sample());
        assert_eq!(totals.max_entry(), Some((&"China".to_string(), 400)));
        assert_eq!(AggregateResult::<String>::default().max_entry(), None);
    }

    #[test]
    fn sorted_by_value_is_ascending() {
        let totals = Aggregator::region_totals(&sample());
        let sorted = totals.sorted_by_value();
        assert_eq!(sorted.first().map(|(k, _)| k.as_str()), Some("Europe"));
        assert!(sorted.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn pivot_fills_absent_cells_with_zero() {
        let records = sample();
        let matrix = Aggregator::pivot(&records, |r| r.country.clone(), |r| r.year);

        assert_eq!(matrix.rows(), ["China", "France", "India", "Peru"]);
        assert_eq!(matrix.columns(), [1980, 1981]);
        assert_eq!(matrix.get(&"Peru".to_string(), &1980), Some(0));
        assert_eq!(matrix.get(&"Peru".to_string(), &1981), Some(400));
        assert_eq!(matrix.get(&"Chile".to_string(), &1981), None);

        let flattened = matrix.flatten();
        assert_eq!(flattened.len(), 8);
        let grand: u64 = records.iter().map(|r| r.immigrants).sum();
        assert_eq!(flattened.iter().map(|(_, _, v)| v).sum::<u64>(), grand);
        assert_eq!(matrix.total(), grand);
        assert_eq!(matrix.max_value(), 400);
    }

    #[test]
    fn percent_change_of_two_year_series() {
        let records = vec![record("X", "A", 1981, 150), record("X", "A", 1980, 100)];
        let growth = Aggregator::percent_change(&records, |r| r.country.clone(), |r| r.year);

        assert_eq!(growth.get(&"X".to_string(), &1981), Some(50.0));
        assert_eq!(growth.get(&"X".to_string(), &1980), None);
        assert_eq!(growth.defined().count(), 1);
    }

    #[test]
    fn percent_change_after_zero_is_undefined() {
        let records = vec![
            record("France", "Europe", 1980, 0),
            record("France", "Europe", 1981, 10),
            record("France", "Europe", 1982, 5),
        ];
        let growth = Aggregator::percent_change(&records, |r| r.country.clone(), |r| r.year);

        let values: Vec<Option<f64>> = growth.points().iter().map(|p| p.growth).collect();
        assert_eq!(values, vec![None, None, Some(-50.0)]);
        assert!(growth.defined().all(|p| p.growth.map_or(false, f64::is_finite)));
    }

    #[test]
    fn growth_groups_are_sorted() {
        let growth = Aggregator::percent_change(&sample(), |r| r.country.clone(), |r| r.year);
        let groups: Vec<&str> = growth.groups().into_iter().map(String::as_str).collect();
        assert_eq!(groups, ["China", "France", "India", "Peru"]);
        assert_eq!(growth.for_group(&"India".to_string()).count(), 2);
    }

    #[test]
    fn subset_keeps_input_order() {
        let records = sample();
        let top = Aggregator::top_countries(&Aggregator::country_totals(&records), 2);
        assert_eq!(top, ["China", "India"]);

        let subset = Aggregator::top_countries_subset(&records, &top);
        let countries: Vec<&str> = subset.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(countries, ["India", "India", "China", "China"]);
    }

    #[test]
    fn aggregate_serializes_as_pairs() {
        let totals = Aggregator::region_year_totals(&sample()[..1]);
        let json = serde_json::to_string(&totals).unwrap();
        assert_eq!(json, r#"[[["Asia",1980],100]]"#);
    }
}
