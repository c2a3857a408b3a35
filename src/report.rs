//! Plain-text report for the `report` command.

use crate::stats::ImmigrationSummary;
use std::fmt::Write;

/// `1234567` -> `"1,234,567"`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn format_percent(value: f64) -> String {
    format!("{value:+.1}%")
}

/// Total, the top-N table and the growth statistics.
pub fn render_report(summary: &ImmigrationSummary, top: usize) -> String {
    let mut out = String::new();
    let kpis = &summary.kpis;

    let span = summary
        .year_span()
        .map(|(first, last)| format!(" ({first}-{last})"))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "Total immigrants to Canada{span}: {}",
        format_count(kpis.total_immigrants)
    );
    if let Some(year) = kpis.peak_year {
        let _ = writeln!(out, "Peak year: {year} ({})", format_count(kpis.peak_year_total));
    }

    let rows: Vec<&(String, u64)> = summary.top_countries.iter().take(top).collect();
    let _ = writeln!(out);
    let _ = writeln!(out, "Top {} source countries:", rows.len());
    let width = rows.iter().map(|(name, _)| name.chars().count()).max().unwrap_or(0).max(7);
    let _ = writeln!(out, "{:>4}  {:<width$}  {:>12}", "#", "Country", "Immigrants");
    for (rank, (name, total)) in rows.iter().enumerate() {
        let _ = writeln!(out, "{:>4}  {:<width$}  {:>12}", rank + 1, name, format_count(*total));
    }

    if !summary.growth_stats.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Year-over-year growth of the top countries:");
        let width = summary
            .growth_stats
            .iter()
            .map(|s| s.country.chars().count())
            .max()
            .unwrap_or(0)
            .max(7);
        let _ = writeln!(
            out,
            "{:<width$}  {:>5}  {:>9}  {:>9}  {:>9}  {:>9}  {:>9}",
            "Country", "n", "mean", "median", "std", "min", "max"
        );
        for stats in &summary.growth_stats {
            let std = stats
                .std_dev
                .map(|s| format!("{s:.1}"))
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "{:<width$}  {:>5}  {:>9}  {:>9}  {:>9}  {:>9}  {:>9}",
                stats.country,
                stats.observations,
                format_percent(stats.mean),
                format_percent(stats.median),
                std,
                format_percent(stats.min),
                format_percent(stats.max),
            );
        }
    }
    out
}
