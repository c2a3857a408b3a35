//! Normalizer Module
//! Turns the wide source table into tidy (country, year, immigrants) records.

use crate::config::SourceSchema;
use crate::data::{RawTable, TidyRecord};
use polars::prelude::*;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Column name the identity column is renamed to.
pub const COUNTRY: &str = "Country";

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("Column '{column}', row {row}: cannot read {value:?} as a non-negative integer")]
    TypeCoercion {
        column: String,
        row: usize,
        value: String,
    },
}

/// Column selection, relabeling, sentinel removal and melting.
pub struct Normalizer;

impl Normalizer {
    /// Run every step in order: select, rename, exclude sentinels, melt.
    pub fn normalize(
        table: &RawTable,
        schema: &SourceSchema,
    ) -> Result<Vec<TidyRecord>, NormalizeError> {
        let selected = Self::select_columns(table, schema)?;
        let renamed = Self::rename_identity(selected, &schema.identity_column)?;
        let kept = Self::exclude_sentinels(renamed, &schema.sentinels)?;
        let records = Self::melt(&kept, schema)?;

        info!(
            entities = kept.height(),
            years = schema.years().count(),
            records = records.len(),
            "normalized source table"
        );
        Ok(records)
    }

    /// Keep identity, area, region, development and year columns only.
    pub fn select_columns(
        table: &RawTable,
        schema: &SourceSchema,
    ) -> Result<DataFrame, NormalizeError> {
        let present: HashSet<String> = table.column_names().into_iter().collect();
        let wanted = schema.required_columns();
        let missing: Vec<&str> = wanted
            .iter()
            .filter(|name| !present.contains(*name))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(NormalizeError::Schema(format!(
                "missing columns: {}",
                missing.join(", ")
            )));
        }

        debug!(
            dropped = table.frame().width() - wanted.len(),
            "selecting relevant columns"
        );
        Ok(table.frame().select(wanted)?)
    }

    /// Relabel the identity column as `Country`.
    pub fn rename_identity(
        mut df: DataFrame,
        identity_column: &str,
    ) -> Result<DataFrame, NormalizeError> {
        if identity_column != COUNTRY {
            df.rename(identity_column, COUNTRY.into())?;
            // polars 0.46 `rename` leaves the cached schema stale.
            df.clear_schema();
        }
        Ok(df)
    }

    /// Drop rows whose country is one of `sentinels` (and rows with no country).
    /// Country names are trimmed first, so `"World "` is still a sentinel.
    pub fn exclude_sentinels(
        df: DataFrame,
        sentinels: &[String],
    ) -> Result<DataFrame, NormalizeError> {
        let before = df.height();
        let trimmed = df
            .lazy()
            .with_column(
                col(COUNTRY)
                    .cast(DataType::String)
                    .str()
                    .strip_chars(lit(NULL))
                    .alias(COUNTRY),
            )
            .collect()?;

        let unnamed = trimmed
            .column(COUNTRY)?
            .str()?
            .into_iter()
            .filter(|name| name.map_or(true, str::is_empty))
            .count();
        if unnamed > 0 {
            warn!(rows = unnamed, "dropping rows without a country name");
        }

        let named = col(COUNTRY).is_not_null().and(col(COUNTRY).neq(lit("")));
        let predicate = sentinels.iter().fold(named, |acc, sentinel| {
            acc.and(col(COUNTRY).neq(lit(sentinel.trim())))
        });
        let filtered = trimmed.lazy().filter(predicate).collect()?;

        debug!(
            removed = before - filtered.height(),
            "excluded sentinel rows"
        );
        Ok(filtered)
    }

    /// Wide to long: rows in source order, then years ascending.
    pub fn melt(df: &DataFrame, schema: &SourceSchema) -> Result<Vec<TidyRecord>, NormalizeError> {
        let countries = Self::text_values(df, COUNTRY)?;
        let areas = Self::text_values(df, &schema.area_column)?;
        let regions = Self::text_values(df, &schema.region_column)?;
        let devs = Self::text_values(df, &schema.dev_column)?;

        let years: Vec<(i32, Vec<u64>)> = schema
            .years()
            .map(|year| Ok((year, Self::count_values(df, &year.to_string())?)))
            .collect::<Result<_, NormalizeError>>()?;

        let mut records = Vec::with_capacity(df.height() * years.len());
        for row in 0..df.height() {
            for (year, counts) in &years {
                records.push(TidyRecord {
                    country: countries[row].clone(),
                    area_name: areas[row].clone(),
                    reg_name: regions[row].clone(),
                    dev_name: devs[row].clone(),
                    year: *year,
                    immigrants: counts[row],
                });
            }
        }
        Ok(records)
    }

    fn text_values(df: &DataFrame, name: &str) -> Result<Vec<String>, NormalizeError> {
        let column = df.column(name)?.cast(&DataType::String)?;
        let ca = column.str()?;
        Ok(ca
            .into_iter()
            .map(|v| v.unwrap_or_default().trim().to_string())
            .collect())
    }

    /// Cell values of a year column; missing cells count as 0.
    fn count_values(df: &DataFrame, name: &str) -> Result<Vec<u64>, NormalizeError> {
        let column = df.column(name)?;
        match column.dtype() {
            DataType::String => {
                let ca = column.str()?;
                ca.into_iter()
                    .enumerate()
                    .map(|(row, v)| match v {
                        Some(text) => Self::parse_count(name, row, text),
                        None => Ok(0),
                    })
                    .collect()
            }
            DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => {
                let as_f64 = column.cast(&DataType::Float64)?;
                let ca = as_f64.f64()?;
                ca.into_iter()
                    .enumerate()
                    .map(|(row, v)| match v {
                        Some(value) => Self::coerce_count(name, row, value),
                        None => Ok(0),
                    })
                    .collect()
            }
            DataType::Null => Ok(vec![0; df.height()]),
            other => Err(NormalizeError::TypeCoercion {
                column: name.to_string(),
                row: 0,
                value: format!("<{other} column>"),
            }),
        }
    }

    fn coerce_count(column: &str, row: usize, value: f64) -> Result<u64, NormalizeError> {
        if value.is_nan() {
            return Ok(0);
        }
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
            Ok(value as u64)
        } else {
            Err(NormalizeError::TypeCoercion {
                column: column.to_string(),
                row,
                value: value.to_string(),
            })
        }
    }

    fn parse_count(column: &str, row: usize, text: &str) -> Result<u64, NormalizeError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(0);
        }
        if let Ok(count) = trimmed.parse::<u64>() {
            return Ok(count);
        }
        match trimmed.parse::<f64>() {
            Ok(value) if !value.is_nan() => Self::coerce_count(column, row, value),
            _ => Err(NormalizeError::TypeCoercion {
                column: column.to_string(),
                row,
                value: trimmed.to_string(),
            }),
        }
    }
}
