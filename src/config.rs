//! Application configuration.
//! Every field has a default matching the Canada by Citizenship workbook, so an
//! empty (or absent) JSON file yields a working setup.

use crate::charts::ChartTheme;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid year range {first}..={last}")]
    YearRange { first: i32, last: i32 },
}

/// Where the raw table lives and how its columns are named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSchema {
    pub path: PathBuf,
    /// Sheet name for workbook sources; ignored for CSV.
    pub sheet: Option<String>,
    /// Zero-based index of the header row inside the sheet.
    pub header_row: usize,
    pub identity_column: String,
    pub area_column: String,
    pub region_column: String,
    pub dev_column: String,
    pub first_year: i32,
    pub last_year: i32,
    pub sentinels: Vec<String>,
}

impl Default for SourceSchema {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/Canada.xlsx"),
            sheet: Some("Canada by Citizenship (2)".to_string()),
            header_row: 0,
            identity_column: "OdName".to_string(),
            area_column: "AreaName".to_string(),
            region_column: "RegName".to_string(),
            dev_column: "DevName".to_string(),
            first_year: 1980,
            last_year: 2013,
            sentinels: vec!["Unknown".to_string(), "World".to_string()],
        }
    }
}

impl SourceSchema {
    pub fn years(&self) -> RangeInclusive<i32> {
        self.first_year..=self.last_year
    }

    pub fn year_columns(&self) -> Vec<String> {
        self.years().map(|year| year.to_string()).collect()
    }

    pub fn attribute_columns(&self) -> [&str; 3] {
        [&self.area_column, &self.region_column, &self.dev_column]
    }

    /// Identity, attributes, then years ascending.
    pub fn required_columns(&self) -> Vec<String> {
        let mut columns = vec![self.identity_column.clone()];
        columns.extend(self.attribute_columns().iter().map(|c| c.to_string()));
        columns.extend(self.year_columns());
        columns
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_year > self.last_year {
            return Err(ConfigError::YearRange {
                first: self.first_year,
                last: self.last_year,
            });
        }
        Ok(())
    }
}

/// Sizes of the derived top-N selections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub top_countries: usize,
    pub trend_countries: usize,
    pub heatmap_countries: usize,
    pub growth_countries: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            top_countries: 10,
            trend_countries: 10,
            heatmap_countries: 20,
            growth_countries: 5,
        }
    }
}

impl AnalysisSettings {
    /// The dashboard shows fewer trend lines than the export.
    pub fn for_dashboard(&self) -> Self {
        Self {
            trend_countries: self.trend_countries.min(5),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub out_dir: PathBuf,
    /// Page width in pixels; each chart has its own height.
    pub width: u32,
    pub png: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("charts"),
            width: 1000,
            png: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceSchema,
    pub analysis: AnalysisSettings,
    pub export: ExportSettings,
    pub theme: ChartTheme,
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.source.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
