//! Source Table Loader Module
//! Reads the wide country-by-year table from an Excel sheet (calamine) or a CSV
//! file (Polars) into a `RawTable`.

use crate::config::SourceSchema;
use calamine::{open_workbook_auto, DataType as Cell, Range, Reader};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("Sheet '{sheet}' not found in {} (available: {available})", .path.display())]
    MissingSheet {
        path: PathBuf,
        sheet: String,
        available: String,
    },
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("Failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("Failed to load CSV: {0}")]
    Polars(#[from] PolarsError),
}

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// The source table as read, one row per entity.
#[derive(Debug, Clone)]
pub struct RawTable {
    frame: DataFrame,
    source: PathBuf,
    sheet: Option<String>,
}

impl RawTable {
    pub fn new(frame: DataFrame, source: impl Into<PathBuf>, sheet: Option<String>) -> Self {
        Self {
            frame,
            source: source.into(),
            sheet,
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// Loads source tables and checks them against the expected schema.
pub struct DataLoader;

impl DataLoader {
    /// Load `path` and verify that every identifying column and every year
    /// column of the configured range is present.
    pub fn load(path: &Path, schema: &SourceSchema) -> Result<RawTable, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::SourceNotFound(path.to_path_buf()));
        }

        let table = if Self::is_workbook(path) {
            let sheet = schema.sheet.clone().ok_or_else(|| {
                LoaderError::Schema(format!(
                    "workbook {} needs a sheet name",
                    path.display()
                ))
            })?;
            let frame = Self::read_sheet(path, &sheet, schema.header_row)?;
            RawTable::new(frame, path, Some(sheet))
        } else {
            RawTable::new(Self::read_csv(path)?, path, None)
        };

        Self::validate(&table, schema)?;
        info!(
            source = %path.display(),
            sheet = table.sheet().unwrap_or("-"),
            rows = table.height(),
            columns = table.frame().width(),
            "loaded source table"
        );
        Ok(table)
    }

    pub fn is_workbook(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                WORKBOOK_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Load a CSV file using Polars.
    pub fn read_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(None)
            .finish()?
            .collect()?;
        Ok(df)
    }

    /// Sheet names of a workbook, in workbook order.
    pub fn sheet_names(path: &Path) -> Result<Vec<String>, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::SourceNotFound(path.to_path_buf()));
        }
        let workbook = open_workbook_auto(path)?;
        Ok(workbook.sheet_names().to_vec())
    }

    /// Read one sheet of a workbook; the row at `header_row` names the columns.
    pub fn read_sheet(path: &Path, sheet: &str, header_row: usize) -> Result<DataFrame, LoaderError> {
        let mut workbook = open_workbook_auto(path)?;
        let range = match workbook.worksheet_range(sheet) {
            Some(range) => range?,
            None => {
                return Err(LoaderError::MissingSheet {
                    path: path.to_path_buf(),
                    sheet: sheet.to_string(),
                    available: workbook.sheet_names().join(", "),
                })
            }
        };
        Self::frame_from_range(&range, header_row)
    }

    fn frame_from_range(range: &Range<Cell>, header_row: usize) -> Result<DataFrame, LoaderError> {
        let mut rows = range.rows().skip(header_row);
        let header: Vec<String> = rows
            .next()
            .ok_or_else(|| LoaderError::Schema(format!("sheet has no header row at {header_row}")))?
            .iter()
            .map(Self::header_name)
            .collect();
        let body: Vec<&[Cell]> = rows.collect();

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(header.len());
        for (idx, name) in header.iter().enumerate() {
            // Blank and repeated headers cannot become DataFrame columns.
            if name.is_empty() || !seen.insert(name.as_str()) {
                debug!(column = idx, name = %name, "skipping unnamed or duplicate column");
                continue;
            }
            let cells: Vec<&Cell> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&Cell::Empty))
                .collect();
            let column = if name.parse::<i32>().is_ok() {
                Self::count_column(name, &cells)
            } else {
                Self::text_column(name, &cells)
            };
            columns.push(column);
        }

        Ok(DataFrame::new(columns)?)
    }

    fn header_name(cell: &Cell) -> String {
        match cell {
            Cell::Float(value) if value.fract() == 0.0 => format!("{}", *value as i64),
            Cell::Int(value) => value.to_string(),
            Cell::String(value) => value.trim().to_string(),
            Cell::Empty => String::new(),
            other => other.to_string(),
        }
    }

    /// Numeric when every cell is a number or empty; otherwise the raw text is
    /// kept so coercion can report the offending cell.
    fn count_column(name: &str, cells: &[&Cell]) -> Column {
        let numeric: Option<Vec<Option<f64>>> = cells
            .iter()
            .map(|cell| match cell {
                Cell::Int(value) => Some(Some(*value as f64)),
                Cell::Float(value) => Some(Some(*value)),
                Cell::Empty => Some(None),
                _ => None,
            })
            .collect();

        match numeric {
            Some(values) => Column::new(name.into(), values),
            None => Self::text_column(name, cells),
        }
    }

    fn text_column(name: &str, cells: &[&Cell]) -> Column {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|cell| match cell {
                Cell::Empty => None,
                Cell::String(value) => Some(value.clone()),
                Cell::Float(value) if value.fract() == 0.0 => Some(format!("{}", *value as i64)),
                other => Some(other.to_string()),
            })
            .collect();
        Column::new(name.into(), values)
    }

    /// Check identifying columns and the full year range.
    pub fn validate(table: &RawTable, schema: &SourceSchema) -> Result<(), LoaderError> {
        let present: HashSet<String> = table.column_names().into_iter().collect();
        let missing: Vec<String> = schema
            .required_columns()
            .into_iter()
            .filter(|name| !present.contains(name))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(LoaderError::Schema(format!(
                "{} is missing columns: {}",
                table.source().display(),
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn schema_for(path: &Path, first_year: i32, last_year: i32) -> SourceSchema {
        SourceSchema {
            path: path.to_path_buf(),
            sheet: None,
            first_year,
            last_year,
            ..SourceSchema::default()
        }
    }

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_csv_with_all_columns() {
        let file = write_csv(
            "OdName,AreaName,RegName,DevName,Type,1980,1981\n\
             India,Asia,Southern Asia,Developing regions,Immigrants,8880,8670\n\
             Fiji,Oceania,Melanesia,Developing regions,Immigrants,,51\n",
        );
        let schema = schema_for(file.path(), 1980, 1981);

        let table = DataLoader::load(file.path(), &schema).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.sheet(), None);
        assert!(table.column_names().contains(&"Type".to_string()));
    }

    #[test]
    fn missing_file_is_reported() {
        let schema = SourceSchema::default();
        let err = DataLoader::load(Path::new("does/not/exist.xlsx"), &schema).unwrap_err();
        assert!(matches!(err, LoaderError::SourceNotFound(_)));
    }

    #[test]
    fn missing_year_column_is_a_schema_error() {
        let file = write_csv(
            "OdName,AreaName,RegName,DevName,1980\n\
             India,Asia,Southern Asia,Developing regions,8880\n",
        );
        let schema = schema_for(file.path(), 1980, 1981);

        let err = DataLoader::load(file.path(), &schema).unwrap_err();
        match err {
            LoaderError::Schema(message) => assert!(message.contains("1981")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_identity_column_is_a_schema_error() {
        let file = write_csv("Country,AreaName,RegName,DevName,1980\nIndia,Asia,S,D,1\n");
        let schema = schema_for(file.path(), 1980, 1980);

        let err = DataLoader::load(file.path(), &schema).unwrap_err();
        assert!(matches!(err, LoaderError::Schema(message) if message.contains("OdName")));
    }

    #[test]
    fn workbook_headers_are_normalised() {
        assert_eq!(DataLoader::header_name(&Cell::Float(1980.0)), "1980");
        assert_eq!(DataLoader::header_name(&Cell::Int(2013)), "2013");
        assert_eq!(
            DataLoader::header_name(&Cell::String(" OdName ".to_string())),
            "OdName"
        );
        assert_eq!(DataLoader::header_name(&Cell::Empty), "");
    }

    #[test]
    fn workbook_count_columns_fall_back_to_text() {
        let numeric = [Cell::Int(4), Cell::Empty, Cell::Float(2.0)];
        let refs: Vec<&Cell> = numeric.iter().collect();
        let column = DataLoader::count_column("1980", &refs);
        assert_eq!(column.dtype(), &DataType::Float64);
        assert_eq!(column.null_count(), 1);

        let mixed = [Cell::Int(4), Cell::String("..".to_string())];
        let refs: Vec<&Cell> = mixed.iter().collect();
        let column = DataLoader::count_column("1981", &refs);
        assert_eq!(column.dtype(), &DataType::String);
    }

    #[test]
    fn sheet_range_becomes_a_frame() {
        let mut range: Range<Cell> = Range::new((0, 0), (3, 7));
        range.set_value((0, 0), Cell::String("Immigration to Canada".to_string()));
        let header = [
            Cell::String("OdName".to_string()),
            Cell::String("AreaName".to_string()),
            Cell::Empty,
            Cell::String("RegName".to_string()),
            Cell::String("DevName".to_string()),
            Cell::Float(1980.0),
            Cell::Float(1981.0),
            Cell::String("AreaName".to_string()),
        ];
        for (col, cell) in header.into_iter().enumerate() {
            range.set_value((1, col as u32), cell);
        }
        let india = [
            Cell::String("India".to_string()),
            Cell::String("Asia".to_string()),
            Cell::String("note".to_string()),
            Cell::String("Southern Asia".to_string()),
            Cell::String("Developing regions".to_string()),
            Cell::Float(8880.0),
            Cell::Float(8670.0),
            Cell::String("repeated".to_string()),
        ];
        for (col, cell) in india.into_iter().enumerate() {
            range.set_value((2, col as u32), cell);
        }
        range.set_value((3, 0), Cell::String("Fiji".to_string()));
        range.set_value((3, 1), Cell::String("Oceania".to_string()));
        range.set_value((3, 3), Cell::String("Melanesia".to_string()));
        range.set_value((3, 4), Cell::String("Developing regions".to_string()));
        range.set_value((3, 6), Cell::String("..".to_string()));

        let df = DataLoader::frame_from_range(&range, 1).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, ["OdName", "AreaName", "RegName", "DevName", "1980", "1981"]);
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("1980").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("1980").unwrap().null_count(), 1);
        assert_eq!(df.column("1981").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("AreaName").unwrap().str().unwrap().get(0), Some("Asia"));
    }

    fn write_workbook(sheet: &str) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet).unwrap();
        worksheet.write_string(0, 0, "Canada by Citizenship").unwrap();
        for (col, name) in ["OdName", "AreaName", "RegName", "DevName"].iter().enumerate() {
            worksheet.write_string(1, col as u16, *name).unwrap();
        }
        worksheet.write_number(1, 4, 1980.0).unwrap();
        worksheet.write_number(1, 5, 1981.0).unwrap();
        for (col, value) in ["India", "Asia", "Southern Asia", "Developing regions"].iter().enumerate() {
            worksheet.write_string(2, col as u16, *value).unwrap();
        }
        worksheet.write_number(2, 4, 8880.0).unwrap();
        worksheet.write_number(2, 5, 8670.0).unwrap();
        workbook.save(file.path()).unwrap();
        file
    }

    #[test]
    fn loads_workbook_sheet_below_title_row() {
        let file = write_workbook("Canada by Citizenship (2)");
        let schema = SourceSchema {
            sheet: Some("Canada by Citizenship (2)".to_string()),
            header_row: 1,
            ..schema_for(file.path(), 1980, 1981)
        };

        let table = DataLoader::load(file.path(), &schema).unwrap();
        assert_eq!(table.height(), 1);
        assert_eq!(table.sheet(), Some("Canada by Citizenship (2)"));
        assert_eq!(table.frame().column("1981").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn missing_sheet_names_the_available_ones() {
        let file = write_workbook("Notes");
        let schema = SourceSchema {
            sheet: Some("Canada by Citizenship (2)".to_string()),
            ..schema_for(file.path(), 1980, 1981)
        };

        let err = DataLoader::load(file.path(), &schema).unwrap_err();
        match err {
            LoaderError::MissingSheet { sheet, available, .. } => {
                assert_eq!(sheet, "Canada by Citizenship (2)");
                assert_eq!(available, "Notes");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
