//! Canadian immigration statistics.
//!
//! Loads the wide country-by-year table, reshapes it into tidy records,
//! aggregates them, and presents the results as a text report, a set of
//! HTML chart pages, or an interactive dashboard.

pub mod charts;
pub mod config;
pub mod data;
pub mod gui;
pub mod pipeline;
pub mod report;
pub mod stats;

pub use config::AppConfig;
pub use pipeline::{Analysis, PipelineError};
