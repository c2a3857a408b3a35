//! Load -> normalize -> summarize, shared by every entry point.

use crate::config::AppConfig;
use crate::data::{DataLoader, LoaderError, NormalizeError, Normalizer, RawTable, TidyRecord};
use crate::stats::ImmigrationSummary;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, info_span};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("load stage failed: {0}")]
    Load(#[from] LoaderError),
    #[error("normalize stage failed: {0}")]
    Normalize(#[from] NormalizeError),
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub source: PathBuf,
    pub records: Vec<TidyRecord>,
    pub summary: ImmigrationSummary,
}

/// Read the configured source and compute the full summary.
pub fn run(config: &AppConfig) -> Result<Analysis, PipelineError> {
    let table = {
        let _span = info_span!("load", source = %config.source.path.display()).entered();
        DataLoader::load(&config.source.path, &config.source)?
    };
    analyze(&table, config)
}

/// Normalize an already loaded table and summarize it.
pub fn analyze(table: &RawTable, config: &AppConfig) -> Result<Analysis, PipelineError> {
    let records = {
        let _span = info_span!("normalize").entered();
        Normalizer::normalize(table, &config.source)?
    };

    let summary = {
        let _span = info_span!("aggregate", records = records.len()).entered();
        ImmigrationSummary::compute(&records, &config.analysis)
    };

    info!(
        total = summary.kpis.total_immigrants,
        countries = summary.country_totals.len(),
        "pipeline complete"
    );
    Ok(Analysis {
        source: table.source().to_path_buf(),
        records,
        summary,
    })
}
