//! Data module - source loading and tidy normalization

mod loader;
mod normalizer;
mod record;

pub use loader::{DataLoader, LoaderError, RawTable};
pub use normalizer::{NormalizeError, Normalizer, COUNTRY};
pub use record::TidyRecord;
