use serde::{Deserialize, Serialize};

/// One (country, year) observation in tidy form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TidyRecord {
    pub country: String,
    pub area_name: String,
    pub reg_name: String,
    pub dev_name: String,
    pub year: i32,
    pub immigrants: u64,
}

impl TidyRecord {
    pub fn new(
        country: impl Into<String>,
        area_name: impl Into<String>,
        reg_name: impl Into<String>,
        dev_name: impl Into<String>,
        year: i32,
        immigrants: u64,
    ) -> Self {
        Self {
            country: country.into(),
            area_name: area_name.into(),
            reg_name: reg_name.into(),
            dev_name: dev_name.into(),
            year,
            immigrants,
        }
    }
}
