//! End-to-end conversion from document text to sheets

use crate::config::SheetConfig;
use crate::error::Result;
use crate::export::ExportRow;
use crate::feature::{parse_feature, parse_feature_file, ParsedFeature};
use crate::sheet::{to_sheets_with, SheetTable};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything produced by converting one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    /// Feature title
    pub feature_name: String,
    /// Intermediate export rows, one per scenario
    pub rows: Vec<ExportRow>,
    /// Final sheets, one per export row
    pub sheets: Vec<SheetTable>,
}

impl Conversion {
    fn from_parsed(parsed: ParsedFeature, config: &SheetConfig) -> Self {
        let rows = parsed.export_rows();
        let sheets = to_sheets_with(&rows, config);
        Self {
            feature_name: parsed.feature_name,
            rows,
            sheets,
        }
    }

    /// Total step rows across all sheets
    pub fn total_steps(&self) -> usize {
        self.sheets.iter().map(SheetTable::step_count).sum()
    }

    /// Whether the document yielded no scenarios
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Convert document text into sheets
pub fn convert(content: &str, config: &SheetConfig) -> Conversion {
    Conversion::from_parsed(parse_feature(content), config)
}

/// Read a feature file and convert it into sheets
pub fn convert_file<P: AsRef<Path>>(path: P, config: &SheetConfig) -> Result<Conversion> {
    let path = path.as_ref();
    let conversion = Conversion::from_parsed(parse_feature_file(path)?, config);

    log::info!(
        "converted '{}': {} scenarios into {} sheets",
        path.display(),
        conversion.rows.len(),
        conversion.sheets.len()
    );

    Ok(conversion)
}
