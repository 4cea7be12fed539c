//! alm-core: Core library for converting Gherkin feature files into ALM import sheets
//!
//! This library provides functionality to:
//! - Parse feature documents into scenario records (steps and example tables)
//! - Flatten scenarios into export rows with aggregated example parameters
//! - Tabulate export rows into ALM design-step sheets
//! - Scan directories for feature files
//! - Write sheets as CSV files or a JSON workbook with an export manifest

pub mod config;
pub mod error;
pub mod export;
pub mod feature;
pub mod keyword;
pub mod pipeline;
pub mod scanner;
pub mod sheet;
pub mod writer;

pub use config::{BatchFile, OutputFormat, SheetConfig, MIN_SHEET_NAME_LEN};
pub use error::{Error, Result};
pub use export::{parse_export_rows, sheet_name_for, to_export_rows, ExportRow};
pub use feature::{parse_feature, parse_feature_bytes, parse_feature_file, ParsedFeature, ScenarioRecord};
pub use keyword::StepKeyword;
pub use pipeline::{convert, convert_file, Conversion};
pub use scanner::{scan_directory, FeatureFile, ScanResult};
pub use sheet::{sanitize_sheet_name, to_sheets, to_sheets_with, SheetColumn, SheetTable, SHEET_HEADERS};
pub use writer::{
    write_sheet_csv, write_sheets, write_sheets_csv, write_sheets_json, ExportManifest, ExportResult,
    ExportSource,
};
