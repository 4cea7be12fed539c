//! Configuration files for sheet generation and batch runs

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default ALM subject folder written on the first step row
pub const DEFAULT_SUBJECT: &str = "Flamingo\\Full Disclosure\\SSVP\\COMMON\\Automation";
/// Default ALM test type
pub const DEFAULT_TEST_TYPE: &str = "VAPI-XP-TEST";
/// Default ALM test status
pub const DEFAULT_STATUS: &str = "Design";
/// Default ALM designer account
pub const DEFAULT_DESIGNER: &str = "qcadmin";
/// Longest sheet name spreadsheet engines accept
pub const DEFAULT_MAX_SHEET_NAME_LEN: usize = 31;
/// Shortest sheet name limit that leaves room for a `_n` de-dup suffix
pub const MIN_SHEET_NAME_LEN: usize = 4;

/// Metadata and limits applied while building sheets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Subject column value
    pub subject: String,
    /// Type column value
    pub test_type: String,
    /// Status column value
    pub status: String,
    /// Designer column value
    pub designer: String,
    /// Maximum sheet name length in characters
    pub max_sheet_name_len: usize,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            test_type: DEFAULT_TEST_TYPE.to_string(),
            status: DEFAULT_STATUS.to_string(),
            designer: DEFAULT_DESIGNER.to_string(),
            max_sheet_name_len: DEFAULT_MAX_SHEET_NAME_LEN,
        }
    }
}

impl SheetConfig {
    /// Load a config from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the limits are usable
    pub fn validate(&self) -> Result<()> {
        if self.max_sheet_name_len < MIN_SHEET_NAME_LEN {
            return Err(Error::InvalidConfig(format!(
                "max_sheet_name_len must be at least {}, got {}",
                MIN_SHEET_NAME_LEN, self.max_sheet_name_len
            )));
        }
        Ok(())
    }

    /// Load a config from JSON, or fall back to defaults when no path is given
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Save the config to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// How converted sheets are written to disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One CSV file per sheet
    #[default]
    Csv,
    /// A single JSON document holding every sheet
    Json,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// A batch file describing a multi-document conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFile {
    /// Root directories to scan for feature files
    pub roots: Vec<PathBuf>,
    /// Output directory; each feature gets its own subdirectory
    pub output_dir: PathBuf,
    /// Optional sheet config applied to every document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

impl BatchFile {
    /// Load a batch file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the batch file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
