//! Writing converted sheets to disk
//!
//! Sheets are written either as one CSV file per sheet or as a single JSON
//! workbook. Every export also leaves a `manifest.json` in the output
//! directory describing what was written and when.

use crate::config::OutputFormat;
use crate::error::{Error, Result};
use crate::sheet::SheetTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name of the manifest written next to exported sheets
pub const MANIFEST_FILE: &str = "manifest.json";
/// File name of the JSON workbook
pub const WORKBOOK_FILE: &str = "sheets.json";

/// Summary of one written sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSheet {
    /// Sheet name
    pub name: String,
    /// File holding the sheet
    pub file: PathBuf,
    /// Number of step rows (header excluded)
    pub steps: usize,
}

/// Record of a completed export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    /// When the export finished
    pub generated_at: DateTime<Utc>,
    /// Source document, when the sheets came from a file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Feature title of the source document
    pub feature: String,
    /// Output format used
    pub format: OutputFormat,
    /// Sheets in workbook order
    pub sheets: Vec<ManifestSheet>,
}

impl ExportManifest {
    /// Load a manifest from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the manifest to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Total step rows across all sheets
    pub fn total_steps(&self) -> usize {
        self.sheets.iter().map(|s| s.steps).sum()
    }
}

/// Describes the document being exported
#[derive(Debug, Clone, Copy)]
pub struct ExportSource<'a> {
    /// Feature title
    pub feature: &'a str,
    /// Path of the source document, if any
    pub path: Option<&'a Path>,
}

/// Result of writing sheets
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Files that were written, manifest last
    pub files_written: Vec<PathBuf>,
    /// The manifest that was saved
    pub manifest: ExportManifest,
}

/// Write sheets into `output_dir` in the requested format
pub fn write_sheets<P: AsRef<Path>>(
    sheets: &[SheetTable],
    output_dir: P,
    format: OutputFormat,
    source: ExportSource<'_>,
) -> Result<ExportResult> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let (mut files_written, manifest_sheets) = match format {
        OutputFormat::Csv => write_csv_files(sheets, output_dir)?,
        OutputFormat::Json => write_json_workbook(sheets, output_dir)?,
    };

    let manifest = ExportManifest {
        generated_at: Utc::now(),
        source: source.path.map(Path::to_path_buf),
        feature: source.feature.to_string(),
        format,
        sheets: manifest_sheets,
    };

    let manifest_path = output_dir.join(MANIFEST_FILE);
    manifest.save(&manifest_path)?;
    files_written.push(manifest_path);

    Ok(ExportResult {
        files_written,
        manifest,
    })
}

/// Write one CSV file per sheet
pub fn write_sheets_csv<P: AsRef<Path>>(
    sheets: &[SheetTable],
    output_dir: P,
    source: ExportSource<'_>,
) -> Result<ExportResult> {
    write_sheets(sheets, output_dir, OutputFormat::Csv, source)
}

/// Write every sheet into a single JSON workbook
pub fn write_sheets_json<P: AsRef<Path>>(
    sheets: &[SheetTable],
    output_dir: P,
    source: ExportSource<'_>,
) -> Result<ExportResult> {
    write_sheets(sheets, output_dir, OutputFormat::Json, source)
}

fn write_csv_files(
    sheets: &[SheetTable],
    output_dir: &Path,
) -> Result<(Vec<PathBuf>, Vec<ManifestSheet>)> {
    let mut files = Vec::with_capacity(sheets.len());
    let mut summaries = Vec::with_capacity(sheets.len());
    let mut used = HashSet::new();

    for sheet in sheets {
        let file_name = format!("{}.csv", unique_stem(file_stem_for(&sheet.name)?, &mut used));
        let path = output_dir.join(&file_name);
        write_sheet_csv(sheet, &path)?;

        summaries.push(ManifestSheet {
            name: sheet.name.clone(),
            file: PathBuf::from(file_name),
            steps: sheet.step_count(),
        });
        files.push(path);
    }

    Ok((files, summaries))
}

/// Write a single sheet, header included, to a CSV file
pub fn write_sheet_csv(sheet: &SheetTable, path: &Path) -> Result<()> {
    let csv_err = |source| Error::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .flexible(false)
        .from_path(path)
        .map_err(csv_err)?;

    for row in &sheet.rows {
        writer.write_record(row).map_err(csv_err)?;
    }
    writer.flush()?;

    log::debug!("wrote sheet '{}' to {}", sheet.name, path.display());
    Ok(())
}

fn write_json_workbook(
    sheets: &[SheetTable],
    output_dir: &Path,
) -> Result<(Vec<PathBuf>, Vec<ManifestSheet>)> {
    let path = output_dir.join(WORKBOOK_FILE);
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, sheets)?;
    writeln!(writer)?;
    writer.flush()?;

    let summaries = sheets
        .iter()
        .map(|sheet| ManifestSheet {
            name: sheet.name.clone(),
            file: PathBuf::from(WORKBOOK_FILE),
            steps: sheet.step_count(),
        })
        .collect();

    Ok((vec![path], summaries))
}

/// Reserve `stem` in `used`, adding a `_n` suffix when it is already taken.
///
/// Stems are compared case-insensitively so the files stay distinct on
/// case-insensitive file systems.
fn unique_stem(stem: String, used: &mut HashSet<String>) -> String {
    if used.insert(stem.to_lowercase()) {
        return stem;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", stem, n);
        if used.insert(candidate.to_lowercase()) {
            log::warn!("file name '{}.csv' already used, writing '{}.csv'", stem, candidate);
            return candidate;
        }
        n += 1;
    }
}

/// Turn a sheet name into a safe file stem.
///
/// Sheet names are already free of `/ \ ? * [ ] :`; this also covers the
/// characters Windows forbids in file names.
fn file_stem_for(sheet_name: &str) -> Result<String> {
    let stem: String = sheet_name
        .chars()
        .map(|c| match c {
            '<' | '>' | '"' | '|' | '/' | '\\' | '?' | '*' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = stem.trim_end_matches(['.', ' ']);
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        return Err(Error::InvalidSheetName(sheet_name.to_string()));
    }
    Ok(trimmed.to_string())
}
