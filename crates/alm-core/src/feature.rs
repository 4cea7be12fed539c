//! Line-oriented parser for Gherkin feature documents
//!
//! The parser makes a single forward pass over the document and recognises
//! only the handful of keywords the export needs: `Feature:`, `Scenario:`,
//! `Scenario Outline:`, `Examples:`, step lines and example-table rows.
//! Everything else is skipped. It never fails on text input; structural
//! oddities (unframed table rows, short rows) resolve to fallback values.

use crate::error::{Error, Result};
use crate::keyword::StepKeyword;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const FEATURE_PREFIX: &str = "Feature:";
const SCENARIO_PREFIXES: [&str; 2] = ["Scenario:", "Scenario Outline:"];
const EXAMPLES_PREFIX: &str = "Examples:";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const BOM: char = '\u{FEFF}';

/// A scenario (or scenario outline) collected from a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Scenario title, trimmed
    pub name: String,
    /// Step lines including their keyword, placeholders left intact
    pub steps: Vec<String>,
    /// Placeholder name -> `|`-joined values from every example row
    pub examples: IndexMap<String, String>,
    /// Whether an `Examples:` block was seen, even an empty one
    pub has_examples: bool,
}

impl ScenarioRecord {
    /// Create an empty scenario with the given title
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append one data cell to the values collected for `header`
    fn push_example(&mut self, header: &str, value: &str) {
        match self.examples.get_mut(header) {
            Some(existing) if !existing.is_empty() => {
                existing.push('|');
                existing.push_str(value);
            }
            Some(existing) => *existing = value.to_string(),
            None => {
                self.examples.insert(header.to_string(), value.to_string());
            }
        }
    }
}

/// Result of parsing one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFeature {
    /// Text after the last `Feature:` line, or empty
    pub feature_name: String,
    /// Scenarios in source order
    pub scenarios: Vec<ScenarioRecord>,
}

impl ParsedFeature {
    /// Number of scenarios found
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Find a scenario by its title
    pub fn find_scenario(&self, name: &str) -> Option<&ScenarioRecord> {
        self.scenarios.iter().find(|s| s.name == name)
    }
}

/// What the scanner is currently collecting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Scanning,
    CollectingSteps,
    CollectingExamples,
}

/// Per-call accumulator threaded through the line loop
#[derive(Debug, Default)]
struct ScanState {
    mode: Mode,
    feature_name: String,
    scenarios: Vec<ScenarioRecord>,
    current: Option<ScenarioRecord>,
    headers: Vec<String>,
}

impl ScanState {
    fn feed(&mut self, line: &str) {
        if line.is_empty() || line.starts_with('#') {
            return;
        }

        if let Some(name) = line.strip_prefix(FEATURE_PREFIX) {
            self.feature_name = name.trim().to_string();
            return;
        }

        if let Some(name) = SCENARIO_PREFIXES
            .iter()
            .find_map(|prefix| line.strip_prefix(prefix))
        {
            self.start_scenario(name.trim());
            return;
        }

        if line.starts_with(EXAMPLES_PREFIX) {
            if let Some(current) = self.current.as_mut() {
                log::debug!("examples block in scenario '{}'", current.name);
                current.has_examples = true;
                self.mode = Mode::CollectingExamples;
                self.headers.clear();
            }
            return;
        }

        // Tags are recognised and dropped; they attach to nothing
        if line.starts_with('@') {
            return;
        }

        match self.mode {
            Mode::Scanning => {}
            Mode::CollectingSteps => {
                if StepKeyword::split_step(line).is_some() {
                    if let Some(current) = self.current.as_mut() {
                        current.steps.push(line.to_string());
                    }
                }
            }
            Mode::CollectingExamples => {
                if line.starts_with('|') {
                    self.table_row(line);
                }
            }
        }
    }

    fn start_scenario(&mut self, name: &str) {
        self.finish_scenario();
        log::debug!("scenario '{}'", name);
        self.current = Some(ScenarioRecord::new(name));
        self.mode = Mode::CollectingSteps;
    }

    fn finish_scenario(&mut self) {
        if let Some(scenario) = self.current.take() {
            self.scenarios.push(scenario);
        }
    }

    fn table_row(&mut self, line: &str) {
        let cells = split_table_row(line);

        if self.headers.is_empty() {
            self.headers = cells;
            return;
        }

        let Some(current) = self.current.as_mut() else {
            return;
        };
        for (idx, header) in self.headers.iter().enumerate() {
            let value = cells.get(idx).map(String::as_str).unwrap_or_default();
            current.push_example(header, value);
        }
    }

    fn finish(mut self) -> ParsedFeature {
        self.finish_scenario();
        ParsedFeature {
            feature_name: self.feature_name,
            scenarios: self.scenarios,
        }
    }
}

/// Split a `| a | b |` row into trimmed cells.
///
/// The empty cells produced by the outer pipes are dropped only when both are
/// present; a row missing its closing pipe keeps every cell as split.
fn split_table_row(line: &str) -> Vec<String> {
    let mut cells: Vec<String> = line.split('|').map(|c| c.trim().to_string()).collect();

    let framed = cells.len() >= 2
        && cells.first().is_some_and(String::is_empty)
        && cells.last().is_some_and(String::is_empty);

    if framed {
        cells.pop();
        cells.remove(0);
    } else {
        log::warn!("unframed example row '{}', keeping all cells", line);
    }

    cells
}

/// Trim whitespace and byte-order marks from both ends of a line
fn trim_line(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_whitespace() || c == BOM)
}

/// Parse a feature document into its title and scenarios
pub fn parse_feature(content: &str) -> ParsedFeature {
    let mut state = ScanState::default();
    for line in content.lines() {
        state.feed(trim_line(line));
    }
    state.finish()
}

/// Parse a feature document from raw bytes.
///
/// A leading UTF-8 byte-order mark is ignored. Bytes that are not valid
/// UTF-8 are rejected with [`Error::MalformedInput`].
pub fn parse_feature_bytes(bytes: &[u8], source_name: &str) -> Result<ParsedFeature> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let content = std::str::from_utf8(bytes).map_err(|e| Error::MalformedInput {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })?;
    Ok(parse_feature(content))
}

/// Read and parse a feature file
pub fn parse_feature_file<P: AsRef<Path>>(path: P) -> Result<ParsedFeature> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_feature_bytes(&bytes, &path.display().to_string())
}
