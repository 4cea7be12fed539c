//! Tabulation of export rows into ALM design-step sheets
//!
//! Each [`ExportRow`] becomes one [`SheetTable`]: a fixed 11-column header
//! followed by one row per step. Steps are split into the GWT keyword and the
//! remaining text, which lands in either the Description or the Expected
//! column depending on whether the step is an assertion.

use crate::config::SheetConfig;
use crate::export::ExportRow;
use crate::keyword::StepKeyword;
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Header row written at the top of every sheet
pub const SHEET_HEADERS: [&str; 11] = [
    "",
    "Step Name (Design Steps)",
    "GWT (Design Steps)",
    "Description (Design Steps)",
    "Expected (Design Steps)",
    "Test input (Design Steps)",
    "Subject",
    "Test Name",
    "Type",
    "Status",
    "Designer",
];

/// Expected-column text for steps that are not assertions
pub const NO_EXPECTED_RESULT: &str = "No expected result required for this step";

/// GWT value for lines that do not start with a step keyword
pub const UNKEYED_STEP: &str = "Step";

static STEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\s*)(Given|When|Then|And|But)\s+(.*)").unwrap_or_else(|_| unreachable!())
});

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^>]+)>").unwrap_or_else(|_| unreachable!()));

/// Columns of a sheet, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetColumn {
    StepText,
    StepName,
    Gwt,
    Description,
    Expected,
    TestInput,
    Subject,
    TestName,
    Type,
    Status,
    Designer,
}

impl SheetColumn {
    /// All columns in sheet order
    pub const ALL: [SheetColumn; 11] = [
        SheetColumn::StepText,
        SheetColumn::StepName,
        SheetColumn::Gwt,
        SheetColumn::Description,
        SheetColumn::Expected,
        SheetColumn::TestInput,
        SheetColumn::Subject,
        SheetColumn::TestName,
        SheetColumn::Type,
        SheetColumn::Status,
        SheetColumn::Designer,
    ];

    /// Column index (0-based)
    pub fn index(self) -> usize {
        self as usize
    }

    /// Header text for this column
    pub fn header(self) -> &'static str {
        SHEET_HEADERS[self.index()]
    }

    /// Find the column whose header matches `header`
    pub fn from_header(header: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.header() == header)
    }
}

/// One worksheet worth of rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTable {
    /// Sanitized, length-bounded, unique sheet name
    pub name: String,
    /// Header row followed by one row per step
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    fn new(name: String) -> Self {
        Self {
            name,
            rows: vec![SHEET_HEADERS.iter().map(|h| h.to_string()).collect()],
        }
    }

    /// The header row
    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or_default()
    }

    /// Rows after the header
    pub fn step_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or_default()
    }

    /// Number of step rows
    pub fn step_count(&self) -> usize {
        self.step_rows().len()
    }

    /// Index of the column with the given header text
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.header().iter().position(|h| h == header)
    }

    /// Cell value of a step row (0-based, header excluded)
    pub fn cell(&self, step: usize, column: SheetColumn) -> Option<&str> {
        self.step_rows()
            .get(step)
            .and_then(|row| row.get(column.index()))
            .map(String::as_str)
    }
}

/// Sheet-name allocator, scoped to a single tabulation call
#[derive(Debug)]
struct SheetNamer {
    max_len: usize,
    counts: HashMap<String, usize>,
}

impl SheetNamer {
    fn new(max_len: usize) -> Self {
        Self {
            max_len,
            counts: HashMap::new(),
        }
    }

    /// Name for the row at `index`, suffixed `_<n>` on repeats of the same base
    fn allocate(&mut self, sheet_name: &str, index: usize) -> String {
        let base = if sheet_name.is_empty() {
            format!("Sheet{}", index + 1)
        } else {
            sheet_name.to_string()
        };
        let base = truncate_chars(&sanitize_sheet_name(&base), self.max_len);

        let count = self.counts.entry(base.clone()).or_insert(0);
        *count += 1;

        if *count == 1 {
            return base;
        }

        let suffix = format!("_{}", count);
        let keep = self.max_len.saturating_sub(suffix.chars().count());
        // The limit wins over uniqueness when it cannot hold the suffix
        let name = truncate_chars(
            &format!("{}{}", truncate_chars(&base, keep), suffix),
            self.max_len,
        );
        log::debug!("sheet name '{}' already used, renamed to '{}'", base, name);
        name
    }
}

/// Replace characters spreadsheet engines reject in sheet names with `_`
pub fn sanitize_sheet_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | '?' | '*' | '[' | ']' | ':' => '_',
            other => other,
        })
        .collect()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Derived columns for one step line
#[derive(Debug, Clone, PartialEq, Eq)]
struct StepCells {
    gwt: String,
    description: String,
    expected: String,
}

/// Expands the steps of one scenario, tracking the last `Given`/`When`/`Then`
#[derive(Debug, Default)]
struct StepExpander {
    last_primary: Option<StepKeyword>,
}

impl StepExpander {
    fn expand(&mut self, step: &str) -> StepCells {
        let Some(caps) = STEP_RE.captures(step) else {
            return StepCells {
                gwt: UNKEYED_STEP.to_string(),
                description: step.trim().to_string(),
                expected: String::new(),
            };
        };

        let gwt = caps.get(2).map_or("", |m| m.as_str());
        let text = caps.get(3).map_or("", |m| m.as_str());

        // Case-insensitive match, but only exact-case keywords drive the tracker
        let keyword = StepKeyword::from_exact(gwt);
        if let Some(k) = keyword.filter(StepKeyword::is_primary) {
            self.last_primary = Some(k);
        }

        // `And` after `Then` is another assertion; `But` never swaps
        let asserts = match keyword {
            Some(StepKeyword::Then) => true,
            Some(StepKeyword::And) => self.last_primary == Some(StepKeyword::Then),
            _ => false,
        };

        if asserts {
            StepCells {
                gwt: gwt.to_string(),
                description: String::new(),
                expected: text.to_string(),
            }
        } else {
            StepCells {
                gwt: gwt.to_string(),
                description: text.to_string(),
                expected: NO_EXPECTED_RESULT.to_string(),
            }
        }
    }
}

/// Test input for a step: the distinct example values of its first placeholder
fn test_input(step: &str, parameters: Option<&IndexMap<String, String>>) -> String {
    if !step.contains('<') {
        return String::new();
    }

    let value = PLACEHOLDER_RE
        .captures(step)
        .and_then(|caps| caps.get(1))
        .and_then(|name| parameters.and_then(|p| p.get(name.as_str())))
        .filter(|value| !value.is_empty());

    let Some(value) = value else {
        return String::new();
    };

    let values: Vec<&str> = value.split('|').collect();
    if values.len() > 1 {
        let unique: IndexSet<&str> = values.into_iter().collect();
        unique.into_iter().collect::<Vec<_>>().join("|")
    } else {
        value.clone()
    }
}

fn build_sheet(name: String, row: &ExportRow, config: &SheetConfig) -> SheetTable {
    let mut sheet = SheetTable::new(name);
    let mut expander = StepExpander::default();
    let parameters = row.parameters.as_ref();

    let steps = row.step_lines().filter(|step| !step.trim().is_empty());
    for (idx, step) in steps.enumerate() {
        let step_index = idx + 1;
        let cells = expander.expand(step);
        let first = step_index == 1;
        let meta = |value: &str| if first { value.to_string() } else { String::new() };

        sheet.rows.push(vec![
            step.to_string(),
            format!("Step {}", step_index),
            cells.gwt,
            cells.description,
            cells.expected,
            test_input(step, parameters),
            meta(&config.subject),
            String::new(),
            meta(&config.test_type),
            meta(&config.status),
            meta(&config.designer),
        ]);
    }

    sheet
}

/// Build sheets with the default config
pub fn to_sheets(rows: &[ExportRow]) -> Vec<SheetTable> {
    to_sheets_with(rows, &SheetConfig::default())
}

/// Build one sheet per export row, in order
pub fn to_sheets_with(rows: &[ExportRow], config: &SheetConfig) -> Vec<SheetTable> {
    let mut namer = SheetNamer::new(config.max_sheet_name_len);

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let name = namer.allocate(&row.sheet_name, index);
            build_sheet(name, row, config)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sheet_name: &str, steps: &[&str]) -> ExportRow {
        ExportRow {
            feature: "F".to_string(),
            scenario: sheet_name.to_string(),
            steps: steps.join("\n"),
            parameters: None,
            sheet_name: sheet_name.to_string(),
        }
    }

    fn expand_all(steps: &[&str]) -> Vec<StepCells> {
        let mut expander = StepExpander::default();
        steps.iter().map(|s| expander.expand(s)).collect()
    }

    #[test]
    fn test_header_row() {
        let sheets = to_sheets(&[row("A", &["Given x"])]);
        assert_eq!(sheets[0].header(), SHEET_HEADERS);
        assert_eq!(sheets[0].rows[0].len(), 11);
    }

    #[test]
    fn test_column_contract() {
        assert_eq!(SheetColumn::StepName.index(), 1);
        assert_eq!(SheetColumn::StepName.header(), "Step Name (Design Steps)");
        assert_eq!(SheetColumn::TestInput.index(), 5);
        assert_eq!(SheetColumn::TestInput.header(), "Test input (Design Steps)");
        assert_eq!(SheetColumn::from_header("Designer"), Some(SheetColumn::Designer));
        assert_eq!(SheetColumn::from_header("Nope"), None);
    }

    #[test]
    fn test_given_when_then() {
        let cells = expand_all(&["Given a user", "When they log in", "Then they see home"]);

        assert_eq!(cells[0].gwt, "Given");
        assert_eq!(cells[0].description, "a user");
        assert_eq!(cells[0].expected, NO_EXPECTED_RESULT);

        assert_eq!(cells[1].gwt, "When");
        assert_eq!(cells[1].description, "they log in");

        assert_eq!(cells[2].gwt, "Then");
        assert_eq!(cells[2].description, "");
        assert_eq!(cells[2].expected, "they see home");
    }

    #[test]
    fn test_and_after_then_is_expected_but_is_not() {
        let cells = expand_all(&["Then X", "And Y", "But Z"]);

        assert_eq!(cells[1].gwt, "And");
        assert_eq!(cells[1].expected, "Y");
        assert_eq!(cells[1].description, "");

        assert_eq!(cells[2].gwt, "But");
        assert_eq!(cells[2].description, "Z");
        assert_eq!(cells[2].expected, NO_EXPECTED_RESULT);
    }

    #[test]
    fn test_and_after_when_is_description() {
        let cells = expand_all(&["Then X", "When Y", "And Z"]);
        assert_eq!(cells[2].description, "Z");
        assert_eq!(cells[2].expected, NO_EXPECTED_RESULT);
    }

    #[test]
    fn test_lowercase_keyword_keeps_case_but_not_semantics() {
        let cells = expand_all(&["then lower", "And after"]);

        assert_eq!(cells[0].gwt, "then");
        assert_eq!(cells[0].description, "lower");
        assert_eq!(cells[0].expected, NO_EXPECTED_RESULT);
        // Tracker was never set to Then
        assert_eq!(cells[1].description, "after");
    }

    #[test]
    fn test_unkeyed_step() {
        let cells = expand_all(&["  Something else  "]);
        assert_eq!(cells[0].gwt, "Step");
        assert_eq!(cells[0].description, "Something else");
        assert_eq!(cells[0].expected, "");
    }

    #[test]
    fn test_indented_step_matches() {
        let cells = expand_all(&["   When   spaced out"]);
        assert_eq!(cells[0].gwt, "When");
        assert_eq!(cells[0].description, "spaced out");
    }

    #[test]
    fn test_test_input_deduplicates() {
        let mut params = IndexMap::new();
        params.insert("A".to_string(), "x|y|x".to_string());

        assert_eq!(test_input("Then the result is <A>", Some(&params)), "x|y");
    }

    #[test]
    fn test_test_input_single_value() {
        let mut params = IndexMap::new();
        params.insert("A".to_string(), "only".to_string());

        assert_eq!(test_input("Given <A>", Some(&params)), "only");
    }

    #[test]
    fn test_test_input_uses_first_placeholder() {
        let mut params = IndexMap::new();
        params.insert("A".to_string(), "1".to_string());
        params.insert("B".to_string(), "2".to_string());

        assert_eq!(test_input("Given <B> then <A>", Some(&params)), "2");
    }

    #[test]
    fn test_test_input_missing_or_empty() {
        let mut params = IndexMap::new();
        params.insert("A".to_string(), String::new());

        assert_eq!(test_input("Given <A>", Some(&params)), "");
        assert_eq!(test_input("Given <B>", Some(&params)), "");
        assert_eq!(test_input("Given <A>", None), "");
        assert_eq!(test_input("Given a < b", Some(&params)), "");
    }

    #[test]
    fn test_metadata_only_on_first_row() {
        let sheets = to_sheets(&[row("A", &["Given a", "When b"])]);
        let sheet = &sheets[0];

        assert_eq!(
            sheet.cell(0, SheetColumn::Subject),
            Some("Flamingo\\Full Disclosure\\SSVP\\COMMON\\Automation")
        );
        assert_eq!(sheet.cell(0, SheetColumn::TestName), Some(""));
        assert_eq!(sheet.cell(0, SheetColumn::Type), Some("VAPI-XP-TEST"));
        assert_eq!(sheet.cell(0, SheetColumn::Status), Some("Design"));
        assert_eq!(sheet.cell(0, SheetColumn::Designer), Some("qcadmin"));

        for column in [
            SheetColumn::Subject,
            SheetColumn::TestName,
            SheetColumn::Type,
            SheetColumn::Status,
            SheetColumn::Designer,
        ] {
            assert_eq!(sheet.cell(1, column), Some(""));
        }
    }

    #[test]
    fn test_step_rows_skip_blank_lines() {
        let mut r = row("A", &[]);
        r.steps = "Given a\n   \n\nWhen b".to_string();

        let sheets = to_sheets(&[r]);
        let sheet = &sheets[0];

        assert_eq!(sheet.step_count(), 2);
        assert_eq!(sheet.cell(0, SheetColumn::StepText), Some("Given a"));
        assert_eq!(sheet.cell(1, SheetColumn::StepName), Some("Step 2"));
    }

    #[test]
    fn test_empty_steps_give_header_only() {
        let sheets = to_sheets(&[row("A", &[])]);
        assert_eq!(sheets[0].rows.len(), 1);
        assert_eq!(sheets[0].step_count(), 0);
    }

    #[test]
    fn test_fallback_sheet_name() {
        let sheets = to_sheets(&[row("A", &[]), row("", &[])]);
        assert_eq!(sheets[1].name, "Sheet2");
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("a/b\\c?d*e[f]g:h"), "a_b_c_d_e_f_g_h");
    }

    #[test]
    fn test_duplicate_names_get_suffix() {
        let rows = [row("Checkout", &[]), row("Checkout", &[]), row("Checkout", &[])];
        let names: Vec<String> = to_sheets(&rows).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Checkout", "Checkout_2", "Checkout_3"]);
    }

    #[test]
    fn test_long_names_are_truncated() {
        let long = "x".repeat(40);
        let rows = [row(&long, &[]), row(&long, &[])];
        let sheets = to_sheets(&rows);

        assert_eq!(sheets[0].name, "x".repeat(31));
        assert_eq!(sheets[1].name, format!("{}_2", "x".repeat(29)));
        assert_eq!(sheets[1].name.chars().count(), 31);
    }

    #[test]
    fn test_custom_name_limit() {
        let config = SheetConfig {
            max_sheet_name_len: 5,
            ..SheetConfig::default()
        };
        let sheets = to_sheets_with(&[row("Checkout", &[]), row("Checkout", &[])], &config);

        assert_eq!(sheets[0].name, "Check");
        assert_eq!(sheets[1].name, "Che_2");
    }

    #[test]
    fn test_name_limit_holds_when_suffix_does_not_fit() {
        let rows = [row("Checkout", &[]), row("Checkout", &[]), row("Checkout", &[])];
        for limit in 1..=3 {
            let config = SheetConfig {
                max_sheet_name_len: limit,
                ..SheetConfig::default()
            };
            for sheet in to_sheets_with(&rows, &config) {
                assert!(
                    sheet.name.chars().count() <= limit,
                    "'{}' exceeds limit {}",
                    sheet.name,
                    limit
                );
            }
        }
    }

    #[test]
    fn test_suffixed_name_can_match_a_literal_name() {
        // The counter is keyed by base name only
        let rows = [row("Checkout", &[]), row("Checkout", &[]), row("Checkout_2", &[])];
        let names: Vec<String> = to_sheets(&rows).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Checkout", "Checkout_2", "Checkout_2"]);
    }

    #[test]
    fn test_custom_metadata() {
        let config = SheetConfig {
            designer: "jdoe".to_string(),
            ..SheetConfig::default()
        };
        let sheets = to_sheets_with(&[row("A", &["Given a"])], &config);
        assert_eq!(sheets[0].cell(0, SheetColumn::Designer), Some("jdoe"));
    }
}
