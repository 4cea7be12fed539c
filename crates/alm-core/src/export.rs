//! Flattening of parsed scenarios into export rows
//!
//! One [`ExportRow`] is produced per scenario. Field names serialize in the
//! `Feature`/`Scenario`/`Steps`/`Parameters`/`SheetName` shape that upload
//! front-ends already consume.

use crate::feature::{parse_feature, ParsedFeature, ScenarioRecord};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A scenario ready for tabulation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportRow {
    /// Feature title shared by every row of a document
    pub feature: String,
    /// Scenario title
    pub scenario: String,
    /// Step lines joined with `\n`, placeholders intact
    pub steps: String,
    /// Aggregated example values, only for scenarios with a non-empty Examples table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<IndexMap<String, String>>,
    /// Scenario title up to the first `-`, trimmed
    pub sheet_name: String,
}

impl ExportRow {
    /// Build the row for one scenario
    pub fn from_scenario(feature_name: &str, scenario: &ScenarioRecord) -> Self {
        let parameters = (scenario.has_examples && !scenario.examples.is_empty())
            .then(|| scenario.examples.clone());

        Self {
            feature: feature_name.to_string(),
            scenario: scenario.name.clone(),
            steps: scenario.steps.join("\n"),
            parameters,
            sheet_name: sheet_name_for(&scenario.name),
        }
    }

    /// Look up the aggregated value for a placeholder
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .as_ref()
            .and_then(|p| p.get(name))
            .map(String::as_str)
    }

    /// Iterate over the individual step lines
    pub fn step_lines(&self) -> impl Iterator<Item = &str> {
        self.steps.split('\n')
    }
}

/// Leading segment of a scenario title, used as the preferred sheet name.
///
/// `"Checkout - happy path"` becomes `"Checkout"`; a title that starts with
/// `-` yields an empty name.
pub fn sheet_name_for(scenario_name: &str) -> String {
    scenario_name
        .split('-')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Expand scenarios into export rows, one per scenario in order
pub fn to_export_rows(feature_name: &str, scenarios: &[ScenarioRecord]) -> Vec<ExportRow> {
    scenarios
        .iter()
        .map(|scenario| ExportRow::from_scenario(feature_name, scenario))
        .collect()
}

impl ParsedFeature {
    /// Export rows for every scenario in this document
    pub fn export_rows(&self) -> Vec<ExportRow> {
        to_export_rows(&self.feature_name, &self.scenarios)
    }
}

/// Parse a document straight into export rows
pub fn parse_export_rows(content: &str) -> Vec<ExportRow> {
    parse_feature(content).export_rows()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_name_for() {
        assert_eq!(sheet_name_for("Checkout - happy path"), "Checkout");
        assert_eq!(sheet_name_for("  No dash here "), "No dash here");
        assert_eq!(sheet_name_for("A-B-C"), "A");
        assert_eq!(sheet_name_for("- leading dash"), "");
        assert_eq!(sheet_name_for(""), "");
    }

    #[test]
    fn test_row_without_examples_has_no_parameters() {
        let rows = parse_export_rows("Feature: F\nScenario: Plain\nGiven a\nWhen b\n");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].feature, "F");
        assert_eq!(rows[0].scenario, "Plain");
        assert_eq!(rows[0].steps, "Given a\nWhen b");
        assert_eq!(rows[0].parameters, None);
        assert_eq!(rows[0].sheet_name, "Plain");
    }

    #[test]
    fn test_empty_examples_table_has_no_parameters() {
        let rows = parse_export_rows("Scenario: A\nGiven <x>\nExamples:\n");
        assert_eq!(rows[0].parameters, None);
    }

    #[test]
    fn test_header_only_examples_have_no_parameters() {
        let rows = parse_export_rows("Scenario: A\nGiven <x>\nExamples:\n| x |\n");
        assert_eq!(rows[0].parameters, None);
    }

    #[test]
    fn test_parameters_are_aggregated() {
        let doc = "\
Scenario Outline: Sum
  Given <A> and <B>
  Examples:
    | A | B |
    | 1 | 2 |
    | 3 | 4 |
";
        let rows = parse_export_rows(doc);
        assert_eq!(rows[0].parameter("A"), Some("1|3"));
        assert_eq!(rows[0].parameter("B"), Some("2|4"));
        assert_eq!(rows[0].parameter("C"), None);
    }

    #[test]
    fn test_serialized_field_names() {
        let rows = parse_export_rows("Feature: F\nScenario: S - x\nGiven a\n");
        let json = serde_json::to_value(&rows[0]).unwrap();

        assert_eq!(json["Feature"], "F");
        assert_eq!(json["Scenario"], "S - x");
        assert_eq!(json["Steps"], "Given a");
        assert_eq!(json["SheetName"], "S");
        assert!(json.get("Parameters").is_none());
    }

    #[test]
    fn test_deserialize_without_parameters() {
        let json = r#"{"Feature":"F","Scenario":"S","Steps":"Given a","SheetName":"S"}"#;
        let row: ExportRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.parameters, None);
        assert_eq!(row.step_lines().collect::<Vec<_>>(), vec!["Given a"]);
    }
}
