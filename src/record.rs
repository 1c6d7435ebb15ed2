use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::Domain;

/// A scalar (or nested) KPI field value as the model reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum KpiValue {
    Text(String),
    Number(f64),
    Nested(serde_json::Value),
}

impl KpiValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            KpiValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            KpiValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for KpiValue {
    fn from(s: &str) -> Self {
        KpiValue::Text(s.to_string())
    }
}

impl From<f64> for KpiValue {
    fn from(n: f64) -> Self {
        KpiValue::Number(n)
    }
}

/// One KPI as recovered from the model response, before an id is assigned.
/// The parser produces these; `finalize` turns them into [`KpiRecord`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedKpi {
    /// Reporting category key the model grouped this KPI under, if any.
    pub category: Option<String>,
    pub name: String,
    pub value: Option<KpiValue>,
    pub metric_type: Option<String>,
    pub year: Option<i32>,
    /// Verbatim excerpt supporting the value. Empty when the model gave none.
    pub reference_text: String,
    /// Domain-specific extension fields, keyed by their registry names.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, KpiValue>,
}

/// One extracted metric with its collection-unique id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiRecord {
    pub id: String,
    pub category: Option<String>,
    pub name: String,
    pub value: Option<KpiValue>,
    pub metric_type: Option<String>,
    pub year: Option<i32>,
    pub reference_text: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, KpiValue>,
}

/// What went wrong with one field of one response item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    MissingRequired,
    TypeMismatch,
    OutOfEnum,
    MalformedJson,
}

/// A non-fatal validation problem attached to an otherwise-successful
/// extraction. `record_index` is the ordinal of the item in the model
/// response (dropped items still count), `None` for category-level problems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseIssue {
    pub record_index: Option<usize>,
    pub field: String,
    pub kind: IssueKind,
    /// The raw JSON fragment that caused the problem. Empty for missing fields.
    pub fragment: String,
}

impl ParseIssue {
    pub fn missing(index: usize, field: &str) -> Self {
        Self {
            record_index: Some(index),
            field: field.to_string(),
            kind: IssueKind::MissingRequired,
            fragment: String::new(),
        }
    }
}

/// Immutable result of one extraction call: the ordered records plus every
/// issue the parser attached. Superseded, never edited, by re-extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiCollection {
    pub domain: Domain,
    pub source_doc_id: String,
    pub created_at: DateTime<Utc>,
    pub records: Vec<KpiRecord>,
    pub issues: Vec<ParseIssue>,
}

impl KpiCollection {
    /// Records grouped by reporting category, preserving the domain's
    /// category order. Uncategorized records come last under `None`.
    pub fn by_category(&self) -> Vec<(Option<&str>, Vec<&KpiRecord>)> {
        let mut groups: Vec<(Option<&str>, Vec<&KpiRecord>)> = Vec::new();
        for cat in self.domain.categories() {
            let members: Vec<&KpiRecord> = self
                .records
                .iter()
                .filter(|r| r.category.as_deref() == Some(cat.key))
                .collect();
            if !members.is_empty() {
                groups.push((Some(cat.key), members));
            }
        }
        let stray: Vec<&KpiRecord> = self
            .records
            .iter()
            .filter(|r| r.category.is_none())
            .collect();
        if !stray.is_empty() {
            groups.push((None, stray));
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kpi_value_untagged_serde() {
        let text: KpiValue = serde_json::from_str("\"8.5%\"").unwrap();
        assert_eq!(text, KpiValue::Text("8.5%".to_string()));

        let num: KpiValue = serde_json::from_str("95000").unwrap();
        assert_eq!(num.as_number(), Some(95000.0));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = KpiRecord {
            id: "kpi-0001".to_string(),
            category: Some("environmental".to_string()),
            name: "Total GHG Emissions".to_string(),
            value: Some(KpiValue::from("95,000 tCO2e")),
            metric_type: Some("tCO2e".to_string()),
            year: Some(2023),
            reference_text: "We decreased our total GHG emissions to 95,000 tCO2e.".to_string(),
            extensions: BTreeMap::new(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["metricType"], "tCO2e");
        assert!(!json["referenceText"].as_str().unwrap().is_empty());
        assert!(json.get("extensions").is_none());
    }

    #[test]
    fn test_issue_kind_kebab_case() {
        let kind = serde_json::to_string(&IssueKind::MissingRequired).unwrap();
        assert_eq!(kind, "\"missing-required\"");
    }
}
