//! The performance report shape and its all-or-nothing parse. Unlike KPI
//! extraction there is no field-level salvage: a narrative report sectioned
//! incorrectly is worse than no report, so any top-level shape mismatch
//! rejects the whole response with `AggregationUnparsable`.

use chrono::{DateTime, Utc};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{EsgExtractError, Result};
use crate::parser::extract_json_span;
use crate::record::KpiValue;

/// Analysis of one key KPI inside a category rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyKpiAnalysis {
    pub kpi_name: String,
    pub kpi_value: KpiValue,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverallRating {
    pub rating: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRating {
    /// Human-readable title, e.g. "Financed Emissions".
    pub category_name: String,
    pub rating: String,
    pub explanation: String,
    pub key_kpi_analyses: Vec<KeyKpiAnalysis>,
}

/// The report exactly as the model is asked to emit it. Kept separate from
/// [`PerformanceReport`] because `generated_at` is stamped locally, never
/// trusted from the model.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportDraft {
    pub report_title: String,
    pub overall_rating: OverallRating,
    pub category_ratings: Vec<CategoryRating>,
    pub overall_analysis: String,
}

/// The narrative, category-rated summary synthesized from one
/// [`crate::record::KpiCollection`]. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub report_title: String,
    pub overall_rating: OverallRating,
    pub category_ratings: Vec<CategoryRating>,
    pub overall_analysis: String,
    pub generated_at: DateTime<Utc>,
}

/// Parses the second-stage model response using the same strip/parse
/// discipline as KPI extraction, but rejecting in full on any shape failure.
pub fn parse_performance_report(raw_text: &str) -> Result<PerformanceReport> {
    let span = extract_json_span(raw_text).ok_or_else(|| EsgExtractError::AggregationUnparsable {
        reason: "no JSON object found in the response".to_string(),
        raw_text: raw_text.to_string(),
    })?;

    let draft: ReportDraft =
        serde_json::from_str(span).map_err(|e| EsgExtractError::AggregationUnparsable {
            reason: e.to_string(),
            raw_text: raw_text.to_string(),
        })?;

    if draft.category_ratings.is_empty() {
        return Err(EsgExtractError::AggregationUnparsable {
            reason: "report contains no category ratings".to_string(),
            raw_text: raw_text.to_string(),
        });
    }

    debug!(
        "Parsed performance report '{}' with {} category ratings",
        draft.report_title,
        draft.category_ratings.len()
    );

    Ok(PerformanceReport {
        report_title: draft.report_title,
        overall_rating: draft.overall_rating,
        category_ratings: draft.category_ratings,
        overall_analysis: draft.overall_analysis,
        generated_at: Utc::now(),
    })
}
