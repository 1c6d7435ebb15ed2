//! # ESG KPI Extractor
//!
//! A library for extracting structured ESG KPI data from unstructured
//! sustainability-report text via an LLM backend, across five domain
//! variants, with optional synthesis of a narrative performance report.
//!
//! ## Core Concepts
//!
//! - **Domain**: one of five extraction contexts (general, carbon-levers,
//!   banking, apparel, waste-management), each a schema and prompt template
//!   over one shared pipeline rather than five code paths.
//! - **Registry**: static per-domain field specs; the prompt builder and the
//!   response parser both read it, so instruction and validation cannot drift.
//! - **ParseIssue**: the model's "JSON, ideally" output contract is defended,
//!   not assumed. Field-level problems attach to a successful collection;
//!   only an unreadable response fails the call.
//! - **KpiCollection / PerformanceReport**: immutable values returned to the
//!   caller, which owns their storage and lifecycle.
//!
//! ## Example
//!
//! ```rust,ignore
//! use esg_kpi_extractor::*;
//! use std::time::Duration;
//!
//! let client = llm::GeminiClient::new(std::env::var("GEMINI_API_KEY")?);
//! let extractor = EsgExtractor::new(client);
//!
//! let collection = extractor
//!     .extract(Domain::Banking, &report_text, "annual-report-2023.pdf",
//!              Duration::from_secs(180))
//!     .await?;
//!
//! let report = extractor
//!     .summarize(&collection, &ReportContext {
//!         company_name: Some("GreenBank PLC".into()),
//!         industry: Some("Finance".into()),
//!     }, Duration::from_secs(180))
//!     .await?;
//! ```
//!
//! Callers with their own transport can skip the `gemini` feature: implement
//! [`TextModel`] for it, or feed raw model text straight into
//! [`ingest_raw_response`].

pub mod domain;
pub mod error;
pub mod invoker;
pub mod parser;
pub mod postprocess;
pub mod prompt;
pub mod prompts;
pub mod record;
pub mod registry;
pub mod report;

#[cfg(feature = "gemini")]
pub mod llm;

pub use domain::{CategoryKey, Domain};
pub use error::{EsgExtractError, Result};
pub use invoker::{invoke, EsgExtractor, TextModel};
pub use parser::{parse, ParseOutcome};
pub use postprocess::finalize;
pub use prompt::{build, build_report, Instruction, ReportContext};
pub use record::{IssueKind, KpiCollection, KpiRecord, KpiValue, ParseIssue, ParsedKpi};
pub use registry::{schema_for, KpiFieldSpec, ValueKind};
pub use report::{
    parse_performance_report, CategoryRating, KeyKpiAnalysis, OverallRating, PerformanceReport,
};

/// Parses a raw model response and finalizes it into a collection in one
/// step, for callers that drive the model boundary themselves.
pub fn ingest_raw_response(
    domain: Domain,
    source_doc_id: &str,
    raw_text: &str,
) -> Result<KpiCollection> {
    let outcome = parser::parse(domain, raw_text)?;
    Ok(postprocess::finalize(domain, source_doc_id, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_raw_response_end_to_end() {
        let raw = r#"{
            "financed_emissions": [
                {"name": "Portfolio Carbon Intensity", "value": "150 tCO2e per EUR 1M",
                 "metric_type": "tCO2e per EUR 1M", "year": 2023,
                 "reference": "The Portfolio Carbon Intensity for corporate loans stands at 150 tCO2e per EUR 1M outstanding."}
            ],
            "client_market_influence": [
                {"name": "Sustainable Finance Mobilized", "value": "EUR 5 Billion",
                 "year": 2023,
                 "reference": "In 2023, GreenBank mobilized EUR 5 Billion in sustainable finance."}
            ]
        }"#;

        let collection = ingest_raw_response(Domain::Banking, "greenbank-2023.txt", raw).unwrap();

        assert_eq!(collection.domain, Domain::Banking);
        assert_eq!(collection.records.len(), 2);
        assert!(collection.issues.is_empty());
        assert_eq!(
            collection.records[0].category.as_deref(),
            Some("financed_emissions")
        );

        // Collections round-trip through JSON for downstream export.
        let json = serde_json::to_string(&collection).unwrap();
        let restored: KpiCollection = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.records, collection.records);
    }

    #[test]
    fn test_ingest_propagates_unparsable() {
        let err = ingest_raw_response(Domain::General, "doc", "no data here").unwrap_err();
        assert!(matches!(err, EsgExtractError::UnparsableResponse { .. }));
    }
}
