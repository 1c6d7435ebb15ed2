//! Orchestrates the full pipeline around the model boundary: build the
//! instruction, invoke the model once within a timeout, parse, finalize.
//! Retry policy deliberately lives above this layer; every call here is a
//! single attempt.

use std::future::Future;
use std::time::Duration;

use log::{info, warn};

use crate::domain::Domain;
use crate::error::{EsgExtractError, Result};
use crate::parser;
use crate::postprocess;
use crate::prompt::{self, Instruction, ReportContext};
use crate::record::KpiCollection;
use crate::report::{parse_performance_report, PerformanceReport};

/// The external model capability: given an instruction, eventually returns
/// free-form text. Implementations enforce no timeout themselves; the
/// invoker wraps the future.
pub trait TextModel {
    fn generate(
        &self,
        instruction: &Instruction,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Bounds one model call. A call that outlives `timeout` is abandoned and
/// reported as `Timeout`; no partial text is salvaged.
pub async fn invoke<M: TextModel>(
    model: &M,
    instruction: &Instruction,
    timeout: Duration,
) -> Result<String> {
    match tokio::time::timeout(timeout, model.generate(instruction)).await {
        Ok(result) => result,
        Err(_) => Err(EsgExtractError::Timeout(timeout)),
    }
}

pub struct EsgExtractor<M> {
    model: M,
}

impl<M: TextModel> EsgExtractor<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// One extraction call: document text in, immutable collection out.
    pub async fn extract(
        &self,
        domain: Domain,
        document_text: &str,
        source_doc_id: &str,
        timeout: Duration,
    ) -> Result<KpiCollection> {
        info!(
            "Extracting {} KPIs from '{}' ({} chars)",
            domain,
            source_doc_id,
            document_text.len()
        );

        let instruction = prompt::build(domain, document_text);
        let raw = invoke(&self.model, &instruction, timeout).await?;
        let outcome = parser::parse(domain, &raw)?;
        Ok(postprocess::finalize(domain, source_doc_id, outcome))
    }

    /// One aggregation call: a prior collection in, narrative report out.
    /// Rejected in full on any top-level shape failure.
    pub async fn summarize(
        &self,
        collection: &KpiCollection,
        context: &ReportContext,
        timeout: Duration,
    ) -> Result<PerformanceReport> {
        info!(
            "Generating performance report for '{}' ({} records)",
            collection.source_doc_id,
            collection.records.len()
        );
        if collection.records.is_empty() {
            warn!("Summarizing an empty collection; the report may be sparse");
        }

        let instruction = prompt::build_report(collection, context)?;
        let raw = invoke(&self.model, &instruction, timeout).await?;
        parse_performance_report(&raw)
    }
}
