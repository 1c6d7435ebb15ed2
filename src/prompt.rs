//! Composes the instructions sent to the model. Building is deterministic:
//! the same domain and document text always produce byte-identical output,
//! so tests can assert exact instruction text.

use schemars::schema_for;
use serde_json::json;

use crate::domain::Domain;
use crate::error::Result;
use crate::prompts;
use crate::record::KpiCollection;
use crate::registry::{schema_for as fields_for, ValueKind};
use crate::report::ReportDraft;

/// The composed request for one model call: a system instruction describing
/// the task and output contract, and the user text carrying the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub system: String,
    pub user: String,
}

/// Optional context for report generation.
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    pub company_name: Option<String>,
    pub industry: Option<String>,
}

/// Builds the extraction instruction for `domain` over `document_text`.
pub fn build(domain: Domain, document_text: &str) -> Instruction {
    Instruction {
        system: render_extraction_system(domain),
        user: document_text.to_string(),
    }
}

fn render_extraction_system(domain: Domain) -> String {
    let mut out = String::new();
    out.push_str(prompts::role_for(domain));
    out.push_str("\n\nJSON Output Structure:\n");
    out.push_str(
        "Output a single JSON object. Its top-level keys MUST come from the \
         following category list; each key maps to an array of KPI objects. \
         Omit a category (or use an empty array) when the text contains \
         nothing relevant to it.\n\nCategories:\n",
    );
    for cat in domain.categories() {
        out.push_str(&format!(
            "- \"{}\": {}. {}\n",
            cat.key, cat.title, cat.description
        ));
    }

    out.push_str("\nEach KPI object has the following fields:\n");
    for field in fields_for(domain) {
        let requirement = if field.required { "required" } else { "optional" };
        out.push_str(&format!(
            "- \"{}\" ({}, {}): {}\n",
            field.name,
            field.kind.label(),
            requirement,
            field.description
        ));
        if let ValueKind::Enumerated(allowed) = field.kind {
            out.push_str(&format!("  Allowed values: {}.\n", allowed.join(", ")));
        }
    }

    out.push('\n');
    out.push_str(prompts::EXTRACTION_RULES);
    out
}

/// Builds the report-generation instruction from a finalized collection.
/// Distinct template from extraction; embeds the collection as structured
/// JSON plus the report output schema.
pub fn build_report(collection: &KpiCollection, context: &ReportContext) -> Result<Instruction> {
    let mut system = String::from(prompts::REPORT_SYSTEM_PROMPT);

    system.push_str("\n\nReporting categories for this collection, in order:\n");
    for cat in collection.domain.categories() {
        system.push_str(&format!("- \"{}\" -> \"{}\"\n", cat.key, cat.title));
    }

    let schema = schema_for!(ReportDraft);
    system.push_str("\nOutput JSON Schema:\n");
    system.push_str(&serde_json::to_string_pretty(&schema)?);

    let payload = json!({
        "collection": collection,
        "companyName": context.company_name.as_deref().unwrap_or(""),
        "industry": context.industry.as_deref().unwrap_or("Generic"),
    });

    Ok(Instruction {
        system,
        user: serde_json::to_string_pretty(&payload)?,
    })
}
