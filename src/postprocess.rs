//! Turns parser output into the final immutable [`KpiCollection`]: assigns
//! collision-free ids, normalizes year and text fields, stamps creation
//! time. Pure apart from the id source and the clock.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use log::info;
use rand::Rng;

use crate::domain::Domain;
use crate::parser::ParseOutcome;
use crate::record::{KpiCollection, KpiRecord, KpiValue};
use crate::registry::{schema_for, KpiFieldSpec, ValueKind};

/// Finalizes one extraction call. Ids are unique within the collection but
/// deliberately not stable across re-runs; re-extraction supersedes rather
/// than edits.
pub fn finalize(domain: Domain, source_doc_id: &str, outcome: ParseOutcome) -> KpiCollection {
    let fields = schema_for(domain);
    let mut rng = rand::thread_rng();
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(outcome.items.len());

    for item in outcome.items {
        let id = loop {
            let candidate = format!("kpi-{:08x}", rng.gen::<u32>());
            if seen.insert(candidate.clone()) {
                break candidate;
            }
        };

        let mut extensions = item.extensions;
        normalize_year_extensions(fields, &mut extensions);

        records.push(KpiRecord {
            id,
            category: item.category,
            name: item.name.trim().to_string(),
            value: item.value,
            metric_type: item
                .metric_type
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
            year: normalize_year(item.year),
            reference_text: item.reference_text.trim().to_string(),
            extensions,
        });
    }

    info!(
        "Finalized {} collection from '{}': {} records, {} issues",
        domain,
        source_doc_id,
        records.len(),
        outcome.issues.len()
    );

    KpiCollection {
        domain,
        source_doc_id: source_doc_id.to_string(),
        created_at: Utc::now(),
        records,
        issues: outcome.issues,
    }
}

/// Bare 2-digit years are ambiguous and rejected rather than expanded;
/// anything outside a plausible four-digit range is treated the same way.
fn normalize_year(year: Option<i32>) -> Option<i32> {
    year.filter(|y| (1000..=9999).contains(y))
}

/// Year-kind extension fields (target_year, baseline_year) get the same
/// treatment as the core `year` field: ambiguous values are removed.
fn normalize_year_extensions(
    fields: &[KpiFieldSpec],
    extensions: &mut BTreeMap<String, KpiValue>,
) {
    for spec in fields.iter().filter(|f| matches!(f.kind, ValueKind::Year)) {
        let Some(value) = extensions.get(spec.name) else {
            continue;
        };
        let valid = value
            .as_number()
            .and_then(|n| normalize_year(Some(n as i32)))
            .is_some();
        if !valid {
            extensions.remove(spec.name);
        }
    }
}
