//! Recovers a typed KPI sequence from the model's raw text. The instruction
//! demands a single bare JSON object, but the parser defends against every
//! violation seen in practice: markdown fences, leading/trailing prose,
//! stringified numbers, missing or mistyped fields, unknown keys.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde_json::Value;

use crate::domain::Domain;
use crate::error::{EsgExtractError, Result};
use crate::record::{IssueKind, KpiValue, ParseIssue, ParsedKpi};
use crate::registry::{schema_for, KpiFieldSpec, ValueKind};

const MAX_FRAGMENT_LEN: usize = 200;

/// Everything recovered from one raw response: the surviving items in
/// deterministic order plus every issue encountered along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub items: Vec<ParsedKpi>,
    pub issues: Vec<ParseIssue>,
}

/// Parses `raw_text` against the schema for `domain`.
///
/// Fails with `UnparsableResponse` only when no JSON value can be recovered
/// at all; field-level problems are reported as issues on a successful
/// outcome instead.
pub fn parse(domain: Domain, raw_text: &str) -> Result<ParseOutcome> {
    let span = extract_json_span(raw_text).ok_or_else(|| EsgExtractError::UnparsableResponse {
        reason: "no JSON object or array found in the response".to_string(),
        raw_text: raw_text.to_string(),
    })?;

    let value: Value =
        serde_json::from_str(span).map_err(|e| EsgExtractError::UnparsableResponse {
            reason: e.to_string(),
            raw_text: raw_text.to_string(),
        })?;

    let fields = schema_for(domain);
    let mut outcome = ParseOutcome::default();
    let mut index = 0usize;

    match value {
        // The instructed shape: categories mapped to KPI arrays. Categories
        // are walked in registry order so the output is deterministic
        // regardless of key order in the response.
        Value::Object(map) => {
            for cat in domain.categories() {
                let Some(entry) = map.get(cat.key) else {
                    continue;
                };
                match entry {
                    Value::Array(items) => {
                        for item in items {
                            walk_item(fields, Some(cat.key), item, &mut index, &mut outcome);
                        }
                    }
                    Value::Null => {}
                    other => outcome.issues.push(ParseIssue {
                        record_index: None,
                        field: cat.key.to_string(),
                        kind: IssueKind::MalformedJson,
                        fragment: fragment_of(other),
                    }),
                }
            }
            // Unknown top-level keys are additive, not erroneous: dropped
            // without an issue.
        }
        // Tolerated degradation: a bare array of KPI objects, uncategorized.
        Value::Array(items) => {
            for item in &items {
                walk_item(fields, None, item, &mut index, &mut outcome);
            }
        }
        other => {
            return Err(EsgExtractError::UnparsableResponse {
                reason: "top-level JSON value is neither an object nor an array".to_string(),
                raw_text: fragment_of(&other),
            });
        }
    }

    debug!(
        "Parsed {} items for domain {} ({} issues)",
        outcome.items.len(),
        domain,
        outcome.issues.len()
    );
    if !outcome.issues.is_empty() {
        warn!(
            "{} field-level issues recorded while parsing a {} response",
            outcome.issues.len(),
            domain
        );
    }

    Ok(outcome)
}

/// Strips everything around the first balanced `{...}` or `[...]` span.
/// Handles fenced blocks and stray prose before/after the JSON; respects
/// string literals and escapes so braces inside strings do not end the span.
pub(crate) fn extract_json_span(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    let start = bytes.iter().position(|&b| b == b'{' || b == b'[')?;
    let open = bytes[start];
    let close = if open == b'{' { b'}' } else { b']' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            _ if b == open => depth += 1,
            _ if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

fn walk_item(
    fields: &[KpiFieldSpec],
    category: Option<&str>,
    item: &Value,
    index: &mut usize,
    outcome: &mut ParseOutcome,
) {
    let current = *index;
    *index += 1;

    let Value::Object(map) = item else {
        outcome.issues.push(ParseIssue {
            record_index: Some(current),
            field: "*".to_string(),
            kind: IssueKind::MalformedJson,
            fragment: fragment_of(item),
        });
        return;
    };

    let mut parsed = ParsedKpi {
        category: category.map(str::to_string),
        name: String::new(),
        value: None,
        metric_type: None,
        year: None,
        reference_text: String::new(),
        extensions: BTreeMap::new(),
    };
    let mut any_required_present = false;

    for spec in fields {
        let Some(raw) = map.get(spec.name).filter(|v| !v.is_null()) else {
            if spec.required {
                outcome.issues.push(ParseIssue::missing(current, spec.name));
            }
            continue;
        };
        if spec.required {
            any_required_present = true;
        }

        match coerce(spec, raw) {
            Coerced::Value(value) => assign(&mut parsed, spec.name, value),
            Coerced::OutOfEnum(value) => {
                outcome.issues.push(ParseIssue {
                    record_index: Some(current),
                    field: spec.name.to_string(),
                    kind: IssueKind::OutOfEnum,
                    fragment: fragment_of(raw),
                });
                // Preserved verbatim, not coerced to a default.
                assign(&mut parsed, spec.name, value);
            }
            Coerced::Mismatch => outcome.issues.push(ParseIssue {
                record_index: Some(current),
                field: spec.name.to_string(),
                kind: IssueKind::TypeMismatch,
                fragment: fragment_of(raw),
            }),
        }
    }

    // Out-of-schema fields in `map` are dropped here without an issue.

    if !any_required_present {
        // Nothing trustworthy to keep; the missing-required issues recorded
        // above document the drop.
        return;
    }

    outcome.items.push(parsed);
}

enum Coerced {
    Value(KpiValue),
    OutOfEnum(KpiValue),
    Mismatch,
}

fn coerce(spec: &KpiFieldSpec, raw: &Value) -> Coerced {
    match spec.kind {
        ValueKind::Text => match raw {
            Value::String(s) => Coerced::Value(KpiValue::Text(s.clone())),
            Value::Number(n) => Coerced::Value(KpiValue::Text(n.to_string())),
            _ => Coerced::Mismatch,
        },
        ValueKind::Number => match raw {
            Value::Number(n) => match n.as_f64() {
                Some(f) => Coerced::Value(KpiValue::Number(f)),
                None => Coerced::Mismatch,
            },
            Value::String(s) => match parse_unambiguous_number(s) {
                Some(f) => Coerced::Value(KpiValue::Number(f)),
                None => Coerced::Mismatch,
            },
            _ => Coerced::Mismatch,
        },
        ValueKind::Scalar => match raw {
            Value::String(s) => Coerced::Value(KpiValue::Text(s.clone())),
            Value::Number(n) => match n.as_f64() {
                Some(f) => Coerced::Value(KpiValue::Number(f)),
                None => Coerced::Mismatch,
            },
            _ => Coerced::Mismatch,
        },
        ValueKind::Year => match raw {
            Value::Number(n) => match n.as_i64() {
                Some(y) if i32::try_from(y).is_ok() => {
                    Coerced::Value(KpiValue::Number(y as f64))
                }
                _ => Coerced::Mismatch,
            },
            Value::String(s) => match s.trim().parse::<i32>() {
                Ok(y) => Coerced::Value(KpiValue::Number(f64::from(y))),
                Err(_) => Coerced::Mismatch,
            },
            _ => Coerced::Mismatch,
        },
        ValueKind::Enumerated(allowed) => match raw {
            Value::String(s) => {
                if allowed.contains(&s.as_str()) {
                    Coerced::Value(KpiValue::Text(s.clone()))
                } else {
                    Coerced::OutOfEnum(KpiValue::Text(s.clone()))
                }
            }
            _ => Coerced::Mismatch,
        },
        ValueKind::Nested => match raw {
            Value::Object(_) => Coerced::Value(KpiValue::Nested(raw.clone())),
            _ => Coerced::Mismatch,
        },
    }
}

/// Coerces `"123.4"` but not `"approx 100s"`: the trimmed string must parse
/// as a number in full.
fn parse_unambiguous_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn assign(parsed: &mut ParsedKpi, field: &str, value: KpiValue) {
    match field {
        "name" => {
            if let KpiValue::Text(s) = value {
                parsed.name = s;
            }
        }
        "value" => parsed.value = Some(value),
        "metric_type" => {
            if let KpiValue::Text(s) = value {
                parsed.metric_type = Some(s);
            }
        }
        "year" => {
            if let KpiValue::Number(n) = value {
                parsed.year = Some(n as i32);
            }
        }
        "reference" => {
            if let KpiValue::Text(s) = value {
                parsed.reference_text = s;
            }
        }
        other => {
            parsed.extensions.insert(other.to_string(), value);
        }
    }
}

fn fragment_of(value: &Value) -> String {
    let mut text = value.to_string();
    if text.len() > MAX_FRAGMENT_LEN {
        let mut cut = MAX_FRAGMENT_LEN;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn well_formed_general() -> String {
        r#"```json
{
  "environmental": [
    {
      "name": "Total GHG Emissions",
      "value": "95,000 tCO2e",
      "metric_type": "tCO2e",
      "year": 2023,
      "reference": "We decreased our total GHG emissions to 95,000 tCO2e."
    },
    {
      "name": "Water Withdrawal",
      "value": 380000,
      "metric_type": "cubic meters",
      "year": 2023,
      "reference": "Total water withdrawal for 2023 was 380,000 cubic meters."
    }
  ],
  "social": [
    {
      "name": "Employee Turnover Rate",
      "value": "8.5%",
      "metric_type": "percentage",
      "year": 2023,
      "reference": "Our employee turnover rate was maintained at a low 8.5%."
    }
  ]
}
```"#
            .to_string()
    }

    #[test]
    fn test_well_formed_round_trip() {
        let outcome = parse(Domain::General, &well_formed_general()).unwrap();
        assert_eq!(outcome.items.len(), 3);
        assert!(outcome.issues.is_empty());

        let first = &outcome.items[0];
        assert_eq!(first.category.as_deref(), Some("environmental"));
        assert_eq!(first.name, "Total GHG Emissions");
        assert_eq!(first.value, Some(KpiValue::from("95,000 tCO2e")));
        assert_eq!(first.year, Some(2023));

        let second = &outcome.items[1];
        assert_eq!(second.value, Some(KpiValue::Number(380000.0)));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let raw = well_formed_general();
        let a = parse(Domain::General, &raw).unwrap();
        let b = parse(Domain::General, &raw).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fenced_block_with_surrounding_prose() {
        let raw = "Sure! Here is the data you asked for:\n```json\n{\"environmental\": []}\n```\nLet me know if you need more.";
        let outcome = parse(Domain::General, raw).unwrap();
        assert!(outcome.items.is_empty());
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_partial_record_kept_with_missing_required_issues() {
        let raw = "Sure! ```json\n[{\"name\":\"Water Use\"}]\n```";
        let outcome = parse(Domain::General, raw).unwrap();

        assert_eq!(outcome.items.len(), 1);
        let item = &outcome.items[0];
        assert_eq!(item.name, "Water Use");
        assert!(item.value.is_none());
        assert!(item.year.is_none());

        let missing: Vec<&str> = outcome
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::MissingRequired)
            .map(|i| i.field.as_str())
            .collect();
        assert_eq!(missing, vec!["value", "year"]);
    }

    #[test]
    fn test_plain_prose_is_unparsable() {
        let raw = "I could not find any KPI data in the provided text, sorry.";
        let err = parse(Domain::General, raw).unwrap_err();
        assert!(matches!(err, EsgExtractError::UnparsableResponse { .. }));
    }

    #[test]
    fn test_truncated_json_is_unparsable() {
        let raw = "{\"environmental\": [{\"name\": \"Tot";
        let err = parse(Domain::General, raw).unwrap_err();
        assert!(matches!(err, EsgExtractError::UnparsableResponse { .. }));
    }

    #[test]
    fn test_item_missing_all_required_is_dropped() {
        let raw = r#"{"environmental":[{"reference":"page 4"},{"name":"Energy Use","value":"1.2 million MWh","year":2023}]}"#;
        let outcome = parse(Domain::General, raw).unwrap();

        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].name, "Energy Use");
        // Index 0 still refers to the dropped item.
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.record_index == Some(0) && i.kind == IssueKind::MissingRequired));
    }

    #[test]
    fn test_out_of_enum_metric_type_preserved_with_issue() {
        let raw = r#"{"environmental":[{"name":"Fleet Intensity","value":120,"metric_type":"furlongs per fortnight","year":2023}]}"#;
        let outcome = parse(Domain::General, raw).unwrap();

        assert_eq!(outcome.items.len(), 1);
        assert_eq!(
            outcome.items[0].metric_type.as_deref(),
            Some("furlongs per fortnight")
        );
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].kind, IssueKind::OutOfEnum);
        assert_eq!(outcome.issues[0].field, "metric_type");
    }

    #[test]
    fn test_stringified_number_coercion_rules() {
        assert_eq!(parse_unambiguous_number("123.4"), Some(123.4));
        assert_eq!(parse_unambiguous_number(" 2023 "), Some(2023.0));
        assert_eq!(parse_unambiguous_number("approx 100s"), None);
        assert_eq!(parse_unambiguous_number("95,000"), None);
        assert_eq!(parse_unambiguous_number(""), None);
    }

    #[test]
    fn test_uncoercible_year_flagged_not_fatal() {
        let raw = r#"{"environmental":[{"name":"Diversion Rate","value":"75%","year":"FY23/24"}]}"#;
        let outcome = parse(Domain::General, raw).unwrap();

        assert_eq!(outcome.items.len(), 1);
        assert!(outcome.items[0].year.is_none());
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::TypeMismatch && i.field == "year"));
    }

    #[test]
    fn test_out_of_schema_fields_dropped_silently() {
        let raw = r#"{"environmental":[{"name":"Recycling Rate","value":"35%","year":2023,"confidence":"high","emoji":"♻️"}]}"#;
        let outcome = parse(Domain::General, raw).unwrap();

        assert_eq!(outcome.items.len(), 1);
        assert!(outcome.items[0].extensions.is_empty());
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_unknown_top_level_keys_dropped_silently() {
        let raw = r#"{"environmental":[],"thoughts":"I scanned the document twice."}"#;
        let outcome = parse(Domain::General, raw).unwrap();
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_category_order_is_registry_order() {
        // Response lists social before environmental; output must not.
        let raw = r#"{"social":[{"name":"Training Hours","value":25,"year":2023}],
                      "environmental":[{"name":"GHG","value":95000,"year":2023}]}"#;
        let outcome = parse(Domain::General, raw).unwrap();
        assert_eq!(outcome.items[0].category.as_deref(), Some("environmental"));
        assert_eq!(outcome.items[1].category.as_deref(), Some("social"));
    }

    #[test]
    fn test_bare_array_response_tolerated() {
        let raw = r#"[{"name":"Board Diversity","value":"40%","year":2023}]"#;
        let outcome = parse(Domain::General, raw).unwrap();
        assert_eq!(outcome.items.len(), 1);
        assert!(outcome.items[0].category.is_none());
    }

    #[test]
    fn test_non_array_category_value_flagged() {
        let raw = r#"{"environmental":{"name":"GHG","value":1,"year":2023}}"#;
        let outcome = parse(Domain::General, raw).unwrap();
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].kind, IssueKind::MalformedJson);
        assert_eq!(outcome.issues[0].field, "environmental");
        assert!(outcome.issues[0].record_index.is_none());
    }

    #[test]
    fn test_non_object_item_flagged() {
        let raw = r#"{"environmental":["just a string"]}"#;
        let outcome = parse(Domain::General, raw).unwrap();
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.issues[0].kind, IssueKind::MalformedJson);
        assert_eq!(outcome.issues[0].field, "*");
    }

    #[test]
    fn test_smart_quotes_inside_strings_survive() {
        let raw = "{\"environmental\":[{\"name\":\"Policy \u{201c}Net Zero\u{201d} Coverage\",\"value\":\"100%\",\"year\":2023}]}";
        let outcome = parse(Domain::General, raw).unwrap();
        assert_eq!(outcome.items[0].name, "Policy \u{201c}Net Zero\u{201d} Coverage");
    }

    #[test]
    fn test_braces_inside_strings_do_not_end_span() {
        let raw = r#"Note: {"environmental":[{"name":"Odd {brace} name","value":1,"year":2023}]} trailing"#;
        let outcome = parse(Domain::General, raw).unwrap();
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.items[0].name, "Odd {brace} name");
    }

    #[test]
    fn test_nested_extension_field_for_waste() {
        let raw = r#"{"lever_material_recovery":[{
            "name":"Material Recovery Rate",
            "value":"85%",
            "year":2023,
            "scope":"3",
            "treatment_specific":{"recycling":"5,000 tons processed"}
        }]}"#;
        let outcome = parse(Domain::WasteManagement, raw).unwrap();

        assert_eq!(outcome.items.len(), 1);
        let item = &outcome.items[0];
        assert_eq!(item.category.as_deref(), Some("lever_material_recovery"));
        assert_eq!(item.extensions.get("scope"), Some(&KpiValue::from("3")));
        assert!(matches!(
            item.extensions.get("treatment_specific"),
            Some(KpiValue::Nested(_))
        ));
        assert!(outcome.issues.is_empty());
    }

    #[test]
    fn test_waste_scope_out_of_enum() {
        let raw = r#"{"scope_emissions_waste":[{"name":"Landfill Gas","value":1200,"year":2023,"scope":"scope one"}]}"#;
        let outcome = parse(Domain::WasteManagement, raw).unwrap();
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].kind, IssueKind::OutOfEnum);
        assert_eq!(
            outcome.items[0].extensions.get("scope"),
            Some(&KpiValue::from("scope one"))
        );
    }

    #[test]
    fn test_extract_span_prefers_first_container() {
        assert_eq!(extract_json_span("x [1,2] {\"a\":1}"), Some("[1,2]"));
        assert_eq!(extract_json_span("no json here"), None);
        assert_eq!(extract_json_span("{\"a\": {\"b\": 2}} extra"), Some("{\"a\": {\"b\": 2}}"));
    }
}
