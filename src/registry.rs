//! Static per-domain KPI schemas. The registry is plain data: the prompt
//! builder renders it into the instruction and the parser walks response
//! items against it, so the two sides can never drift apart.

use crate::domain::Domain;

/// How a field's value is validated and coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Free text. Bare numbers are accepted and stringified.
    Text,
    /// A number; unambiguously numeric strings ("123.4") are coerced.
    Number,
    /// Either free text or a number, kept as reported.
    Scalar,
    /// A four-digit calendar year. Two-digit years are rejected downstream.
    Year,
    /// Free text restricted to a declared vocabulary; out-of-enum values are
    /// kept verbatim but flagged.
    Enumerated(&'static [&'static str]),
    /// A nested JSON object, kept opaque.
    Nested,
}

impl ValueKind {
    /// Short type label used when rendering the field list into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            ValueKind::Text => "string",
            ValueKind::Number => "number",
            ValueKind::Scalar => "string or number",
            ValueKind::Year => "four-digit year",
            ValueKind::Enumerated(_) => "string (one of the allowed values)",
            ValueKind::Nested => "object",
        }
    }
}

/// Describes one field of a domain's KPI record.
#[derive(Debug, Clone, Copy)]
pub struct KpiFieldSpec {
    pub name: &'static str,
    pub kind: ValueKind,
    pub required: bool,
    /// One-line guidance rendered into the instruction.
    pub description: &'static str,
}

/// The KPI field set for a domain. Total and pure: every `Domain` value has
/// a non-empty static schema. Unknown domain strings are rejected earlier,
/// at `Domain::from_str`.
pub fn schema_for(domain: Domain) -> &'static [KpiFieldSpec] {
    match domain {
        Domain::General => GENERAL_FIELDS,
        Domain::CarbonLevers => CARBON_LEVER_FIELDS,
        Domain::Banking => BANKING_FIELDS,
        Domain::Apparel => APPAREL_FIELDS,
        Domain::WasteManagement => WASTE_FIELDS,
    }
}

/// Fields whose values land on named `KpiRecord` fields rather than in the
/// extensions map.
pub const CORE_FIELD_NAMES: [&str; 5] = ["name", "value", "metric_type", "year", "reference"];

const METRIC_TYPES_COMMON: &[&str] = &[
    "percentage",
    "tCO2e",
    "kgCO2e",
    "metric tons of CO2 equivalent",
    "cubic meters",
    "MWh",
    "GWh",
    "tons",
    "hours",
    "count",
    "currency",
    "ratio",
    "text",
];

const METRIC_TYPES_CARBON: &[&str] = &[
    "percentage",
    "tCO2e",
    "kgCO2e",
    "gCO2e/km",
    "kgCO2e per GJ",
    "kWh per unit",
    "MWh",
    "count",
    "text",
];

const METRIC_TYPES_BANKING: &[&str] = &[
    "percentage",
    "tCO2e",
    "tCO2e per EUR 1M",
    "kgCO2e/m2/year",
    "tCO2e/$M AuM",
    "degrees Celsius",
    "currency",
    "count",
    "text",
];

const METRIC_TYPES_APPAREL: &[&str] = &[
    "percentage",
    "tCO2e",
    "kgCO2e/garment",
    "liters per garment",
    "cubic meters",
    "currency",
    "count",
    "text",
];

const METRIC_TYPES_WASTE: &[&str] = &[
    "percentage",
    "tCO2e",
    "tons",
    "MWh",
    "count",
    "text",
];

// Every domain shares the five core fields; the metric_type vocabulary and
// the extension fields vary per domain.
macro_rules! kpi_schema {
    ($name:ident, $metric_types:expr, [$($extra:expr),* $(,)?]) => {
        const $name: &[KpiFieldSpec] = &[
            KpiFieldSpec {
                name: "name",
                kind: ValueKind::Text,
                required: true,
                description: "Descriptive name of the KPI, e.g. \"Total GHG Emissions Scope 1 & 2\".",
            },
            KpiFieldSpec {
                name: "value",
                kind: ValueKind::Scalar,
                required: true,
                description: "The reported value, including units if the text states them.",
            },
            KpiFieldSpec {
                name: "metric_type",
                kind: ValueKind::Enumerated($metric_types),
                required: false,
                description: "The unit or data type of the value.",
            },
            KpiFieldSpec {
                name: "year",
                kind: ValueKind::Year,
                required: true,
                description: "Reporting year if stated; null when the text does not say.",
            },
            KpiFieldSpec {
                name: "reference",
                kind: ValueKind::Text,
                required: false,
                description: "Exact sentence or short passage (max 2-3 sentences) supporting the value.",
            },
            $($extra,)*
        ];
    };
}

kpi_schema!(
    GENERAL_FIELDS,
    METRIC_TYPES_COMMON,
    [
        KpiFieldSpec {
            name: "category_detail",
            kind: ValueKind::Text,
            required: false,
            description: "A more specific sub-category, e.g. \"GHG Scope 1 Emissions\".",
        },
        KpiFieldSpec {
            name: "target_value",
            kind: ValueKind::Scalar,
            required: false,
            description: "A stated target related to this KPI, e.g. \"85,000 tCO2e\".",
        },
        KpiFieldSpec {
            name: "target_year",
            kind: ValueKind::Year,
            required: false,
            description: "Year by which the target is to be achieved.",
        },
        KpiFieldSpec {
            name: "baseline_value",
            kind: ValueKind::Scalar,
            required: false,
            description: "Baseline value for a target or comparison, if stated.",
        },
        KpiFieldSpec {
            name: "baseline_year",
            kind: ValueKind::Year,
            required: false,
            description: "Baseline year for a target or comparison, if stated.",
        },
        KpiFieldSpec {
            name: "policy_name",
            kind: ValueKind::Text,
            required: false,
            description: "Named company policy directly related to this KPI.",
        },
        KpiFieldSpec {
            name: "commitment_description",
            kind: ValueKind::Text,
            required: false,
            description: "Broader commitment related to this KPI, e.g. \"Net Zero by 2045\".",
        },
        KpiFieldSpec {
            name: "methodology_standards",
            kind: ValueKind::Text,
            required: false,
            description: "Reporting standard or methodology, e.g. \"GHG Protocol\".",
        },
        KpiFieldSpec {
            name: "data_assurance",
            kind: ValueKind::Text,
            required: false,
            description: "External assurance or verification statement, if any.",
        },
        KpiFieldSpec {
            name: "scope_boundary_details",
            kind: ValueKind::Text,
            required: false,
            description: "Scope or boundary qualifiers, e.g. \"Scope 1 & 2, market-based\".",
        },
        KpiFieldSpec {
            name: "qualitative_notes",
            kind: ValueKind::Text,
            required: false,
            description: "Very brief qualitative context found next to the value.",
        },
    ]
);

kpi_schema!(CARBON_LEVER_FIELDS, METRIC_TYPES_CARBON, []);

kpi_schema!(BANKING_FIELDS, METRIC_TYPES_BANKING, []);

kpi_schema!(APPAREL_FIELDS, METRIC_TYPES_APPAREL, []);

kpi_schema!(
    WASTE_FIELDS,
    METRIC_TYPES_WASTE,
    [
        KpiFieldSpec {
            name: "unit",
            kind: ValueKind::Text,
            required: false,
            description: "Measurement unit when it is separate from the value.",
        },
        KpiFieldSpec {
            name: "scope",
            kind: ValueKind::Enumerated(&["1", "2", "3"]),
            required: false,
            description: "GHG Protocol scope this metric belongs to, if applicable.",
        },
        KpiFieldSpec {
            name: "emission_source",
            kind: ValueKind::Text,
            required: false,
            description: "Emission source for scope-classified waste metrics.",
        },
        KpiFieldSpec {
            name: "treatment_method",
            kind: ValueKind::Text,
            required: false,
            description: "Waste treatment method, e.g. recycling, composting, incineration.",
        },
        KpiFieldSpec {
            name: "carbon_equivalent",
            kind: ValueKind::Text,
            required: false,
            description: "Stated carbon equivalent of the waste stream, if any.",
        },
        KpiFieldSpec {
            name: "material_type",
            kind: ValueKind::Text,
            required: false,
            description: "Material type the metric covers, if stated.",
        },
        KpiFieldSpec {
            name: "treatment_specific",
            kind: ValueKind::Nested,
            required: false,
            description: "Nested breakdown by treatment process, kept as reported.",
        },
    ]
);
