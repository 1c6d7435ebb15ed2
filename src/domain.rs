use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EsgExtractError;

/// Extraction context. Selects the KPI schema, the reporting categories and
/// the instruction template; every pipeline call takes it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    General,
    CarbonLevers,
    Banking,
    Apparel,
    WasteManagement,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::General,
        Domain::CarbonLevers,
        Domain::Banking,
        Domain::Apparel,
        Domain::WasteManagement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::General => "general",
            Domain::CarbonLevers => "carbon-levers",
            Domain::Banking => "banking",
            Domain::Apparel => "apparel",
            Domain::WasteManagement => "waste-management",
        }
    }

    /// Reporting categories for this domain, in the order the model is asked
    /// to group KPIs under them. Consumed by the report aggregator and used
    /// by the parser to walk category-keyed responses deterministically.
    pub fn categories(&self) -> &'static [CategoryKey] {
        match self {
            Domain::General => GENERAL_CATEGORIES,
            Domain::CarbonLevers => CARBON_LEVER_CATEGORIES,
            Domain::Banking => BANKING_CATEGORIES,
            Domain::Apparel => APPAREL_CATEGORIES,
            Domain::WasteManagement => WASTE_CATEGORIES,
        }
    }

    pub fn category_title(&self, key: &str) -> Option<&'static str> {
        self.categories()
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.title)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = EsgExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(Domain::General),
            "carbon-levers" => Ok(Domain::CarbonLevers),
            "banking" => Ok(Domain::Banking),
            "apparel" => Ok(Domain::Apparel),
            "waste-management" => Ok(Domain::WasteManagement),
            other => Err(EsgExtractError::UnknownDomain(other.to_string())),
        }
    }
}

/// One reporting category: the JSON key the model groups KPIs under, plus a
/// human-readable title and a short description embedded into instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryKey {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

const GENERAL_CATEGORIES: &[CategoryKey] = &[
    CategoryKey {
        key: "environmental",
        title: "Environmental",
        description: "Emissions, energy, water, waste and other environmental stewardship metrics.",
    },
    CategoryKey {
        key: "social",
        title: "Social",
        description: "Workforce, diversity, safety, training and community engagement metrics.",
    },
    CategoryKey {
        key: "governance",
        title: "Governance",
        description: "Board composition, ethics, compensation linkage and risk oversight metrics.",
    },
];

const CARBON_LEVER_CATEGORIES: &[CategoryKey] = &[
    CategoryKey {
        key: "lever_1_1_stationary_combustion",
        title: "Stationary Combustion Sources (Scope 1)",
        description: "Direct emissions from owned/controlled boilers, furnaces and generators.",
    },
    CategoryKey {
        key: "lever_1_2_mobile_combustion",
        title: "Mobile Combustion Sources (Scope 1)",
        description: "Direct emissions from owned/controlled vehicles and equipment.",
    },
    CategoryKey {
        key: "lever_1_4_fugitive_emissions",
        title: "Fugitive Emissions (Scope 1)",
        description: "Unintentional leaks such as refrigerants and methane.",
    },
    CategoryKey {
        key: "lever_2_1_purchased_electricity",
        title: "Purchased Electricity (Scope 2)",
        description: "Emissions from electricity bought and consumed.",
    },
    CategoryKey {
        key: "lever_3_1_purchased_goods_services",
        title: "Purchased Goods and Services (Scope 3.1)",
        description: "Upstream emissions embedded in procured items.",
    },
    CategoryKey {
        key: "lever_3_3_fuel_energy_related_activities",
        title: "Fuel and Energy-Related Activities (Scope 3.3)",
        description: "Upstream emissions from producing the energy the company uses.",
    },
    CategoryKey {
        key: "lever_3_4_upstream_transportation_distribution",
        title: "Upstream Transportation and Distribution (Scope 3.4)",
        description: "Emissions from transporting raw materials and components.",
    },
    CategoryKey {
        key: "lever_3_6_business_travel",
        title: "Business Travel (Scope 3.6)",
        description: "Emissions from employee travel for business.",
    },
    CategoryKey {
        key: "lever_3_8_downstream_transportation_distribution",
        title: "Downstream Transportation and Distribution (Scope 3.8)",
        description: "Emissions from delivering products to customers.",
    },
    CategoryKey {
        key: "lever_3_10_use_of_sold_products",
        title: "Use of Sold Products (Scope 3.10)",
        description: "Emissions generated when customers use the company's products.",
    },
];

const BANKING_CATEGORIES: &[CategoryKey] = &[
    CategoryKey {
        key: "financed_emissions",
        title: "Financed Emissions",
        description: "Emissions from corporate lending, mortgages, real estate, investments and \
                      asset management (Scope 3 Category 15).",
    },
    CategoryKey {
        key: "operational_scope_3",
        title: "Operational Scope 3",
        description: "Emissions from the bank's own value chain: professional services, IT \
                      infrastructure, employee travel and corporate services.",
    },
    CategoryKey {
        key: "client_market_influence",
        title: "Client and Market Influence",
        description: "How the bank influences client decarbonization, retail/SME customer \
                      behavior and market transformation through capital markets.",
    },
];

const APPAREL_CATEGORIES: &[CategoryKey] = &[
    CategoryKey {
        key: "comprehensive_ghg_emissions",
        title: "Comprehensive GHG Emissions",
        description: "Scope 1, 2 and all Scope 3 categories, including carbon intensity.",
    },
    CategoryKey {
        key: "water_management",
        title: "Water Management",
        description: "Water consumption, quality, pollution prevention and efficiency.",
    },
    CategoryKey {
        key: "chemical_management",
        title: "Chemical Management",
        description: "Chemical safety, toxicity reduction, substitution and protection.",
    },
    CategoryKey {
        key: "waste_and_circularity",
        title: "Waste & Circularity",
        description: "Waste prevention, diversion, circular business models and recovery.",
    },
    CategoryKey {
        key: "biodiversity_and_nature",
        title: "Biodiversity & Nature",
        description: "Ecosystem protection, regenerative agriculture and sourcing.",
    },
    CategoryKey {
        key: "supply_chain_transparency",
        title: "Supply Chain Transparency",
        description: "Traceability, supplier environmental performance and collaboration.",
    },
    CategoryKey {
        key: "future_planning_and_targets",
        title: "Future Planning & Targets",
        description: "Science-based targets, commitments and innovation pipeline.",
    },
    CategoryKey {
        key: "integrated_performance",
        title: "Integrated Performance Data",
        description: "Environmental ROI, risk integration, green revenue and engagement.",
    },
];

const WASTE_CATEGORIES: &[CategoryKey] = &[
    CategoryKey {
        key: "lever_design_zero_waste",
        title: "Design for Zero Waste & Prevention",
        description: "Upstream waste prevention, source reduction and the carbon impact of \
                      waste generation.",
    },
    CategoryKey {
        key: "lever_material_recovery",
        title: "Material Recovery & Circularity",
        description: "Material recovery and circular economy metrics across recycling, \
                      composting and wastewater treatment.",
    },
    CategoryKey {
        key: "lever_waste_to_energy",
        title: "Waste-to-Energy & Valorization",
        description: "Energy recovery and resource valorization from thermal and biological \
                      treatment processes.",
    },
    CategoryKey {
        key: "lever_regulatory_compliance",
        title: "Regulatory Compliance & Stewardship",
        description: "Compliance, environmental stewardship and operational excellence.",
    },
    CategoryKey {
        key: "carbon_treatment_analysis",
        title: "Carbon Accounting by Treatment",
        description: "Carbon profile analysis for specific waste treatment methods.",
    },
    CategoryKey {
        key: "scope_emissions_waste",
        title: "Scope Emissions from Waste",
        description: "Waste-related emissions categorized by GHG Protocol scopes.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_round_trips_through_str() {
        for domain in Domain::ALL {
            let parsed: Domain = domain.as_str().parse().unwrap();
            assert_eq!(parsed, domain);
        }
    }

    #[test]
    fn test_unknown_domain_is_rejected() {
        let err = "mining".parse::<Domain>().unwrap_err();
        assert!(matches!(err, EsgExtractError::UnknownDomain(ref d) if d == "mining"));
    }

    #[test]
    fn test_category_keys_are_unique_per_domain() {
        for domain in Domain::ALL {
            let keys: Vec<&str> = domain.categories().iter().map(|c| c.key).collect();
            let mut deduped = keys.clone();
            deduped.sort_unstable();
            deduped.dedup();
            assert_eq!(keys.len(), deduped.len(), "duplicate key in {}", domain);
        }
    }

    #[test]
    fn test_category_title_lookup() {
        assert_eq!(
            Domain::Banking.category_title("financed_emissions"),
            Some("Financed Emissions")
        );
        assert_eq!(Domain::Banking.category_title("nope"), None);
    }
}
