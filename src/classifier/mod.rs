//! SME compliance tier classification
//!
//! One ordered rule table is the single authority for tier thresholds;
//! the final row has no bounds, so every input maps to exactly one tier.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::EntityType;

/// Compliance tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SmeTier {
    Micro,
    Small,
    SmallBusiness,
    Medium,
    Large,
}

impl SmeTier {
    /// Reporting name of the tier
    pub fn name(&self) -> &'static str {
        match self {
            SmeTier::Micro => "Micro",
            SmeTier::Small => "Small",
            SmeTier::SmallBusiness => "Small Business",
            SmeTier::Medium => "Medium",
            SmeTier::Large => "Large",
        }
    }
}

/// Basis on which financial statements are prepared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementBasis {
    Cash,
    Accrual,
}

/// The compliance tier assigned to an entity together with the
/// obligations it carries. Produced by [`classify`]; not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmeCategory {
    pub tier: SmeTier,
    /// Reporting name, e.g. "Small Business"
    pub name: String,
    /// CIT rate applicable to the tier, as a fraction
    pub cit_rate: BigDecimal,
    /// Whether VAT registration is required
    pub vat_registration_required: bool,
    /// Financial statement basis
    pub statement_basis: StatementBasis,
    /// Whether transfer pricing documentation is required
    pub transfer_pricing_required: bool,
    /// Entity type the classification was made for
    pub entity_type: EntityType,
    /// Textual obligations for reporting; always non-empty
    pub obligations: Vec<String>,
}

struct TierRule {
    tier: SmeTier,
    /// Exclusive revenue upper bound; `None` means unbounded
    max_revenue: Option<i64>,
    /// Exclusive employee-count upper bound; `None` means unbounded
    max_employees: Option<u32>,
    /// CIT rate in whole percent
    cit_rate_pct: u32,
    vat_registration_required: bool,
    statement_basis: StatementBasis,
    transfer_pricing_required: bool,
    obligations: &'static [&'static str],
}

/// Rules are evaluated top to bottom; the first match wins and the last
/// row is a catch-all.
const TIER_RULES: &[TierRule] = &[
    TierRule {
        tier: SmeTier::Micro,
        max_revenue: Some(375_000),
        max_employees: None,
        cit_rate_pct: 0,
        vat_registration_required: false,
        statement_basis: StatementBasis::Cash,
        transfer_pricing_required: false,
        obligations: &[
            "Register for corporate tax with the federal tax authority",
            "Maintain cash-basis books of account",
            "Retain invoices and receipts for the statutory period",
        ],
    },
    TierRule {
        tier: SmeTier::Small,
        max_revenue: Some(3_000_000),
        max_employees: None,
        cit_rate_pct: 0,
        vat_registration_required: true,
        statement_basis: StatementBasis::Cash,
        transfer_pricing_required: false,
        obligations: &[
            "Register for VAT and file periodic VAT returns",
            "Maintain cash-basis books of account",
            "File a corporate tax return and elect Small Business Relief if claimed",
        ],
    },
    TierRule {
        tier: SmeTier::SmallBusiness,
        max_revenue: Some(25_000_000),
        max_employees: Some(100),
        cit_rate_pct: 9,
        vat_registration_required: true,
        statement_basis: StatementBasis::Accrual,
        transfer_pricing_required: true,
        obligations: &[
            "Register for VAT and file periodic VAT returns",
            "Prepare accrual-basis financial statements",
            "Maintain transfer pricing documentation for related-party dealings",
            "File a corporate tax return within nine months of the financial year end",
        ],
    },
    TierRule {
        tier: SmeTier::Medium,
        max_revenue: Some(150_000_000),
        max_employees: Some(250),
        cit_rate_pct: 9,
        vat_registration_required: true,
        statement_basis: StatementBasis::Accrual,
        transfer_pricing_required: true,
        obligations: &[
            "Register for VAT and file periodic VAT returns",
            "Prepare audited accrual-basis financial statements",
            "Maintain transfer pricing documentation for related-party dealings",
            "File a corporate tax return within nine months of the financial year end",
        ],
    },
    TierRule {
        tier: SmeTier::Large,
        max_revenue: None,
        max_employees: None,
        cit_rate_pct: 9,
        vat_registration_required: true,
        statement_basis: StatementBasis::Accrual,
        transfer_pricing_required: true,
        obligations: &[
            "Register for VAT and file periodic VAT returns",
            "Prepare audited accrual-basis financial statements",
            "Maintain a transfer pricing master and local file",
            "Submit the transfer pricing disclosure form with the tax return",
            "File a corporate tax return within nine months of the financial year end",
        ],
    },
];

impl TierRule {
    fn matches(&self, annual_revenue: &BigDecimal, employee_count: u32) -> bool {
        let revenue_ok = self
            .max_revenue
            .map_or(true, |cap| *annual_revenue < BigDecimal::from(cap));
        let employees_ok = self.max_employees.map_or(true, |cap| employee_count < cap);
        revenue_ok && employees_ok
    }

    fn category(&self, entity_type: EntityType) -> SmeCategory {
        SmeCategory {
            tier: self.tier,
            name: self.tier.name().to_string(),
            cit_rate: BigDecimal::from(self.cit_rate_pct) / BigDecimal::from(100),
            vat_registration_required: self.vat_registration_required,
            statement_basis: self.statement_basis,
            transfer_pricing_required: self.transfer_pricing_required,
            entity_type,
            obligations: self.obligations.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Classify an entity into its compliance tier.
///
/// Total over its domain: every (revenue, employee count, entity type)
/// input maps to exactly one tier, so this never fails.
pub fn classify(
    annual_revenue: &BigDecimal,
    employee_count: u32,
    entity_type: EntityType,
) -> SmeCategory {
    let rule = TIER_RULES
        .iter()
        .find(|rule| rule.matches(annual_revenue, employee_count))
        .unwrap_or(&TIER_RULES[TIER_RULES.len() - 1]);
    rule.category(entity_type)
}
