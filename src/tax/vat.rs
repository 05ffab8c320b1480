//! VAT calculation engine
//!
//! Two surfaces: [`VatCalculation`] splits a single amount into
//! net/VAT/gross at a given rate, and [`VatReturnResult`] computes a full
//! return with per-category supplies, input VAT and adjustments.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::aggregation::PeriodTotals;
use crate::types::{TaxConfig, TaxResult};
use crate::utils::money::round_money;
use crate::utils::validation::{validate_non_negative_amount, validate_rate};

/// Method tag stored on audit records produced from aggregated period totals
pub const METHOD_AGGREGATED_RETURN: &str = "aggregated-output-vat-less-recorded-input-vat";

/// Net/VAT/gross split of a single amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatCalculation {
    /// Amount excluding VAT
    pub net_amount: BigDecimal,
    /// VAT portion
    pub vat_amount: BigDecimal,
    /// Amount including VAT
    pub gross_amount: BigDecimal,
    /// Rate used, as a fraction
    pub rate: BigDecimal,
}

impl VatCalculation {
    /// Split `amount` at `rate`.
    ///
    /// When `is_inclusive` the amount is treated as gross: net =
    /// amount / (1 + rate) and VAT is the remainder. Otherwise the amount
    /// is net: VAT = amount * rate. Each figure is rounded half-up to 2
    /// decimal places once, at the end.
    pub fn calculate(amount: &BigDecimal, is_inclusive: bool, rate: &BigDecimal) -> TaxResult<Self> {
        validate_non_negative_amount("amount", amount)?;
        validate_rate(rate)?;

        let (net, vat, gross) = if is_inclusive {
            let net = amount / (BigDecimal::from(1) + rate);
            let vat = amount - &net;
            (net, vat, amount.clone())
        } else {
            let vat = amount * rate;
            let gross = amount + &vat;
            (amount.clone(), vat, gross)
        };

        Ok(Self {
            net_amount: round_money(&net),
            vat_amount: round_money(&vat),
            gross_amount: round_money(&gross),
            rate: rate.clone(),
        })
    }

    /// Split `amount` at the standard rate from the default configuration
    pub fn calculate_standard(amount: &BigDecimal, is_inclusive: bool) -> TaxResult<Self> {
        Self::calculate(amount, is_inclusive, &TaxConfig::default().vat_standard_rate)
    }
}

/// Declared value and VAT for one supply category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplyLine {
    /// Declared value of supplies in the category
    #[serde(default)]
    pub value: BigDecimal,
    /// Declared VAT on those supplies
    #[serde(default)]
    pub vat: BigDecimal,
}

impl SupplyLine {
    pub fn new(value: BigDecimal, vat: BigDecimal) -> Self {
        Self { value, vat }
    }
}

/// Per-category breakdown of a VAT return as declared by the filer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VatReturnBreakdown {
    /// Standard-rated supplies
    #[serde(default)]
    pub standard_rated: SupplyLine,
    /// Zero-rated supplies
    #[serde(default)]
    pub zero_rated: SupplyLine,
    /// Exempt supplies
    #[serde(default)]
    pub exempt: SupplyLine,
    /// Reverse-charge supplies (output VAT self-accounted)
    #[serde(default)]
    pub reverse_charge: SupplyLine,
    /// Input VAT on standard purchases
    #[serde(default)]
    pub input_vat_standard: BigDecimal,
    /// Input VAT on capital assets
    #[serde(default)]
    pub input_vat_capital: BigDecimal,
    /// Input VAT corrections from prior periods
    #[serde(default)]
    pub input_vat_corrections: BigDecimal,
    /// Manual adjustment increasing output VAT
    #[serde(default)]
    pub adjustment_increase: BigDecimal,
    /// Manual adjustment decreasing output VAT
    #[serde(default)]
    pub adjustment_decrease: BigDecimal,
}

impl VatReturnBreakdown {
    fn validate(&self) -> TaxResult<()> {
        let lines = [
            ("standard-rated value", &self.standard_rated.value),
            ("standard-rated VAT", &self.standard_rated.vat),
            ("zero-rated value", &self.zero_rated.value),
            ("zero-rated VAT", &self.zero_rated.vat),
            ("exempt value", &self.exempt.value),
            ("exempt VAT", &self.exempt.vat),
            ("reverse-charge value", &self.reverse_charge.value),
            ("reverse-charge VAT", &self.reverse_charge.vat),
            ("standard input VAT", &self.input_vat_standard),
            ("capital input VAT", &self.input_vat_capital),
            ("input VAT corrections", &self.input_vat_corrections),
            ("adjustment increase", &self.adjustment_increase),
            ("adjustment decrease", &self.adjustment_decrease),
        ];
        for (label, amount) in lines {
            validate_non_negative_amount(label, amount)?;
        }
        Ok(())
    }
}

/// Advisory finding attached to a successful VAT computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Declared VAT deviates from the recomputed figure beyond tolerance
    DeclaredVatMismatch,
    /// Exempt supplies exceed the partial-exemption review threshold
    PartialExemptionReview,
    /// Refund magnitude exceeds the documentation review threshold
    RefundDocumentationReview,
}

/// A compliance warning. Advisory only; warnings never fail a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceWarning {
    pub kind: WarningKind,
    pub message: String,
}

/// Computed VAT return figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatReturnResult {
    /// Total output VAT including adjustments
    pub total_output_vat: BigDecimal,
    /// Total recoverable input VAT
    pub total_input_vat: BigDecimal,
    /// Net VAT payable; negative means a refund is due
    pub net_vat: BigDecimal,
    /// Whether the net position is a refund
    pub is_refund: bool,
    /// Advisory compliance warnings
    pub warnings: Vec<ComplianceWarning>,
}

impl VatReturnResult {
    /// Compute a return from a declared per-category breakdown.
    ///
    /// Declared figures drive the totals; for each category carrying a
    /// non-zero rate the engine independently recomputes the expected VAT
    /// and attaches a warning when the declaration deviates beyond the
    /// configured tolerance. A negative net position is a refund, not an
    /// error.
    pub fn calculate(breakdown: &VatReturnBreakdown, config: &TaxConfig) -> TaxResult<Self> {
        breakdown.validate()?;

        let mut warnings = Vec::new();
        let rated_categories = [
            ("standard-rated supplies", &breakdown.standard_rated),
            ("reverse-charge supplies", &breakdown.reverse_charge),
        ];
        for (label, line) in rated_categories {
            let expected = &line.value * &config.vat_standard_rate;
            let deviation = (&line.vat - &expected).abs();
            if deviation > config.declared_vat_tolerance {
                warnings.push(ComplianceWarning {
                    kind: WarningKind::DeclaredVatMismatch,
                    message: format!(
                        "declared VAT {} on {label} deviates from expected {}",
                        round_money(&line.vat),
                        round_money(&expected)
                    ),
                });
            }
        }

        let output = &breakdown.standard_rated.vat
            + &breakdown.zero_rated.vat
            + &breakdown.exempt.vat
            + &breakdown.reverse_charge.vat
            + &breakdown.adjustment_increase
            - &breakdown.adjustment_decrease;
        let input = &breakdown.input_vat_standard
            + &breakdown.input_vat_capital
            + &breakdown.input_vat_corrections;

        let total_output_vat = round_money(&output);
        let total_input_vat = round_money(&input);
        let net_vat = round_money(&(output - input));
        let is_refund = net_vat < BigDecimal::from(0);

        if breakdown.exempt.value > config.exempt_supply_review_threshold {
            warnings.push(ComplianceWarning {
                kind: WarningKind::PartialExemptionReview,
                message: format!(
                    "exempt supplies of {} exceed {}; partial exemption rules may apply",
                    round_money(&breakdown.exempt.value),
                    config.exempt_supply_review_threshold
                ),
            });
        }
        if is_refund && net_vat.abs() > config.refund_review_threshold {
            warnings.push(ComplianceWarning {
                kind: WarningKind::RefundDocumentationReview,
                message: format!(
                    "refund of {} exceeds {}; supporting documentation should be reviewed",
                    net_vat.abs(),
                    config.refund_review_threshold
                ),
            });
        }

        Ok(Self {
            total_output_vat,
            total_input_vat,
            net_vat,
            is_refund,
            warnings,
        })
    }

    /// Compute a return from aggregated period totals.
    ///
    /// Output VAT is recomputed on the VAT-exclusive revenue total at the
    /// standard rate; input VAT is taken from the VAT recorded against
    /// expenses. This is the single recomputation path shared by the
    /// calculation service and the reconciliation validator.
    pub fn from_totals(totals: &PeriodTotals, config: &TaxConfig) -> TaxResult<Self> {
        let output =
            VatCalculation::calculate(&totals.revenue_total, false, &config.vat_standard_rate)?;
        let total_output_vat = output.vat_amount;
        let total_input_vat = round_money(&totals.input_vat_declared);
        let net_vat = round_money(&(&total_output_vat - &total_input_vat));
        let is_refund = net_vat < BigDecimal::from(0);

        let mut warnings = Vec::new();
        if is_refund && net_vat.abs() > config.refund_review_threshold {
            warnings.push(ComplianceWarning {
                kind: WarningKind::RefundDocumentationReview,
                message: format!(
                    "refund of {} exceeds {}; supporting documentation should be reviewed",
                    net_vat.abs(),
                    config.refund_review_threshold
                ),
            });
        }

        Ok(Self {
            total_output_vat,
            total_input_vat,
            net_vat,
            is_refund,
            warnings,
        })
    }
}
