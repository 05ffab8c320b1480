//! Reconciliation: independent recomputation of a stored calculation
//! from its source transactions.
//!
//! A mismatch is a normal, reportable outcome. Nothing here mutates
//! state and nothing throws for a disagreement between the stored and
//! recomputed figures.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::aggregation::totals_for_period;
use crate::tax::cit::CitAssessment;
use crate::tax::vat::VatReturnResult;
use crate::types::*;
use crate::utils::money::{comparison_tolerance, round_money};

/// Outcome of comparing a stored figure against a fresh recomputation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub calculation_type: CalculationType,
    pub period: Period,
    /// Whether the figures agree within 0.01
    pub is_valid: bool,
    /// Freshly recomputed liability
    pub calculated_amount: BigDecimal,
    /// The stored figure under verification
    pub expected_amount: BigDecimal,
    /// Absolute difference between the two
    pub difference: BigDecimal,
    pub message: String,
}

/// Recomputes calculations from raw transactions and compares them to
/// stored figures. The stored figure is never trusted as an input to the
/// recomputation.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationValidator {
    config: TaxConfig,
}

impl ReconciliationValidator {
    /// Validator using the default statutory configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator with explicit configuration
    pub fn with_config(config: TaxConfig) -> Self {
        Self { config }
    }

    /// Recompute `calculation_type` for `period` from `transactions` and
    /// compare against `expected_amount`.
    ///
    /// Errors only signal invalid input; a mismatch comes back as a
    /// report with `is_valid = false`.
    pub fn validate(
        &self,
        calculation_type: CalculationType,
        period: &Period,
        expected_amount: &BigDecimal,
        transactions: &[TransactionRecord],
        profile: &CompanyProfile,
    ) -> TaxResult<ReconciliationReport> {
        let totals = totals_for_period(transactions, period)?;

        let calculated_amount = match calculation_type {
            CalculationType::Vat => {
                VatReturnResult::from_totals(&totals, &self.config)?.net_vat
            }
            CalculationType::Cit => {
                CitAssessment::calculate(
                    &totals.revenue_total,
                    &totals.expense_total,
                    profile.is_qfzp,
                    profile.qualifying_income.as_ref(),
                    &self.config,
                )?
                .cit_due
            }
        };

        let expected_amount = round_money(expected_amount);
        let difference = round_money(&(&calculated_amount - &expected_amount).abs());
        let is_valid = difference < comparison_tolerance();

        let message = if is_valid {
            format!("recomputed {calculation_type} for {period} matches the stored figure")
        } else {
            format!(
                "recomputed {calculation_type} for {period} is {calculated_amount}, \
                 stored figure is {expected_amount}, difference {difference}"
            )
        };

        Ok(ReconciliationReport {
            calculation_type,
            period: *period,
            is_valid,
            calculated_amount,
            expected_amount,
            difference,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn profile() -> CompanyProfile {
        CompanyProfile {
            name: "Acme".to_string(),
            annual_revenue: BigDecimal::from(800_000),
            employee_count: 8,
            entity_type: EntityType::Mainland,
            is_free_zone: false,
            is_qfzp: false,
            qualifying_income: None,
        }
    }

    // revenue 63,000 at 5% -> output VAT 3,150, no input VAT
    fn vat_transactions() -> Vec<TransactionRecord> {
        vec![TransactionRecord::revenue(
            "r1".to_string(),
            BigDecimal::from(63_000),
            dec("3150"),
            NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
            "sales".to_string(),
        )]
    }

    #[test]
    fn test_matching_figures_are_valid() {
        let report = ReconciliationValidator::new()
            .validate(
                CalculationType::Vat,
                &Period::month(2026, 1).unwrap(),
                &dec("3150.00"),
                &vat_transactions(),
                &profile(),
            )
            .unwrap();

        assert!(report.is_valid);
        assert_eq!(report.calculated_amount, dec("3150.00"));
        assert_eq!(report.difference, dec("0.00"));
    }

    #[test]
    fn test_mismatch_is_reported_not_thrown() {
        let report = ReconciliationValidator::new()
            .validate(
                CalculationType::Vat,
                &Period::month(2026, 1).unwrap(),
                &dec("3200.00"),
                &vat_transactions(),
                &profile(),
            )
            .unwrap();

        assert!(!report.is_valid);
        assert_eq!(report.calculated_amount, dec("3150.00"));
        assert_eq!(report.expected_amount, dec("3200.00"));
        assert_eq!(report.difference, dec("50.00"));
        assert!(report.message.contains("difference"));
    }

    #[test]
    fn test_cit_reconciliation() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        let txns = vec![
            TransactionRecord::revenue(
                "r1".to_string(),
                BigDecimal::from(500_000),
                BigDecimal::from(0),
                date,
                "sales".to_string(),
            ),
            TransactionRecord::expense(
                "e1".to_string(),
                BigDecimal::from(100_000),
                BigDecimal::from(0),
                date,
                "operations".to_string(),
            ),
        ];

        let report = ReconciliationValidator::new()
            .validate(
                CalculationType::Cit,
                &Period::annual(2026),
                &dec("2250.00"),
                &txns,
                &profile(),
            )
            .unwrap();
        assert!(report.is_valid);
    }

    #[test]
    fn test_invalid_transactions_still_error() {
        let mut txns = vat_transactions();
        txns[0].amount = BigDecimal::from(-1);
        let err = ReconciliationValidator::new()
            .validate(
                CalculationType::Vat,
                &Period::month(2026, 1).unwrap(),
                &dec("0"),
                &txns,
                &profile(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidInput");
    }
}
