//! Corporate Income Tax engine: Small Business Relief banding with the
//! Qualifying Free Zone Person override.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::{TaxConfig, TaxError, TaxResult};
use crate::utils::money::round_money;
use crate::utils::validation::validate_non_negative_amount;

/// Which treatment produced the final CIT figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CitRelief {
    /// No relief applied (loss position, nothing due)
    None,
    /// First band of net income taxed at 0%
    SmallBusinessRelief,
    /// QFZP with qualifying income under the cap, 0% on everything
    QualifyingFreeZone,
}

impl CitRelief {
    /// Method tag stored on audit records
    pub fn method(&self) -> &'static str {
        match self {
            CitRelief::None => "loss-position-no-tax-due",
            CitRelief::SmallBusinessRelief => "small-business-relief-banding",
            CitRelief::QualifyingFreeZone => "qfzp-zero-rate-exemption",
        }
    }
}

/// Computed CIT figures for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitAssessment {
    /// Revenue minus expenses. Negative values are valid losses and are
    /// preserved so loss carry-forward stays representable downstream.
    pub net_income: BigDecimal,
    /// Portion of net income taxed at the standard rate
    pub taxable_income: BigDecimal,
    /// Marginal rate applied to the taxable portion
    pub cit_rate: BigDecimal,
    /// Tax due, never negative
    pub cit_due: BigDecimal,
    /// Treatment that produced the figure
    pub relief_applied: CitRelief,
}

impl CitAssessment {
    /// Compute CIT from aggregated revenue and expense totals.
    ///
    /// QFZP takes precedence: when `is_qfzp` and the qualifying income is
    /// under the cap, nothing is due regardless of the Small Business
    /// computation. A QFZP claim without a qualifying income figure is
    /// rejected rather than defaulted.
    pub fn calculate(
        revenue: &BigDecimal,
        expenses: &BigDecimal,
        is_qfzp: bool,
        qualifying_income: Option<&BigDecimal>,
        config: &TaxConfig,
    ) -> TaxResult<Self> {
        validate_non_negative_amount("revenue", revenue)?;
        validate_non_negative_amount("expenses", expenses)?;

        let net_income = round_money(&(revenue - expenses));
        let zero = BigDecimal::from(0);

        if is_qfzp {
            let qualifying = qualifying_income.ok_or_else(|| {
                TaxError::InvalidInput(
                    "QFZP status requires a qualifying income figure".to_string(),
                )
            })?;
            validate_non_negative_amount("qualifying income", qualifying)?;

            if *qualifying < config.qualifying_income_cap {
                return Ok(Self {
                    net_income,
                    taxable_income: round_money(&zero),
                    cit_rate: zero.clone(),
                    cit_due: round_money(&zero),
                    relief_applied: CitRelief::QualifyingFreeZone,
                });
            }
            // qualifying income at or above the cap falls through to the
            // standard computation
        }

        if net_income <= zero {
            return Ok(Self {
                net_income,
                taxable_income: round_money(&zero),
                cit_rate: zero.clone(),
                cit_due: round_money(&zero),
                relief_applied: CitRelief::None,
            });
        }

        let excess = &net_income - &config.small_business_relief_threshold;
        let (taxable_income, cit_rate, cit_due) = if excess > zero {
            let due = &excess * &config.cit_standard_rate;
            (
                round_money(&excess),
                config.cit_standard_rate.clone(),
                round_money(&due),
            )
        } else {
            (round_money(&zero), zero.clone(), round_money(&zero))
        };

        Ok(Self {
            net_income,
            taxable_income,
            cit_rate,
            cit_due,
            relief_applied: CitRelief::SmallBusinessRelief,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn assess(revenue: i64, expenses: i64) -> CitAssessment {
        CitAssessment::calculate(
            &BigDecimal::from(revenue),
            &BigDecimal::from(expenses),
            false,
            None,
            &TaxConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_income_below_relief_threshold_owes_nothing() {
        for net in [0, 1, 100_000, 375_000] {
            let a = assess(net as i64, 0);
            assert_eq!(a.cit_due, dec("0.00"), "net {net}");
            assert_eq!(a.relief_applied, CitRelief::SmallBusinessRelief);
        }
    }

    #[test]
    fn test_standard_banded_computation() {
        let a = assess(500_000, 100_000);
        assert_eq!(a.net_income, dec("400000.00"));
        assert_eq!(a.taxable_income, dec("25000.00"));
        assert_eq!(a.cit_due, dec("2250.00"));
        assert_eq!(a.relief_applied, CitRelief::SmallBusinessRelief);
    }

    #[test]
    fn test_loss_is_valid_and_preserved() {
        let a = assess(100_000, 250_000);
        assert_eq!(a.net_income, dec("-150000.00"));
        assert_eq!(a.taxable_income, dec("0.00"));
        assert_eq!(a.cit_due, dec("0.00"));
        assert_eq!(a.relief_applied, CitRelief::None);
    }

    #[test]
    fn test_qfzp_under_cap_owes_nothing_regardless_of_income() {
        let a = CitAssessment::calculate(
            &BigDecimal::from(50_000_000),
            &BigDecimal::from(1_000_000),
            true,
            Some(&BigDecimal::from(2_000_000)),
            &TaxConfig::default(),
        )
        .unwrap();
        assert_eq!(a.cit_due, dec("0.00"));
        assert_eq!(a.relief_applied, CitRelief::QualifyingFreeZone);
    }

    #[test]
    fn test_qfzp_over_cap_falls_back_to_standard() {
        let a = CitAssessment::calculate(
            &BigDecimal::from(500_000),
            &BigDecimal::from(100_000),
            true,
            Some(&BigDecimal::from(3_000_000)),
            &TaxConfig::default(),
        )
        .unwrap();
        assert_eq!(a.cit_due, dec("2250.00"));
        assert_eq!(a.relief_applied, CitRelief::SmallBusinessRelief);
    }

    #[test]
    fn test_qfzp_without_qualifying_income_rejected() {
        let err = CitAssessment::calculate(
            &BigDecimal::from(500_000),
            &BigDecimal::from(0),
            true,
            None,
            &TaxConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "InvalidInput");
    }

    #[test]
    fn test_negative_revenue_rejected() {
        let err = CitAssessment::calculate(
            &BigDecimal::from(-1),
            &BigDecimal::from(0),
            false,
            None,
            &TaxConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "InvalidInput");
    }
}
