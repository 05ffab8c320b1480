//! Validation utilities

use crate::types::*;
use bigdecimal::BigDecimal;

/// Validate that a monetary amount is non-negative
pub fn validate_non_negative_amount(label: &str, amount: &BigDecimal) -> TaxResult<()> {
    if *amount < BigDecimal::from(0) {
        Err(TaxError::InvalidInput(format!(
            "{label} must be non-negative, got {amount}"
        )))
    } else {
        Ok(())
    }
}

/// Validate that a tax rate is non-negative
pub fn validate_rate(rate: &BigDecimal) -> TaxResult<()> {
    if *rate < BigDecimal::from(0) {
        Err(TaxError::InvalidInput(format!(
            "rate must be non-negative, got {rate}"
        )))
    } else {
        Ok(())
    }
}

/// Parse and validate a period string (`2026`, `2026-03` or `2026-Q1`)
pub fn validate_period_str(period: &str) -> TaxResult<Period> {
    period.parse()
}

/// Validate a batch of transaction records before aggregation
pub fn validate_transactions(transactions: &[TransactionRecord]) -> TaxResult<()> {
    for txn in transactions {
        validate_non_negative_amount(&format!("transaction '{}' amount", txn.id), &txn.amount)?;
        validate_non_negative_amount(
            &format!("transaction '{}' VAT amount", txn.id),
            &txn.vat_amount,
        )?;
    }
    Ok(())
}
