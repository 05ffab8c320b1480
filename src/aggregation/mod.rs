//! Transaction aggregation: pure bucketing of ledger records by period
//! and revenue/expense side. No I/O happens here.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::types::*;
use crate::utils::validation::validate_transactions;

/// Aggregated revenue/expense figures for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    /// Period the totals cover
    pub period: Period,
    /// Sum of revenue amounts (VAT-exclusive)
    pub revenue_total: BigDecimal,
    /// Sum of expense amounts (VAT-exclusive)
    pub expense_total: BigDecimal,
    /// VAT recorded against revenue transactions
    pub output_vat_declared: BigDecimal,
    /// VAT recorded against expense transactions
    pub input_vat_declared: BigDecimal,
    /// Revenue subtotals per category
    pub revenue_by_category: HashMap<String, BigDecimal>,
    /// Expense subtotals per category
    pub expense_by_category: HashMap<String, BigDecimal>,
    /// Number of transactions absorbed
    pub transaction_count: usize,
}

impl PeriodTotals {
    fn empty(period: Period) -> Self {
        Self {
            period,
            revenue_total: BigDecimal::from(0),
            expense_total: BigDecimal::from(0),
            output_vat_declared: BigDecimal::from(0),
            input_vat_declared: BigDecimal::from(0),
            revenue_by_category: HashMap::new(),
            expense_by_category: HashMap::new(),
            transaction_count: 0,
        }
    }

    fn absorb(&mut self, txn: &TransactionRecord) {
        let (total, vat, by_category) = match txn.transaction_type {
            TransactionType::Revenue => (
                &mut self.revenue_total,
                &mut self.output_vat_declared,
                &mut self.revenue_by_category,
            ),
            TransactionType::Expense => (
                &mut self.expense_total,
                &mut self.input_vat_declared,
                &mut self.expense_by_category,
            ),
        };
        *total += &txn.amount;
        *vat += &txn.vat_amount;
        *by_category
            .entry(txn.category.clone())
            .or_insert_with(|| BigDecimal::from(0)) += &txn.amount;
        self.transaction_count += 1;
    }
}

/// Aggregate the transactions falling inside `period`.
///
/// The whole batch is validated up front; a single negative amount rejects
/// the call with `InvalidInput` and nothing is aggregated.
pub fn totals_for_period(
    transactions: &[TransactionRecord],
    period: &Period,
) -> TaxResult<PeriodTotals> {
    validate_transactions(transactions)?;

    let mut totals = PeriodTotals::empty(*period);
    for txn in transactions {
        if period.contains(txn.transaction_date) {
            totals.absorb(txn);
        }
    }
    Ok(totals)
}

/// Bucket a flat transaction list into monthly totals, ordered by period
pub fn bucket_by_month(
    transactions: &[TransactionRecord],
) -> TaxResult<BTreeMap<Period, PeriodTotals>> {
    validate_transactions(transactions)?;

    let mut buckets: BTreeMap<Period, PeriodTotals> = BTreeMap::new();
    for txn in transactions {
        let period = Period::month_of(txn.transaction_date);
        buckets
            .entry(period)
            .or_insert_with(|| PeriodTotals::empty(period))
            .absorb(txn);
    }
    Ok(buckets)
}
