//! Calculation service: orchestrates data access, engine selection and
//! audit persistence. All numeric work lives in the engines; this module
//! only wires them together.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregation::totals_for_period;
use crate::audit::record::{AuditKey, AuditRecord, CalculationOutcome};
use crate::audit::trail::AuditTrail;
use crate::reconciliation::{ReconciliationReport, ReconciliationValidator};
use crate::tax::cit::CitAssessment;
use crate::tax::vat::{self, VatReturnResult};
use crate::traits::{AuditFilter, AuditStorage, CompanyDataProvider};
use crate::types::*;

/// An audit record joined with the transactions that produced it, for
/// downstream export consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationBreakdown {
    pub record: AuditRecord,
    pub transactions: Vec<TransactionRecord>,
}

/// Orchestrator over the engines, the audit trail and an injected
/// read-only data provider.
pub struct CalculationService<S: AuditStorage, P: CompanyDataProvider> {
    trail: AuditTrail<S>,
    provider: P,
    validator: ReconciliationValidator,
    config: TaxConfig,
}

impl<S: AuditStorage, P: CompanyDataProvider> CalculationService<S, P> {
    /// Service with the default statutory configuration
    pub fn new(storage: S, provider: P) -> Self {
        Self::with_config(storage, provider, TaxConfig::default())
    }

    /// Service with explicit configuration
    pub fn with_config(storage: S, provider: P, config: TaxConfig) -> Self {
        Self {
            trail: AuditTrail::new(storage),
            provider,
            validator: ReconciliationValidator::with_config(config.clone()),
            config,
        }
    }

    /// Compute a liability for the period and persist it as the ACTIVE
    /// audit record for (company, type, period).
    ///
    /// A previous ACTIVE record for the key is superseded; its version
    /// carries forward incremented. Losing a create race falls back to
    /// the supersede path once; a second conflict surfaces to the caller.
    pub async fn compute(
        &self,
        context: &CalculationContext,
        calculation_type: CalculationType,
        period: Period,
    ) -> TaxResult<AuditRecord> {
        let (outcome, method) = self.run_engine(context, calculation_type, &period).await?;
        let key = AuditKey::new(context.company_id.clone(), calculation_type, period);

        tracing::info!(
            company_id = %context.company_id,
            calculation_type = %calculation_type,
            period = %period,
            liability = %outcome.liability(),
            "computed liability"
        );

        match self.trail.find_active(&key).await? {
            Some(existing) => {
                self.trail
                    .supersede(existing.id, context, outcome, method)
                    .await
            }
            None => {
                match self
                    .trail
                    .create(context, period, outcome.clone(), method)
                    .await
                {
                    Err(TaxError::ActiveRecordConflict { .. }) => {
                        let existing = self
                            .trail
                            .find_active(&key)
                            .await?
                            .ok_or(TaxError::ActiveRecordConflict {
                                company_id: key.company_id.clone(),
                                calculation_type,
                                period,
                            })?;
                        self.trail
                            .supersede(existing.id, context, outcome, method)
                            .await
                    }
                    other => other,
                }
            }
        }
    }

    /// Recompute from source transactions and compare with a stored
    /// figure. Read-only; a mismatch is a reportable result.
    pub async fn validate(
        &self,
        context: &CalculationContext,
        calculation_type: CalculationType,
        period: Period,
        expected_amount: &BigDecimal,
    ) -> TaxResult<ReconciliationReport> {
        let input = self
            .resolve_input(context, calculation_type, period)
            .await?;
        self.validator.validate(
            calculation_type,
            &period,
            expected_amount,
            &input.transactions,
            &input.profile,
        )
    }

    /// Join an audit record with its originating transaction list
    pub async fn breakdown(
        &self,
        context: &CalculationContext,
        audit_id: Uuid,
    ) -> TaxResult<CalculationBreakdown> {
        let record = self.trail.get_required(audit_id).await?;
        if record.company_id != context.company_id {
            // records of other companies are invisible, not forbidden
            return Err(TaxError::RecordNotFound(audit_id));
        }
        let transactions = self
            .provider
            .transactions_for_period(&record.company_id, &record.period)
            .await?;
        Ok(CalculationBreakdown {
            record,
            transactions,
        })
    }

    /// Manually invalidate an ACTIVE record of the calling company
    pub async fn cancel(
        &self,
        context: &CalculationContext,
        audit_id: Uuid,
    ) -> TaxResult<AuditRecord> {
        let record = self.trail.get_required(audit_id).await?;
        if record.company_id != context.company_id {
            return Err(TaxError::RecordNotFound(audit_id));
        }
        self.trail.cancel(audit_id).await
    }

    /// Calculation history of the calling company. The audit trail is
    /// the single authoritative log; the filter's company scope is
    /// forced to the caller's.
    pub async fn history(
        &self,
        context: &CalculationContext,
        filter: AuditFilter,
    ) -> TaxResult<Vec<AuditRecord>> {
        let scoped = AuditFilter {
            company_id: Some(context.company_id.clone()),
            ..filter
        };
        self.trail.list(&scoped).await
    }

    async fn resolve_input(
        &self,
        context: &CalculationContext,
        calculation_type: CalculationType,
        period: Period,
    ) -> TaxResult<CalculationInput> {
        let profile = self.provider.company_profile(&context.company_id).await?;
        let transactions = self
            .provider
            .transactions_for_period(&context.company_id, &period)
            .await?;
        let input = CalculationInput {
            context: context.clone(),
            calculation_type,
            period,
            transactions,
            profile,
        };
        input.validate()?;
        Ok(input)
    }

    async fn run_engine(
        &self,
        context: &CalculationContext,
        calculation_type: CalculationType,
        period: &Period,
    ) -> TaxResult<(CalculationOutcome, &'static str)> {
        let input = self
            .resolve_input(context, calculation_type, *period)
            .await?;
        let totals = totals_for_period(&input.transactions, period)?;

        match calculation_type {
            CalculationType::Vat => {
                let result = VatReturnResult::from_totals(&totals, &self.config)?;
                Ok((
                    CalculationOutcome::Vat(result),
                    vat::METHOD_AGGREGATED_RETURN,
                ))
            }
            CalculationType::Cit => {
                let assessment = CitAssessment::calculate(
                    &totals.revenue_total,
                    &totals.expense_total,
                    input.profile.is_qfzp,
                    input.profile.qualifying_income.as_ref(),
                    &self.config,
                )?;
                let method = assessment.relief_applied.method();
                Ok((CalculationOutcome::Cit(assessment), method))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::record::AuditStatus;
    use crate::utils::memory::{MemoryAuditStore, StaticDataProvider};
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn profile() -> CompanyProfile {
        CompanyProfile {
            name: "Acme Trading LLC".to_string(),
            annual_revenue: BigDecimal::from(5_000_000),
            employee_count: 30,
            entity_type: EntityType::Mainland,
            is_free_zone: false,
            is_qfzp: false,
            qualifying_income: None,
        }
    }

    fn transactions() -> Vec<TransactionRecord> {
        let jan = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        vec![
            TransactionRecord::revenue(
                "r1".to_string(),
                BigDecimal::from(100_000),
                BigDecimal::from(5_000),
                jan,
                "sales".to_string(),
            ),
            TransactionRecord::expense(
                "e1".to_string(),
                BigDecimal::from(40_000),
                BigDecimal::from(2_000),
                jan,
                "operations".to_string(),
            ),
        ]
    }

    fn service() -> CalculationService<MemoryAuditStore, StaticDataProvider> {
        let provider =
            StaticDataProvider::new().with_company("company-1", profile(), transactions());
        CalculationService::new(MemoryAuditStore::new(), provider)
    }

    fn ctx() -> CalculationContext {
        CalculationContext::new("company-1", "user-1").unwrap()
    }

    #[tokio::test]
    async fn test_compute_vat_creates_active_record() {
        let service = service();
        let record = service
            .compute(&ctx(), CalculationType::Vat, Period::month(2026, 1).unwrap())
            .await
            .unwrap();

        assert_eq!(record.status, AuditStatus::Active);
        assert_eq!(record.version, 1);
        assert_eq!(record.method_used, vat::METHOD_AGGREGATED_RETURN);
        // output 5,000 on 100,000 revenue, input 2,000 recorded
        assert_eq!(record.final_result.liability(), dec("3000.00"));
    }

    #[tokio::test]
    async fn test_recompute_supersedes() {
        let service = service();
        let period = Period::month(2026, 1).unwrap();

        let v1 = service
            .compute(&ctx(), CalculationType::Vat, period)
            .await
            .unwrap();
        let v2 = service
            .compute(&ctx(), CalculationType::Vat, period)
            .await
            .unwrap();

        assert_eq!(v2.version, 2);
        assert_eq!(v2.status, AuditStatus::Active);

        let history = service
            .history(&ctx(), AuditFilter::default())
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        let old = history.iter().find(|r| r.id == v1.id).unwrap();
        assert_eq!(old.status, AuditStatus::Superseded);
    }

    #[tokio::test]
    async fn test_compute_cit_annual() {
        let service = service();
        let record = service
            .compute(&ctx(), CalculationType::Cit, Period::annual(2026))
            .await
            .unwrap();

        // net income 60,000 is under the relief threshold
        assert_eq!(record.final_result.liability(), dec("0.00"));
        assert_eq!(record.method_used, "small-business-relief-banding");
    }

    #[tokio::test]
    async fn test_validate_round_trips_computed_figure() {
        let service = service();
        let period = Period::month(2026, 1).unwrap();
        let record = service
            .compute(&ctx(), CalculationType::Vat, period)
            .await
            .unwrap();

        let report = service
            .validate(
                &ctx(),
                CalculationType::Vat,
                period,
                &record.final_result.liability(),
            )
            .await
            .unwrap();
        assert!(report.is_valid);
        assert_eq!(report.difference, dec("0.00"));
    }

    #[tokio::test]
    async fn test_breakdown_joins_transactions() {
        let service = service();
        let record = service
            .compute(&ctx(), CalculationType::Vat, Period::month(2026, 1).unwrap())
            .await
            .unwrap();

        let breakdown = service.breakdown(&ctx(), record.id).await.unwrap();
        assert_eq!(breakdown.record.id, record.id);
        assert_eq!(breakdown.transactions.len(), 2);
    }

    #[tokio::test]
    async fn test_foreign_records_are_invisible() {
        let service = service();
        let record = service
            .compute(&ctx(), CalculationType::Vat, Period::month(2026, 1).unwrap())
            .await
            .unwrap();

        let other = CalculationContext::new("company-2", "user-2").unwrap();
        let err = service.breakdown(&other, record.id).await.unwrap_err();
        assert_eq!(err.kind(), "RecordNotFound");
        let err = service.cancel(&other, record.id).await.unwrap_err();
        assert_eq!(err.kind(), "RecordNotFound");
    }

    #[tokio::test]
    async fn test_cancel_frees_the_key() {
        let service = service();
        let period = Period::month(2026, 1).unwrap();
        let record = service
            .compute(&ctx(), CalculationType::Vat, period)
            .await
            .unwrap();

        let cancelled = service.cancel(&ctx(), record.id).await.unwrap();
        assert_eq!(cancelled.status, AuditStatus::Cancelled);

        let next = service
            .compute(&ctx(), CalculationType::Vat, period)
            .await
            .unwrap();
        assert_eq!(next.version, 1);
    }

    #[tokio::test]
    async fn test_qfzp_profile_without_income_is_rejected() {
        let mut p = profile();
        p.is_qfzp = true;
        let provider = StaticDataProvider::new().with_company("company-1", p, transactions());
        let service = CalculationService::new(MemoryAuditStore::new(), provider);

        let err = service
            .compute(&ctx(), CalculationType::Cit, Period::annual(2026))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidInput");
    }
}
