//! Append-only, versioned audit trail of calculation results

use uuid::Uuid;

use crate::audit::record::{AuditKey, AuditRecord, CalculationOutcome};
use crate::traits::{AuditFilter, AuditStorage};
use crate::types::{CalculationContext, Period, TaxError, TaxResult};

/// Manager enforcing the record lifecycle on top of an [`AuditStorage`]
/// backend. Ids, versions and timestamps are assigned here; the storage
/// backend enforces active-key uniqueness.
pub struct AuditTrail<S: AuditStorage> {
    storage: S,
}

impl<S: AuditStorage> AuditTrail<S> {
    /// Create a new audit trail over the given storage backend
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Append a version-1 ACTIVE record for a fresh calculation.
    ///
    /// Fails with `ActiveRecordConflict` when the key already has an
    /// ACTIVE record; callers replace it through [`Self::supersede`].
    pub async fn create(
        &self,
        context: &CalculationContext,
        period: Period,
        outcome: CalculationOutcome,
        method_used: &str,
    ) -> TaxResult<AuditRecord> {
        let record = AuditRecord::new(context, period, 1, outcome, method_used);
        tracing::info!(
            company_id = %record.company_id,
            calculation_type = %record.calculation_type,
            period = %record.period,
            record_id = %record.id,
            "appending audit record"
        );
        self.storage.insert_active(record).await
    }

    /// Replace the ACTIVE record `old_id` with a recalculated result.
    ///
    /// The old record moves to SUPERSEDED and the replacement becomes
    /// ACTIVE at `old.version + 1` as one logical operation.
    pub async fn supersede(
        &self,
        old_id: Uuid,
        context: &CalculationContext,
        outcome: CalculationOutcome,
        method_used: &str,
    ) -> TaxResult<AuditRecord> {
        let old = self.get_required(old_id).await?;
        old.ensure_mutable()?;
        if old.company_id != context.company_id {
            return Err(TaxError::RecordNotFound(old_id));
        }

        let replacement =
            AuditRecord::new(context, old.period, old.version + 1, outcome, method_used);
        tracing::info!(
            company_id = %replacement.company_id,
            calculation_type = %replacement.calculation_type,
            period = %replacement.period,
            old_record_id = %old_id,
            record_id = %replacement.id,
            version = replacement.version,
            "superseding audit record"
        );
        self.storage.replace_active(old_id, replacement).await
    }

    /// Manually invalidate an ACTIVE record
    pub async fn cancel(&self, id: Uuid) -> TaxResult<AuditRecord> {
        tracing::info!(record_id = %id, "cancelling audit record");
        self.storage.mark_cancelled(id).await
    }

    /// Fetch a record by id
    pub async fn get(&self, id: Uuid) -> TaxResult<Option<AuditRecord>> {
        self.storage.get(id).await
    }

    /// Fetch a record by id, failing with `RecordNotFound` when absent
    pub async fn get_required(&self, id: Uuid) -> TaxResult<AuditRecord> {
        self.storage
            .get(id)
            .await?
            .ok_or(TaxError::RecordNotFound(id))
    }

    /// The ACTIVE record for a key, if any
    pub async fn find_active(&self, key: &AuditKey) -> TaxResult<Option<AuditRecord>> {
        self.storage.find_active(key).await
    }

    /// List records matching a filter
    pub async fn list(&self, filter: &AuditFilter) -> TaxResult<Vec<AuditRecord>> {
        self.storage.list(filter).await
    }
}
