//! Traits for storage abstraction and external data access

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::record::{AuditKey, AuditRecord, AuditStatus};
use crate::types::*;

/// Filter for audit-trail listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditFilter {
    pub company_id: Option<String>,
    pub calculation_type: Option<CalculationType>,
    pub period: Option<Period>,
    pub status: Option<AuditStatus>,
}

impl AuditFilter {
    /// Whether a record passes every set field
    pub fn matches(&self, record: &AuditRecord) -> bool {
        self.company_id
            .as_ref()
            .is_none_or(|c| &record.company_id == c)
            && self
                .calculation_type
                .is_none_or(|t| record.calculation_type == t)
            && self.period.is_none_or(|p| record.period == p)
            && self.status.is_none_or(|s| record.status == s)
    }
}

/// Persistence abstraction for the audit trail.
///
/// Implementations enforce the one-ACTIVE-record-per-key invariant under
/// their own synchronization: concurrent `insert_active`/`replace_active`
/// calls for the same key must be serialized (a write lock in the memory
/// store, a compare-and-swap on the version column in a SQL store).
/// Reads may run concurrently with writes; snapshot semantics are
/// acceptable.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    /// Persist a new ACTIVE record. Fails with `ActiveRecordConflict`
    /// when an ACTIVE record already exists for the same key.
    async fn insert_active(&self, record: AuditRecord) -> TaxResult<AuditRecord>;

    /// Atomically mark `superseded_id` SUPERSEDED and persist
    /// `replacement` as the new ACTIVE record for the key. Fails with
    /// `ImmutableRecord` when the old record is already terminal.
    async fn replace_active(
        &self,
        superseded_id: Uuid,
        replacement: AuditRecord,
    ) -> TaxResult<AuditRecord>;

    /// Mark a record CANCELLED. Fails with `ImmutableRecord` when the
    /// record is already terminal.
    async fn mark_cancelled(&self, id: Uuid) -> TaxResult<AuditRecord>;

    /// Fetch a record by id
    async fn get(&self, id: Uuid) -> TaxResult<Option<AuditRecord>>;

    /// Fetch the ACTIVE record for a key, if any
    async fn find_active(&self, key: &AuditKey) -> TaxResult<Option<AuditRecord>>;

    /// List records matching a filter
    async fn list(&self, filter: &AuditFilter) -> TaxResult<Vec<AuditRecord>>;
}

/// Read-only access to company data owned by external components.
///
/// The calculation service never fabricates profiles or transactions;
/// when the provider is unreachable the error propagates as
/// `StorageUnavailable` with no fallback to stale data.
#[async_trait]
pub trait CompanyDataProvider: Send + Sync {
    /// Resolve the profile of a company
    async fn company_profile(&self, company_id: &str) -> TaxResult<CompanyProfile>;

    /// Fetch the transactions of a company falling inside a period
    async fn transactions_for_period(
        &self,
        company_id: &str,
        period: &Period,
    ) -> TaxResult<Vec<TransactionRecord>>;
}
