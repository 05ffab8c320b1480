//! In-memory implementations of the storage and data-provider traits,
//! for testing and development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::audit::record::{AuditKey, AuditRecord, AuditStatus};
use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<Uuid, AuditRecord>,
    /// Index of the single ACTIVE record per key
    active: HashMap<AuditKey, Uuid>,
}

/// In-memory audit storage.
///
/// The uniqueness invariant is enforced under one write lock: conflict
/// check and insert happen in the same critical section, so concurrent
/// creates for the same key serialize here.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryAuditStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.records.clear();
            inner.active.clear();
        }
    }

    fn write_lock(&self) -> TaxResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| TaxError::StorageUnavailable("audit store lock poisoned".to_string()))
    }

    fn read_lock(&self) -> TaxResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| TaxError::StorageUnavailable("audit store lock poisoned".to_string()))
    }
}

#[async_trait]
impl AuditStorage for MemoryAuditStore {
    async fn insert_active(&self, record: AuditRecord) -> TaxResult<AuditRecord> {
        let mut inner = self.write_lock()?;
        let key = record.key();
        if inner.active.contains_key(&key) {
            return Err(TaxError::ActiveRecordConflict {
                company_id: key.company_id,
                calculation_type: key.calculation_type,
                period: key.period,
            });
        }
        inner.active.insert(key, record.id);
        inner.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn replace_active(
        &self,
        superseded_id: Uuid,
        replacement: AuditRecord,
    ) -> TaxResult<AuditRecord> {
        let mut inner = self.write_lock()?;

        let old = inner
            .records
            .get(&superseded_id)
            .ok_or(TaxError::RecordNotFound(superseded_id))?;
        old.ensure_mutable()?;
        let key = old.key();
        if key != replacement.key() {
            return Err(TaxError::InvalidInput(
                "replacement record targets a different calculation key".to_string(),
            ));
        }

        if let Some(old) = inner.records.get_mut(&superseded_id) {
            old.status = AuditStatus::Superseded;
        }
        inner.active.insert(key, replacement.id);
        inner.records.insert(replacement.id, replacement.clone());
        Ok(replacement)
    }

    async fn mark_cancelled(&self, id: Uuid) -> TaxResult<AuditRecord> {
        let mut inner = self.write_lock()?;

        let record = inner
            .records
            .get(&id)
            .ok_or(TaxError::RecordNotFound(id))?;
        record.ensure_mutable()?;
        let key = record.key();

        inner.active.remove(&key);
        let record = inner
            .records
            .get_mut(&id)
            .ok_or(TaxError::RecordNotFound(id))?;
        record.status = AuditStatus::Cancelled;
        Ok(record.clone())
    }

    async fn get(&self, id: Uuid) -> TaxResult<Option<AuditRecord>> {
        Ok(self.read_lock()?.records.get(&id).cloned())
    }

    async fn find_active(&self, key: &AuditKey) -> TaxResult<Option<AuditRecord>> {
        let inner = self.read_lock()?;
        Ok(inner
            .active
            .get(key)
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    async fn list(&self, filter: &AuditFilter) -> TaxResult<Vec<AuditRecord>> {
        let inner = self.read_lock()?;
        let mut records: Vec<AuditRecord> = inner
            .records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.recorded_at
                .cmp(&b.recorded_at)
                .then(a.version.cmp(&b.version))
        });
        Ok(records)
    }
}

/// Data provider backed by fixed in-memory fixtures
#[derive(Debug, Clone, Default)]
pub struct StaticDataProvider {
    profiles: HashMap<String, CompanyProfile>,
    transactions: HashMap<String, Vec<TransactionRecord>>,
}

impl StaticDataProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a company with its profile and transaction history
    pub fn with_company(
        mut self,
        company_id: impl Into<String>,
        profile: CompanyProfile,
        transactions: Vec<TransactionRecord>,
    ) -> Self {
        let company_id = company_id.into();
        self.profiles.insert(company_id.clone(), profile);
        self.transactions.insert(company_id, transactions);
        self
    }
}

#[async_trait]
impl CompanyDataProvider for StaticDataProvider {
    async fn company_profile(&self, company_id: &str) -> TaxResult<CompanyProfile> {
        self.profiles
            .get(company_id)
            .cloned()
            .ok_or_else(|| TaxError::InvalidInput(format!("unknown company: {company_id}")))
    }

    async fn transactions_for_period(
        &self,
        company_id: &str,
        period: &Period,
    ) -> TaxResult<Vec<TransactionRecord>> {
        let all = self
            .transactions
            .get(company_id)
            .ok_or_else(|| TaxError::InvalidInput(format!("unknown company: {company_id}")))?;
        Ok(all
            .iter()
            .filter(|txn| period.contains(txn.transaction_date))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn profile() -> CompanyProfile {
        CompanyProfile {
            name: "Acme".to_string(),
            annual_revenue: BigDecimal::from(1_000_000),
            employee_count: 12,
            entity_type: EntityType::Mainland,
            is_free_zone: false,
            is_qfzp: false,
            qualifying_income: None,
        }
    }

    #[tokio::test]
    async fn test_provider_filters_by_period() {
        let txns = vec![
            TransactionRecord::revenue(
                "r1".to_string(),
                BigDecimal::from(100),
                BigDecimal::from(5),
                NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
                "sales".to_string(),
            ),
            TransactionRecord::revenue(
                "r2".to_string(),
                BigDecimal::from(200),
                BigDecimal::from(10),
                NaiveDate::from_ymd_opt(2026, 5, 10).unwrap(),
                "sales".to_string(),
            ),
        ];
        let provider = StaticDataProvider::new().with_company("c1", profile(), txns);

        let q1 = Period::quarter(2026, 1).unwrap();
        let fetched = provider.transactions_for_period("c1", &q1).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].id, "r1");
    }

    #[tokio::test]
    async fn test_unknown_company_is_rejected() {
        let provider = StaticDataProvider::new();
        assert!(provider.company_profile("nope").await.is_err());
        assert!(provider
            .transactions_for_period("nope", &Period::annual(2026))
            .await
            .is_err());
    }
}
