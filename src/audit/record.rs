//! Audit record types and the record lifecycle state machine

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::tax::cit::CitAssessment;
use crate::tax::vat::VatReturnResult;
use crate::types::{CalculationContext, CalculationType, Period, TaxError, TaxResult};

/// Lifecycle state of an audit record.
///
/// `Active -> Superseded` when a newer calculation replaces it,
/// `Active -> Cancelled` on manual invalidation. Both targets are
/// terminal; terminal records never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    Active,
    Superseded,
    Cancelled,
}

impl AuditStatus {
    /// Whether the state admits no further transitions
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AuditStatus::Active)
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditStatus::Active => write!(f, "ACTIVE"),
            AuditStatus::Superseded => write!(f, "SUPERSEDED"),
            AuditStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// The computed figures embedded in an audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "figures")]
pub enum CalculationOutcome {
    Vat(VatReturnResult),
    Cit(CitAssessment),
}

impl CalculationOutcome {
    /// The calculation type this outcome belongs to
    pub fn calculation_type(&self) -> CalculationType {
        match self {
            CalculationOutcome::Vat(_) => CalculationType::Vat,
            CalculationOutcome::Cit(_) => CalculationType::Cit,
        }
    }

    /// The headline liability figure: net VAT payable or CIT due
    pub fn liability(&self) -> BigDecimal {
        match self {
            CalculationOutcome::Vat(r) => r.net_vat.clone(),
            CalculationOutcome::Cit(a) => a.cit_due.clone(),
        }
    }
}

/// The unique key an ACTIVE record is held under: at most one ACTIVE
/// record exists per key at any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditKey {
    pub company_id: String,
    pub calculation_type: CalculationType,
    pub period: Period,
}

impl AuditKey {
    pub fn new(company_id: impl Into<String>, calculation_type: CalculationType, period: Period) -> Self {
        Self {
            company_id: company_id.into(),
            calculation_type,
            period,
        }
    }
}

/// An immutable, versioned snapshot of one calculation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub company_id: String,
    pub calculation_type: CalculationType,
    pub period: Period,
    /// 1 for the first calculation of a key, incremented on supersede
    pub version: u32,
    pub final_result: CalculationOutcome,
    /// Tag describing the method that produced the result
    pub method_used: String,
    pub status: AuditStatus,
    pub recorded_at: NaiveDateTime,
    /// Principal that requested the calculation
    pub recorded_by: String,
}

impl AuditRecord {
    /// Build a fresh ACTIVE record for `context` at `version`
    pub fn new(
        context: &CalculationContext,
        period: Period,
        version: u32,
        final_result: CalculationOutcome,
        method_used: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id: context.company_id.clone(),
            calculation_type: final_result.calculation_type(),
            period,
            version,
            final_result,
            method_used: method_used.into(),
            status: AuditStatus::Active,
            recorded_at: chrono::Utc::now().naive_utc(),
            recorded_by: context.requested_by.clone(),
        }
    }

    /// The key this record is held under
    pub fn key(&self) -> AuditKey {
        AuditKey::new(self.company_id.clone(), self.calculation_type, self.period)
    }

    /// Fail with `ImmutableRecord` if the record is in a terminal state
    pub fn ensure_mutable(&self) -> TaxResult<()> {
        if self.status.is_terminal() {
            Err(TaxError::ImmutableRecord {
                id: self.id,
                status: self.status.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::vat::VatReturnResult;
    use crate::types::TaxConfig;
    use bigdecimal::BigDecimal;

    fn outcome() -> CalculationOutcome {
        let breakdown = crate::tax::vat::VatReturnBreakdown {
            standard_rated: crate::tax::vat::SupplyLine::new(
                BigDecimal::from(1_000),
                BigDecimal::from(50),
            ),
            ..Default::default()
        };
        CalculationOutcome::Vat(
            VatReturnResult::calculate(&breakdown, &TaxConfig::default()).unwrap(),
        )
    }

    fn record() -> AuditRecord {
        let ctx = CalculationContext::new("company-1", "user-1").unwrap();
        AuditRecord::new(
            &ctx,
            Period::month(2026, 1).unwrap(),
            1,
            outcome(),
            "test-method",
        )
    }

    #[test]
    fn test_new_record_is_active_version() {
        let r = record();
        assert_eq!(r.status, AuditStatus::Active);
        assert_eq!(r.version, 1);
        assert_eq!(r.calculation_type, CalculationType::Vat);
        assert!(r.ensure_mutable().is_ok());
    }

    #[test]
    fn test_terminal_states_are_immutable() {
        for status in [AuditStatus::Superseded, AuditStatus::Cancelled] {
            let mut r = record();
            r.status = status;
            assert!(status.is_terminal());
            let err = r.ensure_mutable().unwrap_err();
            assert_eq!(err.kind(), "ImmutableRecordError");
        }
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&AuditStatus::Superseded).unwrap(),
            "\"SUPERSEDED\""
        );
    }

    #[test]
    fn test_outcome_liability() {
        let o = outcome();
        assert_eq!(o.liability(), BigDecimal::from(50));
        assert_eq!(o.calculation_type(), CalculationType::Vat);
    }
}
