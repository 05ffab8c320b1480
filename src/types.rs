//! Core types and data structures for the tax engine

use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Whether a transaction records money coming in or going out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Money earned by the entity (sales, services, other income)
    Revenue,
    /// Costs incurred by the entity
    Expense,
}

/// A single revenue or expense event, produced by an external ledger
/// component and read-only to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Identifier assigned by the originating ledger
    pub id: String,
    /// Revenue or expense
    pub transaction_type: TransactionType,
    /// Amount excluding VAT, must be non-negative
    pub amount: BigDecimal,
    /// VAT recorded against this transaction, must be non-negative
    pub vat_amount: BigDecimal,
    /// Date the transaction occurred
    pub transaction_date: NaiveDate,
    /// Free-form category used for per-category subtotals
    pub category: String,
    /// Optional description
    pub description: Option<String>,
}

impl TransactionRecord {
    /// Create a new transaction record
    pub fn new(
        id: String,
        transaction_type: TransactionType,
        amount: BigDecimal,
        vat_amount: BigDecimal,
        transaction_date: NaiveDate,
        category: String,
    ) -> Self {
        Self {
            id,
            transaction_type,
            amount,
            vat_amount,
            transaction_date,
            category,
            description: None,
        }
    }

    /// Create a revenue record
    pub fn revenue(
        id: String,
        amount: BigDecimal,
        vat_amount: BigDecimal,
        transaction_date: NaiveDate,
        category: String,
    ) -> Self {
        Self::new(
            id,
            TransactionType::Revenue,
            amount,
            vat_amount,
            transaction_date,
            category,
        )
    }

    /// Create an expense record
    pub fn expense(
        id: String,
        amount: BigDecimal,
        vat_amount: BigDecimal,
        transaction_date: NaiveDate,
        category: String,
    ) -> Self {
        Self::new(
            id,
            TransactionType::Expense,
            amount,
            vat_amount,
            transaction_date,
            category,
        )
    }
}

/// Legal form of the entity being taxed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// Mainland-licensed company
    Mainland,
    /// Free-zone-licensed company
    FreeZone,
    /// Branch of a foreign entity
    Branch,
}

/// Profile of the company a calculation is performed for.
///
/// Supplied per call by the data provider; not owned or persisted by this
/// crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Display name
    pub name: String,
    /// Annual revenue used for SME classification
    pub annual_revenue: BigDecimal,
    /// Head count used for SME classification
    pub employee_count: u32,
    /// Legal form
    pub entity_type: EntityType,
    /// Whether the entity holds a free-zone license
    pub is_free_zone: bool,
    /// Whether the entity claims Qualifying Free Zone Person status
    pub is_qfzp: bool,
    /// Qualifying income for the QFZP test. Required whenever `is_qfzp`
    /// is set; there is no implicit default.
    pub qualifying_income: Option<BigDecimal>,
}

/// Which segment of a year a period covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PeriodSegment {
    /// A calendar month, 1-12
    Month(u32),
    /// A calendar quarter, 1-4
    Quarter(u32),
    /// The full calendar year
    Annual,
}

/// A tax period: a month (`2026-03`), a quarter (`2026-Q1`) or a full
/// year (`2026`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub segment: PeriodSegment,
}

impl Period {
    /// A monthly period. Returns `InvalidInput` for months outside 1-12.
    pub fn month(year: i32, month: u32) -> TaxResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(TaxError::InvalidInput(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        Ok(Self {
            year,
            segment: PeriodSegment::Month(month),
        })
    }

    /// A quarterly period. Returns `InvalidInput` for quarters outside 1-4.
    pub fn quarter(year: i32, quarter: u32) -> TaxResult<Self> {
        if !(1..=4).contains(&quarter) {
            return Err(TaxError::InvalidInput(format!(
                "quarter must be between 1 and 4, got {quarter}"
            )));
        }
        Ok(Self {
            year,
            segment: PeriodSegment::Quarter(quarter),
        })
    }

    /// A full calendar year
    pub fn annual(year: i32) -> Self {
        Self {
            year,
            segment: PeriodSegment::Annual,
        }
    }

    /// Whether a date falls inside this period
    pub fn contains(&self, date: NaiveDate) -> bool {
        if date.year() != self.year {
            return false;
        }
        match self.segment {
            PeriodSegment::Month(m) => date.month() == m,
            PeriodSegment::Quarter(q) => (date.month() - 1) / 3 + 1 == q,
            PeriodSegment::Annual => true,
        }
    }

    /// The monthly period a date falls into
    pub fn month_of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            segment: PeriodSegment::Month(date.month()),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.segment {
            PeriodSegment::Month(m) => write!(f, "{}-{:02}", self.year, m),
            PeriodSegment::Quarter(q) => write!(f, "{}-Q{}", self.year, q),
            PeriodSegment::Annual => write!(f, "{}", self.year),
        }
    }
}

impl FromStr for Period {
    type Err = TaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || TaxError::InvalidInput(format!("invalid period format: '{s}'"));
        let trimmed = s.trim();

        match trimmed.split_once('-') {
            None => {
                let year: i32 = trimmed.parse().map_err(|_| bad())?;
                Ok(Period::annual(year))
            }
            Some((y, rest)) => {
                let year: i32 = y.parse().map_err(|_| bad())?;
                if let Some(q) = rest.strip_prefix('Q').or_else(|| rest.strip_prefix('q')) {
                    let quarter: u32 = q.parse().map_err(|_| bad())?;
                    Period::quarter(year, quarter).map_err(|_| bad())
                } else {
                    let month: u32 = rest.parse().map_err(|_| bad())?;
                    Period::month(year, month).map_err(|_| bad())
                }
            }
        }
    }
}

/// The kind of liability a calculation produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CalculationType {
    /// Value-Added Tax
    Vat,
    /// Corporate Income Tax
    Cit,
}

impl fmt::Display for CalculationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculationType::Vat => write!(f, "VAT"),
            CalculationType::Cit => write!(f, "CIT"),
        }
    }
}

impl FromStr for CalculationType {
    type Err = TaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VAT" => Ok(CalculationType::Vat),
            "CIT" => Ok(CalculationType::Cit),
            other => Err(TaxError::UnsupportedType(other.to_string())),
        }
    }
}

/// Caller identity threaded through every calculation. Both fields are
/// mandatory; there are no fallback identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalculationContext {
    /// Company the calculation belongs to
    pub company_id: String,
    /// User or system principal that requested it
    pub requested_by: String,
}

impl CalculationContext {
    /// Create a new context. Returns `InvalidInput` when either field is
    /// blank.
    pub fn new(company_id: impl Into<String>, requested_by: impl Into<String>) -> TaxResult<Self> {
        let company_id = company_id.into();
        let requested_by = requested_by.into();
        if company_id.trim().is_empty() {
            return Err(TaxError::InvalidInput(
                "company_id cannot be empty".to_string(),
            ));
        }
        if requested_by.trim().is_empty() {
            return Err(TaxError::InvalidInput(
                "requested_by cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            company_id,
            requested_by,
        })
    }
}

/// One fully-resolved computation request.
///
/// Constructed per invocation and validated at the boundary before any
/// engine sees it; unknown fields in a serialized request are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalculationInput {
    pub context: CalculationContext,
    pub calculation_type: CalculationType,
    pub period: Period,
    pub transactions: Vec<TransactionRecord>,
    pub profile: CompanyProfile,
}

impl CalculationInput {
    /// Validate the request shape: non-negative amounts and a qualifying
    /// income figure whenever QFZP status is claimed.
    pub fn validate(&self) -> TaxResult<()> {
        let zero = BigDecimal::from(0);
        for txn in &self.transactions {
            if txn.amount < zero {
                return Err(TaxError::InvalidInput(format!(
                    "transaction '{}' has a negative amount",
                    txn.id
                )));
            }
            if txn.vat_amount < zero {
                return Err(TaxError::InvalidInput(format!(
                    "transaction '{}' has a negative VAT amount",
                    txn.id
                )));
            }
        }
        if self.profile.is_qfzp && self.profile.qualifying_income.is_none() {
            return Err(TaxError::InvalidInput(
                "QFZP status requires a qualifying income figure".to_string(),
            ));
        }
        Ok(())
    }
}

/// Statutory rates and thresholds used by the engines.
///
/// `Default` supplies the UAE figures; callers may deserialize an override
/// from their own configuration source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxConfig {
    /// Standard VAT rate as a fraction (0.05)
    pub vat_standard_rate: BigDecimal,
    /// Standard CIT rate as a fraction (0.09)
    pub cit_standard_rate: BigDecimal,
    /// Net income taxed at 0% under Small Business Relief (375,000)
    pub small_business_relief_threshold: BigDecimal,
    /// Qualifying income cap for the QFZP 0% treatment (3,000,000)
    pub qualifying_income_cap: BigDecimal,
    /// Exempt-supply value above which a partial-exemption review is advised
    pub exempt_supply_review_threshold: BigDecimal,
    /// Refund magnitude above which a documentation review is advised
    pub refund_review_threshold: BigDecimal,
    /// Maximum accepted deviation between declared and recomputed VAT
    pub declared_vat_tolerance: BigDecimal,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            vat_standard_rate: BigDecimal::from(5) / BigDecimal::from(100),
            cit_standard_rate: BigDecimal::from(9) / BigDecimal::from(100),
            small_business_relief_threshold: BigDecimal::from(375_000),
            qualifying_income_cap: BigDecimal::from(3_000_000),
            exempt_supply_review_threshold: BigDecimal::from(50_000),
            refund_review_threshold: BigDecimal::from(10_000),
            declared_vat_tolerance: BigDecimal::from(1) / BigDecimal::from(100),
        }
    }
}

/// Errors that can occur in the tax engine
#[derive(Debug, thiserror::Error)]
pub enum TaxError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unsupported calculation type: {0}")]
    UnsupportedType(String),
    #[error("an active audit record already exists for {company_id}/{calculation_type}/{period}")]
    ActiveRecordConflict {
        company_id: String,
        calculation_type: CalculationType,
        period: Period,
    },
    #[error("audit record {id} is {status} and cannot be modified")]
    ImmutableRecord { id: Uuid, status: String },
    #[error("audit record not found: {0}")]
    RecordNotFound(Uuid),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl TaxError {
    /// Stable discriminant for transport layers; raw messages stay internal.
    pub fn kind(&self) -> &'static str {
        match self {
            TaxError::InvalidInput(_) => "InvalidInput",
            TaxError::UnsupportedType(_) => "UnsupportedType",
            TaxError::ActiveRecordConflict { .. } => "ActiveRecordConflict",
            TaxError::ImmutableRecord { .. } => "ImmutableRecordError",
            TaxError::RecordNotFound(_) => "RecordNotFound",
            TaxError::StorageUnavailable(_) => "StorageUnavailable",
        }
    }
}

/// Result type for tax engine operations
pub type TaxResult<T> = Result<T, TaxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parsing() {
        assert_eq!("2026".parse::<Period>().unwrap(), Period::annual(2026));
        assert_eq!(
            "2026-03".parse::<Period>().unwrap(),
            Period::month(2026, 3).unwrap()
        );
        assert_eq!(
            "2026-Q1".parse::<Period>().unwrap(),
            Period::quarter(2026, 1).unwrap()
        );
        assert_eq!(
            "2026-q4".parse::<Period>().unwrap(),
            Period::quarter(2026, 4).unwrap()
        );

        assert!("garbage".parse::<Period>().is_err());
        assert!("2026-13".parse::<Period>().is_err());
        assert!("2026-Q5".parse::<Period>().is_err());
        assert!("2026-00".parse::<Period>().is_err());
    }

    #[test]
    fn test_period_display_round_trip() {
        for p in [
            Period::annual(2025),
            Period::month(2025, 12).unwrap(),
            Period::quarter(2025, 2).unwrap(),
        ] {
            assert_eq!(p.to_string().parse::<Period>().unwrap(), p);
        }
    }

    #[test]
    fn test_period_contains() {
        let march = Period::month(2026, 3).unwrap();
        assert!(march.contains(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()));
        assert!(!march.contains(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()));

        let q1 = Period::quarter(2026, 1).unwrap();
        assert!(q1.contains(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
        assert!(q1.contains(NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()));
        assert!(!q1.contains(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()));
        assert!(!q1.contains(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()));

        let year = Period::annual(2026);
        assert!(year.contains(NaiveDate::from_ymd_opt(2026, 7, 4).unwrap()));
        assert!(!year.contains(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()));
    }

    #[test]
    fn test_calculation_type_parsing() {
        assert_eq!(
            "VAT".parse::<CalculationType>().unwrap(),
            CalculationType::Vat
        );
        assert_eq!(
            "cit".parse::<CalculationType>().unwrap(),
            CalculationType::Cit
        );

        let err = "PAYROLL".parse::<CalculationType>().unwrap_err();
        assert_eq!(err.kind(), "UnsupportedType");
    }

    #[test]
    fn test_calculation_type_wire_format() {
        let json = serde_json::to_string(&CalculationType::Vat).unwrap();
        assert_eq!(json, "\"VAT\"");
        let json = serde_json::to_string(&TransactionType::Expense).unwrap();
        assert_eq!(json, "\"EXPENSE\"");
    }

    #[test]
    fn test_context_requires_both_fields() {
        assert!(CalculationContext::new("", "user-7").is_err());
        assert!(CalculationContext::new("company-1", " ").is_err());
        assert!(CalculationContext::new("company-1", "user-7").is_ok());
    }

    #[test]
    fn test_input_rejects_unknown_fields() {
        let json = r#"{
            "context": {"company_id": "c1", "requested_by": "u1"},
            "calculation_type": "VAT",
            "period": {"year": 2026, "segment": {"Month": 1}},
            "transactions": [],
            "profile": {
                "name": "Acme",
                "annual_revenue": "100000",
                "employee_count": 5,
                "entity_type": "Mainland",
                "is_free_zone": false,
                "is_qfzp": false,
                "qualifying_income": null
            },
            "surprise": true
        }"#;
        assert!(serde_json::from_str::<CalculationInput>(json).is_err());
    }

    #[test]
    fn test_input_validation_qfzp_requires_income() {
        let input = CalculationInput {
            context: CalculationContext::new("c1", "u1").unwrap(),
            calculation_type: CalculationType::Cit,
            period: Period::annual(2026),
            transactions: vec![],
            profile: CompanyProfile {
                name: "Acme FZ".to_string(),
                annual_revenue: BigDecimal::from(1_000_000),
                employee_count: 10,
                entity_type: EntityType::FreeZone,
                is_free_zone: true,
                is_qfzp: true,
                qualifying_income: None,
            },
        };
        let err = input.validate().unwrap_err();
        assert_eq!(err.kind(), "InvalidInput");
    }
}
