//! # Tax Engine Core
//!
//! The calculation and audit core of a tax-compliance system: it turns a
//! set of transactions and a company profile into a VAT or CIT liability,
//! classifies the company into a compliance tier, persists every result
//! as an immutable versioned audit record, and can later reconcile a
//! stored result against a fresh recomputation.
//!
//! ## Features
//!
//! - **VAT engine**: inclusive/exclusive splits and full multi-category
//!   return computation with advisory compliance warnings
//! - **CIT engine**: Small Business Relief banding with the Qualifying
//!   Free Zone Person override
//! - **SME classifier**: one table-driven decision function mapping every
//!   entity to exactly one compliance tier
//! - **Audit trail**: append-only, versioned records with an
//!   ACTIVE/SUPERSEDED/CANCELLED lifecycle
//! - **Reconciliation**: independent recomputation compared against
//!   stored figures, mismatches reported rather than thrown
//! - **Storage abstraction**: database-agnostic via the `AuditStorage`
//!   and `CompanyDataProvider` traits
//!
//! ## Quick Start
//!
//! ```rust
//! use tax_engine_core::{VatCalculation, classify, EntityType};
//! use bigdecimal::BigDecimal;
//!
//! let split = VatCalculation::calculate_standard(&BigDecimal::from(100_000), false).unwrap();
//! assert_eq!(split.vat_amount, BigDecimal::from(5_000));
//!
//! let category = classify(&BigDecimal::from(800_000), 6, EntityType::Mainland);
//! assert!(category.vat_registration_required);
//! ```

pub mod aggregation;
pub mod audit;
pub mod classifier;
pub mod reconciliation;
pub mod service;
pub mod tax;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use aggregation::*;
pub use audit::*;
pub use classifier::*;
pub use reconciliation::*;
pub use service::*;
pub use tax::*;
pub use traits::*;
pub use types::*;
pub use utils::*;
