//! Audit trail: immutable, versioned history of calculation results

pub mod record;
pub mod trail;

pub use record::*;
pub use trail::*;
