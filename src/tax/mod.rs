//! Tax engines: VAT and Corporate Income Tax

pub mod cit;
pub mod vat;

pub use cit::*;
pub use vat::*;
