//! VAT engine walkthrough: single-amount splits, a full return with
//! compliance warnings, and SME classification.
//!
//! Run with: cargo run --example vat_return

use bigdecimal::BigDecimal;
use std::str::FromStr;
use tax_engine_core::{
    classify, EntityType, SupplyLine, TaxConfig, VatCalculation, VatReturnBreakdown,
    VatReturnResult,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Exclusive amount: VAT is added on top
    let exclusive = VatCalculation::calculate_standard(&BigDecimal::from(100_000), false)?;
    println!(
        "exclusive 100,000: net {} vat {} gross {}",
        exclusive.net_amount, exclusive.vat_amount, exclusive.gross_amount
    );

    // Inclusive amount: VAT is carved out
    let inclusive = VatCalculation::calculate_standard(&BigDecimal::from(105_000), true)?;
    println!(
        "inclusive 105,000: net {} vat {}",
        inclusive.net_amount, inclusive.vat_amount
    );

    // Full return with a deliberately wrong standard-rated declaration
    let breakdown = VatReturnBreakdown {
        standard_rated: SupplyLine::new(
            BigDecimal::from(200_000),
            BigDecimal::from_str("9500")?, // expected 10,000
        ),
        zero_rated: SupplyLine::new(BigDecimal::from(40_000), BigDecimal::from(0)),
        exempt: SupplyLine::new(BigDecimal::from(60_000), BigDecimal::from(0)),
        reverse_charge: SupplyLine::new(BigDecimal::from(10_000), BigDecimal::from_str("500")?),
        input_vat_standard: BigDecimal::from(4_000),
        input_vat_capital: BigDecimal::from(1_200),
        input_vat_corrections: BigDecimal::from(0),
        adjustment_increase: BigDecimal::from(0),
        adjustment_decrease: BigDecimal::from(150),
    };

    let result = VatReturnResult::calculate(&breakdown, &TaxConfig::default())?;
    println!(
        "return: output {} input {} net {} (refund: {})",
        result.total_output_vat, result.total_input_vat, result.net_vat, result.is_refund
    );
    for warning in &result.warnings {
        println!("  warning [{:?}]: {}", warning.kind, warning.message);
    }

    // Where does this company sit in the compliance tiers?
    let category = classify(&BigDecimal::from(2_400_000), 18, EntityType::Mainland);
    println!(
        "tier: {} (VAT required: {}, transfer pricing: {})",
        category.name, category.vat_registration_required, category.transfer_pricing_required
    );
    for obligation in &category.obligations {
        println!("  - {obligation}");
    }

    Ok(())
}
