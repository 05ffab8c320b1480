//! End-to-end service walkthrough: compute a VAT liability, supersede it
//! with a recalculation, reconcile, and inspect the audit history.
//!
//! Run with: cargo run --example calculation_service

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use tax_engine_core::{
    AuditFilter, CalculationContext, CalculationService, CalculationType, CompanyProfile,
    EntityType, MemoryAuditStore, Period, StaticDataProvider, TransactionRecord,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let profile = CompanyProfile {
        name: "Falcon Logistics LLC".to_string(),
        annual_revenue: BigDecimal::from(4_200_000),
        employee_count: 35,
        entity_type: EntityType::Mainland,
        is_free_zone: false,
        is_qfzp: false,
        qualifying_income: None,
    };

    let jan = |day| NaiveDate::from_ymd_opt(2026, 1, day).unwrap();
    let transactions = vec![
        TransactionRecord::revenue(
            "inv-1001".to_string(),
            BigDecimal::from(180_000),
            BigDecimal::from(9_000),
            jan(8),
            "freight".to_string(),
        ),
        TransactionRecord::revenue(
            "inv-1002".to_string(),
            BigDecimal::from(60_000),
            BigDecimal::from(3_000),
            jan(19),
            "warehousing".to_string(),
        ),
        TransactionRecord::expense(
            "bill-2001".to_string(),
            BigDecimal::from(75_000),
            BigDecimal::from(3_750),
            jan(22),
            "fuel".to_string(),
        ),
    ];

    let provider = StaticDataProvider::new().with_company("falcon", profile, transactions);
    let service = CalculationService::new(MemoryAuditStore::new(), provider);
    let ctx = CalculationContext::new("falcon", "demo-user")?;
    let period = Period::month(2026, 1)?;

    let record = service.compute(&ctx, CalculationType::Vat, period).await?;
    println!(
        "v{} {} for {}: liability {}",
        record.version,
        record.calculation_type,
        record.period,
        record.final_result.liability()
    );

    // A second run supersedes the first
    let superseded = service.compute(&ctx, CalculationType::Vat, period).await?;
    println!("recomputed as v{} ({})", superseded.version, superseded.status);

    // Reconcile the stored figure against a fresh recomputation
    let report = service
        .validate(
            &ctx,
            CalculationType::Vat,
            period,
            &superseded.final_result.liability(),
        )
        .await?;
    println!("reconciliation: valid={} diff={}", report.is_valid, report.difference);

    // The audit trail keeps every version
    for entry in service.history(&ctx, AuditFilter::default()).await? {
        println!(
            "  {} v{} {} {} {}",
            entry.recorded_at, entry.version, entry.calculation_type, entry.period, entry.status
        );
    }

    Ok(())
}
