use analytics::{DerivedMetrics, FormulaVariant, MetricsEngine};
use chrono::{TimeZone, Utc};
use core_types::{ProductOutput, SlaughterRecord};
use database::{AbateStore, MemoryAbateStore};
use recalculator::{RecalcError, RecalcMode, RecalcSummary, Recalculator};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn record(day: u32) -> SlaughterRecord {
    let mut record = SlaughterRecord::new(
        Utc.with_ymd_and_hms(2024, 6, day, 6, 0, 0).unwrap(),
        "Unidade Principal",
        1000,
        dec!(5.5),
        dec!(2500),
    );
    record.horarios.horas_trabalhadas = dec!(8);
    record.horarios.horas_reais = dec!(7.5);
    record
        .produtos
        .push(ProductOutput::priced("Frango Inteiro", "Inteiro", dec!(2000), dec!(9.9)));
    record.despesas_fixas.funcionarios = dec!(1500);
    record
}

/// Three records, the middle one stored without metrics.
async fn store_with_one_missing() -> Arc<MemoryAbateStore> {
    let store = Arc::new(MemoryAbateStore::new());
    let engine = MetricsEngine::default();
    for day in 1..=3 {
        let r = record(day);
        let metrics = engine.compute(&r);
        let mut stored = store.insert(r, metrics).await.unwrap();
        if day == 2 {
            stored.metrics = None;
            store.replace(&stored).await.unwrap();
        }
    }
    store
}

#[tokio::test]
async fn missing_only_fills_gaps_and_is_idempotent() {
    let store = store_with_one_missing().await;
    let recalc = Recalculator::new(store.clone(), MetricsEngine::default(), 2).unwrap();

    let first = recalc.run(RecalcMode::MissingOnly).await.unwrap();
    assert_eq!(
        first,
        RecalcSummary {
            processed: 3,
            updated: 1,
            skipped: 2,
            failed: 0
        }
    );

    let all = store.all().await.unwrap();
    assert!(all.iter().all(|a| a.metrics.is_some()));
    let repaired = all.iter().find(|a| a.updated_at.is_some()).unwrap();
    assert_eq!(
        repaired.metrics,
        Some(MetricsEngine::default().compute(&repaired.record))
    );

    let second = recalc.run(RecalcMode::MissingOnly).await.unwrap();
    assert_eq!(second.updated, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(store.all().await.unwrap(), all);
}

#[tokio::test]
async fn all_mode_rewrites_every_record_with_the_current_variant() {
    let store = store_with_one_missing().await;
    let legacy = MetricsEngine::new(FormulaVariant::legacy());
    let recalc = Recalculator::new(store.clone(), legacy, 4).unwrap();

    let summary = recalc.run(RecalcMode::All).await.unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.updated, 3);
    assert_eq!(summary.skipped, 0);

    for abate in store.all().await.unwrap() {
        let metrics: DerivedMetrics = abate.metrics.unwrap();
        // Net hours (7.5) instead of scheduled hours (8).
        assert_eq!(metrics.aves_hora, dec!(133.33));
    }
}

#[test]
fn zero_concurrency_is_rejected() {
    let store = Arc::new(MemoryAbateStore::new());
    assert!(matches!(
        Recalculator::new(store, MetricsEngine::default(), 0),
        Err(RecalcError::InvalidConcurrency)
    ));
}
