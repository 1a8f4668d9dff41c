use analytics::{DerivedMetrics, MetricsEngine};
use chrono::{TimeZone, Utc};
use core_types::{PriceChangeKind, ProductDraft, SlaughterRecord};
use database::{
    AbateFilter, AbateStore, MemoryAbateStore, MemoryProductStore, PriceChange, Product,
    ProductFilter, ProductStore, StoredAbate,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn record(unidade: &str, tipo_ave: &str, day: u32) -> SlaughterRecord {
    let mut record = SlaughterRecord::new(
        Utc.with_ymd_and_hms(2024, 5, day, 7, 30, 0).unwrap(),
        unidade,
        500,
        dec!(5.2),
        dec!(1200),
    );
    record.tipo_ave = tipo_ave.to_string();
    record
}

async fn insert(store: &MemoryAbateStore, record: SlaughterRecord) -> StoredAbate {
    let metrics = MetricsEngine::default().compute(&record);
    store.insert(record, metrics).await.unwrap()
}

async fn seeded() -> MemoryAbateStore {
    let store = MemoryAbateStore::new();
    for (unidade, tipo, day) in [
        ("Unidade Norte", "frango", 1),
        ("Unidade Sul", "frango", 2),
        ("Unidade Norte", "galinha", 3),
        ("Unidade Norte", "frango", 4),
    ] {
        insert(&store, record(unidade, tipo, day)).await;
    }
    store
}

#[tokio::test]
async fn list_is_newest_first_and_paged() {
    let store = seeded().await;

    let all = store.list(&AbateFilter::default()).await.unwrap();
    let days: Vec<u32> = all
        .iter()
        .map(|a| a.record.data_abate.format("%d").to_string().parse().unwrap())
        .collect();
    assert_eq!(days, vec![4, 3, 2, 1]);

    let page = store
        .list(&AbateFilter {
            skip: 1,
            limit: Some(2),
            ..AbateFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, all[1].id);
    assert_eq!(page[1].id, all[2].id);
}

#[tokio::test]
async fn count_ignores_paging() {
    let store = seeded().await;
    let filter = AbateFilter {
        unidade: Some("NORTE".to_string()),
        tipo_ave: Some("frang".to_string()),
        skip: 5,
        limit: Some(1),
        ..AbateFilter::default()
    };
    assert_eq!(store.count(&filter).await.unwrap(), 2);
    assert!(store.list(&filter).await.unwrap().is_empty());
}

#[tokio::test]
async fn replace_and_delete_report_unknown_ids() {
    let store = seeded().await;
    let ghost = StoredAbate::new(record("U", "frango", 9), DerivedMetrics::default());
    assert!(!store.replace(&ghost).await.unwrap());
    assert!(!store.delete(Uuid::new_v4()).await.unwrap());

    let mut ghost = insert(&store, record("U", "frango", 9)).await;
    ghost.record.observacoes = Some("revisado".to_string());
    ghost.updated_at = Some(Utc::now());
    assert!(store.replace(&ghost).await.unwrap());

    let fetched = store.get(ghost.id).await.unwrap().unwrap();
    assert_eq!(fetched.record.observacoes.as_deref(), Some("revisado"));

    assert!(store.delete(ghost.id).await.unwrap());
    assert!(store.get(ghost.id).await.unwrap().is_none());
}

#[tokio::test]
async fn period_listing_is_inclusive_and_filtered_by_unit() {
    let store = seeded().await;
    assert_eq!(store.all().await.unwrap().len(), 4);

    let from = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 5, 3, 23, 59, 59).unwrap();
    let both = store.list_period(from, to, None).await.unwrap();
    assert_eq!(both.len(), 2);

    let norte = store
        .list_period(from, to, Some("norte".to_string()))
        .await
        .unwrap();
    assert_eq!(norte.len(), 1);
    assert_eq!(norte[0].record.tipo_ave, "galinha");
}

fn draft(nome: &str, tipo: &str, preco_kg: Decimal) -> ProductDraft {
    ProductDraft {
        nome: nome.to_string(),
        tipo: tipo.to_string(),
        preco_kg,
        unidade_origem: "Unidade Principal".to_string(),
    }
}

async fn catalog() -> MemoryProductStore {
    let store = MemoryProductStore::new();
    for (nome, tipo, preco) in [
        ("Peito", "peito", dec!(14.90)),
        ("Asa", "asa", dec!(11.50)),
        ("Coxa", "coxa", dec!(8.90)),
        ("Sobrecoxa", "coxa", dec!(9.40)),
    ] {
        store.insert(draft(nome, tipo, preco)).await.unwrap();
    }
    store
}

#[tokio::test]
async fn catalog_lists_by_name_and_filters_by_type() {
    let store = catalog().await;

    let names: Vec<_> = store
        .list(&ProductFilter::default())
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.draft.nome)
        .collect();
    assert_eq!(names, ["Asa", "Coxa", "Peito", "Sobrecoxa"]);

    let coxas = store.list_by_tipo("COXA").await.unwrap();
    assert_eq!(coxas.len(), 2);
    assert_eq!(store.count(&ProductFilter::by_tipo("coxa")).await.unwrap(), 2);

    let paged = ProductFilter {
        skip: 1,
        limit: Some(2),
        ..ProductFilter::default()
    };
    let page = store.list(&paged).await.unwrap();
    assert_eq!(page[0].draft.nome, "Coxa");
    assert_eq!(page.len(), 2);
}

#[tokio::test]
async fn price_range_is_inclusive_and_cheapest_first() {
    let store = catalog().await;
    let prices: Vec<_> = store
        .list_price_range(dec!(8.90), dec!(11.50))
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.draft.preco_kg)
        .collect();
    assert_eq!(prices, [dec!(8.90), dec!(9.40), dec!(11.50)]);
}

#[tokio::test]
async fn replacing_a_product_appends_its_price_change() {
    let store = catalog().await;
    let mut product = store.list_by_tipo("peito").await.unwrap().remove(0);

    product.draft.preco_kg = dec!(15.20);
    let change = PriceChange::new(
        product.id,
        PriceChangeKind::AtualizacaoPreco,
        dec!(14.90),
        dec!(15.20),
    );
    assert!(store.replace(&product, Some(&change)).await.unwrap());
    assert_eq!(
        store.get(product.id).await.unwrap().unwrap().draft.preco_kg,
        dec!(15.20)
    );

    let history = store.history(product.id).await.unwrap();
    assert_eq!(history, vec![change.clone()]);
    assert_eq!(store.recent_changes(10).await.unwrap(), vec![change.clone()]);

    // An unknown product writes neither the product nor its change.
    let ghost = Product::new(draft("Moela", "miudos", dec!(6)));
    let orphan = PriceChange::new(ghost.id, PriceChangeKind::Edicao, dec!(6), dec!(7));
    assert!(!store.replace(&ghost, Some(&orphan)).await.unwrap());
    assert!(store.history(ghost.id).await.unwrap().is_empty());

    // History outlives the product.
    assert!(store.delete(product.id).await.unwrap());
    assert!(store.get(product.id).await.unwrap().is_none());
    assert_eq!(store.history(product.id).await.unwrap().len(), 1);
}
