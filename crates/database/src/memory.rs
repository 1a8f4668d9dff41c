use crate::error::DbError;
use crate::models::{AbateFilter, PriceChange, Product, ProductFilter, StoredAbate};
use crate::store::{AbateStore, ProductStore};
use analytics::DerivedMetrics;
use async_trait::async_trait;
use core_types::{ProductDraft, SlaughterRecord};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A process-local store. Used by tests and when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryAbateStore {
    rows: RwLock<HashMap<Uuid, StoredAbate>>,
}

impl MemoryAbateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted<'a>(rows: impl Iterator<Item = &'a StoredAbate>) -> Vec<&'a StoredAbate> {
        let mut rows: Vec<_> = rows.collect();
        rows.sort_by(|a, b| {
            b.record
                .data_abate
                .cmp(&a.record.data_abate)
                .then_with(|| a.id.cmp(&b.id))
        });
        rows
    }
}

#[async_trait]
impl AbateStore for MemoryAbateStore {
    async fn insert(
        &self,
        record: SlaughterRecord,
        metrics: DerivedMetrics,
    ) -> Result<StoredAbate, DbError> {
        let abate = StoredAbate::new(record, metrics);
        self.rows.write().await.insert(abate.id, abate.clone());
        Ok(abate)
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredAbate>, DbError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &AbateFilter) -> Result<Vec<StoredAbate>, DbError> {
        let rows = self.rows.read().await;
        let matching = Self::sorted(rows.values().filter(|a| filter.matches(&a.record)));
        Ok(matching
            .into_iter()
            .skip(filter.skip)
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &AbateFilter) -> Result<u64, DbError> {
        let rows = self.rows.read().await;
        Ok(rows.values().filter(|a| filter.matches(&a.record)).count() as u64)
    }

    async fn replace(&self, abate: &StoredAbate) -> Result<bool, DbError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&abate.id) {
            Some(slot) => {
                *slot = abate.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

#[derive(Debug, Default)]
struct Catalog {
    products: HashMap<Uuid, Product>,
    changes: Vec<PriceChange>,
}

/// A process-local product catalog.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    catalog: RwLock<Catalog>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_name(a: &&Product, b: &&Product) -> Ordering {
    a.draft.nome.cmp(&b.draft.nome).then_with(|| a.id.cmp(&b.id))
}

fn newest_first(changes: &mut [PriceChange]) {
    changes.sort_by(|a, b| {
        b.data_alteracao
            .cmp(&a.data_alteracao)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert(&self, draft: ProductDraft) -> Result<Product, DbError> {
        let product = Product::new(draft);
        self.catalog
            .write()
            .await
            .products
            .insert(product.id, product.clone());
        Ok(product)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, DbError> {
        Ok(self.catalog.read().await.products.get(&id).cloned())
    }

    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, DbError> {
        let catalog = self.catalog.read().await;
        let mut matching: Vec<_> = catalog
            .products
            .values()
            .filter(|p| filter.matches(&p.draft))
            .collect();
        matching.sort_by(by_name);
        Ok(matching
            .into_iter()
            .skip(filter.skip)
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &ProductFilter) -> Result<u64, DbError> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .products
            .values()
            .filter(|p| filter.matches(&p.draft))
            .count() as u64)
    }

    async fn list_price_range(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, DbError> {
        let catalog = self.catalog.read().await;
        let mut matching: Vec<_> = catalog
            .products
            .values()
            .filter(|p| p.draft.preco_kg >= min && p.draft.preco_kg <= max)
            .collect();
        matching.sort_by(|a, b| {
            a.draft
                .preco_kg
                .cmp(&b.draft.preco_kg)
                .then_with(|| by_name(a, b))
        });
        Ok(matching.into_iter().cloned().collect())
    }

    async fn replace(
        &self,
        product: &Product,
        change: Option<&PriceChange>,
    ) -> Result<bool, DbError> {
        let mut catalog = self.catalog.write().await;
        let Some(slot) = catalog.products.get_mut(&product.id) else {
            return Ok(false);
        };
        *slot = product.clone();
        if let Some(change) = change {
            catalog.changes.push(change.clone());
        }
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        Ok(self.catalog.write().await.products.remove(&id).is_some())
    }

    async fn history(&self, produto_id: Uuid) -> Result<Vec<PriceChange>, DbError> {
        let catalog = self.catalog.read().await;
        let mut changes: Vec<_> = catalog
            .changes
            .iter()
            .filter(|c| c.produto_id == produto_id)
            .cloned()
            .collect();
        newest_first(&mut changes);
        Ok(changes)
    }

    async fn recent_changes(&self, limit: usize) -> Result<Vec<PriceChange>, DbError> {
        let mut changes = self.catalog.read().await.changes.clone();
        newest_first(&mut changes);
        changes.truncate(limit);
        Ok(changes)
    }
}
