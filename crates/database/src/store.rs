use crate::error::DbError;
use crate::models::{AbateFilter, PriceChange, Product, ProductFilter, StoredAbate};
use analytics::DerivedMetrics;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{ProductDraft, SlaughterRecord};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Persistence for processing days.
///
/// Implementations must be safe to share between request handlers and the
/// batch recalculator.
#[async_trait]
pub trait AbateStore: Send + Sync {
    /// Stores a new record under a fresh id.
    async fn insert(
        &self,
        record: SlaughterRecord,
        metrics: DerivedMetrics,
    ) -> Result<StoredAbate, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<StoredAbate>, DbError>;

    async fn list(&self, filter: &AbateFilter) -> Result<Vec<StoredAbate>, DbError>;

    /// Number of records matching the filter. Paging fields are ignored.
    async fn count(&self, filter: &AbateFilter) -> Result<u64, DbError>;

    /// Overwrites an existing document. Returns `false` if the id is unknown.
    async fn replace(&self, abate: &StoredAbate) -> Result<bool, DbError>;

    /// Returns `false` if the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;

    /// Every record processed between the two instants, both inclusive.
    async fn list_period(
        &self,
        data_inicio: DateTime<Utc>,
        data_fim: DateTime<Utc>,
        unidade: Option<String>,
    ) -> Result<Vec<StoredAbate>, DbError> {
        self.list(&AbateFilter::period(data_inicio, data_fim, unidade))
            .await
    }

    async fn all(&self) -> Result<Vec<StoredAbate>, DbError> {
        self.list(&AbateFilter::default()).await
    }
}

/// Persistence for the product catalog and its price history.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, draft: ProductDraft) -> Result<Product, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<Product>, DbError>;

    /// Matching products ordered by name.
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, DbError>;

    /// Number of products matching the filter. Paging fields are ignored.
    async fn count(&self, filter: &ProductFilter) -> Result<u64, DbError>;

    /// Products priced between the two bounds, both inclusive, cheapest first.
    async fn list_price_range(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, DbError>;

    /// Overwrites an existing product and, when given, appends a price change to
    /// its history in the same step. Returns `false` if the id is unknown, in
    /// which case nothing is written.
    async fn replace(
        &self,
        product: &Product,
        change: Option<&PriceChange>,
    ) -> Result<bool, DbError>;

    /// Removes the product. Its price history is kept. Returns `false` if the id
    /// is unknown.
    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;

    /// Price changes of one product, newest first.
    async fn history(&self, produto_id: Uuid) -> Result<Vec<PriceChange>, DbError>;

    /// The latest price changes across the catalog, newest first.
    async fn recent_changes(&self, limit: usize) -> Result<Vec<PriceChange>, DbError>;

    async fn list_by_tipo(&self, tipo: &str) -> Result<Vec<Product>, DbError> {
        self.list(&ProductFilter::by_tipo(tipo)).await
    }
}
