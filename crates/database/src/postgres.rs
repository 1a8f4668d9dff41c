use crate::error::DbError;
use crate::models::{AbateFilter, PriceChange, Product, ProductFilter, StoredAbate};
use crate::store::{AbateStore, ProductStore};
use analytics::DerivedMetrics;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{ProductDraft, SlaughterRecord};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{FromRow, QueryBuilder};
use uuid::Uuid;

const COLUMNS: &str = "id, record, metrics, created_at, updated_at";

/// Stores each processing day as a JSONB document in `abates_completos`.
#[derive(Debug, Clone)]
pub struct PgAbateStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct AbateRow {
    id: Uuid,
    record: JsonValue,
    metrics: Option<JsonValue>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl AbateRow {
    fn into_stored(self) -> Result<StoredAbate, DbError> {
        let record: SlaughterRecord = serde_json::from_value(self.record)?;
        // A metrics document written by an older schema may be incomplete.
        let metrics = self.metrics.and_then(|doc| {
            serde_json::from_value::<DerivedMetrics>(doc)
                .inspect_err(|e| {
                    tracing::debug!(id = %self.id, error = %e, "Stored metrics are incomplete.")
                })
                .ok()
        });
        Ok(StoredAbate {
            id: self.id,
            record,
            metrics,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Escapes LIKE wildcards and wraps the term for a substring match.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &AbateFilter) {
    qb.push(" WHERE TRUE");
    if let Some(unidade) = &filter.unidade {
        qb.push(" AND unidade ILIKE ").push_bind(like_pattern(unidade));
    }
    if let Some(tipo_ave) = &filter.tipo_ave {
        qb.push(" AND tipo_ave ILIKE ").push_bind(like_pattern(tipo_ave));
    }
    if let Some(from) = filter.data_inicio {
        qb.push(" AND data_abate >= ").push_bind(from);
    }
    if let Some(to) = filter.data_fim {
        qb.push(" AND data_abate <= ").push_bind(to);
    }
}

impl PgAbateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn metrics_document(abate: &StoredAbate) -> Result<Option<JsonValue>, DbError> {
        Ok(abate.metrics.as_ref().map(serde_json::to_value).transpose()?)
    }
}

#[async_trait]
impl AbateStore for PgAbateStore {
    async fn insert(
        &self,
        record: SlaughterRecord,
        metrics: DerivedMetrics,
    ) -> Result<StoredAbate, DbError> {
        let abate = StoredAbate::new(record, metrics);
        sqlx::query(
            r#"
            INSERT INTO abates_completos
                (id, data_abate, unidade, tipo_ave, record, metrics, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(abate.id)
        .bind(abate.record.data_abate)
        .bind(&abate.record.unidade)
        .bind(&abate.record.tipo_ave)
        .bind(serde_json::to_value(&abate.record)?)
        .bind(Self::metrics_document(&abate)?)
        .bind(abate.created_at)
        .bind(abate.updated_at)
        .execute(&self.pool)
        .await?;
        tracing::debug!(id = %abate.id, "Abate stored.");
        Ok(abate)
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredAbate>, DbError> {
        let row = sqlx::query_as::<_, AbateRow>(&format!(
            "SELECT {COLUMNS} FROM abates_completos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(AbateRow::into_stored).transpose()
    }

    async fn list(&self, filter: &AbateFilter) -> Result<Vec<StoredAbate>, DbError> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM abates_completos"));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY data_abate DESC, id");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(limit as i64);
        }
        qb.push(" OFFSET ").push_bind(filter.skip as i64);

        let rows = qb.build_query_as::<AbateRow>().fetch_all(&self.pool).await?;
        rows.into_iter().map(AbateRow::into_stored).collect()
    }

    async fn count(&self, filter: &AbateFilter) -> Result<u64, DbError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM abates_completos");
        push_filters(&mut qb, filter);
        let count: i64 = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn replace(&self, abate: &StoredAbate) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE abates_completos
            SET data_abate = $2, unidade = $3, tipo_ave = $4, record = $5, metrics = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(abate.id)
        .bind(abate.record.data_abate)
        .bind(&abate.record.unidade)
        .bind(&abate.record.tipo_ave)
        .bind(serde_json::to_value(&abate.record)?)
        .bind(Self::metrics_document(abate)?)
        .bind(abate.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM abates_completos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

const PRODUCT_COLUMNS: &str = "id, nome, tipo, preco_kg, unidade_origem, created_at, updated_at";
const CHANGE_COLUMNS: &str = "id, produto_id, tipo_alteracao, campo_alterado, valor_anterior, \
    valor_novo, data_alteracao, usuario, observacoes";

/// The catalog in `produtos`, its price history in `produto_logs`.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct ProductRow {
    id: Uuid,
    nome: String,
    tipo: String,
    preco_kg: Decimal,
    unidade_origem: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            draft: ProductDraft {
                nome: row.nome,
                tipo: row.tipo,
                preco_kg: row.preco_kg,
                unidade_origem: row.unidade_origem,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct PriceChangeRow {
    id: Uuid,
    produto_id: Uuid,
    tipo_alteracao: String,
    campo_alterado: String,
    valor_anterior: Decimal,
    valor_novo: Decimal,
    data_alteracao: DateTime<Utc>,
    usuario: String,
    observacoes: Option<String>,
}

impl PriceChangeRow {
    fn into_change(self) -> Result<PriceChange, DbError> {
        Ok(PriceChange {
            id: self.id,
            produto_id: self.produto_id,
            tipo_alteracao: serde_json::from_value(JsonValue::String(self.tipo_alteracao))?,
            campo_alterado: self.campo_alterado,
            valor_anterior: self.valor_anterior,
            valor_novo: self.valor_novo,
            data_alteracao: self.data_alteracao,
            usuario: self.usuario,
            observacoes: self.observacoes,
        })
    }
}

fn push_product_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE TRUE");
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (nome ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR tipo ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(tipo) = &filter.tipo {
        qb.push(" AND tipo ILIKE ").push_bind(like_pattern(tipo));
    }
    if let Some(unidade_origem) = &filter.unidade_origem {
        qb.push(" AND unidade_origem ILIKE ")
            .push_bind(like_pattern(unidade_origem));
    }
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn insert(&self, draft: ProductDraft) -> Result<Product, DbError> {
        let product = Product::new(draft);
        sqlx::query(
            r#"
            INSERT INTO produtos
                (id, nome, tipo, preco_kg, unidade_origem, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id)
        .bind(&product.draft.nome)
        .bind(&product.draft.tipo)
        .bind(product.draft.preco_kg)
        .bind(&product.draft.unidade_origem)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        tracing::debug!(id = %product.id, "Product stored.");
        Ok(product)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, DbError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM produtos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, DbError> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM produtos"));
        push_product_filters(&mut qb, filter);
        qb.push(" ORDER BY nome, id");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(limit as i64);
        }
        qb.push(" OFFSET ").push_bind(filter.skip as i64);

        let rows = qb.build_query_as::<ProductRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn count(&self, filter: &ProductFilter) -> Result<u64, DbError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM produtos");
        push_product_filters(&mut qb, filter);
        let count: i64 = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn list_price_range(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, DbError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM produtos \
             WHERE preco_kg BETWEEN $1 AND $2 ORDER BY preco_kg, nome, id"
        ))
        .bind(min)
        .bind(max)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn replace(
        &self,
        product: &Product,
        change: Option<&PriceChange>,
    ) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE produtos
            SET nome = $2, tipo = $3, preco_kg = $4, unidade_origem = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(product.id)
        .bind(&product.draft.nome)
        .bind(&product.draft.tipo)
        .bind(product.draft.preco_kg)
        .bind(&product.draft.unidade_origem)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        if let Some(change) = change {
            sqlx::query(&format!(
                "INSERT INTO produto_logs ({CHANGE_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
            ))
            .bind(change.id)
            .bind(change.produto_id)
            .bind(change.tipo_alteracao.to_string())
            .bind(&change.campo_alterado)
            .bind(change.valor_anterior)
            .bind(change.valor_novo)
            .bind(change.data_alteracao)
            .bind(&change.usuario)
            .bind(&change.observacoes)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM produtos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn history(&self, produto_id: Uuid) -> Result<Vec<PriceChange>, DbError> {
        let rows = sqlx::query_as::<_, PriceChangeRow>(&format!(
            "SELECT {CHANGE_COLUMNS} FROM produto_logs \
             WHERE produto_id = $1 ORDER BY data_alteracao DESC, id"
        ))
        .bind(produto_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(PriceChangeRow::into_change).collect()
    }

    async fn recent_changes(&self, limit: usize) -> Result<Vec<PriceChange>, DbError> {
        let rows = sqlx::query_as::<_, PriceChangeRow>(&format!(
            "SELECT {CHANGE_COLUMNS} FROM produto_logs ORDER BY data_alteracao DESC, id LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(PriceChangeRow::into_change).collect()
    }
}
