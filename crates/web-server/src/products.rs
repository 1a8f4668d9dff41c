//! Handlers for the product catalog (`/produtos`) and its price history
//! (`/produto-logs`).

use crate::{
    error::AppError,
    handlers::{check_limit, default_limit, non_blank},
    AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::Utc;
use core_types::{round_price, PriceChangeKind, ProductDraft, ProductPatch};
use database::{PriceChange, Product, ProductFilter};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_limit")]
    limit: usize,
    search: Option<String>,
    tipo: Option<String>,
    unidade_origem: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductCountQuery {
    tipo: Option<String>,
    unidade_origem: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PriceRangeQuery {
    min_price: Decimal,
    max_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct NewPriceQuery {
    novo_preco: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ChangeLogQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Produto {id} not found"))
}

/// Stores `product` and, when given, its price change. Both or neither.
async fn save(
    state: &AppState,
    mut product: Product,
    change: Option<PriceChange>,
) -> Result<Product, AppError> {
    product.updated_at = Some(Utc::now());
    if !state.catalog.replace(&product, change.as_ref()).await? {
        return Err(not_found(product.id));
    }
    if let Some(change) = change {
        tracing::info!(
            id = %product.id,
            tipo_alteracao = %change.tipo_alteracao,
            valor_anterior = %change.valor_anterior,
            valor_novo = %change.valor_novo,
            "Product price changed."
        );
    }
    Ok(product)
}

/// # POST /api/v1/produtos
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProductDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let Json(draft) = payload?;
    draft.validate()?;
    let product = state.catalog.insert(draft.normalized()).await?;
    tracing::info!(id = %product.id, nome = %product.draft.nome, "Product created.");
    Ok((StatusCode::CREATED, Json(product)))
}

/// # GET /api/v1/produtos
/// Ordered by name. `search` matches the name or the type.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ProductListQuery>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let Query(query) = query?;
    check_limit(query.limit)?;
    let filter = ProductFilter {
        search: non_blank(query.search),
        tipo: non_blank(query.tipo),
        unidade_origem: non_blank(query.unidade_origem),
        skip: query.skip,
        limit: Some(query.limit),
    };
    Ok(Json(state.catalog.list(&filter).await?))
}

/// # GET /api/v1/produtos/count
pub async fn count_products(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ProductCountQuery>, QueryRejection>,
) -> Result<Json<JsonValue>, AppError> {
    let Query(query) = query?;
    let filter = ProductFilter {
        tipo: non_blank(query.tipo),
        unidade_origem: non_blank(query.unidade_origem),
        ..ProductFilter::default()
    };
    let total = state.catalog.count(&filter).await?;
    Ok(Json(json!({ "total": total })))
}

/// # GET /api/v1/produtos/tipo/:tipo
pub async fn list_products_by_tipo(
    State(state): State<Arc<AppState>>,
    tipo: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let Path(tipo) = tipo?;
    Ok(Json(state.catalog.list_by_tipo(tipo.trim()).await?))
}

/// # GET /api/v1/produtos/preco
/// Products priced within `[min_price, max_price]`, cheapest first.
pub async fn list_products_by_price(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PriceRangeQuery>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let Query(PriceRangeQuery {
        min_price,
        max_price,
    }) = query?;
    if min_price.is_sign_negative() && !min_price.is_zero() {
        return Err(AppError::BadRequest("min_price must not be negative".to_string()));
    }
    if min_price > max_price {
        return Err(AppError::BadRequest(
            "min_price must not exceed max_price".to_string(),
        ));
    }
    let products = state.catalog.list_price_range(min_price, max_price).await?;
    Ok(Json(products))
}

/// # GET /api/v1/produtos/:id
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Product>, AppError> {
    let Path(id) = id?;
    let product = state.catalog.get(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(product))
}

/// # PUT /api/v1/produtos/:id
/// Partial update. A changed price is recorded in the product's history.
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> Result<Json<Product>, AppError> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    patch.validate()?;

    let mut product = state.catalog.get(id).await?.ok_or_else(|| not_found(id))?;
    if patch.is_empty() {
        return Ok(Json(product));
    }
    let change = patch.apply_to(&mut product.draft).map(|anterior| {
        PriceChange::new(id, PriceChangeKind::Edicao, anterior, product.draft.preco_kg)
    });
    let product = save(&state, product, change).await?;
    tracing::info!(%id, "Product updated.");
    Ok(Json(product))
}

/// # PATCH /api/v1/produtos/:id/preco?novo_preco=
/// Sets the price alone. Always recorded in the history, even when unchanged.
pub async fn update_product_price(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<NewPriceQuery>, QueryRejection>,
) -> Result<Json<Product>, AppError> {
    let Path(id) = id?;
    let Query(NewPriceQuery { novo_preco }) = query?;
    ProductPatch {
        preco_kg: Some(novo_preco),
        ..ProductPatch::default()
    }
    .validate()?;

    let mut product = state.catalog.get(id).await?.ok_or_else(|| not_found(id))?;
    let novo_preco = round_price(novo_preco);
    let anterior = std::mem::replace(&mut product.draft.preco_kg, novo_preco);
    let change = PriceChange::new(id, PriceChangeKind::AtualizacaoPreco, anterior, novo_preco);
    Ok(Json(save(&state, product, Some(change)).await?))
}

/// # DELETE /api/v1/produtos/:id
/// The price history is kept.
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    if state.catalog.delete(id).await? {
        tracing::info!(%id, "Product deleted.");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// # GET /api/v1/produtos/:id/historico
pub async fn product_history(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<PriceChange>>, AppError> {
    let Path(id) = id?;
    Ok(Json(state.catalog.history(id).await?))
}

/// # GET /api/v1/produto-logs
/// The latest price changes across the catalog.
pub async fn recent_price_changes(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ChangeLogQuery>, QueryRejection>,
) -> Result<Json<Vec<PriceChange>>, AppError> {
    let Query(query) = query?;
    check_limit(query.limit)?;
    Ok(Json(state.catalog.recent_changes(query.limit).await?))
}
