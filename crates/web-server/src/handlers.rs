use crate::{error::AppError, AppState};
use analytics::{consistency_warnings, evaluate_limits, LimitAlert};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use configuration::{SettingSlot, Versioned};
use core_types::{
    FixedExpenses, ProcessingLimits, ProductOutput, SlaughterRecord, WorkSchedule,
};
use database::{AbateFilter, StoredAbate};
use recalculator::{RecalcMode, RecalcSummary, Recalculator};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

pub(crate) fn default_limit() -> usize {
    DEFAULT_LIMIT
}

pub(crate) fn check_limit(limit: usize) -> Result<(), AppError> {
    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )))
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_limit")]
    limit: usize,
    unidade: Option<String>,
    tipo_ave: Option<String>,
    data_inicio: Option<NaiveDate>,
    data_fim: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    unidade: Option<String>,
    tipo_ave: Option<String>,
    data_inicio: Option<NaiveDate>,
    data_fim: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    data_inicio: NaiveDate,
    data_fim: NaiveDate,
    unidade: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecalcQuery {
    #[serde(default)]
    todos: bool,
}

/// Body of `PUT /abates-completos/:id`. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct AbateUpdate {
    data_abate: Option<DateTime<Utc>>,
    unidade: Option<String>,
    tipo_ave: Option<String>,
    observacoes: Option<String>,
    quantidade_aves: Option<u32>,
    valor_kg_vivo: Option<Decimal>,
    peso_total_kg: Option<Decimal>,
    peso_medio_ave: Option<Decimal>,
    valor_total: Option<Decimal>,
    horarios: Option<WorkSchedule>,
    produtos: Option<Vec<ProductOutput>>,
    despesas_fixas: Option<FixedExpenses>,
}

/// Writes `value` into `slot` if present. Returns whether the slot changed.
fn assign<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(v) if *slot != v => {
            *slot = v;
            true
        }
        _ => false,
    }
}

impl AbateUpdate {
    /// Applies the update and reports whether any metric input changed.
    fn apply(self, record: &mut SlaughterRecord) -> bool {
        assign(&mut record.data_abate, self.data_abate);
        assign(&mut record.unidade, self.unidade);
        assign(&mut record.tipo_ave, self.tipo_ave);
        if self.observacoes.is_some() {
            record.observacoes = self.observacoes;
        }

        // Non-short-circuiting so every present field is applied.
        [
            assign(&mut record.quantidade_aves, self.quantidade_aves),
            assign(&mut record.valor_kg_vivo, self.valor_kg_vivo),
            assign(&mut record.peso_total_kg, self.peso_total_kg),
            assign(&mut record.peso_medio_ave, self.peso_medio_ave),
            assign(&mut record.valor_total, self.valor_total),
            assign(&mut record.horarios, self.horarios),
            assign(&mut record.produtos, self.produtos),
            assign(&mut record.despesas_fixas, self.despesas_fixas),
        ]
        .contains(&true)
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Abate {id} not found"))
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn start_of_day(date: NaiveDate) -> Result<DateTime<Utc>, AppError> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::BadRequest(format!("invalid date {date}")))
}

/// The last representable instant of `date`, so the whole day is included.
fn end_of_day(date: NaiveDate) -> Result<DateTime<Utc>, AppError> {
    date.and_hms_micro_opt(23, 59, 59, 999_999)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::BadRequest(format!("invalid date {date}")))
}

fn build_filter(
    unidade: Option<String>,
    tipo_ave: Option<String>,
    data_inicio: Option<NaiveDate>,
    data_fim: Option<NaiveDate>,
) -> Result<AbateFilter, AppError> {
    if let (Some(from), Some(to)) = (data_inicio, data_fim) {
        if from > to {
            return Err(AppError::BadRequest(
                "data_inicio must not be after data_fim".to_string(),
            ));
        }
    }
    Ok(AbateFilter {
        unidade: non_blank(unidade),
        tipo_ave: non_blank(tipo_ave),
        data_inicio: data_inicio.map(start_of_day).transpose()?,
        data_fim: data_fim.map(end_of_day).transpose()?,
        ..AbateFilter::default()
    })
}

/// Logs data-quality notes. They never block a write.
fn log_consistency(record: &SlaughterRecord) {
    for warning in consistency_warnings(record) {
        tracing::warn!(unidade = %record.unidade, ?warning, "Inconsistent record data.");
    }
}

/// # GET /api/v1/health
pub async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "ok" }))
}

/// # POST /api/v1/abates-completos
/// Validates the record, derives its metrics and stores both.
pub async fn create_abate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SlaughterRecord>, JsonRejection>,
) -> Result<(StatusCode, Json<StoredAbate>), AppError> {
    let Json(record) = payload?;
    record.validate()?;
    log_consistency(&record);

    let metrics = state.engine.compute(&record);
    let stored = state.store.insert(record, metrics).await?;
    tracing::info!(id = %stored.id, unidade = %stored.record.unidade, "Abate created.");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// # GET /api/v1/abates-completos
pub async fn list_abates(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<StoredAbate>>, AppError> {
    let Query(query) = query?;
    check_limit(query.limit)?;
    let filter = AbateFilter {
        skip: query.skip,
        limit: Some(query.limit),
        ..build_filter(query.unidade, query.tipo_ave, query.data_inicio, query.data_fim)?
    };
    let abates = state.store.list(&filter).await?;
    Ok(Json(abates))
}

/// # GET /api/v1/abates-completos/count
pub async fn count_abates(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CountQuery>, QueryRejection>,
) -> Result<Json<JsonValue>, AppError> {
    let Query(query) = query?;
    let filter = build_filter(query.unidade, query.tipo_ave, query.data_inicio, query.data_fim)?;
    let count = state.store.count(&filter).await?;
    Ok(Json(json!({ "count": count })))
}

/// # GET /api/v1/abates-completos/periodo
/// Every record between two dates, both days included.
pub async fn list_abates_by_period(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> Result<Json<Vec<StoredAbate>>, AppError> {
    let Query(query) = query?;
    let filter = build_filter(
        query.unidade,
        None,
        Some(query.data_inicio),
        Some(query.data_fim),
    )?;
    let (Some(from), Some(to)) = (filter.data_inicio, filter.data_fim) else {
        return Err(AppError::BadRequest(
            "data_inicio and data_fim are required".to_string(),
        ));
    };
    let abates = state.store.list_period(from, to, filter.unidade).await?;
    Ok(Json(abates))
}

/// # GET /api/v1/abates-completos/:id
pub async fn get_abate(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<StoredAbate>, AppError> {
    let Path(id) = id?;
    let stored = state.store.get(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(stored))
}

/// # PUT /api/v1/abates-completos/:id
/// Partial update. Metrics are recomputed only when one of their inputs changed
/// (or when the stored metrics are missing).
pub async fn update_abate(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AbateUpdate>, JsonRejection>,
) -> Result<Json<StoredAbate>, AppError> {
    let Path(id) = id?;
    let Json(update) = payload?;

    let mut stored = state.store.get(id).await?.ok_or_else(|| not_found(id))?;
    let inputs_changed = update.apply(&mut stored.record);
    stored.record.validate()?;

    if inputs_changed || stored.metrics.is_none() {
        log_consistency(&stored.record);
        stored.metrics = Some(state.engine.compute(&stored.record));
        tracing::debug!(%id, "Metrics recomputed after update.");
    }
    stored.updated_at = Some(Utc::now());

    if !state.store.replace(&stored).await? {
        return Err(not_found(id));
    }
    tracing::info!(%id, recomputed = inputs_changed, "Abate updated.");
    Ok(Json(stored))
}

/// # DELETE /api/v1/abates-completos/:id
pub async fn delete_abate(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    if state.store.delete(id).await? {
        tracing::info!(%id, "Abate deleted.");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// # GET /api/v1/abates-completos/:id/alertas
/// Limit alerts for one record against the current processing limits.
pub async fn get_abate_alerts(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<LimitAlert>>, AppError> {
    let Path(id) = id?;
    let stored = state.store.get(id).await?.ok_or_else(|| not_found(id))?;
    let metrics = stored
        .metrics
        .unwrap_or_else(|| state.engine.compute(&stored.record));
    let limits = state.registry.effective_limits();
    Ok(Json(evaluate_limits(&stored.record, &metrics, &limits)))
}

/// # POST /api/v1/abates-completos/recalcular
/// Recomputes missing metrics, or every record's metrics with `?todos=true`.
pub async fn recalculate_abates(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RecalcQuery>, QueryRejection>,
) -> Result<Json<RecalcSummary>, AppError> {
    let Query(query) = query?;
    let mode = if query.todos {
        RecalcMode::All
    } else {
        RecalcMode::MissingOnly
    };
    let recalculator =
        Recalculator::new(state.store.clone(), state.engine, state.recalc_concurrency)?;
    let summary = recalculator.run(mode).await?;
    Ok(Json(summary))
}

fn current_setting<T: Clone>(
    slot: &SettingSlot<T>,
    what: &str,
) -> Result<Json<Versioned<T>>, AppError> {
    slot.get()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No {what} configured")))
}

fn clear_setting<T: Clone>(slot: &SettingSlot<T>, what: &str) -> Result<StatusCode, AppError> {
    if slot.clear() {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("No {what} configured")))
    }
}

/// # GET /api/v1/despesas-padrao
pub async fn get_default_expenses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Versioned<FixedExpenses>>, AppError> {
    current_setting(&state.registry.default_expenses, "default expenses")
}

/// # PUT /api/v1/despesas-padrao
pub async fn put_default_expenses(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FixedExpenses>, JsonRejection>,
) -> Result<Json<Versioned<FixedExpenses>>, AppError> {
    let Json(expenses) = payload?;
    expenses.validate()?;
    Ok(Json(state.registry.default_expenses.replace(expenses)))
}

/// # DELETE /api/v1/despesas-padrao
pub async fn delete_default_expenses(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    clear_setting(&state.registry.default_expenses, "default expenses")
}

/// # GET /api/v1/configuracao-limites
pub async fn get_limits(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Versioned<ProcessingLimits>>, AppError> {
    current_setting(&state.registry.limits, "processing limits")
}

/// # PUT /api/v1/configuracao-limites
pub async fn put_limits(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProcessingLimits>, JsonRejection>,
) -> Result<Json<Versioned<ProcessingLimits>>, AppError> {
    let Json(limits) = payload?;
    limits.validate()?;
    Ok(Json(state.registry.limits.replace(limits)))
}

/// # DELETE /api/v1/configuracao-limites
pub async fn delete_limits(State(state): State<Arc<AppState>>) -> Result<StatusCode, AppError> {
    clear_setting(&state.registry.limits, "processing limits")
}
