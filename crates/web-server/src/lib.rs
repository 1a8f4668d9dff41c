use analytics::MetricsEngine;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, patch, post},
    Router,
};
use configuration::{AppConfig, ServerSettings, SettingsRegistry};
use database::{
    AbateStore, MemoryAbateStore, MemoryProductStore, PgAbateStore, PgProductStore, ProductStore,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;
pub mod products;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub store: Arc<dyn AbateStore>,
    pub catalog: Arc<dyn ProductStore>,
    pub registry: Arc<SettingsRegistry>,
    pub engine: MetricsEngine,
    /// Parallelism of `POST /abates-completos/recalcular`.
    pub recalc_concurrency: usize,
}

impl AppState {
    pub fn new(
        stores: Stores,
        registry: Arc<SettingsRegistry>,
        engine: MetricsEngine,
        recalc_concurrency: usize,
    ) -> Self {
        Self {
            store: stores.abates,
            catalog: stores.catalog,
            registry,
            engine,
            recalc_concurrency,
        }
    }
}

/// All `/api/v1` routes, with request tracing. CORS and body limits are added by
/// [`app`].
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/abates-completos",
            get(handlers::list_abates).post(handlers::create_abate),
        )
        .route("/abates-completos/count", get(handlers::count_abates))
        .route("/abates-completos/periodo", get(handlers::list_abates_by_period))
        .route("/abates-completos/recalcular", post(handlers::recalculate_abates))
        .route(
            "/abates-completos/:id",
            get(handlers::get_abate)
                .put(handlers::update_abate)
                .delete(handlers::delete_abate),
        )
        .route("/abates-completos/:id/alertas", get(handlers::get_abate_alerts))
        .route(
            "/produtos",
            get(products::list_products).post(products::create_product),
        )
        .route("/produtos/count", get(products::count_products))
        .route("/produtos/preco", get(products::list_products_by_price))
        .route("/produtos/tipo/:tipo", get(products::list_products_by_tipo))
        .route(
            "/produtos/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/produtos/:id/preco", patch(products::update_product_price))
        .route("/produtos/:id/historico", get(products::product_history))
        .route("/produto-logs", get(products::recent_price_changes))
        .route(
            "/despesas-padrao",
            get(handlers::get_default_expenses)
                .put(handlers::put_default_expenses)
                .delete(handlers::delete_default_expenses),
        )
        .route(
            "/configuracao-limites",
            get(handlers::get_limits)
                .put(handlers::put_limits)
                .delete(handlers::delete_limits),
        );

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins = origins
            .iter()
            .map(|o| HeaderValue::from_str(o))
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };
    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// The complete application: routes plus CORS and the request body limit.
pub fn app(state: Arc<AppState>, settings: &ServerSettings) -> anyhow::Result<Router> {
    Ok(router(state)
        .layer(cors_layer(&settings.cors_origins)?)
        .layer(DefaultBodyLimit::max(settings.body_limit_bytes)))
}

/// The persistence handles shared by the server.
pub struct Stores {
    pub abates: Arc<dyn AbateStore>,
    pub catalog: Arc<dyn ProductStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            abates: Arc::new(MemoryAbateStore::new()),
            catalog: Arc::new(MemoryProductStore::new()),
        }
    }
}

/// Opens the configured stores over one pool. Without a database URL, records
/// and the catalog live in memory for the lifetime of the process.
pub async fn open_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    if config.database.url.is_none() {
        tracing::warn!("No database configured; records are kept in memory only.");
        return Ok(Stores::in_memory());
    }
    let pool = database::connect(&config.database).await?;
    database::run_migrations(&pool).await?;
    Ok(Stores {
        abates: Arc::new(PgAbateStore::new(pool.clone())),
        catalog: Arc::new(PgProductStore::new(pool)),
    })
}

/// Opens the processing-day store alone, for batch tools.
pub async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn AbateStore>> {
    Ok(open_stores(config).await?.abates)
}

/// The main function to configure and run the web server.
pub async fn run_server(config: &AppConfig) -> anyhow::Result<()> {
    // Tracing is initialized by the calling binary.
    let stores = open_stores(config).await?;
    let registry = Arc::new(SettingsRegistry::from_config(config));
    let engine = MetricsEngine::new(config.formula);
    tracing::info!(formula = %config.formula, "Metrics engine ready.");

    let state = Arc::new(AppState::new(
        stores,
        registry,
        engine,
        config.recalculation.concurrency,
    ));
    let app = app(state, &config.server)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
