use analytics::{consistency_warnings, DerivedMetrics, MetricsEngine};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use configuration::{AppConfig, FormulaPreset};
use core_types::SlaughterRecord;
use indicatif::{ProgressBar, ProgressStyle};
use recalculator::{RecalcMode, Recalculator};
use std::path::PathBuf;

/// The main entry point for the abatedouro application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();
    let config = configuration::load_config(&cli.config)?;
    let _guard = configuration::init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve => web_server::run_server(&config).await,
        Commands::Recalculate(args) => handle_recalculate(args, &config).await,
        Commands::Compute(args) => handle_compute(args, &config),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Processing-day records and performance metrics for a poultry abatedouro.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file. A missing file means defaults plus environment.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API.
    Serve,
    /// Recompute the stored metrics of processing days.
    Recalculate(RecalculateArgs),
    /// Compute the metrics of a single record read from a JSON file.
    Compute(ComputeArgs),
}

#[derive(Parser)]
struct RecalculateArgs {
    /// Recompute every record, not only those with missing metrics.
    #[arg(long)]
    all: bool,

    /// Records recomputed in parallel. Defaults to `recalculation.concurrency`.
    #[arg(long)]
    concurrency: Option<usize>,
}

#[derive(Parser)]
struct ComputeArgs {
    /// A JSON file holding one processing-day record.
    #[arg(long)]
    input: PathBuf,

    /// Formula preset. Defaults to the `[formula]` section of the configuration.
    #[arg(long, value_enum)]
    variant: Option<FormulaPreset>,

    /// Print a summary table instead of JSON.
    #[arg(long)]
    table: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Handles the orchestration of a batch recalculation.
async fn handle_recalculate(args: RecalculateArgs, config: &AppConfig) -> anyhow::Result<()> {
    if config.database.url.is_none() {
        anyhow::bail!("recalculate needs a database: set database.url or DATABASE_URL");
    }
    let store = web_server::open_store(config).await?;
    let concurrency = args.concurrency.unwrap_or(config.recalculation.concurrency);
    let mode = if args.all {
        RecalcMode::All
    } else {
        RecalcMode::MissingOnly
    };

    // Set up the progress bar
    let progress_bar = ProgressBar::new(0);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let recalculator = Recalculator::new(store, MetricsEngine::new(config.formula), concurrency)?
        .with_progress(progress_bar);
    let summary = recalculator.run(mode).await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    if summary.failed > 0 {
        anyhow::bail!("{} record(s) could not be updated", summary.failed);
    }
    Ok(())
}

/// Reads, validates and computes one record, printing the derived metrics.
fn handle_compute(args: ComputeArgs, config: &AppConfig) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.input)?;
    let record: SlaughterRecord = serde_json::from_str(&raw)?;
    record.validate()?;
    for warning in consistency_warnings(&record) {
        tracing::warn!(?warning, "Inconsistent record data.");
    }

    let variant = args.variant.map_or(config.formula, FormulaPreset::variant);
    let metrics = MetricsEngine::new(variant).compute(&record);
    tracing::info!(formula = %variant, input = %args.input.display(), "Metrics computed.");

    if args.table {
        println!("{}", summary_table(&metrics));
    } else {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    }
    Ok(())
}

fn summary_table(m: &DerivedMetrics) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Indicador", "Valor"]);
    let rows = [
        ("Receita bruta", m.receita_bruta.to_string()),
        ("Custos fixos", m.custos_fixos.to_string()),
        ("Custo frango vivo", m.custo_frango_vivo.to_string()),
        ("Custos totais", m.custos_totais.to_string()),
        ("Lucro líquido", m.lucro_liquido.to_string()),
        ("Rendimento (%)", m.rendimento_final.to_string()),
        ("Perdas (kg)", m.peso_total_perdas.to_string()),
        ("Perdas (%)", m.percentual_perda_total.to_string()),
        ("Custo por kg", m.custo_kg.to_string()),
        ("Lucro por ave", m.lucro_frango.to_string()),
        ("Aves por hora", m.aves_hora.to_string()),
        ("Eficiência operacional", m.eficiencia_operacional.to_string()),
        ("Score", m.score_performance.to_string()),
        ("Classificação", m.classificacao_performance.to_string()),
    ];
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value]);
    }
    table
}
