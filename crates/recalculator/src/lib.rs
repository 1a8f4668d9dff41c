//! # Abatedouro Recalculator
//!
//! Batch repair of stored metrics. Records are recomputed with bounded concurrency and
//! written back with a single full-document replace each; running it twice is harmless.

use analytics::MetricsEngine;
use chrono::Utc;
use database::{AbateStore, StoredAbate};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub mod error;

pub use error::RecalcError;

/// Which records a run touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecalcMode {
    /// Only records whose stored metrics are absent or incomplete.
    #[default]
    MissingOnly,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecalcSummary {
    /// Records examined.
    pub processed: usize,
    pub updated: usize,
    /// Records left alone because they already had metrics.
    pub skipped: usize,
    pub failed: usize,
}

enum Outcome {
    Updated,
    Skipped,
    Failed,
}

pub struct Recalculator {
    store: Arc<dyn AbateStore>,
    engine: MetricsEngine,
    concurrency: usize,
    progress: Option<ProgressBar>,
}

impl Recalculator {
    pub fn new(
        store: Arc<dyn AbateStore>,
        engine: MetricsEngine,
        concurrency: usize,
    ) -> Result<Self, RecalcError> {
        if concurrency == 0 {
            return Err(RecalcError::InvalidConcurrency);
        }
        Ok(Self {
            store,
            engine,
            concurrency,
            progress: None,
        })
    }

    /// Reports progress on the given bar. Its length is set when the run starts.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub async fn run(&self, mode: RecalcMode) -> Result<RecalcSummary, RecalcError> {
        let abates = self.store.all().await?;
        tracing::info!(
            ?mode,
            records = abates.len(),
            concurrency = self.concurrency,
            "Starting metrics recalculation."
        );
        if let Some(pb) = &self.progress {
            pb.set_length(abates.len() as u64);
        }

        // Each task owns its handles.
        let outcomes: Vec<Outcome> = stream::iter(abates)
            .map(|abate| {
                let store = Arc::clone(&self.store);
                let engine = self.engine;
                let progress = self.progress.clone();
                async move {
                    let outcome = recalculate_one(store.as_ref(), engine, abate, mode).await;
                    if let Some(pb) = progress {
                        pb.inc(1);
                    }
                    outcome
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut summary = RecalcSummary {
            processed: outcomes.len(),
            ..RecalcSummary::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Updated => summary.updated += 1,
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Failed => summary.failed += 1,
            }
        }

        if let Some(pb) = &self.progress {
            pb.finish_with_message("Recalculation complete!");
        }
        tracing::info!(
            processed = summary.processed,
            updated = summary.updated,
            skipped = summary.skipped,
            failed = summary.failed,
            "Metrics recalculation finished."
        );
        Ok(summary)
    }
}

async fn recalculate_one(
    store: &dyn AbateStore,
    engine: MetricsEngine,
    mut abate: StoredAbate,
    mode: RecalcMode,
) -> Outcome {
    if mode == RecalcMode::MissingOnly && abate.metrics.is_some() {
        return Outcome::Skipped;
    }

    let id: Uuid = abate.id;
    abate.metrics = Some(engine.compute(&abate.record));
    abate.updated_at = Some(Utc::now());

    match store.replace(&abate).await {
        Ok(true) => Outcome::Updated,
        Ok(false) => {
            // Deleted while the run was in progress.
            tracing::warn!(%id, "Record disappeared before its metrics were written.");
            Outcome::Failed
        }
        Err(e) => {
            tracing::error!(%id, error = %e, "Failed to write recalculated metrics.");
            Outcome::Failed
        }
    }
}
