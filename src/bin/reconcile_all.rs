// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Batch reconciliation job.
//!
//! Recomputes the savings of every request with an accepted offer, then
//! prints the summary as JSON. Ctrl-C stops the run between records; a
//! rerun picks up safely since each record is recomputed from scratch.
//!
//! Exit status: 0 when every record was updated, 1 on a fatal error, 2 when
//! some records failed or the run was interrupted.

use co2_savings::{config::BatchConfig, db::FirestoreDb, services::SavingsService};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            tracing::error!(error = %e, "Batch reconciliation aborted");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every eligible record was updated.
async fn run() -> anyhow::Result<bool> {
    let config = BatchConfig::from_env()?;
    let db = FirestoreDb::new(&config.gcp_project_id).await?;
    let savings = SavingsService::new(
        Arc::new(db),
        config.equivalences,
        config.batch_concurrency,
    );

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping after in-flight records");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let summary = savings.reconcile_all(&cancel).await?;

    for (workshops_used, count) in &summary.workshops_histogram {
        tracing::info!(workshops_used, requests = count, "Requests by comparison set size");
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(summary.failed == 0 && !summary.cancelled)
}

fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_writer(std::io::stderr)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("co2_savings=info,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
