// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitbit Sleep Sync
//!
//! One run: fetch the configured range of Fitbit sleep logs and append the
//! new ones to BigQuery.

use fitbit_sleep_sync::{
    config::Config,
    db::{BigQueryTable, MemoryTable, SleepTable, TokenStore},
    services::{FitbitClient, FitbitService, SleepSync, SleepWriter, SyncSummary},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        start = %config.date_range.start(),
        end = %config.date_range.end(),
        write_mode = ?config.write_mode,
        dry_run = config.dry_run,
        "Starting Fitbit sleep sync"
    );

    let client = FitbitClient::with_urls(
        config.fitbit_client_id.clone(),
        config.fitbit_client_secret.clone(),
        &config.fitbit_api_url,
        &config.fitbit_token_url,
    );
    let fitbit = FitbitService::load(client, TokenStore::new(&config.token_file))?;

    let result = match &config.table {
        Some(table) if !config.dry_run => {
            let table = BigQueryTable::new(table.clone()).await?;
            run(fitbit, table, &config).await
        }
        _ => {
            tracing::info!("Dry run: rows are kept in memory only");
            run(fitbit, MemoryTable::new(), &config).await
        }
    };

    match result {
        Ok(summary) => {
            tracing::info!(
                fetched = summary.fetched,
                inserted = summary.inserted,
                skipped = summary.skipped,
                "Done"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind(), "Sleep sync failed");
            std::process::exit(1);
        }
    }
}

async fn run<T: SleepTable>(
    fitbit: FitbitService,
    table: T,
    config: &Config,
) -> fitbit_sleep_sync::error::Result<SyncSummary> {
    let mut sync = SleepSync::new(fitbit, SleepWriter::new(table, config.write_mode));
    sync.run(&config.date_range).await
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fitbit_sleep_sync=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
