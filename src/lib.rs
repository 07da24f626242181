pub mod automate;
pub mod commons;
pub mod contracts;
pub mod db;
pub mod http_client;
pub mod ipfs;
pub mod scanner;
pub mod storage;
pub mod telemetry;

use std::{env, process::exit, sync::Arc, time::Duration};

use anyhow::Context;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use ethers::providers::{Http, Provider};
use tokio::time::interval;
use tracing::info_span;
use tracing_futures::Instrument;

use crate::{
    commons::DEFAULT_POLL_INTERVAL_SECONDS,
    scanner::{Scanner, ScannerConfig},
    storage::{KeyValueStore, MemoryStore, PgStore},
};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

pub async fn main() {
    if let Err(error) = telemetry::init().context("could not initialize logging system") {
        tracing::error!("{:#}", error);
        exit(1);
    }

    let alt_config_path = env::var("CONFIG_PATH").ok();
    let config = match commons::get_config(alt_config_path) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("{:#}", error);
            exit(1);
        }
    };

    let storage: Arc<dyn KeyValueStore> = if config.dev_mode {
        tracing::info!("running in dev mode, checkpoints are kept in memory");
        Arc::new(MemoryStore::new())
    } else {
        tracing::info!("connecting to database");
        let db_connection_pool = match db::connect(&config.db_connection_string) {
            Ok(db_connection_pool) => db_connection_pool,
            Err(error) => {
                tracing::error!("{:#}", error);
                exit(1);
            }
        };

        {
            let mut db_connection = match db_connection_pool
                .get()
                .context("could not get connection to database to run migrations")
            {
                Ok(db_connection) => db_connection,
                Err(error) => {
                    tracing::error!("{:#}", error);
                    exit(1);
                }
            };

            tracing::info!("running pending database migrations");
            if let Err(error) = db_connection.run_pending_migrations(MIGRATIONS) {
                tracing::error!("could not run database migrations - {}", error);
                exit(1);
            }
        }

        Arc::new(PgStore::new(db_connection_pool))
    };

    tracing::info!("rpc endpoint: {}", config.rpc_endpoint);
    let provider = match Provider::<Http>::try_from(config.rpc_endpoint.as_str())
        .context("could not create rpc provider")
    {
        Ok(provider) => Arc::new(provider),
        Err(error) => {
            tracing::error!("{:#}", error);
            exit(1);
        }
    };

    let scanner = Scanner::new(provider, storage, ScannerConfig::from(&config.scanner));

    let poll_interval = Duration::from_secs(
        config
            .poll_interval_seconds
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECONDS),
    );
    tracing::info!("running one invocation every {}s", poll_interval.as_secs());

    let mut ticker = interval(poll_interval);
    loop {
        ticker.tick().await;

        // invocation failures are not fatal, the next tick retries the same
        // unprocessed range (the checkpoint only moves on success)
        match scanner.run().instrument(info_span!("invocation")).await {
            Ok(decision) => match serde_json::to_string(&decision.to_result()) {
                Ok(result) => tracing::info!("{}", result),
                Err(error) => tracing::error!("could not serialize decision - {}", error),
            },
            Err(error) => tracing::error!("invocation failed: {:#}", error),
        }
    }
}
