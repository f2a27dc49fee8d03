use std::sync::Arc;
use std::time::Duration;

use anti_recall_core::admin::{self, DEFAULT_DETAILS_LIMIT};
use anti_recall_core::io::input::InputSender;
use anti_recall_core::io::onebot;
use anti_recall_core::io::output::{self, OutputReceiver};
use anti_recall_core::runtime::Runtime;
use anti_recall_core::{AntiRecall, RecallCfg};
use anti_recall_llm::ProviderRegistry;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DB_CONNECT_TIMEOUT_SECS: u64 = 3;
const OUTPUT_BUFFER: usize = 64;
const OUTPUT_FLUSH_SECS: u64 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries rendered announcements; logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
        .init();

    let pool = connect_database().await;
    let mut cfg = match &pool {
        Some(pool) => RecallCfg::load(pool).await?,
        None => RecallCfg::default(),
    };
    if let Ok(self_id) = std::env::var("ANTI_RECALL_SELF_ID") {
        cfg.self_id = self_id.trim().to_owned();
    }

    let mut registry = ProviderRegistry::new();
    match anti_recall_llm::http::from_env() {
        Some(provider) => {
            let id = provider.model().to_owned();
            tracing::info!(provider = %id, "llm provider registered");
            registry.register(id, Arc::new(provider));
        }
        None => tracing::warn!("no llm provider configured, moderation and commentary will be skipped"),
    }

    let (output_tx, output_rx) = output::channel(OUTPUT_BUFFER);
    let shutdown_timeout = Duration::from_secs(cfg.shutdown_timeout_secs);
    let plugin = Arc::new(AntiRecall::new(cfg, Arc::new(registry), output_tx));
    let (runtime, event_tx) = Runtime::new(plugin.clone(), shutdown_timeout);

    let printer = tokio::spawn(print_output(output_rx));
    let reader = tokio::spawn(read_stdin(event_tx, plugin.clone(), runtime.token()));

    runtime.run().await;

    // The reader may still be parked on stdin after a signal.
    reader.abort();
    match reader.await {
        Ok(Err(e)) => tracing::warn!(error = %e, "stdin reader failed"),
        Ok(Ok(())) => {}
        Err(e) if e.is_cancelled() => {}
        Err(e) => tracing::error!(error = %e, "stdin reader panicked"),
    }
    drop(plugin);
    if tokio::time::timeout(Duration::from_secs(OUTPUT_FLUSH_SECS), printer).await.is_err() {
        tracing::warn!("output printer did not finish, exiting anyway");
    }
    Ok(())
}

/// Connect and migrate when `DATABASE_URL` is set. Any failure falls back to
/// built-in defaults.
async fn connect_database() -> Option<sqlx::PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let connect_result = tokio::time::timeout(
        Duration::from_secs(DB_CONNECT_TIMEOUT_SECS),
        sqlx::postgres::PgPoolOptions::new().max_connections(2).connect(&url),
    )
    .await;

    match connect_result {
        Ok(Ok(pool)) => match sqlx::migrate!("../../migrations").run(&pool).await {
            Ok(()) => {
                tracing::info!("database connected and migrations applied");
                Some(pool)
            }
            Err(e) => {
                tracing::warn!(error = %e, "database migration failed, using default config");
                None
            }
        },
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "cannot connect to DATABASE_URL, using default config");
            None
        }
        Err(_) => {
            tracing::warn!(
                timeout_secs = DB_CONNECT_TIMEOUT_SECS,
                "database connect timed out, using default config"
            );
            None
        }
    }
}

async fn print_output(mut output_rx: OutputReceiver) {
    while let Some(unit) = output_rx.recv().await {
        println!("[{}]\n{}\n", unit.destination, unit.render_text());
    }
}

/// One OneBot JSON event or admin command per line.
async fn read_stdin(
    event_tx: InputSender,
    plugin: Arc<AntiRecall>,
    token: CancellationToken,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "/status" => println!("{}", plugin.status()),
            "/cache" => {
                println!("{}", admin::render_cache_details(&plugin.cache_details(DEFAULT_DETAILS_LIMIT)))
            }
            "/clear" => println!("已清空 {} 条缓存消息", plugin.clear_cache()),
            "/quit" | "/exit" => {
                token.cancel();
                break;
            }
            _ => match onebot::decode(line) {
                Ok(Some(event)) => {
                    if event_tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "skipping undecodable input line"),
            },
        }
    }
    Ok(())
}
