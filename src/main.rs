use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use tempo_bridge::bridge::{spawn_interval_flush, Bridge};
use tempo_bridge::config::{Config, DEFAULT_CONFIG_PATH};
use tempo_bridge::decision::TempoPolicy;
use tempo_bridge::window::BatchMode;
use tempo_bridge::{emitter, logging, server};

#[derive(Parser)]
#[command(name = "tempo-bridge", version = env!("GIT_VERSION"))]
#[command(about = "Turns movement classifications into MIDI control changes")]
struct Cli {
    /// TOML 設定ファイル (無ければデフォルト値)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// debug レベルでログ出力
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load_or_default(&cli.config)?;
    config.log.verbose |= cli.verbose;
    logging::init(&config.log, "bridge")?;

    tracing::info!("Tempo Bridge ({})", env!("GIT_VERSION"));
    if !cli.config.exists() {
        tracing::info!("{} not found, using defaults", cli.config.display());
    }

    let emitter = emitter::open(&config.output).context("failed to open control device")?;
    tracing::info!("output: {}", emitter.describe());

    let mode = BatchMode::from_config(&config.batch);
    let policy = TempoPolicy::from_config(&config.decision);
    tracing::info!(
        "batch: {:?}, policy: {:?}, fast CC{} / slow CC{} / tie CC{}",
        mode,
        config.decision.policy,
        config.decision.fast_cc,
        config.decision.slow_cc,
        config.decision.tie_cc
    );
    let bridge = Arc::new(Bridge::new(mode, policy, emitter));

    let shutdown = CancellationToken::new();
    let interval_task = match mode {
        BatchMode::Interval(period) => Some(spawn_interval_flush(Arc::clone(&bridge), period, shutdown.clone())),
        BatchMode::Count(_) => None,
    };

    // 'f' + Enter (または SIGUSR1) で即 flush
    let trigger_flush = Arc::new(AtomicBool::new(false));
    #[cfg(unix)]
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&trigger_flush))?;
    {
        let flag = Arc::clone(&trigger_flush);
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) if line.trim() == "f" => {
                        eprintln!("[input] flush triggered");
                        flag.store(true, Ordering::Relaxed);
                    }
                    Ok(_) => {}
                }
            }
        });
    }
    {
        let bridge = Arc::clone(&bridge);
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_millis(200)) => {}
                }
                if trigger_flush.swap(false, Ordering::Relaxed) && bridge.flush().is_none() {
                    tracing::info!("manual flush: no decision");
                }
            }
        });
    }

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("shutting down...");
                    shutdown.cancel();
                }
                Err(e) => tracing::warn!("ctrl-c handler unavailable: {e}"),
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    server::serve(listener, Arc::clone(&bridge), shutdown.clone()).await?;

    if let Some(task) = interval_task {
        task.await?;
    }
    Ok(())
}
