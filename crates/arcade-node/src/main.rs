//! Supervisor binary: wires every component together and drives the
//! startup/shutdown order described in §4.7.

use anyhow::{Context, Result};
use arcade_aggregator::{AggregatorMetrics, VoteAggregator};
use arcade_chain::{AlloyChainBackend, ChainClientMetrics};
use arcade_emulator::{persistence, rom, DriverConfig, EmulatorMetrics, GameBoyCore, SavePaths};
use arcade_pipeline::{FramePipeline, PipelineConfig as PipelineCfg, PipelineMetrics};
use arcade_realtime::FanoutHub;
use arcade_relay::{AlloyRelayBackend, RelayConfig, RelayState};
use arcade_types::SpeciesTable;
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;

use arcade_node::api::{self, NodeState};
use arcade_node::config::NodeConfig;
use arcade_node::health::HealthState;
use arcade_node::observability::{init_logging, LogFormat, METRICS};

/// Command-line overrides for the node.
#[derive(Parser, Debug)]
#[command(name = "arcade-node")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a YAML configuration file. Falls back to environment
    /// variables and defaults when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) if path.exists() => NodeConfig::from_file(path)
            .with_context(|| format!("loading config file {}", path.display()))?,
        _ => NodeConfig::from_env().context("loading config from environment")?,
    };
    config
        .validate_config()
        .context("validating configuration")?;

    init_logging(
        &config.logging.level,
        matches!(LogFormat::parse(&config.logging.format), LogFormat::Json),
    );
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting arcade node");

    let health_state = HealthState::new();
    let (shutdown_tx, _) = broadcast::channel::<()>(4);

    // Asset acquisition: ROM, then save state (§4.7 step 1-2).
    std::fs::create_dir_all(&config.emulator.save_dir).context("creating save directory")?;
    let rom_path = config.emulator.save_dir.join("rom.bin");
    let rom_bytes = rom::ensure_rom(&rom_path, &config.emulator.rom_url)
        .await
        .context("acquiring ROM")?;
    let save_paths = SavePaths::for_dir(&config.emulator.save_dir);

    // Production startup barrier (§4.3): give a previously running
    // process time to flush its save before this one loads it.
    if config.emulator.production && config.emulator.startup_barrier_ms > 0 {
        tracing::info!(
            ms = config.emulator.startup_barrier_ms,
            "waiting for production startup barrier"
        );
        tokio::time::sleep(std::time::Duration::from_millis(
            config.emulator.startup_barrier_ms,
        ))
        .await;
    }

    // Emulator init: fatal on failure, process exits non-zero (§7).
    let mut core = GameBoyCore::new();
    let load_tier = persistence::load_on_init(&mut core, &rom_bytes, &save_paths)
        .context("emulator init failed")?;
    tracing::info!(tier = load_tier, "emulator state loaded");
    health_state.set_emulator_healthy(true);

    let emulator_metrics = METRICS.register_component(EmulatorMetrics::new_registered);
    let driver_config = DriverConfig {
        fps: 60,
        game_state_interval_ms: config.emulator.game_state_interval_ms,
        autosave_interval_ms: config.emulator.auto_save_interval_secs * 1_000,
        default_press_frames: 5,
    };
    let (emulator_handle, mut frame_rx, mut state_rx, emulator_join) =
        arcade_emulator::driver::spawn_with_metrics(
            core,
            save_paths,
            SpeciesTable::empty(),
            HashMap::new(),
            arcade_emulator::MemoryLayout::default(),
            driver_config,
            shutdown_tx.subscribe(),
            emulator_metrics,
        );

    // Fan-out hub and frame pipeline, wired together by the frame/state loop below.
    let hub = Arc::new(FanoutHub::new(arcade_realtime::ScreenInfo::default()));
    let pipeline_metrics = METRICS.register_component(PipelineMetrics::new_registered);
    let (pipeline, mut compressed_rx) = FramePipeline::new(
        PipelineCfg {
            max_concurrent: config.pipeline.max_concurrent,
            quality: config.pipeline.quality,
        },
        pipeline_metrics,
    );

    {
        let hub = hub.clone();
        tokio::spawn(async move {
            while let Some(compressed) = compressed_rx.recv().await {
                hub.push_frame(bytes::Bytes::from(compressed.jpeg));
            }
        });
    }
    {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            while let Some(frame) = frame_rx.recv().await {
                pipeline.submit_frame(frame).await;
            }
        });
    }
    {
        let hub = hub.clone();
        tokio::spawn(async move {
            while let Some(state) = state_rx.recv().await {
                hub.push_game_state(state);
            }
        });
    }

    // Chain client (C1) and vote aggregator (C2), bridged by one task that
    // owns the aggregator exclusively (§5: addVote/onBlock must be serialized).
    let chain_backend = Arc::new(
        AlloyChainBackend::new(&arcade_chain::ChainConfig {
            ws_url: config.chain.ws_url.clone(),
            http_url: config.chain.http_url.clone(),
            contract_address: config.chain.vote_contract_address.clone(),
            window_size: config.window.window_size,
            block_time_ms: config.chain.block_time_ms,
            max_poll_range: 100,
            skip_ahead_multiplier: 10,
            reconnect_delay_ms: config.chain.reconnect_delay_secs * 1_000,
            poll_lead_cycles: 3,
        })
        .context("building chain backend")?,
    );
    let chain_metrics = METRICS.register_component(ChainClientMetrics::new_registered);
    let (chain_outputs, _chain_handles) = arcade_chain::spawn(
        chain_backend,
        arcade_chain::ChainConfig {
            ws_url: config.chain.ws_url.clone(),
            http_url: config.chain.http_url.clone(),
            contract_address: config.chain.vote_contract_address.clone(),
            window_size: config.window.window_size,
            block_time_ms: config.chain.block_time_ms,
            max_poll_range: 100,
            skip_ahead_multiplier: 10,
            reconnect_delay_ms: config.chain.reconnect_delay_secs * 1_000,
            poll_lead_cycles: 3,
        },
        chain_metrics,
        shutdown_tx.subscribe(),
    );
    health_state.set_chain_connected(true, "subscription");

    let (window_tx, mut window_rx) = tokio::sync::mpsc::unbounded_channel();
    let aggregator_metrics = METRICS.register_component(AggregatorMetrics::new_registered);
    let mut aggregator =
        VoteAggregator::with_metrics(config.window.window_size, window_tx, aggregator_metrics);

    {
        let hub = hub.clone();
        let mut votes = chain_outputs.votes;
        let mut ticks = chain_outputs.ticks;
        let mut shutdown = shutdown_tx.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => return,
                    vote = votes.recv() => {
                        let Some(vote) = vote else { return };
                        hub.push_vote(&vote);
                        if let Err(e) = aggregator.add_vote(vote) {
                            tracing::debug!(error = %e, "vote rejected by aggregator");
                        }
                    }
                    tick = ticks.recv() => {
                        let Some(tick) = tick else { return };
                        aggregator.on_block(tick.number, tick.hash);
                    }
                }
            }
        });
    }
    {
        let hub = hub.clone();
        tokio::spawn(async move {
            while let Some(result) = window_rx.recv().await {
                emulator_handle.press_button(result.winner, None);
                hub.push_window_result(&result);
            }
        });
    }

    // Relay (C6), optional.
    let relay_router = if config.relay.enabled {
        let private_key = config
            .relay
            .private_key
            .clone()
            .expect("validated: relay.enabled implies private_key is set");
        let signer: alloy::signers::local::PrivateKeySigner = private_key
            .parse()
            .context("parsing relay private key")?;
        let delegation_contract_address: [u8; 20] =
            hex::decode(config.relay.delegation_contract_address.trim_start_matches("0x"))
                .context("decoding delegation contract address")?
                .try_into()
                .map_err(|_| anyhow::anyhow!("delegation contract address must be 20 bytes"))?;

        let relay_config = RelayConfig {
            ws_url: config.chain.ws_url.clone(),
            http_url: config.chain.http_url.clone(),
            vote_contract_address: config.chain.vote_contract_address.clone(),
            delegation_contract_address,
            chain_id: config.relay.chain_id,
            ..RelayConfig::default()
        };
        let backend: Arc<dyn arcade_relay::RelayBackend> =
            Arc::new(AlloyRelayBackend::new(&relay_config, signer)?);
        let relay_state = RelayState::new(backend, relay_config);
        Some(arcade_relay::relay_routes().with_state(relay_state))
    } else {
        None
    };

    health_state.set_realtime_healthy(true, hub.stats().frame_clients);
    health_state.set_startup_complete(true);
    health_state.set_ready(true);

    let node_state = NodeState::new(hub.clone());
    let router = api::create_router(node_state, health_state, relay_router);

    let listener = tokio::net::TcpListener::bind(config.api.addr)
        .await
        .with_context(|| format!("binding {}", config.api.addr))?;
    tracing::info!(addr = %config.api.addr, "listening");

    let server = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal());
    server.await.context("server error")?;

    tracing::info!("shutting down");
    let _ = shutdown_tx.send(());
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), emulator_join).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
