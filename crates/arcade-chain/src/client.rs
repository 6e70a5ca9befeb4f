//! The chain client: drives the subscription and poll upstreams, merges
//! and deduplicates their output, and emits `Vote`/`BlockTick` downstream.

use crate::backend::{ChainBackend, RawBlockHead, RawVoteLog};
use crate::config::ChainConfig;
use crate::dedup::DedupSet;
use crate::metrics::{ChainClientMetrics, PathLabel};
use arcade_types::{Action, Address, BlockTick, TxHash, Vote};
use futures::StreamExt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{broadcast, mpsc};

/// Which upstream path produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Path {
    Subscription,
    Poll,
}

impl Path {
    fn label(self) -> PathLabel {
        PathLabel {
            path: match self {
                Path::Subscription => "subscription",
                Path::Poll => "poll",
            }
            .to_string(),
        }
    }
}

#[derive(Debug)]
enum RawEvent {
    Tick(Path, RawBlockHead),
    Vote(Path, RawVoteLog),
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn raw_log_to_vote(raw: &RawVoteLog) -> Option<Vote> {
    let action = Action::from_code(raw.action_code).ok()?;
    Some(Vote {
        player: Address(raw.player),
        action,
        block: raw.block,
        tx_hash: TxHash(raw.tx_hash),
        log_index: raw.log_index,
        observed_at_ms: now_ms(),
    })
}

/// Handles for the chain client's downstream consumers.
pub struct ChainOutputs {
    /// Deduplicated vote stream.
    pub votes: mpsc::UnboundedReceiver<Vote>,
    /// Every observed block, from either upstream.
    pub ticks: mpsc::UnboundedReceiver<BlockTick>,
}

/// Spawns the chain client's long-lived tasks (T1 subscription reader, T2
/// poll timer, plus an internal merge/dedup task) and returns the output
/// channels plus their join handles.
pub fn spawn(
    backend: Arc<dyn ChainBackend>,
    config: ChainConfig,
    metrics: ChainClientMetrics,
    mut shutdown: broadcast::Receiver<()>,
) -> (ChainOutputs, Vec<tokio::task::JoinHandle<()>>) {
    let (raw_tx, raw_rx) = mpsc::unbounded_channel::<RawEvent>();
    let (votes_tx, votes_rx) = mpsc::unbounded_channel::<Vote>();
    let (ticks_tx, ticks_rx) = mpsc::unbounded_channel::<BlockTick>();

    let mut handles = Vec::new();

    // T1: subscription reader.
    {
        let backend = backend.clone();
        let raw_tx = raw_tx.clone();
        let metrics = metrics.clone();
        let reconnect_delay = std::time::Duration::from_millis(config.reconnect_delay_ms);
        let mut shutdown = shutdown.resubscribe();
        handles.push(tokio::spawn(async move {
            loop {
                let blocks = backend.subscribe_blocks().await;
                let logs = backend.subscribe_vote_logs().await;

                match (blocks, logs) {
                    (Ok(mut blocks), Ok(mut logs)) => loop {
                        tokio::select! {
                            _ = shutdown.recv() => return,
                            head = blocks.next() => {
                                match head {
                                    Some(Ok(head)) => {
                                        metrics.ticks_emitted.get_or_create(&Path::Subscription.label()).inc();
                                        if raw_tx.send(RawEvent::Tick(Path::Subscription, head)).is_err() {
                                            return;
                                        }
                                    }
                                    Some(Err(e)) => {
                                        tracing::warn!(error = %e, "subscription block stream error");
                                        break;
                                    }
                                    None => break,
                                }
                            }
                            log = logs.next() => {
                                match log {
                                    Some(Ok(log)) => {
                                        metrics.votes_observed.get_or_create(&Path::Subscription.label()).inc();
                                        if raw_tx.send(RawEvent::Vote(Path::Subscription, log)).is_err() {
                                            return;
                                        }
                                    }
                                    Some(Err(e)) => {
                                        tracing::warn!(error = %e, "subscription log stream error");
                                        break;
                                    }
                                    None => break,
                                }
                            }
                        }
                    },
                    (blocks_result, logs_result) => {
                        if let Err(e) = blocks_result {
                            tracing::warn!(error = %e, "block subscription failed");
                        }
                        if let Err(e) = logs_result {
                            tracing::warn!(error = %e, "log subscription failed");
                        }
                    }
                }

                metrics.reconnects.inc();
                tracing::info!(delay_ms = reconnect_delay.as_millis(), "reconnecting subscription");
                tokio::select! {
                    _ = tokio::time::sleep(reconnect_delay) => {}
                    _ = shutdown.recv() => return,
                }
            }
        }));
    }

    // T2: poll timer.
    {
        let backend = backend.clone();
        let raw_tx = raw_tx.clone();
        let metrics = metrics.clone();
        let interval = std::time::Duration::from_millis(config.poll_interval_ms().max(1));
        let max_range = config.max_poll_range;
        let skip_ahead_threshold = config.skip_ahead_threshold();
        let mut shutdown = shutdown.resubscribe();
        handles.push(tokio::spawn(async move {
            let mut last_polled: u64 = 0;
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = shutdown.recv() => return,
                    _ = ticker.tick() => {}
                }

                let head = match backend.get_block_number().await {
                    Ok(head) => head,
                    Err(e) => {
                        tracing::warn!(error = %e, "poll: get_block_number failed");
                        metrics.poll_errors.inc();
                        continue;
                    }
                };

                if head <= last_polled {
                    continue;
                }

                let from = if head - last_polled > skip_ahead_threshold {
                    tracing::warn!(head, last_polled, "poll path skipping ahead, too far behind");
                    head.saturating_sub(max_range)
                } else {
                    last_polled
                };
                let to = head.min(from + max_range);

                match backend.get_vote_logs_range(from, to).await {
                    Ok(logs) => {
                        for log in logs {
                            metrics.votes_observed.get_or_create(&Path::Poll.label()).inc();
                            if raw_tx.send(RawEvent::Vote(Path::Poll, log)).is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "poll: get_vote_logs_range failed");
                        metrics.poll_errors.inc();
                        continue;
                    }
                }

                metrics.ticks_emitted.get_or_create(&Path::Poll.label()).inc();
                if raw_tx
                    .send(RawEvent::Tick(Path::Poll, RawBlockHead { number: to, hash: None }))
                    .is_err()
                {
                    return;
                }

                last_polled = to;
            }
        }));
    }

    drop(raw_tx);

    // Merge/dedup task: sole owner of the dedup set and per-block merge state.
    handles.push(tokio::spawn(merge_task(
        raw_rx,
        votes_tx,
        ticks_tx,
        config,
        shutdown,
    )));

    (
        ChainOutputs {
            votes: votes_rx,
            ticks: ticks_rx,
        },
        handles,
    )
}

async fn merge_task(
    mut raw_rx: mpsc::UnboundedReceiver<RawEvent>,
    votes_tx: mpsc::UnboundedSender<Vote>,
    ticks_tx: mpsc::UnboundedSender<BlockTick>,
    config: ChainConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut dedup = DedupSet::new();
    let mut last_subscription_tick: Option<BlockTick> = None;
    let mut current_window: u64 = 0;

    loop {
        let event = tokio::select! {
            _ = shutdown.recv() => return,
            event = raw_rx.recv() => match event {
                Some(event) => event,
                None => return,
            },
        };

        match event {
            RawEvent::Tick(Path::Subscription, head) => {
                let tick = BlockTick {
                    number: head.number,
                    hash: head.hash,
                };
                last_subscription_tick = Some(tick);
                current_window = current_window.max(tick.number / config.window_size);
                dedup.evict_before(current_window);
                let _ = ticks_tx.send(tick);
            }
            RawEvent::Tick(Path::Poll, head) => {
                let poll_tick = BlockTick {
                    number: head.number,
                    hash: head.hash,
                };
                let merged = BlockTick::prefer_subscription(
                    last_subscription_tick.filter(|s| s.number == poll_tick.number),
                    poll_tick,
                );
                current_window = current_window.max(merged.number / config.window_size);
                dedup.evict_before(current_window);
                let _ = ticks_tx.send(merged);
            }
            RawEvent::Vote(path, raw) => {
                let Some(vote) = raw_log_to_vote(&raw) else {
                    tracing::warn!(code = raw.action_code, "dropping vote with invalid action code");
                    continue;
                };
                let window_id = vote.window_id(config.window_size);
                if dedup.insert(vote.id(), window_id) {
                    tracing::info!(
                        block = vote.block,
                        tx_hash = %vote.tx_hash,
                        path = ?path,
                        "vote observed"
                    );
                    let _ = votes_tx.send(vote);
                } else {
                    tracing::debug!(block = vote.block, tx_hash = %vote.tx_hash, "duplicate vote dropped");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;

    fn raw_vote(block: u64, tx_byte: u8, log_index: u32, action_code: u8) -> RawVoteLog {
        RawVoteLog {
            block,
            tx_hash: [tx_byte; 32],
            log_index,
            player: [0xaa; 20],
            action_code,
        }
    }

    #[tokio::test]
    async fn dedups_the_same_log_seen_on_both_paths() {
        let backend = Arc::new(MockBackend::default());
        backend
            .vote_logs
            .lock()
            .push_back(raw_vote(7, 0xaa, 0, 4));
        backend.range_logs.lock().push(raw_vote(7, 0xaa, 0, 4));
        *backend.head.lock() = 10;

        let config = ChainConfig {
            window_size: 5,
            block_time_ms: 10,
            ..ChainConfig::default()
        };
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let metrics = ChainClientMetrics::default();

        let (mut outputs, handles) = spawn(backend, config, metrics, shutdown_rx);

        let first = tokio::time::timeout(std::time::Duration::from_millis(500), outputs.votes.recv())
            .await
            .expect("first vote")
            .expect("channel open");
        assert_eq!(first.block, 7);

        let second = tokio::time::timeout(std::time::Duration::from_millis(500), outputs.votes.recv()).await;
        assert!(second.is_err(), "no second vote should arrive: the poll-path duplicate must be dropped");

        let _ = shutdown_tx.send(());
        for handle in handles {
            let _ = tokio::time::timeout(std::time::Duration::from_millis(200), handle).await;
        }
    }
}
