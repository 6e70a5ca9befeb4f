//! [`ChainBackend`] implementation backed by `alloy`.

use crate::backend::{ChainBackend, RawBlockHead, RawVoteLog};
use crate::config::ChainConfig;
use crate::error::{ChainError, Result};
use alloy::primitives::{keccak256, Address as AlloyAddress, B256};
use alloy::providers::{Provider, ProviderBuilder, WsConnect};
use alloy::rpc::types::{Filter, Log};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};

/// The `VoteCast(address,uint8)` event signature, hashed at construction
/// time into the topic0 filters subscribe on.
pub const VOTE_CAST_SIGNATURE: &str = "VoteCast(address,uint8)";

fn vote_cast_topic() -> B256 {
    keccak256(VOTE_CAST_SIGNATURE.as_bytes())
}

/// An `alloy`-backed chain backend: one WS provider for subscriptions,
/// one HTTP provider for polling.
pub struct AlloyChainBackend {
    contract_address: AlloyAddress,
    vote_cast_topic: B256,
    ws_url: String,
    http_url: String,
}

impl AlloyChainBackend {
    /// Build a backend from a [`ChainConfig`].
    pub fn new(config: &ChainConfig) -> Result<Self> {
        let contract_address: AlloyAddress = config
            .contract_address
            .parse()
            .map_err(|e| ChainError::Parse(format!("invalid contract address: {e}")))?;
        Ok(Self {
            contract_address,
            vote_cast_topic: vote_cast_topic(),
            ws_url: config.ws_url.clone(),
            http_url: config.http_url.clone(),
        })
    }

    fn filter(&self) -> Filter {
        Filter::new()
            .address(self.contract_address)
            .event_signature(self.vote_cast_topic)
    }

    fn log_to_raw(&self, log: &Log) -> Result<RawVoteLog> {
        let block = log
            .block_number
            .ok_or_else(|| ChainError::Parse("log missing block number".into()))?;
        let tx_hash = log
            .transaction_hash
            .ok_or_else(|| ChainError::Parse("log missing transaction hash".into()))?;
        let log_index = log
            .log_index
            .ok_or_else(|| ChainError::Parse("log missing log index".into()))?;

        let topics = log.topics();
        let player_topic = topics
            .get(1)
            .ok_or_else(|| ChainError::Parse("log missing player topic".into()))?;
        let mut player = [0u8; 20];
        player.copy_from_slice(&player_topic.as_slice()[12..32]);

        let data = log.data().data.as_ref();
        let action_code = *data
            .last()
            .ok_or_else(|| ChainError::Parse("log missing action byte".into()))?;

        Ok(RawVoteLog {
            block,
            tx_hash: *tx_hash,
            log_index: log_index as u32,
            player,
            action_code,
        })
    }
}

#[async_trait]
impl ChainBackend for AlloyChainBackend {
    async fn subscribe_blocks(&self) -> Result<BoxStream<'static, Result<RawBlockHead>>> {
        let provider = ProviderBuilder::new()
            .on_ws(WsConnect::new(self.ws_url.clone()))
            .await
            .map_err(|e| ChainError::Subscription(e.to_string()))?;

        let subscription = provider
            .subscribe_blocks()
            .await
            .map_err(|e| ChainError::Subscription(e.to_string()))?;

        let stream = subscription.into_stream().map(|header| {
            Ok(RawBlockHead {
                number: header.number,
                hash: Some(*header.hash),
            })
        });

        Ok(Box::pin(stream))
    }

    async fn subscribe_vote_logs(&self) -> Result<BoxStream<'static, Result<RawVoteLog>>> {
        let provider = ProviderBuilder::new()
            .on_ws(WsConnect::new(self.ws_url.clone()))
            .await
            .map_err(|e| ChainError::Subscription(e.to_string()))?;

        let subscription = provider
            .subscribe_logs(&self.filter())
            .await
            .map_err(|e| ChainError::Subscription(e.to_string()))?;

        // `self` outlives the returned stream only for the duration of this
        // call, so the topic/address the filter already narrowed on are
        // re-derived per log from the payload rather than borrowed.
        let stream = subscription.into_stream().map(|log: Log| {
            let block = log
                .block_number
                .ok_or_else(|| ChainError::Parse("log missing block number".into()))?;
            let tx_hash = log
                .transaction_hash
                .ok_or_else(|| ChainError::Parse("log missing transaction hash".into()))?;
            let log_index = log
                .log_index
                .ok_or_else(|| ChainError::Parse("log missing log index".into()))?;
            let topics = log.topics();
            let player_topic = topics
                .get(1)
                .ok_or_else(|| ChainError::Parse("log missing player topic".into()))?;
            let mut player = [0u8; 20];
            player.copy_from_slice(&player_topic.as_slice()[12..32]);
            let action_code = *log
                .data()
                .data
                .as_ref()
                .last()
                .ok_or_else(|| ChainError::Parse("log missing action byte".into()))?;

            Ok(RawVoteLog {
                block,
                tx_hash: *tx_hash,
                log_index: log_index as u32,
                player,
                action_code,
            })
        });

        Ok(Box::pin(stream))
    }

    async fn get_block_number(&self) -> Result<u64> {
        let provider = ProviderBuilder::new().on_http(
            self.http_url
                .parse()
                .map_err(|e| ChainError::Poll(format!("invalid http url: {e}")))?,
        );
        provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::Poll(e.to_string()))
    }

    async fn get_vote_logs_range(&self, from: u64, to: u64) -> Result<Vec<RawVoteLog>> {
        let provider = ProviderBuilder::new().on_http(
            self.http_url
                .parse()
                .map_err(|e| ChainError::Poll(format!("invalid http url: {e}")))?,
        );

        let filter = self.filter().from_block(from + 1).to_block(to);
        let logs = provider
            .get_logs(&filter)
            .await
            .map_err(|e| ChainError::Poll(e.to_string()))?;

        logs.iter().map(|log| self.log_to_raw(log)).collect()
    }
}
