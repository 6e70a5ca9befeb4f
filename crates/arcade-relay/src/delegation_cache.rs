//! In-process cache of each user's [`DelegationState`], refreshed from the
//! chain on a miss and guarded by a circuit breaker so a struggling RPC
//! endpoint degrades the relay to `WalletUnderfunded`/`Chain` errors instead
//! of hanging every request behind it.

use crate::backend::RelayBackend;
use crate::error::{RelayError, Result};
use arcade_types::resilience::{CircuitBreaker, CircuitBreakerError};
use arcade_types::{Address, DelegationState};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Caches [`DelegationState`] per user, refreshing from `backend` on miss.
pub struct DelegationCache {
    backend: Arc<dyn RelayBackend>,
    delegation_contract: [u8; 20],
    states: RwLock<HashMap<Address, DelegationState>>,
    breaker: CircuitBreaker,
}

impl DelegationCache {
    pub fn new(backend: Arc<dyn RelayBackend>, delegation_contract: [u8; 20]) -> Self {
        Self {
            backend,
            delegation_contract,
            states: RwLock::new(HashMap::new()),
            breaker: CircuitBreaker::new(5, 2, Duration::from_secs(30)),
        }
    }

    /// The cached state for `user`, refreshing from chain on a miss.
    pub async fn get(&self, user: Address) -> Result<DelegationState> {
        if let Some(state) = self.states.read().get(&user).copied() {
            return Ok(state);
        }
        self.refresh(user).await
    }

    /// Force a refresh of `user`'s state, e.g. after a successful submission
    /// bumps the execute-nonce on chain.
    pub async fn refresh(&self, user: Address) -> Result<DelegationState> {
        let backend = &self.backend;
        let delegation_contract = self.delegation_contract;
        let result = self
            .breaker
            .execute(|| async move {
                let code = backend.get_code(user).await?;
                let delegated = DelegationState::code_is_delegated_to(&code, delegation_contract);
                let execute_nonce = if delegated {
                    backend.get_execute_nonce(user).await?
                } else {
                    0
                };
                Ok::<_, RelayError>(DelegationState {
                    delegated,
                    execute_nonce,
                    eoa_tx_nonce: 0,
                })
            })
            .await;

        match result {
            Ok(state) => {
                self.states.write().insert(user, state);
                Ok(state)
            }
            Err(CircuitBreakerError::Open) => Err(RelayError::Chain(
                "delegation state lookups are failing upstream".to_string(),
            )),
            Err(CircuitBreakerError::Inner(e)) => Err(e),
        }
    }

    /// Record that `user` successfully submitted, bumping the cached nonce
    /// without a round trip.
    pub fn note_submitted(&self, user: Address) {
        if let Some(state) = self.states.write().get_mut(&user) {
            state.delegated = true;
            state.execute_nonce += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;

    fn user(byte: u8) -> Address {
        Address([byte; 20])
    }

    #[tokio::test]
    async fn undelegated_user_reads_as_not_delegated() {
        let backend = Arc::new(MockBackend::new(1_000_000));
        let cache = DelegationCache::new(backend, [0x11; 20]);

        let state = cache.get(user(1)).await.unwrap();
        assert!(!state.delegated);
        assert_eq!(state.execute_nonce, 0);
    }

    #[tokio::test]
    async fn delegated_user_reads_execute_nonce() {
        let backend = Arc::new(MockBackend::new(1_000_000));
        backend.delegate(user(2), [0x11; 20]).await;
        backend.execute_nonce.lock().await.insert(user(2), 4);

        let cache = DelegationCache::new(backend, [0x11; 20]);
        let state = cache.get(user(2)).await.unwrap();
        assert!(state.delegated);
        assert_eq!(state.execute_nonce, 4);
    }

    #[tokio::test]
    async fn note_submitted_bumps_cached_nonce_without_a_refresh() {
        let backend = Arc::new(MockBackend::new(1_000_000));
        let cache = DelegationCache::new(backend, [0x11; 20]);

        cache.get(user(3)).await.unwrap();
        cache.note_submitted(user(3));

        let state = *cache.states.read().get(&user(3)).unwrap();
        assert!(state.delegated);
        assert_eq!(state.execute_nonce, 1);
    }
}
