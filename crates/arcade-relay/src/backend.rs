//! The chain-facing surface the relay needs: reading delegation state and
//! submitting the two transaction shapes from §4.6.

use crate::error::{RelayError, Result};
use arcade_types::{Action, Address, TxHash};
use async_trait::async_trait;

/// A client-supplied EIP-7702 authorization for an undelegated user's first
/// relayed vote.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationParams {
    pub chain_id: u64,
    pub nonce: u64,
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub y_parity: u8,
}

/// Everything the relay needs from the chain: code/nonce reads and the two
/// transaction submission shapes.
#[async_trait]
pub trait RelayBackend: Send + Sync {
    /// The on-chain code at `address`, used to detect EIP-7702 delegation.
    async fn get_code(&self, address: Address) -> Result<Vec<u8>>;

    /// The delegated account's execute-nonce, read *from the user's EOA
    /// address* per §4.6's storage-model note.
    async fn get_execute_nonce(&self, eoa: Address) -> Result<u64>;

    /// The relay wallet's native balance, in wei.
    async fn wallet_balance(&self) -> Result<u128>;

    /// Submit an authorization-list transaction for a user's first relayed
    /// vote, delegating their EOA to the delegation contract in the same
    /// transaction that casts the vote.
    async fn submit_first_use(
        &self,
        user: Address,
        action: Action,
        deadline: u64,
        signature: &[u8],
        authorization: AuthorizationParams,
    ) -> Result<TxHash>;

    /// Submit an ordinary transaction for an already-delegated user.
    async fn submit_subsequent(
        &self,
        user: Address,
        action: Action,
        deadline: u64,
        signature: &[u8],
    ) -> Result<TxHash>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// An in-memory `RelayBackend` for tests: no network, deterministic
    /// responses driven by whatever the test wired up.
    pub struct MockBackend {
        pub code: Mutex<HashMap<Address, Vec<u8>>>,
        pub execute_nonce: Mutex<HashMap<Address, u64>>,
        pub balance: Mutex<u128>,
        pub submissions: Mutex<Vec<(Address, Action)>>,
        pub fail_submission: Mutex<bool>,
    }

    impl MockBackend {
        pub fn new(balance: u128) -> Self {
            Self {
                code: Mutex::new(HashMap::new()),
                execute_nonce: Mutex::new(HashMap::new()),
                balance: Mutex::new(balance),
                submissions: Mutex::new(Vec::new()),
                fail_submission: Mutex::new(false),
            }
        }

        pub async fn delegate(&self, user: Address, delegation_contract: [u8; 20]) {
            let designator = arcade_types::DelegationState::designator(delegation_contract);
            self.code.lock().await.insert(user, designator.to_vec());
        }
    }

    #[async_trait]
    impl RelayBackend for MockBackend {
        async fn get_code(&self, address: Address) -> Result<Vec<u8>> {
            Ok(self.code.lock().await.get(&address).cloned().unwrap_or_default())
        }

        async fn get_execute_nonce(&self, eoa: Address) -> Result<u64> {
            Ok(*self.execute_nonce.lock().await.get(&eoa).unwrap_or(&0))
        }

        async fn wallet_balance(&self) -> Result<u128> {
            Ok(*self.balance.lock().await)
        }

        async fn submit_first_use(
            &self,
            user: Address,
            action: Action,
            _deadline: u64,
            _signature: &[u8],
            _authorization: AuthorizationParams,
        ) -> Result<TxHash> {
            if *self.fail_submission.lock().await {
                return Err(RelayError::Chain("mock submission failure".to_string()));
            }
            self.submissions.lock().await.push((user, action));
            let mut nonces = self.execute_nonce.lock().await;
            *nonces.entry(user).or_insert(0) += 1;
            Ok(TxHash([0xAB; 32]))
        }

        async fn submit_subsequent(
            &self,
            user: Address,
            action: Action,
            _deadline: u64,
            _signature: &[u8],
        ) -> Result<TxHash> {
            if *self.fail_submission.lock().await {
                return Err(RelayError::Chain("mock submission failure".to_string()));
            }
            self.submissions.lock().await.push((user, action));
            let mut nonces = self.execute_nonce.lock().await;
            *nonces.entry(user).or_insert(0) += 1;
            Ok(TxHash([0xCD; 32]))
        }
    }
}
