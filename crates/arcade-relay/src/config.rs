//! Relay configuration: wallet, contract addresses, and submission tuning.

/// Tunables for the relay. Loaded by the supervisor from the `relay`
/// section of the node config (§4.7).
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// WebSocket RPC endpoint used for submitting transactions.
    pub ws_url: String,
    /// HTTP RPC endpoint used for code/nonce/balance reads.
    pub http_url: String,
    /// The vote contract address (`vote(uint8)` target).
    pub vote_contract_address: String,
    /// The EIP-7702 delegation contract address.
    pub delegation_contract_address: [u8; 20],
    /// Chain id, echoed into the authorization list on first use.
    pub chain_id: u64,
    /// Gas limit for the combined delegate + vote transaction.
    pub first_use_gas_limit: u64,
    /// Gas limit for an ordinary (already-delegated) vote transaction.
    pub subsequent_gas_limit: u64,
    /// How far in the past a `deadline` can be and still be accepted, to
    /// tolerate clock skew between client and relay.
    pub deadline_skew_tolerance_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:8546".to_string(),
            http_url: "http://localhost:8545".to_string(),
            vote_contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            delegation_contract_address: [0u8; 20],
            chain_id: 1,
            first_use_gas_limit: 200_000,
            subsequent_gas_limit: 100_000,
            deadline_skew_tolerance_secs: 5,
        }
    }
}
