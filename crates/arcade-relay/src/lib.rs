//! Gasless vote relay (C6): EIP-7702 delegation bookkeeping and transaction
//! submission on behalf of spectators who sign vote intents off-chain.
//!
//! A user's first relayed vote is submitted as an authorization-list
//! transaction that delegates their EOA to the delegation contract and
//! casts the vote in the same transaction; every subsequent vote is an
//! ordinary transaction through the now-delegated account.

pub mod alloy_backend;
pub mod backend;
pub mod config;
pub mod delegation_cache;
pub mod error;
pub mod routes;

pub use alloy_backend::AlloyRelayBackend;
pub use backend::{AuthorizationParams, RelayBackend};
pub use config::RelayConfig;
pub use delegation_cache::DelegationCache;
pub use error::{RelayError, Result};
pub use routes::{relay_routes, RelayState};
