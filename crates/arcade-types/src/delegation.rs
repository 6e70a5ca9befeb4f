//! Per-address EIP-7702 delegation bookkeeping for the relay.

use serde::{Deserialize, Serialize};

/// The 3-byte EIP-7702 delegation designator prefix.
pub const DELEGATION_MARKER_PREFIX: [u8; 3] = [0xef, 0x01, 0x00];

/// Per-user delegation bookkeeping.
///
/// `delegated` is true iff the EOA's on-chain code equals the EIP-7702
/// delegation marker for the configured delegation contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationState {
    /// Whether this address currently delegates to the configured contract.
    pub delegated: bool,
    /// The delegation contract's internal execute-nonce for this user.
    pub execute_nonce: u64,
    /// The EOA's own chain transaction nonce, tracked locally so the relay
    /// can pick the right submission path without an extra round trip.
    pub eoa_tx_nonce: u64,
}

impl DelegationState {
    /// The state of an address the relay has never seen: not delegated,
    /// nonce zero.
    pub fn fresh() -> Self {
        Self {
            delegated: false,
            execute_nonce: 0,
            eoa_tx_nonce: 0,
        }
    }

    /// Build the full delegation designator (`0xef0100` + contract address)
    /// expected as an EOA's on-chain code once delegated.
    pub fn designator(delegation_contract: [u8; 20]) -> [u8; 23] {
        let mut out = [0u8; 23];
        out[..3].copy_from_slice(&DELEGATION_MARKER_PREFIX);
        out[3..].copy_from_slice(&delegation_contract);
        out
    }

    /// Whether `code` (an address's on-chain code) matches the delegation
    /// designator for `delegation_contract`.
    pub fn code_is_delegated_to(code: &[u8], delegation_contract: [u8; 20]) -> bool {
        code == Self::designator(delegation_contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_undelegated_with_zero_nonces() {
        let state = DelegationState::fresh();
        assert!(!state.delegated);
        assert_eq!(state.execute_nonce, 0);
        assert_eq!(state.eoa_tx_nonce, 0);
    }

    #[test]
    fn designator_has_the_marker_prefix() {
        let designator = DelegationState::designator([0x11; 20]);
        assert_eq!(&designator[..3], &DELEGATION_MARKER_PREFIX);
        assert_eq!(&designator[3..], &[0x11; 20]);
    }

    #[test]
    fn code_matching_detects_delegation() {
        let contract = [0x22; 20];
        let designator = DelegationState::designator(contract);
        assert!(DelegationState::code_is_delegated_to(&designator, contract));
        assert!(!DelegationState::code_is_delegated_to(&[], contract));
        assert!(!DelegationState::code_is_delegated_to(
            &designator,
            [0x33; 20]
        ));
    }
}
