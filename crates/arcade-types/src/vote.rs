//! Votes and the address/hash primitives they're built from.

use crate::action::Action;
use crate::error::{Result, TypesError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 20-byte EVM account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; 20]);

/// A 32-byte transaction or block hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(pub [u8; 32]);

fn decode_fixed<const N: usize>(field: &'static str, s: &str) -> Result<[u8; N]> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    let mut bytes = [0u8; N];
    let decoded = hex::decode(trimmed).map_err(|source| TypesError::MalformedHex { field, source })?;
    if decoded.len() != N {
        return Err(TypesError::InvalidHexLength {
            field,
            expected: N,
            actual: decoded.len(),
        });
    }
    bytes.copy_from_slice(&decoded);
    Ok(bytes)
}

impl Address {
    /// Parse a `0x`-prefixed (or bare) 40-hex-digit address.
    pub fn parse(s: &str) -> Result<Self> {
        Ok(Self(decode_fixed::<20>("address", s)?))
    }

    /// Lowercase `0x`-prefixed hex encoding.
    pub fn to_hex(self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl TxHash {
    /// Parse a `0x`-prefixed (or bare) 64-hex-digit hash.
    pub fn parse(s: &str) -> Result<Self> {
        Ok(Self(decode_fixed::<32>("tx_hash", s)?))
    }

    /// Lowercase `0x`-prefixed hex encoding.
    pub fn to_hex(self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl TryFrom<String> for Address {
    type Error = TypesError;
    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> String {
        a.to_hex()
    }
}

impl TryFrom<String> for TxHash {
    type Error = TypesError;
    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<TxHash> for String {
    fn from(h: TxHash) -> String {
        h.to_hex()
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// The identity key used for deduplication: `(block, txHash, logIndex)`.
pub type VoteId = (u64, TxHash, u32);

/// A single observed `VoteCast` event, immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// The voting player's address.
    pub player: Address,
    /// The action they voted for.
    pub action: Action,
    /// The block the vote was included in.
    pub block: u64,
    /// The transaction hash carrying the `VoteCast` log.
    pub tx_hash: TxHash,
    /// The log's index within its transaction's receipt.
    pub log_index: u32,
    /// When this node observed the vote, as milliseconds since the Unix epoch.
    pub observed_at_ms: u64,
}

impl Vote {
    /// The deduplication identity of this vote.
    pub fn id(&self) -> VoteId {
        (self.block, self.tx_hash, self.log_index)
    }

    /// The window this vote belongs to, for a given window size `W`.
    pub fn window_id(&self, window_size: u64) -> u64 {
        self.block / window_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_round_trips_through_hex() {
        let addr = Address([0x11; 20]);
        let hex = addr.to_hex();
        assert_eq!(Address::parse(&hex).unwrap(), addr);
    }

    #[test]
    fn address_accepts_missing_0x_prefix() {
        let hex = "1111111111111111111111111111111111111111";
        assert_eq!(Address::parse(hex).unwrap(), Address([0x11; 20]));
    }

    #[test]
    fn address_rejects_wrong_length() {
        assert!(Address::parse("0x1234").is_err());
    }

    #[test]
    fn vote_id_is_the_dedup_key() {
        let vote = Vote {
            player: Address([0u8; 20]),
            action: Action::A,
            block: 7,
            tx_hash: TxHash([0xaa; 32]),
            log_index: 0,
            observed_at_ms: 0,
        };
        assert_eq!(vote.id(), (7, TxHash([0xaa; 32]), 0));
    }

    #[test]
    fn window_id_floors_division() {
        let vote = Vote {
            player: Address([0u8; 20]),
            action: Action::A,
            block: 9,
            tx_hash: TxHash([0u8; 32]),
            log_index: 0,
            observed_at_ms: 0,
        };
        assert_eq!(vote.window_id(5), 1);
    }
}
