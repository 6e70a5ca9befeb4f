//! Core data model shared by every `arcade-*` crate: the wire types that
//! flow between the chain client, the aggregator, the emulator driver,
//! the fan-out hub, and the relay.

pub mod action;
pub mod block;
pub mod cached;
pub mod delegation;
pub mod error;
pub mod frame;
pub mod game_state;
pub mod resilience;
pub mod vote;
pub mod window;

pub use action::{Action, ALL_ACTIONS};
pub use block::BlockTick;
pub use cached::{CachedAction, CachedVote, CircularBuffer, MAX_CACHED_ACTIONS, MAX_CACHED_VOTES};
pub use delegation::DelegationState;
pub use error::{Result, TypesError};
pub use frame::{RawFrame, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use game_state::{Badges, GameState, PartySlot, PlayerPosition, SpeciesTable};
pub use vote::{Address, TxHash, Vote, VoteId};
pub use window::{break_tie, elect, Window, WindowResult};
