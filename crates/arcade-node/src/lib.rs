//! # arcade node
//!
//! The supervisor process that wires every off-chain component of the
//! voting arcade together: the chain client, the vote aggregator, the
//! emulator driver, the frame pipeline, the fan-out hub, and the
//! (optional) gasless relay.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          arcade node                             │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  C1 Chain Client ──votes/ticks──▶ C2 Vote Aggregator             │
//! │                                        │                        │
//! │                                  window results                  │
//! │                                        ▼                        │
//! │                               C3 Emulator Driver                 │
//! │                                 │            │                  │
//! │                             frames       game state              │
//! │                                 ▼            │                  │
//! │                         C4 Frame Pipeline     │                  │
//! │                                 │             │                  │
//! │                                 ▼             ▼                  │
//! │                          C5 Fan-out Hub (/stream, /ws)            │
//! │                                                                  │
//! │  C6 Relay (optional): /relay, /relay/nonce/{addr}, ...            │
//! │                                                                  │
//! │  HTTP layer: /health*, /metrics, request id + tracing + metrics   │
//! │  middleware                                                       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cargo run --bin arcade-node -- --config arcade.yaml
//! ```
//!
//! ## Modules
//!
//! - [`api`] - HTTP/WebSocket router: spectator streams, metrics, relay mount
//! - [`config`] - Node configuration (file, env, validation)
//! - [`health`] - Liveness/readiness/startup probes
//! - [`observability`] - Logging and metrics composition

pub mod api;
pub mod config;
pub mod health;
pub mod observability;
