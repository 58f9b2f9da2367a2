//! # Broadcast Hub Library
//!
//! A small TCP service that stands in for a GUI process while the client is
//! tested. Every connected peer receives the same key-event line at a fixed
//! interval, which is enough to drive the client's `--gui` steering input
//! without a real interface.
//!
//! ## Module Organization
//!
//! ### Peer Set Module (`peer_set`)
//! Tracks connected peers:
//! - Peer ids and connection metadata
//! - Best-effort fan-out with a per-tick [`BroadcastReport`]
//! - Removal of peers whose send failed or who hung up
//!
//! ### Network Module (`network`)
//! Owns the listening socket and the event loop:
//! - Accepting connections as they arrive
//! - One reader task per peer reporting data and hang-ups
//! - The broadcast timer
//!
//! ## Delivery Semantics
//!
//! Broadcasts are best effort. A peer whose send fails or is cut short is
//! dropped at once, so no peer ever sees a torn line; a peer whose buffer is
//! full is skipped for that tick and kept. Nothing is queued or retried, so a
//! slow peer simply misses payloads.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use hub::network::{bind_listener, BroadcastHub, HubConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HubConfig::default();
//!     let listener = bind_listener(config.port).await?;
//!
//!     let mut hub = BroadcastHub::new(config);
//!     hub.run(listener).await?;
//!     Ok(())
//! }
//! ```
//!
//! [`BroadcastReport`]: peer_set::BroadcastReport

pub mod network;
pub mod peer_set;
