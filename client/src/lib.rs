//! # Screen-worms client library
//!
//! Client-side tooling for a screen-worms game server. The server itself is
//! an external process; this crate only speaks its UDP protocol correctly.
//!
//! ## Reliable delivery
//!
//! The protocol has no retransmission of its own. Instead the client sends
//! its full current intent on a fixed timer, and every message carries a
//! cumulative acknowledgment: "I have consumed every event below
//! `next_expected_event_no`". The server keeps re-sending from that point,
//! so loss in either direction heals on the next tick.
//!
//! ### Game boundaries
//! Event numbering restarts at zero for every game. A datagram with a new
//! `game_id`, or a `GAME_OVER` event, resets the acknowledgment counter.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! The acknowledgment state machine, free of I/O.
//!
//! ### Network Module (`network`)
//! [`ReliableClient`](network::ReliableClient): one connected UDP socket,
//! a periodic send timer and a receive path, multiplexed by a single
//! `tokio::select!` loop. A cloneable
//! [`ClientHandle`](network::ClientHandle) steers and stops it.
//!
//! ### Connect Module (`connect`)
//! Host resolution and candidate-by-candidate socket setup.
//!
//! ### GUI Module (`gui`)
//! Turns `LEFT_KEY_DOWN`-style key lines from a GUI into turn directions.
//!
//! ### Probe Module (`probe`)
//! A timer-less client that sends chosen messages and pulls replies until
//! the server goes quiet.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::config::ClientConfig;
//! use client::network::{ClientEvent, ReliableClient};
//! use shared::TurnDirection;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::default();
//!     let (mut client, handle) = ReliableClient::connect(&config).await?;
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!
//!     tokio::spawn(async move {
//!         while let Some(ClientEvent::Delivered(delivery)) = rx.recv().await {
//!             if delivery.game_over {
//!                 handle.shutdown();
//!             } else {
//!                 handle.set_turn_direction(TurnDirection::Left);
//!             }
//!         }
//!     });
//!
//!     client.run(tx).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connect;
pub mod error;
pub mod gui;
pub mod network;
pub mod probe;
pub mod session;
