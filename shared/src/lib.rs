//! # Screen-worms wire protocol
//!
//! Types and codec shared by every tool in the workspace that talks to a
//! screen-worms game server over UDP.
//!
//! ## Message directions
//!
//! ### Client to server
//! One [`ClientMessage`] per datagram: the client's session id, its current
//! [`TurnDirection`], a cumulative acknowledgment (`next_expected_event_no`)
//! and the player name, whose length is implied by the datagram size.
//!
//! ### Server to client
//! One [`ServerMessage`] per datagram: a `game_id` followed by zero or more
//! complete, length-prefixed, CRC-32 protected [`Event`]s. An event never
//! spans two datagrams.
//!
//! ## Error model
//! Decoding distinguishes two failures:
//! - [`MalformedMessage`] rejects the whole datagram (bad framing, unknown
//!   event type, wrongly sized payload).
//! - [`ChecksumMismatch`] marks a single event; the others in the same
//!   datagram are still delivered.
//!
//! ## Example
//!
//! ```rust
//! use shared::{decode_server_message, encode_server_message, Event};
//!
//! let bytes = encode_server_message(777, &[Event::pixel(0, 1, 18, 331)]);
//! let message = decode_server_message(&bytes).unwrap();
//! assert_eq!(message.game_id, 777);
//! assert_eq!(message.valid_events().count(), 1);
//! ```

pub mod codec;
pub mod error;
pub mod events;

pub use codec::{decode_server_message, encode_client_message, encode_event, encode_server_message};
pub use error::{ChecksumMismatch, MalformedMessage, ParseTurnDirectionError};
pub use events::{ClientMessage, Event, EventData, EventType, ServerMessage, TurnDirection};

/// session_id + turn_direction + next_expected_event_no
pub const CLIENT_HEADER_LEN: usize = 8 + 1 + 4;
pub const MAX_PLAYER_NAME_LEN: usize = 20;

/// game_id
pub const SERVER_HEADER_LEN: usize = 4;
pub const EVENT_LEN_FIELD: usize = 4;
/// event_len + event_no + event_type
pub const EVENT_HEADER_LEN: usize = EVENT_LEN_FIELD + 4 + 1;
/// Smallest valid `event_len`: event_no + event_type with no payload.
pub const EVENT_LEN_MIN: usize = 4 + 1;
pub const EVENT_CRC_LEN: usize = 4;
