//! Error types produced by the wire codec

use crate::events::Event;
use thiserror::Error;

/// A datagram that cannot be framed or interpreted.
///
/// Fatal for the datagram it was produced from, never for the session: the
/// caller logs it, drops the datagram and carries on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedMessage {
    #[error("datagram too short: {len} bytes, at least {needed} required")]
    TooShort { len: usize, needed: usize },

    #[error("event at offset {offset} needs {needed} bytes but only {remaining} remain")]
    EventOverrun {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("event at offset {offset} declares length {event_len}, below the minimum of 5")]
    EventTooShort { offset: usize, event_len: u32 },

    #[error("event {event_no} has unknown type {event_type}")]
    UnknownEventType { event_no: u32, event_type: u8 },

    #[error("event {event_no} has a malformed payload: {reason}")]
    BadPayload { event_no: u32, reason: &'static str },

    #[error("player name is {len} bytes, at most {max} allowed")]
    NameTooLong { len: usize, max: usize },

    #[error("unknown turn direction {0}")]
    UnknownTurnDirection(u8),
}

/// An event whose trailing CRC-32 does not match its contents.
///
/// Framing is length driven, so the rest of the datagram still decodes.
/// `event` holds the fields if the payload could be interpreted anyway; it
/// is for diagnostics only and must not be acknowledged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("event {event_no}: checksum {expected:#010x} on the wire, {computed:#010x} computed")]
pub struct ChecksumMismatch {
    pub event_no: u32,
    pub expected: u32,
    pub computed: u32,
    pub event: Option<Event>,
}

/// Rejected textual turn direction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid turn direction '{0}', expected straight, right or left")]
pub struct ParseTurnDirectionError(pub String);
