//! Binary codec for both datagram directions
//!
//! Pure functions over byte slices, no I/O. All integers are big-endian.
//!
//! ```text
//! client -> server
//!   0   u64  session_id
//!   8   u8   turn_direction
//!   9   u32  next_expected_event_no
//!   13  ..   player_name (datagram length - 13 bytes)
//!
//! server -> client
//!   0   u32  game_id
//!   4   repeated until the end of the datagram:
//!         u32  event_len      (event_no + event_type + event_data)
//!         u32  event_no
//!         u8   event_type
//!         ..   event_data     (event_len - 5 bytes)
//!         u32  crc32          (over event_len..event_data)
//! ```

use crate::error::{ChecksumMismatch, MalformedMessage};
use crate::events::{ClientMessage, Event, EventData, EventType, ServerMessage, TurnDirection};
use crate::{
    CLIENT_HEADER_LEN, EVENT_CRC_LEN, EVENT_HEADER_LEN, EVENT_LEN_FIELD, EVENT_LEN_MIN,
    MAX_PLAYER_NAME_LEN, SERVER_HEADER_LEN,
};

const PIXEL_PAYLOAD_LEN: usize = 9;
const PLAYER_ELIMINATED_PAYLOAD_LEN: usize = 1;
const NEW_GAME_FIXED_LEN: usize = 8;
const NAME_TERMINATOR: u8 = 0;

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn read_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_be_bytes(bytes)
}

/// Encodes a client message.
///
/// The name is not validated; an over-long name simply yields an oversized
/// datagram.
pub fn encode_client_message(
    session_id: u64,
    turn_direction: TurnDirection,
    next_expected_event_no: u32,
    player_name: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(CLIENT_HEADER_LEN + player_name.len());
    out.extend_from_slice(&session_id.to_be_bytes());
    out.push(turn_direction as u8);
    out.extend_from_slice(&next_expected_event_no.to_be_bytes());
    out.extend_from_slice(player_name);
    out
}

impl ClientMessage {
    pub fn encode(&self) -> Vec<u8> {
        encode_client_message(
            self.session_id,
            self.turn_direction,
            self.next_expected_event_no,
            &self.player_name,
        )
    }

    /// Parses a client datagram, as a game server would.
    pub fn decode(datagram: &[u8]) -> Result<Self, MalformedMessage> {
        if datagram.len() < CLIENT_HEADER_LEN {
            return Err(MalformedMessage::TooShort {
                len: datagram.len(),
                needed: CLIENT_HEADER_LEN,
            });
        }

        let name = &datagram[CLIENT_HEADER_LEN..];
        if name.len() > MAX_PLAYER_NAME_LEN {
            return Err(MalformedMessage::NameTooLong {
                len: name.len(),
                max: MAX_PLAYER_NAME_LEN,
            });
        }

        let turn_direction = TurnDirection::try_from(datagram[8])
            .map_err(MalformedMessage::UnknownTurnDirection)?;

        Ok(ClientMessage {
            session_id: read_u64(datagram, 0),
            turn_direction,
            next_expected_event_no: read_u32(datagram, 9),
            player_name: name.to_vec(),
        })
    }
}

fn encode_payload(data: &EventData, out: &mut Vec<u8>) {
    match data {
        EventData::NewGame {
            max_x,
            max_y,
            players,
        } => {
            out.extend_from_slice(&max_x.to_be_bytes());
            out.extend_from_slice(&max_y.to_be_bytes());
            for name in players {
                out.extend_from_slice(name.as_bytes());
                out.push(NAME_TERMINATOR);
            }
        }
        EventData::Pixel { player_num, x, y } => {
            out.push(*player_num);
            out.extend_from_slice(&x.to_be_bytes());
            out.extend_from_slice(&y.to_be_bytes());
        }
        EventData::PlayerEliminated { player_num } => out.push(*player_num),
        EventData::GameOver => {}
    }
}

/// Appends one framed event, with its length and CRC-32, to `out`.
pub fn encode_event(event: &Event, out: &mut Vec<u8>) {
    let start = out.len();

    // Length is patched in once the payload size is known
    out.extend_from_slice(&[0u8; EVENT_LEN_FIELD]);
    out.extend_from_slice(&event.event_no.to_be_bytes());
    out.push(event.event_type() as u8);
    encode_payload(&event.data, out);

    let event_len = (out.len() - start - EVENT_LEN_FIELD) as u32;
    out[start..start + EVENT_LEN_FIELD].copy_from_slice(&event_len.to_be_bytes());

    let crc = crc32fast::hash(&out[start..]);
    out.extend_from_slice(&crc.to_be_bytes());
}

/// Encodes a whole server datagram.
pub fn encode_server_message(game_id: u32, events: &[Event]) -> Vec<u8> {
    let mut out = Vec::with_capacity(SERVER_HEADER_LEN + events.len() * 32);
    out.extend_from_slice(&game_id.to_be_bytes());
    for event in events {
        encode_event(event, &mut out);
    }
    out
}

fn bad_payload(event_no: u32, reason: &'static str) -> MalformedMessage {
    MalformedMessage::BadPayload { event_no, reason }
}

fn parse_players(event_no: u32, block: &[u8]) -> Result<Vec<String>, MalformedMessage> {
    let Some((&last, names)) = block.split_last() else {
        return Ok(Vec::new());
    };
    if last != NAME_TERMINATOR {
        return Err(bad_payload(event_no, "player list lacks a trailing terminator"));
    }

    names
        .split(|b| *b == NAME_TERMINATOR)
        .map(|name| {
            String::from_utf8(name.to_vec())
                .map_err(|_| bad_payload(event_no, "player name is not valid UTF-8"))
        })
        .collect()
}

fn parse_event(event_no: u32, event_type: u8, payload: &[u8]) -> Result<Event, MalformedMessage> {
    let event_type = EventType::try_from(event_type).map_err(|event_type| {
        MalformedMessage::UnknownEventType {
            event_no,
            event_type,
        }
    })?;

    let data = match event_type {
        EventType::NewGame => {
            if payload.len() < NEW_GAME_FIXED_LEN {
                return Err(bad_payload(event_no, "NEW_GAME shorter than 8 bytes"));
            }
            EventData::NewGame {
                max_x: read_u32(payload, 0),
                max_y: read_u32(payload, 4),
                players: parse_players(event_no, &payload[NEW_GAME_FIXED_LEN..])?,
            }
        }
        EventType::Pixel => {
            if payload.len() != PIXEL_PAYLOAD_LEN {
                return Err(bad_payload(event_no, "PIXEL payload is not 9 bytes"));
            }
            EventData::Pixel {
                player_num: payload[0],
                x: read_u32(payload, 1),
                y: read_u32(payload, 5),
            }
        }
        EventType::PlayerEliminated => {
            if payload.len() != PLAYER_ELIMINATED_PAYLOAD_LEN {
                return Err(bad_payload(event_no, "PLAYER_ELIMINATED payload is not 1 byte"));
            }
            EventData::PlayerEliminated {
                player_num: payload[0],
            }
        }
        EventType::GameOver => {
            if !payload.is_empty() {
                return Err(bad_payload(event_no, "GAME_OVER carries a payload"));
            }
            EventData::GameOver
        }
    };

    Ok(Event::new(event_no, data))
}

/// Decodes a server datagram.
///
/// Framing errors and unknown event types reject the whole datagram. A
/// checksum failure only marks its own event; framing is driven by
/// `event_len`, so the events after it are still decoded.
pub fn decode_server_message(datagram: &[u8]) -> Result<ServerMessage, MalformedMessage> {
    if datagram.len() < SERVER_HEADER_LEN {
        return Err(MalformedMessage::TooShort {
            len: datagram.len(),
            needed: SERVER_HEADER_LEN,
        });
    }

    let game_id = read_u32(datagram, 0);
    let mut events = Vec::new();
    let mut offset = SERVER_HEADER_LEN;

    while offset < datagram.len() {
        let remaining = datagram.len() - offset;
        if remaining < EVENT_LEN_FIELD {
            return Err(MalformedMessage::EventOverrun {
                offset,
                needed: EVENT_LEN_FIELD,
                remaining,
            });
        }

        let event_len = read_u32(datagram, offset);
        if (event_len as usize) < EVENT_LEN_MIN {
            return Err(MalformedMessage::EventTooShort { offset, event_len });
        }

        let framed_len = EVENT_LEN_FIELD.saturating_add(event_len as usize);
        let needed = framed_len.saturating_add(EVENT_CRC_LEN);
        if needed > remaining {
            return Err(MalformedMessage::EventOverrun {
                offset,
                needed,
                remaining,
            });
        }

        let framed = &datagram[offset..offset + framed_len];
        let expected = read_u32(datagram, offset + framed_len);
        let computed = crc32fast::hash(framed);

        let event_no = read_u32(framed, EVENT_LEN_FIELD);
        let event_type = framed[EVENT_HEADER_LEN - 1];
        let parsed = parse_event(event_no, event_type, &framed[EVENT_HEADER_LEN..]);

        if expected == computed {
            events.push(Ok(parsed?));
        } else {
            events.push(Err(ChecksumMismatch {
                event_no,
                expected,
                computed,
                event: parsed.ok(),
            }));
        }

        offset += needed;
    }

    Ok(ServerMessage { game_id, events })
}
