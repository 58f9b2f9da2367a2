//! Typed model of both message directions
//!
//! The server-to-client payload is a closed sum type, one variant per
//! `event_type`, so a `PIXEL` can never be read through a `NEW_GAME` accessor.
//! Wire-only fields (`event_len`, `crc32`) are not stored: the codec derives
//! them on encode and verifies them on decode.

use crate::error::{ChecksumMismatch, ParseTurnDirectionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Steering intent carried by every client message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TurnDirection {
    #[default]
    Straight = 0,
    Right = 1,
    Left = 2,
}

impl TryFrom<u8> for TurnDirection {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TurnDirection::Straight),
            1 => Ok(TurnDirection::Right),
            2 => Ok(TurnDirection::Left),
            other => Err(other),
        }
    }
}

impl FromStr for TurnDirection {
    type Err = ParseTurnDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "straight" | "0" => Ok(TurnDirection::Straight),
            "right" | "1" => Ok(TurnDirection::Right),
            "left" | "2" => Ok(TurnDirection::Left),
            _ => Err(ParseTurnDirectionError(s.to_string())),
        }
    }
}

impl fmt::Display for TurnDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnDirection::Straight => "straight",
            TurnDirection::Right => "right",
            TurnDirection::Left => "left",
        };
        f.write_str(name)
    }
}

/// Discriminant of an event on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventType {
    NewGame = 0,
    Pixel = 1,
    PlayerEliminated = 2,
    GameOver = 3,
}

impl TryFrom<u8> for EventType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EventType::NewGame),
            1 => Ok(EventType::Pixel),
            2 => Ok(EventType::PlayerEliminated),
            3 => Ok(EventType::GameOver),
            other => Err(other),
        }
    }
}

/// Payload of a server event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventData {
    /// Board size and roster; a name's index is its `player_num`.
    NewGame {
        max_x: u32,
        max_y: u32,
        players: Vec<String>,
    },
    /// One trail cell became occupied.
    Pixel { player_num: u8, x: u32, y: u32 },
    PlayerEliminated { player_num: u8 },
    GameOver,
}

impl EventData {
    pub fn event_type(&self) -> EventType {
        match self {
            EventData::NewGame { .. } => EventType::NewGame,
            EventData::Pixel { .. } => EventType::Pixel,
            EventData::PlayerEliminated { .. } => EventType::PlayerEliminated,
            EventData::GameOver => EventType::GameOver,
        }
    }
}

impl fmt::Display for EventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventData::NewGame {
                max_x,
                max_y,
                players,
            } => {
                write!(f, "NEW_GAME {} {}", max_x, max_y)?;
                for name in players {
                    write!(f, " {}", name)?;
                }
                Ok(())
            }
            EventData::Pixel { player_num, x, y } => write!(f, "PIXEL {} {} {}", player_num, x, y),
            EventData::PlayerEliminated { player_num } => {
                write!(f, "PLAYER_ELIMINATED {}", player_num)
            }
            EventData::GameOver => f.write_str("GAME_OVER"),
        }
    }
}

/// One numbered event of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_no: u32,
    pub data: EventData,
}

impl Event {
    pub fn new(event_no: u32, data: EventData) -> Self {
        Self { event_no, data }
    }

    pub fn new_game(event_no: u32, max_x: u32, max_y: u32, players: &[&str]) -> Self {
        Self::new(
            event_no,
            EventData::NewGame {
                max_x,
                max_y,
                players: players.iter().map(|name| name.to_string()).collect(),
            },
        )
    }

    pub fn pixel(event_no: u32, player_num: u8, x: u32, y: u32) -> Self {
        Self::new(event_no, EventData::Pixel { player_num, x, y })
    }

    pub fn player_eliminated(event_no: u32, player_num: u8) -> Self {
        Self::new(event_no, EventData::PlayerEliminated { player_num })
    }

    pub fn game_over(event_no: u32) -> Self {
        Self::new(event_no, EventData::GameOver)
    }

    pub fn event_type(&self) -> EventType {
        self.data.event_type()
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.data, EventData::GameOver)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ev {} {}", self.event_no, self.data)
    }
}

/// A decoded server datagram.
///
/// Events keep their wire order. An event that failed its checksum stays in
/// place as an `Err` so callers can log it without losing its neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerMessage {
    pub game_id: u32,
    pub events: Vec<Result<Event, ChecksumMismatch>>,
}

impl ServerMessage {
    /// Events that passed their checksum, in wire order.
    pub fn valid_events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter_map(|event| event.as_ref().ok())
    }

    /// Checksum failures, in wire order.
    pub fn corrupt_events(&self) -> impl Iterator<Item = &ChecksumMismatch> {
        self.events.iter().filter_map(|event| event.as_ref().err())
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, event) in self.events.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match event {
                Ok(event) => write!(f, "game {} {}", self.game_id, event)?,
                Err(mismatch) => write!(f, "game {} corrupt {}", self.game_id, mismatch)?,
            }
        }
        Ok(())
    }
}

/// Client-to-server datagram.
///
/// `player_name` is passed through as raw bytes; an empty name joins as an
/// observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    pub session_id: u64,
    pub turn_direction: TurnDirection,
    pub next_expected_event_no: u32,
    pub player_name: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_direction_wire_values() {
        assert_eq!(TurnDirection::Straight as u8, 0);
        assert_eq!(TurnDirection::Right as u8, 1);
        assert_eq!(TurnDirection::Left as u8, 2);
        assert_eq!(TurnDirection::try_from(2), Ok(TurnDirection::Left));
        assert_eq!(TurnDirection::try_from(3), Err(3));
    }

    #[test]
    fn test_turn_direction_from_str() {
        assert_eq!("right".parse::<TurnDirection>(), Ok(TurnDirection::Right));
        assert_eq!(" LEFT ".parse::<TurnDirection>(), Ok(TurnDirection::Left));
        assert_eq!("0".parse::<TurnDirection>(), Ok(TurnDirection::Straight));
        assert!("up".parse::<TurnDirection>().is_err());
    }

    #[test]
    fn test_event_type_from_u8() {
        assert_eq!(EventType::try_from(0), Ok(EventType::NewGame));
        assert_eq!(EventType::try_from(3), Ok(EventType::GameOver));
        assert_eq!(EventType::try_from(4), Err(4));
    }

    #[test]
    fn test_event_display() {
        let new_game = Event::new_game(0, 800, 600, &["Bob", "Cezary"]);
        assert_eq!(new_game.to_string(), "ev 0 NEW_GAME 800 600 Bob Cezary");
        assert_eq!(
            Event::pixel(1, 0, 771, 99).to_string(),
            "ev 1 PIXEL 0 771 99"
        );
        assert_eq!(
            Event::player_eliminated(2, 1).to_string(),
            "ev 2 PLAYER_ELIMINATED 1"
        );
        assert_eq!(Event::game_over(3).to_string(), "ev 3 GAME_OVER");
    }

    #[test]
    fn test_server_message_display() {
        let message = ServerMessage {
            game_id: 777,
            events: vec![Ok(Event::pixel(1, 0, 771, 99)), Ok(Event::game_over(2))],
        };
        assert_eq!(
            message.to_string(),
            "game 777 ev 1 PIXEL 0 771 99\ngame 777 ev 2 GAME_OVER"
        );
    }

    #[test]
    fn test_valid_and_corrupt_split() {
        let mismatch = ChecksumMismatch {
            event_no: 1,
            expected: 1,
            computed: 2,
            event: None,
        };
        let message = ServerMessage {
            game_id: 1,
            events: vec![
                Ok(Event::pixel(0, 0, 1, 1)),
                Err(mismatch.clone()),
                Ok(Event::pixel(2, 0, 1, 2)),
            ],
        };

        let valid: Vec<u32> = message.valid_events().map(|e| e.event_no).collect();
        assert_eq!(valid, vec![0, 2]);
        assert_eq!(message.corrupt_events().collect::<Vec<_>>(), vec![&mismatch]);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&Event::pixel(4, 1, 18, 331)).unwrap();
        assert_eq!(
            json,
            r#"{"event_no":4,"data":{"type":"PIXEL","player_num":1,"x":18,"y":331}}"#
        );

        let json = serde_json::to_string(&Event::game_over(9)).unwrap();
        assert_eq!(json, r#"{"event_no":9,"data":{"type":"GAME_OVER"}}"#);
    }
}
