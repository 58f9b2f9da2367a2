//! Session state and the cumulative acknowledgment rules
//!
//! Kept free of sockets so the acknowledgment bookkeeping can be exercised
//! directly. The client loop owns exactly one `SessionState` and is its only
//! writer.

use log::{debug, info, trace, warn};
use shared::{ChecksumMismatch, ClientMessage, Event, ServerMessage, TurnDirection};

/// Outcome of applying one server datagram to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub game_id: u32,
    /// Checksum-valid events in wire order, including duplicates and
    /// out-of-order arrivals.
    pub events: Vec<Event>,
    /// Events that failed their checksum; never acknowledged.
    pub corrupt: Vec<ChecksumMismatch>,
    /// The datagram carried a game id different from the previous one.
    pub game_changed: bool,
    pub game_over: bool,
    /// Acknowledgment counter after the datagram was applied.
    pub next_expected_event_no: u32,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    session_id: u64,
    player_name: Vec<u8>,
    game_id: Option<u32>,
    next_expected_event_no: u32,
    turn_direction: TurnDirection,
}

impl SessionState {
    pub fn new(session_id: u64, player_name: Vec<u8>, turn_direction: TurnDirection) -> Self {
        Self {
            session_id,
            player_name,
            game_id: None,
            next_expected_event_no: 0,
            turn_direction,
        }
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn player_name(&self) -> &[u8] {
        &self.player_name
    }

    /// `None` until the first server datagram arrives.
    pub fn game_id(&self) -> Option<u32> {
        self.game_id
    }

    pub fn next_expected_event_no(&self) -> u32 {
        self.next_expected_event_no
    }

    pub fn turn_direction(&self) -> TurnDirection {
        self.turn_direction
    }

    pub fn set_turn_direction(&mut self, turn_direction: TurnDirection) {
        self.turn_direction = turn_direction;
    }

    /// The message a tick would send right now.
    pub fn client_message(&self) -> ClientMessage {
        ClientMessage {
            session_id: self.session_id,
            turn_direction: self.turn_direction,
            next_expected_event_no: self.next_expected_event_no,
            player_name: self.player_name.clone(),
        }
    }

    /// Applies a decoded datagram.
    ///
    /// A new game id resets the counter before any event is looked at. Only
    /// the event numbered exactly `next_expected_event_no` advances it;
    /// anything below is a duplicate and anything above is a gap, both
    /// surfaced but not counted. A `GAME_OVER` resets the counter once the
    /// whole datagram has been processed.
    pub fn apply(&mut self, message: ServerMessage) -> Delivery {
        let game_changed = self.game_id != Some(message.game_id);
        if game_changed {
            match self.game_id {
                Some(previous) => info!("game {} replaced by game {}", previous, message.game_id),
                None => info!("observing game {}", message.game_id),
            }
            self.game_id = Some(message.game_id);
            self.next_expected_event_no = 0;
        }

        let mut events = Vec::with_capacity(message.events.len());
        let mut corrupt = Vec::new();
        let mut game_over = false;

        for result in message.events {
            match result {
                Ok(event) => {
                    if event.event_no == self.next_expected_event_no {
                        self.next_expected_event_no = self.next_expected_event_no.wrapping_add(1);
                    } else if event.event_no < self.next_expected_event_no {
                        trace!("duplicate event {}", event.event_no);
                    } else {
                        debug!(
                            "event {} arrived ahead of {}",
                            event.event_no, self.next_expected_event_no
                        );
                    }

                    game_over |= event.is_game_over();
                    events.push(event);
                }
                Err(mismatch) => {
                    warn!("game {}: ignoring corrupt event: {}", message.game_id, mismatch);
                    corrupt.push(mismatch);
                }
            }
        }

        if game_over {
            info!("GAME OVER in game {}", message.game_id);
            self.next_expected_event_no = 0;
        }

        Delivery {
            game_id: message.game_id,
            events,
            corrupt,
            game_changed,
            game_over,
            next_expected_event_no: self.next_expected_event_no,
        }
    }
}
