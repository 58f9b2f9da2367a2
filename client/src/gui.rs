//! Steering input from a GUI process
//!
//! The GUI speaks newline-terminated ASCII key events over TCP, the same
//! lines the broadcast hub emits. Held keys are folded into a turn direction
//! and pushed through a [`ClientHandle`], so the change reaches the server
//! on the next tick.

use crate::network::ClientHandle;
use log::{debug, info, warn};
use shared::TurnDirection;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuiKey {
    LeftDown,
    LeftUp,
    RightDown,
    RightUp,
}

impl GuiKey {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim_end_matches(|c: char| c == '\r' || c == '\n') {
            "LEFT_KEY_DOWN" => Some(GuiKey::LeftDown),
            "LEFT_KEY_UP" => Some(GuiKey::LeftUp),
            "RIGHT_KEY_DOWN" => Some(GuiKey::RightDown),
            "RIGHT_KEY_UP" => Some(GuiKey::RightUp),
            _ => None,
        }
    }
}

/// Held-key state. With both keys down the most recent press wins.
#[derive(Debug, Clone, Default)]
pub struct Steering {
    left_held: bool,
    right_held: bool,
    direction: TurnDirection,
}

impl Steering {
    pub fn direction(&self) -> TurnDirection {
        self.direction
    }

    pub fn apply(&mut self, key: GuiKey) -> TurnDirection {
        match key {
            GuiKey::LeftDown => {
                self.left_held = true;
                self.direction = TurnDirection::Left;
            }
            GuiKey::RightDown => {
                self.right_held = true;
                self.direction = TurnDirection::Right;
            }
            GuiKey::LeftUp => {
                self.left_held = false;
                if self.direction == TurnDirection::Left {
                    self.direction = self.fallback();
                }
            }
            GuiKey::RightUp => {
                self.right_held = false;
                if self.direction == TurnDirection::Right {
                    self.direction = self.fallback();
                }
            }
        }
        self.direction
    }

    fn fallback(&self) -> TurnDirection {
        if self.left_held {
            TurnDirection::Left
        } else if self.right_held {
            TurnDirection::Right
        } else {
            TurnDirection::Straight
        }
    }
}

/// Reads key lines until EOF, steering the client. Returns the number of
/// recognised keys.
pub async fn feed_turns<R>(reader: R, handle: &ClientHandle) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut steering = Steering::default();
    let mut applied = 0;

    while let Some(line) = lines.next_line().await? {
        match GuiKey::parse(&line) {
            Some(key) => {
                let direction = steering.apply(key);
                handle.set_turn_direction(direction);
                applied += 1;
                debug!("GUI {:?} -> {}", key, direction);
            }
            None => warn!("ignoring GUI line {:?}", line),
        }
    }

    Ok(applied)
}

/// Connects to a GUI endpoint and steers the client from it.
pub async fn run_gui_feed(addr: &str, handle: ClientHandle) -> io::Result<()> {
    let stream = TcpStream::connect(addr).await?;
    info!("reading key events from GUI at {}", addr);

    let applied = feed_turns(BufReader::new(stream), &handle).await?;
    info!("GUI connection closed after {} key events", applied);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::TurnDirection::{Left, Right, Straight};

    #[test]
    fn test_parse_keys() {
        assert_eq!(GuiKey::parse("LEFT_KEY_DOWN"), Some(GuiKey::LeftDown));
        assert_eq!(GuiKey::parse("LEFT_KEY_UP\n"), Some(GuiKey::LeftUp));
        assert_eq!(GuiKey::parse("RIGHT_KEY_DOWN\r\n"), Some(GuiKey::RightDown));
        assert_eq!(GuiKey::parse("RIGHT_KEY_UP"), Some(GuiKey::RightUp));
        assert_eq!(GuiKey::parse("UP_KEY_DOWN"), None);
        assert_eq!(GuiKey::parse(""), None);
    }

    #[test]
    fn test_single_key_press_and_release() {
        let mut steering = Steering::default();
        assert_eq!(steering.direction(), Straight);

        assert_eq!(steering.apply(GuiKey::LeftDown), Left);
        assert_eq!(steering.apply(GuiKey::LeftUp), Straight);
        assert_eq!(steering.apply(GuiKey::RightDown), Right);
        assert_eq!(steering.apply(GuiKey::RightUp), Straight);
    }

    #[test]
    fn test_most_recent_press_wins() {
        let mut steering = Steering::default();

        steering.apply(GuiKey::LeftDown);
        assert_eq!(steering.apply(GuiKey::RightDown), Right);

        // Releasing the active key falls back to the one still held
        assert_eq!(steering.apply(GuiKey::RightUp), Left);
        assert_eq!(steering.apply(GuiKey::LeftUp), Straight);
    }

    #[test]
    fn test_releasing_inactive_key_keeps_direction() {
        let mut steering = Steering::default();

        steering.apply(GuiKey::LeftDown);
        steering.apply(GuiKey::RightDown);
        assert_eq!(steering.apply(GuiKey::LeftUp), Right);
    }

    #[tokio::test]
    async fn test_feed_turns_from_stream() {
        let (handle, _controls) = ClientHandle::channel(Straight);
        let stream = tokio_test::io::Builder::new()
            .read(b"LEFT_KEY_DOWN\n")
            .read(b"garbage\nRIGHT_KEY_")
            .read(b"DOWN\nRIGHT_KEY_UP\n")
            .build();

        let applied = feed_turns(BufReader::new(stream), &handle).await.unwrap();
        assert_eq!(applied, 3);
        assert_eq!(handle.turn_direction(), Left);
    }
}
