//! Client configuration and its defaults

use crate::connect::AddressFamily;
use rand::Rng;
use shared::TurnDirection;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const DEFAULT_PORT: u16 = 2021;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(30);
pub const DEFAULT_NAME_LEN: usize = 5;

const NAME_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Everything a [`ReliableClient`](crate::network::ReliableClient) needs to
/// start a session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub family: AddressFamily,
    /// Chosen once and kept for the whole connection.
    pub session_id: u64,
    /// Sent verbatim; empty means observer.
    pub player_name: Vec<u8>,
    /// Direction sent until something changes it through the handle.
    pub turn_direction: TurnDirection,
    pub tick_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            family: AddressFamily::Ipv4,
            session_id: default_session_id(),
            player_name: random_name(DEFAULT_NAME_LEN).into_bytes(),
            turn_direction: TurnDirection::Right,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// Wall-clock milliseconds, which keeps ids increasing across restarts.
pub fn default_session_id() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

/// Random name of uppercase letters and digits.
pub fn random_name(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| NAME_CHARSET[rng.gen_range(0..NAME_CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_name_charset() {
        let name = random_name(20);
        assert_eq!(name.len(), 20);
        assert!(name
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 2021);
        assert_eq!(config.family, AddressFamily::Ipv4);
        assert_eq!(config.player_name.len(), DEFAULT_NAME_LEN);
        assert_eq!(config.turn_direction, TurnDirection::Right);
        assert_eq!(config.tick_interval, Duration::from_millis(30));
    }

    #[test]
    fn test_session_ids_do_not_decrease() {
        let first = default_session_id();
        let second = default_session_id();
        assert!(first > 0);
        assert!(second >= first);
    }
}
