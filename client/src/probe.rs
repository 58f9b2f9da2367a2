//! One-shot probe client for observing server output
//!
//! Unlike [`ReliableClient`](crate::network::ReliableClient) the probe has no
//! timer: the caller sends exactly the messages it wants and then pulls
//! whatever the server produced until the line goes quiet.

use crate::connect::{connect_udp, AddressFamily};
use crate::error::ClientError;
use log::{debug, warn};
use shared::{decode_server_message, encode_client_message, Event, ServerMessage, TurnDirection};
use std::io;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Quiet period after which [`ProbeClient::pull_messages`] stops.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(2);

const RECV_BUFFER_LEN: usize = 2048;

pub struct ProbeClient {
    socket: UdpSocket,
    session_id: u64,
    player_name: Vec<u8>,
    buffer: Vec<u8>,
}

impl ProbeClient {
    pub async fn connect(
        host: &str,
        port: u16,
        family: AddressFamily,
        session_id: u64,
        player_name: impl Into<Vec<u8>>,
    ) -> Result<Self, ClientError> {
        let socket = connect_udp(host, port, family).await?;
        Ok(Self::from_socket(socket, session_id, player_name))
    }

    pub fn from_socket(socket: UdpSocket, session_id: u64, player_name: impl Into<Vec<u8>>) -> Self {
        Self {
            socket,
            session_id,
            player_name: player_name.into(),
            buffer: vec![0u8; RECV_BUFFER_LEN],
        }
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub async fn send(
        &self,
        turn_direction: TurnDirection,
        next_expected_event_no: u32,
    ) -> Result<usize, ClientError> {
        let datagram = encode_client_message(
            self.session_id,
            turn_direction,
            next_expected_event_no,
            &self.player_name,
        );
        Ok(self.socket.send(&datagram).await?)
    }

    /// Decodes one pending datagram without waiting. `Ok(None)` when
    /// nothing is queued.
    pub fn try_recv(&mut self) -> Result<Option<ServerMessage>, ClientError> {
        match self.socket.try_recv(&mut self.buffer) {
            Ok(len) => Ok(Some(decode_server_message(&self.buffer[..len])?)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Collects server messages until none arrives for `idle`.
    ///
    /// Malformed datagrams are logged and skipped.
    pub async fn pull_messages(&mut self, idle: Duration) -> Result<Vec<ServerMessage>, ClientError> {
        let mut messages = Vec::new();

        loop {
            let len = match timeout(idle, self.socket.recv(&mut self.buffer)).await {
                Err(_) => break,
                Ok(result) => result?,
            };

            match decode_server_message(&self.buffer[..len]) {
                Ok(message) => {
                    debug!("{}", message);
                    messages.push(message);
                }
                Err(e) => warn!("probe {}: skipping malformed datagram: {}", self.session_id, e),
            }
        }

        Ok(messages)
    }
}

/// Flattens the checksum-valid events of several messages, in arrival order.
pub fn collect_events(messages: &[ServerMessage]) -> Vec<Event> {
    messages
        .iter()
        .flat_map(|message| message.valid_events().cloned())
        .collect()
}
