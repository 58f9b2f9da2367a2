//! Reliable client loop over one UDP association
//!
//! A fixed-rate timer re-sends the full current intent every tick, and each
//! readable datagram is decoded and folded into the session. Losing a
//! message in either direction is repaired by the next tick, since every
//! client message restates the cumulative acknowledgment.

use crate::config::ClientConfig;
use crate::connect::connect_udp;
use crate::error::ClientError;
use crate::session::{Delivery, SessionState};
use log::{debug, error, info, warn};
use shared::{decode_server_message, MalformedMessage, TurnDirection};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};

const RECV_BUFFER_LEN: usize = 2048;

/// Lifecycle of a [`ReliableClient`].
///
/// A client value only exists once its socket is connected, so
/// [`ReliableClient::state`] starts at `Active`; `Connecting` is reported
/// through the log while [`ReliableClient::connect`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Resolving and connecting the socket; only ever logged.
    Connecting,
    /// Socket connected; ticks and datagrams are being processed.
    Active,
    /// Loop exited on request; the socket closes with the client.
    Terminated,
}

/// What the loop reports to its caller for every datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Delivered(Delivery),
    /// The datagram was dropped; the session is unaffected.
    Malformed { len: usize, error: MalformedMessage },
}

/// Control surface of a running client, safe to clone into input sources.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    direction: Arc<watch::Sender<TurnDirection>>,
    shutdown: Arc<watch::Sender<bool>>,
}

pub(crate) struct Controls {
    direction: watch::Receiver<TurnDirection>,
    shutdown: watch::Receiver<bool>,
}

impl ClientHandle {
    pub(crate) fn channel(initial: TurnDirection) -> (Self, Controls) {
        let (direction_tx, direction_rx) = watch::channel(initial);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = Self {
            direction: Arc::new(direction_tx),
            shutdown: Arc::new(shutdown_tx),
        };
        let controls = Controls {
            direction: direction_rx,
            shutdown: shutdown_rx,
        };
        (handle, controls)
    }

    /// Picked up by the next tick.
    pub fn set_turn_direction(&self, turn_direction: TurnDirection) {
        self.direction.send_replace(turn_direction);
    }

    pub fn turn_direction(&self) -> TurnDirection {
        *self.direction.borrow()
    }

    /// Asks the loop to stop; it exits before handling anything else.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

pub struct ReliableClient {
    socket: UdpSocket,
    session: SessionState,
    tick_interval: Duration,
    state: ClientState,
    controls: Controls,
    buffer: Vec<u8>,
}

impl ReliableClient {
    /// Resolves the server, connects the socket and arms the client.
    ///
    /// Fails with [`ClientError::ConnectionRefused`] once every candidate
    /// address has been tried.
    pub async fn connect(config: &ClientConfig) -> Result<(Self, ClientHandle), ClientError> {
        debug!("client state {:?}", ClientState::Connecting);
        let socket = connect_udp(&config.host, config.port, config.family).await?;
        Ok(Self::with_socket(socket, config))
    }

    /// Wraps an already connected socket.
    pub fn with_socket(socket: UdpSocket, config: &ClientConfig) -> (Self, ClientHandle) {
        let (handle, controls) = ClientHandle::channel(config.turn_direction);
        let session = SessionState::new(
            config.session_id,
            config.player_name.clone(),
            config.turn_direction,
        );

        let client = Self {
            socket,
            session,
            tick_interval: config.tick_interval,
            state: ClientState::Active,
            controls,
            buffer: vec![0u8; RECV_BUFFER_LEN],
        };
        (client, handle)
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ClientError> {
        Ok(self.socket.local_addr()?)
    }

    /// One timer tick: send the current intent.
    pub async fn send_tick(&mut self) -> Result<usize, ClientError> {
        let turn_direction = *self.controls.direction.borrow();
        self.session.set_turn_direction(turn_direction);

        let datagram = self.session.client_message().encode();
        let sent = self.socket.send(&datagram).await?;
        if sent != datagram.len() {
            warn!("partial send: {} of {} bytes", sent, datagram.len());
        }

        debug!(
            "neen={} sent {} bytes to server",
            self.session.next_expected_event_no(),
            sent
        );
        Ok(sent)
    }

    /// Waits for one datagram and applies it.
    pub async fn receive(&mut self) -> Result<ClientEvent, ClientError> {
        let len = self.socket.recv(&mut self.buffer).await?;
        Ok(self.handle_datagram(len))
    }

    fn handle_datagram(&mut self, len: usize) -> ClientEvent {
        debug!(
            "neen={} received {} bytes from server",
            self.session.next_expected_event_no(),
            len
        );

        match decode_server_message(&self.buffer[..len]) {
            Ok(message) => ClientEvent::Delivered(self.session.apply(message)),
            Err(error) => {
                warn!("dropping malformed datagram of {} bytes: {}", len, error);
                ClientEvent::Malformed { len, error }
            }
        }
    }

    /// Runs the tick/receive loop until [`ClientHandle::shutdown`].
    ///
    /// Every datagram produces one [`ClientEvent`] on `events`. Dropping the
    /// receiver is allowed: the session keeps running and reports are
    /// discarded. Transport errors are logged and the loop keeps going; the
    /// next tick retries.
    pub async fn run(&mut self, events: mpsc::UnboundedSender<ClientEvent>) -> Result<(), ClientError> {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut shutdown = self.controls.shutdown.clone();
        let mut shutdown_open = true;
        let mut reporting = true;

        info!(
            "session {} active, sending every {:?}",
            self.session.session_id(),
            self.tick_interval
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;

                changed = shutdown.changed(), if shutdown_open => {
                    // A dropped handle only means nobody can stop us any more
                    if changed.is_err() {
                        shutdown_open = false;
                    }
                },

                _ = ticker.tick() => {
                    if let Err(e) = self.send_tick().await {
                        error!("Error sending client message: {}", e);
                    }
                },

                result = self.socket.recv(&mut self.buffer) => {
                    match result {
                        Ok(len) => {
                            let event = self.handle_datagram(len);
                            if reporting && events.send(event).is_err() {
                                debug!("event receiver dropped, discarding further reports");
                                reporting = false;
                            }
                        },
                        Err(e) => error!("Error receiving datagram: {}", e),
                    }
                },
            }
        }

        self.state = ClientState::Terminated;
        info!("session {} terminated", self.session.session_id());
        Ok(())
    }
}
