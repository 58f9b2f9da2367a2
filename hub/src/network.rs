//! TCP broadcast hub: accepts peers and pushes a fixed payload to all of them
//! on every tick.
//!
//! One task owns the [`PeerSet`]. Each peer gets a reader task that forwards
//! what it sees to the hub loop over a channel, so hang-ups are noticed even
//! though the hub never expects data back.

use crate::peer_set::{BroadcastReport, Peer, PeerId, PeerSet};
use log::{debug, error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

pub const DEFAULT_PORT: u16 = 20210;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_PAYLOAD: &[u8] = b"LEFT_KEY_DOWN\n";

const READ_BUFFER_LEN: usize = 1024;

/// Pause after a failed accept, so a persistent error (out of descriptors)
/// does not spin the loop.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    pub port: u16,
    pub interval: Duration,
    pub payload: Vec<u8>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            interval: DEFAULT_INTERVAL,
            payload: DEFAULT_PAYLOAD.to_vec(),
        }
    }
}

/// Reports from per-peer reader tasks to the hub loop
#[derive(Debug)]
pub enum PeerEvent {
    /// Unsolicited bytes; logged and discarded.
    Data { id: PeerId, bytes: Vec<u8> },
    /// Orderly hang-up.
    Closed { id: PeerId },
    ReadFailed { id: PeerId, error: io::Error },
}

impl PeerEvent {
    pub fn peer(&self) -> PeerId {
        match self {
            PeerEvent::Data { id, .. } | PeerEvent::Closed { id } | PeerEvent::ReadFailed { id, .. } => *id,
        }
    }
}

/// Binds the listening socket on every IPv4 interface.
pub async fn bind_listener(port: u16) -> io::Result<TcpListener> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("hub listening on {}", listener.local_addr()?);
    Ok(listener)
}

pub struct BroadcastHub {
    config: HubConfig,
    peers: PeerSet<OwnedWriteHalf>,
    events_tx: mpsc::UnboundedSender<PeerEvent>,
    events_rx: mpsc::UnboundedReceiver<PeerEvent>,
}

impl BroadcastHub {
    pub fn new(config: HubConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            config,
            peers: PeerSet::new(),
            events_tx,
            events_rx,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.ids()
    }

    /// Registers an accepted connection and starts watching it.
    pub fn accept(&mut self, stream: TcpStream, addr: SocketAddr) -> PeerId {
        let id = self.peers.next_id();
        let (reader, writer) = stream.into_split();
        let task = tokio::spawn(read_peer(id, reader, self.events_tx.clone()));

        self.peers.insert(Peer::new(id, addr, writer).with_reader(task));
        id
    }

    /// Waits for one connection on `listener` and registers it.
    pub async fn accept_from(&mut self, listener: &TcpListener) -> io::Result<PeerId> {
        let (stream, addr) = listener.accept().await?;
        Ok(self.accept(stream, addr))
    }

    /// Sends the configured payload to every peer once.
    pub fn broadcast(&mut self) -> BroadcastReport {
        let report = self.peers.broadcast(&self.config.payload);
        debug!(
            "broadcast: {} attempted, {} delivered, {} stalled, {} dropped",
            report.attempted,
            report.delivered,
            report.stalled,
            report.dropped.len()
        );
        report
    }

    /// Waits for the next report from any reader task.
    pub async fn next_peer_event(&mut self) -> Option<PeerEvent> {
        self.events_rx.recv().await
    }

    /// Applies a reader report. Returns true if the peer was removed.
    pub fn handle_peer_event(&mut self, event: PeerEvent) -> bool {
        match event {
            PeerEvent::Data { id, bytes } => {
                info!("{} sent {:?}", id, String::from_utf8_lossy(&bytes));
                false
            }
            PeerEvent::Closed { id } => self.peers.remove(&id).is_some(),
            PeerEvent::ReadFailed { id, error } => {
                warn!("reading from {} failed: {}", id, error);
                self.peers.remove(&id).is_some()
            }
        }
    }

    /// Registers the outcome of one `accept`, backing off on failure.
    pub async fn handle_accepted(
        &mut self,
        accepted: io::Result<(TcpStream, SocketAddr)>,
    ) -> Option<PeerId> {
        match accepted {
            Ok((stream, addr)) => Some(self.accept(stream, addr)),
            Err(e) => {
                error!("accept failed: {}, retrying in {:?}", e, ACCEPT_BACKOFF);
                sleep(ACCEPT_BACKOFF).await;
                None
            }
        }
    }

    /// Serves `listener` forever.
    ///
    /// The first broadcast fires one interval after start. Accept errors are
    /// logged and retried after [`ACCEPT_BACKOFF`].
    pub async fn run(&mut self, listener: TcpListener) -> io::Result<()> {
        let period = self.config.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "broadcasting {:?} every {:?}",
            String::from_utf8_lossy(&self.config.payload),
            period
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    self.handle_accepted(accepted).await;
                },

                _ = ticker.tick() => {
                    self.broadcast();
                },

                Some(event) = self.events_rx.recv() => {
                    self.handle_peer_event(event);
                },
            }
        }
    }
}

/// Forwards everything one peer sends until it hangs up.
async fn read_peer(id: PeerId, mut reader: OwnedReadHalf, events: mpsc::UnboundedSender<PeerEvent>) {
    let mut buffer = [0u8; READ_BUFFER_LEN];

    loop {
        let event = match reader.read(&mut buffer).await {
            Ok(0) => PeerEvent::Closed { id },
            Ok(len) => PeerEvent::Data {
                id,
                bytes: buffer[..len].to_vec(),
            },
            Err(error) => PeerEvent::ReadFailed { id, error },
        };

        let last = !matches!(event, PeerEvent::Data { .. });
        if events.send(event).is_err() || last {
            break;
        }
    }
}

/// Expands `\n`, `\r`, `\t`, `\0` and `\\` in a command-line payload.
/// Unknown escapes are kept as written.
pub fn unescape_payload(raw: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut utf8 = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('r') => out.push(b'\r'),
            Some('t') => out.push(b'\t'),
            Some('0') => out.push(0),
            Some('\\') => out.push(b'\\'),
            Some(other) => {
                out.push(b'\\');
                let mut utf8 = [0u8; 4];
                out.extend_from_slice(other.encode_utf8(&mut utf8).as_bytes());
            }
            None => out.push(b'\\'),
        }
    }

    out
}
