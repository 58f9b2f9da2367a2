//! Connected peer bookkeeping for the broadcast hub
//!
//! This module tracks the peers the hub fans out to:
//! - Peer identity and connection metadata
//! - Best-effort broadcast with per-peer failure accounting
//! - Removal of peers whose connection is gone
//!
//! Sending goes through the [`PeerSink`] trait so the fan-out rules can be
//! exercised without real sockets.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::task::JoinHandle;

/// Connection handle, unique for the lifetime of one hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

/// Write side of a peer connection.
pub trait PeerSink {
    /// Sends without blocking and returns how many bytes were accepted.
    /// `WouldBlock` means the peer's buffer is full right now.
    fn try_send(&mut self, payload: &[u8]) -> io::Result<usize>;
}

impl PeerSink for OwnedWriteHalf {
    fn try_send(&mut self, payload: &[u8]) -> io::Result<usize> {
        self.try_write(payload)
    }
}

/// A connected peer.
///
/// Dropping it aborts its reader task, which closes the connection.
#[derive(Debug)]
pub struct Peer<S> {
    pub id: PeerId,
    pub addr: SocketAddr,
    pub connected_at: Instant,
    pub sink: S,
    reader: Option<JoinHandle<()>>,
}

impl<S> Peer<S> {
    pub fn new(id: PeerId, addr: SocketAddr, sink: S) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            sink,
            reader: None,
        }
    }

    /// Ties the peer's reader task to its lifetime.
    pub fn with_reader(mut self, reader: JoinHandle<()>) -> Self {
        self.reader = Some(reader);
        self
    }
}

impl<S> Drop for Peer<S> {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Result of one fan-out.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// One per peer present when the tick fired.
    pub attempted: usize,
    pub delivered: usize,
    /// Would-block sends; nothing was written and the peer is kept.
    pub stalled: usize,
    /// Peers removed because the send failed or was cut short.
    pub dropped: Vec<PeerId>,
}

/// All peers of one hub, keyed by [`PeerId`].
pub struct PeerSet<S> {
    peers: HashMap<PeerId, Peer<S>>,
    next_id: u64,
}

impl<S> Default for PeerSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> PeerSet<S> {
    pub fn new() -> Self {
        Self {
            peers: HashMap::new(),
            next_id: 1,
        }
    }

    /// Reserves the id for the next peer.
    pub fn next_id(&mut self) -> PeerId {
        let id = PeerId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, peer: Peer<S>) {
        info!("{} connected from {}", peer.id, peer.addr);
        self.peers.insert(peer.id, peer);
    }

    /// Registers a peer under a fresh id.
    pub fn add(&mut self, addr: SocketAddr, sink: S) -> PeerId {
        let id = self.next_id();
        self.insert(Peer::new(id, addr, sink));
        id
    }

    /// Removes a peer; dropping the returned value closes it.
    pub fn remove(&mut self, id: &PeerId) -> Option<Peer<S>> {
        let peer = self.peers.remove(id)?;
        info!(
            "{} from {} closed after {:?}",
            peer.id,
            peer.addr,
            peer.connected_at.elapsed()
        );
        Some(peer)
    }

    pub fn contains(&self, id: &PeerId) -> bool {
        self.peers.contains_key(id)
    }

    pub fn get_mut(&mut self, id: &PeerId) -> Option<&mut Peer<S>> {
        self.peers.get_mut(id)
    }

    pub fn ids(&self) -> Vec<PeerId> {
        let mut ids: Vec<PeerId> = self.peers.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl<S: PeerSink> PeerSet<S> {
    /// Sends `payload` once to every peer.
    ///
    /// Best effort: a failed or partial send drops the peer, nothing is
    /// retried. A peer whose buffer is full is kept and tried again next tick.
    pub fn broadcast(&mut self, payload: &[u8]) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for (id, peer) in self.peers.iter_mut() {
            report.attempted += 1;
            match peer.sink.try_send(payload) {
                Ok(sent) if sent == payload.len() => report.delivered += 1,
                Ok(sent) => {
                    // The peer now holds a torn line
                    warn!("partial send to {}: {} of {} bytes", id, sent, payload.len());
                    report.dropped.push(*id);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    debug!("{} is not draining, skipped this tick", id);
                    report.stalled += 1;
                }
                Err(e) => {
                    warn!("send to {} failed: {}", id, e);
                    report.dropped.push(*id);
                }
            }
        }

        for id in &report.dropped {
            self.remove(id);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every payload and answers with a scripted outcome.
    #[derive(Debug, Default)]
    struct MockSink {
        sent: Vec<Vec<u8>>,
        fail_with: Option<io::ErrorKind>,
        accept_at_most: Option<usize>,
    }

    impl PeerSink for MockSink {
        fn try_send(&mut self, payload: &[u8]) -> io::Result<usize> {
            self.sent.push(payload.to_vec());
            if let Some(kind) = self.fail_with {
                return Err(io::Error::from(kind));
            }
            Ok(self.accept_at_most.map_or(payload.len(), |max| max.min(payload.len())))
        }
    }

    fn test_addr() -> SocketAddr {
        "127.0.0.1:20210".parse().unwrap()
    }

    fn failing(kind: io::ErrorKind) -> MockSink {
        MockSink {
            fail_with: Some(kind),
            ..MockSink::default()
        }
    }

    #[test]
    fn test_peer_ids_are_unique() {
        let mut peers: PeerSet<MockSink> = PeerSet::new();
        let a = peers.add(test_addr(), MockSink::default());
        let b = peers.add(test_addr(), MockSink::default());

        assert_ne!(a, b);
        assert_eq!(peers.len(), 2);
        assert_eq!(peers.ids(), vec![a, b]);
    }

    #[test]
    fn test_remove_peer() {
        let mut peers: PeerSet<MockSink> = PeerSet::new();
        let id = peers.add(test_addr(), MockSink::default());

        assert!(peers.remove(&id).is_some());
        assert!(peers.is_empty());
        assert!(peers.remove(&id).is_none());
    }

    #[test]
    fn test_broadcast_attempts_every_peer_once() {
        let mut peers: PeerSet<MockSink> = PeerSet::new();
        let ids: Vec<PeerId> = (0..5)
            .map(|_| peers.add(test_addr(), MockSink::default()))
            .collect();

        let report = peers.broadcast(b"LEFT_KEY_DOWN\n");
        assert_eq!(report.attempted, 5);
        assert_eq!(report.delivered, 5);
        assert!(report.dropped.is_empty());
        assert_eq!(peers.len(), 5);

        for id in ids {
            let peer = peers.get_mut(&id).unwrap();
            assert_eq!(peer.sink.sent, vec![b"LEFT_KEY_DOWN\n".to_vec()]);
        }
    }

    #[test]
    fn test_broadcast_to_empty_set() {
        let mut peers: PeerSet<MockSink> = PeerSet::new();
        assert_eq!(peers.broadcast(b"x"), BroadcastReport::default());
    }

    #[test]
    fn test_failed_send_drops_peer() {
        let mut peers: PeerSet<MockSink> = PeerSet::new();
        let healthy = peers.add(test_addr(), MockSink::default());
        let broken = peers.add(test_addr(), failing(io::ErrorKind::BrokenPipe));

        let report = peers.broadcast(b"x");
        assert_eq!(report.attempted, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, vec![broken]);
        assert_eq!(peers.ids(), vec![healthy]);
    }

    #[test]
    fn test_slow_peer_is_kept() {
        let mut peers: PeerSet<MockSink> = PeerSet::new();
        let blocked = peers.add(test_addr(), failing(io::ErrorKind::WouldBlock));

        let report = peers.broadcast(b"LEFT_KEY_DOWN\n");
        assert_eq!(report.attempted, 1);
        assert_eq!(report.stalled, 1);
        assert!(report.dropped.is_empty());
        assert!(peers.contains(&blocked));
    }

    #[test]
    fn test_short_write_drops_peer() {
        let mut peers: PeerSet<MockSink> = PeerSet::new();
        let healthy = peers.add(test_addr(), MockSink::default());
        let short = peers.add(
            test_addr(),
            MockSink {
                accept_at_most: Some(4),
                ..MockSink::default()
            },
        );

        let report = peers.broadcast(b"LEFT_KEY_DOWN\n");
        assert_eq!(report.attempted, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.stalled, 0);
        assert_eq!(report.dropped, vec![short]);

        // Later ticks never append to the torn line
        let report = peers.broadcast(b"LEFT_KEY_DOWN\n");
        assert_eq!(report.attempted, 1);
        assert_eq!(peers.ids(), vec![healthy]);
    }
}
