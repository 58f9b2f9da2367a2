//! Client-side error taxonomy

use shared::MalformedMessage;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server host name did not resolve at all.
    #[error("cannot resolve {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Every candidate address was tried and none could be connected.
    #[error("no reachable server for {target} (tried: {})", .attempts.join("; "))]
    ConnectionRefused {
        target: String,
        attempts: Vec<String>,
    },

    /// Send or receive failure on an established socket.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("malformed datagram: {0}")]
    Malformed(#[from] MalformedMessage),
}
