//! Address resolution and UDP association setup
//!
//! The host is resolved to a list of candidates which are tried in order;
//! the first one that accepts a connected socket wins. Only when every
//! candidate has failed does startup give up.

use crate::error::ClientError;
use log::{info, warn};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::{lookup_host, UdpSocket};

/// Which resolved addresses are eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AddressFamily {
    Any,
    #[default]
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    pub fn accepts(&self, addr: &SocketAddr) -> bool {
        match self {
            AddressFamily::Any => true,
            AddressFamily::Ipv4 => addr.is_ipv4(),
            AddressFamily::Ipv6 => addr.is_ipv6(),
        }
    }
}

/// Resolves `host:port`, keeping the candidates of the requested family.
pub async fn resolve(
    host: &str,
    port: u16,
    family: AddressFamily,
) -> Result<Vec<SocketAddr>, ClientError> {
    let target = format!("{}:{}", host, port);
    let addrs = lookup_host(target.as_str())
        .await
        .map_err(|source| ClientError::Resolve {
            target: target.clone(),
            source,
        })?;

    Ok(addrs.filter(|addr| family.accepts(addr)).collect())
}

async fn connect_candidate(addr: SocketAddr) -> io::Result<UdpSocket> {
    let local: SocketAddr = if addr.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(local).await?;
    socket.connect(addr).await?;
    Ok(socket)
}

/// Opens a UDP socket connected to the first reachable candidate.
pub async fn connect_udp(
    host: &str,
    port: u16,
    family: AddressFamily,
) -> Result<UdpSocket, ClientError> {
    let candidates = resolve(host, port, family).await?;
    let mut attempts = Vec::new();

    for addr in candidates {
        match connect_candidate(addr).await {
            Ok(socket) => {
                info!("testing server {}", addr);
                return Ok(socket);
            }
            Err(e) => {
                warn!("connect {}: {}", addr, e);
                attempts.push(format!("{}: {}", addr, e));
            }
        }
    }

    Err(ClientError::ConnectionRefused {
        target: format!("{}:{}", host, port),
        attempts,
    })
}
