use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use log::trace;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::{self, Instant};

use crate::{error::RconError, packet::strip_reply_header};

/// Largest datagram we read in one go. Quake II servers flush console output
/// well below this.
pub const MAX_DATAGRAM_LEN: usize = 4096;

/// Which kind of socket a [crate::client::Client] talks over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// One command per UDP datagram, replies in one or more datagrams.
    #[default]
    Datagram,
    /// Connection-oriented rcon. Needs header-delimited reply framing, which
    /// is not there yet, so opening it fails with
    /// [RconError::UnsupportedTransport].
    Stream,
}

/// An open socket owned by a single session.
#[derive(Debug)]
pub enum Transport {
    Datagram(DatagramTransport),
}

impl Transport {
    pub async fn open(kind: TransportKind, host: &str, port: u16) -> Result<Self, RconError> {
        match kind {
            TransportKind::Datagram => Ok(Transport::Datagram(DatagramTransport::open(host, port).await?)),
            TransportKind::Stream => Err(RconError::UnsupportedTransport(kind)),
        }
    }

    pub async fn send_bytes(&self, payload: &[u8]) -> Result<(), RconError> {
        match self {
            Transport::Datagram(transport) => transport.send_bytes(payload).await,
        }
    }

    pub fn discard_pending(&self) -> Result<usize, RconError> {
        match self {
            Transport::Datagram(transport) => transport.discard_pending(),
        }
    }

    pub async fn receive_all(&self, timeout: Duration) -> Result<String, RconError> {
        match self {
            Transport::Datagram(transport) => transport.receive_all(timeout).await,
        }
    }

    pub fn close(self) -> Result<(), RconError> {
        match self {
            Transport::Datagram(transport) => {
                transport.close();
                Ok(())
            }
        }
    }
}

/// UDP socket connected to a single server, so datagrams from anyone else are
/// filtered out by the OS.
#[derive(Debug)]
pub struct DatagramTransport {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl DatagramTransport {
    pub async fn open(host: &str, port: u16) -> Result<Self, RconError> {
        let peer = lookup_host((host, port))
            .await
            .map_err(RconError::UnreachableHost)?
            .next()
            .ok_or_else(|| {
                RconError::UnreachableHost(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no addresses found for {}", host),
                ))
            })?;

        let local: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local)
            .await
            .map_err(RconError::UnreachableHost)?;
        socket.connect(peer).await.map_err(RconError::UnreachableHost)?;

        trace!("opened udp socket {:?} to {}", socket.local_addr(), peer);

        Ok(DatagramTransport { socket, peer })
    }

    /// Send the whole payload as exactly one datagram.
    pub async fn send_bytes(&self, payload: &[u8]) -> Result<(), RconError> {
        trace!("sending {} bytes to {}", payload.len(), self.peer);
        self.socket
            .send(payload)
            .await
            .map_err(RconError::SendError)?;
        Ok(())
    }

    /// Throw away datagrams that are already queued, such as the tail of a
    /// previous reply that arrived after its window closed. Never blocks.
    pub fn discard_pending(&self) -> Result<usize, RconError> {
        let mut buf = [0; MAX_DATAGRAM_LEN];
        let mut discarded = 0;

        loop {
            match self.socket.try_recv(&mut buf) {
                Ok(len) => {
                    trace!("discarding {} byte late fragment from {}", len, self.peer);
                    discarded += 1;
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(RconError::ReceiveError(e)),
            }
        }

        Ok(discarded)
    }

    /// Collect reply datagrams until `timeout` passes without a new one.
    ///
    /// The window slides: every non-empty datagram pushes the deadline out
    /// by another `timeout`, so a long reply split over many datagrams is
    /// read completely as long as the gaps between them stay shorter than
    /// `timeout`. The first silent gap ends the reply. If nothing at all
    /// arrived, this fails with [RconError::TimeoutError].
    pub async fn receive_all(&self, timeout: Duration) -> Result<String, RconError> {
        let mut buf = [0; MAX_DATAGRAM_LEN];
        let mut response = Vec::<u8>::new();
        let mut received = false;
        let mut deadline = Instant::now() + timeout;

        loop {
            match time::timeout_at(deadline, self.socket.recv(&mut buf)).await {
                Ok(Ok(0)) => continue,
                Ok(Ok(len)) => {
                    trace!("received {} byte fragment from {}", len, self.peer);
                    response.extend(strip_reply_header(&buf[..len]));
                    received = true;
                    deadline = Instant::now() + timeout;
                }
                Ok(Err(e)) => return Err(RconError::ReceiveError(e)),
                Err(_) if received => {
                    trace!("no more fragments after {:?}, completing response", timeout);
                    break;
                }
                Err(elapsed) => return Err(RconError::TimeoutError(elapsed)),
            }
        }

        Ok(String::from_utf8_lossy(&response).trim().to_owned())
    }

    /// Dropping a tokio socket cannot fail, so this never reports an error.
    pub fn close(self) {
        trace!("closing udp socket to {}", self.peer);
        drop(self.socket);
    }
}
