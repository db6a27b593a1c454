use std::net::SocketAddr;

use log::{error, info, trace, warn};
use tokio::{net::UdpSocket, task::JoinHandle};

use crate::{
    error::RconError,
    packet::{pack_reply, CommandPacket},
    transport::MAX_DATAGRAM_LEN,
};

/// Console output is flushed to the client in chunks of at most this many
/// bytes, each in its own datagram with its own reply header.
pub const MAX_REPLY_CHUNK: usize = 1024;

const BAD_PASSWORD_REPLY: &str = "Bad rcon_password.\n";

/// Minimal Quake II style rcon responder. Good enough to develop against and
/// to test the client without a game server.
pub struct Server {
    socket: UdpSocket,
    password: String,
}

impl Server {
    pub async fn bind(addr: &str, password: &str) -> Result<Self, RconError> {
        let socket = UdpSocket::bind(addr).await.map_err(RconError::BindError)?;

        Ok(Server {
            socket,
            password: password.to_owned(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RconError> {
        self.socket.local_addr().map_err(RconError::BindError)
    }

    /// Answer rcon packets until the task is aborted. `handler` gets the
    /// command of every packet with the right password and returns the
    /// console output to send back.
    pub fn start<F>(self, handler: F) -> JoinHandle<()>
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        tokio::spawn(async move {
            if let Ok(addr) = self.socket.local_addr() {
                info!("rcon responder running on {}", addr);
            }

            let mut buf = [0; MAX_DATAGRAM_LEN];
            loop {
                let (len, peer) = match self.socket.recv_from(&mut buf).await {
                    Ok(received) => received,
                    Err(e) => {
                        error!("{:?}", e);
                        continue;
                    }
                };

                if let Err(e) = self.process(&buf[..len], peer, &handler).await {
                    warn!("dropping packet from {}: {}", peer, e);
                }
            }
        })
    }

    async fn process<F>(&self, incoming: &[u8], peer: SocketAddr, handler: &F) -> Result<(), RconError>
    where
        F: Fn(&str) -> String,
    {
        let packet = CommandPacket::unpack(incoming)?;

        let output = if packet.password() == self.password {
            info!("{} runs {:?}", peer, packet.command());
            handler(packet.command())
        } else {
            info!("bad rcon password from {}", peer);
            BAD_PASSWORD_REPLY.to_owned()
        };

        // an empty reply still gets one datagram so the client isn't left waiting
        let output = output.as_bytes();
        let chunks: Vec<&[u8]> = if output.is_empty() {
            vec![output]
        } else {
            output.chunks(MAX_REPLY_CHUNK).collect()
        };

        for chunk in chunks {
            trace!("replying with {} bytes to {}", chunk.len(), peer);
            self.socket
                .send_to(&pack_reply(chunk), peer)
                .await
                .map_err(RconError::SendError)?;
        }

        Ok(())
    }
}
