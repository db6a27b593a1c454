use std::time::Duration;

use crate::{
    error::RconError,
    packet::CommandPacket,
    transport::{Transport, TransportKind},
};
use log::{debug, trace};
use tokio::sync::Mutex;

/// How long to wait for the first reply datagram, and for each one after it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Command sent right after opening to find out whether the password works.
pub const PROBE_COMMAND: &str = "status";

/// Replies Quake II servers give when the rcon password is wrong.
pub const BAD_PASSWORD_REPLIES: [&str; 2] = ["Bad rcon_password.", "Invalid password."];

/// Tunables for [Client::connect_with].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    transport: TransportKind,
    timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            transport: TransportKind::Datagram,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientOptions {
    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    /// Reply window, the same unit for every transport.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Simple asynchronous rcon client for Quake II based servers. Call
/// `connect()` to open a socket and check the password.
///
/// Commands are serialized: only one command/reply exchange is in flight at
/// a time, other callers wait for the lock. `close()` takes the same lock, so
/// it waits for a running command to finish.
///
/// ## Example
/// ```no_run
/// use q2rcon::client::Client;
/// use std::error::Error;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn Error>> {
///     let client = Client::connect("127.0.0.1", 27910, "<put rcon password here>").await?;
///     let response = client.command("sv maplist").await?;
///
///     println!("{}", response);
///     client.close().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Client {
    host: String,
    port: u16,
    password: String,
    timeout: Duration,
    transport: Mutex<Option<Transport>>,
}

impl Client {
    pub async fn connect<P>(host: &str, port: P, password: &str) -> Result<Self, RconError>
    where
        P: TryInto<u16>,
    {
        Self::connect_with(host, port, password, ClientOptions::default()).await
    }

    /// Validate the address, open the transport and send [PROBE_COMMAND].
    /// A reply from [BAD_PASSWORD_REPLIES] closes the socket again and fails
    /// with [RconError::AuthenticationError].
    pub async fn connect_with<P>(
        host: &str,
        port: P,
        password: &str,
        options: ClientOptions,
    ) -> Result<Self, RconError>
    where
        P: TryInto<u16>,
    {
        if host.is_empty() {
            return Err(RconError::InvalidConfig("invalid hostname"));
        }

        let port = port
            .try_into()
            .ok()
            .filter(|port| *port != 0)
            .ok_or(RconError::InvalidConfig("invalid port number"))?;

        let transport = Transport::open(options.transport, host, port).await?;

        trace!("opened {:?} transport to {}:{}, probing password", options.transport, host, port);

        let client = Client {
            host: host.to_owned(),
            port,
            password: password.to_owned(),
            timeout: options.timeout,
            transport: Mutex::new(Some(transport)),
        };

        let probe = match client.command(PROBE_COMMAND).await {
            Ok(probe) => probe,
            Err(e) => {
                client.close().await?;
                return Err(e);
            }
        };
        debug!("probe reply from {}:{}: {}", client.host, client.port, probe);

        if BAD_PASSWORD_REPLIES.contains(&probe.as_str()) {
            client.close().await?;
            return Err(RconError::AuthenticationError);
        }

        trace!("password accepted");

        Ok(client)
    }

    /// Run a rcon command and wait for the whole reply. Fragments are glued
    /// together in arrival order and the result is trimmed. Datagrams still
    /// queued from an earlier command are dropped before sending.
    pub async fn command(&self, command: &str) -> Result<String, RconError> {
        let packet = CommandPacket::new(&self.password, command)?;

        let guard = self.transport.lock().await;
        let transport = guard.as_ref().ok_or(RconError::Closed)?;

        let stale = transport.discard_pending()?;
        if stale > 0 {
            debug!("dropped {} late fragment(s) of an earlier reply", stale);
        }

        trace!("sending command packet to server");
        transport.send_bytes(&packet.pack()).await?;

        transport.receive_all(self.timeout).await
    }

    /// Alias of [Client::command].
    pub async fn send(&self, command: &str) -> Result<String, RconError> {
        self.command(command).await
    }

    /// Release the socket. Calling this again is a no-op.
    pub async fn close(&self) -> Result<(), RconError> {
        match self.transport.lock().await.take() {
            Some(transport) => {
                trace!("closing connection to {}:{}", self.host, self.port);
                transport.close()
            }
            None => Ok(()),
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.transport.lock().await.is_none()
    }

    pub fn host(&self) -> &str {
        self.host.as_ref()
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}
