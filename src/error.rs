use thiserror::Error;
use tokio::time::error::Elapsed;

use crate::transport::TransportKind;

/// Possible errors for the package.
#[derive(Error, Debug)]
pub enum RconError {
    /// Returned by `connect` for an empty host or a port outside 1-65535,
    /// before any socket is opened.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// Returned if the command to send is empty.
    #[error("no command supplied")]
    EmptyCommand,
    /// Returned if the host cannot be resolved or the socket cannot be set up.
    #[error("host cannot be reached")]
    UnreachableHost(#[source] std::io::Error),
    /// Returned when asking for a transport that has no implementation yet.
    #[error("{0:?} transport is not supported yet")]
    UnsupportedTransport(TransportKind),
    /// Returned if there was a problem writing to the socket.
    #[error("cannot send message to host")]
    SendError(#[source] std::io::Error),
    /// Returned if there was a problem reading from the socket. Any data
    /// collected for the command so far is discarded.
    #[error("cannot receive response from host")]
    ReceiveError(#[source] std::io::Error),
    /// Returned if you can't remember the password.
    #[error("bad password")]
    AuthenticationError,
    /// Returned if the server did not send a single datagram in time.
    #[error("timeout")]
    TimeoutError(#[from] Elapsed),
    /// Returned for any operation on a session that was closed.
    #[error("connection is closed")]
    Closed,
    /// Returned if a command packet lacks the `0xFFFFFFFF` prefix or the
    /// `rcon` keyword.
    #[error("packet header malformed (missing prefix or rcon keyword)")]
    MalformedPacketHeader,
    /// Returned if the body is mangled in some way.
    #[error("packet body malformed (not valid ascii or utf-8)")]
    MalformedPacketBody(#[from] std::str::Utf8Error),
    /// Returned if the responder cannot bind its socket.
    #[error("cannot bind to address")]
    BindError(#[source] std::io::Error),
}
