//! Pure Rust async implementation of the Quake II rcon protocol.
//!
//! Every command is a single datagram carrying the password, and the reply
//! is whatever the server prints back before it goes quiet.
pub mod client;
pub mod error;
pub mod packet;
pub mod server;
pub mod transport;
