//! Transport abstraction layer for Quizforge.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the persistent duplex channel each host and player talks through. The
//! room engine only ever sees a [`Connection`]; it never knows whether the
//! bytes travel over a WebSocket or an in-memory pipe.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`
//! - `memory`: in-process connection pairs, used by tests

#![allow(async_fn_in_trait)]

mod error;
mod handshake;
#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use handshake::Handshake;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs, shared by every transport.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-unique connection ID.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Why a connection is being closed.
///
/// Mirrors the subset of RFC 6455 close codes the server uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    /// 1000: the purpose of the connection is fulfilled (room closed,
    /// game finished).
    Normal,
    /// 1008: the peer broke a rule (missing sub-protocol, unknown room,
    /// duplicate player ID).
    PolicyViolation,
    /// 1011: the server hit an unexpected condition.
    InternalError,
}

impl CloseCode {
    /// Returns the numeric close code sent on the wire.
    pub fn as_u16(self) -> u16 {
        match self {
            Self::Normal => 1000,
            Self::PolicyViolation => 1008,
            Self::InternalError => 1011,
        }
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal closure"),
            Self::PolicyViolation => write!(f, "policy violation"),
            Self::InternalError => write!(f, "internal error"),
        }
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection, together with
    /// the metadata captured while upgrading it.
    async fn accept(
        &mut self,
    ) -> Result<(Self::Connection, Handshake), Self::Error>;
}

/// A single duplex connection that can send and receive messages.
///
/// Every method takes `&self` so a connection can be shared behind an
/// `Arc`: the handler task reads from it while the room actor writes to
/// it. The returned futures are `Send` so generic callers can hold them
/// across `.await` points inside spawned tasks.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends one message to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

    /// Closes the connection with the given code and reason.
    ///
    /// Closing an already-closed connection returns an error; callers
    /// that tear down many connections log it and move on.
    fn close(
        &self,
        code: CloseCode,
        reason: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_next_is_unique() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert_ne!(a, b);
        assert!(b.into_inner() > a.into_inner());
    }

    #[test]
    fn test_close_code_numbers() {
        assert_eq!(CloseCode::Normal.as_u16(), 1000);
        assert_eq!(CloseCode::PolicyViolation.as_u16(), 1008);
        assert_eq!(CloseCode::InternalError.as_u16(), 1011);
    }
}
