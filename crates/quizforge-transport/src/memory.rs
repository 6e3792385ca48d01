//! In-process connections backed by Tokio channels.
//!
//! [`pair`] returns the server half (a [`MemoryConnection`], which
//! implements [`Connection`]) and the client half (a [`MemoryPeer`]). Tests
//! hand the server half to the room engine and drive the client half
//! directly. Dropping the peer breaks the connection: later sends fail,
//! which is how tests simulate a dead client.

use tokio::sync::{Mutex, mpsc, watch};

use crate::{CloseCode, Connection, ConnectionId, TransportError};

/// Something the server pushed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryFrame {
    /// A data message.
    Data(Vec<u8>),
    /// The server closed the connection.
    Close { code: CloseCode, reason: String },
}

/// Server half of an in-memory connection.
pub struct MemoryConnection {
    id: ConnectionId,
    to_peer: mpsc::UnboundedSender<MemoryFrame>,
    from_peer: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    closed: watch::Sender<bool>,
}

/// Client half of an in-memory connection.
pub struct MemoryPeer {
    to_conn: mpsc::UnboundedSender<Vec<u8>>,
    from_conn: mpsc::UnboundedReceiver<MemoryFrame>,
}

/// Creates a connected (server, client) pair.
pub fn pair() -> (MemoryConnection, MemoryPeer) {
    let (to_peer, from_conn) = mpsc::unbounded_channel();
    let (to_conn, from_peer) = mpsc::unbounded_channel();
    let (closed, _) = watch::channel(false);
    let conn = MemoryConnection {
        id: ConnectionId::next(),
        to_peer,
        from_peer: Mutex::new(from_peer),
        closed,
    };
    let peer = MemoryPeer { to_conn, from_conn };
    (conn, peer)
}

impl MemoryConnection {
    /// Returns `true` once [`close`](Connection::close) has been called.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl Connection for MemoryConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        if self.is_closed() {
            return Err(TransportError::ConnectionClosed(
                "closed by server".into(),
            ));
        }
        self.to_peer
            .send(MemoryFrame::Data(data.to_vec()))
            .map_err(|_| TransportError::ConnectionClosed("peer dropped".into()))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        // Subscribe before checking so a concurrent close is never missed.
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Ok(None);
        }
        let mut from_peer = self.from_peer.lock().await;
        tokio::select! {
            msg = from_peer.recv() => Ok(msg),
            _ = closed.changed() => Ok(None),
        }
    }

    async fn close(
        &self,
        code: CloseCode,
        reason: &str,
    ) -> Result<(), Self::Error> {
        if self.closed.send_replace(true) {
            return Err(TransportError::ConnectionClosed(
                "already closed".into(),
            ));
        }
        // The peer may already be gone; the close still counts.
        let _ = self.to_peer.send(MemoryFrame::Close {
            code,
            reason: reason.to_owned(),
        });
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

impl MemoryPeer {
    /// Sends a message to the server half.
    pub fn send(&self, data: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        self.to_conn
            .send(data.into())
            .map_err(|_| TransportError::ConnectionClosed("server dropped".into()))
    }

    /// Waits for the next frame from the server. `None` once the server
    /// half is dropped and every buffered frame has been read.
    pub async fn recv(&mut self) -> Option<MemoryFrame> {
        self.from_conn.recv().await
    }

    /// Returns the next buffered frame without waiting.
    pub fn try_recv(&mut self) -> Option<MemoryFrame> {
        self.from_conn.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_reaches_peer() {
        let (conn, mut peer) = pair();
        conn.send(b"hello").await.unwrap();
        assert_eq!(peer.recv().await, Some(MemoryFrame::Data(b"hello".to_vec())));
    }

    #[tokio::test]
    async fn test_peer_send_reaches_recv() {
        let (conn, peer) = pair();
        peer.send("answer").unwrap();
        assert_eq!(conn.recv().await.unwrap(), Some(b"answer".to_vec()));
    }

    #[tokio::test]
    async fn test_send_fails_after_peer_dropped() {
        let (conn, peer) = pair();
        drop(peer);
        let err = conn.send(b"x").await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed(_)));
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_peer_dropped() {
        let (conn, peer) = pair();
        drop(peer);
        assert_eq!(conn.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_close_wakes_pending_recv() {
        let (conn, mut peer) = pair();
        let conn = std::sync::Arc::new(conn);
        let reader = {
            let conn = std::sync::Arc::clone(&conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::task::yield_now().await;

        conn.close(CloseCode::Normal, "bye").await.unwrap();
        assert_eq!(reader.await.unwrap().unwrap(), None);
        assert_eq!(
            peer.recv().await,
            Some(MemoryFrame::Close {
                code: CloseCode::Normal,
                reason: "bye".into()
            })
        );
    }

    #[tokio::test]
    async fn test_second_close_is_an_error() {
        let (conn, _peer) = pair();
        conn.close(CloseCode::Normal, "first").await.unwrap();
        assert!(conn.close(CloseCode::Normal, "second").await.is_err());
        assert!(conn.send(b"late").await.is_err());
    }
}
