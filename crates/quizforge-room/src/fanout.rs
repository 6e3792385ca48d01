//! Best-effort delivery of one payload to one or many connections.
//!
//! Sends are at-most-once: a failure is logged and reported back, never
//! retried, and never stops delivery to the other connections.

use futures_util::future::join_all;
use quizforge_transport::{Connection, ConnectionId};

use crate::ErrorKind;

/// A send to one connection failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("send to {conn_id} failed: {reason}")]
pub struct SendError {
    pub conn_id: ConnectionId,
    pub reason: String,
}

impl SendError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::TransportFailure
    }
}

/// The outcome of delivering a payload to one connection.
#[derive(Debug)]
pub struct Delivery {
    pub conn_id: ConnectionId,
    pub result: Result<(), SendError>,
}

impl Delivery {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Writes `payload` to `conn` as a single message.
pub async fn send_one<C: Connection>(
    conn: &C,
    payload: &[u8],
) -> Result<(), SendError> {
    conn.send(payload).await.map_err(|e| SendError {
        conn_id: conn.id(),
        reason: e.to_string(),
    })
}

/// Writes `payload` to every connection concurrently.
///
/// Returns one [`Delivery`] per connection, in input order.
pub async fn send_many<'a, C, I>(conns: I, payload: &[u8]) -> Vec<Delivery>
where
    C: Connection,
    I: IntoIterator<Item = &'a C>,
{
    let sends = conns.into_iter().map(|conn| async move {
        let result = send_one(conn, payload).await;
        if let Err(e) = &result {
            tracing::warn!(
                conn_id = %e.conn_id,
                code = e.kind().code(),
                error = %e.reason,
                "send failed"
            );
        }
        Delivery {
            conn_id: conn.id(),
            result,
        }
    });
    join_all(sends).await
}

#[cfg(test)]
mod tests {
    use quizforge_transport::memory::{self, MemoryFrame};

    use super::*;

    #[tokio::test]
    async fn test_send_one_reports_failure() {
        let (conn, peer) = memory::pair();
        drop(peer);
        let err = send_one(&conn, b"x").await.unwrap_err();
        assert_eq!(err.conn_id, conn.id());
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert_eq!(err.kind().code(), 502);
    }

    #[tokio::test]
    async fn test_send_many_skips_broken_connection() {
        let (a, mut peer_a) = memory::pair();
        let (b, peer_b) = memory::pair();
        let (c, mut peer_c) = memory::pair();
        drop(peer_b);

        let deliveries = send_many([&a, &b, &c], b"hello").await;

        assert_eq!(deliveries.len(), 3);
        assert!(deliveries[0].is_ok());
        assert!(!deliveries[1].is_ok());
        assert_eq!(deliveries[1].conn_id, b.id());
        assert!(deliveries[2].is_ok());
        assert_eq!(peer_a.recv().await, Some(MemoryFrame::Data(b"hello".to_vec())));
        assert_eq!(peer_c.recv().await, Some(MemoryFrame::Data(b"hello".to_vec())));
    }

    #[tokio::test]
    async fn test_send_many_empty_is_empty() {
        let none: [&memory::MemoryConnection; 0] = [];
        assert!(send_many(none, b"x").await.is_empty());
    }
}
