//! Per-connection routing and the plumbing host and player handlers share.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. Everything needed to place the client was
//! captured during the upgrade, so routing happens before the first
//! message:
//!   1. `/host` → open a room, relay host commands ([`crate::host`])
//!   2. `/player` → join a room, relay answers ([`crate::player`])
//!   3. anything else → close with a policy violation

use std::sync::Arc;

use quizforge_bank::BankProvider;
use quizforge_protocol::{Codec, ErrorNotice, JsonCodec, ServerEvent};
use quizforge_room::RoomError;
use quizforge_transport::{CloseCode, Connection, Handshake, TransportError};

use crate::server::ServerState;
use crate::{QuizError, host, player};

pub(crate) const HOST_PATH: &str = "/host";
pub(crate) const PLAYER_PATH: &str = "/player";

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C, P>(
    conn: C,
    handshake: Handshake,
    state: Arc<ServerState<C, P>>,
) -> Result<(), QuizError>
where
    C: Connection<Error = TransportError>,
    P: BankProvider,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, path = handshake.path(), "handling new connection");

    match handshake.path().trim_end_matches('/') {
        HOST_PATH => host::serve(Arc::new(conn), &handshake, state).await,
        PLAYER_PATH => player::serve(Arc::new(conn), &handshake, state).await,
        other => reject(&conn, &format!("unknown endpoint {other:?}")).await,
    }
}

/// Refuses a connection with a 1008 close frame.
pub(crate) async fn reject<C>(conn: &C, reason: &str) -> Result<(), QuizError>
where
    C: Connection<Error = TransportError>,
{
    tracing::info!(conn_id = %conn.id(), reason, "rejecting connection");
    conn.close(CloseCode::PolicyViolation, reason).await?;
    Ok(())
}

/// Tells the sender why its message was refused.
pub(crate) async fn send_error<C>(
    conn: &C,
    codec: &JsonCodec,
    err: &RoomError,
) -> Result<(), QuizError>
where
    C: Connection<Error = TransportError>,
{
    let notice = ServerEvent::Error(ErrorNotice {
        code: err.kind().code(),
        message: err.to_string(),
    });
    let bytes = codec.encode(&notice)?;
    conn.send(&bytes).await?;
    Ok(())
}
