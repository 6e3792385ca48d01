//! Player connections: join a room by code, then relay answers into it.

use std::sync::Arc;

use quizforge_bank::BankProvider;
use quizforge_protocol::{
    Codec, Event, PLAYER_SUBPROTOCOL, PlayerId, PlayerMessage, RoomCode,
};
use quizforge_room::{RoomError, RoomHandle};
use quizforge_transport::{Connection, Handshake, TransportError};

use crate::QuizError;
use crate::handler::{reject, send_error};
use crate::server::ServerState;

/// Header naming the player, with its query-parameter fallback.
const PLAYER_ID: (&str, &str) = ("Player-ID", "playerId");
/// Header naming the room code, with its query-parameter fallback.
const ROOM_ID: (&str, &str) = ("Room-ID", "roomId");

/// Drop guard that removes the player from its room when the handler
/// exits.
struct PlayerGuard<C: Connection> {
    room: RoomHandle<C>,
    player_id: PlayerId,
}

impl<C: Connection> Drop for PlayerGuard<C> {
    fn drop(&mut self) {
        let room = self.room.clone();
        let player_id = self.player_id.clone();
        tokio::spawn(async move {
            // The room may have closed first; nothing left to leave.
            if let Err(e) = room.leave(player_id.clone()).await {
                tracing::debug!(room = %room.code(), %player_id, error = %e, "leave skipped");
            }
        });
    }
}

pub(crate) async fn serve<C, P>(
    conn: Arc<C>,
    handshake: &Handshake,
    state: Arc<ServerState<C, P>>,
) -> Result<(), QuizError>
where
    C: Connection<Error = TransportError>,
    P: BankProvider,
{
    if handshake.subprotocol() != Some(PLAYER_SUBPROTOCOL) {
        return reject(&*conn, "players must speak the kahoot-player sub-protocol")
            .await;
    }
    let Some(player_id) = handshake.header_or_query(PLAYER_ID.0, PLAYER_ID.1) else {
        return reject(&*conn, "missing Player-ID").await;
    };
    let player_id = PlayerId::new(player_id);
    let code = handshake
        .header_or_query(ROOM_ID.0, ROOM_ID.1)
        .map(RoomCode::new)
        .filter(|code| !code.is_empty());
    let Some(code) = code else {
        return reject(&*conn, "missing Room-ID").await;
    };

    let room = match state.registry.lookup(&code).await {
        Ok(room) => room,
        Err(e) => return reject(&*conn, &e.to_string()).await,
    };
    if let Err(e) = room.join(player_id.clone(), Arc::clone(&conn)).await {
        return reject(&*conn, &e.to_string()).await;
    }
    let _guard = PlayerGuard {
        room: room.clone(),
        player_id: player_id.clone(),
    };
    tracing::info!(room = %code, %player_id, conn_id = %conn.id(), "player connected");

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(room = %code, %player_id, "player disconnected");
                break;
            }
            Err(e) => {
                tracing::debug!(room = %code, %player_id, error = %e, "player recv error");
                break;
            }
        };

        let message = match state
            .codec
            .decode::<Event>(&data)
            .and_then(|event| PlayerMessage::from_event(&event))
        {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(room = %code, %player_id, error = %e, "ignoring player message");
                continue;
            }
        };

        match message {
            PlayerMessage::Answer(answer) => {
                match room.submit_answer(player_id.clone(), answer).await {
                    Ok(_) => {}
                    Err(RoomError::RoomNotFound(_)) => break,
                    Err(e) => send_error(&*conn, &state.codec, &e).await?,
                }
            }
        }
    }

    // _guard drops here → player leaves the room.
    Ok(())
}
