//! Host connections: open a room, then relay host commands into it.

use std::sync::Arc;

use quizforge_bank::BankProvider;
use quizforge_protocol::{Codec, Event, HOST_SUBPROTOCOL, HostCommand};
use quizforge_room::{RoomError, RoomHandle, RoomRegistry};
use quizforge_transport::{CloseCode, Connection, Handshake, TransportError};

use crate::QuizError;
use crate::handler::{reject, send_error};
use crate::server::ServerState;

/// Drop guard that tears the room down when the host handler exits.
///
/// Runs on clean disconnects, errors and panics alike. `Drop` is
/// synchronous, so the async teardown is spawned.
struct RoomGuard<C: Connection> {
    room: RoomHandle<C>,
    registry: RoomRegistry<C>,
}

impl<C: Connection> Drop for RoomGuard<C> {
    fn drop(&mut self) {
        let room = self.room.clone();
        let registry = self.registry.clone();
        tokio::spawn(async move {
            registry.delete_handle(&room).await;
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
    if handshake.subprotocol() != Some(HOST_SUBPROTOCOL) {
        return reject(&*conn, "hosts must speak the kahoot sub-protocol").await;
    }

    let room = match state
        .registry
        .create(Arc::clone(&conn), &state.provider, state.bank_id)
        .await
    {
        Ok(room) => room,
        Err(e) => {
            tracing::error!(bank = %state.bank_id, error = %e, "could not open room");
            conn.close(CloseCode::InternalError, "question bank unavailable")
                .await?;
            return Err(e.into());
        }
    };
    let _guard = RoomGuard {
        room: room.clone(),
        registry: state.registry.clone(),
    };
    let code = room.code().clone();
    tracing::info!(room = %code, conn_id = %conn.id(), "host connected");

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(room = %code, "host disconnected");
                break;
            }
            Err(e) => {
                tracing::debug!(room = %code, error = %e, "host recv error");
                break;
            }
        };

        let command = match state
            .codec
            .decode::<Event>(&data)
            .and_then(|event| HostCommand::from_event(&event))
        {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(room = %code, error = %e, "ignoring host message");
                continue;
            }
        };

        match room.host_command(command).await {
            Ok(()) => {}
            Err(RoomError::RoomNotFound(_)) => break,
            Err(e) => {
                tracing::debug!(
                    room = %code,
                    command = command.name(),
                    error = %e,
                    "host command rejected"
                );
                send_error(&*conn, &state.codec, &e).await?;
            }
        }
    }

    // _guard drops here → room deleted, players closed.
    Ok(())
}
