//! Room registry: creates, tracks and deletes live rooms by code.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use quizforge_bank::{Bank, BankId, BankProvider};
use quizforge_protocol::RoomCode;
use quizforge_transport::Connection;
use rand::Rng;
use tokio::sync::Mutex;

use crate::room::spawn_room;
use crate::{RoomConfig, RoomError, RoomHandle};

/// Counter for generating unique room instance IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Characters room codes are drawn from.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Process-unique serial of one room instance.
///
/// Codes are recycled once a room is gone; ids never are. A room
/// deregisters itself by `(code, id)` so it cannot remove a newer room
/// that happens to have drawn the same code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomId(u64);

impl RoomId {
    fn next() -> Self {
        Self(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room-{}", self.0)
    }
}

/// Owns the code → room mapping for the whole process.
///
/// Cheap to clone: every clone shares one map behind an async mutex, so
/// host handlers, player handlers and the room actors themselves can all
/// hold one.
pub struct RoomRegistry<C: Connection> {
    rooms: Arc<Mutex<HashMap<RoomCode, RoomHandle<C>>>>,
    config: Arc<RoomConfig>,
}

impl<C: Connection> Clone for RoomRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            rooms: Arc::clone(&self.rooms),
            config: Arc::clone(&self.config),
        }
    }
}

impl<C: Connection> RoomRegistry<C> {
    /// Creates an empty registry. Every room it creates uses `config`.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            config: Arc::new(config.validated()),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Loads bank `bank_id` from `provider` and opens a room for `host`.
    ///
    /// # Errors
    /// [`RoomError::Bank`] if the provider cannot supply the bank. No room
    /// is registered in that case.
    pub async fn create<P: BankProvider>(
        &self,
        host: Arc<C>,
        provider: &P,
        bank_id: BankId,
    ) -> Result<RoomHandle<C>, RoomError> {
        let bank = provider.get_bank(bank_id).await?;
        Ok(self.create_with_bank(host, bank).await)
    }

    /// Opens a room for `host` over an already-loaded bank.
    ///
    /// The room announces its code to the host (`room_created`) as soon as
    /// its actor starts.
    pub async fn create_with_bank(
        &self,
        host: Arc<C>,
        bank: Arc<Bank>,
    ) -> RoomHandle<C> {
        let mut rooms = self.rooms.lock().await;
        let code = loop {
            let candidate = generate_code(self.config.code_length);
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let handle = spawn_room(
            code.clone(),
            RoomId::next(),
            RoomConfig::clone(&self.config),
            bank,
            host,
            self.clone(),
        );
        rooms.insert(code.clone(), handle.clone());
        let live_rooms = rooms.len();
        drop(rooms);

        tracing::info!(
            room = %code,
            room_id = %handle.room_id(),
            live_rooms,
            "room created"
        );
        handle
    }

    /// Returns the live room with this code.
    pub async fn lookup(&self, code: &RoomCode) -> Result<RoomHandle<C>, RoomError> {
        self.rooms
            .lock()
            .await
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))
    }

    /// Removes a room and shuts it down, closing every participant
    /// connection with a normal closure.
    ///
    /// Returns `false` if no such room was registered. Safe to call more
    /// than once.
    pub async fn delete(&self, code: &RoomCode) -> bool {
        let removed = self.rooms.lock().await.remove(code);
        let Some(handle) = removed else {
            return false;
        };
        // The actor may already be on its way out; nothing left to close.
        if let Err(e) = handle.shutdown().await {
            tracing::debug!(room = %code, error = %e, "room already stopped");
        }
        let live_rooms = self.len().await;
        tracing::info!(room = %code, live_rooms, "room deleted");
        true
    }

    /// Like [`delete`](Self::delete), but only if `handle`'s room is still
    /// the one registered under its code.
    ///
    /// Handlers that outlive their room use this so they never tear down a
    /// newer room that drew the same code.
    pub async fn delete_handle(&self, handle: &RoomHandle<C>) -> bool {
        if !self.remove_instance(handle.code(), handle.room_id()).await {
            return false;
        }
        if let Err(e) = handle.shutdown().await {
            tracing::debug!(room = %handle.code(), error = %e, "room already stopped");
        }
        let live_rooms = self.len().await;
        tracing::info!(room = %handle.code(), live_rooms, "room deleted");
        true
    }

    /// Deregisters `code` only if it still belongs to instance `room_id`.
    pub(crate) async fn remove_instance(&self, code: &RoomCode, room_id: RoomId) -> bool {
        let mut rooms = self.rooms.lock().await;
        if rooms.get(code).is_some_and(|h| h.room_id() == room_id) {
            rooms.remove(code);
            true
        } else {
            false
        }
    }

    /// Number of live rooms.
    pub async fn len(&self) -> usize {
        self.rooms.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.lock().await.is_empty()
    }

    /// Codes of every live room, in no particular order.
    pub async fn codes(&self) -> Vec<RoomCode> {
        self.rooms.lock().await.keys().cloned().collect()
    }
}

fn generate_code(length: usize) -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..length)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect();
    RoomCode::new(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_shape() {
        for _ in 0..100 {
            let code = generate_code(6);
            assert_eq!(code.as_str().len(), 6);
            assert!(
                code.as_str()
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()),
                "unexpected code {code}"
            );
        }
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn test_registry_futures_are_send() {
        use quizforge_transport::memory::{self, MemoryConnection};

        let registry = RoomRegistry::<MemoryConnection>::new(RoomConfig::default());
        let (host, _peer) = memory::pair();
        let handle = registry
            .create_with_bank(Arc::new(host), Arc::new(Bank::example()))
            .await;

        assert_send(&registry.create(
            Arc::new(memory::pair().0),
            &quizforge_bank::StaticBankProvider::default(),
            BankId::default(),
        ));
        assert_send(&registry.lookup(handle.code()));
        assert_send(&registry.delete(handle.code()));
        assert_send(&registry.delete_handle(&handle));
        assert!(registry.delete_handle(&handle).await);
    }

    #[test]
    fn test_room_ids_are_unique() {
        let a = RoomId::next();
        let b = RoomId::next();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), format!("room-{}", a.into_inner()));
    }
}
