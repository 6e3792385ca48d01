//! `QuizServer` builder and accept loop.
//!
//! This is the entry point for running a quiz server. It ties the layers
//! together: transport → protocol → room registry.

use std::future::Future;
use std::sync::Arc;

use quizforge_bank::{BankId, BankProvider};
use quizforge_protocol::{HOST_SUBPROTOCOL, JsonCodec, PLAYER_SUBPROTOCOL};
use quizforge_room::{RoomConfig, RoomRegistry};
use quizforge_transport::{Connection, Transport, WebSocketConnection, WebSocketTransport};

use crate::QuizError;
use crate::handler::handle_connection;

/// Address used when the builder is not told otherwise.
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The registry
/// carries its own lock; everything else is read-only.
pub(crate) struct ServerState<C: Connection, P> {
    pub(crate) registry: RoomRegistry<C>,
    pub(crate) provider: P,
    pub(crate) bank_id: BankId,
    pub(crate) codec: JsonCodec,
}

impl<C: Connection, P: BankProvider> ServerState<C, P> {
    pub(crate) fn new(registry: RoomRegistry<C>, provider: P, bank_id: BankId) -> Self {
        Self {
            registry,
            provider,
            bank_id,
            codec: JsonCodec,
        }
    }
}

/// Builder for configuring and starting a quiz server.
///
/// # Example
///
/// ```rust,no_run
/// use quizforge::prelude::*;
///
/// # async fn demo() -> Result<(), QuizError> {
/// let server = QuizServerBuilder::new()
///     .bind("0.0.0.0:3000")
///     .build(StaticBankProvider::default())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct QuizServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    bank_id: BankId,
}

impl QuizServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            room_config: RoomConfig::default(),
            bank_id: BankId::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the timings and limits every room is created with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Selects which bank new rooms load from the provider.
    pub fn bank_id(mut self, bank_id: BankId) -> Self {
        self.bank_id = bank_id;
        self
    }

    /// Binds the listener and builds the server around `provider`.
    ///
    /// The listener negotiates the host and player sub-protocols; the
    /// handlers reject connections that did not pick the right one.
    pub async fn build<P: BankProvider>(
        self,
        provider: P,
    ) -> Result<QuizServer<P>, QuizError> {
        let transport = WebSocketTransport::bind(&self.bind_addr)
            .await?
            .with_subprotocols([HOST_SUBPROTOCOL, PLAYER_SUBPROTOCOL]);

        let state = Arc::new(ServerState::new(
            RoomRegistry::new(self.room_config),
            provider,
            self.bank_id,
        ));

        Ok(QuizServer { transport, state })
    }
}

impl Default for QuizServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound quiz server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct QuizServer<P> {
    transport: WebSocketTransport,
    state: Arc<ServerState<WebSocketConnection, P>>,
}

impl<P: BankProvider> QuizServer<P> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The registry holding every live room.
    pub fn registry(&self) -> RoomRegistry<WebSocketConnection> {
        self.state.registry.clone()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), QuizError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves.
    ///
    /// Each accepted connection gets its own task. Once the signal fires
    /// the listener is dropped and every live room is closed.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), QuizError> {
        tokio::pin!(shutdown);
        tracing::info!(addr = ?self.local_addr().ok(), "quiz server running");

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown signal received");
                    break;
                }
                accepted = self.transport.accept() => match accepted {
                    Ok((conn, handshake)) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) =
                                handle_connection(conn, handshake, state).await
                            {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        for code in self.state.registry.codes().await {
            self.state.registry.delete(&code).await;
        }
        Ok(())
    }
}
