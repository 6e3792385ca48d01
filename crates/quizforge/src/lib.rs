//! # Quizforge
//!
//! Live quiz sessions over WebSockets: one host drives a room through its
//! questions while players answer against the clock.
//!
//! Hosts connect to `/host` (sub-protocol `kahoot`) and get a fresh room
//! with a short join code. Players connect to `/player` (sub-protocol
//! `kahoot-player`) carrying their id and that code. Everything after the
//! upgrade is JSON `{ "event": ..., "content": ... }` messages.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quizforge::prelude::*;
//!
//! # async fn demo() -> Result<(), QuizError> {
//! let server = QuizServerBuilder::new()
//!     .bind("0.0.0.0:3000")
//!     .build(StaticBankProvider::default())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod host;
mod player;
mod server;

pub use error::QuizError;
pub use server::{DEFAULT_ADDR, QuizServer, QuizServerBuilder};

/// The types most servers need, in one import.
pub mod prelude {
    pub use crate::{DEFAULT_ADDR, QuizError, QuizServer, QuizServerBuilder};
    pub use quizforge_bank::{
        Bank, BankError, BankId, BankProvider, Question, StaticBankProvider,
    };
    pub use quizforge_protocol::{PlayerId, RoomCode};
    pub use quizforge_room::{Phase, RoomConfig, RoomError, RoomInfo, RoomRegistry};
}
