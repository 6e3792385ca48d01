//! Wire protocol for Quizforge.
//!
//! This crate defines the "language" that quiz clients and the server
//! speak:
//!
//! - **Identifiers** ([`PlayerId`], [`RoomCode`]) and leaderboard rows.
//! - **Events** ([`ServerEvent`] outbound, [`Event`] + [`HostCommand`] /
//!   [`PlayerMessage`] inbound).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]).
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer sits between transport (raw bytes) and rooms. It
//! knows nothing about connections or timers.
//!
//! ```text
//! Transport (bytes) → Protocol (Event) → Room (quiz state machine)
//! ```

mod codec;
mod error;
mod event;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use event::{
    AllAnswered, AnswerReceived, AnswerRevealed, ErrorNotice, Event,
    GameFinished, GameStarted, HostCommand, Leaderboard, PlayerJoined,
    PlayerLeft, PlayerMessage, QuestionPrompt, QuestionShown, RoomCreated,
    ServerEvent,
};
pub use types::{
    HOST_SUBPROTOCOL, PLAYER_SUBPROTOCOL, PlayerId, PlayerScore, RoomCode,
};
