//! The quiz session engine.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns the
//! participants, the current question cycle and the phase timer. Nothing
//! else mutates room state; handlers send commands through a
//! [`RoomHandle`] and get a `Result` back.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates, looks up and deletes rooms by code
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`Phase`]: where a room is in its question flow
//! - [`RoomConfig`]: timings and limits
//! - [`send_one`] / [`send_many`]: best-effort fan-out
//! - [`score`]: time-decayed points for a correct answer

mod config;
mod error;
mod fanout;
mod leaderboard;
mod registry;
mod room;
mod scoring;

pub use config::{Phase, RoomConfig};
pub use error::{ErrorKind, RoomError};
pub use fanout::{Delivery, SendError, send_many, send_one};
pub use leaderboard::rank;
pub use registry::{RoomId, RoomRegistry};
pub use room::{RoomHandle, RoomInfo};
pub use scoring::{MAX_SCORE, MIN_SCORE, SCORING_WINDOW, score};
