//! Error types for the room layer.

use quizforge_bank::BankError;
use quizforge_protocol::{PlayerId, RoomCode};

use crate::Phase;

/// Coarse classification of a [`RoomError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The room or participant does not exist.
    NotFound,
    /// Duplicate identifier, duplicate answer, or skip already used.
    Conflict,
    /// A command issued outside its valid phase.
    Invalid,
    /// A send to one connection failed. Carried by
    /// [`SendError`](crate::SendError), never by [`RoomError`].
    TransportFailure,
}

impl ErrorKind {
    /// HTTP-style status code carried in `event_error`.
    pub fn code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Invalid => 400,
            Self::TransportFailure => 502,
        }
    }
}

/// Errors returned by room and registry operations.
///
/// None of these change room state: the caller learns what went wrong and
/// the room carries on.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code. Also returned once a room's actor has
    /// stopped.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    #[error("player {0} is not in this room")]
    PlayerNotFound(PlayerId),

    #[error("player {0} is already in this room")]
    DuplicatePlayer(PlayerId),

    #[error("player {0} already answered this question")]
    DuplicateAnswer(PlayerId),

    #[error("this question was already skipped")]
    SkipConsumed,

    /// The action is not valid in the room's current phase.
    #[error("cannot {action} during {phase}")]
    InvalidPhase { action: &'static str, phase: Phase },

    /// The question bank for a new room could not be loaded.
    #[error(transparent)]
    Bank(#[from] BankError),
}

impl RoomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RoomNotFound(_) | Self::PlayerNotFound(_) => ErrorKind::NotFound,
            Self::DuplicatePlayer(_)
            | Self::DuplicateAnswer(_)
            | Self::SkipConsumed => ErrorKind::Conflict,
            Self::InvalidPhase { .. } => ErrorKind::Invalid,
            Self::Bank(BankError::NotFound(_)) => ErrorKind::NotFound,
            Self::Bank(_) => ErrorKind::Invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use quizforge_bank::BankId;

    use super::*;

    #[test]
    fn test_kinds_and_codes() {
        let cases = [
            (RoomError::RoomNotFound(RoomCode::new("ABC123")), 404),
            (RoomError::PlayerNotFound(PlayerId::new("p")), 404),
            (RoomError::DuplicatePlayer(PlayerId::new("p")), 409),
            (RoomError::DuplicateAnswer(PlayerId::new("p")), 409),
            (RoomError::SkipConsumed, 409),
            (
                RoomError::InvalidPhase {
                    action: "reveal",
                    phase: Phase::QuestionOpen,
                },
                400,
            ),
            (RoomError::Bank(BankError::NotFound(BankId(3))), 404),
            (RoomError::Bank(BankError::Empty), 400),
        ];
        for (err, code) in cases {
            assert_eq!(err.kind().code(), code, "{err}");
        }
    }

    #[test]
    fn test_invalid_phase_message() {
        let err = RoomError::InvalidPhase {
            action: "start",
            phase: Phase::Countdown,
        };
        assert_eq!(err.to_string(), "cannot start during Countdown");
    }
}
