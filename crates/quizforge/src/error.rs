//! Unified error type for the Quizforge server.

use quizforge_bank::BankError;
use quizforge_protocol::ProtocolError;
use quizforge_room::RoomError;
use quizforge_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    /// Binding, accepting, sending or closing failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Question banks could not be loaded.
    #[error(transparent)]
    Bank(#[from] BankError),

    /// A room operation was rejected.
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use quizforge_bank::BankId;
    use quizforge_protocol::PlayerId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: QuizError = TransportError::ConnectionClosed("gone".into()).into();
        assert!(matches!(err, QuizError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: QuizError = ProtocolError::UnknownEvent("dance".into()).into();
        assert!(matches!(err, QuizError::Protocol(_)));
    }

    #[test]
    fn test_from_bank_error() {
        let err: QuizError = BankError::NotFound(BankId(2)).into();
        assert!(matches!(err, QuizError::Bank(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err: QuizError = RoomError::DuplicatePlayer(PlayerId::new("amy")).into();
        assert!(matches!(err, QuizError::Room(_)));
        assert!(err.to_string().contains("amy"));
    }
}
