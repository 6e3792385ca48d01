//! Room configuration and the per-question phase machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Timing and limits shared by every room a registry creates.
///
/// Every `Duration` here is both enforced by the room and advertised to
/// clients (as milliseconds in the `sleep` field of the matching event),
/// so what the UI counts down is what the server waits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Between `start` and the first question prompt.
    pub countdown: Duration,

    /// How long the prompt is shown before the answer choices.
    pub prompt_display: Duration,

    /// How long answers are accepted. Points always decay over the fixed
    /// [`SCORING_WINDOW`](crate::SCORING_WINDOW), whatever this is set to.
    pub answer_window: Duration,

    /// Pause between "all answered" and the reveal.
    pub settle_delay: Duration,

    /// How long the final leaderboard stays up before the room closes.
    pub finish_display: Duration,

    /// Rows in `event_reveal_score` and `event_finish`.
    pub leaderboard_size: usize,

    /// Characters in a generated room code.
    pub code_length: usize,

    /// Capacity of each room's command channel.
    pub command_buffer: usize,

    /// Include the points earned in each `event_answer` acknowledgment.
    pub ack_includes_points: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            countdown: Duration::from_secs(5),
            prompt_display: Duration::from_secs(5),
            answer_window: Duration::from_secs(30),
            settle_delay: Duration::from_secs(3),
            finish_display: Duration::from_secs(30),
            leaderboard_size: 10,
            code_length: 6,
            command_buffer: 64,
            ack_includes_points: false,
        }
    }
}

impl RoomConfig {
    /// Clamps limits into workable ranges.
    pub fn validated(mut self) -> Self {
        self.leaderboard_size = self.leaderboard_size.max(1);
        self.code_length = self.code_length.clamp(4, 12);
        self.command_buffer = self.command_buffer.max(1);
        self
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where a room is in its question flow.
///
/// ```text
/// AwaitingStart → Countdown → QuestionPrompt → QuestionOpen → RevealAnswer
///                                  ↑                              ↓
///                                  └──────── RevealLeaderboard ←──┘
///                                                   ↓
///                                                Finished
/// ```
///
/// `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    AwaitingStart,
    Countdown,
    QuestionPrompt,
    QuestionOpen,
    RevealAnswer,
    RevealLeaderboard,
    Finished,
}

impl Phase {
    /// Returns `true` if players may still join.
    pub fn is_joinable(self) -> bool {
        !matches!(self, Self::Finished)
    }

    /// Returns `true` if moving to `target` is a legal step.
    pub fn can_transition_to(self, target: Self) -> bool {
        use Phase::*;
        matches!(
            (self, target),
            (AwaitingStart, Countdown)
                | (Countdown, QuestionPrompt)
                | (QuestionPrompt, QuestionOpen)
                | (QuestionOpen, RevealAnswer)
                | (RevealAnswer, RevealLeaderboard)
                | (RevealLeaderboard, QuestionPrompt)
                | (RevealLeaderboard, Finished)
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingStart => write!(f, "AwaitingStart"),
            Self::Countdown => write!(f, "Countdown"),
            Self::QuestionPrompt => write!(f, "QuestionPrompt"),
            Self::QuestionOpen => write!(f, "QuestionOpen"),
            Self::RevealAnswer => write!(f, "RevealAnswer"),
            Self::RevealLeaderboard => write!(f, "RevealLeaderboard"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_cycle_is_legal() {
        let cycle = [
            Phase::AwaitingStart,
            Phase::Countdown,
            Phase::QuestionPrompt,
            Phase::QuestionOpen,
            Phase::RevealAnswer,
            Phase::RevealLeaderboard,
            Phase::QuestionPrompt,
        ];
        for pair in cycle.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} → {}", pair[0], pair[1]);
        }
        assert!(Phase::RevealLeaderboard.can_transition_to(Phase::Finished));
    }

    #[test]
    fn test_phase_rejects_skips_and_rewinds() {
        assert!(!Phase::AwaitingStart.can_transition_to(Phase::QuestionOpen));
        assert!(!Phase::QuestionOpen.can_transition_to(Phase::RevealLeaderboard));
        assert!(!Phase::RevealAnswer.can_transition_to(Phase::QuestionPrompt));
        assert!(!Phase::Finished.can_transition_to(Phase::AwaitingStart));
    }

    #[test]
    fn test_only_finished_rejects_joins() {
        assert!(Phase::AwaitingStart.is_joinable());
        assert!(Phase::QuestionOpen.is_joinable());
        assert!(!Phase::Finished.is_joinable());
    }

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.answer_window, Duration::from_secs(30));
        assert_eq!(config.leaderboard_size, 10);
        assert_eq!(config.code_length, 6);
        assert!(!config.ack_includes_points);
    }

    #[test]
    fn test_short_answer_window_keeps_scoring_window() {
        let config = RoomConfig {
            answer_window: Duration::from_secs(10),
            ..RoomConfig::default()
        };
        assert_eq!(crate::SCORING_WINDOW, Duration::from_secs(30));
        // Answering at the close of a 10 s window still earns 667, not the floor.
        assert_eq!(crate::score(config.answer_window), 667);
    }

    #[test]
    fn test_validated_clamps_limits() {
        let config = RoomConfig {
            leaderboard_size: 0,
            code_length: 40,
            command_buffer: 0,
            ..RoomConfig::default()
        }
        .validated();
        assert_eq!(config.leaderboard_size, 1);
        assert_eq!(config.code_length, 12);
        assert_eq!(config.command_buffer, 1);
    }

    #[test]
    fn test_config_deserializes_partial_json() {
        let config: RoomConfig =
            serde_json::from_str(r#"{"leaderboard_size": 3}"#).unwrap();
        assert_eq!(config.leaderboard_size, 3);
        assert_eq!(config.countdown, Duration::from_secs(5));
    }
}
