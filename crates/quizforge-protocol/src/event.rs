//! The `{ "event": ..., "content": ... }` messages exchanged with clients.
//!
//! Outbound messages are the typed [`ServerEvent`] enum, serialized with
//! serde's adjacently-tagged representation:
//!
//! ```text
//! { "event": "event_start", "content": { "sleep": 5000, "totalQuestions": 3 } }
//! ```
//!
//! Inbound messages are first decoded into the loose [`Event`] envelope and
//! then interpreted per endpoint ([`HostCommand`] for hosts,
//! [`PlayerMessage`] for players). Clients in the wild send both the short
//! command names (`start`) and the `event_`-prefixed ones (`event_start`),
//! and often omit `content` altogether, which a strict enum would reject.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{PlayerId, PlayerScore, ProtocolError, RoomCode};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A raw inbound message: the event name plus untyped content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event: String,
    #[serde(default)]
    pub content: serde_json::Value,
}

impl Event {
    /// Builds an envelope. Handy for clients and tests.
    pub fn new(event: impl Into<String>, content: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            content,
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreated {
    pub room_code: RoomCode,
}

/// `sleep` fields are milliseconds the client should display the phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStarted {
    pub sleep: u64,
    pub total_questions: usize,
}

/// The prompt alone, shown before the answer choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPrompt {
    pub prompt: String,
    pub sleep: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionShown {
    pub prompt: String,
    pub answer_bank: Vec<String>,
    pub sleep: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllAnswered {
    pub sleep: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRevealed {
    pub correct_answer: String,
    /// Submitted answer text → number of submissions, wrong answers
    /// included. A `BTreeMap` keeps the JSON key order stable.
    pub answer_distribution: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub scores: Vec<PlayerScore>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameFinished {
    pub scores: Vec<PlayerScore>,
    pub sleep: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerJoined {
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLeft {
    pub id: PlayerId,
}

/// Acknowledges one answer submission to the host and the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerReceived {
    pub id: PlayerId,
    /// Points this submission earned. Only present when the room is
    /// configured to disclose scores on submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
}

/// A command or answer was rejected. `code` follows HTTP conventions
/// (400 invalid, 404 not found, 409 conflict).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    pub code: u16,
    pub message: String,
}

/// Every event the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "content")]
pub enum ServerEvent {
    #[serde(rename = "room_created")]
    RoomCreated(RoomCreated),
    #[serde(rename = "event_start")]
    Start(GameStarted),
    #[serde(rename = "event_question_prompt")]
    QuestionPrompt(QuestionPrompt),
    #[serde(rename = "event_question")]
    Question(QuestionShown),
    #[serde(rename = "event_all_answered")]
    AllAnswered(AllAnswered),
    #[serde(rename = "event_reveal")]
    Reveal(AnswerRevealed),
    /// Host only.
    #[serde(rename = "event_reveal_score")]
    RevealScore(Leaderboard),
    #[serde(rename = "event_finish")]
    Finish(GameFinished),
    /// Host only.
    #[serde(rename = "event_player_join")]
    PlayerJoin(PlayerJoined),
    /// Host only.
    #[serde(rename = "event_player_disconnect")]
    PlayerDisconnect(PlayerLeft),
    /// Host and submitting player only.
    #[serde(rename = "event_answer")]
    Answer(AnswerReceived),
    /// Sent only to the connection whose request failed.
    #[serde(rename = "event_error")]
    Error(ErrorNotice),
}

impl ServerEvent {
    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoomCreated(_) => "room_created",
            Self::Start(_) => "event_start",
            Self::QuestionPrompt(_) => "event_question_prompt",
            Self::Question(_) => "event_question",
            Self::AllAnswered(_) => "event_all_answered",
            Self::Reveal(_) => "event_reveal",
            Self::RevealScore(_) => "event_reveal_score",
            Self::Finish(_) => "event_finish",
            Self::PlayerJoin(_) => "event_player_join",
            Self::PlayerDisconnect(_) => "event_player_disconnect",
            Self::Answer(_) => "event_answer",
            Self::Error(_) => "event_error",
        }
    }
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Commands only the host may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    /// Leave the lobby and start the countdown.
    Start,
    /// Show the leaderboard (valid after an answer reveal).
    Reveal,
    /// Advance: reveal → leaderboard → next question / finish.
    Next,
    /// End the current answer window early. One use per question.
    SkipQuestion,
}

impl HostCommand {
    /// Interprets a host envelope. `content` is ignored.
    pub fn from_event(event: &Event) -> Result<Self, ProtocolError> {
        match event.event.as_str() {
            "start" | "event_start" => Ok(Self::Start),
            "reveal" | "event_reveal" => Ok(Self::Reveal),
            "next" | "event_next" => Ok(Self::Next),
            "skip_question" | "event_skip_question" => Ok(Self::SkipQuestion),
            other => Err(ProtocolError::UnknownEvent(other.to_owned())),
        }
    }

    /// Short name, for logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Reveal => "reveal",
            Self::Next => "next",
            Self::SkipQuestion => "skip_question",
        }
    }
}

/// Messages a player may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerMessage {
    /// The chosen answer text.
    Answer(String),
}

impl PlayerMessage {
    /// Interprets a player envelope. The answer must be a JSON string.
    pub fn from_event(event: &Event) -> Result<Self, ProtocolError> {
        match event.event.as_str() {
            "answer" | "event_answer" | "event_question" => {
                match &event.content {
                    serde_json::Value::String(text) => {
                        Ok(Self::Answer(text.clone()))
                    }
                    other => Err(ProtocolError::InvalidContent {
                        event: event.event.clone(),
                        reason: format!("expected answer text, got {other}"),
                    }),
                }
            }
            other => Err(ProtocolError::UnknownEvent(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    //! The front-ends match on exact event names and camelCase field
    //! names, so these tests pin the JSON shapes down.

    use serde_json::json;

    use super::*;

    fn to_json(event: &ServerEvent) -> serde_json::Value {
        serde_json::to_value(event).unwrap()
    }

    #[test]
    fn test_start_json_shape() {
        let json = to_json(&ServerEvent::Start(GameStarted {
            sleep: 5000,
            total_questions: 3,
        }));
        assert_eq!(
            json,
            json!({"event": "event_start", "content": {"sleep": 5000, "totalQuestions": 3}})
        );
    }

    #[test]
    fn test_room_created_json_shape() {
        let json = to_json(&ServerEvent::RoomCreated(RoomCreated {
            room_code: RoomCode::new("AB12CD"),
        }));
        assert_eq!(json["event"], "room_created");
        assert_eq!(json["content"]["roomCode"], "AB12CD");
    }

    #[test]
    fn test_question_json_uses_answer_bank() {
        let json = to_json(&ServerEvent::Question(QuestionShown {
            prompt: "What is 2 + 2?".into(),
            answer_bank: vec!["3".into(), "4".into()],
            sleep: 30000,
        }));
        assert_eq!(json["event"], "event_question");
        assert_eq!(json["content"]["answerBank"], json!(["3", "4"]));
    }

    #[test]
    fn test_reveal_json_uses_answer_distribution() {
        let mut dist = BTreeMap::new();
        dist.insert("4".to_string(), 2);
        let json = to_json(&ServerEvent::Reveal(AnswerRevealed {
            correct_answer: "4".into(),
            answer_distribution: dist,
        }));
        assert_eq!(json["content"]["correctAnswer"], "4");
        assert_eq!(json["content"]["answerDistribution"]["4"], 2);
    }

    #[test]
    fn test_player_join_uses_player_id_key() {
        let json = to_json(&ServerEvent::PlayerJoin(PlayerJoined {
            player_id: PlayerId::new("alice"),
        }));
        assert_eq!(json["content"]["playerId"], "alice");
    }

    #[test]
    fn test_answer_ack_omits_points_by_default() {
        let json = to_json(&ServerEvent::Answer(AnswerReceived {
            id: PlayerId::new("alice"),
            points: None,
        }));
        assert_eq!(json, json!({"event": "event_answer", "content": {"id": "alice"}}));

        let json = to_json(&ServerEvent::Answer(AnswerReceived {
            id: PlayerId::new("alice"),
            points: Some(870),
        }));
        assert_eq!(json["content"]["points"], 870);
    }

    #[test]
    fn test_name_matches_serialized_tag() {
        let events = [
            ServerEvent::AllAnswered(AllAnswered { sleep: 1 }),
            ServerEvent::RevealScore(Leaderboard { scores: vec![] }),
            ServerEvent::Finish(GameFinished { scores: vec![], sleep: 1 }),
            ServerEvent::PlayerDisconnect(PlayerLeft { id: PlayerId::new("x") }),
            ServerEvent::QuestionPrompt(QuestionPrompt { prompt: "p".into(), sleep: 1 }),
            ServerEvent::Error(ErrorNotice { code: 409, message: "m".into() }),
        ];
        for event in &events {
            assert_eq!(to_json(event)["event"], event.name());
        }
    }

    #[test]
    fn test_event_envelope_content_is_optional() {
        let event: Event = serde_json::from_str(r#"{"event":"start"}"#).unwrap();
        assert_eq!(event.event, "start");
        assert!(event.content.is_null());
    }

    #[test]
    fn test_host_command_accepts_both_spellings() {
        for (name, expected) in [
            ("start", HostCommand::Start),
            ("event_start", HostCommand::Start),
            ("reveal", HostCommand::Reveal),
            ("next", HostCommand::Next),
            ("event_next", HostCommand::Next),
            ("skip_question", HostCommand::SkipQuestion),
            ("event_skip_question", HostCommand::SkipQuestion),
        ] {
            let event = Event::new(name, serde_json::Value::Null);
            assert_eq!(HostCommand::from_event(&event).unwrap(), expected);
        }
    }

    #[test]
    fn test_host_command_rejects_unknown() {
        let event = Event::new("dance", serde_json::Value::Null);
        assert!(matches!(
            HostCommand::from_event(&event),
            Err(ProtocolError::UnknownEvent(name)) if name == "dance"
        ));
    }

    #[test]
    fn test_player_answer_parses_text() {
        let event = Event::new("event_question", json!("Mercury"));
        assert_eq!(
            PlayerMessage::from_event(&event).unwrap(),
            PlayerMessage::Answer("Mercury".into())
        );
    }

    #[test]
    fn test_player_answer_rejects_non_string() {
        let event = Event::new("answer", json!({"text": "Mercury"}));
        assert!(matches!(
            PlayerMessage::from_event(&event),
            Err(ProtocolError::InvalidContent { .. })
        ));
    }
}
