//! Questions and validated banks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BankError;

/// Identifies a bank within a provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BankId(pub u64);

impl fmt::Display for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bank-{}", self.0)
    }
}

/// One multiple-choice question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub prompt: String,
    /// Candidate answers, in display order.
    pub answers: Vec<String>,
    /// Must be one of `answers`, compared exactly.
    pub correct_answer: String,
}

impl Question {
    pub fn new(
        prompt: impl Into<String>,
        answers: impl IntoIterator<Item = impl Into<String>>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            answers: answers.into_iter().map(Into::into).collect(),
            correct_answer: correct_answer.into(),
        }
    }

    /// Returns `true` if `answer` exactly matches the correct answer.
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }

    fn validate(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err("prompt is empty".into());
        }
        if self.answers.len() < 2 {
            return Err(format!(
                "needs at least 2 answers, has {}",
                self.answers.len()
            ));
        }
        if !self.answers.contains(&self.correct_answer) {
            return Err(format!(
                "correct answer {:?} is not among the choices",
                self.correct_answer
            ));
        }
        Ok(())
    }
}

/// An ordered, non-empty list of valid questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Bank {
    questions: Vec<Question>,
}

impl Bank {
    /// Validates and wraps a list of questions.
    ///
    /// # Errors
    /// [`BankError::Empty`] for an empty list, or
    /// [`BankError::InvalidQuestion`] for the first question with a blank
    /// prompt, fewer than two answers, or a correct answer that is not one
    /// of the choices.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }
        for (index, question) in questions.iter().enumerate() {
            question
                .validate()
                .map_err(|reason| BankError::InvalidQuestion { index, reason })?;
        }
        Ok(Self { questions })
    }

    /// The built-in three-question bank served when nothing else is
    /// configured.
    pub fn example() -> Self {
        Self {
            questions: vec![
                Question::new("What is 2 + 2?", ["3", "4", "5", "6"], "4"),
                Question::new(
                    "Which planet is closest to the Sun?",
                    ["Venus", "Mars", "Mercury", "Earth"],
                    "Mercury",
                ),
                Question::new(
                    "What color is a banana?",
                    ["Red", "Green", "Yellow", "Blue"],
                    "Yellow",
                ),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always `false` for a constructed bank.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Returns the question at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

impl<'de> Deserialize<'de> for Bank {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let questions = Vec::<Question>::deserialize(deserializer)?;
        Bank::new(questions).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_bank_is_valid() {
        let bank = Bank::example();
        assert_eq!(bank.len(), 3);
        assert!(Bank::new(bank.questions().to_vec()).is_ok());
        assert!(bank.get(1).unwrap().is_correct("Mercury"));
        assert!(bank.get(3).is_none());
    }

    #[test]
    fn test_empty_bank_rejected() {
        assert!(matches!(Bank::new(vec![]), Err(BankError::Empty)));
    }

    #[test]
    fn test_correct_answer_must_be_a_choice() {
        let err = Bank::new(vec![
            Question::new("ok?", ["a", "b"], "a"),
            Question::new("bad?", ["a", "b"], "c"),
        ])
        .unwrap_err();
        assert!(matches!(err, BankError::InvalidQuestion { index: 1, .. }));
    }

    #[test]
    fn test_single_choice_rejected() {
        let err = Bank::new(vec![Question::new("one?", ["a"], "a")]).unwrap_err();
        assert!(matches!(err, BankError::InvalidQuestion { index: 0, .. }));
    }

    #[test]
    fn test_answer_match_is_exact() {
        let q = Question::new("2 + 2?", ["4", "5"], "4");
        assert!(q.is_correct("4"));
        assert!(!q.is_correct(" 4"));
    }

    #[test]
    fn test_question_json_uses_camel_case() {
        let json = serde_json::to_value(Question::new("q", ["a", "b"], "b")).unwrap();
        assert_eq!(json["correctAnswer"], "b");
    }

    #[test]
    fn test_deserialize_validates() {
        let err = serde_json::from_str::<Bank>("[]").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
