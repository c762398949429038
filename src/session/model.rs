//! Per-participant quiz progress.

use chrono::{DateTime, Utc};

use crate::channels::MessageId;

/// Identity of a quiz participant (the Telegram user id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub i64);

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quiz progress for one participant.
///
/// The index of the current question is the number of recorded answers, so
/// `answers().len() == current_question()` holds by construction. The
/// tracking message, once set, is only ever replaced, never cleared.
#[derive(Debug, Clone)]
pub struct Session {
    answers: Vec<usize>,
    tracking_message: Option<MessageId>,
    started_at: DateTime<Utc>,
}

impl Session {
    /// A fresh session: no answers, question 0, nothing rendered yet.
    pub fn new() -> Self {
        Self {
            answers: Vec::new(),
            tracking_message: None,
            started_at: Utc::now(),
        }
    }

    pub fn answers(&self) -> &[usize] {
        &self.answers
    }

    /// Index of the question awaiting an answer.
    pub fn current_question(&self) -> usize {
        self.answers.len()
    }

    /// The live prompt/result message, if one has been rendered.
    pub fn tracking_message(&self) -> Option<MessageId> {
        self.tracking_message
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether all `total_questions` have been answered.
    pub fn is_complete(&self, total_questions: usize) -> bool {
        self.current_question() >= total_questions
    }

    /// Whether the session looks exactly like one just created by `start`.
    pub fn is_fresh(&self) -> bool {
        self.answers.is_empty() && self.tracking_message.is_none()
    }

    /// Append the answer to the current question and move to the next one.
    /// Bounds are checked by the quiz state machine.
    pub(crate) fn record_answer(&mut self, choice: usize) {
        self.answers.push(choice);
    }

    /// Point the session at a newly rendered message.
    pub(crate) fn set_tracking_message(&mut self, message_id: MessageId) {
        self.tracking_message = Some(message_id);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
