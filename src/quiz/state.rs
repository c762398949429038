//! Quiz state machine: where a participant is in the questionnaire.

use crate::session::Session;

/// The observable state of a participant's quiz.
///
/// Cancelling removes the session, so a cancelled quiz reads as
/// `NoSession` afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    /// No active session (never started, cancelled, or lost).
    NoSession,
    /// Waiting for the answer to question `i`.
    Collecting(usize),
    /// Every question answered; results shown.
    Complete,
}

impl QuizState {
    /// Derive the state from a session, if any.
    pub fn of(session: Option<&Session>, total_questions: usize) -> Self {
        match session {
            None => Self::NoSession,
            Some(s) if s.is_complete(total_questions) => Self::Complete,
            Some(s) => Self::Collecting(s.current_question()),
        }
    }

    /// State after answering the question awaited in `self`.
    pub fn after_answer(&self, total_questions: usize) -> Option<QuizState> {
        match *self {
            Self::Collecting(i) if i + 1 >= total_questions => Some(Self::Complete),
            Self::Collecting(i) => Some(Self::Collecting(i + 1)),
            Self::NoSession | Self::Complete => None,
        }
    }

    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: QuizState, total_questions: usize) -> bool {
        use QuizState::*;
        match (*self, target) {
            // start / restart from anywhere, cancel from anywhere
            (_, Collecting(0)) | (_, NoSession) => true,
            (Collecting(i), Collecting(j)) => j == i + 1 && j < total_questions,
            (Collecting(i), Complete) => i + 1 == total_questions,
            _ => false,
        }
    }
}

impl std::fmt::Display for QuizState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSession => write!(f, "no_session"),
            Self::Collecting(i) => write!(f, "collecting({i})"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use QuizState::*;
        let transitions = [
            (NoSession, Collecting(0)),
            (Complete, Collecting(0)),
            (Collecting(1), Collecting(0)),
            (Collecting(0), Collecting(1)),
            (Collecting(1), Collecting(2)),
            (Collecting(2), Complete),
            (Collecting(1), NoSession),
            (Complete, NoSession),
            (NoSession, NoSession),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to, 3), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use QuizState::*;
        // Skip a question
        assert!(!Collecting(0).can_transition_to(Collecting(2), 3));
        // Go backward (other than a restart)
        assert!(!Collecting(2).can_transition_to(Collecting(1), 3));
        // Complete too early
        assert!(!Collecting(1).can_transition_to(Complete, 3));
        // Past the last question
        assert!(!Collecting(2).can_transition_to(Collecting(3), 3));
        // Answering without a session or after completion
        assert!(!NoSession.can_transition_to(Collecting(1), 3));
        assert!(!NoSession.can_transition_to(Complete, 3));
        assert!(!Complete.can_transition_to(Complete, 3));
    }

    #[test]
    fn after_answer_walks_to_complete() {
        let mut state = QuizState::Collecting(0);
        let mut seen = Vec::new();
        while let Some(next) = state.after_answer(3) {
            assert!(state.can_transition_to(next, 3));
            seen.push(next);
            state = next;
        }
        assert_eq!(
            seen,
            vec![
                QuizState::Collecting(1),
                QuizState::Collecting(2),
                QuizState::Complete
            ]
        );
    }

    #[test]
    fn of_session() {
        let mut session = Session::new();
        assert_eq!(QuizState::of(None, 2), QuizState::NoSession);
        assert_eq!(QuizState::of(Some(&session), 2), QuizState::Collecting(0));
        session.record_answer(0);
        assert_eq!(QuizState::of(Some(&session), 2), QuizState::Collecting(1));
        session.record_answer(1);
        assert_eq!(QuizState::of(Some(&session), 2), QuizState::Complete);
    }

    #[test]
    fn display() {
        assert_eq!(QuizState::NoSession.to_string(), "no_session");
        assert_eq!(QuizState::Collecting(2).to_string(), "collecting(2)");
        assert_eq!(QuizState::Complete.to_string(), "complete");
    }

    #[test]
    fn single_question_quiz() {
        assert_eq!(
            QuizState::Collecting(0).after_answer(1),
            Some(QuizState::Complete)
        );
        assert!(QuizState::Collecting(0).can_transition_to(QuizState::Complete, 1));
    }
}
