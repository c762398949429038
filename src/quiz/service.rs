//! QuizService: applies inbound events to sessions and renders the result.
//!
//! Every state change runs under the participant's session lock, together
//! with the render it triggers. Acknowledgements and untracked messages go
//! out after the lock is released.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::channels::{DeliveryChannel, Render};
use crate::error::{CatalogError, Result};
use crate::events::{Action, Command, InboundEvent, Participant};
use crate::messages;
use crate::recommend::recommend;
use crate::session::{ParticipantId, Session, SessionGuard, SessionStore};
use crate::sync::{SyncOutcome, sync_message};

use super::state::QuizState;

/// Why an event was dropped without a state change or a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The payload did not decode to a known action.
    UnrecognizedPayload(String),
    /// The option index is not valid for the current question.
    OptionOutOfRange { question: usize, choice: usize },
    /// All questions have already been answered.
    AlreadyComplete,
}

/// Result of handling one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizOutcome {
    /// A fresh session was created and question 0 rendered.
    Started { render: SyncOutcome },
    /// An answer was recorded and the next question rendered.
    Advanced { question: usize, render: SyncOutcome },
    /// The last answer was recorded and the results rendered.
    Completed {
        recommendations: Vec<String>,
        render: SyncOutcome,
    },
    /// The session was removed (if there was one).
    Cancelled { had_session: bool },
    /// A purchase button was pressed.
    PurchaseRequested { item: String, in_catalog: bool },
    /// A selection arrived for a participant without a session.
    StaleSession,
    /// The event was dropped.
    Ignored(IgnoreReason),
}

/// Drives the questionnaire for every participant.
pub struct QuizService {
    catalog: Arc<Catalog>,
    sessions: Arc<SessionStore>,
    channel: Arc<dyn DeliveryChannel>,
}

impl QuizService {
    pub fn new(
        catalog: Arc<Catalog>,
        sessions: Arc<SessionStore>,
        channel: Arc<dyn DeliveryChannel>,
    ) -> Self {
        Self {
            catalog,
            sessions,
            channel,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Current quiz state of a participant.
    pub async fn state(&self, participant: ParticipantId) -> QuizState {
        let session = self.sessions.get(participant).await;
        QuizState::of(session.as_ref(), self.catalog.total_questions())
    }

    /// Route an inbound event to its handler.
    pub async fn handle(&self, event: InboundEvent) -> Result<QuizOutcome> {
        match event {
            InboundEvent::Command {
                from,
                command: Command::Start,
            } => self.start(&from).await,
            InboundEvent::Command {
                from,
                command: Command::Cancel,
            } => self.cancel(&from).await,
            InboundEvent::Selection {
                from,
                callback_id,
                payload,
            } => match Action::parse(&payload) {
                Action::Answer(choice) => self.answer(&from, &callback_id, choice).await,
                Action::Purchase(item) => self.purchase(&from, &callback_id, &item).await,
                Action::Restart => self.restart(&from, &callback_id).await,
                Action::Unrecognized(raw) => {
                    debug!(
                        user_id = %from.id,
                        payload = %raw,
                        "Ignoring unrecognized selection payload"
                    );
                    Ok(QuizOutcome::Ignored(IgnoreReason::UnrecognizedPayload(raw)))
                }
            },
        }
    }

    /// `/start`: greet, then begin a fresh quiz, replacing any previous one.
    pub async fn start(&self, from: &Participant) -> Result<QuizOutcome> {
        info!(
            user_id = %from.id,
            username = %from.handle(),
            name = %from.full_name,
            "Quiz started"
        );

        for welcome in &self.catalog.welcome {
            self.channel
                .send_message(from.chat, &messages::welcome(welcome))
                .await?;
        }

        let render = self.begin(from).await?;
        Ok(QuizOutcome::Started { render })
    }

    /// Restart button: same as `/start` without the greeting.
    pub async fn restart(&self, from: &Participant, callback_id: &str) -> Result<QuizOutcome> {
        info!(
            user_id = %from.id,
            username = %from.handle(),
            "Quiz restarted"
        );

        let rendered = self.begin(from).await;
        self.acknowledge(from, callback_id, messages::RESTARTING, false)
            .await;
        Ok(QuizOutcome::Started { render: rendered? })
    }

    /// Install a fresh session and render question 0.
    async fn begin(&self, from: &Participant) -> Result<SyncOutcome> {
        let mut guard = self.sessions.lock(from.id).await;
        let total = self.catalog.total_questions();
        let previous = QuizState::of(guard.session(), total);
        debug_assert!(previous.can_transition_to(QuizState::Collecting(0), total));

        let session = guard.replace(Session::new());
        let prompt = self.prompt(0)?;
        let render = sync_message(self.channel.as_ref(), from.chat, session, &prompt).await?;

        info!(
            user_id = %from.id,
            from_state = %previous,
            question = 1,
            text = %self.catalog.questions[0].text,
            "Question shown"
        );
        Ok(render)
    }

    /// Answer button: record the choice for the current question.
    pub async fn answer(
        &self,
        from: &Participant,
        callback_id: &str,
        choice: usize,
    ) -> Result<QuizOutcome> {
        let total = self.catalog.total_questions();
        let mut guard = self.sessions.lock_existing(from.id).await;

        let Some(session) = guard.as_mut().and_then(SessionGuard::session_mut) else {
            drop(guard);
            self.sessions.prune(from.id).await;
            warn!(user_id = %from.id, username = %from.handle(), "Answer for stale session");
            self.acknowledge(from, callback_id, messages::STALE_SESSION, false)
                .await;
            return Ok(QuizOutcome::StaleSession);
        };

        let state = QuizState::of(Some(&*session), total);
        let QuizState::Collecting(question) = state else {
            debug!(user_id = %from.id, %state, "Ignoring answer to a finished quiz");
            return Ok(QuizOutcome::Ignored(IgnoreReason::AlreadyComplete));
        };
        let Some(option) = self
            .catalog
            .question(question)
            .and_then(|q| q.option(choice))
        else {
            debug!(user_id = %from.id, question, choice, "Ignoring out-of-range option");
            return Ok(QuizOutcome::Ignored(IgnoreReason::OptionOutOfRange {
                question,
                choice,
            }));
        };
        let Some(next) = state
            .after_answer(total)
            .filter(|&next| state.can_transition_to(next, total))
        else {
            return Ok(QuizOutcome::Ignored(IgnoreReason::AlreadyComplete));
        };
        let ack = messages::selected(option);

        info!(
            user_id = %from.id,
            username = %from.handle(),
            question = question + 1,
            answer = %option,
            text = %self.catalog.questions[question].text,
            "Answer chosen"
        );
        session.record_answer(choice);

        let outcome = match next {
            QuizState::Collecting(next_question) => {
                let prompt = self.prompt(next_question)?;
                sync_message(self.channel.as_ref(), from.chat, session, &prompt)
                    .await
                    .map(|render| {
                        info!(user_id = %from.id, question = next_question + 1, "Question shown");
                        QuizOutcome::Advanced {
                            question: next_question,
                            render,
                        }
                    })
            }
            _ => {
                let recommendations = recommend(&self.catalog, session.answers());
                let names: Vec<String> =
                    recommendations.iter().map(|r| r.item.name.clone()).collect();
                info!(
                    user_id = %from.id,
                    username = %from.handle(),
                    answers = session.answers().len(),
                    found = recommendations.len(),
                    results = %messages::result_names(&recommendations),
                    elapsed_secs = (chrono::Utc::now() - session.started_at()).num_seconds(),
                    "Quiz completed"
                );
                let content = messages::results(&recommendations);
                sync_message(self.channel.as_ref(), from.chat, session, &content)
                    .await
                    .map(|render| QuizOutcome::Completed {
                        recommendations: names,
                        render,
                    })
            }
        };
        drop(guard);

        self.acknowledge(from, callback_id, &ack, false).await;
        Ok(outcome?)
    }

    /// Purchase button: acknowledge with an alert. Session state is untouched.
    pub async fn purchase(
        &self,
        from: &Participant,
        callback_id: &str,
        item: &str,
    ) -> Result<QuizOutcome> {
        let in_catalog = self.catalog.item(item).is_some();
        info!(
            user_id = %from.id,
            username = %from.handle(),
            item = %item,
            in_catalog,
            "Purchase pressed"
        );

        self.acknowledge(from, callback_id, &messages::purchase_thanks(item), true)
            .await;
        Ok(QuizOutcome::PurchaseRequested {
            item: item.to_string(),
            in_catalog,
        })
    }

    /// `/cancel`: drop the session (if any) and confirm.
    pub async fn cancel(&self, from: &Participant) -> Result<QuizOutcome> {
        let had_session = self.sessions.delete(from.id).await;
        info!(
            user_id = %from.id,
            username = %from.handle(),
            had_session,
            "Quiz cancelled"
        );

        self.channel
            .send_message(from.chat, &Render::text(messages::CANCELLED))
            .await?;
        Ok(QuizOutcome::Cancelled { had_session })
    }

    fn prompt(&self, index: usize) -> Result<Render> {
        messages::prompt_for(&self.catalog, index).ok_or_else(|| {
            CatalogError::Invalid(format!("question {index} does not exist")).into()
        })
    }

    /// Send an acknowledgement. Failures are logged, never surfaced: the
    /// notice is ephemeral and the state change has already happened.
    async fn acknowledge(&self, from: &Participant, callback_id: &str, text: &str, alert: bool) {
        if let Err(e) = self.channel.acknowledge(callback_id, text, alert).await {
            warn!(
                user_id = %from.id,
                channel = self.channel.name(),
                error = %e,
                "Failed to acknowledge selection"
            );
        }
    }
}
