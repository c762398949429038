//! Quiz: the questionnaire state machine and the service that drives it.
//!
//! A participant moves linearly through the catalog's questions:
//! NoSession → Collecting(0) → … → Collecting(n-1) → Complete. `start` and
//! `restart` jump back to Collecting(0) from anywhere; `cancel` removes the
//! session from anywhere.

pub mod service;
pub mod state;

pub use service::{IgnoreReason, QuizOutcome, QuizService};
pub use state::QuizState;
