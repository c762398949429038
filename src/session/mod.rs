//! Sessions: ephemeral per-participant quiz state.

pub mod model;
pub mod store;

pub use model::{ParticipantId, Session};
pub use store::{SessionGuard, SessionStore};
