//! Catalog: the questionnaire and the items it recommends.
//!
//! Loaded once at startup and shared read-only (`Arc<Catalog>`) by every
//! session.

pub mod loader;
pub mod model;

pub use loader::{load_catalog, parse_catalog};
pub use model::{Catalog, Item, Question, Welcome, WelcomeLink};
