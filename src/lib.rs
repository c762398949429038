//! quiz-match: a Telegram questionnaire that recommends catalog items.

pub mod catalog;
pub mod channels;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod messages;
pub mod quiz;
pub mod recommend;
pub mod session;
pub mod sync;
