//! Inbound events and the callback payload codec.
//!
//! Selection payloads are parsed into [`Action`] at the boundary; nothing
//! past this module looks at raw payload strings.

use crate::channels::ChatId;
use crate::session::ParticipantId;

const ANSWER_PREFIX: &str = "answer_";
const PURCHASE_PREFIX: &str = "purchase_";
const RESTART_PAYLOAD: &str = "restart";

/// Largest callback payload Telegram accepts, in bytes.
pub const MAX_PAYLOAD_BYTES: usize = 64;

/// Who sent an event and where replies go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub chat: ChatId,
    pub username: Option<String>,
    pub full_name: String,
}

impl Participant {
    pub fn new(id: i64, chat: i64) -> Self {
        Self {
            id: ParticipantId(id),
            chat: ChatId(chat),
            username: None,
            full_name: String::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    /// `@username`, or a placeholder when the participant has none.
    pub fn handle(&self) -> String {
        match &self.username {
            Some(name) => format!("@{name}"),
            None => "no username".to_string(),
        }
    }
}

/// Slash commands the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Cancel,
}

impl Command {
    /// Parse message text such as `/start` or `/cancel@my_bot`.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split_once('@').map_or(name, |(name, _bot)| name);
        match name {
            "start" => Some(Self::Start),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// An event delivered by the event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command {
        from: Participant,
        command: Command,
    },
    Selection {
        from: Participant,
        callback_id: String,
        payload: String,
    },
}

impl InboundEvent {
    pub fn participant(&self) -> &Participant {
        match self {
            Self::Command { from, .. } | Self::Selection { from, .. } => from,
        }
    }
}

/// A typed selection payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Option index chosen for the current question.
    Answer(usize),
    /// Purchase intent for the item with this name.
    Purchase(String),
    Restart,
    /// Anything else; carries the raw payload for logging.
    Unrecognized(String),
}

impl Action {
    /// Parse a callback payload.
    ///
    /// `purchase_` payloads decode everything after the prefix, turning
    /// underscores back into spaces. Names that contain literal
    /// underscores therefore do not round-trip.
    pub fn parse(payload: &str) -> Self {
        if payload == RESTART_PAYLOAD {
            return Self::Restart;
        }
        if let Some(index) = payload.strip_prefix(ANSWER_PREFIX) {
            if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(index) = index.parse() {
                    return Self::Answer(index);
                }
            }
        }
        if let Some(key) = payload.strip_prefix(PURCHASE_PREFIX) {
            if !key.is_empty() {
                return Self::Purchase(key.replace('_', " "));
            }
        }
        Self::Unrecognized(payload.to_string())
    }

    /// Encode this action as a callback payload.
    pub fn to_payload(&self) -> String {
        match self {
            Self::Answer(index) => format!("{ANSWER_PREFIX}{index}"),
            Self::Purchase(name) => format!("{PURCHASE_PREFIX}{}", name.replace(' ', "_")),
            Self::Restart => RESTART_PAYLOAD.to_string(),
            Self::Unrecognized(raw) => raw.clone(),
        }
    }
}
