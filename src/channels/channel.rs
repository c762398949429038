//! Delivery channel trait and rendered message types.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChannelError;
use crate::events::InboundEvent;

/// Chat a message is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Identifier the delivery channel assigns to a sent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the message text should be interpreted by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    Html,
    Markdown,
}

/// A selectable action attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Button {
    /// Routes `payload` back to the bot as a selection event.
    Callback { label: String, payload: String },
    /// Opens a URL on the client.
    Url { label: String, url: String },
}

impl Button {
    pub fn callback(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Callback {
            label: label.into(),
            payload: payload.into(),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Url {
            label: label.into(),
            url: url.into(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Callback { label, .. } | Self::Url { label, .. } => label,
        }
    }

    /// The callback payload, if this is a callback button.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Callback { payload, .. } => Some(payload),
            Self::Url { .. } => None,
        }
    }
}

/// Content of one rendered message: text plus one button per row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Render {
    pub text: String,
    pub buttons: Vec<Button>,
    pub format: TextFormat,
    pub disable_link_preview: bool,
}

impl Render {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_button(mut self, button: Button) -> Self {
        self.buttons.push(button);
        self
    }

    pub fn with_buttons(mut self, buttons: impl IntoIterator<Item = Button>) -> Self {
        self.buttons.extend(buttons);
        self
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }

    pub fn without_link_preview(mut self) -> Self {
        self.disable_link_preview = true;
        self
    }
}

/// Outbound side of a messaging platform.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Channel name, used in logs and errors.
    fn name(&self) -> &str;

    /// Send a new message and return its identifier.
    async fn send_message(&self, chat: ChatId, render: &Render)
    -> Result<MessageId, ChannelError>;

    /// Replace the content of an existing message.
    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        render: &Render,
    ) -> Result<(), ChannelError>;

    /// Short ephemeral notice to the originator of a selection event.
    async fn acknowledge(
        &self,
        callback_id: &str,
        text: &str,
        alert: bool,
    ) -> Result<(), ChannelError>;

    /// Check connectivity.
    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// Stream of inbound events.
pub type EventStream = Pin<Box<dyn Stream<Item = InboundEvent> + Send>>;

/// Inbound side of a messaging platform.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Begin receiving events.
    async fn start(&self) -> Result<EventStream, ChannelError>;
}
