//! Telegram channel: long-polls the Bot API for updates.
//!
//! Native Rust Telegram Bot API implementation of both sides of the quiz
//! transport: `EventSource` (getUpdates → commands and button presses) and
//! `DeliveryChannel` (sendMessage, editMessageText, answerCallbackQuery).

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::channels::{
    Button, ChatId, DeliveryChannel, EventSource, EventStream, MessageId, Render, TextFormat,
};
use crate::error::ChannelError;
use crate::events::{Command, InboundEvent, Participant};

const CHANNEL_NAME: &str = "telegram";

/// Pause after a failed poll before trying again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Telegram channel that connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: SecretString,
    allowed_users: Vec<String>,
    poll_timeout: Duration,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: SecretString, allowed_users: Vec<String>) -> Self {
        Self {
            bot_token,
            allowed_users,
            poll_timeout: Duration::from_secs(30),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    fn api_url(&self, method: &str) -> String {
        api_url(self.bot_token.expose_secret(), method)
    }

    /// POST a Bot API method and unwrap the `result` field.
    async fn call(&self, method: &str, body: &Value) -> Result<Value, String> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = resp.status();
        let data: Value = resp
            .json()
            .await
            .map_err(|e| format!("{method} returned {status} with unreadable body: {e}"))?;
        api_result(method, data)
    }

    /// Call `method` with `body`, retrying once without `parse_mode` if the
    /// formatted text is rejected by Telegram's entity parser.
    async fn call_formatted(
        &self,
        method: &str,
        mut body: Value,
        format: TextFormat,
    ) -> Result<Value, String> {
        let Some(parse_mode) = parse_mode(format) else {
            return self.call(method, &body).await;
        };
        body["parse_mode"] = Value::String(parse_mode.to_string());

        match self.call(method, &body).await {
            Err(reason) if is_entity_parse_error(&reason) => {
                tracing::warn!(
                    method,
                    parse_mode,
                    "Telegram rejected formatted text; retrying without parse_mode"
                );
                if let Some(obj) = body.as_object_mut() {
                    obj.remove("parse_mode");
                }
                self.call(method, &body).await
            }
            other => other,
        }
    }
}

// ── Delivery ────────────────────────────────────────────────────────

#[async_trait]
impl DeliveryChannel for TelegramChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn send_message(&self, chat: ChatId, render: &Render) -> Result<MessageId, ChannelError> {
        let mut body = json!({
            "chat_id": chat.0,
            "text": render.text,
        });
        apply_render_options(&mut body, render);

        let result = self
            .call_formatted("sendMessage", body, render.format)
            .await
            .map_err(|reason| ChannelError::SendFailed {
                name: CHANNEL_NAME.into(),
                reason,
            })?;

        result
            .get("message_id")
            .and_then(Value::as_i64)
            .map(MessageId)
            .ok_or_else(|| {
                ChannelError::InvalidMessage("sendMessage result has no message_id".into())
            })
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        render: &Render,
    ) -> Result<(), ChannelError> {
        let mut body = json!({
            "chat_id": chat.0,
            "message_id": message.0,
            "text": render.text,
        });
        apply_render_options(&mut body, render);

        match self
            .call_formatted("editMessageText", body, render.format)
            .await
        {
            Ok(_) => Ok(()),
            // The message already shows exactly this content.
            Err(reason) if reason.contains("message is not modified") => Ok(()),
            Err(reason) => Err(ChannelError::EditFailed {
                name: CHANNEL_NAME.into(),
                message_id: message.0,
                reason,
            }),
        }
    }

    async fn acknowledge(
        &self,
        callback_id: &str,
        text: &str,
        alert: bool,
    ) -> Result<(), ChannelError> {
        let body = json!({
            "callback_query_id": callback_id,
            "text": text,
            "show_alert": alert,
        });
        self.call("answerCallbackQuery", &body)
            .await
            .map(|_| ())
            .map_err(|reason| ChannelError::SendFailed {
                name: CHANNEL_NAME.into(),
                reason,
            })
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: CHANNEL_NAME.into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: CHANNEL_NAME.into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }
}

// ── Inbound ─────────────────────────────────────────────────────────

#[async_trait]
impl EventSource for TelegramChannel {
    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        let url = self.api_url("getUpdates");
        let allowed_users = self.allowed_users.clone();
        let client = self.client.clone();
        let poll_timeout = self.poll_timeout.as_secs();

        tokio::spawn(async move {
            let mut offset: i64 = 0;
            tracing::info!("Telegram channel listening for updates...");

            loop {
                let body = json!({
                    "offset": offset,
                    "timeout": poll_timeout,
                    "allowed_updates": ["message", "callback_query"]
                });

                let resp = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                let data: Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                let Some(results) = data.get("result").and_then(Value::as_array) else {
                    tracing::warn!(response = %data, "Telegram getUpdates returned no result");
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                };

                for update in results {
                    // Advance offset past this update
                    if let Some(uid) = update.get("update_id").and_then(Value::as_i64) {
                        offset = uid + 1;
                    }

                    let Some(event) = parse_update(update) else {
                        continue;
                    };

                    let from = event.participant();
                    let id = from.id.to_string();
                    let mut identities = vec![id.as_str()];
                    if let Some(username) = from.username.as_deref() {
                        identities.push(username);
                    }
                    if !check_user_allowed(&allowed_users, identities) {
                        tracing::warn!(
                            user_id = %from.id,
                            username = %from.handle(),
                            "Telegram: ignoring update from unauthorized user"
                        );
                        continue;
                    }

                    if tx.send(event).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn api_url(token: &str, method: &str) -> String {
    format!("https://api.telegram.org/bot{token}/{method}")
}

/// Unwrap a Bot API envelope: `result` on `ok`, `description` otherwise.
fn api_result(method: &str, data: Value) -> Result<Value, String> {
    if data.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(data.get("result").cloned().unwrap_or(Value::Null));
    }
    let description = data
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("no description");
    let code = data.get("error_code").and_then(Value::as_i64).unwrap_or(0);
    Err(format!("{method} failed ({code}): {description}"))
}

fn parse_mode(format: TextFormat) -> Option<&'static str> {
    match format {
        TextFormat::Plain => None,
        TextFormat::Html => Some("HTML"),
        TextFormat::Markdown => Some("Markdown"),
    }
}

fn is_entity_parse_error(reason: &str) -> bool {
    reason.contains("can't parse entities")
}

/// Add the inline keyboard and preview flag to a send/edit body.
fn apply_render_options(body: &mut Value, render: &Render) {
    if let Some(markup) = inline_keyboard(&render.buttons) {
        body["reply_markup"] = markup;
    }
    if render.disable_link_preview {
        body["link_preview_options"] = json!({ "is_disabled": true });
    }
}

/// One button per row, as the quiz prompts are laid out.
fn inline_keyboard(buttons: &[Button]) -> Option<Value> {
    if buttons.is_empty() {
        return None;
    }
    let rows: Vec<Value> = buttons
        .iter()
        .map(|button| match button {
            Button::Callback { label, payload } => json!([{ "text": label, "callback_data": payload }]),
            Button::Url { label, url } => json!([{ "text": label, "url": url }]),
        })
        .collect();
    Some(json!({ "inline_keyboard": rows }))
}

/// Extract the sender of a message or callback query.
fn parse_participant(from: &Value, chat_id: Option<i64>) -> Option<Participant> {
    let user_id = from.get("id").and_then(Value::as_i64)?;
    let first = from.get("first_name").and_then(Value::as_str).unwrap_or("");
    let last = from.get("last_name").and_then(Value::as_str).unwrap_or("");

    let mut participant = Participant::new(user_id, chat_id.unwrap_or(user_id))
        .with_full_name(format!("{first} {last}").trim());
    if let Some(username) = from.get("username").and_then(Value::as_str) {
        participant = participant.with_username(username);
    }
    Some(participant)
}

/// Turn one `getUpdates` entry into an event. Non-command text and other
/// update kinds yield `None`.
fn parse_update(update: &Value) -> Option<InboundEvent> {
    if let Some(message) = update.get("message") {
        let text = message.get("text").and_then(Value::as_str)?;
        let command = Command::parse(text)?;
        let chat_id = message
            .get("chat")
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64);
        let from = parse_participant(message.get("from")?, chat_id)?;
        return Some(InboundEvent::Command { from, command });
    }

    if let Some(query) = update.get("callback_query") {
        let callback_id = query.get("id").and_then(Value::as_str)?.to_string();
        let payload = query
            .get("data")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let chat_id = query
            .get("message")
            .and_then(|m| m.get("chat"))
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64);
        let from = parse_participant(query.get("from")?, chat_id)?;
        return Some(InboundEvent::Selection {
            from,
            callback_id,
            payload,
        });
    }

    None
}

/// Check if any identity in the iterator matches the allowed users list.
fn check_user_allowed<'a>(
    allowed_users: &[String],
    identities: impl IntoIterator<Item = &'a str>,
) -> bool {
    let ids: Vec<&str> = identities.into_iter().collect();
    allowed_users
        .iter()
        .any(|u| u == "*" || ids.contains(&u.as_str()))
}

// ── Tests ───────────────────────────────────────────────────────────
