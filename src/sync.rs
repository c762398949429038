//! Message sync: keeps one live prompt per participant.
//!
//! The first render of a session sends a message and remembers its id.
//! Later renders edit that message in place. If the edit is rejected (the
//! message is too old, was deleted, ...) a single new message is sent and
//! becomes the tracked one. Only a failing send is reported to the caller.

use crate::channels::{ChatId, DeliveryChannel, MessageId, Render};
use crate::error::ChannelError;
use crate::session::Session;

/// What a render did on the delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No message was tracked; a new one was sent.
    Sent(MessageId),
    /// The tracked message was edited in place.
    Edited(MessageId),
    /// The edit failed; a replacement was sent and is now tracked.
    Resent {
        stale: MessageId,
        replacement: MessageId,
        edit_error: String,
    },
}

impl SyncOutcome {
    /// The message now tracked by the session.
    pub fn message_id(&self) -> MessageId {
        match self {
            Self::Sent(id) | Self::Edited(id) => *id,
            Self::Resent { replacement, .. } => *replacement,
        }
    }
}

/// Render `content` into the session's tracking message.
///
/// The session's tracking id is updated on every send; an edit leaves it
/// unchanged.
pub async fn sync_message(
    channel: &dyn DeliveryChannel,
    chat: ChatId,
    session: &mut Session,
    content: &Render,
) -> Result<SyncOutcome, ChannelError> {
    let Some(tracked) = session.tracking_message() else {
        let id = channel.send_message(chat, content).await?;
        session.set_tracking_message(id);
        return Ok(SyncOutcome::Sent(id));
    };

    match channel.edit_message(chat, tracked, content).await {
        Ok(()) => Ok(SyncOutcome::Edited(tracked)),
        Err(edit_err) => {
            tracing::warn!(
                chat_id = %chat,
                message_id = %tracked,
                error = %edit_err,
                "Editing tracked message failed; sending a new one"
            );
            let replacement = channel.send_message(chat, content).await?;
            session.set_tracking_message(replacement);
            Ok(SyncOutcome::Resent {
                stale: tracked,
                replacement,
                edit_error: edit_err.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// Records calls; edits and sends can be made to fail.
    #[derive(Default)]
    struct StubChannel {
        next_id: AtomicI64,
        fail_edit: AtomicBool,
        fail_send: AtomicBool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DeliveryChannel for StubChannel {
        fn name(&self) -> &str {
            "stub"
        }

        async fn send_message(
            &self,
            _chat: ChatId,
            render: &Render,
        ) -> Result<MessageId, ChannelError> {
            self.calls.lock().unwrap().push(format!("send:{}", render.text));
            if self.fail_send.load(Ordering::SeqCst) {
                return Err(ChannelError::SendFailed {
                    name: "stub".into(),
                    reason: "down".into(),
                });
            }
            Ok(MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 100))
        }

        async fn edit_message(
            &self,
            _chat: ChatId,
            message: MessageId,
            render: &Render,
        ) -> Result<(), ChannelError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("edit:{}:{}", message, render.text));
            if self.fail_edit.load(Ordering::SeqCst) {
                return Err(ChannelError::EditFailed {
                    name: "stub".into(),
                    message_id: message.0,
                    reason: "message can't be edited".into(),
                });
            }
            Ok(())
        }

        async fn acknowledge(&self, _id: &str, _text: &str, _alert: bool) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    fn calls(channel: &StubChannel) -> Vec<String> {
        channel.calls.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn first_render_sends_and_tracks() {
        let channel = StubChannel::default();
        let mut session = Session::new();

        let outcome = sync_message(&channel, ChatId(1), &mut session, &Render::text("q1"))
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Sent(MessageId(100)));
        assert_eq!(session.tracking_message(), Some(MessageId(100)));
        assert_eq!(calls(&channel), vec!["send:q1"]);
    }

    #[tokio::test]
    async fn later_render_edits_in_place() {
        let channel = StubChannel::default();
        let mut session = Session::new();
        sync_message(&channel, ChatId(1), &mut session, &Render::text("q1"))
            .await
            .unwrap();

        let outcome = sync_message(&channel, ChatId(1), &mut session, &Render::text("q2"))
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Edited(MessageId(100)));
        assert_eq!(session.tracking_message(), Some(MessageId(100)));
        assert_eq!(calls(&channel), vec!["send:q1", "edit:100:q2"]);
    }

    #[tokio::test]
    async fn failed_edit_falls_back_to_send() {
        let channel = StubChannel::default();
        let mut session = Session::new();
        sync_message(&channel, ChatId(1), &mut session, &Render::text("q1"))
            .await
            .unwrap();
        channel.fail_edit.store(true, Ordering::SeqCst);

        let outcome = sync_message(&channel, ChatId(1), &mut session, &Render::text("q2"))
            .await
            .unwrap();

        match outcome {
            SyncOutcome::Resent {
                stale,
                replacement,
                edit_error,
            } => {
                assert_eq!(stale, MessageId(100));
                assert_eq!(replacement, MessageId(101));
                assert!(edit_error.contains("can't be edited"));
            }
            other => panic!("expected Resent, got {other:?}"),
        }
        assert_eq!(session.tracking_message(), Some(MessageId(101)));
        assert_eq!(calls(&channel), vec!["send:q1", "edit:100:q2", "send:q2"]);
    }

    #[tokio::test]
    async fn failed_fallback_send_is_reported() {
        let channel = StubChannel::default();
        let mut session = Session::new();
        sync_message(&channel, ChatId(1), &mut session, &Render::text("q1"))
            .await
            .unwrap();
        channel.fail_edit.store(true, Ordering::SeqCst);
        channel.fail_send.store(true, Ordering::SeqCst);

        let result = sync_message(&channel, ChatId(1), &mut session, &Render::text("q2")).await;

        assert!(matches!(result, Err(ChannelError::SendFailed { .. })));
        // Tracking id is only replaced by a successful send.
        assert_eq!(session.tracking_message(), Some(MessageId(100)));
        // One edit, one fallback send; no retry loop.
        assert_eq!(calls(&channel).len(), 3);
    }

    #[tokio::test]
    async fn failed_first_send_leaves_session_untracked() {
        let channel = StubChannel::default();
        channel.fail_send.store(true, Ordering::SeqCst);
        let mut session = Session::new();

        let result = sync_message(&channel, ChatId(1), &mut session, &Render::text("q1")).await;

        assert!(result.is_err());
        assert!(session.tracking_message().is_none());
    }
}
