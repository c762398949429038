//! Event dispatcher: feeds inbound events to the quiz concurrently.
//!
//! Each event runs on its own task. Events for the same participant are
//! serialized by the session store's per-participant lock; events for
//! different participants proceed independently.

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::channels::EventStream;
use crate::events::InboundEvent;
use crate::quiz::{QuizOutcome, QuizService};

pub struct Dispatcher {
    service: Arc<QuizService>,
}

impl Dispatcher {
    pub fn new(service: Arc<QuizService>) -> Self {
        Self { service }
    }

    /// Handle one event, logging delivery faults instead of returning them.
    pub async fn dispatch(&self, event: InboundEvent) -> Option<QuizOutcome> {
        dispatch_event(&self.service, event).await
    }

    /// Consume `events` until the stream ends, then wait for in-flight
    /// handlers. Returns the number of events dispatched.
    ///
    /// Events for one participant never run concurrently, but they are not
    /// guaranteed to run in arrival order: whichever task takes the
    /// participant's lock first goes first. Two quick answer taps therefore
    /// apply to consecutive questions in either order.
    pub async fn run(&self, mut events: EventStream) -> usize {
        let mut tasks = JoinSet::new();
        let mut dispatched = 0;

        while let Some(event) = events.next().await {
            dispatched += 1;
            let service = Arc::clone(&self.service);
            tasks.spawn(async move {
                dispatch_event(&service, event).await;
            });

            // Reap finished handlers so the set does not grow unbounded.
            while let Some(joined) = tasks.try_join_next() {
                if let Err(e) = joined {
                    error!(error = %e, "Event handler task failed");
                }
            }
        }

        info!(dispatched, "Event stream ended; waiting for in-flight events");
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Event handler task failed");
            }
        }
        dispatched
    }
}

async fn dispatch_event(service: &QuizService, event: InboundEvent) -> Option<QuizOutcome> {
    let user_id = event.participant().id;
    match service.handle(event).await {
        Ok(outcome) => {
            debug!(user_id = %user_id, ?outcome, "Event handled");
            Some(outcome)
        }
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Failed to handle event");
            None
        }
    }
}
