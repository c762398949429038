//! Session store: in-memory, per-participant locked.
//!
//! Each participant owns a slot behind its own `tokio::sync::Mutex`. The
//! outer map lock is held only long enough to find or insert a slot, so a
//! slow render for one participant never stalls another.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use super::model::{ParticipantId, Session};

type Slot = Arc<Mutex<Option<Session>>>;

/// Exclusive access to one participant's session for a read-modify-write.
///
/// Holds the participant's lock until dropped. Other participants are
/// unaffected.
pub struct SessionGuard {
    participant: ParticipantId,
    slot: OwnedMutexGuard<Option<Session>>,
}

impl SessionGuard {
    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    pub fn session(&self) -> Option<&Session> {
        (*self.slot).as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        (*self.slot).as_mut()
    }

    /// Install `session`, discarding any previous one. Returns a handle to
    /// the installed session.
    pub fn replace(&mut self, session: Session) -> &mut Session {
        self.slot.insert(session)
    }

    /// Remove the session. Returns whether one existed.
    pub fn clear(&mut self) -> bool {
        self.slot.take().is_some()
    }
}

/// Concurrency-safe mapping from participant to session.
#[derive(Default)]
pub struct SessionStore {
    slots: RwLock<HashMap<ParticipantId, Slot>>,
}

impl SessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn slot(&self, participant: ParticipantId) -> Slot {
        if let Some(slot) = self.slots.read().await.get(&participant) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(participant).or_default())
    }

    /// Lock a participant's slot for a read-modify-write.
    pub async fn lock(&self, participant: ParticipantId) -> SessionGuard {
        let slot = self.slot(participant).await;
        SessionGuard {
            participant,
            slot: slot.lock_owned().await,
        }
    }

    /// Lock a participant's slot only if one exists. Never allocates a slot,
    /// so lookups for unknown participants leave the store untouched.
    pub async fn lock_existing(&self, participant: ParticipantId) -> Option<SessionGuard> {
        let slot = self.slots.read().await.get(&participant).map(Arc::clone)?;
        Some(SessionGuard {
            participant,
            slot: slot.lock_owned().await,
        })
    }

    /// Snapshot of a participant's session.
    pub async fn get(&self, participant: ParticipantId) -> Option<Session> {
        let slot = self.slots.read().await.get(&participant).map(Arc::clone)?;
        let guard = slot.lock().await;
        guard.clone()
    }

    /// Store `session`, unconditionally replacing any existing one.
    pub async fn put(&self, participant: ParticipantId, session: Session) {
        self.lock(participant).await.replace(session);
    }

    /// Remove a participant's session. No-op if there is none.
    pub async fn delete(&self, participant: ParticipantId) -> bool {
        let existed = self.lock(participant).await.clear();
        self.prune(participant).await;
        if existed {
            debug!(participant = %participant, "Session deleted");
        }
        existed
    }

    /// Drop a participant's slot if it holds no session and nobody else is
    /// using it. Returns whether the slot was removed.
    ///
    /// Must be called after the participant's guard is released.
    pub async fn prune(&self, participant: ParticipantId) -> bool {
        let mut slots = self.slots.write().await;
        let Some(slot) = slots.get(&participant) else {
            return false;
        };
        // New handles are only cloned under the map lock, which we hold.
        let unused = Arc::strong_count(slot) == 1
            && slot.try_lock().map(|guard| guard.is_none()).unwrap_or(false);
        if unused {
            slots.remove(&participant);
        }
        unused
    }

    /// Number of participants with an active session.
    ///
    /// Waits for each participant's in-flight handler, so the count is exact
    /// at the moment each slot is inspected.
    pub async fn len(&self) -> usize {
        let slots: Vec<Slot> = self.slots.read().await.values().map(Arc::clone).collect();
        let mut active = 0;
        for slot in slots {
            if slot.lock().await.is_some() {
                active += 1;
            }
        }
        active
    }

    /// Number of per-participant slots currently allocated.
    pub async fn slot_count(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
