use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::domain::{ChatId, MessageId, UserId};

/// Where an administrator's next private message should be routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingAction {
    /// Plain send into a group chat.
    Group { chat: ChatId },
    /// Send into a group chat, threaded under a specific message.
    GroupMessage { chat: ChatId, message: MessageId },
    /// Direct send to a private user.
    User { user: UserId },
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    action: PendingAction,
    armed_at: Instant,
}

/// Outcome of consuming an administrator's pending action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Take {
    Action(PendingAction),
    /// An entry existed but outlived the configured TTL.
    Expired,
    /// No session was armed at all.
    Missing,
}

/// At most one outstanding action per administrator; arming a new one
/// silently replaces the previous (last-writer-wins, no queueing).
/// Consumption is an atomic read-and-remove under the store lock.
#[derive(Debug)]
pub struct PendingStore {
    ttl: Option<Duration>,
    entries: Mutex<HashMap<UserId, Entry>>,
}

impl PendingStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn set(&self, admin: UserId, action: PendingAction) {
        self.entries.lock().insert(
            admin,
            Entry {
                action,
                armed_at: Instant::now(),
            },
        );
    }

    pub fn take(&self, admin: UserId) -> Take {
        self.take_at(admin, Instant::now())
    }

    /// Consume with an explicit clock, for deterministic expiry tests.
    /// Expiry is checked lazily here; with one entry per administrator the
    /// map stays bounded by the administrator count.
    pub fn take_at(&self, admin: UserId, now: Instant) -> Take {
        let Some(entry) = self.entries.lock().remove(&admin) else {
            return Take::Missing;
        };

        match self.ttl {
            Some(ttl) if now.duration_since(entry.armed_at) > ttl => Take::Expired,
            _ => Take::Action(entry.action),
        }
    }

    pub fn clear(&self, admin: UserId) {
        self.entries.lock().remove(&admin);
    }
}
