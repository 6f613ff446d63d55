use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::{
    domain::{ChatId, UserId},
    errors::Error,
    Result,
};

/// A chat whose messages are subject to forwarding.
#[derive(Clone, Debug)]
pub struct Group {
    pub id: ChatId,
    pub title: String,
    pub active: bool,
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    admins: HashSet<UserId>,
    groups: HashMap<ChatId, Group>,
    allowed: HashSet<ChatId>,
    blocked: HashSet<ChatId>,
}

/// Shared registry of administrators, groups, and admission lists.
///
/// One coarse lock guards all four maps; every read-modify-write sequence
/// stays inside a single acquisition so concurrent handlers cannot observe
/// half-applied transitions. All operations are synchronous; async side
/// effects (leaving a blocked chat, notifications) belong to the caller.
#[derive(Debug, Default)]
pub struct Registry {
    inner: RwLock<Inner>,
}

impl Registry {
    pub fn new(admins: &[i64], allowed: &[i64], blocked: &[i64]) -> Self {
        let inner = Inner {
            admins: admins.iter().copied().map(UserId).collect(),
            groups: HashMap::new(),
            allowed: allowed.iter().copied().map(ChatId).collect(),
            blocked: blocked.iter().copied().map(ChatId).collect(),
        };
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// The single admission gate, evaluated when the bot joins a group:
    /// refused when a non-empty allow-list omits the id, or the block-list
    /// contains it.
    pub fn is_admitted(&self, id: ChatId) -> bool {
        let inner = self.inner.read();
        if !inner.allowed.is_empty() && !inner.allowed.contains(&id) {
            return false;
        }
        !inner.blocked.contains(&id)
    }

    /// Insert a new group as active. Idempotent: returns false and changes
    /// nothing when the id is already registered.
    pub fn register_group(&self, id: ChatId, title: &str) -> bool {
        let mut inner = self.inner.write();
        if inner.groups.contains_key(&id) {
            return false;
        }
        inner.groups.insert(
            id,
            Group {
                id,
                title: title.to_string(),
                active: true,
                last_activity: Utc::now(),
            },
        );
        true
    }

    /// Record activity on a live group. Returns the group's title when the
    /// group is registered and active (the message should be relayed), and
    /// `None` when it is unknown or paused (the message is dropped).
    pub fn touch(&self, id: ChatId) -> Option<String> {
        let mut inner = self.inner.write();
        let group = inner.groups.get_mut(&id)?;
        if !group.active {
            return None;
        }
        group.last_activity = Utc::now();
        Some(group.title.clone())
    }

    pub fn set_active(&self, id: ChatId, active: bool) -> Result<()> {
        let mut inner = self.inner.write();
        let group = inner
            .groups
            .get_mut(&id)
            .ok_or(Error::GroupNotFound(id))?;
        group.active = active;
        Ok(())
    }

    /// Flip a group's active flag, returning the new state.
    pub fn toggle_active(&self, id: ChatId) -> Result<bool> {
        let mut inner = self.inner.write();
        let group = inner
            .groups
            .get_mut(&id)
            .ok_or(Error::GroupNotFound(id))?;
        group.active = !group.active;
        Ok(group.active)
    }

    /// Add to the allow-list, evicting from the block-list. The two sets are
    /// mutually exclusive.
    pub fn allow(&self, id: ChatId) {
        let mut inner = self.inner.write();
        inner.blocked.remove(&id);
        inner.allowed.insert(id);
    }

    /// Add to the block-list, evicting from the allow-list and from the live
    /// registry. Returns the evicted group, if one was registered, so the
    /// caller can notify the chat and leave it.
    pub fn block(&self, id: ChatId) -> Option<Group> {
        let mut inner = self.inner.write();
        inner.allowed.remove(&id);
        inner.blocked.insert(id);
        inner.groups.remove(&id)
    }

    /// Returns false (no-op) when the user is already an administrator.
    pub fn add_admin(&self, id: UserId) -> bool {
        self.inner.write().admins.insert(id)
    }

    pub fn is_admin(&self, id: UserId) -> bool {
        self.inner.read().admins.contains(&id)
    }

    /// Fan-out targets, in stable order.
    pub fn admins(&self) -> Vec<UserId> {
        let mut out: Vec<UserId> = self.inner.read().admins.iter().copied().collect();
        out.sort_by_key(|a| a.0);
        out
    }

    pub fn contains_group(&self, id: ChatId) -> bool {
        self.inner.read().groups.contains_key(&id)
    }

    pub fn group(&self, id: ChatId) -> Option<Group> {
        self.inner.read().groups.get(&id).cloned()
    }

    pub fn group_title(&self, id: ChatId) -> Option<String> {
        self.inner.read().groups.get(&id).map(|g| g.title.clone())
    }

    /// Snapshot of every registered group, ordered by id for stable listings.
    pub fn groups_snapshot(&self) -> Vec<Group> {
        let mut out: Vec<Group> = self.inner.read().groups.values().cloned().collect();
        out.sort_by_key(|g| g.id.0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const G: ChatId = ChatId(-100);

    #[test]
    fn admission_truth_table() {
        // empty allow, empty block: everything admitted
        let r = Registry::new(&[1], &[], &[]);
        assert!(r.is_admitted(G));

        // non-empty allow: only listed ids admitted
        let r = Registry::new(&[1], &[-100], &[]);
        assert!(r.is_admitted(G));
        assert!(!r.is_admitted(ChatId(-200)));

        // block wins even with empty allow
        let r = Registry::new(&[1], &[], &[-100]);
        assert!(!r.is_admitted(G));
        assert!(r.is_admitted(ChatId(-200)));

        // listed in both: block wins
        let r = Registry::new(&[1], &[-100], &[-100]);
        assert!(!r.is_admitted(G));
    }

    #[test]
    fn allow_and_block_are_mutually_exclusive() {
        let r = Registry::new(&[1], &[], &[]);

        r.allow(G);
        r.block(G);
        assert!(!r.is_admitted(G));

        // allowing again evicts from the block set
        r.allow(G);
        assert!(r.is_admitted(G));
    }

    #[test]
    fn register_is_idempotent() {
        let r = Registry::new(&[1], &[], &[]);
        assert!(r.register_group(G, "Ops"));
        assert!(!r.register_group(G, "Renamed"));
        assert_eq!(r.group_title(G).as_deref(), Some("Ops"));
    }

    #[test]
    fn touch_updates_activity_and_gates_on_active() {
        let r = Registry::new(&[1], &[], &[]);
        assert!(r.touch(G).is_none()); // unknown group

        r.register_group(G, "Ops");
        let before = r.group(G).unwrap().last_activity;
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(r.touch(G).as_deref(), Some("Ops"));
        assert!(r.group(G).unwrap().last_activity > before);

        r.set_active(G, false).unwrap();
        assert!(r.touch(G).is_none()); // paused group drops messages
    }

    #[test]
    fn toggle_flips_and_reports_missing_groups() {
        let r = Registry::new(&[1], &[], &[]);
        assert!(matches!(
            r.toggle_active(G),
            Err(Error::GroupNotFound(id)) if id == G
        ));

        r.register_group(G, "Ops");
        assert_eq!(r.toggle_active(G).unwrap(), false);
        assert_eq!(r.toggle_active(G).unwrap(), true);
    }

    #[test]
    fn block_evicts_a_live_group() {
        let r = Registry::new(&[1], &[], &[]);
        r.register_group(G, "Ops");

        let evicted = r.block(G).expect("group should be evicted");
        assert_eq!(evicted.title, "Ops");
        assert!(!r.contains_group(G));
        assert!(!r.is_admitted(G));

        // blocking an unknown id evicts nothing but still blocks admission
        assert!(r.block(ChatId(-200)).is_none());
        assert!(!r.is_admitted(ChatId(-200)));
    }

    #[test]
    fn admin_set_is_a_set() {
        let r = Registry::new(&[1, 2], &[], &[]);
        assert!(r.is_admin(UserId(1)));
        assert!(!r.is_admin(UserId(3)));

        assert!(r.add_admin(UserId(3)));
        assert!(!r.add_admin(UserId(3)));
        assert_eq!(r.admins(), vec![UserId(1), UserId(2), UserId(3)]);
    }
}
