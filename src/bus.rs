//! Publish/subscribe registry between entities.
//!
//! The bus only stores who listens to whom. Delivery goes through [`deliver`]
//! on the owner of the entities (see `Scoreboard::notify`), which walks the
//! listener list in registration order and may publish further events from
//! inside a handler.
//! Nothing here guards against cycles; the entity kinds form a DAG
//! (teams -> live view -> map manager).

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct SyncBus<S, L> {
    listeners: HashMap<S, Vec<L>>,
}

impl<S, L> Default for SyncBus<S, L> {
    fn default() -> Self {
        SyncBus {
            listeners: HashMap::new(),
        }
    }
}

impl<S, L> SyncBus<S, L>
where
    S: Copy + Eq + Hash,
    L: Copy + Eq,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(&mut self, source: S, listener: L) {
        self.listeners.entry(source).or_default().push(listener);
    }

    /// Removes the most recently added registration of `listener`, so
    /// repeated sync/desync pairs unwind like a stack. Returns false if it
    /// was not registered.
    pub fn desync(&mut self, source: S, listener: L) -> bool {
        let Some(list) = self.listeners.get_mut(&source) else {
            return false;
        };
        let Some(pos) = list.iter().rposition(|l| *l == listener) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            self.listeners.remove(&source);
        }
        true
    }

    /// Snapshot in registration order; handlers may re-enter the bus while
    /// the snapshot is being delivered.
    pub fn listeners(&self, source: S) -> Vec<L> {
        self.listeners.get(&source).cloned().unwrap_or_default()
    }

    pub fn is_synced(&self, source: S, listener: L) -> bool {
        self.listeners
            .get(&source)
            .is_some_and(|list| list.contains(&listener))
    }

    /// Forget every listener of a source that no longer exists.
    pub fn drop_source(&mut self, source: S) {
        self.listeners.remove(&source);
    }
}

/// Owner of a bus whose handlers need mutable access to it.
pub trait Subscribers<S, L> {
    fn bus(&self) -> &SyncBus<S, L>;
}

/// Hands every listener of `source` to `handle`, in registration order.
/// Listeners unsubscribed by an earlier handler of the same delivery are
/// skipped; listeners added during it are not reached.
pub fn deliver<C, S, L>(owner: &mut C, source: S, mut handle: impl FnMut(&mut C, L))
where
    C: Subscribers<S, L>,
    S: Copy + Eq + Hash,
    L: Copy + Eq,
{
    for listener in owner.bus().listeners(source) {
        if owner.bus().is_synced(source, listener) {
            handle(owner, listener);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Src {
        A,
        B,
    }

    #[test]
    fn test_listeners_in_registration_order() {
        let mut bus = SyncBus::new();
        bus.sync(Src::A, 1);
        bus.sync(Src::A, 2);
        bus.sync(Src::A, 3);
        bus.sync(Src::B, 9);
        assert_eq!(bus.listeners(Src::A), vec![1, 2, 3]);
        assert_eq!(bus.listeners(Src::B), vec![9]);
    }

    #[test]
    fn test_desync_removes_most_recent_match() {
        let mut bus = SyncBus::new();
        bus.sync(Src::A, 1);
        bus.sync(Src::A, 2);
        bus.sync(Src::A, 1);
        assert!(bus.desync(Src::A, 1));
        assert_eq!(bus.listeners(Src::A), vec![1, 2]);
        assert!(bus.desync(Src::A, 1));
        assert_eq!(bus.listeners(Src::A), vec![2]);
        assert!(!bus.desync(Src::A, 1));
    }

    #[test]
    fn test_desync_unknown_source() {
        let mut bus: SyncBus<Src, u8> = SyncBus::new();
        assert!(!bus.desync(Src::B, 4));
        assert!(bus.listeners(Src::B).is_empty());
    }

    #[test]
    fn test_drop_source() {
        let mut bus = SyncBus::new();
        bus.sync(Src::A, 1);
        bus.sync(Src::B, 1);
        bus.drop_source(Src::A);
        assert!(!bus.is_synced(Src::A, 1));
        assert!(bus.is_synced(Src::B, 1));
    }

    struct Owner {
        bus: SyncBus<Src, u8>,
        seen: Vec<u8>,
    }

    impl Subscribers<Src, u8> for Owner {
        fn bus(&self) -> &SyncBus<Src, u8> {
            &self.bus
        }
    }

    #[test]
    fn test_deliver_skips_listener_unsubscribed_mid_delivery() {
        let mut owner = Owner {
            bus: SyncBus::new(),
            seen: Vec::new(),
        };
        owner.bus.sync(Src::A, 1);
        owner.bus.sync(Src::A, 2);
        owner.bus.sync(Src::A, 3);
        deliver(&mut owner, Src::A, |owner, listener| {
            owner.seen.push(listener);
            if listener == 1 {
                owner.bus.desync(Src::A, 2);
                owner.bus.sync(Src::A, 4);
            }
        });
        assert_eq!(owner.seen, vec![1, 3]);
        assert_eq!(owner.bus.listeners(Src::A), vec![1, 3, 4]);
    }
}
