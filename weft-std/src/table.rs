//! Dispatch tables shared by every controller.

use std::{
    any::Any,
    borrow::{Borrow, Cow},
    collections::HashMap,
    fmt,
    hash::Hash,
    sync::atomic::{AtomicU64, Ordering},
};
use thiserror::Error;
use weft_core::{DispatchError, DomainMarker, Invocation, Invoker, TypeKey};

/// An entry was rejected because its key is already taken.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{key}` is already bound by `{owner}::{function}`")]
pub struct Collision {
    /// The contested key.
    pub key: String,
    /// Declaring type of the existing entry.
    pub owner: &'static str,
    /// Function of the existing entry.
    pub function: String,
}

/// One installed handler.
#[derive(Debug, Clone)]
pub struct Entry {
    owner: TypeKey,
    function: Cow<'static, str>,
    invoker: Invoker,
    order: u64,
}

impl Entry {
    /// Declaring type.
    pub fn owner(&self) -> TypeKey {
        self.owner
    }

    /// Declaring function.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Handle of the function.
    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    /// Global registration sequence number within the table.
    pub fn order(&self) -> u64 {
        self.order
    }
}

/// Key → handlers map with duplicate rejection.
///
/// A multi-handler table accepts several entries per key as long as each
/// comes from a different `(owner, function)`; an exclusive table accepts
/// one entry per key.
pub struct DispatchTable<K> {
    entries: HashMap<K, Vec<Entry>>,
    exclusive: bool,
    next: u64,
}

impl<K> Default for DispatchTable<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            exclusive: false,
            next: 0,
        }
    }
}

impl<K> DispatchTable<K>
where
    K: Hash + Eq + Clone + fmt::Debug,
{
    /// A table holding several handlers per key.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding one handler per key.
    pub fn exclusive() -> Self {
        Self {
            exclusive: true,
            ..Self::default()
        }
    }

    /// Install a handler.
    pub fn insert(
        &mut self,
        key: K,
        owner: TypeKey,
        function: impl Into<Cow<'static, str>>,
        invoker: Invoker,
    ) -> Result<(), Collision> {
        let function = function.into();
        let exclusive = self.exclusive;
        let slot = self.entries.entry(key.clone()).or_default();
        let existing = slot
            .iter()
            .find(|entry| exclusive || (entry.owner == owner && entry.function == function));
        if let Some(existing) = existing {
            return Err(Collision {
                key: format!("{key:?}"),
                owner: existing.owner.short_name(),
                function: existing.function.to_string(),
            });
        }
        slot.push(Entry {
            owner,
            function,
            invoker,
            order: self.next,
        });
        self.next += 1;
        Ok(())
    }

    /// Handlers under `key`, in registration order.
    pub fn get<Q>(&self, key: &Q) -> &[Entry]
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Remove every entry declared by `owner`.
    pub fn remove_owner(&mut self, owner: TypeKey) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, slot| {
            let before = slot.len();
            slot.retain(|entry| entry.owner != owner);
            removed += before - slot.len();
            !slot.is_empty()
        });
        removed
    }

    /// Keys with at least one entry declared by `owner`.
    pub fn keys_of(&self, owner: TypeKey) -> Vec<K> {
        self.entries
            .iter()
            .filter(|(_, slot)| slot.iter().any(|entry| entry.owner == owner))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Whether any handler is installed under `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Number of installed entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Outcome of a keyed dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// This many handlers ran.
    Handled(usize),
    /// No handler matched; the call was logged and dropped.
    Dropped,
}

impl Delivery {
    /// Whether at least one handler ran.
    pub fn is_handled(&self) -> bool {
        matches!(self, Delivery::Handled(_))
    }
}

/// Counters kept by each controller.
#[derive(Debug, Default)]
pub struct DispatchStats {
    delivered: AtomicU64,
    dropped: AtomicU64,
    faulted: AtomicU64,
}

impl DispatchStats {
    /// Calls that reached at least one handler.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Calls that matched no handler.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Calls where a handler faulted.
    pub fn faulted(&self) -> u64 {
        self.faulted.load(Ordering::Relaxed)
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_faulted(&self) {
        self.faulted.fetch_add(1, Ordering::Relaxed);
    }
}

/// Run the handlers of the first key that resolves.
///
/// Keys are tried in order (primary id, then payload type). A miss is
/// counted and logged at `warn` when `warn_on_miss`, at `debug` otherwise.
pub(crate) fn deliver<K, Q>(
    table: &DispatchTable<K>,
    stats: &DispatchStats,
    domain: DomainMarker,
    keys: &[&Q],
    mut receiver: Option<&mut dyn Any>,
    args: &[&dyn Any],
    warn_on_miss: bool,
) -> Result<Delivery, DispatchError>
where
    K: Hash + Eq + Clone + fmt::Debug + Borrow<Q>,
    Q: Hash + Eq + fmt::Debug + ?Sized,
{
    let Some((key, entries)) = keys
        .iter()
        .map(|key| (key, table.get(*key)))
        .find(|(_, entries)| !entries.is_empty())
    else {
        stats.record_dropped();
        if warn_on_miss {
            tracing::warn!(%domain, ?keys, "no handler registered, dropping");
        } else {
            tracing::debug!(%domain, ?keys, "no handler registered");
        }
        return Ok(Delivery::Dropped);
    };

    for entry in entries {
        tracing::debug!(%domain, ?key, function = entry.function(), "invoking handler");
        let mut invocation = Invocation::new(receiver.as_deref_mut(), args);
        if let Err(source) = entry.invoker.invoke(&mut invocation) {
            stats.record_faulted();
            return Err(DispatchError::Handler {
                domain,
                function: format!("{}::{}", entry.owner.short_name(), entry.function),
                source,
            });
        }
    }
    stats.record_delivered();
    Ok(Delivery::Handled(entries.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;

    fn noop() -> Invoker {
        Invoker::function(|| ())
    }

    #[test]
    fn test_multi_handler_rejects_same_owner_and_function() {
        let mut table = DispatchTable::<u32>::new();
        table.insert(1, TypeKey::of::<A>(), "on", noop()).unwrap();
        table.insert(1, TypeKey::of::<A>(), "other", noop()).unwrap();
        table.insert(1, TypeKey::of::<B>(), "on", noop()).unwrap();

        let err = table.insert(1, TypeKey::of::<A>(), "on", noop()).unwrap_err();
        assert_eq!(err.owner, "A");
        assert_eq!(table.get(&1).len(), 3);
        let orders: Vec<_> = table.get(&1).iter().map(Entry::order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_exclusive_rejects_any_second_entry() {
        let mut table = DispatchTable::<&'static str>::exclusive();
        table.insert("spawn", TypeKey::of::<A>(), "spawn", noop()).unwrap();
        assert!(table.insert("spawn", TypeKey::of::<B>(), "spawn", noop()).is_err());
        assert_eq!(table.get(&"spawn")[0].owner(), TypeKey::of::<A>());
    }

    #[test]
    fn test_remove_owner() {
        let mut table = DispatchTable::<u32>::new();
        table.insert(1, TypeKey::of::<A>(), "on", noop()).unwrap();
        table.insert(2, TypeKey::of::<A>(), "on", noop()).unwrap();
        table.insert(2, TypeKey::of::<B>(), "on", noop()).unwrap();

        let mut keys = table.keys_of(TypeKey::of::<A>());
        keys.sort();
        assert_eq!(keys, vec![1, 2]);

        assert_eq!(table.remove_owner(TypeKey::of::<A>()), 2);
        assert!(!table.contains(&1));
        assert_eq!(table.len(), 1);
        assert!(table.keys_of(TypeKey::of::<A>()).is_empty());
    }

    #[test]
    fn test_deliver_falls_back_and_counts_misses() {
        let mut table = DispatchTable::<u32>::new();
        table.insert(9, TypeKey::of::<A>(), "on", noop()).unwrap();
        let stats = DispatchStats::default();

        let delivery =
            deliver(&table, &stats, DomainMarker::EVENT, &[&1u32, &9], None, &[], true).unwrap();
        assert_eq!(delivery, Delivery::Handled(1));

        let delivery =
            deliver(&table, &stats, DomainMarker::EVENT, &[&1u32, &2], None, &[], true).unwrap();
        assert_eq!(delivery, Delivery::Dropped);
        assert_eq!((stats.delivered(), stats.dropped()), (1, 1));
    }

    #[test]
    fn test_deliver_reports_fault() {
        let mut table = DispatchTable::<u32>::new();
        table
            .insert(1, TypeKey::of::<A>(), "boom", Invoker::function(|| Err::<(), _>("boom")))
            .unwrap();
        let stats = DispatchStats::default();
        let err = deliver(&table, &stats, DomainMarker::MESSAGE, &[&1u32], None, &[], true)
            .unwrap_err();
        assert_eq!(err.fault().to_string(), "boom");
        assert_eq!(stats.faulted(), 1);
    }
}
