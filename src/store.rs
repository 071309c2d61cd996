use bytes::Bytes;
use parking_lot::{Mutex, MutexGuard};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::{sleep_until, Duration, Instant};

/// The Store is responsible for managing Redis-shaped values (strings, hashes, lists, sets and
/// sorted sets), with optional time-to-live settings for each key. It automatically handles the
/// expiration and removal of keys when their TTLs elapse. The store is designed to be
/// thread-safe, allowing it to be shared and cloned cheaply using reference counting.
///
/// Creating a store spawns the expiration task, so it must happen inside a tokio runtime.
#[derive(Clone)]
pub struct Store {
    inner: Arc<InnerStore>,
}

impl Store {
    pub fn new() -> Store {
        let state = State {
            keys: HashMap::new(),
            ttls: BTreeSet::new(),
        };

        let waker = Notify::new();
        let inner = Arc::new(InnerStore {
            state: Mutex::new(state),
            waker,
        });

        tokio::spawn({
            let inner = inner.clone();
            async move { remove_expired_keys(inner).await }
        });

        Self { inner }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InnerStore {
    state: Mutex<State>,
    waker: Notify,
}

pub struct InnerStoreLocked<'a> {
    state: MutexGuard<'a, State>,
    waker: &'a Notify,
}

impl<'a> InnerStoreLocked<'a> {
    /// Stores `value` under `key`, replacing whatever was there and clearing any TTL.
    pub fn set(&mut self, key: String, value: Value) {
        self.clear_ttl(&key);
        self.state.keys.insert(
            key,
            Entry {
                value,
                expires_at: None,
            },
        );
    }

    pub fn set_with_ttl(&mut self, key: Key, value: Value, ttl: Duration) {
        self.set(key.clone(), value);
        self.expire(&key, ttl);
    }

    /// Sets a TTL on an existing key. Returns `false` if the key does not exist. A TTL too
    /// long to represent leaves the key without expiry.
    pub fn expire(&mut self, key: &str, ttl: Duration) -> bool {
        self.purge_if_expired(key);
        if !self.state.keys.contains_key(key) {
            return false;
        }

        self.clear_ttl(key);
        let Some(expires_at) = Instant::now().checked_add(ttl) else {
            if let Some(entry) = self.state.keys.get_mut(key) {
                entry.expires_at = None;
            }
            return true;
        };
        if let Some(entry) = self.state.keys.get_mut(key) {
            entry.expires_at = Some(expires_at);
        }
        self.state.ttls.insert((expires_at, key.to_string()));

        let next_to_expire = self.state.ttls.iter().next().map(|(_, key)| key.as_str());
        if next_to_expire == Some(key) {
            self.waker.notify_one();
        }
        true
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state
            .keys
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.purge_if_expired(key);
        self.state.keys.get_mut(key).map(|entry| &mut entry.value)
    }

    /// Returns the value at `key`, inserting the one built by `default` if the key is absent.
    /// An existing TTL is kept.
    pub fn get_or_insert_with(&mut self, key: &str, default: impl FnOnce() -> Value) -> &mut Value {
        self.purge_if_expired(key);
        &mut self
            .state
            .keys
            .entry(key.to_string())
            .or_insert_with(|| Entry {
                value: default(),
                expires_at: None,
            })
            .value
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.purge_if_expired(key);
        self.clear_ttl(key);
        self.state.keys.remove(key).map(|entry| entry.value)
    }

    /// Aggregates are dropped once they hold no elements, like a real server does.
    pub fn remove_if_empty(&mut self, key: &str) {
        if self.get(key).is_some_and(Value::is_empty) {
            self.remove(key);
        }
    }

    pub fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Time left before `key` expires, `None` if it has no TTL or does not exist.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.state
            .keys
            .get(key)
            .filter(|entry| !entry.is_expired())
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn size(&self) -> usize {
        self.state
            .keys
            .values()
            .filter(|entry| !entry.is_expired())
            .count()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.state
            .keys
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, _)| key)
    }

    pub fn remove_expired_keys(&mut self) -> Option<Instant> {
        let now = Instant::now();

        let expired_keys: Vec<(Instant, String)> = self
            .state
            .ttls
            .iter()
            .take_while(|(expires_at, _)| expires_at <= &now)
            .cloned()
            .collect();

        for (when, key) in expired_keys {
            self.state.keys.remove(&key);
            self.state.ttls.remove(&(when, key));
        }

        self.state
            .ttls
            .iter()
            .next()
            .map(|&(expires_at, _)| expires_at)
    }

    fn clear_ttl(&mut self, key: &str) {
        let expires_at = self.state.keys.get(key).and_then(|entry| entry.expires_at);
        if let Some(expires_at) = expires_at {
            self.state.ttls.remove(&(expires_at, key.to_string()));
        }
    }

    fn purge_if_expired(&mut self, key: &str) {
        if self.state.keys.get(key).is_some_and(Entry::is_expired) {
            self.clear_ttl(key);
            self.state.keys.remove(key);
        }
    }
}

impl Deref for Store {
    type Target = InnerStore;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl InnerStore {
    pub fn lock(&self) -> InnerStoreLocked<'_> {
        let state = self.state.lock();
        InnerStoreLocked {
            state,
            waker: &self.waker,
        }
    }
}

type Key = String;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(Bytes),
    Hash(HashMap<String, Bytes>),
    List(VecDeque<Bytes>),
    Set(HashSet<Bytes>),
    SortedSet(HashMap<String, f64>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Hash(_) => "hash",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::SortedSet(_) => "zset",
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Value::String(_) => false,
            Value::Hash(hash) => hash.is_empty(),
            Value::List(list) => list.is_empty(),
            Value::Set(set) => set.is_empty(),
            Value::SortedSet(zset) => zset.is_empty(),
        }
    }
}

/// Members of a sorted set in ascending `(score, member)` order.
pub fn ranked(zset: &HashMap<String, f64>) -> Vec<(&String, f64)> {
    let mut members: Vec<(&String, f64)> = zset.iter().map(|(m, s)| (m, *s)).collect();
    members.sort_by(|(am, a), (bm, b)| a.total_cmp(b).then_with(|| am.cmp(bm)));
    members
}

/// Resolves Redis-style inclusive `start`/`stop` indexes (negative counts from the end) into a
/// half-open range over a collection of `len` items.
pub fn index_range(len: usize, start: i64, stop: i64) -> std::ops::Range<usize> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start > stop || start >= len {
        return 0..0;
    }
    start as usize..(stop + 1) as usize
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Instant::now())
    }
}

struct State {
    keys: HashMap<Key, Entry>,
    ttls: BTreeSet<(Instant, Key)>,
}

async fn remove_expired_keys(store: Arc<InnerStore>) {
    loop {
        let (next_expiration, waker) = {
            let mut store = store.lock();
            let next_expiration = store.remove_expired_keys();
            (next_expiration, store.waker)
        };

        if let Some(next_expiration) = next_expiration {
            tokio::select! {
                _ = sleep_until(next_expiration) => {}
                _ = waker.notified() => {}
            }
        } else {
            waker.notified().await;
        }
    }
}
