use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tokio::time::Instant;

use crate::stream::Stream;

/// The Store maps keys to typed entries with optional expiry. It is the single
/// resource shared across connections and is designed to be cloned cheaply via
/// reference counting; all access goes through [`Store::lock`], so
/// check-then-mutate sequences are atomic with respect to other connections.
///
/// Expiry is lazy: an entry whose deadline has passed is deleted by the first
/// access that observes it, never by a background sweep.
#[derive(Clone)]
pub struct Store {
    state: Arc<Mutex<State>>,
}

struct State {
    keys: HashMap<String, Entry>,
}

impl Store {
    pub fn new() -> Store {
        Store {
            state: Arc::new(Mutex::new(State {
                keys: HashMap::new(),
            })),
        }
    }

    pub fn lock(&self) -> StoreGuard<'_> {
        StoreGuard {
            state: self.state.lock().unwrap(),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to the store state for the duration of one operation.
/// Must never be held across an `.await`.
pub struct StoreGuard<'a> {
    state: MutexGuard<'a, State>,
}

impl StoreGuard<'_> {
    /// Looks a key up, evicting it first if its expiry has passed. An expired
    /// entry is indistinguishable from an absent one.
    pub fn get(&mut self, key: &str) -> Option<&Entry> {
        self.evict_if_expired(key);
        self.state.keys.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.evict_if_expired(key);
        self.state.keys.get_mut(key)
    }

    /// Unconditional overwrite, replacing any prior entry of any type.
    pub fn set(&mut self, key: String, entry: Entry) {
        self.state.keys.insert(key, entry);
    }

    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        self.state.keys.remove(key)
    }

    fn evict_if_expired(&mut self, key: &str) {
        let now = Instant::now();
        let expired = self
            .state
            .keys
            .get(key)
            .is_some_and(|entry| entry.is_expired(now));

        if expired {
            self.state.keys.remove(key);
        }
    }
}

pub struct Entry {
    pub value: Value,
    pub expires_at: Option<Instant>,
}

impl Entry {
    pub fn new(value: Value) -> Entry {
        Entry {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }
}

/// The typed payload stored under a key.
pub enum Value {
    String(Bytes),
    List(VecDeque<Bytes>),
    Stream(Stream),
}

impl Value {
    /// The name reported by the TYPE command.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Stream(_) => "stream",
        }
    }

    pub fn as_string(&self) -> Option<&Bytes> {
        match self {
            Value::String(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&VecDeque<Bytes>> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut VecDeque<Bytes>> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Value::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    pub fn as_stream_mut(&mut self) -> Option<&mut Stream> {
        match self {
            Value::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}
