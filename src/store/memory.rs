//! In-memory storage implementation

use super::error::StoreError;
use super::object::{Object, Recency};
use super::value::Value;
use super::unix_now;
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;

type Hasher = BuildHasherDefault<SipHasher13>;

/// Key space: key -> object
type KeyMap = HashMap<String, Object, Hasher>;

/// Expiry table: key -> absolute UNIX second at which the key dies
type ExpiryMap = HashMap<String, i64, Hasher>;

/// In-memory key-value store
///
/// Keys live in the key space; the expiry table only holds keys that carry a
/// TTL. Expiration is lazy: every operation first drops the key it touches
/// if its deadline has passed, there is no background sweep.
///
/// Single-owner. Callers sharing a store across tasks must serialize all
/// access behind one lock, since several operations are read-modify-write.
pub struct MemoryStore {
    keys: KeyMap,
    expires: ExpiryMap,
}

impl MemoryStore {
    /// Create a new memory store with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new memory store with specified initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        MemoryStore {
            keys: HashMap::with_capacity_and_hasher(capacity, Hasher::default()),
            expires: HashMap::with_hasher(Hasher::default()),
        }
    }

    /// Get a value, `None` if the key is absent or expired
    pub fn get(&mut self, key: &str) -> Option<&Value> {
        self.expire_if_due(key, unix_now());
        self.keys
            .get(key)
            .filter(|obj| obj.is_live())
            .map(Object::value)
    }

    /// Insert or replace a value
    ///
    /// An existing expiry entry is kept: overwriting a key does not
    /// reset its TTL.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let now = unix_now();
        let key = key.into();
        // A dead key must not pass its old deadline on to the new value
        self.expire_if_due(&key, now);
        self.keys.insert(key, Object::new(value, Recency::new(now as u64)));
    }

    /// Delete a key and its expiry, true if the key existed
    pub fn delete(&mut self, key: &str) -> bool {
        if self.expire_if_due(key, unix_now()) {
            return false;
        }
        self.remove(key)
    }

    /// True if the key is present and live
    pub fn exists(&mut self, key: &str) -> bool {
        self.expire_if_due(key, unix_now());
        self.keys.get(key).map_or(false, Object::is_live)
    }

    /// Remaining lifetime in seconds
    ///
    /// Returns:
    /// - n >= 0: remaining TTL in seconds
    /// - -1: key exists but has no expiration
    /// - -2: key does not exist or is expired
    pub fn get_ttl(&mut self, key: &str) -> i64 {
        let now = unix_now();
        if self.expire_if_due(key, now) || !self.exists(key) {
            return -2;
        }

        match self.expires.get(key) {
            Some(&deadline) => deadline - now,
            None => -1,
        }
    }

    /// Set the absolute UNIX second at which the key expires
    ///
    /// Returns false if the key does not exist. A deadline already in the
    /// past takes effect on the next access.
    pub fn set_ttl(&mut self, key: &str, deadline: i64) -> bool {
        if !self.exists(key) {
            return false;
        }
        self.expires.insert(key.to_string(), deadline);
        true
    }

    /// Make the key persistent, false if it does not exist
    pub fn remove_expiry(&mut self, key: &str) -> bool {
        if !self.exists(key) {
            return false;
        }
        self.expires.remove(key);
        true
    }

    /// Add `delta` to an integer value, an absent key counts as 0
    pub fn increment_by(&mut self, key: &str, delta: i64) -> Result<i64, StoreError> {
        self.apply_delta(key, |current| current.checked_add(delta))
    }

    /// Subtract `delta` from an integer value, an absent key counts as 0
    pub fn decrement_by(&mut self, key: &str, delta: i64) -> Result<i64, StoreError> {
        self.apply_delta(key, |current| current.checked_sub(delta))
    }

    fn apply_delta<F>(&mut self, key: &str, op: F) -> Result<i64, StoreError>
    where
        F: FnOnce(i64) -> Option<i64>,
    {
        let current = match self.get(key) {
            Some(Value::Integer(i)) => *i,
            Some(Value::Text(_)) => return Err(StoreError::NotAnInteger),
            None => 0,
        };

        let updated = op(current).ok_or(StoreError::Overflow)?;
        self.set(key, Value::Integer(updated));
        Ok(updated)
    }

    /// Number of keys in the key space, including expired ones not yet
    /// observed
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of keys carrying a TTL
    pub fn expiring_len(&self) -> usize {
        self.expires.len()
    }

    /// Drop `key` if its deadline is at or before `now`
    ///
    /// Returns true if the key was removed.
    fn expire_if_due(&mut self, key: &str, now: i64) -> bool {
        match self.expires.get(key) {
            Some(&deadline) if deadline <= now => {
                self.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Tombstone then remove; both maps are updated before returning
    fn remove(&mut self, key: &str) -> bool {
        self.expires.remove(key);
        match self.keys.remove(key) {
            Some(mut obj) => {
                let was_live = obj.is_live();
                obj.release();
                was_live
            }
            None => false,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
