//! Object wrapper stored for each key

use super::value::{Encoding, ObjectType, Value};

/// Mask for the 24-bit recency clock
pub const RECENCY_MAX: u32 = (1 << 24) - 1;

/// 24-bit access clock, wraps around
///
/// Reserved for an eviction policy; nothing reads it yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Recency(u32);

impl Recency {
    /// Build from any counter, keeping the low 24 bits
    pub fn new(clock: u64) -> Self {
        Recency((clock & RECENCY_MAX as u64) as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// A value plus its bookkeeping
#[derive(Debug, Clone)]
pub struct Object {
    /// The value
    value: Value,

    /// Liveness count, always 1 for a key in the store
    refcount: u32,

    /// Access clock at creation
    recency: Recency,
}

impl Object {
    /// Wrap a freshly written value
    pub fn new(value: Value, recency: Recency) -> Self {
        Object {
            value,
            refcount: 1,
            recency,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn encoding(&self) -> Encoding {
        self.value.encoding()
    }

    pub fn object_type(&self) -> ObjectType {
        self.value.object_type()
    }

    pub fn refcount(&self) -> u32 {
        self.refcount
    }

    pub fn recency(&self) -> Recency {
        self.recency
    }

    /// Visible to readers
    pub fn is_live(&self) -> bool {
        self.refcount > 0
    }

    /// Drop the last reference, leaving a tombstone
    pub fn release(&mut self) {
        self.refcount = 0;
    }
}
