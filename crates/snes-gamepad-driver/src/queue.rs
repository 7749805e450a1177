//! Fixed-capacity key queue.
//!
//! Each device session buffers derived keys here until the UI polls for
//! them. The queue never allocates after construction and never rejects a
//! key: when it is full the oldest key is overwritten, so a consumer that
//! stops draining loses the oldest presses rather than the newest.

use crate::KEY_QUEUE_CAPACITY;
use hid_snes_protocol::KeyCode;

/// FIFO ring of pending keys with overwrite-oldest overflow.
#[derive(Debug, Clone)]
pub struct KeyQueue {
    keys: [KeyCode; KEY_QUEUE_CAPACITY],
    head: usize,
    len: usize,
    evicted: u32,
}

impl Default for KeyQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyQueue {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            keys: [KeyCode::NoKey; KEY_QUEUE_CAPACITY],
            head: 0,
            len: 0,
            evicted: 0,
        }
    }

    /// Append `key`. `NoKey` is ignored; a full queue drops its oldest key.
    #[inline]
    pub fn push(&mut self, key: KeyCode) {
        if !key.is_key() {
            return;
        }

        let tail = (self.head + self.len) % KEY_QUEUE_CAPACITY;
        if let Some(slot) = self.keys.get_mut(tail) {
            *slot = key;
        }

        if self.len < KEY_QUEUE_CAPACITY {
            self.len += 1;
        } else {
            self.head = (self.head + 1) % KEY_QUEUE_CAPACITY;
            self.evicted = self.evicted.saturating_add(1);
        }
    }

    /// Remove and return the oldest key, or `NoKey` when empty.
    #[inline]
    pub fn pop(&mut self) -> KeyCode {
        if self.len == 0 {
            return KeyCode::NoKey;
        }

        let key = self.peek();
        self.head = (self.head + 1) % KEY_QUEUE_CAPACITY;
        self.len -= 1;
        key
    }

    #[inline]
    #[must_use]
    pub fn peek(&self) -> KeyCode {
        if self.len == 0 {
            return KeyCode::NoKey;
        }
        self.keys.get(self.head).copied().unwrap_or(KeyCode::NoKey)
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len == KEY_QUEUE_CAPACITY
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        KEY_QUEUE_CAPACITY
    }

    /// Keys lost to overwrite-oldest since construction.
    ///
    /// A `DeviceSession` drains its queue before reading and one report adds
    /// at most 11 keys, so a session-owned queue never overflows and this
    /// stays 0. It only counts when `push` is called past capacity directly.
    #[inline]
    #[must_use]
    pub const fn evicted(&self) -> u32 {
        self.evicted
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}
