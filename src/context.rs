//! Per-chat conversation context.
//!
//! The Bot API has no history-fetch call, so the classifier context window
//! comes from a bounded in-memory ring of the messages the bot has already
//! seen. Entries are formatted "Name: text" lines.

use std::collections::{HashMap, VecDeque};

/// Messages retained per chat. Only `Config::context_window` of them are
/// ever handed to the classifiers; the rest is slack for larger windows.
const PER_CHAT_CAPACITY: usize = 32;

/// Bounded per-chat ring of recent messages.
pub struct ContextCache {
    capacity: usize,
    chats: HashMap<i64, VecDeque<String>>,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::with_capacity(PER_CHAT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            chats: HashMap::new(),
        }
    }

    /// Record a message. Oldest entries fall off once the ring is full.
    pub fn push(&mut self, chat_id: i64, author_name: &str, text: &str) {
        let ring = self.chats.entry(chat_id).or_default();
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(format!("{author_name}: {text}"));
    }

    /// The last `n` messages of a chat, oldest first — the order the
    /// classifier context block expects. Call before pushing the message
    /// being scored so it never appears in its own context.
    pub fn snapshot(&self, chat_id: i64, n: usize) -> Vec<String> {
        let Some(ring) = self.chats.get(&chat_id) else {
            return Vec::new();
        };
        let skip = ring.len().saturating_sub(n);
        ring.iter().skip(skip).cloned().collect()
    }
}

impl Default for ContextCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_of_unknown_chat_is_empty() {
        let cache = ContextCache::new();
        assert!(cache.snapshot(1, 5).is_empty());
    }

    #[test]
    fn snapshot_returns_last_n_oldest_first() {
        let mut cache = ContextCache::new();
        cache.push(1, "a", "one");
        cache.push(1, "b", "two");
        cache.push(1, "c", "three");

        assert_eq!(cache.snapshot(1, 2), vec!["b: two", "c: three"]);
        assert_eq!(cache.snapshot(1, 10).len(), 3);
    }

    #[test]
    fn chats_are_isolated() {
        let mut cache = ContextCache::new();
        cache.push(1, "a", "in chat one");
        cache.push(2, "b", "in chat two");

        assert_eq!(cache.snapshot(1, 5), vec!["a: in chat one"]);
        assert_eq!(cache.snapshot(2, 5), vec!["b: in chat two"]);
    }

    #[test]
    fn ring_is_bounded() {
        let mut cache = ContextCache::with_capacity(3);
        for i in 0..10 {
            cache.push(1, "u", &format!("msg {i}"));
        }
        let all = cache.snapshot(1, 100);
        assert_eq!(all, vec!["u: msg 7", "u: msg 8", "u: msg 9"]);
    }

    #[test]
    fn zero_window_snapshot_is_empty() {
        let mut cache = ContextCache::new();
        cache.push(1, "a", "x");
        assert!(cache.snapshot(1, 0).is_empty());
    }
}
