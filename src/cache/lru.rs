//! Recency order for the local cache.
//!
//! `LocalCache` keeps its values in a map and asks this tracker which key to
//! drop when it is full.

use std::collections::HashMap;
use std::mem;

#[derive(Debug)]
struct Node {
    key: String,
    /// Towards the most recent end.
    prev: Option<usize>,
    /// Towards the stale end.
    next: Option<usize>,
}

/// Doubly linked recency list over a slab of nodes.
///
/// `head` is the key used last, `tail` the next eviction victim. Slots freed
/// by `remove`/`evict_oldest` go on `free` and are reused, so the slab never
/// grows past the largest number of keys held at once.
#[derive(Debug, Default)]
pub struct LruTracker {
    nodes: Vec<Node>,
    free: Vec<usize>,
    index: HashMap<String, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl LruTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preallocates for a cache bounded at `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        LruTracker {
            nodes: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            ..LruTracker::default()
        }
    }

    // == Recording Use ==
    /// Moves `key` to the head, inserting it if unseen.
    pub fn touch(&mut self, key: &str) {
        if let Some(&idx) = self.index.get(key) {
            if self.head != Some(idx) {
                self.unlink(idx);
                self.push_front(idx);
            }
            return;
        }

        let node = Node {
            key: key.to_owned(),
            prev: None,
            next: None,
        };
        let idx = if let Some(idx) = self.free.pop() {
            self.nodes[idx] = node;
            idx
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        };
        self.index.insert(key.to_owned(), idx);
        self.push_front(idx);
    }

    /// Stops tracking `key`; false if it was not tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(idx) = self.index.remove(key) else {
            return false;
        };
        self.release(idx);
        true
    }

    // == Eviction ==
    /// Pops the stalest key, if any.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let stalest = self.tail?;
        let key = self.release(stalest);
        self.index.remove(&key);
        Some(key)
    }

    pub fn peek_oldest(&self) -> Option<&str> {
        self.tail.map(|idx| self.nodes[idx].key.as_str())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    /// Unlinks a slot, frees it and hands back its key.
    fn release(&mut self, idx: usize) -> String {
        self.unlink(idx);
        self.free.push(idx);
        mem::take(&mut self.nodes[idx].key)
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = &self.nodes[idx];
            (node.prev, node.next)
        };

        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }

        let node = &mut self.nodes[idx];
        node.prev = None;
        node.next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;

        match self.head {
            Some(h) => self.nodes[h].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }
}
