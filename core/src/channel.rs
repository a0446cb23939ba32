//! # Channel: Keyed Publish/Subscribe
//!
//! Each entity (form, field) owns its channels; a subscription is a key plus a
//! handler. Re-running page initialization after a zone refresh subscribes the
//! same keys again, so [`Channel::subscribe`] ignores a key it already holds.

/// Ordered subscriber list with an idempotent registration guard.
#[derive(Debug, Clone)]
pub struct Channel<K, H = ()> {
    subscribers: Vec<(K, H)>,
}

impl<K, H> Default for Channel<K, H> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<K: PartialEq, H> Channel<K, H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` under `key`. Returns `false` (and keeps the original
    /// handler) when `key` is already subscribed.
    pub fn subscribe(&mut self, key: K, handler: H) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.subscribers.push((key, handler));
        true
    }

    /// Subscribe, replacing the handler of an existing `key` in place.
    pub fn replace(&mut self, key: K, handler: H) {
        match self.subscribers.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = handler,
            None => self.subscribers.push((key, handler)),
        }
    }

    pub fn unsubscribe(&mut self, key: &K) -> Option<H> {
        let index = self.subscribers.iter().position(|(k, _)| k == key)?;
        Some(self.subscribers.remove(index).1)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.subscribers.iter().any(|(k, _)| k == key)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.subscribers.retain(|(k, _)| keep(k));
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &H)> {
        self.subscribers.iter().map(|(k, h)| (k, h))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.subscribers.iter().map(|(k, _)| k)
    }
}

impl<K: PartialEq + Clone, H: Clone> Channel<K, H> {
    /// Copy of the subscriber list, so delivery can mutate the owner freely.
    pub fn snapshot(&self) -> Vec<(K, H)> {
        self.subscribers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_is_idempotent_per_key() {
        let mut channel: Channel<&str, u8> = Channel::new();
        assert!(channel.subscribe("a", 1));
        assert!(channel.subscribe("b", 2));
        assert!(!channel.subscribe("a", 9));

        let seen: Vec<(&str, u8)> = channel.snapshot();
        assert_eq!(seen, vec![("a", 1), ("b", 2)]);
    }

    #[test]
    fn test_replace_and_unsubscribe() {
        let mut channel: Channel<u32, &str> = Channel::new();
        channel.subscribe(1, "old");
        channel.replace(1, "new");
        channel.replace(2, "two");
        assert_eq!(channel.unsubscribe(&1), Some("new"));
        assert_eq!(channel.len(), 1);
        channel.retain(|k| *k != 2);
        assert!(channel.is_empty());
    }
}
