//! A single session's key/value bag.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// State guarded by the session lock.
struct SessionInner<K, V> {
    id: String,
    last_accessed: Instant,
    data: HashMap<K, V>,
}

/// A session: an identifier, a last-access timestamp and a key/value bag.
///
/// All methods take `&self` and are safe to call concurrently. Readers
/// share the lock; writers exclude everyone else on the same session.
/// Sessions never contend with each other.
///
/// Data operations do not touch the last-access time; only the registry
/// does that (see [`SessionRegistry::update`](crate::SessionRegistry::update)).
pub struct Session<K = String, V = serde_json::Value> {
    inner: RwLock<SessionInner<K, V>>,
}

impl<K, V> Session<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty session last accessed now.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(SessionInner {
                id: id.into(),
                last_accessed: Instant::now(),
                data: HashMap::new(),
            }),
        }
    }

    /// Current identifier. Changes when the registry refreshes the session.
    pub fn id(&self) -> String {
        self.inner.read().id.clone()
    }

    /// When the registry last touched this session.
    pub fn last_accessed(&self) -> Instant {
        self.inner.read().last_accessed
    }

    /// How long the session has been idle as of `now`.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inner.read().last_accessed)
    }

    /// Get the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read().data.get(key).cloned()
    }

    /// Check whether `key` is present, whatever its value.
    pub fn exist<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read().data.contains_key(key)
    }

    /// Insert or overwrite the value stored under `key`.
    pub fn set(&self, key: K, value: V) {
        self.inner.write().data.insert(key, value);
    }

    /// Remove `key`. Absent keys are a no-op.
    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.write().data.remove(key);
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().data.is_empty()
    }

    /// Remove every key.
    pub fn clear(&self) {
        self.inner.write().data.clear();
    }

    pub(crate) fn touch(&self) {
        self.inner.write().last_accessed = Instant::now();
    }

    /// Rename and touch in one critical section.
    pub(crate) fn rename(&self, id: &str) {
        let mut inner = self.inner.write();
        inner.id = id.to_string();
        inner.last_accessed = Instant::now();
    }

    /// Run `evict` while holding the write lock, if idle longer than `max_idle`.
    ///
    /// Returns whether `evict` ran.
    pub(crate) fn evict_if_idle(
        &self,
        now: Instant,
        max_idle: Duration,
        evict: impl FnOnce(),
    ) -> bool {
        let inner = self.inner.write();
        if now.saturating_duration_since(inner.last_accessed) > max_idle {
            evict();
            true
        } else {
            false
        }
    }
}

impl<K, V> Session<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Stored keys, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        self.inner.read().data.keys().cloned().collect()
    }

    /// Copy of the whole bag.
    pub fn snapshot(&self) -> HashMap<K, V> {
        self.inner.read().data.clone()
    }
}

impl<K, V> fmt::Debug for Session<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Session")
            .field("id", &inner.id)
            .field("last_accessed", &inner.last_accessed)
            .field("len", &inner.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::thread;

    fn session() -> Session {
        Session::new("session-1")
    }

    #[test]
    fn test_set_then_get() {
        let s = session();
        s.set("key1".to_string(), json!("value1"));
        assert_eq!(s.get("key1"), Some(json!("value1")));

        s.set("key1".to_string(), json!("value2"));
        assert_eq!(s.get("key1"), Some(json!("value2")));
    }

    #[test]
    fn test_missing_key() {
        let s = session();
        assert_eq!(s.get("missing"), None);
        assert!(!s.exist("missing"));
    }

    #[test]
    fn test_null_value_still_exists() {
        let s = session();
        s.set("key".to_string(), Value::Null);
        assert!(s.exist("key"));
        assert_eq!(s.get("key"), Some(Value::Null));
    }

    #[test]
    fn test_delete() {
        let s = session();
        s.set("key".to_string(), json!(1));
        assert!(s.exist("key"));

        s.delete("key");
        assert!(!s.exist("key"));
        assert_eq!(s.get("key"), None);

        // Deleting again is a no-op
        s.delete("key");
        assert!(s.is_empty());
    }

    #[test]
    fn test_non_string_keys() {
        let s: Session<u32, &'static str> = Session::new("numbers");
        s.set(7, "seven");
        assert_eq!(s.get(&7), Some("seven"));
        assert!(!s.exist(&8));
    }

    #[test]
    fn test_snapshot_and_keys() {
        let s = session();
        s.set("a".to_string(), json!(1));
        s.set("b".to_string(), json!(2));

        let mut keys = s.keys();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(s.snapshot().len(), 2);

        s.clear();
        assert_eq!(s.len(), 0);
    }

    #[test]
    fn test_data_ops_do_not_touch() {
        let s = session();
        let before = s.last_accessed();
        thread::sleep(Duration::from_millis(5));
        s.set("key".to_string(), json!(true));
        let _ = s.get("key");
        assert_eq!(s.last_accessed(), before);
    }

    #[test]
    fn test_rename_updates_id_and_touches() {
        let s = session();
        let before = s.last_accessed();
        thread::sleep(Duration::from_millis(5));

        s.rename("session-2");
        assert_eq!(s.id(), "session-2");
        assert!(s.last_accessed() > before);
    }

    #[test]
    fn test_evict_if_idle() {
        let s = session();
        let later = Instant::now() + Duration::from_secs(2);

        let mut evicted = false;
        assert!(!s.evict_if_idle(later, Duration::from_secs(3), || evicted = true));
        assert!(!evicted);

        assert!(s.evict_if_idle(later, Duration::from_secs(1), || evicted = true));
        assert!(evicted);
    }

    #[test]
    fn test_concurrent_writers_lose_nothing() {
        let s = Arc::new(session());
        let handles: Vec<_> = (0..100)
            .map(|i| {
                let s = Arc::clone(&s);
                thread::spawn(move || s.set(format!("key-{i}"), json!(i)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(s.len(), 100);
        assert_eq!(s.get("key-42"), Some(json!(42)));
    }

    #[test]
    fn test_concurrent_readers() {
        let s = Arc::new(session());
        s.set("key1".to_string(), json!("value1"));

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let s = Arc::clone(&s);
                thread::spawn(move || {
                    assert_eq!(s.get("key1"), Some(json!("value1")));
                    assert!(s.exist("key1"));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
