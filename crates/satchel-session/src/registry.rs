//! Session registry: identifier → session table with idle expiry.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::HeaderMap;
use parking_lot::RwLock;
use tracing::{debug, info, trace};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::session::Session;

/// State shared by every handle to a registry.
struct RegistryInner<K, V> {
    /// Identifier → session. Structural changes take the write lock.
    table: RwLock<HashMap<String, Arc<Session<K, V>>>>,

    config: SessionConfig,
}

/// Concurrency-safe table of session identifier → [`Session`].
///
/// The registry is a cheap handle: clones share the same table. Construct
/// one per process and pass it to whatever needs it; run a
/// [`Sweeper`](crate::Sweeper) next to it to evict idle sessions.
///
/// Lock order is always table, then session. Lookups take the table's read
/// lock; `create`, `destroy`, `refresh` and sweep removals take its write
/// lock. Session data is guarded by each session's own lock, so handing out
/// `Arc<Session>` never blocks the table.
///
/// A session evicted from the registry stays usable by callers that still
/// hold it, but changes to it are no longer visible through the registry.
pub struct SessionRegistry<K = String, V = serde_json::Value> {
    inner: Arc<RegistryInner<K, V>>,
}

impl<K, V> SessionRegistry<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty registry.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                table: RwLock::new(HashMap::new()),
                config,
            }),
        }
    }

    /// Get the registry configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Register a fresh, empty session under `id`.
    ///
    /// Any session already registered under `id` is replaced.
    pub fn create(&self, id: &str) -> Result<Arc<Session<K, V>>> {
        if id.is_empty() {
            return Err(Error::InvalidArgument(
                "session id must not be empty".to_string(),
            ));
        }

        let session = Arc::new(Session::new(id));
        let mut table = self.inner.table.write();
        let replaced = table.insert(id.to_string(), Arc::clone(&session)).is_some();

        debug!(
            session_id = %id,
            replaced,
            count = table.len(),
            "Session created"
        );

        Ok(session)
    }

    /// Check whether `id` is registered.
    pub fn exists(&self, id: &str) -> bool {
        self.inner.table.read().contains_key(id)
    }

    /// Look up a session by id without touching its last-access time.
    pub fn get(&self, id: &str) -> Option<Arc<Session<K, V>>> {
        self.inner.table.read().get(id).cloned()
    }

    /// Resolve the request's identifier and return the registered session.
    ///
    /// With `auto_refresh` enabled the session's last-access time is bumped
    /// before this returns.
    pub fn read(&self, headers: &HeaderMap) -> Result<Arc<Session<K, V>>> {
        let id = self.extract_id(headers)?;
        self.lookup_and_touch(&id)
            .ok_or(Error::SessionNotFound(id))
    }

    /// Like [`read`](Self::read), but registers a new session when the
    /// identifier is unknown. Identifier resolution failures still fail.
    pub fn read_or_create(&self, headers: &HeaderMap) -> Result<Arc<Session<K, V>>> {
        let id = self.extract_id(headers)?;
        if let Some(session) = self.lookup_and_touch(&id) {
            return Ok(session);
        }

        let mut table = self.inner.table.write();
        // Another request may have registered the id since the read lock.
        if let Some(session) = table.get(&id) {
            if self.inner.config.auto_refresh {
                session.touch();
            }
            return Ok(Arc::clone(session));
        }

        let session = Arc::new(Session::new(id.as_str()));
        table.insert(id.clone(), Arc::clone(&session));
        debug!(session_id = %id, count = table.len(), "Session created on read");

        Ok(session)
    }

    /// Bump the last-access time of a registered session.
    pub fn update(&self, id: &str) -> Result<()> {
        let table = self.inner.table.read();
        let session = table
            .get(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?;
        session.touch();
        Ok(())
    }

    /// Remove a session from the registry.
    pub fn destroy(&self, id: &str) -> Result<()> {
        let mut table = self.inner.table.write();
        match table.remove(id) {
            Some(_) => {
                debug!(session_id = %id, count = table.len(), "Session destroyed");
                Ok(())
            }
            None => Err(Error::SessionNotFound(id.to_string())),
        }
    }

    /// Move the session at `old_id` to `new_id`.
    ///
    /// The session keeps its data, takes the new id and is touched. Anything
    /// already registered at `new_id` is replaced. When `old_id` is not
    /// registered this creates an empty session at `new_id` instead, so the
    /// same call serves both id rotation and lazy establishment.
    pub fn refresh(&self, old_id: &str, new_id: &str) -> Result<Arc<Session<K, V>>> {
        if new_id.is_empty() {
            return Err(Error::InvalidArgument(
                "new session id must not be empty".to_string(),
            ));
        }

        let mut table = self.inner.table.write();
        let session = match table.remove(old_id) {
            Some(session) => {
                session.rename(new_id);
                debug!(old_id = %old_id, new_id = %new_id, "Session id rotated");
                session
            }
            None => {
                debug!(old_id = %old_id, new_id = %new_id, "Refresh of unknown session, creating");
                Arc::new(Session::new(new_id))
            }
        };
        table.insert(new_id.to_string(), Arc::clone(&session));

        Ok(session)
    }

    /// Number of registered sessions.
    pub fn count(&self) -> usize {
        self.inner.table.read().len()
    }

    /// Alias for [`count`](Self::count).
    pub fn len(&self) -> usize {
        self.count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.table.read().is_empty()
    }

    /// Registered identifiers, in no particular order.
    pub fn ids(&self) -> Vec<String> {
        self.inner.table.read().keys().cloned().collect()
    }

    /// Remove every session. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut table = self.inner.table.write();
        let count = table.len();
        table.clear();
        if count > 0 {
            info!(count, "Session registry cleared");
        }
        count
    }

    /// Evict every session idle longer than the configured max lifetime.
    ///
    /// Returns the number of evicted sessions.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// [`sweep`](Self::sweep) with an explicit notion of "now".
    ///
    /// Candidates are collected under the read lock. Each one is then
    /// re-checked under its own write lock, with the table write-locked, and
    /// removed only if still idle, so a touch that lands between the two
    /// phases keeps the session alive.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let max_idle = self.inner.config.effective_max_lifetime();

        let candidates = self.idle_candidates(now, max_idle);
        if candidates.is_empty() {
            trace!("Sweep found no idle sessions");
            return 0;
        }

        self.evict_idle(candidates, now, max_idle)
    }

    /// First sweep phase: ids idle longer than `max_idle`, under the read lock.
    fn idle_candidates(&self, now: Instant, max_idle: Duration) -> Vec<String> {
        let table = self.inner.table.read();
        table
            .iter()
            .filter(|(_, session)| session.idle_for(now) > max_idle)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Second sweep phase: remove the candidates that are still idle.
    fn evict_idle(&self, candidates: Vec<String>, now: Instant, max_idle: Duration) -> usize {
        let mut table = self.inner.table.write();
        let mut evicted = 0;
        for id in candidates {
            let Some(session) = table.get(&id).cloned() else {
                continue;
            };
            if session.evict_if_idle(now, max_idle, || {
                table.remove(&id);
            }) {
                debug!(session_id = %id, "Evicted idle session");
                evicted += 1;
            }
        }

        if evicted > 0 {
            info!(evicted, remaining = table.len(), "Swept idle sessions");
        }

        evicted
    }

    /// Find `id` and touch it if auto-refresh is on, all under the read lock.
    fn lookup_and_touch(&self, id: &str) -> Option<Arc<Session<K, V>>> {
        let table = self.inner.table.read();
        let session = table.get(id)?;
        if self.inner.config.auto_refresh {
            session.touch();
        }
        trace!(session_id = %id, "Session found");
        Some(Arc::clone(session))
    }
}

impl<K, V> Clone for SessionRegistry<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> std::fmt::Debug for SessionRegistry<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("count", &self.inner.table.read().len())
            .field("config", &self.inner.config)
            .finish()
    }
}
