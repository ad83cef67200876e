//! In-memory registry of mounted widgets.
//!
//! Each page load mounts one widget, identified by UUID. Widgets live only
//! in process memory. They are gone when the page unmounts them, when they
//! sit idle past the configured timeout, when the store is full and they
//! are the least recently used, or when the server stops.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use faq_chat_widget::client::HttpQueryClient;
//! use faq_chat_widget::store::WidgetStore;
//!
//! let client = Arc::new(HttpQueryClient::new("http://127.0.0.1:3000/query/").unwrap());
//! let store = WidgetStore::new(client);
//! let (id, widget) = store.create();
//!
//! widget.toggle();
//! assert!(store.get(id).unwrap().snapshot().is_open());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::client::QueryClient;
use crate::widget::WidgetHandle;

/// Widgets kept at once unless configured otherwise.
pub const DEFAULT_MAX_WIDGETS: usize = 1000;

/// Idle time after which a widget is evicted unless configured otherwise.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Bounds on how many widgets are kept and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    /// Most widgets kept at once. Mounting past this evicts the least
    /// recently used one.
    pub max_widgets: usize,
    /// Widgets untouched for this long are evicted.
    pub idle_timeout: Duration,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_widgets: DEFAULT_MAX_WIDGETS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// Thread-safe store for widget instances.
#[derive(Clone)]
pub struct WidgetStore {
    inner: Arc<WidgetStoreInner>,
}

struct WidgetStoreInner {
    widgets: RwLock<HashMap<Uuid, Mounted>>,
    client: Arc<dyn QueryClient>,
    limits: StoreLimits,
}

struct Mounted {
    widget: WidgetHandle,
    last_activity: Instant,
}

impl std::fmt::Debug for WidgetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetStore")
            .field("len", &self.len())
            .field("limits", &self.inner.limits)
            .finish_non_exhaustive()
    }
}

impl WidgetStore {
    /// Create an empty store whose widgets ask questions through `client`.
    pub fn new(client: Arc<dyn QueryClient>) -> Self {
        Self::with_limits(client, StoreLimits::default())
    }

    /// Create an empty store with explicit eviction bounds.
    pub fn with_limits(client: Arc<dyn QueryClient>, limits: StoreLimits) -> Self {
        Self {
            inner: Arc::new(WidgetStoreInner {
                widgets: RwLock::new(HashMap::new()),
                client,
                limits,
            }),
        }
    }

    /// The store's eviction bounds.
    #[must_use]
    pub fn limits(&self) -> StoreLimits {
        self.inner.limits
    }

    /// Mount a new closed, empty widget.
    ///
    /// Idle widgets are dropped first; if the store is still full, the least
    /// recently used widget makes room.
    pub fn create(&self) -> (Uuid, WidgetHandle) {
        let id = Uuid::new_v4();
        let widget = WidgetHandle::new(Arc::clone(&self.inner.client));
        let now = Instant::now();

        let mut guard = self
            .inner
            .widgets
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let idle = evict_idle(&mut guard, now, self.inner.limits.idle_timeout);
        let mut crowded = 0;
        while guard.len() >= self.inner.limits.max_widgets.max(1) {
            let Some(oldest) = guard
                .iter()
                .min_by_key(|(_, mounted)| mounted.last_activity)
                .map(|(id, _)| *id)
            else {
                break;
            };
            guard.remove(&oldest);
            crowded += 1;
        }
        guard.insert(
            id,
            Mounted {
                widget: widget.clone(),
                last_activity: now,
            },
        );
        drop(guard);

        if idle + crowded > 0 {
            tracing::info!(name: "widget.evicted", idle, crowded, "Widgets evicted");
        }
        tracing::info!(name: "widget.created", widget_id = %id, "Widget mounted");
        (id, widget)
    }

    /// Get a widget by ID and mark it as recently used.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<WidgetHandle> {
        let mut guard = self
            .inner
            .widgets
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mounted = guard.get_mut(&id)?;
        mounted.last_activity = Instant::now();
        Some(mounted.widget.clone())
    }

    /// Unmount a widget. Outstanding requests still settle into the removed
    /// handle and are then dropped with it.
    pub fn remove(&self, id: Uuid) -> Option<WidgetHandle> {
        let removed = self
            .inner
            .widgets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .map(|mounted| mounted.widget);
        if removed.is_some() {
            tracing::info!(name: "widget.removed", widget_id = %id, "Widget unmounted");
        }
        removed
    }

    /// Remove widgets idle longer than the configured timeout.
    ///
    /// Returns the number of widgets removed.
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_with_timeout(self.inner.limits.idle_timeout)
    }

    /// Remove widgets that have been idle at least `timeout`.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self
            .inner
            .widgets
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        evict_idle(&mut guard, Instant::now(), timeout)
    }

    /// Periodically drop idle widgets, every `period`.
    ///
    /// The task runs until aborted.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        let period = period.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let removed = store.cleanup_expired();
                if removed > 0 {
                    tracing::info!(
                        name: "widget.evicted",
                        idle = removed,
                        crowded = 0,
                        "Widgets evicted"
                    );
                }
            }
        })
    }

    /// Get the number of mounted widgets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .widgets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if no widgets are mounted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn evict_idle(widgets: &mut HashMap<Uuid, Mounted>, now: Instant, timeout: Duration) -> usize {
    let before = widgets.len();
    widgets.retain(|_, mounted| now.duration_since(mounted.last_activity) < timeout);
    before - widgets.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::QueryResponse;
    use crate::error::Result;
    use async_trait::async_trait;

    struct NoAnswer;

    #[async_trait]
    impl QueryClient for NoAnswer {
        async fn ask(&self, _question: &str) -> Result<QueryResponse> {
            Ok(QueryResponse::default())
        }
    }

    #[test]
    fn test_widget_store() {
        let store = WidgetStore::new(Arc::new(NoAnswer));
        assert!(store.is_empty());

        let (id, widget) = store.create();
        assert_eq!(store.len(), 1);

        widget.toggle();
        let retrieved = store.get(id).unwrap();
        assert!(retrieved.snapshot().is_open());

        store.remove(id);
        assert!(store.is_empty());
        assert!(store.get(id).is_none());
    }

    fn limited(max_widgets: usize, idle_secs: u64) -> WidgetStore {
        WidgetStore::with_limits(
            Arc::new(NoAnswer),
            StoreLimits {
                max_widgets,
                idle_timeout: Duration::from_secs(idle_secs),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_stays_bounded() {
        let store = limited(3, 3600);
        let mut ids = Vec::new();
        for _ in 0..10 {
            ids.push(store.create().0);
            tokio::time::advance(Duration::from_millis(10)).await;
        }

        assert_eq!(store.len(), 3);
        assert!(store.get(ids[0]).is_none());
        for id in &ids[7..] {
            assert!(store.get(*id).is_some());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_marks_widget_recently_used() {
        let store = limited(2, 3600);
        let (a, _) = store.create();
        tokio::time::advance(Duration::from_secs(1)).await;
        let (b, _) = store.create();
        tokio::time::advance(Duration::from_secs(1)).await;

        assert!(store.get(a).is_some());
        tokio::time::advance(Duration::from_secs(1)).await;
        let (c, _) = store.create();

        assert!(store.get(a).is_some());
        assert!(store.get(b).is_none());
        assert!(store.get(c).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_widgets_are_evicted() {
        let store = limited(10, 60);
        let (stale, _) = store.create();
        tokio::time::advance(Duration::from_secs(45)).await;
        let (fresh, _) = store.create();
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(store.cleanup_expired(), 1);
        assert!(store.get(stale).is_none());
        assert!(store.get(fresh).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_drops_idle_widgets() {
        let store = limited(10, 60);
        store.create();
        store.create();
        tokio::time::advance(Duration::from_secs(61)).await;

        store.create();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_drops_idle_widgets() {
        let store = limited(10, 10);
        let sweeper = store.spawn_sweeper(Duration::from_secs(5));
        store.create();

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(store.is_empty());
        sweeper.abort();
    }

    #[test]
    fn test_widgets_are_independent() {
        let store = WidgetStore::new(Arc::new(NoAnswer));
        let (_, a) = store.create();
        let (_, b) = store.create();

        a.toggle();
        assert!(a.snapshot().is_open());
        assert!(!b.snapshot().is_open());
    }
}
