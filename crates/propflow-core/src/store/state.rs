// ── Generic reactive store state ──
//
// Watch-broadcast list snapshots with a keyed detail cache. Every list
// mutation rebuilds the snapshot subscribers receive; detail lookups
// are keyed by id so concurrent screens never clobber each other.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use propflow_api::types::EntityId;

pub(crate) struct StoreState<T, F, S> {
    /// Full list snapshot, replaced wholesale on fetch and rebuilt on
    /// every mutation.
    list: watch::Sender<Arc<Vec<Arc<T>>>>,

    /// Keyed detail cache: id -> entity. Populated by fetch_by_id only.
    current: DashMap<EntityId, Arc<T>>,

    /// Active filter set. Mutating it never triggers a fetch.
    filters: RwLock<F>,

    loading: watch::Sender<bool>,
    error: watch::Sender<Option<String>>,
    statistics: watch::Sender<S>,

    /// Fetch epoch: each fetch_list claims the next value; a response is
    /// applied only while its epoch is still the latest.
    epoch: AtomicU64,

    /// Store-lifetime cancellation; a cancelled store drops late responses.
    cancel: CancellationToken,
}

impl<T, F, S> StoreState<T, F, S>
where
    T: Send + Sync + 'static,
    F: Clone + Default,
    S: Clone + Default + Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        let (list, _) = watch::channel(Arc::new(Vec::new()));
        let (loading, _) = watch::channel(false);
        let (error, _) = watch::channel(None);
        let (statistics, _) = watch::channel(S::default());

        Self {
            list,
            current: DashMap::new(),
            filters: RwLock::new(F::default()),
            loading,
            error,
            statistics,
            epoch: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        }
    }

    // ── List ─────────────────────────────────────────────────────────

    pub(crate) fn list(&self) -> Arc<Vec<Arc<T>>> {
        self.list.borrow().clone()
    }

    pub(crate) fn subscribe_list(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.list.subscribe()
    }

    /// Replace the list wholesale (fetch_list success path).
    pub(crate) fn replace_list(&self, items: Vec<T>) -> Arc<Vec<Arc<T>>> {
        let snapshot: Arc<Vec<Arc<T>>> = Arc::new(items.into_iter().map(Arc::new).collect());
        self.list.send_modify(|snap| *snap = Arc::clone(&snapshot));
        snapshot
    }

    /// Append a freshly created entity to the list.
    ///
    /// This leaves the list locally out of sync with server-side sort
    /// order and filters; display-critical orderings must refetch.
    pub(crate) fn push(&self, entity: Arc<T>) {
        self.list.send_modify(|snap| {
            let mut items: Vec<Arc<T>> = snap.as_ref().clone();
            items.push(entity);
            *snap = Arc::new(items);
        });
    }

    /// Replace the element with the same id, or insert the server's
    /// representation if no element matches.
    pub(crate) fn upsert(&self, id: EntityId, entity: Arc<T>, id_of: impl Fn(&T) -> EntityId) {
        self.list.send_modify(|snap| {
            let mut items: Vec<Arc<T>> = snap.as_ref().clone();
            match items.iter_mut().find(|e| id_of(e) == id) {
                Some(slot) => *slot = Arc::clone(&entity),
                None => items.push(Arc::clone(&entity)),
            }
            *snap = Arc::new(items);
        });
    }

    pub(crate) fn remove(&self, id: EntityId, id_of: impl Fn(&T) -> EntityId) {
        self.list.send_modify(|snap| {
            let items: Vec<Arc<T>> = snap
                .as_ref()
                .iter()
                .filter(|e| id_of(e) != id)
                .cloned()
                .collect();
            *snap = Arc::new(items);
        });
        self.current.remove(&id);
    }

    // ── Keyed detail cache ───────────────────────────────────────────

    pub(crate) fn detail(&self, id: EntityId) -> Option<Arc<T>> {
        self.current.get(&id).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn store_detail(&self, id: EntityId, entity: Arc<T>) {
        self.current.insert(id, entity);
    }

    /// Refresh the detail entry only if a screen already holds it.
    pub(crate) fn refresh_detail(&self, id: EntityId, entity: &Arc<T>) {
        if self.current.contains_key(&id) {
            self.current.insert(id, Arc::clone(entity));
        }
    }

    // ── Filters ──────────────────────────────────────────────────────

    pub(crate) fn filters(&self) -> F {
        self.filters
            .read()
            .map_or_else(|e| e.into_inner().clone(), |g| g.clone())
    }

    pub(crate) fn set_filters(&self, mutate: impl FnOnce(&mut F)) {
        match self.filters.write() {
            Ok(mut guard) => mutate(&mut guard),
            Err(mut poisoned) => mutate(poisoned.get_mut()),
        }
    }

    pub(crate) fn clear_filters(&self) {
        self.set_filters(|f| *f = F::default());
    }

    // ── Flags ────────────────────────────────────────────────────────

    pub(crate) fn loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub(crate) fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub(crate) fn set_loading(&self, value: bool) {
        self.loading.send_modify(|v| *v = value);
    }

    pub(crate) fn error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    pub(crate) fn subscribe_error(&self) -> watch::Receiver<Option<String>> {
        self.error.subscribe()
    }

    pub(crate) fn set_error(&self, value: Option<String>) {
        self.error.send_modify(|v| *v = value);
    }

    // ── Statistics ───────────────────────────────────────────────────

    pub(crate) fn statistics(&self) -> S {
        self.statistics.borrow().clone()
    }

    pub(crate) fn subscribe_statistics(&self) -> watch::Receiver<S> {
        self.statistics.subscribe()
    }

    pub(crate) fn set_statistics(&self, value: S) {
        self.statistics.send_modify(|v| *v = value);
    }

    // ── Epoch guard ──────────────────────────────────────────────────

    /// Claim the next fetch epoch.
    pub(crate) fn begin_fetch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether the given epoch is still the latest claimant.
    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }

    // ── Cancellation ─────────────────────────────────────────────────

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
