// ── Generic entity store ──
//
// One store contract for all eight transactional entities: a reactive
// list cache, a keyed detail cache, a filter set, loading/error flags,
// and statistics derived from the in-memory list. Per-entity behavior
// plugs in through `EntityResource`.

mod resources;
mod state;

pub use resources::{
    AgreementResource, AgreementStats, AgreementStore, AllotmentResource, AllotmentStore,
    BookingResource, BookingStats, BookingStore, BrokerResource, BrokerStore, ChequePageInfo,
    ChequeResource, ChequeStore, PaymentQueryResource, PaymentQueryStore, PaymentRaiseResource,
    PaymentRaiseStore, PlcResource, PlcStore, Stores,
};

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use propflow_api::types::EntityId;

use crate::error::CoreError;
use state::StoreState;

/// Per-entity plumbing for the generic [`EntityStore`].
///
/// Implementations wrap the gateway client and translate wire errors
/// into [`CoreError`]. Statistics default to `()` for entities without
/// derived counts.
pub trait EntityResource: Send + Sync {
    type Entity: Send + Sync + 'static;
    type Filters: Clone + Default + Send + Sync;
    type CreateInput: Send + Sync;
    type UpdateInput: Send + Sync;
    type Stats: Clone + Default + Send + Sync + 'static;

    fn id_of(entity: &Self::Entity) -> EntityId;

    /// Recompute statistics from the in-memory list.
    ///
    /// Runs on every successful `fetch_list`, over whatever that fetch
    /// returned -- a filtered fetch yields filtered counts. Entities
    /// with an authoritative aggregate endpoint expose it separately.
    fn recompute_stats(_list: &[Arc<Self::Entity>]) -> Self::Stats {
        Self::Stats::default()
    }

    fn list(
        &self,
        filters: &Self::Filters,
    ) -> impl Future<Output = Result<Vec<Self::Entity>, CoreError>> + Send;

    fn fetch(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<Self::Entity, CoreError>> + Send;

    fn create(
        &self,
        input: &Self::CreateInput,
    ) -> impl Future<Output = Result<Self::Entity, CoreError>> + Send;

    fn update(
        &self,
        id: EntityId,
        input: &Self::UpdateInput,
    ) -> impl Future<Output = Result<Self::Entity, CoreError>> + Send;

    fn delete(&self, id: EntityId) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Reactive cache for one entity type.
///
/// All operations are async and non-blocking; list snapshots, loading,
/// error, and statistics are broadcast through `watch` channels so
/// screens can subscribe. Operations both return their `Result` and
/// record failures in the `error` state -- nothing here is fatal.
pub struct EntityStore<R: EntityResource> {
    resource: R,
    state: StoreState<R::Entity, R::Filters, R::Stats>,
}

impl<R: EntityResource> EntityStore<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            state: StoreState::new(),
        }
    }

    pub(crate) fn resource(&self) -> &R {
        &self.resource
    }

    // ── Snapshots & subscriptions ────────────────────────────────────

    /// Current list snapshot (cheap `Arc` clone).
    pub fn list(&self) -> Arc<Vec<Arc<R::Entity>>> {
        self.state.list()
    }

    pub fn subscribe_list(&self) -> watch::Receiver<Arc<Vec<Arc<R::Entity>>>> {
        self.state.subscribe_list()
    }

    /// Detail-cache lookup. Populated by [`fetch_by_id`](Self::fetch_by_id);
    /// keyed by id so concurrent detail screens don't clobber each other.
    pub fn detail(&self, id: EntityId) -> Option<Arc<R::Entity>> {
        self.state.detail(id)
    }

    pub fn loading(&self) -> bool {
        self.state.loading()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.state.subscribe_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.state.error()
    }

    pub fn subscribe_error(&self) -> watch::Receiver<Option<String>> {
        self.state.subscribe_error()
    }

    pub fn statistics(&self) -> R::Stats {
        self.state.statistics()
    }

    pub fn subscribe_statistics(&self) -> watch::Receiver<R::Stats> {
        self.state.subscribe_statistics()
    }

    // ── Filters ──────────────────────────────────────────────────────

    pub fn filters(&self) -> R::Filters {
        self.state.filters()
    }

    /// Merge into the filter set. Does not trigger a fetch -- re-fetching
    /// on filter change is the caller's responsibility.
    pub fn set_filters(&self, mutate: impl FnOnce(&mut R::Filters)) {
        self.state.set_filters(mutate);
    }

    pub fn clear_filters(&self) {
        self.state.clear_filters();
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Tear the store down: in-flight responses arriving after this
    /// point are discarded instead of applied.
    pub fn close(&self) {
        self.state.cancel_token().cancel();
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Fetch the list with the current filters and **replace** the cached
    /// list wholesale on success. Previously loaded items do not survive
    /// a refetch with narrower filters.
    ///
    /// Overlapping calls are resolved by epoch: only the most recent
    /// claimant applies its response; superseded responses are discarded
    /// and the unchanged snapshot is returned.
    pub async fn fetch_list(&self) -> Result<Arc<Vec<Arc<R::Entity>>>, CoreError> {
        let epoch = self.state.begin_fetch();
        self.state.set_loading(true);
        let filters = self.state.filters();

        let result = self.resource.list(&filters).await;

        if self.state.is_cancelled() {
            self.state.set_loading(false);
            return Ok(self.state.list());
        }
        if !self.state.is_current(epoch) {
            // A newer claimant owns the loading flag and clears it itself.
            debug!(epoch, "discarding superseded list response");
            return Ok(self.state.list());
        }
        self.state.set_loading(false);

        match result {
            Ok(items) => {
                let snapshot = self.state.replace_list(items);
                self.state.set_statistics(R::recompute_stats(&snapshot));
                self.state.set_error(None);
                Ok(snapshot)
            }
            Err(e) => {
                // List left untouched on failure.
                warn!(error = %e, "list fetch failed");
                self.state.set_error(Some(e.display_message()));
                Err(e)
            }
        }
    }

    /// Fetch one entity into the keyed detail cache. Never touches the list.
    pub async fn fetch_by_id(&self, id: EntityId) -> Result<Arc<R::Entity>, CoreError> {
        self.state.set_loading(true);
        let result = self.resource.fetch(id).await;
        self.state.set_loading(false);

        if self.state.is_cancelled() {
            return Err(CoreError::OperationFailed {
                message: "store closed".to_owned(),
            });
        }

        match result {
            Ok(entity) => {
                let entity = Arc::new(entity);
                self.state.store_detail(id, Arc::clone(&entity));
                self.state.set_error(None);
                Ok(entity)
            }
            Err(e) => {
                self.state.set_error(Some(e.display_message()));
                Err(e)
            }
        }
    }

    /// Create an entity and append the **server-returned** representation
    /// to the list (never the submitted payload).
    ///
    /// The list is then locally out of sync with server-side sort order
    /// and filters; screens that need display-critical ordering must
    /// refetch.
    pub async fn create(&self, input: &R::CreateInput) -> Result<Arc<R::Entity>, CoreError> {
        self.state.set_loading(true);
        let result = self.resource.create(input).await;
        self.state.set_loading(false);

        match result {
            Ok(entity) => {
                let entity = Arc::new(entity);
                self.state.push(Arc::clone(&entity));
                self.state.set_error(None);
                Ok(entity)
            }
            Err(e) => {
                self.state.set_error(Some(e.display_message()));
                Err(e)
            }
        }
    }

    /// Update an entity from the server-returned representation,
    /// replacing it in the list by primary key. An id missing from the
    /// list is upserted rather than silently dropped.
    pub async fn update(
        &self,
        id: EntityId,
        input: &R::UpdateInput,
    ) -> Result<Arc<R::Entity>, CoreError> {
        self.state.set_loading(true);
        let result = self.resource.update(id, input).await;
        self.state.set_loading(false);

        match result {
            Ok(entity) => {
                let entity = Arc::new(entity);
                self.apply_replacement(id, &entity);
                self.state.set_error(None);
                Ok(entity)
            }
            Err(e) => {
                self.state.set_error(Some(e.display_message()));
                Err(e)
            }
        }
    }

    /// Delete an entity, removing it from the list and detail cache.
    pub async fn delete(&self, id: EntityId) -> Result<(), CoreError> {
        self.state.set_loading(true);
        let result = self.resource.delete(id).await;
        self.state.set_loading(false);

        match result {
            Ok(()) => {
                self.state.remove(id, R::id_of);
                self.state.set_error(None);
                Ok(())
            }
            Err(e) => {
                self.state.set_error(Some(e.display_message()));
                Err(e)
            }
        }
    }

    /// Apply a server-returned entity to both caches (used by update and
    /// the entity-specific status/verify operations).
    pub(crate) fn apply_replacement(&self, id: EntityId, entity: &Arc<R::Entity>) {
        self.state.upsert(id, Arc::clone(entity), R::id_of);
        self.state.refresh_detail(id, entity);
    }

    /// Record a statistics value computed outside the list path (e.g.
    /// from a dedicated aggregate endpoint).
    pub(crate) fn set_statistics(&self, stats: R::Stats) {
        self.state.set_statistics(stats);
    }
}
