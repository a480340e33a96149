// ── Per-entity resources ──
//
// One `EntityResource` impl per transactional entity, each a thin
// adapter from the generic store contract onto the gateway client,
// plus the entity-specific operations (status transitions, letter and
// usage lookups, verification, bulk triggers) as inherent methods on
// the concrete store aliases.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use propflow_api::GatewayClient;
use propflow_api::types::{
    Agreement, AgreementFilters, AgreementStatistics, AgreementStatus, Allotment,
    AllotmentFilters, AllotmentLetter, Booking, BookingFilters, BookingStatus, Broker,
    BrokerUsage, BulkRunSummary, Cheque, ChequeFilters, CreateAgreementRequest,
    CreateAllotmentRequest, CreateBookingRequest, CreateBrokerRequest, CreateChequeRequest,
    CreatePaymentQueryRequest, CreatePaymentRaiseRequest, CreatePlcRequest, EntityId,
    PaymentFilters, PaymentQuery, PaymentRaise, PaymentRaiseStatus, Plc, UpdateAgreementRequest,
    UpdateAllotmentRequest, UpdateBookingRequest, UpdateBrokerRequest, UpdateChequeRequest,
    UpdatePaymentQueryRequest, UpdatePaymentRaiseRequest, UpdatePlcRequest,
};

use crate::error::CoreError;
use crate::store::{EntityResource, EntityStore};
use crate::transition::{StatusTransitions, VerificationForm};

// ── Derived statistics ───────────────────────────────────────────────

/// Booking counts derived from the store's in-memory list.
///
/// Computed over whatever the last fetch returned: with a status filter
/// active the counts describe the filtered subset, not the collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingStats {
    pub total: u64,
    pub pending: u64,
    pub confirmed: u64,
    pub cancelled: u64,
}

/// Agreement counts derived from the store's in-memory list. The
/// server-side aggregate ([`AgreementStore::fetch_statistics`]) is the
/// authoritative, filter-independent counterpart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgreementStats {
    pub total: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub verified: u64,
}

impl From<AgreementStatistics> for AgreementStats {
    fn from(s: AgreementStatistics) -> Self {
        Self {
            total: s.total,
            pending: s.pending,
            in_progress: s.in_progress,
            completed: s.completed,
            verified: s.verified,
        }
    }
}

/// Wire pagination metadata from the last cheque listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChequePageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

// ── Bookings ─────────────────────────────────────────────────────────

pub struct BookingResource {
    client: Arc<GatewayClient>,
}

impl EntityResource for BookingResource {
    type Entity = Booking;
    type Filters = BookingFilters;
    type CreateInput = CreateBookingRequest;
    type UpdateInput = UpdateBookingRequest;
    type Stats = BookingStats;

    fn id_of(entity: &Booking) -> EntityId {
        entity.id
    }

    fn recompute_stats(list: &[Arc<Booking>]) -> BookingStats {
        let mut stats = BookingStats {
            total: list.len() as u64,
            ..BookingStats::default()
        };
        for booking in list {
            match booking.status {
                BookingStatus::Pending => stats.pending += 1,
                BookingStatus::Confirmed => stats.confirmed += 1,
                BookingStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }

    async fn list(&self, filters: &BookingFilters) -> Result<Vec<Booking>, CoreError> {
        Ok(self.client.list_bookings(filters).await?)
    }

    async fn fetch(&self, id: EntityId) -> Result<Booking, CoreError> {
        Ok(self.client.get_booking(id).await?)
    }

    async fn create(&self, input: &CreateBookingRequest) -> Result<Booking, CoreError> {
        Ok(self.client.create_booking(input).await?)
    }

    async fn update(&self, id: EntityId, input: &UpdateBookingRequest) -> Result<Booking, CoreError> {
        Ok(self.client.update_booking(id, input).await?)
    }

    async fn delete(&self, id: EntityId) -> Result<(), CoreError> {
        Ok(self.client.delete_booking(id).await?)
    }
}

pub type BookingStore = EntityStore<BookingResource>;

impl BookingStore {
    fn known_status(&self, id: EntityId) -> Option<BookingStatus> {
        self.detail(id)
            .map(|b| b.status)
            .or_else(|| self.list().iter().find(|b| b.id == id).map(|b| b.status))
    }

    /// Move a booking to `target`, gated by the transition graph when
    /// the current status is cached. Unknown current status defers to
    /// the server's own validation.
    pub async fn set_status(
        &self,
        id: EntityId,
        target: BookingStatus,
    ) -> Result<Arc<Booking>, CoreError> {
        if let Some(current) = self.known_status(id)
            && !current.can_transition_to(target)
        {
            return Err(CoreError::Validation {
                message: format!("Cannot move booking from {current} to {target}"),
                field: Some("status".to_owned()),
            });
        }

        let booking = Arc::new(self.resource().client.set_booking_status(id, target).await?);
        self.apply_replacement(id, &booking);
        Ok(booking)
    }
}

// ── Allotments ───────────────────────────────────────────────────────

pub struct AllotmentResource {
    client: Arc<GatewayClient>,
}

impl EntityResource for AllotmentResource {
    type Entity = Allotment;
    type Filters = AllotmentFilters;
    type CreateInput = CreateAllotmentRequest;
    type UpdateInput = UpdateAllotmentRequest;
    type Stats = ();

    fn id_of(entity: &Allotment) -> EntityId {
        entity.id
    }

    async fn list(&self, filters: &AllotmentFilters) -> Result<Vec<Allotment>, CoreError> {
        Ok(self.client.list_allotments(filters).await?)
    }

    async fn fetch(&self, id: EntityId) -> Result<Allotment, CoreError> {
        Ok(self.client.get_allotment(id).await?)
    }

    async fn create(&self, input: &CreateAllotmentRequest) -> Result<Allotment, CoreError> {
        Ok(self.client.create_allotment(input).await?)
    }

    async fn update(
        &self,
        id: EntityId,
        input: &UpdateAllotmentRequest,
    ) -> Result<Allotment, CoreError> {
        Ok(self.client.update_allotment(id, input).await?)
    }

    async fn delete(&self, id: EntityId) -> Result<(), CoreError> {
        Ok(self.client.delete_allotment(id).await?)
    }
}

pub type AllotmentStore = EntityStore<AllotmentResource>;

impl AllotmentStore {
    /// Fetch the generated letter. `Ok(None)` means the back office has
    /// not generated one yet; screens offer a remediation action instead
    /// of showing an error.
    pub async fn fetch_letter(&self, id: EntityId) -> Result<Option<AllotmentLetter>, CoreError> {
        Ok(self.resource().client.get_allotment_letter(id).await?)
    }
}

// ── Agreements (BBA) ─────────────────────────────────────────────────

pub struct AgreementResource {
    client: Arc<GatewayClient>,
}

impl EntityResource for AgreementResource {
    type Entity = Agreement;
    type Filters = AgreementFilters;
    type CreateInput = CreateAgreementRequest;
    type UpdateInput = UpdateAgreementRequest;
    type Stats = AgreementStats;

    fn id_of(entity: &Agreement) -> EntityId {
        entity.id
    }

    fn recompute_stats(list: &[Arc<Agreement>]) -> AgreementStats {
        let mut stats = AgreementStats {
            total: list.len() as u64,
            ..AgreementStats::default()
        };
        for agreement in list {
            match agreement.status {
                AgreementStatus::Pending => stats.pending += 1,
                AgreementStatus::InProgress => stats.in_progress += 1,
                AgreementStatus::Completed => stats.completed += 1,
            }
            if agreement.is_verified {
                stats.verified += 1;
            }
        }
        stats
    }

    async fn list(&self, filters: &AgreementFilters) -> Result<Vec<Agreement>, CoreError> {
        Ok(self.client.list_agreements(filters).await?)
    }

    async fn fetch(&self, id: EntityId) -> Result<Agreement, CoreError> {
        Ok(self.client.get_agreement(id).await?)
    }

    async fn create(&self, input: &CreateAgreementRequest) -> Result<Agreement, CoreError> {
        Ok(self.client.create_agreement(input).await?)
    }

    async fn update(
        &self,
        id: EntityId,
        input: &UpdateAgreementRequest,
    ) -> Result<Agreement, CoreError> {
        Ok(self.client.update_agreement(id, input).await?)
    }

    async fn delete(&self, id: EntityId) -> Result<(), CoreError> {
        Ok(self.client.delete_agreement(id).await?)
    }
}

pub type AgreementStore = EntityStore<AgreementResource>;

impl AgreementStore {
    fn known_status(&self, id: EntityId) -> Option<AgreementStatus> {
        self.detail(id)
            .map(|a| a.status)
            .or_else(|| self.list().iter().find(|a| a.id == id).map(|a| a.status))
    }

    /// Move an agreement between drafting statuses. The graph is
    /// permissive (any other status is reachable); only self-transitions
    /// are rejected client-side.
    pub async fn set_status(
        &self,
        id: EntityId,
        target: AgreementStatus,
    ) -> Result<Arc<Agreement>, CoreError> {
        if let Some(current) = self.known_status(id)
            && !current.can_transition_to(target)
        {
            return Err(CoreError::Validation {
                message: format!("Agreement is already {target}"),
                field: Some("status".to_owned()),
            });
        }

        let agreement = Arc::new(self.resource().client.set_agreement_status(id, target).await?);
        self.apply_replacement(id, &agreement);
        Ok(agreement)
    }

    /// Verify an agreement. No request leaves the client unless the
    /// form is complete: confirmation checked, verifier and notes
    /// non-blank.
    pub async fn verify(
        &self,
        id: EntityId,
        form: &VerificationForm,
    ) -> Result<Arc<Agreement>, CoreError> {
        let Some(request) = form.request() else {
            return Err(CoreError::Validation {
                message: "Verification requires confirmation, a verifier name, and notes"
                    .to_owned(),
                field: None,
            });
        };

        let agreement = Arc::new(self.resource().client.verify_agreement(id, &request).await?);
        self.apply_replacement(id, &agreement);
        Ok(agreement)
    }

    /// Trigger server-side bulk verification. Returns totals only;
    /// callers refetch the list to observe which records changed.
    pub async fn auto_verify(&self) -> Result<BulkRunSummary, CoreError> {
        let summary = self.resource().client.auto_verify_agreements().await?;
        info!(
            processed = summary.processed,
            updated = summary.updated,
            "auto-verify run complete"
        );
        Ok(summary)
    }

    pub async fn auto_status_update(&self) -> Result<BulkRunSummary, CoreError> {
        let summary = self
            .resource()
            .client
            .auto_update_agreement_statuses()
            .await?;
        info!(
            processed = summary.processed,
            updated = summary.updated,
            "auto-status-update run complete"
        );
        Ok(summary)
    }

    /// Replace the derived statistics with the server-side aggregate,
    /// which counts the whole collection regardless of list filters.
    /// A subsequent `fetch_list` recomputes from the list again.
    pub async fn fetch_statistics(&self) -> Result<AgreementStats, CoreError> {
        let stats: AgreementStats = self
            .resource()
            .client
            .get_agreement_statistics()
            .await?
            .into();
        self.set_statistics(stats);
        Ok(stats)
    }
}

// ── Brokers ──────────────────────────────────────────────────────────

pub struct BrokerResource {
    client: Arc<GatewayClient>,
}

impl EntityResource for BrokerResource {
    type Entity = Broker;
    type Filters = ();
    type CreateInput = CreateBrokerRequest;
    type UpdateInput = UpdateBrokerRequest;
    type Stats = ();

    fn id_of(entity: &Broker) -> EntityId {
        entity.id
    }

    async fn list(&self, _filters: &()) -> Result<Vec<Broker>, CoreError> {
        Ok(self.client.list_brokers().await?)
    }

    async fn fetch(&self, id: EntityId) -> Result<Broker, CoreError> {
        Ok(self.client.get_broker(id).await?)
    }

    async fn create(&self, input: &CreateBrokerRequest) -> Result<Broker, CoreError> {
        Ok(self.client.create_broker(input).await?)
    }

    async fn update(&self, id: EntityId, input: &UpdateBrokerRequest) -> Result<Broker, CoreError> {
        Ok(self.client.update_broker(id, input).await?)
    }

    async fn delete(&self, id: EntityId) -> Result<(), CoreError> {
        Ok(self.client.delete_broker(id).await?)
    }
}

pub type BrokerStore = EntityStore<BrokerResource>;

impl BrokerStore {
    /// Aggregate usage counters, consulted before offering deletion.
    pub async fn fetch_usage(&self, id: EntityId) -> Result<BrokerUsage, CoreError> {
        Ok(self.resource().client.get_broker_usage(id).await?)
    }
}

// ── PLCs ─────────────────────────────────────────────────────────────

pub struct PlcResource {
    client: Arc<GatewayClient>,
}

impl EntityResource for PlcResource {
    type Entity = Plc;
    type Filters = ();
    type CreateInput = CreatePlcRequest;
    type UpdateInput = UpdatePlcRequest;
    type Stats = ();

    fn id_of(entity: &Plc) -> EntityId {
        entity.id
    }

    async fn list(&self, _filters: &()) -> Result<Vec<Plc>, CoreError> {
        Ok(self.client.list_plcs().await?)
    }

    async fn fetch(&self, id: EntityId) -> Result<Plc, CoreError> {
        Ok(self.client.get_plc(id).await?)
    }

    async fn create(&self, input: &CreatePlcRequest) -> Result<Plc, CoreError> {
        Ok(self.client.create_plc(input).await?)
    }

    async fn update(&self, id: EntityId, input: &UpdatePlcRequest) -> Result<Plc, CoreError> {
        Ok(self.client.update_plc(id, input).await?)
    }

    async fn delete(&self, id: EntityId) -> Result<(), CoreError> {
        Ok(self.client.delete_plc(id).await?)
    }
}

pub type PlcStore = EntityStore<PlcResource>;

// ── Cheques ──────────────────────────────────────────────────────────

/// The cheque listing is the only wire-paginated endpoint; the resource
/// peels the page metadata off into a side channel and feeds the data
/// vector through the generic list path.
pub struct ChequeResource {
    client: Arc<GatewayClient>,
    page_info: watch::Sender<ChequePageInfo>,
}

impl EntityResource for ChequeResource {
    type Entity = Cheque;
    type Filters = ChequeFilters;
    type CreateInput = CreateChequeRequest;
    type UpdateInput = UpdateChequeRequest;
    type Stats = ();

    fn id_of(entity: &Cheque) -> EntityId {
        entity.id
    }

    async fn list(&self, filters: &ChequeFilters) -> Result<Vec<Cheque>, CoreError> {
        let page = self.client.list_cheques(filters).await?;
        self.page_info.send_modify(|info| {
            *info = ChequePageInfo {
                page: page.page,
                limit: page.limit,
                total: page.total,
                total_pages: page.total_pages,
            };
        });
        Ok(page.data)
    }

    async fn fetch(&self, id: EntityId) -> Result<Cheque, CoreError> {
        Ok(self.client.get_cheque(id).await?)
    }

    async fn create(&self, input: &CreateChequeRequest) -> Result<Cheque, CoreError> {
        Ok(self.client.create_cheque(input).await?)
    }

    async fn update(&self, id: EntityId, input: &UpdateChequeRequest) -> Result<Cheque, CoreError> {
        Ok(self.client.update_cheque(id, input).await?)
    }

    async fn delete(&self, id: EntityId) -> Result<(), CoreError> {
        Ok(self.client.delete_cheque(id).await?)
    }
}

pub type ChequeStore = EntityStore<ChequeResource>;

impl ChequeStore {
    /// Pagination metadata from the last successful listing.
    pub fn page_info(&self) -> ChequePageInfo {
        *self.resource().page_info.borrow()
    }

    pub fn subscribe_page_info(&self) -> watch::Receiver<ChequePageInfo> {
        self.resource().page_info.subscribe()
    }

    /// Set the requested page and fetch it.
    pub async fn fetch_page(&self, page: u32) -> Result<Arc<Vec<Arc<Cheque>>>, CoreError> {
        self.set_filters(|f| f.page = Some(page));
        self.fetch_list().await
    }
}

// ── Payment queries ──────────────────────────────────────────────────

pub struct PaymentQueryResource {
    client: Arc<GatewayClient>,
}

impl EntityResource for PaymentQueryResource {
    type Entity = PaymentQuery;
    type Filters = PaymentFilters;
    type CreateInput = CreatePaymentQueryRequest;
    type UpdateInput = UpdatePaymentQueryRequest;
    type Stats = ();

    fn id_of(entity: &PaymentQuery) -> EntityId {
        entity.id
    }

    async fn list(&self, filters: &PaymentFilters) -> Result<Vec<PaymentQuery>, CoreError> {
        Ok(self.client.list_payment_queries(filters).await?)
    }

    async fn fetch(&self, id: EntityId) -> Result<PaymentQuery, CoreError> {
        Ok(self.client.get_payment_query(id).await?)
    }

    async fn create(&self, input: &CreatePaymentQueryRequest) -> Result<PaymentQuery, CoreError> {
        Ok(self.client.create_payment_query(input).await?)
    }

    async fn update(
        &self,
        id: EntityId,
        input: &UpdatePaymentQueryRequest,
    ) -> Result<PaymentQuery, CoreError> {
        Ok(self.client.update_payment_query(id, input).await?)
    }

    async fn delete(&self, id: EntityId) -> Result<(), CoreError> {
        Ok(self.client.delete_payment_query(id).await?)
    }
}

pub type PaymentQueryStore = EntityStore<PaymentQueryResource>;

// ── Payment raises ───────────────────────────────────────────────────

pub struct PaymentRaiseResource {
    client: Arc<GatewayClient>,
}

impl EntityResource for PaymentRaiseResource {
    type Entity = PaymentRaise;
    type Filters = PaymentFilters;
    type CreateInput = CreatePaymentRaiseRequest;
    type UpdateInput = UpdatePaymentRaiseRequest;
    type Stats = ();

    fn id_of(entity: &PaymentRaise) -> EntityId {
        entity.id
    }

    async fn list(&self, filters: &PaymentFilters) -> Result<Vec<PaymentRaise>, CoreError> {
        Ok(self.client.list_payment_raises(filters).await?)
    }

    async fn fetch(&self, id: EntityId) -> Result<PaymentRaise, CoreError> {
        Ok(self.client.get_payment_raise(id).await?)
    }

    async fn create(&self, input: &CreatePaymentRaiseRequest) -> Result<PaymentRaise, CoreError> {
        Ok(self.client.create_payment_raise(input).await?)
    }

    async fn update(
        &self,
        id: EntityId,
        input: &UpdatePaymentRaiseRequest,
    ) -> Result<PaymentRaise, CoreError> {
        Ok(self.client.update_payment_raise(id, input).await?)
    }

    async fn delete(&self, id: EntityId) -> Result<(), CoreError> {
        Ok(self.client.delete_payment_raise(id).await?)
    }
}

pub type PaymentRaiseStore = EntityStore<PaymentRaiseResource>;

impl PaymentRaiseStore {
    fn known_status(&self, id: EntityId) -> Option<PaymentRaiseStatus> {
        self.detail(id)
            .map(|r| r.status)
            .or_else(|| self.list().iter().find(|r| r.id == id).map(|r| r.status))
    }

    /// Move a raise along the approval chain: pending splits into
    /// approved or rejected; only approved raises can be marked paid.
    pub async fn set_status(
        &self,
        id: EntityId,
        target: PaymentRaiseStatus,
    ) -> Result<Arc<PaymentRaise>, CoreError> {
        if let Some(current) = self.known_status(id)
            && !current.can_transition_to(target)
        {
            return Err(CoreError::Validation {
                message: format!("Cannot move payment raise from {current} to {target}"),
                field: Some("status".to_owned()),
            });
        }

        let raise = Arc::new(
            self.resource()
                .client
                .set_payment_raise_status(id, target)
                .await?,
        );
        self.apply_replacement(id, &raise);
        Ok(raise)
    }
}

// ── Facade ───────────────────────────────────────────────────────────

/// All eight entity stores over one shared gateway client.
pub struct Stores {
    client: Arc<GatewayClient>,
    pub bookings: BookingStore,
    pub allotments: AllotmentStore,
    pub agreements: AgreementStore,
    pub brokers: BrokerStore,
    pub plcs: PlcStore,
    pub cheques: ChequeStore,
    pub payment_queries: PaymentQueryStore,
    pub payment_raises: PaymentRaiseStore,
}

impl Stores {
    pub fn new(client: Arc<GatewayClient>) -> Self {
        let (page_info, _) = watch::channel(ChequePageInfo::default());
        Self {
            bookings: EntityStore::new(BookingResource {
                client: Arc::clone(&client),
            }),
            allotments: EntityStore::new(AllotmentResource {
                client: Arc::clone(&client),
            }),
            agreements: EntityStore::new(AgreementResource {
                client: Arc::clone(&client),
            }),
            brokers: EntityStore::new(BrokerResource {
                client: Arc::clone(&client),
            }),
            plcs: EntityStore::new(PlcResource {
                client: Arc::clone(&client),
            }),
            cheques: EntityStore::new(ChequeResource {
                client: Arc::clone(&client),
                page_info,
            }),
            payment_queries: EntityStore::new(PaymentQueryResource {
                client: Arc::clone(&client),
            }),
            payment_raises: EntityStore::new(PaymentRaiseResource {
                client: Arc::clone(&client),
            }),
            client,
        }
    }

    /// The shared client, for option-set fetches that bypass the stores.
    pub fn client(&self) -> &Arc<GatewayClient> {
        &self.client
    }

    /// Tear down all stores; late responses are discarded everywhere.
    pub fn close(&self) {
        self.bookings.close();
        self.allotments.close();
        self.agreements.close();
        self.brokers.close();
        self.plcs.close();
        self.cheques.close();
        self.payment_queries.close();
        self.payment_raises.close();
    }
}
