// Wire types for the Propflow back-office API.
//
// These are also the canonical domain types: the backend speaks exactly
// one dialect, so there is no separate conversion layer. `propflow-core`
// re-exports this module as its model.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ── EntityId ────────────────────────────────────────────────────────

/// Canonical identifier for any back-office entity.
///
/// The backend issues numeric ids, but historically clients have sent
/// them back as strings; deserialization tolerates both shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl EntityId {
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EntityId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(i64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(Self(n)),
            Raw::Str(s) => s
                .trim()
                .parse::<i64>()
                .map(Self)
                .map_err(|_| serde::de::Error::custom(format!("invalid entity id: {s:?}"))),
        }
    }
}

// ── Status enums ────────────────────────────────────────────────────

/// Booking lifecycle status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// Agreement (BBA) drafting status. Orthogonal to verification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AgreementStatus {
    Pending,
    InProgress,
    Completed,
}

/// Availability status of a sellable unit (master data).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[non_exhaustive]
pub enum UnitStatus {
    Free,
    Booked,
    Allotted,
    /// Backend statuses this client doesn't model (e.g. "blocked").
    #[serde(untagged)]
    #[strum(to_string = "{0}")]
    Other(String),
}

/// Derived customer availability, exposed by the backend alongside Customer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[non_exhaustive]
pub enum CustomerBookingStatus {
    Available,
    Booked,
    Allotted,
    #[serde(untagged)]
    #[strum(to_string = "{0}")]
    Other(String),
}

/// Payment raise approval status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentRaiseStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

// ── Transaction entities ────────────────────────────────────────────

/// A provisional reservation linking a customer to a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: EntityId,
    pub project_id: EntityId,
    pub customer_id: EntityId,
    pub unit_id: EntityId,
    pub broker_id: EntityId,
    pub payment_plan_id: EntityId,
    pub unit_price: f64,
    pub booking_date: NaiveDate,
    pub status: BookingStatus,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// A confirmed assignment of a unit to a customer.
///
/// Status is free text on the wire (e.g. "active", "cancelled").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allotment {
    pub id: EntityId,
    pub project_id: EntityId,
    pub customer_id: EntityId,
    pub unit_id: EntityId,
    pub allotment_date: NaiveDate,
    pub status: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Generated allotment letter. Absent (404) until the back office runs it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllotmentLetter {
    pub allotment_id: EntityId,
    pub reference_number: String,
    pub content: String,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

/// Buyer's building agreement (BBA) record.
///
/// Verification (`is_verified` and friends) is an independent axis from
/// `status`: an agreement can be completed and unverified, or pending
/// and verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agreement {
    pub id: EntityId,
    pub customer_id: EntityId,
    pub project_id: EntityId,
    pub unit_id: EntityId,
    pub bba_date: NaiveDate,
    pub status: AgreementStatus,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub verified_by: Option<String>,
    #[serde(default)]
    pub verified_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verification_notes: Option<String>,
}

// ── Master data ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub father_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub booking_status: CustomerBookingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: EntityId,
    pub project_id: EntityId,
    pub name: String,
    pub size_sqft: f64,
    pub base_price: f64,
    pub status: UnitStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Broker {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub commission_rate: Option<f64>,
}

/// Aggregate usage counters for a broker, from `GET /master/brokers/:id/usage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerUsage {
    pub broker_id: EntityId,
    pub booking_count: u64,
    pub allotment_count: u64,
    pub total_commission: f64,
}

/// Preferential location charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plc {
    pub id: EntityId,
    pub name: String,
    pub rate: f64,
    #[serde(default)]
    pub description: Option<String>,
}

// ── Payments ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cheque {
    pub id: EntityId,
    pub booking_id: EntityId,
    pub cheque_number: String,
    pub bank_name: String,
    pub amount: f64,
    pub cheque_date: NaiveDate,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentQuery {
    pub id: EntityId,
    pub booking_id: EntityId,
    pub amount: f64,
    pub query_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRaise {
    pub id: EntityId,
    pub booking_id: EntityId,
    pub amount: f64,
    pub raise_date: NaiveDate,
    pub status: PaymentRaiseStatus,
}

// ── Aggregates ──────────────────────────────────────────────────────

/// Server-side agreement statistics, from `GET /api/bba/records/statistics`.
///
/// The authoritative counterpart to the client-side counts the agreement
/// store derives from its (possibly filtered) list.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AgreementStatistics {
    pub total: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub verified: u64,
}

// ── Pagination (cheque listing only) ────────────────────────────────

/// Wire-paginated listing. Only the cheque endpoint carries this shape;
/// every other listing is unpaginated at the wire level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
}

// ── Filters ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilters {
    pub status: Option<BookingStatus>,
    pub project_id: Option<EntityId>,
    pub customer_id: Option<EntityId>,
}

impl BookingFilters {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.to_string()));
        }
        if let Some(id) = self.project_id {
            params.push(("project_id", id.to_string()));
        }
        if let Some(id) = self.customer_id {
            params.push(("customer_id", id.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllotmentFilters {
    pub project_id: Option<EntityId>,
    pub customer_id: Option<EntityId>,
    pub status: Option<String>,
}

impl AllotmentFilters {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(id) = self.project_id {
            params.push(("project_id", id.to_string()));
        }
        if let Some(id) = self.customer_id {
            params.push(("customer_id", id.to_string()));
        }
        if let Some(ref status) = self.status {
            params.push(("status", status.clone()));
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgreementFilters {
    pub status: Option<AgreementStatus>,
    pub customer_id: Option<EntityId>,
    pub project_id: Option<EntityId>,
}

impl AgreementFilters {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.to_string()));
        }
        if let Some(id) = self.customer_id {
            params.push(("customer_id", id.to_string()));
        }
        if let Some(id) = self.project_id {
            params.push(("project_id", id.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChequeFilters {
    pub booking_id: Option<EntityId>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ChequeFilters {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(id) = self.booking_id {
            params.push(("booking_id", id.to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}

/// Booking-scoped filter shared by payment queries and raises.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFilters {
    pub booking_id: Option<EntityId>,
}

impl PaymentFilters {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        self.booking_id
            .map(|id| ("booking_id", id.to_string()))
            .into_iter()
            .collect()
    }
}

// ── Typed request bodies ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub project_id: EntityId,
    pub customer_id: EntityId,
    pub unit_id: EntityId,
    pub broker_id: EntityId,
    pub payment_plan_id: EntityId,
    pub unit_price: f64,
    pub booking_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBookingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broker_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_plan_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAllotmentRequest {
    pub project_id: EntityId,
    pub customer_id: EntityId,
    pub unit_id: EntityId,
    pub allotment_date: NaiveDate,
    /// Source booking, when the allotment derives from one. Passed
    /// through at creation; the client never persists it as a key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAllotmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allotment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAgreementRequest {
    pub customer_id: EntityId,
    pub project_id: EntityId,
    pub unit_id: EntityId,
    pub bba_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAgreementRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bba_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<EntityId>,
}

/// Body for the `PATCH /:id/verify` action. `verified_date` is stamped
/// client-side at submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyAgreementRequest {
    pub verified_by: String,
    pub verification_notes: String,
    pub verified_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBrokerRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBrokerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlcRequest {
    pub name: String,
    pub rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePlcRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChequeRequest {
    pub booking_id: EntityId,
    pub cheque_number: String,
    pub bank_name: String,
    pub amount: f64,
    pub cheque_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateChequeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cheque_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cheque_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentQueryRequest {
    pub booking_id: EntityId,
    pub amount: f64,
    pub query_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePaymentQueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRaiseRequest {
    pub booking_id: EntityId,
    pub amount: f64,
    pub raise_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePaymentRaiseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raise_date: Option<NaiveDate>,
}

/// Outcome summary for bulk auto-verify / auto-status-update triggers.
///
/// The backend reports only totals; callers must refetch the list to
/// observe which records changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkRunSummary {
    pub processed: u64,
    pub updated: u64,
    #[serde(default)]
    pub message: Option<String>,
}
