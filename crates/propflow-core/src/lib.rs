//! Core state-coordination layer for the Propflow back office.
//!
//! Sits between the raw HTTP client ([`propflow-api`](propflow_api)) and
//! whatever front end renders the screens. Owns:
//!
//! - reactive [`store`]s for the eight transactional entity families,
//!   with watch-broadcast list snapshots, keyed detail caches, filters,
//!   and derived statistics;
//! - the cascading booking [`workflow`] (project → customer/unit →
//!   broker/plan → price), enforcing availability at selection time;
//! - client-side status [`transition`] gates and agreement verification;
//! - synchronous [`browse`] helpers for paginating and searching
//!   in-memory snapshots.
//!
//! All operations are async and non-fatal: failures are returned *and*
//! recorded in the owning store's error state, and the backend remains
//! the source of truth for every business rule enforced here.

pub mod browse;
pub mod config;
pub mod error;
pub mod store;
pub mod transition;
pub mod workflow;

/// Canonical domain types, straight off the wire.
pub mod model {
    pub use propflow_api::types::*;
}

pub use config::GatewayConfig;
pub use propflow_api::{GatewayClient, TlsMode, TransportConfig};
pub use error::CoreError;
pub use store::{
    AgreementStats, AgreementStore, AllotmentStore, BookingStats, BookingStore, BrokerStore,
    ChequePageInfo, ChequeStore, EntityResource, EntityStore, PaymentQueryStore,
    PaymentRaiseStore, PlcStore, Stores,
};
pub use transition::{StatusTransitions, VerificationForm};
pub use workflow::{FormField, SelectionTarget, SelectorForm};
