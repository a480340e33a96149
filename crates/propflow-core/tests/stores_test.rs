//! Store behavior against a mocked back office.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use propflow_api::GatewayClient;
use propflow_core::model::{BookingStatus, CreateBookingRequest, EntityId};
use propflow_core::transition::VerificationForm;
use propflow_core::{CoreError, Stores};

fn stores_for(server: &MockServer) -> Stores {
    let client = GatewayClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    Stores::new(Arc::new(client))
}

fn ok_envelope(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": data }))
}

fn booking_json(id: i64, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "project_id": 1,
        "customer_id": 2,
        "unit_id": 3,
        "broker_id": 4,
        "payment_plan_id": 5,
        "unit_price": 2_500_000.0,
        "booking_date": "2026-08-01",
        "status": status,
        "remarks": null
    })
}

fn agreement_json(id: i64, status: &str, verified: bool) -> serde_json::Value {
    json!({
        "id": id,
        "customer_id": 2,
        "project_id": 1,
        "unit_id": 3,
        "bba_date": "2026-08-01",
        "status": status,
        "is_verified": verified
    })
}

#[tokio::test]
async fn fetch_list_derives_stats_from_filtered_subset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transaction/bookings"))
        .and(query_param("status", "pending"))
        .respond_with(ok_envelope(json!([
            booking_json(1, "pending"),
            booking_json(2, "pending"),
        ])))
        .mount(&server)
        .await;

    let stores = stores_for(&server);
    stores
        .bookings
        .set_filters(|f| f.status = Some(BookingStatus::Pending));
    stores.bookings.fetch_list().await.unwrap();

    let stats = stores.bookings.statistics();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.confirmed + stats.cancelled, 0);
    assert_eq!(stats.total as usize, stores.bookings.list().len());
}

#[tokio::test]
async fn create_appends_server_returned_booking() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transaction/bookings"))
        .respond_with(ok_envelope(json!([booking_json(1, "confirmed")])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/transaction/bookings"))
        .respond_with(ok_envelope(booking_json(77, "pending")))
        .mount(&server)
        .await;

    let stores = stores_for(&server);
    stores.bookings.fetch_list().await.unwrap();

    let request = CreateBookingRequest {
        project_id: EntityId(1),
        customer_id: EntityId(2),
        unit_id: EntityId(3),
        broker_id: EntityId(4),
        payment_plan_id: EntityId(5),
        unit_price: 2_500_000.0,
        booking_date: chrono::Utc::now().date_naive(),
        remarks: None,
    };
    let created = stores.bookings.create(&request).await.unwrap();

    // Server-assigned id, appended to the list.
    assert_eq!(created.id, EntityId(77));
    let list = stores.bookings.list();
    assert_eq!(list.len(), 2);
    assert_eq!(list[1].id, EntityId(77));
}

#[tokio::test]
async fn created_booking_round_trips_through_fetch_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transaction/bookings"))
        .respond_with(ok_envelope(booking_json(77, "pending")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transaction/bookings/77"))
        .respond_with(ok_envelope(booking_json(77, "pending")))
        .mount(&server)
        .await;

    let stores = stores_for(&server);
    let request = CreateBookingRequest {
        project_id: EntityId(1),
        customer_id: EntityId(2),
        unit_id: EntityId(3),
        broker_id: EntityId(4),
        payment_plan_id: EntityId(5),
        unit_price: 2_500_000.0,
        booking_date: chrono::NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        remarks: None,
    };
    let created = stores.bookings.create(&request).await.unwrap();
    let fetched = stores.bookings.fetch_by_id(created.id).await.unwrap();

    // Visible fields submitted survive the round trip.
    assert_eq!(fetched.customer_id, request.customer_id);
    assert_eq!(fetched.unit_id, request.unit_id);
    assert!((fetched.unit_price - request.unit_price).abs() < f64::EPSILON);
    assert_eq!(fetched.booking_date, request.booking_date);
    // And the detail cache holds it.
    assert_eq!(stores.bookings.detail(created.id).unwrap().id, EntityId(77));
}

#[tokio::test]
async fn clear_filters_then_fetch_matches_fresh_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transaction/bookings"))
        .and(query_param("status", "cancelled"))
        .respond_with(ok_envelope(json!([booking_json(3, "cancelled")])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transaction/bookings"))
        .respond_with(ok_envelope(json!([
            booking_json(1, "pending"),
            booking_json(2, "confirmed"),
            booking_json(3, "cancelled"),
        ])))
        .mount(&server)
        .await;

    let stores = stores_for(&server);
    stores
        .bookings
        .set_filters(|f| f.status = Some(BookingStatus::Cancelled));
    stores.bookings.fetch_list().await.unwrap();
    assert_eq!(stores.bookings.list().len(), 1);

    stores.bookings.clear_filters();
    stores.bookings.fetch_list().await.unwrap();
    assert_eq!(stores.bookings.list().len(), 3);
    assert_eq!(stores.bookings.statistics().total, 3);
}

#[tokio::test]
async fn illegal_booking_transition_is_blocked_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transaction/bookings"))
        .respond_with(ok_envelope(json!([booking_json(1, "confirmed")])))
        .mount(&server)
        .await;
    // The gate must reject before any PATCH leaves the client.
    Mock::given(method("PATCH"))
        .and(path("/transaction/bookings/1/status"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let stores = stores_for(&server);
    stores.bookings.fetch_list().await.unwrap();

    let err = stores
        .bookings
        .set_status(EntityId(1), BookingStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
}

#[tokio::test]
async fn legal_booking_transition_applies_server_entity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transaction/bookings"))
        .respond_with(ok_envelope(json!([booking_json(1, "pending")])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/transaction/bookings/1/status"))
        .respond_with(ok_envelope(booking_json(1, "confirmed")))
        .mount(&server)
        .await;

    let stores = stores_for(&server);
    stores.bookings.fetch_list().await.unwrap();

    let updated = stores
        .bookings
        .set_status(EntityId(1), BookingStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(updated.status, BookingStatus::Confirmed);
    assert_eq!(stores.bookings.list()[0].status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn incomplete_verification_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/bba/records/9/verify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let stores = stores_for(&server);
    let form = VerificationForm {
        is_verified: false,
        verified_by: "A. Auditor".into(),
        verification_notes: "checked".into(),
    };
    let err = stores
        .agreements
        .verify(EntityId(9), &form)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
}

#[tokio::test]
async fn complete_verification_applies_returned_agreement() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/bba/records/9/verify"))
        .respond_with(ok_envelope(agreement_json(9, "completed", true)))
        .mount(&server)
        .await;

    let stores = stores_for(&server);
    let form = VerificationForm {
        is_verified: true,
        verified_by: "A. Auditor".into(),
        verification_notes: "ledger spot-checked".into(),
    };
    let agreement = stores.agreements.verify(EntityId(9), &form).await.unwrap();
    assert!(agreement.is_verified);
}

#[tokio::test]
async fn agreement_statistics_come_from_the_aggregate_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/bba/records/statistics"))
        .respond_with(ok_envelope(json!({
            "total": 12, "pending": 4, "in_progress": 3, "completed": 5, "verified": 8
        })))
        .mount(&server)
        .await;

    let stores = stores_for(&server);
    let stats = stores.agreements.fetch_statistics().await.unwrap();
    assert_eq!(stats.total, 12);
    assert_eq!(stats.verified, 8);
    // Recorded in the store's statistics state too.
    assert_eq!(stores.agreements.statistics(), stats);
}

#[tokio::test]
async fn missing_allotment_letter_is_a_normal_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transaction/allotments/5/letter"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let stores = stores_for(&server);
    let letter = stores.allotments.fetch_letter(EntityId(5)).await.unwrap();
    assert!(letter.is_none());
    // Not recorded as a store error either.
    assert!(stores.allotments.error().is_none());
}

#[tokio::test]
async fn cheque_listing_surfaces_wire_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transaction/cheques"))
        .and(query_param("page", "2"))
        .respond_with(ok_envelope(json!({
            "data": [{
                "id": 31,
                "booking_id": 1,
                "cheque_number": "000451",
                "bank_name": "HBL",
                "amount": 500_000.0,
                "cheque_date": "2026-08-10",
                "status": "pending"
            }],
            "page": 2,
            "limit": 25,
            "total": 26,
            "totalPages": 2
        })))
        .mount(&server)
        .await;

    let stores = stores_for(&server);
    let page = stores.cheques.fetch_page(2).await.unwrap();
    assert_eq!(page.len(), 1);

    let info = stores.cheques.page_info();
    assert_eq!(info.page, 2);
    assert_eq!(info.total, 26);
    assert_eq!(info.total_pages, 2);
}

#[tokio::test]
async fn list_failure_records_error_and_keeps_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/master/brokers"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false, "message": "database unavailable"
        })))
        .mount(&server)
        .await;

    let stores = stores_for(&server);
    let err = stores.brokers.fetch_list().await.unwrap_err();
    assert!(matches!(err, CoreError::OperationFailed { .. }));
    assert!(stores.brokers.error().unwrap().contains("database unavailable"));
    assert!(!stores.brokers.loading());
}
