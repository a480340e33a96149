//! Cascading selector workflow against a mocked back office.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use propflow_api::GatewayClient;
use propflow_core::model::{CustomerBookingStatus, EntityId, UnitStatus};
use propflow_core::{SelectorForm, Stores};

fn ok_envelope(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": data }))
}

fn gateway_for(server: &MockServer) -> GatewayClient {
    GatewayClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap()
}

async fn mount_master(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/master/projects"))
        .respond_with(ok_envelope(json!([{ "id": 1, "name": "Riverside" }])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/master/brokers"))
        .respond_with(ok_envelope(json!([
            { "id": 10, "name": "Broker Ten" },
            { "id": 11, "name": "Broker Eleven" }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/master/payment-plans"))
        .respond_with(ok_envelope(json!([{ "id": 20, "name": "Construction linked" }])))
        .mount(server)
        .await;
}

async fn mount_project_options(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/master/customers"))
        .and(query_param("project_id", "1"))
        .respond_with(ok_envelope(json!([
            { "id": 100, "name": "Ayesha Khan", "father_name": "Imran Khan",
              "address": "12 Canal Road", "booking_status": "available" },
            { "id": 101, "name": "Bilal Ahmed", "booking_status": "booked" }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/master/units"))
        .and(query_param("project_id", "1"))
        .respond_with(ok_envelope(json!([
            { "id": 200, "project_id": 1, "name": "A-101", "size_sqft": 1250.0,
              "base_price": 2_500_000.0, "status": "free" },
            { "id": 201, "project_id": 1, "name": "A-102", "size_sqft": 1250.0,
              "base_price": 2_500_000.0, "status": "booked" }
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn project_selection_loads_both_option_sets() {
    let server = MockServer::start().await;
    mount_master(&server).await;
    mount_project_options(&server).await;

    let gateway = gateway_for(&server);
    let mut form = SelectorForm::new();
    form.load_master(&gateway).await.unwrap();
    assert_eq!(form.project_options().len(), 1);

    let project = form.project_options()[0].clone();
    form.select_project(&gateway, project).await.unwrap();

    assert_eq!(form.customer_options().len(), 2);
    // Only the free unit is offered.
    assert_eq!(form.unit_options().len(), 1);
    assert_eq!(form.unit_options()[0].id, EntityId(200));
}

#[tokio::test]
async fn reselecting_a_project_clears_downstream_state() {
    let server = MockServer::start().await;
    mount_master(&server).await;
    mount_project_options(&server).await;

    let gateway = gateway_for(&server);
    let mut form = SelectorForm::new();
    form.load_master(&gateway).await.unwrap();

    let project = form.project_options()[0].clone();
    form.select_project(&gateway, project.clone()).await.unwrap();

    let customer = form.customer_options()[0].clone();
    assert_eq!(customer.booking_status, CustomerBookingStatus::Available);
    form.select_customer(customer).unwrap();
    let unit = form.unit_options()[0].clone();
    assert_eq!(unit.status, UnitStatus::Free);
    form.select_unit(unit).unwrap();
    assert_eq!(form.price_input(), "2500000");

    // Picking a project again drops customer, unit, and prefilled price.
    form.select_project(&gateway, project).await.unwrap();
    assert!(form.selected_customer().is_none());
    assert!(form.selected_unit().is_none());
    assert!(form.price_input().is_empty());
}

#[tokio::test]
async fn previous_broker_is_prefilled_when_known() {
    let server = MockServer::start().await;
    mount_master(&server).await;
    mount_project_options(&server).await;
    Mock::given(method("GET"))
        .and(path("/master/customers/100/broker"))
        .respond_with(ok_envelope(json!({ "id": 11, "name": "Broker Eleven" })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let mut form = SelectorForm::new();
    form.load_master(&gateway).await.unwrap();
    let project = form.project_options()[0].clone();
    form.select_project(&gateway, project).await.unwrap();
    form.select_customer(form.customer_options()[0].clone()).unwrap();

    form.prefill_broker(&gateway).await;
    assert_eq!(form.selected_broker().unwrap().id, EntityId(11));
}

#[tokio::test]
async fn absent_previous_broker_is_not_an_error() {
    let server = MockServer::start().await;
    mount_master(&server).await;
    mount_project_options(&server).await;
    Mock::given(method("GET"))
        .and(path("/master/customers/100/broker"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let mut form = SelectorForm::new();
    form.load_master(&gateway).await.unwrap();
    let project = form.project_options()[0].clone();
    form.select_project(&gateway, project).await.unwrap();
    form.select_customer(form.customer_options()[0].clone()).unwrap();

    form.prefill_broker(&gateway).await;
    assert!(form.selected_broker().is_none());
    assert!(form.errors().is_empty());
}

#[tokio::test]
async fn submit_creates_booking_and_resets_on_success() {
    let server = MockServer::start().await;
    mount_master(&server).await;
    mount_project_options(&server).await;
    Mock::given(method("POST"))
        .and(path("/transaction/bookings"))
        .respond_with(ok_envelope(json!({
            "id": 77,
            "project_id": 1,
            "customer_id": 100,
            "unit_id": 200,
            "broker_id": 10,
            "payment_plan_id": 20,
            "unit_price": 2_500_000.0,
            "booking_date": chrono::Utc::now().date_naive(),
            "status": "pending"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let stores = Stores::new(Arc::new(
        GatewayClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap(),
    ));

    let mut form = SelectorForm::new();
    form.load_master(&gateway).await.unwrap();
    let project = form.project_options()[0].clone();
    form.select_project(&gateway, project).await.unwrap();
    form.select_customer(form.customer_options()[0].clone()).unwrap();
    form.select_unit(form.unit_options()[0].clone()).unwrap();
    form.set_broker(form.broker_options()[0].clone());
    form.set_payment_plan(form.payment_plan_options()[0].clone());
    form.set_price("2500000");

    let booking = form.submit(&stores.bookings).await.unwrap();
    assert_eq!(booking.id, EntityId(77));
    assert_eq!(stores.bookings.list().len(), 1);

    // Cleared for the next entry.
    assert!(form.selected_project().is_none());
    assert!(form.selected_customer().is_none());
    assert!(form.price_input().is_empty());
}

#[tokio::test]
async fn allotment_submit_needs_no_commercial_fields_and_resets() {
    let server = MockServer::start().await;
    mount_master(&server).await;
    mount_project_options(&server).await;
    Mock::given(method("POST"))
        .and(path("/transaction/allotments"))
        .respond_with(ok_envelope(json!({
            "id": 55,
            "project_id": 1,
            "customer_id": 100,
            "unit_id": 200,
            "allotment_date": chrono::Utc::now().date_naive(),
            "status": "allotted"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let stores = Stores::new(Arc::new(
        GatewayClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap(),
    ));

    let mut form = SelectorForm::new();
    form.load_master(&gateway).await.unwrap();
    let project = form.project_options()[0].clone();
    form.select_project(&gateway, project).await.unwrap();
    form.select_customer(form.customer_options()[0].clone()).unwrap();
    form.select_unit(form.unit_options()[0].clone()).unwrap();
    // No broker, payment plan, or price: allotments don't carry them.

    let allotment = form
        .submit_allotment(&stores.allotments, Some(EntityId(77)))
        .await
        .unwrap();
    assert_eq!(allotment.id, EntityId(55));
    assert_eq!(stores.allotments.list().len(), 1);

    // Cleared for the next entry.
    assert!(form.selected_project().is_none());
    assert!(form.selected_unit().is_none());
}

#[tokio::test]
async fn submit_preserves_form_state_on_server_rejection() {
    let server = MockServer::start().await;
    mount_master(&server).await;
    mount_project_options(&server).await;
    // The unit was taken between selection and submit.
    Mock::given(method("POST"))
        .and(path("/transaction/bookings"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "success": false, "message": "Unit already booked"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let stores = Stores::new(Arc::new(
        GatewayClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap(),
    ));

    let mut form = SelectorForm::new();
    form.load_master(&gateway).await.unwrap();
    let project = form.project_options()[0].clone();
    form.select_project(&gateway, project).await.unwrap();
    form.select_customer(form.customer_options()[0].clone()).unwrap();
    form.select_unit(form.unit_options()[0].clone()).unwrap();
    form.set_broker(form.broker_options()[0].clone());
    form.set_payment_plan(form.payment_plan_options()[0].clone());
    form.set_price("2500000");

    let err = form.submit(&stores.bookings).await.unwrap_err();
    assert!(err.is_conflict());

    // Everything still in place for a retry.
    assert!(form.selected_customer().is_some());
    assert!(form.selected_unit().is_some());
    assert_eq!(form.price_input(), "2500000");
}
