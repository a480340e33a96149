// Hand-crafted async HTTP client for the Propflow back-office REST API.
//
// Auth: `Authorization: Bearer <token>` injected as a default header.
// Every endpoint wraps its payload in the uniform envelope
// `{ success, data, message?, error? }`.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;
use crate::types;
use crate::types::EntityId;

// ── Response envelope ────────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl<T> Envelope<T> {
    fn failure_message(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "request failed".to_owned())
    }
}

/// First ~200 bytes of a body for error messages, cut back to a char
/// boundary so multibyte UTF-8 never splits.
fn body_preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Error body shape for non-2xx responses. The backend attributes a
/// field on validation failures.
#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    field: Option<String>,
}

#[derive(Serialize)]
struct StatusBody<'a> {
    status: &'a str,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Propflow back-office API.
///
/// Cheap to clone is not a goal here; stores share it behind an `Arc`.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GatewayClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a bearer token and transport config.
    ///
    /// Injects `Authorization: Bearer <token>` as a default header on
    /// every request, marked sensitive so it never appears in logs.
    pub fn new(
        base_url: &str,
        token: &secrecy::SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::Auth {
                message: format!("invalid token header value: {e}"),
            })?;
        auth_value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth_value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base URL ends with a slash so relative joins work.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(path, resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        Self::handle_response(path, resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_response(path, resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        Self::handle_response(path, resp).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PATCH {url}");

        let resp = self.http.patch(url).json(body).send().await?;
        Self::handle_response(path, resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::handle_empty(path, resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    /// Decode the `{success, data, message, error}` envelope.
    ///
    /// `success: false` on a 2xx is treated the same as an HTTP failure,
    /// per the backend contract.
    async fn handle_response<T: DeserializeOwned>(
        path: &str,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(path, status, resp).await);
        }

        let body = resp.text().await?;
        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                let message = format!("{e} (body preview: {:?})", body_preview(&body));
                return Err(Error::Deserialization { message, body });
            }
        };

        if !envelope.success {
            return Err(Error::Api {
                message: envelope.failure_message(),
                status: status.as_u16(),
            });
        }

        envelope.data.ok_or_else(|| Error::Deserialization {
            message: "envelope carried no data".to_owned(),
            body,
        })
    }

    /// Like `handle_response` but tolerates an absent `data` field.
    async fn handle_empty(path: &str, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(path, status, resp).await);
        }

        let body = resp.text().await.unwrap_or_default();
        if body.is_empty() {
            return Ok(());
        }

        match serde_json::from_str::<Envelope<serde_json::Value>>(&body) {
            Ok(envelope) if !envelope.success => Err(Error::Api {
                message: envelope.failure_message(),
                status: status.as_u16(),
            }),
            _ => Ok(()),
        }
    }

    async fn parse_error(path: &str, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let parsed: Option<ErrorResponse> = serde_json::from_str(&raw).ok();
        let message = parsed
            .as_ref()
            .and_then(|e| e.message.clone().or_else(|| e.error.clone()))
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw.clone()
                }
            });

        match status {
            reqwest::StatusCode::UNAUTHORIZED => Error::Auth { message },
            reqwest::StatusCode::NOT_FOUND => Error::NotFound {
                resource: path.to_owned(),
            },
            reqwest::StatusCode::CONFLICT => Error::Conflict { message },
            s if s.is_client_error() => Error::Validation {
                message,
                field: parsed.and_then(|e| e.field),
                status: s.as_u16(),
            },
            s => Error::Api {
                message,
                status: s.as_u16(),
            },
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Bookings ─────────────────────────────────────────────────────

    pub async fn list_bookings(
        &self,
        filters: &types::BookingFilters,
    ) -> Result<Vec<types::Booking>, Error> {
        self.get_with_params("transaction/bookings", &filters.query())
            .await
    }

    pub async fn get_booking(&self, id: EntityId) -> Result<types::Booking, Error> {
        self.get(&format!("transaction/bookings/{id}")).await
    }

    pub async fn create_booking(
        &self,
        body: &types::CreateBookingRequest,
    ) -> Result<types::Booking, Error> {
        self.post("transaction/bookings", body).await
    }

    pub async fn update_booking(
        &self,
        id: EntityId,
        body: &types::UpdateBookingRequest,
    ) -> Result<types::Booking, Error> {
        self.put(&format!("transaction/bookings/{id}"), body).await
    }

    pub async fn delete_booking(&self, id: EntityId) -> Result<(), Error> {
        self.delete(&format!("transaction/bookings/{id}")).await
    }

    pub async fn set_booking_status(
        &self,
        id: EntityId,
        status: types::BookingStatus,
    ) -> Result<types::Booking, Error> {
        self.patch(
            &format!("transaction/bookings/{id}/status"),
            &StatusBody {
                status: &status.to_string(),
            },
        )
        .await
    }

    // ── Allotments ───────────────────────────────────────────────────

    pub async fn list_allotments(
        &self,
        filters: &types::AllotmentFilters,
    ) -> Result<Vec<types::Allotment>, Error> {
        self.get_with_params("transaction/allotments", &filters.query())
            .await
    }

    pub async fn get_allotment(&self, id: EntityId) -> Result<types::Allotment, Error> {
        self.get(&format!("transaction/allotments/{id}")).await
    }

    pub async fn create_allotment(
        &self,
        body: &types::CreateAllotmentRequest,
    ) -> Result<types::Allotment, Error> {
        self.post("transaction/allotments", body).await
    }

    pub async fn update_allotment(
        &self,
        id: EntityId,
        body: &types::UpdateAllotmentRequest,
    ) -> Result<types::Allotment, Error> {
        self.put(&format!("transaction/allotments/{id}"), body).await
    }

    pub async fn delete_allotment(&self, id: EntityId) -> Result<(), Error> {
        self.delete(&format!("transaction/allotments/{id}")).await
    }

    /// Fetch the generated letter for an allotment.
    ///
    /// A 404 means no letter has been generated yet -- a normal outcome,
    /// surfaced as `Ok(None)` so callers can offer a remediation action.
    pub async fn get_allotment_letter(
        &self,
        id: EntityId,
    ) -> Result<Option<types::AllotmentLetter>, Error> {
        match self
            .get::<types::AllotmentLetter>(&format!("transaction/allotments/{id}/letter"))
            .await
        {
            Ok(letter) => Ok(Some(letter)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    // ── Agreements (BBA) ─────────────────────────────────────────────

    pub async fn list_agreements(
        &self,
        filters: &types::AgreementFilters,
    ) -> Result<Vec<types::Agreement>, Error> {
        self.get_with_params("api/bba/records", &filters.query())
            .await
    }

    pub async fn get_agreement(&self, id: EntityId) -> Result<types::Agreement, Error> {
        self.get(&format!("api/bba/records/{id}")).await
    }

    pub async fn create_agreement(
        &self,
        body: &types::CreateAgreementRequest,
    ) -> Result<types::Agreement, Error> {
        self.post("api/bba/records", body).await
    }

    pub async fn update_agreement(
        &self,
        id: EntityId,
        body: &types::UpdateAgreementRequest,
    ) -> Result<types::Agreement, Error> {
        self.put(&format!("api/bba/records/{id}"), body).await
    }

    pub async fn delete_agreement(&self, id: EntityId) -> Result<(), Error> {
        self.delete(&format!("api/bba/records/{id}")).await
    }

    pub async fn set_agreement_status(
        &self,
        id: EntityId,
        status: types::AgreementStatus,
    ) -> Result<types::Agreement, Error> {
        self.patch(
            &format!("api/bba/records/{id}/status"),
            &StatusBody {
                status: &status.to_string(),
            },
        )
        .await
    }

    pub async fn verify_agreement(
        &self,
        id: EntityId,
        body: &types::VerifyAgreementRequest,
    ) -> Result<types::Agreement, Error> {
        self.patch(&format!("api/bba/records/{id}/verify"), body)
            .await
    }

    /// Fire-and-forget bulk verification. The summary reports totals
    /// only; refetch the list to see which records changed.
    pub async fn auto_verify_agreements(&self) -> Result<types::BulkRunSummary, Error> {
        self.post("api/bba/records/auto-verify", &serde_json::json!({}))
            .await
    }

    pub async fn auto_update_agreement_statuses(&self) -> Result<types::BulkRunSummary, Error> {
        self.post("api/bba/records/auto-status-update", &serde_json::json!({}))
            .await
    }

    /// Server-side aggregate counts, independent of any list filter.
    pub async fn get_agreement_statistics(&self) -> Result<types::AgreementStatistics, Error> {
        self.get("api/bba/records/statistics").await
    }

    // ── Brokers ──────────────────────────────────────────────────────

    pub async fn list_brokers(&self) -> Result<Vec<types::Broker>, Error> {
        self.get("master/brokers").await
    }

    pub async fn get_broker(&self, id: EntityId) -> Result<types::Broker, Error> {
        self.get(&format!("master/brokers/{id}")).await
    }

    pub async fn create_broker(
        &self,
        body: &types::CreateBrokerRequest,
    ) -> Result<types::Broker, Error> {
        self.post("master/brokers", body).await
    }

    pub async fn update_broker(
        &self,
        id: EntityId,
        body: &types::UpdateBrokerRequest,
    ) -> Result<types::Broker, Error> {
        self.put(&format!("master/brokers/{id}"), body).await
    }

    pub async fn delete_broker(&self, id: EntityId) -> Result<(), Error> {
        self.delete(&format!("master/brokers/{id}")).await
    }

    pub async fn get_broker_usage(&self, id: EntityId) -> Result<types::BrokerUsage, Error> {
        self.get(&format!("master/brokers/{id}/usage")).await
    }

    // ── PLCs ─────────────────────────────────────────────────────────

    pub async fn list_plcs(&self) -> Result<Vec<types::Plc>, Error> {
        self.get("master/plcs").await
    }

    pub async fn get_plc(&self, id: EntityId) -> Result<types::Plc, Error> {
        self.get(&format!("master/plcs/{id}")).await
    }

    pub async fn create_plc(&self, body: &types::CreatePlcRequest) -> Result<types::Plc, Error> {
        self.post("master/plcs", body).await
    }

    pub async fn update_plc(
        &self,
        id: EntityId,
        body: &types::UpdatePlcRequest,
    ) -> Result<types::Plc, Error> {
        self.put(&format!("master/plcs/{id}"), body).await
    }

    pub async fn delete_plc(&self, id: EntityId) -> Result<(), Error> {
        self.delete(&format!("master/plcs/{id}")).await
    }

    // ── Cheques (the only wire-paginated listing) ────────────────────

    pub async fn list_cheques(
        &self,
        filters: &types::ChequeFilters,
    ) -> Result<types::Page<types::Cheque>, Error> {
        self.get_with_params("transaction/cheques", &filters.query())
            .await
    }

    pub async fn get_cheque(&self, id: EntityId) -> Result<types::Cheque, Error> {
        self.get(&format!("transaction/cheques/{id}")).await
    }

    pub async fn create_cheque(
        &self,
        body: &types::CreateChequeRequest,
    ) -> Result<types::Cheque, Error> {
        self.post("transaction/cheques", body).await
    }

    pub async fn update_cheque(
        &self,
        id: EntityId,
        body: &types::UpdateChequeRequest,
    ) -> Result<types::Cheque, Error> {
        self.put(&format!("transaction/cheques/{id}"), body).await
    }

    pub async fn delete_cheque(&self, id: EntityId) -> Result<(), Error> {
        self.delete(&format!("transaction/cheques/{id}")).await
    }

    // ── Payment queries ──────────────────────────────────────────────

    pub async fn list_payment_queries(
        &self,
        filters: &types::PaymentFilters,
    ) -> Result<Vec<types::PaymentQuery>, Error> {
        self.get_with_params("transaction/payment-queries", &filters.query())
            .await
    }

    pub async fn get_payment_query(&self, id: EntityId) -> Result<types::PaymentQuery, Error> {
        self.get(&format!("transaction/payment-queries/{id}")).await
    }

    pub async fn create_payment_query(
        &self,
        body: &types::CreatePaymentQueryRequest,
    ) -> Result<types::PaymentQuery, Error> {
        self.post("transaction/payment-queries", body).await
    }

    pub async fn update_payment_query(
        &self,
        id: EntityId,
        body: &types::UpdatePaymentQueryRequest,
    ) -> Result<types::PaymentQuery, Error> {
        self.put(&format!("transaction/payment-queries/{id}"), body)
            .await
    }

    pub async fn delete_payment_query(&self, id: EntityId) -> Result<(), Error> {
        self.delete(&format!("transaction/payment-queries/{id}"))
            .await
    }

    // ── Payment raises ───────────────────────────────────────────────

    pub async fn list_payment_raises(
        &self,
        filters: &types::PaymentFilters,
    ) -> Result<Vec<types::PaymentRaise>, Error> {
        self.get_with_params("transaction/payment-raises", &filters.query())
            .await
    }

    pub async fn get_payment_raise(&self, id: EntityId) -> Result<types::PaymentRaise, Error> {
        self.get(&format!("transaction/payment-raises/{id}")).await
    }

    pub async fn create_payment_raise(
        &self,
        body: &types::CreatePaymentRaiseRequest,
    ) -> Result<types::PaymentRaise, Error> {
        self.post("transaction/payment-raises", body).await
    }

    pub async fn update_payment_raise(
        &self,
        id: EntityId,
        body: &types::UpdatePaymentRaiseRequest,
    ) -> Result<types::PaymentRaise, Error> {
        self.put(&format!("transaction/payment-raises/{id}"), body)
            .await
    }

    pub async fn delete_payment_raise(&self, id: EntityId) -> Result<(), Error> {
        self.delete(&format!("transaction/payment-raises/{id}"))
            .await
    }

    pub async fn set_payment_raise_status(
        &self,
        id: EntityId,
        status: types::PaymentRaiseStatus,
    ) -> Result<types::PaymentRaise, Error> {
        self.patch(
            &format!("transaction/payment-raises/{id}/status"),
            &StatusBody {
                status: &status.to_string(),
            },
        )
        .await
    }

    // ── Master data (selector option sets) ───────────────────────────

    pub async fn list_projects(&self) -> Result<Vec<types::Project>, Error> {
        self.get("master/projects").await
    }

    /// Customers, optionally scoped to a project. Always fetched fresh --
    /// option sets are never derived from another store's cache.
    pub async fn list_customers(
        &self,
        project_id: Option<EntityId>,
    ) -> Result<Vec<types::Customer>, Error> {
        let params: Vec<(&str, String)> = project_id
            .map(|id| ("project_id", id.to_string()))
            .into_iter()
            .collect();
        self.get_with_params("master/customers", &params).await
    }

    pub async fn list_units(
        &self,
        project_id: Option<EntityId>,
    ) -> Result<Vec<types::Unit>, Error> {
        let params: Vec<(&str, String)> = project_id
            .map(|id| ("project_id", id.to_string()))
            .into_iter()
            .collect();
        self.get_with_params("master/units", &params).await
    }

    pub async fn list_payment_plans(&self) -> Result<Vec<types::PaymentPlan>, Error> {
        self.get("master/payment-plans").await
    }

    /// Best-effort lookup of the broker previously associated with a
    /// customer. 404 means no association exists -- not an error.
    pub async fn get_previous_broker(
        &self,
        customer_id: EntityId,
    ) -> Result<Option<types::Broker>, Error> {
        match self
            .get::<types::Broker>(&format!("master/customers/{customer_id}/broker"))
            .await
        {
            Ok(broker) => Ok(Some(broker)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
