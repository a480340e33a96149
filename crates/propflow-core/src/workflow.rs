// ── Cascading selector workflow ──
//
// Drives the booking entry form: project selection cascades into
// customer and unit option sets, availability is enforced at selection
// time from server-provided status fields, and validation produces a
// field-keyed error map. No local locks: the backend re-validates on
// submit, so a conflict after selection must still be tolerated.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use propflow_api::GatewayClient;
use propflow_api::types::{
    Agreement, Allotment, Booking, Broker, CreateAgreementRequest, CreateAllotmentRequest,
    CreateBookingRequest, Customer, CustomerBookingStatus, EntityId, PaymentPlan, Project, Unit,
    UnitStatus,
};

use crate::error::CoreError;
use crate::store::{AgreementStore, AllotmentStore, BookingStore};

/// What the cascading selection is being assembled into.
///
/// Every target needs the project/customer/unit cascade; only bookings
/// carry the commercial fields (broker, payment plan, price).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionTarget {
    #[default]
    Booking,
    Allotment,
    Agreement,
}

/// Form fields that can carry a validation error.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum FormField {
    Project,
    Customer,
    Unit,
    Broker,
    PaymentPlan,
    Price,
}

/// Booking entry form with cascading option sets.
///
/// Selections flow top-down: picking a project loads its customers and
/// units; picking a customer or unit auto-fills the display fields
/// screens render read-only. Price is prefilled from the unit's base
/// price but stays editable.
#[derive(Debug, Default)]
pub struct SelectorForm {
    projects: Vec<Project>,
    brokers: Vec<Broker>,
    payment_plans: Vec<PaymentPlan>,
    customers: Vec<Customer>,
    units: Vec<Unit>,

    selected_project: Option<Project>,
    selected_customer: Option<Customer>,
    selected_unit: Option<Unit>,
    selected_broker: Option<Broker>,
    selected_payment_plan: Option<PaymentPlan>,

    price_input: String,
    remarks: String,

    errors: BTreeMap<FormField, String>,
}

impl SelectorForm {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Option sets ──────────────────────────────────────────────────

    /// Load the project-independent option sets. Always fetched fresh;
    /// option sets are never derived from another store's cache.
    pub async fn load_master(&mut self, gateway: &GatewayClient) -> Result<(), CoreError> {
        let (projects, brokers, plans) = tokio::join!(
            gateway.list_projects(),
            gateway.list_brokers(),
            gateway.list_payment_plans(),
        );
        self.projects = projects?;
        self.brokers = brokers?;
        self.payment_plans = plans?;
        Ok(())
    }

    pub fn project_options(&self) -> &[Project] {
        &self.projects
    }

    pub fn customer_options(&self) -> &[Customer] {
        &self.customers
    }

    /// Only free units are offered for selection.
    pub fn unit_options(&self) -> Vec<&Unit> {
        self.units
            .iter()
            .filter(|u| u.status == UnitStatus::Free)
            .collect()
    }

    pub fn broker_options(&self) -> &[Broker] {
        &self.brokers
    }

    pub fn payment_plan_options(&self) -> &[PaymentPlan] {
        &self.payment_plans
    }

    // ── Selections ───────────────────────────────────────────────────

    /// Select a project and load its customer and unit option sets.
    ///
    /// Clears the customer and unit selections, their auto-filled
    /// display fields, and their errors before fetching; the two
    /// fetches run concurrently and are independent.
    pub async fn select_project(
        &mut self,
        gateway: &GatewayClient,
        project: Project,
    ) -> Result<(), CoreError> {
        debug!(project_id = %project.id, "project selected");
        self.clear_downstream();
        self.errors.remove(&FormField::Project);

        let (customers, units) = tokio::join!(
            gateway.list_customers(Some(project.id)),
            gateway.list_units(Some(project.id)),
        );
        self.customers = customers?;
        self.units = units?;
        self.selected_project = Some(project);
        Ok(())
    }

    /// Select a customer. Rejected with a field error unless the
    /// backend reports them as available; the rest of the form is left
    /// unchanged on rejection.
    pub fn select_customer(&mut self, customer: Customer) -> Result<(), CoreError> {
        if customer.booking_status != CustomerBookingStatus::Available {
            let message = "This customer already has a booking or is allotted".to_owned();
            self.errors.insert(FormField::Customer, message.clone());
            return Err(CoreError::Validation {
                message,
                field: Some(FormField::Customer.to_string()),
            });
        }

        self.errors.remove(&FormField::Customer);
        self.selected_customer = Some(customer);
        Ok(())
    }

    /// Select a unit. Rejected with a field error unless it is free;
    /// on acceptance the price input is prefilled from the base price
    /// but remains editable.
    pub fn select_unit(&mut self, unit: Unit) -> Result<(), CoreError> {
        if unit.status != UnitStatus::Free {
            let message = "This unit is not available for booking".to_owned();
            self.errors.insert(FormField::Unit, message.clone());
            return Err(CoreError::Validation {
                message,
                field: Some(FormField::Unit.to_string()),
            });
        }

        self.errors.remove(&FormField::Unit);
        self.price_input = format_price(unit.base_price);
        self.selected_unit = Some(unit);
        Ok(())
    }

    /// Best-effort previous-broker prefill. Selects the customer's last
    /// broker only when that broker is in the loaded option set and no
    /// broker is chosen yet; absence or lookup failure is not an error.
    pub async fn prefill_broker(&mut self, gateway: &GatewayClient) {
        let Some(customer) = &self.selected_customer else {
            return;
        };
        if self.selected_broker.is_some() {
            return;
        }

        if let Ok(Some(previous)) = gateway.get_previous_broker(customer.id).await
            && let Some(broker) = self.brokers.iter().find(|b| b.id == previous.id)
        {
            debug!(broker_id = %broker.id, "prefilled previous broker");
            self.selected_broker = Some(broker.clone());
            self.errors.remove(&FormField::Broker);
        }
    }

    pub fn set_broker(&mut self, broker: Broker) {
        self.errors.remove(&FormField::Broker);
        self.selected_broker = Some(broker);
    }

    pub fn set_payment_plan(&mut self, plan: PaymentPlan) {
        self.errors.remove(&FormField::PaymentPlan);
        self.selected_payment_plan = Some(plan);
    }

    pub fn set_price(&mut self, input: &str) {
        self.errors.remove(&FormField::Price);
        self.price_input = input.to_owned();
    }

    pub fn set_remarks(&mut self, remarks: &str) {
        self.remarks = remarks.to_owned();
    }

    // ── Read-back for screens ────────────────────────────────────────

    pub fn selected_project(&self) -> Option<&Project> {
        self.selected_project.as_ref()
    }

    pub fn selected_customer(&self) -> Option<&Customer> {
        self.selected_customer.as_ref()
    }

    pub fn selected_unit(&self) -> Option<&Unit> {
        self.selected_unit.as_ref()
    }

    pub fn selected_broker(&self) -> Option<&Broker> {
        self.selected_broker.as_ref()
    }

    pub fn selected_payment_plan(&self) -> Option<&PaymentPlan> {
        self.selected_payment_plan.as_ref()
    }

    pub fn price_input(&self) -> &str {
        &self.price_input
    }

    pub fn errors(&self) -> &BTreeMap<FormField, String> {
        &self.errors
    }

    // ── Validation & submission ──────────────────────────────────────

    /// Validate every required field together, rebuilding the full
    /// error map. Errors recorded at selection time (e.g. an
    /// unavailable customer) take precedence over the generic
    /// missing-field message for the same field.
    pub fn validate(&mut self) -> bool {
        self.validate_for(SelectionTarget::Booking)
    }

    /// Like [`validate`](Self::validate) but only requires the fields
    /// the target actually submits: allotments and agreements skip the
    /// commercial fields entirely.
    pub fn validate_for(&mut self, target: SelectionTarget) -> bool {
        let mut errors = BTreeMap::new();

        let mut require = |field: FormField, present: bool, message: &str| {
            if let Some(existing) = self.errors.get(&field) {
                errors.insert(field, existing.clone());
            } else if !present {
                errors.insert(field, message.to_owned());
            }
        };

        require(FormField::Project, self.selected_project.is_some(), "Select a project");
        require(FormField::Customer, self.selected_customer.is_some(), "Select a customer");
        require(FormField::Unit, self.selected_unit.is_some(), "Select a unit");

        if target == SelectionTarget::Booking {
            require(FormField::Broker, self.selected_broker.is_some(), "Select a broker");
            require(
                FormField::PaymentPlan,
                self.selected_payment_plan.is_some(),
                "Select a payment plan",
            );

            if !errors.contains_key(&FormField::Price) && parse_price(&self.price_input).is_none() {
                errors.insert(FormField::Price, "Enter a price greater than zero".to_owned());
            }
        }

        self.errors = errors;
        self.errors.is_empty()
    }

    /// The normalized create request, or `None` while the form is
    /// incomplete. `booking_date` is stamped with today's date.
    pub fn payload(&self) -> Option<CreateBookingRequest> {
        let price = parse_price(&self.price_input)?;
        Some(CreateBookingRequest {
            project_id: self.selected_project.as_ref()?.id,
            customer_id: self.selected_customer.as_ref()?.id,
            unit_id: self.selected_unit.as_ref()?.id,
            broker_id: self.selected_broker.as_ref()?.id,
            payment_plan_id: self.selected_payment_plan.as_ref()?.id,
            unit_price: price,
            booking_date: Utc::now().date_naive(),
            remarks: if self.remarks.trim().is_empty() {
                None
            } else {
                Some(self.remarks.trim().to_owned())
            },
        })
    }

    /// The normalized allotment request, or `None` while the cascade is
    /// incomplete. `allotment_date` is stamped with today's date;
    /// `source_booking` is passed through when the allotment converts
    /// an existing booking.
    pub fn allotment_payload(
        &self,
        source_booking: Option<EntityId>,
    ) -> Option<CreateAllotmentRequest> {
        Some(CreateAllotmentRequest {
            project_id: self.selected_project.as_ref()?.id,
            customer_id: self.selected_customer.as_ref()?.id,
            unit_id: self.selected_unit.as_ref()?.id,
            allotment_date: Utc::now().date_naive(),
            booking_id: source_booking,
            remarks: if self.remarks.trim().is_empty() {
                None
            } else {
                Some(self.remarks.trim().to_owned())
            },
        })
    }

    /// The normalized agreement request, or `None` while the cascade is
    /// incomplete. `bba_date` is stamped with today's date.
    pub fn agreement_payload(&self) -> Option<CreateAgreementRequest> {
        Some(CreateAgreementRequest {
            customer_id: self.selected_customer.as_ref()?.id,
            project_id: self.selected_project.as_ref()?.id,
            unit_id: self.selected_unit.as_ref()?.id,
            bba_date: Utc::now().date_naive(),
        })
    }

    /// Validate and submit through the booking store. On success the
    /// selections are cleared for the next entry; on failure the whole
    /// form state is preserved for retry.
    pub async fn submit(&mut self, bookings: &BookingStore) -> Result<Arc<Booking>, CoreError> {
        if !self.validate() {
            return Err(self.validation_error());
        }

        let payload = self.payload().ok_or_else(|| CoreError::Internal(
            "validated form produced no payload".to_owned(),
        ))?;

        let booking = bookings.create(&payload).await?;
        self.reset_selections();
        Ok(booking)
    }

    /// Submit the cascade as an allotment. Same reset-on-success and
    /// preserve-on-failure contract as [`submit`](Self::submit).
    pub async fn submit_allotment(
        &mut self,
        allotments: &AllotmentStore,
        source_booking: Option<EntityId>,
    ) -> Result<Arc<Allotment>, CoreError> {
        if !self.validate_for(SelectionTarget::Allotment) {
            return Err(self.validation_error());
        }

        let payload = self.allotment_payload(source_booking).ok_or_else(|| {
            CoreError::Internal("validated form produced no payload".to_owned())
        })?;

        let allotment = allotments.create(&payload).await?;
        self.reset_selections();
        Ok(allotment)
    }

    /// Submit the cascade as a buyer-builder agreement.
    pub async fn submit_agreement(
        &mut self,
        agreements: &AgreementStore,
    ) -> Result<Arc<Agreement>, CoreError> {
        if !self.validate_for(SelectionTarget::Agreement) {
            return Err(self.validation_error());
        }

        let payload = self.agreement_payload().ok_or_else(|| {
            CoreError::Internal("validated form produced no payload".to_owned())
        })?;

        let agreement = agreements.create(&payload).await?;
        self.reset_selections();
        Ok(agreement)
    }

    fn validation_error(&self) -> CoreError {
        let message = self
            .errors
            .values()
            .next()
            .cloned()
            .unwrap_or_else(|| "Form is incomplete".to_owned());
        let field = self.errors.keys().next().map(ToString::to_string);
        CoreError::Validation { message, field }
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Drop everything downstream of the project: customer and unit
    /// selections, their option sets, the prefilled price, and their
    /// errors. Broker and payment plan are project-independent.
    fn clear_downstream(&mut self) {
        self.selected_customer = None;
        self.selected_unit = None;
        self.customers.clear();
        self.units.clear();
        self.price_input.clear();
        self.errors.remove(&FormField::Customer);
        self.errors.remove(&FormField::Unit);
        self.errors.remove(&FormField::Price);
    }

    fn reset_selections(&mut self) {
        self.selected_project = None;
        self.clear_downstream();
        self.selected_broker = None;
        self.selected_payment_plan = None;
        self.remarks.clear();
        self.errors.clear();
    }
}

fn parse_price(input: &str) -> Option<f64> {
    let value: f64 = input.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

fn format_price(value: f64) -> String {
    // Whole-rupee base prices render without a fractional part.
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Look up a display name for an id in an option set; selectors fall
/// back to the raw id when master data is missing.
pub fn display_name<'a, T>(
    options: &'a [T],
    id: EntityId,
    id_of: impl Fn(&'a T) -> EntityId,
    name_of: impl Fn(&'a T) -> &'a str,
) -> String {
    options
        .iter()
        .find(|o| id_of(o) == id)
        .map_or_else(|| id.to_string(), |o| name_of(o).to_owned())
}
