//! Payment Service Facade
//!
//! Builds provider request values, delegates them to the gateway port and
//! translates the outcome. Contains NO transport logic.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;

use paypal_types::domain::plan::ACTIVE_STATE;
use paypal_types::{
    Agreement, AuditSink, CartItem, CurrencyCode, DomainError, FacadeError, GatewayClient, HttpMethod,
    NewAgreement, Patch, Payment, PaymentExecution, PaymentRequest, Plan, PlanList,
    RecurringPlanParams, RedirectUrls,
};

use crate::error_log::ErrorLog;

const PLANS: &str = "/v1/payments/billing-plans";
const AGREEMENTS: &str = "/v1/payments/billing-agreements";
const PAYMENTS: &str = "/v1/payments/payment";

/// Page size used when searching plans by name.
pub const PLAN_SEARCH_PAGE_SIZE: u32 = 20;

/// Checks that `value` can be used as a single resource path segment.
fn path_segment<'a>(field: &str, value: &'a str) -> Result<&'a str, FacadeError> {
    let valid = !value.is_empty()
        && !value.contains(['/', '?', '#', '%', '\\'])
        && !value.chars().any(|c| c.is_whitespace() || c.is_control());
    if !valid {
        return Err(DomainError::ValidationError(format!("invalid {field} {value:?}")).into());
    }
    Ok(value)
}

/// Facade over the payment provider's billing and payment resources.
///
/// Generic over `G: GatewayClient` - the HTTP adapter in production, a
/// scripted mock in tests. Every operation returns a typed `Result`; each
/// failed call also appends exactly one message to the [`ErrorLog`] and, if
/// configured, to the audit sink.
pub struct PaymentFacade<G: GatewayClient> {
    gateway: G,
    currency: CurrencyCode,
    errors: ErrorLog,
    audit: Option<Arc<dyn AuditSink>>,
}

impl<G: GatewayClient> PaymentFacade<G> {
    /// Creates a facade; every amount it builds is in `currency`.
    pub fn new(gateway: G, currency: CurrencyCode) -> Self {
        Self {
            gateway,
            currency,
            errors: ErrorLog::new(),
            audit: None,
        }
    }

    /// Also reports every failure to `sink`.
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Returns a reference to the underlying gateway client.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    /// Snapshot of every error message recorded so far, oldest first.
    pub fn errors(&self) -> Vec<String> {
        self.errors.snapshot()
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.errors
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Plans
    // ─────────────────────────────────────────────────────────────────────────────

    /// Lists at most `page_size` plans.
    #[tracing::instrument(skip(self))]
    pub async fn list_plans(&self, page_size: u32) -> Result<Vec<Plan>, FacadeError> {
        let result = self.fetch_plans(page_size, None).await.map(|mut plans| {
            plans.truncate(page_size as usize);
            plans
        });
        self.record("list_plans", result)
    }

    /// Returns the id of the first ACTIVE plan named exactly `name`.
    ///
    /// Order among duplicate names is whatever the provider returns, so the
    /// winner is not deterministic when names collide.
    #[tracing::instrument(skip(self))]
    pub async fn find_plan_id_by_name(&self, name: &str) -> Result<String, FacadeError> {
        let result = self.lookup_active_plan(name).await;
        self.record("find_plan_id_by_name", result)
    }

    /// Creates a plan and activates it, returning the new plan id.
    ///
    /// Two remote calls. If activation fails the plan already exists
    /// provider-side in CREATED state; that is reported as
    /// [`FacadeError::PartialFailure`] carrying the orphaned id.
    #[tracing::instrument(skip(self, params), fields(plan = %params.name))]
    pub async fn create_recurring_plan(
        &self,
        params: RecurringPlanParams,
    ) -> Result<String, FacadeError> {
        let result = self.create_and_activate(&params).await;
        self.record("create_recurring_plan", result)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Agreements
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates a billing agreement against an existing plan.
    ///
    /// The returned agreement carries the approval URL the payer must visit.
    #[tracing::instrument(skip(self, name, description))]
    pub async fn create_agreement(
        &self,
        plan_id: &str,
        name: &str,
        description: &str,
        start_date: DateTime<Utc>,
    ) -> Result<Agreement, FacadeError> {
        let body = NewAgreement::new(plan_id, name, description, start_date);
        let result: Result<Agreement, FacadeError> =
            self.call(HttpMethod::Post, AGREEMENTS, Some(&body)).await;
        self.record("create_agreement", result)
    }

    /// Executes the agreement approved under `token` and reports whether it
    /// ended up ACTIVE (case-insensitive).
    ///
    /// `Ok(false)` means the provider returned another state; a failed call
    /// is an `Err`.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_subscription(&self, token: &str) -> Result<bool, FacadeError> {
        let result = self.execute_agreement(token).await;
        self.record("confirm_subscription", result)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payments
    // ─────────────────────────────────────────────────────────────────────────────

    /// Creates an immediate-sale payment for `items`.
    ///
    /// Tax and shipping are added to the total only when positive. The
    /// returned payment carries the approval URL.
    #[tracing::instrument(
        skip(self, items, success_url, fail_url),
        fields(item_count = items.len())
    )]
    pub async fn create_payment(
        &self,
        items: &[CartItem],
        description: &str,
        success_url: &str,
        fail_url: &str,
        tax: Decimal,
        shipping: Decimal,
    ) -> Result<Payment, FacadeError> {
        let redirect_urls = RedirectUrls::new(success_url, fail_url);
        let result = self
            .submit_payment(items, description, redirect_urls, tax, shipping)
            .await;
        self.record("create_payment", result)
    }

    /// Single-item shorthand for [`create_payment`](Self::create_payment).
    #[allow(clippy::too_many_arguments)]
    #[tracing::instrument(skip(self, success_url, fail_url))]
    pub async fn create_simple_payment(
        &self,
        price: Decimal,
        name: &str,
        description: &str,
        success_url: &str,
        fail_url: &str,
        tax: Decimal,
        shipping: Decimal,
    ) -> Result<Payment, FacadeError> {
        let items = [CartItem::new(name, price)];
        self.create_payment(&items, description, success_url, fail_url, tax, shipping)
            .await
    }

    /// Fetches the payment, executes it for `payer_id` and reports whether
    /// the resulting state is exactly `"approved"`.
    ///
    /// `Ok(false)` means the provider returned another state; a failed call
    /// is an `Err`.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_payment(
        &self,
        payment_id: &str,
        payer_id: &str,
    ) -> Result<bool, FacadeError> {
        let result = self.execute_payment(payment_id, payer_id).await;
        self.record("confirm_payment", result)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Remote steps
    // ─────────────────────────────────────────────────────────────────────────────

    async fn lookup_active_plan(&self, name: &str) -> Result<String, FacadeError> {
        let plans = self
            .fetch_plans(PLAN_SEARCH_PAGE_SIZE, Some(ACTIVE_STATE))
            .await?;
        // The status filter is the provider's; plans reporting another
        // state are dropped here as well.
        let plan = plans
            .into_iter()
            .filter(|p| p.state.is_none() || p.is_active())
            .find(|p| p.name == name)
            .ok_or_else(|| FacadeError::PlanNotFound(name.to_string()))?;
        plan.id.ok_or(FacadeError::MissingField("plan id"))
    }

    async fn create_and_activate(&self, params: &RecurringPlanParams) -> Result<String, FacadeError> {
        let plan = params.to_plan(&self.currency);
        let created: Plan = self.call(HttpMethod::Post, PLANS, Some(&plan)).await?;
        let plan_id = created.id.ok_or(FacadeError::MissingField("plan id"))?;

        let patch = serde_json::to_value(Patch::activate_plan())
            .map_err(|e| FacadeError::Gateway(e.into()))?;
        if let Err(source) = self
            .gateway
            .request(HttpMethod::Patch, &format!("{PLANS}/{plan_id}"), Some(patch))
            .await
        {
            return Err(FacadeError::PartialFailure { plan_id, source });
        }

        tracing::info!("Created and activated plan {}", plan_id);
        Ok(plan_id)
    }

    async fn execute_agreement(&self, token: &str) -> Result<bool, FacadeError> {
        let token = path_segment("agreement token", token)?;
        let executed: Agreement = self
            .call(
                HttpMethod::Post,
                &format!("{AGREEMENTS}/{token}/agreement-execute"),
                Some(&serde_json::json!({})),
            )
            .await?;
        let id = executed
            .id
            .ok_or(FacadeError::MissingField("agreement id"))?;

        let confirmed: Agreement = self
            .call::<_, ()>(
                HttpMethod::Get,
                &format!("{AGREEMENTS}/{}", path_segment("agreement id", &id)?),
                None,
            )
            .await?;
        Ok(confirmed.is_active())
    }

    async fn submit_payment(
        &self,
        items: &[CartItem],
        description: &str,
        redirect_urls: RedirectUrls,
        tax: Decimal,
        shipping: Decimal,
    ) -> Result<Payment, FacadeError> {
        let request = PaymentRequest::new(
            items,
            description,
            redirect_urls,
            tax,
            shipping,
            &self.currency,
        )?;
        tracing::debug!("Payment total {} {}", request.total(), self.currency);
        self.call(HttpMethod::Post, PAYMENTS, Some(&request)).await
    }

    async fn execute_payment(&self, payment_id: &str, payer_id: &str) -> Result<bool, FacadeError> {
        let payment_id = path_segment("payment id", payment_id)?;
        let payment: Payment = self
            .call::<_, ()>(HttpMethod::Get, &format!("{PAYMENTS}/{payment_id}"), None)
            .await?;

        let execution = PaymentExecution {
            payer_id: payer_id.to_string(),
        };
        let executed: Payment = self
            .call(
                HttpMethod::Post,
                &format!("{PAYMENTS}/{}/execute", path_segment("payment id", &payment.id)?),
                Some(&execution),
            )
            .await?;
        Ok(executed.is_approved())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────────

    async fn fetch_plans(
        &self,
        page_size: u32,
        status: Option<&str>,
    ) -> Result<Vec<Plan>, FacadeError> {
        let mut resource = format!("{PLANS}?page_size={page_size}");
        if let Some(status) = status {
            resource.push_str("&status=");
            resource.push_str(status);
        }
        let list: PlanList = self.call::<_, ()>(HttpMethod::Get, &resource, None).await?;
        Ok(list.plans)
    }

    async fn call<T, B>(
        &self,
        method: HttpMethod,
        resource: &str,
        body: Option<&B>,
    ) -> Result<T, FacadeError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let body: Option<Value> = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| FacadeError::Gateway(e.into()))?;
        let response = self.gateway.request(method, resource, body).await?;
        serde_json::from_value(response).map_err(|e| FacadeError::Gateway(e.into()))
    }

    /// Records a failed result exactly once, then hands it back.
    fn record<T>(
        &self,
        operation: &'static str,
        result: Result<T, FacadeError>,
    ) -> Result<T, FacadeError> {
        if let Err(err) = &result {
            let kind = err.kind();
            let message = err.to_string();
            tracing::warn!(operation, %kind, "{}", message);
            if let Some(sink) = &self.audit {
                sink.record(operation, kind, &message);
            }
            self.errors.push(message);
        }
        result
    }
}
