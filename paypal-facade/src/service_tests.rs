//! PaymentFacade unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    use paypal_types::{
        AccessToken, AuditSink, CartItem, Credentials, CurrencyCode, ErrorKind, FacadeError,
        GatewayClient, GatewayError, HttpMethod, RecurringPlanParams,
    };

    use crate::{ErrorLog, PaymentFacade};

    /// Canned provider answer.
    enum Reply {
        Json(Value),
        Empty,
        Rejected(u16, &'static str),
    }

    impl Reply {
        fn into_result(self) -> Result<Value, GatewayError> {
            match self {
                Reply::Json(v) => Ok(v),
                Reply::Empty => Ok(Value::Null),
                Reply::Rejected(status, name) => Err(GatewayError::Api {
                    status,
                    name: name.to_string(),
                    message: "rejected by mock".to_string(),
                    debug_id: None,
                }),
            }
        }
    }

    /// Scripted gateway: answers per `(method, resource)` in order and
    /// records every call it receives. Unscripted calls fail as if the
    /// provider were unreachable.
    pub struct MockGateway {
        replies: Mutex<HashMap<(HttpMethod, String), VecDeque<Reply>>>,
        calls: Mutex<Vec<(HttpMethod, String, Option<Value>)>>,
    }

    impl MockGateway {
        pub fn new() -> Self {
            Self {
                replies: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn on(self, method: HttpMethod, resource: &str, reply: Reply) -> Self {
            self.replies
                .lock()
                .unwrap()
                .entry((method, resource.to_string()))
                .or_default()
                .push_back(reply);
            self
        }

        fn calls(&self) -> Vec<(HttpMethod, String, Option<Value>)> {
            self.calls.lock().unwrap().clone()
        }

        fn body_of(&self, method: HttpMethod, resource: &str) -> Value {
            self.calls()
                .into_iter()
                .find(|(m, r, _)| *m == method && r == resource)
                .and_then(|(_, _, body)| body)
                .unwrap_or(Value::Null)
        }
    }

    #[async_trait]
    impl GatewayClient for MockGateway {
        async fn authenticate(
            &self,
            _credentials: &Credentials,
        ) -> Result<AccessToken, GatewayError> {
            Ok(AccessToken::new("mock-token", "Bearer", 3600, Utc::now()))
        }

        async fn request(
            &self,
            method: HttpMethod,
            resource: &str,
            body: Option<Value>,
        ) -> Result<Value, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push((method, resource.to_string(), body));
            let reply = self
                .replies
                .lock()
                .unwrap()
                .get_mut(&(method, resource.to_string()))
                .and_then(|queue| queue.pop_front());
            match reply {
                Some(reply) => reply.into_result(),
                None => Err(GatewayError::Connection(format!(
                    "no route to {} {}",
                    method, resource
                ))),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        entries: Mutex<Vec<(&'static str, ErrorKind)>>,
    }

    impl AuditSink for RecordingSink {
        fn record(&self, operation: &'static str, kind: ErrorKind, _message: &str) {
            self.entries.lock().unwrap().push((operation, kind));
        }
    }

    const PLAN_SEARCH: &str = "/v1/payments/billing-plans?page_size=20&status=ACTIVE";

    fn facade(gateway: MockGateway) -> PaymentFacade<MockGateway> {
        PaymentFacade::new(gateway, CurrencyCode::new("AUD"))
    }

    fn plan(id: &str, name: &str, state: &str) -> Value {
        json!({ "id": id, "name": name, "description": "", "type": "INFINITE", "state": state })
    }

    fn payment(id: &str, state: &str) -> Value {
        json!({
            "id": id,
            "intent": "sale",
            "state": state,
            "links": [{
                "href": format!("https://www.sandbox.paypal.com/checkoutnow?token=EC-{id}"),
                "rel": "approval_url",
                "method": "REDIRECT"
            }]
        })
    }

    fn params() -> RecurringPlanParams {
        RecurringPlanParams::new(
            dec!(5.00),
            dec!(19.95),
            "Gold",
            "Gold membership",
            "Monthly fee",
            "https://shop.example/success",
            "https://shop.example/fail",
        )
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payments
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_payment_computes_totals() {
        let gateway = MockGateway::new().on(
            HttpMethod::Post,
            "/v1/payments/payment",
            Reply::Json(payment("PAY-1", "created")),
        );
        let facade = facade(gateway);
        let items = [
            CartItem::new("Shirt", dec!(10.00)),
            CartItem::new("Socks", dec!(5.00)),
        ];

        let payment = facade
            .create_payment(
                &items,
                "Order 42",
                "https://shop.example/success",
                "https://shop.example/fail",
                Decimal::ZERO,
                dec!(2.00),
            )
            .await
            .unwrap();

        assert_eq!(payment.id, "PAY-1");
        assert!(payment.approval_url().is_some());

        let body = facade
            .gateway()
            .body_of(HttpMethod::Post, "/v1/payments/payment");
        let amount = &body["transactions"][0]["amount"];
        assert_eq!(body["intent"], "sale");
        assert_eq!(body["payer"]["payment_method"], "paypal");
        assert_eq!(amount["currency"], "AUD");
        assert_eq!(amount["total"], "17.00");
        assert_eq!(amount["details"]["subtotal"], "15.00");
        assert_eq!(amount["details"]["shipping"], "2.00");
        assert!(amount["details"].get("tax").is_none());
        assert_eq!(
            body["redirect_urls"]["return_url"],
            "https://shop.example/success"
        );
        assert_eq!(
            body["transactions"][0]["item_list"]["items"][1]["name"],
            "Socks"
        );
        assert!(facade.errors().is_empty());
    }

    #[tokio::test]
    async fn test_create_simple_payment_sends_single_item() {
        let gateway = MockGateway::new().on(
            HttpMethod::Post,
            "/v1/payments/payment",
            Reply::Json(payment("PAY-2", "created")),
        );
        let facade = facade(gateway);

        facade
            .create_simple_payment(
                dec!(25.00),
                "Ticket",
                "Concert ticket",
                "https://shop.example/success",
                "https://shop.example/fail",
                dec!(2.50),
                Decimal::ZERO,
            )
            .await
            .unwrap();

        let body = facade
            .gateway()
            .body_of(HttpMethod::Post, "/v1/payments/payment");
        let amount = &body["transactions"][0]["amount"];
        assert_eq!(amount["total"], "27.50");
        assert_eq!(amount["details"]["tax"], "2.50");
        assert!(amount["details"].get("shipping").is_none());
        assert_eq!(
            body["transactions"][0]["item_list"]["items"]
                .as_array()
                .map(Vec::len),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_confirm_payment_only_approved_is_true() {
        for (state, expected) in [("approved", true), ("created", false), ("failed", false)] {
            let gateway = MockGateway::new()
                .on(
                    HttpMethod::Get,
                    "/v1/payments/payment/PAY-1",
                    Reply::Json(payment("PAY-1", "created")),
                )
                .on(
                    HttpMethod::Post,
                    "/v1/payments/payment/PAY-1/execute",
                    Reply::Json(payment("PAY-1", state)),
                );
            let facade = facade(gateway);

            let confirmed = facade.confirm_payment("PAY-1", "PAYER-9").await.unwrap();

            assert_eq!(confirmed, expected, "state {state}");
            assert_eq!(
                facade
                    .gateway()
                    .body_of(HttpMethod::Post, "/v1/payments/payment/PAY-1/execute"),
                json!({ "payer_id": "PAYER-9" })
            );
            assert!(facade.errors().is_empty());
        }
    }

    #[tokio::test]
    async fn test_confirm_payment_unknown_id_is_error() {
        let gateway = MockGateway::new().on(
            HttpMethod::Get,
            "/v1/payments/payment/PAY-404",
            Reply::Rejected(404, "INVALID_RESOURCE_ID"),
        );
        let facade = facade(gateway);

        let err = facade
            .confirm_payment("PAY-404", "PAYER-9")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(facade.errors().len(), 1);
        // Execution is never attempted.
        assert_eq!(facade.gateway().calls().len(), 1);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Plans
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_list_plans_truncates_to_page_size() {
        let gateway = MockGateway::new().on(
            HttpMethod::Get,
            "/v1/payments/billing-plans?page_size=2",
            Reply::Json(json!({
                "plans": [
                    plan("P-1", "Bronze", "ACTIVE"),
                    plan("P-2", "Silver", "ACTIVE"),
                    plan("P-3", "Gold", "ACTIVE"),
                ]
            })),
        );
        let facade = facade(gateway);

        let plans = facade.list_plans(2).await.unwrap();

        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].id.as_deref(), Some("P-1"));
    }

    #[tokio::test]
    async fn test_list_plans_empty_page() {
        let gateway = MockGateway::new().on(
            HttpMethod::Get,
            "/v1/payments/billing-plans?page_size=10",
            Reply::Json(json!({})),
        );
        let facade = facade(gateway);

        assert!(facade.list_plans(10).await.unwrap().is_empty());
        assert!(facade.errors().is_empty());
    }

    #[tokio::test]
    async fn test_find_plan_returns_first_active_match() {
        let gateway = MockGateway::new().on(
            HttpMethod::Get,
            PLAN_SEARCH,
            Reply::Json(json!({
                "plans": [
                    plan("P-1", "Silver", "ACTIVE"),
                    plan("P-2", "Gold", "INACTIVE"),
                    plan("P-3", "Gold", "ACTIVE"),
                    plan("P-4", "Gold", "ACTIVE"),
                ]
            })),
        );
        let facade = facade(gateway);

        let id = facade.find_plan_id_by_name("Gold").await.unwrap();

        assert_eq!(id, "P-3");
    }

    #[tokio::test]
    async fn test_find_plan_ignores_inactive_only_matches() {
        let gateway = MockGateway::new().on(
            HttpMethod::Get,
            PLAN_SEARCH,
            Reply::Json(json!({ "plans": [plan("P-2", "Gold", "INACTIVE")] })),
        );
        let facade = facade(gateway);

        let err = facade.find_plan_id_by_name("Gold").await.unwrap_err();

        assert!(matches!(err, FacadeError::PlanNotFound(ref name) if name == "Gold"));
        assert_eq!(err.kind(), ErrorKind::Logic);
        assert_eq!(facade.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_find_plan_name_is_case_sensitive() {
        let gateway = MockGateway::new().on(
            HttpMethod::Get,
            PLAN_SEARCH,
            Reply::Json(json!({ "plans": [plan("P-1", "Gold", "ACTIVE")] })),
        );
        let facade = facade(gateway);

        assert!(facade.find_plan_id_by_name("gold").await.is_err());
    }

    #[tokio::test]
    async fn test_create_recurring_plan_activates_it() {
        let gateway = MockGateway::new()
            .on(
                HttpMethod::Post,
                "/v1/payments/billing-plans",
                Reply::Json(plan("P-7", "Gold", "CREATED")),
            )
            .on(
                HttpMethod::Patch,
                "/v1/payments/billing-plans/P-7",
                Reply::Empty,
            );
        let facade = facade(gateway);

        let id = facade.create_recurring_plan(params()).await.unwrap();

        assert_eq!(id, "P-7");
        let created = facade
            .gateway()
            .body_of(HttpMethod::Post, "/v1/payments/billing-plans");
        assert_eq!(created["name"], "Gold");
        assert_eq!(created["type"], "INFINITE");
        assert_eq!(created["payment_definitions"][0]["frequency"], "MONTH");
        assert_eq!(created["payment_definitions"][0]["amount"]["value"], "19.95");
        assert_eq!(created["merchant_preferences"]["setup_fee"]["value"], "5.00");
        assert_eq!(
            facade
                .gateway()
                .body_of(HttpMethod::Patch, "/v1/payments/billing-plans/P-7"),
            json!([{ "op": "replace", "path": "/", "value": { "state": "ACTIVE" } }])
        );
        assert!(facade.errors().is_empty());
    }

    #[tokio::test]
    async fn test_activation_failure_is_partial() {
        let gateway = MockGateway::new()
            .on(
                HttpMethod::Post,
                "/v1/payments/billing-plans",
                Reply::Json(plan("P-8", "Gold", "CREATED")),
            )
            .on(
                HttpMethod::Patch,
                "/v1/payments/billing-plans/P-8",
                Reply::Rejected(400, "BUSINESS_VALIDATION_ERROR"),
            );
        let facade = facade(gateway);

        let err = facade.create_recurring_plan(params()).await.unwrap_err();

        assert!(err.is_partial());
        match &err {
            FacadeError::PartialFailure { plan_id, .. } => assert_eq!(plan_id, "P-8"),
            other => panic!("expected partial failure, got {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(facade.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_create_failure_skips_activation() {
        let gateway = MockGateway::new().on(
            HttpMethod::Post,
            "/v1/payments/billing-plans",
            Reply::Rejected(400, "VALIDATION_ERROR"),
        );
        let facade = facade(gateway);

        let err = facade.create_recurring_plan(params()).await.unwrap_err();

        assert!(!err.is_partial());
        assert_eq!(facade.gateway().calls().len(), 1);
        assert_eq!(facade.errors().len(), 1);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Agreements
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_agreement_body() {
        let gateway = MockGateway::new().on(
            HttpMethod::Post,
            "/v1/payments/billing-agreements",
            Reply::Json(json!({
                "name": "Gold agreement",
                "description": "Gold membership",
                "links": [{
                    "href": "https://www.sandbox.paypal.com/cgi-bin/webscr?cmd=_express-checkout&token=EC-5",
                    "rel": "approval_url",
                    "method": "REDIRECT"
                }]
            })),
        );
        let facade = facade(gateway);
        let start = Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap();

        let agreement = facade
            .create_agreement("P-7", "Gold agreement", "Gold membership", start)
            .await
            .unwrap();

        assert!(agreement.id.is_none());
        assert!(agreement.approval_url().unwrap().contains("EC-5"));

        let body = facade
            .gateway()
            .body_of(HttpMethod::Post, "/v1/payments/billing-agreements");
        assert_eq!(body["plan"]["id"], "P-7");
        assert_eq!(body["payer"]["payment_method"], "paypal");
        assert_eq!(body["start_date"], "2026-11-01T00:00:00Z");
    }

    #[tokio::test]
    async fn test_confirm_subscription_state_is_case_insensitive() {
        for (state, expected) in [
            ("Active", true),
            ("ACTIVE", true),
            ("active", true),
            ("Pending", false),
        ] {
            let gateway = MockGateway::new()
                .on(
                    HttpMethod::Post,
                    "/v1/payments/billing-agreements/EC-5/agreement-execute",
                    Reply::Json(json!({ "id": "I-1", "state": "Pending" })),
                )
                .on(
                    HttpMethod::Get,
                    "/v1/payments/billing-agreements/I-1",
                    Reply::Json(json!({ "id": "I-1", "state": state })),
                );
            let facade = facade(gateway);

            let active = facade.confirm_subscription("EC-5").await.unwrap();

            assert_eq!(active, expected, "state {state}");
        }
    }

    #[tokio::test]
    async fn test_confirm_subscription_without_id_is_error() {
        let gateway = MockGateway::new().on(
            HttpMethod::Post,
            "/v1/payments/billing-agreements/EC-5/agreement-execute",
            Reply::Json(json!({ "state": "Active" })),
        );
        let facade = facade(gateway);

        let err = facade.confirm_subscription("EC-5").await.unwrap_err();

        assert!(matches!(err, FacadeError::MissingField(_)));
        assert_eq!(facade.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_ids_must_be_single_path_segments() {
        let facade = facade(MockGateway::new());

        for payment_id in ["PAY-1/execute", "PAY-1?x=1", "../PAY-1", "PAY 1", ""] {
            let err = facade
                .confirm_payment(payment_id, "PAYER-9")
                .await
                .unwrap_err();
            assert!(matches!(err, FacadeError::Domain(_)), "{payment_id:?}: {err:?}");
            assert_eq!(err.kind(), ErrorKind::Logic);
        }
        for token in ["EC-5/../I-1", "EC-5#frag", "EC-%2F"] {
            assert!(facade.confirm_subscription(token).await.is_err(), "{token:?}");
        }

        assert!(facade.gateway().calls().is_empty());
        assert_eq!(facade.errors().len(), 8);
    }

    #[tokio::test]
    async fn test_provider_ids_are_checked_before_reuse() {
        let gateway = MockGateway::new().on(
            HttpMethod::Post,
            "/v1/payments/billing-agreements/EC-5/agreement-execute",
            Reply::Json(json!({ "id": "I-1/cancel", "state": "Active" })),
        );
        let facade = facade(gateway);

        let err = facade.confirm_subscription("EC-5").await.unwrap_err();

        assert!(matches!(err, FacadeError::Domain(_)));
        assert_eq!(facade.gateway().calls().len(), 1);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Error recording
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_each_failure_recorded_once() {
        let facade = facade(MockGateway::new());
        let start = Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap();

        assert!(facade.list_plans(5).await.is_err());
        assert!(facade.find_plan_id_by_name("Gold").await.is_err());
        assert!(facade.create_recurring_plan(params()).await.is_err());
        assert!(
            facade
                .create_agreement("P-1", "n", "d", start)
                .await
                .is_err()
        );
        assert!(facade.confirm_subscription("EC-1").await.is_err());
        assert!(facade.confirm_payment("PAY-1", "PAYER-1").await.is_err());
        assert!(
            facade
                .create_payment(
                    &[CartItem::new("Shirt", dec!(10.00))],
                    "Order 43",
                    "https://shop.example/success",
                    "https://shop.example/fail",
                    Decimal::ZERO,
                    Decimal::ZERO,
                )
                .await
                .is_err()
        );

        let errors = facade.errors();
        assert_eq!(errors.len(), 7);
        assert!(errors.iter().all(|e| e.starts_with("Connection error")));
        assert_eq!(facade.error_log().len(), 7);
    }

    #[tokio::test]
    async fn test_success_records_nothing() {
        let gateway = MockGateway::new().on(
            HttpMethod::Get,
            "/v1/payments/billing-plans?page_size=1",
            Reply::Json(json!({ "plans": [] })),
        );
        let facade = facade(gateway);

        facade.list_plans(1).await.unwrap();

        assert!(facade.error_log().is_empty());
    }

    #[tokio::test]
    async fn test_audit_sink_receives_failures() {
        let sink = Arc::new(RecordingSink::default());
        let facade = facade(MockGateway::new()).with_audit_sink(sink.clone());

        let _ = facade.list_plans(5).await;
        let _ = facade.confirm_payment("PAY-1", "PAYER-1").await;

        let entries = sink.entries.lock().unwrap().clone();
        assert_eq!(
            entries,
            vec![
                ("list_plans", ErrorKind::Connection),
                ("confirm_payment", ErrorKind::Connection),
            ]
        );
        assert_eq!(facade.errors().len(), 2);
    }

    #[tokio::test]
    async fn test_shared_error_log_as_sink() {
        let shared = Arc::new(ErrorLog::new());
        let first = facade(MockGateway::new()).with_audit_sink(shared.clone());
        let second = facade(MockGateway::new()).with_audit_sink(shared.clone());

        let _ = first.list_plans(1).await;
        let _ = second.find_plan_id_by_name("Gold").await;

        assert_eq!(shared.len(), 2);
        assert!(shared.snapshot()[1].starts_with("[CONNECTION] find_plan_id_by_name:"));
    }
}
