//! Billing plan domain model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::link::{self, Link};
use super::money::{CurrencyCode, Money};
use super::wire;
use crate::error::DomainError;

/// State a plan must be in before agreements can be created against it.
pub const ACTIVE_STATE: &str = "ACTIVE";

/// How often a payment definition bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Day => "DAY",
            Frequency::Week => "WEEK",
            Frequency::Month => "MONTH",
            Frequency::Year => "YEAR",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// The provider echoes frequencies back as "Month", so parsing ignores case.
impl FromStr for Frequency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DAY" => Ok(Frequency::Day),
            "WEEK" => Ok(Frequency::Week),
            "MONTH" => Ok(Frequency::Month),
            "YEAR" => Ok(Frequency::Year),
            _ => Err(DomainError::ValidationError(format!(
                "Unknown billing frequency: {}",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.as_str().to_string()
    }
}

/// Whether a plan bills forever or for a fixed number of cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanType {
    #[default]
    Infinite,
    Fixed,
}

/// Kind of payment definition inside a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentDefinitionType {
    #[default]
    Regular,
    Trial,
}

/// One billing schedule of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub definition_type: PaymentDefinitionType,
    pub frequency: Frequency,
    #[serde(with = "wire::u32_string")]
    pub frequency_interval: u32,
    /// Number of billing cycles; `0` means unlimited.
    #[serde(with = "wire::u32_string", default)]
    pub cycles: u32,
    pub amount: Money,
}

/// Merchant-side settings: redirect URLs, setup fee and failure handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_fee: Option<Money>,
    pub return_url: String,
    pub cancel_url: String,
    #[serde(default)]
    pub auto_bill_amount: String,
    #[serde(default)]
    pub initial_fail_amount_action: String,
    #[serde(default)]
    pub max_fail_attempts: String,
}

impl MerchantPreferences {
    /// Preferences used for every plan this crate creates: bill
    /// automatically, continue on initial failure, unlimited retries.
    pub fn recurring(return_url: String, cancel_url: String, setup_fee: Money) -> Self {
        Self {
            setup_fee: Some(setup_fee),
            return_url,
            cancel_url,
            auto_bill_amount: "YES".to_string(),
            initial_fail_amount_action: "CONTINUE".to_string(),
            max_fail_attempts: "0".to_string(),
        }
    }
}

/// A billing plan, either about to be created or as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub plan_type: PlanType,
    /// Provider state: CREATED, ACTIVE, INACTIVE or DELETED.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payment_definitions: Vec<PaymentDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_preferences: Option<MerchantPreferences>,
    #[serde(default, skip_serializing)]
    pub links: Vec<Link>,
}

impl Plan {
    /// Returns true if the provider reports the plan as ACTIVE.
    ///
    /// Plans without a reported state are not treated as active.
    pub fn is_active(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(ACTIVE_STATE))
    }

    pub fn approval_url(&self) -> Option<&str> {
        link::approval_url(&self.links)
    }
}

/// Page of plans from the list endpoint. The provider omits `plans`
/// entirely when the page is empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanList {
    #[serde(default)]
    pub plans: Vec<Plan>,
    #[serde(default)]
    pub total_items: Option<String>,
    #[serde(default)]
    pub total_pages: Option<String>,
}

/// A JSON-patch operation as accepted by the plan update endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub op: String,
    pub path: String,
    pub value: serde_json::Value,
}

impl Patch {
    /// Patch that moves a CREATED plan to ACTIVE.
    pub fn activate_plan() -> Vec<Patch> {
        vec![Patch {
            op: "replace".to_string(),
            path: "/".to_string(),
            value: serde_json::json!({ "state": ACTIVE_STATE }),
        }]
    }
}

/// Parameters for creating a recurring plan with one regular definition.
///
/// Frequency, interval and plan type default to monthly, every 1 period,
/// infinite.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringPlanParams {
    pub name: String,
    pub description: String,
    pub payment_name: String,
    pub upfront_amount: Decimal,
    pub recurring_amount: Decimal,
    pub success_url: String,
    pub fail_url: String,
    pub frequency: Frequency,
    pub interval: u32,
    pub plan_type: PlanType,
    pub cycles: u32,
}

impl RecurringPlanParams {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        upfront_amount: Decimal,
        recurring_amount: Decimal,
        name: impl Into<String>,
        description: impl Into<String>,
        payment_name: impl Into<String>,
        success_url: impl Into<String>,
        fail_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            payment_name: payment_name.into(),
            upfront_amount,
            recurring_amount,
            success_url: success_url.into(),
            fail_url: fail_url.into(),
            frequency: Frequency::default(),
            interval: 1,
            plan_type: PlanType::default(),
            cycles: 0,
        }
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_plan_type(mut self, plan_type: PlanType) -> Self {
        self.plan_type = plan_type;
        self
    }

    /// Sets the number of billing cycles (FIXED plans need a non-zero value).
    pub fn with_cycles(mut self, cycles: u32) -> Self {
        self.cycles = cycles;
        self
    }

    /// Builds the plan body sent to the create endpoint.
    pub fn to_plan(&self, currency: &CurrencyCode) -> Plan {
        let definition = PaymentDefinition {
            id: None,
            name: self.payment_name.clone(),
            definition_type: PaymentDefinitionType::Regular,
            frequency: self.frequency,
            frequency_interval: self.interval,
            cycles: self.cycles,
            amount: Money::new(self.recurring_amount, currency.clone()),
        };

        Plan {
            id: None,
            name: self.name.clone(),
            description: self.description.clone(),
            plan_type: self.plan_type,
            state: None,
            payment_definitions: vec![definition],
            merchant_preferences: Some(MerchantPreferences::recurring(
                self.success_url.clone(),
                self.fail_url.clone(),
                Money::new(self.upfront_amount, currency.clone()),
            )),
            links: Vec::new(),
        }
    }
}
