//! Billing agreement domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::link::{self, Link};
use super::wire;

/// Payment method for payers approving with their provider account.
pub const ACCOUNT_PAYMENT_METHOD: &str = "paypal";

/// Who pays, and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    pub payment_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Payer {
    /// A payer approving through the provider's account-based flow.
    pub fn account() -> Self {
        Self {
            payment_method: ACCOUNT_PAYMENT_METHOD.to_string(),
            status: None,
        }
    }
}

/// Reference to an existing plan by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanReference {
    pub id: String,
}

/// Body of the create-agreement call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAgreement {
    pub name: String,
    pub description: String,
    #[serde(with = "wire::utc_seconds")]
    pub start_date: DateTime<Utc>,
    pub plan: PlanReference,
    pub payer: Payer,
}

impl NewAgreement {
    pub fn new(
        plan_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        start_date: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            start_date,
            plan: PlanReference { id: plan_id.into() },
            payer: Payer::account(),
        }
    }
}

/// An agreement as returned by the provider.
///
/// A freshly created agreement has no id yet; it carries the approval link
/// the payer must visit. After execution the id and state are filled in.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Agreement {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub payer: Option<Payer>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Agreement {
    pub fn approval_url(&self) -> Option<&str> {
        link::approval_url(&self.links)
    }

    /// Returns true if the agreement state is ACTIVE, ignoring case.
    pub fn is_active(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("ACTIVE"))
    }
}
