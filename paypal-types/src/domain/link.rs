//! HATEOAS links returned with provider resources.

use serde::{Deserialize, Serialize};

/// A link attached to a resource (`href` + relation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Finds the href the payer must be redirected to for approval.
pub fn approval_url(links: &[Link]) -> Option<&str> {
    links
        .iter()
        .find(|l| l.rel == "approval_url" || l.rel == "approve")
        .map(|l| l.href.as_str())
}
