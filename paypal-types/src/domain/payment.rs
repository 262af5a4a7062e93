//! One-off payment (sale) domain model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::agreement::Payer;
use super::link::{self, Link};
use super::money::CurrencyCode;
use super::wire;
use crate::error::DomainError;

/// Payment state the provider reports after a successful execution.
/// Compared case-sensitively.
pub const APPROVED_STATE: &str = "approved";

/// Something the payer is buying: a name and a unit price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl CartItem {
    /// Creates an item with quantity 1.
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            price,
            quantity: 1,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }
}

/// Line item as sent inside a transaction's item list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub currency: CurrencyCode,
    #[serde(with = "wire::u32_string")]
    pub quantity: u32,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemList {
    #[serde(default)]
    pub items: Vec<LineItem>,
}

/// Breakdown of the total. Tax and shipping are only present when positive.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Details {
    pub subtotal: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub currency: CurrencyCode,
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_list: Option<ItemList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectUrls {
    pub return_url: String,
    pub cancel_url: String,
}

impl RedirectUrls {
    pub fn new(return_url: impl Into<String>, cancel_url: impl Into<String>) -> Self {
        Self {
            return_url: return_url.into(),
            cancel_url: cancel_url.into(),
        }
    }
}

/// Body of the create-payment call: a single immediate-sale transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    pub intent: String,
    pub payer: Payer,
    pub redirect_urls: RedirectUrls,
    pub transactions: Vec<Transaction>,
}

impl PaymentRequest {
    /// Builds the request, computing `subtotal = Σ price × quantity` and
    /// `total = subtotal + tax + shipping`.
    ///
    /// Non-positive tax or shipping counts as zero and is left out of the
    /// breakdown.
    pub fn new(
        items: &[CartItem],
        description: impl Into<String>,
        redirect_urls: RedirectUrls,
        tax: Decimal,
        shipping: Decimal,
        currency: &CurrencyCode,
    ) -> Result<Self, DomainError> {
        let mut subtotal = Decimal::ZERO;
        let mut line_items = Vec::with_capacity(items.len());
        for item in items {
            let line_total = item
                .price
                .checked_mul(Decimal::from(item.quantity))
                .ok_or(DomainError::Overflow)?;
            subtotal = subtotal
                .checked_add(line_total)
                .ok_or(DomainError::Overflow)?;
            line_items.push(LineItem {
                name: item.name.clone(),
                currency: currency.clone(),
                quantity: item.quantity,
                price: item.price,
            });
        }

        let tax = (tax > Decimal::ZERO).then_some(tax);
        let shipping = (shipping > Decimal::ZERO).then_some(shipping);
        let total = subtotal
            .checked_add(tax.unwrap_or_default())
            .and_then(|t| t.checked_add(shipping.unwrap_or_default()))
            .ok_or(DomainError::Overflow)?;

        let transaction = Transaction {
            amount: Amount {
                currency: currency.clone(),
                total,
                details: Some(Details {
                    subtotal,
                    tax,
                    shipping,
                }),
            },
            item_list: Some(ItemList { items: line_items }),
            description: Some(description.into()),
        };

        Ok(Self {
            intent: "sale".to_string(),
            payer: Payer::account(),
            redirect_urls,
            transactions: vec![transaction],
        })
    }

    fn amount(&self) -> Option<&Amount> {
        self.transactions.first().map(|t| &t.amount)
    }

    pub fn total(&self) -> Decimal {
        self.amount().map(|a| a.total).unwrap_or_default()
    }

    pub fn subtotal(&self) -> Decimal {
        self.details().map(|d| d.subtotal).unwrap_or_default()
    }

    pub fn details(&self) -> Option<&Details> {
        self.amount().and_then(|a| a.details.as_ref())
    }
}

/// Body of the execute-payment call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentExecution {
    pub payer_id: String,
}

/// A payment as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub payer: Option<Payer>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Payment {
    pub fn approval_url(&self) -> Option<&str> {
        link::approval_url(&self.links)
    }

    /// Exact, case-sensitive comparison against `"approved"`.
    pub fn is_approved(&self) -> bool {
        self.state.as_deref() == Some(APPROVED_STATE)
    }
}
