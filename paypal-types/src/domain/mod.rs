//! Domain models for the payment facade.

pub mod agreement;
pub mod credentials;
pub mod link;
pub mod money;
pub mod payment;
pub mod plan;
mod wire;

pub use agreement::{Agreement, NewAgreement, Payer, PlanReference};
pub use credentials::{AccessToken, Credentials};
pub use link::Link;
pub use money::{CurrencyCode, Money};
pub use payment::{
    Amount, CartItem, Details, ItemList, LineItem, Payment, PaymentExecution, PaymentRequest,
    RedirectUrls, Transaction,
};
pub use plan::{
    Frequency, MerchantPreferences, Patch, PaymentDefinition, PaymentDefinitionType, Plan,
    PlanList, PlanType, RecurringPlanParams,
};
