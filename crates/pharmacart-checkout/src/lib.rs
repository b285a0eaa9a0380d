//! Turns a cart into a server-side order and follows it afterwards.

pub mod classify;
pub mod confirmation;
pub mod draft;
pub mod error;
pub mod orchestrator;
pub mod tracker;

pub use classify::classify_order_type;
pub use confirmation::{
    payment_key, ConfirmationItem, ConfirmationStore, OrderConfirmation, LAST_ORDER_KEY,
};
pub use draft::{CustomerIdentity, CustomerInfo, OrderDraft, PaymentInfo};
pub use error::{CheckoutError, ValidationError};
pub use orchestrator::CheckoutOrchestrator;
pub use tracker::{OrderTracker, Reconciliation};
