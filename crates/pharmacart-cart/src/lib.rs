//! Client-side shopping cart, its durable storage, and the pricing calculator.

pub mod error;
pub mod pricing;
pub mod storage;
pub mod store;

pub use error::{PricingError, StorageError};
pub use pricing::{subtotal, PresentationMode, PricingBreakdown, PricingCalculator};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{cart_key, CartSnapshot, CartStore, SubscriptionId, CART_KEY};
