//! Shared domain types and configuration for the pharmacy storefront client.

pub mod app_config;
pub mod config;
pub mod orders;
pub mod pricing_policy;
pub mod products;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use orders::{CustomerTier, OrderStatus, OrderType, PaymentMethod};
pub use pricing_policy::{load_pricing_policy, PricingPolicy};
pub use products::{CartLineItem, Product, ProductId, ProductType};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read pricing file {path}: {source}")]
    PricingFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse pricing file: {0}")]
    PricingFileParse(#[source] serde_yaml::Error),

    #[error("pricing policy validation failed: {0}")]
    Validation(String),
}
