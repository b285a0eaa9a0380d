use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Storefront pricing constants, in whole currency units.
///
/// The defaults match the live storefront: free shipping from 300 000, a flat
/// 30 000 fee below that, 5 % VIP discount and 10 % tax on the checkout summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingPolicy {
    pub free_shipping_threshold: Decimal,
    pub flat_shipping_fee: Decimal,
    /// Fraction of the subtotal, e.g. `0.05`.
    pub vip_discount_rate: Decimal,
    /// Fraction of the subtotal, e.g. `0.10`.
    pub tax_rate: Decimal,
}

impl PricingPolicy {
    pub const FREE_SHIPPING_THRESHOLD: i64 = 300_000;
    pub const FLAT_SHIPPING_FEE: i64 = 30_000;
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Decimal::from(Self::FREE_SHIPPING_THRESHOLD),
            flat_shipping_fee: Decimal::from(Self::FLAT_SHIPPING_FEE),
            vip_discount_rate: Decimal::new(5, 2),
            tax_rate: Decimal::new(10, 2),
        }
    }
}

/// Load and validate a pricing policy from a YAML file.
///
/// Keys that are absent keep their default value.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_pricing_policy(path: &Path) -> Result<PricingPolicy, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PricingFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let policy: PricingPolicy =
        serde_yaml::from_str(&content).map_err(ConfigError::PricingFileParse)?;

    validate_policy(&policy)?;

    Ok(policy)
}

fn validate_policy(policy: &PricingPolicy) -> Result<(), ConfigError> {
    if policy.free_shipping_threshold.is_sign_negative() {
        return Err(ConfigError::Validation(format!(
            "free_shipping_threshold must be non-negative, got {}",
            policy.free_shipping_threshold
        )));
    }

    if policy.flat_shipping_fee.is_sign_negative() {
        return Err(ConfigError::Validation(format!(
            "flat_shipping_fee must be non-negative, got {}",
            policy.flat_shipping_fee
        )));
    }

    for (name, rate) in [
        ("vip_discount_rate", policy.vip_discount_rate),
        ("tax_rate", policy.tax_rate),
    ] {
        if rate.is_sign_negative() || rate > Decimal::ONE {
            return Err(ConfigError::Validation(format!(
                "{name} must be between 0 and 1, got {rate}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "pricing_policy_test.rs"]
mod tests;
