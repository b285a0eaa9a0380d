//! Pure price derivation for a cart.
//!
//! Everything here is a function of the cart lines, the customer tier and the
//! [`PricingPolicy`]; nothing is cached, so totals always follow the current
//! product prices.

use pharmacart_core::{CartLineItem, PricingPolicy};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::PricingError;

/// Which screen the breakdown is for.
///
/// The live cart never shows tax; the checkout summary adds it on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationMode {
    LiveCart,
    CheckoutSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub discount: Decimal,
    pub vip_discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Sums `price × quantity` over `lines` using each product's current price.
///
/// # Errors
///
/// - [`PricingError::InvalidPrice`] if any price is not a non-negative decimal.
/// - [`PricingError::Overflow`] if the sum does not fit a `Decimal`.
pub fn subtotal(lines: &[CartLineItem]) -> Result<Decimal, PricingError> {
    lines.iter().try_fold(Decimal::ZERO, |acc, line| {
        let price = line
            .product
            .unit_price()
            .ok_or_else(|| PricingError::InvalidPrice {
                product_id: line.product.id,
                price: line.product.price.clone(),
            })?;
        price
            .checked_mul(Decimal::from(line.quantity))
            .and_then(|amount| acc.checked_add(amount))
            .ok_or(PricingError::Overflow)
    })
}

/// Rounds to whole currency units, halves away from zero.
fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Default)]
pub struct PricingCalculator {
    policy: PricingPolicy,
}

impl PricingCalculator {
    #[must_use]
    pub fn new(policy: PricingPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Derives the full breakdown for `lines`.
    ///
    /// # Errors
    ///
    /// See [`subtotal`].
    pub fn compute_breakdown(
        &self,
        lines: &[CartLineItem],
        customer_is_vip: bool,
        mode: PresentationMode,
    ) -> Result<PricingBreakdown, PricingError> {
        self.compute_breakdown_with_discount(lines, customer_is_vip, mode, Decimal::ZERO)
    }

    /// Like [`compute_breakdown`](Self::compute_breakdown) with an additional
    /// flat `discount` (e.g. a promotion) subtracted from the total.
    ///
    /// The total never drops below zero.
    ///
    /// # Errors
    ///
    /// - [`PricingError::NegativeDiscount`] if `discount` is negative.
    /// - [`PricingError::Overflow`] if the total does not fit a `Decimal`.
    /// - Anything [`subtotal`] returns.
    pub fn compute_breakdown_with_discount(
        &self,
        lines: &[CartLineItem],
        customer_is_vip: bool,
        mode: PresentationMode,
        discount: Decimal,
    ) -> Result<PricingBreakdown, PricingError> {
        if discount < Decimal::ZERO {
            return Err(PricingError::NegativeDiscount(discount));
        }

        let subtotal = subtotal(lines)?;
        let shipping_fee = self.shipping_fee(subtotal);
        let vip_discount = self.vip_discount(subtotal, customer_is_vip);
        let tax = self.tax(subtotal, mode);

        let total = subtotal
            .checked_add(shipping_fee)
            .and_then(|t| t.checked_add(tax))
            .and_then(|t| t.checked_sub(vip_discount))
            .and_then(|t| t.checked_sub(discount))
            .ok_or(PricingError::Overflow)?
            .max(Decimal::ZERO);

        Ok(PricingBreakdown {
            subtotal,
            shipping_fee,
            discount,
            vip_discount,
            tax,
            total,
        })
    }

    /// Flat fee below the free-shipping threshold, zero at or above it.
    #[must_use]
    pub fn shipping_fee(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.policy.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.policy.flat_shipping_fee
        }
    }

    #[must_use]
    pub fn vip_discount(&self, subtotal: Decimal, customer_is_vip: bool) -> Decimal {
        if customer_is_vip {
            round_currency(subtotal * self.policy.vip_discount_rate)
        } else {
            Decimal::ZERO
        }
    }

    #[must_use]
    pub fn tax(&self, subtotal: Decimal, mode: PresentationMode) -> Decimal {
        match mode {
            PresentationMode::LiveCart => Decimal::ZERO,
            PresentationMode::CheckoutSummary => round_currency(subtotal * self.policy.tax_rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use pharmacart_core::{Product, ProductType};

    use super::*;

    fn product(id: u64, price: &str, requires_prescription: bool) -> Product {
        Product {
            id,
            name: format!("Product {id}"),
            price: price.to_string(),
            product_type: ProductType::Medicine,
            requires_prescription,
            manufacturer: "Teva".to_string(),
            stock: None,
            product_code: None,
            description: None,
            is_available: true,
            active_ingredient: None,
            dosage_form: None,
            strength: None,
        }
    }

    fn line(id: u64, price: &str, quantity: u32) -> CartLineItem {
        CartLineItem {
            product: product(id, price, false),
            quantity,
        }
    }

    fn calculator() -> PricingCalculator {
        PricingCalculator::new(PricingPolicy::default())
    }

    #[test]
    fn subtotal_sums_price_times_quantity() {
        let lines = [line(1, "25000", 2), line(2, "180000.00", 1)];
        assert_eq!(subtotal(&lines), Ok(Decimal::from(230_000)));
    }

    #[test]
    fn subtotal_of_empty_cart_is_zero() {
        assert_eq!(subtotal(&[]), Ok(Decimal::ZERO));
    }

    #[test]
    fn subtotal_rejects_unparsable_price() {
        let lines = [line(1, "25000", 1), line(7, "call us", 1)];
        assert_eq!(
            subtotal(&lines),
            Err(PricingError::InvalidPrice {
                product_id: 7,
                price: "call us".to_string()
            })
        );
    }

    #[test]
    fn shipping_fee_waived_exactly_at_threshold() {
        let calc = calculator();
        assert_eq!(calc.shipping_fee(Decimal::from(300_000)), Decimal::ZERO);
    }

    #[test]
    fn shipping_fee_charged_just_below_threshold() {
        let calc = calculator();
        assert_eq!(
            calc.shipping_fee(Decimal::from(299_999)),
            Decimal::from(30_000)
        );
    }

    #[test]
    fn vip_discount_is_five_percent_of_subtotal() {
        let calc = calculator();
        assert_eq!(
            calc.vip_discount(Decimal::from(1_000_000), true),
            Decimal::from(50_000)
        );
        assert_eq!(
            calc.vip_discount(Decimal::from(1_000_000), false),
            Decimal::ZERO
        );
    }

    #[test]
    fn vip_discount_rounds_half_away_from_zero() {
        // 5% of 10 = 0.5
        let calc = calculator();
        assert_eq!(calc.vip_discount(Decimal::from(10), true), Decimal::ONE);
    }

    #[test]
    fn live_cart_and_checkout_summary_differ_only_by_tax() {
        let calc = calculator();
        let lines = [line(1, "25000", 2), line(2, "180000", 1)];

        let live = calc
            .compute_breakdown(&lines, false, PresentationMode::LiveCart)
            .unwrap();
        let summary = calc
            .compute_breakdown(&lines, false, PresentationMode::CheckoutSummary)
            .unwrap();

        assert_eq!(live.tax, Decimal::ZERO);
        assert_eq!(summary.tax, Decimal::from(23_000));
        assert_eq!(live.subtotal, summary.subtotal);
        assert_eq!(live.shipping_fee, summary.shipping_fee);
        assert_eq!(summary.total - live.total, summary.tax);
    }

    #[test]
    fn checkout_summary_breakdown_for_vip() {
        let calc = calculator();
        let lines = [line(1, "25000", 2), line(2, "180000", 1)];

        let breakdown = calc
            .compute_breakdown(&lines, true, PresentationMode::CheckoutSummary)
            .unwrap();

        assert_eq!(
            breakdown,
            PricingBreakdown {
                subtotal: Decimal::from(230_000),
                shipping_fee: Decimal::from(30_000),
                discount: Decimal::ZERO,
                vip_discount: Decimal::from(11_500),
                tax: Decimal::from(23_000),
                total: Decimal::from(271_500),
            }
        );
    }

    #[test]
    fn vip_and_free_shipping_are_independent() {
        let calc = calculator();
        let lines = [line(1, "1000000", 1)];

        let breakdown = calc
            .compute_breakdown(&lines, true, PresentationMode::LiveCart)
            .unwrap();

        assert_eq!(breakdown.shipping_fee, Decimal::ZERO);
        assert_eq!(breakdown.vip_discount, Decimal::from(50_000));
        assert_eq!(breakdown.total, Decimal::from(950_000));
    }

    #[test]
    fn extra_discount_is_subtracted_and_total_floors_at_zero() {
        let calc = calculator();
        let lines = [line(1, "10000", 1)];

        let breakdown = calc
            .compute_breakdown_with_discount(
                &lines,
                false,
                PresentationMode::LiveCart,
                Decimal::from(5_000),
            )
            .unwrap();
        assert_eq!(breakdown.total, Decimal::from(35_000));

        let floored = calc
            .compute_breakdown_with_discount(
                &lines,
                false,
                PresentationMode::LiveCart,
                Decimal::from(1_000_000),
            )
            .unwrap();
        assert_eq!(floored.total, Decimal::ZERO);
    }

    #[test]
    fn tax_on_a_maximal_subtotal_overflows_without_panicking() {
        let calc = calculator();
        let lines = [line(1, "79228162514264337593543950335", 1)];

        let live = calc
            .compute_breakdown(&lines, false, PresentationMode::LiveCart)
            .unwrap();
        assert_eq!(live.total, Decimal::MAX);

        assert_eq!(
            calc.compute_breakdown(&lines, false, PresentationMode::CheckoutSummary),
            Err(PricingError::Overflow)
        );
    }

    #[test]
    fn negative_discount_is_rejected() {
        let calc = calculator();
        let result = calc.compute_breakdown_with_discount(
            &[],
            false,
            PresentationMode::LiveCart,
            Decimal::from(-1),
        );
        assert_eq!(result, Err(PricingError::NegativeDiscount(Decimal::from(-1))));
    }

    #[test]
    fn overridden_policy_changes_threshold_and_fee() {
        let calc = PricingCalculator::new(PricingPolicy {
            free_shipping_threshold: Decimal::from(500_000),
            flat_shipping_fee: Decimal::from(15_000),
            ..PricingPolicy::default()
        });
        assert_eq!(
            calc.shipping_fee(Decimal::from(300_000)),
            Decimal::from(15_000)
        );
        assert_eq!(calc.shipping_fee(Decimal::from(500_000)), Decimal::ZERO);
    }

    #[test]
    fn breakdown_propagates_invalid_price() {
        let calc = calculator();
        let lines = [line(3, "", 1)];
        assert!(matches!(
            calc.compute_breakdown(&lines, false, PresentationMode::CheckoutSummary),
            Err(PricingError::InvalidPrice { product_id: 3, .. })
        ));
    }
}
