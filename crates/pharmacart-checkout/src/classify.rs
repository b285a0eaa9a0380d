use pharmacart_core::{CartLineItem, OrderType};

/// Decides the order type from the cart contents and the delivery address.
///
/// A prescription item wins over everything; otherwise a non-blank address
/// means delivery (`online`) and no address means pickup (`in_store`).
#[must_use]
pub fn classify_order_type(lines: &[CartLineItem], delivery_address: Option<&str>) -> OrderType {
    if lines.iter().any(|l| l.product.requires_prescription) {
        OrderType::Prescription
    } else if delivery_address.is_some_and(|a| !a.trim().is_empty()) {
        OrderType::Online
    } else {
        OrderType::InStore
    }
}
