use pharmacart_core::{Product, ProductType};

use super::*;

fn line(id: u64, quantity: u32, requires_prescription: bool) -> CartLineItem {
    CartLineItem {
        product: Product {
            id,
            name: format!("Product {id}"),
            price: "25000".to_owned(),
            product_type: ProductType::Medicine,
            requires_prescription,
            manufacturer: "Teva".to_owned(),
            stock: None,
            product_code: None,
            description: None,
            is_available: true,
            active_ingredient: None,
            dosage_form: None,
            strength: None,
        },
        quantity,
    }
}

fn cash() -> PaymentInfo {
    PaymentInfo::new(PaymentMethod::Cash, Decimal::from(50_000))
}

#[test]
fn empty_cart_is_rejected_first() {
    let walk_in_missing_everything = CustomerInfo::walk_in("", "");
    assert_eq!(
        OrderDraft::build(&[], &walk_in_missing_everything, &cash(), 1),
        Err(ValidationError::EmptyCart)
    );
}

#[test]
fn walk_in_requires_name_and_phone() {
    let lines = [line(1, 1, false)];
    assert_eq!(
        OrderDraft::build(&lines, &CustomerInfo::walk_in(" ", "0901"), &cash(), 1),
        Err(ValidationError::MissingField("name"))
    );
    assert_eq!(
        OrderDraft::build(&lines, &CustomerInfo::walk_in("Lan", ""), &cash(), 1),
        Err(ValidationError::MissingField("phone"))
    );
}

#[test]
fn draft_carries_ids_and_quantities_in_cart_order() {
    let lines = [line(1, 2, false), line(6, 1, false)];
    let customer = CustomerInfo::registered(7, CustomerTier::Regular).with_delivery_address("12 Le Loi");

    let draft = OrderDraft::build(&lines, &customer, &cash(), 3).unwrap();

    assert_eq!(draft.order_type, OrderType::Online);
    assert_eq!(draft.branch_id, 3);
    assert_eq!(
        draft.items,
        vec![
            OrderItemRequest {
                product_id: 1,
                quantity: 2
            },
            OrderItemRequest {
                product_id: 6,
                quantity: 1
            },
        ]
    );
    assert_eq!(draft.registered_customer_id(), Some(7));
    assert!(draft.walk_in_registration().is_none());
}

#[test]
fn notes_default_to_payment_description() {
    let lines = [line(1, 1, false)];
    let card = PaymentInfo::new(PaymentMethod::Card, Decimal::from(25_000)).with_transaction_id("TX-9");

    let draft = OrderDraft::build(
        &lines,
        &CustomerInfo::registered(7, CustomerTier::Vip),
        &card,
        1,
    )
    .unwrap();
    assert_eq!(draft.notes, "Payment: card (TX-9)");

    let with_notes = CustomerInfo::registered(7, CustomerTier::Vip).with_notes("Ring twice");
    let draft = OrderDraft::build(&lines, &with_notes, &card, 1).unwrap();
    assert_eq!(draft.notes, "Ring twice");
}

#[test]
fn blank_address_means_in_store_pickup() {
    let customer = CustomerInfo::walk_in("Lan", "0901234567").with_delivery_address("  ");
    let draft = OrderDraft::build(&[line(1, 1, false)], &customer, &cash(), 1).unwrap();
    assert_eq!(draft.order_type, OrderType::InStore);
    assert_eq!(draft.delivery_address, None);
}

#[test]
fn walk_in_draft_produces_registration_body() {
    let customer = CustomerInfo::walk_in(" Lan ", "0901234567").with_contact("lan@example.com");
    let draft = OrderDraft::build(&[line(1, 1, false)], &customer, &cash(), 1).unwrap();

    assert_eq!(
        draft.walk_in_registration(),
        Some(NewCustomer {
            name: "Lan".to_owned(),
            email: Some("lan@example.com".to_owned()),
            phone: "0901234567".to_owned(),
        })
    );
    assert_eq!(draft.registered_customer_id(), None);
}

#[test]
fn into_request_fills_customer_id_and_prescription() {
    let customer = CustomerInfo::registered(7, CustomerTier::Regular).with_prescription(55);
    let draft = OrderDraft::build(&[line(9, 1, true)], &customer, &cash(), 1).unwrap();

    let request = draft.into_request(Some(7));

    assert_eq!(request.order_type, OrderType::Prescription);
    assert_eq!(request.customer_id, Some(7));
    assert_eq!(request.prescription_id, Some(55));
    assert_eq!(request.notes.as_deref(), Some("Payment: cash"));
}

#[test]
fn only_registered_vip_gets_vip_pricing() {
    assert!(CustomerInfo::registered(1, CustomerTier::Vip).is_vip());
    assert!(!CustomerInfo::registered(1, CustomerTier::Regular).is_vip());
    assert!(!CustomerInfo::walk_in("Lan", "0901").is_vip());
}
