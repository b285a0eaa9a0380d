//! End-to-end checkout against a wiremock order service.

use std::sync::Arc;
use std::time::Duration;

use pharmacart_cart::{CartStore, KeyValueStore, MemoryStore, PricingCalculator, CART_KEY};
use pharmacart_checkout::{
    payment_key, CheckoutError, CheckoutOrchestrator, ConfirmationStore, CustomerInfo,
    PaymentInfo, ValidationError, LAST_ORDER_KEY,
};
use pharmacart_core::{CustomerTier, OrderType, PaymentMethod, Product, ProductType};
use pharmacart_orders::OrdersClient;
use rust_decimal::Decimal;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn product(id: u64, name: &str, price: &str, requires_prescription: bool) -> Product {
    Product {
        id,
        name: name.to_owned(),
        price: price.to_owned(),
        product_type: ProductType::Medicine,
        requires_prescription,
        manufacturer: "Teva".to_owned(),
        stock: Some(100),
        product_code: None,
        description: None,
        is_available: true,
        active_ingredient: None,
        dosage_form: None,
        strength: None,
    }
}

fn paracetamol() -> Product {
    product(1, "Paracetamol 500mg", "25000.00", false)
}

fn vitamin_c() -> Product {
    product(6, "Vitamin C 1000mg", "180000.00", false)
}

fn amoxicillin() -> Product {
    product(9, "Amoxicillin 500mg", "95000.00", true)
}

struct Harness {
    storage: Arc<MemoryStore>,
    cart: Arc<CartStore>,
    orchestrator: Arc<CheckoutOrchestrator>,
}

fn harness(server: &MockServer, timeout_secs: u64) -> Harness {
    let storage = Arc::new(MemoryStore::new());
    let cart = Arc::new(CartStore::open(storage.clone(), CART_KEY));
    let client = OrdersClient::with_base_url(&server.uri(), timeout_secs)
        .expect("client construction should not fail");
    let orchestrator = Arc::new(CheckoutOrchestrator::new(
        Arc::clone(&cart),
        client,
        ConfirmationStore::new(storage.clone()),
        PricingCalculator::default(),
        1,
    ));
    Harness {
        storage,
        cart,
        orchestrator,
    }
}

fn order_json(id: u64, order_type: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "order_number": format!("ORD-{id:04}"),
        "order_type": order_type,
        "status": "pending",
        "customer": 7,
        "total_amount": "253000.00",
        "order_date": "2025-03-01T09:30:00Z",
        "delivery_address": "12 Le Loi, District 1",
        "items": []
    })
}

fn card() -> PaymentInfo {
    PaymentInfo::new(PaymentMethod::Card, Decimal::from(253_000)).with_transaction_id("TX-1")
}

#[tokio::test]
async fn empty_cart_is_rejected_without_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server, 20);
    let err = h
        .orchestrator
        .checkout(&CustomerInfo::registered(7, CustomerTier::Regular), &card())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Validation(ValidationError::EmptyCart)
    ));
}

#[tokio::test]
async fn delivery_order_is_placed_and_cart_cleared() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders/"))
        .and(body_json(serde_json::json!({
            "order_type": "online",
            "customer_id": 7,
            "branch_id": 1,
            "items": [
                {"product_id": 1, "quantity": 2},
                {"product_id": 6, "quantity": 1}
            ],
            "delivery_address": "12 Le Loi, District 1",
            "notes": "Payment: card (TX-1)"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(order_json(42, "online")))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, 20);
    h.cart.add_quantity(paracetamol(), 2);
    h.cart.add_to_cart(vitamin_c());

    let customer = CustomerInfo::registered(7, CustomerTier::Regular)
        .with_delivery_address("12 Le Loi, District 1")
        .with_contact("0901234567");
    let order = h
        .orchestrator
        .checkout(&customer, &card())
        .await
        .expect("order should be placed");

    assert_eq!(order.id, 42);
    assert_eq!(order.order_type, OrderType::Online);
    assert!(h.cart.is_empty());
    assert_eq!(h.storage.get(CART_KEY).unwrap().as_deref(), Some("[]"));

    let confirmation = h
        .orchestrator
        .take_confirmation()
        .expect("confirmation should be stored");
    assert_eq!(confirmation.order_id, 42);
    assert_eq!(confirmation.subtotal, Decimal::from(230_000));
    assert_eq!(confirmation.shipping_fee, Decimal::from(30_000));
    assert_eq!(confirmation.tax, Decimal::from(23_000));
    assert_eq!(confirmation.total, Decimal::from(283_000));
    assert_eq!(confirmation.server_total, Decimal::from(253_000));
    assert_eq!(confirmation.delivery_phone.as_deref(), Some("0901234567"));
    assert_eq!(confirmation.items.len(), 2);
    assert!(h.orchestrator.take_confirmation().is_none());

    assert!(h.storage.get(&payment_key(42)).unwrap().is_some());
}

#[tokio::test]
async fn rejected_order_leaves_cart_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "Product 6 is out of stock"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, 20);
    h.cart.add_quantity(paracetamol(), 2);
    h.cart.add_to_cart(vitamin_c());
    let before = h.cart.lines();

    let err = h
        .orchestrator
        .checkout(&CustomerInfo::registered(7, CustomerTier::Regular), &card())
        .await
        .unwrap_err();

    match err {
        CheckoutError::OrderCreationFailed { message } => {
            assert_eq!(message, "Product 6 is out of stock");
        }
        other => panic!("expected OrderCreationFailed, got {other:?}"),
    }
    assert_eq!(h.cart.lines(), before);
    assert_eq!(h.storage.get(LAST_ORDER_KEY).unwrap(), None);
}

#[tokio::test]
async fn prescription_item_forces_prescription_order_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders/"))
        .and(body_json(serde_json::json!({
            "order_type": "prescription",
            "customer_id": 7,
            "branch_id": 1,
            "items": [
                {"product_id": 1, "quantity": 1},
                {"product_id": 9, "quantity": 1}
            ],
            "delivery_address": "12 Le Loi, District 1",
            "notes": "Payment: card (TX-1)",
            "prescription_id": 55
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(order_json(43, "prescription")))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, 20);
    h.cart.add_to_cart(paracetamol());
    h.cart.add_to_cart(amoxicillin());

    let customer = CustomerInfo::registered(7, CustomerTier::Regular)
        .with_delivery_address("12 Le Loi, District 1")
        .with_prescription(55);
    let order = h.orchestrator.checkout(&customer, &card()).await.unwrap();

    assert_eq!(order.order_type, OrderType::Prescription);
}

#[tokio::test]
async fn walk_in_shopper_is_registered_before_ordering() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/customers/"))
        .and(body_json(serde_json::json!({
            "name": "Lan",
            "email": "lan@example.com",
            "phone": "0901234567"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 77})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders/"))
        .and(body_json(serde_json::json!({
            "order_type": "in_store",
            "customer_id": 77,
            "branch_id": 1,
            "items": [{"product_id": 1, "quantity": 3}],
            "notes": "Payment: cash"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(order_json(44, "in_store")))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, 20);
    h.cart.add_quantity(paracetamol(), 3);

    let customer = CustomerInfo::walk_in("Lan", "0901234567").with_contact("lan@example.com");
    let payment = PaymentInfo::new(PaymentMethod::Cash, Decimal::from(112_500));
    let order = h.orchestrator.checkout(&customer, &payment).await.unwrap();

    assert_eq!(order.id, 44);
    assert!(h.cart.is_empty());
}

#[tokio::test]
async fn failed_customer_registration_places_no_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/customers/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "phone": ["Enter a valid phone number."]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server, 20);
    h.cart.add_to_cart(paracetamol());

    let err = h
        .orchestrator
        .checkout(&CustomerInfo::walk_in("Lan", "12"), &card())
        .await
        .unwrap_err();

    match err {
        CheckoutError::OrderCreationFailed { message } => {
            assert_eq!(message, "phone: Enter a valid phone number.");
        }
        other => panic!("expected OrderCreationFailed, got {other:?}"),
    }
    assert!(!h.cart.is_empty());
}

#[tokio::test]
async fn invalid_price_is_caught_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server, 20);
    h.cart.add_to_cart(product(3, "Mystery", "call us", false));

    let err = h
        .orchestrator
        .checkout(&CustomerInfo::registered(7, CustomerTier::Regular), &card())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Validation(ValidationError::InvalidPrice { product_id: 3, .. })
    ));
}

#[tokio::test]
async fn timeout_becomes_order_creation_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders/"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(order_json(45, "in_store"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let h = harness(&server, 1);
    h.cart.add_to_cart(paracetamol());

    let err = h
        .orchestrator
        .checkout(&CustomerInfo::registered(7, CustomerTier::Regular), &card())
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::OrderCreationFailed { .. }));
    assert!(!h.cart.is_empty());
}

#[tokio::test]
async fn second_submission_while_in_flight_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders/"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(order_json(46, "in_store"))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, 20);
    h.cart.add_to_cart(paracetamol());
    let customer = CustomerInfo::registered(7, CustomerTier::Regular);

    let first = h
        .orchestrator
        .submit_detached(h.cart.lines(), customer.clone(), card());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.orchestrator.is_submitting());

    let second = h.orchestrator.checkout(&customer, &card()).await;
    assert!(matches!(second, Err(CheckoutError::SubmissionInProgress)));

    let order = first.await.expect("task should not panic").unwrap();
    assert_eq!(order.id, 46);
    assert!(!h.orchestrator.is_submitting());
}

#[tokio::test]
async fn empty_cart_reports_validation_even_while_another_submit_runs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders/"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(order_json(48, "in_store"))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, 20);
    h.cart.add_to_cart(paracetamol());
    let customer = CustomerInfo::registered(7, CustomerTier::Regular);

    let first = h
        .orchestrator
        .submit_detached(h.cart.lines(), customer.clone(), card());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.orchestrator.is_submitting());

    let empty = h.orchestrator.submit_order(&[], &customer, &card()).await;
    assert!(matches!(
        empty,
        Err(CheckoutError::Validation(ValidationError::EmptyCart))
    ));

    first.await.expect("task should not panic").unwrap();
}

#[tokio::test]
async fn oversized_amount_is_a_validation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server, 20);
    h.cart
        .add_to_cart(product(4, "Gold leaf", "79228162514264337593543950335", false));

    let err = h
        .orchestrator
        .checkout(&CustomerInfo::registered(7, CustomerTier::Regular), &card())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Validation(ValidationError::AmountOverflow)
    ));
    assert!(!h.cart.is_empty());
}

#[tokio::test]
async fn detached_submission_finishes_after_caller_goes_away() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders/"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(order_json(47, "in_store"))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, 20);
    h.cart.add_to_cart(paracetamol());

    drop(h.orchestrator.submit_detached(
        h.cart.lines(),
        CustomerInfo::registered(7, CustomerTier::Regular),
        card(),
    ));
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert!(h.cart.is_empty());
    assert_eq!(
        h.orchestrator.take_confirmation().map(|c| c.order_id),
        Some(47)
    );
}

#[tokio::test]
async fn vip_summary_applies_discount_and_tax() {
    let server = MockServer::start().await;
    let h = harness(&server, 20);
    h.cart.add_quantity(paracetamol(), 2);
    h.cart.add_to_cart(vitamin_c());

    let summary = h
        .orchestrator
        .summary(&CustomerInfo::registered(7, CustomerTier::Vip))
        .unwrap();

    assert_eq!(summary.vip_discount, Decimal::from(11_500));
    assert_eq!(summary.total, Decimal::from(271_500));
}
