use super::*;

fn test_client(base_url: &str) -> OrdersClient {
    OrdersClient::with_base_url(base_url, 20).expect("client construction should not fail")
}

#[test]
fn endpoint_appends_to_root() {
    let client = test_client("http://localhost:8000");
    let url = client.endpoint("orders/42/").unwrap();
    assert_eq!(url.as_str(), "http://localhost:8000/orders/42/");
}

#[test]
fn endpoint_keeps_base_path_prefix() {
    let client = test_client("https://pharmacy.example.com/api/");
    let url = client.endpoint("products/").unwrap();
    assert_eq!(url.as_str(), "https://pharmacy.example.com/api/products/");

    let no_slash = test_client("https://pharmacy.example.com/api");
    assert_eq!(
        no_slash.endpoint("products/").unwrap().as_str(),
        "https://pharmacy.example.com/api/products/"
    );
}

#[test]
fn rejects_unparsable_base_url() {
    let err = OrdersClient::with_base_url("not a url", 20).unwrap_err();
    assert!(matches!(err, OrdersError::InvalidBaseUrl { .. }));
}

#[test]
fn rejects_non_http_scheme() {
    let err = OrdersClient::with_base_url("ftp://pharmacy.example.com", 20).unwrap_err();
    assert!(matches!(err, OrdersError::InvalidBaseUrl { .. }));
}

#[test]
fn builder_sets_token_and_retry() {
    let client = test_client("http://localhost:8000")
        .with_token("secret")
        .with_retry(3, 250);
    assert_eq!(client.token.as_deref(), Some("secret"));
    assert_eq!(client.max_retries, 3);
    assert_eq!(client.backoff_base_ms, 250);
}
