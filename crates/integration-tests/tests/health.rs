//! Health endpoint tests.

use axum::http::{Method, StatusCode};

use dsc_integration_tests::TestContext;

#[tokio::test]
async fn test_liveness() {
    let ctx = TestContext::new();

    let response = ctx.send(Method::GET, "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_readiness_with_reachable_store() {
    let ctx = TestContext::new();

    let response = ctx.send(Method::GET, "/health/ready", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
}
