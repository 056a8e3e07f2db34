//! REST wrappers against a mock backend

use mockito::Matcher;
use serde_json::json;

use storefront_lib::api::{NewPayment, PaymentStatus, RefundRequest, UserUpdate};
use storefront_lib::{ErrorCategory, ErrorCode, Role};

use crate::test_harness::{admin_token, customer_token, TestShop};

fn payment_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "orderId": "ord-7",
        "amountCents": 4599,
        "currency": "EUR",
        "status": status,
        "clientSecret": "sec_123",
        "createdAt": "2026-01-05T10:00:00Z",
    })
}

#[tokio::test]
async fn test_requests_carry_the_session_token() {
    let mut shop = TestShop::start().await;
    let tab = shop.open_tab();
    let token = admin_token();
    tab.auth.login(&token).await.unwrap();

    let mock = shop
        .server
        .mock("GET", "/api/users/me")
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": "u-1", "email": "ops@example.com", "role": "admin" }).to_string())
        .create_async()
        .await;

    let me = tab.users.me().await.unwrap();
    assert_eq!(me.id, "u-1");
    assert_eq!(me.role, Role::Admin);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_anonymous_requests_have_no_authorization() {
    let mut shop = TestShop::start().await;
    let tab = shop.open_tab();

    let mock = shop
        .server
        .mock("GET", "/api/payments/pay-1")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(payment_json("pay-1", "pending").to_string())
        .create_async()
        .await;

    let payment = tab.payments.get_payment("pay-1").await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_token_from_another_tab_is_used() {
    let mut shop = TestShop::start().await;
    let login_tab = shop.open_tab();
    let account_tab = shop.open_tab();
    let token = customer_token();
    login_tab.auth.login(&token).await.unwrap();

    let mock = shop
        .server
        .mock("GET", "/api/users/me")
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .with_status(200)
        .with_body(json!({ "data": { "id": "u-2", "email": "buyer@example.com" } }).to_string())
        .create_async()
        .await;

    let me = account_tab.users.me().await.unwrap();
    assert_eq!(me.email, "buyer@example.com");
    assert_eq!(me.role, Role::Customer);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_create_payment_posts_camel_case_json() {
    let mut shop = TestShop::start().await;
    let tab = shop.open_tab();
    tab.auth.login(&customer_token()).await.unwrap();

    let mock = shop
        .server
        .mock("POST", "/api/payments")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "orderId": "ord-7",
            "amountCents": 4599,
            "currency": "EUR",
        })))
        .with_status(201)
        .with_body(json!({ "data": payment_json("pay-9", "requires_action") }).to_string())
        .create_async()
        .await;

    let payment = tab
        .payments
        .create_payment(&NewPayment {
            order_id: "ord-7".into(),
            amount_cents: 4599,
            currency: "EUR".into(),
            payment_method_id: None,
        })
        .await
        .unwrap();

    assert_eq!(payment.id, "pay-9");
    assert_eq!(payment.status, PaymentStatus::RequiresAction);
    assert_eq!(payment.client_secret.as_deref(), Some("sec_123"));
    assert!(payment.created_at.is_some());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_confirm_and_refund() {
    let mut shop = TestShop::start().await;
    let tab = shop.open_tab();

    let confirm = shop
        .server
        .mock("POST", "/api/payments/pay-9/confirm")
        .with_status(200)
        .with_body(payment_json("pay-9", "succeeded").to_string())
        .create_async()
        .await;
    let refund = shop
        .server
        .mock("POST", "/api/payments/pay-9/refund")
        .match_body(Matcher::Json(json!({ "amountCents": 1000, "reason": "damaged" })))
        .with_status(200)
        .with_body(payment_json("pay-9", "refunded").to_string())
        .create_async()
        .await;

    let confirmed = tab.payments.confirm_payment("pay-9").await.unwrap();
    assert_eq!(confirmed.status, PaymentStatus::Succeeded);

    let refunded = tab
        .payments
        .refund_payment(
            "pay-9",
            &RefundRequest {
                amount_cents: Some(1000),
                reason: Some("damaged".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(refunded.status, PaymentStatus::Refunded);

    confirm.assert_async().await;
    refund.assert_async().await;
}

#[tokio::test]
async fn test_list_payments_for_order() {
    let mut shop = TestShop::start().await;
    let tab = shop.open_tab();

    let mock = shop
        .server
        .mock("GET", "/api/orders/ord-7/payments")
        .with_status(200)
        .with_body(
            json!([payment_json("pay-1", "failed"), payment_json("pay-2", "chargeback")])
                .to_string(),
        )
        .create_async()
        .await;

    let payments = tab.payments.list_payments_for_order("ord-7").await.unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0].status, PaymentStatus::Failed);
    // Statuses this client does not know yet still decode
    assert_eq!(payments[1].status, PaymentStatus::Unknown);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_statuses_map_to_codes() {
    let mut shop = TestShop::start().await;
    let tab = shop.open_tab();

    let missing = shop
        .server
        .mock("GET", "/api/users/u-404")
        .with_status(404)
        .with_body(json!({ "message": "No such user" }).to_string())
        .create_async()
        .await;
    let limited = shop
        .server
        .mock("DELETE", "/api/users/u-5")
        .with_status(429)
        .with_body(json!({ "error": "Slow down" }).to_string())
        .create_async()
        .await;

    let err = tab.users.get_user("u-404").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ApiNotFound);
    assert_eq!(err.status, Some(404));
    assert_eq!(err.message, "No such user");

    let err = tab.users.delete_user("u-5").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ApiRateLimited);
    assert_eq!(err.category, Some(ErrorCategory::RateLimit));
    assert_eq!(err.message, "Slow down");

    missing.assert_async().await;
    limited.assert_async().await;
}

#[tokio::test]
async fn test_server_errors_are_not_retried() {
    let mut shop = TestShop::start().await;
    let tab = shop.open_tab();

    let mock = shop
        .server
        .mock("GET", "/api/users")
        .with_status(503)
        .with_body("")
        .expect(1)
        .create_async()
        .await;

    let err = tab.users.list_users(None).await.unwrap_err();
    assert_eq!(err.status, Some(503));
    assert_eq!(err.category, Some(ErrorCategory::ServiceUnavailable));
    assert_eq!(err.message, "Service Unavailable");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_and_delete_user() {
    let mut shop = TestShop::start().await;
    let tab = shop.open_tab();
    tab.auth.login(&admin_token()).await.unwrap();

    let update = shop
        .server
        .mock("PUT", "/api/users/u-2")
        .match_body(Matcher::Json(json!({ "name": "Bea" })))
        .with_status(200)
        .with_body(json!({ "id": "u-2", "email": "buyer@example.com", "name": "Bea" }).to_string())
        .create_async()
        .await;
    let delete = shop
        .server
        .mock("DELETE", "/api/users/u-2")
        .with_status(204)
        .create_async()
        .await;

    let user = tab
        .users
        .update_user(
            "u-2",
            &UserUpdate {
                name: Some("Bea".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(user.name.as_deref(), Some("Bea"));

    tab.users.delete_user("u-2").await.unwrap();

    update.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn test_invalid_requests_never_reach_the_backend() {
    let mut shop = TestShop::start().await;
    let tab = shop.open_tab();

    let mock = shop
        .server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let err = tab
        .payments
        .create_payment(&NewPayment {
            order_id: "ord-7".into(),
            amount_cents: 0,
            currency: "EUR".into(),
            payment_method_id: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ApiRequestInvalid);

    let err = tab.payments.confirm_payment("../admin").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ApiRequestInvalid);

    let err = tab
        .users
        .update_user("u-2", &UserUpdate::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ApiRequestInvalid);

    mock.assert_async().await;
}
