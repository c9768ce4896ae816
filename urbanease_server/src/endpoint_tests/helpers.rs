use actix_web::{
    body::MessageBody,
    http::{Method, StatusCode},
    test,
    test::TestRequest,
    web::{self, ServiceConfig},
    App,
    ResponseError,
};
use chrono::{DateTime, Duration, Utc};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
};
use log::debug;
use serde_json::Value;
use urbanease_engine::{
    db_types::{
        LineItem,
        Notification,
        NotificationType,
        Order,
        OrderId,
        OrderStatus,
        Paise,
        Payment,
        PaymentMethod,
        Role,
        ShippingAddress,
        UserId,
    },
    events::EventProducers,
    realtime::ConnectionRegistry,
    NotificationApi,
    OrderFlowApi,
    OrderQueryApi,
    PaymentApi,
};

use super::mocks::MockStore;
use crate::{
    auth::{JwtClaims, TokenValidator},
    config::AuthConfig,
    middleware::JwtMiddlewareFactory,
    server::{json_config, path_config, query_config},
};

// Signs every token in these tests. DO NOT re-use this secret anywhere.
const TEST_SECRET: &str = "endpoint-tests-only-4f7d2c9a81e0b356";

pub fn auth_config() -> AuthConfig {
    AuthConfig::new(TEST_SECRET)
}

pub fn issue_token(claims: JwtClaims, expiry: DateTime<Utc>) -> String {
    let header = Header::empty().with_token_type("JWT");
    let mut claims = Claims::new(claims);
    claims.expiration = Some(expiry);
    let key = Hs256Key::new(TEST_SECRET.as_bytes());
    Hs256.token(&header, &claims, &key).expect("Failed to sign token")
}

/// A bearer header value for `id`, valid for the next hour.
pub fn bearer(id: &str, role: Role) -> String {
    let token = issue_token(JwtClaims::new(id, role), Utc::now() + Duration::hours(1));
    format!("Bearer {token}")
}

/// Sends one request through the JWT middleware and whatever `configure` registers, and returns the status and the
/// JSON body. Errors raised by middleware are rendered the same way the server would render them.
pub async fn send_request<F>(
    method: Method,
    auth_header: &str,
    path: &str,
    body: Option<Value>,
    configure: F,
) -> (StatusCode, Value)
where
    F: FnOnce(&mut ServiceConfig),
{
    let mut req = TestRequest::default().method(method).uri(path);
    if !auth_header.is_empty() {
        req = req.insert_header(("Authorization", auth_header));
    }
    if let Some(body) = body {
        req = req.set_json(body);
    }
    let validator = TokenValidator::new(&auth_config());
    let app = App::new()
        .app_data(json_config(64 * 1024))
        .app_data(path_config())
        .app_data(query_config())
        .service(web::scope("").wrap(JwtMiddlewareFactory::new(validator)).configure(configure));
    let service = test::init_service(app).await;
    debug!("Making request to {path}");
    let (status, bytes) = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            (status, test::read_body(res).await)
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            (status, res.into_body().try_into_bytes().unwrap_or_default())
        },
    };
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()));
    (status, body)
}

pub async fn get_request<F>(auth_header: &str, path: &str, configure: F) -> (StatusCode, Value)
where F: FnOnce(&mut ServiceConfig) {
    send_request(Method::GET, auth_header, path, None, configure).await
}

pub async fn post_request<F>(auth_header: &str, path: &str, body: Value, configure: F) -> (StatusCode, Value)
where F: FnOnce(&mut ServiceConfig) {
    send_request(Method::POST, auth_header, path, Some(body), configure).await
}

pub async fn patch_request<F>(auth_header: &str, path: &str, body: Value, configure: F) -> (StatusCode, Value)
where F: FnOnce(&mut ServiceConfig) {
    send_request(Method::PATCH, auth_header, path, Some(body), configure).await
}

pub fn order_flow_api(store: MockStore, registry: &ConnectionRegistry) -> web::Data<OrderFlowApi<MockStore, ConnectionRegistry>> {
    web::Data::new(OrderFlowApi::new(store, registry.clone(), EventProducers::default()))
}

pub fn payment_api(store: MockStore, registry: &ConnectionRegistry) -> web::Data<PaymentApi<MockStore, ConnectionRegistry>> {
    web::Data::new(PaymentApi::new(store, registry.clone(), EventProducers::default()))
}

pub fn query_api(store: MockStore) -> web::Data<OrderQueryApi<MockStore>> {
    web::Data::new(OrderQueryApi::new(store))
}

pub fn notification_api(store: MockStore) -> web::Data<NotificationApi<MockStore>> {
    web::Data::new(NotificationApi::new(store))
}

pub fn sample_order(id: i64, owner: &str, status: OrderStatus) -> Order {
    Order {
        id: OrderId(id),
        order_number: format!("ORD-20240801-7Q2K-{id:04}"),
        owner_id: UserId::from(owner),
        products: vec![LineItem::new("saree-204", 1, Paise::from_rupees(1200)).with_title("Cotton saree")],
        total: Paise::from_rupees(1200),
        status,
        payment: Some(Payment::pending(PaymentMethod::Upi)),
        payment_method: "upi".into(),
        shipping_address: ShippingAddress::new("Meera Iyer", "4 Residency Road, Bengaluru", "9845000000"),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn sample_notification(id: i64, owner: &str, read: bool) -> Notification {
    Notification {
        id,
        owner_id: UserId::from(owner),
        kind: NotificationType::OrderStatus,
        title: "Order status updated".into(),
        message: "Your order 7 is now Shipped.".into(),
        order_id: Some(OrderId(7)),
        status: Some("Shipped".into()),
        read,
        created_at: Utc::now(),
    }
}
