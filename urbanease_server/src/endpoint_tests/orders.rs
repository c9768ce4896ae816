use actix_web::http::StatusCode;
use serde_json::json;
use tokio::sync::mpsc;
use urbanease_engine::{
    db_types::{OrderId, OrderStatus, PaymentMethod, Role, UserId},
    realtime::{ConnectionRegistry, RealtimeMessage, NOTIFICATION_EVENT, ORDER_STATUS_EVENT},
};

use super::{helpers::*, mocks::MockStore};
use crate::routes::{AllOrdersRoute, CreateOrderRoute, MyOrdersRoute, OrderByIdRoute, UpdateStatusRoute};

fn checkout_body() -> serde_json::Value {
    json!({
        "products": [
            {"productId": "saree-204", "title": "Cotton saree", "quantity": 1, "price": 1200},
            {"productId": "dupatta-11", "quantity": 2, "price": 349.5}
        ],
        "total": 1899,
        "paymentMethod": "gpay",
        "shippingAddress": {"name": "Meera Iyer", "address": "4 Residency Road, Bengaluru", "phone": "9845000000"},
        "user": "somebody-else"
    })
}

#[actix_web::test]
async fn requests_without_a_token_are_rejected() {
    let _ = env_logger::try_init();
    let (status, body) = get_request("", "/orders/my-orders", |cfg| {
        cfg.app_data(query_api(MockStore::new())).service(MyOrdersRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Authentication required");
}

#[actix_web::test]
async fn garbage_tokens_are_rejected() {
    let _ = env_logger::try_init();
    let (status, body) = get_request("Bearer not.a.token", "/orders/my-orders", |cfg| {
        cfg.app_data(query_api(MockStore::new())).service(MyOrdersRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[actix_web::test]
async fn my_orders() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_orders_for_user().withf(|owner| owner.as_str() == "alice").times(1).returning(|owner| {
        Ok(vec![
            sample_order(3, owner.as_str(), OrderStatus::Pending),
            sample_order(1, owner.as_str(), OrderStatus::Delivered),
        ])
    });
    let (status, body) = get_request(&bearer("alice", Role::User), "/orders/my-orders", |cfg| {
        cfg.app_data(query_api(store)).service(MyOrdersRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["orders"][0]["id"], 3);
    assert_eq!(body["data"]["orders"][0]["user"], "alice");
    assert_eq!(body["data"]["orders"][1]["status"], "delivered");
}

#[actix_web::test]
async fn checkout_creates_an_order_for_the_caller() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_insert_order()
        .withf(|order| {
            order.owner_id.as_str() == "alice"
                && order.products.len() == 2
                && order.total.value() == 189_900
                && order.payment.method == PaymentMethod::Gpay
        })
        .times(1)
        .returning(|order| {
            let mut stored = sample_order(42, order.owner_id.as_str(), OrderStatus::Pending);
            stored.products = order.products;
            stored.total = order.total;
            stored.payment = Some(order.payment);
            stored.payment_method = order.payment_method;
            Ok(stored)
        });
    let registry = ConnectionRegistry::new();
    let (status, body) = post_request(&bearer("alice", Role::User), "/orders", checkout_body(), |cfg| {
        cfg.app_data(order_flow_api(store, &registry))
            .service(CreateOrderRoute::<MockStore, ConnectionRegistry>::new());
    })
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Order placed");
    assert_eq!(body["data"]["orderId"], 42);
    assert_eq!(body["data"]["orderNumber"], "ORD-20240801-7Q2K-0042");
    assert_eq!(body["data"]["order"]["status"], "pending");
    assert_eq!(body["data"]["order"]["payment"]["status"], "pending");
    assert_eq!(body["data"]["order"]["paymentMethod"], "gpay");
}

#[actix_web::test]
async fn incomplete_checkouts_are_rejected() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_insert_order().never();
    let mut req = checkout_body();
    req["products"] = json!([]);
    let registry = ConnectionRegistry::new();
    let (status, body) = post_request(&bearer("alice", Role::User), "/orders", req, |cfg| {
        cfg.app_data(order_flow_api(store, &registry))
            .service(CreateOrderRoute::<MockStore, ConnectionRegistry>::new());
    })
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Order must contain at least one product");
}

#[actix_web::test]
async fn malformed_bodies_use_the_error_envelope() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_insert_order().never();
    let registry = ConnectionRegistry::new();
    let (status, body) =
        post_request(&bearer("alice", Role::User), "/orders", json!({"products": "lots"}), |cfg| {
            cfg.app_data(order_flow_api(store, &registry))
                .service(CreateOrderRoute::<MockStore, ConnectionRegistry>::new());
        })
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid request body");
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn customers_cannot_list_all_orders() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_all_orders().never();
    let (status, body) = get_request(&bearer("alice", Role::User), "/orders/admin/all", |cfg| {
        cfg.app_data(query_api(store)).service(AllOrdersRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Insufficient permissions");
}

#[actix_web::test]
async fn moderators_can_list_all_orders() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_fetch_all_orders().times(1).returning(|| {
        Ok(vec![sample_order(2, "bob", OrderStatus::Shipped), sample_order(1, "alice", OrderStatus::Pending)])
    });
    let (status, body) = get_request(&bearer("mod-1", Role::Moderator), "/orders/admin/all", |cfg| {
        cfg.app_data(query_api(store)).service(AllOrdersRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["orders"][0]["user"], "bob");
}

#[actix_web::test]
async fn other_peoples_orders_are_not_found() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_fetch_order_for_owner()
        .withf(|id, owner| *id == OrderId(9) && owner.as_str() == "alice")
        .times(1)
        .returning(|_, _| Ok(None));
    store.expect_fetch_order().never();
    let (status, body) = get_request(&bearer("alice", Role::User), "/orders/9", |cfg| {
        cfg.app_data(query_api(store)).service(OrderByIdRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "message": "Order not found"}));
}

#[actix_web::test]
async fn staff_can_read_any_order() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_fetch_order()
        .withf(|id| *id == OrderId(9))
        .times(1)
        .returning(|id| Ok(Some(sample_order(id.value(), "bob", OrderStatus::Processing))));
    let (status, body) = get_request(&bearer("root", Role::Admin), "/orders/9", |cfg| {
        cfg.app_data(query_api(store)).service(OrderByIdRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["id"], 9);
    assert_eq!(body["data"]["order"]["status"], "processing");
}

#[actix_web::test]
async fn customers_cannot_change_order_status() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_update_order_status().never();
    let registry = ConnectionRegistry::new();
    let (status, body) =
        patch_request(&bearer("alice", Role::User), "/orders/7/status", json!({"status": "delivered"}), |cfg| {
            cfg.app_data(order_flow_api(store, &registry))
                .service(UpdateStatusRoute::<MockStore, ConnectionRegistry>::new());
        })
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Insufficient permissions");
}

#[actix_web::test]
async fn unknown_statuses_are_rejected() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_update_order_status().never();
    let registry = ConnectionRegistry::new();
    let (status, body) =
        patch_request(&bearer("root", Role::Admin), "/orders/7/status", json!({"status": "returned"}), |cfg| {
            cfg.app_data(order_flow_api(store, &registry))
                .service(UpdateStatusRoute::<MockStore, ConnectionRegistry>::new());
        })
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid status");
}

#[actix_web::test]
async fn status_updates_reach_the_owners_room() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_update_order_status()
        .withf(|id, status, _| *id == OrderId(7) && *status == OrderStatus::Shipped)
        .times(1)
        .returning(|id, status, _| Ok(Some(sample_order(id.value(), "alice", status))));
    store
        .expect_insert_notification()
        .withf(|n| n.owner_id.as_str() == "alice" && n.order_id == Some(OrderId(7)))
        .times(1)
        .returning(|n| {
            let mut stored = sample_notification(31, n.owner_id.as_str(), false);
            stored.title = n.title;
            stored.message = n.message;
            stored.status = n.status;
            Ok(stored)
        });
    let registry = ConnectionRegistry::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<RealtimeMessage>();
    let conn = registry.next_connection_id();
    registry.join(&UserId::from("alice"), conn, tx).await;

    let (status, body) =
        patch_request(&bearer("mod-1", Role::Moderator), "/orders/7/status", json!({"status": "shipped"}), |cfg| {
            cfg.app_data(order_flow_api(store, &registry))
                .service(UpdateStatusRoute::<MockStore, ConnectionRegistry>::new());
        })
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order status updated");
    assert_eq!(body["data"]["order"]["status"], "shipped");

    let first = rx.try_recv().expect("status push");
    assert!(first.is(ORDER_STATUS_EVENT));
    let second = rx.try_recv().expect("notification push");
    assert!(second.is(NOTIFICATION_EVENT));
    assert_eq!(second.data["title"], "Order status updated");
}

#[actix_web::test]
async fn a_failed_notification_does_not_fail_the_update() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_update_order_status()
        .times(1)
        .returning(|id, status, _| Ok(Some(sample_order(id.value(), "alice", status))));
    store
        .expect_insert_notification()
        .times(1)
        .returning(|_| Err(urbanease_engine::StoreError::DatabaseError("disk full".into())));
    let registry = ConnectionRegistry::new();
    let (status, body) =
        patch_request(&bearer("root", Role::Admin), "/orders/7/status", json!({"status": "cancelled"}), |cfg| {
            cfg.app_data(order_flow_api(store, &registry))
                .service(UpdateStatusRoute::<MockStore, ConnectionRegistry>::new());
        })
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["status"], "cancelled");
}

#[actix_web::test]
async fn storage_failures_are_not_leaked() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_fetch_orders_for_user()
        .returning(|_| Err(urbanease_engine::StoreError::DatabaseError("connection refused at 10.0.0.3".into())));
    let (status, body) = get_request(&bearer("alice", Role::User), "/orders/my-orders", |cfg| {
        cfg.app_data(query_api(store)).service(MyOrdersRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(!body.to_string().contains("10.0.0.3"));
}
