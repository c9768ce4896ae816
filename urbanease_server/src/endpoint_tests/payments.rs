use actix_web::http::StatusCode;
use chrono::Utc;
use serde_json::json;
use tokio::sync::mpsc;
use urbanease_engine::{
    db_types::{
        NewNotification,
        Notification,
        OrderId,
        OrderStatus,
        Payment,
        PaymentMethod,
        PaymentStatus,
        Role,
        UserId,
    },
    realtime::{ConnectionRegistry, RealtimeMessage, NOTIFICATION_EVENT, ORDER_STATUS_EVENT},
};

use super::{helpers::*, mocks::MockStore};
use crate::routes::{ConfirmPaymentRoute, DeclinePaymentRoute, InitiatePaymentRoute, SelectCodRoute};

fn stored_notification(n: NewNotification) -> Notification {
    let mut stored = sample_notification(50, n.owner_id.as_str(), false);
    stored.title = n.title;
    stored.message = n.message;
    stored.status = n.status;
    stored.order_id = n.order_id;
    stored
}

#[actix_web::test]
async fn initiate_returns_a_upi_link() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_initiate_payment()
        .withf(|id, owner| *id == OrderId(7) && owner.as_str() == "alice")
        .times(1)
        .returning(|id, owner| Ok(Some(sample_order(id.value(), owner.as_str(), OrderStatus::Pending))));
    let registry = ConnectionRegistry::new();
    let (status, body) = post_request(&bearer("alice", Role::User), "/payments/initiate", json!({"orderId": 7}), |cfg| {
        cfg.app_data(payment_api(store, &registry))
            .service(InitiatePaymentRoute::<MockStore, ConnectionRegistry>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let link = &body["data"];
    assert_eq!(link["vpa"], "urbanease@upi");
    assert_eq!(link["payeeName"], "UrbanEase");
    assert_eq!(link["amount"], 1200.0);
    assert_eq!(link["note"], "Order ORD-20240801-7Q2K-0007");
    let uri = link["upiUri"].as_str().unwrap();
    assert!(uri.starts_with("upi://pay?pa=urbanease%40upi"), "{uri}");
    assert!(uri.contains("am=1200.00"), "{uri}");
    assert!(uri.contains("cu=INR"), "{uri}");
}

#[actix_web::test]
async fn initiate_for_someone_elses_order_is_not_found() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_initiate_payment().times(1).returning(|_, _| Ok(None));
    let registry = ConnectionRegistry::new();
    let (status, body) = post_request(&bearer("mallory", Role::User), "/payments/initiate", json!({"orderId": 7}), |cfg| {
        cfg.app_data(payment_api(store, &registry))
            .service(InitiatePaymentRoute::<MockStore, ConnectionRegistry>::new());
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order not found");
}

#[actix_web::test]
async fn confirm_marks_the_order_paid_and_tells_the_owner() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_confirm_payment()
        .withf(|id, owner, confirmation| {
            *id == OrderId(7)
                && owner.as_str() == "alice"
                && confirmation.method == PaymentMethod::Gpay
                && confirmation.reference.as_deref() == Some("UTR123456789")
        })
        .times(1)
        .returning(|id, owner, confirmation| {
            let mut order = sample_order(id.value(), owner.as_str(), OrderStatus::Processing);
            order.payment = Some(Payment {
                method: confirmation.method,
                status: PaymentStatus::Paid,
                reference: confirmation.reference,
                proof_data_url: None,
                paid_at: Some(Utc::now()),
            });
            Ok(Some(order))
        });
    store
        .expect_insert_notification()
        .withf(|n| n.title == "Payment received" && n.status.as_deref() == Some("Paid"))
        .times(1)
        .returning(|n| Ok(stored_notification(n)));
    let registry = ConnectionRegistry::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<RealtimeMessage>();
    registry.join(&UserId::from("alice"), registry.next_connection_id(), tx).await;

    let req = json!({"orderId": 7, "method": "gpay", "reference": "UTR123456789"});
    let (status, body) = post_request(&bearer("alice", Role::User), "/payments/confirm", req, |cfg| {
        cfg.app_data(payment_api(store, &registry))
            .service(ConfirmPaymentRoute::<MockStore, ConnectionRegistry>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment confirmed");
    assert_eq!(body["data"]["order"]["status"], "processing");
    assert_eq!(body["data"]["order"]["payment"]["status"], "paid");
    assert_eq!(body["data"]["order"]["payment"]["method"], "gpay");
    assert!(rx.try_recv().unwrap().is(ORDER_STATUS_EVENT));
    assert!(rx.try_recv().unwrap().is(NOTIFICATION_EVENT));
}

#[actix_web::test]
async fn confirm_needs_an_order_id() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_confirm_payment().never();
    let registry = ConnectionRegistry::new();
    let (status, body) =
        post_request(&bearer("alice", Role::User), "/payments/confirm", json!({"method": "upi"}), |cfg| {
            cfg.app_data(payment_api(store, &registry))
                .service(ConfirmPaymentRoute::<MockStore, ConnectionRegistry>::new());
        })
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid request body");
}

#[actix_web::test]
async fn select_cod() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_select_cod().withf(|id, owner| *id == OrderId(7) && owner.as_str() == "alice").times(1).returning(
        |id, owner| {
            let mut order = sample_order(id.value(), owner.as_str(), OrderStatus::Processing);
            order.payment = Some(Payment { status: PaymentStatus::Cod, ..Payment::pending(PaymentMethod::Cod) });
            Ok(Some(order))
        },
    );
    store.expect_insert_notification().times(1).returning(|n| Ok(stored_notification(n)));
    let registry = ConnectionRegistry::new();
    let (status, body) = post_request(&bearer("alice", Role::User), "/payments/select-cod", json!({"orderId": 7}), |cfg| {
        cfg.app_data(payment_api(store, &registry)).service(SelectCodRoute::<MockStore, ConnectionRegistry>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cash on delivery selected");
    assert_eq!(body["data"]["order"]["payment"]["method"], "cod");
    assert_eq!(body["data"]["order"]["payment"]["status"], "cod");
}

#[actix_web::test]
async fn malformed_order_ids_are_rejected() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_select_cod().never();
    let registry = ConnectionRegistry::new();
    let (status, body) =
        post_request(&bearer("alice", Role::User), "/payments/select-cod", json!({"orderId": "seven"}), |cfg| {
            cfg.app_data(payment_api(store, &registry)).service(SelectCodRoute::<MockStore, ConnectionRegistry>::new());
        })
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn decline_leaves_the_status_alone() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_decline_payment().times(1).returning(|id, owner| {
        let mut order = sample_order(id.value(), owner.as_str(), OrderStatus::Pending);
        order.payment = Some(Payment { status: PaymentStatus::Failed, ..Payment::pending(PaymentMethod::Upi) });
        Ok(Some(order))
    });
    store
        .expect_insert_notification()
        .withf(|n| n.title == "Payment declined")
        .times(1)
        .returning(|n| Ok(stored_notification(n)));
    let registry = ConnectionRegistry::new();
    let (status, body) = post_request(&bearer("alice", Role::User), "/payments/decline", json!({"orderId": 7}), |cfg| {
        cfg.app_data(payment_api(store, &registry))
            .service(DeclinePaymentRoute::<MockStore, ConnectionRegistry>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["status"], "pending");
    assert_eq!(body["data"]["order"]["payment"]["status"], "failed");
}
