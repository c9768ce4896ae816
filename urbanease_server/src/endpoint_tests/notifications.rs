use actix_web::http::StatusCode;
use serde_json::json;
use urbanease_engine::db_types::{NotificationPage, Role, DEFAULT_PAGE_SIZE};

use super::{helpers::*, mocks::MockStore};
use crate::routes::{MarkAllReadRoute, MarkReadRoute, NotificationsRoute, UnreadCountRoute};

fn feed(owner: &str, total: i64, unread: i64) -> NotificationPage {
    NotificationPage {
        notifications: vec![sample_notification(12, owner, false), sample_notification(11, owner, true)],
        total,
        unread,
    }
}

#[actix_web::test]
async fn paged_feed() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_fetch_notifications()
        .withf(|owner, page| owner.as_str() == "alice" && page.page() == 2 && page.page_size() == 5)
        .times(1)
        .returning(|owner, _| Ok(feed(owner.as_str(), 12, 3)));
    let (status, body) = get_request(&bearer("alice", Role::User), "/notifications?page=2&limit=5", |cfg| {
        cfg.app_data(notification_api(store)).service(NotificationsRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["page"], 2);
    assert_eq!(data["pageSize"], 5);
    assert_eq!(data["total"], 12);
    assert_eq!(data["totalPages"], 3);
    assert_eq!(data["unread"], 3);
    assert_eq!(data["notifications"][0]["id"], 12);
    assert_eq!(data["notifications"][0]["type"], "order-status");
    assert_eq!(data["notifications"][0]["order"], 7);
    assert_eq!(data["notifications"][1]["read"], true);
}

#[actix_web::test]
async fn junk_paging_uses_the_defaults() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_fetch_notifications()
        .withf(|_, page| page.page() == 1 && page.page_size() == DEFAULT_PAGE_SIZE)
        .times(1)
        .returning(|owner, _| Ok(feed(owner.as_str(), 2, 1)));
    let (status, body) = get_request(&bearer("alice", Role::User), "/notifications?page=first&limit=lots", |cfg| {
        cfg.app_data(notification_api(store)).service(NotificationsRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["totalPages"], 1);
}

#[actix_web::test]
async fn oversized_pages_are_clamped() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_fetch_notifications()
        .withf(|_, page| page.page() == 1 && page.page_size() == 100)
        .times(1)
        .returning(|_, _| Ok(NotificationPage::default()));
    let (status, body) = get_request(&bearer("alice", Role::User), "/notifications?page=-3&limit=5000", |cfg| {
        cfg.app_data(notification_api(store)).service(NotificationsRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notifications"], json!([]));
    assert_eq!(body["data"]["totalPages"], 0);
}

#[actix_web::test]
async fn customers_only_see_their_own_feed() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_fetch_notifications()
        .withf(|owner, _| owner.as_str() == "alice")
        .times(1)
        .returning(|owner, _| Ok(feed(owner.as_str(), 2, 0)));
    let (status, body) = get_request(&bearer("alice", Role::User), "/notifications?userId=bob", |cfg| {
        cfg.app_data(notification_api(store)).service(NotificationsRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notifications"][0]["user"], "alice");
}

#[actix_web::test]
async fn staff_can_read_another_feed() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_fetch_notifications()
        .withf(|owner, _| owner.as_str() == "bob")
        .times(1)
        .returning(|owner, _| Ok(feed(owner.as_str(), 2, 2)));
    let (status, body) = get_request(&bearer("root", Role::Admin), "/notifications?userId=bob", |cfg| {
        cfg.app_data(notification_api(store)).service(NotificationsRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notifications"][0]["user"], "bob");
}

#[actix_web::test]
async fn unread_count() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_count_unread_notifications().withf(|owner| owner.as_str() == "alice").times(1).returning(|_| Ok(4));
    let (status, body) = get_request(&bearer("alice", Role::User), "/notifications/unread-count", |cfg| {
        cfg.app_data(notification_api(store)).service(UnreadCountRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": {"unread": 4}}));
}

#[actix_web::test]
async fn mark_read() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store
        .expect_mark_notification_read()
        .withf(|id, owner| *id == 12 && owner.as_str() == "alice")
        .times(1)
        .returning(|id, owner| Ok(Some(sample_notification(id, owner.as_str(), true))));
    let (status, body) = patch_request(&bearer("alice", Role::User), "/notifications/12/read", json!({}), |cfg| {
        cfg.app_data(notification_api(store)).service(MarkReadRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notification"]["id"], 12);
    assert_eq!(body["data"]["notification"]["read"], true);
}

#[actix_web::test]
async fn marking_someone_elses_notification_is_not_found() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_mark_notification_read().times(1).returning(|_, _| Ok(None));
    let (status, body) = patch_request(&bearer("mallory", Role::User), "/notifications/12/read", json!({}), |cfg| {
        cfg.app_data(notification_api(store)).service(MarkReadRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Notification not found");
}

#[actix_web::test]
async fn mark_all_read() {
    let _ = env_logger::try_init();
    let mut store = MockStore::new();
    store.expect_mark_all_notifications_read().withf(|owner| owner.as_str() == "alice").times(1).returning(|_| Ok(3));
    let (status, body) = post_request(&bearer("alice", Role::User), "/notifications/mark-all-read", json!({}), |cfg| {
        cfg.app_data(notification_api(store)).service(MarkAllReadRoute::<MockStore>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["updated"], 3);
}
