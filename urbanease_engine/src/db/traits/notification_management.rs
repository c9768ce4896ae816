use crate::{
    db::traits::StoreError,
    db_types::{NewNotification, Notification, NotificationPage, Pagination, UserId},
};

/// The durable per-user notification feed.
#[allow(async_fn_in_trait)]
pub trait NotificationManagement {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, StoreError>;

    /// A page of the owner's notifications, newest first, along with the owner's total and unread counts.
    async fn fetch_notifications(&self, owner: &UserId, page: Pagination) -> Result<NotificationPage, StoreError>;

    async fn count_unread_notifications(&self, owner: &UserId) -> Result<i64, StoreError>;

    /// Marks a single notification as read. Returns `None` if no notification with this id belongs to `owner`.
    async fn mark_notification_read(&self, id: i64, owner: &UserId) -> Result<Option<Notification>, StoreError>;

    /// Marks all the owner's unread notifications as read, returning how many were changed.
    async fn mark_all_notifications_read(&self, owner: &UserId) -> Result<u64, StoreError>;
}
