use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db::traits::StoreError,
    db_types::{NewNotification, Notification, NotificationPage, OrderId, Pagination, UserId},
};

const NOTIFICATION_COLUMNS: &str = "id, owner_id, kind, title, message, order_id, status, read, created_at";

#[derive(Debug, Clone, FromRow)]
struct NotificationRow {
    id: i64,
    owner_id: String,
    kind: String,
    title: String,
    message: String,
    order_id: Option<i64>,
    status: Option<String>,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let kind = row.kind.parse().map_err(|e| StoreError::DataIntegrity(format!("Notification {}: {e}", row.id)))?;
        Ok(Self {
            id: row.id,
            owner_id: UserId(row.owner_id),
            kind,
            title: row.title,
            message: row.message,
            order_id: row.order_id.map(OrderId),
            status: row.status,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, StoreError> {
    let sql = format!(
        "INSERT INTO notifications (owner_id, kind, title, message, order_id, status, read, created_at) VALUES ($1, \
         $2, $3, $4, $5, $6, 0, $7) RETURNING {NOTIFICATION_COLUMNS}"
    );
    let row = sqlx::query_as::<_, NotificationRow>(&sql)
        .bind(notification.owner_id.as_str())
        .bind(notification.kind.as_str())
        .bind(notification.title)
        .bind(notification.message)
        .bind(notification.order_id.map(|id| id.value()))
        .bind(notification.status)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;
    row.try_into()
}

pub async fn fetch_notifications(
    owner: &UserId,
    page: Pagination,
    conn: &mut SqliteConnection,
) -> Result<NotificationPage, StoreError> {
    let sql = format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE owner_id = $1 ORDER BY id DESC LIMIT $2 OFFSET $3"
    );
    let rows = sqlx::query_as::<_, NotificationRow>(&sql)
        .bind(owner.as_str())
        .bind(page.page_size())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;
    let notifications = rows.into_iter().map(Notification::try_from).collect::<Result<Vec<_>, _>>()?;
    let (total, unread) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN read = 0 THEN 1 ELSE 0 END), 0) FROM notifications WHERE owner_id = $1",
    )
    .bind(owner.as_str())
    .fetch_one(&mut *conn)
    .await?;
    Ok(NotificationPage { notifications, total, unread })
}

pub async fn count_unread(owner: &UserId, conn: &mut SqliteConnection) -> Result<i64, StoreError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications WHERE owner_id = $1 AND read = 0")
        .bind(owner.as_str())
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

pub async fn mark_read(id: i64, owner: &UserId, conn: &mut SqliteConnection) -> Result<Option<Notification>, StoreError> {
    let sql = format!("UPDATE notifications SET read = 1 WHERE id = $1 AND owner_id = $2 RETURNING {NOTIFICATION_COLUMNS}");
    let row = sqlx::query_as::<_, NotificationRow>(&sql)
        .bind(id)
        .bind(owner.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Notification::try_from).transpose()
}

pub async fn mark_all_read(owner: &UserId, conn: &mut SqliteConnection) -> Result<u64, StoreError> {
    let result = sqlx::query("UPDATE notifications SET read = 1 WHERE owner_id = $1 AND read = 0")
        .bind(owner.as_str())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
