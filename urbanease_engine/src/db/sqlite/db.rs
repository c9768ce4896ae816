use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqlitePool};

use super::{new_pool, notifications, orders};
use crate::{
    db::traits::{NotificationManagement, OrderManagement, StoreError},
    db_types::{
        NewNotification,
        NewOrder,
        Notification,
        NotificationPage,
        Order,
        OrderId,
        OrderStatus,
        Pagination,
        PaymentConfirmation,
        StatusGuard,
        UserId,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date using the embedded migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        migrate!("./src/db/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::DatabaseError(format!("Migrations failed. {e}")))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved in the DB with id {}", order.order_number, order.id);
        Ok(order)
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(id, &mut conn).await
    }

    async fn fetch_order_for_owner(&self, id: OrderId, owner: &UserId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_for_owner(id, owner, &mut conn).await
    }

    async fn fetch_orders_for_user(&self, owner: &UserId) -> Result<Vec<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let orders = orders::fetch_orders(Some(owner), &mut tx).await?;
        tx.commit().await?;
        Ok(orders)
    }

    async fn fetch_all_orders(&self) -> Result<Vec<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let orders = orders::fetch_orders(None, &mut tx).await?;
        tx.commit().await?;
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        guard: StatusGuard,
    ) -> Result<Option<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let updated = match orders::update_order_status(id, status, &guard, &mut tx).await? {
            Some(id) => orders::fetch_order(id, &mut tx).await?,
            None => None,
        };
        tx.commit().await?;
        if updated.is_some() {
            debug!("🗃️ Order {id} status set to {status}");
        }
        Ok(updated)
    }

    async fn initiate_payment(&self, id: OrderId, owner: &UserId) -> Result<Option<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let created = orders::initiate_payment(id, owner, &mut tx).await?;
        let order = orders::fetch_order_for_owner(id, owner, &mut tx).await?;
        tx.commit().await?;
        if created > 0 {
            debug!("🗃️ Payment record created for order {id}");
        }
        Ok(order)
    }

    async fn confirm_payment(
        &self,
        id: OrderId,
        owner: &UserId,
        confirmation: PaymentConfirmation,
    ) -> Result<Option<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::confirm_payment(id, owner, confirmation, &mut tx).await? {
            Some(id) => orders::fetch_order(id, &mut tx).await?,
            None => None,
        };
        tx.commit().await?;
        Ok(order)
    }

    async fn select_cod(&self, id: OrderId, owner: &UserId) -> Result<Option<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::select_cod(id, owner, &mut tx).await? {
            Some(id) => orders::fetch_order(id, &mut tx).await?,
            None => None,
        };
        tx.commit().await?;
        Ok(order)
    }

    async fn decline_payment(&self, id: OrderId, owner: &UserId) -> Result<Option<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::decline_payment(id, owner, &mut tx).await? {
            Some(id) => orders::fetch_order(id, &mut tx).await?,
            None => None,
        };
        tx.commit().await?;
        Ok(order)
    }
}

impl NotificationManagement for SqliteDatabase {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let notification = notifications::insert_notification(notification, &mut conn).await?;
        trace!("🗃️ Notification #{} stored for {}", notification.id, notification.owner_id);
        Ok(notification)
    }

    async fn fetch_notifications(&self, owner: &UserId, page: Pagination) -> Result<NotificationPage, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = notifications::fetch_notifications(owner, page, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn count_unread_notifications(&self, owner: &UserId) -> Result<i64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        notifications::count_unread(owner, &mut conn).await
    }

    async fn mark_notification_read(&self, id: i64, owner: &UserId) -> Result<Option<Notification>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        notifications::mark_read(id, owner, &mut conn).await
    }

    async fn mark_all_notifications_read(&self, owner: &UserId) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let count = notifications::mark_all_read(owner, &mut conn).await?;
        trace!("🗃️ {count} notifications marked as read for {owner}");
        Ok(count)
    }
}
