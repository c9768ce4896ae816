use mockall::mock;
use urbanease_engine::{
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
    NotificationManagement,
    OrderManagement,
    StoreError,
};

mock! {
    pub Store {}
    impl OrderManagement for Store {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;
        async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;
        async fn fetch_order_for_owner(&self, id: OrderId, owner: &UserId) -> Result<Option<Order>, StoreError>;
        async fn fetch_orders_for_user(&self, owner: &UserId) -> Result<Vec<Order>, StoreError>;
        async fn fetch_all_orders(&self) -> Result<Vec<Order>, StoreError>;
        async fn update_order_status(&self, id: OrderId, status: OrderStatus, guard: StatusGuard) -> Result<Option<Order>, StoreError>;
        async fn initiate_payment(&self, id: OrderId, owner: &UserId) -> Result<Option<Order>, StoreError>;
        async fn confirm_payment(&self, id: OrderId, owner: &UserId, confirmation: PaymentConfirmation) -> Result<Option<Order>, StoreError>;
        async fn select_cod(&self, id: OrderId, owner: &UserId) -> Result<Option<Order>, StoreError>;
        async fn decline_payment(&self, id: OrderId, owner: &UserId) -> Result<Option<Order>, StoreError>;
    }
    impl NotificationManagement for Store {
        async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, StoreError>;
        async fn fetch_notifications(&self, owner: &UserId, page: Pagination) -> Result<NotificationPage, StoreError>;
        async fn count_unread_notifications(&self, owner: &UserId) -> Result<i64, StoreError>;
        async fn mark_notification_read(&self, id: i64, owner: &UserId) -> Result<Option<Notification>, StoreError>;
        async fn mark_all_notifications_read(&self, owner: &UserId) -> Result<u64, StoreError>;
    }
}
