use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::NotificationManagement,
    db_types::{Notification, NotificationPage, Pagination, Role, UserId},
    ue_api::errors::OrderFlowError,
};

/// The per-user notification feed.
pub struct NotificationApi<B> {
    db: B,
}

impl<B> Debug for NotificationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationApi")
    }
}

impl<B> NotificationApi<B>
where B: NotificationManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// A page of notifications, newest first.
    ///
    /// Admins and moderators may read another user's feed by passing `requested_user`. For everyone else the
    /// override is ignored and their own feed is returned.
    pub async fn list(
        &self,
        caller: &UserId,
        role: Role,
        requested_user: Option<UserId>,
        page: Pagination,
    ) -> Result<NotificationPage, OrderFlowError> {
        let owner = match requested_user {
            Some(user) if role.is_privileged() && !user.is_blank() => user,
            Some(user) if user != *caller => {
                debug!("📬️ Ignoring request by {caller} to read the notifications of {user}");
                caller.clone()
            },
            _ => caller.clone(),
        };
        Ok(self.db.fetch_notifications(&owner, page).await?)
    }

    pub async fn unread_count(&self, owner: &UserId) -> Result<i64, OrderFlowError> {
        Ok(self.db.count_unread_notifications(owner).await?)
    }

    /// Marks one of the caller's notifications as read. Notifications belonging to anyone else are not found.
    pub async fn mark_read(&self, id: i64, owner: &UserId) -> Result<Notification, OrderFlowError> {
        self.db
            .mark_notification_read(id, owner)
            .await?
            .ok_or_else(|| OrderFlowError::NotFound("Notification not found".into()))
    }

    /// Returns the number of notifications that changed from unread to read.
    pub async fn mark_all_read(&self, owner: &UserId) -> Result<u64, OrderFlowError> {
        let count = self.db.mark_all_notifications_read(owner).await?;
        debug!("📬️ {count} notifications marked as read for {owner}");
        Ok(count)
    }
}
