//! Notification list view

use std::sync::Arc;

use fyp_common::models::Notification;
use tracing::info;

use crate::api::ApiClient;
use crate::coordinator::{Confirm, MutationCoordinator, ViewCache};
use crate::error::Result;
use crate::live::source_fn;

pub struct NotificationsView {
    api: Arc<ApiClient>,
    coordinator: MutationCoordinator,
    user_id: i64,
    unread_only: bool,
    notifications: ViewCache<Notification>,
}

impl NotificationsView {
    /// All of `user_id`'s notifications, or only the unread ones
    pub fn new(
        api: Arc<ApiClient>,
        coordinator: MutationCoordinator,
        user_id: i64,
        unread_only: bool,
    ) -> Self {
        let source = {
            let api = Arc::clone(&api);
            source_fn(move || {
                let api = Arc::clone(&api);
                async move {
                    if unread_only {
                        api.unread_notifications(user_id).await
                    } else {
                        api.notifications(user_id).await
                    }
                }
            })
        };
        let notifications = ViewCache::new("notifications").with_source(source);
        Self::over(api, coordinator, user_id, unread_only, notifications)
    }

    /// Operate on an existing cache, e.g. a watcher's unread list
    pub fn over(
        api: Arc<ApiClient>,
        coordinator: MutationCoordinator,
        user_id: i64,
        unread_only: bool,
        notifications: ViewCache<Notification>,
    ) -> Self {
        Self {
            api,
            coordinator,
            user_id,
            unread_only,
            notifications,
        }
    }

    pub async fn load(&self) -> Result<()> {
        self.notifications.refresh().await.map(|_| ())
    }

    pub fn items(&self) -> Vec<Notification> {
        self.notifications.items()
    }

    pub fn unread(&self) -> usize {
        self.notifications.items().iter().filter(|n| !n.is_read).count()
    }

    pub async fn mark_read(&self, notification_id: i64) -> Result<()> {
        let unread_only = self.unread_only;
        self.coordinator
            .mutate(
                &self.notifications,
                "mark notification read",
                |items: &mut Vec<Notification>| {
                    if unread_only {
                        items.retain(|n| n.id != notification_id);
                    } else if let Some(n) = items.iter_mut().find(|n| n.id == notification_id) {
                        n.is_read = true;
                    }
                },
                self.api.mark_notification_read(notification_id),
                |_, _| {},
            )
            .await
    }

    pub async fn mark_all_read(&self) -> Result<()> {
        let unread_only = self.unread_only;
        self.coordinator
            .mutate(
                &self.notifications,
                "mark all notifications read",
                |items: &mut Vec<Notification>| {
                    if unread_only {
                        items.clear();
                    } else {
                        items.iter_mut().for_each(|n| n.is_read = true);
                    }
                },
                self.api.mark_all_notifications_read(self.user_id),
                |_, _| {},
            )
            .await?;
        info!(user_id = self.user_id, "All notifications marked read");
        Ok(())
    }

    /// Delete after explicit confirmation
    pub async fn delete(&self, confirmer: &dyn Confirm, notification_id: i64) -> Result<()> {
        let prompt = match self.notifications.find(|n| n.id == notification_id) {
            Some(n) => format!("Delete notification \"{}\"?", n.title),
            None => format!("Delete notification {}?", notification_id),
        };
        self.coordinator
            .mutate_destructive(
                confirmer,
                &prompt,
                &self.notifications,
                "delete notification",
                |items: &mut Vec<Notification>| items.retain(|n| n.id != notification_id),
                self.api.delete_notification(notification_id),
                |_, _| {},
            )
            .await
    }
}
