//! Notification endpoints

use fyp_common::models::Notification;
use reqwest::Method;
use serde::Deserialize;

use super::ApiClient;
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct UnreadCount {
    #[serde(default)]
    count: u64,
}

impl ApiClient {
    pub async fn notifications(&self, user_id: i64) -> Result<Vec<Notification>> {
        let request =
            self.authorized(Method::GET, &format!("/notifications/user/{}", user_id))?;
        self.list(request).await
    }

    pub async fn unread_notifications(&self, user_id: i64) -> Result<Vec<Notification>> {
        let request = self.authorized(
            Method::GET,
            &format!("/notifications/user/{}/unread", user_id),
        )?;
        self.list(request).await
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<u64> {
        let request = self.authorized(
            Method::GET,
            &format!("/notifications/user/{}/unread-count", user_id),
        )?;
        let body: UnreadCount = self.json(request).await?;
        Ok(body.count)
    }

    pub async fn mark_notification_read(&self, notification_id: i64) -> Result<()> {
        let request = self.authorized(
            Method::PATCH,
            &format!("/notifications/{}/mark-read", notification_id),
        )?;
        self.unit(request).await
    }

    pub async fn mark_all_notifications_read(&self, user_id: i64) -> Result<()> {
        let request = self.authorized(
            Method::PATCH,
            &format!("/notifications/user/{}/mark-all-read", user_id),
        )?;
        self.unit(request).await
    }

    pub async fn delete_notification(&self, notification_id: i64) -> Result<()> {
        let request =
            self.authorized(Method::DELETE, &format!("/notifications/{}", notification_id))?;
        self.unit(request).await
    }
}
