//! Group chat endpoints
//!
//! Sending uses a raw `text/plain` body, not JSON.

use fyp_common::models::ChatMessage;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;

use super::ApiClient;
use crate::error::{PortalError, Result};

impl ApiClient {
    pub async fn group_messages(&self, group_id: i64) -> Result<Vec<ChatMessage>> {
        let request = self.authorized(Method::GET, &format!("/chat/group/{}", group_id))?;
        self.list(request).await
    }

    pub async fn send_chat_message(
        &self,
        group_id: i64,
        sender_id: i64,
        content: &str,
    ) -> Result<ChatMessage> {
        let content = content.trim();
        if content.is_empty() {
            return Err(PortalError::validation("Message is empty"));
        }
        let request = self
            .authorized(Method::POST, "/chat/send")?
            .query(&[("groupId", group_id), ("senderId", sender_id)])
            .header(CONTENT_TYPE, "text/plain")
            .body(content.to_string());
        self.json(request).await
    }
}
