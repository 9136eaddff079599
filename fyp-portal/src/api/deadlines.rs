//! Deadline endpoints

use chrono::NaiveDateTime;
use fyp_common::models::{Deadline, DocumentKind};
use reqwest::Method;
use tracing::warn;

use super::ApiClient;
use crate::error::Result;

/// Parameters of a new deadline (sent as query parameters)
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeadline {
    pub deadline_type: String,
    pub due: NaiveDateTime,
    pub description: Option<String>,
    pub document_type: Option<DocumentKind>,
}

impl ApiClient {
    pub async fn create_deadline(&self, deadline: &NewDeadline, user_id: i64) -> Result<Deadline> {
        let mut params = vec![
            ("deadlineType", deadline.deadline_type.clone()),
            ("deadline", deadline.due.format("%Y-%m-%dT%H:%M:%S").to_string()),
            ("userId", user_id.to_string()),
        ];
        if let Some(description) = &deadline.description {
            params.push(("description", description.clone()));
        }
        if let Some(kind) = deadline.document_type {
            params.push(("documentType", kind.as_str().to_string()));
        }
        let request = self.authorized(Method::POST, "/deadlines")?.query(&params);
        self.json(request).await
    }

    pub async fn active_deadlines(&self) -> Result<Vec<Deadline>> {
        let request = self.authorized(Method::GET, "/deadlines/active")?;
        self.list(request).await
    }

    pub async fn all_deadlines(&self) -> Result<Vec<Deadline>> {
        let request = self.authorized(Method::GET, "/deadlines")?;
        self.list(request).await
    }

    pub async fn deactivate_deadline(&self, deadline_id: i64) -> Result<()> {
        let request = self.authorized(
            Method::PATCH,
            &format!("/deadlines/{}/deactivate", deadline_id),
        )?;
        self.unit(request).await
    }

    /// Delete a deadline
    ///
    /// The backend also deletes every document filed under the deadline's
    /// kind.
    pub async fn delete_deadline(&self, deadline_id: i64) -> Result<()> {
        warn!(deadline_id, "Deleting deadline; linked documents are removed with it");
        let request =
            self.authorized(Method::DELETE, &format!("/deadlines/{}", deadline_id))?;
        self.unit(request).await
    }
}
