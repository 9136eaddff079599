//! Authentication endpoints
//!
//! The backend issues the token; the client only stores it in the
//! [`SessionContext`](crate::session::SessionContext).

use fyp_common::models::UserProfile;
use fyp_common::Role;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::ApiClient;
use crate::error::Result;
use crate::session::Session;

/// Body returned by `POST /auth/login`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(flatten)]
    pub user: UserProfile,
}

/// Body of `POST /auth/register`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// Body returned by `POST /auth/register`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registered {
    pub user_id: i64,
    pub email: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiClient {
    /// Log in and install the issued credential in the session
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let request = self
            .public(Method::POST, "/auth/login")
            .json(&json!({ "email": email, "password": password }));
        let response: LoginResponse = self.json(request).await?;

        let user = response.user.clone();
        self.session().begin(Session {
            token: response.token,
            user: response.user,
        })?;
        Ok(user)
    }

    pub async fn register(&self, registration: &Registration) -> Result<Registered> {
        let request = self.public(Method::POST, "/auth/register").json(registration);
        let registered: Registered = self.json(request).await?;
        info!(user_id = registered.user_id, "Registered new account");
        Ok(registered)
    }

    /// Local teardown; the backend keeps no session state
    pub fn logout(&self) {
        self.session().end("logout");
    }
}
