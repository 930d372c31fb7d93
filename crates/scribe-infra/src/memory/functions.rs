//! Local stand-in for the privileged user-lookup function.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::RwLock;

use scribe_core::domain::AuthorProfile;
use scribe_core::error::RepoError;
use scribe_core::ports::FunctionInvoker;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest {
    #[serde(default)]
    user_id: Option<String>,
}

/// Answers executions from a local user table, wrapping replies in the same
/// envelope the hosted runtime produces.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, AuthorProfile>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user_id: impl Into<String>, profile: AuthorProfile) {
        self.users.write().await.insert(user_id.into(), profile);
    }

    async fn reply(&self, body: &str) -> Value {
        let request: LookupRequest = serde_json::from_str(body).unwrap_or_default();
        let Some(user_id) = request.user_id.filter(|id| !id.is_empty()) else {
            return json!({ "error": "userId is required" });
        };
        match self.users.read().await.get(&user_id) {
            Some(profile) => json!({
                "success": true,
                "user": { "name": profile.name, "email": profile.email },
            }),
            None => json!({ "success": false, "error": "User not found" }),
        }
    }
}

#[async_trait]
impl FunctionInvoker for InMemoryUserDirectory {
    async fn execute(&self, function_id: &str, body: String) -> Result<String, RepoError> {
        tracing::debug!(function_id = %function_id, "Local function execution");
        let reply = self.reply(&body).await;
        let envelope = json!({
            "$id": uuid::Uuid::new_v4().simple().to_string(),
            "functionId": function_id,
            "status": "completed",
            "responseStatusCode": 200,
            "responseBody": reply.to_string(),
        });
        Ok(envelope.to_string())
    }
}
