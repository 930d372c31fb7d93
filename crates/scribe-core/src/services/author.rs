//! Author resolution through the privileged user-lookup function.
//!
//! The client session cannot read other users' profiles, so a serverless
//! function with elevated credentials does the lookup. Its reply arrives as a
//! JSON string nested inside the execution envelope; [`decode_execution`]
//! unwraps both layers strictly and keeps only `{name, email}`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::domain::{AuthorLookup, AuthorProfile};
use crate::error::ResolveError;
use crate::ports::{Clock, FunctionInvoker};

/// How long a resolved profile is reused.
pub const DEFAULT_AUTHOR_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    errors: Option<String>,
    #[serde(default)]
    response_body: Option<String>,
    /// Older servers put the body here.
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FunctionReply {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    user: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserFields {
    name: String,
    email: String,
}

/// Decode an execution envelope into an author profile.
pub fn decode_execution(raw: &str) -> Result<AuthorProfile, ResolveError> {
    let envelope: ExecutionEnvelope =
        serde_json::from_str(raw).map_err(|e| ResolveError::InvalidEnvelope(e.to_string()))?;

    if envelope.status.as_deref() == Some("failed") {
        let reason = envelope
            .errors
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "execution failed".to_string());
        return Err(ResolveError::Rejected(reason));
    }

    let body = envelope
        .response_body
        .filter(|b| !b.trim().is_empty())
        .or(envelope.response.filter(|b| !b.trim().is_empty()))
        .ok_or(ResolveError::MissingBody)?;

    let reply: FunctionReply =
        serde_json::from_str(&body).map_err(|e| ResolveError::InvalidBody(e.to_string()))?;

    if reply.success != Some(true) {
        return Err(ResolveError::Rejected(
            reply
                .error
                .unwrap_or_else(|| "no success flag in reply".to_string()),
        ));
    }

    let user = reply.user.ok_or(ResolveError::MissingUser)?;
    let fields: UserFields = serde_json::from_value(user).map_err(|_| ResolveError::MissingUser)?;

    Ok(AuthorProfile {
        name: fields.name,
        email: fields.email,
    })
}

#[derive(Debug, Clone)]
struct CachedProfile {
    profile: AuthorProfile,
    resolved_at: DateTime<Utc>,
}

/// Resolves user ids to author profiles, caching successes per user id.
pub struct AuthorResolver {
    invoker: Arc<dyn FunctionInvoker>,
    function_id: String,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    profiles: RwLock<HashMap<String, CachedProfile>>,
}

impl AuthorResolver {
    pub fn new(
        invoker: Arc<dyn FunctionInvoker>,
        function_id: impl Into<String>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            invoker,
            function_id: function_id.into(),
            clock,
            ttl,
            profiles: RwLock::new(HashMap::new()),
        }
    }

    /// Strict lookup: every failure comes back with its reason.
    pub async fn try_resolve(&self, user_id: &str) -> Result<AuthorProfile, ResolveError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ResolveError::EmptyUserId);
        }
        if let Some(profile) = self.cached(user_id).await {
            return Ok(profile);
        }

        let payload = serde_json::json!({ "userId": user_id }).to_string();
        tracing::debug!(user_id = %user_id, function_id = %self.function_id, "Resolving author");
        let raw = self
            .invoker
            .execute(&self.function_id, payload)
            .await
            .map_err(ResolveError::Invocation)?;
        let profile = decode_execution(&raw)?;

        self.profiles.write().await.insert(
            user_id.to_string(),
            CachedProfile {
                profile: profile.clone(),
                resolved_at: self.clock.now(),
            },
        );
        Ok(profile)
    }

    /// Best-effort lookup for views. Failures are logged and become `None`.
    pub async fn resolve(&self, user_id: &str) -> Option<AuthorProfile> {
        match self.try_resolve(user_id).await {
            Ok(profile) => Some(profile),
            Err(ResolveError::EmptyUserId) => {
                tracing::warn!("Author lookup skipped: empty user id");
                None
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Author lookup failed");
                None
            }
        }
    }

    pub async fn lookup(&self, user_id: &str) -> AuthorLookup {
        self.resolve(user_id).await.into()
    }

    /// Resolve every distinct id once, concurrently. Results are keyed by
    /// user id; unresolved ids are absent.
    pub async fn resolve_many<'a, I>(&self, user_ids: I) -> HashMap<String, AuthorProfile>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unique: BTreeSet<&str> = user_ids
            .into_iter()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect();

        let lookups = unique.into_iter().map(|id| async move {
            let profile = self.resolve(id).await;
            (id.to_string(), profile)
        });

        futures::future::join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(id, profile)| profile.map(|p| (id, p)))
            .collect()
    }

    async fn cached(&self, user_id: &str) -> Option<AuthorProfile> {
        let profiles = self.profiles.read().await;
        let entry = profiles.get(user_id)?;
        let fresh = (self.clock.now() - entry.resolved_at)
            .to_std()
            .map(|age| age < self.ttl)
            .unwrap_or(true);
        fresh.then(|| entry.profile.clone())
    }
}
