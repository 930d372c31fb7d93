use async_trait::async_trait;

use crate::error::RepoError;

/// Synchronous serverless function execution.
#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    /// Run `function_id` with a JSON string `body` and return the raw
    /// execution envelope exactly as the backend sent it.
    async fn execute(&self, function_id: &str, body: String) -> Result<String, RepoError>;
}
