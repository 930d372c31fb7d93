//! Synchronous function executions.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use scribe_core::error::RepoError;
use scribe_core::ports::FunctionInvoker;

use super::client::BackendClient;

#[derive(Debug, Serialize)]
struct ExecutionRequest<'a> {
    body: &'a str,
    #[serde(rename = "async")]
    is_async: bool,
}

pub struct HttpFunctionInvoker {
    client: Arc<BackendClient>,
}

impl HttpFunctionInvoker {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FunctionInvoker for HttpFunctionInvoker {
    async fn execute(&self, function_id: &str, body: String) -> Result<String, RepoError> {
        let url = self
            .client
            .url(&format!("functions/{function_id}/executions"));
        let request = self.client.http().post(url).json(&ExecutionRequest {
            body: &body,
            is_async: false,
        });
        self.client.text(request).await
    }
}
