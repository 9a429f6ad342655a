//! In-memory request sender for testing and development.

use super::request::{Method, RequestValues};
use super::RequestSender;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub values: RequestValues,
}

#[derive(Clone)]
enum Scripted {
    Respond(Value),
    Fail(String),
}

/// Mock request sender.
///
/// Responses are scripted per `(method, path)`; every call is recorded so
/// tests can assert how many remote operations an entity performed.
/// Unscripted calls fail with a transport error.
#[derive(Default)]
pub struct MockSender {
    routes: Mutex<HashMap<(Method, String), Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful `data` payload for `method path`
    pub fn respond(&self, method: Method, path: &str, data: Value) -> &Self {
        self.script(method, path, Scripted::Respond(data))
    }

    /// Script a transport failure for `method path`
    pub fn fail(&self, method: Method, path: &str, message: &str) -> &Self {
        self.script(method, path, Scripted::Fail(message.to_string()))
    }

    fn script(&self, method: Method, path: &str, scripted: Scripted) -> &Self {
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert((method, path.to_string()), scripted);
        }
        self
    }

    /// All calls so far, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls made to `method path`
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    /// Most recent call to `method path`
    pub fn last_call(&self, method: Method, path: &str) -> Option<RecordedCall> {
        self.calls()
            .into_iter()
            .rev()
            .find(|c| c.method == method && c.path == path)
    }
}

#[async_trait]
impl RequestSender for MockSender {
    async fn send(&self, method: Method, path: &str, values: &RequestValues) -> Result<Value> {
        debug!(%method, path, "mock request");

        self.calls
            .lock()
            .map_err(|_| anyhow::anyhow!("mock call log poisoned"))?
            .push(RecordedCall {
                method,
                path: path.to_string(),
                values: values.clone(),
            });

        let scripted = self
            .routes
            .lock()
            .map_err(|_| anyhow::anyhow!("mock routes poisoned"))?
            .get(&(method, path.to_string()))
            .cloned();

        match scripted {
            Some(Scripted::Respond(data)) => Ok(data),
            Some(Scripted::Fail(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("API request failed: 501 no mock for {} {}", method, path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_scripted_response_and_recording() {
        let mock = MockSender::new();
        mock.respond(Method::Get, "cluster/nextid", json!("100"));

        let data = mock
            .send(Method::Get, "cluster/nextid", &RequestValues::new())
            .await
            .unwrap();

        assert_eq!(data, json!("100"));
        assert_eq!(mock.count(Method::Get, "cluster/nextid"), 1);
    }

    #[tokio::test]
    async fn test_unscripted_call_fails() {
        let mock = MockSender::new();
        let result = mock.send(Method::Put, "pools/lab", &RequestValues::new()).await;
        assert!(result.is_err());
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_message_is_passed_through() {
        let mock = MockSender::new();
        mock.fail(Method::Delete, "pools/lab", "connection reset");
        let err = mock
            .send(Method::Delete, "pools/lab", &RequestValues::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
    }
}
