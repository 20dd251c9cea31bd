//! Scripted in-memory node used by the unit tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::value::to_raw_value;
use serde_json::Value;

use nodepulse_core::{JsonRpcRequest, JsonRpcResponse, RpcTransport, TransportError};

enum Reply {
    Result(Value),
    Error(i64, String),
    Empty,
    Unreachable,
}

struct Rule {
    method: String,
    params: Option<Vec<Value>>,
    reply: Reply,
}

/// Answers by method (and optionally exact params); the last matching rule
/// wins, so later rules override earlier ones.
/// Unscripted methods get a `-32601 method not found` error.
#[derive(Default)]
pub struct MockNode {
    rules: Vec<Rule>,
    delay: Option<Duration>,
    calls: Mutex<Vec<JsonRpcRequest>>,
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result(mut self, method: &str, result: Value) -> Self {
        self.rules.push(Rule {
            method: method.into(),
            params: None,
            reply: Reply::Result(result),
        });
        self
    }

    pub fn result_for(mut self, method: &str, params: Vec<Value>, result: Value) -> Self {
        self.rules.push(Rule {
            method: method.into(),
            params: Some(params),
            reply: Reply::Result(result),
        });
        self
    }

    pub fn error(mut self, method: &str, code: i64, message: &str) -> Self {
        self.rules.push(Rule {
            method: method.into(),
            params: None,
            reply: Reply::Error(code, message.into()),
        });
        self
    }

    /// Answers `method` with an envelope carrying neither `result` nor `error`.
    pub fn empty(mut self, method: &str) -> Self {
        self.rules.push(Rule {
            method: method.into(),
            params: None,
            reply: Reply::Empty,
        });
        self
    }

    /// Every call to `method` fails as if the connection was refused.
    pub fn unreachable(mut self, method: &str) -> Self {
        self.rules.push(Rule {
            method: method.into(),
            params: None,
            reply: Reply::Unreachable,
        });
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<JsonRpcRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|r| r.method).collect()
    }
}

#[async_trait]
impl RpcTransport for MockNode {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().unwrap().push(req.clone());

        let rule = self.rules.iter().rfind(|r| {
            r.method == req.method && r.params.as_ref().map_or(true, |p| *p == req.params)
        });
        match rule.map(|r| &r.reply) {
            Some(Reply::Result(v)) => Ok(JsonRpcResponse::success(req.id, to_raw_value(v)?)),
            Some(Reply::Error(code, msg)) => Ok(JsonRpcResponse::failure(req.id, *code, msg.clone())),
            Some(Reply::Empty) => {
                let mut resp = JsonRpcResponse::failure(req.id, 0, "");
                resp.error = None;
                Ok(resp)
            }
            Some(Reply::Unreachable) => Err(TransportError::Http("connection refused".into())),
            None => Ok(JsonRpcResponse::failure(
                req.id,
                -32601,
                format!("the method {} does not exist/is not available", req.method),
            )),
        }
    }

    fn url(&self) -> &str {
        "mock://node"
    }
}
