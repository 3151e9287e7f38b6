//! DevTools protocol framing.
//!
//! Only the handful of commands and events the renderer needs are modelled;
//! everything else is passed around as raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::infrastructure::ports::RenderSignal;

const LISTENING_PREFIX: &str = "DevTools listening on ";

/// Outgoing command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Command<'a> {
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// Error object carried by a failed command response.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProtocolFailure {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIncoming {
    id: Option<u64>,
    result: Option<Value>,
    error: Option<ProtocolFailure>,
    method: Option<String>,
    #[serde(default)]
    params: Value,
    session_id: Option<String>,
}

/// A message read from the browser connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Response {
        id: u64,
        result: Result<Value, ProtocolFailure>,
    },
    Event {
        method: String,
        params: Value,
        session_id: Option<String>,
    },
}

impl Incoming {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawIncoming = serde_json::from_str(text)?;
        if let Some(id) = raw.id {
            let result = match raw.error {
                Some(failure) => Err(failure),
                None => Ok(raw.result.unwrap_or(Value::Null)),
            };
            return Ok(Self::Response { id, result });
        }
        Ok(Self::Event {
            method: raw.method.unwrap_or_default(),
            params: raw.params,
            session_id: raw.session_id,
        })
    }
}

/// Extract the browser websocket URL from a line of browser stderr.
pub fn devtools_url(line: &str) -> Option<&str> {
    line.trim()
        .strip_prefix(LISTENING_PREFIX)
        .map(str::trim)
        .filter(|url| url.starts_with("ws://"))
}

/// Map a page event onto a render signal. Unrelated events yield `None`.
pub fn signal_from_event(method: &str, params: &Value) -> Option<RenderSignal> {
    match method {
        "Runtime.consoleAPICalled" => {
            let text = params
                .get("args")
                .and_then(Value::as_array)
                .map(|args| {
                    args.iter()
                        .map(remote_object_text)
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default();
            Some(RenderSignal::Console(text))
        }
        "Runtime.exceptionThrown" => {
            let details = params.get("exceptionDetails");
            let message = details
                .and_then(|d| d.get("exception"))
                .and_then(|e| e.get("description"))
                .and_then(Value::as_str)
                .or_else(|| details.and_then(|d| d.get("text")).and_then(Value::as_str))
                .unwrap_or("Uncaught exception");
            Some(RenderSignal::PageError(message.to_string()))
        }
        "Inspector.targetCrashed" => Some(RenderSignal::PageError("Target crashed".to_string())),
        _ => None,
    }
}

/// Console text of one `Runtime.RemoteObject` argument.
fn remote_object_text(arg: &Value) -> String {
    match arg.get("value") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => arg
            .get("description")
            .and_then(Value::as_str)
            .or_else(|| arg.get("type").and_then(Value::as_str))
            .unwrap_or_default()
            .to_string(),
        Some(other) => other.to_string(),
    }
}
