//! Result Envelope.
//!
//! Every catalog operation answers with a JSON object carrying a `success`
//! flag. Successful results place their payload under a named key; failures
//! carry a human readable `message`.

use blokgate_core::Result;
use rmcp::model::CallToolResult;
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Success envelope with `payload` under `key`.
pub fn success<T: Serialize>(key: &str, payload: &T) -> Value {
    match serde_json::to_value(payload) {
        Ok(value) => {
            let mut map = Map::new();
            map.insert("success".to_string(), Value::Bool(true));
            map.insert(key.to_string(), value);
            Value::Object(map)
        }
        Err(e) => failure(format!("Serialization error: {e}")),
    }
}

/// Success envelope carrying only a confirmation message.
pub fn confirmation(message: impl Into<String>) -> Value {
    json!({ "success": true, "message": message.into() })
}

/// Failure envelope.
pub fn failure(message: impl Into<String>) -> Value {
    json!({ "success": false, "message": message.into() })
}

/// Fold a client outcome into an envelope.
pub fn from_result<T: Serialize>(key: &str, result: Result<T>) -> Value {
    match result {
        Ok(payload) => success(key, &payload),
        Err(err) => {
            tracing::debug!(error = %err, kind = ?err.kind(), "operation failed");
            failure(err.to_string())
        }
    }
}

/// Whether an envelope reports success.
pub fn is_success(envelope: &Value) -> bool {
    envelope.get("success").and_then(Value::as_bool) == Some(true)
}

/// Wrap an envelope as an MCP tool result. Failures set `isError`.
pub fn into_call_result(envelope: Value) -> CallToolResult {
    if is_success(&envelope) {
        CallToolResult::structured(envelope)
    } else {
        CallToolResult::structured_error(envelope)
    }
}
