use serde_json::json;

use crate::error::StoreError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Store failures reach the UI as a generic message; the cause rides along
/// in `details`.
pub fn store_err(id: &str, message: &str, e: &StoreError) -> serde_json::Value {
    err(id, e.code(), message, Some(json!({ "cause": e.to_string() })))
}
