use crate::error::{ImportError, RosterError, StorageError};
use serde_json::json;

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

pub fn storage_err(id: &str, e: &StorageError) -> serde_json::Value {
    let code = match e {
        StorageError::QuotaExceeded { .. } => "quota_exceeded",
        StorageError::Decode { .. } | StorageError::Encode { .. } => "storage_corrupt",
        StorageError::Read { .. } | StorageError::Write { .. } => "storage_failed",
    };
    err(id, code, e.to_string(), Some(json!({ "key": e.key() })))
}

pub fn import_err(id: &str, e: &ImportError) -> serde_json::Value {
    match e {
        ImportError::Io(_) => err(id, "io_failed", e.to_string(), None),
        ImportError::MissingField(field) | ImportError::Malformed { field, .. } => err(
            id,
            "invalid_snapshot",
            e.to_string(),
            Some(json!({ "field": field })),
        ),
        ImportError::Parse(_) => err(id, "invalid_snapshot", e.to_string(), None),
    }
}

pub fn roster_err(id: &str, e: &RosterError) -> serde_json::Value {
    match e {
        RosterError::Io(_) => err(id, "io_failed", e.to_string(), None),
        RosterError::MissingHeader(_) | RosterError::NoRows => {
            err(id, "invalid_roster", e.to_string(), None)
        }
    }
}
