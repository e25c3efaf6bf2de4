use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::office::Office;
use serde::de::DeserializeOwned;
use uuid::Uuid;

pub fn office_mut<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<&'a mut Office, serde_json::Value> {
    state
        .office
        .as_mut()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn required_str<'a>(req: &'a Request, key: &str) -> Result<&'a str, serde_json::Value> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim()),
        _ => Err(err(&req.id, "bad_params", format!("missing {key}"), None)),
    }
}

pub fn optional_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// A free-text param exactly as sent, spaces included.
pub fn raw_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

/// Decode `params.<key>` into a record.
pub fn record_param<T: DeserializeOwned>(req: &Request, key: &str) -> Result<T, serde_json::Value> {
    let Some(raw) = req.params.get(key) else {
        return Err(err(&req.id, "bad_params", format!("missing {key}"), None));
    };
    T::deserialize(raw).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("invalid {key}: {e}"),
            None,
        )
    })
}

/// Like [`record_param`], but fills an absent or empty `id` with a fresh UUID.
pub fn new_record_param<T: DeserializeOwned>(
    req: &Request,
    key: &str,
) -> Result<T, serde_json::Value> {
    let Some(serde_json::Value::Object(map)) = req.params.get(key) else {
        return Err(err(
            &req.id,
            "bad_params",
            format!("missing {key} object"),
            None,
        ));
    };
    let mut map = map.clone();
    let has_id = map
        .get("id")
        .and_then(|v| v.as_str())
        .is_some_and(|s| !s.trim().is_empty());
    if !has_id {
        map.insert("id".into(), Uuid::new_v4().to_string().into());
    }
    serde_json::from_value(serde_json::Value::Object(map)).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("invalid {key}: {e}"),
            None,
        )
    })
}
