use crate::autosave::{is_interval_choice, INTERVAL_CHOICES_MINUTES};
use crate::config;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::office_mut;
use crate::ipc::types::{AppState, Request};
use crate::model::{GROUP_NAMES, LEVELS};
use crate::store::PersistPolicy;
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;

fn settings_json(cfg: &config::Config) -> serde_json::Value {
    json!({
        "config": cfg,
        "autosaveIntervalChoices": INTERVAL_CHOICES_MINUTES,
        "levels": LEVELS,
        "groups": GROUP_NAMES,
    })
}

fn handle_settings_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    ok(&req.id, settings_json(office.config()))
}

fn handle_settings_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let interval = match req.params.get("autosaveIntervalMinutes") {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => match v.as_u64() {
            Some(m) if is_interval_choice(m) => Some(m),
            _ => {
                return err(
                    &req.id,
                    "bad_params",
                    format!(
                        "autosaveIntervalMinutes must be one of {:?}",
                        INTERVAL_CHOICES_MINUTES
                    ),
                    Some(json!({ "value": v })),
                )
            }
        },
    };
    let policy = match req.params.get("persistPolicy") {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => match PersistPolicy::deserialize(v) {
            Ok(p) => Some(p),
            Err(_) => {
                return err(
                    &req.id,
                    "bad_params",
                    "persistPolicy must be logAndContinue or propagate",
                    None,
                )
            }
        },
    };

    let workspace = state.workspace.clone();
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    if let Some(minutes) = interval {
        office.set_autosave_interval(minutes, Instant::now());
    }
    if let Some(policy) = policy {
        office.set_persist_policy(policy);
    }

    if let Some(ws) = workspace {
        if let Err(e) = config::save_workspace_config(&ws, office.config()) {
            return err(&req.id, "io_failed", format!("{e:#}"), None);
        }
    }
    tracing::info!(?interval, ?policy, "settings updated");
    ok(&req.id, settings_json(office.config()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(handle_settings_get(state, req)),
        "settings.update" => Some(handle_settings_update(state, req)),
        _ => None,
    }
}
