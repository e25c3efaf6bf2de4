use crate::config;
use crate::ipc::error::{err, ok, storage_err};
use crate::ipc::types::{AppState, Request};
use crate::office::Office;
use crate::storage::SqliteStorage;
use serde_json::json;
use std::path::PathBuf;
use std::rc::Rc;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    state.close();

    let storage = match SqliteStorage::open(&path) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_open_failed", format!("{e:?}"), None),
    };

    // A broken config file must not keep the workspace closed.
    let cfg = match config::load_workspace_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring workspace config");
            config::Config::default()
        }
    };

    match Office::open(Rc::new(storage), cfg) {
        Ok(office) => {
            let stats = office.dashboard.stats(office.students.len());
            tracing::info!(workspace = %path.display(), "workspace opened");
            state.workspace = Some(path.clone());
            state.office = Some(office);
            ok(
                &req.id,
                json!({ "workspacePath": path.to_string_lossy(), "stats": stats }),
            )
        }
        Err(e) => storage_err(&req.id, &e),
    }
}

fn handle_workspace_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    let was_open = state.office.is_some();
    state.close();
    ok(&req.id, json!({ "closed": was_open }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "workspace.close" => Some(handle_workspace_close(state, req)),
        _ => None,
    }
}
