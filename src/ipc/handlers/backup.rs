use crate::error::ImportError;
use crate::ipc::error::{err, import_err, ok, storage_err};
use crate::ipc::helpers::{office_mut, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::office::RestoreError;
use crate::snapshot::{format_export_date, Snapshot};
use chrono::{Local, Utc};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Instant;

fn handle_backup_snapshot(state: &mut AppState, req: &Request) -> serde_json::Value {
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    ok(&req.id, json!(office.snapshot(Utc::now())))
}

fn handle_backup_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_dir = match required_str(req, "outDir") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };

    let snapshot = office.snapshot(Utc::now());
    let prefix = office.config().backup_prefix.clone();
    match snapshot.export_to_dir(&out_dir, &prefix, Local::now().date_naive()) {
        Ok(summary) => {
            tracing::info!(path = %summary.path.display(), "backup exported");
            ok(
                &req.id,
                json!({
                    "path": summary.path.to_string_lossy(),
                    "exportDate": snapshot.export_date,
                    "counts": {
                        "students": summary.students,
                        "groups": summary.groups,
                        "tests": summary.tests,
                        "reports": summary.reports,
                    }
                }),
            )
        }
        Err(e) => err(
            &req.id,
            "io_failed",
            format!("{e:#}"),
            Some(json!({ "outDir": out_dir.to_string_lossy() })),
        ),
    }
}

fn handle_backup_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    enum Source {
        File(Result<Snapshot, ImportError>),
        Text(String),
    }

    let source = match (optional_str(req, "inPath"), req.params.get("document")) {
        (Some(in_path), _) => Source::File(Snapshot::read_from_file(Path::new(in_path))),
        (None, Some(serde_json::Value::String(s))) => Source::Text(s.clone()),
        (None, Some(doc @ serde_json::Value::Object(_))) => Source::Text(doc.to_string()),
        (None, _) => return err(&req.id, "bad_params", "missing inPath or document", None),
    };

    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    let result = match source {
        Source::File(parsed) => parsed
            .map_err(RestoreError::from)
            .and_then(|snapshot| office.restore(snapshot).map_err(RestoreError::from)),
        Source::Text(text) => office.import_document(&text),
    };
    match result {
        Ok(applied) => {
            tracing::info!(?applied, "snapshot imported");
            ok(&req.id, json!({ "applied": applied }))
        }
        Err(RestoreError::Import(e)) => {
            tracing::warn!(error = %e, "snapshot rejected");
            import_err(&req.id, &e)
        }
        Err(RestoreError::Storage(e)) => storage_err(&req.id, &e),
    }
}

fn handle_autosave_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    let autosave = office.autosave();
    ok(
        &req.id,
        json!({
            "intervalMinutes": autosave.interval().as_secs() / 60,
            "lastSavedAt": autosave.last_saved_at().map(format_export_date),
            "secondsUntilDue": autosave.time_until_due(Instant::now()).as_secs(),
        }),
    )
}

fn handle_autosave_run(state: &mut AppState, req: &Request) -> serde_json::Value {
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    match office.run_autosave(Instant::now()) {
        Ok(at) => ok(&req.id, json!({ "savedAt": format_export_date(at) })),
        Err(e) => storage_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.snapshot" => Some(handle_backup_snapshot(state, req)),
        "backup.export" => Some(handle_backup_export(state, req)),
        "backup.import" => Some(handle_backup_import(state, req)),
        "autosave.status" => Some(handle_autosave_status(state, req)),
        "autosave.run" => Some(handle_autosave_run(state, req)),
        _ => None,
    }
}
