use crate::error::RosterError;
use crate::ipc::error::{err, ok, roster_err, storage_err};
use crate::ipc::helpers::{office_mut, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::roster::{export_roster_csv, parse_roster_csv, roster_file_name};
use chrono::Local;
use serde_json::json;
use std::path::PathBuf;

fn handle_roster_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match (optional_str(req, "outPath"), optional_str(req, "outDir")) {
        (Some(p), _) => PathBuf::from(p),
        (None, Some(dir)) => PathBuf::from(dir).join(roster_file_name(Local::now().date_naive())),
        (None, None) => return err(&req.id, "bad_params", "missing outPath or outDir", None),
    };
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };

    let text = export_roster_csv(office.students.list());
    if let Some(parent) = out_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            return err(&req.id, "io_failed", e.to_string(), None);
        }
    }
    if let Err(e) = std::fs::write(&out_path, text) {
        return err(
            &req.id,
            "io_failed",
            e.to_string(),
            Some(json!({ "path": out_path.to_string_lossy() })),
        );
    }
    ok(
        &req.id,
        json!({
            "path": out_path.to_string_lossy(),
            "rowsExported": office.students.len(),
        }),
    )
}

fn handle_roster_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let in_path = match required_str(req, "inPath") {
        Ok(v) => PathBuf::from(v),
        Err(resp) => return resp,
    };
    let parsed = std::fs::read_to_string(&in_path)
        .map_err(RosterError::from)
        .and_then(|text| parse_roster_csv(&text));
    let import = match parsed {
        Ok(v) => v,
        Err(e) => return roster_err(&req.id, &e),
    };
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };

    let warnings: Vec<serde_json::Value> = import
        .warnings
        .iter()
        .map(|w| json!({ "line": w.line, "message": w.message }))
        .collect();
    let count = import.students.len();
    // The sheet replaces the whole register.
    if let Err(e) = office.students.replace_all(import.students) {
        return storage_err(&req.id, &e);
    }
    tracing::info!(count, warnings = warnings.len(), "roster imported");
    ok(
        &req.id,
        json!({ "rowsImported": count, "warnings": warnings }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.export" => Some(handle_roster_export(state, req)),
        "roster.import" => Some(handle_roster_import(state, req)),
        _ => None,
    }
}
