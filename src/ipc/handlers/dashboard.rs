use crate::dashboard::{ReportFilter, TestFilter};
use crate::ipc::error::{err, ok, storage_err};
use crate::ipc::helpers::{
    new_record_param, office_mut, optional_str, raw_str, record_param, required_str,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{Group, Record, Report, ReportKind, Test, TestKind};
use crate::office::Office;
use crate::store::Collection;
use serde::de::DeserializeOwned;
use serde_json::json;

type Pick<T> = fn(&mut Office) -> &mut Collection<T>;

fn groups(o: &mut Office) -> &mut Collection<Group> {
    &mut o.dashboard.groups
}

fn tests(o: &mut Office) -> &mut Collection<Test> {
    &mut o.dashboard.tests
}

fn reports(o: &mut Office) -> &mut Collection<Report> {
    &mut o.dashboard.reports
}

fn kind_param<K: DeserializeOwned>(req: &Request) -> Result<Option<K>, serde_json::Value> {
    match optional_str(req, "type") {
        None => Ok(None),
        Some(label) => serde_json::from_value(json!(label))
            .map(Some)
            .map_err(|_| err(&req.id, "bad_params", format!("unknown type: {label}"), None)),
    }
}

fn handle_create<T: Record>(
    state: &mut AppState,
    req: &Request,
    key: &str,
    pick: Pick<T>,
) -> serde_json::Value {
    let item = match new_record_param::<T>(req, key) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    if let Err(e) = pick(office).add(item.clone()) {
        return storage_err(&req.id, &e);
    }
    ok(&req.id, json!({ key: item }))
}

fn handle_update<T: Record>(
    state: &mut AppState,
    req: &Request,
    key: &str,
    pick: Pick<T>,
) -> serde_json::Value {
    let item = match record_param::<T>(req, key) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    match pick(office).update(item) {
        Ok(updated) => ok(&req.id, json!({ "updated": updated })),
        Err(e) => storage_err(&req.id, &e),
    }
}

fn handle_delete<T: Record>(
    state: &mut AppState,
    req: &Request,
    pick: Pick<T>,
) -> serde_json::Value {
    let id = match required_str(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    match pick(office).delete(id) {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => storage_err(&req.id, &e),
    }
}

fn handle_groups_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    ok(&req.id, json!({ "groups": office.dashboard.groups.list() }))
}

fn handle_tests_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match kind_param::<TestKind>(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let filter = TestFilter {
        kind,
        search: raw_str(req, "search").map(str::to_string),
    };
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    let rows: Vec<&Test> = office
        .dashboard
        .tests
        .list()
        .iter()
        .filter(|t| filter.matches(t))
        .collect();
    ok(&req.id, json!({ "tests": rows }))
}

fn handle_reports_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match kind_param::<ReportKind>(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let filter = ReportFilter {
        kind,
        search: raw_str(req, "search").map(str::to_string),
    };
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    let rows: Vec<&Report> = office
        .dashboard
        .reports
        .list()
        .iter()
        .filter(|r| filter.matches(r))
        .collect();
    ok(&req.id, json!({ "reports": rows }))
}

fn handle_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    ok(&req.id, json!(office.dashboard.stats(office.students.len())))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let resp = match req.method.as_str() {
        "groups.list" => handle_groups_list(state, req),
        "groups.create" => handle_create(state, req, "group", groups),
        "groups.update" => handle_update(state, req, "group", groups),
        "groups.delete" => handle_delete(state, req, groups),
        "tests.list" => handle_tests_list(state, req),
        "tests.create" => handle_create(state, req, "test", tests),
        "tests.update" => handle_update(state, req, "test", tests),
        "tests.delete" => handle_delete(state, req, tests),
        "reports.list" => handle_reports_list(state, req),
        "reports.create" => handle_create(state, req, "report", reports),
        "reports.update" => handle_update(state, req, "report", reports),
        "reports.delete" => handle_delete(state, req, reports),
        "dashboard.stats" => handle_stats(state, req),
        _ => return None,
    };
    Some(resp)
}
