use crate::ipc::error::{err, ok, storage_err};
use crate::ipc::helpers::{office_mut, optional_str, raw_str, record_param, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::Student;
use crate::students::StudentFilter;
use crate::validation::{normalize_birth_date, normalize_id_input, validate_id};
use serde_json::json;

/// Check the identifier and bring the birth date into stored form.
fn prepare(req: &Request, mut student: Student) -> Result<Student, serde_json::Value> {
    if let Err(e) = validate_id(&student.id) {
        return Err(err(
            &req.id,
            "invalid_id",
            e.to_string(),
            Some(json!({ "value": e.value })),
        ));
    }
    student.birth_date = normalize_birth_date(&student.birth_date);
    Ok(student)
}

fn handle_validate_id(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let raw = req
        .params
        .get("value")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let normalized = normalize_id_input(raw);
    let error = validate_id(&normalized).err().map(|e| e.to_string());
    ok(
        &req.id,
        json!({
            "normalized": normalized,
            "valid": error.is_none(),
            "error": error,
        }),
    )
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    let filter = StudentFilter {
        search: raw_str(req, "search").map(str::to_string),
        level: optional_str(req, "level").map(str::to_string),
        group: optional_str(req, "group").map(str::to_string),
    };
    let rows = office.students.filtered(&filter);
    ok(
        &req.id,
        json!({ "students": rows, "total": office.students.len() }),
    )
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match required_str(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    ok(&req.id, json!({ "student": office.students.get_by_id(id) }))
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match record_param::<Student>(req, "student").and_then(|s| prepare(req, s)) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    if let Err(e) = office.students.add(student.clone()) {
        return storage_err(&req.id, &e);
    }
    ok(&req.id, json!({ "student": student }))
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match record_param::<Student>(req, "student").and_then(|s| prepare(req, s)) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    match office.students.update(student) {
        Ok(updated) => ok(&req.id, json!({ "updated": updated })),
        Err(e) => storage_err(&req.id, &e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = match required_str(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    match office.students.delete(id) {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => storage_err(&req.id, &e),
    }
}

fn handle_students_replace_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    let students = match record_param::<Vec<Student>>(req, "students") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let office = match office_mut(state, req) {
        Ok(o) => o,
        Err(resp) => return resp,
    };
    let count = students.len();
    match office.students.replace_all(students) {
        Ok(()) => ok(&req.id, json!({ "count": count })),
        Err(e) => storage_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "validation.studentId" => Some(handle_validate_id(state, req)),
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        "students.replaceAll" => Some(handle_students_replace_all(state, req)),
        _ => None,
    }
}
