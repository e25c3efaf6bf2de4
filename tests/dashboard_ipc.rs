mod test_support;

use serde_json::json;
use test_support::{
    empty_workspace, request_err, request_ok, select_workspace, spawn_sidecar, temp_dir,
};

#[test]
fn fresh_workspace_is_seeded_with_sample_records() {
    let workspace = temp_dir("orientd-dashboard-seed");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let selected = select_workspace(&mut stdin, &mut reader, &workspace);
    assert_eq!(
        selected["stats"],
        json!({
            "studentCount": 2,
            "groupCount": 2,
            "completedTests": 2,
            "completedReports": 1
        })
    );

    let groups = request_ok(&mut stdin, &mut reader, "1", "groups.list", json!({}));
    assert_eq!(groups["groups"][0]["schedule"][0]["day"], "الأحد");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn aggregate_crud_assigns_ids_and_drives_stats() {
    let workspace = empty_workspace("orientd-dashboard-crud");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let t1 = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "tests.create",
        json!({ "test": {
            "title": "اختبار الذكاء",
            "type": "فردي",
            "duration": 45,
            "targetLevel": "س1 متوسط",
            "questionCount": 30,
            "completed": true
        } }),
    );
    let t1_id = t1["test"]["id"].as_str().expect("generated id").to_string();
    assert_eq!(t1_id.len(), 36);

    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "tests.create",
        json!({ "test": {
            "id": "",
            "title": "استبيان",
            "type": "جماعي",
            "duration": 60,
            "targetLevel": "س4 متوسط",
            "description": "الميول المهنية",
            "questionCount": 40
        } }),
    );

    let individual = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "tests.list",
        json!({ "type": "فردي" }),
    );
    assert_eq!(individual["tests"].as_array().map(Vec::len), Some(1));
    assert_eq!(individual["tests"][0]["id"], t1_id.as_str());

    let by_description = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "tests.list",
        json!({ "search": "الميول" }),
    );
    assert_eq!(by_description["tests"][0]["title"], "استبيان");

    let e = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "tests.list",
        json!({ "type": "bogus" }),
    );
    assert_eq!(e["code"], "bad_params");

    let group = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "groups.create",
        json!({ "group": {
            "name": "الفوج3",
            "level": "س3 متوسط",
            "studentCount": 27,
            "schedule": [{ "day": "الأربعاء", "time": "08:00 - 10:00" }]
        } }),
    );
    let group_id = group["group"]["id"].as_str().expect("group id").to_string();

    let report = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "reports.create",
        json!({ "report": {
            "title": "تقرير توجيهي",
            "type": "توجيهي",
            "coverage": 120,
            "objectives": ["متابعة"],
            "notes": "ملاحظة",
            "createdAt": "2024-03-01",
            "status": "مكتمل"
        } }),
    );
    let mut report = report["report"].clone();
    assert_eq!(report["coverage"], 120.0, "coverage is stored as given");

    let stats = request_ok(&mut stdin, &mut reader, "8", "dashboard.stats", json!({}));
    assert_eq!(
        stats,
        json!({
            "studentCount": 0,
            "groupCount": 1,
            "completedTests": 1,
            "completedReports": 1
        })
    );

    report["status"] = json!("مسودة");
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "reports.update",
        json!({ "report": report }),
    );
    assert_eq!(updated["updated"], true);

    let found = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "reports.list",
        json!({ "type": "توجيهي", "search": "ملاحظة" }),
    );
    assert_eq!(found["reports"].as_array().map(Vec::len), Some(1));

    let removed = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "groups.delete",
        json!({ "id": group_id }),
    );
    assert_eq!(removed["removed"], 1);

    let stats = request_ok(&mut stdin, &mut reader, "12", "dashboard.stats", json!({}));
    assert_eq!(stats["groupCount"], 0);
    assert_eq!(stats["completedReports"], 0);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
