mod test_support;

use serde_json::json;
use test_support::{create_student, request_err, request_ok, spawn_sidecar, temp_dir};

fn record(
    stdin: &mut std::process::ChildStdin,
    reader: &mut std::io::BufReader<std::process::ChildStdout>,
    id: &str,
    date: &str,
    entries: serde_json::Value,
) {
    let _ = request_ok(
        stdin,
        reader,
        id,
        "attendance.recordBulk",
        json!({ "date": date, "actor": { "id": "t" }, "attendances": entries }),
    );
}

#[test]
fn monthly_report_uses_school_days_across_all_classes() {
    let workspace = temp_dir("attendanced-monthly");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let ben = create_student(&mut stdin, &mut reader, "2", "S-002", "Ben", "10");
    let ada = create_student(&mut stdin, &mut reader, "3", "S-001", "Ada", "10");
    let cy = create_student(&mut stdin, &mut reader, "4", "S-003", "Cy", "11");

    record(
        &mut stdin,
        &mut reader,
        "5",
        "2024-03-04",
        json!([{ "studentId": ada, "status": "Present" }, { "studentId": ben, "status": "Absent" }]),
    );
    record(
        &mut stdin,
        &mut reader,
        "6",
        "2024-03-05",
        json!([{ "studentId": ada, "status": "Late" }, { "studentId": ben, "status": "Present" }]),
    );
    // Other class, but still a school day for the month.
    record(&mut stdin, &mut reader, "7", "2024-03-06", json!([{ "studentId": cy, "status": "Present" }]));
    // Outside the month.
    record(&mut stdin, &mut reader, "8", "2024-02-29", json!([{ "studentId": ada, "status": "Present" }]));

    let report = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "attendance.monthlyReport",
        json!({ "month": 3, "year": 2024, "class": "10" }),
    );
    assert_eq!(report["month"].as_u64(), Some(3));
    assert_eq!(report["class"].as_str(), Some("10"));
    let students = report["students"].as_array().expect("students");
    assert_eq!(students.len(), 2);
    assert_eq!(students[0]["name"].as_str(), Some("Ada"));
    assert_eq!(students[0]["total_days"].as_u64(), Some(3));
    assert_eq!(students[0]["present"].as_u64(), Some(1));
    assert_eq!(students[0]["late"].as_u64(), Some(1));
    assert_eq!(students[0]["percentage"].as_f64(), Some(33.33));
    assert_eq!(students[1]["name"].as_str(), Some("Ben"));
    assert_eq!(students[1]["absent"].as_u64(), Some(1));

    let summary = &report["summary"];
    assert_eq!(summary["total_students"].as_u64(), Some(2));
    assert_eq!(summary["average_percentage"].as_f64(), Some(33.33));
    assert_eq!(summary["total_present"].as_u64(), Some(2));
    assert_eq!(summary["total_absent"].as_u64(), Some(1));
    assert_eq!(summary["total_late"].as_u64(), Some(1));
}

#[test]
fn monthly_report_without_records_falls_back_to_weekdays() {
    let workspace = temp_dir("attendanced-monthly-empty");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = create_student(&mut stdin, &mut reader, "2", "S-001", "Ada", "10");

    let report = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.monthlyReport",
        json!({ "month": 4, "year": 2024, "class": "10" }),
    );
    assert_eq!(report["students"][0]["total_days"].as_u64(), Some(22));
    assert_eq!(report["students"][0]["percentage"].as_f64(), Some(0.0));
    assert_eq!(report["summary"]["average_percentage"].as_f64(), Some(0.0));

    let nobody = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.monthlyReport",
        json!({ "month": 4, "year": 2024, "class": "12" }),
    );
    assert_eq!(nobody["students"], json!([]));
    assert_eq!(nobody["summary"]["total_students"].as_u64(), Some(0));
    assert_eq!(nobody["summary"]["average_percentage"].as_f64(), Some(0.0));
}

#[test]
fn monthly_report_validates_month_year_and_class() {
    let workspace = temp_dir("attendanced-monthly-invalid");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    for (i, params) in [
        json!({ "month": 13, "year": 2024, "class": "10" }),
        json!({ "month": 0, "year": 2024, "class": "10" }),
        json!({ "month": 3, "year": 1999, "class": "10" }),
        json!({ "month": 3, "year": 2024 }),
        json!({ "month": 3, "year": 2024, "class": "x".repeat(51) }),
    ]
    .into_iter()
    .enumerate()
    {
        let e = request_err(
            &mut stdin,
            &mut reader,
            &format!("v{}", i),
            "attendance.monthlyReport",
            params,
        );
        assert_eq!(e["code"].as_str(), Some("bad_params"));
    }
}
