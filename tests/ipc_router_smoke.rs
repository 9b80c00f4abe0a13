mod test_support;

use serde_json::json;
use test_support::{request, send_line, spawn_sidecar, temp_dir};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("attendanced-router-smoke");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["ok"].as_bool(), Some(true));
    assert!(health["result"]["workspacePath"].is_null());

    let bad = send_line(&mut stdin, &mut reader, "{not json");
    assert_eq!(bad["error"]["code"].as_str(), Some("bad_json"));

    let unknown = request(&mut stdin, &mut reader, "2", "grades.list", json!({}));
    assert_eq!(unknown["error"]["code"].as_str(), Some("not_implemented"));

    let _ = request(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let methods = [
        ("students.list", json!({})),
        ("attendance.today", json!({})),
        ("attendance.statistics", json!({ "date": "2024-03-04" })),
        ("attendance.list", json!({})),
        ("attendance.monthlyReport", json!({ "month": 3, "year": 2024, "class": "10" })),
        ("reports.monthlyText", json!({ "month": 3, "year": 2024, "class": "10" })),
        ("cache.keys", json!({})),
    ];
    for (i, (method, params)) in methods.into_iter().enumerate() {
        let resp = request(&mut stdin, &mut reader, &format!("m{}", i), method, params);
        assert_eq!(resp["ok"].as_bool(), Some(true), "{} failed: {}", method, resp);
    }
}
