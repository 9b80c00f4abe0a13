use crate::error::AttendanceError;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{check_len, get_optional_str, get_optional_u32, get_required_str, open_workspace};
use crate::ipc::types::{AppState, Request};
use crate::model::Student;
use crate::service::AttendanceService;
use crate::store::{self, NewStudent, StudentFilter, StudentPatch};
use rusqlite::Connection;
use serde_json::json;
use tracing::info;

const MAX_NAME: usize = 255;
const MAX_STUDENT_ID: usize = 50;
const MAX_CLASS: usize = 50;
const MAX_SECTION: usize = 10;

pub fn student_json(s: &Student) -> serde_json::Value {
    json!({
        "id": s.id,
        "studentId": s.student_id,
        "name": s.name,
        "class": s.class,
        "section": s.section,
        "photo": s.photo,
        "createdAt": s.created_at,
        "updatedAt": s.updated_at
    })
}

fn ensure_number_free(conn: &Connection, student_id: &str) -> Result<(), HandlerErr> {
    if store::student_number_taken(conn, student_id)? {
        let mut e = HandlerErr::from(AttendanceError::Conflict(
            "studentId has already been taken".to_string(),
        ));
        e.details = Some(json!({ "studentId": student_id }));
        return Err(e);
    }
    Ok(())
}

fn students_create(
    conn: &Connection,
    _service: &AttendanceService,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let name = get_required_str(params, "name")?;
    let student_id = get_required_str(params, "studentId")?;
    let class = get_required_str(params, "class")?;
    let section = get_required_str(params, "section")?;
    let photo = get_optional_str(params, "photo")?.filter(|s| !s.is_empty());
    check_len("name", &name, MAX_NAME)?;
    check_len("studentId", &student_id, MAX_STUDENT_ID)?;
    check_len("class", &class, MAX_CLASS)?;
    check_len("section", &section, MAX_SECTION)?;
    ensure_number_free(conn, &student_id)?;

    let student = store::insert_student(
        conn,
        &NewStudent {
            student_id,
            name,
            class,
            section,
            photo,
        },
    )?;
    info!(id = %student.id, student_number = %student.student_id, "student created");
    Ok(json!({ "student": student_json(&student) }))
}

fn students_get(
    conn: &Connection,
    _service: &AttendanceService,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let Some(student) = store::get_student(conn, &id)? else {
        return Err(AttendanceError::NotFound("student").into());
    };
    Ok(json!({ "student": student_json(&student) }))
}

fn optional_field(
    params: &serde_json::Value,
    key: &str,
    max: usize,
) -> Result<Option<String>, HandlerErr> {
    let Some(v) = get_optional_str(params, key)? else {
        return Ok(None);
    };
    if v.is_empty() {
        return Err(HandlerErr::bad_params(format!("{} must not be empty", key)));
    }
    check_len(key, &v, max)?;
    Ok(Some(v))
}

fn students_update(
    conn: &Connection,
    _service: &AttendanceService,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let Some(current) = store::get_student(conn, &id)? else {
        return Err(AttendanceError::NotFound("student").into());
    };
    // The student number is a fixed business key; echoing it back is allowed.
    if let Some(number) = get_optional_str(params, "studentId")? {
        if number != current.student_id {
            return Err(HandlerErr::bad_params("studentId cannot be changed"));
        }
    }
    let mut patch = StudentPatch {
        name: optional_field(params, "name", MAX_NAME)?,
        class: optional_field(params, "class", MAX_CLASS)?,
        section: optional_field(params, "section", MAX_SECTION)?,
        photo: None,
    };
    // Present but null or blank clears the photo reference.
    if params.get("photo").is_some() {
        patch.photo = Some(get_optional_str(params, "photo")?.filter(|s| !s.is_empty()));
    }
    if patch.is_empty() {
        return Err(HandlerErr::bad_params("update must include at least one field"));
    }
    let Some(student) = store::update_student(conn, &id, &patch)? else {
        return Err(AttendanceError::NotFound("student").into());
    };
    info!(id = %student.id, student_number = %student.student_id, "student updated");
    Ok(json!({ "student": student_json(&student) }))
}

fn students_delete(
    conn: &Connection,
    service: &AttendanceService,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    if !service.delete_student(conn, &id)? {
        return Err(AttendanceError::NotFound("student").into());
    }
    info!(id = %id, "student deleted");
    Ok(json!({ "deleted": true }))
}

fn students_list(
    conn: &Connection,
    _service: &AttendanceService,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let filter = StudentFilter {
        search: get_optional_str(params, "search")?,
        class: get_optional_str(params, "class")?,
        section: get_optional_str(params, "section")?,
        page: get_optional_u32(params, "page")?.unwrap_or(1),
        per_page: get_optional_u32(params, "perPage")?.unwrap_or(store::DEFAULT_PER_PAGE),
    };
    let (students, meta) = store::list_students(conn, &filter)?;
    Ok(json!({
        "students": students.iter().map(student_json).collect::<Vec<_>>(),
        "meta": {
            "currentPage": meta.current_page,
            "lastPage": meta.last_page,
            "perPage": meta.per_page,
            "total": meta.total
        }
    }))
}

type Handler =
    fn(&Connection, &AttendanceService, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>;

fn run(state: &mut AppState, req: &Request, f: Handler) -> serde_json::Value {
    let result = open_workspace(state).and_then(|(conn, service)| f(conn, service, &req.params));
    match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.create" => Some(run(state, req, students_create)),
        "students.get" => Some(run(state, req, students_get)),
        "students.update" => Some(run(state, req, students_update)),
        "students.delete" => Some(run(state, req, students_delete)),
        "students.list" => Some(run(state, req, students_list)),
        _ => None,
    }
}
