//! SQL access to the `students` and `attendance` tables.
//!
//! Every function takes a `&Connection`; a `rusqlite::Transaction` derefs to
//! one, so the bulk writer passes its transaction handle through unchanged.

use crate::model::{Attendance, AttendanceInput, AttendanceStatus, Student};
use chrono::{NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row, ToSql};
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

pub const DEFAULT_PER_PAGE: u32 = 15;
pub const MAX_PER_PAGE: u32 = 100;

impl ToSql for AttendanceStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AttendanceStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

pub fn now_stamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ---------------------------------------------------------------------------
// Students
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub student_id: String,
    pub name: String,
    pub class: String,
    pub section: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub class: Option<String>,
    pub section: Option<String>,
    /// `Some(None)` clears the photo reference.
    pub photo: Option<Option<String>>,
}

impl StudentPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.class.is_none()
            && self.section.is_none()
            && self.photo.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub search: Option<String>,
    pub class: Option<String>,
    pub section: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u32,
}

impl PageMeta {
    fn new(page: u32, per_page: u32, total: u32) -> Self {
        let per_page = match per_page {
            0 => DEFAULT_PER_PAGE,
            n => n.min(MAX_PER_PAGE),
        };
        let last_page = total.div_ceil(per_page).max(1);
        PageMeta {
            current_page: page.max(1),
            last_page,
            per_page,
            total,
        }
    }

    /// Row offset of the page. Widened so any requested page is representable.
    fn offset(&self) -> i64 {
        (i64::from(self.current_page) - 1) * i64::from(self.per_page)
    }
}

const STUDENT_COLUMNS: &str =
    "id, student_id, name, class, section, photo, created_at, updated_at";

fn student_from_row(r: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(0)?,
        student_id: r.get(1)?,
        name: r.get(2)?,
        class: r.get(3)?,
        section: r.get(4)?,
        photo: r.get(5)?,
        created_at: r.get(6)?,
        updated_at: r.get(7)?,
    })
}

pub fn insert_student(conn: &Connection, new: &NewStudent) -> rusqlite::Result<Student> {
    let id = Uuid::new_v4().to_string();
    let now = now_stamp();
    conn.execute(
        "INSERT INTO students(id, student_id, name, class, section, photo, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &id,
            &new.student_id,
            &new.name,
            &new.class,
            &new.section,
            &new.photo,
            &now,
            &now,
        ),
    )?;
    Ok(Student {
        id,
        student_id: new.student_id.clone(),
        name: new.name.clone(),
        class: new.class.clone(),
        section: new.section.clone(),
        photo: new.photo.clone(),
        created_at: now.clone(),
        updated_at: now,
    })
}

pub fn get_student(conn: &Connection, id: &str) -> rusqlite::Result<Option<Student>> {
    conn.query_row(
        &format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLUMNS),
        [id],
        student_from_row,
    )
    .optional()
}

/// Whether the external student number is already assigned.
pub fn student_number_taken(conn: &Connection, student_id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM students WHERE student_id = ?",
        [student_id],
        |r| r.get::<_, i64>(0),
    )
    .optional()
    .map(|v| v.is_some())
}

pub fn update_student(
    conn: &Connection,
    id: &str,
    patch: &StudentPatch,
) -> rusqlite::Result<Option<Student>> {
    let mut set_parts: Vec<&str> = Vec::new();
    let mut bind_values: Vec<Value> = Vec::new();
    if let Some(v) = &patch.name {
        set_parts.push("name = ?");
        bind_values.push(Value::Text(v.clone()));
    }
    if let Some(v) = &patch.class {
        set_parts.push("class = ?");
        bind_values.push(Value::Text(v.clone()));
    }
    if let Some(v) = &patch.section {
        set_parts.push("section = ?");
        bind_values.push(Value::Text(v.clone()));
    }
    if let Some(v) = &patch.photo {
        set_parts.push("photo = ?");
        bind_values.push(v.clone().map(Value::Text).unwrap_or(Value::Null));
    }
    set_parts.push("updated_at = ?");
    bind_values.push(Value::Text(now_stamp()));
    bind_values.push(Value::Text(id.to_string()));

    let sql = format!("UPDATE students SET {} WHERE id = ?", set_parts.join(", "));
    let changed = conn.execute(&sql, params_from_iter(bind_values))?;
    if changed == 0 {
        return Ok(None);
    }
    get_student(conn, id)
}

/// Deletes the student; attendance rows go with it via `ON DELETE CASCADE`.
pub fn delete_student(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    Ok(conn.execute("DELETE FROM students WHERE id = ?", [id])? > 0)
}

pub fn list_students(
    conn: &Connection,
    filter: &StudentFilter,
) -> rusqlite::Result<(Vec<Student>, PageMeta)> {
    let mut where_parts: Vec<&str> = Vec::new();
    let mut bind_values: Vec<Value> = Vec::new();
    if let Some(term) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        where_parts.push("(name LIKE ? OR student_id LIKE ?)");
        let pattern = format!("%{}%", term);
        bind_values.push(Value::Text(pattern.clone()));
        bind_values.push(Value::Text(pattern));
    }
    if let Some(class) = filter.class.as_deref().filter(|s| !s.is_empty()) {
        where_parts.push("class = ?");
        bind_values.push(Value::Text(class.to_string()));
    }
    if let Some(section) = filter.section.as_deref().filter(|s| !s.is_empty()) {
        where_parts.push("section = ?");
        bind_values.push(Value::Text(section.to_string()));
    }
    let where_sql = if where_parts.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_parts.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM students {}", where_sql),
        params_from_iter(bind_values.iter()),
        |r| r.get(0),
    )?;
    let meta = PageMeta::new(filter.page, filter.per_page, total as u32);

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM students {} ORDER BY name, student_id LIMIT ? OFFSET ?",
        STUDENT_COLUMNS, where_sql
    ))?;
    bind_values.push(Value::Integer(meta.per_page as i64));
    bind_values.push(Value::Integer(meta.offset()));
    let students = stmt
        .query_map(params_from_iter(bind_values), student_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok((students, meta))
}

/// Ids from `ids` that do not name an existing student, in input order.
pub fn missing_student_ids(conn: &Connection, ids: &[String]) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT 1 FROM students WHERE id = ?")?;
    let mut seen: HashSet<&str> = HashSet::new();
    let mut missing = Vec::new();
    for id in ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        if stmt.query_row([id], |r| r.get::<_, i64>(0)).optional()?.is_none() {
            missing.push(id.clone());
        }
    }
    Ok(missing)
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

const ATTENDANCE_COLUMNS: &str =
    "id, student_id, date, status, note, recorded_by, created_at, updated_at";

fn attendance_from_row(r: &Row<'_>) -> rusqlite::Result<Attendance> {
    Ok(Attendance {
        id: r.get(0)?,
        student_id: r.get(1)?,
        date: r.get(2)?,
        status: r.get(3)?,
        note: r.get(4)?,
        recorded_by: r.get(5)?,
        created_at: r.get(6)?,
        updated_at: r.get(7)?,
    })
}

pub fn find_attendance(
    conn: &Connection,
    student_id: &str,
    date: NaiveDate,
) -> rusqlite::Result<Option<Attendance>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM attendance WHERE student_id = ? AND date = ?",
            ATTENDANCE_COLUMNS
        ),
        (student_id, date),
        attendance_from_row,
    )
    .optional()
}

pub fn insert_attendance(
    conn: &Connection,
    input: &AttendanceInput,
    recorded_by: &str,
) -> rusqlite::Result<Attendance> {
    let id = Uuid::new_v4().to_string();
    let now = now_stamp();
    conn.execute(
        "INSERT INTO attendance(id, student_id, date, status, note, recorded_by, created_at, updated_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &id,
            &input.student_id,
            input.date,
            input.status,
            &input.note,
            recorded_by,
            &now,
            &now,
        ),
    )?;
    Ok(Attendance {
        id,
        student_id: input.student_id.clone(),
        date: input.date,
        status: input.status,
        note: input.note.clone(),
        recorded_by: recorded_by.to_string(),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Overwrites status, note and actor of an existing row.
pub fn update_attendance(
    conn: &Connection,
    id: &str,
    status: AttendanceStatus,
    note: Option<&str>,
    recorded_by: &str,
) -> rusqlite::Result<Attendance> {
    conn.execute(
        "UPDATE attendance SET status = ?, note = ?, recorded_by = ?, updated_at = ? WHERE id = ?",
        (status, note, recorded_by, now_stamp(), id),
    )?;
    conn.query_row(
        &format!("SELECT {} FROM attendance WHERE id = ?", ATTENDANCE_COLUMNS),
        [id],
        attendance_from_row,
    )
}

pub fn find_attendance_by_date(
    conn: &Connection,
    date: NaiveDate,
) -> rusqlite::Result<Vec<Attendance>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM attendance WHERE date = ? ORDER BY student_id",
        ATTENDANCE_COLUMNS
    ))?;
    let rows = stmt
        .query_map([date], attendance_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Dates on which the student has an attendance row.
pub fn attendance_dates_for_student(
    conn: &Connection,
    student_id: &str,
) -> rusqlite::Result<BTreeSet<NaiveDate>> {
    let mut stmt = conn.prepare("SELECT date FROM attendance WHERE student_id = ?")?;
    let dates = stmt
        .query_map([student_id], |r| r.get::<_, NaiveDate>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(dates)
}

/// Distinct dates with any attendance row in the month, across all classes.
pub fn count_distinct_attendance_dates(
    conn: &Connection,
    first: NaiveDate,
    last: NaiveDate,
) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COUNT(DISTINCT date) FROM attendance WHERE date BETWEEN ? AND ?",
        (first, last),
        |r| r.get::<_, i64>(0),
    )
    .map(|n| n as u32)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentMonth {
    pub id: String,
    pub name: String,
    pub student_id: String,
    pub statuses: Vec<AttendanceStatus>,
}

/// Students of a class with their statuses inside `[first, last]`, fetched in
/// one query. Students without rows in the range are still returned.
pub fn class_attendance_for_month(
    conn: &Connection,
    class: &str,
    first: NaiveDate,
    last: NaiveDate,
) -> rusqlite::Result<Vec<StudentMonth>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.name, s.student_id, a.status
         FROM students s
         LEFT JOIN attendance a
           ON a.student_id = s.id AND a.date BETWEEN ? AND ?
         WHERE s.class = ?
         ORDER BY s.name, s.id, a.date",
    )?;
    let rows = stmt
        .query_map((first, last, class), |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, Option<AttendanceStatus>>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out: Vec<StudentMonth> = Vec::new();
    for (id, name, student_id, status) in rows {
        let same_student = out.last().map(|s| s.id == id).unwrap_or(false);
        if !same_student {
            out.push(StudentMonth {
                id,
                name,
                student_id,
                statuses: Vec::new(),
            });
        }
        if let (Some(status), Some(current)) = (status, out.last_mut()) {
            current.statuses.push(status);
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub date: Option<NaiveDate>,
    pub class: Option<String>,
    pub section: Option<String>,
    pub status: Option<AttendanceStatus>,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceListRow {
    pub attendance: Attendance,
    pub student_name: String,
    pub student_number: String,
    pub class: String,
    pub section: String,
}

pub fn list_attendance(
    conn: &Connection,
    filter: &AttendanceFilter,
) -> rusqlite::Result<(Vec<AttendanceListRow>, PageMeta)> {
    let mut where_parts: Vec<&str> = Vec::new();
    let mut bind_values: Vec<Value> = Vec::new();
    if let Some(date) = filter.date {
        where_parts.push("a.date = ?");
        bind_values.push(Value::Text(date.to_string()));
    }
    if let Some(class) = filter.class.as_deref().filter(|s| !s.is_empty()) {
        where_parts.push("s.class = ?");
        bind_values.push(Value::Text(class.to_string()));
    }
    if let Some(section) = filter.section.as_deref().filter(|s| !s.is_empty()) {
        where_parts.push("s.section = ?");
        bind_values.push(Value::Text(section.to_string()));
    }
    if let Some(status) = filter.status {
        where_parts.push("a.status = ?");
        bind_values.push(Value::Text(status.as_str().to_string()));
    }
    let where_sql = if where_parts.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", where_parts.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM attendance a JOIN students s ON s.id = a.student_id {}",
            where_sql
        ),
        params_from_iter(bind_values.iter()),
        |r| r.get(0),
    )?;
    let meta = PageMeta::new(filter.page, filter.per_page, total as u32);

    let mut stmt = conn.prepare(&format!(
        "SELECT a.id, a.student_id, a.date, a.status, a.note, a.recorded_by, a.created_at, a.updated_at,
                s.name, s.student_id, s.class, s.section
         FROM attendance a
         JOIN students s ON s.id = a.student_id
         {}
         ORDER BY a.date DESC, s.name
         LIMIT ? OFFSET ?",
        where_sql
    ))?;
    bind_values.push(Value::Integer(meta.per_page as i64));
    bind_values.push(Value::Integer(meta.offset()));
    let rows = stmt
        .query_map(params_from_iter(bind_values), |r| {
            Ok(AttendanceListRow {
                attendance: attendance_from_row(r)?,
                student_name: r.get(8)?,
                student_number: r.get(9)?,
                class: r.get(10)?,
                section: r.get(11)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok((rows, meta))
}

pub fn attendance_for_student(
    conn: &Connection,
    student_id: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> rusqlite::Result<Vec<Attendance>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM attendance
         WHERE student_id = ?
           AND (? IS NULL OR date >= ?)
           AND (? IS NULL OR date <= ?)
         ORDER BY date",
        ATTENDANCE_COLUMNS
    ))?;
    let rows = stmt
        .query_map((student_id, start, start, end, end), attendance_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db;

    pub(crate) fn mem_db() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        db::init_schema(&conn).expect("init schema");
        conn
    }

    pub(crate) fn add_student(conn: &Connection, number: &str, name: &str, class: &str) -> Student {
        insert_student(
            conn,
            &NewStudent {
                student_id: number.to_string(),
                name: name.to_string(),
                class: class.to_string(),
                section: "A".to_string(),
                photo: None,
            },
        )
        .expect("insert student")
    }

    pub(crate) fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date")
    }

    #[test]
    fn unique_pair_rejects_second_insert() {
        let conn = mem_db();
        let s = add_student(&conn, "STU-1", "Ada", "10A");
        let input = AttendanceInput {
            student_id: s.id.clone(),
            date: date("2024-03-01"),
            status: AttendanceStatus::Present,
            note: None,
        };
        insert_attendance(&conn, &input, "u1").expect("first insert");
        assert!(insert_attendance(&conn, &input, "u1").is_err());
    }

    #[test]
    fn delete_student_cascades_attendance() {
        let conn = mem_db();
        let s = add_student(&conn, "STU-1", "Ada", "10A");
        let input = AttendanceInput {
            student_id: s.id.clone(),
            date: date("2024-03-01"),
            status: AttendanceStatus::Late,
            note: Some("bus".to_string()),
        };
        insert_attendance(&conn, &input, "u1").expect("insert");
        assert!(delete_student(&conn, &s.id).expect("delete"));
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM attendance", [], |r| r.get(0))
            .expect("count");
        assert_eq!(n, 0);
    }

    #[test]
    fn class_month_includes_students_without_rows() {
        let conn = mem_db();
        let a = add_student(&conn, "STU-1", "Ada", "10A");
        let _b = add_student(&conn, "STU-2", "Brook", "10A");
        let _other = add_student(&conn, "STU-3", "Cy", "11B");
        for (d, st) in [
            ("2024-03-01", AttendanceStatus::Present),
            ("2024-03-04", AttendanceStatus::Late),
            ("2024-04-01", AttendanceStatus::Absent),
        ] {
            let input = AttendanceInput {
                student_id: a.id.clone(),
                date: date(d),
                status: st,
                note: None,
            };
            insert_attendance(&conn, &input, "u1").expect("insert");
        }
        let rows =
            class_attendance_for_month(&conn, "10A", date("2024-03-01"), date("2024-03-31"))
                .expect("query");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Ada");
        assert_eq!(
            rows[0].statuses,
            vec![AttendanceStatus::Present, AttendanceStatus::Late]
        );
        assert_eq!(rows[1].name, "Brook");
        assert!(rows[1].statuses.is_empty());
    }

    #[test]
    fn list_students_paginates_and_filters() {
        let conn = mem_db();
        for i in 0..20 {
            add_student(&conn, &format!("STU-{:02}", i), &format!("Name {:02}", i), "10A");
        }
        add_student(&conn, "X-1", "Zed", "11B");

        let (page, meta) = list_students(
            &conn,
            &StudentFilter {
                class: Some("10A".to_string()),
                page: 2,
                per_page: 15,
                ..Default::default()
            },
        )
        .expect("list");
        assert_eq!(meta.total, 20);
        assert_eq!(meta.last_page, 2);
        assert_eq!(page.len(), 5);
        assert_eq!(page[0].name, "Name 15");

        let (found, meta) = list_students(
            &conn,
            &StudentFilter {
                search: Some("X-".to_string()),
                page: 1,
                per_page: 15,
                ..Default::default()
            },
        )
        .expect("search");
        assert_eq!(meta.total, 1);
        assert_eq!(found[0].name, "Zed");
    }

    #[test]
    fn missing_ids_are_reported_once() {
        let conn = mem_db();
        let s = add_student(&conn, "STU-1", "Ada", "10A");
        let ids = vec![
            s.id.clone(),
            "nope".to_string(),
            "nope".to_string(),
            "also-nope".to_string(),
        ];
        assert_eq!(
            missing_student_ids(&conn, &ids).expect("check"),
            vec!["nope".to_string(), "also-nope".to_string()]
        );
    }

    fn mark(conn: &Connection, student: &str, d: &str, status: AttendanceStatus) {
        let input = AttendanceInput {
            student_id: student.to_string(),
            date: date(d),
            status,
            note: None,
        };
        insert_attendance(conn, &input, "u1").expect("insert");
    }

    #[test]
    fn list_attendance_joins_students_and_filters() {
        let conn = mem_db();
        let a = add_student(&conn, "STU-1", "Ada", "10A");
        let b = add_student(&conn, "STU-2", "Brook", "11B");
        mark(&conn, &a.id, "2024-03-01", AttendanceStatus::Present);
        mark(&conn, &b.id, "2024-03-01", AttendanceStatus::Absent);
        mark(&conn, &a.id, "2024-03-02", AttendanceStatus::Late);

        let (all, meta) = list_attendance(&conn, &AttendanceFilter::default()).expect("all");
        assert_eq!(meta.total, 3);
        assert_eq!(all[0].attendance.date, date("2024-03-02"));
        assert_eq!(all[1].student_name, "Ada");

        let (absent, _) = list_attendance(
            &conn,
            &AttendanceFilter {
                status: Some(AttendanceStatus::Absent),
                ..Default::default()
            },
        )
        .expect("by status");
        assert_eq!(absent.len(), 1);
        assert_eq!(absent[0].student_number, "STU-2");
        assert_eq!(absent[0].class, "11B");

        let (class_day, _) = list_attendance(
            &conn,
            &AttendanceFilter {
                date: Some(date("2024-03-01")),
                class: Some("10A".to_string()),
                ..Default::default()
            },
        )
        .expect("by class and date");
        assert_eq!(class_day.len(), 1);
        assert_eq!(class_day[0].attendance.status, AttendanceStatus::Present);
    }

    #[test]
    fn student_range_bounds_are_inclusive_and_optional() {
        let conn = mem_db();
        let a = add_student(&conn, "STU-1", "Ada", "10A");
        for d in ["2024-02-28", "2024-03-01", "2024-03-31", "2024-04-01"] {
            mark(&conn, &a.id, d, AttendanceStatus::Present);
        }
        let march =
            attendance_for_student(&conn, &a.id, Some(date("2024-03-01")), Some(date("2024-03-31")))
                .expect("range");
        assert_eq!(march.len(), 2);
        let from_march =
            attendance_for_student(&conn, &a.id, Some(date("2024-03-01")), None).expect("open end");
        assert_eq!(from_march.len(), 3);
        assert_eq!(attendance_for_student(&conn, &a.id, None, None).expect("all").len(), 4);
    }

    #[test]
    fn pages_past_the_end_are_empty_not_an_overflow() {
        let conn = mem_db();
        add_student(&conn, "STU-1", "Ada", "10A");
        let (rows, meta) = list_students(
            &conn,
            &StudentFilter {
                page: 50_000_000,
                per_page: 100,
                ..Default::default()
            },
        )
        .expect("far page");
        assert!(rows.is_empty());
        assert_eq!(meta.total, 1);
        assert_eq!(meta.last_page, 1);

        let (rows, _) = list_attendance(
            &conn,
            &AttendanceFilter {
                page: u32::MAX,
                per_page: u32::MAX,
                ..Default::default()
            },
        )
        .expect("max page");
        assert!(rows.is_empty());
    }

    #[test]
    fn student_dates_are_distinct_and_scoped() {
        let conn = mem_db();
        let a = add_student(&conn, "STU-1", "Ada", "10A");
        let b = add_student(&conn, "STU-2", "Brook", "10A");
        mark(&conn, &a.id, "2024-03-02", AttendanceStatus::Present);
        mark(&conn, &a.id, "2024-03-01", AttendanceStatus::Late);
        mark(&conn, &b.id, "2024-03-05", AttendanceStatus::Absent);
        let dates = attendance_dates_for_student(&conn, &a.id).expect("dates");
        assert_eq!(
            dates.into_iter().collect::<Vec<_>>(),
            vec![date("2024-03-01"), date("2024-03-02")]
        );
        assert!(attendance_dates_for_student(&conn, "nobody").expect("none").is_empty());
    }
}
