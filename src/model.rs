use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Late => "Late",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Present" => Ok(AttendanceStatus::Present),
            "Absent" => Ok(AttendanceStatus::Absent),
            "Late" => Ok(AttendanceStatus::Late),
            other => Err(format!(
                "status must be one of Present, Absent, Late (got {:?})",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub student_id: String,
    pub name: String,
    pub class: String,
    pub section: String,
    pub photo: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: String,
    pub student_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub note: Option<String>,
    pub recorded_by: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One entry of a bulk recording call.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceInput {
    pub student_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub note: Option<String>,
}

/// Staff member performing a write. Identity is supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentMonthRow {
    pub id: String,
    pub name: String,
    pub student_id: String,
    pub total_days: u32,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_students: u32,
    pub average_percentage: f64,
    pub total_present: u32,
    pub total_absent: u32,
    pub total_late: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub month: u32,
    pub year: i32,
    pub class: String,
    pub students: Vec<StudentMonthRow>,
    pub summary: ReportSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayStatistics {
    pub date: NaiveDate,
    pub total: u32,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub percentage: f64,
}
