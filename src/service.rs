use crate::cache::{day_stats_key, StatsCache};
use crate::error::{AttendanceError, CacheError};
use crate::events::{
    invalidate_statistics, AttendanceRecorded, AuditLogger, CacheInvalidator,
    InvalidationStrategy, Notifier,
};
use crate::model::{
    Actor, Attendance, AttendanceInput, DayStatistics, MonthlyReport, ReportSummary,
    StudentMonthRow,
};
use crate::stats::{self, StatusCounts};
use crate::store;
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_STATS_TTL: Duration = Duration::from_secs(3600);

/// Attendance aggregation over a workspace database: bulk recording,
/// monthly reports, and cached per-day statistics.
pub struct AttendanceService {
    cache: Arc<dyn StatsCache>,
    notifier: Notifier,
    stats_ttl: Duration,
    invalidation: InvalidationStrategy,
}

impl AttendanceService {
    pub fn new(
        cache: Arc<dyn StatsCache>,
        notifier: Notifier,
        stats_ttl: Duration,
        invalidation: InvalidationStrategy,
    ) -> Self {
        Self {
            cache,
            notifier,
            stats_ttl,
            invalidation,
        }
    }

    /// Service wired with the cache invalidator followed by the audit logger.
    pub fn with_default_subscribers(
        cache: Arc<dyn StatsCache>,
        strategy: InvalidationStrategy,
        stats_ttl: Duration,
        audit_path: Option<PathBuf>,
    ) -> Self {
        let mut notifier = Notifier::new();
        notifier.subscribe(Box::new(CacheInvalidator::new(cache.clone(), strategy)));
        notifier.subscribe(Box::new(AuditLogger::new(audit_path)));
        Self::new(cache, notifier, stats_ttl, strategy)
    }

    pub fn cache(&self) -> &Arc<dyn StatsCache> {
        &self.cache
    }

    /// Records a batch in one transaction. Existing (student, date) rows are
    /// overwritten in place; nothing is written if any record fails.
    pub fn record_bulk_attendance(
        &self,
        conn: &Connection,
        records: &[AttendanceInput],
        actor: &Actor,
    ) -> Result<Vec<Attendance>, AttendanceError> {
        if records.is_empty() {
            return Err(AttendanceError::Validation(
                "attendance batch must not be empty".to_string(),
            ));
        }

        let written = match write_batch(conn, records, &actor.id) {
            Ok(rows) => rows,
            Err(e) => {
                error!(
                    actor_id = %actor.id,
                    records = records.len(),
                    error = %e,
                    "bulk attendance recording failed"
                );
                return Err(e.into());
            }
        };

        info!(
            actor_id = %actor.id,
            records = written.len(),
            "bulk attendance recorded"
        );
        self.notifier
            .publish(&AttendanceRecorded::new(written.clone(), actor.clone()));
        Ok(written)
    }

    /// Deletes a student together with its attendance rows, then evicts the
    /// cached statistics of every date those rows covered.
    pub fn delete_student(&self, conn: &Connection, id: &str) -> Result<bool, AttendanceError> {
        let dates = store::attendance_dates_for_student(conn, id)?;
        if !store::delete_student(conn, id)? {
            return Ok(false);
        }
        if !dates.is_empty() {
            match invalidate_statistics(self.cache.as_ref(), self.invalidation, &dates) {
                Ok(keys) => debug!(student = id, keys, "statistics evicted after student delete"),
                Err(e) => warn!(
                    student = id,
                    error = %format!("{e:#}"),
                    "statistics eviction after student delete failed"
                ),
            }
        }
        Ok(true)
    }

    pub fn generate_monthly_report(
        &self,
        conn: &Connection,
        month: u32,
        year: i32,
        class: &str,
    ) -> Result<MonthlyReport, AttendanceError> {
        let Some((first, last)) = stats::month_bounds(year, month) else {
            return Err(AttendanceError::Validation(
                "month must be between 1 and 12".to_string(),
            ));
        };

        let students = store::class_attendance_for_month(conn, class, first, last)?;
        let mut total_days = store::count_distinct_attendance_dates(conn, first, last)?;
        if total_days == 0 {
            total_days = stats::weekdays_in_month(year, month);
        }

        let mut rows: Vec<StudentMonthRow> = Vec::with_capacity(students.len());
        let mut totals = StatusCounts::default();
        for s in students {
            let counts = StatusCounts::tally(s.statuses.iter().copied());
            totals.present += counts.present;
            totals.absent += counts.absent;
            totals.late += counts.late;
            rows.push(StudentMonthRow {
                id: s.id,
                name: s.name,
                student_id: s.student_id,
                total_days,
                present: counts.present,
                absent: counts.absent,
                late: counts.late,
                percentage: stats::percentage(counts.present, total_days),
            });
        }

        let percentages: Vec<f64> = rows.iter().map(|r| r.percentage).collect();
        let summary = ReportSummary {
            total_students: rows.len() as u32,
            average_percentage: stats::mean_percentage(&percentages),
            total_present: totals.present,
            total_absent: totals.absent,
            total_late: totals.late,
        };
        debug!(class, month, year, total_days, students = rows.len(), "monthly report built");

        Ok(MonthlyReport {
            month,
            year,
            class: class.to_string(),
            students: rows,
            summary,
        })
    }

    pub fn today_statistics(&self, conn: &Connection) -> Result<DayStatistics, AttendanceError> {
        self.statistics_for_date(conn, Local::now().date_naive())
    }

    /// Cache-aside read of one day's statistics. Cache failures are logged
    /// and the value is computed from the database instead.
    pub fn statistics_for_date(
        &self,
        conn: &Connection,
        date: NaiveDate,
    ) -> Result<DayStatistics, AttendanceError> {
        let key = day_stats_key(date);

        match self.cached_statistics(&key) {
            Ok(Some(hit)) => {
                debug!(%key, "statistics cache hit");
                return Ok(hit);
            }
            Ok(None) => debug!(%key, "statistics cache miss"),
            Err(e) => warn!(%key, error = %e, "statistics cache read failed, using database"),
        }

        let fresh = compute_day_statistics(conn, date)?;

        if let Err(e) = self.store_statistics(&key, &fresh) {
            warn!(%key, error = %e, "statistics cache write failed");
        }
        Ok(fresh)
    }

    fn cached_statistics(&self, key: &str) -> Result<Option<DayStatistics>, CacheError> {
        let Some(bytes) = self.cache.get(key)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn store_statistics(&self, key: &str, value: &DayStatistics) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.cache.set_with_ttl(key, bytes, self.stats_ttl)
    }
}

fn write_batch(
    conn: &Connection,
    records: &[AttendanceInput],
    actor_id: &str,
) -> rusqlite::Result<Vec<Attendance>> {
    // Dropping the transaction without commit rolls the whole batch back.
    let tx = conn.unchecked_transaction()?;
    let mut written = Vec::with_capacity(records.len());
    for input in records {
        let row = match store::find_attendance(&tx, &input.student_id, input.date)? {
            Some(existing) => store::update_attendance(
                &tx,
                &existing.id,
                input.status,
                input.note.as_deref(),
                actor_id,
            )?,
            None => store::insert_attendance(&tx, input, actor_id)?,
        };
        written.push(row);
    }
    tx.commit()?;
    Ok(written)
}

pub fn compute_day_statistics(
    conn: &Connection,
    date: NaiveDate,
) -> Result<DayStatistics, AttendanceError> {
    let rows = store::find_attendance_by_date(conn, date)?;
    let counts = StatusCounts::tally(rows.iter().map(|r| r.status));
    Ok(DayStatistics {
        date,
        total: counts.total(),
        present: counts.present,
        absent: counts.absent,
        late: counts.late,
        percentage: counts.percentage(),
    })
}
