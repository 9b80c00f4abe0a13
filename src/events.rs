// Post-commit notification of attendance writes.
//
// Subscribers run synchronously, in registration order, after the write
// transaction has committed. A failing subscriber is logged and skipped.

use crate::cache::{day_stats_key, stats_namespace_pattern, StatsCache};
use crate::model::{Actor, Attendance};
use crate::stats::StatusCounts;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AttendanceRecorded {
    pub records: Vec<Attendance>,
    pub actor: Actor,
    pub recorded_at: DateTime<Utc>,
}

impl AttendanceRecorded {
    pub fn new(records: Vec<Attendance>, actor: Actor) -> Self {
        Self {
            records,
            actor,
            recorded_at: Utc::now(),
        }
    }

    pub fn dates(&self) -> BTreeSet<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::tally(self.records.iter().map(|r| r.status))
    }
}

pub trait AttendanceSubscriber: Send + Sync {
    fn name(&self) -> &'static str;
    fn handle(&self, event: &AttendanceRecorded) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct Notifier {
    subscribers: Vec<Box<dyn AttendanceSubscriber>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn AttendanceSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Delivers the event to every subscriber. Returns how many failed.
    pub fn publish(&self, event: &AttendanceRecorded) -> usize {
        let mut failed = 0;
        for sub in &self.subscribers {
            if let Err(e) = sub.handle(event) {
                failed += 1;
                warn!(
                    subscriber = sub.name(),
                    error = %format!("{e:#}"),
                    "attendance subscriber failed"
                );
            }
        }
        failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidationStrategy {
    /// Delete the stats key of each date touched by the write.
    #[default]
    DateKey,
    /// Delete every key under the statistics namespace.
    Namespace,
}

impl FromStr for InvalidationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "date_key" => Ok(InvalidationStrategy::DateKey),
            "namespace" => Ok(InvalidationStrategy::Namespace),
            other => Err(format!(
                "expected date_key or namespace, got {:?}",
                other
            )),
        }
    }
}

/// Evicts cached day statistics after rows for `dates` changed. Returns the
/// number of keys deleted.
pub fn invalidate_statistics(
    cache: &dyn StatsCache,
    strategy: InvalidationStrategy,
    dates: &BTreeSet<NaiveDate>,
) -> anyhow::Result<usize> {
    let keys: Vec<String> = match strategy {
        InvalidationStrategy::DateKey => dates.iter().copied().map(day_stats_key).collect(),
        InvalidationStrategy::Namespace => cache
            .list_keys(&stats_namespace_pattern())
            .context("list statistics keys")?,
    };
    for key in &keys {
        cache
            .delete(key)
            .with_context(|| format!("delete {}", key))?;
    }
    Ok(keys.len())
}

pub struct CacheInvalidator {
    cache: Arc<dyn StatsCache>,
    strategy: InvalidationStrategy,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<dyn StatsCache>, strategy: InvalidationStrategy) -> Self {
        Self { cache, strategy }
    }
}

impl AttendanceSubscriber for CacheInvalidator {
    fn name(&self) -> &'static str {
        "cache_invalidator"
    }

    fn handle(&self, event: &AttendanceRecorded) -> anyhow::Result<()> {
        let keys = invalidate_statistics(self.cache.as_ref(), self.strategy, &event.dates())?;
        info!(
            strategy = ?self.strategy,
            keys,
            records = event.records.len(),
            "attendance statistics cache invalidated"
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    event: &'static str,
    actor_id: &'a str,
    actor_name: &'a str,
    dates: Vec<String>,
    total_records: usize,
    present: u32,
    absent: u32,
    late: u32,
    timestamp: String,
}

/// Writes one structured audit record per event to the `audit` log target and,
/// when a path is configured, appends it as a JSON line to that file.
pub struct AuditLogger {
    path: Option<PathBuf>,
}

impl AuditLogger {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl AttendanceSubscriber for AuditLogger {
    fn name(&self) -> &'static str {
        "audit_logger"
    }

    fn handle(&self, event: &AttendanceRecorded) -> anyhow::Result<()> {
        let counts = event.counts();
        let entry = AuditEntry {
            event: "attendance.recorded",
            actor_id: &event.actor.id,
            actor_name: &event.actor.name,
            dates: event.dates().iter().map(|d| d.to_string()).collect(),
            total_records: event.records.len(),
            present: counts.present,
            absent: counts.absent,
            late: counts.late,
            timestamp: event.recorded_at.to_rfc3339(),
        };
        info!(
            target: "audit",
            actor_id = entry.actor_id,
            actor_name = entry.actor_name,
            dates = ?entry.dates,
            total_records = entry.total_records,
            present = entry.present,
            absent = entry.absent,
            late = entry.late,
            timestamp = %entry.timestamp,
            "attendance recorded"
        );

        let Some(path) = &self.path else {
            return Ok(());
        };
        let line = serde_json::to_string(&entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open audit log {}", path.to_string_lossy()))?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}
