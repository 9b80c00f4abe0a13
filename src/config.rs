use crate::events::InvalidationStrategy;
use crate::service::DEFAULT_STATS_TTL;
use anyhow::{anyhow, Context};
use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    /// Workspace opened at startup, if any.
    pub workspace: Option<PathBuf>,
    pub stats_ttl: Duration,
    pub invalidation: InvalidationStrategy,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let workspace = lookup("ATTENDANCED_WORKSPACE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let ttl_secs: u64 = try_load(
            &lookup,
            "ATTENDANCED_STATS_TTL_SECS",
            &DEFAULT_STATS_TTL.as_secs().to_string(),
        )?;
        let invalidation = try_load(&lookup, "ATTENDANCED_CACHE_INVALIDATION", "date_key")?;

        Ok(Self {
            workspace,
            stats_ttl: Duration::from_secs(ttl_secs),
            invalidation,
        })
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value {raw:?}"))
}
