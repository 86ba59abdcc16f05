use std::net::{IpAddr, Ipv4Addr};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveTime;
use platform_db::DatabaseSettings;

use crate::scheduler::SweepSchedule;

const DEFAULT_PORT: u16 = 4000;
/// Upper bound on the staleness window, one century.
const MAX_STALE_MONTHS: u32 = 1200;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub database: DatabaseSettings,
    pub sweep: SweepConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SweepConfig {
    pub enabled: bool,
    pub schedule: SweepSchedule,
    pub stale_after_months: u32,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = match lookup("HOST") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("invalid HOST {raw:?}"))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("invalid PORT {raw:?}"))?,
            None => DEFAULT_PORT,
        };

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        let enabled = lookup("SWEEP_ENABLED")
            .map(|val| matches!(val.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(true);
        let at = match lookup("SWEEP_AT") {
            Some(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                .map_err(|_| anyhow!("SWEEP_AT must be HH:MM, got {raw:?}"))?,
            None => NaiveTime::MIN,
        };
        let stale_after_months = match lookup("SWEEP_STALE_MONTHS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("invalid SWEEP_STALE_MONTHS {raw:?}"))?,
            None => products_hr::DEFAULT_STALE_AFTER_MONTHS,
        };
        anyhow::ensure!(
            (1..=MAX_STALE_MONTHS).contains(&stale_after_months),
            "SWEEP_STALE_MONTHS must be between 1 and {MAX_STALE_MONTHS}, got {stale_after_months}"
        );

        let database = DatabaseSettings::from_lookup(&lookup)?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            database,
            sweep: SweepConfig {
                enabled,
                schedule: SweepSchedule::daily_at(at),
                stale_after_months,
            },
        })
    }
}
