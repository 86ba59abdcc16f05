//! Shared fixtures for the integration suites. Every helper works against a
//! fresh migrated `sqlite::memory:` database.

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use migration::{Migrator, MigratorTrait};
use platform_db::DbPool;
use products_hr::{EmployeeDraft, HrModule, IdField, SeaOrmStore};
use server::{AppConfig, AppState};

pub type Hr = HrModule<SeaOrmStore>;

pub async fn memory_pool() -> Result<DbPool> {
    let pool = platform_db::connect_url("sqlite::memory:", false).await?;
    Migrator::up(&pool, None).await?;
    Ok(pool)
}

pub async fn hr_module() -> Result<Hr> {
    let pool = memory_pool().await?;
    Ok(HrModule::new(SeaOrmStore::new(pool)))
}

pub fn test_config() -> Result<AppConfig> {
    AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some("sqlite::memory:".to_string()),
        "SWEEP_ENABLED" => Some("false".to_string()),
        _ => None,
    })
}

pub async fn app_state() -> Result<AppState> {
    let pool = memory_pool().await?;
    Ok(AppState::new(pool, Arc::new(test_config()?)))
}

pub fn draft(name: &str, position: &str, department_id: i32, hire_date: NaiveDate) -> EmployeeDraft {
    EmployeeDraft {
        name: Some(name.to_string()),
        position: Some(position.to_string()),
        department_id: Some(IdField::Number(department_id.into())),
        hire_date: Some(hire_date.format("%Y-%m-%d").to_string()),
        ..EmployeeDraft::default()
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
