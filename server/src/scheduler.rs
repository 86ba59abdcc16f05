//! Daily inactivity sweep.

use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, Utc};
use products_hr::{DepartmentRepository, EmployeeRepository, EmployeeService, ProjectRepository};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Time of day (UTC) at which the sweep fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepSchedule {
    at: NaiveTime,
}

impl SweepSchedule {
    pub fn daily_at(at: NaiveTime) -> Self {
        Self { at }
    }

    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.at).and_utc();
        if today > now {
            today
        } else {
            today
                .checked_add_days(Days::new(1))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        }
    }

    pub fn delay_from(&self, now: DateTime<Utc>) -> Duration {
        (self.next_run_after(now) - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for SweepSchedule {
    fn default() -> Self {
        Self::daily_at(NaiveTime::MIN)
    }
}

/// Run the sweep every day at the scheduled time. Failures are logged and the
/// loop keeps going. The sweep does not coordinate with HTTP writers.
pub fn spawn_daily_sweep<E, D, P>(
    service: EmployeeService<E, D, P>,
    schedule: SweepSchedule,
) -> JoinHandle<()>
where
    E: EmployeeRepository,
    D: DepartmentRepository,
    P: ProjectRepository,
{
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next_run = schedule.next_run_after(now);
            info!(%next_run, "inactivity sweep scheduled");
            tokio::time::sleep(schedule.delay_from(now)).await;

            info!("running automatic employee deactivation check");
            match service.deactivate_inactive_employees().await {
                Ok(report) => info!(
                    deactivated = report.deactivated_count,
                    "automatic deactivation finished"
                ),
                Err(err) => error!(error = %err, "automatic deactivation failed"),
            }
        }
    })
}
