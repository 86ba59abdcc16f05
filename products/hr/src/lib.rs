//! HR vertical slice: departments, projects and the employee lifecycle.
//!
//! Services depend only on the repository traits in [`ports`]; the
//! sea-orm backed [`SeaOrmStore`] is the production implementation.

pub mod error;
pub mod import;
pub mod models;
pub mod ports;
pub mod service;
pub mod store;

pub use error::{HrError, HrResult};
pub use models::*;
pub use ports::{DepartmentRepository, EmployeeRepository, ProjectRepository, StoreError};
pub use service::{DEFAULT_STALE_AFTER_MONTHS, DepartmentService, EmployeeService, ProjectService};
pub use store::SeaOrmStore;

/// All HR services wired against one store.
#[derive(Clone, Debug)]
pub struct HrModule<S> {
    pub departments: DepartmentService<S>,
    pub projects: ProjectService<S>,
    pub employees: EmployeeService<S, S, S>,
}

impl<S> HrModule<S>
where
    S: DepartmentRepository + ProjectRepository + EmployeeRepository + Clone,
{
    pub fn new(store: S) -> Self {
        Self {
            departments: DepartmentService::new(store.clone()),
            projects: ProjectService::new(store.clone()),
            employees: EmployeeService::new(store.clone(), store.clone(), store),
        }
    }

    /// Override how long an employee may go without activity before the sweep
    /// deactivates them.
    pub fn with_stale_after_months(mut self, months: u32) -> Self {
        self.employees = self.employees.with_stale_after_months(months);
        self
    }
}
