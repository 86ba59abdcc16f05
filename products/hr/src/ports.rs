use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Department, Employee, EmployeeChanges, EmployeeFilter, EmployeeOrder, NewDepartment,
    NewEmployee, NewProject, Page, Project,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists")]
    Duplicate,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DepartmentRepository: Send + Sync + 'static {
    async fn find_department(&self, id: i32) -> StoreResult<Option<Department>>;
    async fn insert_department(&self, department: NewDepartment) -> StoreResult<Department>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync + 'static {
    async fn find_project(&self, id: i32) -> StoreResult<Option<Project>>;
    async fn insert_project(&self, project: NewProject) -> StoreResult<Project>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeRepository: Send + Sync + 'static {
    async fn find_employee(&self, id: i32) -> StoreResult<Option<Employee>>;

    async fn find_employees(
        &self,
        filter: EmployeeFilter,
        order: EmployeeOrder,
        page: Option<Page>,
    ) -> StoreResult<Vec<Employee>>;

    async fn insert_employee(&self, employee: NewEmployee) -> StoreResult<Employee>;

    /// Persist `changes` for employee `id`. Only the columns present in the
    /// change set are written. Returns `None` when the row does not exist.
    async fn update_employee(
        &self,
        id: i32,
        changes: EmployeeChanges,
    ) -> StoreResult<Option<Employee>>;

    /// Projects assigned to the employee, ordered by project id.
    async fn employee_projects(&self, employee_id: i32) -> StoreResult<Vec<Project>>;

    /// Fails with [`StoreError::Duplicate`] when the pair already exists.
    async fn add_employee_project(&self, employee_id: i32, project_id: i32) -> StoreResult<()>;
}
