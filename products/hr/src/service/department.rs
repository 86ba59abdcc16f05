use tracing::{info, instrument};

use super::required_name;
use crate::{
    error::HrResult,
    models::{Department, NewDepartment},
    ports::DepartmentRepository,
};

#[derive(Clone, Debug)]
pub struct DepartmentService<R> {
    repo: R,
}

impl<R> DepartmentService<R>
where
    R: DepartmentRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    #[instrument(name = "department.create", skip(self))]
    pub async fn create(&self, name: Option<String>) -> HrResult<Department> {
        let name = required_name(name, "Department")?;
        let department = self.repo.insert_department(NewDepartment { name }).await?;
        info!(department_id = department.id, "department created");
        Ok(department)
    }
}
