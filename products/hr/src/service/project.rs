use tracing::{info, instrument};

use super::required_name;
use crate::{
    error::HrResult,
    models::{NewProject, Project},
    ports::ProjectRepository,
};

#[derive(Clone, Debug)]
pub struct ProjectService<R> {
    repo: R,
}

impl<R> ProjectService<R>
where
    R: ProjectRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    #[instrument(name = "project.create", skip(self))]
    pub async fn create(&self, name: Option<String>) -> HrResult<Project> {
        let name = required_name(name, "Project")?;
        let project = self.repo.insert_project(NewProject { name }).await?;
        info!(project_id = project.id, "project created");
        Ok(project)
    }
}
