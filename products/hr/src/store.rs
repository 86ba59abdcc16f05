//! sea-orm implementation of the HR repository traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entity::{department, employee, employee_project, project};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, SqlErr,
    prelude::DateTimeWithTimeZone, sea_query::JoinType,
};

use crate::{
    models::{
        Department, DepartmentSummary, Employee, EmployeeChanges, EmployeeFilter, EmployeeOrder,
        NewDepartment, NewEmployee, NewProject, Page, Project,
    },
    ports::{DepartmentRepository, EmployeeRepository, ProjectRepository, StoreError, StoreResult},
};

#[derive(Clone, Debug)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn store_error(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Duplicate,
        _ => StoreError::Backend(err.into()),
    }
}

fn to_offset(ts: DateTime<Utc>) -> DateTimeWithTimeZone {
    ts.fixed_offset()
}

fn employee_from_row(model: employee::Model, department: Option<department::Model>) -> Employee {
    Employee {
        id: model.id,
        name: model.name,
        position: model.position,
        job_title: model.job_title,
        salary: model.salary,
        department: department.map(|d| DepartmentSummary {
            id: d.id,
            name: d.name,
        }),
        is_active: model.is_active,
        hire_date: model.hire_date,
        last_activity_date: model.last_activity_date.map(|ts| ts.with_timezone(&Utc)),
    }
}

fn filter_condition(filter: &EmployeeFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(active) = filter.active {
        condition = condition.add(employee::Column::IsActive.eq(active));
    }
    if let Some(fragment) = &filter.name_contains {
        condition = condition.add(employee::Column::Name.contains(fragment.as_str()));
    }
    if let Some(cutoff) = filter.stale_before {
        condition = condition.add(
            Condition::any()
                .add(employee::Column::LastActivityDate.lt(to_offset(cutoff)))
                .add(
                    Condition::all()
                        .add(employee::Column::LastActivityDate.is_null())
                        .add(employee::Column::HireDate.lt(cutoff.date_naive())),
                ),
        );
    }
    condition
}

#[async_trait]
impl DepartmentRepository for SeaOrmStore {
    async fn find_department(&self, id: i32) -> StoreResult<Option<Department>> {
        let found = department::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(store_error)?;
        Ok(found.map(|model| Department {
            id: model.id,
            name: model.name,
        }))
    }

    async fn insert_department(&self, new: NewDepartment) -> StoreResult<Department> {
        let model = department::ActiveModel {
            name: Set(new.name),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(store_error)?;
        Ok(Department {
            id: model.id,
            name: model.name,
        })
    }
}

#[async_trait]
impl ProjectRepository for SeaOrmStore {
    async fn find_project(&self, id: i32) -> StoreResult<Option<Project>> {
        let found = project::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(store_error)?;
        Ok(found.map(|model| Project {
            id: model.id,
            name: model.name,
        }))
    }

    async fn insert_project(&self, new: NewProject) -> StoreResult<Project> {
        let model = project::ActiveModel {
            name: Set(new.name),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(store_error)?;
        Ok(Project {
            id: model.id,
            name: model.name,
        })
    }
}

#[async_trait]
impl EmployeeRepository for SeaOrmStore {
    async fn find_employee(&self, id: i32) -> StoreResult<Option<Employee>> {
        let row = employee::Entity::find_by_id(id)
            .find_also_related(department::Entity)
            .one(&self.db)
            .await
            .map_err(store_error)?;
        Ok(row.map(|(model, department)| employee_from_row(model, department)))
    }

    async fn find_employees(
        &self,
        filter: EmployeeFilter,
        order: EmployeeOrder,
        page: Option<Page>,
    ) -> StoreResult<Vec<Employee>> {
        let mut query = employee::Entity::find()
            .find_also_related(department::Entity)
            .filter(filter_condition(&filter));
        query = match order {
            EmployeeOrder::IdAsc => query.order_by_asc(employee::Column::Id),
            EmployeeOrder::NameAsc => query
                .order_by_asc(employee::Column::Name)
                .order_by_asc(employee::Column::Id),
        };
        if let Some(page) = page {
            query = query.offset(page.offset).limit(page.limit);
        }
        let rows = query.all(&self.db).await.map_err(store_error)?;
        Ok(rows
            .into_iter()
            .map(|(model, department)| employee_from_row(model, department))
            .collect())
    }

    async fn insert_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        let model = employee::ActiveModel {
            name: Set(new.name),
            position: Set(new.position),
            job_title: Set(new.job_title),
            salary: Set(new.salary),
            department_id: Set(Some(new.department_id)),
            is_active: Set(true),
            hire_date: Set(new.hire_date),
            last_activity_date: Set(None),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(store_error)?;

        let department = department::Entity::find_by_id(new.department_id)
            .one(&self.db)
            .await
            .map_err(store_error)?;
        Ok(employee_from_row(model, department))
    }

    async fn update_employee(
        &self,
        id: i32,
        changes: EmployeeChanges,
    ) -> StoreResult<Option<Employee>> {
        let Some(model) = employee::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(store_error)?
        else {
            return Ok(None);
        };

        if !changes.is_empty() {
            let mut active: employee::ActiveModel = model.into();
            if let Some(salary) = changes.salary {
                active.salary = Set(salary);
            }
            if let Some(department_id) = changes.department_id {
                active.department_id = Set(Some(department_id));
            }
            if let Some(is_active) = changes.is_active {
                active.is_active = Set(is_active);
            }
            if let Some(ts) = changes.last_activity_date {
                active.last_activity_date = Set(Some(to_offset(ts)));
            }
            active.update(&self.db).await.map_err(store_error)?;
        }

        self.find_employee(id).await
    }

    async fn employee_projects(&self, employee_id: i32) -> StoreResult<Vec<Project>> {
        let rows = project::Entity::find()
            .join(JoinType::InnerJoin, project::Relation::EmployeeProject.def())
            .filter(employee_project::Column::EmployeeId.eq(employee_id))
            .order_by_asc(project::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_error)?;
        Ok(rows
            .into_iter()
            .map(|model| Project {
                id: model.id,
                name: model.name,
            })
            .collect())
    }

    async fn add_employee_project(&self, employee_id: i32, project_id: i32) -> StoreResult<()> {
        let link = employee_project::ActiveModel {
            employee_id: Set(employee_id),
            project_id: Set(project_id),
        };
        employee_project::Entity::insert(link)
            .exec_without_returning(&self.db)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
