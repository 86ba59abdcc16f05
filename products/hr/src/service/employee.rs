use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{HrError, HrResult},
    models::{
        Employee, EmployeeChanges, EmployeeDraft, EmployeeFilter, EmployeeOrder,
        EmployeeWithProjects, NewEmployee, Page, ProjectSummary, SweepReport, TenureReport,
    },
    ports::{DepartmentRepository, EmployeeRepository, ProjectRepository, StoreError},
};

/// Months without activity after which the sweep deactivates an employee.
pub const DEFAULT_STALE_AFTER_MONTHS: u32 = 6;

const MISSING_FIELDS: &str = "Missing required fields";

/// Employee lifecycle: creation, queries, salary and department changes,
/// project assignment, tenure and the inactivity sweep.
///
/// `is_active` only ever moves from `true` to `false`. Writes go through
/// [`EmployeeRepository::update_employee`], which touches only the columns
/// being changed, so a concurrent sweep and salary update never undo each
/// other; two writers of the same column resolve as last write wins.
#[derive(Clone, Debug)]
pub struct EmployeeService<E, D, P> {
    employees: E,
    departments: D,
    projects: P,
    stale_after: Months,
}

impl<E, D, P> EmployeeService<E, D, P>
where
    E: EmployeeRepository,
    D: DepartmentRepository,
    P: ProjectRepository,
{
    pub fn new(employees: E, departments: D, projects: P) -> Self {
        Self {
            employees,
            departments,
            projects,
            stale_after: Months::new(DEFAULT_STALE_AFTER_MONTHS),
        }
    }

    pub fn with_stale_after_months(mut self, months: u32) -> Self {
        self.stale_after = Months::new(months);
        self
    }

    #[instrument(name = "employee.create", skip(self))]
    pub async fn create(&self, draft: EmployeeDraft) -> HrResult<Employee> {
        let new_employee = validate_draft(draft)?;
        self.insert_checked(new_employee).await
    }

    /// Active employees ordered by id.
    #[instrument(name = "employee.list", skip(self))]
    pub async fn list(&self, page: Page) -> HrResult<Vec<Employee>> {
        let employees = self
            .employees
            .find_employees(EmployeeFilter::active(), EmployeeOrder::IdAsc, Some(page))
            .await?;
        Ok(employees)
    }

    #[instrument(name = "employee.get", skip(self))]
    pub async fn get(&self, id: i32) -> HrResult<EmployeeWithProjects> {
        let employee = self.require_employee(id).await?;
        self.with_projects(employee).await
    }

    /// Active employees whose name contains `fragment`, ordered by name.
    /// Case sensitivity follows the database collation.
    #[instrument(name = "employee.search", skip(self))]
    pub async fn search_by_name(&self, fragment: Option<String>) -> HrResult<Vec<Employee>> {
        let fragment = fragment
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| HrError::validation("Name parameter is required"))?;
        let filter = EmployeeFilter {
            name_contains: Some(fragment),
            ..EmployeeFilter::active()
        };
        let employees = self
            .employees
            .find_employees(filter, EmployeeOrder::NameAsc, None)
            .await?;
        debug!(found = employees.len(), "employee search finished");
        Ok(employees)
    }

    #[instrument(name = "employee.update_salary", skip(self))]
    pub async fn update_salary(&self, id: i32, salary: Option<f64>) -> HrResult<Employee> {
        let salary = salary
            .filter(|value| value.is_finite() && *value >= 0.0)
            .ok_or_else(|| HrError::validation("Invalid salary value"))?;
        let changes = EmployeeChanges {
            salary: Some(salary),
            ..EmployeeChanges::default()
        };
        let employee = self
            .employees
            .update_employee(id, changes)
            .await?
            .ok_or(HrError::NotFound("Employee"))?;
        info!(employee_id = id, "salary updated");
        Ok(employee)
    }

    /// Mark the employee inactive. Repeating the call on an inactive employee
    /// is a no-op that returns the stored record.
    #[instrument(name = "employee.soft_delete", skip(self))]
    pub async fn soft_delete(&self, id: i32) -> HrResult<Employee> {
        let employee = self.require_employee(id).await?;
        if !employee.is_active {
            debug!(employee_id = id, "employee already inactive");
            return Ok(employee);
        }
        let employee = self.deactivate(id).await?.ok_or(HrError::NotFound("Employee"))?;
        info!(employee_id = id, "employee deactivated");
        Ok(employee)
    }

    #[instrument(name = "employee.transfer", skip(self))]
    pub async fn transfer_department(&self, id: i32, department_id: i32) -> HrResult<Employee> {
        let employee = self.require_employee(id).await?;
        self.departments
            .find_department(department_id)
            .await?
            .ok_or(HrError::NotFound("Department"))?;
        let from = employee.department.as_ref().map(|department| department.id);
        let changes = EmployeeChanges {
            department_id: Some(department_id),
            ..EmployeeChanges::default()
        };
        let employee = self
            .employees
            .update_employee(id, changes)
            .await?
            .ok_or(HrError::NotFound("Employee"))?;
        info!(employee_id = id, ?from, to = department_id, "employee transferred");
        Ok(employee)
    }

    #[instrument(name = "employee.assign_project", skip(self))]
    pub async fn assign_to_project(
        &self,
        id: i32,
        project_id: i32,
    ) -> HrResult<EmployeeWithProjects> {
        let employee = self.require_employee(id).await?;
        self.projects
            .find_project(project_id)
            .await?
            .ok_or(HrError::NotFound("Project"))?;

        let assigned = self.employees.employee_projects(id).await?;
        if assigned.iter().any(|project| project.id == project_id) {
            return Err(HrError::AlreadyAssigned);
        }
        match self.employees.add_employee_project(id, project_id).await {
            Ok(()) => {}
            Err(StoreError::Duplicate) => return Err(HrError::AlreadyAssigned),
            Err(err) => return Err(err.into()),
        }
        info!(employee_id = id, project_id, "project assigned");
        self.with_projects(employee).await
    }

    #[instrument(name = "employee.tenure", skip(self))]
    pub async fn calculate_tenure(&self, id: i32) -> HrResult<TenureReport> {
        self.calculate_tenure_on(id, Utc::now().date_naive()).await
    }

    /// Whole calendar years between the hire date and `today`, by year
    /// subtraction.
    pub async fn calculate_tenure_on(&self, id: i32, today: NaiveDate) -> HrResult<TenureReport> {
        let employee = self.require_employee(id).await?;
        Ok(TenureReport {
            employee_id: employee.id,
            years: today.year() - employee.hire_date.year(),
            name: employee.name,
            hire_date: employee.hire_date,
        })
    }

    /// Validate every row up front, then create them one by one. A row that
    /// fails after validation aborts the rest; rows already created stay.
    #[instrument(name = "employee.bulk_create", skip(self, drafts), fields(rows = drafts.len()))]
    pub async fn bulk_create(&self, drafts: Vec<EmployeeDraft>) -> HrResult<Vec<Employee>> {
        let mut pending = Vec::with_capacity(drafts.len());
        for (index, draft) in drafts.into_iter().enumerate() {
            let row = index + 1;
            let new_employee = validate_draft(draft).map_err(|err| match err {
                HrError::Validation(message) => {
                    HrError::Validation(format!("{message} (row {row})"))
                }
                other => other,
            })?;
            pending.push(new_employee);
        }

        let mut created = Vec::with_capacity(pending.len());
        for new_employee in pending {
            match self.insert_checked(new_employee).await {
                Ok(employee) => created.push(employee),
                Err(err) => {
                    warn!(imported = created.len(), error = %err, "bulk import aborted");
                    return Err(err);
                }
            }
        }
        info!(imported = created.len(), "bulk import finished");
        Ok(created)
    }

    /// Stamp the employee's last activity with the current time.
    #[instrument(name = "employee.record_activity", skip(self))]
    pub async fn record_activity(&self, id: i32) -> HrResult<Employee> {
        let employee = self.require_employee(id).await?;
        if !employee.is_active {
            return Err(HrError::validation("Employee is inactive"));
        }
        let changes = EmployeeChanges {
            last_activity_date: Some(Utc::now()),
            ..EmployeeChanges::default()
        };
        self.employees
            .update_employee(id, changes)
            .await?
            .ok_or(HrError::NotFound("Employee"))
    }

    #[instrument(name = "employee.sweep", skip(self))]
    pub async fn deactivate_inactive_employees(&self) -> HrResult<SweepReport> {
        self.deactivate_stale_as_of(Utc::now()).await
    }

    /// Deactivate active employees whose last activity is older than the
    /// staleness window ending at `now`. Employees with no recorded activity
    /// are measured from their hire date.
    pub async fn deactivate_stale_as_of(&self, now: DateTime<Utc>) -> HrResult<SweepReport> {
        let cutoff = now
            .checked_sub_months(self.stale_after)
            .ok_or(HrError::StaleWindowOutOfRange)?;
        let filter = EmployeeFilter {
            stale_before: Some(cutoff),
            ..EmployeeFilter::active()
        };
        let stale = self
            .employees
            .find_employees(filter, EmployeeOrder::IdAsc, None)
            .await?;

        let mut report = SweepReport::default();
        for employee in stale {
            if self.deactivate(employee.id).await?.is_some() {
                report.employee_ids.push(employee.id);
            }
        }
        report.deactivated_count = report.employee_ids.len();
        info!(%cutoff, deactivated = report.deactivated_count, "inactivity sweep finished");
        Ok(report)
    }

    async fn insert_checked(&self, new_employee: NewEmployee) -> HrResult<Employee> {
        self.departments
            .find_department(new_employee.department_id)
            .await?
            .ok_or(HrError::NotFound("Department"))?;
        let employee = self.employees.insert_employee(new_employee).await?;
        info!(employee_id = employee.id, "employee created");
        Ok(employee)
    }

    async fn require_employee(&self, id: i32) -> HrResult<Employee> {
        self.employees
            .find_employee(id)
            .await?
            .ok_or(HrError::NotFound("Employee"))
    }

    async fn deactivate(&self, id: i32) -> HrResult<Option<Employee>> {
        let changes = EmployeeChanges {
            is_active: Some(false),
            ..EmployeeChanges::default()
        };
        Ok(self.employees.update_employee(id, changes).await?)
    }

    async fn with_projects(&self, employee: Employee) -> HrResult<EmployeeWithProjects> {
        let projects = self
            .employees
            .employee_projects(employee.id)
            .await?
            .into_iter()
            .map(ProjectSummary::from)
            .collect();
        Ok(EmployeeWithProjects { employee, projects })
    }
}

fn validate_draft(draft: EmployeeDraft) -> HrResult<NewEmployee> {
    let EmployeeDraft {
        name,
        position,
        department_id,
        hire_date,
        job_title,
        salary,
    } = draft;
    let (Some(name), Some(position), Some(department_id), Some(hire_date)) = (
        non_blank(name),
        non_blank(position),
        department_id,
        non_blank(hire_date),
    ) else {
        return Err(HrError::validation(MISSING_FIELDS));
    };

    let department_id = department_id
        .parse()
        .ok_or_else(|| HrError::validation("Invalid departmentId"))?;
    let hire_date = parse_hire_date(&hire_date)?;
    let salary = match salary {
        Some(value) if !value.is_finite() || value < 0.0 => {
            return Err(HrError::validation("Invalid salary value"));
        }
        Some(value) => value,
        None => 0.0,
    };

    Ok(NewEmployee {
        name,
        position,
        job_title: non_blank(job_title),
        salary,
        department_id,
        hire_date,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (date part in UTC).
fn parse_hire_date(raw: &str) -> HrResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc).date_naive()))
        .map_err(|_| HrError::validation(format!("Invalid hireDate: {raw}")))
}
