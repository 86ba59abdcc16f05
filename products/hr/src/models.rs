use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;
/// Largest offset a SQL backend accepts once the limit is added.
pub const MAX_OFFSET: u64 = i64::MAX as u64 - MAX_LIMIT;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Department {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DepartmentSummary {
    pub id: i32,
    pub name: String,
}

impl From<Department> for DepartmentSummary {
    fn from(value: Department) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub id: i32,
    pub name: String,
}

impl From<Project> for ProjectSummary {
    fn from(value: Project) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewDepartment {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewProject {
    pub name: String,
}

/// Employee record with its department denormalized to a summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i32,
    pub name: String,
    pub position: String,
    pub job_title: Option<String>,
    pub salary: f64,
    pub department: Option<DepartmentSummary>,
    pub is_active: bool,
    pub hire_date: NaiveDate,
    pub last_activity_date: Option<DateTime<Utc>>,
}

/// Employee together with the full current set of assigned projects.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmployeeWithProjects {
    #[serde(flatten)]
    pub employee: Employee,
    pub projects: Vec<ProjectSummary>,
}

/// Validated insert payload. New employees always start active.
#[derive(Clone, Debug, PartialEq)]
pub struct NewEmployee {
    pub name: String,
    pub position: String,
    pub job_title: Option<String>,
    pub salary: f64,
    pub department_id: i32,
    pub hire_date: NaiveDate,
}

/// Column-level change set; `None` leaves the stored value untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmployeeChanges {
    pub salary: Option<f64>,
    pub department_id: Option<i32>,
    pub is_active: Option<bool>,
    pub last_activity_date: Option<DateTime<Utc>>,
}

impl EmployeeChanges {
    pub fn is_empty(&self) -> bool {
        self.salary.is_none()
            && self.department_id.is_none()
            && self.is_active.is_none()
            && self.last_activity_date.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmployeeFilter {
    pub active: Option<bool>,
    pub name_contains: Option<String>,
    /// Last activity strictly before the cutoff, or no recorded activity and
    /// hired before the cutoff date.
    pub stale_before: Option<DateTime<Utc>>,
}

impl EmployeeFilter {
    pub fn active() -> Self {
        Self {
            active: Some(true),
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmployeeOrder {
    #[default]
    IdAsc,
    NameAsc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    /// One-based `page` of `limit` rows. Zero or missing values fall back to
    /// the defaults, `limit` is capped at [`MAX_LIMIT`] and the offset at
    /// [`MAX_OFFSET`].
    pub fn from_request(page: Option<u64>, limit: Option<u64>) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        Self {
            offset: (page - 1).saturating_mul(limit).min(MAX_OFFSET),
            limit,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::from_request(None, None)
    }
}

/// Department or project reference as callers send it: JSON numbers or
/// numeric strings (CSV cells are always strings).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdField {
    Number(i64),
    Text(String),
}

impl IdField {
    pub fn parse(&self) -> Option<i32> {
        match self {
            IdField::Number(value) => i32::try_from(*value).ok(),
            IdField::Text(value) => value.trim().parse().ok(),
        }
        .filter(|id| *id > 0)
    }
}

/// Raw create request, shared by the JSON endpoint and CSV import rows.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDraft {
    pub name: Option<String>,
    pub position: Option<String>,
    pub department_id: Option<IdField>,
    pub hire_date: Option<String>,
    pub job_title: Option<String>,
    pub salary: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenureReport {
    pub employee_id: i32,
    pub name: String,
    pub hire_date: NaiveDate,
    pub years: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub deactivated_count: usize,
    pub employee_ids: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offsets_are_one_based() {
        assert_eq!(Page::from_request(Some(1), Some(10)), Page { offset: 0, limit: 10 });
        assert_eq!(Page::from_request(Some(3), Some(5)), Page { offset: 10, limit: 5 });
    }

    #[test]
    fn page_falls_back_to_defaults() {
        assert_eq!(Page::from_request(Some(0), Some(0)), Page { offset: 0, limit: 10 });
        assert_eq!(Page::from_request(None, Some(1_000)).limit, MAX_LIMIT);
    }

    #[test]
    fn huge_pages_clamp_the_offset() {
        let page = Page::from_request(Some(u64::MAX), Some(MAX_LIMIT));
        assert_eq!(page.offset, MAX_OFFSET);
        assert!(i64::try_from(page.offset + page.limit).is_ok());
    }

    #[test]
    fn id_field_accepts_numbers_and_numeric_strings() {
        assert_eq!(IdField::Number(4).parse(), Some(4));
        assert_eq!(IdField::Text(" 12 ".into()).parse(), Some(12));
        assert_eq!(IdField::Text("twelve".into()).parse(), None);
        assert_eq!(IdField::Number(0).parse(), None);
        assert_eq!(IdField::Number(i64::MAX).parse(), None);
    }

    #[test]
    fn employee_serializes_camel_case_with_department_summary() {
        let employee = Employee {
            id: 7,
            name: "Ada".into(),
            position: "Engineer".into(),
            job_title: None,
            salary: 100.0,
            department: Some(DepartmentSummary {
                id: 2,
                name: "R&D".into(),
            }),
            is_active: true,
            hire_date: NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
            last_activity_date: None,
        };
        let value = serde_json::to_value(EmployeeWithProjects {
            employee,
            projects: vec![ProjectSummary {
                id: 3,
                name: "Apollo".into(),
            }],
        })
        .unwrap();
        assert_eq!(value["isActive"], true);
        assert_eq!(value["hireDate"], "2020-05-01");
        assert_eq!(value["department"]["name"], "R&D");
        assert_eq!(value["projects"][0]["id"], 3);
    }
}
