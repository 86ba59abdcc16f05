mod department;
mod employee;
mod project;

pub use department::DepartmentService;
pub use employee::{DEFAULT_STALE_AFTER_MONTHS, EmployeeService};
pub use project::ProjectService;

use crate::error::{HrError, HrResult};

/// Trimmed, non-empty name or a validation error naming `what`.
pub(crate) fn required_name(value: Option<String>, what: &str) -> HrResult<String> {
    value
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| HrError::validation(format!("{what} name is required")))
}
