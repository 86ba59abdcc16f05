//! Table models backing the employee directory.

pub mod department;
pub mod employee;
pub mod employee_project;
pub mod project;
