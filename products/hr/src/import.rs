//! CSV bulk-import rows.
//!
//! Expected headers: `name`, `position`, `departmentId`, `hireDate`, with
//! optional `jobTitle` and `salary`. Cells are trimmed and empty cells count
//! as missing.

use serde::Deserialize;

use crate::{
    error::{HrError, HrResult},
    models::{EmployeeDraft, IdField},
};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRow {
    name: Option<String>,
    position: Option<String>,
    department_id: Option<String>,
    hire_date: Option<String>,
    job_title: Option<String>,
    salary: Option<String>,
}

impl ImportRow {
    fn into_draft(self, row: usize) -> HrResult<EmployeeDraft> {
        let salary = match self.salary {
            Some(raw) => Some(raw.parse::<f64>().map_err(|_| {
                HrError::validation(format!("Invalid salary value (row {row})"))
            })?),
            None => None,
        };
        Ok(EmployeeDraft {
            name: self.name,
            position: self.position,
            department_id: self.department_id.map(IdField::Text),
            hire_date: self.hire_date,
            job_title: self.job_title,
            salary,
        })
    }
}

/// Parse an uploaded CSV document into create drafts, one per data row.
///
/// Rows are numbered from 1 after the header, counting records rather than
/// physical lines, the same numbering `bulk_create` reports.
pub fn parse_csv(bytes: &[u8]) -> HrResult<Vec<EmployeeDraft>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let mut drafts = Vec::new();
    for (index, record) in reader.deserialize::<ImportRow>().enumerate() {
        let parsed = record.map_err(|err| HrError::validation(format!("Invalid CSV: {err}")))?;
        drafts.push(parsed.into_draft(index + 1)?);
    }
    Ok(drafts)
}
