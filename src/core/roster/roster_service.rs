// Student roster kept in the course spreadsheet.
// One row per student on the `Alumnos` sheet, starting at row 2:
//   A = full name, B = student id, C = practice class, D = email.
// Like the other core services this has no front-end code; callers decide
// how to present the results.

use thiserror::Error;

use crate::core::sheets::{cell, parse_cell, FromRow, RowError, SheetsApi, SheetsError, SpreadsheetManager};

pub const ROSTER_SHEET: &str = "Alumnos";
pub const FIRST_DATA_ROW: usize = 2;
pub const FIRST_COLUMN: &str = "A";
pub const LAST_COLUMN: &str = "E";
pub const EMAIL_COLUMN: &str = "D";

// ============================================================================
// DOMAIN MODELS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub full_name: String,
    pub student_id: u64,
    pub practice_class: String,
    pub email: String,
}

impl FromRow for Student {
    fn from_row(row: &[String]) -> Result<Self, RowError> {
        Ok(Self {
            full_name: cell(row, 0, "full_name")?.to_string(),
            student_id: parse_cell(row, 1, "student_id")?,
            practice_class: cell(row, 2, "practice_class")?.to_string(),
            email: cell(row, 3, "email")?.to_string(),
        })
    }
}

/// Result of a successful email change, for the caller to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailChange {
    pub student_id: u64,
    pub old_email: String,
    pub new_email: String,
    /// The single cell that was rewritten, e.g. `Alumnos!D7:D7`.
    pub cell: String,
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error(transparent)]
    Sheets(#[from] SheetsError),
    #[error("the new email is the same as the current one")]
    SameEmail,
    #[error("no student {student_id} with email {email}")]
    StudentNotFound { student_id: u64, email: String },
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct RosterService<A: SheetsApi> {
    sheets: SpreadsheetManager<A>,
}

impl<A: SheetsApi> RosterService<A> {
    pub fn new(sheets: SpreadsheetManager<A>) -> Self {
        Self { sheets }
    }

    /// Range covering every student row, e.g. `Alumnos!A2:E`.
    pub fn roster_range() -> String {
        format!(
            "{}!{}{}:{}",
            ROSTER_SHEET, FIRST_COLUMN, FIRST_DATA_ROW, LAST_COLUMN
        )
    }

    pub async fn list_students(&self) -> Result<Vec<Student>, RosterError> {
        let data = self.sheets.get_range::<Student>(&Self::roster_range()).await?;
        Ok(data.values)
    }

    /// Replaces the email of the student whose id and current email both
    /// match. Only the email cell of that row is written.
    pub async fn change_email(
        &self,
        student_id: u64,
        current_email: &str,
        new_email: &str,
    ) -> Result<EmailChange, RosterError> {
        if current_email == new_email {
            return Err(RosterError::SameEmail);
        }

        tracing::info!(student_id, new_email, "Received email change request");
        let students = self.list_students().await?;

        let sheet_row = students
            .iter()
            .position(|s| s.student_id == student_id && s.email == current_email)
            .map(|index| index + FIRST_DATA_ROW)
            .ok_or_else(|| RosterError::StudentNotFound {
                student_id,
                email: current_email.to_string(),
            })?;

        let target = format!(
            "{}!{}{}:{}{}",
            ROSTER_SHEET, EMAIL_COLUMN, sheet_row, EMAIL_COLUMN, sheet_row
        );
        tracing::debug!(cell = %target, "Updating email cell");
        self.sheets
            .update_range(&target, vec![vec![new_email.to_string()]])
            .await?;

        tracing::info!(
            student_id,
            old_email = current_email,
            new_email,
            "Updated student email"
        );
        Ok(EmailChange {
            student_id,
            old_email: current_email.to_string(),
            new_email: new_email.to_string(),
            cell: target,
        })
    }
}
