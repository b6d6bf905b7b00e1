// Command-line front end. Parses arguments, calls into the roster service
// and turns outcomes (including failures) into text for the terminal.

use clap::{Parser, Subcommand};

use crate::core::roster::{EmailChange, RosterError, RosterService, Student};
use crate::core::sheets::{SheetsApi, SheetsError};

#[derive(Debug, Parser)]
#[command(name = "sheets_roster", version, about = "Student roster kept in a Google Sheet")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every student on the roster
    Students,
    /// Change the email of a student, identified by id and current email
    ChangeEmail {
        #[arg(long)]
        student_id: u64,
        #[arg(long)]
        current_email: String,
        #[arg(long)]
        new_email: String,
    },
}

pub async fn run<A: SheetsApi>(
    command: Command,
    roster: &RosterService<A>,
) -> Result<String, RosterError> {
    match command {
        Command::Students => {
            let students = roster.list_students().await?;
            Ok(render_students(&students))
        }
        Command::ChangeEmail {
            student_id,
            current_email,
            new_email,
        } => {
            let change = roster
                .change_email(student_id, &current_email, &new_email)
                .await?;
            Ok(render_change(&change))
        }
    }
}

pub fn render_students(students: &[Student]) -> String {
    if students.is_empty() {
        return "No students on the roster".to_string();
    }

    students
        .iter()
        .map(|s| {
            format!(
                "{:>8}  {:<30}  {:<4}  {}",
                s.student_id, s.full_name, s.practice_class, s.email
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_change(change: &EmailChange) -> String {
    format!(
        "Updated email for student {} from {} to {} (cell {})",
        change.student_id, change.old_email, change.new_email, change.cell
    )
}

/// One-line message for a failed command. Details stay in the logs.
pub fn describe_error(err: &RosterError) -> String {
    match err {
        RosterError::SameEmail => "The new email is the same as the current one".to_string(),
        RosterError::StudentNotFound { student_id, .. } => format!(
            "Student {} not found, or the current email does not match",
            student_id
        ),
        RosterError::Sheets(SheetsError::Auth(e)) if e.is_transient() => {
            "Could not reach Google to authenticate, try again later".to_string()
        }
        RosterError::Sheets(SheetsError::Auth(_)) => {
            "Could not authenticate with Google, check the service account credentials".to_string()
        }
        RosterError::Sheets(SheetsError::Mapping { row, .. }) => format!(
            "The roster has an invalid entry in data row {}",
            row + 1
        ),
        RosterError::Sheets(SheetsError::Timeout | SheetsError::Network(_)) => {
            "Could not reach the spreadsheet, try again later".to_string()
        }
        RosterError::Sheets(_) => "The spreadsheet request failed".to_string(),
    }
}
