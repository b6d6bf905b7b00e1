pub mod row_mapping;
pub mod sheet_models;
pub mod spreadsheet_manager;

pub use row_mapping::{cell, parse_cell, FromRow, RowError};
pub use sheet_models::{MajorDimension, SheetsError, ValueRange};
pub use spreadsheet_manager::{SheetsApi, SpreadsheetManager};
