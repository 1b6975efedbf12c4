//! Boundary adapters: input forms and report exports

pub mod forms;
pub mod report;

pub use forms::LoginForm;
pub use report::{export_campus_csv, CSV_HEADER, DEFAULT_REPORT_FILE};
