//! Report output: CSV and JSON rendering plus the console summary.

pub mod generator;

pub use generator::{generate_csv_report, generate_json_report, generate_summary_text, write_report};
