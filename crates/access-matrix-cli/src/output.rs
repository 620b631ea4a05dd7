//! Output formatting utilities

use access_matrix::{AccessMatrix, MatrixDocument};
use colored::*;
use serde::Serialize;
use tabled::builder::Builder;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Render the matrix as a subjects × objects grid.
pub fn matrix_table(matrix: &AccessMatrix) -> String {
    let mut builder = Builder::default();
    let mut header = vec!["subject".to_string()];
    header.extend(matrix.objects().iter().map(|o| o.to_string()));
    builder.set_header(header);

    for (name, perms) in matrix.subjects() {
        let mut row = vec![name.to_string()];
        row.extend(matrix.objects().iter().map(|o| {
            if perms.contains(o) {
                "x".to_string()
            } else {
                String::new()
            }
        }));
        builder.push_record(row);
    }
    builder.build().to_string()
}

/// Print the whole matrix in the specified format
pub fn print_matrix(matrix: &AccessMatrix, format: OutputFormat) -> serde_json::Result<()> {
    match format {
        OutputFormat::Table => {
            if matrix.is_empty() {
                println!("{}", "Matrix is empty".dimmed());
            } else {
                println!("{}", matrix_table(matrix));
            }
        }
        OutputFormat::Json => {
            print_json(&MatrixDocument::from(matrix))?;
        }
    }
    Ok(())
}

/// Print a single item as pretty JSON
pub fn print_json<T: Serialize>(data: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}
