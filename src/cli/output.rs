//! Output formatting module for Stacksmith
//!
//! Provides colored human output and machine-readable JSON/YAML output.

use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

use super::OutputFormat;

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// Output format
    format: OutputFormat,
    /// Verbosity level
    verbosity: u8,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, format: OutputFormat, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();

        Self {
            use_color,
            format,
            verbosity,
        }
    }

    /// Whether output is meant for humans
    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print a banner/header
    pub fn banner(&self, title: &str) {
        if !self.is_human() {
            return;
        }

        let line = "=".repeat(title.len() + 4);
        if self.use_color {
            println!("\n{}", line.bright_blue());
            println!("{}", format!("  {title}  ").bright_blue().bold());
            println!("{}\n", line.bright_blue());
        } else {
            println!("\n{line}");
            println!("  {title}  ");
            println!("{line}\n");
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if !self.is_human() {
            return;
        }

        if self.use_color {
            println!("\n{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("\n{title}");
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if !self.is_human() {
            let err = serde_json::json!({
                "type": "error",
                "message": message
            });
            eprintln!("{err}");
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {message}");
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.is_human() {
            let warn = serde_json::json!({
                "type": "warning",
                "message": message
            });
            eprintln!("{warn}");
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {message}");
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 || !self.is_human() {
            return;
        }

        if self.use_color {
            println!("{} {}", "INFO:".blue(), message);
        } else {
            println!("INFO: {message}");
        }
    }

    /// Print a success line
    pub fn success(&self, message: &str) {
        if !self.is_human() {
            return;
        }

        if self.use_color {
            println!("{} {}", "✓".green().bold(), message);
        } else {
            println!("OK: {message}");
        }
    }

    /// Print a list of items
    pub fn list(&self, title: &str, items: &[String]) {
        if self.use_color {
            println!("\n{}:", title.bright_white().bold());
        } else {
            println!("\n{title}:");
        }

        for item in items {
            if self.use_color {
                println!("  {} {}", "-".bright_black(), item);
            } else {
                println!("  - {item}");
            }
        }
    }

    /// Print a table
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        // Calculate column widths
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }

        let header_line = pad_row(headers.iter().copied(), &widths);
        if self.use_color {
            println!("{}", header_line.bright_white().bold());
        } else {
            println!("{header_line}");
        }

        let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        if self.use_color {
            println!("{}", sep.join("-+-").bright_black());
        } else {
            println!("{}", sep.join("-+-"));
        }

        for row in rows {
            println!("{}", pad_row(row.iter().map(String::as_str), &widths));
        }
    }

    /// Print a serializable value in the requested machine format.
    ///
    /// Human mode falls back to pretty JSON.
    pub fn data<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        self.data_as(value, self.format)
    }

    /// Print a serializable value in an explicit format.
    pub fn data_as<T: Serialize>(&self, value: &T, format: OutputFormat) -> anyhow::Result<()> {
        let body = match format {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Json | OutputFormat::Human => {
                let mut body = serde_json::to_string_pretty(value)?;
                body.push('\n');
                body
            }
        };
        print!("{body}");
        self.flush();
        Ok(())
    }

    /// Flush stdout
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

fn pad_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:width$}"))
        .collect::<Vec<_>>()
        .join(" | ")
}
