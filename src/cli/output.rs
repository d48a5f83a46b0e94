//! Terminal and JSON output for CLI commands

use crate::error::Result;
use colored::Colorize;
use serde::Serialize;

/// Prints command results either as colored text or as JSON
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    json: bool,
}

impl OutputFormatter {
    #[must_use]
    pub fn new(json: bool, no_color: bool) -> Self {
        if no_color || json {
            colored::control::set_override(false);
        }
        Self { json }
    }

    #[must_use]
    pub const fn is_json(&self) -> bool {
        self.json
    }

    /// Plain message; suppressed in JSON mode
    pub fn info(&self, message: &str) {
        if !self.json {
            println!("{message}");
        }
    }

    pub fn success(&self, message: &str) {
        if !self.json {
            println!("{} {message}", "✓".green().bold());
        }
    }

    pub fn warning(&self, message: &str) {
        if !self.json {
            eprintln!("{} {message}", "warning:".yellow().bold());
        }
    }

    pub fn error(&self, message: &str) {
        if !self.json {
            eprintln!("{} {message}", "error:".red().bold());
        }
    }

    /// Pretty JSON on stdout, regardless of mode
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// JSON on stdout in JSON mode only
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        if self.json {
            self.json(value)?;
        }
        Ok(())
    }

    /// Left-aligned columns with a bold header row
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        if self.json {
            return;
        }
        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                rows.iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or_default()
            })
            .collect();

        let line = |cells: Vec<String>| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };
        let header = line(headers.iter().map(|h| (*h).to_string()).collect());
        println!("{}", header.as_str().bold());
        for row in rows {
            println!("{}", line(row.clone()));
        }
    }
}
