//! Console-only commands: info and demo.

use serde_json::Value;
use std::io::{BufRead, Write};

use super::CommandDispatcher;
use crate::error::AppResult;
use crate::models::{record_from_pairs, value_to_cell, Record};
use crate::transform::rows_from_records;
use crate::validation::validate_email;

const RULE_WIDTH: usize = 60;

const DEMO_EMAILS: &[&str] = &[
    "user@example.com",
    "test.email+tag@domain.co.uk",
    "invalid-email",
    "another@test.com",
];

const DEMO_DURATIONS: &[f64] = &[30.0, 90.0, 3661.0, 86400.0, 259200.0];

/// Human-readable duration: seconds below a minute, then minutes, hours, days.
///
/// ```rust
/// use recordflow::commands::format_duration;
///
/// assert_eq!(format_duration(90.0), "1.5 minutes");
/// ```
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{seconds:.1} seconds")
    } else if seconds < 3600.0 {
        format!("{:.1} minutes", seconds / 60.0)
    } else if seconds < 86400.0 {
        format!("{:.1} hours", seconds / 3600.0)
    } else {
        format!("{:.1} days", seconds / 86400.0)
    }
}

/// Built-in records used by the demo.
pub fn sample_records() -> Vec<Record> {
    vec![
        record_from_pairs([("name", "John Doe"), ("age", "30"), ("email", "john@example.com")]),
        record_from_pairs([("name", "jane smith"), ("age", "25"), ("email", "JANE@EXAMPLE.COM")]),
        record_from_pairs([("name", "Bob Johnson"), ("age", "invalid"), ("email", "not-an-email")]),
        record_from_pairs([("name", ""), ("age", "35"), ("email", "missing@name.com")]),
    ]
}

fn status(valid: bool) -> &'static str {
    if valid {
        "✅ Valid"
    } else {
        "❌ Invalid"
    }
}

fn print_config<W: Write>(out: &mut W, value: &Value, indent: usize) -> AppResult<()> {
    let Value::Object(map) = value else {
        return Ok(());
    };
    for (key, value) in map {
        match value {
            Value::Object(_) => {
                writeln!(out, "{:indent$}{key}:", "")?;
                print_config(out, value, indent + 3)?;
            }
            other => writeln!(out, "{:indent$}{key}: {}", "", value_to_cell(other))?,
        }
    }
    Ok(())
}

impl CommandDispatcher {
    pub(super) fn run_info<W: Write>(&self, verbose: bool, out: &mut W) -> AppResult<i32> {
        let settings = self.ctx.settings();

        writeln!(out, "ℹ️  {} v{}", settings.app_name(), settings.app_version())?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;

        writeln!(out, "\n🔧 Configuration:")?;
        let source = if settings.loaded_from_file() {
            "loaded"
        } else {
            "not found, using defaults"
        };
        writeln!(out, "   Config file: {} ({source})", settings.config_path().display())?;
        print_config(out, &settings.redacted(), 3)?;

        writeln!(out, "\n🗂️  Data Directory: {}", settings.data_directory().display())?;
        writeln!(out, "📊 Log Level: {}", settings.log_level())?;

        if verbose {
            writeln!(out, "\n🌐 System Information:")?;
            writeln!(out, "   Crate Version: {}", env!("CARGO_PKG_VERSION"))?;
            writeln!(out, "   Platform: {}", std::env::consts::OS)?;
            writeln!(out, "   Architecture: {}", std::env::consts::ARCH)?;
            let cwd = std::env::current_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|e| format!("<unavailable: {e}>"));
            writeln!(out, "   Working Directory: {cwd}")?;
        }

        Ok(0)
    }

    pub(super) fn run_demo<R: BufRead, W: Write>(
        &self,
        interactive: bool,
        input: &mut R,
        out: &mut W,
    ) -> AppResult<i32> {
        writeln!(out, "🚀 {} Demo", self.ctx.settings().app_name())?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;

        writeln!(out, "\n📧 Email Validation Demo:")?;
        for email in DEMO_EMAILS {
            writeln!(out, "   {:<30} {}", email, status(validate_email(email)))?;
        }

        writeln!(out, "\n⏱️  Duration Formatting Demo:")?;
        for seconds in DEMO_DURATIONS {
            writeln!(out, "   {:>6} seconds = {}", seconds, format_duration(*seconds))?;
        }

        writeln!(out, "\n🔄 Data Processing Demo:")?;
        let rows = rows_from_records(sample_records());
        writeln!(out, "   📊 Processing {} sample records...", rows.len())?;

        let processed = self.processor.process_dataset(&rows);
        writeln!(out, "   ✅ Processed {} records", processed.processed_count)?;
        for record in &processed.records {
            let field = |name: &str| record.get(name).map(value_to_cell).unwrap_or_default();
            writeln!(
                out,
                "      - {} <{}> {}",
                field("name"),
                field("email"),
                field("age_category")
            )?;
        }

        let validation = self.processor.validate_dataset(&rows);
        writeln!(out, "   📈 Validation Results:")?;
        writeln!(out, "      Total: {}", validation.total_records)?;
        writeln!(out, "      Valid: {}", validation.valid_records)?;
        writeln!(out, "      Invalid: {}", validation.invalid_records)?;
        if !validation.errors.is_empty() {
            writeln!(out, "   ❌ Sample validation errors:")?;
            for error in validation.errors.iter().take(3) {
                writeln!(out, "      - Row {}: {}", error.row, error.message)?;
            }
        }

        if interactive {
            writeln!(out, "\n⌨️  Interactive Email Check (empty line to finish):")?;
            loop {
                write!(out, "   email> ")?;
                out.flush()?;

                let mut line = String::new();
                if input.read_line(&mut line)? == 0 {
                    writeln!(out)?;
                    break;
                }
                let email = line.trim();
                if email.is_empty() {
                    break;
                }
                writeln!(out, "   {:<30} {}", email, status(validate_email(email)))?;
            }
        }

        writeln!(out, "\n✨ Demo completed successfully!")?;
        writeln!(out, "💡 Try running with actual data files using other commands")?;
        Ok(0)
    }
}
