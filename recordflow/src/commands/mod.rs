//! Command routing for the CLI.
//!
//! [`CommandDispatcher::dispatch`] is the error boundary: every handler
//! returns an exit status or an [`AppError`], and errors are logged, printed
//! and turned into status `1` here.
//!
//! # Commands
//!
//! ```bash
//! recordflow process data.csv -o out.csv     # Clean + transform a CSV file
//! recordflow validate data.csv -o errors.json
//! recordflow analyze data.csv --include-nulls
//! recordflow convert data.csv data.json --pretty
//! recordflow info --verbose
//! recordflow demo                            # Default when no command is given
//! ```

mod data;
mod system;

pub use system::{format_duration, sample_records};

use clap::Subcommand;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::files::{FileService, TableFormat};
use crate::transform::RecordProcessor;

/// Errors shown per summary before the remainder is collapsed into a count.
pub const MAX_LISTED_ERRORS: usize = 10;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Clean and transform a CSV file
    Process {
        /// Input CSV file
        file: PathBuf,

        /// Output file (default: processed_<input file> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip validation of the processed records
        #[arg(long)]
        skip_validation: bool,
    },

    /// Validate a CSV file and report issues
    Validate {
        /// Input CSV file
        file: PathBuf,

        /// Detailed error report (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Show application and system information
    Info {
        /// Include system details
        #[arg(long)]
        verbose: bool,
    },

    /// Run the feature demonstration
    Demo {
        /// Check emails typed on stdin after the demo
        #[arg(long)]
        interactive: bool,
    },

    /// Compute per-field statistics for a CSV file
    Analyze {
        /// Input CSV file
        file: PathBuf,

        /// Analysis output (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show null counts per field
        #[arg(long)]
        include_nulls: bool,
    },

    /// Convert between CSV and JSON
    Convert {
        /// Input file (.csv or .json)
        input: PathBuf,

        /// Output file (.csv or .json)
        output: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Demo { interactive: false }
    }
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Process { .. } => "process",
            Command::Validate { .. } => "validate",
            Command::Info { .. } => "info",
            Command::Demo { .. } => "demo",
            Command::Analyze { .. } => "analyze",
            Command::Convert { .. } => "convert",
        }
    }

    fn touches_files(&self) -> bool {
        !matches!(self, Command::Info { .. } | Command::Demo { .. })
    }
}

// =============================================================================
// Argument checks
// =============================================================================

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

fn has_extension(path: &Path, ext: &str) -> bool {
    extension(path) == ext
}

/// Cross-argument checks clap cannot express.
pub fn check_arguments(command: &Command) -> AppResult<()> {
    let usage = |msg: &str| Err(AppError::InvalidArgument(msg.to_string()));

    match command {
        Command::Convert { input, output, .. } => {
            let input_format = TableFormat::from_path(input).ok_or_else(|| {
                AppError::InvalidArgument(format!(
                    "Unsupported input format: .{}. Supported: csv, json",
                    extension(input)
                ))
            })?;
            let output_format = TableFormat::from_path(output).ok_or_else(|| {
                AppError::InvalidArgument(format!(
                    "Unsupported output format: .{}. Supported: csv, json",
                    extension(output)
                ))
            })?;
            if input_format == output_format {
                return usage("Input and output formats cannot be the same");
            }
            Ok(())
        }
        Command::Validate { output: Some(out), .. } if !has_extension(out, "json") => {
            usage("Validation output file must have .json extension")
        }
        Command::Analyze { output: Some(out), .. } if !has_extension(out, "json") => {
            usage("Analysis output file must have .json extension")
        }
        Command::Process { output: Some(out), .. } if !has_extension(out, "csv") => {
            usage("Process output file must have .csv extension")
        }
        _ => Ok(()),
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Routes commands to their handlers.
pub struct CommandDispatcher {
    ctx: AppContext,
    files: FileService,
    processor: RecordProcessor,
}

impl CommandDispatcher {
    pub fn new(ctx: AppContext) -> Self {
        let files = FileService::new(&ctx);
        let processor = RecordProcessor::new(&ctx);
        Self {
            ctx,
            files,
            processor,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Run `command` and return its exit status.
    ///
    /// `input` is only read by the interactive demo.
    pub fn dispatch<R: BufRead, W: Write>(&self, command: &Command, input: &mut R, out: &mut W) -> i32 {
        info!("Running command: {}", command.name());

        if let Err(e) = check_arguments(command) {
            let message = match &e {
                AppError::InvalidArgument(msg) => msg.clone(),
                other => other.to_string(),
            };
            error!("Invalid arguments for '{}': {}", command.name(), message);
            let _ = writeln!(out, "Error: {message}");
            return 1;
        }

        if command.touches_files() {
            if let Err(e) = self.files.ensure_data_directory() {
                warn!("Could not create data directory: {}", e);
            }
        }

        let result = match command {
            Command::Process {
                file,
                output,
                skip_validation,
            } => self.run_process(file, output.as_deref(), *skip_validation, out),
            Command::Validate {
                file,
                output,
                strict,
            } => self.run_validate(file, output.as_deref(), *strict, out),
            Command::Analyze {
                file,
                output,
                include_nulls,
            } => self.run_analyze(file, output.as_deref(), *include_nulls, out),
            Command::Convert {
                input: source,
                output,
                pretty,
            } => self.run_convert(source, output, *pretty, out),
            Command::Info { verbose } => self.run_info(*verbose, out),
            Command::Demo { interactive } => self.run_demo(*interactive, input, out),
        };

        match result {
            Ok(code) => code,
            Err(e) => {
                error!("Command '{}' failed: {}", command.name(), e);
                let _ = writeln!(out, "Error: Command failed - {e}");
                1
            }
        }
    }

    /// [`CommandDispatcher::dispatch`] wired to the process's stdin and stdout.
    pub fn dispatch_stdio(&self, command: &Command) -> i32 {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        let mut input = stdin.lock();
        let mut out = stdout.lock();
        let code = self.dispatch(command, &mut input, &mut out);
        let _ = out.flush();
        code
    }

    /// Print up to [`MAX_LISTED_ERRORS`] lines, then a remainder count.
    fn print_bounded<W, I>(out: &mut W, lines: I, total: usize) -> AppResult<()>
    where
        W: Write,
        I: IntoIterator<Item = String>,
    {
        for (i, line) in lines.into_iter().take(MAX_LISTED_ERRORS).enumerate() {
            writeln!(out, "   {}. {}", i + 1, line)?;
        }
        if total > MAX_LISTED_ERRORS {
            writeln!(out, "   ... and {} more errors", total - MAX_LISTED_ERRORS)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use serde_json::json;

    fn convert(input: &str, output: &str) -> Command {
        Command::Convert {
            input: input.into(),
            output: output.into(),
            pretty: false,
        }
    }

    fn dispatcher(data_dir: &Path) -> CommandDispatcher {
        let settings = Settings::from_value(json!({
            "data": {"directory": data_dir.to_string_lossy()}
        }))
        .unwrap();
        CommandDispatcher::new(AppContext::new(settings))
    }

    fn run(d: &CommandDispatcher, command: &Command) -> (i32, String) {
        let mut out = Vec::new();
        let code = d.dispatch(command, &mut std::io::empty(), &mut out);
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_check_arguments() {
        assert!(check_arguments(&convert("a.csv", "b.JSON")).is_ok());
        assert!(check_arguments(&convert("a.json", "b.csv")).is_ok());

        let err = check_arguments(&convert("a.csv", "b.csv")).unwrap_err();
        assert_eq!(err.to_string(), "[USAGE_ERROR] Input and output formats cannot be the same");

        let err = check_arguments(&convert("a.xlsx", "b.csv")).unwrap_err();
        assert!(err.to_string().contains("Unsupported input format: .xlsx"));

        let validate = Command::Validate {
            file: "d.csv".into(),
            output: Some("report.txt".into()),
            strict: false,
        };
        assert!(check_arguments(&validate).is_err());

        let process = Command::Process {
            file: "d.csv".into(),
            output: Some("out.json".into()),
            skip_validation: false,
        };
        assert!(check_arguments(&process).is_err());

        let analyze = Command::Analyze {
            file: "d.csv".into(),
            output: None,
            include_nulls: true,
        };
        assert!(check_arguments(&analyze).is_ok());
    }

    #[test]
    fn test_bad_arguments_return_one() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());
        let (code, out) = run(&d, &convert("a.json", "b.json"));
        assert_eq!(code, 1);
        assert_eq!(out.trim(), "Error: Input and output formats cannot be the same");
    }

    #[test]
    fn test_missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(dir.path());
        let missing = dir.path().join("nope.csv");
        let (code, out) = run(
            &d,
            &Command::Validate {
                file: missing.clone(),
                output: None,
                strict: false,
            },
        );
        assert_eq!(code, 1);
        assert!(out.contains(&format!("Error: File '{}' not found", missing.display())));
    }

    #[test]
    fn test_handler_errors_are_caught() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[{").unwrap();
        let d = dispatcher(dir.path());

        let (code, out) = run(&d, &convert(path.to_str().unwrap(), "x.csv"));
        assert_eq!(code, 1);
        assert!(out.contains("Error: Command failed - [FORMAT_ERROR]"));
    }

    #[test]
    fn test_default_command_is_demo() {
        assert_eq!(Command::default(), Command::Demo { interactive: false });
        assert_eq!(Command::default().name(), "demo");
    }
}
