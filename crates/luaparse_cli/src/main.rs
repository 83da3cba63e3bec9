//! luaparse: Inspect and check Lua sources from the command line.
//!
//! Usage:
//!   luaparse tokens <file>
//!   luaparse ast <file>
//!   luaparse globals <file>
//!   luaparse locals <file> --offset <n>
//!   luaparse check <file>...
//!
//! A file argument of `-` reads standard input. Dumps are written to stdout
//! as JSON; diagnostics and logs go to stderr.

mod config;
mod logging;
mod render;

use bumpalo::Bump;
use clap::{Parser as ClapParser, Subcommand};
use config::{CliError, Config, Overrides};
use luaparse_ast::query::locals_at_offset;
use luaparse_core::text::TextPos;
use luaparse_diagnostics::SyntaxError;
use rayon::prelude::*;
use serde::Serialize;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(ClapParser, Debug)]
#[command(name = "luaparse", version, about = "Error-tolerant Lua parser")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to a JSON config file (defaults to ./.luaparse.json when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Default log filter, e.g. `debug` or `luaparse_parser=trace`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write JSON on a single line.
    #[arg(long, global = true)]
    compact: bool,

    /// Stop rendering diagnostics after this many.
    #[arg(long, global = true)]
    max_errors: Option<usize>,

    /// Disable colored diagnostics.
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every token, comments included.
    Tokens { file: PathBuf },
    /// Print the syntax tree.
    Ast { file: PathBuf },
    /// Print the identifiers used without a local binding.
    Globals { file: PathBuf },
    /// Print the locals visible at a byte offset.
    Locals {
        file: PathBuf,
        #[arg(long)]
        offset: TextPos,
    },
    /// Parse files in parallel and report syntax errors.
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> miette::Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?.apply(Overrides {
        log_level: cli.log_level.clone(),
        compact: cli.compact,
        max_errors: cli.max_errors,
        no_color: cli.no_color,
    });
    logging::init(&config.log_level);
    tracing::debug!(?config, "resolved configuration");

    Ok(run(cli.command, &config)?)
}

fn run(command: Command, config: &Config) -> Result<ExitCode, CliError> {
    match command {
        Command::Tokens { file } => {
            let source = read_source(&file)?;
            let arena = Bump::new();
            let result = luaparse_parser::parse(&arena, &source);
            print_json(&result.tokens, config.pretty)?;
        }
        Command::Ast { file } => {
            let source = read_source(&file)?;
            let arena = Bump::new();
            let result = luaparse_parser::parse(&arena, &source);
            print_json(&result.ast, config.pretty)?;
        }
        Command::Globals { file } => {
            let source = read_source(&file)?;
            let arena = Bump::new();
            let result = luaparse_parser::parse(&arena, &source);
            print_json(&result.globals, config.pretty)?;
        }
        Command::Locals { file, offset } => {
            let source = read_source(&file)?;
            let arena = Bump::new();
            let result = luaparse_parser::parse(&arena, &source);
            print_json(&locals_at_offset(&result.ast, offset), config.pretty)?;
        }
        Command::Check { files } => return Ok(run_check(&files, config)),
    }
    Ok(ExitCode::SUCCESS)
}

/// Syntax errors found in one file.
struct FileReport {
    path: PathBuf,
    source: String,
    errors: Vec<SyntaxError>,
}

fn check_file(path: &Path) -> Result<FileReport, CliError> {
    let source = read_source(path)?;
    let arena = Bump::new();
    let errors = luaparse_parser::parse(&arena, &source).errors;
    Ok(FileReport {
        path: path.to_path_buf(),
        source,
        errors,
    })
}

fn run_check(files: &[PathBuf], config: &Config) -> ExitCode {
    let reports: Vec<Result<FileReport, CliError>> = files.par_iter().map(|path| check_file(path)).collect();

    let color = config.color && std::io::stderr().is_terminal();
    let mut budget = config.max_errors.unwrap_or(usize::MAX);
    let mut error_count = 0;
    let mut hidden = 0;
    let mut failed_files = 0;

    for report in reports {
        let report = match report {
            Ok(report) => report,
            Err(err) => {
                failed_files += 1;
                eprintln!("{:?}", miette::Report::new(err));
                continue;
            }
        };
        if report.errors.is_empty() {
            continue;
        }
        failed_files += 1;
        error_count += report.errors.len();

        let shown = report.errors.len().min(budget);
        budget -= shown;
        hidden += report.errors.len() - shown;
        let path = report.path.display().to_string();
        eprint!("{}", render::render_errors(&path, &report.source, &report.errors[..shown], color));
    }

    if hidden > 0 {
        eprintln!("... {hidden} more error(s) not shown");
    }

    if failed_files == 0 {
        eprintln!("Checked {} file(s), no errors.", files.len());
        ExitCode::SUCCESS
    } else {
        eprintln!(
            "Found {} error{} in {} of {} file(s).",
            error_count,
            if error_count == 1 { "" } else { "s" },
            failed_files,
            files.len()
        );
        ExitCode::FAILURE
    }
}

fn read_source(path: &Path) -> Result<String, CliError> {
    let io_error = |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    };
    if path == Path::new("-") {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source).map_err(io_error)?;
        Ok(source)
    } else {
        std::fs::read_to_string(path).map_err(io_error)
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_locals_requires_offset() {
        assert!(Cli::try_parse_from(["luaparse", "locals", "a.lua"]).is_err());
        let cli = Cli::try_parse_from(["luaparse", "locals", "a.lua", "--offset", "12"]).unwrap();
        assert!(matches!(cli.command, Command::Locals { offset: 12, .. }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["luaparse", "check", "a.lua", "b.lua", "--compact", "--max-errors", "3"]).unwrap();
        assert!(cli.compact);
        assert_eq!(cli.max_errors, Some(3));
        let Command::Check { files } = cli.command else {
            panic!("expected check");
        };
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_check_requires_files() {
        assert!(Cli::try_parse_from(["luaparse", "check"]).is_err());
    }

    #[test]
    fn test_missing_file_is_reported_as_io_error() {
        let err = check_file(Path::new("/nonexistent/input.lua")).err();
        assert!(matches!(err, Some(CliError::Io { .. })));
    }
}
