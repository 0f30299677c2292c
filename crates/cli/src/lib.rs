use std::io::{self, Read};

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod source;
pub mod summary;
pub mod util;

use commands::eval::EvalArgs;
use commands::format::FormatArgs;
use util::CliResult;

/// Exit code when the run ended in a diagnostic rather than a result.
pub const EXIT_DIAGNOSTIC: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "xpath-tester", version, about = "Evaluate XPath 1.0 queries against XML documents")]
pub struct Cli {
    /// Log level used when `RUST_LOG` is not set.
    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub log_level: LogLevel,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate an XPath expression and print the typed result.
    Eval(EvalArgs),
    /// Parse a document and print it re-indented.
    Format(FormatArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// What a command prints and the process exit code that goes with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub exit_code: i32,
}

pub fn run() -> CliResult<i32> {
    let cli = Cli::parse();
    init_tracing(cli.log_level);
    let output = execute(&cli, &mut io::stdin().lock())?;
    println!("{}", output.text);
    Ok(output.exit_code)
}

pub fn execute(cli: &Cli, stdin: &mut dyn Read) -> CliResult<CommandOutput> {
    match &cli.command {
        Commands::Eval(args) => commands::eval::run(args, stdin),
        Commands::Format(args) => commands::format::run(args, stdin),
    }
}

fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn eval_arguments_parse() {
        let cli = Cli::try_parse_from([
            "xpath-tester",
            "eval",
            "//b",
            "--xml",
            "<a/>",
            "--namespace",
            "p=urn:p",
            "--var",
            "v=1",
            "--format",
            "json",
            "--no-color",
            "--keep-encoding",
        ])
        .expect("parse");
        assert_eq!(cli.log_level, LogLevel::Warn);
        let Commands::Eval(args) = cli.command else {
            panic!("expected eval");
        };
        assert_eq!(args.expression, "//b");
        assert_eq!(args.source.xml.as_deref(), Some("<a/>"));
        assert_eq!(args.namespaces, ["p=urn:p"]);
        assert_eq!(args.variables, ["v=1"]);
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.no_color);
        assert!(!args.source.options().strip_encoding);
    }

    #[rstest]
    fn file_and_xml_conflict() {
        let result = Cli::try_parse_from(["xpath-tester", "eval", "/", "--file", "a.xml", "--xml", "<a/>"]);
        assert!(result.is_err());
    }

    #[rstest]
    #[case("debug", LogLevel::Debug)]
    #[case("error", LogLevel::Error)]
    fn log_level_is_global(#[case] value: &str, #[case] expected: LogLevel) {
        let cli = Cli::try_parse_from(["xpath-tester", "format", "--log-level", value]).expect("parse");
        assert_eq!(cli.log_level, expected);
        assert!(matches!(cli.command, Commands::Format(_)));
    }
}
