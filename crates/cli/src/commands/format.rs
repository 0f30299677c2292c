use std::io::Read;

use anyhow::Context;
use clap::Args;
use tracing::debug;
use xpath_tester::{Diagnostic, IndentUnit, Phase, QueryEngine, SxdEngine};

use crate::source::{self, SourceArgs};
use crate::util::CliResult;
use crate::{CommandOutput, EXIT_DIAGNOSTIC};

#[derive(Args, Debug, Clone)]
pub struct FormatArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Spaces per nesting level.
    #[arg(long = "indent", value_name = "N", default_value_t = 1)]
    pub indent: usize,
}

/// Parses the document and prints it re-indented, `--indent` spaces per level.
pub fn run(args: &FormatArgs, stdin: &mut dyn Read) -> CliResult<CommandOutput> {
    let document = source::load(&args.source, stdin)?;
    let engine = SxdEngine::new();
    match engine.parse_document(&document) {
        Ok(package) => {
            let text = engine
                .format_document(&package, IndentUnit { fill: b' ', size: args.indent })
                .context("failed to serialize the document")?;
            Ok(CommandOutput { text, exit_code: 0 })
        }
        Err(failure) => {
            debug!(kind = %failure.kind, "document could not be formatted");
            let diagnostic = Diagnostic::from_failure(Phase::Parsing, &failure, Some(&document));
            Ok(CommandOutput { text: diagnostic.to_string(), exit_code: EXIT_DIAGNOSTIC })
        }
    }
}
