use std::io::Read;

use clap::Args;
use owo_colors::{OwoColorize, Stream};
use xpath_tester::{IndentUnit, Pipeline, PipelineOutcome, SxdEngine};

use crate::source::{self, SourceArgs};
use crate::summary::OutcomeSummary;
use crate::util::{CliResult, parse_bindings};
use crate::{CommandOutput, EXIT_DIAGNOSTIC, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct EvalArgs {
    #[arg(value_name = "XPATH")]
    pub expression: String,
    #[command(flatten)]
    pub source: SourceArgs,
    /// Bind a namespace prefix for the query.
    #[arg(long = "namespace", value_name = "PREFIX=URI")]
    pub namespaces: Vec<String>,
    /// Bind a string variable for the query.
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub variables: Vec<String>,
    /// Spaces per nesting level when printing element and root nodes.
    #[arg(long = "indent", value_name = "N", default_value_t = 1)]
    pub indent: usize,
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[arg(long = "no-color")]
    pub no_color: bool,
}

pub fn run(args: &EvalArgs, stdin: &mut dyn Read) -> CliResult<CommandOutput> {
    let document = source::load(&args.source, stdin)?;
    let pipeline = Pipeline::new(build_engine(args)?).with_indent(IndentUnit { fill: b' ', size: args.indent });
    let outcome = pipeline.run(&document, &args.expression);

    let text = match args.format {
        OutputFormat::Text => render_eval_text(&outcome, !args.no_color),
        OutputFormat::Json => serde_json::to_string_pretty(&OutcomeSummary::from(&outcome))?,
    };
    let exit_code = if outcome.is_success() { 0 } else { EXIT_DIAGNOSTIC };
    Ok(CommandOutput { text, exit_code })
}

fn build_engine(args: &EvalArgs) -> CliResult<SxdEngine> {
    let mut engine = SxdEngine::new();
    for (prefix, uri) in parse_bindings(&args.namespaces, "namespace")? {
        engine = engine.with_namespace(prefix, uri);
    }
    for (name, value) in parse_bindings(&args.variables, "var")? {
        engine = engine.with_variable(name, value);
    }
    Ok(engine)
}

fn colorize_header(header: &str, success: bool) -> String {
    if success {
        header.if_supports_color(Stream::Stdout, |text| text.bold().fg_rgb::<79, 166, 255>().to_string()).to_string()
    } else {
        header.if_supports_color(Stream::Stdout, |text| text.bold().red().to_string()).to_string()
    }
}

pub(crate) fn render_eval_text(outcome: &PipelineOutcome, color: bool) -> String {
    let rendered = outcome.render();
    if !color {
        return rendered;
    }
    match rendered.split_once('\n') {
        Some((header, rest)) => format!("{}\n{rest}", colorize_header(header, outcome.is_success())),
        None => rendered,
    }
}
