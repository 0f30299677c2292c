//! Loading the document text handed to the pipeline.

use std::borrow::Cow;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Context, anyhow};
use clap::Args;
use fancy_regex::Regex;
use tracing::debug;

use crate::util::CliResult;

/// `XMLDecl` with a `version` followed by an `encoding` pseudo attribute.
/// Group 1 is everything up to and including the version value.
static ENCODING_DECL: LazyLock<Result<Regex, fancy_regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r#"\A(<\?xml[ \r\n\t]+version[ \r\n\t]*=[ \r\n\t]*(['"])[a-zA-Z0-9_.:-]+\2)[ \r\n\t]+encoding[ \r\n\t]*=[ \r\n\t]*(['"])[A-Za-z][A-Za-z0-9._-]*\3"#,
    )
});

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Read the document from a file (UTF-8).
    #[arg(long = "file", value_name = "PATH", conflicts_with = "xml")]
    pub file: Option<PathBuf>,
    /// Use the given text as the document.
    #[arg(long = "xml", value_name = "TEXT")]
    pub xml: Option<String>,
    /// Leave an `encoding="..."` declaration in place.
    #[arg(long = "keep-encoding")]
    pub keep_encoding: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceOptions {
    pub strip_encoding: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self { strip_encoding: true }
    }
}

impl SourceArgs {
    pub fn options(&self) -> SourceOptions {
        SourceOptions { strip_encoding: !self.keep_encoding }
    }
}

/// Reads the document from `--file`, `--xml` or `stdin`, in that order of preference.
pub fn load(args: &SourceArgs, stdin: &mut dyn Read) -> CliResult<String> {
    let text = if let Some(path) = &args.file {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    } else if let Some(xml) = &args.xml {
        xml.clone()
    } else {
        let mut text = String::new();
        stdin.read_to_string(&mut text).context("failed to read the document from stdin")?;
        text
    };
    prepare(text, args.options())
}

/// Drops a leading byte-order mark and, unless disabled, the encoding declaration.
pub fn prepare(text: String, options: SourceOptions) -> CliResult<String> {
    let text = match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_owned(),
        None => text,
    };
    if !options.strip_encoding {
        return Ok(text);
    }
    Ok(strip_encoding_declaration(&text)?.into_owned())
}

/// Removes the `encoding` pseudo attribute from a leading XML declaration.
///
/// The document reaches the parser as already-decoded text, so a declared
/// encoding can only contradict it.
pub fn strip_encoding_declaration(xml: &str) -> CliResult<Cow<'_, str>> {
    let regex = ENCODING_DECL.as_ref().map_err(|err| anyhow!("invalid encoding pattern: {err}"))?;
    let Some(captures) = regex.captures(xml)? else {
        return Ok(Cow::Borrowed(xml));
    };
    match (captures.get(0), captures.get(1)) {
        (Some(whole), Some(kept)) => {
            debug!(removed = &xml[kept.end()..whole.end()], "stripped encoding declaration");
            Ok(Cow::Owned(format!("{}{}", kept.as_str(), &xml[whole.end()..])))
        }
        _ => Ok(Cow::Borrowed(xml)),
    }
}
