//! Command implementations.

use anyhow::{Context, bail};
use camino::Utf8Path;
use clap::Args;
use owo_colors::OwoColorize;
use serde_json::Value;

use rich_doc_core::schema::{DOCUMENT, SchemaOptions, SchemaOverrides};
use rich_doc_core::{Document, DocumentError, ValidationError, parse_json};

pub mod count;
pub mod info;
#[cfg(feature = "mcp")]
pub mod serve;
pub mod text;
pub mod validate;

/// Read a file and validate its size against the configured limit.
pub fn read_input_file(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<String> {
    // Check size via metadata before reading into memory.
    let metadata =
        std::fs::metadata(path.as_std_path()).with_context(|| format!("failed to read {path}"))?;
    if let Some(max) = max_bytes {
        let size = metadata.len();
        if size > max as u64 {
            bail!("input too large: {path} is {size} bytes (limit: {max} bytes)");
        }
    }

    std::fs::read_to_string(path.as_std_path()).with_context(|| format!("failed to read {path}"))
}

/// Read a file and parse it as JSON.
pub fn read_json_file(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<Value> {
    let content = read_input_file(path, max_bytes)?;
    match parse_json(&content) {
        Err(err @ DocumentError::TooDeep { .. }) => {
            Err(err).with_context(|| format!("{path} is nested too deeply"))
        }
        parsed => parsed.with_context(|| format!("{path} is not valid JSON")),
    }
}

/// Decode a document file, printing every schema issue on failure.
pub fn load_document(
    path: &Utf8Path,
    max_bytes: Option<usize>,
    options: &SchemaOptions,
) -> anyhow::Result<Document> {
    let value = read_json_file(path, max_bytes)?;
    match DOCUMENT.parse(&value, options) {
        Ok(doc) => Ok(doc),
        Err(err) => {
            print_issues(&err);
            bail!("{path} is not a valid document ({})", issue_count(&err));
        }
    }
}

/// Print each issue on its own line.
pub fn print_issues(err: &ValidationError) {
    for issue in err.issues() {
        let path = issue.path.to_string();
        let path = if path.is_empty() { "/" } else { path.as_str() };
        eprintln!(
            "  {} {} {}",
            path.yellow(),
            issue.violation,
            format!("[{}]", issue.violation.code()).dimmed(),
        );
    }
}

/// "1 issue", "3 issues".
pub(crate) fn issue_count(err: &ValidationError) -> String {
    match err.issues().len() {
        1 => "1 issue".to_string(),
        n => format!("{n} issues"),
    }
}

/// Validator flags shared by the document commands.
///
/// Absent flags leave the configured value alone.
#[derive(Args, Debug, Default, Clone)]
pub struct SchemaArgs {
    /// Reject keys outside the node model
    #[arg(long)]
    pub strict_fields: bool,

    /// Require list items inside lists and forbid bare top-level text
    #[arg(long)]
    pub strict_nesting: bool,

    /// Accept unknown element types, keeping only their children
    #[arg(long)]
    pub preserve_unknown_kinds: bool,

    /// Maximum element nesting depth
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,
}

impl SchemaArgs {
    /// Apply these flags on top of `base`.
    pub fn apply(&self, base: SchemaOptions) -> SchemaOptions {
        base.with_overrides(&SchemaOverrides {
            strict_fields: self.strict_fields,
            strict_nesting: self.strict_nesting,
            preserve_unknown_kinds: self.preserve_unknown_kinds,
            max_depth: self.max_depth,
        })
    }
}
