//! Count command: measure a document and gate on its length.

use anyhow::bail;
use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use rich_doc_core::{CountUnit, LengthPolicy, SchemaOptions};

use super::{SchemaArgs, load_document};

/// Arguments for the `count` subcommand.
#[derive(Args, Debug)]
pub struct CountArgs {
    /// Document JSON file.
    pub file: Utf8PathBuf,

    /// Maximum length.
    #[arg(long)]
    pub max_length: Option<usize>,

    /// Unit to count in.
    #[arg(long, value_enum)]
    pub unit: Option<CountUnit>,

    #[command(flatten)]
    pub schema: SchemaArgs,
}

/// Count the characters in a document file and check them against the limit.
#[instrument(name = "cmd_count", skip_all, fields(file = %args.file))]
pub fn cmd_count(
    args: CountArgs,
    global_json: bool,
    config_options: SchemaOptions,
    config_policy: LengthPolicy,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    let options = args.schema.apply(config_options);
    let policy = LengthPolicy {
        max_length: args.max_length.unwrap_or(config_policy.max_length),
        unit: args.unit.unwrap_or(config_policy.unit),
    };
    debug!(file = %args.file, ?policy, "executing count command");

    let doc = load_document(&args.file, max_input_bytes, &options)?;
    let report = policy.check(&doc);

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !report.within_limit {
        bail!(
            "{} is {} {} long (max: {}). Shorten it.",
            args.file,
            report.count,
            report.unit,
            report.max_length,
        );
    } else {
        println!(
            "{} {} is {} {} long (max: {})",
            "PASS:".green(),
            args.file,
            report.count,
            report.unit,
            report.max_length,
        );
    }

    Ok(())
}
