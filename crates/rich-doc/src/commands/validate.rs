//! Validate command: check a document file against the schema.

use anyhow::bail;
use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use rich_doc_core::schema::{DOCUMENT, SchemaOptions, ValidationReport};

use super::{SchemaArgs, issue_count, print_issues, read_json_file};

/// Arguments for the `validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Document JSON file.
    pub file: Utf8PathBuf,

    #[command(flatten)]
    pub schema: SchemaArgs,
}

/// Validate a document file and report every issue found.
#[instrument(name = "cmd_validate", skip_all, fields(file = %args.file))]
pub fn cmd_validate(
    args: ValidateArgs,
    global_json: bool,
    config_options: SchemaOptions,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    let options = args.schema.apply(config_options);
    debug!(file = %args.file, ?options, "executing validate command");

    let value = read_json_file(&args.file, max_input_bytes)?;
    let result = DOCUMENT.parse(&value, &options);

    if global_json {
        let report = match &result {
            Ok(_) => ValidationReport {
                valid: true,
                issues: Vec::new(),
            },
            Err(err) => ValidationReport::from(err),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match result {
        Ok(doc) => {
            println!(
                "{} {} is a valid document ({} top-level nodes)",
                "PASS:".green(),
                args.file,
                doc.len(),
            );
        }
        Err(err) => {
            print_issues(&err);
            bail!(
                "{} is not a valid document ({})",
                args.file,
                issue_count(&err)
            );
        }
    }

    Ok(())
}
