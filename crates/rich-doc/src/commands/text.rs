//! Text command: print the plain-text projection of a document.

use camino::Utf8PathBuf;
use clap::Args;
use serde::Serialize;
use tracing::{debug, instrument};

use rich_doc_core::{SchemaOptions, to_plain_text};

use super::{SchemaArgs, load_document};

/// Arguments for the `text` subcommand.
#[derive(Args, Debug)]
pub struct TextArgs {
    /// Document JSON file.
    pub file: Utf8PathBuf,

    #[command(flatten)]
    pub schema: SchemaArgs,
}

#[derive(Serialize)]
struct TextOutput<'a> {
    file: &'a str,
    text: String,
}

/// Validate a document file and print its plain text.
#[instrument(name = "cmd_text", skip_all, fields(file = %args.file))]
pub fn cmd_text(
    args: TextArgs,
    global_json: bool,
    config_options: SchemaOptions,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    let options = args.schema.apply(config_options);
    debug!(file = %args.file, "executing text command");

    let doc = load_document(&args.file, max_input_bytes, &options)?;
    let text = to_plain_text(&doc);

    if global_json {
        let output = TextOutput {
            file: args.file.as_str(),
            text,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{text}");
    }

    Ok(())
}
