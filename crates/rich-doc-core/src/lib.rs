//! Core library for rich-doc.
//!
//! Rich-text documents arrive as untrusted JSON: an array of blocks
//! (paragraphs, headings, lists, code blocks) whose leaves are text runs with
//! optional formatting marks. This crate validates that JSON against the
//! recursive schema once, decodes it into a typed [`Document`], and derives a
//! plain-text projection and character count from the typed tree.
//!
//! # Modules
//!
//! - [`node`] - The typed node model
//! - [`predicates`] - Shape checks over raw JSON
//! - [`json`] - Depth-bounded JSON text parsing
//! - [`schema`] - Recursive schema validation and decoding
//! - [`plain_text`] - Plain-text projection
//! - [`length`] - Character counting and limits
//! - [`check`] - Validation plus length policy in one call
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```
//! use rich_doc_core::{Document, SchemaOptions, character_count, to_plain_text};
//!
//! let json = r#"[
//!     { "type": "heading-one", "children": [{ "text": "Notes" }] },
//!     { "type": "paragraph", "children": [{ "text": "Some " }, { "text": "bold", "bold": true }] }
//! ]"#;
//! let doc = Document::from_json_str(json, &SchemaOptions::default()).unwrap();
//! assert_eq!(to_plain_text(&doc), "Notes\nSome bold");
//! assert_eq!(character_count(&doc), 15);
//! ```
#![deny(unsafe_code)]

pub mod check;
pub mod config;
pub mod error;
pub mod json;
pub mod length;
pub mod node;
pub mod plain_text;
pub mod predicates;
pub mod schema;

pub use check::{CheckReport, check_value};
pub use config::{Config, ConfigLoader, ConfigSources, LogLevel};
pub use error::{
    ConfigError, ConfigResult, DocumentError, DocumentResult, NodePath, PathSegment,
    ValidationError, ValidationIssue, Violation,
};
pub use json::{MAX_JSON_NESTING, parse_json};
pub use length::{
    CountUnit, DEFAULT_MAX_LENGTH, LengthPolicy, LengthReport, character_count,
    character_count_in, validate_character_count,
};
pub use node::{Descendant, Document, Element, ElementKind, Mark, Marks, Text};
pub use plain_text::to_plain_text;
pub use schema::{
    DEFAULT_MAX_DEPTH, DocumentSchema, FieldPolicy, KindPolicy, Schema, SchemaOptions,
    SchemaOverrides, ValidationReport, validate,
};

/// Default upper bound on input size: 5 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;
