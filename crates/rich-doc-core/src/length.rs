//! Character counting and length limits.
//!
//! Counts are taken over the plain-text projection, never over the JSON, so
//! formatting and structure cost nothing. The default unit is UTF-16 code
//! units, matching what a browser editor reports as `text.length`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::node::Document;
use crate::plain_text::to_plain_text;

/// Default upper bound on a document's length.
pub const DEFAULT_MAX_LENGTH: usize = 10_000;

/// Unit in which length is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum CountUnit {
    /// UTF-16 code units. Characters outside the BMP count as two.
    #[default]
    Utf16,
    /// Unicode scalar values.
    Chars,
    /// UTF-8 bytes.
    Bytes,
}

impl CountUnit {
    /// Returns the unit name as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Utf16 => "utf16",
            Self::Chars => "chars",
            Self::Bytes => "bytes",
        }
    }

    /// Length of `text` in this unit.
    pub fn measure(self, text: &str) -> usize {
        match self {
            Self::Utf16 => text.encode_utf16().count(),
            Self::Chars => text.chars().count(),
            Self::Bytes => text.len(),
        }
    }
}

impl std::fmt::Display for CountUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Length of the document's plain text in UTF-16 code units.
pub fn character_count(doc: &Document) -> usize {
    character_count_in(doc, CountUnit::Utf16)
}

/// Length of the document's plain text in `unit`.
pub fn character_count_in(doc: &Document, unit: CountUnit) -> usize {
    unit.measure(&to_plain_text(doc))
}

/// Whether the document is at most `max_length` UTF-16 code units long.
///
/// ```
/// use rich_doc_core::{DEFAULT_MAX_LENGTH, Document, Element, validate_character_count};
///
/// let doc = Document::new([Element::paragraph(["Hello"])]);
/// assert!(validate_character_count(&doc, DEFAULT_MAX_LENGTH));
/// assert!(!validate_character_count(&doc, 4));
/// ```
pub fn validate_character_count(doc: &Document, max_length: usize) -> bool {
    character_count(doc) <= max_length
}

/// A length limit and the unit it is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LengthPolicy {
    /// Inclusive upper bound.
    pub max_length: usize,
    /// Unit of `max_length`.
    pub unit: CountUnit,
}

impl Default for LengthPolicy {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            unit: CountUnit::Utf16,
        }
    }
}

impl LengthPolicy {
    /// Policy with the given limit in UTF-16 code units.
    pub const fn new(max_length: usize) -> Self {
        Self {
            max_length,
            unit: CountUnit::Utf16,
        }
    }

    /// Measure in `unit` instead.
    #[must_use]
    pub const fn with_unit(mut self, unit: CountUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Measure `doc` against this policy.
    #[tracing::instrument(skip(doc), fields(max_length = self.max_length, unit = self.unit.as_str()))]
    pub fn check(&self, doc: &Document) -> LengthReport {
        let count = character_count_in(doc, self.unit);
        let within_limit = count <= self.max_length;
        tracing::debug!(count, within_limit, "measured document");
        LengthReport {
            count,
            max_length: self.max_length,
            unit: self.unit,
            within_limit,
        }
    }
}

/// Outcome of a [`LengthPolicy::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LengthReport {
    /// Measured length.
    pub count: usize,
    /// Limit in force.
    pub max_length: usize,
    /// Unit of both numbers.
    pub unit: CountUnit,
    /// Whether `count <= max_length`.
    pub within_limit: bool,
}
