//! Reading JSON text.
//!
//! `serde_json` refuses input nested deeper than 128 levels, which a document
//! reaches at about 63 elements, well under [`DEFAULT_MAX_DEPTH`]. Text is
//! instead parsed without that limit on a growable stack, after a byte scan
//! has bounded its nesting to what the deepest acceptable document needs.
//! Anything between that bound and the configured `max_depth` is left to the
//! validator, which reports `depth_exceeded` with a path.
//!
//! [`DEFAULT_MAX_DEPTH`]: crate::schema::DEFAULT_MAX_DEPTH

use serde::Deserialize;
use serde_json::Value;

use crate::error::{DocumentError, DocumentResult};
use crate::schema::DEPTH_CEILING;

/// Deepest JSON nesting accepted from text.
///
/// The document array, two levels per element (object and `children` array)
/// and the innermost text object.
pub const MAX_JSON_NESTING: usize = 2 * DEPTH_CEILING + 2;

/// Parse JSON text into a [`Value`], bounded by [`MAX_JSON_NESTING`].
pub fn parse_json(input: &str) -> DocumentResult<Value> {
    if nesting_exceeds(input.as_bytes(), MAX_JSON_NESTING) {
        return Err(DocumentError::TooDeep {
            limit: MAX_JSON_NESTING,
        });
    }
    let mut de = serde_json::Deserializer::from_str(input);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Whether arrays and objects in `input` nest deeper than `limit`.
///
/// Brackets inside strings are skipped. Malformed input is left to the parser.
fn nesting_exceeds(input: &[u8], limit: usize) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for &byte in input {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    false
}
