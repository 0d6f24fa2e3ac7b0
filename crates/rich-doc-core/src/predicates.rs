//! Shape predicates over undecoded JSON.
//!
//! These classify a value by structure alone and never fail. They agree with
//! the schema validator: a node it accepts satisfies exactly one of
//! [`is_text`] and [`is_element`]. Once a value has been decoded, use the
//! methods on [`Descendant`](crate::Descendant) and
//! [`ElementKind`](crate::ElementKind) instead.

use serde_json::Value;

use crate::node::{CHILDREN_KEY, ElementKind, TEXT_KEY, TYPE_KEY};

/// Whether `value` is an object with a `text` key.
pub fn is_text(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.contains_key(TEXT_KEY))
}

/// Whether `value` is an object with a `type` key and an array `children`.
pub fn is_element(value: &Value) -> bool {
    value.as_object().is_some_and(|object| {
        object.contains_key(TYPE_KEY) && object.get(CHILDREN_KEY).is_some_and(Value::is_array)
    })
}

/// The closed-set kind of an element-shaped value, if it names one.
pub fn element_kind(value: &Value) -> Option<ElementKind> {
    if !is_element(value) {
        return None;
    }
    value
        .get(TYPE_KEY)
        .and_then(Value::as_str)
        .and_then(ElementKind::from_wire)
}

/// Whether `value` is an element of one of the six heading kinds.
pub fn is_heading(value: &Value) -> bool {
    element_kind(value).is_some_and(|kind| kind.is_heading())
}

/// Whether `value` is a bulleted or numbered list element.
pub fn is_list(value: &Value) -> bool {
    element_kind(value).is_some_and(|kind| kind.is_list())
}

/// Name of the JSON type of `value`, for diagnostics.
pub(crate) const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_is_detected_by_key() {
        assert!(is_text(&json!({ "text": "hi" })));
        assert!(is_text(&json!({ "text": "", "bold": true })));
        assert!(!is_text(&json!({ "type": "paragraph", "children": [] })));
    }

    #[test]
    fn element_needs_type_and_array_children() {
        assert!(is_element(&json!({ "type": "paragraph", "children": [] })));
        assert!(!is_element(&json!({ "type": "paragraph" })));
        assert!(!is_element(&json!({ "type": "paragraph", "children": "x" })));
        assert!(!is_element(&json!({ "children": [] })));
    }

    #[test]
    fn predicates_are_total_on_non_objects() {
        for value in [
            json!(null),
            json!(true),
            json!(3),
            json!("text"),
            json!([]),
        ] {
            assert!(!is_text(&value));
            assert!(!is_element(&value));
            assert!(!is_heading(&value));
            assert!(!is_list(&value));
        }
    }

    #[test]
    fn headings_and_lists() {
        for name in [
            "heading-one",
            "heading-two",
            "heading-three",
            "heading-four",
            "heading-five",
            "heading-six",
        ] {
            assert!(is_heading(&json!({ "type": name, "children": [] })), "{name}");
        }
        assert!(!is_heading(&json!({ "type": "paragraph", "children": [] })));
        assert!(is_list(&json!({ "type": "bulleted-list", "children": [] })));
        assert!(is_list(&json!({ "type": "numbered-list", "children": [] })));
        assert!(!is_list(&json!({ "type": "list-item", "children": [] })));
    }

    #[test]
    fn element_kind_narrows_known_kinds_only() {
        assert_eq!(
            element_kind(&json!({ "type": "code-block", "children": [] })),
            Some(ElementKind::CodeBlock)
        );
        assert_eq!(
            element_kind(&json!({ "type": "link", "children": [] })),
            None
        );
        assert_eq!(element_kind(&json!({ "type": 7, "children": [] })), None);
    }
}
