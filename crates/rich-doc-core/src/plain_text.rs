//! Plain-text projection of a document.
//!
//! Formatting is dropped and block structure is reduced to newlines: list
//! items are separated by `\n`, top-level blocks by `\n`, and every other
//! element concatenates its children directly. The result is the basis for
//! character counting, search indexing and previews.

use crate::node::{Descendant, Document, Element};

/// Separator between top-level blocks.
pub const BLOCK_SEPARATOR: &str = "\n";

/// Separator between the items of a bulleted or numbered list.
pub const LIST_ITEM_SEPARATOR: &str = "\n";

enum Step<'a> {
    Node(&'a Descendant),
    Separator(&'static str),
}

/// Render a document as plain text.
///
/// ```
/// use rich_doc_core::{Document, Element, to_plain_text};
///
/// let doc = Document::new([
///     Element::paragraph(["First"]),
///     Element::bulleted_list([Element::list_item(["a"]), Element::list_item(["b"])]),
/// ]);
/// assert_eq!(to_plain_text(&doc), "First\na\nb");
/// ```
pub fn to_plain_text(doc: &Document) -> String {
    render(doc.nodes(), BLOCK_SEPARATOR)
}

impl Descendant {
    /// Render this node as plain text.
    pub fn to_plain_text(&self) -> String {
        render(std::slice::from_ref(self), "")
    }
}

impl Element {
    /// Render this element's children as plain text.
    pub fn to_plain_text(&self) -> String {
        render(&self.children, separator_for(self))
    }
}

impl Document {
    /// Render this document as plain text. Same as [`to_plain_text`].
    pub fn to_plain_text(&self) -> String {
        to_plain_text(self)
    }
}

const fn separator_for(element: &Element) -> &'static str {
    if element.kind.is_list() {
        LIST_ITEM_SEPARATOR
    } else {
        ""
    }
}

/// Depth-first walk with an explicit stack, so depth is bounded by heap
/// rather than the call stack.
fn render(nodes: &[Descendant], separator: &'static str) -> String {
    let mut out = String::new();
    let mut stack: Vec<Step<'_>> = Vec::new();
    push_siblings(&mut stack, nodes, separator);

    while let Some(step) = stack.pop() {
        match step {
            Step::Separator(sep) => out.push_str(sep),
            Step::Node(Descendant::Text(text)) => out.push_str(&text.text),
            Step::Node(Descendant::Element(element)) => {
                push_siblings(&mut stack, &element.children, separator_for(element));
            }
        }
    }
    out
}

/// Push `nodes` so they pop in reading order, with `separator` between them.
fn push_siblings<'a>(stack: &mut Vec<Step<'a>>, nodes: &'a [Descendant], separator: &'static str) {
    for (index, node) in nodes.iter().enumerate().rev() {
        stack.push(Step::Node(node));
        if index > 0 && !separator.is_empty() {
            stack.push(Step::Separator(separator));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ElementKind, Mark, Text};
    use crate::schema::{DOCUMENT, KindPolicy, SchemaOptions};
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Document {
        Document::from_value(&value).unwrap()
    }

    #[test]
    fn empty_paragraph_is_empty_string() {
        let doc = decode(json!([{ "type": "paragraph", "children": [{ "text": "" }] }]));
        assert_eq!(to_plain_text(&doc), "");
    }

    #[test]
    fn plain_paragraph() {
        let doc = decode(json!([{ "type": "paragraph", "children": [{ "text": "Hello world" }] }]));
        assert_eq!(to_plain_text(&doc), "Hello world");
    }

    #[test]
    fn marks_are_dropped() {
        let doc = decode(json!([{
            "type": "paragraph",
            "children": [
                { "text": "This is " },
                { "text": "bold", "bold": true },
                { "text": " text." }
            ]
        }]));
        assert_eq!(to_plain_text(&doc), "This is bold text.");
    }

    #[test]
    fn top_level_blocks_join_with_newline() {
        let doc = decode(json!([
            { "type": "paragraph", "children": [{ "text": "First" }] },
            { "type": "paragraph", "children": [{ "text": "Second" }] }
        ]));
        assert_eq!(to_plain_text(&doc), "First\nSecond");
    }

    #[test]
    fn list_items_join_with_newline() {
        let doc = decode(json!([{
            "type": "bulleted-list",
            "children": [
                { "type": "list-item", "children": [{ "text": "Item 1" }] },
                { "type": "list-item", "children": [{ "text": "Item 2" }] }
            ]
        }]));
        assert_eq!(to_plain_text(&doc), "Item 1\nItem 2");
    }

    #[test]
    fn headings_and_code_blocks_concatenate() {
        let doc = Document::new([
            Element::heading(1, ["Ti", "tle"]).unwrap(),
            Element::code_block(["let x", " = 1;"]),
        ]);
        assert_eq!(to_plain_text(&doc), "Title\nlet x = 1;");
    }

    #[test]
    fn empty_document_and_empty_list() {
        assert_eq!(to_plain_text(&Document::default()), "");
        let doc = Document::new([Element::numbered_list(Vec::<Descendant>::new())]);
        assert_eq!(to_plain_text(&doc), "");
    }

    #[test]
    fn nested_lists_keep_reading_order() {
        let doc = Document::new([Element::numbered_list([
            Element::list_item(["one"]),
            Element::list_item([
                Descendant::from("two"),
                Element::bulleted_list([Element::list_item(["a"]), Element::list_item(["b"])])
                    .into(),
            ]),
            Element::list_item(["three"]),
        ])]);
        assert_eq!(to_plain_text(&doc), "one\ntwoa\nb\nthree");
    }

    #[test]
    fn link_shows_display_text_only() {
        let value = json!([{
            "type": "paragraph",
            "children": [
                { "text": "See " },
                { "type": "link", "url": "https://example.com", "children": [{ "text": "the docs" }] },
                { "text": "." }
            ]
        }]);
        let options = SchemaOptions::default().with_unknown_kinds(KindPolicy::Preserve);
        let doc = DOCUMENT.parse(&value, &options).unwrap();
        let text = to_plain_text(&doc);
        assert_eq!(text, "See the docs.");
        assert!(!text.contains("example.com"));
    }

    #[test]
    fn unknown_kind_concatenates_children() {
        let element = Element::new(ElementKind::Other("callout".into()), ["a", "b"]);
        assert_eq!(element.to_plain_text(), "ab");
    }

    #[test]
    fn node_level_rendering() {
        let node = Descendant::from(Text::new("x").with_mark(Mark::Italic));
        assert_eq!(node.to_plain_text(), "x");

        let list = Element::bulleted_list([Element::list_item(["a"]), Element::list_item(["b"])]);
        assert_eq!(list.to_plain_text(), "a\nb");
        assert_eq!(Descendant::from(list).to_plain_text(), "a\nb");
    }

    #[test]
    fn rendering_is_deterministic() {
        let doc = Document::new([Element::paragraph(["same"]), Element::paragraph(["again"])]);
        assert_eq!(to_plain_text(&doc), to_plain_text(&doc));
        assert_eq!(doc.to_plain_text(), "same\nagain");
    }

    #[test]
    fn very_deep_tree_does_not_overflow() {
        let mut node = Element::list_item(["deep"]);
        for _ in 0..100_000 {
            node = Element::list_item([node]);
        }
        let doc = Document::new([node]);
        assert_eq!(to_plain_text(&doc), "deep");
        drop(doc);
    }

    #[test]
    fn very_deep_tree_drops_on_a_small_stack() {
        let handle = std::thread::Builder::new()
            .stack_size(64 * 1024)
            .spawn(|| {
                let mut node = Element::bulleted_list([Element::list_item(["leaf"])]);
                for _ in 0..50_000 {
                    node = Element::list_item([node, Element::paragraph(["sibling"])]);
                }
                drop(Document::new([node]));
            })
            .unwrap();
        handle.join().unwrap();
    }
}
