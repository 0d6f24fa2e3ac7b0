//! The rich-text node model.
//!
//! A [`Document`] is an ordered list of [`Descendant`]s. A descendant is either
//! a [`Text`] leaf carrying a string and optional formatting [`Marks`], or an
//! [`Element`] that owns an ordered list of further descendants.
//!
//! The serde representation matches the JSON the editor produces:
//!
//! ```json
//! [
//!   { "type": "heading-two", "children": [{ "text": "Title" }] },
//!   { "type": "paragraph", "children": [{ "text": "Some " }, { "text": "bold", "bold": true }] }
//! ]
//! ```
//!
//! Serializing is direct. Deserializing a [`Document`] always goes through the
//! schema validator in [`crate::schema`], so a value of this type is known to be
//! well formed.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::schema::{DOCUMENT, SchemaOptions};

/// Key holding a text leaf's content.
pub(crate) const TEXT_KEY: &str = "text";
/// Key holding an element's discriminator.
pub(crate) const TYPE_KEY: &str = "type";
/// Key holding an element's children.
pub(crate) const CHILDREN_KEY: &str = "children";

/// A formatting flag that can be applied to a text leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mark {
    /// Bold weight.
    Bold,
    /// Italic style.
    Italic,
    /// Underline decoration.
    Underline,
    /// Strikethrough decoration.
    Strikethrough,
    /// Inline code.
    Code,
}

impl Mark {
    /// Every mark, in wire order.
    pub const ALL: [Self; 5] = [
        Self::Bold,
        Self::Italic,
        Self::Underline,
        Self::Strikethrough,
        Self::Code,
    ];

    /// Returns the JSON key for this mark.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strikethrough => "strikethrough",
            Self::Code => "code",
        }
    }

    /// Looks up a mark by its JSON key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mark| mark.as_str() == key)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The marks present on a text leaf.
///
/// Each mark is tri-state: absent, explicitly `false`, or `true`. Only `true`
/// means the formatting applies; an explicit `false` is kept so that a decoded
/// leaf serializes back to the same JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Marks([Option<bool>; Mark::ALL.len()]);

impl Marks {
    /// No marks present.
    pub const fn none() -> Self {
        Self([None; Mark::ALL.len()])
    }

    /// Returns the stored value for `mark`, if present.
    pub const fn get(&self, mark: Mark) -> Option<bool> {
        self.0[mark.index()]
    }

    /// Whether `mark` is applied.
    pub const fn has(&self, mark: Mark) -> bool {
        matches!(self.get(mark), Some(true))
    }

    /// Store a value for `mark`.
    pub const fn set(&mut self, mark: Mark, value: bool) {
        self.0[mark.index()] = Some(value);
    }

    /// Remove `mark` entirely.
    pub const fn clear(&mut self, mark: Mark) {
        self.0[mark.index()] = None;
    }

    /// Whether no mark is present at all.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Iterate over present marks and their values, in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (Mark, bool)> + '_ {
        Mark::ALL
            .into_iter()
            .filter_map(|mark| self.get(mark).map(|value| (mark, value)))
    }
}

/// A text leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Text {
    /// The literal content.
    pub text: String,
    /// Formatting applied to the content.
    pub marks: Marks,
}

impl Text {
    /// Create an unformatted leaf.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::none(),
        }
    }

    /// Apply `mark` to this leaf.
    #[must_use]
    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.set(mark, true);
        self
    }

    /// Whether `mark` is applied to this leaf.
    pub const fn has_mark(&self, mark: Mark) -> bool {
        self.marks.has(mark)
    }
}

impl Serialize for Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present = self.marks.iter().count();
        let mut map = serializer.serialize_map(Some(1 + present))?;
        map.serialize_entry(TEXT_KEY, &self.text)?;
        for (mark, value) in self.marks.iter() {
            map.serialize_entry(mark.as_str(), &value)?;
        }
        map.end()
    }
}

/// The kind of a block element.
///
/// The set is closed: [`ElementKind::from_wire`] only recognises the eleven
/// kinds the editor emits. [`ElementKind::Other`] is produced solely when a
/// document is decoded with [`KindPolicy::Preserve`](crate::schema::KindPolicy).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `paragraph`
    Paragraph,
    /// `heading-one`
    HeadingOne,
    /// `heading-two`
    HeadingTwo,
    /// `heading-three`
    HeadingThree,
    /// `heading-four`
    HeadingFour,
    /// `heading-five`
    HeadingFive,
    /// `heading-six`
    HeadingSix,
    /// `bulleted-list`
    BulletedList,
    /// `numbered-list`
    NumberedList,
    /// `list-item`
    ListItem,
    /// `code-block`
    CodeBlock,
    /// A structurally valid element whose kind is not in the closed set.
    Other(Box<str>),
}

impl ElementKind {
    /// The closed set of kinds, in wire order.
    pub const KNOWN: [Self; 11] = [
        Self::Paragraph,
        Self::HeadingOne,
        Self::HeadingTwo,
        Self::HeadingThree,
        Self::HeadingFour,
        Self::HeadingFive,
        Self::HeadingSix,
        Self::BulletedList,
        Self::NumberedList,
        Self::ListItem,
        Self::CodeBlock,
    ];

    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Paragraph => "paragraph",
            Self::HeadingOne => "heading-one",
            Self::HeadingTwo => "heading-two",
            Self::HeadingThree => "heading-three",
            Self::HeadingFour => "heading-four",
            Self::HeadingFive => "heading-five",
            Self::HeadingSix => "heading-six",
            Self::BulletedList => "bulleted-list",
            Self::NumberedList => "numbered-list",
            Self::ListItem => "list-item",
            Self::CodeBlock => "code-block",
            Self::Other(name) => name,
        }
    }

    /// Looks up a kind from the closed set by its wire name.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::KNOWN.into_iter().find(|kind| kind.as_str() == name)
    }

    /// The heading kind for `level` (1 through 6).
    pub const fn heading(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::HeadingOne),
            2 => Some(Self::HeadingTwo),
            3 => Some(Self::HeadingThree),
            4 => Some(Self::HeadingFour),
            5 => Some(Self::HeadingFive),
            6 => Some(Self::HeadingSix),
            _ => None,
        }
    }

    /// The heading level (1 through 6), if this is a heading.
    pub const fn heading_level(&self) -> Option<u8> {
        match self {
            Self::HeadingOne => Some(1),
            Self::HeadingTwo => Some(2),
            Self::HeadingThree => Some(3),
            Self::HeadingFour => Some(4),
            Self::HeadingFive => Some(5),
            Self::HeadingSix => Some(6),
            _ => None,
        }
    }

    /// Whether this is `paragraph`.
    pub const fn is_paragraph(&self) -> bool {
        matches!(self, Self::Paragraph)
    }

    /// Whether this is one of the six heading kinds.
    pub const fn is_heading(&self) -> bool {
        self.heading_level().is_some()
    }

    /// Whether this is a bulleted or numbered list.
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::BulletedList | Self::NumberedList)
    }

    /// Whether this is `list-item`.
    pub const fn is_list_item(&self) -> bool {
        matches!(self, Self::ListItem)
    }

    /// Whether this kind belongs to the closed set.
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ElementKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A block element and its ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    /// What kind of block this is.
    pub kind: ElementKind,
    /// Child nodes in reading order.
    pub children: Vec<Descendant>,
}

impl Element {
    /// Create an element of `kind`.
    pub fn new<I>(kind: ElementKind, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Descendant>,
    {
        Self {
            kind,
            children: children.into_iter().map(Into::into).collect(),
        }
    }

    /// A `paragraph`.
    pub fn paragraph<I>(children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Descendant>,
    {
        Self::new(ElementKind::Paragraph, children)
    }

    /// A heading at `level`, or `None` if the level is outside 1..=6.
    pub fn heading<I>(level: u8, children: I) -> Option<Self>
    where
        I: IntoIterator,
        I::Item: Into<Descendant>,
    {
        ElementKind::heading(level).map(|kind| Self::new(kind, children))
    }

    /// A `bulleted-list`.
    pub fn bulleted_list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Descendant>,
    {
        Self::new(ElementKind::BulletedList, items)
    }

    /// A `numbered-list`.
    pub fn numbered_list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Descendant>,
    {
        Self::new(ElementKind::NumberedList, items)
    }

    /// A `list-item`.
    pub fn list_item<I>(children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Descendant>,
    {
        Self::new(ElementKind::ListItem, children)
    }

    /// A `code-block`.
    pub fn code_block<I>(children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Descendant>,
    {
        Self::new(ElementKind::CodeBlock, children)
    }

    /// Whether this is one of the six heading kinds.
    pub const fn is_heading(&self) -> bool {
        self.kind.is_heading()
    }

    /// Whether this is a bulleted or numbered list.
    pub const fn is_list(&self) -> bool {
        self.kind.is_list()
    }

    /// Whether this is a `paragraph`.
    pub const fn is_paragraph(&self) -> bool {
        self.kind.is_paragraph()
    }
}

/// Tears the subtree down through a heap worklist so that arbitrarily deep
/// trees drop without recursing.
impl Drop for Element {
    fn drop(&mut self) {
        if self.children.iter().all(Descendant::is_text) {
            return;
        }
        let mut pending = std::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let Descendant::Element(mut element) = node {
                pending.append(&mut element.children);
            }
        }
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(TYPE_KEY, &self.kind)?;
        map.serialize_entry(CHILDREN_KEY, &self.children)?;
        map.end()
    }
}

/// Anything that can appear as a child: a text leaf or an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Descendant {
    /// A text leaf.
    Text(Text),
    /// A block element.
    Element(Element),
}

impl Descendant {
    /// Whether this is a text leaf.
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Whether this is an element.
    pub const fn is_element(&self) -> bool {
        matches!(self, Self::Element(_))
    }

    /// Narrow to a text leaf.
    pub const fn as_text(&self) -> Option<&Text> {
        match self {
            Self::Text(text) => Some(text),
            Self::Element(_) => None,
        }
    }

    /// Narrow to an element.
    pub const fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }
}

impl From<Text> for Descendant {
    fn from(text: Text) -> Self {
        Self::Text(text)
    }
}

impl From<Element> for Descendant {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for Descendant {
    fn from(text: &str) -> Self {
        Self::Text(Text::new(text))
    }
}

/// A rich-text document: the ordered top-level nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Document(Vec<Descendant>);

impl Document {
    /// Create a document from top-level nodes.
    pub fn new<I>(nodes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Descendant>,
    {
        Self(nodes.into_iter().map(Into::into).collect())
    }

    /// The top-level nodes.
    pub fn nodes(&self) -> &[Descendant] {
        &self.0
    }

    /// Consume the document, returning its top-level nodes.
    pub fn into_nodes(self) -> Vec<Descendant> {
        self.0
    }

    /// Number of top-level nodes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the document has no top-level nodes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a top-level node.
    pub fn push(&mut self, node: impl Into<Descendant>) {
        self.0.push(node.into());
    }

    /// Iterate over the top-level nodes.
    pub fn iter(&self) -> std::slice::Iter<'_, Descendant> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Descendant;
    type IntoIter = std::slice::Iter<'a, Descendant>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Descendant> for Document {
    fn from_iter<T: IntoIterator<Item = Descendant>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        DOCUMENT
            .parse(&value, &SchemaOptions::default())
            .map_err(serde::de::Error::custom)
    }
}
