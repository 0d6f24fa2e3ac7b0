//! Schema validation for untrusted document JSON.
//!
//! The grammar is mutually recursive: an element's `children` are
//! descendants, and a descendant is a text leaf or an element. Schemas are
//! plain data in statics; the cycle is broken by [`Schema::Lazy`], which holds
//! a function that resolves to the descendant union only when the validator
//! reaches a child position.
//!
//! Validation and decoding happen in one pass. [`DOCUMENT`] turns a
//! `serde_json::Value` into a typed [`Document`] or returns every problem it
//! found, each with a JSON-pointer path.
//!
//! ```
//! use rich_doc_core::schema::{DOCUMENT, SchemaOptions};
//! use serde_json::json;
//!
//! let value = json!([{ "type": "paragraph", "children": [{ "text": "Hello" }] }]);
//! let doc = DOCUMENT.parse(&value, &SchemaOptions::default()).unwrap();
//! assert_eq!(doc.len(), 1);
//!
//! let err = DOCUMENT
//!     .parse(&json!([{ "type": "paragraph" }]), &SchemaOptions::default())
//!     .unwrap_err();
//! assert!(err.has_code("missing_children"));
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{
    DocumentResult, NodePath, PathSegment, ValidationError, ValidationIssue, Violation,
};
use crate::node::{
    CHILDREN_KEY, Descendant, Document, Element, ElementKind, Mark, Marks, TEXT_KEY, TYPE_KEY,
    Text,
};
use crate::json::parse_json;
use crate::predicates::json_type;

/// Default limit on element nesting.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Hard upper bound on element nesting. Configured limits above this are clamped.
pub const DEPTH_CEILING: usize = 512;

/// What to do with object keys outside the node model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPolicy {
    /// Accept and drop them.
    #[default]
    Ignore,
    /// Reject the node.
    Reject,
}

impl FieldPolicy {
    /// Returns the policy name as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Reject => "reject",
        }
    }
}

/// What to do with element `type` values outside the closed set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KindPolicy {
    /// Reject the node.
    #[default]
    Reject,
    /// Decode it as [`ElementKind::Other`], keeping only `children`.
    Preserve,
}

impl KindPolicy {
    /// Returns the policy name as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Preserve => "preserve",
        }
    }
}

/// Knobs for a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Handling of unrecognised keys.
    pub unknown_fields: FieldPolicy,
    /// Handling of unrecognised element kinds.
    pub unknown_kinds: KindPolicy,
    /// Require `list-item` to sit directly inside a list and forbid bare
    /// top-level text.
    pub strict_nesting: bool,
    /// Maximum element nesting, clamped to [`DEPTH_CEILING`].
    pub max_depth: usize,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            unknown_fields: FieldPolicy::Ignore,
            unknown_kinds: KindPolicy::Reject,
            strict_nesting: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl SchemaOptions {
    /// Reject unknown fields and enforce nesting rules.
    pub fn strict() -> Self {
        Self {
            unknown_fields: FieldPolicy::Reject,
            strict_nesting: true,
            ..Self::default()
        }
    }

    /// Set the unknown field policy.
    #[must_use]
    pub const fn with_unknown_fields(mut self, policy: FieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }

    /// Set the unknown kind policy.
    #[must_use]
    pub const fn with_unknown_kinds(mut self, policy: KindPolicy) -> Self {
        self.unknown_kinds = policy;
        self
    }

    /// Enable or disable nesting rules.
    #[must_use]
    pub const fn with_strict_nesting(mut self, strict: bool) -> Self {
        self.strict_nesting = strict;
        self
    }

    /// Set the nesting limit.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The nesting limit actually enforced.
    pub fn effective_max_depth(&self) -> usize {
        self.max_depth.min(DEPTH_CEILING)
    }

    /// Tighten or relax these options with per-request overrides.
    ///
    /// Unset overrides leave the current value alone.
    #[must_use]
    pub const fn with_overrides(mut self, overrides: &SchemaOverrides) -> Self {
        if overrides.strict_fields {
            self.unknown_fields = FieldPolicy::Reject;
        }
        if overrides.strict_nesting {
            self.strict_nesting = true;
        }
        if overrides.preserve_unknown_kinds {
            self.unknown_kinds = KindPolicy::Preserve;
        }
        if let Some(depth) = overrides.max_depth {
            self.max_depth = depth;
        }
        self
    }
}

/// Per-request adjustments on top of configured [`SchemaOptions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct SchemaOverrides {
    /// Reject keys outside the node model.
    #[serde(default)]
    pub strict_fields: bool,
    /// Require list items inside lists and forbid bare top-level text.
    #[serde(default)]
    pub strict_nesting: bool,
    /// Accept unknown element types, keeping only their children.
    #[serde(default)]
    pub preserve_unknown_kinds: bool,
    /// Maximum element nesting depth.
    #[serde(default)]
    pub max_depth: Option<usize>,
}

/// A node schema.
#[derive(Debug)]
pub enum Schema {
    /// A text leaf: `text` string plus optional boolean marks.
    Text,
    /// An element whose `type` equals `kind` and whose `children` each match
    /// `children`.
    Element {
        /// The required discriminator.
        kind: ElementKind,
        /// Schema for every child.
        children: &'static Schema,
    },
    /// Any one of the alternatives, chosen by the node's shape.
    AnyOf(&'static [&'static Schema]),
    /// A deferred reference, resolved when input is walked.
    Lazy(fn() -> &'static Schema),
}

/// `{ text, bold?, italic?, underline?, strikethrough?, code? }`
pub static TEXT: Schema = Schema::Text;
/// `paragraph`
pub static PARAGRAPH: Schema = element(ElementKind::Paragraph);
/// `heading-one`
pub static HEADING_ONE: Schema = element(ElementKind::HeadingOne);
/// `heading-two`
pub static HEADING_TWO: Schema = element(ElementKind::HeadingTwo);
/// `heading-three`
pub static HEADING_THREE: Schema = element(ElementKind::HeadingThree);
/// `heading-four`
pub static HEADING_FOUR: Schema = element(ElementKind::HeadingFour);
/// `heading-five`
pub static HEADING_FIVE: Schema = element(ElementKind::HeadingFive);
/// `heading-six`
pub static HEADING_SIX: Schema = element(ElementKind::HeadingSix);
/// `bulleted-list`
pub static BULLETED_LIST: Schema = element(ElementKind::BulletedList);
/// `numbered-list`
pub static NUMBERED_LIST: Schema = element(ElementKind::NumberedList);
/// `list-item`
pub static LIST_ITEM: Schema = element(ElementKind::ListItem);
/// `code-block`
pub static CODE_BLOCK: Schema = element(ElementKind::CodeBlock);

static HEADINGS: [&Schema; 6] = [
    &HEADING_ONE,
    &HEADING_TWO,
    &HEADING_THREE,
    &HEADING_FOUR,
    &HEADING_FIVE,
    &HEADING_SIX,
];

/// Any of the six headings.
pub static HEADING: Schema = Schema::AnyOf(&HEADINGS);

static ELEMENTS: [&Schema; 11] = [
    &PARAGRAPH,
    &HEADING_ONE,
    &HEADING_TWO,
    &HEADING_THREE,
    &HEADING_FOUR,
    &HEADING_FIVE,
    &HEADING_SIX,
    &BULLETED_LIST,
    &NUMBERED_LIST,
    &LIST_ITEM,
    &CODE_BLOCK,
];

/// Any element kind.
pub static ELEMENT: Schema = Schema::AnyOf(&ELEMENTS);

static NODES: [&Schema; 2] = [&TEXT, &ELEMENT];
static DESCENDANT_UNION: Schema = Schema::AnyOf(&NODES);

/// A text leaf or any element. Every element's children refer back here.
pub static DESCENDANT: Schema = Schema::Lazy(descendant_union);

fn descendant_union() -> &'static Schema {
    &DESCENDANT_UNION
}

/// An array of descendants.
pub static DOCUMENT: DocumentSchema = DocumentSchema {
    nodes: &DESCENDANT,
};

const fn element(kind: ElementKind) -> Schema {
    Schema::Element {
        kind,
        children: &DESCENDANT,
    }
}

impl Schema {
    /// Validate and decode a single node.
    ///
    /// The node is checked on its own, so nesting rules that depend on a
    /// parent do not apply.
    pub fn parse(
        &self,
        value: &Value,
        options: &SchemaOptions,
    ) -> Result<Descendant, ValidationError> {
        let mut walker = Walker::new(options);
        let decoded = walker.node(self, value, Parent::Detached, 0);
        walker.finish(decoded)
    }

    /// Whether `value` passes [`Schema::parse`].
    pub fn is_valid(&self, value: &Value, options: &SchemaOptions) -> bool {
        self.parse(value, options).is_ok()
    }

    /// Follow lazy references to a concrete schema.
    pub fn resolve(&self) -> &Self {
        let mut schema = self;
        while let Self::Lazy(next) = schema {
            schema = next();
        }
        schema
    }

    /// Whether a text leaf is acceptable here.
    pub fn accepts_text(&self) -> bool {
        match self.resolve() {
            Self::Text => true,
            Self::Element { .. } => false,
            Self::AnyOf(alternatives) => alternatives.iter().any(|alt| alt.accepts_text()),
            Self::Lazy(_) => false,
        }
    }

    /// The element alternative for `name`, with its children schema.
    fn element_alternative(&self, name: &str) -> Option<(&ElementKind, &'static Schema)> {
        match self.resolve() {
            Self::Element { kind, children } if kind.as_str() == name => Some((kind, *children)),
            Self::AnyOf(alternatives) => alternatives
                .iter()
                .find_map(|alt| alt.element_alternative(name)),
            _ => None,
        }
    }

    /// Whether every kind in the closed set is acceptable here.
    fn accepts_any_element(&self) -> bool {
        ElementKind::KNOWN
            .iter()
            .all(|kind| self.element_alternative(kind.as_str()).is_some())
    }
}

/// Schema for a whole document: an array of nodes.
#[derive(Debug)]
pub struct DocumentSchema {
    nodes: &'static Schema,
}

impl DocumentSchema {
    /// Schema applied to each top-level node.
    pub const fn nodes(&self) -> &'static Schema {
        self.nodes
    }

    /// Validate and decode a document.
    #[tracing::instrument(name = "validate_document", skip_all, fields(strict_nesting = options.strict_nesting))]
    pub fn parse(&self, value: &Value, options: &SchemaOptions) -> Result<Document, ValidationError> {
        let mut walker = Walker::new(options);
        let decoded = match value {
            Value::Array(items) => {
                let mut nodes = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    walker.path.push(PathSegment::Index(index));
                    if let Some(node) = walker.node(self.nodes, item, Parent::Root, 0) {
                        nodes.push(node);
                    }
                    walker.path.pop();
                }
                Some(Document::new(nodes))
            }
            other => {
                walker.report(Violation::ExpectedArray {
                    found: json_type(other),
                });
                None
            }
        };

        let result = walker.finish(decoded);
        match &result {
            Ok(doc) => tracing::debug!(nodes = doc.len(), "document accepted"),
            Err(err) => tracing::debug!(issues = err.issues().len(), "document rejected"),
        }
        result
    }

    /// Whether `value` passes [`DocumentSchema::parse`].
    pub fn is_valid(&self, value: &Value, options: &SchemaOptions) -> bool {
        self.parse(value, options).is_ok()
    }
}

impl Document {
    /// Decode a document with default options.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        DOCUMENT.parse(value, &SchemaOptions::default())
    }

    /// Decode a document with the given options.
    pub fn from_value_with(value: &Value, options: &SchemaOptions) -> Result<Self, ValidationError> {
        DOCUMENT.parse(value, options)
    }

    /// Parse JSON text and decode it as a document.
    pub fn from_json_str(input: &str, options: &SchemaOptions) -> DocumentResult<Self> {
        let value = parse_json(input)?;
        Ok(DOCUMENT.parse(&value, options)?)
    }
}

/// One issue in a [`ValidationReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IssueReport {
    /// JSON pointer to the offending value (empty for the root).
    pub path: String,
    /// Stable machine-readable code.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

impl From<&ValidationIssue> for IssueReport {
    fn from(issue: &ValidationIssue) -> Self {
        Self {
            path: issue.path.to_string(),
            code: issue.violation.code().to_string(),
            message: issue.violation.to_string(),
        }
    }
}

/// Result of validating a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReport {
    /// Whether the document is valid.
    pub valid: bool,
    /// Every issue found (empty when valid).
    pub issues: Vec<IssueReport>,
}

impl From<&ValidationError> for ValidationReport {
    fn from(err: &ValidationError) -> Self {
        Self {
            valid: false,
            issues: err.issues().iter().map(IssueReport::from).collect(),
        }
    }
}

/// Validate `value` as a document and summarise the outcome.
pub fn validate(value: &Value, options: &SchemaOptions) -> ValidationReport {
    match DOCUMENT.parse(value, options) {
        Ok(_) => ValidationReport {
            valid: true,
            issues: Vec::new(),
        },
        Err(err) => ValidationReport::from(&err),
    }
}

#[derive(Debug, Clone, Copy)]
enum Parent<'a> {
    /// Top level of a document.
    Root,
    /// A node validated on its own.
    Detached,
    Element(&'a ElementKind),
}

struct Walker<'o> {
    options: &'o SchemaOptions,
    max_depth: usize,
    path: NodePath,
    issues: Vec<ValidationIssue>,
}

impl<'o> Walker<'o> {
    fn new(options: &'o SchemaOptions) -> Self {
        Self {
            options,
            max_depth: options.effective_max_depth(),
            path: NodePath::root(),
            issues: Vec::new(),
        }
    }

    fn report(&mut self, violation: Violation) {
        self.issues.push(ValidationIssue {
            path: self.path.clone(),
            violation,
        });
    }

    fn report_at(&mut self, key: &str, violation: Violation) {
        self.issues.push(ValidationIssue {
            path: self.path.child(PathSegment::Key(key.to_string())),
            violation,
        });
    }

    fn finish<T>(self, decoded: Option<T>) -> Result<T, ValidationError> {
        match decoded {
            Some(value) if self.issues.is_empty() => Ok(value),
            _ => Err(ValidationError::new(self.issues)),
        }
    }

    fn node(
        &mut self,
        schema: &Schema,
        value: &Value,
        parent: Parent<'_>,
        depth: usize,
    ) -> Option<Descendant> {
        match schema {
            Schema::Lazy(resolve) => self.node(resolve(), value, parent, depth),
            Schema::Text => {
                let object = self.object(value)?;
                self.text(object, parent).map(Descendant::Text)
            }
            Schema::Element { kind, children } => {
                let object = self.object(value)?;
                self.element(kind, children, object, parent, depth)
                    .map(Descendant::Element)
            }
            Schema::AnyOf(_) => self.any_of(schema, value, parent, depth),
        }
    }

    fn object<'v>(&mut self, value: &'v Value) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(object) => Some(object),
            other => {
                self.report(Violation::ExpectedObject {
                    found: json_type(other),
                });
                None
            }
        }
    }

    /// Dispatch on the node's shape to the single matching alternative.
    fn any_of(
        &mut self,
        schema: &Schema,
        value: &Value,
        parent: Parent<'_>,
        depth: usize,
    ) -> Option<Descendant> {
        let object = self.object(value)?;

        if object.contains_key(TEXT_KEY) {
            if schema.accepts_text() {
                return self.text(object, parent).map(Descendant::Text);
            }
            self.report(Violation::UnexpectedText);
            return None;
        }

        match object.get(TYPE_KEY) {
            Some(Value::String(name)) => {
                if let Some((kind, children)) = schema.element_alternative(name) {
                    return self
                        .element(kind, children, object, parent, depth)
                        .map(Descendant::Element);
                }
                if ElementKind::from_wire(name).is_some() {
                    self.report_at(TYPE_KEY, Violation::UnexpectedKind(name.clone()));
                    None
                } else if self.options.unknown_kinds == KindPolicy::Preserve
                    && schema.accepts_any_element()
                {
                    let kind = ElementKind::Other(name.as_str().into());
                    self.element(&kind, &DESCENDANT, object, parent, depth)
                        .map(Descendant::Element)
                } else {
                    self.report_at(TYPE_KEY, Violation::UnknownKind(name.clone()));
                    None
                }
            }
            Some(other) => {
                self.report_at(
                    TYPE_KEY,
                    Violation::KindNotString {
                        found: json_type(other),
                    },
                );
                None
            }
            None if object.contains_key(CHILDREN_KEY) => {
                self.report(Violation::MissingKind);
                None
            }
            None => {
                self.report(Violation::UnrecognizedNode);
                None
            }
        }
    }

    fn text(&mut self, object: &Map<String, Value>, parent: Parent<'_>) -> Option<Text> {
        let before = self.issues.len();

        if object.contains_key(TYPE_KEY) && object.get(CHILDREN_KEY).is_some_and(Value::is_array) {
            self.report(Violation::AmbiguousNode);
        }

        let text = match object.get(TEXT_KEY) {
            Some(Value::String(text)) => text.clone(),
            Some(other) => {
                self.report_at(
                    TEXT_KEY,
                    Violation::TextNotString {
                        found: json_type(other),
                    },
                );
                String::new()
            }
            None => {
                self.report(Violation::MissingText);
                String::new()
            }
        };

        let mut marks = Marks::none();
        for (key, value) in object {
            if key == TEXT_KEY {
                continue;
            }
            match (Mark::from_key(key), value) {
                (Some(mark), Value::Bool(applied)) => marks.set(mark, *applied),
                (Some(mark), other) => self.report_at(
                    key,
                    Violation::MarkNotBoolean {
                        mark,
                        found: json_type(other),
                    },
                ),
                (None, _) if self.options.unknown_fields == FieldPolicy::Reject => {
                    self.report_at(key, Violation::UnknownField(key.clone()));
                }
                (None, _) => {}
            }
        }

        if self.options.strict_nesting && matches!(parent, Parent::Root) {
            self.report(Violation::TopLevelText);
        }

        (self.issues.len() == before).then(|| Text { text, marks })
    }

    fn element(
        &mut self,
        kind: &ElementKind,
        children_schema: &Schema,
        object: &Map<String, Value>,
        parent: Parent<'_>,
        depth: usize,
    ) -> Option<Element> {
        let before = self.issues.len();

        if object.contains_key(TEXT_KEY) {
            self.report(Violation::AmbiguousNode);
        }

        match object.get(TYPE_KEY) {
            Some(Value::String(name)) if name == kind.as_str() => {}
            Some(Value::String(name)) if ElementKind::from_wire(name).is_some() => {
                self.report_at(TYPE_KEY, Violation::UnexpectedKind(name.clone()));
            }
            Some(Value::String(name)) => {
                self.report_at(TYPE_KEY, Violation::UnknownKind(name.clone()));
            }
            Some(other) => self.report_at(
                TYPE_KEY,
                Violation::KindNotString {
                    found: json_type(other),
                },
            ),
            None => self.report(Violation::MissingKind),
        }

        if self.options.strict_nesting && kind.is_list_item() {
            let inside_list = match parent {
                Parent::Element(parent_kind) => parent_kind.is_list(),
                Parent::Detached => true,
                Parent::Root => false,
            };
            if !inside_list {
                self.report(Violation::MisplacedListItem);
            }
        }

        if self.options.unknown_fields == FieldPolicy::Reject {
            for key in object.keys() {
                if key != TYPE_KEY && key != CHILDREN_KEY && key != TEXT_KEY {
                    self.report_at(key, Violation::UnknownField(key.clone()));
                }
            }
        }

        let depth = depth + 1;
        if depth > self.max_depth {
            self.report(Violation::DepthExceeded {
                max: self.max_depth,
            });
            return None;
        }

        let children = match object.get(CHILDREN_KEY) {
            Some(Value::Array(items)) => {
                self.path.push(PathSegment::Key(CHILDREN_KEY.to_string()));
                let mut decoded = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    self.path.push(PathSegment::Index(index));
                    if let Some(child) =
                        self.node(children_schema, item, Parent::Element(kind), depth)
                    {
                        decoded.push(child);
                    }
                    self.path.pop();
                }
                self.path.pop();
                decoded
            }
            Some(other) => {
                self.report_at(
                    CHILDREN_KEY,
                    Violation::ChildrenNotArray {
                        found: json_type(other),
                    },
                );
                Vec::new()
            }
            None => {
                self.report(Violation::MissingChildren);
                Vec::new()
            }
        };

        (self.issues.len() == before).then(|| Element {
            kind: kind.clone(),
            children,
        })
    }
}
