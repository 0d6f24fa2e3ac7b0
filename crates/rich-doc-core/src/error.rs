//! Error types for rich-doc-core.

use std::fmt;

use thiserror::Error;

use crate::node::Mark;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// One step in a [`NodePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Position in an array.
    Index(usize),
    /// Key in an object.
    Key(String),
}

/// Location of a value inside the input, rendered as a JSON pointer
/// (`/0/children/2/bold`). The empty path is the input root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<PathSegment>);

impl NodePath {
    /// The input root.
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Whether this is the input root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The segments from the root down.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub(crate) fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }

    /// A copy of this path extended by `segment`.
    #[must_use]
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            match segment {
                PathSegment::Index(i) => write!(f, "/{i}")?,
                // RFC 6901 escaping
                PathSegment::Key(key) => write!(f, "/{}", key.replace('~', "~0").replace('/', "~1"))?,
            }
        }
        Ok(())
    }
}

/// Why a value was rejected by the schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The document root is not an array.
    #[error("expected an array of nodes, found {found}")]
    ExpectedArray {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// A node is not a JSON object.
    #[error("expected a node object, found {found}")]
    ExpectedObject {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// An object has neither a `text` nor a `type` key.
    #[error("object is neither a text node nor an element")]
    UnrecognizedNode,

    /// An object has both a `text` key and an element shape.
    #[error("node has both `text` and `type`/`children`")]
    AmbiguousNode,

    /// A text node is missing `text`.
    #[error("text node is missing `text`")]
    MissingText,

    /// `text` is not a string.
    #[error("`text` must be a string, found {found}")]
    TextNotString {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// A mark is present but not a boolean.
    #[error("mark `{mark}` must be a boolean, found {found}")]
    MarkNotBoolean {
        /// The offending mark.
        mark: Mark,
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// A text node appeared where only elements are accepted.
    #[error("text node is not allowed here")]
    UnexpectedText,

    /// An element is missing `type`.
    #[error("element is missing `type`")]
    MissingKind,

    /// `type` is not a string.
    #[error("`type` must be a string, found {found}")]
    KindNotString {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// `type` names no known element kind.
    #[error("unknown element type `{0}`")]
    UnknownKind(String),

    /// `type` is a known kind but not one this position accepts.
    #[error("element type `{0}` is not allowed here")]
    UnexpectedKind(String),

    /// An element is missing `children`.
    #[error("element is missing `children`")]
    MissingChildren,

    /// `children` is not an array.
    #[error("`children` must be an array, found {found}")]
    ChildrenNotArray {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// A key outside the node model, rejected under strict field policy.
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// Elements are nested deeper than the configured limit.
    #[error("elements nested deeper than {max} levels")]
    DepthExceeded {
        /// The limit in force.
        max: usize,
    },

    /// A `list-item` outside a list, rejected under strict nesting.
    #[error("`list-item` must be a direct child of a list")]
    MisplacedListItem,

    /// A bare text node at the document root, rejected under strict nesting.
    #[error("top-level text must be wrapped in a block element")]
    TopLevelText,
}

impl Violation {
    /// Stable machine-readable code for this violation.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ExpectedArray { .. } => "expected_array",
            Self::ExpectedObject { .. } => "expected_object",
            Self::UnrecognizedNode => "unrecognized_node",
            Self::AmbiguousNode => "ambiguous_node",
            Self::MissingText => "missing_text",
            Self::TextNotString { .. } => "text_not_string",
            Self::MarkNotBoolean { .. } => "mark_not_boolean",
            Self::UnexpectedText => "unexpected_text",
            Self::MissingKind => "missing_type",
            Self::KindNotString { .. } => "type_not_string",
            Self::UnknownKind(_) => "unknown_type",
            Self::UnexpectedKind(_) => "unexpected_type",
            Self::MissingChildren => "missing_children",
            Self::ChildrenNotArray { .. } => "children_not_array",
            Self::UnknownField(_) => "unknown_field",
            Self::DepthExceeded { .. } => "depth_exceeded",
            Self::MisplacedListItem => "misplaced_list_item",
            Self::TopLevelText => "top_level_text",
        }
    }
}

/// A single violation and where it occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Location of the offending value.
    pub path: NodePath,
    /// What was wrong with it.
    pub violation: Violation,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "at document root: {}", self.violation)
        } else {
            write!(f, "at {}: {}", self.path, self.violation)
        }
    }
}

/// A value failed schema validation. Holds every issue found, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub(crate) const fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// All issues, in the order they were found.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Consume the error, returning its issues.
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    /// Whether any issue carries the given violation code.
    pub fn has_code(&self, code: &str) -> bool {
        self.issues.iter().any(|issue| issue.violation.code() == code)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issues.as_slice() {
            [] => f.write_str("invalid document"),
            [only] => write!(f, "invalid document: {only}"),
            [first, rest @ ..] => write!(
                f,
                "invalid document: {first} (and {} more issue{})",
                rest.len(),
                if rest.len() == 1 { "" } else { "s" }
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors that can occur when decoding a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The input is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The input nests arrays and objects deeper than any document can.
    #[error("input nested deeper than {limit} levels")]
    TooDeep {
        /// The nesting bound that was exceeded.
        limit: usize,
    },

    /// The input is JSON but not a valid document.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Result type alias using [`DocumentError`].
pub type DocumentResult<T> = Result<T, DocumentError>;
