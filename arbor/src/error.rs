//! Error types for xml-arbor.

use thiserror::Error;

/// Result type alias for xml-arbor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, editing or outputting a tree.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input reported by the underlying source.
    #[error("XML parse error{}: {message}", position_suffix(.position))]
    Parse {
        /// Description of the problem.
        message: String,
        /// Byte offset in the source, when the source reports one.
        position: Option<u64>,
    },

    /// A tree invariant would have been violated.
    #[error("structural error at {path}: {kind}")]
    Structural {
        /// What went wrong.
        kind: StructuralErrorKind,
        /// Element path at which the violation was detected.
        path: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The specific tree invariant a structural error refers to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralErrorKind {
    /// Two attributes with the same local name and namespace URI.
    #[error("duplicate attribute '{name}' in namespace '{uri}'")]
    DuplicateAttribute { name: String, uri: String },

    /// A name that is not a legal XML name for its role.
    #[error("illegal {role} name '{name}': {reason}")]
    IllegalName {
        role: &'static str,
        name: String,
        reason: String,
    },

    /// Character data that cannot appear in the given node kind.
    #[error("illegal {role} data: {reason}")]
    IllegalData { role: &'static str, reason: String },

    /// A second root element was added to a document.
    #[error("document already has a root element")]
    MultipleRoots,

    /// Text, CDATA or an entity reference placed directly in a document.
    #[error("character content is not allowed outside the root element")]
    TextOutsideRoot,

    /// A DocType placed after the root element.
    #[error("doctype must precede the root element")]
    DocTypeAfterRoot,

    /// A second DocType was added to a document.
    #[error("document already has a doctype")]
    DuplicateDocType,

    /// A completed build produced no root element.
    #[error("document has no root element")]
    MissingRoot,

    /// The node already has a parent.
    #[error("node is already attached to a parent")]
    AlreadyAttached,

    /// Attaching the node would make it its own ancestor.
    #[error("node cannot be added beneath itself")]
    Cycle,

    /// The target node cannot hold children.
    #[error("{0} nodes cannot have children")]
    NotAParent(&'static str),

    /// The node kind is not allowed under this parent kind.
    #[error("{child} cannot be placed inside {parent}")]
    IllegalPlacement {
        child: &'static str,
        parent: &'static str,
    },

    /// A prefix bound to two different URIs on the same element.
    #[error("prefix '{prefix}' is already bound to '{existing}', cannot bind to '{uri}'")]
    NamespaceConflict {
        prefix: String,
        existing: String,
        uri: String,
    },

    /// A qualified name used a prefix with no binding in scope.
    #[error("prefix '{0}' is not bound to a namespace")]
    UnboundPrefix(String),
}

fn position_suffix(position: &Option<u64>) -> String {
    match position {
        Some(pos) => format!(" at byte {}", pos),
        None => String::new(),
    }
}

impl Error {
    /// Creates a parse error with an optional source position.
    pub fn parse(message: impl Into<String>, position: Option<u64>) -> Self {
        Error::Parse {
            message: message.into(),
            position,
        }
    }

    /// Creates a structural error with no path yet.
    pub fn structural(kind: StructuralErrorKind) -> Self {
        Error::Structural {
            kind,
            path: String::new(),
        }
    }

    /// Fills in the element path of a structural error that has none.
    pub fn at_path(self, at: impl FnOnce() -> String) -> Self {
        match self {
            Error::Structural { kind, path } if path.is_empty() => Error::Structural {
                kind,
                path: at(),
            },
            other => other,
        }
    }

    /// Returns the structural error kind, if this is a structural error.
    pub fn structural_kind(&self) -> Option<&StructuralErrorKind> {
        match self {
            Error::Structural { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

impl From<StructuralErrorKind> for Error {
    fn from(kind: StructuralErrorKind) -> Self {
        Error::structural(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse("unexpected end", Some(42));
        assert_eq!(err.to_string(), "XML parse error at byte 42: unexpected end");

        let err = Error::parse("unexpected end", None);
        assert_eq!(err.to_string(), "XML parse error: unexpected end");
    }

    #[test]
    fn test_at_path_only_fills_empty_path() {
        let err = Error::structural(StructuralErrorKind::MultipleRoots).at_path(|| "/".into());
        let err = err.at_path(|| "/ignored".into());
        match err {
            Error::Structural { path, kind } => {
                assert_eq!(path, "/");
                assert_eq!(kind, StructuralErrorKind::MultipleRoots);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_structural_kind() {
        let err: Error = StructuralErrorKind::Cycle.into();
        assert_eq!(err.structural_kind(), Some(&StructuralErrorKind::Cycle));
        assert!(Error::parse("x", None).structural_kind().is_none());
    }
}
