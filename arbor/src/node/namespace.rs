//! Namespace handling for XML elements.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::verifier;
use super::XmlElement;
use crate::constants::{XMLNS_NAMESPACE_URI, XML_NAMESPACE_URI};
use crate::error::{Result, StructuralErrorKind};

thread_local! {
    static NO_NAMESPACE: Namespace = Namespace::new_unchecked("", "");
    static XML_NAMESPACE: Namespace = Namespace::new_unchecked("xml", XML_NAMESPACE_URI);
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct NamespaceData {
    prefix: String,
    uri: String,
}

/// A (prefix, URI) binding.
///
/// Cloning is cheap and shares the underlying strings. Equality compares
/// values, so two independently created namespaces with the same prefix and
/// URI are equal; [`Namespace::ptr_eq`] tells whether they are also the same
/// interned value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Namespace(Rc<NamespaceData>);

impl Namespace {
    /// Creates a namespace after checking the prefix and the URI pairing.
    pub fn new(prefix: &str, uri: &str) -> Result<Self> {
        verifier::check_namespace_prefix(prefix)?;
        if prefix == "xml" && uri != XML_NAMESPACE_URI {
            return Err(StructuralErrorKind::NamespaceConflict {
                prefix: prefix.into(),
                existing: XML_NAMESPACE_URI.into(),
                uri: uri.into(),
            }
            .into());
        }
        if prefix != "xml" && uri == XML_NAMESPACE_URI {
            return Err(StructuralErrorKind::IllegalName {
                role: "namespace prefix",
                name: prefix.into(),
                reason: "only 'xml' may be bound to the XML namespace".into(),
            }
            .into());
        }
        if uri == XMLNS_NAMESPACE_URI {
            return Err(StructuralErrorKind::IllegalName {
                role: "namespace prefix",
                name: prefix.into(),
                reason: "the xmlns namespace cannot be bound".into(),
            }
            .into());
        }
        if !prefix.is_empty() && uri.is_empty() {
            return Err(StructuralErrorKind::IllegalName {
                role: "namespace prefix",
                name: prefix.into(),
                reason: "a prefixed namespace needs a non-empty URI".into(),
            }
            .into());
        }
        Ok(Self::new_unchecked(prefix, uri))
    }

    /// Creates a namespace without any checks.
    pub fn new_unchecked(prefix: &str, uri: &str) -> Self {
        Namespace(Rc::new(NamespaceData {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
        }))
    }

    /// The "no namespace" value: empty prefix, empty URI.
    ///
    /// Every call on a thread returns a handle to the same value.
    pub fn none() -> Self {
        NO_NAMESPACE.with(Namespace::clone)
    }

    /// The namespace permanently bound to the `xml` prefix, shared like
    /// [`Namespace::none`].
    pub fn xml() -> Self {
        XML_NAMESPACE.with(Namespace::clone)
    }

    /// Returns the prefix (empty for the default namespace).
    pub fn prefix(&self) -> &str {
        &self.0.prefix
    }

    /// Returns the namespace URI (empty for no namespace).
    pub fn uri(&self) -> &str {
        &self.0.uri
    }

    /// Returns true for the empty-prefix, empty-URI value.
    pub fn is_none(&self) -> bool {
        self.0.prefix.is_empty() && self.0.uri.is_empty()
    }

    /// Returns true if both handles point at the same interned value.
    pub fn ptr_eq(a: &Namespace, b: &Namespace) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({:?} = {:?})", self.0.prefix, self.0.uri)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.prefix.is_empty() {
            write!(f, "xmlns=\"{}\"", self.0.uri)
        } else {
            write!(f, "xmlns:{}=\"{}\"", self.0.prefix, self.0.uri)
        }
    }
}

/// Deduplicates namespace values so equal declarations share storage.
///
/// The no-namespace and `xml` values are known from the start, so an
/// `xmlns=""` undeclaration interns to [`Namespace::none`].
pub struct NamespaceInterner {
    cache: FxHashMap<(String, String), Namespace>,
}

impl Default for NamespaceInterner {
    fn default() -> Self {
        let mut cache = FxHashMap::default();
        for ns in [Namespace::none(), Namespace::xml()] {
            cache.insert((ns.prefix().to_string(), ns.uri().to_string()), ns);
        }
        NamespaceInterner { cache }
    }
}

impl NamespaceInterner {
    /// Creates an interner holding only the predefined namespaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared namespace for (prefix, uri), creating it if needed.
    pub fn intern(&mut self, prefix: &str, uri: &str) -> Result<Namespace> {
        if let Some(cached) = self.cache.get(&(prefix.to_string(), uri.to_string())) {
            return Ok(cached.clone());
        }
        let ns = Namespace::new(prefix, uri)?;
        self.cache
            .insert((prefix.to_string(), uri.to_string()), ns.clone());
        Ok(ns)
    }

    /// Number of distinct namespaces held, the predefined two included.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Always false: the predefined namespaces are never removed.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

struct ScopeFrame {
    namespace: Namespace,
    next: Option<Rc<ScopeFrame>>,
}

/// Prefix bindings visible at a point in the tree.
///
/// A persistent stack: [`NamespaceScope::with`] returns a new scope that
/// shares every ancestor frame, so sibling elements can never see each
/// other's declarations. The `xml` prefix is always bound.
#[derive(Clone, Default)]
pub struct NamespaceScope {
    head: Option<Rc<ScopeFrame>>,
}

impl NamespaceScope {
    /// Creates a scope with only the implicit `xml` binding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a scope with `namespace` bound on top of this one.
    pub fn with(&self, namespace: Namespace) -> Self {
        NamespaceScope {
            head: Some(Rc::new(ScopeFrame {
                namespace,
                next: self.head.clone(),
            })),
        }
    }

    /// Resolves a prefix to its innermost binding.
    pub fn resolve(&self, prefix: &str) -> Option<Namespace> {
        if prefix == "xml" {
            return Some(Namespace::xml());
        }
        self.frames()
            .find(|ns| ns.prefix() == prefix)
            .cloned()
    }

    /// Returns the URI bound to `prefix`, treating an unbound default
    /// namespace as the empty URI.
    pub fn uri_for(&self, prefix: &str) -> Option<String> {
        match self.resolve(prefix) {
            Some(ns) => Some(ns.uri().to_string()),
            None if prefix.is_empty() => Some(String::new()),
            None => None,
        }
    }

    /// Returns true if `namespace` is already the visible binding of its prefix.
    pub fn is_bound(&self, namespace: &Namespace) -> bool {
        self.uri_for(namespace.prefix()).as_deref() == Some(namespace.uri())
    }

    /// Returns every visible binding, innermost first, without shadowed ones.
    pub fn bindings(&self) -> Vec<Namespace> {
        let mut seen: Vec<Namespace> = Vec::new();
        for ns in self.frames() {
            if !seen.iter().any(|s| s.prefix() == ns.prefix()) {
                seen.push(ns.clone());
            }
        }
        seen
    }

    /// Returns the declarations an element needs when written in this scope,
    /// and the scope in effect inside it.
    ///
    /// The element's own declarations come first, in order; then its
    /// namespace and its attributes' namespaces, for each one not already
    /// visible. An element in no namespace below a default namespace gets an
    /// `xmlns=""` undeclaration this way.
    pub fn declarations_for(&self, element: &XmlElement) -> (Vec<Namespace>, NamespaceScope) {
        let mut declared: Vec<Namespace> = Vec::new();
        let mut scope = self.clone();

        for ns in element.additional_namespaces() {
            if !declared.iter().any(|d| d.prefix() == ns.prefix()) {
                scope = scope.with(ns.clone());
                declared.push(ns.clone());
            }
        }
        let used = std::iter::once(element.namespace()).chain(
            element
                .attributes()
                .iter()
                .map(|a| a.namespace())
                .filter(|ns| !ns.prefix().is_empty()),
        );
        for ns in used {
            if !scope.is_bound(ns) {
                scope = scope.with(ns.clone());
                declared.push(ns.clone());
            }
        }
        (declared, scope)
    }

    fn frames(&self) -> impl Iterator<Item = &Namespace> {
        let mut cursor = self.head.as_deref();
        std::iter::from_fn(move || {
            let frame = cursor?;
            cursor = frame.next.as_deref();
            Some(&frame.namespace)
        })
    }
}

impl fmt::Debug for NamespaceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.bindings()).finish()
    }
}

/// Splits a qualified name into prefix and local name.
///
/// Returns (Some(prefix), local) for "prefix:local"
/// Returns (None, name) for "name" without prefix
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some(pos) = qname.find(':') {
        (Some(&qname[..pos]), &qname[pos + 1..])
    } else {
        (None, qname)
    }
}

/// Checks if an attribute name is a namespace declaration.
pub fn is_xmlns_attr(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

/// Returns the prefix declared by an `xmlns` / `xmlns:p` attribute name.
pub fn declared_prefix(name: &str) -> Option<&str> {
    if name == "xmlns" {
        Some("")
    } else {
        name.strip_prefix("xmlns:")
    }
}
