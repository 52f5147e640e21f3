//! Node structures for XML tree representation.
//!
//! Every node is a `NodeRef` (`Rc<RefCell<NodeInner>>`) holding one
//! [`XmlContent`] value, its children and a weak link to its parent. The
//! structural operations are associated functions taking `&NodeRef` so they
//! can maintain both directions of the parent/child link; each one checks its
//! preconditions before touching the tree and fails with a structural error
//! instead of leaving a half-applied change behind.

mod document;
pub mod namespace;
pub mod verifier;
mod xml_content;

pub use document::Document;
pub use namespace::{Namespace, NamespaceInterner, NamespaceScope};
pub use xml_content::{
    AttributeType, XmlAttribute, XmlCData, XmlComment, XmlContent, XmlDocType, XmlDocument,
    XmlElement, XmlEntityRef, XmlProcessingInstruction, XmlText,
};

use bitflags::bitflags;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::{Result, StructuralErrorKind};

bitflags! {
    /// Selects node kinds when viewing a parent's children.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContentFilter: u8 {
        /// Element nodes.
        const ELEMENT = 1;
        /// Text nodes.
        const TEXT = 1 << 1;
        /// CDATA sections.
        const CDATA = 1 << 2;
        /// Comments.
        const COMMENT = 1 << 3;
        /// Processing instructions.
        const PROCESSING_INSTRUCTION = 1 << 4;
        /// Entity references.
        const ENTITY_REF = 1 << 5;
        /// Doctype declarations.
        const DOC_TYPE = 1 << 6;
        /// Text and CDATA.
        const CHARACTER = Self::TEXT.bits() | Self::CDATA.bits();
        /// Every kind that can be a child.
        const ALL = Self::ELEMENT.bits()
            | Self::CHARACTER.bits()
            | Self::COMMENT.bits()
            | Self::PROCESSING_INSTRUCTION.bits()
            | Self::ENTITY_REF.bits()
            | Self::DOC_TYPE.bits();
    }
}

impl ContentFilter {
    /// Returns the flag that corresponds to a content kind.
    pub fn of(content: &XmlContent) -> Self {
        match content {
            XmlContent::Document(_) => ContentFilter::empty(),
            XmlContent::Element(_) => ContentFilter::ELEMENT,
            XmlContent::Text(_) => ContentFilter::TEXT,
            XmlContent::CData(_) => ContentFilter::CDATA,
            XmlContent::Comment(_) => ContentFilter::COMMENT,
            XmlContent::ProcessingInstruction(_) => ContentFilter::PROCESSING_INSTRUCTION,
            XmlContent::EntityRef(_) => ContentFilter::ENTITY_REF,
            XmlContent::DocType(_) => ContentFilter::DOC_TYPE,
        }
    }

    /// Returns true if `content` is one of the selected kinds.
    pub fn matches(&self, content: &XmlContent) -> bool {
        let kind = Self::of(content);
        !kind.is_empty() && self.contains(kind)
    }
}

/// A reference-counted pointer to a node.
pub type NodeRef = Rc<RefCell<NodeInner>>;

/// A weak reference to a node, used for parent links.
pub type WeakNodeRef = Weak<RefCell<NodeInner>>;

/// Creates a new, detached node reference.
///
/// Trees are normally assembled through a `NodeFactory`; this is the
/// primitive the factory uses.
pub fn new_node_ref(content: XmlContent) -> NodeRef {
    Rc::new(RefCell::new(NodeInner::new(content)))
}

/// The inner data of a node in the tree.
#[derive(Debug)]
pub struct NodeInner {
    /// Child nodes.
    children: Vec<NodeRef>,
    /// XML content of this node.
    content: XmlContent,
    /// Weak reference to parent node.
    parent: WeakNodeRef,
}

impl NodeInner {
    /// Creates a detached node with the given content.
    pub fn new(content: XmlContent) -> Self {
        NodeInner {
            children: Vec::new(),
            content,
            parent: Weak::new(),
        }
    }

    /// Returns the content of this node.
    ///
    /// Content is read-only outside this crate; edits go through the checked
    /// operations on `NodeInner` and the factory.
    ///
    /// ```compile_fail
    /// let doc = xml_arbor::build_str("<a><b/></a>").unwrap();
    /// let root = doc.root_element().unwrap();
    /// let _ = root.borrow_mut().content_mut();
    /// ```
    pub fn content(&self) -> &XmlContent {
        &self.content
    }

    /// Swapping the content for a different kind is not checked.
    pub(crate) fn content_mut(&mut self) -> &mut XmlContent {
        &mut self.content
    }

    /// Returns the element, if this is an element node.
    pub fn as_element(&self) -> Option<&XmlElement> {
        self.content.as_element()
    }

    /// Returns the number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns a reference to the child at the given index.
    pub fn child(&self, index: usize) -> Option<&NodeRef> {
        self.children.get(index)
    }

    /// Returns the children as a slice.
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// Returns the parent, if attached.
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.upgrade()
    }

    /// Returns true if this node currently has a parent.
    pub fn is_attached(&self) -> bool {
        self.parent.strong_count() > 0
    }
}

/// Structural operations. These must be called on the `NodeRef` wrapper.
impl NodeInner {
    /// Appends `child` to `parent_ref`.
    pub fn add_content(parent_ref: &NodeRef, child_ref: NodeRef) -> Result<()> {
        let index = parent_ref.borrow().children.len();
        Self::insert_content(parent_ref, index, child_ref)
    }

    /// Inserts `child` at `index` among the children of `parent_ref`.
    pub fn insert_content(parent_ref: &NodeRef, index: usize, child_ref: NodeRef) -> Result<()> {
        Self::check_insert(parent_ref, index, &child_ref)
            .map_err(|e| e.at_path(|| Self::path(parent_ref)))?;
        child_ref.borrow_mut().parent = Rc::downgrade(parent_ref);
        parent_ref.borrow_mut().children.insert(index, child_ref);
        Ok(())
    }

    fn check_insert(parent_ref: &NodeRef, index: usize, child_ref: &NodeRef) -> Result<()> {
        if Rc::ptr_eq(parent_ref, child_ref) {
            return Err(StructuralErrorKind::Cycle.into());
        }
        let parent = parent_ref.borrow();
        let child = child_ref.borrow();

        if !parent.content.is_parent() {
            return Err(StructuralErrorKind::NotAParent(parent.content.kind_name()).into());
        }
        if index > parent.children.len() {
            return Err(StructuralErrorKind::IllegalPlacement {
                child: child.content.kind_name(),
                parent: "a position past the end of its parent",
            }
            .into());
        }
        if child.content.is_document() {
            return Err(StructuralErrorKind::IllegalPlacement {
                child: "document",
                parent: parent.content.kind_name(),
            }
            .into());
        }
        if child.is_attached() {
            return Err(StructuralErrorKind::AlreadyAttached.into());
        }

        let mut ancestor = parent.parent();
        while let Some(node) = ancestor {
            if Rc::ptr_eq(&node, child_ref) {
                return Err(StructuralErrorKind::Cycle.into());
            }
            ancestor = node.borrow().parent();
        }

        match &parent.content {
            XmlContent::Document(_) => check_document_slot(&parent.children, index, &child.content),
            _ if matches!(child.content, XmlContent::DocType(_)) => {
                Err(StructuralErrorKind::IllegalPlacement {
                    child: "doctype",
                    parent: parent.content.kind_name(),
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    /// Removes and returns the child at `index`, leaving it detached.
    pub fn remove_content(parent_ref: &NodeRef, index: usize) -> Option<NodeRef> {
        let mut parent = parent_ref.borrow_mut();
        if index >= parent.children.len() {
            return None;
        }
        let child = parent.children.remove(index);
        child.borrow_mut().parent = Weak::new();
        Some(child)
    }

    /// Detaches a node from its parent. Returns false if it had none.
    pub fn detach(node_ref: &NodeRef) -> bool {
        let Some(parent) = node_ref.borrow().parent() else {
            return false;
        };
        match Self::index_of(node_ref) {
            Some(index) => Self::remove_content(&parent, index).is_some(),
            None => false,
        }
    }

    /// Returns the position of a node among its parent's children.
    pub fn index_of(node_ref: &NodeRef) -> Option<usize> {
        let parent = node_ref.borrow().parent()?;
        let parent = parent.borrow();
        parent.children.iter().position(|c| Rc::ptr_eq(c, node_ref))
    }

    /// Adds an attribute to an element, failing on a duplicate identity.
    pub fn add_attribute(element_ref: &NodeRef, attribute: XmlAttribute) -> Result<()> {
        Self::with_element(element_ref, |e| e.add_attribute(attribute))
    }

    /// Sets an attribute on an element, replacing one with the same identity.
    pub fn set_attribute(element_ref: &NodeRef, attribute: XmlAttribute) -> Result<()> {
        Self::with_element(element_ref, |e| e.set_attribute(attribute))
    }

    /// Declares an additional namespace on an element.
    pub fn add_namespace_declaration(element_ref: &NodeRef, namespace: Namespace) -> Result<()> {
        Self::with_element(element_ref, |e| e.add_namespace_declaration(namespace))
    }

    fn with_element<T>(
        element_ref: &NodeRef,
        edit: impl FnOnce(&mut XmlElement) -> Result<T>,
    ) -> Result<T> {
        let result = {
            let mut node = element_ref.borrow_mut();
            let kind = node.content.kind_name();
            match node.content.as_element_mut() {
                Some(element) => edit(element),
                None => Err(StructuralErrorKind::IllegalPlacement {
                    child: "attribute",
                    parent: kind,
                }
                .into()),
            }
        };
        result.map_err(|e| e.at_path(|| Self::path(element_ref)))
    }

    /// Returns the namespaces visible at a node, computed from its ancestors.
    ///
    /// The node's own namespace comes first (for elements), the rest follow
    /// sorted by prefix; the `xml` binding is always present.
    pub fn namespaces_in_scope(node_ref: &NodeRef) -> Vec<Namespace> {
        let mut found: Vec<Namespace> = Vec::new();
        let mut push = |ns: &Namespace| {
            if !found.iter().any(|f| f.prefix() == ns.prefix()) {
                found.push(ns.clone());
            }
        };

        let mut cursor = Some(node_ref.clone());
        while let Some(node) = cursor {
            let inner = node.borrow();
            if let Some(element) = inner.as_element() {
                push(element.namespace());
                for ns in element.additional_namespaces() {
                    push(ns);
                }
                for attr in element.attributes() {
                    if !attr.namespace().prefix().is_empty() {
                        push(attr.namespace());
                    }
                }
            }
            cursor = inner.parent();
        }
        push(&Namespace::xml());

        let own = node_ref
            .borrow()
            .as_element()
            .map(|e| e.prefix().to_string());
        let (mut head, mut rest): (Vec<_>, Vec<_>) = found
            .into_iter()
            .partition(|ns| Some(ns.prefix()) == own.as_deref());
        rest.sort_by(|a, b| a.prefix().cmp(b.prefix()));
        head.append(&mut rest);
        head
    }

    /// Returns the children matching `filter`.
    pub fn filtered_children(node_ref: &NodeRef, filter: ContentFilter) -> Vec<NodeRef> {
        node_ref
            .borrow()
            .children
            .iter()
            .filter(|c| filter.matches(&c.borrow().content))
            .cloned()
            .collect()
    }

    /// Returns the child elements.
    pub fn child_elements(node_ref: &NodeRef) -> Vec<NodeRef> {
        Self::filtered_children(node_ref, ContentFilter::ELEMENT)
    }

    /// Returns the first child element with the given local name and URI.
    pub fn child_element(node_ref: &NodeRef, name: &str, uri: &str) -> Option<NodeRef> {
        node_ref
            .borrow()
            .children
            .iter()
            .find(|c| {
                c.borrow()
                    .as_element()
                    .is_some_and(|e| e.name() == name && e.namespace_uri() == uri)
            })
            .cloned()
    }

    /// Concatenates the text and CDATA children of a node.
    pub fn text_content(node_ref: &NodeRef) -> String {
        let node = node_ref.borrow();
        if let Some(text) = node.content.character_data() {
            return text.to_string();
        }
        node.children
            .iter()
            .filter_map(|c| c.borrow().content.character_data().map(str::to_string))
            .collect()
    }

    /// Returns [`NodeInner::text_content`] with surrounding whitespace removed.
    pub fn text_trim(node_ref: &NodeRef) -> String {
        Self::text_content(node_ref)
            .trim_matches(verifier::is_xml_whitespace)
            .to_string()
    }

    /// Returns [`NodeInner::text_content`] trimmed, with inner runs of
    /// whitespace collapsed to one space.
    pub fn text_normalize(node_ref: &NodeRef) -> String {
        collapse_whitespace(&Self::text_trim(node_ref))
    }

    /// Returns the element path of a node, e.g. `/root/child`.
    ///
    /// Non-element nodes report the path of their nearest element ancestor.
    pub fn path(node_ref: &NodeRef) -> String {
        let mut names = Vec::new();
        let mut cursor = Some(node_ref.clone());
        while let Some(node) = cursor {
            let inner = node.borrow();
            if let Some(element) = inner.as_element() {
                names.push(element.qualified_name());
            }
            cursor = inner.parent();
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }

    /// Returns the top-most ancestor if it is a document node.
    pub fn document_of(node_ref: &NodeRef) -> Option<NodeRef> {
        let mut top = node_ref.clone();
        loop {
            let parent = top.borrow().parent();
            match parent {
                Some(p) => top = p,
                None => break,
            }
        }
        let is_document = top.borrow().content.is_document();
        is_document.then_some(top)
    }

    /// Copies a node and its subtree. The copy is detached.
    pub fn deep_clone(node_ref: &NodeRef) -> NodeRef {
        let node = node_ref.borrow();
        let copy = new_node_ref(node.content.clone());
        {
            let mut inner = copy.borrow_mut();
            for child in &node.children {
                let child_copy = Self::deep_clone(child);
                child_copy.borrow_mut().parent = Rc::downgrade(&copy);
                inner.children.push(child_copy);
            }
        }
        copy
    }

    /// Compares two subtrees by canonical content.
    ///
    /// Node kinds, order, names, namespaces and character data must match.
    /// Attributes and declared namespaces are compared as sets; attribute
    /// types are informational and ignored.
    pub fn structurally_equal(a: &NodeRef, b: &NodeRef) -> bool {
        let (a, b) = (a.borrow(), b.borrow());
        content_equal(&a.content, &b.content)
            && a.children.len() == b.children.len()
            && a.children
                .iter()
                .zip(b.children.iter())
                .all(|(x, y)| Self::structurally_equal(x, y))
    }
}

fn check_document_slot(children: &[NodeRef], index: usize, child: &XmlContent) -> Result<()> {
    let position_of = |wanted: fn(&XmlContent) -> bool| {
        children.iter().position(|c| wanted(&c.borrow().content))
    };
    let root = position_of(XmlContent::is_element);
    let doc_type = position_of(|c| matches!(c, XmlContent::DocType(_)));

    match child {
        XmlContent::Text(_) | XmlContent::CData(_) | XmlContent::EntityRef(_) => {
            Err(StructuralErrorKind::TextOutsideRoot.into())
        }
        XmlContent::Element(_) => match (root, doc_type) {
            (Some(_), _) => Err(StructuralErrorKind::MultipleRoots.into()),
            (None, Some(dt)) if index <= dt => Err(StructuralErrorKind::DocTypeAfterRoot.into()),
            _ => Ok(()),
        },
        XmlContent::DocType(_) => match (doc_type, root) {
            (Some(_), _) => Err(StructuralErrorKind::DuplicateDocType.into()),
            (None, Some(r)) if index > r => Err(StructuralErrorKind::DocTypeAfterRoot.into()),
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

fn content_equal(a: &XmlContent, b: &XmlContent) -> bool {
    match (a, b) {
        (XmlContent::Document(_), XmlContent::Document(_)) => true,
        (XmlContent::Element(x), XmlContent::Element(y)) => {
            x.name() == y.name()
                && x.namespace() == y.namespace()
                && x.attributes().len() == y.attributes().len()
                && x.attributes().iter().all(|attr| {
                    y.attribute(attr.name(), attr.namespace().uri())
                        .is_some_and(|other| {
                            other.value() == attr.value()
                                && other.namespace().prefix() == attr.namespace().prefix()
                        })
                })
                && x.additional_namespaces().len() == y.additional_namespaces().len()
                && x
                    .additional_namespaces()
                    .iter()
                    .all(|ns| y.additional_namespaces().contains(ns))
        }
        (XmlContent::Text(x), XmlContent::Text(y)) => x == y,
        (XmlContent::CData(x), XmlContent::CData(y)) => x == y,
        (XmlContent::Comment(x), XmlContent::Comment(y)) => x == y,
        (XmlContent::ProcessingInstruction(x), XmlContent::ProcessingInstruction(y)) => x == y,
        (XmlContent::EntityRef(x), XmlContent::EntityRef(y)) => x == y,
        (XmlContent::DocType(x), XmlContent::DocType(y)) => x == y,
        _ => false,
    }
}

/// Collapses each run of XML whitespace to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_was_ws = false;
    for c in text.chars() {
        if verifier::is_xml_whitespace(c) {
            if !last_was_ws {
                result.push(' ');
                last_was_ws = true;
            }
        } else {
            result.push(c);
            last_was_ws = false;
        }
    }
    result
}
