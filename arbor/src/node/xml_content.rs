//! XML content types for tree nodes.
//!
//! This module provides `XmlContent`, the closed set of node kinds a tree can
//! hold, together with the value type of each kind. Constructors named `new`
//! verify names and character data; the `new_unchecked` variants skip that.

use std::fmt;

use super::namespace::Namespace;
use super::verifier;
use crate::error::{Result, StructuralErrorKind};

/// Represents the content of an XML node.
#[derive(Debug, Clone)]
pub enum XmlContent {
    /// The document node at the top of a tree.
    Document(XmlDocument),
    /// An XML element with a name, namespace and attributes.
    Element(XmlElement),
    /// XML text content.
    Text(XmlText),
    /// A CDATA section.
    CData(XmlCData),
    /// XML comment.
    Comment(XmlComment),
    /// XML processing instruction.
    ProcessingInstruction(XmlProcessingInstruction),
    /// An unexpanded entity reference.
    EntityRef(XmlEntityRef),
    /// A document type declaration.
    DocType(XmlDocType),
}

impl XmlContent {
    /// Short name of the node kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            XmlContent::Document(_) => "document",
            XmlContent::Element(_) => "element",
            XmlContent::Text(_) => "text",
            XmlContent::CData(_) => "CDATA",
            XmlContent::Comment(_) => "comment",
            XmlContent::ProcessingInstruction(_) => "processing instruction",
            XmlContent::EntityRef(_) => "entity reference",
            XmlContent::DocType(_) => "doctype",
        }
    }

    /// Returns true for the kinds that may own children.
    pub fn is_parent(&self) -> bool {
        matches!(self, XmlContent::Document(_) | XmlContent::Element(_))
    }

    /// Returns true if this is the document node.
    pub fn is_document(&self) -> bool {
        matches!(self, XmlContent::Document(_))
    }

    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self, XmlContent::Element(_))
    }

    /// Returns true if this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self, XmlContent::Text(_))
    }

    /// Returns true for text, CDATA and entity references: the kinds that
    /// carry character content inline.
    pub fn is_character_content(&self) -> bool {
        matches!(
            self,
            XmlContent::Text(_) | XmlContent::CData(_) | XmlContent::EntityRef(_)
        )
    }

    /// Returns a reference to the element, if this is an element node.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlContent::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns a mutable reference to the element, if this is an element node.
    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlContent::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns a reference to the text, if this is a text node.
    pub fn as_text(&self) -> Option<&XmlText> {
        match self {
            XmlContent::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Returns a reference to the doctype, if this is a doctype node.
    pub fn as_doc_type(&self) -> Option<&XmlDocType> {
        match self {
            XmlContent::DocType(d) => Some(d),
            _ => None,
        }
    }

    /// Returns the character content of text and CDATA nodes.
    pub fn character_data(&self) -> Option<&str> {
        match self {
            XmlContent::Text(t) => Some(t.text()),
            XmlContent::CData(c) => Some(c.text()),
            _ => None,
        }
    }
}

/// Data of the document node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlDocument {
    base_uri: Option<String>,
}

impl XmlDocument {
    /// Creates an empty document value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the URI the document was loaded from, if known.
    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    /// Sets the base URI.
    pub fn set_base_uri(&mut self, uri: Option<String>) {
        self.base_uri = uri;
    }
}

/// Informational attribute type, as declared in a DTD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeType {
    /// No declaration seen.
    #[default]
    Undeclared,
    /// `CDATA`
    CData,
    /// `ID`
    Id,
    /// `IDREF`
    IdRef,
    /// `IDREFS`
    IdRefs,
    /// `ENTITY`
    Entity,
    /// `ENTITIES`
    Entities,
    /// `NMTOKEN`
    NmToken,
    /// `NMTOKENS`
    NmTokens,
    /// `NOTATION`
    Notation,
    /// An enumerated list of values.
    Enumeration,
}

impl AttributeType {
    /// Parses a DTD attribute type keyword.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "CDATA" => AttributeType::CData,
            "ID" => AttributeType::Id,
            "IDREF" => AttributeType::IdRef,
            "IDREFS" => AttributeType::IdRefs,
            "ENTITY" => AttributeType::Entity,
            "ENTITIES" => AttributeType::Entities,
            "NMTOKEN" => AttributeType::NmToken,
            "NMTOKENS" => AttributeType::NmTokens,
            "NOTATION" => AttributeType::Notation,
            k if k.starts_with('(') => AttributeType::Enumeration,
            _ => AttributeType::Undeclared,
        }
    }
}

/// An attribute owned by an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    name: String,
    namespace: Namespace,
    value: String,
    attr_type: AttributeType,
}

impl XmlAttribute {
    /// Creates an attribute after checking its name, namespace and value.
    ///
    /// Attributes cannot live in a default namespace: a namespace with an
    /// empty prefix and a non-empty URI is rejected.
    pub fn new(
        name: &str,
        namespace: Namespace,
        value: &str,
        attr_type: AttributeType,
    ) -> Result<Self> {
        verifier::check_attribute_name(name)?;
        if namespace.prefix().is_empty() && !namespace.uri().is_empty() {
            return Err(StructuralErrorKind::IllegalName {
                role: "attribute",
                name: name.into(),
                reason: "attributes in a namespace need a prefix".into(),
            }
            .into());
        }
        verifier::check_character_data("attribute", value)?;
        Ok(Self::new_unchecked(name, namespace, value, attr_type))
    }

    /// Creates an attribute without any checks.
    pub fn new_unchecked(
        name: &str,
        namespace: Namespace,
        value: &str,
        attr_type: AttributeType,
    ) -> Self {
        XmlAttribute {
            name: name.to_string(),
            namespace,
            value: value.to_string(),
            attr_type,
        }
    }

    /// Returns the local name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `prefix:name`, or just the name without a prefix.
    pub fn qualified_name(&self) -> String {
        qualify(self.namespace.prefix(), &self.name)
    }

    /// Returns the namespace.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Returns the value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replaces the value.
    pub fn set_value(&mut self, value: &str) -> Result<()> {
        verifier::check_character_data("attribute", value)?;
        self.value = value.to_string();
        Ok(())
    }

    /// Returns the declared type.
    pub fn attr_type(&self) -> AttributeType {
        self.attr_type
    }

    /// Returns true if this attribute has the given identity.
    pub fn matches(&self, name: &str, uri: &str) -> bool {
        self.name == name && self.namespace.uri() == uri
    }
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}:{}", prefix, name)
    }
}

/// An XML element: name, namespace, declarations and attributes.
///
/// Children are held by the owning node, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Local name (no prefix).
    name: String,
    /// Namespace of the element itself.
    namespace: Namespace,
    /// Namespaces declared on this element, in declaration order.
    additional_namespaces: Vec<Namespace>,
    /// Attributes in insertion order, unique by (local name, URI).
    attributes: Vec<XmlAttribute>,
}

impl XmlElement {
    /// Creates an element after checking its local name.
    pub fn new(name: &str, namespace: Namespace) -> Result<Self> {
        verifier::check_element_name(name)?;
        Ok(Self::new_unchecked(name, namespace))
    }

    /// Creates an element without checking its name.
    pub fn new_unchecked(name: &str, namespace: Namespace) -> Self {
        XmlElement {
            name: name.to_string(),
            namespace,
            additional_namespaces: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Returns the local name of the element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the qualified name (e.g., "div", "ns:element").
    pub fn qualified_name(&self) -> String {
        qualify(self.namespace.prefix(), &self.name)
    }

    /// Returns the element's namespace.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Returns the element's namespace prefix.
    pub fn prefix(&self) -> &str {
        self.namespace.prefix()
    }

    /// Returns the element's namespace URI.
    pub fn namespace_uri(&self) -> &str {
        self.namespace.uri()
    }

    /// Returns the namespaces declared on this element.
    pub fn additional_namespaces(&self) -> &[Namespace] {
        &self.additional_namespaces
    }

    /// Returns the attributes in order.
    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    /// Looks up an attribute by local name and namespace URI.
    pub fn attribute(&self, name: &str, uri: &str) -> Option<&XmlAttribute> {
        self.attributes.iter().find(|a| a.matches(name, uri))
    }

    /// Returns the value of an attribute in no namespace.
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute(name, "").map(XmlAttribute::value)
    }

    /// Adds a namespace declaration.
    ///
    /// Redeclaring an identical binding is a no-op; binding a prefix already
    /// used on this element to a different URI fails.
    pub fn add_namespace_declaration(&mut self, namespace: Namespace) -> Result<()> {
        if let Some(existing) = self.binding_for(namespace.prefix()) {
            if existing.uri() != namespace.uri() {
                return Err(StructuralErrorKind::NamespaceConflict {
                    prefix: namespace.prefix().into(),
                    existing: existing.uri().into(),
                    uri: namespace.uri().into(),
                }
                .into());
            }
        }
        if !self.additional_namespaces.contains(&namespace) {
            self.additional_namespaces.push(namespace);
        }
        Ok(())
    }

    /// Removes a namespace declaration by prefix.
    pub fn remove_namespace_declaration(&mut self, prefix: &str) -> Option<Namespace> {
        let pos = self
            .additional_namespaces
            .iter()
            .position(|ns| ns.prefix() == prefix)?;
        Some(self.additional_namespaces.remove(pos))
    }

    /// Adds an attribute, failing if one with the same identity exists.
    pub fn add_attribute(&mut self, attribute: XmlAttribute) -> Result<()> {
        let uri = attribute.namespace().uri();
        if self.attribute(attribute.name(), uri).is_some() {
            return Err(StructuralErrorKind::DuplicateAttribute {
                name: attribute.name().into(),
                uri: uri.into(),
            }
            .into());
        }
        self.check_attribute_prefix(&attribute)?;
        self.attributes.push(attribute);
        Ok(())
    }

    /// Adds an attribute or replaces the value of the one with the same
    /// identity, keeping its position.
    pub fn set_attribute(&mut self, attribute: XmlAttribute) -> Result<()> {
        let uri = attribute.namespace().uri().to_string();
        match self
            .attributes
            .iter()
            .position(|a| a.matches(attribute.name(), &uri))
        {
            Some(pos) => {
                self.check_attribute_prefix(&attribute)?;
                self.attributes[pos] = attribute;
                Ok(())
            }
            None => self.add_attribute(attribute),
        }
    }

    /// Removes an attribute by identity.
    pub fn remove_attribute(&mut self, name: &str, uri: &str) -> Option<XmlAttribute> {
        let pos = self.attributes.iter().position(|a| a.matches(name, uri))?;
        Some(self.attributes.remove(pos))
    }

    /// Finds the binding this element itself establishes for `prefix`.
    fn binding_for(&self, prefix: &str) -> Option<&Namespace> {
        if self.namespace.prefix() == prefix {
            return Some(&self.namespace);
        }
        let attribute_namespaces = self
            .attributes
            .iter()
            .map(XmlAttribute::namespace)
            .filter(|ns| !ns.prefix().is_empty());
        self.additional_namespaces
            .iter()
            .chain(attribute_namespaces)
            .find(|ns| ns.prefix() == prefix)
    }

    fn check_attribute_prefix(&self, attribute: &XmlAttribute) -> Result<()> {
        let ns = attribute.namespace();
        if ns.prefix().is_empty() {
            return Ok(());
        }
        match self.binding_for(ns.prefix()) {
            Some(existing) if existing.uri() != ns.uri() => {
                Err(StructuralErrorKind::NamespaceConflict {
                    prefix: ns.prefix().into(),
                    existing: existing.uri().into(),
                    uri: ns.uri().into(),
                }
                .into())
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Element: <{}", self.qualified_name())?;
        if !self.namespace.uri().is_empty() {
            write!(f, " [Namespace: {}]", self.namespace.uri())?;
        }
        write!(f, "/>]")
    }
}

/// XML text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlText {
    text: String,
}

impl XmlText {
    /// Creates a text node after checking for illegal characters.
    pub fn new(text: &str) -> Result<Self> {
        verifier::check_character_data("text", text)?;
        Ok(Self::new_unchecked(text))
    }

    /// Creates a text node without checks.
    pub fn new_unchecked(text: &str) -> Self {
        XmlText {
            text: text.to_string(),
        }
    }

    /// Returns the text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Appends more text.
    pub fn append(&mut self, more: &str) -> Result<()> {
        verifier::check_character_data("text", more)?;
        self.text.push_str(more);
        Ok(())
    }

    /// Returns true if the text is empty or only XML whitespace.
    pub fn is_whitespace(&self) -> bool {
        verifier::is_all_whitespace(&self.text)
    }
}

impl fmt::Display for XmlText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A CDATA section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlCData {
    text: String,
}

impl XmlCData {
    /// Creates a CDATA section; the content cannot contain `]]>`.
    pub fn new(text: &str) -> Result<Self> {
        verifier::check_cdata(text)?;
        Ok(Self::new_unchecked(text))
    }

    /// Creates a CDATA section without checks.
    pub fn new_unchecked(text: &str) -> Self {
        XmlCData {
            text: text.to_string(),
        }
    }

    /// Returns the section content.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// XML comment content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlComment {
    /// The comment text (without the <!-- and --> markers).
    text: String,
}

impl XmlComment {
    /// Creates a comment after checking its content.
    pub fn new(text: &str) -> Result<Self> {
        verifier::check_comment(text)?;
        Ok(Self::new_unchecked(text))
    }

    /// Creates a comment without checks.
    pub fn new_unchecked(text: &str) -> Self {
        XmlComment {
            text: text.to_string(),
        }
    }

    /// Returns the comment text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for XmlComment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<!--{}-->", self.text)
    }
}

/// XML processing instruction content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlProcessingInstruction {
    /// The target of the PI (e.g., "xml-stylesheet").
    target: String,
    /// Everything after the target and the separating whitespace.
    data: String,
}

impl XmlProcessingInstruction {
    /// Creates a PI after checking target and data.
    pub fn new(target: &str, data: &str) -> Result<Self> {
        verifier::check_pi_target(target)?;
        verifier::check_pi_data(data)?;
        Ok(Self::new_unchecked(target, data))
    }

    /// Creates a PI without checks.
    pub fn new_unchecked(target: &str, data: &str) -> Self {
        XmlProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        }
    }

    /// Returns the PI target.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the PI data.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Parses pseudo-attributes such as `href="a.xsl" type="text/xsl"`.
    ///
    /// Returns pairs in order; malformed trailing input is ignored.
    pub fn pseudo_attributes(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut rest = self.data.trim_start();
        while let Some(eq) = rest.find('=') {
            let name = rest[..eq].trim();
            let after = rest[eq + 1..].trim_start();
            let Some(quote) = after.chars().next().filter(|c| *c == '"' || *c == '\'') else {
                break;
            };
            let Some(end) = after[1..].find(quote) else {
                break;
            };
            pairs.push((name.to_string(), after[1..1 + end].to_string()));
            rest = after[end + 2..].trim_start();
        }
        pairs
    }
}

impl fmt::Display for XmlProcessingInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.data.is_empty() {
            write!(f, "<?{}?>", self.target)
        } else {
            write!(f, "<?{} {}?>", self.target, self.data)
        }
    }
}

/// An entity reference kept in the tree instead of being expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlEntityRef {
    name: String,
    public_id: Option<String>,
    system_id: Option<String>,
}

impl XmlEntityRef {
    /// Creates an entity reference after checking the name and ids.
    pub fn new(name: &str, public_id: Option<&str>, system_id: Option<&str>) -> Result<Self> {
        verifier::check_ncname("entity", name)?;
        if let Some(id) = public_id {
            verifier::check_public_id(id)?;
        }
        if let Some(id) = system_id {
            verifier::check_system_id(id)?;
        }
        Ok(Self::new_unchecked(name, public_id, system_id))
    }

    /// Creates an entity reference without checks.
    pub fn new_unchecked(name: &str, public_id: Option<&str>, system_id: Option<&str>) -> Self {
        XmlEntityRef {
            name: name.to_string(),
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
        }
    }

    /// Returns the entity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the public identifier, if declared.
    pub fn public_id(&self) -> Option<&str> {
        self.public_id.as_deref()
    }

    /// Returns the system identifier, if declared.
    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }
}

/// A document type declaration. The internal subset is opaque text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocType {
    element_name: String,
    public_id: Option<String>,
    system_id: Option<String>,
    internal_subset: Option<String>,
}

impl XmlDocType {
    /// Creates a doctype after checking the root name and ids.
    pub fn new(
        element_name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        internal_subset: Option<&str>,
    ) -> Result<Self> {
        let (prefix, local) = super::namespace::split_qname(element_name);
        if let Some(prefix) = prefix {
            verifier::check_ncname("doctype", prefix)?;
        }
        verifier::check_ncname("doctype", local)?;
        if let Some(id) = public_id {
            verifier::check_public_id(id)?;
        }
        if let Some(id) = system_id {
            verifier::check_system_id(id)?;
        }
        Ok(Self::new_unchecked(
            element_name,
            public_id,
            system_id,
            internal_subset,
        ))
    }

    /// Creates a doctype without checks.
    pub fn new_unchecked(
        element_name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        internal_subset: Option<&str>,
    ) -> Self {
        XmlDocType {
            element_name: element_name.to_string(),
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
            internal_subset: internal_subset.map(str::to_string),
        }
    }

    /// Returns the declared root element name.
    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    /// Returns the public identifier.
    pub fn public_id(&self) -> Option<&str> {
        self.public_id.as_deref()
    }

    /// Returns the system identifier.
    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    /// Returns the internal subset, verbatim.
    pub fn internal_subset(&self) -> Option<&str> {
        self.internal_subset.as_deref()
    }

    /// Replaces the internal subset.
    pub fn set_internal_subset(&mut self, subset: Option<String>) {
        self.internal_subset = subset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(prefix: &str, uri: &str) -> Namespace {
        Namespace::new(prefix, uri).unwrap()
    }

    #[test]
    fn test_element_names() {
        let e = XmlElement::new("rect", ns("svg", "http://www.w3.org/2000/svg")).unwrap();
        assert_eq!(e.name(), "rect");
        assert_eq!(e.qualified_name(), "svg:rect");
        assert_eq!(e.namespace_uri(), "http://www.w3.org/2000/svg");
        assert!(XmlElement::new("bad name", Namespace::none()).is_err());
        assert!(XmlElement::new("p:x", Namespace::none()).is_err());
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let mut e = XmlElement::new("a", Namespace::none()).unwrap();
        let x1 = XmlAttribute::new("x", Namespace::none(), "1", AttributeType::Undeclared).unwrap();
        let x2 = XmlAttribute::new("x", Namespace::none(), "2", AttributeType::Undeclared).unwrap();
        e.add_attribute(x1).unwrap();

        let err = e.add_attribute(x2).unwrap_err();
        assert!(matches!(
            err.structural_kind(),
            Some(StructuralErrorKind::DuplicateAttribute { .. })
        ));
        assert_eq!(e.attributes().len(), 1);
        assert_eq!(e.attribute_value("x"), Some("1"));
    }

    #[test]
    fn test_same_local_name_different_namespace() {
        let mut e = XmlElement::new("a", Namespace::none()).unwrap();
        e.add_attribute(XmlAttribute::new("x", Namespace::none(), "1", AttributeType::Undeclared).unwrap())
            .unwrap();
        e.add_attribute(
            XmlAttribute::new("x", ns("p", "http://example.com/p"), "2", AttributeType::Undeclared)
                .unwrap(),
        )
        .unwrap();
        assert_eq!(e.attributes().len(), 2);
        assert_eq!(e.attribute("x", "http://example.com/p").unwrap().value(), "2");
    }

    #[test]
    fn test_set_attribute_replaces_in_place() {
        let mut e = XmlElement::new("a", Namespace::none()).unwrap();
        for (n, v) in [("x", "1"), ("y", "2")] {
            e.set_attribute(XmlAttribute::new(n, Namespace::none(), v, AttributeType::CData).unwrap())
                .unwrap();
        }
        e.set_attribute(XmlAttribute::new("x", Namespace::none(), "3", AttributeType::CData).unwrap())
            .unwrap();
        let names: Vec<_> = e.attributes().iter().map(|a| (a.name(), a.value())).collect();
        assert_eq!(names, vec![("x", "3"), ("y", "2")]);
    }

    #[test]
    fn test_attribute_prefix_conflict() {
        let mut e = XmlElement::new("a", ns("p", "http://example.com/one")).unwrap();
        let attr =
            XmlAttribute::new("x", ns("p", "http://example.com/two"), "v", AttributeType::Undeclared)
                .unwrap();
        assert!(matches!(
            e.add_attribute(attr).unwrap_err().structural_kind(),
            Some(StructuralErrorKind::NamespaceConflict { .. })
        ));
    }

    #[test]
    fn test_attribute_in_default_namespace_rejected() {
        assert!(XmlAttribute::new("x", ns("", "http://example.com"), "v", AttributeType::Undeclared)
            .is_err());
    }

    #[test]
    fn test_namespace_declarations() {
        let mut e = XmlElement::new("a", Namespace::none()).unwrap();
        e.add_namespace_declaration(ns("p", "http://example.com/p")).unwrap();
        e.add_namespace_declaration(ns("p", "http://example.com/p")).unwrap();
        assert_eq!(e.additional_namespaces().len(), 1);
        assert!(e
            .add_namespace_declaration(ns("p", "http://example.com/q"))
            .is_err());
        assert!(e.remove_namespace_declaration("p").is_some());
        assert!(e.additional_namespaces().is_empty());
    }

    #[test]
    fn test_content_validation() {
        assert!(XmlText::new("plain").is_ok());
        assert!(XmlText::new("\u{0}").is_err());
        assert!(XmlCData::new("x]]>y").is_err());
        assert!(XmlComment::new("a--b").is_err());
        assert!(XmlProcessingInstruction::new("xml", "").is_err());
        assert!(XmlDocType::new("html", Some("-//W3C//DTD XHTML 1.0//EN"), None, None).is_ok());
        assert!(XmlDocType::new("svg:svg", None, None, None).is_ok());
        assert!(XmlEntityRef::new("nbsp", None, Some("ent.xml")).is_ok());
    }

    #[test]
    fn test_pi_pseudo_attributes() {
        let pi =
            XmlProcessingInstruction::new("xml-stylesheet", "href=\"a.xsl\" type='text/xsl'").unwrap();
        assert_eq!(
            pi.pseudo_attributes(),
            vec![
                ("href".to_string(), "a.xsl".to_string()),
                ("type".to_string(), "text/xsl".to_string())
            ]
        );
        assert_eq!(pi.to_string(), "<?xml-stylesheet href=\"a.xsl\" type='text/xsl'?>");
    }

    #[test]
    fn test_attribute_type_keywords() {
        assert_eq!(AttributeType::from_keyword("ID"), AttributeType::Id);
        assert_eq!(AttributeType::from_keyword("(a|b)"), AttributeType::Enumeration);
        assert_eq!(AttributeType::from_keyword("weird"), AttributeType::Undeclared);
    }
}
