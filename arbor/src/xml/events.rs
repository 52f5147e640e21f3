//! Pull-style building over a sequence of discrete event values.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::builder::DocumentSource;
use super::doctype::DocTypeDecl;
use super::sax::ContentHandler;
use super::scanner::QuickXmlScanner;
use crate::error::Result;
use crate::node::AttributeType;

/// An attribute as written in a start tag, before prefix resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    /// Qualified name, e.g. `xml:lang`.
    pub name: String,
    /// Value with references already replaced.
    pub value: String,
    pub attr_type: AttributeType,
}

impl RawAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        RawAttribute {
            name: name.into(),
            value: value.into(),
            attr_type: AttributeType::Undeclared,
        }
    }
}

/// An `xmlns` or `xmlns:prefix` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDeclaration {
    /// Declared prefix; empty for the default namespace.
    pub prefix: String,
    pub uri: String,
}

impl NamespaceDeclaration {
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        NamespaceDeclaration {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }
}

/// A reference to a declared general entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityReference {
    pub name: String,
    /// Replacement text, known for internal entities.
    pub replacement: Option<String>,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// One unit of document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    StartDocument,
    DocType(DocTypeDecl),
    StartElement {
        name: String,
        attributes: Vec<RawAttribute>,
        namespaces: Vec<NamespaceDeclaration>,
    },
    EndElement {
        name: String,
    },
    Characters(String),
    CData(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
    EntityReference(EntityReference),
    EndDocument,
}

impl XmlEvent {
    /// Delivers this event to the matching handler method.
    pub fn dispatch(&self, handler: &mut dyn ContentHandler) -> Result<()> {
        match self {
            XmlEvent::StartDocument => handler.start_document(),
            XmlEvent::DocType(decl) => handler.doc_type(decl),
            XmlEvent::StartElement {
                name,
                attributes,
                namespaces,
            } => handler.start_element(name, attributes, namespaces),
            XmlEvent::EndElement { name } => handler.end_element(name),
            XmlEvent::Characters(text) => handler.characters(text),
            XmlEvent::CData(text) => handler.cdata(text),
            XmlEvent::Comment(text) => handler.comment(text),
            XmlEvent::ProcessingInstruction { target, data } => {
                handler.processing_instruction(target, data)
            }
            XmlEvent::EntityReference(reference) => handler.entity_reference(reference),
            XmlEvent::EndDocument => handler.end_document(),
        }
    }
}

/// Adapts any sequence of events for `XmlBuilder::build`.
///
/// The sequence is consumed exactly once.
pub struct EventAdapter<I> {
    events: I,
}

impl<I> EventAdapter<I>
where
    I: IntoIterator<Item = Result<XmlEvent>>,
{
    pub fn new(events: I) -> Self {
        EventAdapter { events }
    }
}

impl<I> DocumentSource for EventAdapter<I>
where
    I: IntoIterator<Item = Result<XmlEvent>>,
{
    fn adapter_name(&self) -> &'static str {
        "events"
    }

    fn drive(self, handler: &mut dyn ContentHandler) -> Result<()> {
        for event in self.events {
            event?.dispatch(handler)?;
        }
        Ok(())
    }
}

/// Iterator of events read from quick-xml.
///
/// After an error the iterator is fused and yields `None`.
pub struct QuickXmlEventReader<R> {
    scanner: QuickXmlScanner<R>,
    failed: bool,
}

impl<'a> QuickXmlEventReader<&'a [u8]> {
    /// Reads events from a string.
    pub fn from_str(xml: &'a str) -> Self {
        Self::from_scanner(QuickXmlScanner::from_str(xml))
    }
}

impl QuickXmlEventReader<BufReader<File>> {
    /// Reads events from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_scanner(QuickXmlScanner::from_file(path)?))
    }
}

impl<R: BufRead> QuickXmlEventReader<R> {
    /// Reads events from any buffered reader.
    pub fn from_reader(reader: R) -> Self {
        Self::from_scanner(QuickXmlScanner::from_reader(reader))
    }

    fn from_scanner(scanner: QuickXmlScanner<R>) -> Self {
        QuickXmlEventReader {
            scanner,
            failed: false,
        }
    }
}

impl<R: BufRead> Iterator for QuickXmlEventReader<R> {
    type Item = Result<XmlEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.scanner.next_event() {
            Ok(event) => event.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
