//! Pull-style building over a cursor positioned on one event at a time.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::builder::DocumentSource;
use super::doctype::DocTypeDecl;
use super::events::{EntityReference, NamespaceDeclaration, RawAttribute, XmlEvent};
use super::sax::ContentHandler;
use super::scanner::QuickXmlScanner;
use crate::error::{Error, Result};

/// Kind of the event a cursor is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    StartDocument,
    DocType,
    StartElement,
    EndElement,
    Characters,
    CData,
    Comment,
    ProcessingInstruction,
    EntityReference,
    EndDocument,
}

/// A cursor over document content.
///
/// [`XmlCursor::advance`] moves to the next event; the accessors describe the
/// current one and return `None` when they do not apply to its kind.
pub trait XmlCursor {
    /// Moves to the next event. Returns `false` once the input is exhausted.
    fn advance(&mut self) -> Result<bool>;

    /// Kind of the current event, or `None` before the first advance and
    /// after the end.
    fn event_kind(&self) -> Option<EventKind>;

    /// Element name for start/end events, entity name for references,
    /// root name for a doctype.
    fn name(&self) -> Option<&str>;

    /// Attributes of a start element.
    fn attributes(&self) -> Option<&[RawAttribute]>;

    /// Namespace declarations of a start element.
    fn namespaces(&self) -> Option<&[NamespaceDeclaration]>;

    /// Character data, CDATA or comment text; PI data.
    fn text(&self) -> Option<&str>;

    /// Target of a processing instruction.
    fn pi_target(&self) -> Option<&str>;

    /// Public id of a doctype or entity reference.
    fn public_id(&self) -> Option<&str>;

    /// System id of a doctype or entity reference.
    fn system_id(&self) -> Option<&str>;

    /// Internal subset of a doctype.
    fn internal_subset(&self) -> Option<&str>;

    /// Replacement text of an entity reference.
    fn replacement_text(&self) -> Option<&str>;

    /// Byte offset in the source, when known.
    fn position(&self) -> Option<u64> {
        None
    }
}

/// Adapts an [`XmlCursor`] for `XmlBuilder::build`.
pub struct CursorAdapter<C> {
    cursor: C,
}

impl<C: XmlCursor> CursorAdapter<C> {
    pub fn new(cursor: C) -> Self {
        CursorAdapter { cursor }
    }
}

impl<C: XmlCursor> DocumentSource for CursorAdapter<C> {
    fn adapter_name(&self) -> &'static str {
        "cursor"
    }

    fn drive(mut self, handler: &mut dyn ContentHandler) -> Result<()> {
        let cursor = &mut self.cursor;
        while cursor.advance()? {
            let Some(kind) = cursor.event_kind() else {
                continue;
            };
            let missing = |what: &str| {
                Error::parse(
                    format!("cursor gave no {} for {:?}", what, kind),
                    cursor.position(),
                )
            };
            match kind {
                EventKind::StartDocument => handler.start_document()?,
                EventKind::DocType => {
                    let decl = DocTypeDecl {
                        name: cursor.name().ok_or_else(|| missing("name"))?.to_string(),
                        public_id: cursor.public_id().map(str::to_string),
                        system_id: cursor.system_id().map(str::to_string),
                        internal_subset: cursor.internal_subset().map(str::to_string),
                    };
                    handler.doc_type(&decl)?;
                }
                EventKind::StartElement => handler.start_element(
                    cursor.name().ok_or_else(|| missing("name"))?,
                    cursor.attributes().unwrap_or_default(),
                    cursor.namespaces().unwrap_or_default(),
                )?,
                EventKind::EndElement => {
                    handler.end_element(cursor.name().ok_or_else(|| missing("name"))?)?
                }
                EventKind::Characters => {
                    handler.characters(cursor.text().ok_or_else(|| missing("text"))?)?
                }
                EventKind::CData => handler.cdata(cursor.text().ok_or_else(|| missing("text"))?)?,
                EventKind::Comment => {
                    handler.comment(cursor.text().ok_or_else(|| missing("text"))?)?
                }
                EventKind::ProcessingInstruction => handler.processing_instruction(
                    cursor.pi_target().ok_or_else(|| missing("target"))?,
                    cursor.text().unwrap_or_default(),
                )?,
                EventKind::EntityReference => {
                    let reference = EntityReference {
                        name: cursor.name().ok_or_else(|| missing("name"))?.to_string(),
                        replacement: cursor.replacement_text().map(str::to_string),
                        public_id: cursor.public_id().map(str::to_string),
                        system_id: cursor.system_id().map(str::to_string),
                    };
                    handler.entity_reference(&reference)?;
                }
                EventKind::EndDocument => handler.end_document()?,
            }
        }
        Ok(())
    }
}

/// Cursor over quick-xml.
pub struct QuickXmlCursor<R> {
    scanner: QuickXmlScanner<R>,
    current: Option<XmlEvent>,
}

impl<'a> QuickXmlCursor<&'a [u8]> {
    /// Reads from a string.
    pub fn from_str(xml: &'a str) -> Self {
        Self::from_scanner(QuickXmlScanner::from_str(xml))
    }
}

impl QuickXmlCursor<BufReader<File>> {
    /// Reads from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_scanner(QuickXmlScanner::from_file(path)?))
    }
}

impl<R: BufRead> QuickXmlCursor<R> {
    /// Reads from any buffered reader.
    pub fn from_reader(reader: R) -> Self {
        Self::from_scanner(QuickXmlScanner::from_reader(reader))
    }

    fn from_scanner(scanner: QuickXmlScanner<R>) -> Self {
        QuickXmlCursor {
            scanner,
            current: None,
        }
    }
}

impl<R: BufRead> XmlCursor for QuickXmlCursor<R> {
    fn advance(&mut self) -> Result<bool> {
        self.current = self.scanner.next_event()?;
        Ok(self.current.is_some())
    }

    fn event_kind(&self) -> Option<EventKind> {
        self.current.as_ref().map(|event| match event {
            XmlEvent::StartDocument => EventKind::StartDocument,
            XmlEvent::DocType(_) => EventKind::DocType,
            XmlEvent::StartElement { .. } => EventKind::StartElement,
            XmlEvent::EndElement { .. } => EventKind::EndElement,
            XmlEvent::Characters(_) => EventKind::Characters,
            XmlEvent::CData(_) => EventKind::CData,
            XmlEvent::Comment(_) => EventKind::Comment,
            XmlEvent::ProcessingInstruction { .. } => EventKind::ProcessingInstruction,
            XmlEvent::EntityReference(_) => EventKind::EntityReference,
            XmlEvent::EndDocument => EventKind::EndDocument,
        })
    }

    fn name(&self) -> Option<&str> {
        match self.current.as_ref()? {
            XmlEvent::StartElement { name, .. } | XmlEvent::EndElement { name } => Some(name),
            XmlEvent::DocType(decl) => Some(&decl.name),
            XmlEvent::EntityReference(r) => Some(&r.name),
            _ => None,
        }
    }

    fn attributes(&self) -> Option<&[RawAttribute]> {
        match self.current.as_ref()? {
            XmlEvent::StartElement { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    fn namespaces(&self) -> Option<&[NamespaceDeclaration]> {
        match self.current.as_ref()? {
            XmlEvent::StartElement { namespaces, .. } => Some(namespaces),
            _ => None,
        }
    }

    fn text(&self) -> Option<&str> {
        match self.current.as_ref()? {
            XmlEvent::Characters(t) | XmlEvent::CData(t) | XmlEvent::Comment(t) => Some(t),
            XmlEvent::ProcessingInstruction { data, .. } => Some(data),
            _ => None,
        }
    }

    fn pi_target(&self) -> Option<&str> {
        match self.current.as_ref()? {
            XmlEvent::ProcessingInstruction { target, .. } => Some(target),
            _ => None,
        }
    }

    fn public_id(&self) -> Option<&str> {
        match self.current.as_ref()? {
            XmlEvent::DocType(decl) => decl.public_id.as_deref(),
            XmlEvent::EntityReference(r) => r.public_id.as_deref(),
            _ => None,
        }
    }

    fn system_id(&self) -> Option<&str> {
        match self.current.as_ref()? {
            XmlEvent::DocType(decl) => decl.system_id.as_deref(),
            XmlEvent::EntityReference(r) => r.system_id.as_deref(),
            _ => None,
        }
    }

    fn internal_subset(&self) -> Option<&str> {
        match self.current.as_ref()? {
            XmlEvent::DocType(decl) => decl.internal_subset.as_deref(),
            _ => None,
        }
    }

    fn replacement_text(&self) -> Option<&str> {
        match self.current.as_ref()? {
            XmlEvent::EntityReference(r) => r.replacement.as_deref(),
            _ => None,
        }
    }

    fn position(&self) -> Option<u64> {
        Some(self.scanner.position())
    }
}
