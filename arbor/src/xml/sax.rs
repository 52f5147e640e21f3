//! Push-style building: a source calls [`ContentHandler`] methods as it scans.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::builder::DocumentSource;
use super::doctype::DocTypeDecl;
use super::events::{EntityReference, NamespaceDeclaration, RawAttribute};
use super::scanner::QuickXmlScanner;
use crate::error::Result;

/// Receives document content as a sequence of callbacks.
///
/// Every method defaults to doing nothing, so a handler only overrides the
/// events it cares about. Returning an error aborts the source.
///
/// Attribute and element names are qualified (`prefix:local`); the namespace
/// declarations made on an element arrive separately from its attributes.
#[allow(unused_variables)]
pub trait ContentHandler {
    /// Called once, before any other event.
    fn start_document(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called for a `<!DOCTYPE>` declaration.
    fn doc_type(&mut self, decl: &DocTypeDecl) -> Result<()> {
        Ok(())
    }

    /// Called for a start tag (or the start of an empty-element tag).
    fn start_element(
        &mut self,
        name: &str,
        attributes: &[RawAttribute],
        namespaces: &[NamespaceDeclaration],
    ) -> Result<()> {
        Ok(())
    }

    /// Called for an end tag (or the end of an empty-element tag).
    fn end_element(&mut self, name: &str) -> Result<()> {
        Ok(())
    }

    /// Called for character data. Adjacent calls may split one text run.
    fn characters(&mut self, text: &str) -> Result<()> {
        Ok(())
    }

    /// Called for a CDATA section.
    fn cdata(&mut self, text: &str) -> Result<()> {
        Ok(())
    }

    /// Called for a comment.
    fn comment(&mut self, text: &str) -> Result<()> {
        Ok(())
    }

    /// Called for a processing instruction.
    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<()> {
        Ok(())
    }

    /// Called for a reference to a declared general entity.
    fn entity_reference(&mut self, reference: &EntityReference) -> Result<()> {
        Ok(())
    }

    /// Called once, after every other event.
    fn end_document(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A source that pushes its content into a handler.
pub trait PushSource {
    /// Scans the whole input, calling `handler` for each event in order.
    fn parse(self, handler: &mut dyn ContentHandler) -> Result<()>;
}

/// Adapts a [`PushSource`] for `XmlBuilder::build`.
pub struct PushAdapter<P> {
    source: P,
}

impl<P: PushSource> PushAdapter<P> {
    pub fn new(source: P) -> Self {
        PushAdapter { source }
    }
}

impl<P: PushSource> DocumentSource for PushAdapter<P> {
    fn adapter_name(&self) -> &'static str {
        "push"
    }

    fn drive(self, handler: &mut dyn ContentHandler) -> Result<()> {
        self.source.parse(handler)
    }
}

/// Push parser over quick-xml.
pub struct QuickXmlPushParser<R> {
    scanner: QuickXmlScanner<R>,
}

impl<'a> QuickXmlPushParser<&'a [u8]> {
    /// Parses XML from a string.
    pub fn from_str(xml: &'a str) -> Self {
        QuickXmlPushParser {
            scanner: QuickXmlScanner::from_str(xml),
        }
    }
}

impl QuickXmlPushParser<BufReader<File>> {
    /// Parses XML from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(QuickXmlPushParser {
            scanner: QuickXmlScanner::from_file(path)?,
        })
    }
}

impl<R: BufRead> QuickXmlPushParser<R> {
    /// Parses XML from any buffered reader.
    pub fn from_reader(reader: R) -> Self {
        QuickXmlPushParser {
            scanner: QuickXmlScanner::from_reader(reader),
        }
    }
}

impl<R: BufRead> PushSource for QuickXmlPushParser<R> {
    fn parse(mut self, handler: &mut dyn ContentHandler) -> Result<()> {
        while let Some(event) = self.scanner.next_event()? {
            event.dispatch(handler)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl ContentHandler for Recorder {
        fn start_element(
            &mut self,
            name: &str,
            attributes: &[RawAttribute],
            namespaces: &[NamespaceDeclaration],
        ) -> Result<()> {
            self.calls.push(format!(
                "start {} attrs={} ns={}",
                name,
                attributes.len(),
                namespaces.len()
            ));
            Ok(())
        }

        fn end_element(&mut self, name: &str) -> Result<()> {
            self.calls.push(format!("end {}", name));
            Ok(())
        }

        fn characters(&mut self, text: &str) -> Result<()> {
            self.calls.push(format!("text {:?}", text));
            Ok(())
        }
    }

    #[test]
    fn test_push_parser_calls_handler_in_order() {
        let mut recorder = Recorder::default();
        QuickXmlPushParser::from_str(r#"<a xmlns:p="urn:p" x="1"><b/>t</a>"#)
            .parse(&mut recorder)
            .unwrap();
        assert_eq!(
            recorder.calls,
            vec![
                "start a attrs=1 ns=1",
                "start b attrs=0 ns=0",
                "end b",
                "text \"t\"",
                "end a",
            ]
        );
    }

    #[test]
    fn test_handler_error_stops_parse() {
        struct Fails;
        impl ContentHandler for Fails {
            fn comment(&mut self, _text: &str) -> Result<()> {
                Err(crate::Error::parse("stop", None))
            }
        }
        let result = QuickXmlPushParser::from_str("<a><!--x--><b/></a>").parse(&mut Fails);
        assert!(result.is_err());
    }
}
