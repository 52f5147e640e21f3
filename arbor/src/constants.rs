//! Constants used throughout xml-arbor.

/// URI permanently bound to the `xml` prefix.
pub const XML_NAMESPACE_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// URI reserved for `xmlns` declarations; never bound to an element.
pub const XMLNS_NAMESPACE_URI: &str = "http://www.w3.org/2000/xmlns/";

/// Indent used by `Format::pretty()`.
pub const DEFAULT_INDENT: &str = "  ";

/// Line separator used by every `Format` preset.
pub const DEFAULT_LINE_SEPARATOR: &str = "\n";

/// Encoding written in the XML declaration by default.
pub const DEFAULT_ENCODING: &str = "UTF-8";
