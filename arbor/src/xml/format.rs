//! Output formatting options.

use crate::constants::{DEFAULT_ENCODING, DEFAULT_INDENT, DEFAULT_LINE_SEPARATOR};

/// How Text node content is transformed on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// Written verbatim.
    #[default]
    Preserve,
    /// Leading and trailing whitespace removed.
    Trim,
    /// Each run of whitespace collapsed to a single space.
    Normalize,
}

/// Layout applied between markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// No whitespace added or removed.
    #[default]
    Raw,
    /// Indentation and line breaks inside elements without mixed content.
    Pretty,
    /// Whitespace-only text removed, otherwise like `Raw`.
    Compact,
}

/// Serialization options.
///
/// A `Format` is a plain value: the `with_*` methods return a modified copy.
///
/// ```
/// use xml_arbor::{Format, Style};
///
/// let format = Format::pretty().with_indent("    ").with_omit_declaration(true);
/// assert_eq!(format.style(), Style::Pretty);
/// assert_eq!(format.indent(), "    ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    indent: String,
    line_separator: String,
    encoding: String,
    omit_declaration: bool,
    omit_encoding: bool,
    expand_empty_elements: bool,
    text_mode: TextMode,
    style: Style,
}

impl Default for Format {
    fn default() -> Self {
        Format::raw()
    }
}

impl Format {
    /// Output that re-renders the tree's own content and nothing else.
    pub fn raw() -> Self {
        Format {
            indent: String::new(),
            line_separator: DEFAULT_LINE_SEPARATOR.to_string(),
            encoding: DEFAULT_ENCODING.to_string(),
            omit_declaration: false,
            omit_encoding: false,
            expand_empty_elements: false,
            text_mode: TextMode::Preserve,
            style: Style::Raw,
        }
    }

    /// Two-space indentation where it cannot change meaning.
    pub fn pretty() -> Self {
        Format {
            indent: DEFAULT_INDENT.to_string(),
            style: Style::Pretty,
            ..Format::raw()
        }
    }

    /// Whitespace-only text dropped, remaining text normalized.
    pub fn compact() -> Self {
        Format {
            text_mode: TextMode::Normalize,
            style: Style::Compact,
            ..Format::raw()
        }
    }

    pub fn indent(&self) -> &str {
        &self.indent
    }

    pub fn line_separator(&self) -> &str {
        &self.line_separator
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn omit_declaration(&self) -> bool {
        self.omit_declaration
    }

    pub fn omit_encoding(&self) -> bool {
        self.omit_encoding
    }

    pub fn expand_empty_elements(&self) -> bool {
        self.expand_empty_elements
    }

    pub fn text_mode(&self) -> TextMode {
        self.text_mode
    }

    pub fn style(&self) -> Style {
        self.style
    }

    /// Sets the string inserted per nesting level in pretty output.
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    pub fn with_line_separator(mut self, separator: impl Into<String>) -> Self {
        self.line_separator = separator.into();
        self
    }

    /// Sets the output encoding. It decides which characters are written as
    /// character references.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_omit_declaration(mut self, omit: bool) -> Self {
        self.omit_declaration = omit;
        self
    }

    /// Leaves the `encoding` pseudo-attribute out of the declaration.
    pub fn with_omit_encoding(mut self, omit: bool) -> Self {
        self.omit_encoding = omit;
        self
    }

    /// Writes empty elements as `<a></a>` instead of `<a/>`.
    pub fn with_expand_empty_elements(mut self, expand: bool) -> Self {
        self.expand_empty_elements = expand;
        self
    }

    pub fn with_text_mode(mut self, mode: TextMode) -> Self {
        self.text_mode = mode;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let raw = Format::raw();
        assert_eq!(raw.style(), Style::Raw);
        assert_eq!(raw.indent(), "");
        assert_eq!(raw.encoding(), "UTF-8");
        assert_eq!(raw, Format::default());

        let pretty = Format::pretty();
        assert_eq!(pretty.indent(), "  ");
        assert_eq!(pretty.text_mode(), TextMode::Preserve);

        let compact = Format::compact();
        assert_eq!(compact.style(), Style::Compact);
        assert_eq!(compact.text_mode(), TextMode::Normalize);
    }

    #[test]
    fn test_with_returns_copy() {
        let base = Format::raw();
        let changed = base.clone().with_expand_empty_elements(true).with_encoding("US-ASCII");
        assert!(!base.expand_empty_elements());
        assert!(changed.expand_empty_elements());
        assert_eq!(changed.encoding(), "US-ASCII");
        assert_eq!(changed.line_separator(), "\n");
    }
}
