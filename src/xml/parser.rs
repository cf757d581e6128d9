use log::trace;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::err::{XmlError, XmlResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEntryKind {
    XmlDeclaration,
    StartTag,
    EmptyTag,
    EndTag,
    Content,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

/// One token of the request body.
///
/// For tags `text` is the element name, for content it is the unescaped character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlEntry {
    pub kind: XmlEntryKind,
    pub text: String,
    pub attributes: Vec<XmlAttribute>,
    pub line: usize,
}

impl XmlEntry {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn is_start_of(&self, name: &str) -> bool {
        matches!(self.kind, XmlEntryKind::StartTag | XmlEntryKind::EmptyTag) && self.text == name
    }
}

/// Forward-only cursor over a CIM-XML document.
///
/// Wraps `quick-xml`, skipping comments, processing instructions and whitespace-only text.
/// Entries read ahead can be pushed back, which is how the element readers implement
/// "test for tag X" without any other form of backtracking.
pub struct XmlParser<'a> {
    reader: Reader<&'a [u8]>,
    input: &'a str,
    open_tags: Vec<String>,
    put_back: Vec<XmlEntry>,
    root_closed: bool,
    elements: usize,
    max_elements: usize,
    line: usize,
    line_scanned_to: usize,
}

impl<'a> XmlParser<'a> {
    pub fn new(input: &'a str, max_elements: usize) -> Self {
        let mut reader = Reader::from_str(input);
        let config = reader.config_mut();
        config.trim_text(false);
        config.expand_empty_elements = false;
        config.check_end_names = true;
        config.check_comments = true;

        XmlParser {
            reader,
            input,
            open_tags: Vec::new(),
            put_back: Vec::new(),
            root_closed: false,
            elements: 0,
            max_elements,
            line: 1,
            line_scanned_to: 0,
        }
    }

    /// 1-based line of the most recently read position.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn put_back(&mut self, entry: XmlEntry) {
        self.put_back.push(entry);
    }

    fn update_line(&mut self) {
        let pos = usize::try_from(self.reader.buffer_position())
            .unwrap_or(usize::MAX)
            .min(self.input.len());
        if pos > self.line_scanned_to {
            self.line += self.input.as_bytes()[self.line_scanned_to..pos]
                .iter()
                .filter(|&&b| b == b'\n')
                .count();
            self.line_scanned_to = pos;
        }
    }

    fn not_well_formed(&self, message: impl Into<String>) -> XmlError {
        XmlError::not_well_formed(self.line, message)
    }

    /// Next significant entry, or `None` once the document is exhausted.
    pub fn next(&mut self) -> XmlResult<Option<XmlEntry>> {
        if let Some(entry) = self.put_back.pop() {
            return Ok(Some(entry));
        }

        loop {
            let line = self.line;
            let event = self.reader.read_event();
            self.update_line();

            let event = event.map_err(|e| self.not_well_formed(e.to_string()))?;
            trace!("xml event at line {}: {:?}", line, event);

            match event {
                Event::Decl(decl) => {
                    let mut attributes = Vec::new();
                    let version = decl
                        .version()
                        .map_err(|e| self.not_well_formed(e.to_string()))?;
                    attributes.push(XmlAttribute {
                        name: "version".to_owned(),
                        value: String::from_utf8_lossy(&version).into_owned(),
                    });
                    if let Some(encoding) = decl.encoding() {
                        let encoding = encoding.map_err(|e| self.not_well_formed(e.to_string()))?;
                        attributes.push(XmlAttribute {
                            name: "encoding".to_owned(),
                            value: String::from_utf8_lossy(&encoding).into_owned(),
                        });
                    }
                    return Ok(Some(XmlEntry {
                        kind: XmlEntryKind::XmlDeclaration,
                        text: "xml".to_owned(),
                        attributes,
                        line,
                    }));
                }
                Event::Start(start) => {
                    let entry = self.tag_entry(&start, XmlEntryKind::StartTag, line)?;
                    self.open_tags.push(entry.text.clone());
                    return Ok(Some(entry));
                }
                Event::Empty(start) => {
                    let entry = self.tag_entry(&start, XmlEntryKind::EmptyTag, line)?;
                    if self.open_tags.is_empty() {
                        self.root_closed = true;
                    }
                    return Ok(Some(entry));
                }
                Event::End(end) => {
                    let name = self.utf8(end.name().as_ref())?;
                    match self.open_tags.pop() {
                        Some(open) if open == name => {}
                        Some(open) => {
                            return Err(self.not_well_formed(format!(
                                "end tag </{name}> does not match start tag <{open}>"
                            )));
                        }
                        None => {
                            return Err(self.not_well_formed(format!("unmatched end tag </{name}>")));
                        }
                    }
                    if self.open_tags.is_empty() {
                        self.root_closed = true;
                    }
                    return Ok(Some(XmlEntry {
                        kind: XmlEntryKind::EndTag,
                        text: name,
                        attributes: Vec::new(),
                        line,
                    }));
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| self.not_well_formed(e.to_string()))?;
                    if text.trim().is_empty() {
                        continue;
                    }
                    return self.content_entry(text.into_owned(), line).map(Some);
                }
                Event::CData(cdata) => {
                    let text = self.utf8(&cdata.into_inner())?;
                    return self.content_entry(text, line).map(Some);
                }
                Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
                Event::Eof => {
                    if let Some(open) = self.open_tags.last() {
                        return Err(self.not_well_formed(format!(
                            "unexpected end of input, <{open}> is not closed"
                        )));
                    }
                    return Ok(None);
                }
            }
        }
    }

    fn utf8(&self, bytes: &[u8]) -> XmlResult<String> {
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| self.not_well_formed(e.to_string()))
    }

    fn content_entry(&self, text: String, line: usize) -> XmlResult<XmlEntry> {
        if self.open_tags.is_empty() {
            return Err(self.not_well_formed("character data outside of the root element"));
        }
        Ok(XmlEntry {
            kind: XmlEntryKind::Content,
            text,
            attributes: Vec::new(),
            line,
        })
    }

    fn tag_entry(&mut self, start: &BytesStart<'_>, kind: XmlEntryKind, line: usize) -> XmlResult<XmlEntry> {
        if self.open_tags.is_empty() && self.root_closed {
            return Err(self.not_well_formed("more than one root element"));
        }

        self.elements += 1;
        if self.elements > self.max_elements {
            return Err(XmlError::TooManyElements {
                line,
                limit: self.max_elements,
            });
        }

        let name = self.utf8(start.name().as_ref())?;
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.not_well_formed(e.to_string()))?;
            let value = attr
                .unescape_value()
                .map_err(|e| self.not_well_formed(e.to_string()))?;
            attributes.push(XmlAttribute {
                name: self.utf8(attr.key.as_ref())?,
                value: value.into_owned(),
            });
        }

        Ok(XmlEntry {
            kind,
            text: name,
            attributes,
            line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn collect(input: &str) -> XmlResult<Vec<(XmlEntryKind, String)>> {
        let mut parser = XmlParser::new(input, 1000);
        let mut out = Vec::new();
        while let Some(entry) = parser.next()? {
            out.push((entry.kind, entry.text));
        }
        Ok(out)
    }

    #[test]
    fn test_tokens() {
        let tokens = collect(
            "<?xml version=\"1.0\"?>\n<!-- c --><A x=\"1\">\n  <B/>\n  <C>t&amp;t</C>\n</A>",
        )
        .unwrap();
        assert_eq!(
            tokens,
            vec![
                (XmlEntryKind::XmlDeclaration, "xml".to_owned()),
                (XmlEntryKind::StartTag, "A".to_owned()),
                (XmlEntryKind::EmptyTag, "B".to_owned()),
                (XmlEntryKind::StartTag, "C".to_owned()),
                (XmlEntryKind::Content, "t&t".to_owned()),
                (XmlEntryKind::EndTag, "C".to_owned()),
                (XmlEntryKind::EndTag, "A".to_owned()),
            ]
        );
    }

    #[test]
    fn test_put_back() {
        let mut parser = XmlParser::new("<A><B/></A>", 10);
        let a = parser.next().unwrap().unwrap();
        parser.put_back(a.clone());
        assert_eq!(parser.next().unwrap().unwrap(), a);
    }

    #[test]
    fn test_mismatched_tags() {
        let err = collect("<A>\n<B></A>").unwrap_err();
        assert!(matches!(err, XmlError::NotWellFormed { .. }));
    }

    #[test]
    fn test_unclosed_tag() {
        let err = collect("<A><B></B>").unwrap_err();
        assert!(matches!(err, XmlError::NotWellFormed { .. }), "{err}");
    }

    #[test]
    fn test_line_numbers() {
        let mut parser = XmlParser::new("<A>\n\n<B/>\n</A>", 10);
        parser.next().unwrap();
        let b = parser.next().unwrap().unwrap();
        assert_eq!(b.text, "B");
        assert_eq!(b.line, 3);
    }

    #[test]
    fn test_element_limit() {
        let mut parser = XmlParser::new("<A><B/><B/><B/></A>", 3);
        let mut result = Ok(None);
        for _ in 0..4 {
            result = parser.next();
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(XmlError::TooManyElements { limit: 3, .. })));
    }

    #[test]
    fn test_attributes_are_unescaped() {
        let mut parser = XmlParser::new(r#"<A NAME="a&lt;b"/>"#, 10);
        let a = parser.next().unwrap().unwrap();
        assert_eq!(a.attribute("NAME"), Some("a<b"));
        assert_eq!(a.attribute("OTHER"), None);
    }
}
