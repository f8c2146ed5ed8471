//! Raw XML element tree
//!
//! First parsing stage: reads the document with quick-xml into a plain tree
//! of elements, attributes and text, remembering the line of every element so
//! later stages can point at the offending spot.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use zigzag_core::ParsingError;

/// An XML element with its attributes, text content and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawElement {
    /// Local name (namespace prefix stripped)
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Concatenated text and CDATA content, trimmed
    pub text: String,
    pub children: Vec<RawElement>,
    /// 1-based line of the start tag
    pub line: usize,
}

impl RawElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RawElement> {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn first_child(&self, name: &str) -> Option<&RawElement> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Text content, or `None` when empty
    pub fn text(&self) -> Option<String> {
        (!self.text.is_empty()).then(|| self.text.clone())
    }

    /// Builds a parsing error located at this element
    pub fn error(&self, message: impl Into<String>) -> ParsingError {
        ParsingError::new(&self.name, self.line, message)
    }
}

/// Reads a whole document into its root element
///
/// Fails on malformed XML, on documents without a root element and on
/// content after the root element.
pub fn read_document(bytes: &[u8]) -> Result<RawElement, ParsingError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<RawElement> = Vec::new();
    let mut root: Option<RawElement> = None;
    let mut lines = LineCounter::new(bytes);

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            let position = reader.error_position() as usize;
            ParsingError::new("document", lines.line_at(position), e.to_string())
        })?;
        let line = lines.line_at((reader.buffer_position() as usize).saturating_sub(1));

        match event {
            Event::Start(start) => {
                let element = start_element(&start, line)?;
                if root.is_some() && stack.is_empty() {
                    return Err(element.error("content after the root element"));
                }
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = start_element(&start, line)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None if root.is_none() => root = Some(element),
                    None => return Err(element.error("content after the root element")),
                }
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(ParsingError::new("document", line, "unbalanced end tag"));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| ParsingError::new("document", line, e.to_string()))?;
                append_text(&mut stack, &text, line)?;
            }
            Event::CData(data) => {
                let data = data.into_inner();
                append_text(&mut stack, &String::from_utf8_lossy(&data), line)?;
            }
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(open.error("element is never closed"));
    }

    root.ok_or_else(|| ParsingError::new("document", 1, "document has no root element"))
}

fn start_element(start: &BytesStart<'_>, line: usize) -> Result<RawElement, ParsingError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParsingError::new(&name, line, e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| ParsingError::new(&name, line, e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(RawElement {
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
        line,
    })
}

fn append_text(stack: &mut [RawElement], text: &str, line: usize) -> Result<(), ParsingError> {
    let Some(current) = stack.last_mut() else {
        return Err(ParsingError::new(
            "document",
            line,
            "text outside the root element",
        ));
    };

    let text = text.trim();
    if !text.is_empty() {
        if !current.text.is_empty() {
            current.text.push('\n');
        }
        current.text.push_str(text);
    }
    Ok(())
}

/// Maps byte offsets to 1-based line numbers
///
/// Offsets are expected in increasing order; only the bytes since the last
/// lookup are scanned.
struct LineCounter<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, position: usize) -> usize {
        let position = position.min(self.bytes.len());
        if position >= self.offset {
            self.line += newlines(&self.bytes[self.offset..position]);
        } else {
            self.line -= newlines(&self.bytes[position..self.offset]);
        }
        self.offset = position;
        self.line
    }
}

fn newlines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|b| **b == b'\n').count()
}
