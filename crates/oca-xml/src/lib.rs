//! Parse OpenNebula XML payloads into attribute views and templates using quick-xml.

mod template;
mod view;

use std::io::Cursor;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

pub use template::{MultiTags, Template, NO_MULTI_TAGS, VM_TEMPLATE_TAGS};
pub use view::{AttributeView, Field, FieldDecl, FieldRule, Value};

#[derive(Debug, Error)]
pub enum XmlError {
    /// The document is not well-formed XML.
    #[error("xml: {0}")]
    Xml(String),
    /// The document contains no root element.
    #[error("document has no root element")]
    Empty,
    /// The root tag differs from the tag the caller expected.
    #[error("invalid root: expected <{expected}>, found <{found}>")]
    InvalidRoot { expected: String, found: String },
    /// Neither a declared field nor a child element matches the name.
    #[error("field not found: {0}")]
    FieldNotFound(String),
    /// A field exists but its content cannot be read as the requested type.
    #[error("cannot read field {field} as {expected}: {value:?}")]
    Convert {
        field: String,
        value: String,
        expected: &'static str,
    },
}

/// Owned XML element: tag, text content, and child elements.
///
/// Text is kept as written, including inner and surrounding spaces; text
/// made only of whitespace (indentation between tags) is dropped.
///
/// Attributes are dropped while parsing; every value the API exposes lives in
/// child elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    tag: String,
    text: Option<String>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    /// Create an element with no text and no children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Builder-style setter for the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text = if text.is_empty() { None } else { Some(text) };
        self
    }

    /// Builder-style append of a child element.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Text content, `None` when the element carries no text.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    pub fn into_children(self) -> Vec<XmlElement> {
        self.children
    }

    /// Case-insensitive tag comparison.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    /// First direct child whose tag matches `tag` ignoring ASCII case.
    pub fn find(&self, tag: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.has_tag(tag))
    }

    /// All direct children whose tag matches `tag`, in document order.
    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.has_tag(tag))
    }

    /// Serialize the element back to XML text, escaping character data.
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        self.write_into(&mut writer)?;
        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|err| XmlError::Xml(format!("invalid UTF-8: {err}")))
    }

    fn write_into(&self, writer: &mut Writer<Cursor<Vec<u8>>>) -> Result<(), XmlError> {
        if self.text.is_none() && self.children.is_empty() {
            return write_event(writer, Event::Empty(BytesStart::new(self.tag.as_str())));
        }
        write_event(writer, Event::Start(BytesStart::new(self.tag.as_str())))?;
        if let Some(text) = &self.text {
            write_event(writer, Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write_into(writer)?;
        }
        write_event(writer, Event::End(BytesEnd::new(self.tag.as_str())))
    }
}

fn write_event(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<(), XmlError> {
    writer
        .write_event(event)
        .map_err(|err| XmlError::Xml(err.to_string()))
}

/// Parse a complete XML document into its root element.
pub fn parse_document(xml: &str) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                stack.push(XmlElement::new(tag_name(&e)));
            }
            Ok(Event::Empty(e)) => {
                attach(XmlElement::new(tag_name(&e)), &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::Xml("unexpected closing tag".into()))?;
                attach(element, &mut stack, &mut root)?;
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|err| XmlError::Xml(err.to_string()))?;
                append_text(&mut stack, &text);
            }
            Ok(Event::CData(c)) => {
                let text = std::str::from_utf8(&c)
                    .map_err(|err| XmlError::Xml(format!("invalid UTF-8 in CDATA: {err}")))?;
                append_text(&mut stack, text);
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(XmlError::Xml(err.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Xml(format!("unclosed element <{}>", open.tag)));
    }
    root.ok_or(XmlError::Empty)
}

fn tag_name(event: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(event.name().as_ref()).into_owned()
}

fn attach(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if let Some(existing) = root.as_ref() {
        return Err(XmlError::Xml(format!(
            "multiple root elements: <{}> after <{}>",
            element.tag, existing.tag
        )));
    }
    *root = Some(element);
    Ok(())
}

// Text outside the root element is ignored.
fn append_text(stack: &mut [XmlElement], text: &str) {
    if text.trim().is_empty() {
        return;
    }
    if let Some(current) = stack.last_mut() {
        current.text.get_or_insert_with(String::new).push_str(text);
    }
}
