/*!
 * Minimal owned XML tree used by the XML-based annotation formats.
 *
 * Documents are read with `quick-xml` into an [`XmlElement`] tree that keeps
 * text nodes in document order (Transcriber needs the text that follows each
 * inline element). Encoders build the same tree and serialize it back through
 * the `quick-xml` writer, either compact or indented.
 */

use std::borrow::Cow;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::errors::ConversionError;

/// A node inside an element: either a child element or a run of text
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An XML element with its attributes and ordered children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Local name (namespace prefix stripped)
    pub name: String,

    /// Attributes in document order, keys kept as written
    pub attributes: Vec<(String, String)>,

    /// Child nodes in document order
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style text content setter
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
        self
    }

    /// Builder-style child appender
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Attribute value by exact key
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over child elements, skipping text nodes
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given local name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    /// All child elements with the given local name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// Depth-first, document-order search for every descendant with the given name
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        let mut stack: Vec<&XmlElement> = self.elements().collect();
        stack.reverse();
        while let Some(element) = stack.pop() {
            if element.name == name {
                found.push(element);
            }
            let before = stack.len();
            stack.extend(element.elements());
            stack[before..].reverse();
        }
        found
    }

    /// Concatenated direct text content
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Direct text of the named child, if the child exists
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(|c| c.text())
    }

    /// Parse a document and return its root element
    pub fn parse(content: &str) -> Result<Self, ConversionError> {
        let mut reader = Reader::from_str(content);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| xml_error(&reader, e))?;
            match event {
                Event::Start(start) => {
                    stack.push(element_from_start(&start)?);
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        ConversionError::MalformedInput("unbalanced closing tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = text
                            .unescape()
                            .map_err(|e| xml_error(&reader, e))?;
                        push_text(parent, text);
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        let raw = data.into_inner();
                        push_text(parent, String::from_utf8_lossy(&raw));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(ConversionError::MalformedInput(format!(
                "unclosed element <{}>",
                stack.last().map(|e| e.name.as_str()).unwrap_or_default()
            )));
        }

        root.ok_or_else(|| ConversionError::MalformedInput("document has no root element".to_string()))
    }

    /// Serialize the tree as a complete document with an XML declaration.
    ///
    /// With `pretty` the output is indented by four spaces per level. Elements
    /// carrying text keep it inline, so rendering a parsed pretty document
    /// again yields the same text.
    pub fn to_document_string(&self, pretty: bool) -> Result<String, ConversionError> {
        let mut writer = if pretty {
            Writer::new_with_indent(Vec::new(), b' ', 4)
        } else {
            Writer::new(Vec::new())
        };

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        self.write_into(&mut writer, pretty)?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(|e| ConversionError::Encoding(e.to_string()))
    }

    fn write_into(&self, writer: &mut Writer<Vec<u8>>, pretty: bool) -> Result<(), ConversionError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        // Whitespace-only runs next to child elements are layout from a previous
        // indentation pass; in a text-only element they are content
        let has_elements = self.elements().next().is_some();
        let children: Vec<&XmlNode> = self
            .children
            .iter()
            .filter(|node| !(pretty && has_elements && matches!(node, XmlNode::Text(t) if t.trim().is_empty())))
            .collect();

        if children.is_empty() {
            writer.write_event(Event::Empty(start)).map_err(write_error)?;
            return Ok(());
        }

        writer.write_event(Event::Start(start)).map_err(write_error)?;
        for node in children {
            match node {
                XmlNode::Element(child) => child.write_into(writer, pretty)?,
                XmlNode::Text(text) => writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(write_error)?,
            }
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(write_error)?;

        Ok(())
    }
}

fn element_from_start(start: &BytesStart) -> Result<XmlElement, ConversionError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut element = XmlElement::new(&name);

    for attribute in start.attributes() {
        let attribute = attribute
            .map_err(|e| ConversionError::MalformedInput(format!("bad attribute in <{}>: {}", name, e)))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| ConversionError::MalformedInput(format!("bad attribute value in <{}>: {}", name, e)))?;
        element.attributes.push((key, value.into_owned()));
    }

    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), ConversionError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(ConversionError::MalformedInput(
            "document has more than one root element".to_string(),
        )),
    }
}

fn push_text(parent: &mut XmlElement, text: Cow<'_, str>) {
    if let Some(XmlNode::Text(previous)) = parent.children.last_mut() {
        previous.push_str(&text);
    } else {
        parent.children.push(XmlNode::Text(text.into_owned()));
    }
}

fn xml_error(reader: &Reader<&[u8]>, error: quick_xml::Error) -> ConversionError {
    ConversionError::MalformedInput(format!(
        "XML error at byte {}: {}",
        reader.buffer_position(),
        error
    ))
}

fn write_error(error: quick_xml::Error) -> ConversionError {
    ConversionError::MalformedInput(format!("failed to serialize XML: {}", error))
}
