//! Owned element trees

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::MarkupError;

/// A node inside an [`Element`]
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its qualified name, attributes and children
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Qualified name as written in the document, e.g. `Objecten:Pand`
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Parse the first root element of a markup fragment
    ///
    /// Fragments cut out of a larger document usually lack their namespace
    /// declarations; names are kept as written, so this is fine.
    pub fn parse_fragment(text: &str) -> Result<Self, MarkupError> {
        let mut reader = Reader::from_str(text);

        loop {
            match reader.read_event()? {
                Event::Start(start) => return read_subtree(&mut reader, &start),
                Event::Empty(start) => return Element::from_start(&start),
                Event::Eof => return Err(MarkupError::NoRootElement),
                _ => {}
            }
        }
    }

    pub(crate) fn from_start(start: &BytesStart<'_>) -> Result<Self, MarkupError> {
        let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));

        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }

        Ok(element)
    }

    /// Name without its namespace prefix
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Attribute value by qualified name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute value by local name, ignoring any prefix
    pub fn attribute_local(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| local_part(key) == local)
            .map(|(_, value)| value.as_str())
    }

    /// Direct child elements in document order
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First direct child with the given local name
    pub fn child_local(&self, local: &str) -> Option<&Element> {
        self.child_elements().find(|child| child.local_name() == local)
    }

    /// This element followed by all of its descendants, in document order
    pub fn descendants_or_self(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Concatenated text content of this element and its descendants, trimmed
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out.trim().to_string()
    }

    /// Serialize this element back to markup
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        write_markup(self, &mut out);
        out
    }
}

/// Pre-order iterator over an element tree
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        // reversed so the first child is visited next
        self.stack.extend(element.child_elements().collect::<Vec<_>>().into_iter().rev());
        Some(element)
    }
}

/// Read the remainder of an element whose start tag was just consumed
pub(crate) fn read_subtree<'i>(
    reader: &mut Reader<&'i [u8]>,
    start: &BytesStart<'_>,
) -> Result<Element, MarkupError> {
    let mut stack: Vec<Element> = Vec::new();
    let mut current = Element::from_start(start)?;

    loop {
        match reader.read_event()? {
            Event::Start(child) => {
                let child = Element::from_start(&child)?;
                stack.push(std::mem::replace(&mut current, child));
            }
            Event::Empty(child) => {
                current.children.push(Node::Element(Element::from_start(&child)?));
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                if !text.trim().is_empty() {
                    current.children.push(Node::Text(text.into_owned()));
                }
            }
            Event::CData(data) => {
                let data = data.into_inner();
                current
                    .children
                    .push(Node::Text(String::from_utf8_lossy(&data).into_owned()));
            }
            Event::End(_) => {
                let finished = current;
                match stack.pop() {
                    Some(mut parent) => {
                        parent.children.push(Node::Element(finished));
                        current = parent;
                    }
                    None => return Ok(finished),
                }
            }
            Event::Eof => return Err(MarkupError::UnexpectedEof(current.name)),
            _ => {}
        }
    }
}

pub(crate) fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn collect_text(element: &Element, out: &mut String) {
    for node in &element.children {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(child) => collect_text(child, out),
        }
    }
}

fn write_markup(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&quick_xml::escape::escape(value.as_str()));
        out.push('"');
    }

    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for node in &element.children {
        match node {
            Node::Text(text) => out.push_str(&quick_xml::escape::escape(text.as_str())),
            Node::Element(child) => write_markup(child, out),
        }
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}
