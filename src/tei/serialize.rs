//! quick-xml based reading and writing of [`XmlElement`] trees
//!
//! Documents are written without indentation: text inside `p` and `hi` is
//! mixed content and extra whitespace would change it.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io;
use thiserror::Error;

use super::element::{XmlElement, XmlNode};

#[derive(Debug, Error)]
pub enum XmlReadError {
    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("document has no root element")]
    NoRoot,

    #[error("unexpected closing tag </{0}>")]
    Unbalanced(String),
}

/// Serialize `root` as a standalone UTF-8 document with an XML declaration.
pub fn to_bytes(root: &XmlElement) -> io::Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(io::Error::other)?;
    writer
        .write_event(Event::Text(BytesText::new("\n")))
        .map_err(io::Error::other)?;
    write_element(&mut writer, root)?;
    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> io::Result<()> {
    let start = BytesStart::new(element.name.as_str())
        .with_attributes(element.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(io::Error::other);
    }
    writer
        .write_event(Event::Start(start))
        .map_err(io::Error::other)?;
    for child in &element.children {
        match child {
            XmlNode::Element(inner) => write_element(writer, inner)?,
            XmlNode::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(io::Error::other)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(io::Error::other)
}

/// Parse a document back into an element tree. Comments, processing
/// instructions and the declaration are dropped.
pub fn from_bytes(bytes: &[u8]) -> Result<XmlElement, XmlReadError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let malformed = |reader: &Reader<&[u8]>, message: String| XmlReadError::Malformed {
        position: reader.buffer_position() as u64,
        message,
    };

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::new();
    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| malformed(&reader, e.to_string()))?;
        match event {
            Event::Start(ref e) => {
                let element = start_element(e).map_err(|m| malformed(&reader, m))?;
                stack.push(element);
            }
            Event::Empty(ref e) => {
                let element = start_element(e).map_err(|m| malformed(&reader, m))?;
                close(&mut stack, &mut root, element);
            }
            Event::End(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match stack.pop() {
                    Some(element) if element.name == name => close(&mut stack, &mut root, element),
                    _ => return Err(XmlReadError::Unbalanced(name)),
                }
            }
            Event::Text(ref e) => {
                let text = e.unescape().map_err(|err| malformed(&reader, err.to_string()))?;
                if let Some(parent) = stack.last_mut() {
                    parent.push(XmlNode::Text(text.into_owned()));
                }
            }
            Event::CData(ref e) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    parent.push(XmlNode::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.pop() {
        return Err(XmlReadError::Malformed {
            position: reader.buffer_position() as u64,
            message: format!("<{}> is never closed", open.name),
        });
    }
    root.ok_or(XmlReadError::NoRoot)
}

fn start_element(e: &BytesStart<'_>) -> Result<XmlElement, String> {
    let mut element = XmlElement::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|err| err.to_string())?;
        element.attrs.push((key, value.into_owned()));
    }
    Ok(element)
}

fn close(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None => *root = Some(element),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_escapes_and_reads_back() {
        let doc = XmlElement::new("p")
            .with_attr("rend", "a&b")
            .with_text("1 < 2 ")
            .with_child(XmlElement::new("hi").with_text("és"))
            .with_child(XmlElement::new("note"));

        let bytes = to_bytes(&doc).expect("serialize");
        let text = String::from_utf8(bytes.clone()).expect("utf8");
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<p rend=\"a&amp;b\">"));
        assert!(text.contains("1 &lt; 2 <hi>és</hi><note/>"));

        let parsed = from_bytes(&bytes).expect("parse");
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_unbalanced_input_is_rejected() {
        assert!(from_bytes(b"<p><hi></p>").is_err());
        assert!(matches!(from_bytes(b"  "), Err(XmlReadError::NoRoot)));
    }
}
