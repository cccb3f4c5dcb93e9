//! TEI output: element tree, conversion from the rewritten tree, document
//! template and XML serialization

pub mod converter;
pub mod document;
pub mod element;
pub mod serialize;

pub use converter::{ConvertedBody, convert_body};
pub use document::{
    DocumentBody, DocumentHeader, PageBody, TEI_NAMESPACE, article_pid, build_document,
};
pub use element::{XmlElement, XmlNode};
pub use serialize::{XmlReadError, from_bytes, to_bytes};
