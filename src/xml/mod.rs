//! CIM-XML token cursor, element readers and response writer.

mod parser;
pub(crate) mod reader;
pub(crate) mod writer;

pub use self::parser::{XmlAttribute, XmlEntry, XmlEntryKind, XmlParser};
