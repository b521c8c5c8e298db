//! Namespaced XML trees, flat key/value entries and the schema-driven
//! binding between them.

pub mod binding;
pub mod entry;
pub mod parser;
pub mod tree;
pub mod writer;

pub use binding::{Composite, Schema, SchemaBuilder, SchemaError};
pub use entry::{Entry, EntryStore, ProtectedString, PASSWORD_KEY, TITLE_KEY};
pub use parser::{parse, parse_file, parse_str, ParseError};
pub use tree::XmlNode;
pub use writer::{write, write_document, write_file, WriteError};
