//! Schema-driven binding of typed records.
//!
//! A [`Schema`] declares composites and their members as data. A
//! [`Composite`] instance walks that declaration to move values between a
//! namespaced [`XmlNode`](crate::tree::XmlNode) tree and a flat
//! [`EntryStore`](crate::entry::EntryStore), tracking validity on the way.

pub mod composite;
pub mod scalar;
pub mod schema;
pub mod value;

pub use composite::{Composite, FieldState, Slot};
pub use scalar::{LeafDef, Scalar};
pub use schema::{
    DocumentRoot, Field, Member, MemberKind, NodeDef, NodeId, NodeSpec, Presence, Schema,
    SchemaBuilder, SchemaError,
};
pub use value::{FieldKind, Protection, Rule, Value};
