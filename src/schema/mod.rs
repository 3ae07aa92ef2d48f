//! Content-type schema model: attribute kinds, relation kinds and the value
//! shape each attribute resolves to.

mod attribute;
mod relation;

pub use attribute::{Attribute, ContentType, ValueShape};
pub use relation::{relation_link, Cardinality, RelationGroup, RelationKind};
