use std::sync::Arc;

use dbal::{DbalError, TypeTag};

use crate::pg_type::TypeStorage;

/// One attribute of a composite type.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub type_tag: TypeTag,
    pub storage: TypeStorage,
    /// Dropped attributes keep their slot and always read as null.
    pub dropped: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, type_tag: TypeTag, storage: TypeStorage) -> Self {
        Self {
            name: name.into(),
            type_tag,
            storage,
            dropped: false,
        }
    }
}

/// Field layout of a composite type.
///
/// Packed records do not carry their layout; it is looked up from the type
/// recorded in the record header.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleDescriptor {
    pub type_tag: TypeTag,
    pub typmod: i32,
    pub attrs: Vec<Attribute>,
}

impl TupleDescriptor {
    pub fn new(type_tag: TypeTag, attrs: Vec<Attribute>) -> Self {
        Self {
            type_tag,
            typmod: -1,
            attrs,
        }
    }

    pub fn natts(&self) -> usize {
        self.attrs.len()
    }

    /// Attribute by 1-based field number.
    pub fn attr(&self, fieldno: u32) -> Option<&Attribute> {
        let idx = (fieldno as usize).checked_sub(1)?;
        self.attrs.get(idx)
    }
}

/// Resolves the layout of composite types.
pub trait DescriptorResolver: Send + Sync {
    /// Descriptor of the composite type `tag`. `typmod` only matters for
    /// anonymous `record` types.
    fn lookup_rowtype(&self, tag: TypeTag, typmod: i32) -> Result<Arc<TupleDescriptor>, DbalError>;

    /// Whether datums of type `tag` are packed records.
    fn is_rowtype(&self, tag: TypeTag) -> bool;
}
