use std::collections::HashMap;
use std::sync::Arc;

use dbal::{DbalError, TypeTag};
use tracing::debug;

use crate::config::{ConfigError, ConnectorConfig};
use crate::descriptor::{Attribute, DescriptorResolver, TupleDescriptor};
use crate::pg_type::{self, FIRST_USER_OID, TypeStorage};

/// Registry of composite type descriptors.
///
/// Named types are keyed by oid. Anonymous `record` descriptors are keyed
/// by the typmod handed out at registration.
#[derive(Debug, Default)]
pub struct TypeCache {
    named: HashMap<TypeTag, Arc<TupleDescriptor>>,
    names: HashMap<String, TypeTag>,
    anonymous: Vec<Arc<TupleDescriptor>>,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache from the composite types declared in `config`.
    pub fn from_config(config: &ConnectorConfig) -> Result<Self, ConfigError> {
        let mut cache = Self::new();
        for ty in &config.types {
            let attrs = ty
                .fields
                .iter()
                .map(|f| {
                    let mut attr = cache.attribute(&f.name, &f.type_name)?;
                    attr.dropped = f.dropped;
                    Ok(attr)
                })
                .collect::<Result<Vec<_>, DbalError>>()
                .map_err(|e| ConfigError::Invalid(format!("type \"{}\": {e}", ty.name)))?;
            cache
                .register(&ty.name, TupleDescriptor::new(TypeTag(ty.oid), attrs))
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        debug!(types = cache.named.len(), "type cache built from config");
        Ok(cache)
    }

    /// Attribute `name` of type `type_name`, resolved against builtins and
    /// the composites registered so far.
    pub fn attribute(&self, name: &str, type_name: &str) -> Result<Attribute, DbalError> {
        if let Some(tag) = pg_type::builtin_by_name(type_name) {
            let storage = pg_type::builtin_storage(tag).unwrap_or(TypeStorage::COMPOSITE);
            return Ok(Attribute::new(name, tag, storage));
        }
        match self.names.get(type_name) {
            Some(&tag) => Ok(Attribute::new(name, tag, TypeStorage::COMPOSITE)),
            None => Err(DbalError::Descriptor(format!(
                "field \"{name}\" has unknown type \"{type_name}\""
            ))),
        }
    }

    /// Register a named composite type.
    pub fn register(&mut self, name: &str, desc: TupleDescriptor) -> Result<(), DbalError> {
        let tag = desc.type_tag;
        if tag.0 < FIRST_USER_OID {
            return Err(DbalError::Descriptor(format!(
                "type \"{name}\": {tag} is in the builtin range (below {FIRST_USER_OID})"
            )));
        }
        if self.named.contains_key(&tag) {
            return Err(DbalError::Descriptor(format!("type \"{name}\": {tag} is already registered")));
        }
        if self.names.contains_key(name) || pg_type::builtin_by_name(name).is_some() {
            return Err(DbalError::Descriptor(format!("type name \"{name}\" is already taken")));
        }
        debug!(type_name = name, oid = tag.0, natts = desc.natts(), "registered composite type");
        self.names.insert(name.to_string(), tag);
        self.named.insert(tag, Arc::new(desc));
        Ok(())
    }

    /// Register an anonymous `record` layout. The returned descriptor carries
    /// the typmod records of this layout must be stamped with.
    pub fn register_anonymous(&mut self, attrs: Vec<Attribute>) -> Arc<TupleDescriptor> {
        let desc = Arc::new(TupleDescriptor {
            type_tag: pg_type::RECORD,
            typmod: self.anonymous.len() as i32,
            attrs,
        });
        debug!(typmod = desc.typmod, natts = desc.natts(), "registered anonymous record type");
        self.anonymous.push(Arc::clone(&desc));
        desc
    }

    pub fn lookup_name(&self, name: &str) -> Option<TypeTag> {
        self.names.get(name).copied()
    }
}

impl DescriptorResolver for TypeCache {
    fn lookup_rowtype(&self, tag: TypeTag, typmod: i32) -> Result<Arc<TupleDescriptor>, DbalError> {
        if tag == pg_type::RECORD {
            return usize::try_from(typmod)
                .ok()
                .and_then(|i| self.anonymous.get(i))
                .cloned()
                .ok_or_else(|| {
                    DbalError::Descriptor(format!("record type with typmod {typmod} has not been registered"))
                });
        }
        self.named
            .get(&tag)
            .cloned()
            .ok_or_else(|| DbalError::Descriptor(format!("{tag} is not a composite type")))
    }

    fn is_rowtype(&self, tag: TypeTag) -> bool {
        tag == pg_type::RECORD || self.named.contains_key(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [[types]]
        name = "point"
        oid = 16385
        fields = [
            { name = "x", type = "float8" },
            { name = "y", type = "double precision" },
        ]

        [[types]]
        name = "labeled_point"
        oid = 16386
        fields = [
            { name = "label", type = "text" },
            { name = "p", type = "point" },
        ]
    "#;

    #[test]
    fn builds_from_config_in_declaration_order() {
        let cfg = ConnectorConfig::parse(CONFIG).unwrap();
        let cache = TypeCache::from_config(&cfg).unwrap();

        assert_eq!(cache.lookup_name("point"), Some(TypeTag(16385)));
        let desc = cache.lookup_rowtype(TypeTag(16386), -1).unwrap();
        assert_eq!(desc.natts(), 2);
        assert_eq!(desc.attr(1).unwrap().type_tag, pg_type::TEXT);
        assert_eq!(desc.attr(2).unwrap().type_tag, TypeTag(16385));
        assert_eq!(desc.attr(2).unwrap().storage, TypeStorage::COMPOSITE);
        assert!(cache.is_rowtype(TypeTag(16385)));
        assert!(!cache.is_rowtype(pg_type::FLOAT8));
    }

    #[test]
    fn forward_references_are_rejected() {
        let cfg = ConnectorConfig::parse(
            r#"
            [[types]]
            name = "outer"
            oid = 16390
            fields = [{ name = "inner", type = "inner" }]
            "#,
        )
        .unwrap();
        let err = TypeCache::from_config(&cfg).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("unknown type \"inner\"")));
    }

    #[test]
    fn oids_must_be_unique_and_user_range() {
        let mut cache = TypeCache::new();
        assert!(cache.register("a", TupleDescriptor::new(TypeTag(16400), vec![])).is_ok());
        assert!(matches!(
            cache.register("b", TupleDescriptor::new(TypeTag(16400), vec![])),
            Err(DbalError::Descriptor(_))
        ));
        assert!(matches!(
            cache.register("c", TupleDescriptor::new(TypeTag(100), vec![])),
            Err(DbalError::Descriptor(_))
        ));
        assert!(matches!(
            cache.register("int4", TupleDescriptor::new(TypeTag(16401), vec![])),
            Err(DbalError::Descriptor(_))
        ));
    }

    #[test]
    fn anonymous_records_are_keyed_by_typmod() {
        let mut cache = TypeCache::new();
        let first = cache.register_anonymous(vec![cache.attribute("a", "int4").unwrap()]);
        let second = cache.register_anonymous(vec![cache.attribute("b", "text").unwrap()]);
        assert_eq!((first.typmod, second.typmod), (0, 1));

        assert_eq!(cache.lookup_rowtype(pg_type::RECORD, 1).unwrap(), second);
        assert!(matches!(
            cache.lookup_rowtype(pg_type::RECORD, 2),
            Err(DbalError::Descriptor(_))
        ));
        assert!(matches!(
            cache.lookup_rowtype(pg_type::RECORD, -1),
            Err(DbalError::Descriptor(_))
        ));
        assert!(cache.is_rowtype(pg_type::RECORD));
    }
}
