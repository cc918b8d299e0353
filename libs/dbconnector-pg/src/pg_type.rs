use dbal::TypeTag;

// ════════════════════════════════════════════════════════════════
//  Builtin type oids
// ════════════════════════════════════════════════════════════════

pub const BOOL: TypeTag = TypeTag(16);
pub const BYTEA: TypeTag = TypeTag(17);
pub const INT8: TypeTag = TypeTag(20);
pub const INT2: TypeTag = TypeTag(21);
pub const INT4: TypeTag = TypeTag(23);
pub const TEXT: TypeTag = TypeTag(25);
pub const OID: TypeTag = TypeTag(26);
pub const FLOAT4: TypeTag = TypeTag(700);
pub const FLOAT8: TypeTag = TypeTag(701);
pub const INT4_ARRAY: TypeTag = TypeTag(1007);
pub const FLOAT8_ARRAY: TypeTag = TypeTag(1022);
pub const VARCHAR: TypeTag = TypeTag(1043);
/// Anonymous composite. The typmod identifies the registered descriptor.
pub const RECORD: TypeTag = TypeTag(2249);

/// Oids below this are reserved for builtin types.
pub const FIRST_USER_OID: u32 = 16384;

// ════════════════════════════════════════════════════════════════
//  Storage properties
// ════════════════════════════════════════════════════════════════

/// Alignment requirement of a stored attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Char,
    Short,
    Int,
    Double,
}

impl Align {
    pub fn bytes(self) -> usize {
        match self {
            Align::Char => 1,
            Align::Short => 2,
            Align::Int => 4,
            Align::Double => 8,
        }
    }

    /// Round `offset` up to this alignment.
    pub fn align(self, offset: usize) -> usize {
        let a = self.bytes();
        (offset + a - 1) & !(a - 1)
    }
}

/// How values of a type are laid out.
///
/// `len == -1` marks a varlena: a 4-byte length header followed by payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeStorage {
    pub len: i16,
    pub align: Align,
    pub by_val: bool,
}

impl TypeStorage {
    pub const VARLENA: TypeStorage = TypeStorage {
        len: -1,
        align: Align::Int,
        by_val: false,
    };

    /// Composite values are varlenas aligned like their widest member could be.
    pub const COMPOSITE: TypeStorage = TypeStorage {
        len: -1,
        align: Align::Double,
        by_val: false,
    };

    const fn by_val(len: i16, align: Align) -> Self {
        Self {
            len,
            align,
            by_val: true,
        }
    }

    pub fn is_varlena(&self) -> bool {
        self.len == -1
    }
}

/// Storage properties of a builtin type, `None` for composites and unknown oids.
pub fn builtin_storage(tag: TypeTag) -> Option<TypeStorage> {
    let storage = match tag {
        BOOL => TypeStorage::by_val(1, Align::Char),
        INT2 => TypeStorage::by_val(2, Align::Short),
        INT4 | OID | FLOAT4 => TypeStorage::by_val(4, Align::Int),
        INT8 | FLOAT8 => TypeStorage::by_val(8, Align::Double),
        BYTEA | TEXT | VARCHAR => TypeStorage::VARLENA,
        INT4_ARRAY => TypeStorage::VARLENA,
        FLOAT8_ARRAY => TypeStorage {
            align: Align::Double,
            ..TypeStorage::VARLENA
        },
        _ => return None,
    };
    Some(storage)
}

/// Resolve a SQL type name (as written in configuration) to a builtin oid.
pub fn builtin_by_name(name: &str) -> Option<TypeTag> {
    let tag = match name.trim().to_ascii_lowercase().as_str() {
        "bool" | "boolean" => BOOL,
        "bytea" => BYTEA,
        "int8" | "bigint" => INT8,
        "int2" | "smallint" => INT2,
        "int4" | "int" | "integer" => INT4,
        "text" => TEXT,
        "oid" => OID,
        "float4" | "real" => FLOAT4,
        "float8" | "double precision" => FLOAT8,
        "int4[]" | "integer[]" => INT4_ARRAY,
        "float8[]" | "double precision[]" => FLOAT8_ARRAY,
        "varchar" | "character varying" => VARCHAR,
        "record" => RECORD,
        _ => return None,
    };
    Some(tag)
}
