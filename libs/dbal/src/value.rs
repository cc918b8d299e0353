use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::DbalError;
use crate::source::ValueSource;

/// Runtime type tag of a value: the native type oid of the source engine.
///
/// The abstraction layer does not interpret it; it is kept so that a null
/// value still knows what type it would have had.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(pub u32);

impl TypeTag {
    pub const INVALID: TypeTag = TypeTag(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "oid {}", self.0)
    }
}

/// Canonical value representation.
///
/// - Scalars: decoded eagerly, cost ~0.
/// - Text, Bytes: `Cow`, borrowed from the native buffer when possible.
/// - Arrays: copied out, native element storage is not guaranteed aligned.
/// - Composite: lazy, fields are only decoded when asked for.
///
/// Equality is bitwise for floats, so a NaN equals an identical NaN.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Oid(u32),
    Text(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),
    Float64Array(Vec<f64>),
    Int32Array(Vec<i32>),
    Composite(CompositeValue<'a>),
}

impl Value<'_> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Oid(_) => "oid",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Float64Array(_) => "float64[]",
            Value::Int32Array(_) => "int32[]",
            Value::Composite(_) => "composite",
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a.to_bits() == b.to_bits(),
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (Value::Oid(a), Value::Oid(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Float64Array(a), Value::Float64Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (Value::Int32Array(a), Value::Int32Array(b)) => a == b,
            (Value::Composite(a), Value::Composite(b)) => a == b,
            _ => false,
        }
    }
}

/// A composite value: the packed record bytes and a value source over them.
///
/// Two composites are equal when their record bytes are equal.
#[derive(Debug, Clone)]
pub struct CompositeValue<'a> {
    bytes: &'a [u8],
    source: Box<dyn ValueSource<'a> + 'a>,
}

impl<'a> CompositeValue<'a> {
    pub fn new(bytes: &'a [u8], source: Box<dyn ValueSource<'a> + 'a>) -> Self {
        Self { bytes, source }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn source(&self) -> &(dyn ValueSource<'a> + 'a) {
        self.source.as_ref()
    }

    /// Shortcut for `source().get_value_by_id(id)`.
    pub fn get(&self, id: u32) -> Result<AbstractValueSPtr<'a>, DbalError> {
        self.source.get_value_by_id(id)
    }
}

impl PartialEq for CompositeValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

/// Type-tagged value handed to algorithmic code.
#[derive(Debug, Clone, PartialEq)]
pub struct AbstractValue<'a> {
    tag: TypeTag,
    value: Value<'a>,
}

/// Shared handle returned by every accessor. Holds no reference back to the
/// source that produced it.
pub type AbstractValueSPtr<'a> = Arc<AbstractValue<'a>>;

impl<'a> AbstractValue<'a> {
    pub fn new(tag: TypeTag, value: Value<'a>) -> Self {
        Self { tag, value }
    }

    pub fn null(tag: TypeTag) -> Self {
        Self {
            tag,
            value: Value::Null,
        }
    }

    pub fn into_sptr(self) -> AbstractValueSPtr<'a> {
        Arc::new(self)
    }

    pub fn type_tag(&self) -> TypeTag {
        self.tag
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, Value::Null)
    }

    pub fn value(&self) -> &Value<'a> {
        &self.value
    }

    pub fn into_value(self) -> Value<'a> {
        self.value
    }

    /// The nullability check for callers that cannot handle NULL.
    pub fn non_null(&self) -> Result<&Value<'a>, DbalError> {
        match self.value {
            Value::Null => Err(DbalError::NullDereference { tag: self.tag }),
            ref v => Ok(v),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self.value {
            Value::Int32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.value {
            Value::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.value {
            Value::Float64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.value {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_f64_slice(&self) -> Option<&[f64]> {
        match &self.value {
            Value::Float64Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeValue<'a>> {
        match &self.value {
            Value::Composite(c) => Some(c),
            _ => None,
        }
    }
}
