use std::borrow::Cow;

use dbal::{AbstractValue, CompositeValue, DbalError, TypeTag, Value};

use crate::array;
use crate::datum::Datum;
use crate::descriptor::DescriptorResolver;
use crate::pg_type::{
    BOOL, BYTEA, FLOAT4, FLOAT8, FLOAT8_ARRAY, INT2, INT4, INT4_ARRAY, INT8, OID, TEXT, VARCHAR,
};
use crate::pg_value::RecordSource;
use crate::varlena;

fn word(datum: Datum<'_>, tag: TypeTag) -> Result<u64, DbalError> {
    datum.word().ok_or_else(|| {
        DbalError::malformed(format!("{tag} is passed by value, got a by-reference datum"))
    })
}

fn by_ref<'a>(datum: Datum<'a>, tag: TypeTag) -> Result<&'a [u8], DbalError> {
    datum.as_ref_bytes().ok_or_else(|| {
        DbalError::malformed(format!("{tag} is passed by reference, got a by-value datum"))
    })
}

/// Interpret a non-null datum of type `tag`.
///
/// Strings and byte strings borrow from the datum. Composite datums become a
/// lazily decoded [`RecordSource`] over the same bytes.
pub(crate) fn datum_to_value<'a>(
    datum: Datum<'a>,
    tag: TypeTag,
    resolver: &'a dyn DescriptorResolver,
) -> Result<AbstractValue<'a>, DbalError> {
    let value = match tag {
        BOOL => Value::Bool(word(datum, tag)? != 0),
        INT2 => Value::Int16(word(datum, tag)? as u16 as i16),
        INT4 => Value::Int32(word(datum, tag)? as u32 as i32),
        INT8 => Value::Int64(word(datum, tag)? as i64),
        OID => Value::Oid(word(datum, tag)? as u32),
        FLOAT4 => Value::Float32(f32::from_bits(word(datum, tag)? as u32)),
        FLOAT8 => Value::Float64(f64::from_bits(word(datum, tag)?)),
        TEXT | VARCHAR => {
            let payload = varlena::payload(by_ref(datum, tag)?)?;
            let s = std::str::from_utf8(payload)
                .map_err(|e| DbalError::malformed(format!("{tag} is not valid UTF-8: {e}")))?;
            Value::Text(Cow::Borrowed(s))
        }
        BYTEA => Value::Bytes(Cow::Borrowed(varlena::payload(by_ref(datum, tag)?)?)),
        FLOAT8_ARRAY => Value::Float64Array(array::decode_f64(by_ref(datum, tag)?)?),
        INT4_ARRAY => Value::Int32Array(array::decode_i32(by_ref(datum, tag)?)?),
        t if resolver.is_rowtype(t) => {
            let source = RecordSource::new(by_ref(datum, tag)?, resolver)?;
            Value::Composite(CompositeValue::new(source.record().bytes(), Box::new(source)))
        }
        _ => return Err(DbalError::unsupported(tag, "no mapping to an abstract value")),
    };
    Ok(AbstractValue::new(tag, value))
}
