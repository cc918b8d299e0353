/// Native generic representation of a scalar.
///
/// Meaningless without a type tag: the same word is an `int4` or a `float4`
/// depending on who reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datum<'a> {
    /// Pass-by-value payload, zero-extended to 64 bits.
    Word(u64),
    /// Pass-by-reference payload: a whole varlena (header included) or a
    /// fixed-length by-reference value.
    Ref(&'a [u8]),
}

impl<'a> Datum<'a> {
    pub fn from_bool(v: bool) -> Self {
        Datum::Word(v as u64)
    }

    pub fn from_i16(v: i16) -> Self {
        Datum::Word(v as u16 as u64)
    }

    pub fn from_i32(v: i32) -> Self {
        Datum::Word(v as u32 as u64)
    }

    pub fn from_i64(v: i64) -> Self {
        Datum::Word(v as u64)
    }

    pub fn from_oid(v: u32) -> Self {
        Datum::Word(v as u64)
    }

    pub fn from_f32(v: f32) -> Self {
        Datum::Word(v.to_bits() as u64)
    }

    pub fn from_f64(v: f64) -> Self {
        Datum::Word(v.to_bits())
    }

    pub fn word(self) -> Option<u64> {
        match self {
            Datum::Word(w) => Some(w),
            Datum::Ref(_) => None,
        }
    }

    pub fn as_ref_bytes(self) -> Option<&'a [u8]> {
        match self {
            Datum::Ref(b) => Some(b),
            Datum::Word(_) => None,
        }
    }
}

/// A datum together with its null flag.
///
/// When `is_null` is set the datum is garbage and must not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullableDatum<'a> {
    pub value: Datum<'a>,
    pub is_null: bool,
}

impl<'a> NullableDatum<'a> {
    pub fn new(value: Datum<'a>) -> Self {
        Self {
            value,
            is_null: false,
        }
    }

    pub fn null() -> Self {
        Self {
            value: Datum::Word(0),
            is_null: true,
        }
    }
}

impl<'a> From<Datum<'a>> for NullableDatum<'a> {
    fn from(value: Datum<'a>) -> Self {
        Self::new(value)
    }
}
