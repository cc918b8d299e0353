//! Packed composite records.
//!
//! ```text
//! 0   u32 t_len     total size, doubles as the varlena header
//! 4   u32 typeid    composite type oid (`record` for anonymous types)
//! 8   i32 typmod
//! 12  u16 natts     attributes physically stored
//! 14  u8  infomask  HASNULL
//! 15  u8  t_hoff    start of attribute data, multiple of 8
//! 16  null bitmap   ceil(natts / 8) bytes when HASNULL, bit set = present
//! ```
//!
//! Attributes follow in declaration order, each aligned per its storage.
//! Null attributes take no space.

use dbal::{DbalError, IdDomain, TypeTag};

use crate::datum::{Datum, NullableDatum};
use crate::descriptor::{Attribute, TupleDescriptor};
use crate::pg_type::Align;
use crate::varlena;

pub const HEADER_LEN: usize = 16;
const HASNULL: u8 = 0x01;

fn bitmap_len(natts: usize) -> usize {
    natts.div_ceil(8)
}

/// Read-only view over a packed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedRecord<'a> {
    bytes: &'a [u8],
}

impl<'a> PackedRecord<'a> {
    /// Validate the header of the record at the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Result<Self, DbalError> {
        let bytes = varlena::slice(bytes).map_err(|e| e.with_context("record"))?;
        if bytes.len() < HEADER_LEN {
            return Err(DbalError::malformed(format!(
                "record of {} bytes is shorter than its header",
                bytes.len()
            )));
        }
        let record = Self { bytes };
        let min_hoff = HEADER_LEN
            + if record.has_nulls() {
                bitmap_len(record.natts())
            } else {
                0
            };
        let hoff = record.hoff();
        if hoff < min_hoff || hoff > bytes.len() || hoff % 8 != 0 {
            return Err(DbalError::malformed(format!(
                "record data offset {hoff} is invalid for {} attributes in {} bytes",
                record.natts(),
                bytes.len()
            )));
        }
        Ok(record)
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn type_tag(&self) -> TypeTag {
        TypeTag(u32::from_le_bytes([self.bytes[4], self.bytes[5], self.bytes[6], self.bytes[7]]))
    }

    pub fn typmod(&self) -> i32 {
        i32::from_le_bytes([self.bytes[8], self.bytes[9], self.bytes[10], self.bytes[11]])
    }

    /// Number of attributes physically stored. May be less than the
    /// descriptor's count when columns were added after the record was built.
    pub fn natts(&self) -> usize {
        u16::from_le_bytes([self.bytes[12], self.bytes[13]]) as usize
    }

    pub fn has_nulls(&self) -> bool {
        self.bytes[14] & HASNULL != 0
    }

    fn hoff(&self) -> usize {
        self.bytes[15] as usize
    }

    /// `idx` is 0-based and below `natts()`.
    fn att_is_null(&self, idx: usize) -> bool {
        self.has_nulls() && self.bytes[HEADER_LEN + (idx >> 3)] & (1 << (idx & 0x07)) == 0
    }

    fn data_at(&self, off: usize, what: &str) -> Result<&'a [u8], DbalError> {
        self.bytes
            .get(off..)
            .ok_or_else(|| DbalError::malformed(format!("{what} starts past the end of the record")))
    }

    fn att_size(&self, att: &Attribute, off: usize) -> Result<usize, DbalError> {
        if att.storage.is_varlena() {
            varlena::total_size(self.data_at(off, &att.name)?)
        } else {
            fixed_len(att)
        }
    }

    /// Attribute `fieldno` (1-based) as a datum, borrowed from the record.
    pub fn get_attr(
        &self,
        desc: &TupleDescriptor,
        fieldno: u32,
    ) -> Result<NullableDatum<'a>, DbalError> {
        let target = desc.attr(fieldno).ok_or(DbalError::InvalidIdentifier {
            id: fieldno,
            domain: IdDomain::Field {
                count: desc.natts(),
            },
        })?;
        let idx = fieldno as usize - 1;
        if idx >= self.natts() || target.dropped || self.att_is_null(idx) {
            return Ok(NullableDatum::null());
        }

        let mut off = self.hoff();
        for (i, att) in desc.attrs[..idx].iter().enumerate() {
            if self.att_is_null(i) {
                continue;
            }
            off = att.storage.align.align(off);
            off = off.checked_add(self.att_size(att, off)?).ok_or_else(|| {
                DbalError::malformed(format!("attribute \"{}\" overflows the record", att.name))
            })?;
        }
        off = target.storage.align.align(off);

        let data = self.data_at(off, &target.name)?;
        let datum = fetch(target, data)?;
        Ok(NullableDatum::new(datum))
    }
}

/// Byte length of a fixed-length attribute. Only varlena (`-1`) and positive
/// lengths have a layout here.
fn fixed_len(att: &Attribute) -> Result<usize, DbalError> {
    match att.storage.len {
        len if len > 0 => Ok(len as usize),
        len => Err(DbalError::unsupported(
            att.type_tag,
            format!("attribute \"{}\" has unsupported storage length {len}", att.name),
        )),
    }
}

fn fetch<'a>(att: &Attribute, data: &'a [u8]) -> Result<Datum<'a>, DbalError> {
    let storage = att.storage;
    if storage.is_varlena() {
        return varlena::slice(data)
            .map(Datum::Ref)
            .map_err(|e| e.with_context(format!("attribute \"{}\"", att.name)));
    }

    let len = fixed_len(att)?;
    let bytes = data.get(..len).ok_or_else(|| {
        DbalError::malformed(format!(
            "attribute \"{}\" needs {len} bytes, {} left in record",
            att.name,
            data.len()
        ))
    })?;
    if !storage.by_val {
        return Ok(Datum::Ref(bytes));
    }
    if !matches!(len, 1 | 2 | 4 | 8) {
        return Err(DbalError::malformed(format!(
            "by-value attribute \"{}\" has unsupported length {len}",
            att.name
        )));
    }
    let mut word = [0u8; 8];
    word[..len].copy_from_slice(bytes);
    Ok(Datum::Word(u64::from_le_bytes(word)))
}

/// Build a packed record of type `desc` from `values`.
///
/// `nulls[i]` marks attribute `i + 1` as null; its datum is not read.
/// Dropped attributes are always stored as null.
pub fn form_record(
    desc: &TupleDescriptor,
    values: &[Datum<'_>],
    nulls: &[bool],
) -> Result<Vec<u8>, DbalError> {
    let natts = desc.natts();
    if values.len() != natts || nulls.len() != natts {
        return Err(DbalError::malformed(format!(
            "descriptor has {natts} attributes, got {} values and {} null flags",
            values.len(),
            nulls.len()
        )));
    }
    let natts16 = u16::try_from(natts)
        .map_err(|_| DbalError::malformed(format!("{natts} attributes do not fit a record")))?;

    let is_null = |i: usize| nulls[i] || desc.attrs[i].dropped;
    let has_nulls = (0..natts).any(is_null);
    let hoff = Align::Double.align(HEADER_LEN + if has_nulls { bitmap_len(natts) } else { 0 });
    let hoff8 = u8::try_from(hoff)
        .map_err(|_| DbalError::malformed(format!("record header of {hoff} bytes is too large")))?;

    let mut out = vec![0u8; hoff];
    for (i, (att, value)) in desc.attrs.iter().zip(values).enumerate() {
        if is_null(i) {
            continue;
        }
        if has_nulls {
            out[HEADER_LEN + (i >> 3)] |= 1 << (i & 0x07);
        }
        out.resize(att.storage.align.align(out.len()), 0);
        store(att, *value, &mut out)?;
    }

    let total = u32::try_from(out.len())
        .map_err(|_| DbalError::malformed("record exceeds 4 GiB"))?;
    out[0..4].copy_from_slice(&total.to_le_bytes());
    out[4..8].copy_from_slice(&desc.type_tag.0.to_le_bytes());
    out[8..12].copy_from_slice(&desc.typmod.to_le_bytes());
    out[12..14].copy_from_slice(&natts16.to_le_bytes());
    out[14] = if has_nulls { HASNULL } else { 0 };
    out[15] = hoff8;
    Ok(out)
}

fn store(att: &Attribute, value: Datum<'_>, out: &mut Vec<u8>) -> Result<(), DbalError> {
    let storage = att.storage;
    if !storage.is_varlena() {
        fixed_len(att)?;
    }
    match value {
        Datum::Word(word) if storage.by_val => {
            let len = storage.len as usize;
            if !matches!(len, 1 | 2 | 4 | 8) {
                return Err(DbalError::malformed(format!(
                    "by-value attribute \"{}\" has unsupported length {len}",
                    att.name
                )));
            }
            out.extend_from_slice(&word.to_le_bytes()[..len]);
        }
        Datum::Ref(bytes) if storage.is_varlena() => {
            let bytes = varlena::slice(bytes)
                .map_err(|e| e.with_context(format!("attribute \"{}\"", att.name)))?;
            out.extend_from_slice(bytes);
        }
        Datum::Ref(bytes) if !storage.by_val && bytes.len() == storage.len as usize => {
            out.extend_from_slice(bytes);
        }
        other => {
            return Err(DbalError::malformed(format!(
                "datum {other:?} does not fit attribute \"{}\" ({:?})",
                att.name, storage
            )));
        }
    }
    Ok(())
}
