//! One-dimensional numeric arrays in the native array layout.
//!
//! ```text
//! 0   u32 varlena size
//! 4   i32 ndim
//! 8   i32 dataoffset   0 when there is no null bitmap
//! 12  u32 element type oid
//! 16  i32 dims[ndim], then i32 lbounds[ndim]
//! ..  element data, starting at the next 8-byte boundary
//! ```

use dbal::{DbalError, TypeTag};

use crate::pg_type::{self, Align};
use crate::varlena;

const FIXED_HEADER_LEN: usize = 16;

struct ArrayHeader<'a> {
    elemtype: TypeTag,
    nitems: usize,
    data: &'a [u8],
}

fn read_i32(bytes: &[u8], at: usize) -> Result<i32, DbalError> {
    bytes
        .get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .map(i32::from_le_bytes)
        .ok_or_else(|| DbalError::malformed(format!("array header truncated at byte {at}")))
}

fn data_offset(ndim: usize) -> usize {
    Align::Double.align(FIXED_HEADER_LEN + 8 * ndim)
}

fn header(bytes: &[u8]) -> Result<ArrayHeader<'_>, DbalError> {
    let bytes = varlena::slice(bytes)?;
    let ndim = read_i32(bytes, 4)?;
    let dataoffset = read_i32(bytes, 8)?;
    let elemtype = TypeTag(read_i32(bytes, 12)? as u32);

    if dataoffset != 0 {
        return Err(DbalError::malformed("array must not contain NULL elements"));
    }
    let nitems = match ndim {
        0 => 0,
        1 => {
            let dim = read_i32(bytes, FIXED_HEADER_LEN)?;
            usize::try_from(dim)
                .map_err(|_| DbalError::malformed(format!("negative array dimension {dim}")))?
        }
        n if n > 1 => {
            return Err(DbalError::unsupported(
                elemtype,
                format!("{n}-dimensional arrays are not supported"),
            ));
        }
        n => return Err(DbalError::malformed(format!("invalid array dimension count {n}"))),
    };

    let start = data_offset(ndim as usize);
    let data = bytes
        .get(start..)
        .ok_or_else(|| DbalError::malformed("array data offset past end of value"))?;
    Ok(ArrayHeader {
        elemtype,
        nitems,
        data,
    })
}

fn decode<const N: usize, T>(
    bytes: &[u8],
    expected: TypeTag,
    from_le: fn([u8; N]) -> T,
) -> Result<Vec<T>, DbalError> {
    let h = header(bytes)?;
    if h.nitems > 0 && h.elemtype != expected {
        return Err(DbalError::malformed(format!(
            "array element type {} does not match {}",
            h.elemtype, expected
        )));
    }
    let needed = h.nitems * N;
    let data = h.data.get(..needed).ok_or_else(|| {
        DbalError::malformed(format!(
            "array of {} elements needs {needed} data bytes, got {}",
            h.nitems,
            h.data.len()
        ))
    })?;
    Ok(data
        .chunks_exact(N)
        .map(|c| {
            let mut buf = [0u8; N];
            buf.copy_from_slice(c);
            from_le(buf)
        })
        .collect())
}

pub fn decode_f64(bytes: &[u8]) -> Result<Vec<f64>, DbalError> {
    decode::<8, f64>(bytes, pg_type::FLOAT8, f64::from_le_bytes)
}

pub fn decode_i32(bytes: &[u8]) -> Result<Vec<i32>, DbalError> {
    decode::<4, i32>(bytes, pg_type::INT4, i32::from_le_bytes)
}

fn pack<const N: usize>(elemtype: TypeTag, items: impl ExactSizeIterator<Item = [u8; N]>) -> Vec<u8> {
    let nitems = items.len();
    let ndim = usize::from(nitems > 0);
    let start = data_offset(ndim);
    let total = start + nitems * N;

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(ndim as i32).to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&elemtype.0.to_le_bytes());
    if ndim == 1 {
        out.extend_from_slice(&(nitems as i32).to_le_bytes());
        out.extend_from_slice(&1i32.to_le_bytes());
    }
    out.resize(start, 0);
    for item in items {
        out.extend_from_slice(&item);
    }
    out
}

pub fn pack_f64(values: &[f64]) -> Vec<u8> {
    pack(pg_type::FLOAT8, values.iter().map(|v| v.to_le_bytes()))
}

pub fn pack_i32(values: &[i32]) -> Vec<u8> {
    pack(pg_type::INT4, values.iter().map(|v| v.to_le_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float8_array_layout() {
        let bytes = pack_f64(&[1.0, -2.5]);
        // 16 fixed + dims + lbounds = 24, already 8-aligned.
        assert_eq!(bytes.len(), 24 + 16);
        assert_eq!(varlena::total_size(&bytes), Ok(40));
        assert_eq!(decode_f64(&bytes), Ok(vec![1.0, -2.5]));
    }

    #[test]
    fn empty_array_has_no_dimensions() {
        let bytes = pack_i32(&[]);
        assert_eq!(bytes.len(), 16);
        assert_eq!(decode_i32(&bytes), Ok(vec![]));
        assert_eq!(decode_f64(&bytes), Ok(vec![]));
    }

    #[test]
    fn element_type_must_match() {
        let bytes = pack_i32(&[1, 2, 3]);
        assert_eq!(decode_i32(&bytes), Ok(vec![1, 2, 3]));
        assert!(matches!(decode_f64(&bytes), Err(DbalError::Malformed(_))));
    }

    #[test]
    fn null_bitmap_is_rejected() {
        let mut bytes = pack_f64(&[1.0]);
        bytes[8..12].copy_from_slice(&28i32.to_le_bytes());
        assert!(matches!(decode_f64(&bytes), Err(DbalError::Malformed(_))));
    }

    #[test]
    fn multi_dimensional_is_unsupported() {
        let mut bytes = pack_f64(&[1.0]);
        bytes[4..8].copy_from_slice(&2i32.to_le_bytes());
        assert!(matches!(
            decode_f64(&bytes),
            Err(DbalError::UnsupportedType { tag: pg_type::FLOAT8, .. })
        ));
    }

    #[test]
    fn short_data_is_malformed() {
        let mut bytes = pack_f64(&[1.0, 2.0]);
        bytes[16..20].copy_from_slice(&5i32.to_le_bytes());
        assert!(matches!(decode_f64(&bytes), Err(DbalError::Malformed(_))));
    }
}
