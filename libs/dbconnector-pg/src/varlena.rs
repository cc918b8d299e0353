//! Variable-length values: a 4-byte little-endian total length (header
//! included) followed by the payload.

use dbal::DbalError;

pub const HEADER_LEN: usize = 4;

/// Total size recorded in the header of the varlena starting at `bytes[0]`.
pub fn total_size(bytes: &[u8]) -> Result<usize, DbalError> {
    let header: [u8; HEADER_LEN] = bytes
        .get(..HEADER_LEN)
        .and_then(|h| h.try_into().ok())
        .ok_or_else(|| DbalError::malformed(format!("varlena header needs 4 bytes, got {}", bytes.len())))?;
    let size = u32::from_le_bytes(header) as usize;
    if size < HEADER_LEN {
        return Err(DbalError::malformed(format!("varlena size {size} is smaller than its header")));
    }
    Ok(size)
}

/// The varlena at the start of `bytes`, header included, trimmed to its
/// recorded size.
pub fn slice(bytes: &[u8]) -> Result<&[u8], DbalError> {
    let size = total_size(bytes)?;
    bytes.get(..size).ok_or_else(|| {
        DbalError::malformed(format!("varlena claims {size} bytes, only {} available", bytes.len()))
    })
}

/// Payload of the varlena at the start of `bytes`.
pub fn payload(bytes: &[u8]) -> Result<&[u8], DbalError> {
    Ok(&slice(bytes)?[HEADER_LEN..])
}

/// Build a varlena around `payload`.
pub fn pack(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&((HEADER_LEN + payload.len()) as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

pub fn pack_str(s: &str) -> Vec<u8> {
    pack(s.as_bytes())
}
