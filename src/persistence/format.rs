//! On-disk layout of a saved forest.
//!
//! The whole container is one gzip stream. Inside it:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Header:                                 │
//! │   magic "MHLF" (4B), version u32        │
//! │   k u32, l u32                          │
//! │   false_positive f64, false_negative f64│
//! │   hash_value_size u8 (2 | 4 | 8)        │
//! │   num_keys u64, num_indexed u64         │
//! ├─────────────────────────────────────────┤
//! │ Keys (num_keys, insertion order):       │
//! │   len u32, postcard bytes               │
//! ├─────────────────────────────────────────┤
//! │ Band tables (l × num_keys, table order):│
//! │   hash key (k × hash_value_size B)      │
//! │   slot u32                              │
//! ├─────────────────────────────────────────┤
//! │ Footer: CRC32 of all bytes above (u32)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. The packing function is not stored; it
//! is fully determined by `hash_value_size`.

use crate::hash::{BandingParams, HashValueSize};
use crate::persistence::error::{PersistenceError, PersistenceResult};
use std::io::{Read, Write};

/// Magic bytes opening every forest container.
pub const FOREST_MAGIC: [u8; 4] = *b"MHLF";

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

/// Largest `k * l` a container may declare. Far beyond any practical
/// signature length; bounds allocation before the checksum can be verified.
pub const MAX_SIGNATURE_LEN: usize = 1 << 20;

/// Fixed-size header of a forest container.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestHeader {
    pub banding: BandingParams,
    pub hash_value_size: HashValueSize,
    /// Items stored (entries per band table).
    pub num_keys: u64,
    /// Length of the sorted, queryable prefix of every table.
    pub num_indexed: u64,
}

impl ForestHeader {
    /// Bytes of one packed band key.
    pub fn key_len(&self) -> usize {
        self.banding.k * self.hash_value_size.bytes()
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> PersistenceResult<()> {
        let k = u32::try_from(self.banding.k)
            .map_err(|_| PersistenceError::Format(format!("k too large: {}", self.banding.k)))?;
        let l = u32::try_from(self.banding.l)
            .map_err(|_| PersistenceError::Format(format!("l too large: {}", self.banding.l)))?;
        if self.banding.signature_len() > MAX_SIGNATURE_LEN {
            return Err(PersistenceError::Format(format!(
                "signature length {} exceeds limit {MAX_SIGNATURE_LEN}",
                self.banding.signature_len()
            )));
        }

        w.write_all(&FOREST_MAGIC)?;
        w.write_all(&FORMAT_VERSION.to_le_bytes())?;
        w.write_all(&k.to_le_bytes())?;
        w.write_all(&l.to_le_bytes())?;
        w.write_all(&self.banding.false_positive.to_le_bytes())?;
        w.write_all(&self.banding.false_negative.to_le_bytes())?;
        w.write_all(&[self.hash_value_size.bytes() as u8])?;
        w.write_all(&self.num_keys.to_le_bytes())?;
        w.write_all(&self.num_indexed.to_le_bytes())?;
        Ok(())
    }

    /// Read and validate a header.
    pub fn read_from<R: Read>(r: &mut R) -> PersistenceResult<Self> {
        let magic: [u8; 4] = read_array(r)?;
        if magic != FOREST_MAGIC {
            return Err(PersistenceError::Format(format!(
                "bad magic bytes {magic:?}, expected {FOREST_MAGIC:?}"
            )));
        }
        let version = u32::from_le_bytes(read_array(r)?);
        if version != FORMAT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            });
        }

        let k = u32::from_le_bytes(read_array(r)?) as usize;
        let l = u32::from_le_bytes(read_array(r)?) as usize;
        let false_positive = f64::from_le_bytes(read_array(r)?);
        let false_negative = f64::from_le_bytes(read_array(r)?);
        let [width] = read_array::<1, _>(r)?;
        let num_keys = u64::from_le_bytes(read_array(r)?);
        let num_indexed = u64::from_le_bytes(read_array(r)?);

        if k == 0 || l == 0 {
            return Err(PersistenceError::Format(format!(
                "invalid banding k={k}, l={l}"
            )));
        }
        match k.checked_mul(l) {
            Some(len) if len <= MAX_SIGNATURE_LEN => {}
            _ => {
                return Err(PersistenceError::Format(format!(
                    "banding k={k}, l={l} exceeds signature limit {MAX_SIGNATURE_LEN}"
                )))
            }
        }
        let hash_value_size = HashValueSize::from_bytes(width as usize).ok_or_else(|| {
            PersistenceError::Format(format!("invalid hash value size {width}"))
        })?;
        if num_keys > u64::from(u32::MAX) + 1 {
            return Err(PersistenceError::Format(format!(
                "too many keys: {num_keys}"
            )));
        }
        if num_indexed > num_keys {
            return Err(PersistenceError::Format(format!(
                "indexed prefix {num_indexed} exceeds table length {num_keys}"
            )));
        }

        Ok(Self {
            banding: BandingParams {
                k,
                l,
                false_positive,
                false_negative,
            },
            hash_value_size,
            num_keys,
            num_indexed,
        })
    }
}

/// Read exactly `N` bytes, reporting a short stream as a decode failure.
pub(crate) fn read_array<const N: usize, R: Read + ?Sized>(r: &mut R) -> PersistenceResult<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)
        .map_err(PersistenceError::from_decode)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> ForestHeader {
        ForestHeader {
            banding: BandingParams {
                k: 8,
                l: 32,
                false_positive: 0.031,
                false_negative: 0.041,
            },
            hash_value_size: HashValueSize::Bits16,
            num_keys: 3,
            num_indexed: 2,
        }
    }

    #[test]
    fn test_header_round_trip() {
        let mut buf = Vec::new();
        header().write_to(&mut buf).unwrap();
        assert_eq!(&buf[..4], b"MHLF");

        let read = ForestHeader::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(read, header());
        assert_eq!(read.key_len(), 16);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut buf = Vec::new();
        header().write_to(&mut buf).unwrap();
        buf[0] = b'X';
        assert!(matches!(
            ForestHeader::read_from(&mut buf.as_slice()),
            Err(PersistenceError::Format(_))
        ));
    }

    #[test]
    fn test_rejects_future_version() {
        let mut buf = Vec::new();
        header().write_to(&mut buf).unwrap();
        buf[4..8].copy_from_slice(&2u32.to_le_bytes());
        assert!(matches!(
            ForestHeader::read_from(&mut buf.as_slice()),
            Err(PersistenceError::UnsupportedVersion { found: 2, supported: 1 })
        ));
    }

    #[test]
    fn test_rejects_inconsistent_counts() {
        let mut bad = header();
        bad.num_indexed = 4;
        let mut buf = Vec::new();
        bad.write_to(&mut buf).unwrap();
        assert!(ForestHeader::read_from(&mut buf.as_slice()).is_err());
    }

    #[test]
    fn test_rejects_bad_width() {
        let mut buf = Vec::new();
        header().write_to(&mut buf).unwrap();
        // magic + version + k + l + fp + fn
        buf[4 + 4 + 4 + 4 + 8 + 8] = 3;
        assert!(matches!(
            ForestHeader::read_from(&mut buf.as_slice()),
            Err(PersistenceError::Format(_))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let mut buf = Vec::new();
        header().write_to(&mut buf).unwrap();
        buf.truncate(10);
        let err = ForestHeader::read_from(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, PersistenceError::Deserialization(_)));
        assert!(err.is_decode_error());
    }

    fn with_banding(k: usize, l: usize, num_keys: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        ForestHeader {
            num_keys,
            num_indexed: 0,
            ..header()
        }
        .write_to(&mut buf)
        .unwrap();
        // Patch k and l directly; write_to refuses oversized banding.
        buf[8..12].copy_from_slice(&(k as u32).to_le_bytes());
        buf[12..16].copy_from_slice(&(l as u32).to_le_bytes());
        buf
    }

    #[test]
    fn test_rejects_oversized_banding() {
        for (k, l) in [
            (u32::MAX as usize, 1),
            (1, u32::MAX as usize),
            (u32::MAX as usize, u32::MAX as usize),
            (1 << 10, (1 << 10) + 1),
        ] {
            let buf = with_banding(k, l, 0);
            let err = ForestHeader::read_from(&mut buf.as_slice()).unwrap_err();
            assert!(matches!(err, PersistenceError::Format(_)), "k={k}, l={l}: {err}");
            assert!(err.is_decode_error());
        }
    }

    #[test]
    fn test_accepts_banding_at_limit() {
        let buf = with_banding(1 << 10, 1 << 10, 0);
        let read = ForestHeader::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(read.banding.signature_len(), MAX_SIGNATURE_LEN);
    }

    #[test]
    fn test_write_refuses_oversized_banding() {
        let mut bad = header();
        bad.banding.k = MAX_SIGNATURE_LEN;
        bad.banding.l = 2;
        assert!(matches!(
            bad.write_to(&mut Vec::new()),
            Err(PersistenceError::Format(_))
        ));
    }
}
