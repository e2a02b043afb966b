//! Band key packing.
//!
//! A band (K consecutive MinHash values) becomes one lookup key by writing
//! each value little-endian, keeping its low `hash_value_size` bytes, and
//! concatenating the pieces in signature order:
//!
//! ```text
//! sub-signature  [0x1122334455667788, 0x99AABBCCDDEEFF00]
//! Bits16         88 77 | 00 FF
//! Bits32         88 77 66 55 | 00 FF EE DD
//! ```
//!
//! Two bands that agree on every kept byte produce the same key. That is the
//! whole collision mechanism of the forest, so packing must stay
//! deterministic. Narrower widths save memory and coarsen the key.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Number of low-order bytes kept from each 64-bit hash value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HashValueSize {
    /// 16-bit values (2 bytes).
    Bits16,
    /// 32-bit values (4 bytes). Recommended default.
    #[default]
    Bits32,
    /// Full 64-bit values (8 bytes).
    Bits64,
}

impl HashValueSize {
    /// Width in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            HashValueSize::Bits16 => 2,
            HashValueSize::Bits32 => 4,
            HashValueSize::Bits64 => 8,
        }
    }

    /// Parse a raw byte width. Only 2, 4 and 8 are valid.
    pub const fn from_bytes(bytes: usize) -> Option<Self> {
        match bytes {
            2 => Some(HashValueSize::Bits16),
            4 => Some(HashValueSize::Bits32),
            8 => Some(HashValueSize::Bits64),
            _ => None,
        }
    }
}

/// Packed band key, ordered lexicographically by byte.
///
/// Inline storage covers up to 32 bytes (e.g. K = 8 at 32 bits) before
/// spilling to the heap.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HashKey(SmallVec<[u8; 32]>);

impl HashKey {
    /// Build a key from raw bytes (used when loading a persisted index).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(SmallVec::from_slice(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashKey(")?;
        for b in self.0.iter() {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

/// Packs sub-signatures into [`HashKey`]s at a fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyPacker {
    size: HashValueSize,
}

impl KeyPacker {
    pub fn new(size: HashValueSize) -> Self {
        Self { size }
    }

    pub fn hash_value_size(&self) -> HashValueSize {
        self.size
    }

    /// Key length in bytes for a band of `k` values.
    pub fn key_len(&self, k: usize) -> usize {
        self.size.bytes() * k
    }

    /// Pack one band.
    pub fn pack(&self, sub_signature: &[u64]) -> HashKey {
        pack(sub_signature, self.size)
    }
}

/// Pack a sub-signature into a key of `size.bytes() * sub_signature.len()` bytes.
pub fn pack(sub_signature: &[u64], size: HashValueSize) -> HashKey {
    let width = size.bytes();
    let mut out: SmallVec<[u8; 32]> = SmallVec::with_capacity(width * sub_signature.len());
    for &v in sub_signature {
        out.extend_from_slice(&v.to_le_bytes()[..width]);
    }
    HashKey(out)
}
