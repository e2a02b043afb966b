//! Save and load for [`MinHashForest`].
//!
//! See [`crate::persistence::format`] for the layout. Loading either returns
//! a complete, immediately queryable forest or an error; a partially decoded
//! forest is never handed out.
//!
//! ```rust,no_run
//! use minhash_forest::hash::MinHashForest;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut forest: MinHashForest<u64> = MinHashForest::new(128, 0.7)?;
//! // ... add, index ...
//! forest.index();
//! forest.save("docs.mhlf")?;
//!
//! let restored: MinHashForest<u64> = MinHashForest::load("docs.mhlf")?;
//! assert_eq!(restored.params(), forest.params());
//! # Ok(())
//! # }
//! ```

use crate::hash::forest::Entry;
use crate::hash::{HashKey, MinHashForest};
use crate::persistence::error::{PersistenceError, PersistenceResult};
use crate::persistence::format::{read_array, ForestHeader};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Upper bound on speculative pre-allocation from untrusted counts.
const MAX_PREALLOC: usize = 1 << 16;

/// `Write` adapter that checksums everything passing through.
struct ChecksumWriter<W> {
    inner: W,
    hasher: crc32fast::Hasher,
}

impl<W: Write> ChecksumWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: crc32fast::Hasher::new(),
        }
    }

    fn finish(self) -> (W, u32) {
        (self.inner, self.hasher.finalize())
    }
}

impl<W: Write> Write for ChecksumWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// `Read` adapter that checksums everything passing through.
struct ChecksumReader<R> {
    inner: R,
    hasher: crc32fast::Hasher,
}

impl<R: Read> ChecksumReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: crc32fast::Hasher::new(),
        }
    }

    fn finish(self) -> (R, u32) {
        (self.inner, self.hasher.finalize())
    }
}

impl<R: Read> Read for ChecksumReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

impl<K: Serialize> MinHashForest<K> {
    /// Write the forest to `path`.
    ///
    /// The container is written to a sibling `.tmp` file, synced, then
    /// renamed over `path`, so an existing file is never left half-written.
    pub fn save(&self, path: impl AsRef<Path>) -> PersistenceResult<()> {
        let path = path.as_ref();
        let tmp = temp_path(path);

        if let Err(e) = self.write_then_rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        tracing::debug!(path = %path.display(), keys = self.len(), "forest saved");
        Ok(())
    }

    fn write_then_rename(&self, tmp: &Path, path: &Path) -> PersistenceResult<()> {
        let file = File::create(tmp)?;
        let file = self
            .save_to_writer(BufWriter::new(file))?
            .into_inner()
            .map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Write the compressed container to `writer` and hand the writer back.
    pub fn save_to_writer<W: Write>(&self, writer: W) -> PersistenceResult<W> {
        let header = ForestHeader {
            banding: self.banding,
            hash_value_size: self.hash_value_size(),
            num_keys: self.keys.len() as u64,
            num_indexed: self.num_indexed as u64,
        };

        let mut out = ChecksumWriter::new(GzEncoder::new(writer, Compression::default()));
        header.write_to(&mut out)?;

        for key in &self.keys {
            let bytes = postcard::to_allocvec(key)?;
            let len = u32::try_from(bytes.len()).map_err(|_| {
                PersistenceError::Serialization(format!("encoded key too large: {} bytes", bytes.len()))
            })?;
            out.write_all(&len.to_le_bytes())?;
            out.write_all(&bytes)?;
        }

        for table in &self.tables {
            for entry in table {
                out.write_all(entry.hash_key.as_bytes())?;
                out.write_all(&entry.slot.to_le_bytes())?;
            }
        }

        let (mut gz, crc) = out.finish();
        gz.write_all(&crc.to_le_bytes())?;
        Ok(gz.finish()?)
    }
}

impl<K: DeserializeOwned> MinHashForest<K> {
    /// Load a forest written by [`MinHashForest::save`].
    pub fn load(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let forest = Self::load_from_reader(BufReader::new(file))?;
        tracing::debug!(
            path = %path.display(),
            keys = forest.len(),
            indexed = forest.num_indexed(),
            "forest loaded"
        );
        Ok(forest)
    }

    /// Decode a container from `reader`, consuming it to the end.
    pub fn load_from_reader<R: Read>(reader: R) -> PersistenceResult<Self> {
        let mut input = ChecksumReader::new(GzDecoder::new(reader));
        let header = ForestHeader::read_from(&mut input)?;
        let num_keys = header.num_keys as usize;
        let num_indexed = header.num_indexed as usize;

        let mut keys: Vec<K> = Vec::with_capacity(num_keys.min(MAX_PREALLOC));
        let mut buf = Vec::new();
        for _ in 0..num_keys {
            let len = u32::from_le_bytes(read_array(&mut input)?) as usize;
            buf.clear();
            (&mut input)
                .take(len as u64)
                .read_to_end(&mut buf)
                .map_err(PersistenceError::from_decode)?;
            if buf.len() != len {
                return Err(PersistenceError::Deserialization(
                    "unexpected end of stream".to_string(),
                ));
            }
            let (key, rest) = postcard::take_from_bytes(&buf).map_err(|e| {
                PersistenceError::Deserialization(format!("key #{}: {}", keys.len(), e))
            })?;
            if !rest.is_empty() {
                return Err(PersistenceError::Deserialization(format!(
                    "key #{}: {} undecoded bytes",
                    keys.len(),
                    rest.len()
                )));
            }
            keys.push(key);
        }

        let key_len = header.key_len();
        let mut key_buf = vec![0u8; key_len];
        let mut tables = Vec::with_capacity(header.banding.l.min(MAX_PREALLOC));
        for band in 0..header.banding.l {
            let mut table: Vec<Entry> = Vec::with_capacity(num_keys.min(MAX_PREALLOC));
            for _ in 0..num_keys {
                input
                    .read_exact(&mut key_buf)
                    .map_err(PersistenceError::from_decode)?;
                let slot = u32::from_le_bytes(read_array(&mut input)?);
                if slot as usize >= num_keys {
                    return Err(PersistenceError::Format(format!(
                        "band {band}: slot {slot} out of range for {num_keys} keys"
                    )));
                }
                table.push(Entry {
                    hash_key: HashKey::from_bytes(&key_buf),
                    slot,
                });
            }
            if !table[..num_indexed]
                .windows(2)
                .all(|w| w[0].hash_key <= w[1].hash_key)
            {
                return Err(PersistenceError::Format(format!(
                    "band {band}: indexed prefix is not sorted"
                )));
            }
            tables.push(table);
        }

        let (mut rest, expected) = input.finish();
        let actual = u32::from_le_bytes(read_array(&mut rest)?);
        if actual != expected {
            return Err(PersistenceError::ChecksumMismatch { expected, actual });
        }

        // Drain to EOF so the gzip trailer is verified too.
        let mut trailing = Vec::new();
        rest.read_to_end(&mut trailing)
            .map_err(PersistenceError::from_decode)?;
        if !trailing.is_empty() {
            return Err(PersistenceError::Format(format!(
                "{} trailing bytes after checksum",
                trailing.len()
            )));
        }

        Ok(MinHashForest::from_parts(
            header.banding,
            header.hash_value_size,
            keys,
            tables,
            num_indexed,
        ))
    }
}
