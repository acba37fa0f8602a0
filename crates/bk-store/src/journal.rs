use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bk_types::{AssetId, ProjectName};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::asset::AssetMeta;
use crate::error::{StoreError, StoreResult};

/// A single catalog mutation.
///
/// On-disk format of one frame:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized CatalogRecord)]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogRecord {
    /// An asset was written.
    Put(AssetMeta),
    /// A single asset was deleted.
    Delete(AssetId),
    /// Every asset of a project was deleted.
    DeleteProject(ProjectName),
}

/// Flush/sync strategy for the journal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// `fsync` after every record (safest, highest latency).
    EveryWrite,
    /// Flush to the OS and rely on page-cache write-back.
    #[default]
    OsDefault,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Internal mutable state for the journal writer.
struct JournalWriter {
    writer: BufWriter<File>,
    /// Current write offset in the journal file.
    offset: u64,
}

/// Append-only, CRC-framed journal of catalog mutations.
///
/// Records are serialized with bincode and framed with a length prefix and
/// a CRC32 checksum. On replay the file is read front-to-back; frames that
/// fail the CRC check are skipped, and a truncated tail (a torn write from a
/// crash) ends replay.
pub struct CatalogJournal {
    path: PathBuf,
    writer: Mutex<JournalWriter>,
    sync_mode: SyncMode,
}

impl CatalogJournal {
    /// Open (or create) the journal file at the given path.
    pub fn open(path: &Path, sync_mode: SyncMode) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = open_append(path)?;
        let offset = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(JournalWriter {
                writer: BufWriter::new(file),
                offset,
            }),
            sync_mode,
        })
    }

    /// Append a single record. Returns the byte offset of the frame.
    ///
    /// A failed append leaves the file exactly as it was before the call.
    pub fn append(&self, record: &CatalogRecord) -> StoreResult<u64> {
        self.append_with(record, |writer, frame| {
            writer.write_all(frame)?;
            writer.flush()
        })
    }

    fn append_with<F>(&self, record: &CatalogRecord, write: F) -> StoreResult<u64>
    where
        F: FnOnce(&mut BufWriter<File>, &[u8]) -> io::Result<()>,
    {
        let frame = encode_frame(record)?;

        let mut w = self
            .writer
            .lock()
            .map_err(|_| StoreError::poisoned("journal"))?;
        let entry_offset = w.offset;

        let written = write(&mut w.writer, &frame).and_then(|()| match self.sync_mode {
            SyncMode::EveryWrite => w.writer.get_ref().sync_all(),
            SyncMode::OsDefault => Ok(()),
        });
        if let Err(e) = written {
            warn!(offset = entry_offset, error = %e, "journal append failed; truncating");
            self.truncate_to(&mut w, entry_offset)?;
            return Err(e.into());
        }

        w.offset += frame.len() as u64;

        debug!(offset = entry_offset, len = frame.len(), "journal append");
        Ok(entry_offset)
    }

    /// Drop buffered bytes and cut the file back to `offset`.
    fn truncate_to(&self, w: &mut JournalWriter, offset: u64) -> StoreResult<()> {
        let fresh = BufWriter::new(open_append(&self.path)?);
        let (old, _unwritten) = std::mem::replace(&mut w.writer, fresh).into_parts();
        old.set_len(offset)?;
        if self.sync_mode == SyncMode::EveryWrite {
            old.sync_all()?;
        }
        w.offset = offset;
        Ok(())
    }

    /// Read back every valid record in order.
    pub fn replay(&self) -> StoreResult<Vec<CatalogRecord>> {
        let mut data = Vec::new();
        BufReader::new(File::open(&self.path)?).read_to_end(&mut data)?;

        let mut records = Vec::new();
        let mut offset = 0usize;

        while offset + HEADER_SIZE <= data.len() {
            let header = &data[offset..offset + HEADER_SIZE];
            let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
            let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            if length == 0 || offset + HEADER_SIZE + length > data.len() {
                warn!(
                    offset,
                    length,
                    file_len = data.len(),
                    "invalid journal frame length; stopping replay"
                );
                break;
            }

            let payload = &data[offset + HEADER_SIZE..offset + HEADER_SIZE + length];
            let actual_crc = crc32fast::hash(payload);
            if actual_crc != expected_crc {
                warn!(
                    offset,
                    expected = expected_crc,
                    actual = actual_crc,
                    "CRC mismatch; skipping journal frame"
                );
            } else {
                match bincode::deserialize::<CatalogRecord>(payload) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!(offset, error = %e, "failed to decode journal frame; skipping")
                    }
                }
            }

            offset += HEADER_SIZE + length;
        }

        debug!(recovered = records.len(), "journal replay complete");
        Ok(records)
    }

    /// Atomically replace the journal contents with the given records.
    ///
    /// The new journal is written to a temporary file in the same directory
    /// and renamed over the old one, so a crash leaves either the old or the
    /// new journal intact.
    pub fn rewrite(&self, records: &[CatalogRecord]) -> StoreResult<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));

        let mut w = self
            .writer
            .lock()
            .map_err(|_| StoreError::poisoned("journal"))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        let mut written = 0u64;
        for record in records {
            let frame = encode_frame(record)?;
            tmp.write_all(&frame)?;
            written += frame.len() as u64;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        w.writer = BufWriter::new(open_append(&self.path)?);
        w.offset = written;

        debug!(records = records.len(), bytes = written, "journal rewritten");
        Ok(())
    }

    /// Current write offset.
    pub fn offset(&self) -> StoreResult<u64> {
        Ok(self
            .writer
            .lock()
            .map_err(|_| StoreError::poisoned("journal"))?
            .offset)
    }

    /// Path to the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
}

fn encode_frame(record: &CatalogRecord) -> StoreResult<Vec<u8>> {
    let payload =
        bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}
