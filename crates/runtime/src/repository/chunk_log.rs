//! Append-only chunk log on disk.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use game_core::ExploredChunkData;

use crate::repository::{ChunkRepository, RepositoryError, Result};

/// File-based implementation of ChunkRepository.
///
/// Stores chunks using the format:
/// ```text
/// [u32 length][bincode serialized ExploredChunkData]
/// [u32 length][bincode serialized ExploredChunkData]
/// ...
/// ```
///
/// A record cut short by a crash is ignored on load and overwritten by the
/// next append.
pub struct FileChunkRepository {
    path: PathBuf,
    writer: Mutex<LogWriter>,
}

struct LogWriter {
    file: File,
    /// End of the last complete record.
    offset: u64,
}

impl FileChunkRepository {
    pub const FILE_NAME: &'static str = "chunks.log";

    /// Open or create the chunk log in `base_dir`.
    pub fn open_or_create(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        std::fs::create_dir_all(base_dir)?;
        let path = base_dir.join(Self::FILE_NAME);

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)?;

        let (_, offset) = read_records(&path)?;
        // Drop a torn tail so new records start at a clean boundary.
        file.set_len(offset)?;

        tracing::debug!(
            "Opened chunk log: {} at offset {}",
            path.display(),
            offset
        );

        Ok(Self {
            path,
            writer: Mutex::new(LogWriter { file, offset }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_encoded(&self, buffer: &[u8]) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let start = writer.offset;

        let written = write_at_end(&mut writer.file, start, buffer);
        if let Err(e) = written {
            // Roll back whatever part of the buffer reached the file.
            if let Err(truncate_err) = writer.file.set_len(start) {
                tracing::error!(
                    "Failed to roll back chunk log {} to {}: {}",
                    self.path.display(),
                    start,
                    truncate_err
                );
            }
            return Err(e);
        }

        writer.offset = start + buffer.len() as u64;
        Ok(())
    }
}

impl ChunkRepository for FileChunkRepository {
    fn load_all(&self) -> Result<Vec<ExploredChunkData>> {
        let (chunks, _) = read_records(&self.path)?;
        Ok(chunks)
    }

    fn append(&self, chunk: &ExploredChunkData) -> Result<()> {
        let mut buffer = Vec::new();
        encode_record(chunk, &mut buffer)?;
        self.write_encoded(&buffer)
    }

    fn append_batch(&self, chunks: &[ExploredChunkData]) -> Result<()> {
        let mut buffer = Vec::new();
        for chunk in chunks {
            encode_record(chunk, &mut buffer)?;
        }
        self.write_encoded(&buffer)?;
        tracing::debug!("Appended {} chunks to {}", chunks.len(), self.path.display());
        Ok(())
    }
}

fn encode_record(chunk: &ExploredChunkData, buffer: &mut Vec<u8>) -> Result<()> {
    let bytes =
        bincode::serialize(chunk).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
    let len = u32::try_from(bytes.len())
        .map_err(|_| RepositoryError::Serialization("chunk record exceeds 4GiB".to_string()))?;
    buffer.extend_from_slice(&len.to_le_bytes());
    buffer.extend_from_slice(&bytes);
    Ok(())
}

fn write_at_end(file: &mut File, offset: u64, buffer: &[u8]) -> Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(buffer)?;
    file.flush()?;
    Ok(())
}

/// Reads every complete record. Returns the records and the offset just
/// past the last complete one.
fn read_records(path: &Path) -> Result<(Vec<ExploredChunkData>, u64)> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut chunks = Vec::new();
    let mut offset = 0u64;

    loop {
        let mut len_bytes = [0u8; 4];
        match reader.read_exact(&mut len_bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let len = u32::from_le_bytes(len_bytes) as usize;

        let mut data = vec![0u8; len];
        match reader.read_exact(&mut data) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                tracing::warn!(
                    "Ignoring torn record at offset {} in {}",
                    offset,
                    path.display()
                );
                break;
            }
            Err(e) => return Err(e.into()),
        }

        let chunk = bincode::deserialize(&data).map_err(|e| RepositoryError::CorruptedData {
            offset,
            reason: e.to_string(),
        })?;
        chunks.push(chunk);
        offset += 4 + len as u64;
    }

    Ok((chunks, offset))
}
