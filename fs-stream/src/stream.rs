use std::path::Path;

use fs_file::{AccessMode, CreateMode, File};
use io_error::{FileError, Result};

use crate::scheduler::{read_chunked, ReadPolicy};

/// Where a [`FileInputStream::seek`] offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

/// Seekable input stream over one [`File`] handle.
///
/// The logical cursor lives in the stream, not in the handle: every read
/// is issued as positioned I/O at the cursor, and on the parallel path
/// workers read directly against the handle while the cursor is advanced
/// only after all of them have joined. `read` takes `&mut self`, so two
/// overlapping reads on one stream are unrepresentable; callers wanting
/// independent concurrent readers open one handle per reader.
pub struct FileInputStream {
    file: File,
    position: u64,
    policy: ReadPolicy,
}

impl FileInputStream {
    /// Open `path` read-only; the file must already exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file =
            File::open(path, AccessMode::Read, CreateMode::OpenExisting)?;
        Ok(Self::from_file(file))
    }

    /// Wrap an already-open handle; the stream takes ownership and the
    /// cursor starts at zero.
    pub fn from_file(file: File) -> Self {
        Self {
            file,
            position: 0,
            policy: ReadPolicy::default(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.file.is_open()
    }

    pub fn close(&mut self) {
        self.file.close();
    }

    /// Current cursor position, in bytes from the start of the file.
    pub fn tell(&self) -> u64 {
        self.position
    }

    /// Bytes readable between the cursor and end of file, clamped at zero
    /// if the cursor has been seeked past the end.
    pub fn available(&self) -> Result<u64> {
        let length = self.file.length()?;
        Ok(length.saturating_sub(self.position))
    }

    /// Move the cursor to `offset` relative to `whence` and return the new
    /// absolute position. A target below zero is rejected without moving
    /// the cursor.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let base = match whence {
            Whence::Start => 0,
            Whence::Current => self.position as i64,
            Whence::End => self.file.length()? as i64,
        };
        let target = base
            .checked_add(offset)
            .filter(|position| *position >= 0)
            .ok_or_else(|| {
                FileError::InvalidArgument(format!(
                    "seek to {} from {:?} resolves below zero",
                    offset, whence
                ))
            })?;
        self.position = target as u64;
        Ok(self.position)
    }

    /// Read up to `buf.len()` bytes at the cursor and advance it by the
    /// number of bytes actually read. Delegates to the chunked-read
    /// scheduler, so a large request may be served by parallel positioned
    /// reads; the cursor is only advanced after every worker has finished.
    /// A short return means end of file, never a swallowed error.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let bytes = read_chunked(&self.file, self.position, buf, &self.policy)?;
        self.position += bytes as u64;
        Ok(bytes)
    }

    pub fn set_max_read_threads(&mut self, max_threads: usize) -> Result<()> {
        self.policy.set_max_threads(max_threads)
    }

    pub fn max_read_threads(&self) -> usize {
        self.policy.max_threads()
    }

    pub fn set_parallel_chunk_size(&mut self, chunk_size: usize) -> Result<()> {
        self.policy.set_chunk_size(chunk_size)
    }

    pub fn parallel_chunk_size(&self) -> usize {
        self.policy.chunk_size()
    }

    pub fn set_minimum_chunk_count(&mut self, min_chunks: usize) -> Result<()> {
        self.policy.set_min_chunks_for_threading(min_chunks)
    }

    pub fn minimum_chunk_count(&self) -> usize {
        self.policy.min_chunks_for_threading()
    }
}
