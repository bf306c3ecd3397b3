use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use io_error::{FileError, Result};

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use unix as os;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows as os;

/// How a file may be accessed once opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
}

/// What to do about existing or missing files on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// Open only if the file already exists.
    OpenExisting,
    /// Create the file if missing, keep existing contents otherwise.
    CreateIfMissing,
    /// Create the file if missing, truncate to zero length otherwise.
    CreateTruncate,
}

/// Positioned-read capability: the seam between a concrete file handle and
/// the chunked-read scheduler. A positioned read carries its own absolute
/// offset and neither uses nor advances any shared cursor, which is what
/// makes concurrent reads of disjoint ranges on one handle safe.
pub trait ReadAt: Sync {
    /// Read into `buf` at `offset`. Returns `buf.len()` unless end of file
    /// cut the read short, in which case the short remainder is returned
    /// as success.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Current length of the underlying byte store.
    fn length(&self) -> Result<u64>;
}

/// Sole in-process owner of one OS-level open-file resource.
///
/// A `File` moves but does not clone, so the underlying handle is released
/// exactly once — by [`File::close`] or on drop, whichever comes first.
/// All reads and writes are positioned; the handle keeps no cursor state
/// of its own.
#[derive(Debug)]
pub struct File {
    inner: Option<std::fs::File>,
    path: PathBuf,
}

impl File {
    /// Open `path` with the given access and creation modes. OS errors are
    /// translated into the [`FileError`] taxonomy.
    pub fn open(
        path: impl AsRef<Path>,
        access: AccessMode,
        create: CreateMode,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        match access {
            AccessMode::Read => {
                options.read(true);
            }
            AccessMode::Write => {
                options.write(true);
            }
            AccessMode::ReadWrite => {
                options.read(true).write(true);
            }
        }
        match create {
            CreateMode::OpenExisting => {}
            CreateMode::CreateIfMissing => {
                options.create(true);
            }
            CreateMode::CreateTruncate => {
                options.create(true).truncate(true);
            }
        }

        let inner = options
            .open(path)
            .map_err(|err| FileError::from_os(path, err))?;
        log::trace!("opened {:?} ({:?}, {:?})", path, access, create);

        Ok(Self {
            inner: Some(inner),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Release the OS handle. Safe to call more than once; only the first
    /// call does anything.
    pub fn close(&mut self) {
        if let Some(file) = self.inner.take() {
            log::trace!("closing {:?}", self.path);
            drop(file);
        }
    }

    fn handle(&self) -> Result<&std::fs::File> {
        self.inner.as_ref().ok_or_else(|| {
            FileError::InvalidArgument(format!(
                "{}: handle is closed",
                self.path.display()
            ))
        })
    }

    /// Positioned read: fill `buf` starting at `offset`, looping over short
    /// OS reads, so the result is `buf.len()` unless end of file intervenes.
    /// A zero-length buffer is a no-op with no OS call.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let file = self.handle()?;

        let mut filled = 0;
        while filled < buf.len() {
            match os::read_at(file, &mut buf[filled..], offset + filled as u64)
            {
                Ok(0) => break, // end of file
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FileError::Io(err)),
            }
        }
        Ok(filled)
    }

    /// Positioned write: put all of `buf` at `offset`, looping over short
    /// OS writes. A zero-length buffer is a no-op with no OS call.
    pub fn write_at(&self, offset: u64, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let file = self.handle()?;

        let mut written = 0;
        while written < buf.len() {
            match os::write_at(file, &buf[written..], offset + written as u64)
            {
                Ok(0) => {
                    return Err(FileError::Io(std::io::Error::new(
                        ErrorKind::WriteZero,
                        "positioned write returned zero bytes",
                    )))
                }
                Ok(n) => written += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FileError::Io(err)),
            }
        }
        Ok(written)
    }

    /// Append `buf` at the current end of file without truncating anything.
    pub fn append(&self, buf: &[u8]) -> Result<usize> {
        let end = self.length()?;
        self.write_at(end, buf)
    }

    pub fn length(&self) -> Result<u64> {
        Ok(self.handle()?.metadata()?.len())
    }

    /// Flush file contents and metadata to disk.
    pub fn flush(&self) -> Result<()> {
        self.handle()?.sync_all()?;
        Ok(())
    }
}

impl ReadAt for File {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        File::read_at(self, offset, buf)
    }

    fn length(&self) -> Result<u64> {
        File::length(self)
    }
}
