//! Seekable input streams over file handles, with an optional parallel
//! chunked-read path for large requests.
//!
//! A [`FileInputStream`] keeps the logical cursor; every read is satisfied
//! with positioned I/O against the underlying handle, so a large request
//! can be fanned out across worker threads operating on disjoint byte
//! ranges of the same file. Parallelism is opt-in through [`ReadPolicy`]:
//! the defaults (one thread) always take the plain sequential path.

mod scheduler;
mod stream;

pub use scheduler::{read_chunked, ReadPolicy};
pub use stream::{FileInputStream, Whence};

pub const DEFAULT_MAX_READ_THREADS: usize = 1;
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024 * 1024;
pub const DEFAULT_MIN_CHUNKS_FOR_THREADING: usize = 4;
