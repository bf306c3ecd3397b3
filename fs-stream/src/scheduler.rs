use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use fs_file::ReadAt;
use io_error::{FileError, Result};

use crate::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_READ_THREADS,
    DEFAULT_MIN_CHUNKS_FOR_THREADING,
};

/// Tunable thresholds governing when and how a read is parallelized.
///
/// The defaults (one thread, 32 MiB chunks, four chunks minimum) keep
/// every read on the sequential path; parallelism is strictly opt-in.
/// A policy is read once at the start of each read call, so mutating it
/// between reads is safe and mid-read mutation is unobservable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPolicy {
    max_threads: usize,
    chunk_size: usize,
    min_chunks_for_threading: usize,
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self {
            max_threads: DEFAULT_MAX_READ_THREADS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            min_chunks_for_threading: DEFAULT_MIN_CHUNKS_FOR_THREADING,
        }
    }
}

impl ReadPolicy {
    /// Limit on concurrently running read workers.
    pub fn set_max_threads(&mut self, max_threads: usize) -> Result<()> {
        if max_threads == 0 {
            return Err(FileError::InvalidArgument(
                "max read threads must be at least 1".to_owned(),
            ));
        }
        self.max_threads = max_threads;
        Ok(())
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// Size in bytes of each chunk on the parallel path.
    pub fn set_chunk_size(&mut self, chunk_size: usize) -> Result<()> {
        if chunk_size == 0 {
            return Err(FileError::InvalidArgument(
                "parallel chunk size must be non-zero".to_owned(),
            ));
        }
        self.chunk_size = chunk_size;
        Ok(())
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Minimum number of full chunks a request must span before the
    /// parallel path is considered.
    pub fn set_min_chunks_for_threading(
        &mut self,
        min_chunks: usize,
    ) -> Result<()> {
        if min_chunks == 0 {
            return Err(FileError::InvalidArgument(
                "minimum chunk count must be at least 1".to_owned(),
            ));
        }
        self.min_chunks_for_threading = min_chunks;
        Ok(())
    }

    pub fn min_chunks_for_threading(&self) -> usize {
        self.min_chunks_for_threading
    }
}

/// One contiguous byte range assigned to a single positioned read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Chunk {
    offset: u64,
    length: usize,
}

/// Split `[offset, offset + length)` into contiguous disjoint ranges of
/// `chunk_size` bytes each, the last holding the remainder. The plan is
/// built fresh per read call and never persisted.
fn partition(offset: u64, length: usize, chunk_size: usize) -> Vec<Chunk> {
    let mut chunks = Vec::with_capacity(length.div_ceil(chunk_size));
    let mut covered = 0;
    while covered < length {
        let chunk_length = chunk_size.min(length - covered);
        chunks.push(Chunk {
            offset: offset + covered as u64,
            length: chunk_length,
        });
        covered += chunk_length;
    }
    chunks
}

/// Satisfy one read of `buf.len()` bytes at absolute `offset`, either with
/// a single positioned read or by fanning the request out across a bounded
/// set of worker threads reading disjoint ranges.
///
/// The parallel path is taken only when `policy.max_threads() > 1` and the
/// request spans at least `chunk_size * min_chunks_for_threading` bytes;
/// anything smaller incurs no thread overhead at all.
///
/// Short reads caused by end of file are success: the return value is the
/// number of bytes actually placed in `buf`, in file order. If any chunk
/// fails, the call waits for every dispatched worker to finish, then
/// returns the failed chunk's error (lowest file offset first); buffer
/// contents outside successfully completed ranges are unspecified. Failed
/// chunks are not reissued, and there is no cancellation: a stuck OS read
/// blocks the call.
pub fn read_chunked<R: ReadAt>(
    reader: &R,
    offset: u64,
    buf: &mut [u8],
    policy: &ReadPolicy,
) -> Result<usize> {
    if buf.is_empty() {
        return Ok(0);
    }

    let threshold = policy
        .chunk_size
        .saturating_mul(policy.min_chunks_for_threading);
    if policy.max_threads <= 1 || buf.len() < threshold {
        return reader.read_at(offset, buf);
    }

    let ranges = partition(offset, buf.len(), policy.chunk_size);
    let workers = policy.max_threads.min(ranges.len());
    log::debug!(
        "parallel read: {} bytes in {} chunks across {} workers",
        buf.len(),
        ranges.len(),
        workers
    );

    // Pair each range with its disjoint slice of the destination buffer,
    // then deal the pairs round-robin onto the worker queues. Worker i
    // owns chunks i, i+workers, ... and nothing else, so no write to the
    // buffer ever needs synchronization.
    let mut queues: Vec<Vec<(usize, Chunk, &mut [u8])>> =
        (0..workers).map(|_| Vec::new()).collect();
    for (index, (chunk, slice)) in ranges
        .into_iter()
        .zip(buf.chunks_mut(policy.chunk_size))
        .enumerate()
    {
        queues[index % workers].push((index, chunk, slice));
    }

    let failed = AtomicBool::new(false);
    let failed = &failed;

    let results: Vec<ChunkOutcome> = thread::scope(|scope| {
        let handles: Vec<_> = queues
            .into_iter()
            .map(|queue| {
                scope.spawn(move || worker_loop(reader, queue, failed))
            })
            .collect();

        // The scope joins every worker before returning, so a failing
        // chunk can never leave a thread behind.
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(outcome) => outcome,
                // Chunk index MAX ranks a panic after every real I/O
                // failure when picking which error to surface.
                Err(_) => Err((
                    usize::MAX,
                    FileError::Other(anyhow::anyhow!(
                        "read worker panicked"
                    )),
                )),
            })
            .collect()
    });

    let mut total = 0;
    let mut first_failure: Option<(usize, FileError)> = None;
    for outcome in results {
        match outcome {
            Ok(bytes) => total += bytes,
            Err((index, err)) => {
                let earlier = first_failure
                    .as_ref()
                    .map_or(true, |(first, _)| index < *first);
                if earlier {
                    first_failure = Some((index, err));
                }
            }
        }
    }

    match first_failure {
        Some((index, err)) => {
            log::warn!("parallel read failed at chunk {}: {}", index, err);
            Err(err)
        }
        None => Ok(total),
    }
}

/// Bytes read by one worker, or the chunk index and error of its first
/// failed range.
type ChunkOutcome = std::result::Result<usize, (usize, FileError)>;

fn worker_loop<R: ReadAt>(
    reader: &R,
    queue: Vec<(usize, Chunk, &mut [u8])>,
    failed: &AtomicBool,
) -> ChunkOutcome {
    let mut total = 0;
    for (index, chunk, slice) in queue {
        // Once any worker has failed the aggregate result is fixed, so
        // queued ranges can be skipped; the range currently being read
        // always runs to completion.
        if failed.load(Ordering::Relaxed) {
            break;
        }
        debug_assert_eq!(chunk.length, slice.len());
        match reader.read_at(chunk.offset, slice) {
            Ok(bytes) => total += bytes,
            Err(err) => {
                failed.store(true, Ordering::Relaxed);
                return Err((index, err));
            }
        }
    }
    Ok(total)
}
