use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::RngCore;
use rstest::rstest;
use tempdir::TempDir;

use fs_file::ReadAt;
use fs_stream::{read_chunked, FileInputStream, ReadPolicy, Whence};
use io_error::{FileError, Result};

/// In-memory reader with file-like EOF semantics, counting every
/// positioned read and tracking how many run concurrently.
struct CountingReader {
    data: Vec<u8>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl CountingReader {
    fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl ReadAt for CountingReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight
            .fetch_max(running, Ordering::SeqCst);

        let offset = offset as usize;
        let end = self.data.len().min(offset + buf.len());
        let bytes = end.saturating_sub(offset);
        if bytes > 0 {
            buf[..bytes].copy_from_slice(&self.data[offset..end]);
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(bytes)
    }

    fn length(&self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }
}

/// Reader that fails any positioned read overlapping `fail_range`, and
/// balances started/finished counters so a leaked worker is observable.
struct FailingReader {
    data: Vec<u8>,
    fail_range: Range<u64>,
    started: AtomicUsize,
    finished: AtomicUsize,
}

impl FailingReader {
    fn new(data: Vec<u8>, fail_range: Range<u64>) -> Self {
        Self {
            data,
            fail_range,
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        }
    }
}

impl ReadAt for FailingReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.started.fetch_add(1, Ordering::SeqCst);

        let end = offset + buf.len() as u64;
        let result = if offset < self.fail_range.end
            && end > self.fail_range.start
        {
            Err(FileError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected read failure",
            )))
        } else {
            let offset = offset as usize;
            let data_end = self.data.len().min(offset + buf.len());
            let bytes = data_end.saturating_sub(offset);
            buf[..bytes].copy_from_slice(&self.data[offset..data_end]);
            Ok(bytes)
        };

        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn length(&self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }
}

fn random_payload(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut data);
    data
}

fn write_payload(dir: &TempDir, payload: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join("payload.bin");
    std::fs::write(&path, payload).expect("Failed to write payload");
    path
}

fn parallel_policy(
    chunk_size: usize,
    min_chunks: usize,
    max_threads: usize,
) -> ReadPolicy {
    let mut policy = ReadPolicy::default();
    policy.set_chunk_size(chunk_size).unwrap();
    policy
        .set_min_chunks_for_threading(min_chunks)
        .unwrap();
    policy.set_max_threads(max_threads).unwrap();
    policy
}

#[rstest]
#[case(4_096, 4, 4)]
#[case(10_000, 4, 8)]
#[case(65_536, 2, 2)]
#[case(1_000, 3, 16)]
fn parallel_read_matches_sequential(
    #[case] chunk_size: usize,
    #[case] min_chunks: usize,
    #[case] max_threads: usize,
) {
    // Length not a multiple of any of the chunk sizes above.
    let payload = random_payload(262_147);
    let dir = TempDir::new("fs-stream").unwrap();
    let path = write_payload(&dir, &payload);

    let mut sequential = FileInputStream::open(&path).unwrap();
    let mut parallel = FileInputStream::open(&path).unwrap();
    parallel.set_parallel_chunk_size(chunk_size).unwrap();
    parallel.set_minimum_chunk_count(min_chunks).unwrap();
    parallel.set_max_read_threads(max_threads).unwrap();

    let mut expected = vec![0u8; payload.len()];
    let mut actual = vec![0u8; payload.len()];
    assert_eq!(sequential.read(&mut expected).unwrap(), payload.len());
    assert_eq!(parallel.read(&mut actual).unwrap(), payload.len());

    assert_eq!(expected, payload);
    assert_eq!(actual, payload);
    assert_eq!(sequential.tell(), parallel.tell());
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(777)]
fn parallel_read_matches_sequential_at_offset(#[case] offset: u64) {
    let payload = random_payload(100_000);
    let dir = TempDir::new("fs-stream").unwrap();
    let path = write_payload(&dir, &payload);

    let mut stream = FileInputStream::open(&path).unwrap();
    stream.set_parallel_chunk_size(8_192).unwrap();
    stream.set_minimum_chunk_count(2).unwrap();
    stream.set_max_read_threads(4).unwrap();
    stream.seek(offset as i64, Whence::Start).unwrap();

    let want = payload.len() - offset as usize;
    let mut buf = vec![0u8; want];
    assert_eq!(stream.read(&mut buf).unwrap(), want);
    assert_eq!(&buf[..], &payload[offset as usize..]);
}

#[test]
fn threshold_boundary_engages_parallel_path() {
    let chunk_size = 1_000;
    let min_chunks = 4;
    let policy = parallel_policy(chunk_size, min_chunks, 8);

    // Exactly min_chunks * chunk_size bytes: parallel, one read per chunk.
    let reader = CountingReader::new(random_payload(8_000));
    let mut buf = vec![0u8; chunk_size * min_chunks];
    assert_eq!(
        read_chunked(&reader, 0, &mut buf, &policy).unwrap(),
        buf.len()
    );
    assert_eq!(reader.calls(), min_chunks);

    // One byte fewer: sequential, a single positioned read.
    let reader = CountingReader::new(random_payload(8_000));
    let mut buf = vec![0u8; chunk_size * min_chunks - 1];
    assert_eq!(
        read_chunked(&reader, 0, &mut buf, &policy).unwrap(),
        buf.len()
    );
    assert_eq!(reader.calls(), 1);
}

#[test]
fn single_thread_policy_never_dispatches_workers() {
    let policy = parallel_policy(100, 1, 1);
    let reader = CountingReader::new(random_payload(10_000));

    let mut buf = vec![0u8; 10_000];
    assert_eq!(
        read_chunked(&reader, 0, &mut buf, &policy).unwrap(),
        10_000
    );
    assert_eq!(reader.calls(), 1);
}

#[test]
fn worker_concurrency_never_exceeds_max_threads() {
    let policy = parallel_policy(500, 2, 3);
    let reader = CountingReader::new(random_payload(50_000));

    let mut buf = vec![0u8; 50_000];
    assert_eq!(
        read_chunked(&reader, 0, &mut buf, &policy).unwrap(),
        50_000
    );
    assert_eq!(reader.calls(), 100);
    assert!(reader.peak_in_flight() <= 3);
}

#[test]
fn zero_length_read_makes_no_os_call() {
    let policy = parallel_policy(100, 1, 8);
    let reader = CountingReader::new(random_payload(1_000));

    assert_eq!(read_chunked(&reader, 0, &mut [], &policy).unwrap(), 0);
    assert_eq!(reader.calls(), 0);
}

#[test]
fn end_of_file_truncates_parallel_read_without_error() {
    let payload = random_payload(10_500);
    let dir = TempDir::new("fs-stream").unwrap();
    let path = write_payload(&dir, &payload);

    let mut stream = FileInputStream::open(&path).unwrap();
    stream.set_parallel_chunk_size(1_000).unwrap();
    stream.set_minimum_chunk_count(4).unwrap();
    stream.set_max_read_threads(4).unwrap();

    // Request four times the file size; the trailing chunks read nothing.
    let mut buf = vec![0u8; 42_000];
    assert_eq!(stream.read(&mut buf).unwrap(), payload.len());
    assert_eq!(&buf[..payload.len()], &payload[..]);
    assert_eq!(stream.tell(), payload.len() as u64);
    assert_eq!(stream.available().unwrap(), 0);
}

#[test]
fn failing_chunk_fails_the_whole_read_without_leaking_workers() {
    let payload = random_payload(100_000);
    // Fail reads touching [30_000, 31_000): chunk 30 of 100.
    let reader = FailingReader::new(payload, 30_000..31_000);
    let policy = parallel_policy(1_000, 4, 8);

    let mut buf = vec![0u8; 100_000];
    let err = read_chunked(&reader, 0, &mut buf, &policy).unwrap_err();
    assert!(matches!(err, FileError::Io(_)));

    // Every positioned read that started also finished: the call joined
    // all dispatched workers before returning.
    assert_eq!(
        reader.started.load(Ordering::SeqCst),
        reader.finished.load(Ordering::SeqCst)
    );
}

#[test]
fn sequential_read_surfaces_failure_directly() {
    let reader = FailingReader::new(random_payload(1_000), 0..1_000);
    let policy = ReadPolicy::default();

    let mut buf = vec![0u8; 500];
    assert!(matches!(
        read_chunked(&reader, 0, &mut buf, &policy).unwrap_err(),
        FileError::Io(_)
    ));
}

// The 100 MiB file / 10 MiB chunk / 8 thread case scaled down by 100x to
// keep the test fast; the chunk arithmetic (10 chunks, parallel engaged)
// is identical.
#[test_log::test]
fn ten_chunk_read_is_byte_identical_to_sequential() {
    let payload = random_payload(1_000_000);
    let dir = TempDir::new("fs-stream").unwrap();
    let path = write_payload(&dir, &payload);

    let mut stream = FileInputStream::open(&path).unwrap();
    stream.set_parallel_chunk_size(100_000).unwrap();
    stream.set_minimum_chunk_count(4).unwrap();
    stream.set_max_read_threads(8).unwrap();

    let mut parallel = vec![0u8; 1_000_000];
    assert_eq!(stream.read(&mut parallel).unwrap(), 1_000_000);

    let mut stream = FileInputStream::open(&path).unwrap();
    let mut sequential = vec![0u8; 1_000_000];
    assert_eq!(stream.read(&mut sequential).unwrap(), 1_000_000);

    assert_eq!(parallel, sequential);
    assert_eq!(parallel, payload);
}
