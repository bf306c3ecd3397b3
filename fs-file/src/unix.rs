use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;

/// One-shot positioned read; may return fewer bytes than requested.
/// Does not touch the file cursor.
pub fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    FileExt::read_at(file, buf, offset)
}

/// One-shot positioned write; may write fewer bytes than requested.
/// Does not touch the file cursor.
pub fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    FileExt::write_at(file, buf, offset)
}
