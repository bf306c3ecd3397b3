use std::fs::File;
use std::io;
use std::os::windows::fs::FileExt;

/// One-shot positioned read; may return fewer bytes than requested.
/// `seek_read` moves the OS cursor as a side effect, but no caller in this
/// crate depends on the cursor, so concurrent positioned reads stay safe.
pub fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    file.seek_read(buf, offset)
}

/// One-shot positioned write; may write fewer bytes than requested.
pub fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    file.seek_write(buf, offset)
}
