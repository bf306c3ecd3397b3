//! Byte-order helpers for interpreting raw read buffers as multi-byte
//! values.

use io_error::{FileError, Result};

/// Byte order of multi-byte values in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    /// Byte order of the machine running this code.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }
}

fn take<const N: usize>(buf: &[u8]) -> Result<[u8; N]> {
    buf.get(..N)
        .and_then(|head| head.try_into().ok())
        .ok_or_else(|| {
            FileError::InvalidArgument(format!(
                "buffer too short: need {} bytes, have {}",
                N,
                buf.len()
            ))
        })
}

macro_rules! read_fns {
    ($($name:ident -> $ty:ty),* $(,)?) => {
        $(
            /// Interpret the leading bytes of `buf` in the given byte
            /// order. Fails if the buffer is too short.
            pub fn $name(buf: &[u8], endian: Endian) -> Result<$ty> {
                let bytes = take::<{ std::mem::size_of::<$ty>() }>(buf)?;
                Ok(match endian {
                    Endian::Big => <$ty>::from_be_bytes(bytes),
                    Endian::Little => <$ty>::from_le_bytes(bytes),
                })
            }
        )*
    };
}

read_fns! {
    read_u16 -> u16,
    read_u32 -> u32,
    read_u64 -> u64,
    read_i16 -> i16,
    read_i32 -> i32,
    read_i64 -> i64,
    read_f32 -> f32,
    read_f64 -> f64,
}

pub const fn swap_u16(value: u16) -> u16 {
    value.swap_bytes()
}

pub const fn swap_u32(value: u32) -> u32 {
    value.swap_bytes()
}

pub const fn swap_u64(value: u64) -> u64 {
    value.swap_bytes()
}
