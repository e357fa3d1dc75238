// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Variable-length `Size` prefix and wire strings.
//!
//! `Size` carries both lengths and union selectors:
//!
//! ```text
//! 0..=253        -> one byte
//! 254..=2^32-1   -> 0xFE + u32
//! >= 2^32        -> 0xFF + u64
//! null (-1)      -> 0xFF + u64 all-ones
//! ```
//!
//! The null sentinel is surfaced as `Option` on decode; it never leaks into
//! a plain length.

use super::{ReadBuf, WriteBuf};

const MARKER_U32: u8 = 0xfe;
const MARKER_U64: u8 = 0xff;

/// Encode a plain (non-null) size.
pub fn write_size(buf: &mut WriteBuf, n: usize) {
    if n < usize::from(MARKER_U32) {
        buf.write_u8(n as u8);
    } else if n as u64 <= u64::from(u32::MAX) {
        buf.write_u8(MARKER_U32);
        buf.write_u32(n as u32);
    } else {
        buf.write_u8(MARKER_U64);
        buf.write_u64(n as u64);
    }
}

/// Encode a selector; `None` is the null (`-1`) sentinel.
pub fn write_selector(buf: &mut WriteBuf, sel: Option<usize>) {
    match sel {
        Some(n) => write_size(buf, n),
        None => {
            buf.write_u8(MARKER_U64);
            buf.write_u64(u64::MAX);
        }
    }
}

/// Decode a selector. `None` is the null sentinel.
///
/// The result is meaningless once the buffer has faulted; callers check
/// [`ReadBuf::good`] first.
pub fn read_selector(buf: &mut ReadBuf) -> Option<usize> {
    let first = buf.read_u8();
    let raw = match first {
        MARKER_U64 => buf.read_u64(),
        MARKER_U32 => u64::from(buf.read_u32()),
        b => u64::from(b),
    };
    if !buf.good() {
        return None;
    }
    if raw == u64::MAX {
        return None;
    }
    match usize::try_from(raw) {
        Ok(n) => Some(n),
        Err(_) => {
            buf.fault("size exceeds address space");
            None
        }
    }
}

/// Decode a plain size; the null sentinel is a wire fault here.
pub fn read_size(buf: &mut ReadBuf) -> usize {
    match read_selector(buf) {
        Some(n) => n,
        None => {
            buf.fault("null size where a length is required");
            0
        }
    }
}

/// Encode a wire string: `Size` prefix plus raw bytes, no terminator.
pub fn write_str(buf: &mut WriteBuf, s: &str) {
    write_size(buf, s.len());
    buf.write_bytes(s.as_bytes());
}

/// Decode a wire string. The length must fit the remaining buffer and the
/// bytes must be valid UTF-8.
pub fn read_string(buf: &mut ReadBuf) -> String {
    let len = read_size(buf);
    if !buf.good() {
        return String::new();
    }
    if len > buf.remaining() {
        buf.fault("string length past end of buffer");
        return String::new();
    }
    let bytes = buf.read_bytes(len);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => {
            buf.fault("string is not valid UTF-8");
            String::new()
        }
    }
}
