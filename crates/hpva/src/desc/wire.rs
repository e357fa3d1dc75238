// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire codec for descriptor trees.
//!
//! ```text
//! <tag> ...                         plain descriptor, recursive
//! 0xFF                              null descriptor (absent field)
//! 0xFD <u16 key> <descriptor>       define: decode, then cache under key
//! 0xFE <u16 key>                    fetch: splice the cached tree back in
//! ```
//!
//! Whether to announce a type with `0xFD` or reference it with `0xFE` is the
//! connection's call; this module emits whichever form it is asked for and
//! accepts all of them on decode.

use super::{hash_str, link_member, FieldDesc, TypeStore};
use crate::typecode::TypeCode;
use crate::wire::{read_size, read_string, write_size, write_str, ReadBuf, WriteBuf};

/// Nesting bound for descriptor decode. Exceeding it is a wire fault.
pub const MAX_DEPTH: u32 = 20;

const TAG_NULL: u8 = 0xff;
const TAG_CACHE_DEF: u8 = 0xfd;
const TAG_CACHE_REF: u8 = 0xfe;

/// Encode the subtree rooted at `index` in plain form.
pub fn to_wire(buf: &mut WriteBuf, descs: &[FieldDesc], index: usize) {
    let desc = &descs[index];
    buf.write_u8(desc.code.to_u8());

    match desc.code {
        TypeCode::StructA | TypeCode::UnionA => to_wire(buf, descs, index + 1),
        TypeCode::Struct | TypeCode::Union => {
            write_str(buf, &desc.id);
            write_size(buf, desc.miter.len());
            for (name, rel) in &desc.miter {
                write_str(buf, name);
                to_wire(buf, descs, index + *rel as usize);
            }
        }
        _ => {}
    }
}

/// Encode the null descriptor (absent field).
pub fn to_wire_null(buf: &mut WriteBuf) {
    buf.write_u8(TAG_NULL);
}

/// Encode the subtree rooted at `index` as a cache definition under `key`.
pub fn to_wire_cache_def(buf: &mut WriteBuf, key: u16, descs: &[FieldDesc], index: usize) {
    buf.write_u8(TAG_CACHE_DEF);
    buf.write_u16(key);
    to_wire(buf, descs, index);
}

/// Encode a reference to a previously defined cache entry.
pub fn to_wire_cache_ref(buf: &mut WriteBuf, key: u16) {
    buf.write_u8(TAG_CACHE_REF);
    buf.write_u16(key);
}

/// Decode one descriptor tree, appending its nodes to `descs`.
///
/// A null descriptor appends nothing; callers detect it by an unchanged
/// `descs.len()`. On fault `descs` may hold a partial tree the caller must
/// discard. Top-level callers pass `depth == 0` and run
/// [`super::calculate_offset`] once the full tree is in.
pub fn from_wire(buf: &mut ReadBuf, descs: &mut Vec<FieldDesc>, cache: &mut TypeStore, depth: u32) {
    if !buf.good() || depth > MAX_DEPTH {
        buf.fault("type nesting too deep");
        return;
    }

    let tag = buf.read_u8();
    let index = descs.len();

    if tag == TAG_NULL {
        return;
    }

    if tag == TAG_CACHE_DEF {
        let key = buf.read_u16();
        from_wire(buf, descs, cache, depth + 1);
        if !buf.good() || descs.len() == index {
            buf.fault("empty type cache definition");
            return;
        }
        cache.insert(key, &descs[index..]);
        return;
    }

    if tag == TAG_CACHE_REF {
        let key = buf.read_u16();
        if !buf.good() {
            return;
        }
        match cache.fetch(key) {
            Some(entry) if !entry.is_empty() => {
                log::trace!("type cache hit key={key}");
                descs.extend_from_slice(entry);
            }
            _ => buf.fault("dangling type cache key"),
        }
        return;
    }

    if tag & TypeCode::FIXED_BIT != 0 {
        buf.fault("fixed-size encoding is deprecated");
        return;
    }

    let code = match TypeCode::from_u8(tag) {
        Some(code) => code,
        None => {
            buf.fault("unknown type tag");
            return;
        }
    };

    descs.push(FieldDesc::new(code));

    match code {
        TypeCode::StructA | TypeCode::UnionA => {
            from_wire(buf, descs, cache, depth + 1);
            if !buf.good()
                || descs.len() <= index + 1
                || descs[index + 1].code != code.scalar_of()
            {
                buf.fault("array element type mismatch");
                return;
            }
        }
        TypeCode::Struct | TypeCode::Union => {
            let id = read_string(buf);
            let nmembers = read_size(buf);
            if !buf.good() {
                return;
            }
            // each member needs at least a name length and a tag on the wire
            if nmembers > buf.remaining() {
                buf.fault("member count past end of buffer");
                return;
            }
            {
                let desc = &mut descs[index];
                desc.hash ^= hash_str(&id);
                desc.id = id;
                desc.miter.reserve(nmembers);
            }

            for _ in 0..nmembers {
                let cindex = descs.len();
                let name = read_string(buf);
                from_wire(buf, descs, cache, depth + 1);
                if !buf.good() || descs.len() <= cindex {
                    buf.fault("missing member type");
                    return;
                }
                link_member(descs, index, cindex, &name);
            }
        }
        // scalar, string, Any and their arrays are a single node
        _ => {}
    }

    descs[index].num_index = (descs.len() - index) as u32;
}
