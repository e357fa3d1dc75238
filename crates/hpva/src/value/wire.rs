// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire codec for typed values.
//!
//! Two forms exist. The full form writes a value tree exhaustively in
//! storage order. The valid form writes the valid bitmap first and then only
//! the marked fields, which is what monitor traffic uses.
//!
//! Dispatch is by storage kind crossed with descriptor tag, exactly the
//! table a well-formed `Value` guarantees; a disagreement between the two is
//! a programming error upstream, not a wire condition.

use std::sync::Arc;

use crate::bitmask::BitMask;
use crate::desc::{self, calculate_offset, TypeStore};
use crate::typecode::TypeCode;
use crate::value::{ArrayStore, FieldStore, StoreKind, Value};
use crate::wire::{
    read_selector, read_size, read_string, write_selector, write_size, write_str, ReadBuf,
    WriteBuf,
};

/// Encode the entire value tree.
pub fn to_wire_full(buf: &mut WriteBuf, val: &Value) {
    to_wire_field(buf, val, 0);
}

/// Encode the valid bitmap, then only the marked fields.
///
/// The wire bitmap is indexed by member ordinal in declaration order; the
/// bitmap itself is not reset by serialization.
pub fn to_wire_valid(buf: &mut WriteBuf, val: &Value) {
    let members = val.members();
    let mut bits = BitMask::with_len(members.len());
    for (ordinal, &slot) in members.iter().enumerate() {
        if val.valid().get(slot as usize) {
            bits.set(ordinal);
        }
    }
    bits.to_wire(buf);

    let mut next = bits.find_set(0);
    while let Some(ordinal) = next {
        to_wire_field(buf, val, members[ordinal] as usize);
        if !buf.good() {
            return;
        }
        next = bits.find_set(ordinal + 1);
    }
}

fn to_wire_field(buf: &mut WriteBuf, val: &Value, slot: usize) {
    let abs = val.root() + slot;
    let desc = &val.descs()[abs];

    match (val.store_at(slot), desc.code) {
        (FieldStore::Null, TypeCode::Struct) => {
            // flat walk over the sub-structure; nested Struct anchors carry
            // no payload, their leaves follow in storage order
            let end = abs + desc.num_index as usize;
            let mut i = abs + 1;
            while i < end {
                let code = val.descs()[i].code;
                let span = val.descs()[i].num_index as usize;
                if code != TypeCode::Struct {
                    to_wire_field(buf, val, i - val.root());
                    if !buf.good() {
                        return;
                    }
                }
                i += match code {
                    TypeCode::Union | TypeCode::StructA | TypeCode::UnionA => span,
                    _ => 1,
                };
            }
        }

        (FieldStore::UInteger(v), TypeCode::Bool) => buf.write_u8(u8::from(*v != 0)),
        (FieldStore::Integer(v), TypeCode::Int8) => buf.write_i8(*v as i8),
        (FieldStore::Integer(v), TypeCode::Int16) => buf.write_i16(*v as i16),
        (FieldStore::Integer(v), TypeCode::Int32) => buf.write_i32(*v as i32),
        (FieldStore::Integer(v), TypeCode::Int64) => buf.write_i64(*v),
        (FieldStore::UInteger(v), TypeCode::UInt8) => buf.write_u8(*v as u8),
        (FieldStore::UInteger(v), TypeCode::UInt16) => buf.write_u16(*v as u16),
        (FieldStore::UInteger(v), TypeCode::UInt32) => buf.write_u32(*v as u32),
        (FieldStore::UInteger(v), TypeCode::UInt64) => buf.write_u64(*v),
        (FieldStore::Real(v), TypeCode::Float32) => buf.write_f32(*v as f32),
        (FieldStore::Real(v), TypeCode::Float64) => buf.write_f64(*v),
        (FieldStore::String(s), TypeCode::String) => write_str(buf, s),

        (FieldStore::Compound(inner), TypeCode::Union) => match inner {
            None => write_selector(buf, None),
            Some(inner) => {
                let selector = desc.miter.iter().position(|(_, rel)| {
                    Arc::ptr_eq(val.descs(), inner.descs())
                        && abs + *rel as usize == inner.root()
                });
                match selector {
                    Some(selector) => {
                        write_size(buf, selector);
                        to_wire_full(buf, inner);
                    }
                    // a bug above the codec, not a wire condition
                    None => panic!("union holds a non-member value"),
                }
            }
        },

        (FieldStore::Compound(inner), TypeCode::Any) => match inner {
            None => buf.write_u8(0xff),
            Some(inner) => {
                desc::wire::to_wire(buf, inner.descs(), inner.root());
                to_wire_full(buf, inner);
            }
        },

        (FieldStore::Array(arr), code) if code.is_array() => {
            to_wire_array(buf, val, slot, arr, code);
        }

        _ => {
            debug_assert!(false, "storage does not match descriptor");
            buf.fault("storage does not match descriptor");
        }
    }
}

fn to_wire_array(buf: &mut WriteBuf, val: &Value, slot: usize, arr: &ArrayStore, code: TypeCode) {
    match (arr, code) {
        (ArrayStore::Bool(v), TypeCode::BoolA) => {
            write_size(buf, v.len());
            for e in v {
                buf.write_u8(u8::from(*e));
            }
        }
        (ArrayStore::Int8(v), TypeCode::Int8A) => {
            write_size(buf, v.len());
            for e in v {
                buf.write_i8(*e);
            }
        }
        (ArrayStore::Int16(v), TypeCode::Int16A) => {
            write_size(buf, v.len());
            for e in v {
                buf.write_i16(*e);
            }
        }
        (ArrayStore::Int32(v), TypeCode::Int32A) => {
            write_size(buf, v.len());
            for e in v {
                buf.write_i32(*e);
            }
        }
        (ArrayStore::Int64(v), TypeCode::Int64A) => {
            write_size(buf, v.len());
            for e in v {
                buf.write_i64(*e);
            }
        }
        (ArrayStore::UInt8(v), TypeCode::UInt8A) => {
            write_size(buf, v.len());
            for e in v {
                buf.write_u8(*e);
            }
        }
        (ArrayStore::UInt16(v), TypeCode::UInt16A) => {
            write_size(buf, v.len());
            for e in v {
                buf.write_u16(*e);
            }
        }
        (ArrayStore::UInt32(v), TypeCode::UInt32A) => {
            write_size(buf, v.len());
            for e in v {
                buf.write_u32(*e);
            }
        }
        (ArrayStore::UInt64(v), TypeCode::UInt64A) => {
            write_size(buf, v.len());
            for e in v {
                buf.write_u64(*e);
            }
        }
        (ArrayStore::Float32(v), TypeCode::Float32A) => {
            write_size(buf, v.len());
            for e in v {
                buf.write_f32(*e);
            }
        }
        (ArrayStore::Float64(v), TypeCode::Float64A) => {
            write_size(buf, v.len());
            for e in v {
                buf.write_f64(*e);
            }
        }
        (ArrayStore::String(v), TypeCode::StringA) => {
            write_size(buf, v.len());
            for e in v {
                write_str(buf, e);
            }
        }
        (ArrayStore::Value(v), TypeCode::StructA | TypeCode::UnionA) => {
            write_size(buf, v.len());
            for elem in v {
                match elem {
                    None => buf.write_u8(0),
                    Some(elem) => {
                        debug_assert!(
                            Arc::ptr_eq(val.descs(), elem.descs())
                                && elem.root() == val.root() + slot + 1,
                            "array element built from a foreign descriptor"
                        );
                        buf.write_u8(1);
                        to_wire_full(buf, elem);
                    }
                }
                if !buf.good() {
                    return;
                }
            }
        }
        (ArrayStore::Value(v), TypeCode::AnyA) => {
            write_size(buf, v.len());
            for elem in v {
                match elem {
                    None => buf.write_u8(0),
                    Some(elem) => {
                        buf.write_u8(1);
                        desc::wire::to_wire(buf, elem.descs(), elem.root());
                        to_wire_full(buf, elem);
                    }
                }
                if !buf.good() {
                    return;
                }
            }
        }
        _ => {
            debug_assert!(false, "array storage does not match descriptor");
            buf.fault("array storage does not match descriptor");
        }
    }
}

/// Decode the entire value tree into `val`.
pub fn from_wire_full(buf: &mut ReadBuf, cache: &mut TypeStore, val: &mut Value) {
    from_wire_field(buf, cache, val, 0);
}

/// Decode the valid form: bitmap, then only the fields whose bit is set.
/// `val`'s valid bitmap is replaced by the received one; unmarked slots keep
/// their prior contents.
pub fn from_wire_valid(buf: &mut ReadBuf, cache: &mut TypeStore, val: &mut Value) {
    let mut bits = BitMask::from_wire(buf);
    if !buf.good() {
        return;
    }
    // encoding rounds the bit count to whole bytes, so trim
    bits.resize(val.members().len());
    val.valid_mut().clear_all();

    let members = val.members().to_vec();
    let mut next = bits.find_set(0);
    while let Some(ordinal) = next {
        let slot = members[ordinal] as usize;
        from_wire_field(buf, cache, val, slot);
        if !buf.good() {
            return;
        }
        val.valid_mut().set(slot);
        next = bits.find_set(ordinal + 1);
    }
}

/// Decode a descriptor followed by a full value of that type. A null
/// descriptor yields `None` with the buffer still good.
pub fn from_wire_type_value(buf: &mut ReadBuf, cache: &mut TypeStore) -> Option<Value> {
    let mut descs = Vec::new();
    desc::wire::from_wire(buf, &mut descs, cache, 0);
    if !buf.good() || descs.is_empty() {
        return None;
    }
    calculate_offset(&mut descs);
    let mut val = Value::new(Arc::from(descs));
    from_wire_full(buf, cache, &mut val);
    buf.good().then_some(val)
}

fn read_presence(buf: &mut ReadBuf) -> bool {
    match buf.read_u8() {
        0 => false,
        1 => true,
        _ => {
            buf.fault("invalid presence byte");
            false
        }
    }
}

fn from_wire_field(buf: &mut ReadBuf, cache: &mut TypeStore, val: &mut Value, slot: usize) {
    if !buf.good() {
        return;
    }
    let abs = val.root() + slot;
    let code = val.descs()[abs].code;
    debug_assert_eq!(val.store_at(slot).kind(), StoreKind::of(code));

    match code {
        TypeCode::Struct => {
            let root = val.root();
            let end = abs + val.descs()[abs].num_index as usize;
            let mut i = abs + 1;
            while i < end {
                let ccode = val.descs()[i].code;
                let span = val.descs()[i].num_index as usize;
                if ccode != TypeCode::Struct {
                    from_wire_field(buf, cache, val, i - root);
                    if !buf.good() {
                        return;
                    }
                }
                i += match ccode {
                    TypeCode::Union | TypeCode::StructA | TypeCode::UnionA => span,
                    _ => 1,
                };
            }
        }

        TypeCode::Bool => {
            let v = buf.read_u8();
            *val.store_at_mut(slot) = FieldStore::UInteger(u64::from(v != 0));
        }
        TypeCode::Int8 => {
            let v = buf.read_i8();
            *val.store_at_mut(slot) = FieldStore::Integer(i64::from(v));
        }
        TypeCode::Int16 => {
            let v = buf.read_i16();
            *val.store_at_mut(slot) = FieldStore::Integer(i64::from(v));
        }
        TypeCode::Int32 => {
            let v = buf.read_i32();
            *val.store_at_mut(slot) = FieldStore::Integer(i64::from(v));
        }
        TypeCode::Int64 => {
            let v = buf.read_i64();
            *val.store_at_mut(slot) = FieldStore::Integer(v);
        }
        TypeCode::UInt8 => {
            let v = buf.read_u8();
            *val.store_at_mut(slot) = FieldStore::UInteger(u64::from(v));
        }
        TypeCode::UInt16 => {
            let v = buf.read_u16();
            *val.store_at_mut(slot) = FieldStore::UInteger(u64::from(v));
        }
        TypeCode::UInt32 => {
            let v = buf.read_u32();
            *val.store_at_mut(slot) = FieldStore::UInteger(u64::from(v));
        }
        TypeCode::UInt64 => {
            let v = buf.read_u64();
            *val.store_at_mut(slot) = FieldStore::UInteger(v);
        }
        TypeCode::Float32 => {
            let v = buf.read_f32();
            *val.store_at_mut(slot) = FieldStore::Real(f64::from(v));
        }
        TypeCode::Float64 => {
            let v = buf.read_f64();
            *val.store_at_mut(slot) = FieldStore::Real(v);
        }
        TypeCode::String => {
            let v = read_string(buf);
            if !buf.good() {
                return;
            }
            *val.store_at_mut(slot) = FieldStore::String(v);
        }

        TypeCode::Union => {
            let selector = read_selector(buf);
            if !buf.good() {
                return;
            }
            match selector {
                None => *val.store_at_mut(slot) = FieldStore::Compound(None),
                Some(selector) => {
                    let desc = &val.descs()[abs];
                    if selector >= desc.miter.len() {
                        buf.fault("invalid union selector");
                        return;
                    }
                    let member_root = abs + desc.miter[selector].1 as usize;
                    let mut inner = Value::new_at(val.descs().clone(), member_root);
                    from_wire_full(buf, cache, &mut inner);
                    if !buf.good() {
                        return;
                    }
                    *val.store_at_mut(slot) = FieldStore::Compound(Some(Box::new(inner)));
                }
            }
        }

        TypeCode::Any => match from_wire_any(buf, cache) {
            AnyField::Fault => {}
            AnyField::Empty => *val.store_at_mut(slot) = FieldStore::Compound(None),
            AnyField::Value(inner) => {
                *val.store_at_mut(slot) = FieldStore::Compound(Some(Box::new(inner)));
            }
        },

        _ if code.is_array() => from_wire_array(buf, cache, val, slot, code),

        _ => {
            debug_assert!(false, "storage does not match descriptor");
            buf.fault("storage does not match descriptor");
        }
    }
}

enum AnyField {
    Fault,
    Empty,
    Value(Value),
}

/// Decode one dynamically typed field: descriptor tree, then its value.
fn from_wire_any(buf: &mut ReadBuf, cache: &mut TypeStore) -> AnyField {
    let mut descs = Vec::new();
    desc::wire::from_wire(buf, &mut descs, cache, 0);
    if !buf.good() {
        return AnyField::Fault;
    }
    if descs.is_empty() {
        return AnyField::Empty;
    }
    calculate_offset(&mut descs);
    let mut inner = Value::new(Arc::from(descs));
    from_wire_full(buf, cache, &mut inner);
    if buf.good() {
        AnyField::Value(inner)
    } else {
        AnyField::Fault
    }
}

fn from_wire_array(
    buf: &mut ReadBuf,
    cache: &mut TypeStore,
    val: &mut Value,
    slot: usize,
    code: TypeCode,
) {
    let len = read_size(buf);
    if !buf.good() {
        return;
    }
    // every element costs at least one wire byte
    if len > buf.remaining() {
        buf.fault("array length past end of buffer");
        return;
    }

    macro_rules! read_elems {
        ($variant:ident, $read:ident) => {{
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(buf.$read());
            }
            ArrayStore::$variant(v)
        }};
        ($variant:ident, $read:ident, $map:expr) => {{
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                let e = buf.$read();
                v.push($map(e));
            }
            ArrayStore::$variant(v)
        }};
    }

    let arr = match code {
        TypeCode::BoolA => read_elems!(Bool, read_u8, |e: u8| e != 0),
        TypeCode::Int8A => read_elems!(Int8, read_i8),
        TypeCode::Int16A => read_elems!(Int16, read_i16),
        TypeCode::Int32A => read_elems!(Int32, read_i32),
        TypeCode::Int64A => read_elems!(Int64, read_i64),
        TypeCode::UInt8A => read_elems!(UInt8, read_u8),
        TypeCode::UInt16A => read_elems!(UInt16, read_u16),
        TypeCode::UInt32A => read_elems!(UInt32, read_u32),
        TypeCode::UInt64A => read_elems!(UInt64, read_u64),
        TypeCode::Float32A => read_elems!(Float32, read_f32),
        TypeCode::Float64A => read_elems!(Float64, read_f64),

        TypeCode::StringA => {
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(read_string(buf));
                if !buf.good() {
                    return;
                }
            }
            ArrayStore::String(v)
        }

        TypeCode::StructA | TypeCode::UnionA => {
            let elem_root = val.root() + slot + 1;
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                let present = read_presence(buf);
                if !buf.good() {
                    return;
                }
                if present {
                    let mut elem = Value::new_at(val.descs().clone(), elem_root);
                    from_wire_full(buf, cache, &mut elem);
                    if !buf.good() {
                        return;
                    }
                    v.push(Some(elem));
                } else {
                    v.push(None);
                }
            }
            ArrayStore::Value(v)
        }

        TypeCode::AnyA => {
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                let present = read_presence(buf);
                if !buf.good() {
                    return;
                }
                if present {
                    match from_wire_any(buf, cache) {
                        AnyField::Fault => return,
                        AnyField::Empty => v.push(None),
                        AnyField::Value(inner) => v.push(Some(inner)),
                    }
                } else {
                    v.push(None);
                }
            }
            ArrayStore::Value(v)
        }

        _ => {
            debug_assert!(false, "not an array tag");
            buf.fault("not an array tag");
            return;
        }
    };

    if !buf.good() {
        return;
    }
    *val.store_at_mut(slot) = FieldStore::Array(arr);
}
