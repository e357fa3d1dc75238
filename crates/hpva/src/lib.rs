// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # HPVA - PV Access data encoding core
//!
//! A pure Rust implementation of the PVA (EPICS pvAccess) introspection and
//! value codec: self-describing hierarchical types and the typed values that
//! conform to them, over a framed binary wire with per-connection byte order
//! and an on-wire type cache.
//!
//! ## Quick Start
//!
//! ```rust
//! use hpva::{ReadBuf, TypeCode, TypeDef, TypeStore, Value, WriteBuf};
//!
//! // declare a type and fill a value
//! let point = TypeDef::structure(
//!     "point_t",
//!     [
//!         ("x", TypeDef::scalar(TypeCode::Float64)),
//!         ("y", TypeDef::scalar(TypeCode::Float64)),
//!     ],
//! )
//! .build();
//! let mut value = Value::new(point);
//! value.set("x", 1.0f64).unwrap();
//! value.set("y", -2.5f64).unwrap();
//!
//! // announce type and value on the wire
//! let mut out = WriteBuf::le();
//! hpva::desc::wire::to_wire(&mut out, value.descs(), value.root());
//! hpva::value::wire::to_wire_full(&mut out, &value);
//! assert!(out.good());
//!
//! // the receiving side mirrors it back
//! let mut cache = TypeStore::new();
//! let mut input = ReadBuf::le(out.as_slice());
//! let received = hpva::value::wire::from_wire_type_value(&mut input, &mut cache);
//! assert!(input.good());
//! assert_eq!(received.unwrap().get::<f64>("y").unwrap(), -2.5);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +------------------------------------------------------------------+
//! |                       Connection Layer (host)                    |
//! |  framing | byte-order negotiation | per-connection TypeStore     |
//! +------------------------------------------------------------------+
//! |                          Value Codec                             |
//! |  full form | valid-bitmap form | Union/Any | presence arrays     |
//! +------------------------------------------------------------------+
//! |                      Introspection Codec                         |
//! |  recursive FieldDesc trees | 0xFD/0xFE cache | depth bound       |
//! +------------------------------------------------------------------+
//! |                         Wire Primitives                          |
//! |  endian cursors | sticky fault | Size prefix | strings | bitmap  |
//! +------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TypeDef`] | Declarative type construction, encoder side |
//! | [`FieldDesc`] | One node of a flattened, hashed type tree |
//! | [`Value`] | Storage for one type tree plus its valid bitmap |
//! | [`TypeStore`] | Per-connection cache of announced types |
//! | [`ReadBuf`]/[`WriteBuf`] | Endian-aware cursors with sticky faults |
//!
//! ## Error model
//!
//! Malformed wire input never panics and never unwinds: it latches the
//! buffer's sticky fault flag, and callers check [`ReadBuf::good`] once per
//! message. The [`Error`] enum covers the typed accessor API on [`Value`].
//! Disagreements between a descriptor and its storage are programming bugs
//! and panic.
//!
//! Transport, connection lifecycle and the search/beacon protocol live in
//! the host; this crate is synchronous, lock-free and allocation-explicit.

pub mod bitmask;
pub mod desc;
pub mod guid;
pub mod typecode;
pub mod value;
pub mod wire;

pub use bitmask::BitMask;
pub use desc::{calculate_offset, FieldDesc, TypeStore};
pub use guid::Guid;
pub use typecode::TypeCode;
pub use value::builder::TypeDef;
pub use value::{ArrayStore, FieldStore, FromValue, IntoValue, StoreKind, Value};
pub use wire::{ReadBuf, WriteBuf};

use std::fmt;

/// Errors of the typed accessor API on [`Value`].
///
/// Wire-level corruption is reported through the buffer fault flag instead;
/// see the crate docs.
#[derive(Debug)]
pub enum Error {
    /// No member with this (dotted) name.
    FieldNotFound(String),
    /// The member's storage kind cannot hold or produce the requested type.
    TypeMismatch { expected: String, got: String },
    /// Union selection or assignment with a type outside the union.
    NotAMember(String),
    /// Operation applied to a field of the wrong shape.
    InvalidOperation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldNotFound(name) => write!(f, "field not found: {name}"),
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {expected}, got {got}")
            }
            Self::NotAMember(name) => write!(f, "not a union member: {name}"),
            Self::InvalidOperation(msg) => write!(f, "invalid operation: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
