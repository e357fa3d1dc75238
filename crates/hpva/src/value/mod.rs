// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed value storage bound to a descriptor tree.
//!
//! A [`Value`] owns the storage for one descriptor subtree: one
//! [`FieldStore`] slot per descriptor node, in the same pre-order, plus a
//! valid bitmap recording which slots have been assigned since the last
//! reset. Struct nodes own no payload; their `Null` slot anchors the flat
//! member walk. Union and Any slots hold a nested `Value` (or nothing),
//! array slots hold a tagged element vector.

pub mod builder;
pub mod wire;

use std::sync::Arc;

use crate::bitmask::BitMask;
use crate::desc::{walk_members, FieldDesc};
use crate::typecode::TypeCode;
use crate::{Error, Result};

/// Discriminant of a storage slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Struct anchor, no payload
    Null,
    /// Signed integers, widened to i64
    Integer,
    /// Bool and unsigned integers, widened to u64
    UInteger,
    /// Floating point, widened to f64
    Real,
    /// UTF-8 string
    String,
    /// Tagged element vector
    Array,
    /// Nested value (Union/Any)
    Compound,
}

impl StoreKind {
    /// Storage kind used for a descriptor tag.
    pub fn of(code: TypeCode) -> StoreKind {
        if code.is_array() {
            return StoreKind::Array;
        }
        match code {
            TypeCode::Struct => StoreKind::Null,
            TypeCode::Bool
            | TypeCode::UInt8
            | TypeCode::UInt16
            | TypeCode::UInt32
            | TypeCode::UInt64 => StoreKind::UInteger,
            TypeCode::Int8 | TypeCode::Int16 | TypeCode::Int32 | TypeCode::Int64 => {
                StoreKind::Integer
            }
            TypeCode::Float32 | TypeCode::Float64 => StoreKind::Real,
            TypeCode::String => StoreKind::String,
            TypeCode::Union | TypeCode::Any => StoreKind::Compound,
            // arrays handled above
            _ => StoreKind::Array,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StoreKind::Null => "null",
            StoreKind::Integer => "integer",
            StoreKind::UInteger => "uinteger",
            StoreKind::Real => "real",
            StoreKind::String => "string",
            StoreKind::Array => "array",
            StoreKind::Compound => "compound",
        }
    }
}

/// Type-erased array storage: one variant per legal element type.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayStore {
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    String(Vec<String>),
    /// StructA/UnionA/AnyA elements; absent elements encode a 0 presence byte
    Value(Vec<Option<Value>>),
}

impl ArrayStore {
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Int8(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::UInt8(v) => v.len(),
            Self::UInt16(v) => v.len(),
            Self::UInt32(v) => v.len(),
            Self::UInt64(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::String(v) => v.len(),
            Self::Value(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty store for an array tag.
    pub(crate) fn default_for(code: TypeCode) -> ArrayStore {
        match code {
            TypeCode::BoolA => Self::Bool(Vec::new()),
            TypeCode::Int8A => Self::Int8(Vec::new()),
            TypeCode::Int16A => Self::Int16(Vec::new()),
            TypeCode::Int32A => Self::Int32(Vec::new()),
            TypeCode::Int64A => Self::Int64(Vec::new()),
            TypeCode::UInt8A => Self::UInt8(Vec::new()),
            TypeCode::UInt16A => Self::UInt16(Vec::new()),
            TypeCode::UInt32A => Self::UInt32(Vec::new()),
            TypeCode::UInt64A => Self::UInt64(Vec::new()),
            TypeCode::Float32A => Self::Float32(Vec::new()),
            TypeCode::Float64A => Self::Float64(Vec::new()),
            TypeCode::StringA => Self::String(Vec::new()),
            // StructA/UnionA/AnyA and (unreachable) non-array tags
            _ => Self::Value(Vec::new()),
        }
    }

    /// Does this variant store elements of array tag `code`?
    pub(crate) fn matches(&self, code: TypeCode) -> bool {
        matches!(
            (self, code),
            (Self::Bool(_), TypeCode::BoolA)
                | (Self::Int8(_), TypeCode::Int8A)
                | (Self::Int16(_), TypeCode::Int16A)
                | (Self::Int32(_), TypeCode::Int32A)
                | (Self::Int64(_), TypeCode::Int64A)
                | (Self::UInt8(_), TypeCode::UInt8A)
                | (Self::UInt16(_), TypeCode::UInt16A)
                | (Self::UInt32(_), TypeCode::UInt32A)
                | (Self::UInt64(_), TypeCode::UInt64A)
                | (Self::Float32(_), TypeCode::Float32A)
                | (Self::Float64(_), TypeCode::Float64A)
                | (Self::String(_), TypeCode::StringA)
                | (
                    Self::Value(_),
                    TypeCode::StructA | TypeCode::UnionA | TypeCode::AnyA
                )
        )
    }
}

/// One storage slot.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldStore {
    Null,
    Integer(i64),
    UInteger(u64),
    Real(f64),
    String(String),
    Array(ArrayStore),
    Compound(Option<Box<Value>>),
}

impl FieldStore {
    pub fn kind(&self) -> StoreKind {
        match self {
            Self::Null => StoreKind::Null,
            Self::Integer(_) => StoreKind::Integer,
            Self::UInteger(_) => StoreKind::UInteger,
            Self::Real(_) => StoreKind::Real,
            Self::String(_) => StoreKind::String,
            Self::Array(_) => StoreKind::Array,
            Self::Compound(_) => StoreKind::Compound,
        }
    }

    /// Default slot content for a descriptor tag.
    pub(crate) fn default_for(code: TypeCode) -> FieldStore {
        match StoreKind::of(code) {
            StoreKind::Null => Self::Null,
            StoreKind::Integer => Self::Integer(0),
            StoreKind::UInteger => Self::UInteger(0),
            StoreKind::Real => Self::Real(0.0),
            StoreKind::String => Self::String(String::new()),
            StoreKind::Array => Self::Array(ArrayStore::default_for(code)),
            StoreKind::Compound => Self::Compound(None),
        }
    }
}

/// A typed value: one descriptor subtree plus its storage and valid bitmap.
///
/// The descriptor array is shared (`Arc`); the storage is exclusive to this
/// handle. Slot `i` corresponds to descriptor node `root + i`. Absence (the
/// "empty Value" of the protocol) is `Option<Value>` at every boundary.
#[derive(Debug, Clone)]
pub struct Value {
    descs: Arc<[FieldDesc]>,
    root: usize,
    store: Box<[FieldStore]>,
    valid: BitMask,
    /// Slots addressable by the valid-bitmap wire form, in declaration
    /// order. Excludes the root for struct-rooted values.
    members: Vec<u32>,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        // validity is transient bookkeeping, not part of value identity
        self.root == other.root && self.descs == other.descs && self.store == other.store
    }
}

impl Value {
    /// Value over a whole descriptor tree, every slot at its default.
    pub fn new(descs: Arc<[FieldDesc]>) -> Value {
        Self::new_at(descs, 0)
    }

    /// Value rooted at node `root` (union member, array element).
    pub(crate) fn new_at(descs: Arc<[FieldDesc]>, root: usize) -> Value {
        let span = descs[root].num_index as usize;
        let store: Box<[FieldStore]> = (root..root + span)
            .map(|i| FieldStore::default_for(descs[i].code))
            .collect();
        let members = if descs[root].code == TypeCode::Struct {
            let mut members = Vec::new();
            walk_members(&descs, root, |i| members.push((i - root) as u32));
            members
        } else {
            vec![0]
        };
        Value {
            descs,
            root,
            store,
            valid: BitMask::with_len(span),
            members,
        }
    }

    /// Root descriptor node.
    pub fn descriptor(&self) -> &FieldDesc {
        &self.descs[self.root]
    }

    pub fn type_code(&self) -> TypeCode {
        self.descs[self.root].code
    }

    pub fn id(&self) -> &str {
        &self.descs[self.root].id
    }

    pub fn slot_count(&self) -> usize {
        self.store.len()
    }

    /// Shared descriptor array backing this value. Pass together with
    /// [`Value::root`] to the introspection codec to announce the type.
    pub fn descs(&self) -> &Arc<[FieldDesc]> {
        &self.descs
    }

    /// Index of this value's root node within [`Value::descs`].
    pub fn root(&self) -> usize {
        self.root
    }

    /// Descriptor node backing storage slot `slot`.
    pub fn desc_at(&self, slot: usize) -> &FieldDesc {
        &self.descs[self.root + slot]
    }

    /// Raw storage slot, for callers that resolved an index themselves.
    pub fn store_at(&self, slot: usize) -> &FieldStore {
        &self.store[slot]
    }

    pub(crate) fn store_at_mut(&mut self, slot: usize) -> &mut FieldStore {
        &mut self.store[slot]
    }

    pub(crate) fn valid(&self) -> &BitMask {
        &self.valid
    }

    pub(crate) fn valid_mut(&mut self) -> &mut BitMask {
        &mut self.valid
    }

    pub(crate) fn members(&self) -> &[u32] {
        &self.members
    }

    /// Resolve a (dotted) member path to a storage slot. The empty path is
    /// the root. Paths only resolve within struct storage; union members are
    /// reached through [`Value::select`].
    pub fn index_of(&self, path: &str) -> Option<usize> {
        if path.is_empty() {
            return Some(0);
        }
        if self.descs[self.root].code != TypeCode::Struct {
            return None;
        }
        self.descs[self.root].lookup(path).map(|rel| rel as usize)
    }

    fn slot_checked(&self, path: &str) -> Result<usize> {
        self.index_of(path)
            .ok_or_else(|| Error::FieldNotFound(path.to_owned()))
    }

    /// Typed read of a member.
    pub fn get<T: FromValue>(&self, path: &str) -> Result<T> {
        let slot = self.slot_checked(path)?;
        let store = &self.store[slot];
        T::from_store(store).ok_or_else(|| Error::TypeMismatch {
            expected: T::type_name().to_owned(),
            got: store.kind().name().to_owned(),
        })
    }

    /// Typed write of a member. Numeric values coerce to the slot's storage
    /// kind; the slot's valid bit is set.
    pub fn set<T: IntoValue>(&mut self, path: &str, value: T) -> Result<()> {
        let slot = self.slot_checked(path)?;
        self.set_store(slot, value.into_store())
    }

    fn set_store(&mut self, slot: usize, incoming: FieldStore) -> Result<()> {
        let desc_code = self.descs[self.root + slot].code;
        let target = self.store[slot].kind();
        let got = incoming.kind();
        let mismatch = || Error::TypeMismatch {
            expected: target.name().to_owned(),
            got: got.name().to_owned(),
        };

        let coerced = match (incoming, target) {
            (FieldStore::Integer(v), StoreKind::Integer) => FieldStore::Integer(v),
            (FieldStore::Integer(v), StoreKind::UInteger) => FieldStore::UInteger(v as u64),
            (FieldStore::Integer(v), StoreKind::Real) => FieldStore::Real(v as f64),
            (FieldStore::UInteger(v), StoreKind::UInteger) => FieldStore::UInteger(v),
            (FieldStore::UInteger(v), StoreKind::Integer) => FieldStore::Integer(v as i64),
            (FieldStore::UInteger(v), StoreKind::Real) => FieldStore::Real(v as f64),
            (FieldStore::Real(v), StoreKind::Real) => FieldStore::Real(v),
            (FieldStore::Real(v), StoreKind::Integer) => FieldStore::Integer(v as i64),
            (FieldStore::Real(v), StoreKind::UInteger) => FieldStore::UInteger(v as u64),
            (FieldStore::String(v), StoreKind::String) => FieldStore::String(v),
            (FieldStore::Array(arr), StoreKind::Array) => {
                if !arr.matches(desc_code) {
                    return Err(mismatch());
                }
                FieldStore::Array(arr)
            }
            (FieldStore::Compound(inner), StoreKind::Compound) => {
                if desc_code == TypeCode::Union {
                    if let Some(value) = &inner {
                        self.check_union_member(slot, value)?;
                    }
                }
                FieldStore::Compound(inner)
            }
            _ => return Err(mismatch()),
        };

        self.store[slot] = coerced;
        self.valid.set(slot);
        Ok(())
    }

    /// A union's inner value must be rooted at one of its member nodes
    /// within the same descriptor array.
    fn check_union_member(&self, slot: usize, inner: &Value) -> Result<()> {
        let abs = self.root + slot;
        let desc = &self.descs[abs];
        let is_member = Arc::ptr_eq(&self.descs, &inner.descs)
            && desc
                .miter
                .iter()
                .any(|(_, rel)| abs + *rel as usize == inner.root);
        if is_member {
            Ok(())
        } else {
            Err(Error::NotAMember(inner.id().to_owned()))
        }
    }

    /// Select a union member by name, returning the inner value to fill.
    /// Re-selecting the current member keeps its contents.
    pub fn select(&mut self, path: &str, member: &str) -> Result<&mut Value> {
        let slot = self.slot_checked(path)?;
        let abs = self.root + slot;
        if self.descs[abs].code != TypeCode::Union {
            return Err(Error::InvalidOperation(format!(
                "select on non-union field {path:?}"
            )));
        }
        let rel = self.descs[abs]
            .miter
            .iter()
            .find(|(name, _)| name == member)
            .map(|(_, rel)| *rel)
            .ok_or_else(|| Error::NotAMember(member.to_owned()))?;
        let inner_root = abs + rel as usize;

        let keep = matches!(&self.store[slot],
            FieldStore::Compound(Some(inner)) if inner.root == inner_root);
        if !keep {
            let inner = Value::new_at(self.descs.clone(), inner_root);
            self.store[slot] = FieldStore::Compound(Some(Box::new(inner)));
        }
        self.valid.set(slot);
        match &mut self.store[slot] {
            FieldStore::Compound(Some(inner)) => Ok(inner),
            _ => Err(Error::InvalidOperation("union slot lost its value".into())),
        }
    }

    /// Inner value of a Union or Any member, if assigned.
    pub fn selected(&self, path: &str) -> Result<Option<&Value>> {
        let slot = self.slot_checked(path)?;
        match &self.store[slot] {
            FieldStore::Compound(inner) => Ok(inner.as_deref()),
            _ => Err(Error::InvalidOperation(format!(
                "field {path:?} is not a union or any"
            ))),
        }
    }

    /// Fresh element value for a StructA/UnionA member, bound to the array's
    /// element descriptor.
    pub fn element(&self, path: &str) -> Result<Value> {
        let slot = self.slot_checked(path)?;
        let abs = self.root + slot;
        match self.descs[abs].code {
            TypeCode::StructA | TypeCode::UnionA => {
                Ok(Value::new_at(self.descs.clone(), abs + 1))
            }
            _ => Err(Error::InvalidOperation(format!(
                "field {path:?} has no element type"
            ))),
        }
    }

    /// Set the valid bit of a member.
    pub fn mark(&mut self, path: &str) -> Result<()> {
        let slot = self.slot_checked(path)?;
        self.valid.set(slot);
        Ok(())
    }

    /// Clear the valid bit of a member.
    pub fn unmark(&mut self, path: &str) -> Result<()> {
        let slot = self.slot_checked(path)?;
        self.valid.clear(slot);
        Ok(())
    }

    pub fn is_marked(&self, path: &str) -> Result<bool> {
        let slot = self.slot_checked(path)?;
        Ok(self.valid.get(slot))
    }

    /// Clear the whole valid bitmap.
    pub fn unmark_all(&mut self) {
        self.valid.clear_all();
    }
}

/// Conversion out of a storage slot.
pub trait FromValue: Sized {
    fn from_store(store: &FieldStore) -> Option<Self>;
    fn type_name() -> &'static str;
}

/// Conversion into a storage slot.
pub trait IntoValue {
    fn into_store(self) -> FieldStore;
}

macro_rules! impl_from_value_num {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_store(store: &FieldStore) -> Option<Self> {
                    match store {
                        FieldStore::Integer(v) => Some(*v as $ty),
                        FieldStore::UInteger(v) => Some(*v as $ty),
                        FieldStore::Real(v) => Some(*v as $ty),
                        _ => None,
                    }
                }
                fn type_name() -> &'static str {
                    stringify!($ty)
                }
            }
        )*
    };
}

impl_from_value_num!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl FromValue for bool {
    fn from_store(store: &FieldStore) -> Option<Self> {
        match store {
            FieldStore::UInteger(v) => Some(*v != 0),
            FieldStore::Integer(v) => Some(*v != 0),
            _ => None,
        }
    }
    fn type_name() -> &'static str {
        "bool"
    }
}

impl FromValue for String {
    fn from_store(store: &FieldStore) -> Option<Self> {
        match store {
            FieldStore::String(s) => Some(s.clone()),
            _ => None,
        }
    }
    fn type_name() -> &'static str {
        "string"
    }
}

impl FromValue for ArrayStore {
    fn from_store(store: &FieldStore) -> Option<Self> {
        match store {
            FieldStore::Array(arr) => Some(arr.clone()),
            _ => None,
        }
    }
    fn type_name() -> &'static str {
        "array"
    }
}

macro_rules! impl_from_value_vec {
    ($($ty:ty => $variant:ident),*) => {
        $(
            impl FromValue for Vec<$ty> {
                fn from_store(store: &FieldStore) -> Option<Self> {
                    match store {
                        FieldStore::Array(ArrayStore::$variant(v)) => Some(v.clone()),
                        _ => None,
                    }
                }
                fn type_name() -> &'static str {
                    concat!("Vec<", stringify!($ty), ">")
                }
            }
        )*
    };
}

impl_from_value_vec!(
    bool => Bool, i8 => Int8, i16 => Int16, i32 => Int32, i64 => Int64,
    u8 => UInt8, u16 => UInt16, u32 => UInt32, u64 => UInt64,
    f32 => Float32, f64 => Float64, String => String
);

macro_rules! impl_into_value {
    ($($ty:ty => $variant:ident as $wide:ty),*) => {
        $(
            impl IntoValue for $ty {
                fn into_store(self) -> FieldStore {
                    FieldStore::$variant(self as $wide)
                }
            }
        )*
    };
}

impl_into_value!(
    i8 => Integer as i64, i16 => Integer as i64, i32 => Integer as i64, i64 => Integer as i64,
    u8 => UInteger as u64, u16 => UInteger as u64, u32 => UInteger as u64, u64 => UInteger as u64,
    f32 => Real as f64, f64 => Real as f64
);

impl IntoValue for bool {
    fn into_store(self) -> FieldStore {
        FieldStore::UInteger(u64::from(self))
    }
}

impl IntoValue for String {
    fn into_store(self) -> FieldStore {
        FieldStore::String(self)
    }
}

impl IntoValue for &str {
    fn into_store(self) -> FieldStore {
        FieldStore::String(self.to_owned())
    }
}

impl IntoValue for ArrayStore {
    fn into_store(self) -> FieldStore {
        FieldStore::Array(self)
    }
}

macro_rules! impl_into_value_vec {
    ($($ty:ty => $variant:ident),*) => {
        $(
            impl IntoValue for Vec<$ty> {
                fn into_store(self) -> FieldStore {
                    FieldStore::Array(ArrayStore::$variant(self))
                }
            }
        )*
    };
}

impl_into_value_vec!(
    bool => Bool, i8 => Int8, i16 => Int16, i32 => Int32, i64 => Int64,
    u8 => UInt8, u16 => UInt16, u32 => UInt32, u64 => UInt64,
    f32 => Float32, f64 => Float64, String => String
);

impl IntoValue for Value {
    fn into_store(self) -> FieldStore {
        FieldStore::Compound(Some(Box::new(self)))
    }
}

impl IntoValue for Option<Value> {
    fn into_store(self) -> FieldStore {
        FieldStore::Compound(self.map(Box::new))
    }
}

#[cfg(test)]
mod tests {
    use super::builder::TypeDef;
    use super::*;

    fn sample() -> Value {
        let descs = TypeDef::structure(
            "sample_t",
            [
                ("num", TypeDef::scalar(TypeCode::Int32)),
                ("mass", TypeDef::scalar(TypeCode::Float64)),
                ("label", TypeDef::scalar(TypeCode::String)),
                ("flags", TypeDef::scalar(TypeCode::UInt8)),
                (
                    "inner",
                    TypeDef::structure("inner_t", [("x", TypeDef::scalar(TypeCode::Int64))]),
                ),
                ("wave", TypeDef::scalar(TypeCode::Float64A)),
                (
                    "choice",
                    TypeDef::union_of(
                        "choice_t",
                        [
                            ("a", TypeDef::scalar(TypeCode::Int32)),
                            ("b", TypeDef::scalar(TypeCode::String)),
                        ],
                    ),
                ),
                ("blob", TypeDef::scalar(TypeCode::Any)),
            ],
        )
        .build();
        Value::new(descs)
    }

    #[test]
    fn test_default_materialization() {
        let val = sample();
        assert_eq!(val.store_at(0).kind(), StoreKind::Null);
        assert_eq!(val.get::<i32>("num").expect("num"), 0);
        assert_eq!(val.get::<String>("label").expect("label"), "");
        assert_eq!(val.get::<Vec<f64>>("wave").expect("wave"), Vec::<f64>::new());
        assert_eq!(val.selected("choice").expect("choice"), None);
        assert_eq!(val.selected("blob").expect("blob"), None);
    }

    #[test]
    fn test_set_get_scalars() {
        let mut val = sample();
        val.set("num", 42i32).expect("set num");
        val.set("mass", 2.5f64).expect("set mass");
        val.set("label", "probe").expect("set label");
        val.set("flags", true).expect("set flags");

        assert_eq!(val.get::<i32>("num").expect("num"), 42);
        assert_eq!(val.get::<f64>("mass").expect("mass"), 2.5);
        assert_eq!(val.get::<String>("label").expect("label"), "probe");
        assert!(val.get::<bool>("flags").expect("flags"));
    }

    #[test]
    fn test_numeric_coercion_on_set() {
        let mut val = sample();
        // u64 into a signed-int slot, f32 into a double slot
        val.set("num", 7u64).expect("set num");
        val.set("mass", 1.5f32).expect("set mass");
        assert_eq!(val.get::<i64>("num").expect("num"), 7);
        assert_eq!(val.get::<f64>("mass").expect("mass"), 1.5);
    }

    #[test]
    fn test_dotted_path() {
        let mut val = sample();
        val.set("inner.x", 99i64).expect("set inner.x");
        assert_eq!(val.get::<i64>("inner.x").expect("inner.x"), 99);
    }

    #[test]
    fn test_field_not_found() {
        let val = sample();
        match val.get::<i32>("nope") {
            Err(Error::FieldNotFound(name)) => assert_eq!(name, "nope"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_type_mismatch() {
        let mut val = sample();
        assert!(matches!(
            val.set("num", "text"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            val.get::<String>("num"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_struct_anchor_rejects_assignment() {
        let mut val = sample();
        assert!(matches!(
            val.set("inner", 1i32),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_set_marks_valid() {
        let mut val = sample();
        assert!(!val.is_marked("num").expect("marked"));
        val.set("num", 1i32).expect("set");
        assert!(val.is_marked("num").expect("marked"));
        val.unmark("num").expect("unmark");
        assert!(!val.is_marked("num").expect("marked"));

        val.set("mass", 1f64).expect("set");
        val.unmark_all();
        assert!(!val.is_marked("mass").expect("marked"));
    }

    #[test]
    fn test_array_set_and_variant_check() {
        let mut val = sample();
        val.set("wave", vec![1.0f64, 2.0, 3.0]).expect("set wave");
        assert_eq!(val.get::<Vec<f64>>("wave").expect("wave"), [1.0, 2.0, 3.0]);
        // wrong element type
        assert!(matches!(
            val.set("wave", vec![1i32, 2]),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_union_select() {
        let mut val = sample();
        val.select("choice", "a")
            .expect("select a")
            .set("", 5i32)
            .expect("set a");
        let inner = val.selected("choice").expect("choice").expect("assigned");
        assert_eq!(inner.get::<i32>("").expect("value"), 5);

        // re-selecting the same member keeps contents
        val.select("choice", "a").expect("select again");
        let inner = val.selected("choice").expect("choice").expect("assigned");
        assert_eq!(inner.get::<i32>("").expect("value"), 5);

        // switching member resets
        val.select("choice", "b")
            .expect("select b")
            .set("", "hello")
            .expect("set b");
        let inner = val.selected("choice").expect("choice").expect("assigned");
        assert_eq!(inner.get::<String>("").expect("value"), "hello");
    }

    #[test]
    fn test_union_select_not_a_member() {
        let mut val = sample();
        assert!(matches!(
            val.select("choice", "zzz"),
            Err(Error::NotAMember(_))
        ));
        assert!(matches!(
            val.select("num", "a"),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_union_rejects_foreign_value() {
        let mut val = sample();
        let foreign = Value::new(TypeDef::scalar(TypeCode::Int32).build());
        assert!(matches!(
            val.set("choice", foreign),
            Err(Error::NotAMember(_))
        ));
    }

    #[test]
    fn test_any_accepts_any_value() {
        let mut val = sample();
        let mut inner = Value::new(TypeDef::scalar(TypeCode::Int32).build());
        inner.set("", 17i32).expect("set inner");
        val.set("blob", inner).expect("set blob");
        let got = val.selected("blob").expect("blob").expect("assigned");
        assert_eq!(got.get::<i32>("").expect("value"), 17);

        // and explicit clearing
        val.set("blob", None::<Value>).expect("clear blob");
        assert_eq!(val.selected("blob").expect("blob"), None);
    }

    #[test]
    fn test_members_exclude_root_for_structs() {
        let val = sample();
        // root struct excluded; union/array interiors collapse to one slot
        assert!(!val.members().contains(&0));
        let scalar = Value::new(TypeDef::scalar(TypeCode::Int32).build());
        assert_eq!(scalar.members(), [0]);
    }
}
