// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Declarative construction of descriptor trees.
//!
//! `TypeDef` is the encoder-side twin of the introspection decoder: it
//! produces the same flattened, hashed, offset-finalized `Arc<[FieldDesc]>`
//! that decoding the equivalent wire bytes would, so values built locally
//! and values received from a peer are indistinguishable.
//!
//! ```
//! use hpva::{TypeCode, TypeDef, Value};
//!
//! let point = TypeDef::structure(
//!     "point_t",
//!     [
//!         ("x", TypeDef::scalar(TypeCode::Float64)),
//!         ("y", TypeDef::scalar(TypeCode::Float64)),
//!     ],
//! );
//! let mut value = Value::new(point.build());
//! value.set("x", 1.0f64).unwrap();
//! ```

use std::sync::Arc;

use crate::desc::{calculate_offset, hash_str, link_member, FieldDesc};
use crate::typecode::TypeCode;

/// Declarative description of one type tree node.
#[derive(Debug, Clone)]
pub struct TypeDef {
    code: TypeCode,
    id: String,
    members: Vec<(String, TypeDef)>,
    element: Option<Box<TypeDef>>,
}

impl TypeDef {
    /// A scalar, string, Any, or plain array field.
    pub fn scalar(code: TypeCode) -> TypeDef {
        TypeDef {
            code,
            id: String::new(),
            members: Vec::new(),
            element: None,
        }
    }

    /// A structure with named members in declaration order.
    pub fn structure<S, N, M>(id: S, members: M) -> TypeDef
    where
        S: Into<String>,
        N: Into<String>,
        M: IntoIterator<Item = (N, TypeDef)>,
    {
        TypeDef {
            code: TypeCode::Struct,
            id: id.into(),
            members: members
                .into_iter()
                .map(|(name, def)| (name.into(), def))
                .collect(),
            element: None,
        }
    }

    /// A union over named member types.
    pub fn union_of<S, N, M>(id: S, members: M) -> TypeDef
    where
        S: Into<String>,
        N: Into<String>,
        M: IntoIterator<Item = (N, TypeDef)>,
    {
        TypeDef {
            code: TypeCode::Union,
            ..Self::structure(id, members)
        }
    }

    /// Array of `element`. Compound elements produce StructA/UnionA/AnyA;
    /// scalar elements collapse to the plain array tag.
    pub fn array_of(element: TypeDef) -> TypeDef {
        match element.code {
            TypeCode::Struct | TypeCode::Union => TypeDef {
                code: element.code.array_of(),
                id: String::new(),
                members: Vec::new(),
                element: Some(Box::new(element)),
            },
            code => Self::scalar(code.array_of()),
        }
    }

    /// Flatten into a finalized descriptor array.
    pub fn build(&self) -> Arc<[FieldDesc]> {
        let mut descs = Vec::new();
        self.emit(&mut descs);
        calculate_offset(&mut descs);
        Arc::from(descs)
    }

    fn emit(&self, descs: &mut Vec<FieldDesc>) {
        let index = descs.len();
        descs.push(FieldDesc::new(self.code));

        match self.code {
            TypeCode::StructA | TypeCode::UnionA => {
                if let Some(element) = &self.element {
                    element.emit(descs);
                }
            }
            TypeCode::Struct | TypeCode::Union => {
                {
                    let desc = &mut descs[index];
                    desc.hash ^= hash_str(&self.id);
                    desc.id = self.id.clone();
                    desc.miter.reserve(self.members.len());
                }
                for (name, def) in &self.members {
                    let cindex = descs.len();
                    def.emit(descs);
                    link_member(descs, index, cindex, name);
                }
            }
            _ => {}
        }

        descs[index].num_index = (descs.len() - index) as u32;
    }
}
