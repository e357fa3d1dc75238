// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use hpva::value::wire::{from_wire_type_value, from_wire_valid, to_wire_full};
use hpva::{ReadBuf, TypeStore, Value, WriteBuf};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Fuzz the combined descriptor + value decode path.
    let mut cache = TypeStore::new();
    let mut buf = ReadBuf::new(data, false);
    let Some(value) = from_wire_type_value(&mut buf, &mut cache) else {
        return;
    };

    // anything that decoded cleanly must re-encode cleanly
    let mut out = WriteBuf::le();
    to_wire_full(&mut out, &value);
    assert!(out.good());

    // and its descriptor must accept a valid-form decode of the remainder
    let mut target = Value::new(value.descs().clone());
    from_wire_valid(&mut buf, &mut cache, &mut target);
});
