// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use hpva::desc::wire::from_wire;
use hpva::{calculate_offset, ReadBuf, TypeStore};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Fuzz descriptor decode in both byte orders; a shared cache across the
    // two passes exercises 0xFD/0xFE interactions.
    let mut cache = TypeStore::new();

    for be in [false, true] {
        let mut buf = ReadBuf::new(data, be);
        let mut descs = Vec::new();
        from_wire(&mut buf, &mut descs, &mut cache, 0);
        if buf.good() {
            calculate_offset(&mut descs);
        }
    }
});
