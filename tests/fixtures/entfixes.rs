// Generated by entfix-gen from old/ and new/ entity lumps. Do not edit.

#[allow(unused_imports)]
use entfix::{EfFix, EfOp, EfPatch, FixTable};

// offset 0
const LITERAL_0: &[u8] = b"\"lip\" \"7\"\n}\n\x00";

pub static LITERALS: [u8; 13] = entfix::concat_literals(&[
    LITERAL_0,
]);

pub static PATCHES: &[EfPatch] = &[
    // e1m1@c49d
    EfPatch { op: EfOp::Copy, size: 39, value: 0 },
    EfPatch { op: EfOp::Add, size: 13, value: 0 },
];

pub static FIXES: &[EfFix<'static>] = &[
    EfFix { map: "e1m1", crc: 0xc49d, old_size: 42, new_size: 52, patch_index: 0, patch_count: 2 },
];

pub static TABLE: FixTable<'static> = FixTable::new(&LITERALS, PATCHES, FIXES);
