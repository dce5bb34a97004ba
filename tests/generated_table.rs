//! The generated fragment compiles as-is and drives the applier.

mod entfixes {
    include!("fixtures/entfixes.rs");
}

const DOOR: &[u8] = b"{\n\"classname\" \"func_door\"\n\"angle\" \"-1\"\n}\n\0";

#[test]
fn test_included_table_applies() {
    assert_eq!(entfixes::TABLE.validate(), Ok(()));

    let fixed = entfixes::TABLE
        .apply("maps/e1m1.bsp", DOOR, 0xc49d)
        .expect("fix should apply");
    assert_eq!(
        fixed,
        b"{\n\"classname\" \"func_door\"\n\"angle\" \"-1\"\n\"lip\" \"7\"\n}\n\0"
    );
}

#[test]
fn test_included_table_rejects_other_lumps() {
    assert!(entfixes::TABLE.apply("maps/e1m2.bsp", DOOR, 0xc49d).is_none());
    assert!(entfixes::TABLE.apply("maps/e1m1.bsp", DOOR, 0x0000).is_none());
    assert!(entfixes::TABLE
        .apply("maps/e1m1.bsp", &DOOR[..DOOR.len() - 1], 0xc49d)
        .is_none());
}

#[test]
fn test_literal_pool_layout() {
    assert_eq!(entfixes::LITERALS.len(), 13);
    assert_eq!(entfixes::PATCHES.len(), 2);
    assert_eq!(entfixes::FIXES[0].new_size as usize, DOOR.len() + 10);
}
