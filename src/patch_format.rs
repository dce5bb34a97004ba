use std::cmp::Ordering;

/// Kind of a single edit-script instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EfOp {
    /// Append `size` bytes of the literal pool starting at byte offset `value`.
    Add,
    /// Append `size` bytes of the original buffer starting at byte offset `value`.
    Copy,
    /// Append `size` repetitions of the byte `value`.
    Run,
}

/// One entry of the flattened operation array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EfPatch {
    pub op: EfOp,
    pub size: u32,
    pub value: u32,
}

/// Binds a (checksum, original size, map) triple to a range of `EfPatch` entries.
///
/// Both sizes count the trailing terminator byte of the entity lump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EfFix<'a> {
    pub map: &'a str,
    pub crc: u16,
    pub old_size: u32,
    pub new_size: u32,
    pub patch_index: u32,
    pub patch_count: u32,
}

impl EfFix<'_> {
    /// Ordering of the fix array: checksum, then original size, then map name.
    pub fn key_cmp(&self, crc: u16, old_size: u32, map: &str) -> Ordering {
        self.crc
            .cmp(&crc)
            .then(self.old_size.cmp(&old_size))
            .then_with(|| cmp_map_names(self.map, map))
    }
}

/// The three tables produced by the generator, borrowed.
#[derive(Debug, Clone, Copy)]
pub struct FixTable<'a> {
    pub literals: &'a [u8],
    pub patches: &'a [EfPatch],
    pub fixes: &'a [EfFix<'a>],
}

impl<'a> FixTable<'a> {
    pub const fn new(literals: &'a [u8], patches: &'a [EfPatch], fixes: &'a [EfFix<'a>]) -> Self {
        Self {
            literals,
            patches,
            fixes,
        }
    }

    pub const fn empty() -> Self {
        Self::new(&[], &[], &[])
    }
}

/// ASCII case-insensitive comparison, matching the host's file name handling.
pub fn cmp_map_names(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

/// Concatenate literal pool entries into one fixed-size blob at compile time.
///
/// Generated tables call this in a `static` initializer; `N` must equal the
/// summed length of `parts`.
pub const fn concat_literals<const N: usize>(parts: &[&[u8]]) -> [u8; N] {
    let mut out = [0u8; N];
    let mut at = 0;
    let mut i = 0;
    while i < parts.len() {
        let part = parts[i];
        let mut j = 0;
        while j < part.len() {
            assert!(at < N, "literal pool is longer than its declared size");
            out[at] = part[j];
            at += 1;
            j += 1;
        }
        i += 1;
    }
    assert!(at == N, "literal pool is shorter than its declared size");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &[u8] = b"ab";
    const B: &[u8] = b"\x00cd";
    static POOL: [u8; 5] = concat_literals(&[A, B]);

    #[test]
    fn test_concat_literals_in_static() {
        assert_eq!(&POOL, b"ab\x00cd");
        let empty: [u8; 0] = concat_literals(&[]);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_map_names_ignore_case() {
        assert_eq!(cmp_map_names("E1M1", "e1m1"), Ordering::Equal);
        assert_eq!(cmp_map_names("e1m1", "e1m2"), Ordering::Less);
        assert_eq!(cmp_map_names("start", "E1M1"), Ordering::Greater);
    }

    #[test]
    fn test_key_order_checksum_first() {
        let fix = EfFix {
            map: "zzz",
            crc: 0x0001,
            old_size: 900,
            new_size: 901,
            patch_index: 0,
            patch_count: 1,
        };
        assert_eq!(fix.key_cmp(0x0002, 1, "aaa"), Ordering::Less);
        assert_eq!(fix.key_cmp(0x0001, 1000, "aaa"), Ordering::Less);
        assert_eq!(fix.key_cmp(0x0001, 900, "aaa"), Ordering::Greater);
        assert_eq!(fix.key_cmp(0x0001, 900, "ZZZ"), Ordering::Equal);
    }
}
