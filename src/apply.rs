use std::cmp::Ordering;

use crate::error::IntegrityError;
use crate::patch_format::{EfFix, EfOp, EfPatch, FixTable};

/// Reduce a host map path such as `maps/e1m1.bsp` to the bare name `e1m1`.
pub fn map_base_name(path: &str) -> &str {
    let file = path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path);
    match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    }
}

impl<'a> FixTable<'a> {
    /// Binary search for the fix keyed by checksum, original size and map.
    ///
    /// `size` counts the lump's terminator byte. `map` may be a full path.
    pub fn find(&self, map: &str, size: usize, crc: u16) -> Option<&'a EfFix<'a>> {
        let size = u32::try_from(size).ok()?;
        let map = map_base_name(map);
        let fixes: &'a [EfFix<'a>] = self.fixes;
        let at = fixes.partition_point(|fix| fix.key_cmp(crc, size, map) == Ordering::Less);
        fixes
            .get(at)
            .filter(|fix| fix.key_cmp(crc, size, map) == Ordering::Equal)
    }

    /// Build the corrected lump for `entities` if a fix is known for it.
    ///
    /// `entities` is the whole original lump including its terminator.
    /// `Ok(None)` means no fix applies and the original should be used as is.
    pub fn try_apply(
        &self,
        map: &str,
        entities: &[u8],
        crc: u16,
    ) -> Result<Option<Vec<u8>>, IntegrityError> {
        let Some(fix) = self.find(map, entities.len(), crc) else {
            return Ok(None);
        };

        let patches = self.patches_of(fix)?;
        let new_size = fix.new_size as usize;
        let mut out = Vec::with_capacity(new_size);

        for patch in patches {
            let size = patch.size as usize;
            if out.len() + size > new_size {
                return Err(IntegrityError::OutputOverflow {
                    map: fix.map.to_string(),
                    new_size: fix.new_size,
                });
            }

            match patch.op {
                EfOp::Copy => {
                    let source = self.copy_source(fix, patch, entities.len())?;
                    out.extend_from_slice(&entities[source]);
                }
                EfOp::Add => {
                    let source = self.literal_source(fix, patch)?;
                    out.extend_from_slice(&self.literals[source]);
                }
                EfOp::Run => {
                    let byte = run_byte(fix, patch)?;
                    out.resize(out.len() + size, byte);
                }
            }
        }

        if out.len() != new_size {
            return Err(IntegrityError::LengthMismatch {
                map: fix.map.to_string(),
                expected: fix.new_size,
                actual: out.len(),
            });
        }

        Ok(Some(out))
    }

    /// Host entry point: the corrected lump, or `None` when no fix applies.
    ///
    /// # Panics
    /// If the matched fix is inconsistent with the embedded tables.
    pub fn apply(&self, map: &str, entities: &[u8], crc: u16) -> Option<Vec<u8>> {
        match self.try_apply(map, entities, crc) {
            Ok(fixed) => fixed,
            Err(err) => panic!("corrupt entity fix table: {err}"),
        }
    }

    /// Check ordering and the bounds and lengths of every fix.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        for (index, pair) in self.fixes.windows(2).enumerate() {
            if pair[0].key_cmp(pair[1].crc, pair[1].old_size, pair[1].map) != Ordering::Less {
                return Err(IntegrityError::UnsortedTable {
                    index: index + 1,
                    map: pair[1].map.to_string(),
                });
            }
        }

        for fix in self.fixes {
            let mut written: usize = 0;
            for patch in self.patches_of(fix)? {
                match patch.op {
                    EfOp::Copy => {
                        self.copy_source(fix, patch, fix.old_size as usize)?;
                    }
                    EfOp::Add => {
                        self.literal_source(fix, patch)?;
                    }
                    EfOp::Run => {
                        run_byte(fix, patch)?;
                    }
                }
                written += patch.size as usize;
            }
            if written != fix.new_size as usize {
                return Err(IntegrityError::LengthMismatch {
                    map: fix.map.to_string(),
                    expected: fix.new_size,
                    actual: written,
                });
            }
        }

        Ok(())
    }

    fn patches_of(&self, fix: &EfFix<'_>) -> Result<&'a [EfPatch], IntegrityError> {
        let start = fix.patch_index as usize;
        let patches: &'a [EfPatch] = self.patches;
        start
            .checked_add(fix.patch_count as usize)
            .and_then(|end| patches.get(start..end))
            .ok_or_else(|| IntegrityError::PatchRangeOutOfBounds {
                map: fix.map.to_string(),
                index: fix.patch_index,
                count: fix.patch_count,
                len: patches.len(),
            })
    }

    fn copy_source(
        &self,
        fix: &EfFix<'_>,
        patch: &EfPatch,
        old_size: usize,
    ) -> Result<std::ops::Range<usize>, IntegrityError> {
        checked_range(patch, old_size).ok_or_else(|| IntegrityError::CopyOutOfBounds {
            map: fix.map.to_string(),
            offset: patch.value,
            size: patch.size,
            old_size,
        })
    }

    fn literal_source(
        &self,
        fix: &EfFix<'_>,
        patch: &EfPatch,
    ) -> Result<std::ops::Range<usize>, IntegrityError> {
        checked_range(patch, self.literals.len()).ok_or_else(|| {
            IntegrityError::LiteralOutOfBounds {
                map: fix.map.to_string(),
                offset: patch.value,
                size: patch.size,
                pool_size: self.literals.len(),
            }
        })
    }
}

fn checked_range(patch: &EfPatch, limit: usize) -> Option<std::ops::Range<usize>> {
    let start = patch.value as usize;
    let end = start.checked_add(patch.size as usize)?;
    (end <= limit).then_some(start..end)
}

fn run_byte(fix: &EfFix<'_>, patch: &EfPatch) -> Result<u8, IntegrityError> {
    u8::try_from(patch.value).map_err(|_| IntegrityError::InvalidRunByte {
        map: fix.map.to_string(),
        value: patch.value,
    })
}
