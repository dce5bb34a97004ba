use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::binary_diff::{self, EditSink, HashedDictionary};
use crate::checksum::crc_block;
use crate::literal_pool::{LiteralId, LiteralPool};
use crate::patch_format::{cmp_map_names, EfFix, EfOp, EfPatch, FixTable};
use crate::render::{self, RenderOptions};
use crate::util::{self, MapInput};

/// Edit-script instruction before literal offsets are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOp {
    Add { literal: LiteralId, len: usize },
    Copy { offset: usize, len: usize },
    Run { byte: u8, len: usize },
}

impl PatchOp {
    pub fn output_len(&self) -> usize {
        match *self {
            PatchOp::Add { len, .. } | PatchOp::Copy { len, .. } | PatchOp::Run { len, .. } => len,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingFix {
    map: String,
    crc: u16,
    old_size: u32,
    new_size: u32,
    patch_index: usize,
    patch_count: usize,
}

/// Records encoder actions as `PatchOp`s, interning literals on the way.
struct OpRecorder<'p> {
    literals: &'p mut LiteralPool,
    ops: &'p mut Vec<PatchOp>,
}

impl EditSink for OpRecorder<'_> {
    fn add(&mut self, data: &[u8]) {
        let literal = self.literals.intern(data);
        self.ops.push(PatchOp::Add {
            literal,
            len: data.len(),
        });
    }

    fn copy(&mut self, offset: usize, len: usize) {
        self.ops.push(PatchOp::Copy { offset, len });
    }

    fn run(&mut self, byte: u8, len: usize) {
        self.ops.push(PatchOp::Run { byte, len });
    }
}

/// Accumulates literals, operations and fixes across every processed map.
#[derive(Debug, Default)]
pub struct GeneratorContext {
    literals: LiteralPool,
    ops: Vec<PatchOp>,
    fixes: Vec<PendingFix>,
}

/// Per-map result of [`GeneratorContext::add_map`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSummary {
    pub old_size: u32,
    pub new_size: u32,
    pub ops: usize,
}

impl GeneratorContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff one map's entity text and append its operations.
    ///
    /// `old` and `new` are the lump contents without terminator; the stored
    /// sizes and the edit script both cover the terminator byte.
    pub fn add_map(&mut self, map: &str, crc: u16, old: &[u8], new: &[u8]) -> Result<MapSummary> {
        if map.is_empty() {
            bail!("Empty map identifier");
        }

        let old = with_terminator(old);
        let new = with_terminator(new);
        let old_size = table_size(old.len(), map)?;
        let new_size = table_size(new.len(), map)?;

        if let Some(existing) = self.fixes.iter().find(|f| {
            f.crc == crc && f.old_size == old_size && cmp_map_names(&f.map, map).is_eq()
        }) {
            bail!(
                "Duplicate fix for {map}@{crc:04x} ({old_size} bytes), already defined by {}",
                existing.map
            );
        }

        let patch_index = self.ops.len();
        let dictionary = HashedDictionary::new(&old);
        let mut recorder = OpRecorder {
            literals: &mut self.literals,
            ops: &mut self.ops,
        };
        binary_diff::encode(&dictionary, &new, &mut recorder);
        let patch_count = self.ops.len() - patch_index;

        debug_assert_eq!(
            self.ops[patch_index..].iter().map(PatchOp::output_len).sum::<usize>(),
            new.len()
        );

        self.fixes.push(PendingFix {
            map: map.to_string(),
            crc,
            old_size,
            new_size,
            patch_index,
            patch_count,
        });

        Ok(MapSummary {
            old_size,
            new_size,
            ops: patch_count,
        })
    }

    /// Resolve literal ids to pool offsets and sort the fixes.
    pub fn finish(self) -> Result<GeneratedTable> {
        let offsets = self.literals.offsets();

        let mut groups = Vec::with_capacity(self.fixes.len());
        let mut patches = Vec::with_capacity(self.ops.len());
        for fix in &self.fixes {
            groups.push(PatchGroup {
                label: format!("{}@{:04x}", fix.map, fix.crc),
                start: patches.len(),
                count: fix.patch_count,
            });
            for op in &self.ops[fix.patch_index..fix.patch_index + fix.patch_count] {
                patches.push(resolve(op, &offsets, &fix.map)?);
            }
        }

        let mut fixes: Vec<FixRecord> = self
            .fixes
            .into_iter()
            .map(|fix| -> Result<FixRecord> {
                Ok(FixRecord {
                    patch_index: table_size(fix.patch_index, &fix.map)?,
                    patch_count: table_size(fix.patch_count, &fix.map)?,
                    map: fix.map,
                    crc: fix.crc,
                    old_size: fix.old_size,
                    new_size: fix.new_size,
                })
            })
            .collect::<Result<_>>()?;
        fixes.sort_by(|a, b| a.as_fix().key_cmp(b.crc, b.old_size, &b.map));

        let literals = self
            .literals
            .into_entries()
            .into_iter()
            .zip(offsets)
            .map(|(bytes, offset)| Literal { bytes, offset })
            .collect();

        Ok(GeneratedTable {
            literals,
            patches,
            groups,
            fixes,
        })
    }
}

fn resolve(op: &PatchOp, offsets: &[usize], map: &str) -> Result<EfPatch> {
    let (op, len, value) = match *op {
        PatchOp::Add { literal, len } => (EfOp::Add, len, offsets[literal.index()]),
        PatchOp::Copy { offset, len } => (EfOp::Copy, len, offset),
        PatchOp::Run { byte, len } => (EfOp::Run, len, byte as usize),
    };
    Ok(EfPatch {
        op,
        size: table_size(len, map)?,
        value: table_size(value, map)?,
    })
}

fn with_terminator(content: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(content.len() + 1);
    data.extend_from_slice(content);
    data.push(0);
    data
}

fn table_size(value: usize, map: &str) -> Result<u32> {
    u32::try_from(value).with_context(|| format!("Value {value} for {map} does not fit the fix table"))
}

/// A literal pool entry with its resolved byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub bytes: Vec<u8>,
    pub offset: usize,
}

/// The operations of one map inside the flat patch array, in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchGroup {
    pub label: String,
    pub start: usize,
    pub count: usize,
}

/// Owned counterpart of [`EfFix`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixRecord {
    pub map: String,
    pub crc: u16,
    pub old_size: u32,
    pub new_size: u32,
    pub patch_index: u32,
    pub patch_count: u32,
}

impl FixRecord {
    pub fn as_fix(&self) -> EfFix<'_> {
        EfFix {
            map: &self.map,
            crc: self.crc,
            old_size: self.old_size,
            new_size: self.new_size,
            patch_index: self.patch_index,
            patch_count: self.patch_count,
        }
    }
}

/// Output of one generator run, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTable {
    pub literals: Vec<Literal>,
    pub patches: Vec<EfPatch>,
    pub groups: Vec<PatchGroup>,
    pub fixes: Vec<FixRecord>,
}

impl GeneratedTable {
    /// The literal pool as one blob, as `concat_literals` builds it.
    pub fn literal_blob(&self) -> Vec<u8> {
        self.literals.iter().flat_map(|l| l.bytes.iter().copied()).collect()
    }

    /// Borrowed fix entries for building a [`FixTable`] at run time.
    pub fn fix_entries(&self) -> Vec<EfFix<'_>> {
        self.fixes.iter().map(FixRecord::as_fix).collect()
    }

    /// Run `f` against this table as the applier would see it.
    pub fn with_fix_table<R>(&self, f: impl FnOnce(&FixTable<'_>) -> R) -> R {
        let literals = self.literal_blob();
        let fixes = self.fix_entries();
        f(&FixTable::new(&literals, &self.patches, &fixes))
    }

    pub fn literal_bytes(&self) -> usize {
        self.literals.iter().map(|l| l.bytes.len()).sum()
    }
}

/// Diff every `old/` + `new/` pair under `entities_root`.
pub fn generate(entities_root: &Path) -> Result<GeneratedTable> {
    let inputs = util::collect_inputs(entities_root)?;
    let mut context = GeneratorContext::new();

    for input in &inputs {
        let old = util::read_entities(&input.old_path)?;
        let new = util::read_entities(&input.new_path)?;

        let actual_crc = crc_block(&with_terminator(&old));
        if actual_crc != input.crc {
            log::warn!(
                "{}: checksum of original content is {:04x}, file name says {:04x}",
                input.file_name,
                actual_crc,
                input.crc
            );
        }

        let summary = context
            .add_map(&input.map, input.crc, &old, &new)
            .with_context(|| format!("Failed to process {}", input.file_name))?;
        log::debug!(
            "{}: {} -> {} bytes, {} operations",
            input.file_name,
            summary.old_size,
            summary.new_size,
            summary.ops
        );
    }

    context.finish()
}

/// Options for [`run`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Regenerate even if the output is newer than every input.
    pub force: bool,
    pub render: RenderOptions,
}

/// What a call to [`run`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    UpToDate,
    Written(GenerateSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSummary {
    pub maps: usize,
    pub operations: usize,
    pub literals: usize,
    pub literal_bytes: usize,
}

/// Regenerate `output` from `entities_root` unless it is already up to date.
pub fn run(entities_root: &Path, output: &Path, options: &GenerateOptions) -> Result<GenerateOutcome> {
    if !options.force {
        let inputs = util::collect_inputs(entities_root)?;
        if !util::is_stale(output, &input_paths(&inputs))? {
            log::info!("{} is up to date", output.display());
            return Ok(GenerateOutcome::UpToDate);
        }
    }

    let table = generate(entities_root)?;
    let source = render::render(&table, &options.render);
    util::write_atomic(output, source.as_bytes())?;
    log::info!("Wrote {}", output.display());

    Ok(GenerateOutcome::Written(GenerateSummary {
        maps: table.fixes.len(),
        operations: table.patches.len(),
        literals: table.literals.len(),
        literal_bytes: table.literal_bytes(),
    }))
}

fn input_paths(inputs: &[MapInput]) -> Vec<&Path> {
    inputs
        .iter()
        .flat_map(|i| [i.old_path.as_path(), i.new_path.as_path()])
        .collect()
}
