use anyhow::{bail, Context, Result};
use memmap2::Mmap;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

pub const OLD_DIR: &str = "old";
pub const NEW_DIR: &str = "new";

/// One map to diff: `old/<file_name>` against `new/<file_name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapInput {
    pub file_name: String,
    pub map: String,
    pub crc: u16,
    pub old_path: PathBuf,
    pub new_path: PathBuf,
}

/// Split `<map>@<crc>.<ext>` into the map name and its 16-bit checksum.
pub fn parse_file_name(file_name: &str) -> Result<(String, u16)> {
    let Some((map, rest)) = file_name.split_once('@') else {
        bail!("Malformed entities file name {file_name:?}: missing '@'");
    };
    let Some((crc, _ext)) = rest.split_once('.') else {
        bail!("Malformed entities file name {file_name:?}: missing '.' after checksum");
    };
    if map.is_empty() {
        bail!("Malformed entities file name {file_name:?}: empty map name");
    }
    if crc.len() != 4 || !crc.bytes().all(|b| b.is_ascii_hexdigit()) {
        bail!("Malformed entities file name {file_name:?}: checksum must be 4 hex digits");
    }
    let crc = u16::from_str_radix(crc, 16)
        .with_context(|| format!("Malformed checksum in {file_name:?}"))?;
    Ok((map.to_string(), crc))
}

/// List the regular files directly inside `dir`, sorted by name.
fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to read directory entry in {}", dir.display()))?;
        if !entry.file_type().is_file() {
            log::debug!("Ignoring non-file {}", entry.path().display());
            continue;
        }
        let name = entry
            .file_name()
            .to_str()
            .with_context(|| format!("Non-UTF8 file name: {}", entry.path().display()))?;
        names.push(name.to_string());
    }

    Ok(names)
}

/// Discover the maps under `root/old`, pairing each with `root/new`.
///
/// Every file in `old/` must parse and must have a counterpart in `new/`.
pub fn collect_inputs(root: &Path) -> Result<Vec<MapInput>> {
    let old_dir = root.join(OLD_DIR);
    let new_dir = root.join(NEW_DIR);
    if !old_dir.is_dir() {
        bail!("Missing directory: {}", old_dir.display());
    }
    if !new_dir.is_dir() {
        bail!("Missing directory: {}", new_dir.display());
    }

    let old_names = list_files(&old_dir)?;
    let new_names: BTreeSet<String> = list_files(&new_dir)?.into_iter().collect();

    let mut inputs = Vec::with_capacity(old_names.len());
    for file_name in &old_names {
        let (map, crc) = parse_file_name(file_name)?;
        if !new_names.contains(file_name) {
            bail!(
                "{} has no counterpart {}",
                old_dir.join(file_name).display(),
                new_dir.join(file_name).display()
            );
        }
        inputs.push(MapInput {
            file_name: file_name.clone(),
            map,
            crc,
            old_path: old_dir.join(file_name),
            new_path: new_dir.join(file_name),
        });
    }

    for orphan in new_names.iter().filter(|n| !old_names.contains(*n)) {
        log::warn!("{} has no original in {}, skipped", orphan, old_dir.display());
    }

    Ok(inputs)
}

/// Load a whole entities file into memory.
pub fn read_entities(path: &Path) -> Result<Vec<u8>> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
    if meta.len() == 0 {
        return Ok(Vec::new());
    }
    Ok(mmap_file(path)?.to_vec())
}

/// Memory-map a file for read-only access.
///
/// # Safety
/// The mapping is read-only. Callers must not truncate or replace the
/// underlying file while the `Mmap` is live.
pub fn mmap_file(path: &Path) -> Result<Mmap> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    // SAFETY: read-only mapping of a build input nobody writes during generation.
    unsafe {
        Mmap::map(&file).with_context(|| format!("Failed to memory-map file: {}", path.display()))
    }
}

fn modified(path: &Path) -> Result<SystemTime> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to read modification time: {}", path.display()))
}

/// True if `output` is missing or older than any of `inputs`.
pub fn is_stale(output: &Path, inputs: &[&Path]) -> Result<bool> {
    if !output.exists() {
        return Ok(true);
    }
    let output_time = modified(output)?;
    for input in inputs {
        if modified(input)? > output_time {
            log::debug!("{} is newer than {}", input.display(), output.display());
            return Ok(true);
        }
    }
    Ok(false)
}

/// Replace `path` with `data` in one step; a failed run leaves no partial file.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(data)
        .with_context(|| format!("Failed to write {}", file.path().display()))?;
    file.flush()?;
    file.persist(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    Ok(())
}
