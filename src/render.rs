//! Serialization of a [`GeneratedTable`] as a Rust source fragment.
//!
//! The fragment is meant for `include!` inside its own module:
//!
//! ```ignore
//! mod entfixes {
//!     include!(concat!(env!("OUT_DIR"), "/entfixes.rs"));
//! }
//!
//! let fixed = entfixes::TABLE.apply("maps/e1m1.bsp", &lump, crc);
//! ```

use std::fmt::Write;

use crate::create::GeneratedTable;
use crate::literal_pool::escape_bytes;
use crate::patch_format::EfOp;

const HEADER: &str = "// Generated by entfix-gen from old/ and new/ entity lumps. Do not edit.\n";

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Path the generated code uses to name the runtime types, e.g. `entfix` or `crate`.
    pub crate_path: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            crate_path: "entfix".to_string(),
        }
    }
}

/// Render `table`. Identical tables render to identical text.
pub fn render(table: &GeneratedTable, options: &RenderOptions) -> String {
    let krate = &options.crate_path;
    let mut out = String::new();

    out.push_str(HEADER);
    out.push('\n');
    let _ = writeln!(out, "#[allow(unused_imports)]");
    let _ = writeln!(out, "use {krate}::{{EfFix, EfOp, EfPatch, FixTable}};");
    out.push('\n');

    for (i, literal) in table.literals.iter().enumerate() {
        let _ = writeln!(out, "// offset {}", literal.offset);
        let _ = writeln!(
            out,
            "const LITERAL_{i}: &[u8] = b\"{}\";",
            escape_bytes(&literal.bytes)
        );
    }
    if !table.literals.is_empty() {
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "pub static LITERALS: [u8; {}] = {krate}::concat_literals(&[",
        table.literal_bytes()
    );
    for i in 0..table.literals.len() {
        let _ = writeln!(out, "    LITERAL_{i},");
    }
    out.push_str("]);\n\n");

    out.push_str("pub static PATCHES: &[EfPatch] = &[\n");
    for (n, group) in table.groups.iter().enumerate() {
        if n > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "    // {}", group.label);
        for patch in &table.patches[group.start..group.start + group.count] {
            let _ = writeln!(
                out,
                "    EfPatch {{ op: EfOp::{}, size: {}, value: {} }},",
                op_name(patch.op),
                patch.size,
                patch.value
            );
        }
    }
    out.push_str("];\n\n");

    out.push_str("pub static FIXES: &[EfFix<'static>] = &[\n");
    for fix in &table.fixes {
        let _ = writeln!(
            out,
            "    EfFix {{ map: {:?}, crc: 0x{:04x}, old_size: {}, new_size: {}, patch_index: {}, patch_count: {} }},",
            fix.map, fix.crc, fix.old_size, fix.new_size, fix.patch_index, fix.patch_count
        );
    }
    out.push_str("];\n\n");

    out.push_str("pub static TABLE: FixTable<'static> = FixTable::new(&LITERALS, PATCHES, FIXES);\n");
    out
}

fn op_name(op: EfOp) -> &'static str {
    match op {
        EfOp::Add => "Add",
        EfOp::Copy => "Copy",
        EfOp::Run => "Run",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create::GeneratorContext;

    fn sample_table() -> GeneratedTable {
        let old = b"{\n\"classname\" \"func_door\"\n\"angle\" \"-1\"\n}\n".to_vec();
        let mut new = old.clone();
        new.splice(39..39, b"\"lip\" \"7\"\n".iter().copied());

        let mut context = GeneratorContext::new();
        context.add_map("e1m1", 0xc49d, &old, &new).unwrap();
        context.add_map("Start", 0x0042, b"", b"\t\x08").unwrap();
        context.finish().unwrap()
    }

    #[test]
    fn test_render_layout() {
        let text = render(&sample_table(), &RenderOptions::default());

        assert!(text.starts_with(HEADER));
        assert!(text.contains("use entfix::{EfFix, EfOp, EfPatch, FixTable};"));
        assert!(text.contains("// offset 0\nconst LITERAL_0: &[u8] = b\""));
        assert!(text.contains("\\\"lip\\\" \\\"7\\\"\\n"));
        assert!(text.contains("b\"\\t\\x08\\x00\";"));
        assert!(text.contains("    // e1m1@c49d\n    EfPatch { op: EfOp::Copy, size: 39, value: 0 },"));
        assert!(text.contains("    // Start@0042\n"));
        assert!(text.ends_with(
            "pub static TABLE: FixTable<'static> = FixTable::new(&LITERALS, PATCHES, FIXES);\n"
        ));

        // Sorted by checksum: Start (0x0042) before e1m1 (0xc49d).
        let start = text.find("map: \"Start\", crc: 0x0042").unwrap();
        let e1m1 = text.find("map: \"e1m1\", crc: 0xc49d").unwrap();
        assert!(start < e1m1);
    }

    #[test]
    fn test_render_matches_fixture() {
        let old = b"{\n\"classname\" \"func_door\"\n\"angle\" \"-1\"\n}\n".to_vec();
        let mut new = old.clone();
        new.splice(39..39, b"\"lip\" \"7\"\n".iter().copied());

        let mut context = GeneratorContext::new();
        context.add_map("e1m1", 0xc49d, &old, &new).unwrap();
        let table = context.finish().unwrap();

        assert_eq!(
            render(&table, &RenderOptions::default()),
            include_str!("../tests/fixtures/entfixes.rs")
        );
    }

    #[test]
    fn test_render_crate_path() {
        let options = RenderOptions {
            crate_path: "crate".to_string(),
        };
        let text = render(&sample_table(), &options);
        assert!(text.contains("use crate::{EfFix, EfOp, EfPatch, FixTable};"));
        assert!(text.contains("= crate::concat_literals(&["));
    }

    #[test]
    fn test_render_is_deterministic() {
        let options = RenderOptions::default();
        assert_eq!(render(&sample_table(), &options), render(&sample_table(), &options));
    }

    #[test]
    fn test_render_empty_table() {
        let table = GeneratorContext::new().finish().unwrap();
        let text = render(&table, &RenderOptions::default());
        assert!(text.contains("pub static LITERALS: [u8; 0] = entfix::concat_literals(&[\n]);"));
        assert!(text.contains("pub static FIXES: &[EfFix<'static>] = &[\n];"));
    }
}
