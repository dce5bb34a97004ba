use std::collections::HashMap;
use std::fmt::Write;

/// Index of an entry in a [`LiteralPool`]. Only meaningful until the pool is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LiteralId(usize);

impl LiteralId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Deduplicated inserted byte strings shared by every map of one generation run.
#[derive(Debug, Default)]
pub struct LiteralPool {
    entries: Vec<Vec<u8>>,
    by_escaped: HashMap<String, LiteralId>,
}

impl LiteralPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of an identical existing entry, or appends a new one.
    pub fn intern(&mut self, data: &[u8]) -> LiteralId {
        let escaped = escape_bytes(data);
        if let Some(&id) = self.by_escaped.get(&escaped) {
            return id;
        }
        let id = LiteralId(self.entries.len());
        self.entries.push(data.to_vec());
        self.by_escaped.insert(escaped, id);
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: LiteralId) -> &[u8] {
        &self.entries[id.0]
    }

    /// Byte offset of every entry in the concatenated pool, in pool order.
    pub fn offsets(&self) -> Vec<usize> {
        self.entries
            .iter()
            .scan(0usize, |next, entry| {
                let offset = *next;
                *next += entry.len();
                Some(offset)
            })
            .collect()
    }

    pub fn into_entries(self) -> Vec<Vec<u8>> {
        self.entries
    }
}

/// Escape bytes for a Rust byte-string literal.
pub fn escape_bytes(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len());
    for &c in data {
        match c {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(c as char),
            // Backspace and form feed have no named escape in Rust.
            _ => {
                let _ = write!(out, "\\x{:02x}", c);
            }
        }
    }
    out
}
