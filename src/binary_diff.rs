use std::collections::HashMap;

use crate::rolling_hash::{hash_window, RollingHash};

/// Width of the rolling hash window and of the indexed dictionary blocks.
pub const BLOCK_SIZE: usize = 16;

/// Shortest stretch of identical literal bytes reported as a run.
pub const MIN_RUN_LENGTH: usize = 8;

/// Upper bound on dictionary candidates verified per target position.
const MAX_CANDIDATES: usize = 64;

/// Receives the edit actions produced by [`encode`], in target order.
pub trait EditSink {
    /// Literal bytes not taken from the dictionary.
    fn add(&mut self, data: &[u8]);
    /// `len` bytes taken from the dictionary at absolute `offset`.
    fn copy(&mut self, offset: usize, len: usize);
    /// `len` repetitions of `byte`.
    fn run(&mut self, byte: u8, len: usize);
}

/// The old buffer, indexed by the rolling hash of each aligned block.
pub struct HashedDictionary<'a> {
    data: &'a [u8],
    blocks: HashMap<u32, Vec<usize>>,
}

struct Match {
    source: usize,
    target: usize,
    len: usize,
}

impl<'a> HashedDictionary<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        let num_blocks = data.len() / BLOCK_SIZE;
        let mut blocks: HashMap<u32, Vec<usize>> = HashMap::with_capacity(num_blocks);
        for i in 0..num_blocks {
            let start = i * BLOCK_SIZE;
            blocks
                .entry(hash_window(&data[start..start + BLOCK_SIZE]))
                .or_default()
                .push(start);
        }
        Self { data, blocks }
    }

    /// Longest verified match for the window at `pos`, extended forward and
    /// backward down to `floor` (the first target byte not yet emitted).
    fn find_match(&self, digest: u32, target: &[u8], pos: usize, floor: usize) -> Option<Match> {
        let candidates = self.blocks.get(&digest)?;
        let window = &target[pos..pos + BLOCK_SIZE];
        let mut best: Option<Match> = None;

        for &start in candidates.iter().take(MAX_CANDIDATES) {
            if &self.data[start..start + BLOCK_SIZE] != window {
                continue;
            }

            let forward = common_prefix(
                &self.data[start + BLOCK_SIZE..],
                &target[pos + BLOCK_SIZE..],
            );
            let backward = common_suffix(&self.data[..start], &target[floor..pos]);
            let len = backward + BLOCK_SIZE + forward;

            if best.as_ref().map_or(true, |b| len > b.len) {
                best = Some(Match {
                    source: start - backward,
                    target: pos - backward,
                    len,
                });
            }
        }

        best
    }
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[u8], b: &[u8]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Encode `target` against `dictionary`, streaming Add/Copy/Run actions into `sink`.
///
/// Replaying the actions in order reproduces `target` exactly. Copy offsets
/// are absolute positions in the dictionary.
pub fn encode<S: EditSink>(dictionary: &HashedDictionary<'_>, target: &[u8], sink: &mut S) {
    let mut literal_start = 0;

    if target.len() >= BLOCK_SIZE && !dictionary.blocks.is_empty() {
        let mut rolling = RollingHash::new(&target[..BLOCK_SIZE]);
        let mut pos = 0;

        while pos + BLOCK_SIZE <= target.len() {
            match dictionary.find_match(rolling.digest(), target, pos, literal_start) {
                Some(m) => {
                    emit_literal(&target[literal_start..m.target], sink);
                    sink.copy(m.source, m.len);

                    pos = m.target + m.len;
                    literal_start = pos;
                    if pos + BLOCK_SIZE <= target.len() {
                        rolling = RollingHash::new(&target[pos..pos + BLOCK_SIZE]);
                    }
                }
                None => {
                    pos += 1;
                    if pos + BLOCK_SIZE <= target.len() {
                        rolling.roll(target[pos - 1], target[pos + BLOCK_SIZE - 1]);
                    }
                }
            }
        }
    }

    emit_literal(&target[literal_start..], sink);
}

/// Split unmatched bytes into runs of repeated bytes and plain literals.
fn emit_literal<S: EditSink>(data: &[u8], sink: &mut S) {
    let mut start = 0;
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        let run = data[i..].iter().take_while(|&&b| b == byte).count();
        if run >= MIN_RUN_LENGTH {
            if start < i {
                sink.add(&data[start..i]);
            }
            sink.run(byte, run);
            i += run;
            start = i;
        } else {
            i += run;
        }
    }

    if start < data.len() {
        sink.add(&data[start..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Action {
        Add(Vec<u8>),
        Copy(usize, usize),
        Run(u8, usize),
    }

    #[derive(Default)]
    struct Recorder(Vec<Action>);

    impl EditSink for Recorder {
        fn add(&mut self, data: &[u8]) {
            self.0.push(Action::Add(data.to_vec()));
        }
        fn copy(&mut self, offset: usize, len: usize) {
            self.0.push(Action::Copy(offset, len));
        }
        fn run(&mut self, byte: u8, len: usize) {
            self.0.push(Action::Run(byte, len));
        }
    }

    fn diff(old: &[u8], new: &[u8]) -> Vec<Action> {
        let dictionary = HashedDictionary::new(old);
        let mut recorder = Recorder::default();
        encode(&dictionary, new, &mut recorder);
        recorder.0
    }

    fn replay(old: &[u8], actions: &[Action]) -> Vec<u8> {
        let mut out = Vec::new();
        for action in actions {
            match action {
                Action::Add(data) => out.extend_from_slice(data),
                Action::Copy(offset, len) => out.extend_from_slice(&old[*offset..*offset + *len]),
                Action::Run(byte, len) => out.extend(std::iter::repeat(*byte).take(*len)),
            }
        }
        out
    }

    /// Lowercase pseudo-text; never contains uppercase or digits.
    fn lump(len: usize, seed: u32) -> Vec<u8> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                b'a' + ((state >> 16) % 26) as u8
            })
            .collect()
    }

    #[test]
    fn test_identical_data() {
        let old = lump(1000, 1);
        let actions = diff(&old, &old);
        assert_eq!(actions, vec![Action::Copy(0, 1000)]);
    }

    #[test]
    fn test_insertion_in_middle() {
        let old = lump(4000, 2);
        let mut new = old.clone();
        new.splice(1234..1234, b"INSERTED 42".iter().copied());

        let actions = diff(&old, &new);
        assert_eq!(
            actions,
            vec![
                Action::Copy(0, 1234),
                Action::Add(b"INSERTED 42".to_vec()),
                Action::Copy(1234, 4000 - 1234),
            ]
        );
        assert_eq!(replay(&old, &actions), new);
    }

    #[test]
    fn test_deletion_and_replacement() {
        let old = lump(3000, 3);
        let mut new = old[..500].to_vec();
        new.extend_from_slice(b"XY");
        new.extend_from_slice(&old[900..]);

        let actions = diff(&old, &new);
        assert_eq!(replay(&old, &actions), new);
        assert!(actions.contains(&Action::Add(b"XY".to_vec())));
    }

    #[test]
    fn test_runs_split_out_of_literals() {
        let old = lump(2000, 4);
        let mut new = old.clone();
        let mut inserted = b"AB".to_vec();
        inserted.extend(std::iter::repeat(b'=').take(40));
        inserted.extend_from_slice(b"CD");
        new.splice(1000..1000, inserted);

        let actions = diff(&old, &new);
        assert_eq!(
            actions,
            vec![
                Action::Copy(0, 1000),
                Action::Add(b"AB".to_vec()),
                Action::Run(b'=', 40),
                Action::Add(b"CD".to_vec()),
                Action::Copy(1000, 1000),
            ]
        );
    }

    #[test]
    fn test_short_runs_stay_literal() {
        let actions = diff(b"", b"xx====yy");
        assert_eq!(actions, vec![Action::Add(b"xx====yy".to_vec())]);
    }

    #[test]
    fn test_empty_old() {
        let new = vec![0u8; 100];
        let actions = diff(&[], &new);
        assert_eq!(actions, vec![Action::Run(0, 100)]);
    }

    #[test]
    fn test_empty_new() {
        assert!(diff(&lump(100, 5), &[]).is_empty());
    }

    #[test]
    fn test_small_inputs() {
        let old = b"Hello, World!";
        let new = b"Hello, Rust!";
        let actions = diff(old, new);
        assert_eq!(replay(old, &actions), new);
    }

    #[test]
    fn test_moved_block() {
        let old = lump(1600, 6);
        let mut new = old[800..].to_vec();
        new.extend_from_slice(&old[..800]);

        let actions = diff(&old, &new);
        assert_eq!(actions, vec![Action::Copy(800, 800), Action::Copy(0, 800)]);
    }

    #[test]
    fn test_deterministic() {
        let old = lump(5000, 7);
        let mut new = lump(300, 8);
        new.extend_from_slice(&old[100..2500]);
        new.extend_from_slice(b"\0\0\0\0\0\0\0\0\0\0");
        new.extend_from_slice(&old[3000..]);

        let first = diff(&old, &new);
        assert_eq!(first, diff(&old, &new));
        assert_eq!(replay(&old, &first), new);
    }
}
