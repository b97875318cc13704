//! Ratcliff/Obershelp sequence ratio.
//!
//! Finds the longest common contiguous block, then recurses on the text to
//! its left and right. The ratio is `2 * matched / (len_a + len_b)`.

use crate::utils::matching::comparison_chars;
use rustc_hash::FxHashMap;

/// Sequences at least this long stop seeding blocks from "popular" characters.
const AUTOJUNK_MIN_LEN: usize = 200;

type BlockIndex = FxHashMap<char, Vec<usize>>;

/// Case-insensitive similarity in [0, 1].
///
/// The pair is evaluated in a canonical order, so `sequence_ratio(a, b)`
/// equals `sequence_ratio(b, a)` exactly.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a = comparison_chars(a);
    let b = comparison_chars(b);

    if a == b {
        return 1.0;
    }

    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matched_chars(&a, &b);
    (2.0 * matched as f64 / total as f64).clamp(0.0, 1.0)
}

/// Total size of all matching blocks between `a` and `b`.
fn matched_chars(a: &[char], b: &[char]) -> usize {
    let index = build_index(b);
    let mut pending = vec![(0, a.len(), 0, b.len())];
    let mut matched = 0;

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, &index, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Positions of every character of `b`, minus popular characters on long input.
fn build_index(b: &[char]) -> BlockIndex {
    let mut index: BlockIndex = FxHashMap::default();
    for (j, &c) in b.iter().enumerate() {
        index.entry(c).or_default().push(j);
    }

    if b.len() >= AUTOJUNK_MIN_LEN {
        let max_occurrences = b.len() / 100 + 1;
        index.retain(|_, positions| positions.len() <= max_occurrences);
    }

    index
}

/// Longest block `a[i..i+size] == b[j..j+size]` inside the given window.
///
/// Among equally long blocks the one starting earliest in `a` wins, then
/// earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    index: &BlockIndex,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

    // run length of the block ending at b[j] for the previous row of a
    let mut run_lengths: FxHashMap<usize, usize> = FxHashMap::default();

    for i in alo..ahi {
        let mut next_run_lengths: FxHashMap<usize, usize> = FxHashMap::default();
        if let Some(positions) = index.get(&a[i]) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let previous = j
                    .checked_sub(1)
                    .and_then(|p| run_lengths.get(&p).copied())
                    .unwrap_or(0);
                let size = previous + 1;
                next_run_lengths.insert(j, size);
                if size > best_size {
                    best_i = i + 1 - size;
                    best_j = j + 1 - size;
                    best_size = size;
                }
            }
        }
        run_lengths = next_run_lengths;
    }

    // Popular characters never seed a block but may still extend one.
    while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
        best_i -= 1;
        best_j -= 1;
        best_size += 1;
    }
    while best_i + best_size < ahi
        && best_j + best_size < bhi
        && a[best_i + best_size] == b[best_j + best_size]
    {
        best_size += 1;
    }

    (best_i, best_j, best_size)
}
