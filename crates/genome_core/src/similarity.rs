//! String similarity used for "did you mean" hints and fuzzy catalog lookups.
//!
//! The score is the Ratcliff/Obershelp ratio: `2 * M / T`, where `M` counts
//! characters in recursively found longest common blocks and `T` is the
//! combined length. Identical strings score 1.0, disjoint strings 0.0.

/// Similarity ratio in `[0.0, 1.0]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Candidates scoring at least `cutoff`, best first, at most `limit` entries.
///
/// Ties keep alphabetical order so results are deterministic.
pub fn closest_matches<'c>(
    word: &str,
    candidates: impl IntoIterator<Item = &'c str>,
    limit: usize,
    cutoff: f64,
) -> Vec<(&'c str, f64)> {
    let mut scored: Vec<(&'c str, f64)> = candidates
        .into_iter()
        .map(|candidate| (candidate, similarity(word, candidate)))
        .filter(|(_, score)| *score >= cutoff)
        .collect();
    scored.sort_by(|left, right| right.1.total_cmp(&left.1).then(left.0.cmp(right.0)));
    scored.truncate(limit);
    scored
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (start_a, start_b, size) = longest_common_block(a, b);
    if size == 0 {
        return 0;
    }
    size + matching_chars(&a[..start_a], &b[..start_b])
        + matching_chars(&a[start_a + size..], &b[start_b + size..])
}

/// Earliest-in-`a`, then earliest-in-`b`, longest common block.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb { previous[j] + 1 } else { 0 };
            let size = current[j + 1];
            if size > best.2 {
                best = (i + 1 - size, j + 1 - size, size);
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }
    best
}
