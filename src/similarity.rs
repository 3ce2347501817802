//! Case-insensitive string similarity used for ranking and page verification.

/// Returns how alike two strings are, from `0.0` (nothing shared) to `1.0`
/// (identical ignoring case).
///
/// The score is `2 * L / (|a| + |b|)` where `L` is the length of the longest
/// common subsequence of the lowercased inputs, counted in `char`s. Two empty
/// strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
    let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * lcs_len(&a, &b) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    // Iterate the shorter side in the inner loop to keep the row small.
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; inner.len() + 1];
    let mut row = vec![0usize; inner.len() + 1];

    for &x in outer {
        for (j, &y) in inner.iter().enumerate() {
            row[j + 1] = if x == y {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }

    prev[inner.len()]
}
