// Mon Oct 19 2026 - Alex

/// Index pairs `(i, j)` of a longest common subsequence of `a` and `b`.
pub fn longest_common_subsequence<T: PartialEq>(a: &[T], b: &[T]) -> Vec<(usize, usize)> {
    let (n, m) = (a.len(), b.len());
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if a[i] == b[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(table[0][0]);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

/// Positions of `a` left out of the longest common subsequence with `b`:
/// the fewest elements that have to move to turn one order into the other.
pub fn moved_positions<T: PartialEq>(a: &[T], b: &[T]) -> Vec<usize> {
    let kept: Vec<usize> = longest_common_subsequence(a, b).into_iter().map(|(i, _)| i).collect();
    (0..a.len()).filter(|i| kept.binary_search(i).is_err()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcs() {
        let pairs = longest_common_subsequence(&["a", "b", "c", "d"], &["b", "c", "a", "d"]);
        assert_eq!(pairs, vec![(1, 0), (2, 1), (3, 3)]);
    }

    #[test]
    fn test_moved_positions() {
        assert_eq!(moved_positions(&["a", "b", "c"], &["a", "b", "c"]), Vec::<usize>::new());
        assert_eq!(moved_positions(&["a", "b", "c", "d"], &["b", "c", "a", "d"]), vec![0]);
        assert_eq!(moved_positions::<&str>(&[], &[]), Vec::<usize>::new());
    }
}
