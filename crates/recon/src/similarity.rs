//! Token-set string similarity on a 0 to 100 scale.
//!
//! Both inputs are normalised, split into word sets, and compared on their shared
//! and distinct tokens. The result is the best Indel ratio among
//! `sect` vs `sect + diff_ab`, `sect` vs `sect + diff_ba`, and
//! `sect + diff_ab` vs `sect + diff_ba`, which is the usual `token_set_ratio`.

use std::collections::BTreeSet;

use crate::normalise::{normalise, tokens};

/// Similarity between two raw strings. Normalises both sides first.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    token_set_ratio_normalised(&normalise(a), &normalise(b))
}

/// Similarity between two strings already passed through `normalise`.
pub fn token_set_ratio_normalised(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = tokens(a).collect();
    let tokens_b: BTreeSet<&str> = tokens(b).collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersect: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let diff_ab: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let diff_ba: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    // One token set contains the other.
    if !intersect.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    // BTreeSet iteration is already sorted.
    let diff_ab_joined = diff_ab.join(" ");
    let diff_ba_joined = diff_ba.join(" ");
    let ab_len = diff_ab_joined.chars().count();
    let ba_len = diff_ba_joined.chars().count();
    let sect_len = intersect.join(" ").chars().count();

    let sep = usize::from(sect_len != 0);
    let sect_ab_len = sect_len + sep + ab_len;
    let sect_ba_len = sect_len + sep + ba_len;

    let dist = indel_distance(&diff_ab_joined, &diff_ba_joined);
    let result = norm_similarity(dist, sect_ab_len + sect_ba_len);

    if sect_len == 0 {
        return result;
    }

    // sect vs sect+diff differs only by the appended diff, so distance is its length.
    let sect_ab_ratio = norm_similarity(sep + ab_len, sect_len + sect_ab_len);
    let sect_ba_ratio = norm_similarity(sep + ba_len, sect_len + sect_ba_len);

    result.max(sect_ab_ratio).max(sect_ba_ratio)
}

fn norm_similarity(dist: usize, lensum: usize) -> f64 {
    if lensum == 0 {
        return 100.0;
    }
    100.0 - 100.0 * dist as f64 / lensum as f64
}

/// Insertions + deletions needed to turn `a` into `b` (no substitutions).
fn indel_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    a.len() + b.len() - 2 * lcs_len(&a, &b)
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_is_full_score() {
        for s in ["Aberarder Wind Farm", "x", "Moray Offshore Wind (East)"] {
            assert!(token_set_ratio(s, s) >= 95.0, "{s}");
        }
        assert_eq!(token_set_ratio("Wind Farm", "WIND, farm!!"), 100.0);
    }

    #[test]
    fn empty_side_is_zero() {
        assert_eq!(token_set_ratio("", "anything"), 0.0);
        assert_eq!(token_set_ratio("anything", ""), 0.0);
        assert_eq!(token_set_ratio("!!!", "anything"), 0.0);
    }

    #[test]
    fn order_insensitive() {
        assert_eq!(token_set_ratio("wind farm moray", "moray wind farm"), 100.0);
    }

    #[test]
    fn containment_is_full_score() {
        assert_eq!(token_set_ratio("moray", "west moray wind farm"), 100.0);
    }

    #[test]
    fn partial_overlap_gives_partial_credit() {
        // sect = "farm wind" (9), diff_ab = "west", diff_ba = "east" (indel 2)
        // full strings are 14 chars each → 100 - 200/28 beats sect-only 100 - 500/23
        let s = token_set_ratio("west wind farm", "east wind farm");
        assert!((s - (100.0 - 100.0 * 2.0 / 28.0)).abs() < 1e-9, "{s}");
        assert!(s > 0.0 && s < 100.0);
    }

    #[test]
    fn disjoint_uses_indel_ratio() {
        // "abc" vs "abd": lcs 2, dist 2, lensum 6
        let s = token_set_ratio("abc", "abd");
        assert!((s - (100.0 - 100.0 * 2.0 / 6.0)).abs() < 1e-9);
        assert_eq!(token_set_ratio("aaa", "zzz"), 0.0);
    }

    #[test]
    fn lcs_basic() {
        let a: Vec<char> = "solar".chars().collect();
        let b: Vec<char> = "polar".chars().collect();
        assert_eq!(lcs_len(&a, &b), 4);
        assert_eq!(indel_distance("solar", "polar"), 2);
    }
}
