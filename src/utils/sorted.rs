//! Set operations over ascending, duplicate-free id lists.

use std::cmp::Ordering;

/// Intersection of two sorted lists
pub fn intersect_sorted(a: &[u64], b: &[u64]) -> Vec<u64> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
        }
    }

    out
}

/// Union of two sorted lists, result sorted and duplicate-free
pub fn union_sorted(a: &[u64], b: &[u64]) -> Vec<u64> {
    let mut out: Vec<u64> = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);

    fn push(v: u64, out: &mut Vec<u64>) {
        if out.last() != Some(&v) {
            out.push(v);
        }
    }

    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Equal => {
                push(a[i], &mut out);
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                push(a[i], &mut out);
                i += 1;
            }
            Ordering::Greater => {
                push(b[j], &mut out);
                j += 1;
            }
        }
    }
    for &v in &a[i..] {
        push(v, &mut out);
    }
    for &v in &b[j..] {
        push(v, &mut out);
    }

    out
}

/// Intersect posting lists smallest-first, stopping early once empty.
/// An empty input yields an empty result.
pub fn intersect_all(mut sets: Vec<Vec<u64>>) -> Vec<u64> {
    sets.sort_by_key(|s| s.len());

    let mut iter = sets.into_iter();
    let Some(mut acc) = iter.next() else {
        return Vec::new();
    };
    for set in iter {
        if acc.is_empty() {
            break;
        }
        acc = intersect_sorted(&acc, &set);
    }
    acc
}
