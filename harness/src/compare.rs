use std::collections::HashMap;
use std::hash::Hash;

/// Every element occurring at an index after its first occurrence.
///
/// For a value present `k` times, `k - 1` copies are returned, in the order
/// they appear.
pub fn find_duplicates<T>(items: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let mut seen: HashMap<&T, usize> = HashMap::with_capacity(items.len());
    let mut duplicates = Vec::new();

    for item in items {
        let count = seen.entry(item).or_insert(0);
        if *count > 0 {
            duplicates.push(item.clone());
        }
        *count += 1;
    }

    duplicates
}

/// Every element of `expected` not matched by a distinct element of `actual`.
///
/// Elements are matched in `expected` order, so when `expected` holds a value
/// three times and `actual` only once, the last two copies are reported.
pub fn find_missing<T>(expected: &[T], actual: &[T]) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    if expected.is_empty() {
        return Vec::new();
    }

    let mut available: HashMap<&T, usize> = HashMap::with_capacity(actual.len());
    for item in actual {
        *available.entry(item).or_insert(0) += 1;
    }

    let mut missing = Vec::new();
    for item in expected {
        match available.get_mut(item) {
            Some(count) if *count > 0 => *count -= 1,
            _ => missing.push(item.clone()),
        }
    }

    missing
}
