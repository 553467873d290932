use std::collections::{BTreeMap, BTreeSet};

/// Turns a character table into one lower-cased string per row.
///
/// The trailing axis is the character axis; leading axes are flattened in
/// row-major order, and a table of rank 0 or 1 is a single row. NUL padding
/// is dropped, invalid UTF-8 sequences are dropped, never reported.
pub fn normalize_text_rows(shape: &[usize], bytes: &[u8]) -> Vec<String> {
    let width = match shape.last() {
        Some(width) if shape.len() > 1 => *width,
        _ => bytes.len(),
    };
    if width == 0 {
        let rows: usize = shape[..shape.len().saturating_sub(1)].iter().product();
        return vec![String::new(); rows];
    }

    bytes.chunks(width).map(normalize_row).collect()
}

fn normalize_row(row: &[u8]) -> String {
    let raw: Vec<u8> = row.iter().copied().filter(|byte| *byte != 0).collect();
    let mut decoded = String::with_capacity(raw.len());
    for chunk in raw.utf8_chunks() {
        decoded.push_str(chunk.valid());
    }
    decoded.to_lowercase()
}

/// Duplicate-sensitive, order-insensitive equality of two name lists.
pub fn same_names(left: &[String], right: &[String]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut left: Vec<&String> = left.iter().collect();
    let mut right: Vec<&String> = right.iter().collect();
    left.sort_unstable();
    right.sort_unstable();
    left == right
}

/// Names whose number of occurrences differs between the two lists. This is
/// the symmetric difference of the two name sets, plus any name duplicated a
/// different number of times on each side.
pub fn mismatched_names(left: &[String], right: &[String]) -> BTreeSet<String> {
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for name in left {
        counts.entry(name.as_str()).or_default().0 += 1;
    }
    for name in right {
        counts.entry(name.as_str()).or_default().1 += 1;
    }
    counts
        .into_iter()
        .filter(|(_, (left, right))| left != right)
        .map(|(name, _)| name.to_string())
        .collect()
}
