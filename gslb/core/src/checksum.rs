//! Change-detection checksums.
//!
//! Checksums are sums of CRC-32 hashes. Addition wraps and commutes, so a checksum over a set of
//! fields does not depend on the order the fields were visited in. This is an equality proxy for
//! "did anything change", not an integrity check: collisions are possible and nothing
//! security-sensitive may rely on it.

/// Hashes a single field.
#[inline]
pub fn hash(s: &str) -> u32 {
    crc32fast::hash(s.as_bytes())
}

/// Sums the hashes of every item.
pub fn sum<'a>(items: impl IntoIterator<Item = &'a str>) -> u32 {
    items
        .into_iter()
        .fold(0u32, |acc, item| acc.wrapping_add(hash(item)))
}

/// Hashes a list of paths independently of the order they were discovered in.
pub fn paths(paths: &[String]) -> u32 {
    let mut sorted = paths.iter().map(String::as_str).collect::<Vec<_>>();
    sorted.sort_unstable();
    hash(&sorted.join(","))
}
