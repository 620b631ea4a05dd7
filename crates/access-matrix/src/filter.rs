//! Allow-list character filter.

use std::collections::BTreeSet;

use crate::matrix::PermissionSet;

/// Keep the characters of `text` that are objects in `allowed`.
///
/// The result is sorted by code point and contains each character once.
/// Matching is per character and case-sensitive.
pub fn filter(text: &str, allowed: &PermissionSet) -> String {
    text.chars()
        .filter(|c| allowed.iter().any(|o| o.as_char() == *c))
        .collect::<BTreeSet<char>>()
        .into_iter()
        .collect()
}
