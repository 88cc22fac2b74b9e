//! Line deduplication shared by the filesystem connectors.
//!
//! Works on raw bytes: line endings and non-UTF-8 content are written back
//! exactly as read.

use std::collections::HashSet;

/// Keep the first occurrence of each line, preserving order.
///
/// Lines are split after each `\n` and compared without it, so `a\r\n` and
/// `a\n` are different lines. Returns the rewritten content and the number
/// of lines dropped. A kept last line without a terminator gets a `\n` so
/// later appends start on a fresh line.
pub fn dedup_lines(content: &[u8]) -> (Vec<u8>, usize) {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(content.len());
    let mut removed = 0;

    for line in content.split_inclusive(|b| *b == b'\n') {
        let body = line.strip_suffix(b"\n").unwrap_or(line);
        if seen.insert(body) {
            out.extend_from_slice(line);
            if body.len() == line.len() {
                out.push(b'\n');
            }
        } else {
            removed += 1;
        }
    }

    (out, removed)
}
