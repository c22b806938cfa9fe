//! Lists and programs: `[len][child objects...]`, children stored inline.

use std::ops::Range;

use rpl_common_core::leb128;

use super::{length_prefix, prefixed_size, ObjectKind};

pub fn encode(out: &mut Vec<u8>, children: &[u8]) {
    leb128::encode(out, children.len() as u64);
    out.extend_from_slice(children);
}

/// Range of the inline children within the payload.
pub fn children_range(payload: &[u8]) -> Option<Range<usize>> {
    let (len, n) = length_prefix(payload)?;
    let end = n.checked_add(len)?;
    (end <= payload.len()).then_some(n..end)
}

pub struct ListKind {
    name: &'static str,
    open: &'static str,
    close: &'static str,
}

impl ListKind {
    pub const LIST: ListKind = ListKind { name: "list", open: "{", close: "}" };
    pub const PROGRAM: ListKind = ListKind { name: "program", open: "«", close: "»" };

    pub fn delimiters(&self) -> (&'static str, &'static str) {
        (self.open, self.close)
    }
}

impl ObjectKind for ListKind {
    fn name(&self) -> &'static str {
        self.name
    }

    fn payload_size(&self, payload: &[u8]) -> Option<usize> {
        prefixed_size(payload)
    }

    fn children(&self, payload: &[u8]) -> Option<Range<usize>> {
        children_range(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_range() {
        let mut buf = Vec::new();
        encode(&mut buf, &[1, 5, 1, 6]);
        assert_eq!(children_range(&buf), Some(1..5));
        assert_eq!(ListKind::LIST.payload_size(&buf), Some(5));
    }

    #[test]
    fn test_truncated_children() {
        assert_eq!(children_range(&[4, 1, 5]), None);
    }
}
