//! Local variable blocks and local variable references.
//!
//! A locals block, e.g. `→ X Y « X Y - X Y + * »`, is laid out as:
//!
//! ```text
//! [total length][name count][len name]...[code length][code objects...]
//! ```
//!
//! where every number is LEB128 and the total length covers everything after
//! itself, so the block can be skipped without decoding the names.
//!
//! A local reference is `[index]`: the position of the name in the stack of
//! active blocks, innermost block first. In the inner block of
//! `→ X Y « 2 → A B « A B + X Y - * » »`, `A` and `B` are 0 and 1 and the
//! outer `X` and `Y` are 2 and 3.

use std::ops::Range;

use rpl_common_core::leb128;

use super::{length_prefix, prefixed_size, text, ObjectKind};

/// Decoded view of a locals block payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalsLayout<'p> {
    pub names: Vec<&'p str>,
    /// Range of the code objects within the payload
    pub code: Range<usize>,
}

pub fn encode(out: &mut Vec<u8>, names: &[&str], code: &[u8]) {
    let mut body = Vec::new();
    leb128::encode(&mut body, names.len() as u64);
    for name in names {
        text::encode(&mut body, name);
    }
    leb128::encode(&mut body, code.len() as u64);
    body.extend_from_slice(code);

    leb128::encode(out, body.len() as u64);
    out.extend_from_slice(&body);
}

pub fn decode(payload: &[u8]) -> Option<LocalsLayout<'_>> {
    let (total, mut pos) = length_prefix(payload)?;
    let end = pos.checked_add(total)?;
    if end > payload.len() {
        return None;
    }
    let (count, n) = length_prefix(&payload[pos..end])?;
    pos += n;

    let mut names = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        let name_payload = &payload[pos..end];
        names.push(text::decode(name_payload)?);
        pos += prefixed_size(name_payload)?;
    }

    let (code_len, n) = length_prefix(&payload[pos..end])?;
    pos += n;
    let code_end = pos.checked_add(code_len)?;
    if code_end != end {
        return None;
    }
    Some(LocalsLayout { names, code: pos..code_end })
}

pub fn encode_local(out: &mut Vec<u8>, index: usize) {
    leb128::encode(out, index as u64);
}

pub fn decode_local(payload: &[u8]) -> Option<usize> {
    let (index, _) = leb128::decode(payload)?;
    usize::try_from(index).ok()
}

pub struct LocalsKind;

impl ObjectKind for LocalsKind {
    fn name(&self) -> &'static str {
        "locals"
    }

    fn payload_size(&self, payload: &[u8]) -> Option<usize> {
        prefixed_size(payload)
    }

    fn children(&self, payload: &[u8]) -> Option<Range<usize>> {
        decode(payload).map(|layout| layout.code)
    }

    fn render(&self, payload: &[u8], out: &mut String) {
        out.push('→');
        if let Some(layout) = decode(payload) {
            for name in layout.names {
                out.push(' ');
                out.push_str(name);
            }
        }
    }
}

pub struct LocalKind;

impl ObjectKind for LocalKind {
    fn name(&self) -> &'static str {
        "local"
    }

    fn payload_size(&self, payload: &[u8]) -> Option<usize> {
        leb128::skip(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_round_trip() {
        let mut buf = Vec::new();
        encode(&mut buf, &["X", "Yz"], &[23, 0]);
        // total, count, 1 'X', 2 'Y' 'z', code len, code
        assert_eq!(buf, vec![9, 2, 1, b'X', 2, b'Y', b'z', 2, 23, 0]);
        let layout = decode(&buf).unwrap();
        assert_eq!(layout.names, vec!["X", "Yz"]);
        assert_eq!(&buf[layout.code.clone()], &[23, 0]);
        assert_eq!(LocalsKind.payload_size(&buf), Some(buf.len()));
        assert_eq!(LocalsKind.children(&buf), Some(8..10));
    }

    #[test]
    fn test_rejects_inconsistent_lengths() {
        let mut buf = Vec::new();
        encode(&mut buf, &["X"], &[]);
        buf[0] += 1;
        buf.push(0);
        assert_eq!(decode(&buf), None);
    }

    #[test]
    fn test_render_names() {
        let mut buf = Vec::new();
        encode(&mut buf, &["A", "B"], &[]);
        let mut out = String::new();
        LocalsKind.render(&buf, &mut out);
        assert_eq!(out, "→ A B");
    }

    #[test]
    fn test_local_index() {
        let mut buf = Vec::new();
        encode_local(&mut buf, 300);
        assert_eq!(decode_local(&buf), Some(300));
        assert_eq!(LocalKind.payload_size(&buf), Some(2));
    }
}
