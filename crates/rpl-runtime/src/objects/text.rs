//! Symbols and texts: `[len][UTF-8 bytes]`.

use rpl_common_core::leb128;

use super::{length_prefix, prefixed_size, ObjectKind};

pub fn encode(out: &mut Vec<u8>, s: &str) {
    leb128::encode(out, s.len() as u64);
    out.extend_from_slice(s.as_bytes());
}

pub fn decode(payload: &[u8]) -> Option<&str> {
    let (len, n) = length_prefix(payload)?;
    let bytes = payload.get(n..n.checked_add(len)?)?;
    std::str::from_utf8(bytes).ok()
}

pub struct SymbolKind;

impl ObjectKind for SymbolKind {
    fn name(&self) -> &'static str {
        "symbol"
    }

    fn payload_size(&self, payload: &[u8]) -> Option<usize> {
        prefixed_size(payload)
    }

    fn render(&self, payload: &[u8], out: &mut String) {
        out.push_str(decode(payload).unwrap_or("?"));
    }
}

pub struct TextKind;

impl ObjectKind for TextKind {
    fn name(&self) -> &'static str {
        "text"
    }

    fn payload_size(&self, payload: &[u8]) -> Option<usize> {
        prefixed_size(payload)
    }

    fn render(&self, payload: &[u8], out: &mut String) {
        out.push('"');
        out.push_str(decode(payload).unwrap_or(""));
        out.push('"');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_layout() {
        let mut buf = Vec::new();
        encode(&mut buf, "Xy");
        assert_eq!(buf, vec![2, b'X', b'y']);
        assert_eq!(SymbolKind.payload_size(&buf), Some(3));
        assert_eq!(decode(&buf), Some("Xy"));
    }

    #[test]
    fn test_render() {
        let mut buf = Vec::new();
        encode(&mut buf, "hi");
        let mut out = String::new();
        TextKind.render(&buf, &mut out);
        SymbolKind.render(&buf, &mut out);
        assert_eq!(out, "\"hi\"hi");
    }
}
