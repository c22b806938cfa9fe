//! Object layout information used by the collector.
//!
//! The heap has no object table: the size of every object is derived from
//! its tag and payload. Numeric and command tags have fixed layouts, every
//! other tag is dispatched to its registered `ObjectKind`.

use std::ops::Range;

use rpl_common_core::{leb128, TypeId};

use crate::objects::number;
use crate::objects::KindRegistry;

// =============================================================================
// Object sizes
// =============================================================================

/// Split an object into `(tag, tag size)`.
#[inline]
pub fn read_tag(bytes: &[u8]) -> Option<(u16, usize)> {
    let (tag, n) = leb128::decode(bytes)?;
    Some((u16::try_from(tag).ok()?, n))
}

fn payload_size(tag: u16, payload: &[u8], kinds: &KindRegistry) -> Option<usize> {
    if let Some(size) = TypeId::from_u16(tag).and_then(|ty| number::payload_size(ty, payload)) {
        return Some(size);
    }
    kinds.get(tag)?.payload_size(payload)
}

/// Total size of the object starting at `bytes[0]`, tag included.
/// `None` if the tag is unknown or the object runs past `bytes`.
pub fn object_size(bytes: &[u8], kinds: &KindRegistry) -> Option<usize> {
    let (tag, n) = read_tag(bytes)?;
    let size = n.checked_add(payload_size(tag, &bytes[n..], kinds)?)?;
    (size <= bytes.len()).then_some(size)
}

/// Range of the inline children of an object, relative to its first byte.
pub fn children_range(bytes: &[u8], kinds: &KindRegistry) -> Option<Range<usize>> {
    let (tag, n) = read_tag(bytes)?;
    let range = kinds.get(tag)?.children(&bytes[n..])?;
    Some(range.start + n..range.end + n)
}

/// Ranges of the consecutive objects filling `region`.
/// `Err(offset)` locates the first byte that is not a valid object.
pub fn walk(region: &[u8], kinds: &KindRegistry) -> Result<Vec<Range<usize>>, usize> {
    let mut ranges = Vec::new();
    let mut pos = 0;
    while pos < region.len() {
        let size = object_size(&region[pos..], kinds).ok_or(pos)?;
        ranges.push(pos..pos + size);
        pos += size;
    }
    Ok(ranges)
}

// =============================================================================
// Content scanning
// =============================================================================

/// Does the object, or any object nested in it, hold a local variable
/// reference?
pub fn contains_local(bytes: &[u8], kinds: &KindRegistry) -> bool {
    let Some((tag, _)) = read_tag(bytes) else {
        return false;
    };
    if tag == TypeId::Local.as_u16() {
        return true;
    }
    let Some(range) = children_range(bytes, kinds) else {
        return false;
    };
    let Some(region) = bytes.get(range) else {
        return false;
    };
    match walk(region, kinds) {
        Ok(ranges) => ranges.into_iter().any(|r| contains_local(&region[r], kinds)),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{list, locals, text};

    fn object(tag: TypeId, build: impl FnOnce(&mut Vec<u8>)) -> Vec<u8> {
        let mut out = Vec::new();
        leb128::encode(&mut out, tag.as_u16() as u64);
        build(&mut out);
        out
    }

    #[test]
    fn test_sizes() {
        let kinds = KindRegistry::new();
        let int = object(TypeId::Integer, |o| number::encode_integer(o, 300));
        assert_eq!(object_size(&int, &kinds), Some(3));
        let sym = object(TypeId::Symbol, |o| text::encode(o, "abc"));
        assert_eq!(object_size(&sym, &kinds), Some(5));
        let add = object(TypeId::Add, |_| {});
        assert_eq!(object_size(&add, &kinds), Some(1));
        // Truncated and unknown
        assert_eq!(object_size(&sym[..3], &kinds), None);
        assert_eq!(object_size(&[99], &kinds), None);
    }

    #[test]
    fn test_walk_region() {
        let kinds = KindRegistry::new();
        let mut region = object(TypeId::Integer, |o| number::encode_integer(o, 1));
        region.extend(object(TypeId::Symbol, |o| text::encode(o, "X")));
        region.extend(object(TypeId::Mul, |_| {}));
        assert_eq!(walk(&region, &kinds), Ok(vec![0..2, 2..5, 5..6]));
        region.push(99);
        assert_eq!(walk(&region, &kinds), Err(6));
    }

    #[test]
    fn test_contains_local_is_recursive() {
        let kinds = KindRegistry::new();
        let local = object(TypeId::Local, |o| locals::encode_local(o, 0));
        let inner = object(TypeId::Program, |o| list::encode(o, &local));
        let outer = object(TypeId::List, |o| list::encode(o, &inner));
        assert!(contains_local(&outer, &kinds));
        assert_eq!(children_range(&outer, &kinds), Some(2..outer.len()));

        let plain = object(TypeId::List, |o| {
            list::encode(o, &object(TypeId::Integer, |o| number::encode_integer(o, 4)))
        });
        assert!(!contains_local(&plain, &kinds));
    }
}
