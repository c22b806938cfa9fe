//! Heap object kinds.
//!
//! Every object is `[tag: LEB128][payload]`. Numeric kinds and commands have
//! a layout fixed by this crate (see `number`). All other kinds, including the
//! built-in symbols, texts, lists, programs and locals, are described through
//! the `ObjectKind` capability trait so that the embedding system can add its
//! own kinds without touching the collector.

use std::ops::Range;

use hashbrown::HashMap;
use rpl_common_core::{TypeId, FIRST_USER_TYPE_ID};

use crate::error::{Result, RuntimeError};

pub mod list;
pub mod locals;
pub mod number;
pub mod text;

/// Capabilities the runtime needs from a heap object kind.
pub trait ObjectKind {
    fn name(&self) -> &'static str;

    /// Size of the payload that starts at `payload[0]`.
    /// `payload` may extend past the object; `None` means malformed.
    fn payload_size(&self, payload: &[u8]) -> Option<usize>;

    /// Byte range (within the payload) of inline child objects, if any.
    fn children(&self, _payload: &[u8]) -> Option<Range<usize>> {
        None
    }

    /// Append a textual form of the object. Built-in composites are rendered
    /// by the runtime, which walks their children.
    fn render(&self, _payload: &[u8], out: &mut String) {
        out.push_str(self.name());
    }
}

/// Kinds known to a heap, indexed by raw tag.
pub struct KindRegistry {
    kinds: HashMap<u16, Box<dyn ObjectKind>>,
}

impl KindRegistry {
    /// Registry holding the built-in non-numeric kinds.
    pub fn new() -> Self {
        let mut reg = Self { kinds: HashMap::new() };
        reg.insert_builtin(TypeId::Symbol, Box::new(text::SymbolKind));
        reg.insert_builtin(TypeId::Text, Box::new(text::TextKind));
        reg.insert_builtin(TypeId::List, Box::new(list::ListKind::LIST));
        reg.insert_builtin(TypeId::Program, Box::new(list::ListKind::PROGRAM));
        reg.insert_builtin(TypeId::Locals, Box::new(locals::LocalsKind));
        reg.insert_builtin(TypeId::Local, Box::new(locals::LocalKind));
        reg
    }

    fn insert_builtin(&mut self, ty: TypeId, kind: Box<dyn ObjectKind>) {
        self.kinds.insert(ty.as_u16(), kind);
    }

    /// Register a kind supplied by the embedding system.
    pub fn register(&mut self, tag: u16, kind: Box<dyn ObjectKind>) -> Result<()> {
        if tag < FIRST_USER_TYPE_ID || self.kinds.contains_key(&tag) {
            return Err(RuntimeError::KindConflict(tag));
        }
        tracing::debug!(tag, name = kind.name(), "object kind registered");
        self.kinds.insert(tag, kind);
        Ok(())
    }

    #[inline]
    pub fn get(&self, tag: u16) -> Option<&dyn ObjectKind> {
        self.kinds.get(&tag).map(|k| k.as_ref())
    }

    /// Human-readable name of any tag, numeric ones included.
    pub fn name_of(&self, tag: u16) -> &'static str {
        match TypeId::from_u16(tag) {
            Some(ty) => ty.name(),
            None => self.get(tag).map(|k| k.name()).unwrap_or("unknown"),
        }
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a LEB128 length prefix and return `(length, prefix size)`.
pub(crate) fn length_prefix(payload: &[u8]) -> Option<(usize, usize)> {
    let (len, n) = rpl_common_core::leb128::decode(payload)?;
    Some((usize::try_from(len).ok()?, n))
}

/// Payload size of a `[len][bytes...]` layout.
pub(crate) fn prefixed_size(payload: &[u8]) -> Option<usize> {
    let (len, n) = length_prefix(payload)?;
    n.checked_add(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair;

    impl ObjectKind for Pair {
        fn name(&self) -> &'static str {
            "pair"
        }
        fn payload_size(&self, _payload: &[u8]) -> Option<usize> {
            Some(2)
        }
    }

    #[test]
    fn test_builtins_present() {
        let reg = KindRegistry::new();
        assert_eq!(reg.get(TypeId::Symbol.as_u16()).map(|k| k.name()), Some("symbol"));
        assert_eq!(reg.get(TypeId::Program.as_u16()).map(|k| k.name()), Some("program"));
        assert!(reg.get(TypeId::Decimal128.as_u16()).is_none());
        assert_eq!(reg.name_of(TypeId::Decimal128.as_u16()), "decimal128");
    }

    #[test]
    fn test_register_user_kind() {
        let mut reg = KindRegistry::new();
        reg.register(200, Box::new(Pair)).unwrap();
        assert_eq!(reg.name_of(200), "pair");
        assert_eq!(reg.register(200, Box::new(Pair)), Err(RuntimeError::KindConflict(200)));
        assert_eq!(
            reg.register(TypeId::List.as_u16(), Box::new(Pair)),
            Err(RuntimeError::KindConflict(TypeId::List.as_u16()))
        );
    }
}
