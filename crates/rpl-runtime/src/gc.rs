//! Object heap with a compacting collector.
//!
//! Objects are stored back to back in one growable arena. Nothing in the
//! arena points at anything else: composite objects hold their children
//! inline, so the only references into the heap are `Gc` handles.
//!
//! # Handles
//!
//! A `Gc` is a shared slot holding the current offset of an object. The heap
//! keeps a weak table of every slot it handed out; a collection treats every
//! slot that is still alive as a root, slides the surviving objects to the
//! front of the arena and rewrites the slots. Code never sees a raw offset
//! that could go stale: reading an object goes through `Heap::view`, which
//! borrows the heap and therefore cannot be held across an allocation.
//!
//! A handle may point inside an object (an element of a list). The enclosing
//! top-level object is kept alive as a whole and moves with it.

use std::cell::Cell;
use std::fmt;
use std::ops::Range;
use std::rc::{Rc, Weak};

use rpl_common_core::{leb128, TypeId};

use crate::algebraic::Algebraic;
use crate::config::HeapConfig;
use crate::error::{Result, RuntimeError};
use crate::gc_types;
use crate::objects::{locals, text, KindRegistry, ObjectKind};

// =============================================================================
// Handles
// =============================================================================

struct GcSlot {
    offset: Cell<usize>,
}

/// GC-safe reference to a heap object.
///
/// Cloning a handle is cheap. Two handles are equal when they denote the
/// same object.
#[derive(Clone)]
pub struct Gc {
    slot: Rc<GcSlot>,
}

impl Gc {
    /// Current offset of the object in the arena. Only valid until the next
    /// allocation.
    #[inline]
    pub fn offset(&self) -> usize {
        self.slot.offset.get()
    }
}

impl PartialEq for Gc {
    fn eq(&self, other: &Self) -> bool {
        self.offset() == other.offset()
    }
}

impl Eq for Gc {}

impl fmt::Debug for Gc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gc@{}", self.offset())
    }
}

// =============================================================================
// Statistics
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub collections: u64,
    pub bytes_allocated: u64,
    pub bytes_reclaimed: u64,
    pub objects_moved: u64,
    /// Bytes in use after the last collection
    pub live_bytes: usize,
    /// Current arena bound
    pub bound: usize,
}

// =============================================================================
// Object views
// =============================================================================

/// Read-only view of one object.
pub struct ObjectView<'h> {
    bytes: &'h [u8],
    tag: u16,
    payload_start: usize,
    kinds: &'h KindRegistry,
}

impl<'h> ObjectView<'h> {
    #[inline]
    pub fn tag(&self) -> u16 {
        self.tag
    }

    /// Built-in type, `None` for kinds registered by the embedding system.
    #[inline]
    pub fn type_id(&self) -> Option<TypeId> {
        TypeId::from_u16(self.tag)
    }

    /// Tag and payload.
    #[inline]
    pub fn bytes(&self) -> &'h [u8] {
        self.bytes
    }

    #[inline]
    pub fn payload(&self) -> &'h [u8] {
        &self.bytes[self.payload_start..]
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn kind_name(&self) -> &'static str {
        self.kinds.name_of(self.tag)
    }

    pub fn kind(&self) -> Option<&'h dyn ObjectKind> {
        self.kinds.get(self.tag)
    }

    pub fn is_algebraic(&self) -> bool {
        self.type_id().is_some_and(TypeId::is_algebraic)
    }

    pub fn algebraic(&self) -> Option<Algebraic> {
        Algebraic::decode(self.type_id()?, self.payload())
    }

    /// Name of a symbol, or contents of a text.
    pub fn text(&self) -> Option<&'h str> {
        match self.type_id()? {
            TypeId::Symbol | TypeId::Text => text::decode(self.payload()),
            _ => None,
        }
    }

    pub fn local_index(&self) -> Option<usize> {
        match self.type_id()? {
            TypeId::Local => locals::decode_local(self.payload()),
            _ => None,
        }
    }

    pub fn locals(&self) -> Option<locals::LocalsLayout<'h>> {
        match self.type_id()? {
            TypeId::Locals => locals::decode(self.payload()),
            _ => None,
        }
    }

    /// Ranges of the inline children, relative to the object start.
    pub fn child_ranges(&self) -> Result<Vec<Range<usize>>> {
        let Some(range) = gc_types::children_range(self.bytes, self.kinds) else {
            return Ok(Vec::new());
        };
        let region = self.bytes.get(range.clone()).ok_or(RuntimeError::InvalidObject)?;
        let ranges = gc_types::walk(region, self.kinds).map_err(|_| RuntimeError::InvalidObject)?;
        Ok(ranges.into_iter().map(|r| r.start + range.start..r.end + range.start).collect())
    }

    pub fn child_count(&self) -> Result<usize> {
        Ok(self.child_ranges()?.len())
    }

    pub fn contains_local(&self) -> bool {
        gc_types::contains_local(self.bytes, self.kinds)
    }
}

impl fmt::Debug for ObjectView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectView")
            .field("kind", &self.kind_name())
            .field("size", &self.size())
            .finish()
    }
}

// =============================================================================
// Heap
// =============================================================================

pub struct Heap {
    /// Objects in `[0, arena.len())`; the arena never grows past `bound`
    arena: Vec<u8>,
    bound: usize,
    config: HeapConfig,
    handles: Vec<Weak<GcSlot>>,
    /// Handle table size that triggers pruning of dead slots
    prune_at: usize,
    kinds: KindRegistry,
    stats: HeapStats,
}

const MIN_PRUNE: usize = 64;

impl Heap {
    pub fn new(config: HeapConfig) -> Self {
        let bound = config.initial_size.min(config.max_size);
        Self {
            arena: Vec::with_capacity(bound),
            bound,
            config,
            handles: Vec::new(),
            prune_at: MIN_PRUNE,
            kinds: KindRegistry::new(),
            stats: HeapStats { bound, ..HeapStats::default() },
        }
    }

    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    /// Register an object kind supplied by the embedding system.
    pub fn register_kind(&mut self, tag: u16, kind: Box<dyn ObjectKind>) -> Result<()> {
        self.kinds.register(tag, kind)
    }

    /// Bytes currently occupied, garbage included.
    #[inline]
    pub fn used(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    pub fn bound(&self) -> usize {
        self.bound
    }

    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    /// Number of handles that are still referenced.
    pub fn live_handles(&self) -> usize {
        self.handles.iter().filter(|h| h.strong_count() > 0).count()
    }

    // -------------------------------------------------------------------------
    // Allocation
    // -------------------------------------------------------------------------

    /// Allocate an object whose payload is written by `build`.
    ///
    /// May collect before writing, so the builder must not read the heap;
    /// copy what it needs first.
    pub fn allocate(&mut self, tag: u16, build: impl FnOnce(&mut Vec<u8>)) -> Result<Gc> {
        let mut object = Vec::new();
        leb128::encode(&mut object, tag as u64);
        build(&mut object);
        self.allocate_bytes(&object)
    }

    /// Allocate a copy of an encoded object.
    pub fn allocate_bytes(&mut self, object: &[u8]) -> Result<Gc> {
        if gc_types::object_size(object, &self.kinds) != Some(object.len()) {
            return Err(RuntimeError::InvalidObject);
        }
        self.reserve(object.len())?;
        let offset = self.arena.len();
        self.arena.extend_from_slice(object);
        self.stats.bytes_allocated += object.len() as u64;
        Ok(self.handle_at(offset))
    }

    pub fn allocate_algebraic(&mut self, value: &Algebraic) -> Result<Gc> {
        self.allocate(value.type_id().as_u16(), |out| value.encode(out))
    }

    /// Allocate a fresh copy of the object behind `gc`.
    pub fn copy(&mut self, gc: &Gc) -> Result<Gc> {
        let bytes = self.view(gc)?.bytes().to_vec();
        self.allocate_bytes(&bytes)
    }

    /// Make room for `n` more bytes: collect first, then grow.
    fn reserve(&mut self, n: usize) -> Result<()> {
        if self.arena.len() + n <= self.bound {
            return Ok(());
        }
        self.collect()?;
        let needed = self.arena.len() + n;
        if needed <= self.bound {
            return Ok(());
        }
        if self.config.grow && needed <= self.config.max_size {
            let bound = needed.max(self.bound.saturating_mul(2)).min(self.config.max_size);
            tracing::debug!(from = self.bound, to = bound, "heap grown");
            self.arena.reserve(bound - self.arena.len());
            self.bound = bound;
            self.stats.bound = bound;
            return Ok(());
        }
        tracing::warn!(requested = n, used = self.arena.len(), bound = self.bound, "out of memory");
        Err(RuntimeError::OutOfMemory { requested: n })
    }

    // -------------------------------------------------------------------------
    // Handles
    // -------------------------------------------------------------------------

    /// Register a new handle for the object at `offset`.
    pub(crate) fn handle_at(&mut self, offset: usize) -> Gc {
        if self.handles.len() >= self.prune_at {
            self.handles.retain(|h| h.strong_count() > 0);
            self.prune_at = (self.handles.len() * 2).max(MIN_PRUNE);
        }
        let slot = Rc::new(GcSlot { offset: Cell::new(offset) });
        self.handles.push(Rc::downgrade(&slot));
        Gc { slot }
    }

    pub fn view(&self, gc: &Gc) -> Result<ObjectView<'_>> {
        let bytes = self.arena.get(gc.offset()..).ok_or(RuntimeError::InvalidObject)?;
        let size = gc_types::object_size(bytes, &self.kinds).ok_or(RuntimeError::InvalidObject)?;
        let (tag, payload_start) = gc_types::read_tag(bytes).ok_or(RuntimeError::InvalidObject)?;
        Ok(ObjectView { bytes: &bytes[..size], tag, payload_start, kinds: &self.kinds })
    }

    /// Interior handles to the children of a composite object.
    pub fn children(&mut self, gc: &Gc) -> Result<Vec<Gc>> {
        let base = gc.offset();
        let ranges = self.view(gc)?.child_ranges()?;
        Ok(ranges.into_iter().map(|r| self.handle_at(base + r.start)).collect())
    }

    /// Interior handle to child `index`, `None` past the end.
    pub fn at(&mut self, gc: &Gc, index: usize) -> Result<Option<Gc>> {
        let base = gc.offset();
        let ranges = self.view(gc)?.child_ranges()?;
        Ok(ranges.get(index).map(|r| self.handle_at(base + r.start)))
    }

    // -------------------------------------------------------------------------
    // Collection
    // -------------------------------------------------------------------------

    /// Compact every object reachable from a live handle to the front of
    /// the arena, keeping their relative order.
    pub fn collect(&mut self) -> Result<()> {
        let before = self.arena.len();

        // Plan first so a corrupted arena is reported before anything moves
        let objects = gc_types::walk(&self.arena, &self.kinds).map_err(|offset| {
            tracing::error!(offset, "unknown object in heap");
            RuntimeError::HeapCorrupted { offset }
        })?;

        let mut live: Vec<(usize, Rc<GcSlot>)> = self
            .handles
            .iter()
            .filter_map(Weak::upgrade)
            .map(|slot| (slot.offset.get(), slot))
            .collect();
        live.sort_by_key(|(offset, _)| *offset);

        let mut dest = 0;
        let mut next = 0;
        let mut moved = 0u64;
        for object in objects {
            let first = next;
            while next < live.len() && live[next].0 < object.end {
                next += 1;
            }
            if first == next {
                continue;
            }
            if dest != object.start {
                self.arena.copy_within(object.clone(), dest);
                moved += 1;
            }
            for (offset, slot) in &live[first..next] {
                slot.offset.set(offset - object.start + dest);
            }
            dest += object.len();
        }
        self.arena.truncate(dest);
        self.handles = live.iter().map(|(_, slot)| Rc::downgrade(slot)).collect();
        self.prune_at = (self.handles.len() * 2).max(MIN_PRUNE);

        self.stats.collections += 1;
        self.stats.bytes_reclaimed += (before - dest) as u64;
        self.stats.objects_moved += moved;
        self.stats.live_bytes = dest;
        tracing::debug!(before, after = dest, moved, handles = self.handles.len(), "heap collected");

        #[cfg(feature = "gc-debug")]
        self.verify()?;
        Ok(())
    }

    /// Check that the arena walks cleanly and every handle lands inside it.
    pub fn verify(&self) -> Result<()> {
        gc_types::walk(&self.arena, &self.kinds)
            .map_err(|offset| RuntimeError::HeapCorrupted { offset })?;
        for slot in self.handles.iter().filter_map(Weak::upgrade) {
            let offset = slot.offset.get();
            if offset >= self.arena.len() {
                return Err(RuntimeError::HeapCorrupted { offset });
            }
        }
        Ok(())
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(HeapConfig::default())
    }
}
