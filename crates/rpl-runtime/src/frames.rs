//! Local variable frames.
//!
//! Each active locals block owns one frame holding one value per name. A
//! local is addressed by an index counted from the innermost frame outward:
//! in the inner block of `→ X Y « 2 → A B « A B + X Y - * » »`, `A` and `B`
//! are 0 and 1 and the outer `X` and `Y` are 2 and 3.
//!
//! Frames are entered through a `FrameGuard`, which pops its frame when
//! dropped. A `LocalRef` remembers which frame it was created in, so using it
//! after that frame is gone is an error rather than a read of another
//! frame's slot.

use std::ops::{Deref, DerefMut};

use crate::error::{Result, RuntimeError};
use crate::gc::Gc;
use crate::runtime::Runtime;

/// Identity of a frame, never reused within a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

#[derive(Debug)]
pub struct Frame {
    id: FrameId,
    /// Locals block that created the frame, used to recover names
    block: Option<Gc>,
    slots: Vec<Gc>,
}

impl Frame {
    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn block(&self) -> Option<&Gc> {
        self.block.as_ref()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct FrameStack {
    frames: Vec<Frame>,
    next_id: u64,
}

impl FrameStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Number of locals reachable from the innermost frame.
    pub fn visible(&self) -> usize {
        self.frames.iter().map(Frame::len).sum()
    }

    pub fn push(&mut self, block: Option<Gc>, values: Vec<Gc>) -> FrameId {
        let id = FrameId(self.next_id);
        self.next_id += 1;
        tracing::trace!(id = id.0, locals = values.len(), depth = self.frames.len() + 1, "frame entered");
        self.frames.push(Frame { id, block, slots: values });
        id
    }

    pub fn pop(&mut self) -> Option<Frame> {
        let frame = self.frames.pop()?;
        tracing::trace!(id = frame.id.0, depth = self.frames.len(), "frame exited");
        Some(frame)
    }

    pub fn is_active(&self, id: FrameId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: FrameId) -> Option<usize> {
        self.frames.iter().rposition(|f| f.id == id)
    }

    /// Find `(frame position, slot)` for `index`, starting at the frame at
    /// position `from` and moving outward.
    fn locate_from(&self, from: usize, index: usize) -> Result<(usize, usize)> {
        let mut rest = index;
        for pos in (0..from).rev() {
            let n = self.frames[pos].len();
            if rest < n {
                return Ok((pos, rest));
            }
            rest -= n;
        }
        Err(RuntimeError::LocalOutOfScope { index })
    }

    fn locate(&self, index: usize) -> Result<(usize, usize)> {
        self.locate_from(self.frames.len(), index)
    }

    /// Value bound to local `index`.
    pub fn resolve(&self, index: usize) -> Result<&Gc> {
        let (pos, slot) = self.locate(index)?;
        Ok(&self.frames[pos].slots[slot])
    }

    /// Rebind local `index` to `value`.
    pub fn bind(&mut self, index: usize, value: Gc) -> Result<()> {
        let (pos, slot) = self.locate(index)?;
        self.frames[pos].slots[slot] = value;
        Ok(())
    }

    /// Locals block and position of the name of local `index`.
    pub fn name_of(&self, index: usize) -> Option<(&Gc, usize)> {
        let (pos, slot) = self.locate(index).ok()?;
        Some((self.frames[pos].block.as_ref()?, slot))
    }

    fn locate_ref(&self, local: LocalRef) -> Result<(usize, usize)> {
        let pos = self.position(local.frame).ok_or(RuntimeError::LocalOutOfScope { index: local.index })?;
        self.locate_from(pos + 1, local.index)
    }

    pub fn resolve_ref(&self, local: LocalRef) -> Result<&Gc> {
        let (pos, slot) = self.locate_ref(local)?;
        Ok(&self.frames[pos].slots[slot])
    }

    pub fn bind_ref(&mut self, local: LocalRef, value: Gc) -> Result<()> {
        let (pos, slot) = self.locate_ref(local)?;
        self.frames[pos].slots[slot] = value;
        Ok(())
    }

    /// Every value held by a frame.
    pub fn values(&self) -> impl Iterator<Item = &Gc> {
        self.frames.iter().flat_map(|f| f.slots.iter())
    }
}

// =============================================================================
// Scoped access
// =============================================================================

/// Local variable reference tied to the frame it was created in.
///
/// The index counts outward from that frame, so the reference keeps denoting
/// the same variable when inner frames are entered later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalRef {
    frame: FrameId,
    index: usize,
}

impl LocalRef {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// An active frame. Dereferences to the runtime and exits the frame when
/// dropped.
pub struct FrameGuard<'rt> {
    rt: &'rt mut Runtime,
    id: FrameId,
}

impl<'rt> FrameGuard<'rt> {
    pub(crate) fn new(rt: &'rt mut Runtime, id: FrameId) -> Self {
        Self { rt, id }
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    /// Reference to local `index` as seen from this frame.
    pub fn local_ref(&self, index: usize) -> Result<LocalRef> {
        let local = LocalRef { frame: self.id, index };
        self.rt.frames().resolve_ref(local)?;
        Ok(local)
    }

    /// Exit the frame now.
    pub fn exit(self) {}
}

impl Deref for FrameGuard<'_> {
    type Target = Runtime;

    fn deref(&self) -> &Runtime {
        self.rt
    }
}

impl DerefMut for FrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut Runtime {
        self.rt
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        // Frames entered through this guard's runtime are nested, so ours is
        // the innermost one unless a nested guard was leaked.
        while self.rt.frames().is_active(self.id) {
            self.rt.frames_mut().pop();
        }
    }
}
