//! Evaluation runtime.
//!
//! Owns the heap and everything that keeps objects alive: the value stack,
//! the local frames and the global directory. Every one of them holds `Gc`
//! handles, which is what makes their objects survive a collection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use rpl_common_core::{Settings, TypeId};

use crate::algebraic::Algebraic;
use crate::arithmetic::{self, BinaryOp};
use crate::config::HeapConfig;
use crate::error::{ParseErrorKind, Result, RuntimeError};
use crate::frames::{FrameGuard, FrameStack, LocalRef};
use crate::gc::{Gc, Heap};
use crate::gc_types;
use crate::objects::{list, locals, text};
use crate::parser::{self, ParseDiagnostic, ParseOutcome};
use crate::settings;

// =============================================================================
// Interrupt flag
// =============================================================================

/// Externally settable flag polled by long-running loops.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Runtime
// =============================================================================

pub struct Runtime {
    heap: Heap,
    stack: Vec<Gc>,
    frames: FrameStack,
    globals: HashMap<String, Gc>,
    interrupt: Interrupt,
    settings: Settings,
}

impl Runtime {
    /// Runtime with the default heap and the process-wide settings.
    pub fn new() -> Self {
        Self::with_config(HeapConfig::default(), settings::current())
    }

    pub fn with_config(config: HeapConfig, settings: Settings) -> Self {
        Self {
            heap: Heap::new(config),
            stack: Vec::new(),
            frames: FrameStack::new(),
            globals: HashMap::new(),
            interrupt: Interrupt::default(),
            settings,
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn frames(&self) -> &FrameStack {
        &self.frames
    }

    pub(crate) fn frames_mut(&mut self) -> &mut FrameStack {
        &mut self.frames
    }

    /// Handle on the interrupt flag, for another thread to raise.
    pub fn interrupt(&self) -> Interrupt {
        self.interrupt.clone()
    }

    pub fn collect(&mut self) -> Result<()> {
        self.heap.collect()
    }

    // =========================================================================
    // Value stack
    // =========================================================================

    pub fn push(&mut self, value: Gc) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Result<Gc> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    pub fn top(&self) -> Result<Gc> {
        self.stack(0)
    }

    /// Object at `level`, 0 being the top of the stack.
    pub fn stack(&self, level: usize) -> Result<Gc> {
        let len = self.stack.len();
        if level >= len {
            return Err(RuntimeError::StackUnderflow);
        }
        Ok(self.stack[len - 1 - level].clone())
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn drop_n(&mut self, n: usize) -> Result<()> {
        let len = self.stack.len();
        if n > len {
            return Err(RuntimeError::StackUnderflow);
        }
        self.stack.truncate(len - n);
        Ok(())
    }

    // =========================================================================
    // Object construction
    // =========================================================================

    /// Allocate an object from its tag and payload builder.
    pub fn make(&mut self, tag: u16, build: impl FnOnce(&mut Vec<u8>)) -> Result<Gc> {
        self.heap.allocate(tag, build)
    }

    pub fn make_algebraic(&mut self, value: &Algebraic) -> Result<Gc> {
        self.heap.allocate_algebraic(value)
    }

    pub fn make_integer(&mut self, value: i64) -> Result<Gc> {
        self.make_algebraic(&Algebraic::from_i64(value))
    }

    pub fn make_symbol(&mut self, name: &str) -> Result<Gc> {
        self.heap.allocate(TypeId::Symbol.as_u16(), |out| text::encode(out, name))
    }

    pub fn make_text(&mut self, value: &str) -> Result<Gc> {
        self.heap.allocate(TypeId::Text.as_u16(), |out| text::encode(out, value))
    }

    pub fn make_list(&mut self, items: &[Gc]) -> Result<Gc> {
        let children = self.encoded(items)?;
        self.heap.allocate(TypeId::List.as_u16(), |out| list::encode(out, &children))
    }

    pub fn make_program(&mut self, items: &[Gc]) -> Result<Gc> {
        let children = self.encoded(items)?;
        self.heap.allocate(TypeId::Program.as_u16(), |out| list::encode(out, &children))
    }

    /// Locals block binding `names` around `code`.
    pub fn make_locals(&mut self, names: &[&str], code: &[Gc]) -> Result<Gc> {
        let code = self.encoded(code)?;
        self.heap.allocate(TypeId::Locals.as_u16(), |out| locals::encode(out, names, &code))
    }

    pub fn make_local(&mut self, index: usize) -> Result<Gc> {
        self.heap.allocate(TypeId::Local.as_u16(), |out| locals::encode_local(out, index))
    }

    pub fn make_command(&mut self, command: TypeId) -> Result<Gc> {
        if !command.is_command() {
            return Err(RuntimeError::TypeError);
        }
        self.heap.allocate(command.as_u16(), |_| {})
    }

    /// Concatenated encodings, copied out before the next allocation.
    fn encoded(&self, items: &[Gc]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for item in items {
            out.extend_from_slice(self.heap.view(item)?.bytes());
        }
        Ok(out)
    }

    /// Numeric value of an object.
    pub fn algebraic(&self, gc: &Gc) -> Result<Algebraic> {
        self.heap.view(gc)?.algebraic().ok_or(RuntimeError::TypeError)
    }

    /// Parse a number at the start of `src`, returning the object and the
    /// number of bytes consumed.
    pub fn parse_number(&mut self, src: &str) -> Result<(Gc, usize)> {
        let (value, end) = match parser::parse_number(src, &self.settings, 0) {
            ParseOutcome::Skip => {
                return Err(ParseDiagnostic::new(ParseErrorKind::InvalidNumber, 0).into());
            }
            outcome => outcome.into_result()?.ok_or(RuntimeError::InvalidObject)?,
        };
        Ok((self.make_algebraic(&value)?, end))
    }

    // =========================================================================
    // Local variables
    // =========================================================================

    /// Enter a frame binding `names` (symbols) to values popped from the
    /// stack, the last name taking the top of the stack. `body` is kept as
    /// the code of the frame's locals block.
    pub fn enter_frame(&mut self, names: &[Gc], body: &Gc) -> Result<FrameGuard<'_>> {
        let mut owned = Vec::with_capacity(names.len());
        for name in names {
            let view = self.heap.view(name)?;
            if view.type_id() != Some(TypeId::Symbol) {
                return Err(RuntimeError::TypeError);
            }
            owned.push(view.text().ok_or(RuntimeError::InvalidObject)?.to_owned());
        }
        let names: Vec<&str> = owned.iter().map(String::as_str).collect();
        let block = self.make_locals(&names, std::slice::from_ref(body))?;
        self.enter_locals(&block)
    }

    /// Enter the frame of a locals block, popping one value per name.
    pub fn enter_locals(&mut self, block: &Gc) -> Result<FrameGuard<'_>> {
        let count = self.heap.view(block)?.locals().ok_or(RuntimeError::TypeError)?.names.len();
        if count > self.stack.len() {
            return Err(RuntimeError::StackUnderflow);
        }
        let values = self.stack.split_off(self.stack.len() - count);
        let id = self.frames.push(Some(block.clone()), values);
        Ok(FrameGuard::new(self, id))
    }

    pub fn local(&self, index: usize) -> Result<Gc> {
        self.frames.resolve(index).cloned()
    }

    /// Rebind local `index` to a fresh copy of `value`.
    pub fn set_local(&mut self, index: usize, value: &Gc) -> Result<()> {
        self.frames.resolve(index)?;
        let copy = self.heap.copy(value)?;
        self.frames.bind(index, copy)
    }

    pub fn local_at(&self, local: LocalRef) -> Result<Gc> {
        self.frames.resolve_ref(local).cloned()
    }

    pub fn set_local_at(&mut self, local: LocalRef, value: &Gc) -> Result<()> {
        self.frames.resolve_ref(local)?;
        let copy = self.heap.copy(value)?;
        self.frames.bind_ref(local, copy)
    }

    // =========================================================================
    // Globals
    // =========================================================================

    /// Store a global. Values holding local references are rejected: their
    /// meaning depends on frames that do not outlive the evaluation.
    pub fn store_global(&mut self, name: &str, value: &Gc) -> Result<()> {
        if self.heap.view(value)?.contains_local() {
            tracing::warn!(name, "local variable stored in a global");
            return Err(RuntimeError::LocalEscapesScope);
        }
        self.globals.insert(name.to_owned(), value.clone());
        Ok(())
    }

    pub fn recall_global(&self, name: &str) -> Result<Gc> {
        self.globals
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedName(name.to_owned()))
    }

    pub fn purge_global(&mut self, name: &str) -> Result<()> {
        self.globals
            .remove(name)
            .map(drop)
            .ok_or_else(|| RuntimeError::UndefinedName(name.to_owned()))
    }

    pub fn global_names(&self) -> impl Iterator<Item = &str> {
        self.globals.keys().map(String::as_str)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Evaluate an object.
    ///
    /// Data pushes itself, a local pushes its value, a program runs its
    /// items (programs nested in it are pushed, not run), a locals block
    /// binds its names and runs its code, and a command applies itself to
    /// the stack.
    pub fn execute(&mut self, obj: &Gc) -> Result<()> {
        let view = self.heap.view(obj)?;
        let Some(ty) = view.type_id() else {
            self.push(obj.clone());
            return Ok(());
        };
        match ty {
            TypeId::Local => {
                let index = view.local_index().ok_or(RuntimeError::InvalidObject)?;
                let value = self.local(index)?;
                self.push(value);
            }
            TypeId::Program => {
                for item in self.heap.children(obj)? {
                    if self.interrupt.is_raised() {
                        return Err(RuntimeError::Interrupted);
                    }
                    if self.heap.view(&item)?.type_id() == Some(TypeId::Program) {
                        self.push(item);
                    } else {
                        self.execute(&item)?;
                    }
                }
            }
            TypeId::Locals => {
                let code = self.heap.children(obj)?;
                let mut frame = self.enter_locals(obj)?;
                for item in &code {
                    frame.execute(item)?;
                }
            }
            TypeId::Neg => self.unary(arithmetic::neg)?,
            TypeId::Add => self.binary(BinaryOp::Add)?,
            TypeId::Sub => self.binary(BinaryOp::Sub)?,
            TypeId::Mul => self.binary(BinaryOp::Mul)?,
            TypeId::Div => self.binary(BinaryOp::Div)?,
            _ => self.push(obj.clone()),
        }
        Ok(())
    }

    fn unary(&mut self, op: impl FnOnce(&Algebraic) -> Result<Algebraic>) -> Result<()> {
        let x = self.algebraic(&self.top()?)?;
        let result = self.make_algebraic(&op(&x)?)?;
        self.stack.pop();
        self.push(result);
        Ok(())
    }

    /// Pop `y` then `x`, push `x op y`. Operands stay on the stack when the
    /// operation fails.
    fn binary(&mut self, op: BinaryOp) -> Result<()> {
        let x = self.algebraic(&self.stack(1)?)?;
        let y = self.algebraic(&self.stack(0)?)?;
        let value = arithmetic::binary(op, &x, &y, &self.settings)?;
        let result = self.make_algebraic(&value)?;
        self.drop_n(2)?;
        self.push(result);
        Ok(())
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Text form of an object, numbers following the display settings.
    pub fn render(&self, obj: &Gc) -> Result<String> {
        let view = self.heap.view(obj)?;
        let mut out = String::new();
        self.render_object(view.bytes(), &mut Vec::new(), &mut out)?;
        Ok(out)
    }

    /// `scope` holds the names of the locals blocks being rendered,
    /// innermost last.
    fn render_object<'b>(&self, bytes: &'b [u8], scope: &mut Vec<Vec<&'b str>>, out: &mut String) -> Result<()> {
        let kinds = self.heap.kinds();
        let (tag, n) = gc_types::read_tag(bytes).ok_or(RuntimeError::InvalidObject)?;
        let payload = &bytes[n..];
        let Some(ty) = TypeId::from_u16(tag) else {
            let kind = kinds.get(tag).ok_or(RuntimeError::InvalidObject)?;
            kind.render(payload, out);
            return Ok(());
        };
        match ty {
            TypeId::Symbol => out.push_str(text::decode(payload).ok_or(RuntimeError::InvalidObject)?),
            TypeId::Text => {
                out.push('"');
                out.push_str(text::decode(payload).ok_or(RuntimeError::InvalidObject)?);
                out.push('"');
            }
            TypeId::List | TypeId::Program => {
                let (open, close) = if ty == TypeId::List {
                    list::ListKind::LIST.delimiters()
                } else {
                    list::ListKind::PROGRAM.delimiters()
                };
                let range = list::children_range(payload).ok_or(RuntimeError::InvalidObject)?;
                out.push_str(open);
                self.render_children(&payload[range], scope, out)?;
                out.push(' ');
                out.push_str(close);
            }
            TypeId::Locals => {
                let layout = locals::decode(payload).ok_or(RuntimeError::InvalidObject)?;
                out.push('→');
                for name in &layout.names {
                    out.push(' ');
                    out.push_str(name);
                }
                scope.push(layout.names);
                let rendered = self.render_children(&payload[layout.code], scope, out);
                scope.pop();
                rendered?;
            }
            TypeId::Local => {
                let index = locals::decode_local(payload).ok_or(RuntimeError::InvalidObject)?;
                match self.local_name(index, scope) {
                    Some(name) => out.push_str(&name),
                    None => out.push_str(&format!("local#{}", index)),
                }
            }
            TypeId::Add => out.push('+'),
            TypeId::Sub => out.push('-'),
            TypeId::Mul => out.push('*'),
            TypeId::Div => out.push('/'),
            TypeId::Neg => out.push_str("NEG"),
            _ => {
                let value = Algebraic::decode(ty, payload).ok_or(RuntimeError::InvalidObject)?;
                out.push_str(&value.render(&self.settings, false));
            }
        }
        Ok(())
    }

    fn render_children<'b>(&self, region: &'b [u8], scope: &mut Vec<Vec<&'b str>>, out: &mut String) -> Result<()> {
        let ranges = gc_types::walk(region, self.heap.kinds()).map_err(|_| RuntimeError::InvalidObject)?;
        for range in ranges {
            out.push(' ');
            self.render_object(&region[range], scope, out)?;
        }
        Ok(())
    }

    /// Name of local `index`, from the blocks being rendered, then from the
    /// active frames.
    fn local_name(&self, index: usize, scope: &[Vec<&str>]) -> Option<String> {
        let mut rest = index;
        for names in scope.iter().rev() {
            if let Some(name) = names.get(rest) {
                return Some((*name).to_owned());
            }
            rest -= names.len();
        }
        let (block, slot) = self.frames.name_of(rest)?;
        let view = self.heap.view(block).ok()?;
        view.locals()?.names.get(slot).map(|name| (*name).to_owned())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
