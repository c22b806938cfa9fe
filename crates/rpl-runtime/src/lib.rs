//! # rpl-runtime
//!
//! Value and runtime core of an RPL interpreter:
//! - `gc` - object arena with a compacting collector and GC-safe handles
//! - `objects` - object encodings and the object kind registry
//! - `frames` - local variable frames
//! - `algebraic`, `arithmetic` - the numeric tower and its operations
//! - `decimal` - decimal floating point, parsing and display formatting
//! - `runtime` - value stack, globals and the minimal executor
//! - `sweep` - function sampling for plots

pub mod algebraic;
pub mod arithmetic;
pub mod config;
pub mod decimal;
pub mod error;
pub mod frames;
pub mod gc;
pub mod gc_types;
pub mod integer;
pub mod objects;
pub mod parser;
pub mod runtime;
pub mod settings;
pub mod sweep;

pub use rpl_common_core::{Base, DisplayMode, Settings, TypeId, FIRST_USER_TYPE_ID};

pub use algebraic::{Algebraic, NumericKind};
pub use config::HeapConfig;
pub use decimal::{Decimal, Decimal128, Decimal32, Decimal64, DecimalWidth};
pub use error::{ParseErrorKind, Result, RuntimeError};
pub use frames::{FrameGuard, LocalRef};
pub use gc::{Gc, Heap, HeapStats, ObjectView};
pub use objects::{KindRegistry, ObjectKind};
pub use parser::{parse_number, ParseDiagnostic, ParseOutcome};
pub use runtime::{Interrupt, Runtime};
pub use sweep::{pixel_adjust, sweep, SweepRange};
