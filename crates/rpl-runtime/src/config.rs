//! Heap configuration.

/// Sizing policy for the object arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
    /// Bytes available before the first collection
    pub initial_size: usize,
    /// Hard limit the arena never grows beyond
    pub max_size: usize,
    /// Whether the arena may grow when a collection does not free enough
    pub grow: bool,
}

impl HeapConfig {
    /// Fixed-size arena, as on a calculator with a fixed memory budget.
    pub fn fixed(size: usize) -> Self {
        Self { initial_size: size, max_size: size, grow: false }
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            initial_size: 64 * 1024,
            max_size: 16 * 1024 * 1024,
            grow: true,
        }
    }
}
