use thiserror::Error;

use crate::memory::MAX_ROM_SIZE;

pub type Result<T> = std::result::Result<T, VmError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("invalid rom size: {size} bytes (expected 1..={max})", max = MAX_ROM_SIZE)]
    InvalidRomSize { size: usize },
    #[error("call stack overflow at {pc:#05x}")]
    StackOverflow { pc: u16 },
    #[error("return with empty call stack at {pc:#05x}")]
    StackUnderflow { pc: u16 },
    #[error("memory access out of bounds at {address:#06x}")]
    MemoryOutOfBounds { address: usize },
    #[error("vm is halted, reset required")]
    Halted,
}

impl VmError {
    /// Fatal errors stop the vm until the next reset.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, VmError::InvalidRomSize { .. })
    }
}
