pub mod config;
pub mod display;
pub mod emulator;
pub mod error;
pub mod keypad;
pub mod memory;
pub mod opcode;
pub mod timing;
pub mod vm;

pub use error::{Result, VmError};
pub use vm::{ExecState, VM};
