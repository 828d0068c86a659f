//! CPU emulation for the Universal Machine.
//!
//! This module implements the complete machine:
//! - eight 32-bit general-purpose registers
//! - a segmented address space with reusable segment ids
//! - the 14-instruction set, decoded from 32-bit words
//! - a byte console for `IN` / `OUT`

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;
pub mod io;

pub use memory::{Memory, MemoryError};
pub use registers::{Registers, RegisterError};
pub use decode::{Instruction, Opcode, DecodeError, EncodeError};
pub use execute::{Cpu, CpuError, CpuState, Snapshot};
pub use io::{Console, StreamConsole, StdConsole, BufferConsole};
