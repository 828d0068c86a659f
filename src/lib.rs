//! # UM Emulator
//!
//! An emulator for the Universal Machine: eight 32-bit registers, a
//! segmented address space whose segment 0 holds the running program, and
//! fourteen instructions packed into 32-bit words.
//!
//! ```text
//! let words = um::load_image("hello.um", um::TrailingBytes::Reject)?;
//! let mut cpu = um::Cpu::with_program(words);
//! cpu.run(&mut um::StdConsole::stdio())?;
//! ```

pub mod bitpack;
pub mod cpu;
pub mod asm;
pub mod config;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuState, CpuError, Memory, Registers, Instruction, Console, StdConsole, BufferConsole};
pub use asm::{disassemble, load_image, parse_image, save_image, ImageError, ProgramBuilder, TrailingBytes};
pub use config::RunConfig;
