//! Program images, the test-program emitter and the disassembler.
//!
//! This module provides:
//! - The `.um` binary image format (bytes ↔ instruction words)
//! - A builder for hand-assembled instruction streams
//! - A disassembler (words → readable text)

pub mod disasm;
pub mod image;
pub mod program;

pub use disasm::disassemble;
pub use image::{load_image, parse_image, save_image, ImageError, TrailingBytes};
pub use program::{ProgramBuilder, TestProgram, TEST_PROGRAMS};
