//! WebAssembly bindings for the UM emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use wasm_bindgen::prelude::*;
use crate::asm::disasm::disassemble_instruction;
use crate::asm::image::{parse_image, TrailingBytes};
use crate::cpu::io::StreamConsole;
use crate::Cpu;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly machine wrapper.
///
/// Console input is supplied up front; output accumulates until taken.
#[wasm_bindgen]
pub struct WasmMachine {
    cpu: Cpu,
    program: Vec<u32>,
    input: Vec<u8>,
    input_pos: usize,
    output: Vec<u8>,
}

#[wasm_bindgen]
impl WasmMachine {
    /// Create a machine with an empty program.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            program: Vec::new(),
            input: Vec::new(),
            input_pos: 0,
            output: Vec::new(),
        }
    }

    /// Load a `.um` image. Returns the number of instruction words.
    #[wasm_bindgen]
    pub fn load_image(&mut self, bytes: &[u8], pad_trailing: bool) -> Result<usize, JsError> {
        let policy = if pad_trailing { TrailingBytes::Pad } else { TrailingBytes::Reject };
        let words = parse_image(bytes, policy)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        let len = words.len();
        self.program = words.clone();
        self.cpu = Cpu::with_program(words);
        self.output.clear();
        Ok(len)
    }

    /// Append bytes for the program to read with `IN`.
    #[wasm_bindgen]
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend_from_slice(bytes);
    }

    /// Run at most `max_steps` instructions. Returns the number executed.
    #[wasm_bindgen]
    pub fn run(&mut self, max_steps: u32) -> Result<u64, JsError> {
        let pending = &self.input[self.input_pos..];
        let mut console = StreamConsole::new(pending, Vec::new());

        let result = self.cpu.run_limited(&mut console, max_steps as u64);

        let (rest, written) = console.into_parts();
        self.input_pos = self.input.len() - rest.len();
        self.output.extend_from_slice(&written);

        result.map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Rewind to the freshly loaded program, keeping unread input.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu = Cpu::with_program(self.program.clone());
        self.output.clear();
    }

    /// Take the output produced since the last call.
    #[wasm_bindgen]
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Check if the machine is still running.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.cpu.is_running()
    }

    /// Check if the machine stopped normally.
    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    /// Get instruction count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> u32 {
        self.cpu.pc
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.cpu.state)
    }

    /// Get the eight registers.
    #[wasm_bindgen]
    pub fn registers(&self) -> js_sys::Uint32Array {
        js_sys::Uint32Array::from(&self.cpu.regs.values()[..])
    }

    /// Get a machine snapshot as JSON.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu.snapshot())
            .map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Disassemble a single instruction word.
#[wasm_bindgen]
pub fn wasm_disassemble(word: u32) -> String {
    disassemble_instruction(word)
}
