//! Instruction stream builder and the catalogue of built-in test programs.
//!
//! ```text
//! let words = ProgramBuilder::new()
//!     .load_value(1, b'H' as u32)
//!     .output(1)
//!     .halt()
//!     .build()?;
//! ```

use crate::cpu::decode::{encode, EncodeError, Instruction, MAX_IMMEDIATE};

/// Builds a UM instruction stream one instruction at a time.
#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    instructions: Vec<Instruction>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self { instructions: Vec::new() }
    }

    /// Append an arbitrary instruction.
    pub fn push(mut self, instr: Instruction) -> Self {
        self.instructions.push(instr);
        self
    }

    pub fn cmov(self, a: u8, b: u8, c: u8) -> Self {
        self.push(Instruction::CMov { a, b, c })
    }

    pub fn seg_load(self, a: u8, b: u8, c: u8) -> Self {
        self.push(Instruction::SegLoad { a, b, c })
    }

    pub fn seg_store(self, a: u8, b: u8, c: u8) -> Self {
        self.push(Instruction::SegStore { a, b, c })
    }

    pub fn add(self, a: u8, b: u8, c: u8) -> Self {
        self.push(Instruction::Add { a, b, c })
    }

    pub fn mul(self, a: u8, b: u8, c: u8) -> Self {
        self.push(Instruction::Mul { a, b, c })
    }

    pub fn div(self, a: u8, b: u8, c: u8) -> Self {
        self.push(Instruction::Div { a, b, c })
    }

    pub fn nand(self, a: u8, b: u8, c: u8) -> Self {
        self.push(Instruction::Nand { a, b, c })
    }

    pub fn halt(self) -> Self {
        self.push(Instruction::Halt)
    }

    pub fn map_segment(self, b: u8, c: u8) -> Self {
        self.push(Instruction::MapSegment { b, c })
    }

    pub fn unmap_segment(self, c: u8) -> Self {
        self.push(Instruction::UnmapSegment { c })
    }

    pub fn output(self, c: u8) -> Self {
        self.push(Instruction::Output { c })
    }

    pub fn input(self, c: u8) -> Self {
        self.push(Instruction::Input { c })
    }

    pub fn load_program(self, b: u8, c: u8) -> Self {
        self.push(Instruction::LoadProgram { b, c })
    }

    pub fn load_value(self, a: u8, value: u32) -> Self {
        self.push(Instruction::LoadValue { a, value })
    }

    /// Load any 32-bit constant into `dest`.
    ///
    /// Values wider than the 25-bit immediate are assembled from two
    /// 16-bit halves, clobbering `scratch`.
    pub fn load_const(self, dest: u8, scratch: u8, value: u32) -> Self {
        if value <= MAX_IMMEDIATE {
            return self.load_value(dest, value);
        }
        self.load_value(dest, value >> 16)
            .load_value(scratch, 1 << 16)
            .mul(dest, dest, scratch)
            .load_value(scratch, value & 0xFFFF)
            .add(dest, dest, scratch)
    }

    /// Emit `LV r, byte; OUT r` for every byte of `text`.
    pub fn print(mut self, reg: u8, text: &[u8]) -> Self {
        for &byte in text {
            self = self.load_value(reg, byte as u32).output(reg);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Encode the program to instruction words.
    pub fn build(&self) -> Result<Vec<u32>, EncodeError> {
        self.instructions.iter().map(encode).collect()
    }
}

/// A named program with the console input it expects and the output it
/// must produce.
#[derive(Debug, Clone, Copy)]
pub struct TestProgram {
    pub name: &'static str,
    pub description: &'static str,
    pub input: &'static [u8],
    pub expected_output: &'static [u8],
    emit: fn(ProgramBuilder) -> ProgramBuilder,
}

impl TestProgram {
    pub fn builder(&self) -> ProgramBuilder {
        (self.emit)(ProgramBuilder::new())
    }

    pub fn build(&self) -> Result<Vec<u32>, EncodeError> {
        self.builder().build()
    }
}

/// Look up a built-in test program by name.
pub fn find_test_program(name: &str) -> Option<&'static TestProgram> {
    TEST_PROGRAMS.iter().find(|p| p.name == name)
}

/// Built-in test programs.
pub const TEST_PROGRAMS: &[TestProgram] = &[
    TestProgram {
        name: "halt",
        description: "a lone HALT",
        input: b"",
        expected_output: b"",
        emit: emit_halt,
    },
    TestProgram {
        name: "halt-verbose",
        description: "HALT followed by output that must never run",
        input: b"",
        expected_output: b"",
        emit: emit_halt_verbose,
    },
    TestProgram {
        name: "hello",
        description: "prints HI",
        input: b"",
        expected_output: b"HI",
        emit: emit_hello,
    },
    TestProgram {
        name: "add",
        description: "1 + 2, printed as a raw byte",
        input: b"",
        expected_output: &[3],
        emit: emit_add,
    },
    TestProgram {
        name: "digit",
        description: "'0' + 6",
        input: b"",
        expected_output: b"6",
        emit: emit_digit,
    },
    TestProgram {
        name: "cmov",
        description: "conditional move with a zero then a non-zero condition",
        input: b"",
        expected_output: &[2, 3, 2, 3, 3, 3],
        emit: emit_cmov,
    },
    TestProgram {
        name: "io",
        description: "echo one input byte",
        input: b"a",
        expected_output: b"a",
        emit: emit_io,
    },
    TestProgram {
        name: "nand",
        description: "mask an input byte with NAND and print it raw and as a digit",
        input: b"7",
        expected_output: &[7, b'7'],
        emit: emit_nand,
    },
    TestProgram {
        name: "multiply",
        description: "20 * 5",
        input: b"",
        expected_output: b"d",
        emit: emit_multiply,
    },
    TestProgram {
        name: "divide",
        description: "200 / 2",
        input: b"",
        expected_output: b"d",
        emit: emit_divide,
    },
    TestProgram {
        name: "unmap",
        description: "an unmapped id is handed out again by the next map",
        input: b"",
        expected_output: &[2, 2],
        emit: emit_unmap,
    },
    TestProgram {
        name: "segments",
        description: "map, read, unmap and remap many segments",
        input: b"",
        expected_output: b"",
        emit: emit_segments,
    },
    TestProgram {
        name: "store-load",
        description: "store into a fresh segment and read it back",
        input: b"",
        expected_output: b"K",
        emit: emit_store_load,
    },
    TestProgram {
        name: "load-program",
        description: "replace the program with a zeroed segment and fall off its end",
        input: b"",
        expected_output: b"",
        emit: emit_load_program,
    },
    TestProgram {
        name: "jump",
        description: "LOADP from segment 0 skips the instructions in between",
        input: b"",
        expected_output: b"ok",
        emit: emit_jump,
    },
    TestProgram {
        name: "five-hundred-k",
        description: "500,000 maps of 100-word segments, never unmapped",
        input: b"",
        expected_output: b"",
        emit: emit_five_hundred_k,
    },
];

/// Programs too slow or memory-hungry for routine runs.
pub const STRESS_PROGRAMS: &[&str] = &["five-hundred-k"];

fn emit_halt(p: ProgramBuilder) -> ProgramBuilder {
    p.halt()
}

fn emit_halt_verbose(p: ProgramBuilder) -> ProgramBuilder {
    p.halt().print(1, b"Bad!\n")
}

fn emit_hello(p: ProgramBuilder) -> ProgramBuilder {
    p.print(1, b"HI").halt()
}

fn emit_add(p: ProgramBuilder) -> ProgramBuilder {
    p.load_value(2, 1)
        .load_value(3, 2)
        .add(1, 2, 3)
        .output(1)
        .halt()
}

fn emit_digit(p: ProgramBuilder) -> ProgramBuilder {
    p.load_value(1, 48)
        .load_value(2, 6)
        .add(3, 1, 2)
        .output(3)
        .halt()
}

fn emit_cmov(p: ProgramBuilder) -> ProgramBuilder {
    p.load_value(1, 2)
        .load_value(2, 3)
        .load_value(3, 0)
        .output(1)
        .output(2)
        .cmov(1, 2, 3)
        .output(1)
        .output(2)
        .load_value(3, 1)
        .cmov(1, 2, 3)
        .output(1)
        .output(2)
        .halt()
}

fn emit_io(p: ProgramBuilder) -> ProgramBuilder {
    p.input(3).output(3).halt()
}

fn emit_nand(p: ProgramBuilder) -> ProgramBuilder {
    p.input(3)
        .load_value(2, 15)
        .nand(1, 2, 3)
        .nand(1, 1, 1)
        .output(1)
        .load_value(4, 48)
        .add(5, 1, 4)
        .output(5)
        .halt()
}

fn emit_multiply(p: ProgramBuilder) -> ProgramBuilder {
    p.load_value(3, 5)
        .load_value(2, 20)
        .mul(1, 2, 3)
        .output(1)
        .halt()
}

fn emit_divide(p: ProgramBuilder) -> ProgramBuilder {
    p.load_value(3, 2)
        .load_value(2, 200)
        .div(1, 2, 3)
        .output(1)
        .halt()
}

fn emit_unmap(p: ProgramBuilder) -> ProgramBuilder {
    p.load_value(2, 4)
        .load_value(3, 5)
        .map_segment(2, 3)
        .load_value(2, 2)
        .map_segment(2, 3)
        .output(2)
        .unmap_segment(2)
        .map_segment(2, 3)
        .output(2)
        .halt()
}

fn emit_segments(mut p: ProgramBuilder) -> ProgramBuilder {
    for i in 1..100u32 {
        p = p
            .load_value(0, 50 * i)
            .load_value(1, 10)
            .load_value(3, 40)
            .map_segment(2, 0)
            .seg_load(1, 2, 3);
    }
    for i in (2..30u32).step_by(2) {
        p = p.load_value(2, i * 2 / 3).unmap_segment(2);
    }
    for i in 1..20u32 {
        p = p.load_value(0, 50 * i).map_segment(2, 0);
    }
    p.halt()
}

fn emit_store_load(p: ProgramBuilder) -> ProgramBuilder {
    p.load_value(1, 5)
        .map_segment(2, 1)
        .load_value(3, 2)
        .load_value(4, b'K' as u32)
        .seg_store(2, 3, 4)
        .seg_load(5, 2, 3)
        .output(5)
        .halt()
}

fn emit_load_program(p: ProgramBuilder) -> ProgramBuilder {
    p.load_value(0, 50)
        .map_segment(1, 0)
        .load_value(2, 0)
        .load_program(1, 2)
        .halt()
}

fn emit_jump(p: ProgramBuilder) -> ProgramBuilder {
    // 0: LV r2, 4   1: LOADP r0, r2   2-3: print "X" (skipped)   4..: print "ok"
    p.load_value(2, 4)
        .load_program(0, 2)
        .print(1, b"X")
        .print(1, b"ok")
        .halt()
}

fn emit_five_hundred_k(mut p: ProgramBuilder) -> ProgramBuilder {
    for _ in 0..500_000 {
        p = p.load_value(0, 100).map_segment(1, 0);
    }
    p
}
