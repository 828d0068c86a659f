//! Instruction decoder for the UM.
//!
//! Every instruction is one 32-bit word. The top four bits select the
//! opcode. Opcode 13 (load value) carries a register in bits 27-25 and a
//! 25-bit immediate; every other opcode uses three 3-bit register fields
//! A, B and C in bits 8-0.

use crate::bitpack::{self, BitpackError};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Width of the immediate operand of `LoadValue`.
pub const IMMEDIATE_BITS: u32 = 25;

/// Largest value a `LoadValue` immediate can hold.
pub const MAX_IMMEDIATE: u32 = (1 << IMMEDIATE_BITS) - 1;

const OPCODE_WIDTH: u32 = 4;
const OPCODE_LSB: u32 = 28;
const REG_WIDTH: u32 = 3;
const REG_A_LSB: u32 = 6;
const REG_B_LSB: u32 = 3;
const REG_C_LSB: u32 = 0;
const LV_REG_LSB: u32 = 25;

/// The fourteen opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    CMov = 0,
    SegLoad = 1,
    SegStore = 2,
    Add = 3,
    Mul = 4,
    Div = 5,
    Nand = 6,
    Halt = 7,
    MapSegment = 8,
    UnmapSegment = 9,
    Output = 10,
    Input = 11,
    LoadProgram = 12,
    LoadValue = 13,
}

impl Opcode {
    pub const ALL: [Opcode; 14] = [
        Opcode::CMov,
        Opcode::SegLoad,
        Opcode::SegStore,
        Opcode::Add,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Nand,
        Opcode::Halt,
        Opcode::MapSegment,
        Opcode::UnmapSegment,
        Opcode::Output,
        Opcode::Input,
        Opcode::LoadProgram,
        Opcode::LoadValue,
    ];

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::CMov => "CMOV",
            Opcode::SegLoad => "SLOAD",
            Opcode::SegStore => "SSTORE",
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Nand => "NAND",
            Opcode::Halt => "HALT",
            Opcode::MapSegment => "MAP",
            Opcode::UnmapSegment => "UNMAP",
            Opcode::Output => "OUT",
            Opcode::Input => "IN",
            Opcode::LoadProgram => "LOADP",
            Opcode::LoadValue => "LV",
        }
    }
}

impl TryFrom<u32> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Opcode::ALL
            .get(value as usize)
            .copied()
            .ok_or(DecodeError::InvalidOpcode(value))
    }
}

/// Decoded UM instruction.
///
/// Register operands are raw field values; the execution engine validates
/// them before touching the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// if r[c] != 0 then r[a] := r[b]
    CMov { a: u8, b: u8, c: u8 },

    /// r[a] := m[r[b]][r[c]]
    SegLoad { a: u8, b: u8, c: u8 },

    /// m[r[a]][r[b]] := r[c]
    SegStore { a: u8, b: u8, c: u8 },

    /// r[a] := r[b] + r[c] (mod 2^32)
    Add { a: u8, b: u8, c: u8 },

    /// r[a] := r[b] * r[c] (mod 2^32)
    Mul { a: u8, b: u8, c: u8 },

    /// r[a] := r[b] / r[c], unsigned
    Div { a: u8, b: u8, c: u8 },

    /// r[a] := !(r[b] & r[c])
    Nand { a: u8, b: u8, c: u8 },

    /// Stop the machine.
    Halt,

    /// r[b] := id of a new zeroed segment of r[c] words
    MapSegment { b: u8, c: u8 },

    /// Unmap segment r[c]
    UnmapSegment { c: u8 },

    /// Write the low byte of r[c]
    Output { c: u8 },

    /// r[c] := next input byte, or all ones at end of input
    Input { c: u8 },

    /// Copy segment r[b] over segment 0 (unless r[b] is 0), then pc := r[c]
    LoadProgram { b: u8, c: u8 },

    /// r[a] := value
    LoadValue { a: u8, value: u32 },
}

impl Instruction {
    /// The opcode of this instruction.
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::CMov { .. } => Opcode::CMov,
            Instruction::SegLoad { .. } => Opcode::SegLoad,
            Instruction::SegStore { .. } => Opcode::SegStore,
            Instruction::Add { .. } => Opcode::Add,
            Instruction::Mul { .. } => Opcode::Mul,
            Instruction::Div { .. } => Opcode::Div,
            Instruction::Nand { .. } => Opcode::Nand,
            Instruction::Halt => Opcode::Halt,
            Instruction::MapSegment { .. } => Opcode::MapSegment,
            Instruction::UnmapSegment { .. } => Opcode::UnmapSegment,
            Instruction::Output { .. } => Opcode::Output,
            Instruction::Input { .. } => Opcode::Input,
            Instruction::LoadProgram { .. } => Opcode::LoadProgram,
            Instruction::LoadValue { .. } => Opcode::LoadValue,
        }
    }

    /// The (A, B, C) register fields as they appear in the encoded word.
    ///
    /// Fields an instruction does not use are zero. `LoadValue` reports its
    /// register as A.
    pub fn registers(&self) -> (u8, u8, u8) {
        match *self {
            Instruction::CMov { a, b, c }
            | Instruction::SegLoad { a, b, c }
            | Instruction::SegStore { a, b, c }
            | Instruction::Add { a, b, c }
            | Instruction::Mul { a, b, c }
            | Instruction::Div { a, b, c }
            | Instruction::Nand { a, b, c } => (a, b, c),
            Instruction::Halt => (0, 0, 0),
            Instruction::MapSegment { b, c } | Instruction::LoadProgram { b, c } => (0, b, c),
            Instruction::UnmapSegment { c }
            | Instruction::Output { c }
            | Instruction::Input { c } => (0, 0, c),
            Instruction::LoadValue { a, .. } => (a, 0, 0),
        }
    }
}

/// Decode a 32-bit instruction word.
pub fn decode(word: u32) -> Result<Instruction, DecodeError> {
    let opcode = Opcode::try_from(bitpack::get_u32(word, OPCODE_WIDTH, OPCODE_LSB))?;

    if opcode == Opcode::LoadValue {
        return Ok(Instruction::LoadValue {
            a: bitpack::get_u32(word, REG_WIDTH, LV_REG_LSB) as u8,
            value: bitpack::get_u32(word, IMMEDIATE_BITS, 0),
        });
    }

    let a = bitpack::get_u32(word, REG_WIDTH, REG_A_LSB) as u8;
    let b = bitpack::get_u32(word, REG_WIDTH, REG_B_LSB) as u8;
    let c = bitpack::get_u32(word, REG_WIDTH, REG_C_LSB) as u8;

    let instruction = match opcode {
        Opcode::CMov => Instruction::CMov { a, b, c },
        Opcode::SegLoad => Instruction::SegLoad { a, b, c },
        Opcode::SegStore => Instruction::SegStore { a, b, c },
        Opcode::Add => Instruction::Add { a, b, c },
        Opcode::Mul => Instruction::Mul { a, b, c },
        Opcode::Div => Instruction::Div { a, b, c },
        Opcode::Nand => Instruction::Nand { a, b, c },
        Opcode::Halt => Instruction::Halt,
        Opcode::MapSegment => Instruction::MapSegment { b, c },
        Opcode::UnmapSegment => Instruction::UnmapSegment { c },
        Opcode::Output => Instruction::Output { c },
        Opcode::Input => Instruction::Input { c },
        Opcode::LoadProgram => Instruction::LoadProgram { b, c },
        Opcode::LoadValue => unreachable!("handled above"),
    };

    Ok(instruction)
}

/// Encode an instruction back to a 32-bit word.
///
/// Fails if a register index does not fit in three bits or an immediate
/// does not fit in 25 bits.
pub fn encode(instr: &Instruction) -> Result<u32, EncodeError> {
    let word = bitpack::new_u32(0, OPCODE_WIDTH, OPCODE_LSB, instr.opcode() as u32)?;

    if let Instruction::LoadValue { a, value } = *instr {
        let word = bitpack::new_u32(word, REG_WIDTH, LV_REG_LSB, a as u32)
            .map_err(|_| EncodeError::Register(a))?;
        return bitpack::new_u32(word, IMMEDIATE_BITS, 0, value)
            .map_err(|_| EncodeError::Immediate(value));
    }

    let (a, b, c) = instr.registers();
    let mut word = word;
    for (reg, lsb) in [(a, REG_A_LSB), (b, REG_B_LSB), (c, REG_C_LSB)] {
        word = bitpack::new_u32(word, REG_WIDTH, lsb, reg as u32)
            .map_err(|_| EncodeError::Register(reg))?;
    }
    Ok(word)
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0}")]
    InvalidOpcode(u32),
}

/// Errors that can occur when encoding an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("register index {0} does not fit in 3 bits")]
    Register(u8),

    #[error("immediate {0} does not fit in 25 bits")]
    Immediate(u32),

    #[error(transparent)]
    Field(#[from] BitpackError),
}
