//! Disassembler for UM programs.
//!
//! Converts instruction words back to readable assembly.

use crate::cpu::decode::{decode, Instruction};

/// Disassemble a single instruction word to text.
pub fn disassemble_instruction(word: u32) -> String {
    match decode(word) {
        Ok(decoded) => format_instruction(&decoded),
        Err(_) => format!(".word {:#010x}", word),
    }
}

/// Disassemble a slice of instruction words.
pub fn disassemble(words: &[u32]) -> String {
    let mut output = String::new();
    output.push_str("; UM Disassembly\n");
    output.push_str("; --------------\n\n");

    for (addr, word) in words.iter().enumerate() {
        let line = disassemble_instruction(*word);
        output.push_str(&format!("{:08x}: {:08x}  {}\n", addr, word, line));
    }

    output
}

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    let mnemonic = instr.opcode().mnemonic();
    match *instr {
        Instruction::CMov { a, b, c }
        | Instruction::SegLoad { a, b, c }
        | Instruction::SegStore { a, b, c }
        | Instruction::Add { a, b, c }
        | Instruction::Mul { a, b, c }
        | Instruction::Div { a, b, c }
        | Instruction::Nand { a, b, c } => format!("{} r{}, r{}, r{}", mnemonic, a, b, c),
        Instruction::Halt => mnemonic.to_string(),
        Instruction::MapSegment { b, c } | Instruction::LoadProgram { b, c } => {
            format!("{} r{}, r{}", mnemonic, b, c)
        }
        Instruction::UnmapSegment { c } | Instruction::Output { c } | Instruction::Input { c } => {
            format!("{} r{}", mnemonic, c)
        }
        Instruction::LoadValue { a, value } => format!("{} r{}, {}", mnemonic, a, value),
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_instruction(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(disassemble_instruction(0xD200_0048), "LV r1, 72");
        assert_eq!(disassemble_instruction(0x7000_0000), "HALT");
        assert_eq!(
            format_instruction(&Instruction::SegStore { a: 1, b: 2, c: 3 }),
            "SSTORE r1, r2, r3"
        );
        assert_eq!(Instruction::Output { c: 4 }.to_string(), "OUT r4");
    }

    #[test]
    fn test_invalid_word_is_data() {
        assert_eq!(disassemble_instruction(0xE000_0001), ".word 0xe0000001");
    }

    #[test]
    fn test_listing() {
        let listing = disassemble(&[0xD200_0048, 0x7000_0000]);
        assert!(listing.contains("00000000: d2000048  LV r1, 72"));
        assert!(listing.contains("00000001: 70000000  HALT"));
    }
}
