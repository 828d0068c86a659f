use proptest::prelude::*;
use um::cpu::decode::{decode, encode, MAX_IMMEDIATE};
use um::cpu::{CpuError, CpuState};
use um::{BufferConsole, Cpu, Instruction, ProgramBuilder};

fn run(words: Vec<u32>) -> (Cpu, Result<u64, CpuError>) {
    let mut cpu = Cpu::with_program(words);
    let result = cpu.run(&mut BufferConsole::with_input(&[]));
    (cpu, result)
}

proptest! {
    #[test]
    fn load_value_then_halt_sets_one_register(reg in 0u8..8, value in 0u32..=MAX_IMMEDIATE) {
        let words = ProgramBuilder::new().load_value(reg, value).halt().build().unwrap();
        let (cpu, result) = run(words);

        prop_assert_eq!(result, Ok(2));
        for r in 0u8..8 {
            let expected = if r == reg { value } else { 0 };
            prop_assert_eq!(cpu.regs.get(r).unwrap(), expected);
        }
    }

    #[test]
    fn map_unmap_reuses_the_same_id(size in 0u32..1024) {
        let words = ProgramBuilder::new()
            .load_value(1, size)
            .map_segment(2, 1)
            .unmap_segment(2)
            .map_segment(3, 1)
            .unmap_segment(3)
            .halt()
            .build()
            .unwrap();
        let (cpu, result) = run(words);

        prop_assert!(result.is_ok());
        prop_assert_eq!(cpu.regs.get(2).unwrap(), cpu.regs.get(3).unwrap());
    }

    #[test]
    fn store_then_load_round_trips(size in 1u32..256, offset_seed in any::<u32>(), value in any::<u32>()) {
        let offset = offset_seed % size;
        let words = ProgramBuilder::new()
            .load_value(1, size)
            .map_segment(2, 1)
            .load_value(3, offset)
            .load_const(4, 0, value)
            .seg_store(2, 3, 4)
            .seg_load(5, 2, 3)
            .halt()
            .build()
            .unwrap();
        let (cpu, result) = run(words);

        prop_assert!(result.is_ok());
        prop_assert_eq!(cpu.regs.get(5).unwrap(), value);
    }

    #[test]
    fn arithmetic_matches_wrapping_u32(x in any::<u32>(), y in any::<u32>()) {
        let words = ProgramBuilder::new()
            .load_const(1, 0, x)
            .load_const(2, 0, y)
            .add(3, 1, 2)
            .mul(4, 1, 2)
            .nand(5, 1, 2)
            .halt()
            .build()
            .unwrap();
        let (cpu, result) = run(words);

        prop_assert!(result.is_ok());
        prop_assert_eq!(cpu.regs.get(3).unwrap(), x.wrapping_add(y));
        prop_assert_eq!(cpu.regs.get(4).unwrap(), x.wrapping_mul(y));
        prop_assert_eq!(cpu.regs.get(5).unwrap(), !(x & y));
    }

    #[test]
    fn divide_by_zero_is_always_fatal(x in any::<u32>()) {
        let words = ProgramBuilder::new()
            .load_const(1, 0, x)
            .load_value(2, 0)
            .div(3, 1, 2)
            .halt()
            .build()
            .unwrap();
        let (cpu, result) = run(words);

        prop_assert_eq!(result, Err(CpuError::DivisionByZero));
        prop_assert_eq!(cpu.state, CpuState::Error);
    }

    #[test]
    fn decode_never_panics(word in any::<u32>()) {
        match decode(word) {
            Ok(instr) => prop_assert_eq!(instr.opcode() as u32, word >> 28),
            Err(_) => prop_assert!(word >> 28 >= 14),
        }
    }

    #[test]
    fn decoded_words_reencode_to_their_fields(word in any::<u32>()) {
        if let Ok(instr) = decode(word) {
            let reencoded = encode(&instr).unwrap();
            prop_assert_eq!(decode(reencoded).unwrap(), instr);
            if let Instruction::LoadValue { .. } = instr {
                prop_assert_eq!(reencoded, word);
            }
        }
    }
}

#[test]
fn add_wraps_at_32_bits() {
    let words = ProgramBuilder::new()
        .load_const(1, 0, 0xFFFF_FFFF)
        .load_value(2, 1)
        .add(3, 1, 2)
        .halt()
        .build()
        .unwrap();
    let (cpu, _) = run(words);
    assert_eq!(cpu.regs.get(3).unwrap(), 0);
}
