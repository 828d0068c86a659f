//! Whole-machine scenarios: image bytes in, console bytes out.

use um::asm::image::encode_image;
use um::cpu::{CpuError, CpuState, MemoryError};
use um::{parse_image, BufferConsole, Cpu, ProgramBuilder, TrailingBytes};

fn run_image(bytes: &[u8], input: &[u8]) -> (Cpu, Result<u64, CpuError>, Vec<u8>) {
    let words = parse_image(bytes, TrailingBytes::Reject).unwrap();
    let mut cpu = Cpu::with_program(words);
    let mut console = BufferConsole::with_input(input);
    let result = cpu.run(&mut console);
    let (_, output) = console.into_parts();
    (cpu, result, output)
}

#[test]
fn hello_from_raw_bytes() {
    // LV r1, 72; OUT r1; LV r1, 73; OUT r1; HALT
    let bytes = [
        0xD2, 0x00, 0x00, 0x48,
        0xA0, 0x00, 0x00, 0x01,
        0xD2, 0x00, 0x00, 0x49,
        0xA0, 0x00, 0x00, 0x01,
        0x70, 0x00, 0x00, 0x00,
    ];
    let (cpu, result, output) = run_image(&bytes, b"");

    assert_eq!(result.unwrap(), 5);
    assert_eq!(cpu.state, CpuState::Halted);
    assert_eq!(output, b"HI");
}

#[test]
fn map_store_load_output() {
    let words = ProgramBuilder::new()
        .load_value(1, 5)
        .map_segment(2, 1)
        .load_value(3, 2)
        .load_value(4, 0x1_2345)
        .seg_store(2, 3, 4)
        .seg_load(5, 2, 3)
        .output(5)
        .halt()
        .build()
        .unwrap();
    let (cpu, result, output) = run_image(&encode_image(&words), b"");

    result.unwrap();
    assert_eq!(cpu.regs.get(5).unwrap(), 0x1_2345);
    assert_eq!(output, vec![0x45]);
}

#[test]
fn program_without_halt_ends_normally() {
    let words = ProgramBuilder::new()
        .load_value(1, b'!' as u32)
        .output(1)
        .build()
        .unwrap();
    let (cpu, result, output) = run_image(&encode_image(&words), b"");

    assert_eq!(result.unwrap(), 2);
    assert_eq!(cpu.state, CpuState::EndOfProgram);
    assert_eq!(output, b"!");
}

#[test]
fn jump_past_end_ends_normally() {
    let words = ProgramBuilder::new()
        .load_value(1, 1000)
        .load_program(0, 1)
        .halt()
        .build()
        .unwrap();
    let (cpu, result, _) = run_image(&encode_image(&words), b"");

    assert_eq!(result.unwrap(), 2);
    assert_eq!(cpu.state, CpuState::EndOfProgram);
    assert_eq!(cpu.pc, 1000);
}

#[test]
fn unmap_segment_zero_is_fatal() {
    let words = ProgramBuilder::new()
        .load_value(1, 3)
        .map_segment(2, 1)
        .unmap_segment(7)
        .halt()
        .build()
        .unwrap();
    let (cpu, result, _) = run_image(&encode_image(&words), b"");

    assert_eq!(result, Err(CpuError::MemoryError(MemoryError::InvalidUnmap(0))));
    assert_eq!(cpu.state, CpuState::Error);
}

#[test]
fn echo_until_end_of_input() {
    // 0: IN r1
    // 1: LV r2, 1;  2: ADD r3, r1, r2     r3 == 0 only at end of input
    // 3: LV r4, 9;  4: LV r5, 7
    // 5: CMOV r5, r4, r3                  r5 := 9 unless at end of input
    // 6: LOADP r0, r5                     jump to 9 or 7
    // 7: HALT
    // 8: HALT
    // 9: OUT r1;  10: LV r6, 0;  11: LOADP r0, r6
    let words = ProgramBuilder::new()
        .input(1)
        .load_value(2, 1)
        .add(3, 1, 2)
        .load_value(4, 9)
        .load_value(5, 7)
        .cmov(5, 4, 3)
        .load_program(0, 5)
        .halt()
        .halt()
        .output(1)
        .load_value(6, 0)
        .load_program(0, 6)
        .build()
        .unwrap();
    let (cpu, result, output) = run_image(&encode_image(&words), b"echo");

    result.unwrap();
    assert_eq!(cpu.state, CpuState::Halted);
    assert_eq!(cpu.regs.get(1).unwrap(), u32::MAX);
    assert_eq!(output, b"echo");
}

#[test]
fn self_replacing_program() {
    // Copy "LV r1, 'X'; OUT r1; HALT" into segment 1 word by word, then
    // LOADP it. Nothing follows the LOADP in the loader program.
    let payload = ProgramBuilder::new()
        .load_value(1, b'X' as u32)
        .output(1)
        .halt()
        .build()
        .unwrap();

    let mut builder = ProgramBuilder::new()
        .load_value(1, payload.len() as u32)
        .map_segment(2, 1);
    for (offset, word) in payload.iter().enumerate() {
        builder = builder
            .load_value(3, offset as u32)
            .load_const(4, 5, *word)
            .seg_store(2, 3, 4);
    }
    let words = builder.load_value(6, 0).load_program(2, 6).build().unwrap();

    let (cpu, result, output) = run_image(&encode_image(&words), b"");

    result.unwrap();
    assert_eq!(output, b"X");
    assert_eq!(cpu.mem.program(), payload.as_slice());
    assert_eq!(cpu.mem.read(1, 0).unwrap(), payload[0]);
}

#[test]
fn trailing_bytes_policy() {
    let bytes = [0x70, 0x00, 0x00, 0x00, 0xD2];
    assert!(parse_image(&bytes, TrailingBytes::Reject).is_err());

    let words = parse_image(&bytes, TrailingBytes::Pad).unwrap();
    assert_eq!(words, vec![0x7000_0000, 0xD200_0000]);
}
