//! CPU execution engine for the UM.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::asm::disasm::format_instruction;
use crate::cpu::decode::{self, DecodeError, Instruction};
use crate::cpu::io::Console;
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::{RegisterError, NUM_REGISTERS};
use crate::cpu::{Memory, Registers};
use log::{info, trace, warn};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Value stored by `IN` when the input stream is exhausted.
pub const END_OF_INPUT: u32 = u32::MAX;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU executed a HALT instruction.
    Halted,
    /// The program counter ran past the end of the program segment.
    EndOfProgram,
    /// CPU hit a fatal error.
    Error,
}

/// The UM.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// General-purpose registers.
    pub regs: Registers,
    /// Segmented memory; segment 0 holds the program.
    pub mem: Memory,
    /// Index of the next instruction in segment 0.
    pub pc: u32,
    /// Current execution state.
    pub state: CpuState,
    /// Instructions executed so far.
    pub cycles: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU with zeroed state and an empty program.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            pc: 0,
            state: CpuState::Running,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Create a CPU with `program` already loaded into segment 0.
    pub fn with_program(program: Vec<u32>) -> Self {
        let mut cpu = Self::new();
        cpu.load_program(program);
        cpu
    }

    /// Reset the CPU to initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Load a program into segment 0 and rewind the program counter.
    pub fn load_program(&mut self, program: Vec<u32>) {
        info!("loaded program of {} words", program.len());
        self.mem.load_program(program);
        self.pc = 0;
        self.state = CpuState::Running;
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed, or `None` if the program
    /// counter was already past the end of segment 0, in which case the
    /// machine stops normally.
    pub fn step<C: Console + ?Sized>(&mut self, console: &mut C) -> Result<Option<Instruction>, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        // Fetch
        let pc = self.pc;
        let raw = match self.mem.fetch(pc) {
            Some(word) => word,
            None => {
                info!("program counter {} past end of program; stopping", pc);
                self.state = CpuState::EndOfProgram;
                return Ok(None);
            }
        };

        // Decode
        let instr = match decode::decode(raw) {
            Ok(instr) => instr,
            Err(e) => {
                self.state = CpuState::Error;
                return Err(e.into());
            }
        };
        trace!("{:08x}: {:08x}  {}", pc, raw, format_instruction(&instr));

        // Advance PC before execute (LOADP overrides)
        self.pc = pc.wrapping_add(1);

        // Execute
        if let Err(e) = self.execute(instr, console) {
            self.state = CpuState::Error;
            return Err(e);
        }

        self.cycles += 1;
        self.last_instr = Some(instr);

        Ok(Some(instr))
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run<C: Console + ?Sized>(&mut self, console: &mut C) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step(console)?;
        }
        console.flush().map_err(|e| CpuError::Io(e.to_string()))?;

        info!("stopped ({:?}) after {} instructions", self.state, self.cycles - start_cycles);
        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    ///
    /// The machine is left running if the budget runs out first.
    pub fn run_limited<C: Console + ?Sized>(
        &mut self,
        console: &mut C,
        max_cycles: u64,
    ) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);

        while self.state == CpuState::Running && self.cycles < limit {
            self.step(console)?;
        }
        console.flush().map_err(|e| CpuError::Io(e.to_string()))?;

        if self.state == CpuState::Running {
            warn!("step budget of {} instructions exhausted at pc {}", max_cycles, self.pc);
        }
        Ok(self.cycles - start_cycles)
    }

    /// Execute a decoded instruction.
    ///
    /// Every register operand is checked before any state changes, so a
    /// rejected instruction leaves the machine untouched.
    pub fn execute<C: Console + ?Sized>(&mut self, instr: Instruction, console: &mut C) -> Result<(), CpuError> {
        let (a, b, c) = instr.registers();
        for index in [a, b, c] {
            Registers::validate(index)?;
        }

        match instr {
            Instruction::CMov { a, b, c } => {
                if self.regs.get(c)? != 0 {
                    let value = self.regs.get(b)?;
                    self.regs.set(a, value)?;
                }
            }

            Instruction::SegLoad { a, b, c } => {
                let value = self.mem.read(self.regs.get(b)?, self.regs.get(c)?)?;
                self.regs.set(a, value)?;
            }

            Instruction::SegStore { a, b, c } => {
                let (seg, offset, value) = (self.regs.get(a)?, self.regs.get(b)?, self.regs.get(c)?);
                self.mem.write(seg, offset, value)?;
            }

            Instruction::Add { a, b, c } => {
                let value = self.regs.get(b)?.wrapping_add(self.regs.get(c)?);
                self.regs.set(a, value)?;
            }

            Instruction::Mul { a, b, c } => {
                let value = self.regs.get(b)?.wrapping_mul(self.regs.get(c)?);
                self.regs.set(a, value)?;
            }

            Instruction::Div { a, b, c } => {
                let divisor = self.regs.get(c)?;
                if divisor == 0 {
                    return Err(CpuError::DivisionByZero);
                }
                let value = self.regs.get(b)? / divisor;
                self.regs.set(a, value)?;
            }

            Instruction::Nand { a, b, c } => {
                let value = !(self.regs.get(b)? & self.regs.get(c)?);
                self.regs.set(a, value)?;
            }

            Instruction::Halt => {
                self.state = CpuState::Halted;
            }

            Instruction::MapSegment { b, c } => {
                let id = self.mem.allocate(self.regs.get(c)?)?;
                self.regs.set(b, id)?;
            }

            Instruction::UnmapSegment { c } => {
                let id = self.regs.get(c)?;
                if id == 0 {
                    return Err(MemoryError::InvalidUnmap(id).into());
                }
                self.mem.release(id)?;
            }

            Instruction::Output { c } => {
                let byte = self.regs.get(c)? as u8;
                console.write_byte(byte).map_err(|e| CpuError::Io(e.to_string()))?;
            }

            Instruction::Input { c } => {
                let value = match console.read_byte().map_err(|e| CpuError::Io(e.to_string()))? {
                    Some(byte) => byte as u32,
                    None => END_OF_INPUT,
                };
                self.regs.set(c, value)?;
            }

            Instruction::LoadProgram { b, c } => {
                let source = self.regs.get(b)?;
                let target = self.regs.get(c)?;
                if source != 0 {
                    self.mem.replace_program(source)?;
                }
                self.pc = target;
            }

            Instruction::LoadValue { a, value } => {
                self.regs.set(a, value)?;
            }
        }

        Ok(())
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU stopped normally (HALT or end of program).
    pub fn is_halted(&self) -> bool {
        matches!(self.state, CpuState::Halted | CpuState::EndOfProgram)
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }

    /// Summarize machine state for reporting.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            registers: self.regs.values(),
            pc: self.pc,
            state: self.state,
            cycles: self.cycles,
            program_words: self.mem.program_len(),
            mapped_segments: self.mem.mapped_count(),
            free_segments: self.mem.free_ids().collect(),
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("regs", &self.regs)
            .field("pc", &self.pc)
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("mem", &self.mem)
            .finish()
    }
}

/// Serializable summary of a machine, written by `run --dump-state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub registers: [u32; NUM_REGISTERS],
    pub pc: u32,
    pub state: CpuState,
    pub cycles: u64,
    pub program_words: usize,
    pub mapped_segments: usize,
    /// Free segment ids in reuse order.
    pub free_segments: Vec<u32>,
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("memory error: {0}")]
    MemoryError(#[from] MemoryError),

    #[error("decode error: {0}")]
    DecodeError(#[from] DecodeError),

    #[error("register error: {0}")]
    RegisterError(#[from] RegisterError),

    #[error("division by zero")]
    DivisionByZero,

    #[error("console I/O error: {0}")]
    Io(String),
}

impl CpuError {
    /// Process exit status a host should use for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CpuError::MemoryError(MemoryError::InvalidUnmap(_)) => 4,
            CpuError::MemoryError(MemoryError::AllocationFailed { .. }) => 10,
            CpuError::MemoryError(_) => 3,
            CpuError::DecodeError(_) => 5,
            CpuError::RegisterError(_) => 6,
            CpuError::DivisionByZero => 7,
            CpuError::Io(_) => 8,
            CpuError::NotRunning(_) => 9,
        }
    }
}
