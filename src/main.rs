//! UM Emulator - CLI Entry Point
//!
//! Commands:
//! - `um-emu run <program>` - Run a `.um` image
//! - `um-emu disasm <program>` - Disassemble a `.um` image
//! - `um-emu emit <name>` - Write a built-in test program

use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use std::path::{Path, PathBuf};
use std::process;
use um::asm::program::{find_test_program, TEST_PROGRAMS};
use um::{Console, Cpu, RunConfig, StdConsole, TrailingBytes};

/// Exit status for unreadable programs, configs and bad arguments.
const EXIT_LOAD_FAILURE: i32 = 1;
/// Exit status when `--max-steps` stops a program that has not halted.
const EXIT_BUDGET_EXHAUSTED: i32 = 2;

#[derive(Parser)]
#[command(name = "um-emu")]
#[command(version)]
#[command(about = "An emulator for the 14-instruction Universal Machine")]
struct Cli {
    /// Log more (-v: debug, -vv: trace). RUST_LOG applies otherwise.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the .um image to execute
        program: PathBuf,
        /// JSON run configuration; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Stop after this many instructions
        #[arg(short, long)]
        max_steps: Option<u64>,
        /// Log every executed instruction
        #[arg(short, long)]
        trace: bool,
        /// How to treat an image whose size is not a multiple of 4 bytes
        #[arg(long, value_enum)]
        trailing_bytes: Option<TrailingBytes>,
        /// Write a JSON snapshot of the machine here when the run ends
        #[arg(long)]
        dump_state: Option<PathBuf>,
    },
    /// Disassemble a .um image to readable text
    Disasm {
        /// Path to the .um image
        program: PathBuf,
        /// How to treat an image whose size is not a multiple of 4 bytes
        #[arg(long, value_enum, default_value = "reject")]
        trailing_bytes: TrailingBytes,
    },
    /// Write a built-in test program as a .um image
    Emit {
        /// Name of the test program (see --list)
        name: Option<String>,
        /// Output path (default: <name>.um)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// List the available test programs
        #[arg(short, long)]
        list: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { program, config, max_steps, trace, trailing_bytes, dump_state } => {
            let mut run_config = match config {
                Some(path) => RunConfig::from_file(&path).unwrap_or_else(|e| fail(&e)),
                None => RunConfig::default(),
            };
            if max_steps.is_some() {
                run_config.max_steps = max_steps;
            }
            run_config.trace |= trace;
            if let Some(policy) = trailing_bytes {
                run_config.trailing_bytes = policy;
            }

            init_logging(cli.verbose, run_config.trace);
            let code = run_program(&program, &run_config, dump_state.as_deref());
            process::exit(code);
        }
        Commands::Disasm { program, trailing_bytes } => {
            init_logging(cli.verbose, false);
            disassemble_file(&program, trailing_bytes);
        }
        Commands::Emit { name, output, list } => {
            init_logging(cli.verbose, false);
            if list || name.is_none() {
                list_test_programs();
            } else if let Some(name) = name {
                emit_test_program(&name, output);
            }
        }
    }
}

fn init_logging(verbose: u8, trace: bool) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    );
    let level = match verbose {
        _ if trace => Some(LevelFilter::Trace),
        0 => None,
        1 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };
    if let Some(level) = level {
        builder.filter_module("um", level);
    }
    builder.init();
}

fn fail(err: &dyn std::fmt::Display) -> ! {
    eprintln!("❌ {}", err);
    process::exit(EXIT_LOAD_FAILURE);
}

fn run_program(path: &Path, config: &RunConfig, dump_state: Option<&Path>) -> i32 {
    let words = um::load_image(path, config.trailing_bytes).unwrap_or_else(|e| fail(&e));
    info!("running {} ({} words)", path.display(), words.len());

    let mut cpu = Cpu::with_program(words);
    let mut console = StdConsole::stdio();

    let result = match config.max_steps {
        Some(limit) => cpu.run_limited(&mut console, limit),
        None => cpu.run(&mut console),
    };
    // A faulted run returns before flushing; keep the output it produced.
    if let Err(e) = console.flush() {
        eprintln!("❌ Failed to flush output: {}", e);
    }

    if let Some(dump_path) = dump_state {
        write_snapshot(&cpu, dump_path);
    }

    match result {
        Ok(_) if cpu.is_running() => {
            eprintln!(
                "⚠️  Stopped after {} instructions without halting. Use --max-steps to raise the limit.",
                cpu.cycles
            );
            EXIT_BUDGET_EXHAUSTED
        }
        Ok(_) => 0,
        Err(e) => {
            eprintln!("❌ Machine fault after {} instructions: {}", cpu.cycles, e);
            e.exit_code()
        }
    }
}

fn write_snapshot(cpu: &Cpu, path: &Path) {
    let snapshot = cpu.snapshot();
    let json = match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("❌ Failed to serialize machine state: {}", e);
            return;
        }
    };
    if let Err(e) = std::fs::write(path, json) {
        eprintln!("❌ Failed to write {}: {}", path.display(), e);
    }
}

fn disassemble_file(path: &Path, trailing: TrailingBytes) {
    let words = um::load_image(path, trailing).unwrap_or_else(|e| fail(&e));
    println!("{}", um::disassemble(&words));
}

fn list_test_programs() {
    println!("Built-in test programs:");
    for program in TEST_PROGRAMS {
        println!("  {:<14} {}", program.name, program.description);
    }
}

/// Write `<name>.um`, plus `<name>.0` (input) and `<name>.1` (expected
/// output) when they are non-empty.
fn emit_test_program(name: &str, output: Option<PathBuf>) {
    let Some(program) = find_test_program(name) else {
        eprintln!("❌ Unknown test program '{}'. Use --list to see them.", name);
        process::exit(EXIT_LOAD_FAILURE);
    };

    let words = program.build().unwrap_or_else(|e| fail(&e));
    let out_path = output.unwrap_or_else(|| PathBuf::from(format!("{}.um", name)));
    um::save_image(&out_path, &words).unwrap_or_else(|e| fail(&e));

    for (ext, bytes) in [("0", program.input), ("1", program.expected_output)] {
        if bytes.is_empty() {
            continue;
        }
        let side = out_path.with_extension(ext);
        if let Err(e) = std::fs::write(&side, bytes) {
            fail(&format!("failed to write {}: {}", side.display(), e));
        }
    }

    eprintln!("✓ Wrote {} ({} instructions)", out_path.display(), words.len());
}
