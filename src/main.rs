//! ARM Emulator - CLI Entry Point
//!
//! `arm-emu [options] <file>...`
//!
//! The first positional argument naming a readable program file is run
//! until it executes `SVC 0`. The legacy single-dash spellings `-trace`,
//! `-before` and `-after` are accepted. Any other unrecognised argument is
//! treated as one more file candidate.

use armemu::asm::disasm::disassemble;
use armemu::console::{format_memory_dump, write_snapshot, ConsoleHost};
use armemu::{load_program, Cpu, EmulatorConfig, FillPolicy, Program, ProgramError};
use clap::Parser;
use std::ffi::OsString;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "arm-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator for a subset of the 32-bit ARM instruction set")]
struct Cli {
    /// Print the registers and the next instruction before every step
    #[arg(long)]
    trace: bool,

    /// Dump memory before execution
    #[arg(long)]
    before: bool,

    /// Dump memory after the program halts
    #[arg(long)]
    after: bool,

    /// Fill never-written memory with random bytes instead of zeros
    #[arg(long)]
    random_fill: bool,

    /// Seed for --random-fill
    #[arg(long, requires = "random_fill")]
    seed: Option<u64>,

    /// Print a disassembly listing of the program and exit
    #[arg(long)]
    list: bool,

    /// Write a JSON snapshot of registers and memory after the run
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Program files; the first one that can be read is used
    files: Vec<PathBuf>,
}

impl Cli {
    fn config(&self) -> EmulatorConfig {
        let fill = if self.random_fill {
            FillPolicy::Random {
                seed: self.seed.unwrap_or_default(),
            }
        } else {
            FillPolicy::Zero
        };
        EmulatorConfig { fill }
    }
}

const SWITCHES: &[&str] = &[
    "--trace",
    "--before",
    "--after",
    "--random-fill",
    "--list",
    "--help",
    "--version",
    "-h",
    "-V",
];

const VALUED: &[&str] = &["--seed", "--snapshot"];

/// Rewrite legacy single-dash flags for clap.
///
/// Recognised options come first. Everything else, unknown dash arguments
/// included, follows a `--` as a file candidate, in the order given.
fn normalize_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    let mut args = args.into_iter();
    let mut options: Vec<OsString> = args.next().into_iter().collect();
    let mut files = Vec::new();

    while let Some(arg) = args.next() {
        let Some(text) = arg.to_str().map(str::to_owned) else {
            files.push(arg);
            continue;
        };

        match text.as_str() {
            "-trace" | "-before" | "-after" => options.push(format!("-{text}").into()),
            "--" => files.extend(args.by_ref()),
            t if SWITCHES.contains(&t) => options.push(arg),
            t if VALUED.contains(&t) => {
                options.push(arg);
                options.extend(args.next());
            }
            t if VALUED.iter().any(|v| t.starts_with(&format!("{v}="))) => options.push(arg),
            _ => files.push(arg),
        }
    }

    options.push("--".into());
    options.extend(files);
    options
}

/// Load the first program that can be read, reporting the ones that can't.
fn open_first(files: &[PathBuf]) -> Option<Program> {
    for path in files {
        match load_program(path) {
            Ok(program) => return Some(program),
            Err(ProgramError::Io { message, .. }) => {
                tracing::debug!("{}: {message}", path.display());
                eprintln!("The file {} was not found.", path.display());
            }
        }
    }
    None
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    let Some(program) = open_first(&cli.files) else {
        eprintln!("No program file could be opened.");
        return ExitCode::from(1);
    };
    if program.is_empty() {
        tracing::warn!("no address/word pairs read, starting at 00000000");
    }

    if cli.list {
        print!("{}", disassemble(&program));
        return ExitCode::SUCCESS;
    }

    run_program(&cli, &program)
}

fn run_program(cli: &Cli, program: &Program) -> ExitCode {
    let mut cpu = Cpu::with_config(cli.config());
    if let Err(e) = cpu.load_program(program) {
        eprintln!("Failed to load program: {e}");
        return ExitCode::from(2);
    }

    let stdout = std::io::stdout();
    let mut host = ConsoleHost::new(BufWriter::new(stdout.lock()), cli.trace);

    if cli.before {
        let dump = format_memory_dump(&cpu.mem);
        let _ = writeln!(host.writer(), "{dump}");
    }

    if let Err(e) = cpu.run(&mut host) {
        let _ = host.writer().flush();
        eprintln!("Emulator error at PC={:08X}: {e}", cpu.state.pc());
        return ExitCode::from(2);
    }

    if cli.after {
        let dump = format_memory_dump(&cpu.mem);
        let _ = write!(host.writer(), "{dump}");
    }

    if let Err(e) = host.writer().flush() {
        tracing::warn!("flushing stdout failed: {e}");
    }

    if let Some(path) = &cli.snapshot {
        if let Err(e) = write_snapshot(path, &cpu) {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    }

    ExitCode::SUCCESS
}
