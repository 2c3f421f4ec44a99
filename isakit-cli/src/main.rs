//! `isakit` command-line driver
//!
//! Assembles, disassembles and simulates programs for the isa3220
//! reference instruction set. Set `RUST_LOG` to see library logging.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use isakit_assembler::assemble_file;
use isakit_disassembler::disassemble;
use isakit_runtime::{HaltReason, VMConfig, VM};
use isakit_spec::{isa3220, InstructionSet, ProgramImage};

mod report;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Assemble, disassemble and simulate isa3220 programs"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble a source file and simulate it step by step
    Run {
        #[arg(value_name = "SOURCE")]
        source: PathBuf,
        /// Stop after this many instructions
        #[arg(long, default_value_t = 1_000_000u64)]
        max_steps: u64,
        /// Only print the final state
        #[arg(short, long)]
        quiet: bool,
    },
    /// Assemble a source file, print its listing and optionally write an image
    Asm {
        #[arg(value_name = "SOURCE")]
        source: PathBuf,
        /// Write the program image to this file
        #[arg(short, long, value_name = "IMAGE")]
        output: Option<PathBuf>,
    },
    /// Print the listing of a program image
    Disasm {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let isa = isa3220().context("building isa3220")?;

    match cli.cmd {
        Command::Run {
            source,
            max_steps,
            quiet,
        } => run(&isa, &source, max_steps, quiet),
        Command::Asm { source, output } => asm(&isa, &source, output.as_deref()),
        Command::Disasm { image } => disasm(&isa, &image),
    }
}

fn run(isa: &InstructionSet, source: &Path, max_steps: u64, quiet: bool) -> Result<()> {
    let assembly = assemble_file(isa, source)
        .with_context(|| format!("assembling {}", source.display()))?;
    let config = VMConfig {
        max_steps: Some(max_steps),
        trace: false,
    };
    let mut vm = VM::new(isa, assembly.program, config);
    vm.load_data(&assembly.data)?;

    let width = isa.config().data_width;
    println!("{}", report::banner(vm.state().pc));
    while !vm.state().is_halted() {
        let Some(record) = vm.step()? else {
            break;
        };
        if !quiet {
            println!("{}", report::step_line(&record, width));
        }
        if record.halted
            && vm.state().halt_reason() == Some(HaltReason::TerminatingInstruction)
        {
            println!("{}", report::TERMINATING);
        }
    }

    if let Some(reason) = vm.state().halt_reason() {
        tracing::debug!(%reason, "run finished");
    }
    let state = vm.state();
    println!(
        "{}",
        report::summary(state.steps, state.pc, state.regs.values(), width)
    );
    Ok(())
}

fn asm(isa: &InstructionSet, source: &Path, output: Option<&Path>) -> Result<()> {
    let assembly = assemble_file(isa, source)
        .with_context(|| format!("assembling {}", source.display()))?;
    let program = &assembly.program;
    let words = program.words()?;

    print!("{}", disassemble(isa, &words, program.start())?);
    if !assembly.data.is_empty() {
        println!("{}", report::data_listing(&assembly.data));
    }

    if let Some(path) = output {
        let image = program.to_image(isa.config().instruction_width, assembly.data.clone())?;
        std::fs::write(path, image.to_bytes()?)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), words = words.len(), "image written");
    }
    Ok(())
}

fn disasm(isa: &InstructionSet, path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let image = ProgramImage::from_bytes(&bytes)?;
    if image.instruction_width != isa.config().instruction_width {
        bail!(
            "{} holds {}-bit instructions, isa3220 uses {}-bit",
            path.display(),
            image.instruction_width,
            isa.config().instruction_width
        );
    }

    print!("{}", disassemble(isa, &image.words, image.instruction_start)?);
    if !image.data.is_empty() {
        println!("{}", report::data_listing(&image.data));
    }
    Ok(())
}
