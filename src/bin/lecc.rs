use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lecc::codegen::OptLevel;
use lecc::{Backends, CompilationOutput, CompileOptions, Compiler, LogicError, StatementOutcome, toolchain};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum BackendArg {
    Asm,
    Ir,
    Both,
}

impl From<BackendArg> for Backends {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Asm => Backends::Asm,
            BackendArg::Ir => Backends::Ir,
            BackendArg::Both => Backends::Both,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(name = "lecc", version, about = "Compile propositional logic programs to NASM x86-64 and LLVM IR")]
struct Args {
    /// Input program, one statement per line
    input: PathBuf,

    /// Output executable name
    #[clap(short = 'o', long = "output", default_value = "lec_output")]
    output: String,

    /// Assembly optimization level (0, 1 or 2); `-opt` is also accepted
    #[clap(long = "opt", default_value_t = 1)]
    opt: u8,

    /// Which backends to run
    #[clap(long = "backend", value_enum, default_value = "both")]
    backend: BackendArg,

    /// Evaluation trace file
    #[clap(long = "trace", default_value = "output.txt")]
    trace: PathBuf,

    /// Write text artifacts only, do not run nasm/ld/llvm-as/clang
    #[clap(long = "emit-only")]
    emit_only: bool,

    /// Apply the commutative law to AND/OR while rewriting
    #[clap(long)]
    commutative: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

/// 单横线的 `-opt` 写法改写为 `--opt`
fn normalize_args(args: impl Iterator<Item = OsString>) -> Vec<OsString> {
    args.map(|arg| match arg.to_str() {
        Some("-opt") => OsString::from("--opt"),
        Some(s) if s.starts_with("-opt=") => OsString::from(format!("-{}", s)),
        _ => arg,
    })
    .collect()
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("LECC_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report(output: &CompilationOutput) {
    for statement in &output.statements {
        match &statement.outcome {
            StatementOutcome::Evaluated(value) => {
                println!("{:>4}: {} => {}", statement.line, statement.source, lecc::ast::bool_text(*value));
            }
            StatementOutcome::Unevaluated(diag) => {
                println!("{:>4}: {} => (unevaluated) {}", statement.line, statement.source, diag);
            }
            StatementOutcome::Failed(e) => {
                eprintln!("line {}: {}", statement.line, e);
            }
        }
    }

    let symbols: Vec<String> = output
        .symbol_table
        .user_symbols()
        .map(|s| format!("{} = {}", s.name, if s.defined { lecc::ast::bool_text(s.value) } else { "?" }))
        .collect();
    if !symbols.is_empty() {
        println!("Symbols: {}", symbols.join(", "));
    }
}

fn run(args: &Args) -> anyhow::Result<i32> {
    let opt_level = OptLevel::from_level(args.opt)?;
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let options = CompileOptions {
        opt_level,
        commutative: args.commutative,
        backends: args.backend.into(),
        ..CompileOptions::default()
    };
    let output = Compiler::with_options(options).compile_source(&source);
    report(&output);

    fs::write(&args.trace, output.log.render_trace_file())
        .with_context(|| format!("failed to write {}", args.trace.display()))?;
    info!(path = %args.trace.display(), "wrote evaluation trace");

    if let Some(asm) = &output.asm {
        let asm_path = PathBuf::from(format!("{}.asm", args.output));
        fs::write(&asm_path, asm).with_context(|| format!("failed to write {}", asm_path.display()))?;
        info!(path = %asm_path.display(), "wrote assembly");
        if !args.emit_only {
            let object = PathBuf::from(format!("{}.o", args.output));
            toolchain::assemble_and_link(&asm_path, &object, &PathBuf::from(&args.output))?;
        }
    }

    if let Some(ir) = &output.ir {
        let ll_path = PathBuf::from(format!("{}.ll", args.output));
        ir.write_text(&ll_path)?;
        if !args.emit_only {
            toolchain::write_bitcode(&ll_path, &PathBuf::from(format!("{}.bc", args.output)))?;
            toolchain::compile_ir(&ll_path, &PathBuf::from(format!("{}-ir", args.output)))?;
        }
    }

    Ok(if output.has_errors() { 1 } else { 0 })
}

fn main() {
    let args = Args::parse_from(normalize_args(std::env::args_os()));
    init_logging(args.verbose);

    match run(&args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            let code = e.downcast_ref::<LogicError>().map_or(1, LogicError::exit_code);
            process::exit(code);
        }
    }
}
