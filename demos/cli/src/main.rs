//! A thin command-line front end (spec §6): validates its arguments, reads
//! a script file, registers the demo standard library, and calls the
//! script's public entry point. Everything interesting - tokenizing,
//! parsing, compiling, running - lives in `lang/*`; this binary is just
//! the glue a user types at a shell prompt.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sl_host::Module;

/// Run an SL script file.
#[derive(Parser, Debug)]
#[command(name = "sl")]
#[command(version)]
#[command(about = "Runs a script written in SL")]
struct Cli {
    /// Script file to compile and run.
    script: PathBuf,

    /// Public function to call once the script is loaded.
    #[arg(long = "entry", default_value = "main")]
    entry: String,

    /// Skip registering the demo standard library (math, string, trace).
    #[arg(long = "no-stdlib")]
    no_stdlib: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let mut module = Module::new();
    if !cli.no_stdlib {
        sl_stdlib_demo::register_all(&mut module);
    }
    module.declare_public_function(format!("function void {}()", cli.entry));

    if let Err(message) = module.try_load(&cli.script) {
        eprintln!("{}", message);
        return ExitCode::FAILURE;
    }

    if let Err(err) = module.call_public(&cli.entry, Vec::new()) {
        eprintln!("{}", err);
        return ExitCode::FAILURE;
    }

    return ExitCode::SUCCESS;
}
