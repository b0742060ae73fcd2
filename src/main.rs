use std::process;

use clap::Parser;
use rexprc::{CompileError, Emit, Options, Syntax};

/// Compile an arithmetic expression into x86-64 assembly whose `main`
/// returns the expression's value.
#[derive(Parser)]
#[command(name = "rexprc", version, about)]
struct Cli {
  /// Expression to compile, e.g. "1+2*3" or "-3+5"
  #[arg(allow_hyphen_values = true)]
  expr: String,

  /// Assembler dialect of the output
  #[arg(long, value_enum, default_value_t = Syntax::Intel)]
  syntax: Syntax,

  /// What to print instead of assembly
  #[arg(long, value_enum, default_value_t = Emit::Asm)]
  emit: Emit,
}

fn main() {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    // --help and --version go to stdout and succeed.
    Err(err) if !err.use_stderr() => err.exit(),
    Err(err) => {
      let _ = err.print();
      process::exit(1);
    }
  };

  let options = Options {
    syntax: cli.syntax,
    emit: cli.emit,
  };

  match rexprc::compile(&cli.expr, &options) {
    Ok(Some(output)) => print!("{output}"),
    Ok(None) => {
      eprintln!("cannot evaluate: division by zero or overflow");
      process::exit(1);
    }
    Err(err) => report(&err),
  }
}

/// Print the diagnostic for the first error and stop.
fn report(err: &CompileError) -> ! {
  eprintln!("{err}");
  process::exit(1);
}
