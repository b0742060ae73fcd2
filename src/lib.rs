//! Crate root: wires together the compilation pipeline.
//!
//! The stages are small and composable:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns one expression tree.
//! - `codegen` lowers the tree into x86-64 assembly for a `main` function.
//! - `interpret` evaluates the tree directly, mirroring what the emitted code computes.
//! - `error` centralises the caret diagnostics shared by the other modules.

pub mod codegen;
pub mod error;
pub mod interpret;
pub mod parser;
pub mod tokenizer;

use clap::ValueEnum;

pub use codegen::Syntax;
pub use error::{CompileError, CompileResult};

/// Which artifact of the pipeline to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Emit {
  /// Assembly for the target dialect.
  #[default]
  Asm,
  /// One token per line.
  Tokens,
  /// The canonicalised expression tree as an S-expression.
  Ast,
  /// The value the compiled program would return.
  Value,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
  pub syntax: Syntax,
  pub emit: Emit,
}

/// Compile a source string into assembly in the requested dialect.
pub fn generate_assembly(expr: &str, syntax: Syntax) -> CompileResult<String> {
  let tokens = tokenizer::tokenize(expr)?;
  let node = parser::parse(tokens, expr)?;
  Ok(codegen::generate(&node, syntax))
}

/// Run the pipeline as far as `options.emit` requires and render the result.
///
/// `Emit::Value` returns `Ok(None)` when evaluation traps (division by zero
/// or overflow); every other mode always yields text on success.
pub fn compile(expr: &str, options: &Options) -> CompileResult<Option<String>> {
  let tokens = tokenizer::tokenize(expr)?;

  let output = match options.emit {
    Emit::Tokens => Some(
      tokens
        .iter()
        .map(|token| format!("{}\n", token.display(expr)))
        .collect::<String>(),
    ),
    Emit::Asm => Some(codegen::generate(
      &parser::parse(tokens, expr)?,
      options.syntax,
    )),
    Emit::Ast => Some(format!("{}\n", parser::parse(tokens, expr)?)),
    Emit::Value => interpret::evaluate(&parser::parse(tokens, expr)?).map(|value| format!("{value}\n")),
  };
  Ok(output)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn run(expr: &str, emit: Emit) -> Option<String> {
    let options = Options {
      emit,
      ..Options::default()
    };
    compile(expr, &options).expect("expression should compile")
  }

  #[test]
  fn default_emit_is_intel_assembly() {
    let asm = run("1+2", Emit::Asm).unwrap();

    assert!(asm.starts_with(".intel_syntax noprefix\n.global main\nmain:\n"));
    assert!(asm.ends_with("    pop rax\n    ret\n"));
    assert_eq!(asm, generate_assembly("1+2", Syntax::Intel).unwrap());
  }

  #[test]
  fn token_listing_ends_with_sentinel() {
    assert_eq!(
      run("12+ 3", Emit::Tokens).unwrap(),
      "Number(12)\nReserved(\"+\")\nNumber(3)\nEndOfInput\n"
    );
  }

  #[test]
  fn token_listing_does_not_need_a_valid_grammar() {
    assert_eq!(run("1 +", Emit::Tokens).unwrap(), "Number(1)\nReserved(\"+\")\nEndOfInput\n");
  }

  #[test]
  fn ast_and_value_modes() {
    assert_eq!(run("2>=3", Emit::Ast).unwrap(), "(<= 3 2)\n");
    assert_eq!(run("2>=3", Emit::Value).unwrap(), "0\n");
    assert_eq!(run("3>=2", Emit::Value).unwrap(), "1\n");
    assert_eq!(run("1/0", Emit::Value), None);
  }

  #[test]
  fn errors_surface_from_every_stage() {
    assert!(generate_assembly("1 $ 2", Syntax::Intel).is_err());
    assert!(generate_assembly("(1", Syntax::Att).is_err());
    assert!(compile("", &Options::default()).is_err());
  }
}
