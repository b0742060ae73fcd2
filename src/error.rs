//! Shared error utilities used across the compilation pipeline.
//!
//! Diagnostics point at the offending byte with a caret under the source
//! line, in the style of chibicc. Nothing here terminates the process: the
//! driver decides what to do with the first error it receives.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
pub enum CompileError {
  /// A lexical or grammatical error anchored at a byte offset in the input.
  #[snafu(display("{line}\n{}^ {message}", " ".repeat(*column)))]
  Syntax {
    line: String,
    offset: usize,
    column: usize,
    message: String,
  },
}

impl CompileError {
  /// Construct an error anchored at a specific byte offset in the source.
  pub fn at(expr: &str, loc: usize, message: impl Into<String>) -> Self {
    let safe_loc = floor_char_boundary(expr, loc.min(expr.len()));
    let line_start = expr[..safe_loc].rfind('\n').map_or(0, |pos| pos + 1);
    let line_end = expr[safe_loc..]
      .find('\n')
      .map_or(expr.len(), |pos| safe_loc + pos);

    SyntaxSnafu {
      line: &expr[line_start..line_end],
      offset: safe_loc,
      column: expr[line_start..safe_loc].chars().count(),
      message: message.into(),
    }
    .build()
  }

  /// Byte offset into the source the diagnostic points at.
  pub fn offset(&self) -> usize {
    match self {
      Self::Syntax { offset, .. } => *offset,
    }
  }

  pub fn message(&self) -> &str {
    match self {
      Self::Syntax { message, .. } => message,
    }
  }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
  while !s.is_char_boundary(index) {
    index -= 1;
  }
  index
}
