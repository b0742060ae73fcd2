//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer knows nothing about semantics beyond recognising operators
//! and numeric literals. Multi-character operators are matched before
//! single-character ones so `<=` never splits into `<` and `=`.

use std::fmt;

use crate::error::{CompileError, CompileResult};

const TWO_CHAR_OPS: [&str; 4] = ["==", "!=", "<=", ">="];

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Reserved,
  Num,
  Eof,
}

/// Thin wrapper for lexical information needed by later stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub value: Option<i64>,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  pub fn new(kind: TokenKind, loc: usize, len: usize, value: Option<i64>) -> Self {
    Self {
      kind,
      value,
      loc,
      len,
    }
  }

  /// Pair the token with its source so it can be printed.
  pub fn display<'a>(&'a self, source: &'a str) -> TokenDisplay<'a> {
    TokenDisplay {
      token: self,
      source,
    }
  }
}

pub struct TokenDisplay<'a> {
  token: &'a Token,
  source: &'a str,
}

impl fmt::Display for TokenDisplay<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.token.kind {
      TokenKind::Reserved => write!(f, "Reserved({:?})", token_text(self.token, self.source)),
      TokenKind::Num => write!(f, "Number({})", self.token.value.unwrap_or_default()),
      TokenKind::Eof => f.write_str("EndOfInput"),
    }
  }
}

/// Scan position over the raw input. Only the tokenizer moves it.
pub struct SourceCursor<'a> {
  source: &'a str,
  pos: usize,
}

impl<'a> SourceCursor<'a> {
  pub fn new(source: &'a str) -> Self {
    Self { source, pos: 0 }
  }

  pub fn offset(&self) -> usize {
    self.pos
  }

  pub fn rest(&self) -> &'a str {
    &self.source[self.pos..]
  }

  pub fn peek(&self) -> Option<char> {
    self.rest().chars().next()
  }

  pub fn is_at_end(&self) -> bool {
    self.pos >= self.source.len()
  }

  pub fn advance(&mut self, len: usize) {
    self.pos = (self.pos + len).min(self.source.len());
  }

  /// Consume the longest run of characters matching `pred`, returning it.
  pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
    let rest = self.rest();
    let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
    self.advance(len);
    &rest[..len]
  }
}

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let mut cursor = SourceCursor::new(input);

  while let Some(c) = cursor.peek() {
    if is_space(c) {
      cursor.advance(1);
      continue;
    }

    let start = cursor.offset();

    if let Some(op) = TWO_CHAR_OPS
      .into_iter()
      .find(|op| cursor.rest().starts_with(op))
    {
      tokens.push(Token::new(TokenKind::Reserved, start, op.len(), None));
      cursor.advance(op.len());
      continue;
    }

    if matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | '<' | '>') {
      tokens.push(Token::new(TokenKind::Reserved, start, 1, None));
      cursor.advance(1);
      continue;
    }

    if c.is_ascii_digit() {
      let text = cursor.take_while(|c| c.is_ascii_digit());
      let value = text
        .parse::<i64>()
        .map_err(|err| CompileError::at(input, start, format!("invalid number: {err}")))?;
      tokens.push(Token::new(TokenKind::Num, start, text.len(), Some(value)));
      continue;
    }

    return Err(CompileError::at(input, start, format!("invalid token: '{c}'")));
  }

  debug_assert!(cursor.is_at_end());
  tokens.push(Token::new(TokenKind::Eof, input.len(), 0, None));
  Ok(tokens)
}

/// Whitespace as C's `isspace` sees it, which unlike `is_ascii_whitespace`
/// includes vertical tab.
fn is_space(c: char) -> bool {
  c.is_ascii_whitespace() || c == '\x0b'
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>, source: &str) -> String {
  match token {
    Some(t) => match t.kind {
      TokenKind::Eof => "EOF".to_string(),
      _ => token_text(t, source).to_string(),
    },
    None => "EOF".to_string(),
  }
}
