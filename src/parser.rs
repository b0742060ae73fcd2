//! Recursive-descent parser producing an expression AST.
//!
//! One function per precedence level, loosest first:
//!
//! ```text
//! expr       = equality
//! equality   = relational ("==" relational | "!=" relational)*
//! relational = add ("<" add | "<=" add | ">" add | ">=" add)*
//! add        = mul ("+" mul | "-" mul)*
//! mul        = unary ("*" unary | "/" unary)*
//! unary      = ("+" | "-")? unary | primary
//! primary    = "(" expr ")" | num
//! ```
//!
//! `>` and `>=` are stored as `<` and `<=` with their operands swapped, and
//! unary minus becomes `0 - x`, so the tree only ever holds numbers and the
//! eight binary operators.

use std::fmt;

use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind, describe_token, token_text};

/// Deepest run of nested parentheses and unary operators the parser recurses into.
pub const MAX_NESTING: usize = 256;

/// Tallest tree accepted; later passes walk the tree recursively.
pub const MAX_TREE_DEPTH: usize = 4096;

/// Binary operators recognised by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Eq,
  Ne,
  Lt,
  Le,
}

impl BinaryOp {
  pub fn symbol(self) -> &'static str {
    match self {
      Self::Add => "+",
      Self::Sub => "-",
      Self::Mul => "*",
      Self::Div => "/",
      Self::Eq => "==",
      Self::Ne => "!=",
      Self::Lt => "<",
      Self::Le => "<=",
    }
  }
}

/// Expression tree produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
  Num {
    value: i64,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
    /// Height of this subtree, a leaf counting as 1.
    depth: usize,
  },
}

impl AstNode {
  pub fn number(value: i64) -> Self {
    Self::Num { value }
  }

  pub fn binary(op: BinaryOp, lhs: AstNode, rhs: AstNode) -> Self {
    let depth = lhs.depth().max(rhs.depth()) + 1;
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
      depth,
    }
  }

  pub fn depth(&self) -> usize {
    match self {
      Self::Num { .. } => 1,
      Self::Binary { depth, .. } => *depth,
    }
  }
}

/// Prints the tree as an S-expression, e.g. `(+ 1 (* 2 3))`.
impl fmt::Display for AstNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Num { value } => write!(f, "{value}"),
      Self::Binary { op, lhs, rhs, .. } => write!(f, "({} {lhs} {rhs})", op.symbol()),
    }
  }
}

/// Parse a single expression that must span the whole token stream.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<AstNode> {
  let mut stream = TokenStream::new(tokens, source);

  let node = parse_expr(&mut stream)?;

  if !stream.is_eof() {
    let (loc, got) = match stream.peek() {
      Some(token) => (token.loc, describe_token(Some(token), source)),
      None => (source.len(), "EOF".to_string()),
    };
    return Err(CompileError::at(
      source,
      loc,
      format!("unexpected token \"{got}\""),
    ));
  }

  Ok(node)
}

fn parse_expr(stream: &mut TokenStream) -> CompileResult<AstNode> {
  parse_equality(stream)
}

fn parse_equality(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_relational(stream)?;

  loop {
    let loc = stream.loc();
    if stream.consume("==") {
      let rhs = parse_relational(stream)?;
      node = stream.binary(loc, BinaryOp::Eq, node, rhs)?;
    } else if stream.consume("!=") {
      let rhs = parse_relational(stream)?;
      node = stream.binary(loc, BinaryOp::Ne, node, rhs)?;
    } else {
      return Ok(node);
    }
  }
}

fn parse_relational(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_add(stream)?;

  loop {
    let loc = stream.loc();
    if stream.consume("<") {
      let rhs = parse_add(stream)?;
      node = stream.binary(loc, BinaryOp::Lt, node, rhs)?;
    } else if stream.consume("<=") {
      let rhs = parse_add(stream)?;
      node = stream.binary(loc, BinaryOp::Le, node, rhs)?;
    } else if stream.consume(">") {
      let rhs = parse_add(stream)?;
      node = stream.binary(loc, BinaryOp::Lt, rhs, node)?;
    } else if stream.consume(">=") {
      let rhs = parse_add(stream)?;
      node = stream.binary(loc, BinaryOp::Le, rhs, node)?;
    } else {
      return Ok(node);
    }
  }
}

fn parse_add(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_mul(stream)?;

  loop {
    let loc = stream.loc();
    if stream.consume("+") {
      let rhs = parse_mul(stream)?;
      node = stream.binary(loc, BinaryOp::Add, node, rhs)?;
    } else if stream.consume("-") {
      let rhs = parse_mul(stream)?;
      node = stream.binary(loc, BinaryOp::Sub, node, rhs)?;
    } else {
      return Ok(node);
    }
  }
}

fn parse_mul(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_unary(stream)?;

  loop {
    let loc = stream.loc();
    if stream.consume("*") {
      let rhs = parse_unary(stream)?;
      node = stream.binary(loc, BinaryOp::Mul, node, rhs)?;
    } else if stream.consume("/") {
      let rhs = parse_unary(stream)?;
      node = stream.binary(loc, BinaryOp::Div, node, rhs)?;
    } else {
      return Ok(node);
    }
  }
}

fn parse_unary(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let loc = stream.loc();

  if stream.consume("+") {
    stream.enter(loc)?;
    let operand = parse_unary(stream)?;
    stream.leave();
    return Ok(operand);
  }

  if stream.consume("-") {
    stream.enter(loc)?;
    let operand = parse_unary(stream)?;
    stream.leave();
    return stream.binary(loc, BinaryOp::Sub, AstNode::number(0), operand);
  }

  parse_primary(stream)
}

fn parse_primary(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let loc = stream.loc();

  if stream.consume("(") {
    stream.enter(loc)?;
    let node = parse_expr(stream)?;
    stream.expect(")")?;
    stream.leave();
    return Ok(node);
  }

  let value = stream.expect_number()?;
  Ok(AstNode::number(value))
}

/// Forward-only cursor over the token vector.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
  nesting: usize,
}

impl<'a> TokenStream<'a> {
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
      nesting: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  /// Location of the current token, or the end of input once past it.
  fn loc(&self) -> usize {
    self.peek().map_or(self.source.len(), |token| token.loc)
  }

  fn at(&self, op: &str) -> bool {
    self.peek().is_some_and(|token| {
      token.kind == TokenKind::Reserved
        && token.len == op.len()
        && token_text(token, self.source) == op
    })
  }

  /// Consume the current token if it is exactly the operator `op`.
  fn consume(&mut self, op: &str) -> bool {
    if self.at(op) {
      self.pos += 1;
      return true;
    }
    false
  }

  fn expect(&mut self, op: &str) -> CompileResult<()> {
    if self.consume(op) {
      return Ok(());
    }

    let got = describe_token(self.peek(), self.source);
    Err(CompileError::at(
      self.source,
      self.loc(),
      format!("expected \"{op}\", but got \"{got}\""),
    ))
  }

  fn expect_number(&mut self) -> CompileResult<i64> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Num
      && let Some(value) = token.value
    {
      self.pos += 1;
      return Ok(value);
    }

    let got = describe_token(self.peek(), self.source);
    Err(CompileError::at(
      self.source,
      self.loc(),
      format!("expected a number, but got \"{got}\""),
    ))
  }

  fn is_eof(&self) -> bool {
    matches!(self.peek().map(|token| token.kind), Some(TokenKind::Eof))
  }

  /// Step one level deeper into a `(` or unary operator found at `loc`.
  fn enter(&mut self, loc: usize) -> CompileResult<()> {
    if self.nesting >= MAX_NESTING {
      return Err(CompileError::at(self.source, loc, "expression nested too deeply"));
    }
    self.nesting += 1;
    Ok(())
  }

  fn leave(&mut self) {
    self.nesting -= 1;
  }

  /// Build a binary node for the operator at `loc`, rejecting trees too tall to walk.
  fn binary(&self, loc: usize, op: BinaryOp, lhs: AstNode, rhs: AstNode) -> CompileResult<AstNode> {
    let node = AstNode::binary(op, lhs, rhs);
    if node.depth() > MAX_TREE_DEPTH {
      return Err(CompileError::at(self.source, loc, "expression nested too deeply"));
    }
    Ok(node)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::tokenizer::tokenize;

  fn parse_str(input: &str) -> CompileResult<AstNode> {
    parse(tokenize(input)?, input)
  }

  fn tree(input: &str) -> String {
    parse_str(input).expect("input should parse").to_string()
  }

  #[test]
  fn single_number() {
    assert_eq!(parse_str("42").unwrap(), AstNode::number(42));
  }

  #[test]
  fn multiplication_binds_tighter_than_addition() {
    assert_eq!(tree("1+2*3"), "(+ 1 (* 2 3))");
    assert_eq!(tree("1*2+3"), "(+ (* 1 2) 3)");
  }

  #[test]
  fn parentheses_override_precedence() {
    assert_eq!(tree("(1+2)*3"), "(* (+ 1 2) 3)");
    assert_eq!(tree("((((7))))"), "7");
  }

  #[test]
  fn same_level_operators_associate_left() {
    assert_eq!(tree("8-3-2"), "(- (- 8 3) 2)");
    assert_eq!(tree("8/4/2"), "(/ (/ 8 4) 2)");
    assert_eq!(tree("1==2!=3"), "(!= (== 1 2) 3)");
  }

  #[test]
  fn comparison_levels_nest() {
    assert_eq!(tree("1+1<3==1"), "(== (< (+ 1 1) 3) 1)");
  }

  #[test]
  fn unary_minus_is_zero_minus_operand() {
    assert_eq!(tree("-3+5"), "(+ (- 0 3) 5)");
    assert_eq!(tree("--4"), "(- 0 (- 0 4))");
    assert_eq!(tree("-(2*3)"), "(- 0 (* 2 3))");
  }

  #[test]
  fn unary_plus_is_dropped() {
    assert_eq!(tree("+5"), "5");
    assert_eq!(tree("+-+5"), "(- 0 5)");
  }

  #[test]
  fn greater_than_is_canonicalised_with_swapped_operands() {
    let input_expected = [
      ("2>3", "(< 3 2)"),
      ("2>=3", "(<= 3 2)"),
      ("2<3", "(< 2 3)"),
      ("2<=3", "(<= 2 3)"),
      ("1+1>2*2", "(< (* 2 2) (+ 1 1))"),
    ];

    for (input, expected) in input_expected {
      assert_eq!(tree(input), expected, "input: {input}");
    }
  }

  #[test]
  fn chained_greater_than_keeps_left_side_as_rhs() {
    assert_eq!(tree("3>2>1"), "(< 1 (< 2 3))");
  }

  #[test]
  fn malformed_inputs_point_at_first_offending_token() {
    let input_offsets = [
      ("1+", 2, "expected a number, but got \"EOF\""),
      ("(1+2", 4, "expected \")\", but got \"EOF\""),
      ("*3", 0, "expected a number, but got \"*\""),
      ("", 0, "expected a number, but got \"EOF\""),
      ("1 2", 2, "unexpected token \"2\""),
      ("(1))", 3, "unexpected token \")\""),
      ("()", 1, "expected a number, but got \")\""),
      ("1 < < 2", 4, "expected a number, but got \"<\""),
    ];

    for (input, offset, message) in input_offsets {
      let err = parse_str(input).unwrap_err();
      assert_eq!(err.offset(), offset, "input: {input:?}");
      assert_eq!(err.message(), message, "input: {input:?}");
    }
  }

  #[test]
  fn nesting_up_to_the_limit_parses() {
    let input = format!("{}1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));

    assert_eq!(parse_str(&input).unwrap(), AstNode::number(1));
  }

  #[test]
  fn parentheses_nested_past_the_limit_are_rejected() {
    let input = format!("{}1{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
    let err = parse_str(&input).unwrap_err();

    assert_eq!(err.message(), "expression nested too deeply");
    assert_eq!(err.offset(), MAX_NESTING);
  }

  #[test]
  fn unary_chain_past_the_limit_is_rejected() {
    let input = format!("{}1", "-".repeat(MAX_NESTING * 4));
    let err = parse_str(&input).unwrap_err();

    assert_eq!(err.message(), "expression nested too deeply");
    assert_eq!(err.offset(), MAX_NESTING);
  }

  #[test]
  fn long_operator_chain_is_bounded_by_tree_depth() {
    let ok = format!("1{}", "+1".repeat(MAX_TREE_DEPTH - 1));
    assert_eq!(parse_str(&ok).unwrap().depth(), MAX_TREE_DEPTH);

    let too_long = format!("1{}", "+1".repeat(MAX_TREE_DEPTH));
    let err = parse_str(&too_long).unwrap_err();
    assert_eq!(err.message(), "expression nested too deeply");
    assert_eq!(err.offset(), 2 * MAX_TREE_DEPTH - 1);
  }

  #[test]
  fn depth_counts_the_tallest_branch() {
    let node = parse_str("1+(2*(3-4))").unwrap();

    assert_eq!(node.depth(), 4);
    assert_eq!(AstNode::number(7).depth(), 1);
  }

  #[test]
  fn consume_compares_the_whole_lexeme() {
    let source = "<=";
    let mut stream = TokenStream::new(tokenize(source).unwrap(), source);

    assert!(!stream.consume("<"));
    assert_eq!(stream.pos, 0);
    assert!(stream.consume("<="));
    assert!(stream.is_eof());
  }

  #[test]
  fn expect_leaves_cursor_on_mismatch() {
    let source = "5";
    let mut stream = TokenStream::new(tokenize(source).unwrap(), source);

    assert!(stream.expect(")").is_err());
    assert_eq!(stream.pos, 0);
    assert_eq!(stream.expect_number().unwrap(), 5);
  }
}
