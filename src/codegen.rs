//! Code generation: lower the parsed AST into x86-64 assembly.
//!
//! The emitter is a plain stack machine. Every node leaves exactly one value
//! on the stack; a binary node pops its right operand into `rdi` and its left
//! operand into `rax`, combines them in `rax` and pushes the result. The
//! final value is popped into `rax` and returned from `main`.
//!
//! Both GNU dialects are supported; they differ only in operand order and
//! register/immediate sigils.

use std::fmt::Write;

use clap::ValueEnum;

use crate::parser::{AstNode, BinaryOp};

/// Assembler dialect of the emitted text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Syntax {
  /// `.intel_syntax noprefix`: destination first, bare registers.
  #[default]
  Intel,
  /// GNU AT&T: source first, `%` registers and `$` immediates.
  Att,
}

/// Emit assembly for a whole program returning the value of `node`.
pub fn generate(node: &AstNode, syntax: Syntax) -> String {
  let mut emitter = Emitter::new(syntax);

  if syntax == Syntax::Intel {
    emitter.directive(".intel_syntax noprefix");
  }
  emitter.directive(".global main");
  emitter.label("main");

  emitter.expr(node);

  emitter.pop("rax");
  emitter.insn("ret");

  emitter.asm
}

struct Emitter {
  asm: String,
  syntax: Syntax,
}

impl Emitter {
  fn new(syntax: Syntax) -> Self {
    Self {
      asm: String::new(),
      syntax,
    }
  }

  /// Post-order walk: operands first, then the operator.
  fn expr(&mut self, node: &AstNode) {
    match node {
      AstNode::Num { value } => self.push_imm(*value),
      AstNode::Binary { op, lhs, rhs, .. } => {
        self.expr(lhs);
        self.expr(rhs);
        self.pop("rdi");
        self.pop("rax");
        self.binary(*op);
        self.push("rax");
      }
    }
  }

  fn binary(&mut self, op: BinaryOp) {
    match op {
      BinaryOp::Add => self.op2("add", "rax", "rdi"),
      BinaryOp::Sub => self.op2("sub", "rax", "rdi"),
      BinaryOp::Mul => self.op2("imul", "rax", "rdi"),
      BinaryOp::Div => {
        self.insn("cqo");
        self.op1("idiv", "rdi");
      }
      BinaryOp::Eq => self.compare("sete"),
      BinaryOp::Ne => self.compare("setne"),
      BinaryOp::Lt => self.compare("setl"),
      BinaryOp::Le => self.compare("setle"),
    }
  }

  /// `rax = (rax <cc> rdi) as 0 or 1`.
  fn compare(&mut self, setcc: &str) {
    self.op2("cmp", "rax", "rdi");
    self.op1(setcc, "al");
    match self.syntax {
      Syntax::Intel => self.insn("movzb rax, al"),
      Syntax::Att => self.insn("movzbl %al, %eax"),
    }
  }

  fn push_imm(&mut self, value: i64) {
    if i32::try_from(value).is_ok() {
      match self.syntax {
        Syntax::Intel => self.insn(format_args!("push {value}")),
        Syntax::Att => self.insn(format_args!("push ${value}")),
      }
      return;
    }

    // push only takes a sign-extended 32-bit immediate.
    match self.syntax {
      Syntax::Intel => self.insn(format_args!("movabs rax, {value}")),
      Syntax::Att => self.insn(format_args!("movabs ${value}, %rax")),
    }
    self.push("rax");
  }

  fn push(&mut self, reg: &str) {
    self.op1("push", reg);
  }

  fn pop(&mut self, reg: &str) {
    self.op1("pop", reg);
  }

  fn op1(&mut self, mnemonic: &str, reg: &str) {
    match self.syntax {
      Syntax::Intel => self.insn(format_args!("{mnemonic} {reg}")),
      Syntax::Att => self.insn(format_args!("{mnemonic} %{reg}")),
    }
  }

  fn op2(&mut self, mnemonic: &str, dst: &str, src: &str) {
    match self.syntax {
      Syntax::Intel => self.insn(format_args!("{mnemonic} {dst}, {src}")),
      Syntax::Att => self.insn(format_args!("{mnemonic} %{src}, %{dst}")),
    }
  }

  fn insn(&mut self, text: impl std::fmt::Display) {
    // Writing into a String cannot fail.
    let _ = writeln!(self.asm, "    {text}");
  }

  fn directive(&mut self, text: &str) {
    self.asm.push_str(text);
    self.asm.push('\n');
  }

  fn label(&mut self, name: &str) {
    self.asm.push_str(name);
    self.asm.push_str(":\n");
  }
}
