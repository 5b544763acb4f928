//! Render lowered modules back to Wabbit-like source text.
//!
//! The operand stack is replayed symbolically: each push becomes an
//! expression string and each consuming instruction becomes a statement.
//! Binary operations are always parenthesized. Bool and char constants have
//! already been lowered to integers, so they print as their codes.
//!
//! The result is meant for reading lowered code; it is not re-checked.

use std::fmt::Write as _;

use wabbit_core::RuntimeError;

use super::{Cmp, Instruction, IrFunction, IrModule};

const INDENT: &str = "    ";

/// Render a whole module: globals, functions, then the entry statements at
/// the top level.
pub fn render_module(module: &IrModule) -> Result<String, RuntimeError> {
    let mut out = String::new();
    for global in &module.globals {
        let keyword = if global.mutable { "var" } else { "const" };
        let _ = writeln!(
            out,
            "{keyword} {} {} = {};",
            ident(&global.name),
            global.ty,
            global.init
        );
    }

    for func in module.functions.iter().filter(|f| f.name != module.entry) {
        out.push_str(&render_function(func)?);
    }
    if let Some(entry) = module.entry_function() {
        out.push_str(&render_body(entry, 0)?);
    }
    Ok(out)
}

/// Render one function as a `func` definition.
pub fn render_function(func: &IrFunction) -> Result<String, RuntimeError> {
    let params = func
        .params
        .iter()
        .map(|param| format!("{} {}", ident(&param.name), param.ty))
        .collect::<Vec<_>>()
        .join(", ");
    let mut out = format!("func {}({params})", ident(&func.name));
    if let Some(result) = func.result {
        let _ = write!(out, " {result}");
    }
    out.push_str(" {\n");
    out.push_str(&render_body(func, 1)?);
    out.push_str("}\n");
    Ok(out)
}

fn render_body(func: &IrFunction, depth: usize) -> Result<String, RuntimeError> {
    let mut renderer = Renderer::new(func, depth);
    for local in &func.locals {
        renderer.line(format!("var {} {};", ident(&local.name), local.ty));
    }
    for instr in &func.body {
        renderer.step(instr)?;
    }
    renderer.finish()
}

/// Lowered slot names may contain `.`; source identifiers cannot.
fn ident(name: &str) -> String {
    name.replace('.', "_")
}

fn cmp_symbol(cmp: Cmp) -> &'static str {
    match cmp {
        Cmp::Eq => "==",
        Cmp::Ne => "!=",
        Cmp::Lt => "<",
        Cmp::Le => "<=",
        Cmp::Gt => ">",
        Cmp::Ge => ">=",
    }
}

enum Block {
    If,
    Loop { header: usize, body_start: usize },
}

struct Renderer<'f> {
    func: &'f IrFunction,
    stack: Vec<String>,
    lines: Vec<String>,
    blocks: Vec<Block>,
    depth: usize,
}

impl<'f> Renderer<'f> {
    fn new(func: &'f IrFunction, depth: usize) -> Self {
        Self {
            func,
            stack: Vec::new(),
            lines: Vec::new(),
            blocks: Vec::new(),
            depth,
        }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        self.lines
            .push(format!("{}{}", INDENT.repeat(self.depth), text.as_ref()));
    }

    fn pop(&mut self, instr: &Instruction) -> Result<String, RuntimeError> {
        self.stack.pop().ok_or_else(|| RuntimeError::StackUnderflow {
            function: self.func.name.clone(),
            instruction: instr.to_string(),
        })
    }

    fn binary(&mut self, instr: &Instruction, op: &str) -> Result<(), RuntimeError> {
        let right = self.pop(instr)?;
        let left = self.pop(instr)?;
        self.stack.push(format!("({left} {op} {right})"));
        Ok(())
    }

    fn unary(
        &mut self,
        instr: &Instruction,
        render: impl FnOnce(String) -> String,
    ) -> Result<(), RuntimeError> {
        let operand = self.pop(instr)?;
        self.stack.push(render(operand));
        Ok(())
    }

    fn unbalanced(&self, detail: &'static str) -> RuntimeError {
        RuntimeError::UnbalancedControl {
            function: self.func.name.clone(),
            detail,
        }
    }

    fn close(&mut self, expect_loop: bool) -> Result<(), RuntimeError> {
        match self.blocks.pop() {
            Some(Block::Loop { .. }) if expect_loop => {}
            Some(Block::If) if !expect_loop => {}
            _ => return Err(self.unbalanced("mismatched block end")),
        }
        self.depth -= 1;
        self.line("}");
        Ok(())
    }

    /// A loop whose first statement is a negated exit test reads back as a
    /// `while` with that test.
    fn break_if(&mut self, test: String) -> Result<(), RuntimeError> {
        let Some((header, body_start)) = self.blocks.iter().rev().find_map(|block| match block {
            Block::Loop { header, body_start } => Some((*header, *body_start)),
            Block::If => None,
        }) else {
            return Err(self.unbalanced("branch outside a loop"));
        };
        let innermost = matches!(self.blocks.last(), Some(Block::Loop { .. }));

        match test.strip_prefix('!') {
            Some(inner) if innermost && body_start == self.lines.len() => {
                let indent = INDENT.repeat(self.depth - 1);
                self.lines[header] = format!("{indent}while {inner} {{");
            }
            _ => self.line(format!("if {test} {{ break; }}")),
        }
        Ok(())
    }

    fn step(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        use Instruction::*;
        match instr {
            ConstI32(v) => self.stack.push(v.to_string()),
            ConstF64(v) => self.stack.push(format!("{:?}", v.0)),
            Load(name) => self.stack.push(ident(name)),
            Store(name) => {
                let value = self.pop(instr)?;
                self.line(format!("{} = {value};", ident(name)));
            }
            LoadMem => self.unary(instr, |address| format!("`{address}"))?,
            StoreMem => {
                let value = self.pop(instr)?;
                let address = self.pop(instr)?;
                self.line(format!("`{address} = {value};"));
            }
            GrowMem => self.unary(instr, |pages| format!("^{pages}"))?,

            AddI | AddF => self.binary(instr, "+")?,
            SubI | SubF => self.binary(instr, "-")?,
            MulI | MulF => self.binary(instr, "*")?,
            DivI | DivF => self.binary(instr, "/")?,
            NegF => self.unary(instr, |operand| format!("-{operand}"))?,
            CmpI(cmp) | CmpF(cmp) => self.binary(instr, cmp_symbol(*cmp))?,
            And => self.binary(instr, "&&")?,
            Or => self.binary(instr, "||")?,
            Eqz => self.unary(instr, |operand| format!("!{operand}"))?,
            IntToFloat => self.unary(instr, |operand| format!("float({operand})"))?,
            FloatToInt => self.unary(instr, |operand| format!("int({operand})"))?,

            Print(_) => {
                let value = self.pop(instr)?;
                self.line(format!("print {value};"));
            }
            Call {
                name,
                params,
                results,
            } => {
                let count = *params as usize;
                let Some(split) = self.stack.len().checked_sub(count) else {
                    return Err(RuntimeError::StackUnderflow {
                        function: self.func.name.clone(),
                        instruction: instr.to_string(),
                    });
                };
                let args = self.stack.split_off(split).join(", ");
                let call = format!("{}({args})", ident(name));
                if *results == 0 {
                    self.line(format!("{call};"));
                } else {
                    self.stack.push(call);
                }
            }
            Return => {
                if self.func.result.is_some() {
                    let value = self.pop(instr)?;
                    self.line(format!("return {value};"));
                } else {
                    self.line("return;");
                }
            }
            Drop => {
                let value = self.pop(instr)?;
                self.line(format!("{value};"));
            }
            Unreachable => {}

            If => {
                let test = self.pop(instr)?;
                self.line(format!("if {test} {{"));
                self.blocks.push(Block::If);
                self.depth += 1;
            }
            Else => {
                if !matches!(self.blocks.last(), Some(Block::If)) {
                    return Err(self.unbalanced("else without if"));
                }
                self.depth -= 1;
                self.line("} else {");
                self.depth += 1;
            }
            EndIf => self.close(false)?,
            Loop => {
                let header = self.lines.len();
                self.line("while true {");
                self.blocks.push(Block::Loop {
                    header,
                    body_start: header + 1,
                });
                self.depth += 1;
            }
            EndLoop => self.close(true)?,
            BreakIf => {
                let test = self.pop(instr)?;
                self.break_if(test)?;
            }
            Break | Continue => {
                if !self.blocks.iter().any(|b| matches!(b, Block::Loop { .. })) {
                    return Err(self.unbalanced("branch outside a loop"));
                }
                self.line(if *instr == Break { "break;" } else { "continue;" });
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<String, RuntimeError> {
        if !self.blocks.is_empty() {
            return Err(self.unbalanced("unclosed block"));
        }
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        Ok(out)
    }
}
