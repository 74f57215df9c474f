//! Compact s-expression rendering used by `Debug`.
//!
//! Named parameters print by name; unnamed ones (typically lowering
//! temporaries) print as `$0`, `$1`, ... in order of first appearance.
//! Printing holds the traversal depth guard; subtrees past the limit print
//! as `...`.

use std::collections::HashMap;
use std::fmt::{self, Write};

use super::nodes::*;
use super::support::{BindingKind, ElementInit, MemberBinding};
use crate::stack;
use crate::types::Member;

struct Printer<'a, 'b> {
    out: &'a mut fmt::Formatter<'b>,
    unnamed: HashMap<usize, usize>,
}

impl Printer<'_, '_> {
    fn param(&mut self, e: &Expr, p: &ParameterNode) -> fmt::Result {
        match &p.name {
            Some(n) => self.out.write_str(n),
            None => {
                let next = self.unnamed.len();
                let n = *self.unnamed.entry(e.addr()).or_insert(next);
                write!(self.out, "${}", n)
            }
        }
    }

    fn list(&mut self, items: &[Expr]) -> fmt::Result {
        for (i, e) in items.iter().enumerate() {
            if i > 0 {
                self.out.write_char(' ')?;
            }
            self.expr(e)?;
        }
        Ok(())
    }

    fn tail(&mut self, items: &[Expr]) -> fmt::Result {
        for e in items {
            self.out.write_char(' ')?;
            self.expr(e)?;
        }
        Ok(())
    }

    fn opt(&mut self, e: Option<&Expr>) -> fmt::Result {
        if let Some(e) = e {
            self.out.write_char(' ')?;
            self.expr(e)?;
        }
        Ok(())
    }

    fn receiver(&mut self, object: Option<&Expr>, member: &Member) -> fmt::Result {
        match object {
            Some(o) => self.expr(o)?,
            None => write!(self.out, "{}", member.declaring_type())?,
        }
        write!(self.out, ".{}", member.name())
    }

    fn init(&mut self, init: &ElementInit) -> fmt::Result {
        write!(self.out, "({}", init.add_method().name())?;
        self.tail(init.arguments())?;
        self.out.write_char(')')
    }

    fn binding(&mut self, b: &MemberBinding) -> fmt::Result {
        write!(self.out, "({}", b.member().name())?;
        match b.kind() {
            BindingKind::Assignment(e) => self.opt(Some(e))?,
            BindingKind::MemberBindings(bs) => {
                for b in bs {
                    self.out.write_char(' ')?;
                    self.binding(b)?;
                }
            }
            BindingKind::ListBindings(inits) => {
                for i in inits {
                    self.out.write_char(' ')?;
                    self.init(i)?;
                }
            }
        }
        self.out.write_char(')')
    }

    fn expr(&mut self, e: &Expr) -> fmt::Result {
        let Ok(_guard) = stack::enter() else {
            return self.out.write_str("...");
        };
        self.node(e)
    }

    fn node(&mut self, e: &Expr) -> fmt::Result {
        let tag = e.node_type();
        match e.kind() {
            ExprKind::Parameter(p) => self.param(e, p),
            ExprKind::Constant(c) => write!(self.out, "{:?}", c.value),
            ExprKind::Default if e.ty().is_void() => self.out.write_str("(Empty)"),
            ExprKind::Default => write!(self.out, "(Default {})", e.ty()),
            ExprKind::Binary(b) => {
                write!(self.out, "({:?} ", tag)?;
                self.expr(&b.left)?;
                self.out.write_char(' ')?;
                self.expr(&b.right)?;
                self.out.write_char(')')
            }
            ExprKind::Unary(u) => {
                write!(self.out, "({:?}", tag)?;
                self.opt(u.operand.as_ref())?;
                if matches!(
                    tag,
                    NodeType::Convert | NodeType::ConvertChecked | NodeType::TypeAs | NodeType::Unbox
                ) {
                    write!(self.out, " {}", e.ty())?;
                }
                self.out.write_char(')')
            }
            ExprKind::TypeBinary(t) => {
                write!(self.out, "({:?} ", tag)?;
                self.expr(&t.expression)?;
                write!(self.out, " {})", t.type_operand)
            }
            ExprKind::Conditional(c) => {
                self.out.write_str("(Conditional ")?;
                self.expr(&c.test)?;
                self.out.write_char(' ')?;
                self.expr(&c.if_true)?;
                self.out.write_char(' ')?;
                self.expr(&c.if_false)?;
                self.out.write_char(')')
            }
            ExprKind::Block(b) => {
                self.out.write_str("(Block")?;
                if !b.variables.is_empty() {
                    self.out.write_str(" [")?;
                    self.list(&b.variables)?;
                    self.out.write_char(']')?;
                }
                self.tail(&b.expressions)?;
                self.out.write_char(')')
            }
            ExprKind::Call(c) => {
                self.out.write_str("(Call ")?;
                match &c.object {
                    Some(o) => self.expr(o)?,
                    None => write!(self.out, "{}", c.method.declaring_type())?,
                }
                write!(self.out, ".{}", c.method.name())?;
                self.tail(&c.arguments)?;
                self.out.write_char(')')
            }
            ExprKind::Member(m) => self.receiver(m.expression.as_ref(), &m.member),
            ExprKind::Index(i) => {
                self.expr(&i.object)?;
                self.out.write_char('[')?;
                self.list(&i.arguments)?;
                self.out.write_char(']')
            }
            ExprKind::Invoke(i) => {
                self.out.write_str("(Invoke ")?;
                self.expr(&i.expression)?;
                self.tail(&i.arguments)?;
                self.out.write_char(')')
            }
            ExprKind::Lambda(l) => {
                self.out.write_str("(Lambda [")?;
                self.list(&l.parameters)?;
                self.out.write_str("] ")?;
                self.expr(&l.body)?;
                self.out.write_char(')')
            }
            ExprKind::Loop(l) => {
                self.out.write_str("(Loop ")?;
                self.expr(&l.body)?;
                self.out.write_char(')')
            }
            ExprKind::Goto(g) => {
                write!(self.out, "({:?} {:?}", g.kind, g.target)?;
                self.opt(g.value.as_ref())?;
                self.out.write_char(')')
            }
            ExprKind::Label(l) => {
                write!(self.out, "(Label {:?}", l.target)?;
                self.opt(l.default_value.as_ref())?;
                self.out.write_char(')')
            }
            ExprKind::Switch(s) => {
                self.out.write_str("(Switch ")?;
                self.expr(&s.switch_value)?;
                for c in &s.cases {
                    self.out.write_str(" (Case [")?;
                    self.list(c.test_values())?;
                    self.out.write_str("] ")?;
                    self.expr(c.body())?;
                    self.out.write_char(')')?;
                }
                self.opt(s.default_body.as_ref())?;
                self.out.write_char(')')
            }
            ExprKind::Try(t) => {
                self.out.write_str("(Try ")?;
                self.expr(&t.body)?;
                for h in &t.handlers {
                    write!(self.out, " (Catch {}", h.test())?;
                    self.opt(h.variable())?;
                    self.opt(h.filter())?;
                    self.out.write_char(' ')?;
                    self.expr(h.body())?;
                    self.out.write_char(')')?;
                }
                if let Some(f) = &t.finally {
                    self.out.write_str(" (Finally ")?;
                    self.expr(f)?;
                    self.out.write_char(')')?;
                }
                if let Some(f) = &t.fault {
                    self.out.write_str(" (Fault ")?;
                    self.expr(f)?;
                    self.out.write_char(')')?;
                }
                self.out.write_char(')')
            }
            ExprKind::New(n) => {
                write!(self.out, "(New {}", e.ty())?;
                self.tail(&n.arguments)?;
                self.out.write_char(')')
            }
            ExprKind::NewArray(n) => {
                write!(self.out, "({:?} {}", tag, e.ty())?;
                self.tail(&n.expressions)?;
                self.out.write_char(')')
            }
            ExprKind::ListInit(l) => {
                self.out.write_str("(ListInit ")?;
                self.expr(&l.new_expression)?;
                for i in &l.initializers {
                    self.out.write_char(' ')?;
                    self.init(i)?;
                }
                self.out.write_char(')')
            }
            ExprKind::MemberInit(m) => {
                self.out.write_str("(MemberInit ")?;
                self.expr(&m.new_expression)?;
                for b in &m.bindings {
                    self.out.write_char(' ')?;
                    self.binding(b)?;
                }
                self.out.write_char(')')
            }
            ExprKind::Dynamic(d) => {
                write!(self.out, "(Dynamic {}", d.binder.describe())?;
                self.tail(&d.arguments)?;
                self.out.write_char(')')
            }
            ExprKind::RuntimeVariables(r) => {
                self.out.write_str("(RuntimeVariables")?;
                self.tail(&r.variables)?;
                self.out.write_char(')')
            }
            ExprKind::DebugInfo(d) if d.is_clear() => {
                write!(self.out, "(DebugInfo {:?} clear)", d.document)
            }
            ExprKind::DebugInfo(d) => write!(
                self.out,
                "(DebugInfo {:?} {}:{}-{}:{})",
                d.document, d.start_line, d.start_column, d.end_line, d.end_column
            ),
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer {
            out: f,
            unnamed: HashMap::new(),
        }
        .expr(self)
    }
}
