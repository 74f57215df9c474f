//! Structural fingerprints of expression trees.
//!
//! A fingerprint is a BLAKE3 hash of a canonical serialization of the
//! tree. Parameters and labels are replaced by their order of first
//! appearance, so two trees that differ only in the names (or identities)
//! of their variables and labels get the same fingerprint. Anything else
//! changes it: node kinds, types, constants, members, operator methods.
//!
//! Backends use it as a cache key for compiled output.
//!
//! Host objects inside constants are serialized by address, so their
//! fingerprints are only stable within one process.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::stack;
use crate::tree::{
    BindingKind, CatchBlock, ElementInit, Expr, ExprKind, GotoKind, LabelTarget, MemberBinding,
    SwitchCase, Value,
};
use crate::types::{Member, Method, Type};
use crate::visit::{walk, Visitor};

// ─── Serialization tags ────────────────────────────────────────────

const FORMAT_VERSION: u8 = 1;

const TAG_END: u8 = 0xFF;
const TAG_LABEL: u8 = 0xF0;
const TAG_CASE: u8 = 0xF1;
const TAG_CATCH: u8 = 0xF2;
const TAG_ELEMENT_INIT: u8 = 0xF3;
const TAG_BINDING: u8 = 0xF4;
const TAG_NONE: u8 = 0xF5;
const TAG_SOME: u8 = 0xF6;

// ─── Fingerprint ───────────────────────────────────────────────────

/// A 256-bit BLAKE3 hash of a tree's shape.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Display as full hex.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Display as short base-32 (8 characters, 40 bits).
    pub fn to_short(&self) -> String {
        const ALPHABET: &[u8] = b"0123456789abcdefghjkmnpqrstuvwxyz";
        let val = u64::from_be_bytes([
            0, 0, 0, self.0[0], self.0[1], self.0[2], self.0[3], self.0[4],
        ]);
        (0..8)
            .rev()
            .map(|i| ALPHABET[((val >> (i * 5)) & 0x1F) as usize] as char)
            .collect()
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.to_short())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.to_short())
    }
}

// ─── Serializer ────────────────────────────────────────────────────

/// Writes the canonical byte form of a tree as it is walked.
struct Serializer {
    buf: Vec<u8>,
    /// Parameter node -> index of first appearance.
    params: HashMap<Expr, u32>,
    /// Labels in order of first appearance.
    labels: Vec<LabelTarget>,
}

impl Serializer {
    fn new() -> Self {
        Serializer {
            buf: vec![FORMAT_VERSION],
            params: HashMap::new(),
            labels: Vec::new(),
        }
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_len(&mut self, n: usize) {
        self.write_u32(n as u32);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(v as u8);
    }

    fn write_str(&mut self, s: &str) {
        self.write_len(s.len());
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn write_opt_str(&mut self, s: Option<&str>) {
        match s {
            Some(s) => {
                self.write_u8(TAG_SOME);
                self.write_str(s);
            }
            None => self.write_u8(TAG_NONE),
        }
    }

    fn write_type(&mut self, ty: &Type) {
        self.write_str(&ty.to_string());
    }

    fn write_types(&mut self, tys: &[Type]) {
        self.write_len(tys.len());
        for ty in tys {
            self.write_type(ty);
        }
    }

    fn write_method(&mut self, m: &Method) {
        self.write_type(m.declaring_type());
        self.write_str(m.name());
        self.write_types(m.params());
        self.write_type(m.return_type());
    }

    fn write_opt_method(&mut self, m: Option<&Method>) {
        match m {
            Some(m) => {
                self.write_u8(TAG_SOME);
                self.write_method(m);
            }
            None => self.write_u8(TAG_NONE),
        }
    }

    fn write_member(&mut self, m: &Member) {
        self.write_type(m.declaring_type());
        self.write_str(m.name());
        self.write_bool(matches!(m, Member::Property(_)));
    }

    fn write_label(&mut self, target: &LabelTarget) {
        let index = match self.labels.iter().position(|l| l == target) {
            Some(i) => i,
            None => {
                self.labels.push(target.clone());
                self.labels.len() - 1
            }
        };
        self.write_u8(TAG_LABEL);
        self.write_len(index);
        self.write_type(target.ty());
    }

    fn write_value(&mut self, v: &Value) {
        match v {
            Value::Null => self.write_u8(0),
            Value::Bool(b) => {
                self.write_u8(1);
                self.write_bool(*b);
            }
            Value::Char(c) => {
                self.write_u8(2);
                self.write_u32(*c as u32);
            }
            Value::I8(n) => {
                self.write_u8(3);
                self.write_u64(*n as i64 as u64);
            }
            Value::U8(n) => {
                self.write_u8(4);
                self.write_u64(*n as u64);
            }
            Value::I16(n) => {
                self.write_u8(5);
                self.write_u64(*n as i64 as u64);
            }
            Value::U16(n) => {
                self.write_u8(6);
                self.write_u64(*n as u64);
            }
            Value::I32(n) => {
                self.write_u8(7);
                self.write_u64(*n as i64 as u64);
            }
            Value::U32(n) => {
                self.write_u8(8);
                self.write_u64(*n as u64);
            }
            Value::I64(n) => {
                self.write_u8(9);
                self.write_u64(*n as u64);
            }
            Value::U64(n) => {
                self.write_u8(10);
                self.write_u64(*n);
            }
            Value::F32(x) => {
                self.write_u8(11);
                self.write_u32(x.to_bits());
            }
            Value::F64(x) => {
                self.write_u8(12);
                self.write_u64(x.to_bits());
            }
            Value::Str(s) => {
                self.write_u8(13);
                self.write_str(s);
            }
            Value::Type(t) => {
                self.write_u8(14);
                self.write_type(t);
            }
            Value::Object(o) => {
                self.write_u8(15);
                self.write_type(&o.ty);
                self.write_u64(Arc::as_ptr(&o.value) as *const () as usize as u64);
            }
        }
    }

    /// Kind-specific data that is not a child node.
    fn write_payload(&mut self, node: &Expr) {
        match node.kind() {
            ExprKind::Constant(c) => self.write_value(&c.value),
            ExprKind::Default => {}
            ExprKind::Parameter(p) => {
                let next = self.params.len() as u32;
                let index = *self.params.entry(node.clone()).or_insert(next);
                self.write_u32(index);
                self.write_bool(p.is_by_ref);
            }
            ExprKind::Binary(b) => {
                self.write_opt_method(b.method.as_ref());
                self.write_bool(node.is_lifted_to_null());
                self.write_bool(b.conversion.is_some());
            }
            ExprKind::Unary(u) => {
                self.write_opt_method(u.method.as_ref());
                self.write_bool(u.operand.is_some());
            }
            ExprKind::TypeBinary(t) => self.write_type(&t.type_operand),
            ExprKind::Block(b) => self.write_len(b.variables.len()),
            ExprKind::Call(c) => {
                self.write_method(&c.method);
                self.write_bool(c.object.is_some());
            }
            ExprKind::Member(m) => self.write_member(&m.member),
            ExprKind::Index(i) => match &i.indexer {
                Some(p) => {
                    self.write_u8(TAG_SOME);
                    self.write_member(&Member::Property(p.clone()));
                }
                None => self.write_u8(TAG_NONE),
            },
            ExprKind::Lambda(l) => {
                self.write_opt_str(l.name.as_deref());
                self.write_bool(l.tail_call);
                self.write_len(l.parameters.len());
            }
            ExprKind::Loop(l) => {
                self.write_bool(l.break_label.is_some());
                self.write_bool(l.continue_label.is_some());
            }
            ExprKind::Goto(g) => self.write_u8(match g.kind {
                GotoKind::Goto => 0,
                GotoKind::Return => 1,
                GotoKind::Break => 2,
                GotoKind::Continue => 3,
            }),
            ExprKind::Switch(s) => {
                self.write_opt_method(s.comparison.as_ref());
                self.write_len(s.cases.len());
            }
            ExprKind::Try(t) => {
                self.write_len(t.handlers.len());
                self.write_bool(t.finally.is_some());
                self.write_bool(t.fault.is_some());
            }
            ExprKind::New(n) => {
                match &n.constructor {
                    Some(c) => {
                        self.write_u8(TAG_SOME);
                        self.write_types(c.params());
                    }
                    None => self.write_u8(TAG_NONE),
                }
                if let Some(members) = &n.members {
                    for m in members {
                        self.write_member(m);
                    }
                }
            }
            ExprKind::Dynamic(d) => {
                self.write_str(&d.binder.describe());
                self.write_type(&d.delegate_type);
            }
            ExprKind::DebugInfo(d) => {
                self.write_str(d.document.file_name());
                self.write_opt_str(d.document.language());
                for n in [d.start_line, d.start_column, d.end_line, d.end_column] {
                    self.write_u32(n);
                }
            }
            ExprKind::Conditional(_)
            | ExprKind::Invoke(_)
            | ExprKind::Label(_)
            | ExprKind::NewArray(_)
            | ExprKind::ListInit(_)
            | ExprKind::MemberInit(_)
            | ExprKind::RuntimeVariables(_) => {}
        }
    }
}

impl Visitor for Serializer {
    fn enter(&mut self, node: &Expr) -> Result<bool> {
        self.write_u8(node.node_type() as u8);
        self.write_type(node.ty());
        self.write_payload(node);
        Ok(true)
    }

    fn leave(&mut self, _node: &Expr) -> Result<()> {
        self.write_u8(TAG_END);
        Ok(())
    }

    fn label_target(&mut self, target: &LabelTarget) -> Result<()> {
        self.write_label(target);
        Ok(())
    }

    fn switch_case(&mut self, case: &SwitchCase) -> Result<()> {
        self.write_u8(TAG_CASE);
        self.write_len(case.test_values().len());
        Ok(())
    }

    fn catch_block(&mut self, handler: &CatchBlock) -> Result<()> {
        self.write_u8(TAG_CATCH);
        self.write_type(handler.test());
        self.write_bool(handler.variable().is_some());
        self.write_bool(handler.filter().is_some());
        Ok(())
    }

    fn element_init(&mut self, init: &ElementInit) -> Result<()> {
        self.write_u8(TAG_ELEMENT_INIT);
        self.write_method(init.add_method());
        self.write_len(init.arguments().len());
        Ok(())
    }

    fn member_binding(&mut self, binding: &MemberBinding) -> Result<()> {
        self.write_u8(TAG_BINDING);
        self.write_member(binding.member());
        match binding.kind() {
            BindingKind::Assignment(_) => self.write_u8(0),
            BindingKind::MemberBindings(bs) => {
                self.write_u8(1);
                self.write_len(bs.len());
            }
            BindingKind::ListBindings(is) => {
                self.write_u8(2);
                self.write_len(is.len());
            }
        }
        Ok(())
    }
}

/// Canonical bytes of `node`; what [`fingerprint`] hashes.
pub fn canonical_bytes(node: &Expr) -> Result<Vec<u8>> {
    stack::retry_on_fresh_stack(|| {
        let mut s = Serializer::new();
        walk(&mut s, node)?;
        Ok(s.buf)
    })
}

/// BLAKE3 fingerprint of `node`, invariant under renaming of parameters
/// and labels.
pub fn fingerprint(node: &Expr) -> Result<Fingerprint> {
    let bytes = canonical_bytes(node)?;
    Ok(Fingerprint(*blake3::hash(&bytes).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(ty: &Type, name: &str) -> Expr {
        Expr::parameter(ty, Some(name)).unwrap()
    }

    fn adder(a: &str, b: &str) -> Expr {
        let x = param(&Type::i32(), a);
        let y = param(&Type::i32(), b);
        Expr::lambda_of(&Expr::add(&x, &y).unwrap(), &[x, y]).unwrap()
    }

    #[test]
    fn test_renaming_keeps_fingerprint() {
        assert_eq!(
            fingerprint(&adder("a", "b")).unwrap(),
            fingerprint(&adder("x", "y")).unwrap()
        );
    }

    #[test]
    fn test_parameter_order_matters() {
        let x = param(&Type::i32(), "x");
        let y = param(&Type::i32(), "y");
        let xy = Expr::lambda_of(&Expr::subtract(&x, &y).unwrap(), &[x.clone(), y.clone()]);
        let yx = Expr::lambda_of(&Expr::subtract(&y, &x).unwrap(), &[x, y]);
        assert_ne!(
            fingerprint(&xy.unwrap()).unwrap(),
            fingerprint(&yx.unwrap()).unwrap()
        );
    }

    #[test]
    fn test_constants_and_types_matter() {
        let one = fingerprint(&Expr::constant(1)).unwrap();
        assert_ne!(one, fingerprint(&Expr::constant(2)).unwrap());
        assert_ne!(one, fingerprint(&Expr::constant(1i64)).unwrap());
        assert_eq!(one, fingerprint(&Expr::constant(1)).unwrap());
    }

    #[test]
    fn test_labels_are_numbered() {
        let ret = |name: &str| {
            let target = Expr::label_target(&Type::i32(), Some(name)).unwrap();
            Expr::block(&[
                Expr::return_to(&target, Some(&Expr::constant(1))).unwrap(),
                Expr::label(&target, Some(&Expr::constant(0))).unwrap(),
            ])
            .unwrap()
        };
        assert_eq!(
            fingerprint(&ret("a")).unwrap(),
            fingerprint(&ret("b")).unwrap()
        );
    }

    #[test]
    fn test_display() {
        let fp = fingerprint(&adder("a", "b")).unwrap();
        assert_eq!(fp.to_hex().len(), 64);
        assert_eq!(fp.to_short().len(), 8);
        assert_eq!(format!("{}", fp), format!("#{}", fp.to_short()));
    }
}
