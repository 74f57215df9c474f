//! Satellite records referenced by nodes: child lists, labels, switch
//! cases, catch handlers, initializers, member bindings, constant values.
//!
//! None of these are nodes themselves. Like nodes they are immutable and
//! compare by identity.

use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::types::{Member, Method, Primitive, Type};

use super::Expr;

// ─── Identity ──────────────────────────────────────────────────────

/// Reference identity, the equality the rewrite protocol uses to decide
/// whether anything changed.
pub trait Identity {
    fn same(&self, other: &Self) -> bool;
}

macro_rules! arc_identity {
    ($name:ident) => {
        impl Identity for $name {
            fn same(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }
        }

        impl Eq for $name {}
    };
}
pub(crate) use arc_identity;

impl Identity for Member {
    fn same(&self, other: &Self) -> bool {
        self == other
    }
}

// ─── NodeList ──────────────────────────────────────────────────────

/// An ordered, read-only, indexable list of children.
///
/// Indexing out of range panics.
pub struct NodeList<T>(Arc<[T]>);

pub type ExprList = NodeList<Expr>;

impl<T> NodeList<T> {
    pub fn new(items: Vec<T>) -> Self {
        NodeList(items.into())
    }

    pub fn empty() -> Self {
        NodeList(Vec::new().into())
    }

    /// Same backing storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Identity> NodeList<T> {
    /// True when `items` are exactly the current children, element by
    /// element, by identity.
    pub fn same_items(&self, items: &[T]) -> bool {
        self.0.len() == items.len() && self.0.iter().zip(items).all(|(a, b)| a.same(b))
    }
}

impl<T> Clone for NodeList<T> {
    fn clone(&self) -> Self {
        NodeList(self.0.clone())
    }
}

impl<T> Deref for NodeList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> From<Vec<T>> for NodeList<T> {
    fn from(items: Vec<T>) -> Self {
        NodeList::new(items)
    }
}

impl<T> FromIterator<T> for NodeList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        NodeList(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a NodeList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

// ─── LabelTarget ───────────────────────────────────────────────────

struct LabelData {
    name: Option<Arc<str>>,
    ty: Type,
}

/// Jump target shared by `goto`, `label` and loop break/continue sites.
/// Only identity matters; the name is for display.
#[derive(Clone)]
pub struct LabelTarget(Arc<LabelData>);

arc_identity!(LabelTarget);

impl LabelTarget {
    pub fn new(ty: Type, name: Option<&str>) -> Self {
        LabelTarget(Arc::new(LabelData {
            name: name.map(Arc::from),
            ty,
        }))
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Type of the value carried by jumps to this label.
    pub fn ty(&self) -> &Type {
        &self.0.ty
    }
}

impl fmt::Debug for LabelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(n) => write!(f, "label {}", n),
            None => f.write_str("label"),
        }
    }
}

// ─── SwitchCase ────────────────────────────────────────────────────

struct SwitchCaseData {
    test_values: ExprList,
    body: Expr,
}

#[derive(Clone)]
pub struct SwitchCase(Arc<SwitchCaseData>);

arc_identity!(SwitchCase);

impl SwitchCase {
    pub(crate) fn new(body: Expr, test_values: ExprList) -> Self {
        SwitchCase(Arc::new(SwitchCaseData { test_values, body }))
    }

    pub fn test_values(&self) -> &ExprList {
        &self.0.test_values
    }

    pub fn body(&self) -> &Expr {
        &self.0.body
    }
}

impl fmt::Debug for SwitchCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(Case {:?} {:?})", self.test_values(), self.body())
    }
}

// ─── CatchBlock ────────────────────────────────────────────────────

struct CatchData {
    test: Type,
    variable: Option<Expr>,
    body: Expr,
    filter: Option<Expr>,
}

/// Handler of a try expression.
#[derive(Clone)]
pub struct CatchBlock(Arc<CatchData>);

arc_identity!(CatchBlock);

impl CatchBlock {
    pub(crate) fn new(test: Type, variable: Option<Expr>, body: Expr, filter: Option<Expr>) -> Self {
        CatchBlock(Arc::new(CatchData {
            test,
            variable,
            body,
            filter,
        }))
    }

    /// The caught type.
    pub fn test(&self) -> &Type {
        &self.0.test
    }

    pub fn variable(&self) -> Option<&Expr> {
        self.0.variable.as_ref()
    }

    pub fn body(&self) -> &Expr {
        &self.0.body
    }

    pub fn filter(&self) -> Option<&Expr> {
        self.0.filter.as_ref()
    }
}

impl fmt::Debug for CatchBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(Catch {} {:?})", self.test(), self.body())
    }
}

// ─── ElementInit ───────────────────────────────────────────────────

struct ElementInitData {
    add_method: Method,
    arguments: ExprList,
}

/// One `Add(...)` call of a collection initializer.
#[derive(Clone)]
pub struct ElementInit(Arc<ElementInitData>);

arc_identity!(ElementInit);

impl ElementInit {
    pub(crate) fn new(add_method: Method, arguments: ExprList) -> Self {
        ElementInit(Arc::new(ElementInitData {
            add_method,
            arguments,
        }))
    }

    pub fn add_method(&self) -> &Method {
        &self.0.add_method
    }

    pub fn arguments(&self) -> &ExprList {
        &self.0.arguments
    }
}

impl fmt::Debug for ElementInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.add_method().name(), self.arguments())
    }
}

// ─── MemberBinding ─────────────────────────────────────────────────

/// What a member binding does with its member.
pub enum BindingKind {
    /// `Member = expression`
    Assignment(Expr),
    /// `Member = { nested bindings }` applied to the existing value.
    MemberBindings(NodeList<MemberBinding>),
    /// `Member = { Add(...), ... }` applied to the existing collection.
    ListBindings(NodeList<ElementInit>),
}

struct BindingData {
    member: Member,
    kind: BindingKind,
}

/// One binding of a member-init expression.
#[derive(Clone)]
pub struct MemberBinding(Arc<BindingData>);

arc_identity!(MemberBinding);

impl MemberBinding {
    pub(crate) fn new(member: Member, kind: BindingKind) -> Self {
        MemberBinding(Arc::new(BindingData { member, kind }))
    }

    pub fn member(&self) -> &Member {
        &self.0.member
    }

    pub fn kind(&self) -> &BindingKind {
        &self.0.kind
    }
}

impl fmt::Debug for MemberBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            BindingKind::Assignment(e) => write!(f, "{} = {:?}", self.member().name(), e),
            BindingKind::MemberBindings(b) => write!(f, "{} = {:?}", self.member().name(), b),
            BindingKind::ListBindings(i) => write!(f, "{} = {:?}", self.member().name(), i),
        }
    }
}

// ─── Teardown ──────────────────────────────────────────────────────

/// Moves owned child expressions into `out`, so a deep tree is dropped
/// from a work list instead of one native frame per level. Children still
/// shared with another owner are left in place.
pub(crate) trait Detach {
    fn detach_into(&mut self, out: &mut Vec<Expr>);
}

impl Detach for Expr {
    fn detach_into(&mut self, out: &mut Vec<Expr>) {
        out.push(std::mem::replace(self, Expr::hole()));
    }
}

impl Detach for Option<Expr> {
    fn detach_into(&mut self, out: &mut Vec<Expr>) {
        out.extend(self.take());
    }
}

impl<T: Detach> Detach for NodeList<T> {
    fn detach_into(&mut self, out: &mut Vec<Expr>) {
        if let Some(items) = Arc::get_mut(&mut self.0) {
            for item in items {
                item.detach_into(out);
            }
        }
    }
}

impl Detach for SwitchCase {
    fn detach_into(&mut self, out: &mut Vec<Expr>) {
        if let Some(data) = Arc::get_mut(&mut self.0) {
            data.test_values.detach_into(out);
            data.body.detach_into(out);
        }
    }
}

impl Detach for CatchBlock {
    fn detach_into(&mut self, out: &mut Vec<Expr>) {
        if let Some(data) = Arc::get_mut(&mut self.0) {
            data.variable.detach_into(out);
            data.filter.detach_into(out);
            data.body.detach_into(out);
        }
    }
}

impl Detach for ElementInit {
    fn detach_into(&mut self, out: &mut Vec<Expr>) {
        if let Some(data) = Arc::get_mut(&mut self.0) {
            data.arguments.detach_into(out);
        }
    }
}

impl Detach for MemberBinding {
    fn detach_into(&mut self, out: &mut Vec<Expr>) {
        if let Some(data) = Arc::get_mut(&mut self.0) {
            match &mut data.kind {
                BindingKind::Assignment(e) => e.detach_into(out),
                BindingKind::MemberBindings(nested) => nested.detach_into(out),
                BindingKind::ListBindings(inits) => inits.detach_into(out),
            }
        }
    }
}

// ─── SymbolDocument ────────────────────────────────────────────────

struct DocumentData {
    file_name: String,
    language: Option<String>,
}

/// Source file referenced by debug-info markers.
#[derive(Clone)]
pub struct SymbolDocument(Arc<DocumentData>);

arc_identity!(SymbolDocument);

impl SymbolDocument {
    pub fn new(file_name: &str) -> Self {
        SymbolDocument(Arc::new(DocumentData {
            file_name: file_name.to_string(),
            language: None,
        }))
    }

    pub fn with_language(file_name: &str, language: &str) -> Self {
        SymbolDocument(Arc::new(DocumentData {
            file_name: file_name.to_string(),
            language: Some(language.to_string()),
        }))
    }

    pub fn file_name(&self) -> &str {
        &self.0.file_name
    }

    pub fn language(&self) -> Option<&str> {
        self.0.language.as_deref()
    }
}

impl fmt::Debug for SymbolDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

// ─── CallSiteBinder ────────────────────────────────────────────────

/// Late-binding policy of a dynamic expression. Opaque to this crate; the
/// backend interprets it.
pub trait CallSiteBinder: Send + Sync + fmt::Debug {
    /// Short description used by `Debug` output and fingerprints.
    fn describe(&self) -> String;
}

// ─── Value ─────────────────────────────────────────────────────────

/// A host object carried by a constant, tagged with its declared type.
#[derive(Clone)]
pub struct Opaque {
    pub ty: Type,
    pub value: Arc<dyn Any + Send + Sync>,
}

/// Payload of a constant node.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(Arc<str>),
    /// A type descriptor used as a value, `typeof(T)`.
    Type(Type),
    Object(Opaque),
}

impl Value {
    /// The type a constant holding this value gets when none is given.
    /// `None` for null.
    pub fn natural_type(&self) -> Option<Type> {
        let p = match self {
            Value::Null => return None,
            Value::Bool(_) => Primitive::Bool,
            Value::Char(_) => Primitive::Char,
            Value::I8(_) => Primitive::I8,
            Value::U8(_) => Primitive::U8,
            Value::I16(_) => Primitive::I16,
            Value::U16(_) => Primitive::U16,
            Value::I32(_) => Primitive::I32,
            Value::U32(_) => Primitive::U32,
            Value::I64(_) => Primitive::I64,
            Value::U64(_) => Primitive::U64,
            Value::F32(_) => Primitive::F32,
            Value::F64(_) => Primitive::F64,
            Value::Str(_) => Primitive::String,
            Value::Type(_) => Primitive::TypeHandle,
            Value::Object(o) => return Some(o.ty.clone()),
        };
        Some(Type::primitive(p))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<Type> for Value {
    fn from(v: Type) -> Self {
        Value::Type(v)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(&a.value, &b.value),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{:?}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{:?}", v),
            Value::F64(v) => write!(f, "{:?}", v),
            Value::Str(v) => write!(f, "{:?}", v),
            Value::Type(t) => write!(f, "typeof({})", t),
            Value::Object(o) => write!(f, "<{}>", o.ty),
        }
    }
}
