//! Host type descriptors consumed by the tree.
//!
//! Types are opaque, immutable, shareable handles. Nominal types (primitives,
//! structs, classes, interfaces) compare by identity; constructed types
//! (nullable wrappers, arrays, delegates, by-ref) compare structurally so
//! that `Type::i32().nullable() == Type::i32().nullable()`.
//!
//! Nominal types may reference themselves through their members (an
//! `op_Addition(Money, Money) -> Money` operator, for example). Such
//! descriptors live for the life of the process, like any other reflection
//! metadata.

mod members;
mod oracle;
#[cfg(test)]
mod tests;

pub use members::{Constructor, Field, Member, Method, Property};
pub use oracle::*;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};

// ─── Primitives ────────────────────────────────────────────────────

/// Built-in scalar and reference types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    Char,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    String,
    Object,
    /// Runtime type descriptor, the result of `object.GetType()`.
    TypeHandle,
}

impl Primitive {
    const ALL: [Primitive; 15] = [
        Primitive::Bool,
        Primitive::Char,
        Primitive::I8,
        Primitive::U8,
        Primitive::I16,
        Primitive::U16,
        Primitive::I32,
        Primitive::U32,
        Primitive::I64,
        Primitive::U64,
        Primitive::F32,
        Primitive::F64,
        Primitive::String,
        Primitive::Object,
        Primitive::TypeHandle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::I8 => "sbyte",
            Primitive::U8 => "byte",
            Primitive::I16 => "short",
            Primitive::U16 => "ushort",
            Primitive::I32 => "int",
            Primitive::U32 => "uint",
            Primitive::I64 => "long",
            Primitive::U64 => "ulong",
            Primitive::F32 => "float",
            Primitive::F64 => "double",
            Primitive::String => "string",
            Primitive::Object => "object",
            Primitive::TypeHandle => "Type",
        }
    }

    pub fn is_value_type(self) -> bool {
        !matches!(
            self,
            Primitive::String | Primitive::Object | Primitive::TypeHandle
        )
    }
}

// ─── Type ──────────────────────────────────────────────────────────

/// The shape of a type descriptor.
#[derive(Clone, Debug)]
pub enum TypeKind {
    Void,
    Primitive(Primitive),
    /// `T?` over a non-nullable value type `T`.
    Nullable(Type),
    Array {
        element: Type,
        rank: usize,
    },
    /// A delegate (function) type.
    Delegate {
        params: Vec<Type>,
        ret: Type,
    },
    /// A by-reference slot of the inner type; only valid as a delegate or
    /// method parameter type.
    ByRef(Type),
    Struct,
    Class {
        is_abstract: bool,
    },
    Interface,
}

/// Base type, interfaces and members of a nominal type.
#[derive(Default)]
pub(crate) struct Shape {
    pub(crate) base: Option<Type>,
    pub(crate) interfaces: Vec<Type>,
    pub(crate) fields: Vec<Field>,
    pub(crate) properties: Vec<Property>,
    pub(crate) methods: Vec<Method>,
    pub(crate) constructors: Vec<Constructor>,
}

struct TypeData {
    name: String,
    kind: TypeKind,
    shape: OnceCell<Shape>,
}

/// A type descriptor handle.
#[derive(Clone)]
pub struct Type(Arc<TypeData>);

static EMPTY_SHAPE: Lazy<Shape> = Lazy::new(Shape::default);

struct Builtins {
    void: Type,
    primitives: Vec<Type>,
    enumerable: Type,
    runtime_variables: Type,
}

static BUILTINS: Lazy<Builtins> = Lazy::new(|| {
    let primitives: Vec<Type> = Primitive::ALL
        .iter()
        .map(|p| Type::raw(p.name(), TypeKind::Primitive(*p)))
        .collect();
    let object = primitives[Primitive::Object as usize].clone();
    let handle = primitives[Primitive::TypeHandle as usize].clone();

    let get_type = Method::new("GetType", &object, false, Vec::new(), handle.clone());
    let _ = object.0.shape.set(Shape {
        methods: vec![get_type],
        ..Shape::default()
    });
    for p in &primitives {
        if !Arc::ptr_eq(&p.0, &object.0) {
            let base = if p.is_value_type() { None } else { Some(object.clone()) };
            let _ = p.0.shape.set(Shape {
                base,
                ..Shape::default()
            });
        }
    }

    let enumerable = Type::raw("IEnumerable", TypeKind::Interface);
    let runtime_variables = Type::raw("IRuntimeVariables", TypeKind::Interface);
    Builtins {
        void: Type::raw("void", TypeKind::Void),
        primitives,
        enumerable,
        runtime_variables,
    }
});

impl Type {
    fn raw(name: &str, kind: TypeKind) -> Type {
        Type(Arc::new(TypeData {
            name: name.to_string(),
            kind,
            shape: OnceCell::new(),
        }))
    }

    // ── Built-in types ──

    pub fn void() -> Type {
        BUILTINS.void.clone()
    }

    pub fn primitive(p: Primitive) -> Type {
        BUILTINS.primitives[p as usize].clone()
    }

    pub fn bool() -> Type {
        Self::primitive(Primitive::Bool)
    }

    pub fn char() -> Type {
        Self::primitive(Primitive::Char)
    }

    pub fn i8() -> Type {
        Self::primitive(Primitive::I8)
    }

    pub fn u8() -> Type {
        Self::primitive(Primitive::U8)
    }

    pub fn i16() -> Type {
        Self::primitive(Primitive::I16)
    }

    pub fn u16() -> Type {
        Self::primitive(Primitive::U16)
    }

    pub fn i32() -> Type {
        Self::primitive(Primitive::I32)
    }

    pub fn u32() -> Type {
        Self::primitive(Primitive::U32)
    }

    pub fn i64() -> Type {
        Self::primitive(Primitive::I64)
    }

    pub fn u64() -> Type {
        Self::primitive(Primitive::U64)
    }

    pub fn f32() -> Type {
        Self::primitive(Primitive::F32)
    }

    pub fn f64() -> Type {
        Self::primitive(Primitive::F64)
    }

    pub fn string() -> Type {
        Self::primitive(Primitive::String)
    }

    pub fn object() -> Type {
        Self::primitive(Primitive::Object)
    }

    pub fn type_handle() -> Type {
        Self::primitive(Primitive::TypeHandle)
    }

    /// The interface every list-initializable collection implements.
    pub fn enumerable() -> Type {
        BUILTINS.enumerable.clone()
    }

    /// The type of a runtime-variables capture.
    pub fn runtime_variables() -> Type {
        BUILTINS.runtime_variables.clone()
    }

    // ── Constructed types ──

    /// Nullable wrapper of a non-nullable value type; any other type is
    /// returned unchanged.
    pub fn nullable(&self) -> Type {
        if self.is_value_type() && !self.is_nullable() && !self.is_void() {
            Type::raw("", TypeKind::Nullable(self.clone()))
        } else {
            self.clone()
        }
    }

    pub fn array(&self) -> Type {
        self.array_of_rank(1)
    }

    pub fn array_of_rank(&self, rank: usize) -> Type {
        Type::raw(
            "",
            TypeKind::Array {
                element: self.clone(),
                rank: rank.max(1),
            },
        )
    }

    pub fn delegate(params: Vec<Type>, ret: Type) -> Type {
        Type::raw("", TypeKind::Delegate { params, ret })
    }

    pub fn by_ref(&self) -> Type {
        match self.kind() {
            TypeKind::ByRef(_) => self.clone(),
            _ => Type::raw("", TypeKind::ByRef(self.clone())),
        }
    }

    // ── Queries ──

    pub fn kind(&self) -> &TypeKind {
        &self.0.kind
    }

    pub fn name(&self) -> String {
        self.to_string()
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self.kind() {
            TypeKind::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind(), TypeKind::Void)
    }

    pub fn is_value_type(&self) -> bool {
        match self.kind() {
            TypeKind::Void | TypeKind::Nullable(_) | TypeKind::Struct => true,
            TypeKind::Primitive(p) => p.is_value_type(),
            _ => false,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self.kind(), TypeKind::Nullable(_))
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind(), TypeKind::Interface)
    }

    pub fn is_abstract(&self) -> bool {
        matches!(
            self.kind(),
            TypeKind::Interface | TypeKind::Class { is_abstract: true }
        )
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind(), TypeKind::Array { .. })
    }

    pub fn is_delegate(&self) -> bool {
        matches!(self.kind(), TypeKind::Delegate { .. })
    }

    pub fn is_by_ref(&self) -> bool {
        matches!(self.kind(), TypeKind::ByRef(_))
    }

    /// The underlying type of `T?`, or the type itself.
    pub fn non_nullable(&self) -> Type {
        match self.kind() {
            TypeKind::Nullable(inner) => inner.clone(),
            _ => self.clone(),
        }
    }

    /// The referenced type of a by-ref type, or the type itself.
    pub fn non_ref(&self) -> Type {
        match self.kind() {
            TypeKind::ByRef(inner) => inner.clone(),
            _ => self.clone(),
        }
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self.kind() {
            TypeKind::Array { element, .. } => Some(element),
            _ => None,
        }
    }

    pub fn array_rank(&self) -> Option<usize> {
        match self.kind() {
            TypeKind::Array { rank, .. } => Some(*rank),
            _ => None,
        }
    }

    /// Parameter and return types of a delegate type.
    pub fn delegate_signature(&self) -> Option<(&[Type], &Type)> {
        match self.kind() {
            TypeKind::Delegate { params, ret } => Some((params.as_slice(), ret)),
            _ => None,
        }
    }

    fn shape(&self) -> &Shape {
        self.0.shape.get().unwrap_or(&EMPTY_SHAPE)
    }

    pub fn base_type(&self) -> Option<&Type> {
        self.shape().base.as_ref()
    }

    pub fn interfaces(&self) -> &[Type] {
        &self.shape().interfaces
    }

    pub fn fields(&self) -> &[Field] {
        &self.shape().fields
    }

    pub fn properties(&self) -> &[Property] {
        &self.shape().properties
    }

    pub fn methods(&self) -> &[Method] {
        &self.shape().methods
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.shape().constructors
    }

    /// This type followed by its base chain.
    pub fn ancestry(&self) -> impl Iterator<Item = Type> {
        std::iter::successors(Some(self.clone()), |t| t.base_type().cloned())
    }

    pub fn ptr_eq(a: &Type, b: &Type) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (self.kind(), other.kind()) {
            (TypeKind::Nullable(a), TypeKind::Nullable(b)) => a == b,
            (TypeKind::ByRef(a), TypeKind::ByRef(b)) => a == b,
            (
                TypeKind::Array {
                    element: a,
                    rank: r,
                },
                TypeKind::Array {
                    element: b,
                    rank: s,
                },
            ) => r == s && a == b,
            (
                TypeKind::Delegate { params: p, ret: r },
                TypeKind::Delegate { params: q, ret: s },
            ) => p == q && r == s,
            _ => false,
        }
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.kind() {
            TypeKind::Nullable(inner) => {
                1u8.hash(state);
                inner.hash(state);
            }
            TypeKind::ByRef(inner) => {
                2u8.hash(state);
                inner.hash(state);
            }
            TypeKind::Array { element, rank } => {
                3u8.hash(state);
                element.hash(state);
                rank.hash(state);
            }
            TypeKind::Delegate { params, ret } => {
                4u8.hash(state);
                params.hash(state);
                ret.hash(state);
            }
            _ => {
                0u8.hash(state);
                (Arc::as_ptr(&self.0) as usize).hash(state);
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            TypeKind::Nullable(inner) => write!(f, "{}?", inner),
            TypeKind::ByRef(inner) => write!(f, "ref {}", inner),
            TypeKind::Array { element, rank } => {
                write!(f, "{}[{}]", element, ",".repeat(rank - 1))
            }
            TypeKind::Delegate { params, ret } => {
                let parts: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                write!(f, "fn({}) -> {}", parts.join(", "), ret)
            }
            _ => f.write_str(&self.0.name),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// ─── TypeBuilder ───────────────────────────────────────────────────

/// Declares a nominal type and its members.
///
/// The handle returned by [`TypeBuilder::this`] is usable before `build`, so
/// members can mention the type being declared.
pub struct TypeBuilder {
    ty: Type,
    shape: Shape,
}

impl TypeBuilder {
    fn new(name: &str, kind: TypeKind) -> Self {
        let base = match kind {
            TypeKind::Class { .. } => Some(Type::object()),
            _ => None,
        };
        Self {
            ty: Type::raw(name, kind),
            shape: Shape {
                base,
                ..Shape::default()
            },
        }
    }

    pub fn class(name: &str) -> Self {
        Self::new(name, TypeKind::Class { is_abstract: false })
    }

    pub fn abstract_class(name: &str) -> Self {
        Self::new(name, TypeKind::Class { is_abstract: true })
    }

    pub fn structure(name: &str) -> Self {
        Self::new(name, TypeKind::Struct)
    }

    pub fn interface(name: &str) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    /// Handle to the type under construction.
    pub fn this(&self) -> Type {
        self.ty.clone()
    }

    pub fn extends(mut self, base: &Type) -> Self {
        self.shape.base = Some(base.clone());
        self
    }

    pub fn implements(mut self, interface: &Type) -> Self {
        self.shape.interfaces.push(interface.clone());
        self
    }

    pub fn field(mut self, name: &str, ty: Type) -> Self {
        let f = Field::new(name, &self.ty, ty, false, false);
        self.shape.fields.push(f);
        self
    }

    pub fn readonly_field(mut self, name: &str, ty: Type) -> Self {
        let f = Field::new(name, &self.ty, ty, false, true);
        self.shape.fields.push(f);
        self
    }

    pub fn static_field(mut self, name: &str, ty: Type) -> Self {
        let f = Field::new(name, &self.ty, ty, true, false);
        self.shape.fields.push(f);
        self
    }

    /// Read-write instance property.
    pub fn property(mut self, name: &str, ty: Type) -> Self {
        let p = Property::new(name, &self.ty, ty, Vec::new(), true, true, false);
        self.shape.properties.push(p);
        self
    }

    pub fn readonly_property(mut self, name: &str, ty: Type) -> Self {
        let p = Property::new(name, &self.ty, ty, Vec::new(), true, false, false);
        self.shape.properties.push(p);
        self
    }

    pub fn writeonly_property(mut self, name: &str, ty: Type) -> Self {
        let p = Property::new(name, &self.ty, ty, Vec::new(), false, true, false);
        self.shape.properties.push(p);
        self
    }

    pub fn static_property(mut self, name: &str, ty: Type) -> Self {
        let p = Property::new(name, &self.ty, ty, Vec::new(), true, true, true);
        self.shape.properties.push(p);
        self
    }

    /// Read-write indexed property.
    pub fn indexer(mut self, name: &str, index: Vec<Type>, ty: Type) -> Self {
        let p = Property::new(name, &self.ty, ty, index, true, true, false);
        self.shape.properties.push(p);
        self
    }

    pub fn readonly_indexer(mut self, name: &str, index: Vec<Type>, ty: Type) -> Self {
        let p = Property::new(name, &self.ty, ty, index, true, false, false);
        self.shape.properties.push(p);
        self
    }

    pub fn method(mut self, name: &str, params: Vec<Type>, ret: Type) -> Self {
        let m = Method::new(name, &self.ty, false, params, ret);
        self.shape.methods.push(m);
        self
    }

    pub fn static_method(mut self, name: &str, params: Vec<Type>, ret: Type) -> Self {
        let m = Method::new(name, &self.ty, true, params, ret);
        self.shape.methods.push(m);
        self
    }

    pub fn constructor(mut self, params: Vec<Type>) -> Self {
        let c = Constructor::new(&self.ty, params);
        self.shape.constructors.push(c);
        self
    }

    /// Publish the members and return the finished type.
    pub fn build(self) -> Type {
        let TypeBuilder { ty, shape } = self;
        // The builder owns the only path to this cell, so it is always empty.
        let _ = ty.0.shape.set(shape);
        ty
    }
}
