//! Member descriptors: methods, fields, properties and constructors.
//!
//! Descriptors are reference-counted and compare by identity, like the
//! reflection handles they stand in for.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::Type;

macro_rules! identity_handle {
    ($name:ident) => {
        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                (Arc::as_ptr(&self.0) as *const () as usize).hash(state);
            }
        }
    };
}

// ─── Method ────────────────────────────────────────────────────────

struct MethodData {
    name: String,
    declaring_type: Type,
    is_static: bool,
    params: Vec<Type>,
    return_type: Type,
}

/// A static or instance method.
#[derive(Clone)]
pub struct Method(Arc<MethodData>);

identity_handle!(Method);

impl Method {
    pub(crate) fn new(
        name: &str,
        declaring_type: &Type,
        is_static: bool,
        params: Vec<Type>,
        return_type: Type,
    ) -> Self {
        Method(Arc::new(MethodData {
            name: name.to_string(),
            declaring_type: declaring_type.clone(),
            is_static,
            params,
            return_type,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn declaring_type(&self) -> &Type {
        &self.0.declaring_type
    }

    pub fn is_static(&self) -> bool {
        self.0.is_static
    }

    pub fn params(&self) -> &[Type] {
        &self.0.params
    }

    pub fn return_type(&self) -> &Type {
        &self.0.return_type
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0.declaring_type, self.0.name)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.0.params.iter().map(|p| p.to_string()).collect();
        write!(
            f,
            "{} {}({})",
            self.0.return_type,
            self.0.name,
            params.join(", ")
        )
    }
}

// ─── Field ─────────────────────────────────────────────────────────

struct FieldData {
    name: String,
    declaring_type: Type,
    ty: Type,
    is_static: bool,
    is_init_only: bool,
}

#[derive(Clone)]
pub struct Field(Arc<FieldData>);

identity_handle!(Field);

impl Field {
    pub(crate) fn new(
        name: &str,
        declaring_type: &Type,
        ty: Type,
        is_static: bool,
        is_init_only: bool,
    ) -> Self {
        Field(Arc::new(FieldData {
            name: name.to_string(),
            declaring_type: declaring_type.clone(),
            ty,
            is_static,
            is_init_only,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn declaring_type(&self) -> &Type {
        &self.0.declaring_type
    }

    pub fn field_type(&self) -> &Type {
        &self.0.ty
    }

    pub fn is_static(&self) -> bool {
        self.0.is_static
    }

    /// Readonly fields cannot be assigned outside construction.
    pub fn is_init_only(&self) -> bool {
        self.0.is_init_only
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0.declaring_type, self.0.name)
    }
}

// ─── Property ──────────────────────────────────────────────────────

struct PropertyData {
    name: String,
    declaring_type: Type,
    ty: Type,
    index_params: Vec<Type>,
    can_read: bool,
    can_write: bool,
    is_static: bool,
}

/// A property, optionally indexed.
#[derive(Clone)]
pub struct Property(Arc<PropertyData>);

identity_handle!(Property);

impl Property {
    pub(crate) fn new(
        name: &str,
        declaring_type: &Type,
        ty: Type,
        index_params: Vec<Type>,
        can_read: bool,
        can_write: bool,
        is_static: bool,
    ) -> Self {
        Property(Arc::new(PropertyData {
            name: name.to_string(),
            declaring_type: declaring_type.clone(),
            ty,
            index_params,
            can_read,
            can_write,
            is_static,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn declaring_type(&self) -> &Type {
        &self.0.declaring_type
    }

    pub fn property_type(&self) -> &Type {
        &self.0.ty
    }

    pub fn index_params(&self) -> &[Type] {
        &self.0.index_params
    }

    pub fn is_indexer(&self) -> bool {
        !self.0.index_params.is_empty()
    }

    pub fn can_read(&self) -> bool {
        self.0.can_read
    }

    pub fn can_write(&self) -> bool {
        self.0.can_write
    }

    pub fn is_static(&self) -> bool {
        self.0.is_static
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0.declaring_type, self.0.name)
    }
}

// ─── Constructor ───────────────────────────────────────────────────

struct ConstructorData {
    declaring_type: Type,
    params: Vec<Type>,
}

#[derive(Clone)]
pub struct Constructor(Arc<ConstructorData>);

identity_handle!(Constructor);

impl Constructor {
    pub(crate) fn new(declaring_type: &Type, params: Vec<Type>) -> Self {
        Constructor(Arc::new(ConstructorData {
            declaring_type: declaring_type.clone(),
            params,
        }))
    }

    pub fn declaring_type(&self) -> &Type {
        &self.0.declaring_type
    }

    pub fn params(&self) -> &[Type] {
        &self.0.params
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.ctor/{}", self.0.declaring_type, self.0.params.len())
    }
}

// ─── Member ────────────────────────────────────────────────────────

/// A field or a property, the target of member access and member bindings.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Member {
    Field(Field),
    Property(Property),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Field(f) => f.name(),
            Member::Property(p) => p.name(),
        }
    }

    pub fn declaring_type(&self) -> &Type {
        match self {
            Member::Field(f) => f.declaring_type(),
            Member::Property(p) => p.declaring_type(),
        }
    }

    /// Type of the value read from or written to the member.
    pub fn member_type(&self) -> &Type {
        match self {
            Member::Field(f) => f.field_type(),
            Member::Property(p) => p.property_type(),
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            Member::Field(f) => f.is_static(),
            Member::Property(p) => p.is_static(),
        }
    }

    pub fn can_read(&self) -> bool {
        match self {
            Member::Field(_) => true,
            Member::Property(p) => p.can_read(),
        }
    }

    pub fn can_write(&self) -> bool {
        match self {
            Member::Field(f) => !f.is_init_only(),
            Member::Property(p) => p.can_write(),
        }
    }
}

impl From<Field> for Member {
    fn from(f: Field) -> Self {
        Member::Field(f)
    }
}

impl From<Property> for Member {
    fn from(p: Property) -> Self {
        Member::Property(p)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Field(x) => fmt::Debug::fmt(x, f),
            Member::Property(x) => fmt::Debug::fmt(x, f),
        }
    }
}
