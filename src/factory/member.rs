//! Member access, calls, indexers, object and array creation, and
//! initializers.
//!
//! Lookups by name are case-insensitive and must find exactly one
//! compatible candidate.

use crate::error::{Error, MemberKind, Result};
use crate::tree::{
    BindingKind, CallNode, ElementInit, Expr, ExprKind, IndexNode, ListInitNode, MemberBinding,
    MemberInitNode, MemberNode, NewArrayNode, NewNode, NodeList, NodeType,
};
use crate::types::{self, Constructor, Field, Member, Method, Property, Type};

use super::{
    members_named, methods_named, require_readable, require_readable_all, same_name,
    single_match, validate_instance, validate_method_arguments, validate_type,
};

fn member_access(expression: Option<&Expr>, member: Member) -> Expr {
    let ty = member.member_type().clone();
    Expr::new(
        ty,
        ExprKind::Member(MemberNode {
            expression: expression.cloned(),
            member,
        }),
    )
}

/// Every element initializer's `Add` must be callable on `list_type`,
/// which must be enumerable.
fn validate_list_init_args(list_type: &Type, initializers: &[ElementInit]) -> Result<()> {
    if !types::is_assignable_from(&Type::enumerable(), list_type) {
        return Err(Error::TypeNotEnumerable(list_type.clone()));
    }
    for init in initializers {
        let add = init.add_method();
        if !types::is_valid_instance_type(add.declaring_type(), list_type) {
            return Err(Error::InstanceAndMemberTypeMismatch {
                member: add.name().to_string(),
                instance: list_type.clone(),
            });
        }
    }
    Ok(())
}

/// Every bound member must belong to `ty`.
fn validate_member_init_args(ty: &Type, bindings: &[MemberBinding]) -> Result<()> {
    for b in bindings {
        if !types::is_assignable_from(b.member().declaring_type(), ty) {
            return Err(Error::NotAMemberOfType {
                member: b.member().name().to_string(),
                ty: ty.clone(),
            });
        }
    }
    Ok(())
}

fn gettable_member_type(member: &Member) -> Result<Type> {
    if !member.can_read() {
        return Err(Error::PropertyDoesNotHaveGetter(member.name().to_string()));
    }
    Ok(member.member_type().clone())
}

fn validate_indexer(instance: &Expr, indexer: &Property, args: &[Expr]) -> Result<()> {
    if !indexer.can_read() && !indexer.can_write() {
        return Err(Error::PropertyDoesNotHaveAccessor(indexer.name().to_string()));
    }
    validate_instance(
        Some(instance),
        indexer.is_static(),
        indexer.declaring_type(),
        indexer.name(),
    )?;
    let params = indexer.index_params();
    if params.len() != args.len() {
        return Err(Error::IncorrectNumberOfMethodCallArguments(
            indexer.name().to_string(),
        ));
    }
    for (param, arg) in params.iter().zip(args) {
        require_readable(arg)?;
        validate_type(param)?;
        if !types::are_reference_assignable(param, arg.ty()) {
            return Err(Error::ExpressionTypeDoesNotMatchMethodParameter {
                expression: arg.ty().clone(),
                parameter: param.clone(),
                method: indexer.name().to_string(),
            });
        }
    }
    Ok(())
}

fn validate_constructor_args(ctor: &Constructor, args: &[Expr]) -> Result<()> {
    let params = ctor.params();
    if params.len() != args.len() {
        return Err(Error::IncorrectNumberOfConstructorArguments(
            ctor.declaring_type().clone(),
        ));
    }
    for (param, arg) in params.iter().zip(args) {
        require_readable(arg)?;
        if !types::parameter_is_assignable(param, arg.ty()) {
            return Err(Error::ExpressionTypeDoesNotMatchConstructorParameter {
                expression: arg.ty().clone(),
                parameter: param.clone(),
            });
        }
    }
    Ok(())
}

fn new_node(ty: Type, constructor: Option<Constructor>, args: &[Expr], members: Option<&[Member]>) -> Expr {
    Expr::new(
        ty,
        ExprKind::New(NewNode {
            constructor,
            arguments: args.to_vec().into(),
            members: members.map(|m| NodeList::new(m.to_vec())),
        }),
    )
}

impl Expr {
    // ── Fields and properties ──

    pub fn field(expression: Option<&Expr>, field: &Field) -> Result<Expr> {
        validate_instance(expression, field.is_static(), field.declaring_type(), field.name())?;
        Ok(member_access(expression, Member::Field(field.clone())))
    }

    /// Instance field of `expression`'s type, by name.
    pub fn field_named(expression: &Expr, name: &str) -> Result<Expr> {
        let ty = expression.ty();
        let fields = members_named(ty, name, Some(false))
            .into_iter()
            .filter_map(|m| match m {
                Member::Field(f) => Some(f),
                Member::Property(_) => None,
            })
            .collect();
        let field = single_match(fields, MemberKind::Field, name, ty)?;
        Expr::field(Some(expression), &field)
    }

    pub fn static_field_named(ty: &Type, name: &str) -> Result<Expr> {
        let fields = members_named(ty, name, Some(true))
            .into_iter()
            .filter_map(|m| match m {
                Member::Field(f) => Some(f),
                Member::Property(_) => None,
            })
            .collect();
        let field = single_match(fields, MemberKind::Field, name, ty)?;
        Expr::field(None, &field)
    }

    /// Non-indexed property access.
    pub fn property(expression: Option<&Expr>, property: &Property) -> Result<Expr> {
        if property.is_indexer() {
            return Err(Error::PropertyRequiresArguments(property.name().to_string()));
        }
        if !property.can_read() && !property.can_write() {
            return Err(Error::PropertyDoesNotHaveAccessor(property.name().to_string()));
        }
        validate_instance(
            expression,
            property.is_static(),
            property.declaring_type(),
            property.name(),
        )?;
        Ok(member_access(expression, Member::Property(property.clone())))
    }

    pub fn property_named(expression: &Expr, name: &str) -> Result<Expr> {
        let ty = expression.ty();
        let props = members_named(ty, name, Some(false))
            .into_iter()
            .filter_map(|m| match m {
                Member::Property(p) => Some(p),
                Member::Field(_) => None,
            })
            .collect();
        let property = single_match(props, MemberKind::Property, name, ty)?;
        Expr::property(Some(expression), &property)
    }

    pub fn static_property_named(ty: &Type, name: &str) -> Result<Expr> {
        let props = members_named(ty, name, Some(true))
            .into_iter()
            .filter_map(|m| match m {
                Member::Property(p) => Some(p),
                Member::Field(_) => None,
            })
            .collect();
        let property = single_match(props, MemberKind::Property, name, ty)?;
        Expr::property(None, &property)
    }

    /// Property named `name`, else field named `name`.
    pub fn property_or_field(expression: &Expr, name: &str) -> Result<Expr> {
        let ty = expression.ty();
        let (props, fields): (Vec<Member>, Vec<Member>) = members_named(ty, name, Some(false))
            .into_iter()
            .partition(|m| matches!(m, Member::Property(_)));
        let candidates = if props.is_empty() { fields } else { props };
        match single_match(candidates, MemberKind::PropertyOrField, name, ty) {
            Ok(member) => Expr::make_member_access(Some(expression), &member),
            Err(Error::MemberNotFound { .. }) => Err(Error::NotAMemberOfType {
                member: name.to_string(),
                ty: ty.clone(),
            }),
            Err(e) => Err(e),
        }
    }

    pub fn make_member_access(expression: Option<&Expr>, member: &Member) -> Result<Expr> {
        match member {
            Member::Field(f) => Expr::field(expression, f),
            Member::Property(p) => Expr::property(expression, p),
        }
    }

    // ── Calls ──

    /// Call `method` on `instance` (`None` for static methods).
    pub fn call(instance: Option<&Expr>, method: &Method, arguments: &[Expr]) -> Result<Expr> {
        validate_instance(instance, method.is_static(), method.declaring_type(), method.name())?;
        validate_method_arguments(method, arguments)?;
        Ok(Expr::new(
            method.return_type().clone(),
            ExprKind::Call(CallNode {
                object: instance.cloned(),
                method: method.clone(),
                arguments: arguments.to_vec().into(),
            }),
        ))
    }

    /// Instance method of `instance`'s type by name and argument types.
    pub fn call_named(instance: &Expr, name: &str, arguments: &[Expr]) -> Result<Expr> {
        require_readable_all(arguments)?;
        let ty = instance.ty();
        let arg_types: Vec<Type> = arguments.iter().map(|a| a.ty().clone()).collect();
        let candidates = methods_named(ty, name, &arg_types, false);
        let method = single_match(candidates, MemberKind::Method, name, ty)?;
        Expr::call(Some(instance), &method, arguments)
    }

    pub fn call_static_named(ty: &Type, name: &str, arguments: &[Expr]) -> Result<Expr> {
        require_readable_all(arguments)?;
        let arg_types: Vec<Type> = arguments.iter().map(|a| a.ty().clone()).collect();
        let candidates = methods_named(ty, name, &arg_types, true);
        let method = single_match(candidates, MemberKind::Method, name, ty)?;
        Expr::call(None, &method, arguments)
    }

    // ── Indexing ──

    /// Element of an array of any rank; one `int` index per dimension.
    pub fn array_access(array: &Expr, indexes: &[Expr]) -> Result<Expr> {
        require_readable(array)?;
        let (Some(element), Some(rank)) = (array.ty().element_type(), array.ty().array_rank())
        else {
            return Err(Error::ArgumentMustBeArray(array.ty().clone()));
        };
        if rank != indexes.len() {
            return Err(Error::IncorrectNumberOfIndexes { rank });
        }
        for i in indexes {
            require_readable(i)?;
            if *i.ty() != Type::i32() {
                return Err(Error::ArgumentMustBeArrayIndexType(i.ty().clone()));
            }
        }
        Ok(Expr::new(
            element.clone(),
            ExprKind::Index(IndexNode {
                object: array.clone(),
                indexer: None,
                arguments: indexes.to_vec().into(),
            }),
        ))
    }

    /// Indexed property access.
    pub fn indexer(instance: &Expr, indexer: &Property, arguments: &[Expr]) -> Result<Expr> {
        validate_indexer(instance, indexer, arguments)?;
        Ok(Expr::new(
            indexer.property_type().clone(),
            ExprKind::Index(IndexNode {
                object: instance.clone(),
                indexer: Some(indexer.clone()),
                arguments: arguments.to_vec().into(),
            }),
        ))
    }

    /// Indexer of `instance`'s type by name and index argument types.
    pub fn indexer_named(instance: &Expr, name: &str, arguments: &[Expr]) -> Result<Expr> {
        let ty = instance.ty();
        let arg_types: Vec<Type> = arguments.iter().map(|a| a.ty().clone()).collect();
        let candidates: Vec<Property> = ty
            .ancestry()
            .flat_map(|t| t.properties().to_vec())
            .filter(|p| {
                p.is_indexer()
                    && !p.is_static()
                    && same_name(p.name(), name)
                    && super::arguments_match(p.index_params(), &arg_types)
            })
            .collect();
        let indexer = single_match(candidates, MemberKind::Indexer, name, ty)?;
        Expr::indexer(instance, &indexer, arguments)
    }

    /// Array access when `indexer` is `None`, indexed property otherwise.
    pub fn make_index(
        instance: &Expr,
        indexer: Option<&Property>,
        arguments: &[Expr],
    ) -> Result<Expr> {
        match indexer {
            Some(p) => Expr::indexer(instance, p, arguments),
            None => Expr::array_access(instance, arguments),
        }
    }

    // ── Object creation ──

    pub fn new_object(constructor: &Constructor, arguments: &[Expr]) -> Result<Expr> {
        let ty = constructor.declaring_type();
        if ty.is_abstract() {
            return Err(Error::NonAbstractConstructorRequired(ty.clone()));
        }
        validate_constructor_args(constructor, arguments)?;
        Ok(new_node(ty.clone(), Some(constructor.clone()), arguments, None))
    }

    /// Construction where each argument also initializes the member at the
    /// same position.
    pub fn new_with_members(
        constructor: &Constructor,
        arguments: &[Expr],
        members: &[Member],
    ) -> Result<Expr> {
        let ty = constructor.declaring_type();
        if ty.is_abstract() {
            return Err(Error::NonAbstractConstructorRequired(ty.clone()));
        }
        if constructor.params().is_empty() {
            if !members.is_empty() {
                return Err(Error::IncorrectNumberOfMembersForGivenConstructor(ty.clone()));
            }
        } else if arguments.len() != members.len() {
            return Err(Error::IncorrectNumberOfMembersForGivenConstructor(ty.clone()));
        }
        validate_constructor_args(constructor, arguments)?;
        for (arg, member) in arguments.iter().zip(members) {
            if !types::are_reference_assignable(member.member_type(), arg.ty()) {
                return Err(Error::ExpressionTypeDoesNotMatchAssignment {
                    expression: arg.ty().clone(),
                    target: member.member_type().clone(),
                });
            }
        }
        Ok(new_node(
            ty.clone(),
            Some(constructor.clone()),
            arguments,
            Some(members),
        ))
    }

    /// Parameterless construction; value types need no constructor.
    pub fn new_default(ty: &Type) -> Result<Expr> {
        validate_type(ty)?;
        if ty.is_void() {
            return Err(Error::ArgumentCannotBeOfTypeVoid);
        }
        if ty.is_value_type() {
            return Ok(new_node(ty.clone(), None, &[], None));
        }
        if ty.is_abstract() {
            return Err(Error::NonAbstractConstructorRequired(ty.clone()));
        }
        let ctor = ty
            .constructors()
            .iter()
            .find(|c| c.params().is_empty())
            .ok_or_else(|| Error::MissingDefaultConstructor(ty.clone()))?;
        Ok(new_node(ty.clone(), Some(ctor.clone()), &[], None))
    }

    // ── Arrays ──

    /// One-dimensional array of `element` holding `initializers`.
    pub fn new_array_init(element: &Type, initializers: &[Expr]) -> Result<Expr> {
        if element.is_void() {
            return Err(Error::ArgumentCannotBeOfTypeVoid);
        }
        validate_type(element)?;
        for e in initializers {
            require_readable(e)?;
            if !types::are_reference_assignable(element, e.ty()) {
                return Err(Error::ExpressionTypeCannotInitializeArrayType {
                    expression: e.ty().clone(),
                    element: element.clone(),
                });
            }
        }
        Ok(Expr::new(
            element.array(),
            ExprKind::NewArray(NewArrayNode {
                op: NodeType::NewArrayInit,
                expressions: initializers.to_vec().into(),
            }),
        ))
    }

    /// Array of `element` with one integer bound per dimension.
    pub fn new_array_bounds(element: &Type, bounds: &[Expr]) -> Result<Expr> {
        if element.is_void() {
            return Err(Error::ArgumentCannotBeOfTypeVoid);
        }
        validate_type(element)?;
        if bounds.is_empty() {
            return Err(Error::BoundsCannotBeLessThanOne);
        }
        for b in bounds {
            require_readable(b)?;
            if !types::is_integer(b.ty()) {
                return Err(Error::ArgumentMustBeInteger(b.ty().clone()));
            }
        }
        Ok(Expr::new(
            element.array_of_rank(bounds.len()),
            ExprKind::NewArray(NewArrayNode {
                op: NodeType::NewArrayBounds,
                expressions: bounds.to_vec().into(),
            }),
        ))
    }

    // ── Initializers ──

    /// One `Add(arguments)` call of a collection initializer.
    pub fn element_init(add_method: &Method, arguments: &[Expr]) -> Result<ElementInit> {
        require_readable_all(arguments)?;
        let name = add_method.name();
        if add_method.params().is_empty() {
            return Err(Error::ElementInitializerMethodWithZeroArgs(name.to_string()));
        }
        if !same_name(name, "Add") {
            return Err(Error::ElementInitializerMethodNotAdd(name.to_string()));
        }
        if add_method.is_static() {
            return Err(Error::ElementInitializerMethodStatic(name.to_string()));
        }
        if add_method.params().iter().any(|p| p.is_by_ref()) {
            return Err(Error::ElementInitializerMethodNoRefParam(name.to_string()));
        }
        validate_method_arguments(add_method, arguments)?;
        Ok(ElementInit::new(add_method.clone(), arguments.to_vec().into()))
    }

    /// `new T(...) { Add(a), Add(b, c), ... }`.
    pub fn list_init(new_expression: &Expr, initializers: &[ElementInit]) -> Result<Expr> {
        if !matches!(new_expression.kind(), ExprKind::New(_)) {
            return Err(Error::ArgumentMustBeNew(new_expression.node_type()));
        }
        validate_list_init_args(new_expression.ty(), initializers)?;
        Ok(Expr::new(
            new_expression.ty().clone(),
            ExprKind::ListInit(ListInitNode {
                new_expression: new_expression.clone(),
                initializers: initializers.to_vec().into(),
            }),
        ))
    }

    /// Collection initializer from plain values, each passed to the
    /// collection's single-argument `Add` method.
    pub fn list_init_values(new_expression: &Expr, values: &[Expr]) -> Result<Expr> {
        if values.is_empty() {
            return Err(Error::ListInitializerWithZeroMembers);
        }
        let ty = new_expression.ty();
        let inits = values
            .iter()
            .map(|v| {
                let add = single_match(
                    methods_named(ty, "Add", std::slice::from_ref(v.ty()), false),
                    MemberKind::Method,
                    "Add",
                    ty,
                )?;
                Expr::element_init(&add, std::slice::from_ref(v))
            })
            .collect::<Result<Vec<_>>>()?;
        Expr::list_init(new_expression, &inits)
    }

    /// `new T(...) { A = x, B = { ... }, C = { Add(...) } }`.
    pub fn member_init(new_expression: &Expr, bindings: &[MemberBinding]) -> Result<Expr> {
        if !matches!(new_expression.kind(), ExprKind::New(_)) {
            return Err(Error::ArgumentMustBeNew(new_expression.node_type()));
        }
        validate_member_init_args(new_expression.ty(), bindings)?;
        Ok(Expr::new(
            new_expression.ty().clone(),
            ExprKind::MemberInit(MemberInitNode {
                new_expression: new_expression.clone(),
                bindings: bindings.to_vec().into(),
            }),
        ))
    }

    /// `member = expression` inside a member initializer.
    pub fn bind(member: &Member, expression: &Expr) -> Result<MemberBinding> {
        if let Member::Property(p) = member {
            if !p.can_write() {
                return Err(Error::PropertyDoesNotHaveSetter(p.name().to_string()));
            }
        }
        require_readable(expression)?;
        if !types::is_assignable_from(member.member_type(), expression.ty()) {
            return Err(Error::ArgumentTypesMustMatch);
        }
        Ok(MemberBinding::new(
            member.clone(),
            BindingKind::Assignment(expression.clone()),
        ))
    }

    /// Nested bindings applied to the member's current value.
    pub fn member_bind(member: &Member, bindings: &[MemberBinding]) -> Result<MemberBinding> {
        let ty = gettable_member_type(member)?;
        validate_member_init_args(&ty, bindings)?;
        Ok(MemberBinding::new(
            member.clone(),
            BindingKind::MemberBindings(bindings.to_vec().into()),
        ))
    }

    /// Element initializers applied to the collection held by the member.
    pub fn list_bind(member: &Member, initializers: &[ElementInit]) -> Result<MemberBinding> {
        let ty = gettable_member_type(member)?;
        validate_list_init_args(&ty, initializers)?;
        Ok(MemberBinding::new(
            member.clone(),
            BindingKind::ListBindings(initializers.to_vec().into()),
        ))
    }
}
