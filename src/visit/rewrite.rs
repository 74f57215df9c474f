//! The rewriting traversal.
//!
//! Children are visited left to right in declaration order. Scope
//! declarations (block variables, lambda parameters, catch variables) come
//! before the expressions that use them; a binary node visits its left
//! operand, then the conversion lambda, then the right operand.

use crate::error::{Error, Result};
use crate::stack;
use crate::tree::{
    same_opt, BinaryNode, BindingKind, BlockNode, CallNode, CatchBlock, ConditionalNode,
    DynamicNode, ElementInit, Expr, ExprKind, ExprList, GotoNode, Identity, IndexNode, InvokeNode,
    LabelNode, LabelTarget, LambdaNode, ListInitNode, LoopNode, MemberBinding, MemberInitNode,
    MemberNode, NewArrayNode, NewNode, NodeList, NodeType, RuntimeVariablesNode, SwitchCase,
    SwitchNode, TryNode, TypeBinaryNode, UnaryNode,
};
use crate::types::{self, Type};

// ─── The trait ─────────────────────────────────────────────────────

pub trait Rewriter {
    /// Rewrite `node` and everything below it.
    fn visit(&mut self, node: &Expr) -> Result<Expr> {
        let _guard = stack::enter()?;
        dispatch(self, node)
    }

    // ── Leaves ──

    fn visit_constant(&mut self, node: &Expr) -> Result<Expr> {
        Ok(node.clone())
    }

    fn visit_default(&mut self, node: &Expr) -> Result<Expr> {
        Ok(node.clone())
    }

    fn visit_parameter(&mut self, node: &Expr) -> Result<Expr> {
        Ok(node.clone())
    }

    fn visit_debug_info(&mut self, node: &Expr) -> Result<Expr> {
        Ok(node.clone())
    }

    // ── Interior nodes ──

    fn visit_binary(&mut self, node: &Expr, b: &BinaryNode) -> Result<Expr> {
        walk_binary(self, node, b)
    }

    fn visit_unary(&mut self, node: &Expr, u: &UnaryNode) -> Result<Expr> {
        walk_unary(self, node, u)
    }

    fn visit_type_binary(&mut self, node: &Expr, t: &TypeBinaryNode) -> Result<Expr> {
        walk_type_binary(self, node, t)
    }

    fn visit_conditional(&mut self, node: &Expr, c: &ConditionalNode) -> Result<Expr> {
        walk_conditional(self, node, c)
    }

    fn visit_block(&mut self, node: &Expr, b: &BlockNode) -> Result<Expr> {
        walk_block(self, node, b)
    }

    fn visit_call(&mut self, node: &Expr, c: &CallNode) -> Result<Expr> {
        walk_call(self, node, c)
    }

    fn visit_member(&mut self, node: &Expr, m: &MemberNode) -> Result<Expr> {
        walk_member(self, node, m)
    }

    fn visit_index(&mut self, node: &Expr, i: &IndexNode) -> Result<Expr> {
        walk_index(self, node, i)
    }

    fn visit_invoke(&mut self, node: &Expr, i: &InvokeNode) -> Result<Expr> {
        walk_invoke(self, node, i)
    }

    fn visit_lambda(&mut self, node: &Expr, l: &LambdaNode) -> Result<Expr> {
        walk_lambda(self, node, l)
    }

    fn visit_loop(&mut self, node: &Expr, l: &LoopNode) -> Result<Expr> {
        walk_loop(self, node, l)
    }

    fn visit_goto(&mut self, node: &Expr, g: &GotoNode) -> Result<Expr> {
        walk_goto(self, node, g)
    }

    fn visit_label(&mut self, node: &Expr, l: &LabelNode) -> Result<Expr> {
        walk_label(self, node, l)
    }

    fn visit_switch(&mut self, node: &Expr, s: &SwitchNode) -> Result<Expr> {
        walk_switch(self, node, s)
    }

    fn visit_try(&mut self, node: &Expr, t: &TryNode) -> Result<Expr> {
        walk_try(self, node, t)
    }

    fn visit_new(&mut self, node: &Expr, n: &NewNode) -> Result<Expr> {
        walk_new(self, node, n)
    }

    fn visit_new_array(&mut self, node: &Expr, n: &NewArrayNode) -> Result<Expr> {
        walk_new_array(self, node, n)
    }

    fn visit_list_init(&mut self, node: &Expr, l: &ListInitNode) -> Result<Expr> {
        walk_list_init(self, node, l)
    }

    fn visit_member_init(&mut self, node: &Expr, m: &MemberInitNode) -> Result<Expr> {
        walk_member_init(self, node, m)
    }

    fn visit_dynamic(&mut self, node: &Expr, d: &DynamicNode) -> Result<Expr> {
        walk_dynamic(self, node, d)
    }

    fn visit_runtime_variables(&mut self, node: &Expr, r: &RuntimeVariablesNode) -> Result<Expr> {
        walk_runtime_variables(self, node, r)
    }

    // ── Satellites ──

    fn visit_label_target(&mut self, target: &LabelTarget) -> Result<LabelTarget> {
        Ok(target.clone())
    }

    fn visit_switch_case(&mut self, case: &SwitchCase) -> Result<SwitchCase> {
        walk_switch_case(self, case)
    }

    fn visit_catch_block(&mut self, handler: &CatchBlock) -> Result<CatchBlock> {
        walk_catch_block(self, handler)
    }

    fn visit_element_init(&mut self, init: &ElementInit) -> Result<ElementInit> {
        walk_element_init(self, init)
    }

    fn visit_member_binding(&mut self, binding: &MemberBinding) -> Result<MemberBinding> {
        walk_member_binding(self, binding)
    }
}

/// Rewriter that changes nothing; every node comes back identical.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unchanged;

impl Rewriter for Unchanged {}

/// Route `node` to the handler for its kind.
pub fn dispatch<R: Rewriter + ?Sized>(r: &mut R, node: &Expr) -> Result<Expr> {
    match node.kind() {
        ExprKind::Constant(_) => r.visit_constant(node),
        ExprKind::Default => r.visit_default(node),
        ExprKind::Parameter(_) => r.visit_parameter(node),
        ExprKind::DebugInfo(_) => r.visit_debug_info(node),
        ExprKind::Binary(b) => r.visit_binary(node, b),
        ExprKind::Unary(u) => r.visit_unary(node, u),
        ExprKind::TypeBinary(t) => r.visit_type_binary(node, t),
        ExprKind::Conditional(c) => r.visit_conditional(node, c),
        ExprKind::Block(b) => r.visit_block(node, b),
        ExprKind::Call(c) => r.visit_call(node, c),
        ExprKind::Member(m) => r.visit_member(node, m),
        ExprKind::Index(i) => r.visit_index(node, i),
        ExprKind::Invoke(i) => r.visit_invoke(node, i),
        ExprKind::Lambda(l) => r.visit_lambda(node, l),
        ExprKind::Loop(l) => r.visit_loop(node, l),
        ExprKind::Goto(g) => r.visit_goto(node, g),
        ExprKind::Label(l) => r.visit_label(node, l),
        ExprKind::Switch(s) => r.visit_switch(node, s),
        ExprKind::Try(t) => r.visit_try(node, t),
        ExprKind::New(n) => r.visit_new(node, n),
        ExprKind::NewArray(n) => r.visit_new_array(node, n),
        ExprKind::ListInit(l) => r.visit_list_init(node, l),
        ExprKind::MemberInit(m) => r.visit_member_init(node, m),
        ExprKind::Dynamic(d) => r.visit_dynamic(node, d),
        ExprKind::RuntimeVariables(v) => r.visit_runtime_variables(node, v),
    }
}

// ─── Helpers ───────────────────────────────────────────────────────

/// Rewrite each element; the original list comes back unless some element
/// changed.
pub fn rewrite_list<T, F>(list: &NodeList<T>, mut f: F) -> Result<NodeList<T>>
where
    T: Clone + Identity,
    F: FnMut(&T) -> Result<T>,
{
    let mut changed: Option<Vec<T>> = None;
    for (i, item) in list.iter().enumerate() {
        let new = f(item)?;
        match &mut changed {
            Some(out) => out.push(new),
            None if !new.same(item) => {
                let mut out = Vec::with_capacity(list.len());
                out.extend(list[..i].iter().cloned());
                out.push(new);
                changed = Some(out);
            }
            None => {}
        }
    }
    Ok(changed.map_or_else(|| list.clone(), NodeList::from))
}

fn rewrite_opt<R: Rewriter + ?Sized>(r: &mut R, e: Option<&Expr>) -> Result<Option<Expr>> {
    e.map(|e| r.visit(e)).transpose()
}

fn rewrite_all<R: Rewriter + ?Sized>(r: &mut R, list: &ExprList) -> Result<ExprList> {
    rewrite_list(list, |e| r.visit(e))
}

/// Rewrite a declaration; the result must still be a parameter.
fn rewrite_parameter<R: Rewriter + ?Sized>(
    r: &mut R,
    p: &Expr,
    method: &'static str,
) -> Result<Expr> {
    let new = r.visit(p)?;
    if !new.is_parameter() {
        return Err(Error::MustRewriteToSameNode {
            method,
            ty: p.ty().clone(),
        });
    }
    Ok(new)
}

fn rewrite_parameters<R: Rewriter + ?Sized>(
    r: &mut R,
    list: &ExprList,
    method: &'static str,
) -> Result<ExprList> {
    rewrite_list(list, |p| rewrite_parameter(r, p, method))
}

fn rewrite_opt_label<R: Rewriter + ?Sized>(
    r: &mut R,
    target: Option<&LabelTarget>,
) -> Result<Option<LabelTarget>> {
    target.map(|t| r.visit_label_target(t)).transpose()
}

/// Value types must keep their exact type; reference types may change to
/// another reference type.
fn validate_child_type(before: &Type, after: &Type, method: &'static str) -> Result<()> {
    let ok = if before.is_value_type() {
        types::are_equivalent(before, after)
    } else {
        !after.is_value_type()
    };
    if ok {
        Ok(())
    } else {
        Err(Error::MustRewriteChildToSameType {
            before: before.clone(),
            after: after.clone(),
            method,
        })
    }
}

// ─── Default traversals ────────────────────────────────────────────

pub fn walk_binary<R: Rewriter + ?Sized>(r: &mut R, node: &Expr, b: &BinaryNode) -> Result<Expr> {
    let left = r.visit(&b.left)?;
    let conversion = rewrite_opt(r, b.conversion.as_ref())?;
    let right = r.visit(&b.right)?;
    if left.same(&b.left)
        && right.same(&b.right)
        && same_opt(conversion.as_ref(), b.conversion.as_ref())
    {
        return Ok(node.clone());
    }
    if b.method.is_none() {
        validate_child_type(b.left.ty(), left.ty(), "visit_binary")?;
        validate_child_type(b.right.ty(), right.ty(), "visit_binary")?;
    }
    if node.is_reference_comparison() {
        return match b.op {
            NodeType::Equal => Expr::reference_equal(&left, &right),
            _ => Expr::reference_not_equal(&left, &right),
        };
    }
    Expr::make_binary(
        b.op,
        &left,
        &right,
        node.is_lifted_to_null(),
        b.method.as_ref(),
        conversion.as_ref(),
    )
}

pub fn walk_unary<R: Rewriter + ?Sized>(r: &mut R, node: &Expr, u: &UnaryNode) -> Result<Expr> {
    let operand = rewrite_opt(r, u.operand.as_ref())?;
    if same_opt(operand.as_ref(), u.operand.as_ref()) {
        return Ok(node.clone());
    }
    if let (Some(before), Some(after), None) = (&u.operand, &operand, &u.method) {
        validate_child_type(before.ty(), after.ty(), "visit_unary")?;
    }
    Expr::make_unary(u.op, operand.as_ref(), node.ty(), u.method.as_ref())
}

pub fn walk_type_binary<R: Rewriter + ?Sized>(
    r: &mut R,
    node: &Expr,
    t: &TypeBinaryNode,
) -> Result<Expr> {
    let expression = r.visit(&t.expression)?;
    if expression.same(&t.expression) {
        return Ok(node.clone());
    }
    match t.op {
        NodeType::TypeEqual => Expr::type_equal(&expression, &t.type_operand),
        _ => Expr::type_is(&expression, &t.type_operand),
    }
}

pub fn walk_conditional<R: Rewriter + ?Sized>(
    r: &mut R,
    node: &Expr,
    c: &ConditionalNode,
) -> Result<Expr> {
    let test = r.visit(&c.test)?;
    let if_true = r.visit(&c.if_true)?;
    let if_false = r.visit(&c.if_false)?;
    if test.same(&c.test) && if_true.same(&c.if_true) && if_false.same(&c.if_false) {
        return Ok(node.clone());
    }
    Expr::condition_typed(&test, &if_true, &if_false, node.ty())
}

pub fn walk_block<R: Rewriter + ?Sized>(r: &mut R, node: &Expr, b: &BlockNode) -> Result<Expr> {
    let variables = rewrite_parameters(r, &b.variables, "visit_block")?;
    let expressions = rewrite_all(r, &b.expressions)?;
    if variables.ptr_eq(&b.variables) && expressions.ptr_eq(&b.expressions) {
        return Ok(node.clone());
    }
    Expr::block_typed(node.ty(), &variables, &expressions)
}

pub fn walk_call<R: Rewriter + ?Sized>(r: &mut R, node: &Expr, c: &CallNode) -> Result<Expr> {
    let object = rewrite_opt(r, c.object.as_ref())?;
    let arguments = rewrite_all(r, &c.arguments)?;
    if same_opt(object.as_ref(), c.object.as_ref()) && arguments.ptr_eq(&c.arguments) {
        return Ok(node.clone());
    }
    Expr::call(object.as_ref(), &c.method, &arguments)
}

pub fn walk_member<R: Rewriter + ?Sized>(r: &mut R, node: &Expr, m: &MemberNode) -> Result<Expr> {
    let expression = rewrite_opt(r, m.expression.as_ref())?;
    if same_opt(expression.as_ref(), m.expression.as_ref()) {
        return Ok(node.clone());
    }
    Expr::make_member_access(expression.as_ref(), &m.member)
}

pub fn walk_index<R: Rewriter + ?Sized>(r: &mut R, node: &Expr, i: &IndexNode) -> Result<Expr> {
    let object = r.visit(&i.object)?;
    let arguments = rewrite_all(r, &i.arguments)?;
    if object.same(&i.object) && arguments.ptr_eq(&i.arguments) {
        return Ok(node.clone());
    }
    Expr::make_index(&object, i.indexer.as_ref(), &arguments)
}

pub fn walk_invoke<R: Rewriter + ?Sized>(r: &mut R, node: &Expr, i: &InvokeNode) -> Result<Expr> {
    let expression = r.visit(&i.expression)?;
    let arguments = rewrite_all(r, &i.arguments)?;
    if expression.same(&i.expression) && arguments.ptr_eq(&i.arguments) {
        return Ok(node.clone());
    }
    Expr::invoke(&expression, &arguments)
}

pub fn walk_lambda<R: Rewriter + ?Sized>(r: &mut R, node: &Expr, l: &LambdaNode) -> Result<Expr> {
    let parameters = rewrite_parameters(r, &l.parameters, "visit_lambda")?;
    let body = r.visit(&l.body)?;
    if parameters.ptr_eq(&l.parameters) && body.same(&l.body) {
        return Ok(node.clone());
    }
    Expr::lambda(
        Some(node.ty()),
        &body,
        &parameters,
        l.name.as_deref(),
        l.tail_call,
    )
}

pub fn walk_loop<R: Rewriter + ?Sized>(r: &mut R, node: &Expr, l: &LoopNode) -> Result<Expr> {
    let break_label = rewrite_opt_label(r, l.break_label.as_ref())?;
    let continue_label = rewrite_opt_label(r, l.continue_label.as_ref())?;
    let body = r.visit(&l.body)?;
    if body.same(&l.body)
        && same_opt(break_label.as_ref(), l.break_label.as_ref())
        && same_opt(continue_label.as_ref(), l.continue_label.as_ref())
    {
        return Ok(node.clone());
    }
    Expr::make_loop(&body, break_label.as_ref(), continue_label.as_ref())
}

pub fn walk_goto<R: Rewriter + ?Sized>(r: &mut R, node: &Expr, g: &GotoNode) -> Result<Expr> {
    let target = r.visit_label_target(&g.target)?;
    let value = rewrite_opt(r, g.value.as_ref())?;
    if target.same(&g.target) && same_opt(value.as_ref(), g.value.as_ref()) {
        return Ok(node.clone());
    }
    Expr::make_goto(g.kind, &target, value.as_ref(), node.ty())
}

pub fn walk_label<R: Rewriter + ?Sized>(r: &mut R, node: &Expr, l: &LabelNode) -> Result<Expr> {
    let target = r.visit_label_target(&l.target)?;
    let default_value = rewrite_opt(r, l.default_value.as_ref())?;
    if target.same(&l.target) && same_opt(default_value.as_ref(), l.default_value.as_ref()) {
        return Ok(node.clone());
    }
    Expr::label(&target, default_value.as_ref())
}

pub fn walk_switch<R: Rewriter + ?Sized>(r: &mut R, node: &Expr, s: &SwitchNode) -> Result<Expr> {
    let switch_value = r.visit(&s.switch_value)?;
    let cases = rewrite_list(&s.cases, |c| r.visit_switch_case(c))?;
    let default_body = rewrite_opt(r, s.default_body.as_ref())?;
    if switch_value.same(&s.switch_value)
        && cases.ptr_eq(&s.cases)
        && same_opt(default_body.as_ref(), s.default_body.as_ref())
    {
        return Ok(node.clone());
    }
    Expr::switch(
        Some(node.ty()),
        &switch_value,
        default_body.as_ref(),
        s.comparison.as_ref(),
        &cases,
    )
}

pub fn walk_try<R: Rewriter + ?Sized>(r: &mut R, node: &Expr, t: &TryNode) -> Result<Expr> {
    let body = r.visit(&t.body)?;
    let handlers = rewrite_list(&t.handlers, |h| r.visit_catch_block(h))?;
    let finally = rewrite_opt(r, t.finally.as_ref())?;
    let fault = rewrite_opt(r, t.fault.as_ref())?;
    if body.same(&t.body)
        && handlers.ptr_eq(&t.handlers)
        && same_opt(finally.as_ref(), t.finally.as_ref())
        && same_opt(fault.as_ref(), t.fault.as_ref())
    {
        return Ok(node.clone());
    }
    Expr::make_try(
        Some(node.ty()),
        &body,
        finally.as_ref(),
        fault.as_ref(),
        &handlers,
    )
}

pub fn walk_new<R: Rewriter + ?Sized>(r: &mut R, node: &Expr, n: &NewNode) -> Result<Expr> {
    let arguments = rewrite_all(r, &n.arguments)?;
    if arguments.ptr_eq(&n.arguments) {
        return Ok(node.clone());
    }
    // Only a constructor call has arguments that could have changed.
    let Some(ctor) = &n.constructor else {
        return Expr::new_default(node.ty());
    };
    match &n.members {
        Some(members) => Expr::new_with_members(ctor, &arguments, members),
        None => Expr::new_object(ctor, &arguments),
    }
}

pub fn walk_new_array<R: Rewriter + ?Sized>(
    r: &mut R,
    node: &Expr,
    n: &NewArrayNode,
) -> Result<Expr> {
    let expressions = rewrite_all(r, &n.expressions)?;
    if expressions.ptr_eq(&n.expressions) {
        return Ok(node.clone());
    }
    let element = node
        .ty()
        .element_type()
        .ok_or_else(|| Error::ArgumentMustBeArray(node.ty().clone()))?;
    match n.op {
        NodeType::NewArrayBounds => Expr::new_array_bounds(element, &expressions),
        _ => Expr::new_array_init(element, &expressions),
    }
}

/// The object creation of an initializer must stay an object creation.
fn rewrite_new<R: Rewriter + ?Sized>(r: &mut R, e: &Expr, method: &'static str) -> Result<Expr> {
    let new = r.visit(e)?;
    if !matches!(new.kind(), ExprKind::New(_)) {
        return Err(Error::MustRewriteToSameNode {
            method,
            ty: e.ty().clone(),
        });
    }
    Ok(new)
}

pub fn walk_list_init<R: Rewriter + ?Sized>(
    r: &mut R,
    node: &Expr,
    l: &ListInitNode,
) -> Result<Expr> {
    let new_expression = rewrite_new(r, &l.new_expression, "visit_list_init")?;
    let initializers = rewrite_list(&l.initializers, |i| r.visit_element_init(i))?;
    if new_expression.same(&l.new_expression) && initializers.ptr_eq(&l.initializers) {
        return Ok(node.clone());
    }
    Expr::list_init(&new_expression, &initializers)
}

pub fn walk_member_init<R: Rewriter + ?Sized>(
    r: &mut R,
    node: &Expr,
    m: &MemberInitNode,
) -> Result<Expr> {
    let new_expression = rewrite_new(r, &m.new_expression, "visit_member_init")?;
    let bindings = rewrite_list(&m.bindings, |b| r.visit_member_binding(b))?;
    if new_expression.same(&m.new_expression) && bindings.ptr_eq(&m.bindings) {
        return Ok(node.clone());
    }
    Expr::member_init(&new_expression, &bindings)
}

pub fn walk_dynamic<R: Rewriter + ?Sized>(r: &mut R, node: &Expr, d: &DynamicNode) -> Result<Expr> {
    let arguments = rewrite_all(r, &d.arguments)?;
    if arguments.ptr_eq(&d.arguments) {
        return Ok(node.clone());
    }
    Expr::make_dynamic(&d.delegate_type, d.binder.clone(), &arguments)
}

pub fn walk_runtime_variables<R: Rewriter + ?Sized>(
    r: &mut R,
    node: &Expr,
    v: &RuntimeVariablesNode,
) -> Result<Expr> {
    let variables = rewrite_parameters(r, &v.variables, "visit_runtime_variables")?;
    if variables.ptr_eq(&v.variables) {
        return Ok(node.clone());
    }
    Expr::runtime_variables(&variables)
}

// ── Satellites ──

pub fn walk_switch_case<R: Rewriter + ?Sized>(r: &mut R, case: &SwitchCase) -> Result<SwitchCase> {
    let test_values = rewrite_all(r, case.test_values())?;
    let body = r.visit(case.body())?;
    if test_values.ptr_eq(case.test_values()) && body.same(case.body()) {
        return Ok(case.clone());
    }
    Expr::switch_case(&body, &test_values)
}

pub fn walk_catch_block<R: Rewriter + ?Sized>(r: &mut R, handler: &CatchBlock) -> Result<CatchBlock> {
    let variable = handler
        .variable()
        .map(|v| rewrite_parameter(r, v, "visit_catch_block"))
        .transpose()?;
    let filter = rewrite_opt(r, handler.filter())?;
    let body = r.visit(handler.body())?;
    if body.same(handler.body())
        && same_opt(variable.as_ref(), handler.variable())
        && same_opt(filter.as_ref(), handler.filter())
    {
        return Ok(handler.clone());
    }
    Expr::catch(handler.test(), variable.as_ref(), &body, filter.as_ref())
}

pub fn walk_element_init<R: Rewriter + ?Sized>(r: &mut R, init: &ElementInit) -> Result<ElementInit> {
    let arguments = rewrite_all(r, init.arguments())?;
    if arguments.ptr_eq(init.arguments()) {
        return Ok(init.clone());
    }
    Expr::element_init(init.add_method(), &arguments)
}

pub fn walk_member_binding<R: Rewriter + ?Sized>(
    r: &mut R,
    binding: &MemberBinding,
) -> Result<MemberBinding> {
    let member = binding.member();
    match binding.kind() {
        BindingKind::Assignment(e) => {
            let new = r.visit(e)?;
            if new.same(e) {
                return Ok(binding.clone());
            }
            Expr::bind(member, &new)
        }
        BindingKind::MemberBindings(bindings) => {
            let new = rewrite_list(bindings, |b| r.visit_member_binding(b))?;
            if new.ptr_eq(bindings) {
                return Ok(binding.clone());
            }
            Expr::member_bind(member, &new)
        }
        BindingKind::ListBindings(inits) => {
            let new = rewrite_list(inits, |i| r.visit_element_init(i))?;
            if new.ptr_eq(inits) {
                return Ok(binding.clone());
            }
            Expr::list_bind(member, &new)
        }
    }
}
