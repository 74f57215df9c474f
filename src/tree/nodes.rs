//! Node kinds and the shared `Expr` handle.

use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};

use crate::types::{Constructor, Member, Method, Property, Type};

use super::support::{
    arc_identity, CallSiteBinder, CatchBlock, Detach, ElementInit, ExprList, Identity,
    LabelTarget, MemberBinding, NodeList, SwitchCase, SymbolDocument, Value,
};

// ─── NodeType ──────────────────────────────────────────────────────

/// Kind tag of a node. Operator kinds share a payload shape and are told
/// apart by this tag alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    // Binary arithmetic
    Add,
    AddChecked,
    Subtract,
    SubtractChecked,
    Multiply,
    MultiplyChecked,
    Divide,
    Modulo,
    Power,
    // Binary bitwise and shifts
    And,
    Or,
    ExclusiveOr,
    LeftShift,
    RightShift,
    // Comparisons
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    // Conditional logic
    AndAlso,
    OrElse,
    Coalesce,
    ArrayIndex,
    // Assignment
    Assign,
    AddAssign,
    AddAssignChecked,
    SubtractAssign,
    SubtractAssignChecked,
    MultiplyAssign,
    MultiplyAssignChecked,
    DivideAssign,
    ModuloAssign,
    PowerAssign,
    AndAssign,
    OrAssign,
    ExclusiveOrAssign,
    LeftShiftAssign,
    RightShiftAssign,
    // Unary
    Negate,
    NegateChecked,
    UnaryPlus,
    Not,
    OnesComplement,
    IsTrue,
    IsFalse,
    Increment,
    Decrement,
    PreIncrementAssign,
    PreDecrementAssign,
    PostIncrementAssign,
    PostDecrementAssign,
    Convert,
    ConvertChecked,
    TypeAs,
    Unbox,
    ArrayLength,
    Throw,
    // Type tests
    TypeIs,
    TypeEqual,
    // Everything else
    Conditional,
    Constant,
    Default,
    Parameter,
    Block,
    Call,
    MemberAccess,
    Index,
    Invoke,
    Lambda,
    Loop,
    Goto,
    Label,
    Switch,
    Try,
    New,
    NewArrayInit,
    NewArrayBounds,
    ListInit,
    MemberInit,
    Dynamic,
    RuntimeVariables,
    DebugInfo,
}

impl NodeType {
    /// Compound assignment kinds (`x op= y`).
    pub fn is_op_assignment(self) -> bool {
        self.op_assignment_base().is_some()
    }

    /// The plain operator behind a compound assignment.
    pub fn op_assignment_base(self) -> Option<NodeType> {
        use NodeType::*;
        Some(match self {
            AddAssign => Add,
            AddAssignChecked => AddChecked,
            SubtractAssign => Subtract,
            SubtractAssignChecked => SubtractChecked,
            MultiplyAssign => Multiply,
            MultiplyAssignChecked => MultiplyChecked,
            DivideAssign => Divide,
            ModuloAssign => Modulo,
            PowerAssign => Power,
            AndAssign => And,
            OrAssign => Or,
            ExclusiveOrAssign => ExclusiveOr,
            LeftShiftAssign => LeftShift,
            RightShiftAssign => RightShift,
            _ => return None,
        })
    }

    /// Pre/post increment/decrement-assign kinds.
    pub fn is_increment_assign(self) -> bool {
        matches!(
            self,
            NodeType::PreIncrementAssign
                | NodeType::PreDecrementAssign
                | NodeType::PostIncrementAssign
                | NodeType::PostDecrementAssign
        )
    }

    /// Conventional name of the user-defined operator method for this kind.
    pub fn operator_method_name(self) -> Option<&'static str> {
        use NodeType::*;
        Some(match self {
            Add | AddChecked => "op_Addition",
            Subtract | SubtractChecked => "op_Subtraction",
            Multiply | MultiplyChecked => "op_Multiply",
            Divide => "op_Division",
            Modulo => "op_Modulus",
            Power => "op_Exponent",
            And => "op_BitwiseAnd",
            Or => "op_BitwiseOr",
            ExclusiveOr => "op_ExclusiveOr",
            LeftShift => "op_LeftShift",
            RightShift => "op_RightShift",
            Equal => "op_Equality",
            NotEqual => "op_Inequality",
            LessThan => "op_LessThan",
            LessThanOrEqual => "op_LessThanOrEqual",
            GreaterThan => "op_GreaterThan",
            GreaterThanOrEqual => "op_GreaterThanOrEqual",
            AndAlso => "op_BitwiseAnd",
            OrElse => "op_BitwiseOr",
            Negate | NegateChecked => "op_UnaryNegation",
            UnaryPlus => "op_UnaryPlus",
            Not => "op_LogicalNot",
            OnesComplement => "op_OnesComplement",
            IsTrue => "op_True",
            IsFalse => "op_False",
            Increment | PreIncrementAssign | PostIncrementAssign => "op_Increment",
            Decrement | PreDecrementAssign | PostDecrementAssign => "op_Decrement",
            _ => return None,
        })
    }
}

// ─── Payloads ──────────────────────────────────────────────────────

/// Two-operand operators, assignment and compound assignment.
pub struct BinaryNode {
    pub op: NodeType,
    pub left: Expr,
    pub right: Expr,
    /// Implementing operator method; `None` for builtin operators.
    pub method: Option<Method>,
    /// Conversion lambda of a coalesce or compound assignment.
    pub conversion: Option<Expr>,
}

/// One-operand operators, conversions and throw.
pub struct UnaryNode {
    pub op: NodeType,
    /// `None` only for a rethrow.
    pub operand: Option<Expr>,
    pub method: Option<Method>,
}

pub struct TypeBinaryNode {
    pub op: NodeType,
    pub expression: Expr,
    pub type_operand: Type,
}

pub struct ConditionalNode {
    pub test: Expr,
    pub if_true: Expr,
    pub if_false: Expr,
}

pub struct ConstantNode {
    pub value: Value,
}

/// A variable or lambda parameter. Identifies a slot; owns no storage.
pub struct ParameterNode {
    pub name: Option<Arc<str>>,
    pub is_by_ref: bool,
}

pub struct BlockNode {
    pub variables: ExprList,
    pub expressions: ExprList,
}

pub struct CallNode {
    /// Receiver; `None` for static methods.
    pub object: Option<Expr>,
    pub method: Method,
    pub arguments: ExprList,
}

/// Field or property access.
pub struct MemberNode {
    /// Receiver; `None` for static members.
    pub expression: Option<Expr>,
    pub member: Member,
}

/// Indexed property access, or array element access when `indexer` is
/// `None`.
pub struct IndexNode {
    pub object: Expr,
    pub indexer: Option<Property>,
    pub arguments: ExprList,
}

pub struct InvokeNode {
    pub expression: Expr,
    pub arguments: ExprList,
}

pub struct LambdaNode {
    pub name: Option<Arc<str>>,
    pub parameters: ExprList,
    pub body: Expr,
    pub tail_call: bool,
}

pub struct LoopNode {
    pub body: Expr,
    pub break_label: Option<LabelTarget>,
    pub continue_label: Option<LabelTarget>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GotoKind {
    Goto,
    Return,
    Break,
    Continue,
}

pub struct GotoNode {
    pub kind: GotoKind,
    pub target: LabelTarget,
    pub value: Option<Expr>,
}

pub struct LabelNode {
    pub target: LabelTarget,
    pub default_value: Option<Expr>,
}

pub struct SwitchNode {
    pub switch_value: Expr,
    pub cases: NodeList<SwitchCase>,
    pub default_body: Option<Expr>,
    pub comparison: Option<Method>,
}

pub struct TryNode {
    pub body: Expr,
    pub handlers: NodeList<CatchBlock>,
    pub finally: Option<Expr>,
    pub fault: Option<Expr>,
}

pub struct NewNode {
    /// `None` for the parameterless construction of a value type.
    pub constructor: Option<Constructor>,
    pub arguments: ExprList,
    /// Members the arguments initialize, for anonymous-type style
    /// construction.
    pub members: Option<NodeList<Member>>,
}

/// `NewArrayInit` lists elements; `NewArrayBounds` lists dimension sizes.
pub struct NewArrayNode {
    pub op: NodeType,
    pub expressions: ExprList,
}

pub struct ListInitNode {
    pub new_expression: Expr,
    pub initializers: NodeList<ElementInit>,
}

pub struct MemberInitNode {
    pub new_expression: Expr,
    pub bindings: NodeList<MemberBinding>,
}

pub struct DynamicNode {
    pub binder: Arc<dyn CallSiteBinder>,
    pub delegate_type: Type,
    pub arguments: ExprList,
}

pub struct RuntimeVariablesNode {
    pub variables: ExprList,
}

pub struct DebugInfoNode {
    pub document: SymbolDocument,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl DebugInfoNode {
    /// Line number marking a sequence point that clears debug info.
    pub const CLEAR_LINE: u32 = 0x00fe_efee;

    pub fn is_clear(&self) -> bool {
        self.start_line == Self::CLEAR_LINE
    }
}

// ─── ExprKind ──────────────────────────────────────────────────────

/// The closed set of node shapes.
pub enum ExprKind {
    Binary(BinaryNode),
    Unary(UnaryNode),
    TypeBinary(TypeBinaryNode),
    Conditional(ConditionalNode),
    Constant(ConstantNode),
    /// Default value of the node's type; `Empty` when the type is void.
    Default,
    Parameter(ParameterNode),
    Block(BlockNode),
    Call(CallNode),
    Member(MemberNode),
    Index(IndexNode),
    Invoke(InvokeNode),
    Lambda(LambdaNode),
    Loop(LoopNode),
    Goto(GotoNode),
    Label(LabelNode),
    Switch(SwitchNode),
    Try(TryNode),
    New(NewNode),
    NewArray(NewArrayNode),
    ListInit(ListInitNode),
    MemberInit(MemberInitNode),
    Dynamic(DynamicNode),
    RuntimeVariables(RuntimeVariablesNode),
    DebugInfo(DebugInfoNode),
}

// ─── Expr ──────────────────────────────────────────────────────────

pub struct Node {
    ty: Type,
    kind: ExprKind,
    reduced: OnceCell<Expr>,
}

impl Node {
    fn detach_into(&mut self, out: &mut Vec<Expr>) {
        out.extend(self.reduced.take());
        match &mut self.kind {
            ExprKind::Constant(_)
            | ExprKind::Default
            | ExprKind::Parameter(_)
            | ExprKind::DebugInfo(_) => {}
            ExprKind::Binary(b) => {
                b.left.detach_into(out);
                b.conversion.detach_into(out);
                b.right.detach_into(out);
            }
            ExprKind::Unary(u) => u.operand.detach_into(out),
            ExprKind::TypeBinary(t) => t.expression.detach_into(out),
            ExprKind::Conditional(c) => {
                c.test.detach_into(out);
                c.if_true.detach_into(out);
                c.if_false.detach_into(out);
            }
            ExprKind::Block(b) => {
                b.variables.detach_into(out);
                b.expressions.detach_into(out);
            }
            ExprKind::Call(c) => {
                c.object.detach_into(out);
                c.arguments.detach_into(out);
            }
            ExprKind::Member(m) => m.expression.detach_into(out),
            ExprKind::Index(i) => {
                i.object.detach_into(out);
                i.arguments.detach_into(out);
            }
            ExprKind::Invoke(i) => {
                i.expression.detach_into(out);
                i.arguments.detach_into(out);
            }
            ExprKind::Lambda(l) => {
                l.parameters.detach_into(out);
                l.body.detach_into(out);
            }
            ExprKind::Loop(l) => l.body.detach_into(out),
            ExprKind::Goto(g) => g.value.detach_into(out),
            ExprKind::Label(l) => l.default_value.detach_into(out),
            ExprKind::Switch(s) => {
                s.switch_value.detach_into(out);
                s.cases.detach_into(out);
                s.default_body.detach_into(out);
            }
            ExprKind::Try(t) => {
                t.body.detach_into(out);
                t.handlers.detach_into(out);
                t.finally.detach_into(out);
                t.fault.detach_into(out);
            }
            ExprKind::New(n) => n.arguments.detach_into(out),
            ExprKind::NewArray(n) => n.expressions.detach_into(out),
            ExprKind::ListInit(l) => {
                l.new_expression.detach_into(out);
                l.initializers.detach_into(out);
            }
            ExprKind::MemberInit(m) => {
                m.new_expression.detach_into(out);
                m.bindings.detach_into(out);
            }
            ExprKind::Dynamic(d) => d.arguments.detach_into(out),
            ExprKind::RuntimeVariables(r) => r.variables.detach_into(out),
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_into(&mut pending);
        while let Some(child) = pending.pop() {
            // Only the last owner tears a child down; its own drop then
            // finds nothing left to release.
            if let Some(mut node) = Arc::into_inner(child.0) {
                node.detach_into(&mut pending);
            }
        }
    }
}

/// Leaf left behind in child slots during teardown.
static HOLE: Lazy<Expr> = Lazy::new(|| Expr::new(Type::void(), ExprKind::Default));

/// Shared handle to an immutable node. Equality is reference identity.
#[derive(Clone)]
pub struct Expr(Arc<Node>);

arc_identity!(Expr);

impl std::hash::Hash for Expr {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl Expr {
    /// Wrap an already validated node. Only factories call this.
    pub(crate) fn new(ty: Type, kind: ExprKind) -> Expr {
        Expr(Arc::new(Node {
            ty,
            kind,
            reduced: OnceCell::new(),
        }))
    }

    /// Result type of the node.
    pub fn ty(&self) -> &Type {
        &self.0.ty
    }

    pub fn kind(&self) -> &ExprKind {
        &self.0.kind
    }

    pub fn node_type(&self) -> NodeType {
        match &self.0.kind {
            ExprKind::Binary(b) => b.op,
            ExprKind::Unary(u) => u.op,
            ExprKind::TypeBinary(t) => t.op,
            ExprKind::Conditional(_) => NodeType::Conditional,
            ExprKind::Constant(_) => NodeType::Constant,
            ExprKind::Default => NodeType::Default,
            ExprKind::Parameter(_) => NodeType::Parameter,
            ExprKind::Block(_) => NodeType::Block,
            ExprKind::Call(_) => NodeType::Call,
            ExprKind::Member(_) => NodeType::MemberAccess,
            ExprKind::Index(_) => NodeType::Index,
            ExprKind::Invoke(_) => NodeType::Invoke,
            ExprKind::Lambda(_) => NodeType::Lambda,
            ExprKind::Loop(_) => NodeType::Loop,
            ExprKind::Goto(_) => NodeType::Goto,
            ExprKind::Label(_) => NodeType::Label,
            ExprKind::Switch(_) => NodeType::Switch,
            ExprKind::Try(_) => NodeType::Try,
            ExprKind::New(_) => NodeType::New,
            ExprKind::NewArray(n) => n.op,
            ExprKind::ListInit(_) => NodeType::ListInit,
            ExprKind::MemberInit(_) => NodeType::MemberInit,
            ExprKind::Dynamic(_) => NodeType::Dynamic,
            ExprKind::RuntimeVariables(_) => NodeType::RuntimeVariables,
            ExprKind::DebugInfo(_) => NodeType::DebugInfo,
        }
    }

    pub fn ptr_eq(a: &Expr, b: &Expr) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn hole() -> Expr {
        HOLE.clone()
    }

    pub(crate) fn reduced_cell(&self) -> &OnceCell<Expr> {
        &self.0.reduced
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    // ── Payload accessors ──

    pub fn as_binary(&self) -> Option<&BinaryNode> {
        match self.kind() {
            ExprKind::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_unary(&self) -> Option<&UnaryNode> {
        match self.kind() {
            ExprKind::Unary(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&ParameterNode> {
        match self.kind() {
            ExprKind::Parameter(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_lambda(&self) -> Option<&LambdaNode> {
        match self.kind() {
            ExprKind::Lambda(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&BlockNode> {
        match self.kind() {
            ExprKind::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Value> {
        match self.kind() {
            ExprKind::Constant(c) => Some(&c.value),
            _ => None,
        }
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self.kind(), ExprKind::Parameter(_))
    }

    /// Nodes with a positional argument list.
    pub fn as_argument_provider(&self) -> Option<&dyn ArgumentProvider> {
        match self.kind() {
            ExprKind::Call(n) => Some(n),
            ExprKind::Invoke(n) => Some(n),
            ExprKind::Index(n) => Some(n),
            ExprKind::New(n) => Some(n),
            ExprKind::Dynamic(n) => Some(n),
            _ => None,
        }
    }
}

// ─── Operator queries ──────────────────────────────────────────────

impl Expr {
    /// An operator applied to the unwrapped values of nullable operands.
    pub fn is_lifted(&self) -> bool {
        match self.kind() {
            ExprKind::Binary(b) => {
                if matches!(b.op, NodeType::Coalesce | NodeType::Assign) {
                    return false;
                }
                let left = b.left.ty();
                left.is_nullable()
                    && b.method.as_ref().map_or(true, |m| {
                        m.params().first().map(|p| p.non_ref()).as_ref() != Some(left)
                    })
            }
            ExprKind::Unary(u) => {
                if matches!(u.op, NodeType::TypeAs | NodeType::Throw) {
                    return false;
                }
                let Some(operand) = &u.operand else {
                    return false;
                };
                let operand_nullable = operand.ty().is_nullable();
                let result_nullable = self.ty().is_nullable();
                match &u.method {
                    Some(m) => {
                        (operand_nullable && m.params().first() != Some(operand.ty()))
                            || (result_nullable && m.return_type() != self.ty())
                    }
                    None => operand_nullable || result_nullable,
                }
            }
            _ => false,
        }
    }

    /// Lifted, with a nullable result.
    pub fn is_lifted_to_null(&self) -> bool {
        self.is_lifted() && self.ty().is_nullable()
    }

    /// `==` or `!=` between reference types with no operator method.
    pub fn is_reference_comparison(&self) -> bool {
        match self.as_binary() {
            Some(b) => {
                matches!(b.op, NodeType::Equal | NodeType::NotEqual)
                    && b.method.is_none()
                    && !b.left.ty().is_value_type()
                    && !b.right.ty().is_value_type()
            }
            None => false,
        }
    }
}

// ─── ArgumentProvider ──────────────────────────────────────────────

/// Positional access to a node's arguments without exposing how they are
/// stored. `argument` panics when `index >= argument_count()`.
pub trait ArgumentProvider {
    fn argument_count(&self) -> usize;
    fn argument(&self, index: usize) -> &Expr;
}

macro_rules! argument_provider {
    ($node:ty) => {
        impl ArgumentProvider for $node {
            fn argument_count(&self) -> usize {
                self.arguments.len()
            }

            fn argument(&self, index: usize) -> &Expr {
                &self.arguments[index]
            }
        }
    };
}

argument_provider!(CallNode);
argument_provider!(InvokeNode);
argument_provider!(IndexNode);
argument_provider!(NewNode);
argument_provider!(DynamicNode);

/// Identity of an optional child.
pub(crate) fn same_opt<T: Identity>(a: Option<&T>, b: Option<&T>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.same(b),
        _ => false,
    }
}
